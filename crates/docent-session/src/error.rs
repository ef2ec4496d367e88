//! Error types for session store operations.

use uuid::Uuid;

/// Error type for session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Session is not live (never existed, expired, or evicted).
    #[error("Session not found: {0}")]
    NotFound(Uuid),

    /// Error from the persistence backend.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

/// Result type for session store operations.
pub type Result<T> = std::result::Result<T, SessionError>;
