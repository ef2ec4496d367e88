//! Error types for controller construction.
//!
//! Processing a validated request never fails; these only arise while
//! wiring a controller together.

use thiserror::Error;

/// Error building controller components.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// A selection pattern is not a valid regular expression.
    #[error("invalid search pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for controller construction.
pub type Result<T> = std::result::Result<T, ControllerError>;
