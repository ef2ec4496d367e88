//! Persistence hook for durable sessions.
//!
//! The store is in-memory by default. A [`SessionPersistence`] implementation
//! lets sessions survive restarts: the store consults it on a cache miss and
//! writes through to it after every recorded turn.

use crate::error::Result;
use crate::session::Session;
use docent_types::SessionId;

/// Trait for persistence backends.
pub trait SessionPersistence: Send + Sync {
    /// Load a session. Return `Ok(None)` if it does not exist.
    fn load(&self, session_id: &SessionId) -> Result<Option<Session>>;

    /// Save a session after it changed.
    fn save(&self, session: &Session) -> Result<()>;

    /// Delete a session.
    fn delete(&self, session_id: &SessionId) -> Result<()>;

    /// Called when a session leaves memory through LRU eviction or expiry.
    fn on_evict(&self, _session_id: &SessionId) -> Result<()> {
        Ok(())
    }
}

/// A no-op persistence hook for in-memory only sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPersistence;

impl SessionPersistence for NoPersistence {
    fn load(&self, _session_id: &SessionId) -> Result<Option<Session>> {
        Ok(None)
    }

    fn save(&self, _session: &Session) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _session_id: &SessionId) -> Result<()> {
        Ok(())
    }
}
