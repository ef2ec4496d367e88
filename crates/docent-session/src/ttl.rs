//! Idle tracking for session expiry.
//!
//! Uses [`tokio::time::Instant`] so expiry follows the runtime clock, which
//! tests can pause and advance.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// Tracks last activity per session.
#[derive(Debug)]
pub struct TtlTracker {
    last_active: HashMap<Uuid, Instant>,
    ttl: Option<Duration>,
}

impl TtlTracker {
    /// Create a tracker. `None` means sessions never expire.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            last_active: HashMap::new(),
            ttl,
        }
    }

    /// Record activity for a session (resets its idle timer).
    pub fn touch(&mut self, session_id: Uuid) {
        self.last_active.insert(session_id, Instant::now());
    }

    /// Check if a session has been idle past the TTL.
    ///
    /// An untracked session counts as expired when a TTL is set.
    pub fn is_expired(&self, session_id: &Uuid) -> bool {
        match self.ttl {
            None => false,
            Some(ttl) => match self.last_active.get(session_id) {
                None => true,
                Some(at) => at.elapsed() > ttl,
            },
        }
    }

    /// Stop tracking a session.
    pub fn remove(&mut self, session_id: &Uuid) {
        self.last_active.remove(session_id);
    }

    /// Remove all expired entries and return their ids.
    pub fn drain_expired(&mut self) -> Vec<Uuid> {
        let Some(ttl) = self.ttl else {
            return Vec::new();
        };
        let now = Instant::now();
        let expired: Vec<Uuid> = self
            .last_active
            .iter()
            .filter(|(_, at)| now.duration_since(**at) > ttl)
            .map(|(id, _)| *id)
            .collect();
        for id in &expired {
            self.last_active.remove(id);
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.last_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_active.is_empty()
    }

    /// Get the configured TTL.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }
}
