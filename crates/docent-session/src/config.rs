//! Configuration for the session store.

use std::time::Duration;

/// Default maximum number of live sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 10_000;

/// Default idle time after which a session expires.
pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(3600);

/// Default interval of the background expiry sweep.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of sessions kept before LRU eviction.
    pub max_sessions: usize,

    /// Sessions idle for longer than this are expired. `None` disables expiry.
    pub idle_ttl: Option<Duration>,

    /// Whether [`SessionStore::spawn_cleanup_task`](crate::SessionStore::spawn_cleanup_task)
    /// starts a sweeper. Expired sessions are otherwise dropped on access.
    pub enable_cleanup_task: bool,

    /// Interval for the cleanup task.
    pub cleanup_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_ttl: Some(DEFAULT_IDLE_TTL),
            enable_cleanup_task: true,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of sessions.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.max_sessions = max;
        self
    }

    /// Set the idle expiry.
    pub fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = Some(ttl);
        self
    }

    /// Never expire idle sessions.
    pub fn without_idle_ttl(mut self) -> Self {
        self.idle_ttl = None;
        self
    }

    /// Enable or disable the background cleanup task.
    pub fn with_cleanup_task(mut self, enabled: bool) -> Self {
        self.enable_cleanup_task = enabled;
        self
    }

    /// Set the cleanup interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }
}
