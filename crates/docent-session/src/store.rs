//! Session store with LRU eviction and idle expiry.

use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use std::time::Duration;

use docent_types::{DetectedIntent, SessionId};
use lru::LruCache;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::error::{Result, SessionError};
use crate::persistence::{NoPersistence, SessionPersistence};
use crate::session::Session;
use crate::ttl::TtlTracker;

/// Inner state protected by the store lock.
struct StoreInner {
    lru: LruCache<SessionId, Session>,
    ttl: TtlTracker,
    persistence: Box<dyn SessionPersistence>,
}

impl StoreInner {
    fn insert(&mut self, session: Session) {
        let id = session.session_id;
        if let Some((evicted, _)) = self.lru.push(id, session)
            && evicted != id
        {
            debug!(session_id = %evicted, "Evicting LRU session to make room");
            self.ttl.remove(&evicted);
            self.notify_evict(&evicted);
        }
        self.ttl.touch(id);
    }

    /// Drop `id` from memory if it has been idle too long.
    fn expire_if_idle(&mut self, id: &SessionId) {
        if self.lru.contains(id) && self.ttl.is_expired(id) {
            debug!(session_id = %id, "Session expired, removing");
            self.lru.pop(id);
            self.ttl.remove(id);
            self.notify_evict(id);
        }
    }

    fn notify_evict(&self, id: &SessionId) {
        if let Err(e) = self.persistence.on_evict(id) {
            warn!(session_id = %id, error = %e, "Persistence eviction hook failed");
        }
    }
}

/// Process-wide session store.
///
/// Cloning is cheap and yields a handle to the same sessions.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<StoreInner>>,
    config: StoreConfig,
}

impl SessionStore {
    /// Create an in-memory store.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_persistence(config, NoPersistence)
    }

    /// Create a store backed by a persistence hook.
    pub fn with_persistence(config: StoreConfig, persistence: impl SessionPersistence + 'static) -> Self {
        let cap = NonZeroUsize::new(config.max_sessions).unwrap_or(NonZeroUsize::MIN);

        let inner = StoreInner {
            lru: LruCache::new(cap),
            ttl: TtlTracker::new(config.idle_ttl),
            persistence: Box::new(persistence),
        };

        Self {
            inner: Arc::new(RwLock::new(inner)),
            config,
        }
    }

    /// Get the store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of sessions held in memory, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.inner.read().await.lru.len()
    }

    /// Check if the store holds no sessions.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.lru.is_empty()
    }

    /// Resolve the session for a request.
    ///
    /// A live `requested` session is returned and its idle timer reset. An
    /// unknown or expired id, or no id at all, yields a newly minted session
    /// whose id differs from the requested one.
    pub async fn resolve(&self, requested: Option<SessionId>) -> Result<Session> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        if let Some(id) = requested {
            inner.expire_if_idle(&id);

            if let Some(session) = inner.lru.get(&id).cloned() {
                inner.ttl.touch(id);
                trace!(session_id = %id, "Session found");
                return Ok(session);
            }

            if let Some(session) = inner.persistence.load(&id)? {
                debug!(session_id = %id, "Session loaded from persistence");
                inner.insert(session.clone());
                return Ok(session);
            }

            debug!(requested = %id, "Unknown or expired session, minting a new one");
        }

        let session = Session::new(Uuid::new_v4());
        inner.insert(session.clone());
        debug!(
            session_id = %session.session_id,
            live_sessions = inner.lru.len(),
            "Session created"
        );
        Ok(session)
    }

    /// Append a turn to a live session.
    ///
    /// Fails with [`SessionError::NotFound`] if the session expired or was
    /// evicted since it was resolved.
    pub async fn record_turn(
        &self,
        session_id: SessionId,
        question: impl Into<String>,
        answer: impl Into<String>,
        detected_intent: Option<DetectedIntent>,
    ) -> Result<()> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;

        inner.expire_if_idle(&session_id);
        let Some(session) = inner.lru.get_mut(&session_id) else {
            return Err(SessionError::NotFound(session_id));
        };

        session.push_turn(question.into(), answer.into(), detected_intent);
        inner.ttl.touch(session_id);
        trace!(session_id = %session_id, turns = session.turn_count(), "Turn recorded");

        inner.persistence.save(session)
    }

    /// Snapshot a live session without resetting its idle timer.
    pub async fn get(&self, session_id: &SessionId) -> Option<Session> {
        let inner = self.inner.read().await;
        if inner.ttl.is_expired(session_id) {
            None
        } else {
            inner.lru.peek(session_id).cloned()
        }
    }

    /// Remove a session from memory and persistence.
    pub async fn remove(&self, session_id: &SessionId) -> Result<Option<Session>> {
        let mut inner = self.inner.write().await;

        inner.ttl.remove(session_id);
        let session = inner.lru.pop(session_id);
        if session.is_some() {
            inner.persistence.delete(session_id)?;
            debug!(session_id = %session_id, "Session removed");
        }

        Ok(session)
    }

    /// Drop every session idle past the TTL. Returns how many were dropped.
    pub async fn cleanup_expired(&self) -> usize {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        let expired = inner.ttl.drain_expired();

        let mut count = 0;
        for session_id in expired {
            if inner.lru.pop(&session_id).is_some() {
                inner.notify_evict(&session_id);
                count += 1;
            }
        }

        if count > 0 {
            debug!(count, "Cleaned up expired sessions");
        }
        count
    }

    /// Get store statistics.
    pub async fn stats(&self) -> StoreStats {
        let inner = self.inner.read().await;
        StoreStats {
            size: inner.lru.len(),
            capacity: self.config.max_sessions,
            ttl_tracked: inner.ttl.len(),
        }
    }

    /// Start the periodic expiry sweep, if enabled and a TTL is configured.
    ///
    /// The task stops on its own once every handle to the store is dropped.
    pub fn spawn_cleanup_task(&self) -> Option<JoinHandle<()>> {
        if !self.config.enable_cleanup_task || self.config.idle_ttl.is_none() {
            return None;
        }

        let weak: Weak<RwLock<StoreInner>> = Arc::downgrade(&self.inner);
        let config = self.config.clone();
        let period = config.cleanup_interval.max(Duration::from_secs(1));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Some(tokio::spawn(async move {
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    debug!("Session store dropped, stopping cleanup task");
                    break;
                };
                let store = SessionStore {
                    inner,
                    config: config.clone(),
                };
                store.cleanup_expired().await;
            }
        }))
    }
}

/// Store statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Sessions currently in memory.
    pub size: usize,
    /// Maximum capacity.
    pub capacity: usize,
    /// Sessions tracked for idle expiry.
    pub ttl_tracked: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::advance;

    fn intent() -> DetectedIntent {
        DetectedIntent {
            intent: "coverage".to_string(),
            route: "policy_info".to_string(),
            score: 0.8,
        }
    }

    #[tokio::test]
    async fn test_resolve_without_id_mints() {
        let store = SessionStore::new(StoreConfig::default());

        let a = store.resolve(None).await.unwrap();
        let b = store.resolve(None).await.unwrap();

        assert_ne!(a.session_id, b.session_id);
        assert!(a.is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_resolve_existing_returns_same_session() {
        let store = SessionStore::new(StoreConfig::default());
        let first = store.resolve(None).await.unwrap();
        store
            .record_turn(first.session_id, "q1", "a1", Some(intent()))
            .await
            .unwrap();

        let again = store.resolve(Some(first.session_id)).await.unwrap();

        assert_eq!(again.session_id, first.session_id);
        assert_eq!(again.turn_count(), 1);
        assert_eq!(again.last_detected_intent, Some(intent()));
    }

    #[tokio::test]
    async fn test_resolve_unknown_id_mints_different() {
        let store = SessionStore::new(StoreConfig::default());
        let unknown = Uuid::new_v4();

        let session = store.resolve(Some(unknown)).await.unwrap();

        assert_ne!(session.session_id, unknown);
        assert!(store.get(&unknown).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_is_replaced() {
        let store = SessionStore::new(StoreConfig::new().with_idle_ttl(Duration::from_secs(60)));
        let first = store.resolve(None).await.unwrap();

        advance(Duration::from_secs(61)).await;

        let next = store.resolve(Some(first.session_id)).await.unwrap();
        assert_ne!(next.session_id, first.session_id);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activity_keeps_session_alive() {
        let store = SessionStore::new(StoreConfig::new().with_idle_ttl(Duration::from_secs(60)));
        let session = store.resolve(None).await.unwrap();

        advance(Duration::from_secs(40)).await;
        store.record_turn(session.session_id, "q", "a", None).await.unwrap();
        advance(Duration::from_secs(40)).await;

        let again = store.resolve(Some(session.session_id)).await.unwrap();
        assert_eq!(again.session_id, session.session_id);
    }

    #[tokio::test]
    async fn test_record_turn_on_missing_session() {
        let store = SessionStore::new(StoreConfig::default());
        let missing = Uuid::new_v4();

        let err = store.record_turn(missing, "q", "a", None).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = SessionStore::new(StoreConfig::new().with_max_sessions(2));
        let a = store.resolve(None).await.unwrap();
        let b = store.resolve(None).await.unwrap();

        // Touch a so b becomes least recently used.
        store.resolve(Some(a.session_id)).await.unwrap();
        let c = store.resolve(None).await.unwrap();

        assert_eq!(store.len().await, 2);
        assert!(store.get(&a.session_id).await.is_some());
        assert!(store.get(&b.session_id).await.is_none());
        assert!(store.get(&c.session_id).await.is_some());
        assert_eq!(store.stats().await.ttl_tracked, 2);
    }

    #[tokio::test]
    async fn test_concurrent_turns_serialize() {
        let store = SessionStore::new(StoreConfig::default());
        let id = store.resolve(None).await.unwrap().session_id;

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .record_turn(id, format!("q{}", i), format!("a{}", i), None)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = store.get(&id).await.unwrap();
        assert_eq!(session.turn_count(), 32);
        for turn in &session.turns {
            assert_eq!(turn.question[1..], turn.answer[1..]);
        }
    }

    #[tokio::test]
    async fn test_remove() {
        let store = SessionStore::new(StoreConfig::default());
        let id = store.resolve(None).await.unwrap().session_id;

        assert!(store.remove(&id).await.unwrap().is_some());
        assert!(store.remove(&id).await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let store = SessionStore::new(StoreConfig::new().with_idle_ttl(Duration::from_secs(10)));
        for _ in 0..3 {
            store.resolve(None).await.unwrap();
        }

        advance(Duration::from_secs(11)).await;
        let fresh = store.resolve(None).await.unwrap();

        assert_eq!(store.cleanup_expired().await, 3);
        assert_eq!(store.len().await, 1);
        assert!(store.get(&fresh.session_id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_task_sweeps() {
        let store = SessionStore::new(
            StoreConfig::new()
                .with_idle_ttl(Duration::from_secs(10))
                .with_cleanup_interval(Duration::from_secs(5)),
        );
        let handle = store.spawn_cleanup_task().unwrap();
        store.resolve(None).await.unwrap();

        tokio::time::sleep(Duration::from_secs(16)).await;

        assert!(store.is_empty().await);
        handle.abort();
    }

    #[test]
    fn test_no_cleanup_task_without_ttl() {
        let store = SessionStore::new(StoreConfig::new().without_idle_ttl());
        assert!(store.spawn_cleanup_task().is_none());
    }

    #[derive(Default)]
    struct RecordingPersistence {
        saved: Mutex<Vec<Session>>,
        stored: Mutex<Option<Session>>,
        fail_load: bool,
    }

    impl SessionPersistence for RecordingPersistence {
        fn load(&self, session_id: &SessionId) -> Result<Option<Session>> {
            if self.fail_load {
                return Err(SessionError::Persistence("disk unavailable".to_string()));
            }
            Ok(self
                .stored
                .lock()
                .unwrap()
                .clone()
                .filter(|s| &s.session_id == session_id))
        }

        fn save(&self, session: &Session) -> Result<()> {
            self.saved.lock().unwrap().push(session.clone());
            Ok(())
        }

        fn delete(&self, _session_id: &SessionId) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_persistence_load_and_save() {
        let mut stored = Session::new(Uuid::new_v4());
        stored.push_turn("earlier".into(), "answer".into(), None);
        let id = stored.session_id;

        let persistence = RecordingPersistence {
            stored: Mutex::new(Some(stored)),
            ..Default::default()
        };
        let store = SessionStore::with_persistence(StoreConfig::default(), persistence);

        let session = store.resolve(Some(id)).await.unwrap();
        assert_eq!(session.session_id, id);
        assert_eq!(session.turn_count(), 1);

        store.record_turn(id, "q", "a", None).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().turn_count(), 2);
    }

    #[tokio::test]
    async fn test_persistence_failure_surfaces() {
        let persistence = RecordingPersistence {
            fail_load: true,
            ..Default::default()
        };
        let store = SessionStore::with_persistence(StoreConfig::default(), persistence);

        let err = store.resolve(Some(Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, SessionError::Persistence(_)));
    }
}
