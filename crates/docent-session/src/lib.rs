//! Conversation session store.
//!
//! Sessions correlate the turns of one conversation under a UUID. The store
//! keeps them in memory with:
//! - LRU eviction to prevent unbounded memory growth
//! - Idle expiry for abandoned conversations
//! - An optional persistence collaborator for durability across restarts
//!
//! All reads and writes go through one lock, so a reader never observes a
//! half-recorded turn and concurrent turns on the same session serialize.
//!
//! # Example
//!
//! ```rust,ignore
//! use docent_session::{SessionStore, StoreConfig};
//!
//! let store = SessionStore::new(
//!     StoreConfig::default()
//!         .with_max_sessions(1000)
//!         .with_idle_ttl(Duration::from_secs(3600)),
//! );
//!
//! let session = store.resolve(None).await?;
//! store.record_turn(session.session_id, "Hi", "Hello!", None).await?;
//! ```

mod config;
mod error;
mod persistence;
mod session;
mod store;
mod ttl;

pub use config::{DEFAULT_CLEANUP_INTERVAL, DEFAULT_IDLE_TTL, DEFAULT_MAX_SESSIONS, StoreConfig};
pub use error::{Result, SessionError};
pub use persistence::{NoPersistence, SessionPersistence};
pub use session::{Session, Turn};
pub use store::{SessionStore, StoreStats};
pub use ttl::TtlTracker;
