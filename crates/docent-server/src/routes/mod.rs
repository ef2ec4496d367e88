//! API routes.

pub mod health;
pub mod query;
pub mod sessions;

pub use health::{HealthResponse, health_routes};
pub use query::query_handler;
pub use sessions::{SessionDetail, delete_session_handler, get_session_handler};
