//! Session inspection endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use docent_session::{Session, Turn};
use docent_types::{DetectedIntent, SessionId};

use crate::error::ServerError;
use crate::state::AppState;

/// Snapshot of a live session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDetail {
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turn_count: usize,
    /// All turns, oldest first.
    pub turns: Vec<Turn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_detected_intent: Option<DetectedIntent>,
}

impl From<Session> for SessionDetail {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            created_at: session.created_at,
            last_active_at: session.last_active_at,
            turn_count: session.turn_count(),
            turns: session.turns,
            last_detected_intent: session.last_detected_intent,
        }
    }
}

/// GET /mcp/sessions/{id} - Session snapshot.
///
/// Reading a session does not refresh its idle timer.
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetail>, ServerError> {
    let id = parse_session_id(&session_id)?;

    state
        .sessions()
        .get(&id)
        .await
        .map(|s| Json(s.into()))
        .ok_or_else(|| ServerError::NotFound(format!("Session {} not found", session_id)))
}

/// DELETE /mcp/sessions/{id} - End a session.
pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let id = parse_session_id(&session_id)?;

    match state.sessions().remove(&id).await? {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ServerError::NotFound(format!(
            "Session {} not found",
            session_id
        ))),
    }
}

fn parse_session_id(s: &str) -> Result<SessionId, ServerError> {
    Uuid::parse_str(s).map_err(|_| ServerError::BadRequest(format!("Invalid session ID: {}", s)))
}
