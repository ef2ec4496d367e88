//! The question-answering endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use tracing::debug;

use docent_types::{McpRequestBody, McpResponse};

use crate::error::ServerError;
use crate::state::AppState;

/// POST /mcp/query - Answer one question.
///
/// Only an undecodable or invalid body is rejected. Tool, session, and
/// generation failures are reported inside a normal 200 response.
pub async fn query_handler(
    State(state): State<AppState>,
    payload: Result<Json<McpRequestBody>, JsonRejection>,
) -> Result<Json<McpResponse>, ServerError> {
    let Json(body) = payload?;
    let request = body.validate()?;

    debug!(
        tools = request.tools().len(),
        has_session = request.session_id().is_some(),
        "Received query"
    );

    Ok(Json(state.controller.process(request).await))
}
