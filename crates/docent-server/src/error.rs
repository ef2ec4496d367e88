//! Error types for the server.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use docent_session::SessionError;
use docent_types::ValidationError;

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The request body failed protocol validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Bad request (undecodable body, malformed path parameter).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body exceeded the configured limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Session store failure.
    #[error("Session store error: {0}")]
    Session(#[from] SessionError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ServerError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            ServerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServerError::Session(_) => (StatusCode::INTERNAL_SERVER_ERROR, "session_error"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(rejection.body_text())
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, code, error = %message, "Server error");
        } else {
            tracing::warn!(status = %status, code, error = %message, "Client error");
        }

        let body = ErrorResponse {
            code: code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = ServerError::from(ValidationError::EmptyQuestion).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ServerError::NotFound("x".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "not_found")
        );
        assert_eq!(
            ServerError::Session(SessionError::Persistence("disk".into())).status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "session_error")
        );
    }

    #[test]
    fn test_validation_message_is_bare() {
        let err = ServerError::from(ValidationError::TemperatureOutOfRange(1.5));
        assert_eq!(
            err.to_string(),
            "temperature 1.5 is out of range: must be between 0.0 and 1.0"
        );
    }
}
