//! Error types for external capability calls.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using the backend error type.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Failure of an upstream capability.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Network/connectivity failure (retryable).
    #[error("Network error: {0}")]
    Network(String),

    /// The call did not complete within its deadline.
    #[error("Timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Upstream answered with a non-success status.
    #[error("Backend error: HTTP {status} - {body}")]
    Backend { status: u16, body: String },

    /// Upstream answered, but the body did not have the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Upstream throttled the request (retryable).
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Missing API key, bad URL, or similar.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl BackendError {
    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit(_))
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimit(body)
        } else {
            Self::Backend {
                status: status.as_u16(),
                body,
            }
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            BackendError::Network(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            BackendError::Malformed(err.to_string())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable() {
        assert!(BackendError::Network("reset".to_string()).is_retryable());
        assert!(BackendError::RateLimit("slow down".to_string()).is_retryable());
        assert!(!BackendError::Malformed("bad".to_string()).is_retryable());
        assert!(!BackendError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(
            !BackendError::Backend {
                status: 500,
                body: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_from_status() {
        let err = BackendError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "x".into());
        assert!(matches!(err, BackendError::RateLimit(_)));

        let err = BackendError::from_status(reqwest::StatusCode::BAD_GATEWAY, "down".into());
        assert_eq!(err.to_string(), "Backend error: HTTP 502 - down");
    }

    #[test]
    fn test_timeout_display() {
        let err = BackendError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timed out after 250ms");
    }
}
