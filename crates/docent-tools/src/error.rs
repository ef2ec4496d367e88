//! Error types for tool adapters.
//!
//! These never leave an adapter: [`ToolAdapter::run`](crate::ToolAdapter::run)
//! renders them into the message of an error [`ToolResult`](docent_types::ToolResult).

use docent_backends::BackendError;
use thiserror::Error;

use crate::params::ParameterValidationError;

/// Why a tool run failed.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The invocation parameters were unusable.
    #[error("invalid parameters: {0}")]
    InvalidParameters(#[from] ParameterValidationError),

    /// The upstream capability failed.
    #[error("{service} failed: {source}")]
    Upstream {
        service: &'static str,
        #[source]
        source: BackendError,
    },
}

impl ToolError {
    /// Wrap a backend failure from `service`.
    pub fn upstream(service: &'static str, source: BackendError) -> Self {
        Self::Upstream { service, source }
    }
}

/// Result type for tool runs.
pub type Result<T> = std::result::Result<T, ToolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_messages_name_the_failure() {
        let err = ToolError::upstream(
            "intent classifier",
            BackendError::Timeout(Duration::from_millis(250)),
        );
        assert_eq!(err.to_string(), "intent classifier failed: Timed out after 250ms");

        let err: ToolError =
            ParameterValidationError::invalid_value("question", "", "must not be empty").into();
        assert!(err.to_string().starts_with("invalid parameters:"));
    }
}
