//! Request validation errors.

use thiserror::Error;

/// Result type for protocol validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A malformed inbound request. Fatal to the request: no tool runs and no
/// session is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The question was absent, empty, or whitespace only.
    #[error("question cannot be empty")]
    EmptyQuestion,

    /// Temperature outside the closed interval [0, 1] (or NaN).
    #[error("temperature {0} is out of range: must be between 0.0 and 1.0")]
    TemperatureOutOfRange(f64),

    /// A tool invocation named a tool type that does not exist.
    #[error("unknown tool type '{0}'")]
    UnknownToolType(String),
}
