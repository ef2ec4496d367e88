//! Protocol model for the docent controller.
//!
//! Pure data definitions shared by every other crate: the tool vocabulary,
//! inbound requests, outbound responses, and the validation rules applied
//! when a request is constructed.

mod error;
mod request;
mod response;
mod tool;

pub use error::{Result, ValidationError};
pub use request::{McpRequest, McpRequestBody, ToolInvocationBody};
pub use response::{DetectedIntent, McpResponse, Source};
pub use tool::{Parameters, ToolInvocation, ToolOutcome, ToolResult, ToolType};

/// Session identifier carried in requests and responses.
pub type SessionId = uuid::Uuid;
