//! Tool vocabulary: which tools exist, how callers invoke them, and what
//! an invocation produces.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Parameters passed to a tool. Unknown keys are ignored by adapters.
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Closed set of tool identifiers.
///
/// Adding a variant requires a matching adapter registered in the tool
/// registry; nothing else needs to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Classify the question into an intent and route.
    IntentDetection,
    /// Retrieve ranked passages from the vector index.
    VectorSearch,
}

impl ToolType {
    /// Every tool type, in declaration order.
    pub const ALL: [ToolType; 2] = [ToolType::IntentDetection, ToolType::VectorSearch];

    /// Wire name of the tool type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::IntentDetection => "intent_detection",
            ToolType::VectorSearch => "vector_search",
        }
    }
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownToolType(s.to_string()))
    }
}

/// A request to run one tool with the given parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_type: ToolType,
    #[serde(default)]
    pub parameters: Parameters,
}

impl ToolInvocation {
    /// Invocation with no parameters.
    pub fn new(tool_type: ToolType) -> Self {
        Self {
            tool_type,
            parameters: Parameters::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a single tool run.
///
/// Serialized inline with the owning [`ToolResult`] as
/// `{"status": "success", "data": ...}` or `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Success { data: serde_json::Value },
    Error { message: String },
}

/// Result produced by exactly one tool adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_type: ToolType,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

impl ToolResult {
    /// Successful result carrying `data`.
    pub fn success(tool_type: ToolType, data: serde_json::Value) -> Self {
        Self {
            tool_type,
            outcome: ToolOutcome::Success { data },
        }
    }

    /// Failed result carrying a descriptive message.
    pub fn error(tool_type: ToolType, message: impl Into<String>) -> Self {
        Self {
            tool_type,
            outcome: ToolOutcome::Error {
                message: message.into(),
            },
        }
    }

    /// Whether the tool succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    /// Payload of a successful result.
    pub fn data(&self) -> Option<&serde_json::Value> {
        match &self.outcome {
            ToolOutcome::Success { data } => Some(data),
            ToolOutcome::Error { .. } => None,
        }
    }

    /// Error message of a failed result.
    pub fn message(&self) -> Option<&str> {
        match &self.outcome {
            ToolOutcome::Success { .. } => None,
            ToolOutcome::Error { message } => Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_type_parse() {
        assert_eq!(
            "vector_search".parse::<ToolType>().unwrap(),
            ToolType::VectorSearch
        );
        assert_eq!(
            "intent_detection".parse::<ToolType>().unwrap(),
            ToolType::IntentDetection
        );
        assert_eq!(
            "policy_lookup".parse::<ToolType>(),
            Err(ValidationError::UnknownToolType("policy_lookup".to_string()))
        );
    }

    #[test]
    fn test_tool_type_serde_matches_as_str() {
        for tool in ToolType::ALL {
            let encoded = serde_json::to_value(tool).unwrap();
            assert_eq!(encoded, json!(tool.as_str()));
        }
    }

    #[test]
    fn test_tool_result_success_shape() {
        let result = ToolResult::success(ToolType::VectorSearch, json!({"matches": []}));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["tool_type"], "vector_search");
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"], json!({"matches": []}));
        assert!(value.get("message").is_none());
    }

    #[test]
    fn test_tool_result_error_shape() {
        let result = ToolResult::error(ToolType::IntentDetection, "classifier timed out");
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["status"], "error");
        assert_eq!(value["message"], "classifier timed out");
        assert!(value.get("data").is_none());
        assert!(!result.is_success());
        assert_eq!(result.message(), Some("classifier timed out"));
        assert!(result.data().is_none());
    }

    #[test]
    fn test_tool_result_deserialize() {
        let result: ToolResult = serde_json::from_value(json!({
            "tool_type": "intent_detection",
            "status": "success",
            "data": {"intent": "coverage"}
        }))
        .unwrap();

        assert!(result.is_success());
        assert_eq!(result.data().unwrap()["intent"], "coverage");
    }

    #[test]
    fn test_invocation_with_param() {
        let inv = ToolInvocation::new(ToolType::VectorSearch).with_param("top_k", 3);
        assert_eq!(inv.parameters["top_k"], 3);
    }
}
