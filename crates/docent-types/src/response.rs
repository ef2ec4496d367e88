//! Outbound structured answer.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::ToolResult;

/// Citation linking the answer to a retrieved document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl Source {
    pub fn new(name: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_type: doc_type.into(),
        }
    }
}

/// Intent reported by a successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedIntent {
    pub intent: String,
    pub route: String,
    /// Confidence in [0, 1].
    pub score: f64,
}

impl DetectedIntent {
    /// Decode an intent from tool data, rejecting out-of-range scores.
    pub fn from_data(data: &serde_json::Value) -> Option<Self> {
        let intent: DetectedIntent = serde_json::from_value(data.clone()).ok()?;
        (0.0..=1.0).contains(&intent.score).then_some(intent)
    }
}

/// Structured answer for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    pub session_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_intent: Option<DetectedIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<ToolResult>>,
}
