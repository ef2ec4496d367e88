//! The closed set of tool adapters.

use docent_types::{Parameters, SessionId, ToolResult, ToolType};
use tracing::{debug, warn};

use crate::intent::IntentDetectionTool;
use crate::search::VectorSearchTool;

/// Per-request context handed to every adapter.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    /// The validated question of the request.
    pub question: &'a str,
    /// Session the request resolved to.
    pub session_id: SessionId,
}

impl<'a> ToolContext<'a> {
    pub fn new(question: &'a str, session_id: SessionId) -> Self {
        Self {
            question,
            session_id,
        }
    }
}

/// One adapter per [`ToolType`].
///
/// Adding a tool type means adding a variant here and registering an
/// instance in the [`ToolRegistry`](crate::ToolRegistry).
#[derive(Clone)]
pub enum ToolAdapter {
    IntentDetection(IntentDetectionTool),
    VectorSearch(VectorSearchTool),
}

impl ToolAdapter {
    /// The tool type this adapter serves.
    pub fn tool_type(&self) -> ToolType {
        match self {
            Self::IntentDetection(_) => ToolType::IntentDetection,
            Self::VectorSearch(_) => ToolType::VectorSearch,
        }
    }

    /// Run the tool. Never fails: problems become an error result.
    pub async fn run(&self, ctx: &ToolContext<'_>, params: &Parameters) -> ToolResult {
        let tool_type = self.tool_type();
        let outcome = match self {
            Self::IntentDetection(tool) => tool.execute(ctx, params).await,
            Self::VectorSearch(tool) => tool.execute(ctx, params).await,
        };

        match outcome {
            Ok(data) => {
                debug!(session_id = %ctx.session_id, tool = %tool_type, "Tool succeeded");
                ToolResult::success(tool_type, data)
            }
            Err(e) => {
                warn!(session_id = %ctx.session_id, tool = %tool_type, error = %e, "Tool failed");
                ToolResult::error(tool_type, e.to_string())
            }
        }
    }
}

impl std::fmt::Debug for ToolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ToolAdapter").field(&self.tool_type()).finish()
    }
}

impl From<IntentDetectionTool> for ToolAdapter {
    fn from(tool: IntentDetectionTool) -> Self {
        Self::IntentDetection(tool)
    }
}

impl From<VectorSearchTool> for ToolAdapter {
    fn from(tool: VectorSearchTool) -> Self {
        Self::VectorSearch(tool)
    }
}
