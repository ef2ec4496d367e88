//! Immutable mapping from tool type to adapter.

use std::collections::HashMap;

use docent_types::{ToolInvocation, ToolResult, ToolType};
use tracing::warn;

use crate::adapter::{ToolAdapter, ToolContext};

/// Registry of tool adapters, built once at startup and read-only after.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    adapters: HashMap<ToolType, ToolAdapter>,
}

impl ToolRegistry {
    /// Start building a registry.
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Get the adapter for a tool type.
    pub fn get(&self, tool_type: ToolType) -> Option<&ToolAdapter> {
        self.adapters.get(&tool_type)
    }

    /// Check if a tool type has an adapter.
    pub fn contains(&self, tool_type: ToolType) -> bool {
        self.adapters.contains_key(&tool_type)
    }

    /// Registered tool types, in declaration order.
    pub fn tool_types(&self) -> Vec<ToolType> {
        let mut types: Vec<ToolType> = self.adapters.keys().copied().collect();
        types.sort();
        types
    }

    /// Number of registered adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Run one invocation. An unregistered tool type yields an error result.
    pub async fn run(&self, invocation: &ToolInvocation, ctx: &ToolContext<'_>) -> ToolResult {
        match self.get(invocation.tool_type) {
            Some(adapter) => adapter.run(ctx, &invocation.parameters).await,
            None => {
                warn!(tool = %invocation.tool_type, "No adapter registered for tool");
                ToolResult::error(
                    invocation.tool_type,
                    format!("tool '{}' is not available", invocation.tool_type),
                )
            }
        }
    }
}

/// Builder for [`ToolRegistry`].
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    adapters: HashMap<ToolType, ToolAdapter>,
}

impl ToolRegistryBuilder {
    /// Register an adapter, replacing any earlier one for the same tool type.
    pub fn register(mut self, adapter: impl Into<ToolAdapter>) -> Self {
        let adapter = adapter.into();
        if self.adapters.insert(adapter.tool_type(), adapter).is_some() {
            warn!("Replaced previously registered tool adapter");
        }
        self
    }

    pub fn build(self) -> ToolRegistry {
        ToolRegistry {
            adapters: self.adapters,
        }
    }
}
