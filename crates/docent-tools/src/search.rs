//! Semantic search adapter.
//!
//! Successful data has the shape
//!
//! ```json
//! {"top_k": 5, "matches": [{"id": "...", "name": "...", "type": "...", "excerpt": "...", "score": 0.87, "metadata": {}}]}
//! ```
//!
//! with matches ranked best first.

use docent_backends::{SharedVectorIndex, VectorMatch};
use docent_types::Parameters;
use serde_json::{Value, json};
use tracing::debug;

use crate::adapter::ToolContext;
use crate::error::{Result, ToolError};
use crate::intent::question_override;
use crate::params::{ParamExt, ParamResult};

/// Number of matches returned when the caller does not ask for a count.
pub const DEFAULT_TOP_K: usize = 5;

/// Largest number of matches a caller may ask for.
pub const DEFAULT_MAX_TOP_K: usize = 50;

/// Bounds applied to the `top_k` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    pub default_top_k: usize,
    pub max_top_k: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_top_k: DEFAULT_TOP_K,
            max_top_k: DEFAULT_MAX_TOP_K,
        }
    }
}

impl SearchLimits {
    /// Create limits. The maximum is raised to at least 1 and the default is
    /// kept within `1..=max`.
    pub fn new(default_top_k: usize, max_top_k: usize) -> Self {
        let max_top_k = max_top_k.max(1);
        Self {
            default_top_k: default_top_k.clamp(1, max_top_k),
            max_top_k,
        }
    }

    /// Clamp a requested `top_k`. Missing, zero, or negative values fall back
    /// to the default; values above the maximum become the maximum.
    pub fn clamp(&self, requested: Option<i64>) -> usize {
        match requested {
            None => self.default_top_k,
            Some(n) if n <= 0 => self.default_top_k,
            Some(n) => usize::try_from(n)
                .unwrap_or(usize::MAX)
                .min(self.max_top_k),
        }
    }
}

/// Parsed parameters of a search invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams<'a> {
    pub query: &'a str,
    pub top_k: usize,
    pub filter: Option<&'a Value>,
}

impl<'a> SearchParams<'a> {
    /// Read `question`, `top_k` and `filter` from the invocation parameters.
    pub fn parse(
        ctx: &ToolContext<'a>,
        params: &'a Parameters,
        limits: &SearchLimits,
    ) -> ParamResult<Self> {
        Ok(Self {
            query: question_override(params)?.unwrap_or(ctx.question),
            top_k: limits.clamp(params.optional_i64("top_k")?),
            filter: params.optional_object("filter")?,
        })
    }
}

/// Retrieves ranked passages for the question from a vector index.
#[derive(Clone)]
pub struct VectorSearchTool {
    index: SharedVectorIndex,
    limits: SearchLimits,
}

impl VectorSearchTool {
    pub fn new(index: SharedVectorIndex, limits: SearchLimits) -> Self {
        Self { index, limits }
    }

    pub fn limits(&self) -> &SearchLimits {
        &self.limits
    }

    pub(crate) async fn execute(&self, ctx: &ToolContext<'_>, params: &Parameters) -> Result<Value> {
        let search = SearchParams::parse(ctx, params, &self.limits)?;

        let mut matches = self
            .index
            .query(search.query, search.top_k, search.filter)
            .await
            .map_err(|e| ToolError::upstream("vector search", e))?;
        matches.truncate(search.top_k);

        debug!(
            session_id = %ctx.session_id,
            index = self.index.name(),
            top_k = search.top_k,
            found = matches.len(),
            "Vector search completed"
        );

        Ok(json!({
            "top_k": search.top_k,
            "matches": matches,
        }))
    }
}

/// Decode the matches out of a successful search result's data.
///
/// Entries that do not decode are skipped.
pub fn matches_from_data(data: &Value) -> Vec<VectorMatch> {
    data.get("matches")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|m| serde_json::from_value(m.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}
