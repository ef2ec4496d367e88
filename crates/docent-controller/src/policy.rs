//! Implicit tool selection.
//!
//! When a request names no tools, the controller asks its
//! [`SelectionPolicy`] what to run. Selection happens in two stages: the
//! `initial` invocations run concurrently, then `follow_up` may add more
//! based on their results. The controller's dispatch loop is the same for
//! every policy.

use std::collections::HashSet;
use std::sync::Arc;

use docent_types::{DetectedIntent, ToolInvocation, ToolResult, ToolType};
use regex::Regex;

use crate::error::{ControllerError, Result};

/// Routes that do not call for document retrieval.
pub const DEFAULT_NON_INFORMATIONAL_ROUTES: &[&str] = &["greeting", "chitchat", "goodbye"];

/// Question patterns that call for document retrieval.
pub const DEFAULT_SEARCH_PATTERNS: &[&str] = &[
    r"what (does|do|is|are)",
    r"tell me about",
    r"explain",
    r"information",
    r"details",
];

/// Strategy deciding which tools run when the caller names none.
pub trait SelectionPolicy: Send + Sync {
    /// Policy name, for logs.
    fn name(&self) -> &str;

    /// Tools to run first.
    fn initial(&self, question: &str) -> Vec<ToolInvocation>;

    /// Tools to run after the initial ones finished. Defaults to none.
    fn follow_up(&self, _question: &str, _results: &[ToolResult]) -> Vec<ToolInvocation> {
        Vec::new()
    }
}

/// A shared policy that can be used across threads.
pub type SharedPolicy = Arc<dyn SelectionPolicy>;

/// Intent from the first successful classification, if any.
pub(crate) fn classified_intent(results: &[ToolResult]) -> Option<DetectedIntent> {
    results
        .iter()
        .filter(|r| r.tool_type == ToolType::IntentDetection)
        .find_map(|r| r.data().and_then(DetectedIntent::from_data))
}

/// Classify, then search unless the question routed somewhere that needs no
/// documents. A failed classification still searches.
#[derive(Debug, Clone)]
pub struct IntentGatedSearch {
    non_informational: HashSet<String>,
}

impl IntentGatedSearch {
    pub fn new<I, S>(non_informational_routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            non_informational: non_informational_routes
                .into_iter()
                .map(|r| r.as_ref().to_lowercase())
                .collect(),
        }
    }
}

impl Default for IntentGatedSearch {
    fn default() -> Self {
        Self::new(DEFAULT_NON_INFORMATIONAL_ROUTES)
    }
}

impl SelectionPolicy for IntentGatedSearch {
    fn name(&self) -> &str {
        "intent_gated"
    }

    fn initial(&self, _question: &str) -> Vec<ToolInvocation> {
        vec![ToolInvocation::new(ToolType::IntentDetection)]
    }

    fn follow_up(&self, _question: &str, results: &[ToolResult]) -> Vec<ToolInvocation> {
        match classified_intent(results) {
            Some(intent) if self.non_informational.contains(&intent.route.to_lowercase()) => {
                Vec::new()
            }
            _ => vec![ToolInvocation::new(ToolType::VectorSearch)],
        }
    }
}

/// Only classify. Answers come from the direct strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOnly;

impl SelectionPolicy for ClassifyOnly {
    fn name(&self) -> &str {
        "classify_only"
    }

    fn initial(&self, _question: &str) -> Vec<ToolInvocation> {
        vec![ToolInvocation::new(ToolType::IntentDetection)]
    }
}

/// Classify, and search alongside it when the question matches a pattern.
///
/// Patterns match against the lower-cased question.
#[derive(Debug, Clone)]
pub struct KeywordPolicy {
    patterns: Vec<Regex>,
}

impl KeywordPolicy {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                Regex::new(p.as_ref()).map_err(|source| ControllerError::InvalidPattern {
                    pattern: p.as_ref().to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Policy with the built-in patterns.
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_SEARCH_PATTERNS)
    }

    fn wants_search(&self, question: &str) -> bool {
        let lowered = question.to_lowercase();
        self.patterns.iter().any(|p| p.is_match(&lowered))
    }
}

impl SelectionPolicy for KeywordPolicy {
    fn name(&self) -> &str {
        "keyword"
    }

    fn initial(&self, question: &str) -> Vec<ToolInvocation> {
        let mut tools = vec![ToolInvocation::new(ToolType::IntentDetection)];
        if self.wants_search(question) {
            tools.push(ToolInvocation::new(ToolType::VectorSearch));
        }
        tools
    }
}
