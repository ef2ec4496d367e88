//! Controller tuning.

use std::time::Duration;

/// Default bound on a single tool call.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on answer generation.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of prior turns passed to the generator.
pub const DEFAULT_HISTORY_TURNS: usize = 6;

/// Answer returned when generation fails.
pub const FALLBACK_ANSWER: &str = "Sorry, I encountered an error while preparing an answer. \
Please try again in a moment.";

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Each tool call is abandoned after this long and reported as an error.
    pub tool_timeout: Duration,
    /// Generation is abandoned after this long and the fallback answer used.
    pub generation_timeout: Duration,
    /// Prior turns of the session passed to the generator as history.
    pub history_turns: usize,
    /// Answer used when generation fails.
    pub fallback_answer: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            history_turns: DEFAULT_HISTORY_TURNS,
            fallback_answer: FALLBACK_ANSWER.to_string(),
        }
    }
}

impl ControllerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-tool timeout.
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    /// Set the generation timeout.
    pub fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Set how many prior turns reach the generator.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Set the fallback answer.
    pub fn with_fallback_answer(mut self, answer: impl Into<String>) -> Self {
        self.fallback_answer = answer.into();
        self
    }
}
