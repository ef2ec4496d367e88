//! Intent detection adapter.

use docent_backends::SharedClassifier;
use docent_types::Parameters;
use serde_json::{Value, json};

use crate::adapter::ToolContext;
use crate::error::{Result, ToolError};
use crate::params::{ParamExt, ParamResult, ParameterValidationError};

/// Classifies the question (or a `question` parameter override) into an
/// intent and route.
///
/// Successful data is `{"intent": ..., "route": ..., "score": ...}`.
#[derive(Clone)]
pub struct IntentDetectionTool {
    classifier: SharedClassifier,
}

impl IntentDetectionTool {
    pub fn new(classifier: SharedClassifier) -> Self {
        Self { classifier }
    }

    pub(crate) async fn execute(&self, ctx: &ToolContext<'_>, params: &Parameters) -> Result<Value> {
        let text = question_override(params)?.unwrap_or(ctx.question);

        let classification = self
            .classifier
            .classify(text)
            .await
            .map_err(|e| ToolError::upstream("intent classifier", e))?;
        classification
            .check_score()
            .map_err(|e| ToolError::upstream("intent classifier", e))?;

        Ok(json!({
            "intent": classification.intent,
            "route": classification.route,
            "score": classification.score,
        }))
    }
}

/// The `question` parameter, if the caller supplied a usable one.
pub(crate) fn question_override(params: &Parameters) -> ParamResult<Option<&str>> {
    match params.optional_str("question")? {
        Some(q) if q.trim().is_empty() => Err(ParameterValidationError::invalid_value(
            "question",
            q,
            "must not be empty",
        )),
        Some(q) => Ok(Some(q.trim())),
        None => Ok(None),
    }
}
