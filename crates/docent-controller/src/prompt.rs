//! Prompt templates.
//!
//! Templates use `{name}` placeholders. Rendering substitutes known
//! variables and leaves unknown placeholders untouched, so literal braces in
//! template text survive.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Template used when passages were retrieved.
pub const DEFAULT: &str = "default";
/// Template used when passages were retrieved and an intent is known.
pub const INTENT_DETECTED: &str = "intent_detected";
/// Template used when search ran but found nothing.
pub const INSUFFICIENT_INFO: &str = "insufficient_info";
/// Template used when no search results are available.
pub const DIRECT: &str = "direct";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
});

const DEFAULT_TEMPLATE: &str = "Answer the following question accurately and helpfully.

Question: {question}

Use only the information from the provided context to answer:
{context}";

const INTENT_DETECTED_TEMPLATE: &str = "The user appears to be interested in {intent}.

Question: {question}

Based on this intent and the following policy information:
{context}

Provide a helpful response that addresses their specific intent. If they appear to be \
interested in purchasing a policy or learning about specific coverage, highlight the most \
relevant details. If the information needed is not in the context, say you don't have enough \
information rather than guessing.";

const INSUFFICIENT_INFO_TEMPLATE: &str = "Question: {question}

The policy documents did not contain specific information to answer this question.

Provide a helpful response that acknowledges the limits of the available information, \
suggests what additional details would help, and points the user to {support_contact} for \
anything you cannot answer.";

const DIRECT_TEMPLATE: &str = "Question: {question}

Answer briefly. If the question needs specific policy details you do not have, say so.";

/// A named template with `{placeholder}` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Raw template text.
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute `vars` into the template.
    pub fn render(&self, vars: &HashMap<String, String>) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Placeholder names in order of first appearance.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(&self.template) {
            if let Some(m) = caps.get(1)
                && !names.contains(&m.as_str())
            {
                names.push(m.as_str());
            }
        }
        names
    }
}

/// Named templates plus library-wide default variables.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<String, PromptTemplate>,
    defaults: HashMap<String, String>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::empty()
            .with_template(DEFAULT, DEFAULT_TEMPLATE)
            .with_template(INTENT_DETECTED, INTENT_DETECTED_TEMPLATE)
            .with_template(INSUFFICIENT_INFO, INSUFFICIENT_INFO_TEMPLATE)
            .with_template(DIRECT, DIRECT_TEMPLATE)
            .with_variable("support_contact", "customer service")
    }
}

impl PromptLibrary {
    /// A library with no templates.
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
            defaults: HashMap::new(),
        }
    }

    /// Add or replace a template.
    pub fn with_template(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates
            .insert(name.into(), PromptTemplate::new(template));
        self
    }

    /// Set a variable applied to every render unless overridden per call.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Look up a template.
    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates.get(name)
    }

    /// Template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render a template with the library defaults overlaid by `vars`.
    ///
    /// Returns `None` if no template has that name.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> Option<String> {
        let template = self.get(name)?;
        let mut merged = self.defaults.clone();
        for (key, value) in vars {
            merged.insert((*key).to_string(), (*value).to_string());
        }
        Some(template.render(&merged))
    }
}
