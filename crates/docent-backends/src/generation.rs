//! Answer generation capability.
//!
//! The controller supplies the question, any retrieved passages, and a
//! rendered prompt; the generator returns the answer text. Any
//! OpenAI-compatible chat completions endpoint (OpenAI, Groq, Ollama, vLLM)
//! can serve as the backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{BackendError, Result};
use crate::retry::{status_error, with_retry};

/// Default OpenAI API base URL.
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";

/// Default system prompt for the answering model.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an insurance policy assistant. Answer questions \
accurately and helpfully using only the information you are given. If that information is not \
enough to answer, say so rather than making something up. Do not cite documents in your answer; \
sources are displayed separately.";

/// One prior exchange in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

/// Input to a generation call.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// The user's question.
    pub question: String,
    /// Retrieved passages, best first. `None` means no retrieval happened.
    pub passages: Option<Vec<String>>,
    /// Fully rendered user prompt (question and context already inlined).
    pub prompt: String,
    /// Earlier turns of the session, oldest first.
    pub history: Vec<ChatTurn>,
    /// Sampling temperature override.
    pub temperature: Option<f64>,
}

impl GenerationRequest {
    /// Request that answers `question` with the question itself as prompt.
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        Self {
            prompt: question.clone(),
            question,
            ..Default::default()
        }
    }

    /// Attach retrieved passages.
    pub fn with_passages(mut self, passages: Vec<String>) -> Self {
        self.passages = Some(passages);
        self
    }

    /// Replace the rendered prompt.
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Attach conversation history.
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }

    /// Set temperature.
    pub fn with_temperature(mut self, temperature: Option<f64>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Trait for answer generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce an answer for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<String>;

    /// Name of this generator, for logs.
    fn name(&self) -> &str;
}

/// A shared generator that can be used across threads.
pub type SharedGenerator = Arc<dyn Generator>;

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible Generator
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the OpenAI-compatible generator.
#[derive(Debug, Clone)]
pub struct OpenAiGeneratorConfig {
    /// API key (optional for local services like Ollama).
    pub api_key: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// System prompt sent ahead of every conversation.
    pub system_prompt: String,
    /// Maximum output tokens.
    pub max_tokens: u32,
    /// Temperature used when the request does not set one.
    pub default_temperature: f64,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries for transient errors.
    pub max_retries: u32,
    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,
}

impl Default for OpenAiGeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 1024,
            default_temperature: 0.2,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl OpenAiGeneratorConfig {
    /// Create a config with an API key.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            ..Default::default()
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the system prompt.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the maximum output tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the fallback temperature.
    pub fn with_default_temperature(mut self, temperature: f64) -> Self {
        self.default_temperature = temperature;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Generator backed by a chat completions endpoint.
pub struct OpenAiGenerator {
    client: Client,
    config: OpenAiGeneratorConfig,
}

impl OpenAiGenerator {
    /// Create a new generator.
    pub fn new(config: OpenAiGeneratorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(request.history.len() * 2 + 2);
        messages.push(ChatMessage {
            role: "system",
            content: &self.config.system_prompt,
        });
        for turn in &request.history {
            messages.push(ChatMessage {
                role: "user",
                content: &turn.question,
            });
            messages.push(ChatMessage {
                role: "assistant",
                content: &turn.answer,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        ChatRequest {
            model: &self.config.model,
            messages,
            temperature: request
                .temperature
                .unwrap_or(self.config.default_temperature),
            max_tokens: self.config.max_tokens,
        }
    }

    async fn request(&self, body: &ChatRequest<'_>) -> Result<ChatResponse> {
        let mut builder = self.client.post(self.completions_url()).json(body);
        if let Some(ref key) = self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let body = self.build_body(&request);

        let response = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "openai",
            || self.request(&body),
        )
        .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BackendError::Malformed("completion contained no text".to_string()))?;

        debug!(model = %self.config.model, answer_len = text.len(), "Generated answer");
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
