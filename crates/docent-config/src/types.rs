//! Configuration types.
//!
//! Every section is optional so that layered files only need to name what
//! they change; accessors fall back to section defaults.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::Result;

/// Root configuration.
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8080"
///
/// [session]
/// max_sessions = 10000
/// idle_ttl_secs = 3600
///
/// [tools]
/// timeout_ms = 5000
/// default_top_k = 5
///
/// [classifier]
/// url = "http://127.0.0.1:8000/predict"
///
/// [vector]
/// host = "https://policy-assistant-xxxx.svc.pinecone.io"
///
/// [generation]
/// model = "gpt-4o-mini"
///
/// [policy]
/// kind = "intent_gated"
/// non_informational_routes = ["greeting", "chitchat", "goodbye"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<VectorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsConfig>,
}

impl DocentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one.
    ///
    /// Sections present in `other` replace the corresponding section here.
    /// Prompt templates and variables merge key by key.
    pub fn merge(&mut self, other: DocentConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.session.is_some() {
            self.session = other.session;
        }
        if other.tools.is_some() {
            self.tools = other.tools;
        }
        if other.classifier.is_some() {
            self.classifier = other.classifier;
        }
        if other.vector.is_some() {
            self.vector = other.vector;
        }
        if other.embedding.is_some() {
            self.embedding = other.embedding;
        }
        if other.generation.is_some() {
            self.generation = other.generation;
        }
        if other.policy.is_some() {
            self.policy = other.policy;
        }
        if let Some(prompts) = other.prompts {
            match self.prompts {
                Some(ref mut existing) => {
                    existing.templates.extend(prompts.templates);
                    existing.variables.extend(prompts.variables);
                }
                None => self.prompts = Some(prompts),
            }
        }
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn session(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }

    pub fn tools(&self) -> ToolsConfig {
        self.tools.clone().unwrap_or_default()
    }

    pub fn classifier(&self) -> ClassifierConfig {
        self.classifier.clone().unwrap_or_default()
    }

    pub fn vector(&self) -> VectorConfig {
        self.vector.clone().unwrap_or_default()
    }

    pub fn embedding(&self) -> EmbeddingConfig {
        self.embedding.clone().unwrap_or_default()
    }

    pub fn generation(&self) -> GenerationConfig {
        self.generation.clone().unwrap_or_default()
    }

    pub fn policy(&self) -> PolicyConfig {
        self.policy.clone().unwrap_or_default()
    }

    pub fn prompts(&self) -> PromptsConfig {
        self.prompts.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, `host:port`.
    pub bind: String,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
    /// Allowed CORS origins. Empty means CORS is not enabled.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            max_body_size: 64 * 1024,
            cors_origins: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Session store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Maximum live sessions before least-recently-used eviction.
    pub max_sessions: usize,
    /// Idle time after which a session expires. `0` disables expiry.
    pub idle_ttl_secs: u64,
    /// How often the background task sweeps expired sessions.
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            idle_ttl_secs: 3600,
            cleanup_interval_secs: 60,
        }
    }
}

impl SessionConfig {
    pub fn idle_ttl(&self) -> Option<Duration> {
        (self.idle_ttl_secs > 0).then(|| Duration::from_secs(self.idle_ttl_secs))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tools
// ─────────────────────────────────────────────────────────────────────────────

/// Tool execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Per-tool execution timeout in milliseconds.
    pub timeout_ms: u64,
    /// `top_k` used when a search does not ask for one.
    pub default_top_k: usize,
    /// Upper bound on any requested `top_k`.
    pub max_top_k: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            default_top_k: 5,
            max_top_k: 50,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backends
// ─────────────────────────────────────────────────────────────────────────────

/// Intent classifier service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Prediction endpoint.
    pub url: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries for transient failures.
    pub max_retries: u32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/predict".to_string(),
            timeout_ms: 5000,
            max_retries: 1,
        }
    }
}

/// Vector index (Pinecone) connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    /// Index host URL.
    pub host: Option<String>,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Inline API key (not recommended).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Namespace within the index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            host: None,
            api_key_env: "PINECONE_API_KEY".to_string(),
            api_key: None,
            namespace: None,
            timeout_ms: 10_000,
        }
    }
}

/// Query embedding service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Custom API base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Embedding model. Must match the model the index was built with.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Inline API key (not recommended).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "text-embedding-3-small".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
        }
    }
}

/// Answer generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Custom API base URL (OpenAI-compatible).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Inline API key (not recommended).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub max_tokens: u32,
    /// Temperature used when a request does not carry one.
    pub default_temperature: f64,
    /// Overall generation timeout in seconds.
    pub timeout_secs: u64,
    /// Number of prior turns sent as conversation history.
    pub history_turns: usize,
    /// Replacement system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Answer returned when generation fails or times out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_answer: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            max_tokens: 1024,
            default_temperature: 0.2,
            timeout_secs: 60,
            history_turns: 6,
            system_prompt: None,
            fallback_answer: None,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Which implicit tool-selection policy the controller uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Classify first; search unless the route is non-informational.
    #[default]
    IntentGated,
    /// Only classify.
    ClassifyOnly,
    /// Classify and, when the question matches a pattern, search.
    Keyword,
}

/// Tool-selection policy settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// Routes that skip retrieval under `intent_gated`. Empty uses the
    /// built-in list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub non_informational_routes: Vec<String>,
    /// Regexes that trigger retrieval under `keyword`. Empty uses the
    /// built-in list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub search_patterns: Vec<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Prompts
// ─────────────────────────────────────────────────────────────────────────────

/// Prompt template overrides.
///
/// ```toml
/// [prompts.templates]
/// default = "Answer using only this context:\n{context}\n\nQuestion: {question}"
///
/// [prompts.variables]
/// support_contact = "support@example.com"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Templates by name, replacing built-ins of the same name.
    pub templates: BTreeMap<String, String>,
    /// Default placeholder values.
    pub variables: BTreeMap<String, String>,
}
