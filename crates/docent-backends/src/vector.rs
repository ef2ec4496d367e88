//! Vector index query capability.
//!
//! The index stores document chunks with `source`, `doc_type`, and `text`
//! metadata written at ingestion time. A query embeds the question and
//! returns the nearest chunks, best first.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::embeddings::SharedEmbedder;
use crate::error::{BackendError, Result};
use crate::retry::{status_error, with_retry};

/// Placeholder for matches whose metadata lacks a name or type.
const UNKNOWN: &str = "Unknown";

/// One ranked match from the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Chunk identifier in the index.
    pub id: String,
    /// Document name the chunk came from.
    pub name: String,
    /// Document type (e.g. "Travel Insurance").
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Chunk text.
    pub excerpt: String,
    /// Similarity score reported by the index.
    pub score: f32,
    /// Remaining metadata, without the chunk text.
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl VectorMatch {
    /// Build a match from raw index metadata.
    pub fn from_metadata(
        id: impl Into<String>,
        score: f32,
        mut metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        let excerpt = match metadata.remove("text") {
            Some(serde_json::Value::String(s)) => s,
            _ => String::new(),
        };
        let field = |key: &str| {
            metadata
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .unwrap_or(UNKNOWN)
                .to_string()
        };
        let name = field("source");
        let doc_type = field("doc_type");

        Self {
            id: id.into(),
            name,
            doc_type,
            excerpt,
            score,
            metadata,
        }
    }
}

/// Trait for vector index query services.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` matches for `text`, best first.
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<&serde_json::Value>,
    ) -> Result<Vec<VectorMatch>>;

    /// Name of this index, for logs.
    fn name(&self) -> &str;
}

/// A shared vector index that can be used across threads.
pub type SharedVectorIndex = Arc<dyn VectorIndex>;

// ─────────────────────────────────────────────────────────────────────────────
// Pinecone
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for a Pinecone index.
#[derive(Debug, Clone)]
pub struct PineconeConfig {
    /// Index host, e.g. `https://policy-assistant-xxxx.svc.pinecone.io`.
    pub host: String,
    /// API key.
    pub api_key: String,
    /// Optional namespace within the index.
    pub namespace: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries for transient errors.
    pub max_retries: u32,
    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,
}

impl PineconeConfig {
    /// Create a config for the given index host.
    pub fn new(host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_key: api_key.into(),
            namespace: None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }

    /// Query within a namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Pinecone-backed vector index.
pub struct PineconeIndex {
    client: Client,
    config: PineconeConfig,
    embedder: SharedEmbedder,
}

impl PineconeIndex {
    /// Create a new index client that embeds queries with `embedder`.
    pub fn new(config: PineconeConfig, embedder: SharedEmbedder) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            embedder,
        })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.config.host.trim_end_matches('/'))
    }

    async fn request(&self, body: &QueryRequest<'_>) -> Result<QueryResponse> {
        let response = self
            .client
            .post(self.query_url())
            .header("Api-Key", &self.config.api_key)
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(
        &self,
        text: &str,
        top_k: usize,
        filter: Option<&serde_json::Value>,
    ) -> Result<Vec<VectorMatch>> {
        let vector = self.embedder.embed(text).await?;
        if vector.is_empty() {
            return Err(BackendError::Malformed("empty query embedding".to_string()));
        }

        let body = QueryRequest {
            vector: &vector,
            top_k,
            include_metadata: true,
            namespace: self.config.namespace.as_deref(),
            filter,
        };

        let response = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "pinecone",
            || self.request(&body),
        )
        .await?;

        let matches: Vec<VectorMatch> = response
            .matches
            .into_iter()
            .map(|m| VectorMatch::from_metadata(m.id, m.score, m.metadata.unwrap_or_default()))
            .collect();

        debug!(top_k, found = matches.len(), "Vector query completed");
        Ok(matches)
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<RawMatch>,
}

#[derive(Debug, Deserialize)]
struct RawMatch {
    id: String,
    score: f32,
    #[serde(default)]
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}
