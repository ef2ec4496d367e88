//! Intent classification capability.
//!
//! The upstream service accepts `{"query": "..."}` and answers with a ranked
//! list of `{intent, route, score}` candidates; the top candidate is the
//! classification.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::{BackendError, Result};
use crate::retry::{status_error, with_retry};

/// Default classifier endpoint.
pub const DEFAULT_CLASSIFIER_URL: &str = "http://127.0.0.1:8000/predict";

/// A single classification of a piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub intent: String,
    pub route: String,
    pub score: f64,
}

impl Classification {
    pub fn new(intent: impl Into<String>, route: impl Into<String>, score: f64) -> Self {
        Self {
            intent: intent.into(),
            route: route.into(),
            score,
        }
    }

    /// Reject scores outside `[0, 1]`.
    pub fn check_score(&self) -> Result<()> {
        if (0.0..=1.0).contains(&self.score) {
            Ok(())
        } else {
            Err(BackendError::Malformed(format!(
                "intent score {} outside [0, 1]",
                self.score
            )))
        }
    }
}

/// Trait for intent classification services.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify `text`, returning the top candidate.
    async fn classify(&self, text: &str) -> Result<Classification>;

    /// Name of this classifier, for logs.
    fn name(&self) -> &str;
}

/// A shared classifier that can be used across threads.
pub type SharedClassifier = Arc<dyn Classifier>;

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Classifier
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the HTTP classifier.
#[derive(Debug, Clone)]
pub struct HttpClassifierConfig {
    /// Prediction endpoint.
    pub url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retries for transient errors.
    pub max_retries: u32,
    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,
}

impl Default for HttpClassifierConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CLASSIFIER_URL.to_string(),
            timeout: Duration::from_secs(5),
            max_retries: 1,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

impl HttpClassifierConfig {
    /// Create a config for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set max retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Classifier backed by an HTTP prediction service.
pub struct HttpClassifier {
    client: Client,
    config: HttpClassifierConfig,
}

impl HttpClassifier {
    /// Create a new HTTP classifier.
    pub fn new(config: HttpClassifierConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn request(&self, text: &str) -> Result<Vec<Classification>> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&PredictRequest { query: text })
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
impl Classifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        let candidates = with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            "classifier",
            || self.request(text),
        )
        .await?;

        let top = top_candidate(candidates)?;
        debug!(intent = %top.intent, route = %top.route, score = top.score, "Classified question");
        Ok(top)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// The first-ranked candidate, provided it carries a usable score.
fn top_candidate(candidates: Vec<Classification>) -> Result<Classification> {
    let top = candidates
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::Malformed("classifier returned no intents".to_string()))?;
    top.check_score()?;
    Ok(top)
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    query: &'a str,
}
