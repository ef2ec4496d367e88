//! Deterministic capability mocks for tests.
//!
//! Every mock can be made to fail or to stall, so tests can exercise
//! partial tool failure and timeouts without a network.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use crate::classifier::{Classification, Classifier};
use crate::embeddings::Embedder;
use crate::error::{BackendError, Result};
use crate::generation::{GenerationRequest, Generator};
use crate::vector::{VectorIndex, VectorMatch};

// ─────────────────────────────────────────────────────────────────────────────
// Classifier
// ─────────────────────────────────────────────────────────────────────────────

/// A mock classifier returning a fixed classification or a fixed failure.
#[derive(Debug)]
pub struct MockClassifier {
    outcome: std::result::Result<Classification, String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockClassifier {
    /// Always classify as the given intent.
    pub fn with_intent(intent: &str, route: &str, score: f64) -> Self {
        Self {
            outcome: Ok(Classification::new(intent, route, score)),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always fail with a backend error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Texts this classifier was asked to classify.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<Classification> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.outcome {
            Ok(c) => Ok(c.clone()),
            Err(message) => Err(BackendError::Network(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Vector index
// ─────────────────────────────────────────────────────────────────────────────

/// A mock index holding a fixed, ranked list of matches.
#[derive(Debug)]
pub struct MockVectorIndex {
    matches: Vec<VectorMatch>,
    failure: Option<String>,
    delay: Option<Duration>,
    ignore_top_k: bool,
    requested_top_k: Mutex<Vec<usize>>,
}

impl MockVectorIndex {
    /// Index returning (a prefix of) `matches`.
    pub fn new(matches: Vec<VectorMatch>) -> Self {
        Self {
            matches,
            failure: None,
            delay: None,
            ignore_top_k: false,
            requested_top_k: Mutex::new(Vec::new()),
        }
    }

    /// Index whose documents are `(name, doc_type, text)` triples, ranked in order.
    pub fn with_documents(docs: &[(&str, &str, &str)]) -> Self {
        let matches = docs
            .iter()
            .enumerate()
            .map(|(i, (name, doc_type, text))| VectorMatch {
                id: format!("doc-{}", i),
                name: name.to_string(),
                doc_type: doc_type.to_string(),
                excerpt: text.to_string(),
                score: 1.0 - (i as f32 * 0.1),
                metadata: serde_json::Map::new(),
            })
            .collect();
        Self::new(matches)
    }

    /// Index that always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new(Vec::new())
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Return every match regardless of the requested `top_k`.
    pub fn ignoring_top_k(mut self) -> Self {
        self.ignore_top_k = true;
        self
    }

    /// `top_k` values received, in call order.
    pub fn requested_top_k(&self) -> Vec<usize> {
        self.requested_top_k.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndex for MockVectorIndex {
    async fn query(
        &self,
        _text: &str,
        top_k: usize,
        _filter: Option<&serde_json::Value>,
    ) -> Result<Vec<VectorMatch>> {
        self.requested_top_k.lock().unwrap().push(top_k);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(ref message) = self.failure {
            return Err(BackendError::Network(message.clone()));
        }
        if self.ignore_top_k {
            return Ok(self.matches.clone());
        }
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Generator
// ─────────────────────────────────────────────────────────────────────────────

/// A mock generator that describes what it was given.
///
/// Answers look like `answer: <question> [passages=N]`, or
/// `answer: <question> [direct]` when no passages were supplied.
#[derive(Debug, Default)]
pub struct MockGenerator {
    failure: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generator that always fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received, in call order.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let answer = match request.passages {
            Some(ref passages) => format!("answer: {} [passages={}]", request.question, passages.len()),
            None => format!("answer: {} [direct]", request.question),
        };
        self.requests.lock().unwrap().push(request);

        match self.failure {
            Some(ref message) => Err(BackendError::Backend {
                status: 503,
                body: message.clone(),
            }),
            None => Ok(answer),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// A mock embedder producing deterministic unit vectors from a text hash.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut state = simple_hash(text);
        let mut embedding: Vec<f32> = (0..self.dimensions)
            .map(|_| {
                state = state.wrapping_mul(1103515245).wrapping_add(12345);
                ((state >> 16) as u16 as f32 / 32768.0) - 1.0
            })
            .collect();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn simple_hash(s: &str) -> u64 {
    let mut hash: u64 = 5381;
    for byte in s.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_classifier() {
        let classifier = MockClassifier::with_intent("coverage", "policy_info", 0.9);
        let c = classifier.classify("what is covered?").await.unwrap();
        assert_eq!(c.intent, "coverage");
        assert_eq!(classifier.calls(), vec!["what is covered?".to_string()]);

        let failing = MockClassifier::failing("down");
        assert!(failing.classify("x").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_index_truncates_to_top_k() {
        let index = MockVectorIndex::with_documents(&[
            ("a.pdf", "Travel", "one"),
            ("b.pdf", "Travel", "two"),
            ("c.pdf", "Health", "three"),
        ]);
        let matches = index.query("q", 2, None).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "a.pdf");
        assert_eq!(index.requested_top_k(), vec![2]);
    }

    #[tokio::test]
    async fn test_mock_generator_describes_input() {
        let generator = MockGenerator::new();
        let direct = generator.generate(GenerationRequest::new("hi")).await.unwrap();
        assert_eq!(direct, "answer: hi [direct]");

        let grounded = generator
            .generate(GenerationRequest::new("hi").with_passages(vec!["p".to_string()]))
            .await
            .unwrap();
        assert_eq!(grounded, "answer: hi [passages=1]");
        assert_eq!(generator.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_embedder_is_deterministic_unit_vector() {
        let embedder = MockEmbedder::new(16);
        let a = embedder.embed("travel").await.unwrap();
        let b = embedder.embed("travel").await.unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }
}
