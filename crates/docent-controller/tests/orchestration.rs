//! End-to-end orchestration through `Controller::process` with mock
//! capabilities.

use std::sync::Arc;
use std::time::Duration;

use docent_backends::{MockClassifier, MockGenerator, MockVectorIndex};
use docent_controller::{
    ClassifyOnly, Controller, ControllerConfig, FALLBACK_ANSWER, IntentGatedSearch,
};
use docent_session::{
    Result as SessionResult, Session, SessionError, SessionPersistence, SessionStore, StoreConfig,
};
use docent_tools::{
    IntentDetectionTool, SearchLimits, ToolRegistry, VectorSearchTool, matches_from_data,
};
use docent_types::{McpRequest, McpRequestBody, SessionId, ToolInvocation, ToolType};
use serde_json::json;
use uuid::Uuid;

struct Harness {
    controller: Controller,
    classifier: Arc<MockClassifier>,
    index: Arc<MockVectorIndex>,
    generator: Arc<MockGenerator>,
}

fn travel_index() -> MockVectorIndex {
    MockVectorIndex::with_documents(&[
        ("travel_policy.pdf", "Travel Insurance", "Trip cancellation is covered up to $5,000."),
        ("travel_faq.pdf", "Travel Insurance", "Lost luggage is reimbursed after 24 hours."),
    ])
}

fn harness_with(
    classifier: MockClassifier,
    index: MockVectorIndex,
    generator: MockGenerator,
    store: SessionStore,
) -> Harness {
    let classifier = Arc::new(classifier);
    let index = Arc::new(index);
    let generator = Arc::new(generator);

    let registry = ToolRegistry::builder()
        .register(IntentDetectionTool::new(classifier.clone()))
        .register(VectorSearchTool::new(index.clone(), SearchLimits::default()))
        .build();

    Harness {
        controller: Controller::new(registry, store, generator.clone()),
        classifier,
        index,
        generator,
    }
}

fn harness(classifier: MockClassifier, index: MockVectorIndex) -> Harness {
    harness_with(
        classifier,
        index,
        MockGenerator::new(),
        SessionStore::new(StoreConfig::default()),
    )
}

fn informational() -> MockClassifier {
    MockClassifier::with_intent("coverage", "policy_info", 0.87)
}

fn ask(question: &str) -> McpRequestBody {
    McpRequestBody::new(question)
}

fn search(top_k: i64) -> ToolInvocation {
    ToolInvocation::new(ToolType::VectorSearch).with_param("top_k", top_k)
}

// ─────────────────────────────────────────────────────────────────────────────
// Session stability
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_session_is_stable_across_turns() {
    let h = harness(informational(), travel_index());

    let first = h
        .controller
        .process(ask("What does travel insurance cover?").validate().unwrap())
        .await;
    let second = h
        .controller
        .process(
            ask("And lost luggage?")
                .with_session_id(first.session_id)
                .validate()
                .unwrap(),
        )
        .await;

    assert_eq!(second.session_id, first.session_id);

    let session = h.controller.sessions().get(&first.session_id).await.unwrap();
    assert_eq!(session.turn_count(), 2);
    assert_eq!(session.turns[0].question, "What does travel insurance cover?");
    assert_eq!(session.turns[1].answer, second.answer);
    assert_eq!(session.last_detected_intent.unwrap().intent, "coverage");

    let requests = h.generator.requests();
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[1].history.len(), 1);
    assert_eq!(requests[1].history[0].answer, first.answer);
}

#[tokio::test]
async fn test_unknown_session_gets_new_id() {
    let h = harness(informational(), travel_index());
    let unknown = Uuid::new_v4();

    let response = h
        .controller
        .process(ask("Hi").with_session_id(unknown).validate().unwrap())
        .await;

    assert_ne!(response.session_id, unknown);
    assert!(h.controller.sessions().get(&response.session_id).await.is_some());
}

#[tokio::test]
async fn test_history_is_bounded() {
    let h = harness(informational(), travel_index());
    let controller = h
        .controller
        .clone()
        .with_config(ControllerConfig::new().with_history_turns(2));

    let mut session_id = None;
    for i in 0..4 {
        let mut body = ask(&format!("question {}", i));
        if let Some(id) = session_id {
            body = body.with_session_id(id);
        }
        session_id = Some(controller.process(body.validate().unwrap()).await.session_id);
    }

    let last = h.generator.requests().pop().unwrap();
    assert_eq!(last.history.len(), 2);
    assert_eq!(last.history[1].question, "question 2");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool isolation
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_classifier_failure_does_not_block_search() {
    let h = harness(MockClassifier::failing("connection refused"), travel_index());

    let response = h
        .controller
        .process(
            ask("What does travel insurance cover?")
                .with_tool(ToolInvocation::new(ToolType::IntentDetection))
                .with_tool(search(5))
                .validate()
                .unwrap(),
        )
        .await;

    let results = response.tool_results.unwrap();
    assert_eq!(results.len(), 2);
    assert!(!results[0].is_success());
    assert!(results[0].message().unwrap().contains("connection refused"));
    assert!(results[1].is_success());

    assert_eq!(response.sources.len(), 2);
    assert!(response.detected_intent.is_none());
    assert_eq!(response.answer, "answer: What does travel insurance cover? [passages=2]");
}

#[tokio::test]
async fn test_out_of_range_intent_score_is_error_result() {
    let h = harness(
        MockClassifier::with_intent("coverage", "policy_info", 1.7),
        travel_index(),
    );

    let response = h
        .controller
        .process(
            ask("What does travel insurance cover?")
                .with_tool(ToolInvocation::new(ToolType::IntentDetection))
                .validate()
                .unwrap(),
        )
        .await;

    let results = response.tool_results.unwrap();
    assert_eq!(results.len(), 1);
    assert!(!results[0].is_success());
    assert!(results[0].message().unwrap().contains("outside [0, 1]"));
    assert!(response.detected_intent.is_none());
}

#[tokio::test]
async fn test_implicit_search_runs_when_classification_fails() {
    let h = harness(MockClassifier::failing("down"), travel_index());

    let response = h
        .controller
        .process(ask("What does travel insurance cover?").validate().unwrap())
        .await;

    let types: Vec<ToolType> = response
        .tool_results
        .unwrap()
        .iter()
        .map(|r| r.tool_type)
        .collect();
    assert_eq!(types, vec![ToolType::IntentDetection, ToolType::VectorSearch]);
    assert_eq!(response.sources.len(), 2);
}

#[tokio::test]
async fn test_search_failure_falls_back_to_direct_answer() {
    let h = harness(informational(), MockVectorIndex::failing("index unavailable"));

    let response = h
        .controller
        .process(ask("What does travel insurance cover?").with_tool(search(5)).validate().unwrap())
        .await;

    assert!(response.sources.is_empty());
    assert_eq!(response.answer, "answer: What does travel insurance cover? [direct]");
    let results = response.tool_results.unwrap();
    assert!(results[0].message().unwrap().contains("index unavailable"));
}

#[tokio::test]
async fn test_generator_failure_yields_fallback_answer() {
    let h = harness_with(
        informational(),
        travel_index(),
        MockGenerator::failing("model overloaded"),
        SessionStore::new(StoreConfig::default()),
    );

    let response = h
        .controller
        .process(ask("What does travel insurance cover?").validate().unwrap())
        .await;

    assert_eq!(response.answer, FALLBACK_ANSWER);
    assert_eq!(response.sources.len(), 2);
    assert!(response.detected_intent.is_some());
}

#[tokio::test]
async fn test_unregistered_tool_is_reported() {
    let index = Arc::new(travel_index());
    let registry = ToolRegistry::builder()
        .register(VectorSearchTool::new(index, SearchLimits::default()))
        .build();
    let controller = Controller::new(
        registry,
        SessionStore::new(StoreConfig::default()),
        Arc::new(MockGenerator::new()),
    );

    let response = controller
        .process(
            ask("q")
                .with_tool(ToolInvocation::new(ToolType::IntentDetection))
                .validate()
                .unwrap(),
        )
        .await;

    let results = response.tool_results.unwrap();
    assert_eq!(results[0].tool_type, ToolType::IntentDetection);
    assert!(!results[0].is_success());
}

// ─────────────────────────────────────────────────────────────────────────────
// Ordering, provenance, bounds
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_results_follow_request_order_not_completion_order() {
    let h = harness(
        informational(),
        travel_index().with_delay(Duration::from_millis(200)),
    );

    let response = h
        .controller
        .process(
            ask("What does travel insurance cover?")
                .with_tool(search(5))
                .with_tool(ToolInvocation::new(ToolType::IntentDetection))
                .validate()
                .unwrap(),
        )
        .await;

    let types: Vec<ToolType> = response
        .tool_results
        .unwrap()
        .iter()
        .map(|r| r.tool_type)
        .collect();
    assert_eq!(types, vec![ToolType::VectorSearch, ToolType::IntentDetection]);
}

#[tokio::test(start_paused = true)]
async fn test_explicit_tools_run_concurrently() {
    let h = harness(
        informational().with_delay(Duration::from_secs(3)),
        travel_index().with_delay(Duration::from_secs(3)),
    );
    let started = tokio::time::Instant::now();

    h.controller
        .process(
            ask("q")
                .with_tool(ToolInvocation::new(ToolType::IntentDetection))
                .with_tool(search(5))
                .validate()
                .unwrap(),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_sources_trace_back_to_search_data() {
    let index = MockVectorIndex::with_documents(&[
        ("travel_policy.pdf", "Travel Insurance", "Cancellation cover."),
        ("travel_policy.pdf", "Travel Insurance", "Medical cover."),
        ("health_plan.pdf", "Health Insurance", "Hospital cover."),
    ]);
    let h = harness(informational(), index);

    let response = h
        .controller
        .process(ask("What is covered?").with_tool(search(5)).validate().unwrap())
        .await;

    let results = response.tool_results.unwrap();
    let matches = matches_from_data(results[0].data().unwrap());
    assert_eq!(response.sources.len(), 2);
    for source in &response.sources {
        assert!(
            matches
                .iter()
                .any(|m| m.name == source.name && m.doc_type == source.doc_type)
        );
    }
}

#[tokio::test]
async fn test_empty_search_yields_no_sources() {
    let h = harness(informational(), MockVectorIndex::new(Vec::new()));

    let response = h
        .controller
        .process(ask("Is skydiving covered?").with_tool(search(5)).validate().unwrap())
        .await;

    assert!(response.sources.is_empty());
    assert!(response.tool_results.unwrap()[0].is_success());

    let request = h.generator.requests().pop().unwrap();
    assert_eq!(request.passages, Some(Vec::new()));
    assert!(request.prompt.contains("did not contain specific information"));
}

#[tokio::test]
async fn test_top_k_is_clamped() {
    let h = harness(informational(), travel_index());

    for top_k in [0, -1, 1000] {
        let response = h
            .controller
            .process(ask("What is covered?").with_tool(search(top_k)).validate().unwrap())
            .await;
        let result = &response.tool_results.unwrap()[0];
        assert!(result.is_success(), "top_k={} should not error", top_k);
    }

    assert_eq!(h.index.requested_top_k(), vec![5, 5, 50]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_explicit_search_scenario() {
    let h = harness(informational(), travel_index());
    let request: McpRequest = serde_json::from_value(json!({
        "question": "What does travel insurance cover?",
        "tools": [{"tool_type": "vector_search", "parameters": {"top_k": 5}}]
    }))
    .unwrap();

    let response = h.controller.process(request).await;

    let results = response.tool_results.as_ref().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_success());
    assert_eq!(response.sources.len(), 2);
    assert!(response.detected_intent.is_none());
    assert!(h.classifier.calls().is_empty());

    let body = serde_json::to_value(&response).unwrap();
    assert_eq!(body["tool_results"][0]["status"], "success");
    assert!(body.get("detected_intent").is_none());
}

#[tokio::test]
async fn test_classify_only_scenario() {
    let h = harness(informational(), travel_index());
    let controller = h.controller.clone().with_policy(Arc::new(ClassifyOnly));

    let response = controller
        .process(ask("What does travel insurance cover?").validate().unwrap())
        .await;

    let results = response.tool_results.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tool_type, ToolType::IntentDetection);
    assert_eq!(response.detected_intent.unwrap().route, "policy_info");
    assert!(h.index.requested_top_k().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_classifier_timeout_scenario() {
    let h = harness(
        informational().with_delay(Duration::from_secs(30)),
        travel_index(),
    );
    let controller = h
        .controller
        .clone()
        .with_config(ControllerConfig::new().with_tool_timeout(Duration::from_millis(500)));

    let response = controller
        .process(
            ask("What does travel insurance cover?")
                .with_tool(ToolInvocation::new(ToolType::IntentDetection))
                .validate()
                .unwrap(),
        )
        .await;

    let results = response.tool_results.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].tool_type, ToolType::IntentDetection);
    assert_eq!(
        results[0].message(),
        Some("intent_detection timed out after 500ms")
    );
    assert!(response.detected_intent.is_none());
    assert!(!response.answer.is_empty());
}

// ─────────────────────────────────────────────────────────────────────────────
// Implicit policy, cancellation, degraded sessions
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_greeting_skips_search() {
    let h = harness(
        MockClassifier::with_intent("hello", "greeting", 0.95),
        travel_index(),
    );
    let controller = h
        .controller
        .clone()
        .with_policy(Arc::new(IntentGatedSearch::default()));

    let response = controller.process(ask("Hello!").validate().unwrap()).await;

    assert_eq!(response.tool_results.unwrap().len(), 1);
    assert!(response.sources.is_empty());
    assert_eq!(response.answer, "answer: Hello! [direct]");
    assert!(h.index.requested_top_k().is_empty());
}

#[tokio::test]
async fn test_temperature_reaches_generator() {
    let h = harness(informational(), travel_index());

    h.controller
        .process(ask("q").with_temperature(0.7).validate().unwrap())
        .await;

    assert_eq!(h.generator.requests()[0].temperature, Some(0.7));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_records_nothing() {
    let h = harness(
        informational(),
        travel_index().with_delay(Duration::from_secs(10)),
    );
    let controller = h
        .controller
        .clone()
        .with_config(ControllerConfig::new().with_tool_timeout(Duration::from_secs(60)));
    let session_id = controller.sessions().resolve(None).await.unwrap().session_id;

    let request = ask("What is covered?")
        .with_session_id(session_id)
        .with_tool(search(5))
        .validate()
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(1), controller.process(request)).await;

    assert!(outcome.is_err());
    let session = controller.sessions().get(&session_id).await.unwrap();
    assert!(session.is_empty());
    assert!(h.generator.requests().is_empty());
}

struct UnavailablePersistence;

impl SessionPersistence for UnavailablePersistence {
    fn load(&self, _session_id: &SessionId) -> SessionResult<Option<Session>> {
        Err(SessionError::Persistence("database offline".to_string()))
    }

    fn save(&self, _session: &Session) -> SessionResult<()> {
        Ok(())
    }

    fn delete(&self, _session_id: &SessionId) -> SessionResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_session_failure_uses_ephemeral_id() {
    let h = harness_with(
        informational(),
        travel_index(),
        MockGenerator::new(),
        SessionStore::with_persistence(StoreConfig::default(), UnavailablePersistence),
    );
    let requested = Uuid::new_v4();

    let response = h
        .controller
        .process(ask("What is covered?").with_session_id(requested).validate().unwrap())
        .await;

    assert_ne!(response.session_id, requested);
    assert!(!response.answer.is_empty());
    assert!(h.controller.sessions().get(&response.session_id).await.is_none());
}
