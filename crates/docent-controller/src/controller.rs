//! The orchestrator.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use docent_backends::{ChatTurn, GenerationRequest, SharedGenerator, VectorMatch};
use docent_session::{Session, SessionStore};
use docent_tools::{ToolContext, ToolRegistry, matches_from_data};
use docent_types::{
    DetectedIntent, McpRequest, McpResponse, Source, ToolInvocation, ToolResult, ToolType,
};
use futures::future::join_all;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ControllerConfig;
use crate::policy::{IntentGatedSearch, SharedPolicy, classified_intent};
use crate::prompt::{self, PromptLibrary};

/// Context text used when a search returned no passages.
const NO_CONTEXT: &str = "No relevant policy information was found.";

/// Turns a validated request into a structured answer.
///
/// Cloning is cheap; clones share the registry, session store, and
/// collaborators.
#[derive(Clone)]
pub struct Controller {
    registry: Arc<ToolRegistry>,
    sessions: SessionStore,
    generator: SharedGenerator,
    policy: SharedPolicy,
    prompts: Arc<PromptLibrary>,
    config: ControllerConfig,
}

impl Controller {
    /// Create a controller with the default policy, prompts, and config.
    pub fn new(registry: ToolRegistry, sessions: SessionStore, generator: SharedGenerator) -> Self {
        Self {
            registry: Arc::new(registry),
            sessions,
            generator,
            policy: Arc::new(IntentGatedSearch::default()),
            prompts: Arc::new(PromptLibrary::default()),
            config: ControllerConfig::default(),
        }
    }

    /// Replace the implicit selection policy.
    pub fn with_policy(mut self, policy: SharedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the prompt library.
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = Arc::new(prompts);
        self
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Get the tool registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Get the selection policy.
    pub fn policy(&self) -> &SharedPolicy {
        &self.policy
    }

    /// Get the configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Process one turn.
    ///
    /// Tool, session, and generation failures are absorbed into the response.
    /// Dropping the returned future abandons pending tool calls and leaves
    /// the session untouched.
    pub async fn process(&self, request: McpRequest) -> McpResponse {
        let started = Instant::now();

        let session = match self.sessions.resolve(request.session_id()).await {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Session resolution failed, using an ephemeral session");
                None
            }
        };
        let session_id = session
            .as_ref()
            .map(|s| s.session_id)
            .unwrap_or_else(Uuid::new_v4);
        let ctx = ToolContext::new(request.question(), session_id);

        let results = if request.tools().is_empty() {
            self.run_implicit(&ctx).await
        } else {
            self.run_stage(request.tools(), &ctx).await
        };

        let detected_intent = classified_intent(&results);
        let search = SearchOutcome::collect(&results);
        let sources = search.as_ref().map(|s| s.sources()).unwrap_or_default();

        let answer = self
            .compose_answer(
                &request,
                session.as_ref(),
                search.as_ref(),
                detected_intent.as_ref(),
            )
            .await;

        if session.is_some()
            && let Err(e) = self
                .sessions
                .record_turn(
                    session_id,
                    request.question(),
                    answer.as_str(),
                    detected_intent.clone(),
                )
                .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to record turn");
        }

        info!(
            session_id = %session_id,
            tools = results.len(),
            failed = results.iter().filter(|r| !r.is_success()).count(),
            sources = sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Request processed"
        );

        McpResponse {
            answer,
            sources,
            session_id,
            detected_intent,
            tool_results: (!results.is_empty()).then_some(results),
        }
    }

    async fn run_implicit(&self, ctx: &ToolContext<'_>) -> Vec<ToolResult> {
        let initial = self.policy.initial(ctx.question);
        debug!(
            session_id = %ctx.session_id,
            policy = self.policy.name(),
            tools = ?initial.iter().map(|t| t.tool_type).collect::<Vec<_>>(),
            "Implicit tool selection"
        );
        let mut results = self.run_stage(&initial, ctx).await;

        let follow_up = self.policy.follow_up(ctx.question, &results);
        if !follow_up.is_empty() {
            debug!(
                session_id = %ctx.session_id,
                tools = ?follow_up.iter().map(|t| t.tool_type).collect::<Vec<_>>(),
                "Follow-up tool selection"
            );
            results.extend(self.run_stage(&follow_up, ctx).await);
        }
        results
    }

    /// Run invocations concurrently; results keep invocation order.
    async fn run_stage(&self, invocations: &[ToolInvocation], ctx: &ToolContext<'_>) -> Vec<ToolResult> {
        join_all(invocations.iter().map(|inv| self.run_tool(inv, ctx))).await
    }

    async fn run_tool(&self, invocation: &ToolInvocation, ctx: &ToolContext<'_>) -> ToolResult {
        let started = Instant::now();
        let timeout = self.config.tool_timeout;

        let result = match tokio::time::timeout(timeout, self.registry.run(invocation, ctx)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    session_id = %ctx.session_id,
                    tool = %invocation.tool_type,
                    timeout_ms = timeout.as_millis() as u64,
                    "Tool timed out"
                );
                ToolResult::error(
                    invocation.tool_type,
                    format!("{} timed out after {}ms", invocation.tool_type, timeout.as_millis()),
                )
            }
        };

        debug!(
            session_id = %ctx.session_id,
            tool = %invocation.tool_type,
            success = result.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Tool finished"
        );
        result
    }

    async fn compose_answer(
        &self,
        request: &McpRequest,
        session: Option<&Session>,
        search: Option<&SearchOutcome>,
        intent: Option<&DetectedIntent>,
    ) -> String {
        let question = request.question();
        let history: Vec<ChatTurn> = session
            .map(|s| {
                s.recent_turns(self.config.history_turns)
                    .iter()
                    .map(|t| ChatTurn {
                        question: t.question.clone(),
                        answer: t.answer.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let passages = search.map(|s| s.passages());
        let template = match (&passages, intent) {
            (None, _) => prompt::DIRECT,
            (Some(p), _) if p.is_empty() => prompt::INSUFFICIENT_INFO,
            (Some(_), Some(_)) => prompt::INTENT_DETECTED,
            (Some(_), None) => prompt::DEFAULT,
        };

        let context = match &passages {
            Some(p) if !p.is_empty() => p.join("\n\n"),
            _ => NO_CONTEXT.to_string(),
        };
        let intent_name = intent.map(|i| i.intent.as_str()).unwrap_or_default();
        let rendered = self
            .prompts
            .render(
                template,
                &[
                    ("question", question),
                    ("context", context.as_str()),
                    ("intent", intent_name),
                ],
            )
            .unwrap_or_else(|| {
                warn!(template, "Prompt template missing, sending the bare question");
                question.to_string()
            });

        let mut generation = GenerationRequest::new(question)
            .with_prompt(rendered)
            .with_history(history)
            .with_temperature(request.temperature());
        if let Some(passages) = passages {
            generation = generation.with_passages(passages);
        }

        let timeout = self.config.generation_timeout;
        match tokio::time::timeout(timeout, self.generator.generate(generation)).await {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                warn!(generator = self.generator.name(), error = %e, "Generation failed");
                self.config.fallback_answer.clone()
            }
            Err(_) => {
                warn!(
                    generator = self.generator.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Generation timed out"
                );
                self.config.fallback_answer.clone()
            }
        }
    }
}

/// Matches from every successful search of the request, in result order.
struct SearchOutcome {
    matches: Vec<VectorMatch>,
}

impl SearchOutcome {
    /// `None` when no search succeeded.
    fn collect(results: &[ToolResult]) -> Option<Self> {
        let mut succeeded = false;
        let mut matches = Vec::new();
        for data in results
            .iter()
            .filter(|r| r.tool_type == ToolType::VectorSearch)
            .filter_map(ToolResult::data)
        {
            succeeded = true;
            matches.extend(matches_from_data(data));
        }
        succeeded.then_some(Self { matches })
    }

    fn passages(&self) -> Vec<String> {
        self.matches
            .iter()
            .filter(|m| !m.excerpt.trim().is_empty())
            .map(|m| m.excerpt.clone())
            .collect()
    }

    /// One source per distinct `{name, type}`, in first-seen order.
    fn sources(&self) -> Vec<Source> {
        let mut seen = HashSet::new();
        self.matches
            .iter()
            .map(|m| Source::new(&m.name, &m.doc_type))
            .filter(|s| seen.insert(s.clone()))
            .collect()
    }
}
