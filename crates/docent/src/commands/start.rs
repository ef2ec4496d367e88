//! Start command - launches the docent server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::{info, warn};

use docent_backends::{
    HttpClassifier, HttpClassifierConfig, OpenAiEmbedder, OpenAiEmbedderConfig, OpenAiGenerator,
    OpenAiGeneratorConfig, PineconeConfig, PineconeIndex, SharedGenerator, SharedVectorIndex,
};
use docent_config::{
    ConfigError, DocentConfig, GenerationConfig, LoadedConfig, PolicyConfig,
    PolicyKind, PromptsConfig, ResolvedSecret, SessionConfig, resolve_secret,
};
use docent_controller::{
    ClassifyOnly, Controller, ControllerConfig, IntentGatedSearch, KeywordPolicy, PromptLibrary,
    SharedPolicy,
};
use docent_server::{Server, ServerConfig};
use docent_session::{SessionStore, StoreConfig};
use docent_tools::{IntentDetectionTool, SearchLimits, ToolRegistry, VectorSearchTool};

use super::Context;

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Address to bind to, host:port (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the project-local docent.toml (default: current dir)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    // ── Load configuration ──────────────────────────────────────────────

    let loaded = match args.config {
        Some(ref path) => LoadedConfig::from_file(path)?,
        None => docent_config::load_config(args.project_dir.as_deref()),
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }
    if ctx.verbose {
        for path in loaded.loaded_from() {
            println!("Config: {}", path.display());
        }
    }

    let config = loaded.config;
    let server_section = config.server();
    let bind = args.bind.unwrap_or(server_section.bind);
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", bind))?;

    // ── Controller ──────────────────────────────────────────────────────

    let controller = build_controller(&config)?;
    let _cleanup = controller.sessions().spawn_cleanup_task();

    info!(
        tools = ?controller.registry().tool_types(),
        policy = controller.policy().name(),
        "Controller ready"
    );

    // ── Start server ────────────────────────────────────────────────────

    let server_config = ServerConfig::new()
        .with_bind_address(addr)
        .with_max_body_size(server_section.max_body_size)
        .with_cors_origins(server_section.cors_origins);

    let server = Server::new(controller, server_config);

    println!("Docent server starting on http://{}", addr);
    println!("Press Ctrl+C to stop");

    server.run().await?;
    Ok(())
}

/// Assemble the controller and everything it depends on from config.
pub(crate) fn build_controller(config: &DocentConfig) -> Result<Controller> {
    let generation = config.generation();
    let tools = config.tools();

    let registry = build_registry(config)?;
    let sessions = SessionStore::new(store_config(&config.session()));
    let generator = build_generator(&generation)?;

    let mut controller_config = ControllerConfig::new()
        .with_tool_timeout(tools.timeout())
        .with_generation_timeout(generation.timeout())
        .with_history_turns(generation.history_turns);
    if let Some(ref answer) = generation.fallback_answer {
        controller_config = controller_config.with_fallback_answer(answer);
    }

    Ok(Controller::new(registry, sessions, generator)
        .with_policy(build_policy(&config.policy())?)
        .with_prompts(build_prompts(&config.prompts()))
        .with_config(controller_config))
}

fn build_registry(config: &DocentConfig) -> Result<ToolRegistry> {
    let classifier_section = config.classifier();
    let classifier = HttpClassifier::new(
        HttpClassifierConfig::new(&classifier_section.url)
            .with_timeout(std::time::Duration::from_millis(classifier_section.timeout_ms))
            .with_max_retries(classifier_section.max_retries),
    )?;

    let mut builder =
        ToolRegistry::builder().register(IntentDetectionTool::new(Arc::new(classifier)));

    match build_vector_index(config) {
        Ok(index) => {
            let tools = config.tools();
            let limits = SearchLimits::new(tools.default_top_k, tools.max_top_k);
            builder = builder.register(VectorSearchTool::new(index, limits));
        }
        Err(e) => {
            warn!(error = %e, "Vector search disabled");
        }
    }

    Ok(builder.build())
}

fn build_vector_index(config: &DocentConfig) -> Result<SharedVectorIndex> {
    let vector = config.vector();
    let embedding = config.embedding();

    let host = vector.host.clone().ok_or_else(|| ConfigError::MissingField {
        field: "host".to_string(),
        context: "[vector]".to_string(),
    })?;
    let pinecone_key = require_secret("pinecone", &vector.api_key_env, vector.api_key.as_deref())?;
    let openai_key = require_secret(
        "embeddings",
        &embedding.api_key_env,
        embedding.api_key.as_deref(),
    )?;

    let mut embedder_config =
        OpenAiEmbedderConfig::new(openai_key.value).with_model(&embedding.model);
    if let Some(ref url) = embedding.base_url {
        embedder_config = embedder_config.with_base_url(url);
    }
    let embedder = OpenAiEmbedder::new(embedder_config)?;

    let mut pinecone = PineconeConfig::new(host, pinecone_key.value)
        .with_timeout(std::time::Duration::from_millis(vector.timeout_ms));
    if let Some(ref namespace) = vector.namespace {
        pinecone = pinecone.with_namespace(namespace);
    }

    Ok(Arc::new(PineconeIndex::new(pinecone, Arc::new(embedder))?))
}

fn build_generator(generation: &GenerationConfig) -> Result<SharedGenerator> {
    // Local OpenAI-compatible servers (Ollama, vLLM) run without a key.
    let api_key = resolve_secret(&generation.api_key_env, generation.api_key.as_deref())
        .map(|s| s.value);
    if api_key.is_none() {
        warn!(
            env_var = %generation.api_key_env,
            "No generation API key found; sending unauthenticated requests"
        );
    }

    let mut config = OpenAiGeneratorConfig::new(api_key)
        .with_model(&generation.model)
        .with_max_tokens(generation.max_tokens)
        .with_default_temperature(generation.default_temperature)
        .with_timeout(generation.timeout());
    if let Some(ref url) = generation.base_url {
        config = config.with_base_url(url);
    }
    if let Some(ref prompt) = generation.system_prompt {
        config = config.with_system_prompt(prompt);
    }

    Ok(Arc::new(OpenAiGenerator::new(config)?))
}

fn require_secret(
    service: &str,
    env_var: &str,
    inline: Option<&str>,
) -> std::result::Result<ResolvedSecret, ConfigError> {
    resolve_secret(env_var, inline).ok_or_else(|| ConfigError::ApiKeyNotFound {
        service: service.to_string(),
        env_var: env_var.to_string(),
    })
}

fn store_config(session: &SessionConfig) -> StoreConfig {
    let config = StoreConfig::new()
        .with_max_sessions(session.max_sessions)
        .with_cleanup_interval(session.cleanup_interval());
    match session.idle_ttl() {
        Some(ttl) => config.with_idle_ttl(ttl),
        None => config.without_idle_ttl(),
    }
}

fn build_policy(policy: &PolicyConfig) -> Result<SharedPolicy> {
    let policy: SharedPolicy = match policy.kind {
        PolicyKind::IntentGated if policy.non_informational_routes.is_empty() => {
            Arc::new(IntentGatedSearch::default())
        }
        PolicyKind::IntentGated => Arc::new(IntentGatedSearch::new(
            &policy.non_informational_routes,
        )),
        PolicyKind::ClassifyOnly => Arc::new(ClassifyOnly),
        PolicyKind::Keyword if policy.search_patterns.is_empty() => {
            Arc::new(KeywordPolicy::with_defaults()?)
        }
        PolicyKind::Keyword => Arc::new(KeywordPolicy::new(&policy.search_patterns)?),
    };
    Ok(policy)
}

fn build_prompts(prompts: &PromptsConfig) -> PromptLibrary {
    let library = prompts
        .templates
        .iter()
        .fold(PromptLibrary::default(), |lib, (name, template)| {
            lib.with_template(name, template)
        });
    prompts
        .variables
        .iter()
        .fold(library, |lib, (name, value)| lib.with_variable(name, value))
}
