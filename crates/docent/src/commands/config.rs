//! Config command - inspect the resolved configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};

use docent_config::{DocentConfig, LoadedConfig, resolve_secret};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Directory holding the project-local docent.toml (default: current dir)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration and API key status
    Show,

    /// Show which config files are searched and which were loaded
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    let loaded = docent_config::load_config(args.project_dir.as_deref());

    match args.command {
        ConfigCommand::Show => cmd_show(&loaded, ctx),
        ConfigCommand::Path => cmd_path(&loaded),
    }
}

fn cmd_show(loaded: &LoadedConfig, ctx: &Context) -> Result<()> {
    let config = &loaded.config;
    let effective = effective_config(config);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&effective)?);
        return Ok(());
    }

    println!("# Docent Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("# No config files loaded (using defaults)\n");
    } else {
        for source in &sources {
            println!("# loaded: {}", source.display());
        }
        println!();
    }

    for warning in &loaded.warnings {
        println!("# warning: {}", warning);
    }

    println!("# API keys:");
    for (name, status) in key_status(config) {
        println!("#   {:<12} {}", name, status);
    }
    println!();

    print!("{}", effective.to_toml()?);
    Ok(())
}

fn cmd_path(loaded: &LoadedConfig) -> Result<()> {
    for source in &loaded.sources {
        let marker = if source.loaded { "loaded" } else { "not found" };
        println!("{:<8} {}  ({})", source.layer, source.path.display(), marker);
    }
    Ok(())
}

/// Every section filled in, so `show` prints the values actually in effect.
fn effective_config(config: &DocentConfig) -> DocentConfig {
    DocentConfig {
        server: Some(config.server()),
        session: Some(config.session()),
        tools: Some(config.tools()),
        classifier: Some(config.classifier()),
        vector: Some(redacted(config.vector(), |v| &mut v.api_key)),
        embedding: Some(redacted(config.embedding(), |e| &mut e.api_key)),
        generation: Some(redacted(config.generation(), |g| &mut g.api_key)),
        policy: Some(config.policy()),
        prompts: config.prompts.clone(),
    }
}

fn redacted<T>(mut section: T, key: impl FnOnce(&mut T) -> &mut Option<String>) -> T {
    let slot = key(&mut section);
    if slot.is_some() {
        *slot = Some("<redacted>".to_string());
    }
    section
}

fn key_status(config: &DocentConfig) -> Vec<(&'static str, String)> {
    let vector = config.vector();
    let embedding = config.embedding();
    let generation = config.generation();

    [
        ("vector", vector.api_key_env, vector.api_key),
        ("embedding", embedding.api_key_env, embedding.api_key),
        ("generation", generation.api_key_env, generation.api_key),
    ]
    .into_iter()
    .map(|(name, env, inline)| {
        let status = match resolve_secret(&env, inline.as_deref()) {
            Some(secret) => format!("({} ✓)", secret.source),
            None => format!("(no key, set {})", env),
        };
        (name, status)
    })
    .collect()
}
