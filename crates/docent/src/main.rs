//! Docent - policy document assistant with tool-augmented answers.
//!
//! Main entry point for the docent CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod commands;

use commands::{ask, config, start};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Docent - policy document assistant with tool-augmented answers
#[derive(Parser)]
#[command(name = "docent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Server URL (default: http://localhost:8080)
    #[arg(long, global = true, env = "DOCENT_SERVER_URL")]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the docent server
    Start(start::StartArgs),

    /// Ask a question against a running server
    Ask(ask::AskArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + daily-rotated JSON file
    let filter = if cli.verbose {
        "docent=debug,docent_controller=debug,docent_tools=debug,docent_backends=debug,docent_session=debug,docent_server=debug,tower_http=debug,info"
    } else {
        "docent=info,docent_controller=info,docent_server=info,warn"
    };

    let log_dir = docent_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "docent.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "docent=trace,docent_controller=trace,docent_tools=trace,docent_backends=trace,docent_session=trace,docent_server=trace,docent_config=trace,info",
                )),
        )
        .init();

    let server_url = cli
        .server
        .unwrap_or_else(|| "http://localhost:8080".to_string());

    let ctx = commands::Context {
        server_url,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Start(args) => start::run(args, &ctx).await,
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
