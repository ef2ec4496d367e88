//! Ask command - one question to a running server.

use anyhow::Result;
use clap::Args;
use console::Style;
use uuid::Uuid;

use docent_types::{McpRequestBody, McpResponse, ToolInvocation, ToolType};

use super::Context;
use crate::client::Client;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to ask
    #[arg(required = true)]
    pub question: String,

    /// Continue an existing session
    #[arg(short, long)]
    pub session: Option<Uuid>,

    /// Generation temperature (0.0 - 1.0)
    #[arg(short, long)]
    pub temperature: Option<f64>,

    /// Explicitly run intent detection
    #[arg(long)]
    pub classify: bool,

    /// Explicitly run a vector search
    #[arg(long)]
    pub search: bool,

    /// Number of passages to retrieve (with --search)
    #[arg(long, requires = "search")]
    pub top_k: Option<i64>,
}

impl AskArgs {
    fn to_body(&self) -> McpRequestBody {
        let mut body = McpRequestBody::new(&self.question);
        if let Some(id) = self.session {
            body = body.with_session_id(id);
        }
        if let Some(t) = self.temperature {
            body = body.with_temperature(t);
        }
        if self.classify {
            body = body.with_tool(ToolInvocation::new(ToolType::IntentDetection));
        }
        if self.search {
            let mut invocation = ToolInvocation::new(ToolType::VectorSearch);
            if let Some(k) = self.top_k {
                invocation = invocation.with_param("top_k", k);
            }
            body = body.with_tool(invocation);
        }
        body
    }
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let client = Client::new(&ctx.server_url)?;
    let body = args.to_body();

    if ctx.verbose {
        let dim = Style::new().dim();
        eprintln!("{}", dim.apply_to(format!("Sending to: {}", ctx.server_url)));
    }

    if ctx.json_output {
        let value = client.query_raw(&body).await?;
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let response = client.query(&body).await?;
    print_response(&response, ctx.verbose);
    Ok(())
}

fn print_response(response: &McpResponse, verbose: bool) {
    let dim = Style::new().dim();
    let bold = Style::new().bold();

    println!("{}", response.answer);

    if !response.sources.is_empty() {
        println!();
        println!("{}", bold.apply_to("Sources:"));
        for source in &response.sources {
            println!("  - {} ({})", source.name, source.doc_type);
        }
    }

    if let Some(ref intent) = response.detected_intent {
        println!();
        println!(
            "{}",
            dim.apply_to(format!(
                "Intent: {} -> {} ({:.2})",
                intent.intent, intent.route, intent.score
            ))
        );
    }

    if let Some(ref results) = response.tool_results {
        for result in results {
            let line = match result.message() {
                None => format!("[{}: ok]", result.tool_type),
                Some(message) => format!("[{}: failed: {}]", result.tool_type, message),
            };
            println!("{}", dim.apply_to(line));
        }
    }

    if verbose {
        println!();
    }
    println!("{}", dim.apply_to(format!("Session: {}", response.session_id)));
}
