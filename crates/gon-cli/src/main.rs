//! Gon CLI — entry point.
//!
//! # Commands
//!
//! - `gon chat [-m MESSAGE] [-u USE_CASE] [--stream]` — talk to Gon (single-shot or REPL)
//! - `gon status` — show configuration and provider status
//! - `gon models` — list the model catalog
//! - `gon health` — probe OpenRouter and print the health snapshot

mod health;
mod helpers;
mod models;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use gon_agent::{ConversationHistory, Persona, PersonaOverlay};
use gon_core::config::{load_config, Config};
use gon_providers::{ProviderRouter, UseCase};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// 🎭 Gon — Brazilian voice assistant, LLM layer
#[derive(Parser)]
#[command(name = "gon", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.gon/config.json)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with Gon (single-shot or interactive REPL)
    Chat {
        /// Single message (non-interactive). Omit for REPL mode.
        #[arg(short, long)]
        message: Option<String>,

        /// speed | quality | free | balanced | portuguese | default
        #[arg(short, long)]
        use_case: Option<String>,

        /// Print the reply as it streams in
        #[arg(long, default_value_t = false)]
        stream: bool,

        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },

    /// Show configuration and provider status
    Status,

    /// List available models
    Models,

    /// Probe OpenRouter and print health + usage as JSON
    Health {
        /// Enable debug logging
        #[arg(long, default_value_t = false)]
        logs: bool,
    },
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref().map(helpers::expand_tilde);

    match cli.command {
        Commands::Chat {
            message,
            use_case,
            stream,
            logs,
        } => {
            init_logging(logs);
            let config = load(config_path)?;
            run_chat(&config, message, use_case, stream).await
        }
        Commands::Status => {
            init_logging(false);
            status::run(config_path.as_deref())
        }
        Commands::Models => models::run(),
        Commands::Health { logs } => {
            init_logging(logs);
            let config = load(config_path)?;
            health::run(&config).await
        }
    }
}

fn load(path: Option<PathBuf>) -> Result<Config> {
    let config = load_config(path.as_deref());
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ─────────────────────────────────────────────
// Chat command
// ─────────────────────────────────────────────

async fn run_chat(
    config: &Config,
    message: Option<String>,
    use_case: Option<String>,
    stream: bool,
) -> Result<()> {
    let router = Arc::new(
        ProviderRouter::from_config(config).context("failed to initialize OpenRouter")?,
    );

    let use_case = match use_case {
        Some(u) => u.parse::<UseCase>()?,
        None => router.default_use_case(),
    };

    let overlay = PersonaOverlay::new(router.clone(), Persona::gon())
        .with_use_case(use_case)
        .with_language_routing(config.llm.route_by_language);

    match message {
        Some(msg) => {
            info!(%use_case, "processing single message");
            let mut history = ConversationHistory::new();
            helpers::ask(&overlay, &msg, &mut history, stream).await?;
        }
        None => repl::run(&overlay, stream).await?,
    }

    let usage = router.usage_snapshot();
    info!(
        requests = usage.total_requests,
        fallbacks = usage.fallback_count,
        avg_latency_ms = usage.average_latency_ms,
        "session finished"
    );
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("gon=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
