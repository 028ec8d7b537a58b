//! Shared CLI helpers — path expansion, asking Gon, reply printing, banner.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use gon_agent::{ConversationHistory, PersonaOverlay};
use gon_core::types::{LlmReply, ReplySource};

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_next::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs_next::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Send one user turn. Ctrl-C while waiting cancels the request; the router
/// answers with the fallback reply in that case.
pub async fn ask(
    overlay: &PersonaOverlay,
    message: &str,
    history: &mut ConversationHistory,
    stream: bool,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = if stream {
        print_header();
        let mut stdout = std::io::stdout();
        overlay
            .respond_stream(message, history, Some(cancel), &mut |chunk: &str| {
                let _ = write!(stdout, "{chunk}");
                let _ = stdout.flush();
            })
            .await
    } else {
        print_thinking();
        let reply = overlay.respond(message, history, Some(cancel)).await;
        clear_thinking();
        reply
    };
    watcher.abort();

    let reply = result.context("request rejected")?;
    if stream {
        println!();
        print_footer(&reply);
        println!();
    } else {
        print_reply(&reply);
    }
    Ok(())
}

fn print_header() {
    println!();
    println!("{}", "🎭 Gon".cyan().bold());
}

fn print_footer(reply: &LlmReply) {
    let source = match reply.source {
        ReplySource::Cloud => reply.model.as_str().normal(),
        ReplySource::GonPersona => "persona".green(),
        ReplySource::Fallback => "fallback".yellow(),
    };
    println!(
        "{}",
        format!("  [{} · {} ms]", source, reply.latency_ms).dimmed()
    );
}

/// Print a reply to stdout.
pub fn print_reply(reply: &LlmReply) {
    print_header();
    if reply.content.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{}", reply.content);
    }
    print_footer(reply);
    println!();
}

/// Print the banner shown at REPL start.
pub fn print_banner(greeting: &str) {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}  v{}", "🎭 Gon".cyan().bold(), version.dimmed());
    println!("{}", "Digite uma mensagem, /history, /clear, ou \"sair\" para encerrar.".dimmed());
    println!();
    println!("{greeting}");
    println!();
}

/// Print a "thinking" placeholder.
pub fn print_thinking() {
    eprint!("{}", "⠿ pensando...".dimmed());
}

/// Clear the "thinking" placeholder.
pub fn clear_thinking() {
    eprint!("\r{}\r", " ".repeat(40));
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
