//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history. One
//! REPL run is one conversation session.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use gon_agent::{ConversationHistory, PersonaOverlay};
use gon_core::utils::get_history_path;

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "sair", "/exit", "/quit", ":q"];

/// Slash commands that act on the session instead of asking Gon.
#[derive(Debug, PartialEq, Eq)]
enum SessionCommand {
    /// Print the recent-conversation context.
    History,
    /// Forget the session's turns.
    Clear,
}

/// Run the interactive REPL loop.
pub async fn run(overlay: &PersonaOverlay, stream: bool) -> Result<()> {
    helpers::print_banner(overlay.persona().initial_greeting());

    let mut editor = create_editor()?;
    let mut history = ConversationHistory::new();

    loop {
        let input = match editor.readline("Você: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => break,
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\n{} 👋", overlay.persona().farewell);
            break;
        }

        let _ = editor.add_history_entry(&input);

        if let Some(command) = parse_session_command(trimmed) {
            run_session_command(command, &mut history);
            continue;
        }

        debug!(input = trimmed, turns = history.len(), "processing input");
        if let Err(e) = helpers::ask(overlay, trimmed, &mut history, stream).await {
            eprintln!("\n❌ Error: {e:#}\n");
        }
    }

    save_history(&mut editor);
    Ok(())
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

fn parse_session_command(input: &str) -> Option<SessionCommand> {
    match input.to_lowercase().as_str() {
        "/history" | "/historico" | "/histórico" => Some(SessionCommand::History),
        "/clear" | "/limpar" => Some(SessionCommand::Clear),
        _ => None,
    }
}

fn run_session_command(command: SessionCommand, history: &mut ConversationHistory) {
    match command {
        SessionCommand::History => {
            let context = history.context();
            if context.is_empty() {
                println!("{}", "(sem histórico ainda)".dimmed());
            } else {
                println!("\n{context}\n");
            }
        }
        SessionCommand::Clear => {
            history.clear();
            println!("{}", "Histórico limpo.".dimmed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gon_core::types::Role;

    #[test]
    fn exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("SAIR"));
        assert!(is_exit_command("/quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("tchau"));
        assert!(!is_exit_command(""));
    }

    #[test]
    fn session_commands() {
        assert_eq!(parse_session_command("/history"), Some(SessionCommand::History));
        assert_eq!(parse_session_command("/HISTÓRICO"), Some(SessionCommand::History));
        assert_eq!(parse_session_command("/limpar"), Some(SessionCommand::Clear));
        assert_eq!(parse_session_command("history"), None);
        assert!(!is_exit_command("/clear"));
    }

    #[test]
    fn clear_command_empties_history() {
        let mut history = ConversationHistory::new();
        history.push(Role::User, "oi");
        history.push(Role::Assistant, "E aí!");
        assert!(history.context().contains("oi"));

        run_session_command(SessionCommand::Clear, &mut history);
        assert!(history.is_empty());
        assert!(history.context().is_empty());
    }

    #[test]
    fn history_path_under_data_dir() {
        let path = get_history_path();
        assert!(path.to_string_lossy().contains(".gon"));
        assert!(path.to_string_lossy().contains("cli_history"));
    }
}
