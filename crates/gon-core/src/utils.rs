//! Utility helpers — path resolution and string manipulation.

use std::path::PathBuf;

/// Get the Gon data directory (e.g. `~/.gon/`).
pub fn get_data_path() -> PathBuf {
    let home = dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".gon")
}

/// Get the REPL history file (e.g. `~/.gon/history/cli_history`).
pub fn get_history_path() -> PathBuf {
    get_data_path().join("history").join("cli_history")
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("olá", 10), "olá");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate_string("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("hello world, this is a long string", 15);
        assert_eq!(result, "hello world,...");
    }

    #[test]
    fn test_truncate_unicode() {
        assert_eq!(truncate_string("não, não, não", 6), "não...");
    }

    #[test]
    fn test_data_path_ends_with_gon() {
        assert!(get_data_path().ends_with(".gon"));
    }

    #[test]
    fn test_data_path_under_home_dir() {
        if let Some(home) = dirs_next::home_dir() {
            assert_eq!(get_data_path(), home.join(".gon"));
        }
    }

    #[test]
    fn test_history_path_under_data_dir() {
        let path = get_history_path();
        assert!(path.ends_with("history/cli_history"));
        assert!(path.starts_with(get_data_path()));
    }
}
