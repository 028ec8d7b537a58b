//! Config loader — reads `~/.gon/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.gon/config.json`
//! 3. Environment: `OPENROUTER_API_KEY`, `OPENROUTER_ENABLED`, and
//!    `GON_<SECTION>__<FIELD>` overrides

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
/// Ranges are not checked here; call [`Config::validate`] before use.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);
    let config = load_config_file(&config_path);
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Load the file layer only (defaults + JSON).
fn load_config_file(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment overrides on top of a loaded config.
///
/// `lookup` resolves a variable name to its value; production passes
/// `std::env::var`. Unparsable numeric values are ignored with a warning.
///
/// Supported overrides:
/// - `OPENROUTER_API_KEY` → `openrouter.api_key`
/// - `OPENROUTER_ENABLED` → `features.openrouter_enabled`
/// - `GON_OPENROUTER__API_BASE` → `openrouter.api_base`
/// - `GON_OPENROUTER__DEFAULT_MODEL` → `openrouter.default_model`
/// - `GON_OPENROUTER__TEMPERATURE` → `openrouter.temperature`
/// - `GON_OPENROUTER__MAX_TOKENS` → `openrouter.max_tokens`
/// - `GON_LLM__VOICE_OPTIMIZED` → `llm.voice_optimized`
/// - `GON_LLM__CLOUD_TIMEOUT_MS` → `llm.cloud_timeout_ms`
/// - `GON_LLM__LANGUAGE` → `llm.language`
/// - `GON_CIRCUIT__RESET_TIMEOUT_MS` → `circuit.reset_timeout_ms`
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("OPENROUTER_API_KEY") {
        config.openrouter.api_key = val;
    }
    if let Some(val) = lookup("OPENROUTER_ENABLED") {
        config.features.openrouter_enabled = parse_bool(&val);
    }

    if let Some(val) = lookup("GON_OPENROUTER__API_BASE") {
        config.openrouter.api_base = val;
    }
    if let Some(val) = lookup("GON_OPENROUTER__DEFAULT_MODEL") {
        config.openrouter.default_model = val;
    }
    if let Some(val) = lookup("GON_OPENROUTER__TEMPERATURE") {
        match val.parse::<f64>() {
            Ok(t) => config.openrouter.temperature = t,
            Err(_) => warn!("Ignoring GON_OPENROUTER__TEMPERATURE={}", val),
        }
    }
    if let Some(val) = lookup("GON_OPENROUTER__MAX_TOKENS") {
        match val.parse::<u32>() {
            Ok(n) => config.openrouter.max_tokens = n,
            Err(_) => warn!("Ignoring GON_OPENROUTER__MAX_TOKENS={}", val),
        }
    }

    if let Some(val) = lookup("GON_LLM__VOICE_OPTIMIZED") {
        config.llm.voice_optimized = parse_bool(&val);
    }
    if let Some(val) = lookup("GON_LLM__CLOUD_TIMEOUT_MS") {
        match val.parse::<u64>() {
            Ok(n) => config.llm.cloud_timeout_ms = n,
            Err(_) => warn!("Ignoring GON_LLM__CLOUD_TIMEOUT_MS={}", val),
        }
    }
    if let Some(val) = lookup("GON_LLM__LANGUAGE") {
        config.llm.language = val;
    }

    if let Some(val) = lookup("GON_CIRCUIT__RESET_TIMEOUT_MS") {
        match val.parse::<u64>() {
            Ok(n) => config.circuit.reset_timeout_ms = n,
            Err(_) => warn!("Ignoring GON_CIRCUIT__RESET_TIMEOUT_MS={}", val),
        }
    }

    config
}

fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
