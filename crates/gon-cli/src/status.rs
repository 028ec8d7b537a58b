//! `gon status` — show configuration and provider status.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use gon_core::config::{get_config_path, load_config};
use gon_providers::catalog;

/// Run the status command.
pub fn run(path: Option<&Path>) -> Result<()> {
    let config = load_config(path);
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    println!();
    println!("{}", "🎭 Gon Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found, using defaults)".red().to_string()
        }
    );

    let validity = match config.validate() {
        Ok(()) => "✓ valid".green().to_string(),
        Err(e) => format!("{} {}", "✗".red(), e),
    };
    println!("  {:<18} {}", "Validation:".bold(), validity);

    // Model
    let openrouter = &config.openrouter;
    let model_status = match catalog::find_by_key(&openrouter.default_model) {
        Some(m) => format!("{} {}", m.display_name, format!("({})", m.provider_model_id).dimmed()),
        None => format!("{} {}", openrouter.default_model, "(not in catalog)".red()),
    };
    println!("  {:<18} {}", "Model:".bold(), model_status);

    println!(
        "  {:<18} {} | max_tokens: {}",
        "Parameters:".bold(),
        format!("temp: {}", openrouter.temperature).dimmed(),
        format!(
            "{} (effective {})",
            openrouter.max_tokens,
            config.llm.clamp_max_tokens(openrouter.max_tokens)
        )
        .dimmed(),
    );

    println!(
        "  {:<18} voice: {} | timeout: {} ms | language: {}",
        "LLM:".bold(),
        on_off(config.llm.voice_optimized),
        config.llm.cloud_timeout_ms,
        config.llm.language,
    );

    // Provider
    println!();
    println!("  {}", "Providers:".bold());
    let openrouter_status = if !config.features.openrouter_enabled {
        format!("{}", "· disabled".dimmed())
    } else if openrouter.is_configured() {
        format!("{} (key set)", "✓".green())
    } else {
        format!("{}", "✗ OPENROUTER_API_KEY missing".red())
    };
    println!("    {:<20} {}", "OpenRouter", openrouter_status);
    println!("    {:<20} {}", "Local", "· not available".dimmed());

    // Circuit breaker
    let circuit = &config.circuit;
    println!();
    println!(
        "  {:<18} opens above {}% failures over ≥{} calls (window {}), retries after {} ms",
        "Circuit:".bold(),
        circuit.error_threshold_percentage,
        circuit.volume_threshold,
        circuit.window_size,
        circuit.reset_timeout_ms,
    );
    println!();

    Ok(())
}

fn on_off(flag: bool) -> String {
    if flag {
        "on".green().to_string()
    } else {
        "off".dimmed().to_string()
    }
}
