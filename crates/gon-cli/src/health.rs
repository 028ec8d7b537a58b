//! `gon health` — probe OpenRouter and print the health snapshot as JSON.

use anyhow::{Context, Result};
use serde_json::json;

use gon_core::Config;
use gon_providers::ProviderRouter;

pub async fn run(config: &Config) -> Result<()> {
    let router = ProviderRouter::from_config(config).context("failed to initialize OpenRouter")?;

    let health = router.health_check().await;
    let report = json!({
        "health": health,
        "usage": router.usage_snapshot(),
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize health report")?
    );
    Ok(())
}
