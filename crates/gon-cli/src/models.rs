//! `gon models` — list the model catalog.

use anyhow::Result;
use colored::Colorize;

use gon_providers::catalog::{self, ModelDescriptor, ModelFamily};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🎭 Gon Models".cyan().bold());

    section("Available", &catalog::available_models());

    let portuguese: Vec<&ModelDescriptor> = catalog::MODELS
        .iter()
        .filter(|m| m.family == ModelFamily::Portuguese)
        .collect();
    section("Portuguese-optimized (routing only)", &portuguese);

    println!();
    Ok(())
}

fn section(title: &str, models: &[&ModelDescriptor]) {
    println!();
    println!("  {}", title.bold());
    for m in models {
        let cost = if m.is_paid() {
            m.cost_label.yellow()
        } else {
            m.cost_label.green()
        };
        println!(
            "    {:<22} {:<10} {:>9} ctx  {}",
            m.key,
            cost,
            m.context_size,
            m.description.dimmed()
        );
    }
}
