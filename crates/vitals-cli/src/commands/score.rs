//! Score command implementation

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use vitals_core::{normalize, Config, ScoringBackend};

use super::core::{make_client, read_household};
use crate::render::render_overview;

/// Score a household budget and print the overview page
pub async fn cmd_score(config: &Config, input: &Path, save: Option<&Path>, json: bool) -> Result<()> {
    let household = read_household(input)?;
    let client = make_client(config)?;

    let raw = client
        .score(&household)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Scoring failed ({})", client.host()))?;
    let report = normalize(&raw);

    if let Some(path) = save {
        save_report(path, raw)?;
        println!("💾 Saved report to {}", path.display());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("📊 Financial Health Overview");
        println!("   ─────────────────────────────────────────────────────────────");
        print!("{}", render_overview(&report));
        println!();
        println!("Next steps:");
        println!("  Explore interactively: vitals session --input {}", input.display());
    }

    Ok(())
}

/// Write a raw report with a `saved_at` stamp; readers ignore the extra key
pub fn save_report(path: &Path, mut raw: Value) -> Result<()> {
    if let Value::Object(map) = &mut raw {
        map.insert("saved_at".into(), Value::String(Utc::now().to_rfc3339()));
    }
    let content = serde_json::to_string_pretty(&raw)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
