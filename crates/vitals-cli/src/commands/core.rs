//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `load_config` - Resolve configuration with CLI overrides
//! - `read_household` / `read_report` - Input files
//! - `cmd_health` - Check the scoring service

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use vitals_core::{BackendKind, Config, HouseholdInput, ScoringBackend, ScoringClient};

/// Load configuration; `--api-url` and `--mock` win over file and environment
pub fn load_config(path: Option<&Path>, api_url: Option<String>, mock: bool) -> Result<Config> {
    let mut config = Config::load(path).context("Failed to load configuration")?;
    config.apply_overrides(api_url, None);
    if mock {
        config.service.backend = BackendKind::Mock;
    }
    Ok(config)
}

pub fn make_client(config: &Config) -> Result<ScoringClient> {
    ScoringClient::from_config(config).context("Failed to create scoring client")
}

/// Read a household budget; missing demographic fields take defaults
pub fn read_household(path: &Path) -> Result<HouseholdInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let household: HouseholdInput = serde_json::from_str(&content)
        .with_context(|| format!("Invalid household JSON in {}", path.display()))?;
    if household.net_income <= 0.0 {
        anyhow::bail!("Net_Income must be positive in {}", path.display());
    }
    Ok(household)
}

/// Read a raw stored report (any JSON value; normalization fills the gaps)
pub fn read_report(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid report JSON in {}", path.display()))
}

pub async fn cmd_health(config: &Config) -> Result<()> {
    let client = make_client(config)?;

    print!("Checking scoring service at {}... ", client.host());
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!();
        println!("⚠️  Could not reach the scoring service at {}", client.host());
        println!();
        println!("To fix:");
        println!("  1. Start the scoring service");
        println!("  2. Point vitals at it: export VITALS_API_URL=http://host:port");
        println!("  3. Or try the built-in mock: vitals --mock health");
    }

    Ok(())
}
