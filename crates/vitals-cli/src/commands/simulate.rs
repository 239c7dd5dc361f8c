//! Simulate command implementation

use std::path::Path;

use anyhow::{Context, Result};
use vitals_core::{normalize, BudgetField, Config, ScoringBackend, SimulationController};

use super::core::{make_client, read_household};
use crate::render::render_snapshot;

/// Parse `Field=value`
pub fn parse_edit(edit: &str) -> Result<(BudgetField, String)> {
    let (field, value) = edit
        .split_once('=')
        .with_context(|| format!("Invalid edit {:?} (expected Field=value)", edit))?;
    let field: BudgetField = field.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    Ok((field, value.trim().to_string()))
}

/// Score the baseline, apply every edit, and print the simulated deltas
///
/// Edits are applied back to back, so they collapse into a single
/// simulation request.
pub async fn cmd_simulate(config: &Config, input: &Path, edits: &[String]) -> Result<()> {
    let edits = edits
        .iter()
        .map(|e| parse_edit(e))
        .collect::<Result<Vec<_>>>()?;

    let household = read_household(input)?;
    let client = make_client(config)?;

    let raw = client
        .score(&household)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Baseline scoring failed")?;
    let baseline = normalize(&raw);

    let sim = SimulationController::new(
        client,
        household.clone(),
        baseline.health_score,
        baseline.health_breakdown,
        config.simulation.debounce,
    );
    for (field, value) in &edits {
        sim.set_field_str(field.as_str(), value)
            .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    }

    let limit = config.simulation.debounce + config.service.request_timeout;
    let snapshot = wait_for_result(&sim, limit).await?;

    println!();
    println!("🔮 What-if vs. baseline score {:.1}", baseline.health_score);
    println!("   ─────────────────────────────────────────────────────────────");
    for (field, _) in &edits {
        println!(
            "   {:<18} {:>10.2} → {:>10.2}",
            field.label(),
            household.get(*field),
            snapshot.values.get(*field)
        );
    }
    println!();
    print!("{}", render_snapshot(&snapshot));

    Ok(())
}

/// Wait until no edit is pending and no request is in flight
///
/// Returns the current state at once when nothing is outstanding, including
/// before the first edit.
pub async fn wait_for_result<B: ScoringBackend + 'static>(
    sim: &SimulationController<B>,
    limit: std::time::Duration,
) -> Result<vitals_core::SimulationSnapshot> {
    let mut updates = sim.subscribe();
    let settled = tokio::time::timeout(limit, async {
        loop {
            {
                let snapshot = updates.borrow_and_update();
                if !snapshot.pending && !snapshot.is_simulating {
                    return Ok(snapshot.clone());
                }
            }
            if updates.changed().await.is_err() {
                anyhow::bail!("Simulation stopped before a result arrived");
            }
        }
    })
    .await;

    settled.context("Timed out waiting for the simulation")?
}
