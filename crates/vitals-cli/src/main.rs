//! Vitals CLI - Household financial health explorer
//!
//! Usage:
//!   vitals health                                   Check the scoring service
//!   vitals score --input household.json             Score a budget
//!   vitals simulate --input h.json --set Housing=900  What-if edits
//!   vitals goal --input h.json --name Car --amount 6000 --months 24
//!   vitals export --report report.json              Export a saved report to PDF
//!   vitals session --input household.json           Interactive report session

mod cli;
mod commands;
mod render;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = commands::load_config(cli.config.as_deref(), cli.api_url.clone(), cli.mock)?;

    match cli.command {
        Commands::Health => commands::cmd_health(&config).await,
        Commands::Score { input, save, json } => {
            commands::cmd_score(&config, &input, save.as_deref(), json).await
        }
        Commands::Simulate { input, edits } => {
            commands::cmd_simulate(&config, &input, &edits).await
        }
        Commands::Goal {
            input,
            name,
            amount,
            months,
            priority,
        } => commands::cmd_goal(&config, &input, &name, &amount, &months, &priority).await,
        Commands::Export {
            report,
            output,
            page,
            all,
        } => commands::cmd_export(&config, &report, &output, &page, all).await,
        Commands::Session { input, report } => {
            commands::cmd_session(&config, input.as_deref(), report.as_deref()).await
        }
    }
}
