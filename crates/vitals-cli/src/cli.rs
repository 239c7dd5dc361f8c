//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vitals - Explore the financial health of a household budget
#[derive(Parser)]
#[command(name = "vitals")]
#[command(about = "Household financial health scoring and what-if explorer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.config/vitals/config.toml, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Scoring service base URL (overrides config and VITALS_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Use the in-process mock backend instead of the scoring service
    #[arg(long, global = true)]
    pub mock: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the scoring service is reachable
    Health,

    /// Score a household budget and show the overview
    Score {
        /// Household budget JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Save the raw report for later `export` or `session --report`
        #[arg(long)]
        save: Option<PathBuf>,

        /// Print the normalized report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply what-if edits to a budget and compare against its baseline score
    Simulate {
        /// Household budget JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Edit as Field=value (repeatable), e.g. --set Housing=900
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        edits: Vec<String>,
    },

    /// Check whether a savings goal is feasible for a budget
    Goal {
        /// Household budget JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Goal name
        #[arg(long)]
        name: String,

        /// Target amount
        #[arg(long)]
        amount: String,

        /// Months to reach the goal
        #[arg(long)]
        months: String,

        /// Priority: low, medium, high
        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// Export a saved report to PDF (no network call)
    Export {
        /// Raw report JSON (as saved by `score --save`)
        #[arg(short, long)]
        report: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Page to export: overview, analysis, actions
        #[arg(long, default_value = "overview")]
        page: String,

        /// Export all three pages into one document
        #[arg(long)]
        all: bool,
    },

    /// Interactive report session
    Session {
        /// Household budget JSON file to score on start
        #[arg(short, long, conflicts_with = "report")]
        input: Option<PathBuf>,

        /// Saved raw report to resume without scoring
        #[arg(short, long)]
        report: Option<PathBuf>,
    },
}
