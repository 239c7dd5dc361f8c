//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, client, input files) and `health`
//! - `score` - Score a budget and print the overview
//! - `simulate` - One-shot what-if edits against a baseline
//! - `goals` - Goal feasibility
//! - `export` - Export a saved report to PDF
//! - `session` - Interactive report session

pub mod core;
pub mod export;
pub mod goals;
pub mod score;
pub mod session;
pub mod simulate;

// Re-export command functions for main.rs
pub use core::*;
pub use export::*;
pub use goals::*;
pub use score::*;
pub use session::*;
pub use simulate::*;

/// Format a signed delta with an explicit sign
pub fn signed(value: f64, precision: usize) -> String {
    if value > 0.0 {
        format!("+{:.*}", precision, value)
    } else {
        format!("{:.*}", precision, value)
    }
}
