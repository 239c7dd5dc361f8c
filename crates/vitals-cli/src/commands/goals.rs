//! Goal command implementation

use std::path::Path;

use anyhow::Result;
use vitals_core::goals::GOAL_FAILURE_MESSAGE;
use vitals_core::{Config, Error, GoalAnalysis, GoalDraft, GoalPlanner, Priority};

use super::core::{make_client, read_household};
use super::signed;

pub fn parse_priority(priority: &str) -> Result<Priority> {
    priority.parse().map_err(|e: String| anyhow::anyhow!(e))
}

/// Check whether a savings goal fits a household budget
pub async fn cmd_goal(
    config: &Config,
    input: &Path,
    name: &str,
    amount: &str,
    months: &str,
    priority: &str,
) -> Result<()> {
    let priority = parse_priority(priority)?;
    let household = read_household(input)?;
    let planner = GoalPlanner::new(make_client(config)?);

    let draft = GoalDraft::new(name, amount, months, priority);
    match planner.analyze(&draft, &household).await {
        Ok(analysis) => {
            println!();
            println!("🎯 {} (${} over {} months)", name.trim(), amount.trim(), months.trim());
            println!("   ─────────────────────────────────────────────────────────────");
            print!("{}", render_goal_analysis(&analysis));
            Ok(())
        }
        Err(Error::Validation(message)) => anyhow::bail!(message),
        Err(e) => {
            println!("⚠️  {}", GOAL_FAILURE_MESSAGE);
            Err(anyhow::anyhow!(e.user_message()))
        }
    }
}

pub fn render_goal_analysis(analysis: &GoalAnalysis) -> String {
    let icon = match analysis.feasibility {
        vitals_core::Feasibility::Achievable => "✅",
        vitals_core::Feasibility::Tight => "⚠️ ",
        vitals_core::Feasibility::Infeasible => "❌",
    };
    let mut out = format!("   {} {}\n", icon, analysis.feasibility);
    out.push_str(&format!("   Required monthly:  ${:.2}\n", analysis.required_monthly));
    out.push_str(&format!("   Safe capacity:     ${:.2}\n", analysis.available_surplus));
    out.push_str(&format!("   Gap:               ${}\n", signed(analysis.gap, 2)));
    out.push_str(&format!("   Distress impact:   {:.1}%\n", analysis.distress_impact_pct));
    if !analysis.suggestions.is_empty() {
        out.push_str("\n   Suggestions:\n");
        for suggestion in &analysis.suggestions {
            out.push_str(&format!("     • {}\n", suggestion));
        }
    }
    out
}
