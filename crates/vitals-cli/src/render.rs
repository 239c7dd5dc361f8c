//! Terminal rendering of report pages and a raster capture for PDF export
//!
//! The capture draws the same content as the text pages as bar charts: the
//! health score, then page-specific rows (breakdown, spending shares, or
//! simulated scores and goals).

use std::io::{IsTerminal, Write};

use async_trait::async_trait;
use vitals_core::{
    BreakdownAxis, Feasibility, GoalPlanner, NormalizedReport, PageView, Priority, RasterImage,
    ReportWizard, ScoringBackend, SimulationSnapshot, ViewCapture, Viewport, WizardPage,
};

use crate::commands::signed;

/// Clears the terminal when the wizard asks to scroll to top
pub struct TerminalViewport;

impl Viewport for TerminalViewport {
    fn scroll_to_top(&self) {
        let mut stdout = std::io::stdout();
        if stdout.is_terminal() {
            let _ = write!(stdout, "\x1b[2J\x1b[H");
            let _ = stdout.flush();
        }
    }
}

fn bar(value: f64, width: usize) -> String {
    let filled = ((value.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

pub fn render_page<B: ScoringBackend + Clone + 'static>(wizard: &ReportWizard<B>) -> String {
    let mut out = format!(
        "── {} ({}/{}) ──\n",
        wizard.page().title(),
        wizard.page_number(),
        wizard.total_pages()
    );
    let body = match wizard.page() {
        WizardPage::Overview => render_overview(wizard.report()),
        WizardPage::Analysis => render_analysis(wizard.report()),
        WizardPage::Actions => {
            let mut actions = String::new();
            if let Some(sim) = wizard.simulation() {
                actions.push_str(&render_snapshot(&sim.snapshot()));
                actions.push('\n');
            }
            actions.push_str(&render_goals(wizard.goals()));
            actions.push('\n');
            actions.push_str(&render_recommendations(wizard.report()));
            actions
        }
    };
    out.push_str(&body);
    out
}

pub fn render_overview(report: &NormalizedReport) -> String {
    let summary = &report.executive_summary;
    let mut out = String::new();
    out.push_str(&format!(
        "  Health score: {:>5.1}  {}\n",
        report.health_score,
        bar(report.health_score, 30)
    ));
    out.push_str(&format!(
        "  Prediction:   {} ({:.0}% confidence)\n\n",
        report.prediction,
        report.confidence * 100.0
    ));
    out.push_str(&format!("  Status:           {}\n", summary.status));
    out.push_str(&format!("  Primary cause:    {}\n", summary.primary_cause));
    out.push_str(&format!("  Urgent action:    {}\n", summary.urgent_action));
    out.push_str(&format!("  Recovery horizon: {}\n\n", summary.recovery_horizon));
    for axis in BreakdownAxis::ALL {
        let value = report.health_breakdown.get(axis);
        out.push_str(&format!("  {:<20} {:>5.1}  {}\n", axis.label(), value, bar(value, 20)));
    }
    out
}

pub fn render_analysis(report: &NormalizedReport) -> String {
    let m = &report.financial_metrics;
    let mut out = String::new();
    out.push_str(&format!("  Total expenditure:   ${:.2}\n", m.total_expenditure));
    out.push_str(&format!("  Savings:             ${:.2}\n", m.savings));
    out.push_str(&format!("  Savings rate:        {:.1}%\n", m.savings_rate_pct));
    out.push_str(&format!("  Expenditure/income:  {:.1}%\n", m.expenditure_to_income_pct));
    out.push_str(&format!("  Housing burden:      {:.1}%\n", m.housing_burden_pct));
    out.push_str(&format!("  Essential spending:  {:.1}%\n", m.essential_spending_pct));
    out.push_str(&format!("  Discretionary:       {:.1}%\n", m.discretionary_spending_pct));

    if !report.probabilities.is_empty() {
        out.push_str("\n  Class probabilities:\n");
        for (label, p) in &report.probabilities {
            out.push_str(&format!("    {:<12} {:>5.1}%\n", label, p * 100.0));
        }
    }

    if report.risk_factors.is_empty() {
        out.push_str("\n  No risk factors reported\n");
    } else {
        out.push_str("\n  Risk factors:\n");
        for risk in &report.risk_factors {
            out.push_str(&format!(
                "    • {} = {:.2} (threshold {}): {}\n",
                risk.factor, risk.value, risk.threshold, risk.explanation
            ));
        }
    }
    for line in &report.risk_explanation_text {
        out.push_str(&format!("    {}\n", line));
    }

    if report.recovery_timeline_months > 0 {
        out.push_str(&format!(
            "\n  Recovery: {} months, saving ${:.0}/month\n",
            report.recovery_timeline_months, report.monthly_savings_needed
        ));
    }
    out
}

pub fn render_recommendations(report: &NormalizedReport) -> String {
    let mut out = String::from("  Recommendations:\n");
    if report.recommendations.is_empty() {
        out.push_str("    (none)\n");
    }
    for rec in &report.recommendations {
        out.push_str(&format!("    [{}] {} ({})\n", rec.priority, rec.title, rec.category));
        if !rec.details.is_empty() {
            out.push_str(&format!("        {}\n", rec.details));
        }
    }
    out
}

pub fn render_snapshot(snapshot: &SimulationSnapshot) -> String {
    let mut out = String::from("  What-if simulation:\n");
    match &snapshot.result {
        Some(result) => {
            out.push_str(&format!(
                "    Simulated score: {:.1} ({}) {}\n",
                result.health_score,
                signed(snapshot.score_delta, 1),
                snapshot.trajectory.as_str()
            ));
            for axis in BreakdownAxis::ALL {
                out.push_str(&format!(
                    "    {:<20} {}\n",
                    axis.label(),
                    signed(snapshot.component_deltas.get(axis), 1)
                ));
            }
        }
        None => out.push_str("    No simulated score yet\n"),
    }
    out.push_str(&format!(
        "    Monthly surplus change: ${}\n",
        signed(snapshot.surplus_delta, 0)
    ));
    if snapshot.is_simulating {
        out.push_str("    ⏳ Simulating...\n");
    }
    if let Some(error) = &snapshot.last_error {
        out.push_str(&format!("    ⚠️  {}\n", error));
    }
    out
}

pub fn render_goals<B: ScoringBackend>(planner: &GoalPlanner<B>) -> String {
    let goals = planner.goals();
    let mut out = String::from("  Goals:\n");
    if goals.is_empty() {
        out.push_str("    No goals yet\n");
    }
    for (i, planned) in goals.iter().enumerate() {
        let (goal, analysis) = (planned.goal(), planned.analysis());
        out.push_str(&format!(
            "    {}. {} [{}] ${:.0} over {} months: ${:.0}/month, {}\n",
            i + 1,
            goal.goal_name,
            goal.priority,
            goal.goal_amount,
            goal.duration_months,
            analysis.required_monthly,
            analysis.feasibility
        ));
    }
    if let Some(pending) = planner.pending() {
        out.push_str(&format!(
            "    Pending: {} is {} (needs ${:.0}/month, safe capacity ${:.0}/month)\n",
            pending.goal().goal_name,
            pending.analysis().feasibility,
            pending.analysis().required_monthly,
            pending.analysis().available_surplus
        ));
    }
    if let Some(error) = planner.error() {
        out.push_str(&format!("    ⚠️  {}\n", error));
    }
    out
}

const CAPTURE_WIDTH: u32 = 640;
const ROW_HEIGHT: u32 = 32;
const BACKGROUND: [u8; 3] = [250, 250, 250];
const TRACK: [u8; 3] = [225, 225, 230];

/// Renders report pages as bar charts
pub struct ChartCapture;

fn score_color(score: f64) -> [u8; 3] {
    if score >= 70.0 {
        GREEN
    } else if score >= 40.0 {
        AMBER
    } else {
        RED
    }
}

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: BACKGROUND.repeat(width as usize * height as usize),
        }
    }

    fn fill(&mut self, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
        for row in y..(y + h).min(self.height) {
            for col in x..(x + w).min(self.width) {
                let i = (row as usize * self.width as usize + col as usize) * 3;
                self.pixels[i..i + 3].copy_from_slice(&color);
            }
        }
    }

    /// Horizontal bar for a 0-100 value in the given row
    fn bar_row(&mut self, row: u32, value: f64, color: [u8; 3]) {
        let y = row * ROW_HEIGHT + 8;
        let track_width = self.width - 32;
        self.fill(16, y, track_width, ROW_HEIGHT - 16, TRACK);
        let filled = (value.clamp(0.0, 100.0) / 100.0 * f64::from(track_width)).round() as u32;
        self.fill(16, y, filled, ROW_HEIGHT - 16, color);
    }

    fn into_image(self) -> vitals_core::Result<RasterImage> {
        RasterImage::new(self.width, self.height, self.pixels)
    }
}

const BLUE: [u8; 3] = [56, 116, 203];
const GREEN: [u8; 3] = [46, 160, 67];
const AMBER: [u8; 3] = [219, 161, 30];
const RED: [u8; 3] = [207, 52, 52];

/// Simulated score, then one row per component delta centred on 50
fn simulation_rows(snapshot: &SimulationSnapshot) -> Vec<(f64, [u8; 3])> {
    let Some(result) = &snapshot.result else {
        return Vec::new();
    };
    let mut rows = vec![(result.health_score, score_color(result.health_score))];
    for axis in BreakdownAxis::ALL {
        let delta = snapshot.component_deltas.get(axis);
        rows.push((50.0 + delta / 2.0, if delta < 0.0 { RED } else { GREEN }));
    }
    rows
}

fn page_rows(view: &PageView<'_>) -> Vec<(f64, [u8; 3])> {
    let report = view.report;
    match view.page {
        WizardPage::Overview => BreakdownAxis::ALL
            .iter()
            .map(|axis| {
                let value = report.health_breakdown.get(*axis);
                (value, score_color(value))
            })
            .collect(),
        WizardPage::Analysis => {
            let m = &report.financial_metrics;
            vec![
                (m.expenditure_to_income_pct, BLUE),
                (m.housing_burden_pct, BLUE),
                (m.essential_spending_pct, BLUE),
                (m.discretionary_spending_pct, BLUE),
                (m.savings_rate_pct, score_color(m.savings_rate_pct * 5.0)),
            ]
        }
        WizardPage::Actions => {
            let mut rows = view
                .simulation
                .as_ref()
                .map(simulation_rows)
                .unwrap_or_default();
            // Share of each goal's monthly need covered by safe capacity
            rows.extend(view.goals.iter().map(|planned| {
                let analysis = planned.analysis();
                let covered = if analysis.required_monthly > 0.0 {
                    analysis.available_surplus / analysis.required_monthly * 100.0
                } else {
                    100.0
                };
                let color = match analysis.feasibility {
                    Feasibility::Achievable => GREEN,
                    Feasibility::Tight => AMBER,
                    Feasibility::Infeasible => RED,
                };
                (covered, color)
            }));
            rows.extend(report.recommendations.iter().map(|rec| match rec.priority {
                Priority::High => (100.0, RED),
                Priority::Medium => (66.0, AMBER),
                Priority::Low => (33.0, BLUE),
            }));
            rows
        }
    }
}

#[async_trait]
impl ViewCapture for ChartCapture {
    async fn capture(&self, view: &PageView<'_>) -> vitals_core::Result<RasterImage> {
        let rows = page_rows(view);
        let score = view.report.health_score;
        // Header row holds the overall score
        let height = ROW_HEIGHT * (rows.len() as u32 + 2);
        let mut canvas = Canvas::new(CAPTURE_WIDTH, height);

        canvas.bar_row(0, score, score_color(score));
        for (i, (value, color)) in rows.into_iter().enumerate() {
            canvas.bar_row(i as u32 + 2, value, color);
        }

        canvas.into_image()
    }
}
