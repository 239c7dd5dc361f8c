//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use vitals_core::{
    normalize, BackendKind, BudgetField, Config, MockBackend, NoopViewport, Operation, PageView,
    Priority, Session, ViewCapture, WizardPage,
};

use crate::commands::{self, execute, signed, Flow};
use crate::render::{
    render_analysis, render_overview, render_recommendations, render_snapshot, ChartCapture,
};

const WAIT: Duration = Duration::from_secs(5);

fn write_household(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("household.json");
    let household = json!({
        "Net_Income": 5000.0,
        "Housing": 1500.0,
        "Food": 600.0,
        "Transport": 300.0,
        "Recreation": 200.0
    });
    std::fs::write(&path, household.to_string()).unwrap();
    path
}

fn mock_session() -> (MockBackend, Session<MockBackend>) {
    let backend = MockBackend::new();
    let session = Session::new(backend.clone(), &Config::default(), Arc::new(NoopViewport));
    (backend, session)
}

fn mock_config() -> Config {
    let mut config = Config::default();
    config.service.backend = BackendKind::Mock;
    config
}

async fn run(session: &mut Session<MockBackend>, line: &str) -> anyhow::Result<Flow> {
    execute(session, line, WAIT).await
}

async fn scored_session(dir: &TempDir) -> (MockBackend, Session<MockBackend>) {
    let (backend, mut session) = mock_session();
    session.start_analysis();
    let path = write_household(dir);
    run(&mut session, &format!("score {}", path.display()))
        .await
        .unwrap();
    (backend, session)
}

// ========== Helper Tests ==========

#[test]
fn test_signed() {
    assert_eq!(signed(5.25, 1), "+5.2");
    assert_eq!(signed(-3.0, 0), "-3");
    assert_eq!(signed(0.0, 2), "0.00");
}

#[test]
fn test_parse_edit() {
    let (field, value) = commands::parse_edit("Housing=900").unwrap();
    assert_eq!(field, BudgetField::Housing);
    assert_eq!(value, "900");

    let (field, value) = commands::parse_edit("Net_Income= 4200.5 ").unwrap();
    assert_eq!(field, BudgetField::NetIncome);
    assert_eq!(value, "4200.5");
}

#[test]
fn test_parse_edit_rejects_bad_input() {
    assert!(commands::parse_edit("Housing").is_err());
    assert!(commands::parse_edit("Rent=900").is_err());
    assert!(commands::parse_edit("Yachts=1").is_err());
}

#[test]
fn test_parse_priority() {
    assert_eq!(commands::parse_priority("high").unwrap(), Priority::High);
    assert_eq!(commands::parse_priority("Low").unwrap(), Priority::Low);
    assert!(commands::parse_priority("urgent").is_err());
}

#[test]
fn test_load_config_mock_flag() {
    let config = commands::load_config(None, Some("http://scoring.test:9000".into()), true).unwrap();
    assert_eq!(config.service.backend, BackendKind::Mock);
    assert_eq!(config.service.base_url, "http://scoring.test:9000");
}

// ========== Input File Tests ==========

#[test]
fn test_read_household_defaults_demographics() {
    let dir = TempDir::new().unwrap();
    let path = write_household(&dir);

    let household = commands::read_household(&path).unwrap();
    assert_eq!(household.net_income, 5000.0);
    assert_eq!(household.housing, 1500.0);
    assert_eq!(household.education, 0.0);
    assert_eq!(household.household_size, vitals_core::HouseholdInput::default().household_size);
}

#[test]
fn test_read_household_errors() {
    let dir = TempDir::new().unwrap();
    assert!(commands::read_household(&dir.path().join("missing.json")).is_err());

    let broke = dir.path().join("broke.json");
    std::fs::write(&broke, r#"{"Net_Income": 0, "Housing": 800}"#).unwrap();
    let err = commands::read_household(&broke).unwrap_err();
    assert!(err.to_string().contains("Net_Income must be positive"));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "not json").unwrap();
    assert!(commands::read_household(&garbage).is_err());
}

#[test]
fn test_save_report_adds_timestamp() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.json");

    commands::save_report(&path, json!({"health_score": 61.5, "prediction": "Stable"})).unwrap();

    let stored = commands::read_report(&path).unwrap();
    assert_eq!(stored["health_score"], 61.5);
    assert!(stored["saved_at"].as_str().is_some());
    // The stamp does not disturb normalization
    assert_eq!(normalize(&stored).health_score, 61.5);
}

// ========== Render Tests ==========

#[test]
fn test_render_pages_from_sparse_report() {
    let report = normalize(&json!({"health_score": 42.0}));

    let overview = render_overview(&report);
    assert!(overview.contains("42.0"));

    let analysis = render_analysis(&report);
    assert!(analysis.contains("No risk factors reported"));

    let actions = render_recommendations(&report);
    assert!(actions.contains("(none)"));
}

#[test]
fn test_render_recommendations() {
    let report = normalize(&json!({
        "health_score": 55.0,
        "recommendations": [
            {"title": "Trim dining out", "priority": "High", "category": "Spending", "message": "Cook twice more a week"}
        ]
    }));

    let out = render_recommendations(&report);
    assert!(out.contains("Trim dining out"));
    assert!(out.contains("Cook twice more a week"));
}

#[tokio::test]
async fn test_chart_capture_dimensions() {
    let report = normalize(&json!({"health_score": 75.0}));

    let overview = ChartCapture.capture(&PageView::report_only(WizardPage::Overview, &report)).await.unwrap();
    assert_eq!(overview.width(), 640);
    // Score row, spacer, four breakdown rows
    assert_eq!(overview.height(), 32 * 6);
    assert_eq!(overview.pixels().len(), 640 * 32 * 6 * 3);

    let analysis = ChartCapture.capture(&PageView::report_only(WizardPage::Analysis, &report)).await.unwrap();
    assert_eq!(analysis.height(), 32 * 7);
}

#[tokio::test]
async fn test_chart_capture_actions_without_recommendations() {
    let report = normalize(&json!({}));
    let image = ChartCapture.capture(&PageView::report_only(WizardPage::Actions, &report)).await.unwrap();
    assert_eq!(image.height(), 32 * 2);
}

#[test]
fn test_render_goal_analysis() {
    let analysis: vitals_core::GoalAnalysis = serde_json::from_value(json!({
        "feasibility": "Not Feasible",
        "required_monthly": 900.0,
        "available_surplus": 250.0,
        "gap": 650.0,
        "distress_impact_pct": 15.0,
        "suggestions": ["Extend the timeline"]
    }))
    .unwrap();

    let out = commands::render_goal_analysis(&analysis);
    assert!(out.contains("Infeasible"));
    assert!(out.contains("+650.00"));
    assert!(out.contains("Extend the timeline"));
}

// ========== Export Command Tests ==========

#[tokio::test]
async fn test_cmd_export_all_pages() {
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");
    commands::save_report(&report_path, json!({"health_score": 68.0})).unwrap();

    commands::cmd_export(&mock_config(), &report_path, dir.path(), "overview", true)
        .await
        .unwrap();

    let pdf = std::fs::read(dir.path().join("financial_health_report.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
    let text = String::from_utf8_lossy(&pdf);
    assert!(text.contains("/Count 3"));
}

#[tokio::test]
async fn test_cmd_export_unknown_page() {
    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("report.json");
    commands::save_report(&report_path, json!({"health_score": 68.0})).unwrap();

    let result = commands::cmd_export(&mock_config(), &report_path, dir.path(), "summary", false).await;
    assert!(result.is_err());
    assert!(!dir.path().join("financial_health_report.pdf").exists());
}

// ========== Session Command Tests ==========

#[tokio::test]
async fn test_session_basic_flow_control() {
    let (_backend, mut session) = mock_session();

    assert_eq!(run(&mut session, "").await.unwrap(), Flow::Continue);
    assert_eq!(run(&mut session, "help").await.unwrap(), Flow::Continue);
    assert_eq!(run(&mut session, "quit").await.unwrap(), Flow::Quit);
    assert!(run(&mut session, "dance").await.is_err());
}

#[tokio::test]
async fn test_session_requires_report() {
    let (_backend, mut session) = mock_session();
    assert!(run(&mut session, "next").await.is_err());
    assert!(run(&mut session, "goals").await.is_err());
    assert!(run(&mut session, "score").await.is_err());
}

#[tokio::test]
async fn test_session_score_and_navigate() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;

    assert_eq!(backend.calls(Operation::Score), 1);
    assert_eq!(session.wizard().unwrap().page(), WizardPage::Overview);

    run(&mut session, "back").await.unwrap();
    assert_eq!(session.wizard().unwrap().page(), WizardPage::Overview);

    run(&mut session, "next").await.unwrap();
    run(&mut session, "next").await.unwrap();
    run(&mut session, "next").await.unwrap();
    assert_eq!(session.wizard().unwrap().page(), WizardPage::Actions);
    assert!(session.wizard().unwrap().simulation().is_some());
}

#[tokio::test]
async fn test_session_set_needs_actions_page() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;

    assert!(run(&mut session, "set Housing 900").await.is_err());
    assert_eq!(backend.calls(Operation::Simulate), 0);
}

#[tokio::test(start_paused = true)]
async fn test_session_simulate() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;
    run(&mut session, "next").await.unwrap();
    run(&mut session, "next").await.unwrap();

    run(&mut session, "set Housing 900").await.unwrap();
    run(&mut session, "set Food 500").await.unwrap();
    assert!(run(&mut session, "set Housing lots").await.is_err());
    run(&mut session, "sim").await.unwrap();

    assert_eq!(backend.calls(Operation::Simulate), 1);
    let snapshot = session.wizard().unwrap().simulation().unwrap().snapshot();
    assert!(snapshot.result.is_some());
    assert_eq!(snapshot.values.housing, 900.0);
    assert_eq!(snapshot.surplus_delta, 700.0);
    assert_eq!(backend.last_input().unwrap().food, 500.0);

    run(&mut session, "reset-sim").await.unwrap();
    let snapshot = session.wizard().unwrap().simulation().unwrap().snapshot();
    assert!(snapshot.result.is_none());
    assert_eq!(snapshot.values.housing, 1500.0);
}

#[tokio::test(start_paused = true)]
async fn test_session_simulation_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;
    run(&mut session, "next").await.unwrap();
    run(&mut session, "next").await.unwrap();

    backend.push_failure(Operation::Simulate, Duration::ZERO, "model offline");
    run(&mut session, "set Transport 100").await.unwrap();
    run(&mut session, "sim").await.unwrap();

    let snapshot = session.wizard().unwrap().simulation().unwrap().snapshot();
    assert!(snapshot.result.is_none());
    assert_eq!(snapshot.last_error.as_deref(), Some("model offline"));
    let rendered = render_snapshot(&snapshot);
    assert!(rendered.contains("model offline"));
}

#[tokio::test]
async fn test_session_goals() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;

    run(&mut session, "goal Car 6000 24 high").await.unwrap();
    assert_eq!(backend.calls(Operation::AnalyzeGoal), 1);
    assert!(session.wizard().unwrap().goals().pending().is_some());

    run(&mut session, "add-goal").await.unwrap();
    run(&mut session, "goal Trip 1200 12").await.unwrap();
    run(&mut session, "add-goal").await.unwrap();
    let goals = session.wizard().unwrap().goals().goals();
    assert_eq!(goals.len(), 2);
    assert_eq!(goals[0].goal().priority, Priority::High);
    assert_eq!(goals[1].goal().priority, Priority::Medium);

    run(&mut session, "remove-goal 1").await.unwrap();
    let goals = session.wizard().unwrap().goals().goals();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].goal().goal_name, "Trip");

    // Out of range and zero are ignored
    run(&mut session, "remove-goal 0").await.unwrap();
    run(&mut session, "remove-goal 7").await.unwrap();
    assert_eq!(session.wizard().unwrap().goals().goals().len(), 1);
    assert!(run(&mut session, "remove-goal one").await.is_err());
}

#[tokio::test]
async fn test_session_invalid_goal_skips_service() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;

    run(&mut session, "goal Car 0 24").await.unwrap();
    run(&mut session, "goal Car 6000 0").await.unwrap();
    assert_eq!(backend.calls(Operation::AnalyzeGoal), 0);
    assert!(session.wizard().unwrap().goals().error().is_some());
    assert!(run(&mut session, "goal Car").await.is_err());
}

#[tokio::test]
async fn test_session_export_and_reset() {
    let dir = TempDir::new().unwrap();
    let (_backend, mut session) = scored_session(&dir).await;
    let out = dir.path().join("exports");
    std::fs::create_dir(&out).unwrap();

    run(&mut session, &format!("export {}", out.display())).await.unwrap();
    assert!(out.join("financial_health_report.pdf").exists());

    run(&mut session, "reset").await.unwrap();
    assert!(session.wizard().is_none());
    assert_eq!(session.mode(), vitals_core::AppMode::Dashboard);

    run(&mut session, "home").await.unwrap();
    assert_eq!(session.mode(), vitals_core::AppMode::Landing);
}

#[tokio::test]
async fn test_session_failed_score_keeps_previous_report() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;
    let first_score = session.wizard().unwrap().report().health_score;

    backend.push_failure(Operation::Score, Duration::ZERO, "Household_Size must be positive");
    let path = write_household(&dir);
    run(&mut session, &format!("score {}", path.display())).await.unwrap();

    assert_eq!(session.warning(), Some("Household_Size must be positive"));
    assert_eq!(session.wizard().unwrap().report().health_score, first_score);
}

#[tokio::test]
async fn test_session_resume_saved_report() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = mock_session();
    let report_path = dir.path().join("report.json");
    commands::save_report(
        &report_path,
        json!({
            "health_score": 48.0,
            "financial_metrics": {"total_expenditure": 3200.0, "savings": 800.0, "housing_burden_pct": 35.0}
        }),
    )
    .unwrap();

    run(&mut session, &format!("resume {}", report_path.display())).await.unwrap();

    assert_eq!(backend.calls(Operation::Score), 0);
    let wizard = session.wizard().unwrap();
    assert_eq!(wizard.report().health_score, 48.0);
    assert!(wizard.household().net_income > 0.0);
    assert!(run(&mut session, &format!("resume {}", Path::new("/nonexistent/r.json").display()))
        .await
        .is_err());
}

#[tokio::test(start_paused = true)]
async fn test_session_sim_before_any_edit() {
    let dir = TempDir::new().unwrap();
    let (backend, mut session) = scored_session(&dir).await;
    run(&mut session, "next").await.unwrap();
    run(&mut session, "next").await.unwrap();

    let started = tokio::time::Instant::now();
    run(&mut session, "sim").await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(1));
    assert_eq!(backend.calls(Operation::Simulate), 0);

    let snapshot = session.wizard().unwrap().simulation().unwrap().snapshot();
    assert!(snapshot.result.is_none());
    assert_eq!(snapshot.surplus_delta, 0.0);
    assert!(render_snapshot(&snapshot).contains("No simulated score yet"));
}

#[tokio::test(start_paused = true)]
async fn test_actions_export_shows_simulation_and_goals() {
    let dir = TempDir::new().unwrap();
    let (_backend, mut session) = scored_session(&dir).await;
    run(&mut session, "next").await.unwrap();
    run(&mut session, "next").await.unwrap();

    let before = ChartCapture
        .capture(&session.wizard().unwrap().current_view())
        .await
        .unwrap();
    let first = dir.path().join("first");
    run(&mut session, &format!("export {}", first.display())).await.unwrap();

    run(&mut session, "set Housing 200").await.unwrap();
    run(&mut session, "sim").await.unwrap();
    run(&mut session, "goal Car 6000 24").await.unwrap();
    run(&mut session, "add-goal").await.unwrap();

    let after = ChartCapture
        .capture(&session.wizard().unwrap().current_view())
        .await
        .unwrap();
    // Simulated score, four deltas and one goal row
    assert_eq!(after.height(), before.height() + 32 * 6);

    let second = dir.path().join("second");
    run(&mut session, &format!("export {}", second.display())).await.unwrap();
    let body = |path: PathBuf| {
        let pdf = std::fs::read(path.join("financial_health_report.pdf")).unwrap();
        let start = pdf.windows(8).position(|w| w == b"4 0 obj\n").unwrap();
        pdf[start..].to_vec()
    };
    assert_ne!(body(first), body(second));
}

