//! Mock backend for testing
//!
//! Without a script, every operation answers immediately from simple budget
//! heuristics, which is enough to drive the CLI without a running service.
//! Tests can queue scripted replies per operation (with a delay and an
//! outcome) and inspect how many calls were made.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::models::{Feasibility, Goal, GoalAnalysis, HouseholdInput};

use super::ScoringBackend;

/// The remote operations a call can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Score,
    Simulate,
    AnalyzeGoal,
}

/// One queued reply
#[derive(Debug, Clone)]
struct Scripted {
    delay: Duration,
    reply: std::result::Result<Value, String>,
}

#[derive(Default)]
struct MockState {
    scripts: HashMap<Operation, VecDeque<Scripted>>,
    calls: HashMap<Operation, usize>,
    last_input: Option<HouseholdInput>,
}

/// Mock scoring backend
///
/// Clones share state, so a test can keep a handle while a controller owns
/// another.
#[derive(Clone)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    healthy: Arc<AtomicBool>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            healthy: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        let backend = Self::new();
        backend.healthy.store(false, Ordering::SeqCst);
        backend
    }

    /// Queue a successful reply for the next unscripted call to `op`
    pub fn push_reply(&self, op: Operation, delay: Duration, body: Value) {
        self.push(op, Scripted { delay, reply: Ok(body) });
    }

    /// Queue a failure for the next unscripted call to `op`
    pub fn push_failure(&self, op: Operation, delay: Duration, message: &str) {
        self.push(
            op,
            Scripted {
                delay,
                reply: Err(message.to_string()),
            },
        );
    }

    /// Number of calls made to `op` so far
    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Household sent with the most recent call
    pub fn last_input(&self) -> Option<HouseholdInput> {
        self.lock().last_input.clone()
    }

    fn push(&self, op: Operation, scripted: Scripted) {
        self.lock().scripts.entry(op).or_default().push_back(scripted);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record the call and take its scripted reply, if any
    fn begin(&self, op: Operation, household: &HouseholdInput) -> Option<Scripted> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        state.last_input = Some(household.clone());
        state.scripts.get_mut(&op).and_then(VecDeque::pop_front)
    }

    async fn run(&self, op: Operation, household: &HouseholdInput) -> Result<Option<Value>> {
        let Some(scripted) = self.begin(op, household) else {
            return Ok(None);
        };
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted
            .reply
            .map(Some)
            .map_err(|message| Error::Remote { status: 500, message })
    }
}

#[async_trait]
impl ScoringBackend for MockBackend {
    async fn score(&self, household: &HouseholdInput) -> Result<Value> {
        Ok(self
            .run(Operation::Score, household)
            .await?
            .unwrap_or_else(|| heuristic_report(household)))
    }

    async fn simulate(&self, household: &HouseholdInput) -> Result<Value> {
        Ok(self
            .run(Operation::Simulate, household)
            .await?
            .unwrap_or_else(|| heuristic_report(household)))
    }

    async fn analyze_goal(&self, household: &HouseholdInput, goal: &Goal) -> Result<GoalAnalysis> {
        match self.run(Operation::AnalyzeGoal, household).await? {
            Some(body) => Ok(serde_json::from_value(body)?),
            None => Ok(heuristic_goal_analysis(household, goal)),
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    fn host(&self) -> &str {
        "mock"
    }
}

fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        (value.clamp(0.0, 100.0) * 10.0).round() / 10.0
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Heuristic report in the scoring service's response shape
pub(crate) fn heuristic_report(household: &HouseholdInput) -> Value {
    let income = household.net_income.max(0.0);
    let expenses = household.total_expenses();
    let safe_income = if income > 0.0 { income } else { 1.0 };

    let expense_ratio = expenses / safe_income;
    let housing_ratio = household.housing / safe_income;
    let savings = income - expenses;
    let savings_rate = savings / safe_income;
    let essential = household.food
        + household.housing
        + household.transport
        + household.health
        + household.education
        + household.communication;
    let discretionary = expenses - essential;

    let income_stability = clamp_score(income / 50.0);
    let expense_control = clamp_score(100.0 - expense_ratio * 80.0);
    let debt_pressure = clamp_score(100.0 - housing_ratio * 200.0);
    let savings_discipline = clamp_score(savings_rate * 250.0);
    let health_score = clamp_score(
        (income_stability + expense_control + debt_pressure + savings_discipline) / 4.0,
    );

    let status = if health_score >= 70.0 {
        "Healthy"
    } else if health_score >= 40.0 {
        "At Risk"
    } else {
        "Distressed"
    };

    let target_savings = 0.2 * income;
    let monthly_savings_needed = (target_savings - savings).max(0.0);
    let recovery_timeline_months = if monthly_savings_needed > 0.0 { 12 } else { 0 };

    let mut recommendations = Vec::new();
    if housing_ratio > 0.35 {
        recommendations.push(json!({
            "category": "Housing",
            "priority": "High",
            "title": "Reduce housing costs",
            "message": format!("Housing is {:.1}% of income (recommended: <35%)", housing_ratio * 100.0),
            "action": "Consider downsizing or refinancing"
        }));
    }
    if savings_rate < 0.1 {
        recommendations.push(json!({
            "category": "Savings",
            "priority": "Medium",
            "recommendation": "Build a buffer: automate a transfer of 10% of income"
        }));
    }
    recommendations.push(json!("Review subscriptions every quarter"));

    json!({
        "prediction": status,
        "confidence": 0.75,
        "health_score": health_score,
        "executive_summary": {
            "status": status,
            "primary_cause": if housing_ratio > 0.35 { "Housing burden" } else { "Spending mix" },
            "urgent_action": if savings < 0.0 { "Cut expenses below income" } else { "Keep saving" },
            "recovery_horizon": format!("{} months", recovery_timeline_months)
        },
        "risk_factors": [{
            "factor": "Expense ratio",
            "value": round2(expense_ratio),
            "threshold": "<80%",
            "explanation": format!("Expenses are {:.0}% of income", expense_ratio * 100.0),
            "contribution_score": round2(expense_ratio.clamp(0.0, 1.0))
        }],
        "financial_metrics": {
            "total_expenditure": round2(expenses),
            "savings": round2(savings),
            "savings_rate_pct": round2(savings_rate * 100.0),
            "expenditure_to_income_pct": round2(expense_ratio * 100.0),
            "housing_burden_pct": round2(housing_ratio * 100.0),
            "essential_spending_pct": round2(essential / safe_income * 100.0),
            "discretionary_spending_pct": round2(discretionary / safe_income * 100.0)
        },
        "recommendations": recommendations,
        "recovery_timeline_months": recovery_timeline_months,
        "monthly_savings_needed": round2(monthly_savings_needed),
        "health_breakdown": {
            "income_stability": income_stability,
            "expense_control": expense_control,
            "debt_pressure": debt_pressure,
            "savings_discipline": savings_discipline
        }
    })
}

/// Goal feasibility using safe-saving-capacity rules
///
/// Safe capacity keeps a 10% emergency buffer and caps housing plus saving at
/// 60% of income.
pub(crate) fn heuristic_goal_analysis(household: &HouseholdInput, goal: &Goal) -> GoalAnalysis {
    let income = household.net_income;
    let expenses = household.total_expenses();
    let debt = household.housing;
    let months = f64::from(goal.duration_months.max(1));

    let raw_surplus = income - (expenses + debt);
    let emergency = 0.10 * income;
    let safe = (raw_surplus - emergency).min(0.60 * income - debt).max(0.0);
    let required = goal.goal_amount / months;
    let gap = required - safe;

    let ratio_now = if income > 0.0 { raw_surplus / income } else { 0.0 };
    let ratio_with_goal = if income > 0.0 {
        (raw_surplus - required) / income
    } else {
        0.0
    };
    let distress_impact = if ratio_with_goal < 0.20 {
        15.0
    } else if ratio_with_goal < ratio_now {
        (ratio_now - ratio_with_goal).abs() * 50.0
    } else {
        0.0
    };

    let healthy_months = if safe > 0.0 {
        Some((goal.goal_amount / safe) as u64)
    } else {
        None
    };

    let (feasibility, suggestions) = if required <= safe {
        (
            Feasibility::Achievable,
            vec![
                format!("Goal is financially healthy. Save ${:.0}/month safely.", required),
                format!("Your safe saving capacity is ${:.0}/month.", safe),
                format!("This maintains an emergency buffer of ${:.0}/month.", emergency),
                "Consider automating savings for consistency.".to_string(),
            ],
        )
    } else if required <= raw_surplus {
        (
            Feasibility::Tight,
            vec![
                "Goal achievable but increases financial risk.".to_string(),
                format!("Safe saving: ${:.0}/month. Required: ${:.0}/month.", safe, required),
                match healthy_months {
                    Some(m) => format!(
                        "Healthier timeline: {} months (vs requested {}).",
                        m, goal.duration_months
                    ),
                    None => "Build saving capacity before committing to a timeline.".to_string(),
                },
                format!("Alternative: Reduce expenses by ${:.0}/month.", gap),
            ],
        )
    } else if safe <= 0.0 {
        (
            Feasibility::Infeasible,
            vec![
                "Current financial structure has no saving capacity.".to_string(),
                format!("You need ${:.0}/month just to cover expenses.", raw_surplus.abs()),
                "Priority: Reduce expenses or increase income first.".to_string(),
            ],
        )
    } else {
        (
            Feasibility::Infeasible,
            vec![
                format!("Required ${:.0}/month exceeds safe capacity.", required),
                format!("Maximum safe saving: ${:.0}/month.", safe),
                format!(
                    "Or reduce goal amount to ${:.0} for {} months.",
                    safe * months,
                    goal.duration_months
                ),
            ],
        )
    };

    GoalAnalysis {
        feasibility,
        required_monthly: round2(required),
        available_surplus: round2(safe),
        gap: round2(gap),
        distress_impact_pct: round2(distress_impact),
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Priority;
    use crate::normalize::normalize;

    fn household(income: f64, housing: f64, food: f64) -> HouseholdInput {
        HouseholdInput {
            net_income: income,
            housing,
            food,
            ..HouseholdInput::default()
        }
    }

    fn goal(amount: f64, months: u32) -> Goal {
        Goal {
            goal_name: "Test".into(),
            goal_amount: amount,
            duration_months: months,
            priority: Priority::Medium,
        }
    }

    #[tokio::test]
    async fn test_mock_heuristic_score_is_normalizable() {
        let backend = MockBackend::new();
        let raw = backend.score(&household(4000.0, 1200.0, 600.0)).await.unwrap();
        let report = normalize(&raw);
        assert!(report.health_score > 0.0 && report.health_score <= 100.0);
        assert_eq!(report.financial_metrics.total_expenditure, 1800.0);
        assert_eq!(report.financial_metrics.housing_burden_pct, 30.0);
        assert!(!report.recommendations.is_empty());
        assert_eq!(backend.calls(Operation::Score), 1);
    }

    #[tokio::test]
    async fn test_mock_heuristic_rewards_lower_spending() {
        let backend = MockBackend::new();
        let tight = normalize(&backend.simulate(&household(3000.0, 1500.0, 900.0)).await.unwrap());
        let roomy = normalize(&backend.simulate(&household(3000.0, 900.0, 500.0)).await.unwrap());
        assert!(roomy.health_score > tight.health_score);
    }

    #[tokio::test]
    async fn test_mock_scripted_replies_in_order() {
        let backend = MockBackend::new();
        backend.push_reply(Operation::Simulate, Duration::ZERO, json!({"health_score": 11}));
        backend.push_failure(Operation::Simulate, Duration::ZERO, "boom");

        let input = household(1000.0, 0.0, 0.0);
        let first = backend.simulate(&input).await.unwrap();
        assert_eq!(first["health_score"], 11);

        let err = backend.simulate(&input).await.unwrap_err();
        assert!(err.is_remote());
        assert_eq!(err.user_message(), "boom");

        // Script exhausted: falls back to heuristics
        assert!(backend.simulate(&input).await.is_ok());
        assert_eq!(backend.calls(Operation::Simulate), 3);
        assert_eq!(backend.last_input(), Some(input));
    }

    #[tokio::test]
    async fn test_mock_health() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }

    #[test]
    fn test_goal_analysis_achievable() {
        let analysis = heuristic_goal_analysis(&household(4000.0, 1200.0, 800.0), &goal(1200.0, 12));
        assert_eq!(analysis.feasibility, Feasibility::Achievable);
        assert_eq!(analysis.required_monthly, 100.0);
        assert_eq!(analysis.gap, analysis.required_monthly - analysis.available_surplus);
    }

    #[test]
    fn test_goal_analysis_tight() {
        // raw surplus 800, safe capacity 400
        let analysis = heuristic_goal_analysis(&household(4000.0, 1200.0, 800.0), &goal(6000.0, 10));
        assert_eq!(analysis.feasibility, Feasibility::Tight);
        assert_eq!(analysis.required_monthly, 600.0);
        assert_eq!(analysis.available_surplus, 400.0);
        assert_eq!(analysis.gap, 200.0);
    }

    #[test]
    fn test_goal_analysis_infeasible_without_capacity() {
        let analysis = heuristic_goal_analysis(&household(2000.0, 1200.0, 800.0), &goal(500.0, 5));
        assert_eq!(analysis.feasibility, Feasibility::Infeasible);
        assert_eq!(analysis.available_surplus, 0.0);
        assert_eq!(analysis.distress_impact_pct, 15.0);
    }
}
