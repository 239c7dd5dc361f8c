//! Scoring response normalization
//!
//! The scoring service's output is untrusted: any field may be missing, null,
//! or of the wrong type. Everything downstream works on `NormalizedReport`,
//! where each field has a documented default, so default-guessing lives here
//! and nowhere else.
//!
//! Rules:
//! - Numbers may arrive as JSON numbers or numeric strings; NaN/infinite
//!   values and anything else fall back to the default.
//! - Ranged values are clamped: scores 0-100, contributions 0-1, timelines and
//!   savings needed at least 0.
//! - Text fields fall back to fixed placeholders, sequences to empty.

use serde_json::Value;

use crate::models::{
    BreakdownAxis, ExecutiveSummary, FinancialMetrics, HealthBreakdown, HouseholdInput,
    NormalizedReport, Priority, Recommendation, RiskFactor, SimulationResult,
};

/// Share of total expenditure assumed to be food when rebuilding a budget
const FOOD_SHARE: f64 = 0.3;

/// Normalize a raw scoring response. Never fails.
pub fn normalize(raw: &Value) -> NormalizedReport {
    let defaults = ExecutiveSummary::default();
    let summary = raw.get("executive_summary");

    NormalizedReport {
        health_score: score(raw.get("health_score")),
        prediction: text(raw.get("prediction")).unwrap_or_else(|| "Unknown".to_string()),
        confidence: number(raw.get("confidence")).unwrap_or(0.0).clamp(0.0, 1.0),
        probabilities: probabilities(raw.get("probabilities")),
        executive_summary: ExecutiveSummary {
            status: field_text(summary, "status").unwrap_or(defaults.status),
            primary_cause: field_text(summary, "primary_cause").unwrap_or(defaults.primary_cause),
            urgent_action: field_text(summary, "urgent_action").unwrap_or(defaults.urgent_action),
            recovery_horizon: field_text(summary, "recovery_horizon")
                .unwrap_or(defaults.recovery_horizon),
        },
        risk_factors: array(raw.get("risk_factors"))
            .filter_map(risk_factor)
            .collect(),
        risk_explanation_text: array(raw.get("risk_explanation_text"))
            .filter_map(|v| text(Some(v)))
            .collect(),
        financial_metrics: financial_metrics(raw.get("financial_metrics")),
        recommendations: array(raw.get("recommendations"))
            .filter_map(recommendation)
            .collect(),
        recovery_timeline_months: number(raw.get("recovery_timeline_months"))
            .map(|n| n.max(0.0).round() as u32)
            .unwrap_or(0),
        monthly_savings_needed: number(raw.get("monthly_savings_needed"))
            .unwrap_or(0.0)
            .max(0.0),
        health_breakdown: breakdown(raw.get("health_breakdown")),
    }
}

/// Normalize the Simulate subset (health score and breakdown)
pub fn normalize_simulation(raw: &Value, sequence: u64) -> SimulationResult {
    SimulationResult {
        sequence,
        health_score: score(raw.get("health_score")),
        health_breakdown: breakdown(raw.get("health_breakdown")),
    }
}

/// Rebuild an approximate monthly budget from a report's metrics
///
/// Used when the original line items are unknown (e.g. resuming from a saved
/// report). This is a heuristic: food is assumed to be 30% of expenditure and
/// categories the metrics say nothing about are zero. It does not round-trip
/// the true input.
pub fn derive_household_input(report: &NormalizedReport) -> HouseholdInput {
    let metrics = &report.financial_metrics;

    let total = non_zero_or_one(metrics.total_expenditure);
    // Negative shares are treated like missing ones
    let ratio = positive_or_one(metrics.expenditure_to_income_pct / 100.0);
    let housing_share = metrics.housing_burden_pct.max(0.0) / 100.0;
    let discretionary_share = metrics.discretionary_spending_pct.max(0.0) / 100.0;

    HouseholdInput {
        net_income: finite_or_zero(total / ratio),
        housing: finite_or_zero(total * housing_share / ratio),
        food: finite_or_zero(total * FOOD_SHARE),
        recreation: finite_or_zero(total * discretionary_share),
        ..HouseholdInput::default()
    }
}

fn non_zero_or_one(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        1.0
    } else {
        value
    }
}

fn positive_or_one(value: f64) -> f64 {
    if value > 0.0 && value.is_finite() {
        value
    } else {
        1.0
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn score(value: Option<&Value>) -> f64 {
    number(value).unwrap_or(0.0).clamp(0.0, 100.0)
}

fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn field_text(object: Option<&Value>, key: &str) -> Option<String> {
    text(object.and_then(|o| o.get(key)))
}

fn array(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter())
        .into_iter()
        .flatten()
}

fn probabilities(value: Option<&Value>) -> Vec<(String, f64)> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(label, p)| number(Some(p)).map(|p| (label.clone(), p.clamp(0.0, 1.0))))
                .collect()
        })
        .unwrap_or_default()
}

fn risk_factor(value: &Value) -> Option<RiskFactor> {
    value.as_object()?;
    Some(RiskFactor {
        factor: field_text(Some(value), "factor").unwrap_or_else(|| "Unknown factor".to_string()),
        value: number(value.get("value")).unwrap_or(0.0),
        threshold: field_text(Some(value), "threshold").unwrap_or_default(),
        explanation: field_text(Some(value), "explanation").unwrap_or_default(),
        contribution_score: number(value.get("contribution_score"))
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
    })
}

fn financial_metrics(value: Option<&Value>) -> FinancialMetrics {
    let get = |key: &str| number(value.and_then(|v| v.get(key))).unwrap_or(0.0);
    FinancialMetrics {
        total_expenditure: get("total_expenditure"),
        savings: get("savings"),
        savings_rate_pct: get("savings_rate_pct"),
        expenditure_to_income_pct: get("expenditure_to_income_pct"),
        housing_burden_pct: get("housing_burden_pct"),
        essential_spending_pct: get("essential_spending_pct"),
        discretionary_spending_pct: get("discretionary_spending_pct"),
    }
}

fn breakdown(value: Option<&Value>) -> HealthBreakdown {
    let mut breakdown = HealthBreakdown::default();
    for axis in BreakdownAxis::ALL {
        breakdown.set(axis, score(value.and_then(|v| v.get(axis.as_str()))));
    }
    breakdown
}

/// Recommendations arrive as bare strings or as objects with any of
/// title/message/action/recommendation/priority/category.
fn recommendation(value: &Value) -> Option<Recommendation> {
    if let Some(s) = value.as_str() {
        if s.trim().is_empty() {
            return None;
        }
        return Some(Recommendation {
            title: s.to_string(),
            details: String::new(),
            priority: Priority::Low,
            category: "General".to_string(),
        });
    }

    value.as_object()?;
    let get = |key: &str| field_text(Some(value), key);
    let title = get("title");
    let message = get("message");
    let action = get("action");
    let combined = get("recommendation");

    let title = title
        .or_else(|| {
            combined
                .as_deref()
                .map(|r| r.split(':').next().unwrap_or(r).trim().to_string())
        })
        .or_else(|| message.clone())
        .unwrap_or_else(|| "Recommendation".to_string());

    let details = match (&message, &action) {
        (Some(m), Some(a)) => format!("{}. {}", m, a),
        (Some(m), None) => m.clone(),
        (None, Some(a)) => a.clone(),
        (None, None) => combined
            .as_deref()
            .map(|r| {
                let mut parts = r.split(':');
                let head = parts.next().unwrap_or(r);
                parts.next().unwrap_or(head).trim().to_string()
            })
            .unwrap_or_default(),
    };

    Some(Recommendation {
        title,
        details,
        priority: get("priority")
            .and_then(|p| p.parse().ok())
            .unwrap_or(Priority::Low),
        category: get("category").unwrap_or_else(|| "General".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_all_finite(report: &NormalizedReport) {
        let m = &report.financial_metrics;
        let mut values = vec![
            report.health_score,
            report.confidence,
            report.monthly_savings_needed,
            m.total_expenditure,
            m.savings,
            m.savings_rate_pct,
            m.expenditure_to_income_pct,
            m.housing_burden_pct,
            m.essential_spending_pct,
            m.discretionary_spending_pct,
        ];
        values.extend(BreakdownAxis::ALL.iter().map(|a| report.health_breakdown.get(*a)));
        values.extend(report.risk_factors.iter().map(|r| r.contribution_score));
        assert!(values.iter().all(|v| v.is_finite()), "non-finite in {:?}", report);
    }

    #[test]
    fn test_normalize_empty_object_uses_defaults() {
        let report = normalize(&json!({}));
        assert_eq!(report.health_score, 0.0);
        assert_eq!(report.executive_summary, ExecutiveSummary::default());
        assert_eq!(report.executive_summary.status, "Unknown");
        assert_eq!(report.executive_summary.recovery_horizon, "N/A");
        assert!(report.risk_factors.is_empty());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.recovery_timeline_months, 0);
        assert_eq!(report.health_breakdown, HealthBreakdown::default());
        assert_all_finite(&report);
    }

    #[test]
    fn test_normalize_non_object_inputs() {
        for raw in [json!(null), json!(42), json!("oops"), json!([1, 2, 3])] {
            let report = normalize(&raw);
            assert_eq!(report.health_score, 0.0);
            assert_eq!(report.financial_metrics, FinancialMetrics::default());
            assert_all_finite(&report);
        }
    }

    #[test]
    fn test_normalize_wrong_types_fall_back() {
        let raw = json!({
            "health_score": "not a number",
            "executive_summary": "bad",
            "risk_factors": {"factor": "x"},
            "financial_metrics": {"total_expenditure": null, "savings": "120.5"},
            "recommendations": 7,
            "recovery_timeline_months": -4,
            "monthly_savings_needed": -10,
            "health_breakdown": {"income_stability": [1], "expense_control": 140}
        });
        let report = normalize(&raw);
        assert_eq!(report.health_score, 0.0);
        assert_eq!(report.executive_summary.primary_cause, "Unable to determine");
        assert!(report.risk_factors.is_empty());
        assert_eq!(report.financial_metrics.total_expenditure, 0.0);
        assert_eq!(report.financial_metrics.savings, 120.5);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.recovery_timeline_months, 0);
        assert_eq!(report.monthly_savings_needed, 0.0);
        assert_eq!(report.health_breakdown.income_stability, 0.0);
        assert_eq!(report.health_breakdown.expense_control, 100.0);
        assert_all_finite(&report);
    }

    #[test]
    fn test_normalize_partial_summary_keeps_present_fields() {
        let raw = json!({"executive_summary": {"status": "At Risk", "urgent_action": ""}});
        let report = normalize(&raw);
        assert_eq!(report.executive_summary.status, "At Risk");
        assert_eq!(report.executive_summary.urgent_action, "Retry analysis");
        assert_eq!(report.executive_summary.primary_cause, "Unable to determine");
    }

    #[test]
    fn test_normalize_full_response() {
        let raw = json!({
            "prediction": "Medium Risk",
            "confidence": 0.81,
            "probabilities": {"Low Risk": 0.1, "Medium Risk": 0.81, "High Risk": 0.09},
            "health_score": 64.2,
            "executive_summary": {
                "status": "Moderate",
                "primary_cause": "Housing burden",
                "urgent_action": "Cut housing costs",
                "recovery_horizon": "6 months"
            },
            "risk_factors": [
                {"factor": "Housing", "value": 0.42, "threshold": "<35%",
                 "explanation": "Too high", "contribution_score": 1.7},
                "junk"
            ],
            "risk_explanation_text": ["Housing is high", 3, null],
            "financial_metrics": {"total_expenditure": 3000, "expenditure_to_income_pct": 75},
            "recovery_timeline_months": 6.4,
            "monthly_savings_needed": 250,
            "health_breakdown": {"income_stability": 70, "expense_control": 55,
                                 "debt_pressure": 40, "savings_discipline": 35}
        });
        let report = normalize(&raw);
        assert_eq!(report.prediction, "Medium Risk");
        assert_eq!(report.probabilities.len(), 3);
        assert_eq!(report.health_score, 64.2);
        assert_eq!(report.risk_factors.len(), 1);
        assert_eq!(report.risk_factors[0].contribution_score, 1.0);
        assert_eq!(report.risk_explanation_text, vec!["Housing is high", "3"]);
        assert_eq!(report.recovery_timeline_months, 6);
        assert_eq!(report.health_breakdown.debt_pressure, 40.0);
        assert_all_finite(&report);
    }

    #[test]
    fn test_recommendation_shapes() {
        let raw = json!({"recommendations": [
            "Track spending weekly",
            {"title": "Cut dining", "message": "Dining is 12% of income", "action": "Cook at home",
             "priority": "High", "category": "Lifestyle"},
            {"recommendation": "Refinance: shop for a lower rate"},
            {"message": "Build a buffer"},
            {"action": "Automate savings", "priority": "medium"},
            {},
            null
        ]});
        let recs = normalize(&raw).recommendations;
        assert_eq!(recs.len(), 6);

        assert_eq!(recs[0].title, "Track spending weekly");
        assert_eq!(recs[0].details, "");
        assert_eq!(recs[0].priority, Priority::Low);

        assert_eq!(recs[1].title, "Cut dining");
        assert_eq!(recs[1].details, "Dining is 12% of income. Cook at home");
        assert_eq!(recs[1].priority, Priority::High);
        assert_eq!(recs[1].category, "Lifestyle");

        assert_eq!(recs[2].title, "Refinance");
        assert_eq!(recs[2].details, "shop for a lower rate");

        assert_eq!(recs[3].title, "Build a buffer");
        assert_eq!(recs[3].details, "Build a buffer");

        assert_eq!(recs[4].title, "Recommendation");
        assert_eq!(recs[4].details, "Automate savings");
        assert_eq!(recs[4].priority, Priority::Medium);

        assert_eq!(recs[5].title, "Recommendation");
        assert_eq!(recs[5].category, "General");
    }

    #[test]
    fn test_derive_household_input_from_metrics() {
        let raw = json!({
            "health_score": 72,
            "financial_metrics": {
                "total_expenditure": 3000,
                "expenditure_to_income_pct": 75,
                "housing_burden_pct": 30
            }
        });
        let report = normalize(&raw);
        assert_eq!(report.health_score, 72.0);

        let input = derive_household_input(&report);
        assert!((input.net_income - 4000.0).abs() < 1e-9);
        assert!((input.housing - 1200.0).abs() < 1e-9);
        assert!((input.food - 900.0).abs() < 1e-9);
        assert_eq!(input.recreation, 0.0);
        assert_eq!(input.transport, 0.0);
        assert_eq!(input.miscellaneous, 0.0);
    }

    #[test]
    fn test_derive_household_input_zero_ratio_guarded() {
        let raw = json!({
            "financial_metrics": {
                "total_expenditure": 2000,
                "expenditure_to_income_pct": 0,
                "discretionary_spending_pct": 10
            }
        });
        let input = derive_household_input(&normalize(&raw));
        assert_eq!(input.net_income, 2000.0);
        assert_eq!(input.housing, 0.0);
        assert!((input.recreation - 200.0).abs() < 1e-9);
        assert!(input.net_income > 0.0);
    }

    #[test]
    fn test_derive_household_input_negative_shares_guarded() {
        let raw = json!({
            "financial_metrics": {
                "total_expenditure": 2500,
                "expenditure_to_income_pct": -40,
                "housing_burden_pct": -25,
                "discretionary_spending_pct": -5
            }
        });
        let input = derive_household_input(&normalize(&raw));
        assert_eq!(input.net_income, 2500.0);
        assert_eq!(input.housing, 0.0);
        assert_eq!(input.recreation, 0.0);
    }

    #[test]
    fn test_derive_household_input_empty_report() {
        let input = derive_household_input(&normalize(&json!({})));
        assert!(input.net_income.is_finite());
        assert!(input.net_income > 0.0);
        assert!(input.total_expenses().is_finite());
    }

    #[test]
    fn test_normalize_simulation_subset() {
        let result = normalize_simulation(
            &json!({"health_score": 80.5, "health_breakdown": {"expense_control": 66}}),
            9,
        );
        assert_eq!(result.sequence, 9);
        assert_eq!(result.health_score, 80.5);
        assert_eq!(result.health_breakdown.expense_control, 66.0);
        assert_eq!(result.health_breakdown.income_stability, 0.0);
    }
}
