//! Baseline vs. simulated differences

use crate::models::{BreakdownAxis, HealthBreakdown, HouseholdInput, SimulationResult};

/// Score change that counts as a real move rather than noise
const TRAJECTORY_THRESHOLD: f64 = 5.0;

/// Per-axis breakdown change (simulated minus baseline)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentDeltas {
    pub income_stability: f64,
    pub expense_control: f64,
    pub debt_pressure: f64,
    pub savings_discipline: f64,
}

impl ComponentDeltas {
    pub fn get(&self, axis: BreakdownAxis) -> f64 {
        match axis {
            BreakdownAxis::IncomeStability => self.income_stability,
            BreakdownAxis::ExpenseControl => self.expense_control,
            BreakdownAxis::DebtPressure => self.debt_pressure,
            BreakdownAxis::SavingsDiscipline => self.savings_discipline,
        }
    }

    pub fn is_zero(&self) -> bool {
        BreakdownAxis::ALL.iter().all(|axis| self.get(*axis) == 0.0)
    }
}

/// Direction of the simulated score relative to the baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trajectory {
    Improving,
    Stable,
    Worsening,
}

impl Trajectory {
    pub fn from_delta(delta: f64) -> Self {
        if delta > TRAJECTORY_THRESHOLD {
            Self::Improving
        } else if delta < -TRAJECTORY_THRESHOLD {
            Self::Worsening
        } else {
            Self::Stable
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improving => "Improving",
            Self::Stable => "Stable",
            Self::Worsening => "Worsening",
        }
    }
}

pub fn score_delta(sim: &SimulationResult, baseline_score: f64) -> f64 {
    sim.health_score - baseline_score
}

pub fn component_deltas(sim: &HealthBreakdown, baseline: &HealthBreakdown) -> ComponentDeltas {
    ComponentDeltas {
        income_stability: sim.income_stability - baseline.income_stability,
        expense_control: sim.expense_control - baseline.expense_control,
        debt_pressure: sim.debt_pressure - baseline.debt_pressure,
        savings_discipline: sim.savings_discipline - baseline.savings_discipline,
    }
}

pub fn surplus_delta(sim: &HouseholdInput, baseline: &HouseholdInput) -> f64 {
    sim.monthly_surplus() - baseline.monthly_surplus()
}
