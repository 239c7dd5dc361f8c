//! Domain models for Vitals

use serde::{Deserialize, Serialize};

/// A single editable budget line (income or one of the ten expense categories)
///
/// The string form matches the scoring service's field names exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BudgetField {
    NetIncome,
    Food,
    Housing,
    Transport,
    Health,
    Education,
    Recreation,
    Clothing,
    Communication,
    Restaurants,
    Miscellaneous,
}

impl BudgetField {
    /// The ten expense categories, in the service's order
    pub const EXPENSES: [BudgetField; 10] = [
        Self::Food,
        Self::Housing,
        Self::Transport,
        Self::Health,
        Self::Education,
        Self::Recreation,
        Self::Clothing,
        Self::Communication,
        Self::Restaurants,
        Self::Miscellaneous,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetIncome => "Net_Income",
            Self::Food => "Food",
            Self::Housing => "Housing",
            Self::Transport => "Transport",
            Self::Health => "Health",
            Self::Education => "Education",
            Self::Recreation => "Recreation",
            Self::Clothing => "Clothing",
            Self::Communication => "Communication",
            Self::Restaurants => "Restaurants",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    /// Display label for the field
    pub fn label(&self) -> &'static str {
        match self {
            Self::NetIncome => "Net Income",
            Self::Food => "Food & Groceries",
            Self::Housing => "Housing",
            Self::Transport => "Transport",
            Self::Health => "Healthcare",
            Self::Education => "Education",
            Self::Recreation => "Recreation & Fun",
            Self::Clothing => "Shopping/Clothing",
            Self::Communication => "Communication",
            Self::Restaurants => "Dining Out",
            Self::Miscellaneous => "Miscellaneous",
        }
    }

    /// Income first, then every expense category
    pub fn all() -> impl Iterator<Item = BudgetField> {
        std::iter::once(Self::NetIncome).chain(Self::EXPENSES)
    }
}

impl std::str::FromStr for BudgetField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "netincome" | "income" => Ok(Self::NetIncome),
            "food" => Ok(Self::Food),
            "housing" => Ok(Self::Housing),
            "transport" => Ok(Self::Transport),
            "health" => Ok(Self::Health),
            "education" => Ok(Self::Education),
            "recreation" => Ok(Self::Recreation),
            "clothing" => Ok(Self::Clothing),
            "communication" => Ok(Self::Communication),
            "restaurants" | "dining" => Ok(Self::Restaurants),
            "miscellaneous" | "misc" => Ok(Self::Miscellaneous),
            _ => Err(format!("Unknown budget field: {}", s)),
        }
    }
}

impl std::fmt::Display for BudgetField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_region() -> String {
    "Central Hungary".to_string()
}

fn default_household_type() -> String {
    "Family with children".to_string()
}

fn default_household_size() -> u32 {
    4
}

fn default_employment_status() -> String {
    "Employed".to_string()
}

/// Monthly household budget plus demographics, as sent to the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseholdInput {
    #[serde(rename = "Net_Income", default)]
    pub net_income: f64,
    #[serde(rename = "Food", default)]
    pub food: f64,
    #[serde(rename = "Housing", default)]
    pub housing: f64,
    #[serde(rename = "Transport", default)]
    pub transport: f64,
    #[serde(rename = "Health", default)]
    pub health: f64,
    #[serde(rename = "Education", default)]
    pub education: f64,
    #[serde(rename = "Recreation", default)]
    pub recreation: f64,
    #[serde(rename = "Clothing", default)]
    pub clothing: f64,
    #[serde(rename = "Communication", default)]
    pub communication: f64,
    #[serde(rename = "Restaurants", default)]
    pub restaurants: f64,
    #[serde(rename = "Miscellaneous", default)]
    pub miscellaneous: f64,

    #[serde(rename = "Region", default = "default_region")]
    pub region: String,
    #[serde(rename = "Household_Type", default = "default_household_type")]
    pub household_type: String,
    #[serde(rename = "Household_Size", default = "default_household_size")]
    pub household_size: u32,
    #[serde(rename = "Employment_Status", default = "default_employment_status")]
    pub employment_status: String,
}

impl Default for HouseholdInput {
    fn default() -> Self {
        Self {
            net_income: 0.0,
            food: 0.0,
            housing: 0.0,
            transport: 0.0,
            health: 0.0,
            education: 0.0,
            recreation: 0.0,
            clothing: 0.0,
            communication: 0.0,
            restaurants: 0.0,
            miscellaneous: 0.0,
            region: default_region(),
            household_type: default_household_type(),
            household_size: default_household_size(),
            employment_status: default_employment_status(),
        }
    }
}

impl HouseholdInput {
    pub fn get(&self, field: BudgetField) -> f64 {
        match field {
            BudgetField::NetIncome => self.net_income,
            BudgetField::Food => self.food,
            BudgetField::Housing => self.housing,
            BudgetField::Transport => self.transport,
            BudgetField::Health => self.health,
            BudgetField::Education => self.education,
            BudgetField::Recreation => self.recreation,
            BudgetField::Clothing => self.clothing,
            BudgetField::Communication => self.communication,
            BudgetField::Restaurants => self.restaurants,
            BudgetField::Miscellaneous => self.miscellaneous,
        }
    }

    pub fn set(&mut self, field: BudgetField, value: f64) {
        let slot = match field {
            BudgetField::NetIncome => &mut self.net_income,
            BudgetField::Food => &mut self.food,
            BudgetField::Housing => &mut self.housing,
            BudgetField::Transport => &mut self.transport,
            BudgetField::Health => &mut self.health,
            BudgetField::Education => &mut self.education,
            BudgetField::Recreation => &mut self.recreation,
            BudgetField::Clothing => &mut self.clothing,
            BudgetField::Communication => &mut self.communication,
            BudgetField::Restaurants => &mut self.restaurants,
            BudgetField::Miscellaneous => &mut self.miscellaneous,
        };
        *slot = value;
    }

    /// Sum of the ten expense categories
    pub fn total_expenses(&self) -> f64 {
        BudgetField::EXPENSES.iter().map(|f| self.get(*f)).sum()
    }

    /// Income left after all expenses (negative when overspending)
    pub fn monthly_surplus(&self) -> f64 {
        self.net_income - self.total_expenses()
    }
}

/// Headline narrative of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub status: String,
    pub primary_cause: String,
    pub urgent_action: String,
    pub recovery_horizon: String,
}

impl Default for ExecutiveSummary {
    fn default() -> Self {
        Self {
            status: "Unknown".to_string(),
            primary_cause: "Unable to determine".to_string(),
            urgent_action: "Retry analysis".to_string(),
            recovery_horizon: "N/A".to_string(),
        }
    }
}

/// One explained contributor to financial distress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub value: f64,
    pub threshold: String,
    pub explanation: String,
    /// Share of the overall risk, 0.0-1.0
    pub contribution_score: f64,
}

/// Ratios and totals the service derived from the budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_expenditure: f64,
    pub savings: f64,
    pub savings_rate_pct: f64,
    pub expenditure_to_income_pct: f64,
    pub housing_burden_pct: f64,
    pub essential_spending_pct: f64,
    pub discretionary_spending_pct: f64,
}

/// A recommendation in uniform shape, whatever form the service sent it in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    /// Empty when the service only sent a bare string
    pub details: String,
    pub priority: Priority,
    pub category: String,
}

/// The four named sub-scores behind the health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BreakdownAxis {
    IncomeStability,
    ExpenseControl,
    DebtPressure,
    SavingsDiscipline,
}

impl BreakdownAxis {
    pub const ALL: [BreakdownAxis; 4] = [
        Self::IncomeStability,
        Self::ExpenseControl,
        Self::DebtPressure,
        Self::SavingsDiscipline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IncomeStability => "income_stability",
            Self::ExpenseControl => "expense_control",
            Self::DebtPressure => "debt_pressure",
            Self::SavingsDiscipline => "savings_discipline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::IncomeStability => "Income stability",
            Self::ExpenseControl => "Expense control",
            Self::DebtPressure => "Debt pressure",
            Self::SavingsDiscipline => "Savings discipline",
        }
    }
}

/// Health sub-scores, each 0-100
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthBreakdown {
    pub income_stability: f64,
    pub expense_control: f64,
    pub debt_pressure: f64,
    pub savings_discipline: f64,
}

impl HealthBreakdown {
    pub fn get(&self, axis: BreakdownAxis) -> f64 {
        match axis {
            BreakdownAxis::IncomeStability => self.income_stability,
            BreakdownAxis::ExpenseControl => self.expense_control,
            BreakdownAxis::DebtPressure => self.debt_pressure,
            BreakdownAxis::SavingsDiscipline => self.savings_discipline,
        }
    }

    pub fn set(&mut self, axis: BreakdownAxis, value: f64) {
        match axis {
            BreakdownAxis::IncomeStability => self.income_stability = value,
            BreakdownAxis::ExpenseControl => self.expense_control = value,
            BreakdownAxis::DebtPressure => self.debt_pressure = value,
            BreakdownAxis::SavingsDiscipline => self.savings_discipline = value,
        }
    }
}

/// A complete scoring report where every field has a defined value
///
/// Only `normalize::normalize` builds these from service output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReport {
    pub health_score: f64,
    pub prediction: String,
    pub confidence: f64,
    pub probabilities: Vec<(String, f64)>,
    pub executive_summary: ExecutiveSummary,
    pub risk_factors: Vec<RiskFactor>,
    pub risk_explanation_text: Vec<String>,
    pub financial_metrics: FinancialMetrics,
    pub recommendations: Vec<Recommendation>,
    pub recovery_timeline_months: u32,
    pub monthly_savings_needed: f64,
    pub health_breakdown: HealthBreakdown,
}

/// Outcome of one applied simulation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationResult {
    /// Sequence number the request was dispatched with
    pub sequence: u64,
    pub health_score: f64,
    pub health_breakdown: HealthBreakdown,
}

/// Goal priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown priority: {}. Available: Low, Medium, High", s)),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated savings goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub goal_name: String,
    pub goal_amount: f64,
    pub duration_months: u32,
    pub priority: Priority,
}

/// Raw goal form input, validated into a `Goal` before any request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalDraft {
    pub goal_name: String,
    pub goal_amount: String,
    pub duration_months: String,
    pub priority: Priority,
}

impl GoalDraft {
    pub fn new(
        name: impl Into<String>,
        amount: impl Into<String>,
        months: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            goal_name: name.into(),
            goal_amount: amount.into(),
            duration_months: months.into(),
            priority,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.goal_name.is_empty() && self.goal_amount.is_empty() && self.duration_months.is_empty()
    }
}

/// Qualitative reachability of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feasibility {
    Achievable,
    Tight,
    #[serde(alias = "Not Feasible", alias = "NotFeasible")]
    Infeasible,
}

impl Feasibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achievable => "Achievable",
            Self::Tight => "Tight",
            Self::Infeasible => "Infeasible",
        }
    }
}

impl std::fmt::Display for Feasibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Service verdict for a goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalAnalysis {
    pub feasibility: Feasibility,
    pub required_monthly: f64,
    pub available_surplus: f64,
    /// `required_monthly - available_surplus`
    pub gap: f64,
    pub distress_impact_pct: f64,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// An accepted goal together with its analysis
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedGoal {
    goal: Goal,
    analysis: GoalAnalysis,
}

impl PlannedGoal {
    pub fn new(goal: Goal, analysis: GoalAnalysis) -> Self {
        Self { goal, analysis }
    }

    pub fn goal(&self) -> &Goal {
        &self.goal
    }

    pub fn analysis(&self) -> &GoalAnalysis {
        &self.analysis
    }
}
