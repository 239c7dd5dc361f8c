//! Savings goal planning
//!
//! A goal draft is validated locally, sent to the scoring service once, and
//! the resulting analysis is held as pending until the user adds it to the
//! ordered goal list.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::backend::ScoringBackend;
use crate::error::{Error, Result};
use crate::models::{Goal, GoalAnalysis, GoalDraft, HouseholdInput, PlannedGoal};

/// Longest goal horizon the scoring service accepts
pub const MAX_DURATION_MONTHS: u32 = 360;

/// Shown for any failed analysis; the cause is logged
pub const GOAL_FAILURE_MESSAGE: &str = "Could not analyze goal. Please try again.";

#[derive(Default)]
struct GoalState {
    goals: Vec<PlannedGoal>,
    draft: GoalDraft,
    pending: Option<PlannedGoal>,
    error: Option<String>,
}

pub struct GoalPlanner<B> {
    backend: B,
    analyzing: AtomicBool,
    state: Mutex<GoalState>,
}

/// Clears the in-flight flag even if the analysis future is dropped
struct AnalyzingGuard<'a>(&'a AtomicBool);

impl Drop for AnalyzingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Validate raw form input into a goal
pub fn validate_goal(draft: &GoalDraft) -> Result<Goal> {
    let goal_name = draft.goal_name.trim();
    if goal_name.is_empty() {
        return Err(Error::Validation("Goal name is required".into()));
    }

    let goal_amount = draft
        .goal_amount
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite() && *a > 0.0)
        .ok_or_else(|| Error::Validation("Goal amount must be a positive number".into()))?;

    let duration_months = draft
        .duration_months
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|m| (1..=MAX_DURATION_MONTHS).contains(m))
        .ok_or_else(|| {
            Error::Validation(format!(
                "Duration must be a whole number of months between 1 and {}",
                MAX_DURATION_MONTHS
            ))
        })?;

    Ok(Goal {
        goal_name: goal_name.to_string(),
        goal_amount,
        duration_months,
        priority: draft.priority,
    })
}

impl<B: ScoringBackend> GoalPlanner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            analyzing: AtomicBool::new(false),
            state: Mutex::new(GoalState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GoalState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validate `draft` and ask the service whether it is reachable
    ///
    /// Invalid drafts are rejected before any network call. A successful
    /// analysis becomes the pending one; a remote failure sets the generic
    /// failure message and leaves goals untouched.
    pub async fn analyze(&self, draft: &GoalDraft, household: &HouseholdInput) -> Result<GoalAnalysis> {
        let goal = match validate_goal(draft) {
            Ok(goal) => goal,
            Err(e) => {
                self.lock().error = Some(e.user_message());
                return Err(e);
            }
        };

        if self
            .analyzing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::Validation("A goal analysis is already running".into()));
        }
        let _guard = AnalyzingGuard(&self.analyzing);

        {
            let mut state = self.lock();
            state.draft = draft.clone();
            state.pending = None;
            state.error = None;
        }

        match self.backend.analyze_goal(household, &goal).await {
            Ok(analysis) => {
                info!(
                    goal = %goal.goal_name,
                    feasibility = %analysis.feasibility,
                    required_monthly = analysis.required_monthly,
                    "Goal analyzed"
                );
                self.lock().pending = Some(PlannedGoal::new(goal, analysis.clone()));
                Ok(analysis)
            }
            Err(e) => {
                warn!(goal = %goal.goal_name, error = %e, "Goal analysis failed");
                self.lock().error = Some(GOAL_FAILURE_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::SeqCst)
    }

    /// Append a goal with its analysis; clears the draft and pending analysis
    pub fn add_goal(&self, goal: Goal, analysis: GoalAnalysis) {
        let mut state = self.lock();
        state.goals.push(PlannedGoal::new(goal, analysis));
        state.draft = GoalDraft::default();
        state.pending = None;
    }

    /// Add the pending analysis, if there is one
    pub fn accept_pending(&self) -> bool {
        let mut state = self.lock();
        match state.pending.take() {
            Some(planned) => {
                state.goals.push(planned);
                state.draft = GoalDraft::default();
                true
            }
            None => false,
        }
    }

    /// Remove by position; out-of-range indexes are ignored
    pub fn remove_goal(&self, index: usize) -> Option<PlannedGoal> {
        let mut state = self.lock();
        (index < state.goals.len()).then(|| state.goals.remove(index))
    }

    pub fn goals(&self) -> Vec<PlannedGoal> {
        self.lock().goals.clone()
    }

    pub fn pending(&self) -> Option<PlannedGoal> {
        self.lock().pending.clone()
    }

    pub fn draft(&self) -> GoalDraft {
        self.lock().draft.clone()
    }

    /// Combined monthly saving the planned goals call for
    pub fn total_required_monthly(&self) -> f64 {
        self.lock()
            .goals
            .iter()
            .map(|g| g.analysis().required_monthly)
            .sum()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn dismiss_error(&self) {
        self.lock().error = None;
    }
}
