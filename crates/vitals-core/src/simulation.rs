//! What-if simulation of an edited household budget
//!
//! Edits apply locally right away; the remote recomputation runs on a
//! trailing debounce and every dispatched request carries a sequence number.
//! Only the response for the most recently issued sequence is applied, so
//! requests resolving out of order can never roll the view back.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::ScoringBackend;
use crate::delta::{component_deltas, score_delta, surplus_delta, ComponentDeltas, Trajectory};
use crate::error::{Error, Result};
use crate::models::{BudgetField, HealthBreakdown, HouseholdInput, SimulationResult};
use crate::normalize::normalize_simulation;

/// UI bounds for one budget slider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

/// Everything a front end needs to draw the simulator
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSnapshot {
    pub values: HouseholdInput,
    /// Last applied result, `None` until one arrives or after a reset
    pub result: Option<SimulationResult>,
    pub score_delta: f64,
    pub component_deltas: ComponentDeltas,
    pub surplus_delta: f64,
    pub trajectory: Trajectory,
    /// A debounce timer is armed and no request has been sent for it yet
    pub pending: bool,
    pub is_simulating: bool,
    /// Highest sequence number issued so far
    pub sequence: u64,
    pub last_error: Option<String>,
}

struct State {
    original: HouseholdInput,
    values: HouseholdInput,
    result: Option<SimulationResult>,
    sequence: u64,
    /// Responses at or below this sequence predate the last reset
    superseded_through: u64,
    in_flight: usize,
    last_error: Option<String>,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
}

struct Inner<B> {
    backend: B,
    baseline_score: f64,
    baseline_breakdown: HealthBreakdown,
    debounce: Duration,
    state: Mutex<State>,
    updates: watch::Sender<SimulationSnapshot>,
}

/// Debounced, sequence-ordered simulator for one report
///
/// Must be used from within a Tokio runtime. Dropping the controller cancels
/// a pending debounce timer; requests already in flight finish and are
/// ignored.
pub struct SimulationController<B: ScoringBackend + 'static> {
    inner: Arc<Inner<B>>,
}

impl<B: ScoringBackend + 'static> SimulationController<B> {
    pub fn new(
        backend: B,
        baseline: HouseholdInput,
        baseline_score: f64,
        baseline_breakdown: HealthBreakdown,
        debounce: Duration,
    ) -> Self {
        let state = State {
            original: baseline.clone(),
            values: baseline,
            result: None,
            sequence: 0,
            superseded_through: 0,
            in_flight: 0,
            last_error: None,
            timer: None,
            timer_generation: 0,
        };
        let initial = snapshot_of(&state, baseline_score, &baseline_breakdown);
        let (updates, _) = watch::channel(initial);

        Self {
            inner: Arc::new(Inner {
                backend,
                baseline_score,
                baseline_breakdown,
                debounce,
                state: Mutex::new(state),
                updates,
            }),
        }
    }

    /// Set one budget field and (re)arm the debounce timer
    pub fn set_field(&self, field: BudgetField, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::Validation(format!(
                "{} must be a finite number",
                field.label()
            )));
        }

        let mut state = self.inner.lock();
        state.values.set(field, value);

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.timer_generation += 1;
        let generation = state.timer_generation;

        let inner = Arc::clone(&self.inner);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            if let Some((sequence, values)) = inner.dispatch(generation) {
                let outcome = inner.backend.simulate(&values).await;
                inner.complete(sequence, outcome);
            }
        }));

        self.inner.publish(&state);
        Ok(())
    }

    /// Parse a field name and numeric text, then `set_field`
    pub fn set_field_str(&self, field: &str, value: &str) -> Result<()> {
        let field: BudgetField = field.parse().map_err(Error::Validation)?;
        let value: f64 = value.trim().parse().map_err(|_| {
            Error::Validation(format!("Invalid value for {}: {:?}", field.label(), value))
        })?;
        self.set_field(field, value)
    }

    /// Restore the original values and forget any result
    ///
    /// Cancels a pending timer without a network call. Responses to requests
    /// issued before the reset are discarded when they arrive.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.timer_generation += 1;
        state.values = state.original.clone();
        state.result = None;
        state.last_error = None;
        state.superseded_through = state.sequence;
        debug!(sequence = state.sequence, "Simulation reset");
        self.inner.publish(&state);
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        let state = self.inner.lock();
        self.inner.snapshot(&state)
    }

    /// Receiver that changes whenever the simulator state does
    pub fn subscribe(&self) -> watch::Receiver<SimulationSnapshot> {
        self.inner.updates.subscribe()
    }

    pub fn values(&self) -> HouseholdInput {
        self.inner.lock().values.clone()
    }

    pub fn result(&self) -> Option<SimulationResult> {
        self.inner.lock().result
    }

    pub fn is_simulating(&self) -> bool {
        self.inner.lock().in_flight > 0
    }

    pub fn last_error(&self) -> Option<String> {
        self.inner.lock().last_error.clone()
    }

    pub fn dismiss_error(&self) {
        let mut state = self.inner.lock();
        if state.last_error.take().is_some() {
            self.inner.publish(&state);
        }
    }

    /// Slider bounds for a field, relative to the original or current income
    pub fn slider_range(&self, field: BudgetField) -> SliderRange {
        let state = self.inner.lock();
        let income = state.values.net_income.max(0.0);
        let (max_share, step) = match field {
            BudgetField::NetIncome => {
                let original = state.original.net_income.max(0.0);
                return SliderRange {
                    min: original * 0.5,
                    max: original * 1.5,
                    step: 100.0,
                };
            }
            BudgetField::Housing => (0.8, 50.0),
            BudgetField::Food => (0.4, 50.0),
            _ => (0.3, 50.0),
        };
        SliderRange {
            min: 0.0,
            max: income * max_share,
            step,
        }
    }
}

impl<B: ScoringBackend + 'static> Drop for SimulationController<B> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.timer_generation += 1;
    }
}

impl<B: ScoringBackend> Inner<B> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn snapshot(&self, state: &State) -> SimulationSnapshot {
        snapshot_of(state, self.baseline_score, &self.baseline_breakdown)
    }

    fn publish(&self, state: &State) {
        self.updates.send_replace(self.snapshot(state));
    }

    /// Timer fired: issue the next sequence number for the current values
    ///
    /// Returns `None` if the timer was re-armed or cancelled meanwhile.
    fn dispatch(&self, generation: u64) -> Option<(u64, HouseholdInput)> {
        let mut state = self.lock();
        if state.timer_generation != generation {
            return None;
        }
        // The handle belongs to this task; dropping it detaches, it does not abort
        state.timer = None;
        state.sequence += 1;
        state.in_flight += 1;
        let sequence = state.sequence;
        let values = state.values.clone();
        debug!(sequence, host = self.backend.host(), "Simulation dispatched");
        self.publish(&state);
        Some((sequence, values))
    }

    fn complete(&self, sequence: u64, outcome: Result<serde_json::Value>) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        let latest = sequence == state.sequence && sequence > state.superseded_through;

        match outcome {
            Ok(raw) if latest => {
                let result = normalize_simulation(&raw, sequence);
                debug!(sequence, health_score = result.health_score, "Simulation applied");
                state.result = Some(result);
                state.last_error = None;
            }
            Err(e) if latest => {
                warn!(sequence, error = %e, "Simulation failed, keeping previous result");
                state.last_error = Some(e.user_message());
            }
            _ => {
                debug!(sequence, latest = state.sequence, "Discarding stale simulation response");
            }
        }

        self.publish(&state);
    }
}

fn snapshot_of(
    state: &State,
    baseline_score: f64,
    baseline_breakdown: &HealthBreakdown,
) -> SimulationSnapshot {
    let (score, components) = match &state.result {
        Some(result) => (
            score_delta(result, baseline_score),
            component_deltas(&result.health_breakdown, baseline_breakdown),
        ),
        None => (0.0, ComponentDeltas::default()),
    };

    SimulationSnapshot {
        values: state.values.clone(),
        result: state.result,
        score_delta: score,
        component_deltas: components,
        surplus_delta: surplus_delta(&state.values, &state.original),
        trajectory: Trajectory::from_delta(score),
        pending: state.timer.is_some(),
        is_simulating: state.in_flight > 0,
        sequence: state.sequence,
        last_error: state.last_error.clone(),
    }
}
