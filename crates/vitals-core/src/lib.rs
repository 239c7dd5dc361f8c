//! Vitals Core Library
//!
//! Shared functionality for the Vitals household financial health explorer:
//! - Scoring service backends (HTTP and in-process mock)
//! - Normalization of untrusted scoring responses
//! - Debounced what-if simulation with sequence-ordered responses
//! - Baseline vs. simulated deltas
//! - Savings goal feasibility planning
//! - Three-page report wizard and application session
//! - PDF export of captured report pages
//! - Layered configuration

pub mod backend;
pub mod config;
pub mod delta;
pub mod error;
pub mod export;
pub mod goals;
pub mod models;
pub mod normalize;
pub mod session;
pub mod simulation;
pub mod wizard;

/// Test utilities including mock scoring server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use backend::{HttpBackend, MockBackend, Operation, ScoringBackend, ScoringClient};
pub use config::{BackendKind, Config};
pub use delta::{ComponentDeltas, Trajectory};
pub use error::{Error, Result};
pub use export::{Document, DocumentPage, ExportPipeline, PageView, RasterImage, ViewCapture};
pub use goals::GoalPlanner;
pub use models::*;
pub use normalize::{derive_household_input, normalize, normalize_simulation};
pub use session::{AppMode, Session};
pub use simulation::{SimulationController, SimulationSnapshot, SliderRange};
pub use wizard::{NoopViewport, ReportWizard, Viewport, WizardPage};
