//! Top-level application state
//!
//! A session starts on the landing screen, moves to the dashboard, and holds
//! at most one report wizard. Submitting a budget replaces any previous
//! report wholesale.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{info, warn};

use crate::backend::{ScoringBackend, ScoringClient};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{ExportPipeline, ViewCapture, EXPORT_FAILURE_MESSAGE};
use crate::models::HouseholdInput;
use crate::normalize::{derive_household_input, normalize};
use crate::wizard::{ReportWizard, Viewport};

/// Warning shown when a score request fails without a server message
pub const SCORE_FAILURE_MESSAGE: &str = "Prediction request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Landing,
    Dashboard,
}

/// Clears the loading flag when a submission ends, however it ends
struct LoadingGuard(Arc<AtomicBool>);

impl LoadingGuard {
    fn start(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Session<B: ScoringBackend + Clone + 'static = ScoringClient> {
    backend: B,
    debounce: Duration,
    export: ExportPipeline,
    viewport: Arc<dyn Viewport>,
    mode: AppMode,
    wizard: Option<ReportWizard<B>>,
    loading: Arc<AtomicBool>,
    warning: Option<String>,
    notice: Option<String>,
}

impl<B: ScoringBackend + Clone + 'static> Session<B> {
    pub fn new(backend: B, config: &Config, viewport: Arc<dyn Viewport>) -> Self {
        Self {
            backend,
            debounce: config.simulation.debounce,
            export: ExportPipeline::from_config(&config.export),
            viewport,
            mode: AppMode::Landing,
            wizard: None,
            loading: Arc::new(AtomicBool::new(false)),
            warning: None,
            notice: None,
        }
    }

    pub fn start_analysis(&mut self) {
        self.mode = AppMode::Dashboard;
    }

    /// Return to the landing screen, discarding any report
    pub fn back_to_home(&mut self) {
        self.drop_wizard();
        self.mode = AppMode::Landing;
    }

    /// Score `household` and open a fresh wizard on the result
    ///
    /// On failure the previous report (if any) stays and a warning is set.
    /// The viewport scrolls to top either way.
    pub async fn submit(&mut self, household: HouseholdInput) -> Result<()> {
        let outcome = {
            let _loading = LoadingGuard::start(&self.loading);
            self.backend.score(&household).await
        };
        self.viewport.scroll_to_top();

        match outcome {
            Ok(raw) => {
                let report = normalize(&raw);
                info!(
                    health_score = report.health_score,
                    prediction = %report.prediction,
                    "Report scored"
                );
                self.open(ReportWizard::new(
                    self.backend.clone(),
                    report,
                    household,
                    self.debounce,
                    Arc::clone(&self.viewport),
                ));
                Ok(())
            }
            Err(e) => {
                warn!(host = self.backend.host(), error = %e, "Score request failed");
                self.warning = Some(match &e {
                    Error::Remote { message, .. } => message.clone(),
                    _ => SCORE_FAILURE_MESSAGE.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Open a wizard on a stored raw report without scoring again
    ///
    /// The budget is rebuilt approximately from the report's metrics.
    pub fn resume(&mut self, raw_report: &Value) {
        let report = normalize(raw_report);
        let household = derive_household_input(&report);
        self.viewport.scroll_to_top();
        self.open(ReportWizard::new(
            self.backend.clone(),
            report,
            household,
            self.debounce,
            Arc::clone(&self.viewport),
        ));
    }

    /// Discard the current report and go back to the input form
    pub fn reset_report(&mut self) {
        self.drop_wizard();
        self.viewport.scroll_to_top();
    }

    /// Export the page currently shown into `dir`
    ///
    /// Failures set a notice and leave the report untouched.
    pub async fn export_report(&mut self, capture: &dyn ViewCapture, dir: &Path) -> Result<PathBuf> {
        let Some(wizard) = self.wizard.as_ref() else {
            return Err(Error::Export("No report to export".into()));
        };
        let view = wizard.current_view();
        let page = view.page;
        match self
            .export
            .export_views_to(capture, std::slice::from_ref(&view), dir)
            .await
        {
            Ok(path) => {
                self.notice = None;
                Ok(path)
            }
            Err(e) => {
                warn!(page = %page, error = %e, "Export failed");
                self.notice = Some(EXPORT_FAILURE_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    fn open(&mut self, wizard: ReportWizard<B>) {
        self.drop_wizard();
        self.wizard = Some(wizard);
        self.mode = AppMode::Dashboard;
        self.warning = None;
        self.notice = None;
    }

    fn drop_wizard(&mut self) {
        if let Some(wizard) = self.wizard.take() {
            wizard.reset();
        }
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn wizard(&self) -> Option<&ReportWizard<B>> {
        self.wizard.as_ref()
    }

    pub fn wizard_mut(&mut self) -> Option<&mut ReportWizard<B>> {
        self.wizard.as_mut()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn export_pipeline(&self) -> &ExportPipeline {
        &self.export
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Shared loading flag, for observers running beside a submission
    pub fn loading_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.loading)
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
