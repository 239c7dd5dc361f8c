//! Three-page report wizard: Overview, Analysis, Actions
//!
//! The wizard owns everything derived from one report. The simulator is
//! created the first time the Actions page is entered and then kept for the
//! life of the wizard; goals live as long as the wizard does.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::ScoringBackend;
use crate::export::PageView;
use crate::goals::GoalPlanner;
use crate::models::{HouseholdInput, NormalizedReport};
use crate::simulation::SimulationController;

/// Scroll control for whatever is displaying the report
pub trait Viewport: Send + Sync {
    fn scroll_to_top(&self);
}

/// Viewport for front ends without scrolling
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopViewport;

impl Viewport for NoopViewport {
    fn scroll_to_top(&self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPage {
    Overview,
    Analysis,
    Actions,
}

impl WizardPage {
    pub const ALL: [WizardPage; 3] = [Self::Overview, Self::Analysis, Self::Actions];

    /// 1-based position
    pub fn number(&self) -> usize {
        match self {
            Self::Overview => 1,
            Self::Analysis => 2,
            Self::Actions => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Analysis => "Analysis",
            Self::Actions => "Actions",
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Self::Overview => Some(Self::Analysis),
            Self::Analysis => Some(Self::Actions),
            Self::Actions => None,
        }
    }

    fn prev(self) -> Option<Self> {
        match self {
            Self::Overview => None,
            Self::Analysis => Some(Self::Overview),
            Self::Actions => Some(Self::Analysis),
        }
    }
}

impl std::str::FromStr for WizardPage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overview" | "1" => Ok(Self::Overview),
            "analysis" | "2" => Ok(Self::Analysis),
            "actions" | "3" => Ok(Self::Actions),
            _ => Err(format!("Unknown page: {}. Available: overview, analysis, actions", s)),
        }
    }
}

impl std::fmt::Display for WizardPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title())
    }
}

pub struct ReportWizard<B: ScoringBackend + Clone + 'static> {
    backend: B,
    page: WizardPage,
    report: NormalizedReport,
    household: HouseholdInput,
    debounce: Duration,
    viewport: Arc<dyn Viewport>,
    simulation: Option<SimulationController<B>>,
    goals: GoalPlanner<B>,
}

impl<B: ScoringBackend + Clone + 'static> ReportWizard<B> {
    /// Open a wizard on the Overview page
    ///
    /// `household` is the budget the report was scored from; it seeds the
    /// simulator and goal analyses.
    pub fn new(
        backend: B,
        report: NormalizedReport,
        household: HouseholdInput,
        debounce: Duration,
        viewport: Arc<dyn Viewport>,
    ) -> Self {
        let goals = GoalPlanner::new(backend.clone());
        Self {
            backend,
            page: WizardPage::Overview,
            report,
            household,
            debounce,
            viewport,
            simulation: None,
            goals,
        }
    }

    /// Advance one page; a no-op on Actions. Always scrolls to top.
    pub fn next(&mut self) -> WizardPage {
        self.viewport.scroll_to_top();
        if let Some(page) = self.page.next() {
            self.enter(page);
        }
        self.page
    }

    /// Go back one page; a no-op on Overview. Always scrolls to top.
    pub fn back(&mut self) -> WizardPage {
        self.viewport.scroll_to_top();
        if let Some(page) = self.page.prev() {
            self.enter(page);
        }
        self.page
    }

    fn enter(&mut self, page: WizardPage) {
        debug!(from = %self.page, to = %page, "Wizard page change");
        self.page = page;
        if page == WizardPage::Actions && self.simulation.is_none() {
            self.simulation = Some(SimulationController::new(
                self.backend.clone(),
                self.household.clone(),
                self.report.health_score,
                self.report.health_breakdown,
                self.debounce,
            ));
        }
    }

    /// Discard the report and everything derived from it
    pub fn reset(self) {
        debug!(page = %self.page, "Wizard reset");
    }

    pub fn page(&self) -> WizardPage {
        self.page
    }

    pub fn page_number(&self) -> usize {
        self.page.number()
    }

    pub fn total_pages(&self) -> usize {
        WizardPage::ALL.len()
    }

    pub fn report(&self) -> &NormalizedReport {
        &self.report
    }

    pub fn household(&self) -> &HouseholdInput {
        &self.household
    }

    /// The simulator, once the Actions page has been visited
    pub fn simulation(&self) -> Option<&SimulationController<B>> {
        self.simulation.as_ref()
    }

    pub fn goals(&self) -> &GoalPlanner<B> {
        &self.goals
    }

    /// What the current page shows, for capture
    ///
    /// The simulator and goals appear only on the Actions page.
    pub fn current_view(&self) -> PageView<'_> {
        let mut view = PageView::report_only(self.page, &self.report);
        if self.page == WizardPage::Actions {
            view.simulation = self.simulation.as_ref().map(SimulationController::snapshot);
            view.goals = self.goals.goals();
        }
        view
    }
}
