//! Scoring service abstraction
//!
//! The scoring algorithm is external: this module only describes the three
//! remote operations the report controllers depend on and how to reach them.
//!
//! # Architecture
//!
//! - `ScoringBackend` trait: the interface every backend implements
//! - `ScoringClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `HttpBackend` (the real service), `MockBackend`
//!   (in-process heuristics and scripted replies for tests and demos)
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = Config::load(None)?;
//! let client = ScoringClient::from_config(&config)?;
//! let raw = client.score(&household).await?;
//! let report = normalize(&raw);
//! ```

mod http;
mod mock;

pub use http::HttpBackend;
pub use mock::{MockBackend, Operation};

pub(crate) use mock::{heuristic_goal_analysis, heuristic_report};

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::config::{BackendKind, Config};
use crate::error::Result;
use crate::models::{Goal, GoalAnalysis, HouseholdInput};

/// Interface to the remote scoring service
///
/// Score and Simulate return the raw, untrusted response body; callers run it
/// through `normalize` before use. Backends must be Send + Sync so requests
/// can be spawned onto the runtime.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    /// Full scoring of a household budget
    async fn score(&self, household: &HouseholdInput) -> Result<Value>;

    /// What-if scoring of an edited budget (health score and breakdown)
    async fn simulate(&self, household: &HouseholdInput) -> Result<Value>;

    /// Feasibility of a savings goal against the budget
    async fn analyze_goal(&self, household: &HouseholdInput, goal: &Goal) -> Result<GoalAnalysis>;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;

    /// Base URL or label (for logging)
    fn host(&self) -> &str;
}

/// Concrete scoring client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum ScoringClient {
    /// Remote scoring service over HTTP
    Http(HttpBackend),
    /// In-process mock backend
    Mock(MockBackend),
}

impl ScoringClient {
    /// Create the client selected by configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.service.backend {
            BackendKind::Http => Ok(ScoringClient::Http(HttpBackend::new(
                &config.service.base_url,
                config.service.request_timeout,
            )?)),
            BackendKind::Mock => {
                warn!(
                    "Using the mock scoring backend: a heuristic demo double, not the scoring model"
                );
                Ok(ScoringClient::Mock(MockBackend::new()))
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        ScoringClient::Mock(MockBackend::new())
    }
}

impl From<MockBackend> for ScoringClient {
    fn from(backend: MockBackend) -> Self {
        ScoringClient::Mock(backend)
    }
}

impl From<HttpBackend> for ScoringClient {
    fn from(backend: HttpBackend) -> Self {
        ScoringClient::Http(backend)
    }
}

// Implement ScoringBackend for ScoringClient by delegating to the inner backend
#[async_trait]
impl ScoringBackend for ScoringClient {
    async fn score(&self, household: &HouseholdInput) -> Result<Value> {
        match self {
            ScoringClient::Http(b) => b.score(household).await,
            ScoringClient::Mock(b) => b.score(household).await,
        }
    }

    async fn simulate(&self, household: &HouseholdInput) -> Result<Value> {
        match self {
            ScoringClient::Http(b) => b.simulate(household).await,
            ScoringClient::Mock(b) => b.simulate(household).await,
        }
    }

    async fn analyze_goal(&self, household: &HouseholdInput, goal: &Goal) -> Result<GoalAnalysis> {
        match self {
            ScoringClient::Http(b) => b.analyze_goal(household, goal).await,
            ScoringClient::Mock(b) => b.analyze_goal(household, goal).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            ScoringClient::Http(b) => b.health_check().await,
            ScoringClient::Mock(b) => b.health_check().await,
        }
    }

    fn host(&self) -> &str {
        match self {
            ScoringClient::Http(b) => b.host(),
            ScoringClient::Mock(b) => b.host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_backend() {
        let mut config = Config::default();
        config.service.backend = BackendKind::Mock;
        assert!(matches!(
            ScoringClient::from_config(&config).unwrap(),
            ScoringClient::Mock(_)
        ));

        config.service.backend = BackendKind::Http;
        config.service.base_url = "http://scoring.test:8000/".into();
        let client = ScoringClient::from_config(&config).unwrap();
        assert!(matches!(client, ScoringClient::Http(_)));
        assert_eq!(client.host(), "http://scoring.test:8000");
    }

    /// In-memory log sink
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mock_backend_selection_warns() {
        let sink = Captured::default();
        let writer = sink.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let mut config = Config::default();
        config.service.backend = BackendKind::Mock;
        tracing::subscriber::with_default(subscriber, || {
            ScoringClient::from_config(&config).unwrap();
        });

        let logged = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("WARN"));
        assert!(logged.contains("demo double"));
    }
}
