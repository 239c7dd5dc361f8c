//! HTTP backend for the remote scoring service
//!
//! Endpoints:
//! - `POST /predict`: full score for a household budget
//! - `POST /simulate`: what-if score for an edited budget
//! - `POST /analyze_goal`: household budget plus a `goal` object
//! - `GET /health`: liveness
//!
//! Every request is bounded by the client-level timeout from configuration.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Goal, GoalAnalysis, HouseholdInput};

use super::ScoringBackend;

/// Scoring service client over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
}

/// Household budget with the goal under analysis, sent to `/analyze_goal`
#[derive(Debug, Serialize)]
struct GoalRequest<'a> {
    #[serde(flatten)]
    household: &'a HouseholdInput,
    goal: &'a Goal,
}

impl HttpBackend {
    /// Create a new backend; `timeout` bounds each request end to end
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        fallback_message: &str,
    ) -> Result<Response> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body: Option<Value> = response.json().await.ok();
            let message = body
                .as_ref()
                .and_then(detail_message)
                .unwrap_or_else(|| fallback_message.to_string());
            return Err(Error::Remote { status, message });
        }

        Ok(response)
    }
}

/// Extract a readable message from an error body's `detail`
///
/// `detail` is either a string or, for request validation failures, a list of
/// objects carrying a `msg`.
fn detail_message(body: &Value) -> Option<String> {
    match body.get("detail")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

#[async_trait]
impl ScoringBackend for HttpBackend {
    async fn score(&self, household: &HouseholdInput) -> Result<Value> {
        let response = self
            .post_json("/predict", household, "Prediction request failed")
            .await?;
        let raw: Value = response.json().await?;
        debug!(host = %self.base_url, "Score response received");
        Ok(raw)
    }

    async fn simulate(&self, household: &HouseholdInput) -> Result<Value> {
        let response = self
            .post_json("/simulate", household, "Simulation failed")
            .await?;
        Ok(response.json().await?)
    }

    async fn analyze_goal(&self, household: &HouseholdInput, goal: &Goal) -> Result<GoalAnalysis> {
        let request = GoalRequest { household, goal };
        let response = self
            .post_json("/analyze_goal", &request, "Goal analysis failed")
            .await?;
        Ok(response.json().await?)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}
