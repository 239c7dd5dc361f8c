//! Test utilities for vitals-core
//!
//! This module provides a mock scoring service that speaks the same HTTP
//! contract as the real one, for development and integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::backend::{heuristic_goal_analysis, heuristic_report};
use crate::models::{Goal, HouseholdInput};

/// Behaviour knobs for the mock server
#[derive(Debug, Clone, Default)]
pub struct MockServerOptions {
    /// Answer every scoring route with this status and `detail` message
    pub failure: Option<(u16, String)>,
    /// Delay before each scoring response
    pub delay: Duration,
}

/// Mock scoring server for testing and development
pub struct MockScoringServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockScoringServer {
    /// Start the mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockServerOptions::default()).await
    }

    /// Start the mock server with custom behaviour
    pub async fn start_with(options: MockServerOptions) -> Self {
        let app = Router::new()
            .route("/health", get(handle_health))
            .route("/predict", post(handle_score))
            .route("/simulate", post(handle_score))
            .route("/analyze_goal", post(handle_goal))
            .with_state(Arc::new(options));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockScoringServer {
    fn drop(&mut self) {
        self.stop();
    }
}

type Options = Arc<MockServerOptions>;

async fn handle_health() -> Json<Value> {
    Json(json!({"status": "healthy", "model_loaded": true}))
}

/// Apply the configured delay, then the configured failure if any
async fn prelude(options: &MockServerOptions) -> Option<Response> {
    if !options.delay.is_zero() {
        tokio::time::sleep(options.delay).await;
    }
    options.failure.as_ref().map(|(status, message)| {
        let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({"detail": message}))).into_response()
    })
}

fn unprocessable(message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({"detail": [{"msg": message}]})),
    )
        .into_response()
}

async fn handle_score(State(options): State<Options>, Json(body): Json<Value>) -> Response {
    if let Some(response) = prelude(&options).await {
        return response;
    }
    match serde_json::from_value::<HouseholdInput>(body) {
        Ok(household) => Json(heuristic_report(&household)).into_response(),
        Err(e) => unprocessable(&e.to_string()),
    }
}

async fn handle_goal(State(options): State<Options>, Json(body): Json<Value>) -> Response {
    if let Some(response) = prelude(&options).await {
        return response;
    }
    let goal = match body.get("goal").cloned().map(serde_json::from_value::<Goal>) {
        Some(Ok(goal)) => goal,
        Some(Err(e)) => return unprocessable(&e.to_string()),
        None => return unprocessable("field required: goal"),
    };
    match serde_json::from_value::<HouseholdInput>(body) {
        Ok(household) => Json(heuristic_goal_analysis(&household, &goal)).into_response(),
        Err(e) => unprocessable(&e.to_string()),
    }
}
