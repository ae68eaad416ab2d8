//! HTTP endpoint handlers

use std::time::{Duration, Instant};

use axum::{extract::Query, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use super::responses::{ApiResponse, WorkParams, WorkResponse};

/// Upper bound on simulated work so a request cannot pin a connection forever
pub const MAX_WORK: Duration = Duration::from_secs(30);

/// Handle GET / - Greeting
pub async fn root_handler() -> Json<ApiResponse> {
    Json(ApiResponse::ok("drain-guard is serving".to_string()))
}

/// Handle GET /work?ms=N - Keep the request in flight for N milliseconds
pub async fn work_handler(Query(params): Query<WorkParams>) -> Json<WorkResponse> {
    let requested = Duration::from_millis(params.ms.unwrap_or(0));
    let delay = requested.min(MAX_WORK);
    debug!(delay_ms = delay.as_millis() as u64, "Simulating work");

    let started_at = Utc::now();
    let start = Instant::now();
    tokio::time::sleep(delay).await;

    Json(WorkResponse {
        elapsed_ms: start.elapsed().as_millis() as u64,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Fallback for unknown routes
pub async fn not_found_handler() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "status": "error", "message": "not found" })))
}
