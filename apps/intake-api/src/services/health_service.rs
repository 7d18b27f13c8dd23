//! Health check route.
//!
//! Reports on the local buffer only. The remote store being down is the
//! normal degraded mode and does not make the service unhealthy.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use crate::AppState;

/// `GET /health`: 200 when the buffer answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    if state.coordinator.database().health_check().await {
        (StatusCode::OK, Json(json!({ "buffer": "ok" })))
    } else {
        warn!("Health check failed: buffer unavailable");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "buffer": "unavailable" })),
        )
    }
}
