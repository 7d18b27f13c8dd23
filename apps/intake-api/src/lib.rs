//! # Alta Intake API
//!
//! HTTP boundary for the dual-write intake buffer.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Intake API Routes                              │
//! │                                                                         │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────────────┐│
//! │  │  submission_service      │  │  client_service                      ││
//! │  │                          │  │                                      ││
//! │  │ • POST /api/submissions  │  │ • GET /api/clients/lookup?rut=       ││
//! │  │ • GET  …/pending         │  └──────────────────────────────────────┘│
//! │  │ • POST …/acknowledge     │  ┌──────────────────────────────────────┐│
//! │  │ • GET  …/next            │  │  health_service                      ││
//! │  │ • GET  …/{id}            │  │                                      ││
//! │  │ • GET  …/{id}/state      │  │ • GET /health                        ││
//! │  │ • GET  …/{id}/errors     │  └──────────────────────────────────────┘│
//! │  └──────────────────────────┘                                          │
//! │                                                                         │
//! │  AppState: SyncCoordinator · PendingReconciler · Acknowledger ·        │
//! │            ClientDirectory                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See `alta_sync::AppConfig`. Environment overrides:
//! - `ALTA_CONFIG` - Config file path
//! - `ALTA_DB_PATH` - Local buffer file
//! - `ALTA_REMOTE_URL` - PostgreSQL connection string
//! - `ALTA_BIND_ADDR` / `ALTA_PORT` - Listen address
//! - `RUST_LOG` - Log filter

pub mod error;
pub mod services;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use alta_sync::{Acknowledger, ClientDirectory, PendingReconciler, SyncCoordinator};

use crate::services::{client_service, health_service, submission_service};

// Re-exports
pub use error::{ApiError, ErrorCode};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub coordinator: SyncCoordinator,
    pub reconciler: PendingReconciler,
    pub acknowledger: Acknowledger,
    pub directory: ClientDirectory,
}

impl AppState {
    /// Wires the reconciler and acknowledger to the coordinator's buffer.
    pub fn new(coordinator: SyncCoordinator, directory: ClientDirectory) -> Self {
        AppState {
            reconciler: PendingReconciler::new(coordinator.clone()),
            acknowledger: Acknowledger::new(coordinator.database().clone()),
            coordinator,
            directory,
        }
    }
}

/// Builds the router with every route and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/submissions", post(submission_service::submit))
        .route("/api/submissions/pending", get(submission_service::list_pending))
        .route("/api/submissions/acknowledge", post(submission_service::acknowledge))
        .route("/api/submissions/next", get(submission_service::next_sequence))
        .route("/api/submissions/{id}", get(submission_service::get_submission))
        .route("/api/submissions/{id}/state", get(submission_service::get_state))
        .route("/api/submissions/{id}/errors", get(submission_service::get_errors))
        .route("/api/clients/lookup", get(client_service::lookup))
        .route("/health", get(health_service::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Unit Tests
// =============================================================================
