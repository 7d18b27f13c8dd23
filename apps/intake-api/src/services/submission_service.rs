//! # Submission Routes
//!
//! ```text
//! POST /api/submissions               submit          201 {localId, syncOutcome}
//! GET  /api/submissions/pending       list pending    200 [TrackedSubmission]
//! POST /api/submissions/acknowledge   acknowledge     200 {localId, status, updatedAt}
//! GET  /api/submissions/next          next sequence   200 {nextLocalId, intakeDate}
//! GET  /api/submissions/{id}          get             200 TrackedSubmission
//! GET  /api/submissions/{id}/state    sync state      200 {localId, status, updatedAt}
//! GET  /api/submissions/{id}/errors   error ledger    200 [ErrorLedgerEntry]
//! ```

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Local;
use serde::Deserialize;

use alta_core::{
    format_intake_date, ErrorLedgerEntry, NewSubmission, NextSequence, SubmissionSyncState,
    SubmitReceipt, TrackedSubmission,
};
use alta_sync::SyncError;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Body of `POST /api/submissions/acknowledge`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub local_id: i64,
}

/// Accepts a submission and tries to mirror it.
///
/// 201 whenever the buffer accepted it, whether or not the remote write went
/// through; `syncOutcome` says which.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewSubmission>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitReceipt>)> {
    let Json(submission) = payload?;
    let receipt = state.coordinator.submit(&submission).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}

pub async fn list_pending(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<TrackedSubmission>>> {
    Ok(Json(state.reconciler.list_pending().await?))
}

pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AcknowledgeRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionSyncState>> {
    let Json(request) = payload?;
    Ok(Json(state.acknowledger.acknowledge(request.local_id).await?))
}

/// Form pre-fill: the id the next accepted submission will get, and today.
pub async fn next_sequence(State(state): State<Arc<AppState>>) -> ApiResult<Json<NextSequence>> {
    let next_local_id = state
        .coordinator
        .database()
        .submissions()
        .next_local_id()
        .await
        .map_err(SyncError::from)?;

    Ok(Json(NextSequence {
        next_local_id,
        intake_date: format_intake_date(Local::now().date_naive()),
    }))
}

pub async fn get_submission(
    State(state): State<Arc<AppState>>,
    Path(local_id): Path<i64>,
) -> ApiResult<Json<TrackedSubmission>> {
    let db = state.coordinator.database();
    let submission = db.submissions().get(local_id).await.map_err(SyncError::from)?;
    let sync_state = db
        .sync_state()
        .get_state(local_id)
        .await
        .map_err(SyncError::from)?;

    Ok(Json(TrackedSubmission {
        submission,
        sync_state,
    }))
}

pub async fn get_state(
    State(state): State<Arc<AppState>>,
    Path(local_id): Path<i64>,
) -> ApiResult<Json<SubmissionSyncState>> {
    let sync_state = state
        .coordinator
        .database()
        .sync_state()
        .get_state(local_id)
        .await
        .map_err(SyncError::from)?;

    Ok(Json(SubmissionSyncState {
        local_id,
        state: sync_state,
    }))
}

/// Ledger entries for one submission, oldest first.
pub async fn get_errors(
    State(state): State<Arc<AppState>>,
    Path(local_id): Path<i64>,
) -> ApiResult<Json<Vec<ErrorLedgerEntry>>> {
    let db = state.coordinator.database();

    // 404 for ids that were never accepted, rather than an empty list.
    db.submissions().get(local_id).await.map_err(SyncError::from)?;

    let entries = db
        .error_ledger()
        .for_submission(local_id)
        .await
        .map_err(SyncError::from)?;

    Ok(Json(entries))
}
