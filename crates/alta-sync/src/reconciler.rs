//! # Reconciliation Primitives
//!
//! Read and write primitives for whatever process retries pending
//! submissions: the built-in [`RetryWorker`](crate::worker::RetryWorker) or
//! an external job driving the HTTP routes.
//!
//! ## Retry Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  list_pending()          newest first, consistent snapshot             │
//! │       │                                                                 │
//! │       ▼ reversed                                                        │
//! │  for each (oldest first):                                              │
//! │       coordinator.mirror()  ──► SYNCED → mark_synced                   │
//! │                             └─► PENDING → ledger entry                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RetryReport { attempted, synced, failed }                             │
//! │                                                                         │
//! │  acknowledge(local_id)   external verification → mark_synced           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info};

use alta_core::{SubmissionSyncState, TrackedSubmission};
use alta_db::Database;

use crate::coordinator::SyncCoordinator;
use crate::error::SyncResult;

// =============================================================================
// Pending Reconciler
// =============================================================================

/// Summary of one retry cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryReport {
    pub attempted: usize,
    pub synced: usize,
    pub failed: usize,
}

impl RetryReport {
    /// True when something was attempted and nothing went through.
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.synced == 0
    }
}

/// Lists and retries submissions that are still PENDING.
#[derive(Debug, Clone)]
pub struct PendingReconciler {
    coordinator: SyncCoordinator,
}

impl PendingReconciler {
    pub fn new(coordinator: SyncCoordinator) -> Self {
        PendingReconciler { coordinator }
    }

    /// Every PENDING submission with its lines, newest first.
    ///
    /// Pure read.
    pub async fn list_pending(&self) -> SyncResult<Vec<TrackedSubmission>> {
        let pending = self
            .coordinator
            .database()
            .submissions()
            .list_unsynced()
            .await?;

        debug!(count = pending.len(), "Listed pending submissions");
        Ok(pending)
    }

    /// One replicate attempt for each pending submission, oldest first.
    ///
    /// Individual replication failures are counted, not returned. Only a
    /// failure to read the pending list aborts the cycle.
    pub async fn retry_pending(&self) -> SyncResult<RetryReport> {
        let pending = self.list_pending().await?;
        let mut report = RetryReport::default();

        for tracked in pending.iter().rev() {
            report.attempted += 1;

            if self.coordinator.mirror(&tracked.submission).await.is_synced() {
                report.synced += 1;
            } else {
                report.failed += 1;
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                synced = report.synced,
                failed = report.failed,
                "Retry cycle finished"
            );
        }

        Ok(report)
    }
}

// =============================================================================
// Acknowledger
// =============================================================================

/// Records that a submission reached the authoritative store.
#[derive(Debug, Clone)]
pub struct Acknowledger {
    db: Database,
}

impl Acknowledger {
    pub fn new(db: Database) -> Self {
        Acknowledger { db }
    }

    /// Marks `local_id` SYNCED. Safe to repeat.
    ///
    /// ## Errors
    /// `NotFound` when the id was never accepted.
    pub async fn acknowledge(&self, local_id: i64) -> SyncResult<SubmissionSyncState> {
        let state = self.db.sync_state().mark_synced(local_id).await?;

        Ok(SubmissionSyncState { local_id, state })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::error::SyncError;
    use crate::testing::{Behavior, ScriptedRemote};
    use alta_core::validation::sample_submission;
    use alta_core::{SyncOutcome, SyncStatus};
    use alta_db::DbConfig;

    async fn setup(remote: Arc<ScriptedRemote>) -> (SyncCoordinator, PendingReconciler, Acknowledger) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let coordinator = SyncCoordinator::new(db.clone(), remote, Duration::from_millis(200));
        let reconciler = PendingReconciler::new(coordinator.clone());
        let acknowledger = Acknowledger::new(db);
        (coordinator, reconciler, acknowledger)
    }

    #[tokio::test]
    async fn test_outage_then_acknowledge() {
        let remote = Arc::new(ScriptedRemote::unreachable());
        let (coordinator, reconciler, acknowledger) = setup(remote.clone()).await;

        let receipt = coordinator
            .submit(&sample_submission("12.345.678-9", &[1, 2]))
            .await
            .unwrap();
        assert_eq!(receipt.local_id, 1);
        assert!(matches!(receipt.sync_outcome, SyncOutcome::Pending { .. }));

        let pending = reconciler.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        let entry = &pending[0];
        assert_eq!(entry.submission.local_id, 1);
        assert_eq!(entry.submission.header.client_id, "123456789");
        let ordinals: Vec<i64> = entry.submission.address_lines.iter().map(|l| l.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(entry.sync_state.status, SyncStatus::Pending);

        // Remote comes back; an external retry replicates on its own.
        remote.set(Behavior::Succeed);
        coordinator.replicate(&entry.submission).await.unwrap();

        let acked = acknowledger.acknowledge(1).await.unwrap();
        assert_eq!(acked.local_id, 1);
        assert!(acked.state.is_synced());

        assert!(reconciler.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_acknowledge_twice() {
        let remote = Arc::new(ScriptedRemote::unreachable());
        let (coordinator, _, acknowledger) = setup(remote).await;
        coordinator
            .submit(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap();

        let first = acknowledger.acknowledge(1).await.unwrap();
        let second = acknowledger.acknowledge(1).await.unwrap();

        assert!(second.state.is_synced());
        assert!(second.state.updated_at >= first.state.updated_at);
    }

    #[tokio::test]
    async fn test_acknowledge_unknown_id() {
        let remote = Arc::new(ScriptedRemote::new(Behavior::Succeed));
        let (_, _, acknowledger) = setup(remote).await;

        let err = acknowledger.acknowledge(42).await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejected_submission_leaves_pending_untouched() {
        let remote = Arc::new(ScriptedRemote::unreachable());
        let (coordinator, reconciler, _) = setup(remote).await;

        coordinator
            .submit(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap();
        let err = coordinator
            .submit(&sample_submission("98.765.432-1", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));

        let pending = reconciler.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].submission.local_id, 1);
    }

    #[tokio::test]
    async fn test_retry_pending_oldest_first() {
        let remote = Arc::new(ScriptedRemote::unreachable());
        let (coordinator, reconciler, _) = setup(remote.clone()).await;

        for rut in ["12.345.678-9", "11.111.111-1", "22.222.222-2"] {
            coordinator.submit(&sample_submission(rut, &[1])).await.unwrap();
        }

        let report = reconciler.retry_pending().await.unwrap();
        assert_eq!(report, RetryReport { attempted: 3, synced: 0, failed: 3 });
        assert!(report.all_failed());

        remote.set(Behavior::Succeed);
        let report = reconciler.retry_pending().await.unwrap();
        assert_eq!(report, RetryReport { attempted: 3, synced: 3, failed: 0 });

        let order: Vec<i64> = remote.replicated().iter().map(|s| s.local_id).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(reconciler.list_pending().await.unwrap().is_empty());

        // Nothing left to do.
        let report = reconciler.retry_pending().await.unwrap();
        assert_eq!(report, RetryReport::default());
        assert!(!report.all_failed());
    }
}
