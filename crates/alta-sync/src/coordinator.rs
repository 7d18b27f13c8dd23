//! # Sync Coordinator
//!
//! Runs one submission through accept → replicate → record.
//!
//! ## Submit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    SyncCoordinator::submit                              │
//! │                                                                         │
//! │  1. accept (buffer, one transaction)                                   │
//! │     ├── ValidationErrors ─────────────────► Err(Validation)            │
//! │     └── storage failure ──────────────────► Err(Storage)               │
//! │           │ local_id  ← DURABILITY CHECKPOINT                          │
//! │           ▼                                                             │
//! │  2. replicate (remote, bounded by replicate_timeout)                   │
//! │     ├── Ok(remote_id) ──► 3a. mark_synced ──► SYNCED(remote_id)        │
//! │     └── Err(e) ─────────► 3b. ledger.append ──► PENDING(reason)        │
//! │                                                                         │
//! │  From step 2 on the call always returns Ok: the submission is          │
//! │  accepted no matter what the remote store does.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use alta_core::{NewSubmission, StoredSubmission, SubmitReceipt, SyncOutcome};
use alta_db::Database;

use crate::error::{ReplicationError, SyncResult};
use crate::remote::RemoteStore;

/// Orchestrates the dual write for incoming submissions.
///
/// Holds no mutable state; clones share the same buffer and remote store.
#[derive(Clone)]
pub struct SyncCoordinator {
    db: Database,
    remote: Arc<dyn RemoteStore>,
    replicate_timeout: Duration,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("replicate_timeout", &self.replicate_timeout)
            .finish_non_exhaustive()
    }
}

impl SyncCoordinator {
    pub fn new(db: Database, remote: Arc<dyn RemoteStore>, replicate_timeout: Duration) -> Self {
        SyncCoordinator {
            db,
            remote,
            replicate_timeout,
        }
    }

    /// Returns the buffer handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Returns the remote store.
    pub fn remote(&self) -> &Arc<dyn RemoteStore> {
        &self.remote
    }

    /// Accepts a submission locally, then tries to mirror it.
    ///
    /// ## Errors
    /// Only validation and local storage failures. A replication failure
    /// is reported inside the receipt as `PENDING`.
    pub async fn submit(&self, submission: &NewSubmission) -> SyncResult<SubmitReceipt> {
        let stored = match self.db.submissions().accept(submission).await {
            Ok(stored) => stored,
            Err(e) => {
                if e.is_storage() {
                    error!(error = %e, "Failed to buffer submission");
                }
                return Err(e.into());
            }
        };

        let sync_outcome = self.mirror(&stored).await;

        Ok(SubmitReceipt {
            local_id: stored.local_id,
            sync_outcome,
        })
    }

    /// One replicate attempt for an already-accepted submission, with the
    /// outcome recorded in the buffer.
    ///
    /// Used by `submit` and by retry paths.
    pub async fn mirror(&self, stored: &StoredSubmission) -> SyncOutcome {
        match self.replicate(stored).await {
            Ok(remote_id) => {
                info!(local_id = stored.local_id, remote_id, "Replication succeeded");

                // The remote write stands even if this fails; the next
                // reconciliation cycle will see it as PENDING.
                if let Err(e) = self.db.sync_state().mark_synced(stored.local_id).await {
                    error!(
                        local_id = stored.local_id,
                        remote_id,
                        error = %e,
                        "Failed to record sync state"
                    );
                }

                SyncOutcome::Synced { remote_id }
            }
            Err(e) => {
                warn!(
                    local_id = stored.local_id,
                    category = %e.category(),
                    error = %e,
                    "Replication failed, submission left pending"
                );

                if let Err(ledger_err) = self
                    .db
                    .error_ledger()
                    .append(Some(stored.local_id), e.category(), &e.to_string())
                    .await
                {
                    error!(
                        local_id = stored.local_id,
                        error = %ledger_err,
                        "Failed to record replication error"
                    );
                }

                SyncOutcome::Pending {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Calls the remote store with the bounded timeout applied.
    pub async fn replicate(&self, stored: &StoredSubmission) -> Result<i64, ReplicationError> {
        match tokio::time::timeout(self.replicate_timeout, self.remote.replicate(stored)).await {
            Ok(result) => result,
            Err(_) => Err(ReplicationError::Timeout(self.replicate_timeout)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Behavior, ScriptedRemote};
    use alta_core::validation::sample_submission;
    use alta_core::{ErrorCategory, SyncStatus};
    use alta_db::DbConfig;

    use crate::error::SyncError;

    async fn coordinator(remote: Arc<ScriptedRemote>) -> SyncCoordinator {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        SyncCoordinator::new(db, remote, Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_submit_synced() {
        let remote = Arc::new(ScriptedRemote::new(Behavior::Succeed));
        let coord = coordinator(remote.clone()).await;

        let receipt = coord
            .submit(&sample_submission("12.345.678-9", &[1, 2]))
            .await
            .unwrap();

        assert_eq!(receipt.local_id, 1);
        assert_eq!(receipt.sync_outcome, SyncOutcome::Synced { remote_id: 1000 });

        let state = coord.database().sync_state().get_state(1).await.unwrap();
        assert_eq!(state.status, SyncStatus::Synced);
        assert!(coord.database().submissions().list_unsynced().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remote_receives_normalized_client_id() {
        let remote = Arc::new(ScriptedRemote::new(Behavior::Succeed));
        let coord = coordinator(remote.clone()).await;

        coord
            .submit(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap();

        let sent = remote.replicated();
        let stored = coord.database().submissions().get(1).await.unwrap();
        assert_eq!(sent[0].header.client_id, "123456789");
        assert_eq!(sent[0].header.client_id, stored.header.client_id);
    }

    #[tokio::test]
    async fn test_submit_unreachable_stays_pending() {
        let remote = Arc::new(ScriptedRemote::unreachable());
        let coord = coordinator(remote.clone()).await;

        let receipt = coord
            .submit(&sample_submission("12.345.678-9", &[1, 2]))
            .await
            .unwrap();

        assert_eq!(receipt.local_id, 1);
        assert!(matches!(receipt.sync_outcome, SyncOutcome::Pending { .. }));

        let pending = coord.database().submissions().list_unsynced().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].submission.header.client_id, "123456789");

        let ledger = coord.database().error_ledger().for_submission(1).await.unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].category, ErrorCategory::Unreachable);
    }

    #[tokio::test]
    async fn test_hanging_remote_times_out() {
        let remote = Arc::new(ScriptedRemote::new(Behavior::Hang(Duration::from_secs(10))));
        let coord = coordinator(remote).await;

        let receipt = coord
            .submit(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap();

        match receipt.sync_outcome {
            SyncOutcome::Pending { reason } => assert!(reason.contains("timed out")),
            other => panic!("expected pending, got {:?}", other),
        }

        let ledger = coord.database().error_ledger().for_submission(1).await.unwrap();
        assert_eq!(ledger[0].category, ErrorCategory::Timeout);
    }

    #[tokio::test]
    async fn test_validation_failure_has_no_side_effects() {
        let remote = Arc::new(ScriptedRemote::new(Behavior::Succeed));
        let coord = coordinator(remote.clone()).await;

        let err = coord
            .submit(&sample_submission("12.345.678-9", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Validation(_)));
        assert_eq!(remote.calls(), 0);
        assert_eq!(coord.database().submissions().count().await.unwrap(), 0);
        assert_eq!(coord.database().error_ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_remote() {
        let remote = Arc::new(ScriptedRemote::new(Behavior::Succeed));
        let coord = coordinator(remote.clone()).await;
        coord.database().close().await;

        let err = coord
            .submit(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Storage(_)));
        assert_eq!(remote.calls(), 0);
    }
}
