//! # Sync State Repository
//!
//! Per-submission PENDING / SYNCED status.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   accept ──► PENDING ──── mark_synced ────► SYNCED ◄──┐                │
//! │             (or no row)                        │      │ mark_synced    │
//! │                                                └──────┘ (idempotent,   │
//! │                                                          bumps         │
//! │                                                          updated_at)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `mark_synced` is one statement, so concurrent calls for the same id are
//! serialized by SQLite's write lock.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use alta_core::{SyncState, SyncStatus};

/// Repository for sync state rows.
#[derive(Debug, Clone)]
pub struct SyncStateRepository {
    pool: SqlitePool,
}

impl SyncStateRepository {
    /// Creates a new SyncStateRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SyncStateRepository { pool }
    }

    /// Marks a submission SYNCED.
    ///
    /// Idempotent: re-marking replaces the row in place with a fresh
    /// timestamp. Fails with [`DbError::UnknownSubmission`] when the local id
    /// was never accepted and [`DbError::MarkFailed`] when the upsert itself
    /// does not apply.
    pub async fn mark_synced(&self, local_id: i64) -> DbResult<SyncState> {
        let now = Utc::now();

        // The SELECT yields no row for an unknown id, so nothing is written.
        let result = sqlx::query(
            r#"
            INSERT INTO sync_state (submission_id, status, updated_at)
            SELECT id, ?2, ?3 FROM submissions WHERE id = ?1
            ON CONFLICT (submission_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(local_id)
        .bind(SyncStatus::Synced)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::mark(local_id, e))?;

        if result.rows_affected() == 0 {
            return Err(DbError::UnknownSubmission(local_id));
        }

        info!(local_id, "Marked synced");

        Ok(SyncState {
            status: SyncStatus::Synced,
            updated_at: Some(now),
        })
    }

    /// Gets the sync state of a submission.
    ///
    /// PENDING when no state row exists.
    pub async fn get_state(&self, local_id: i64) -> DbResult<SyncState> {
        let row: Option<(i64, Option<SyncStatus>, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            SELECT s.id, st.status, st.updated_at
            FROM submissions s
            LEFT JOIN sync_state st ON st.submission_id = s.id
            WHERE s.id = ?1
            "#,
        )
        .bind(local_id)
        .fetch_optional(&self.pool)
        .await?;

        let (_, status, updated_at) =
            row.ok_or(DbError::UnknownSubmission(local_id))?;

        debug!(local_id, ?status, "Read sync state");

        Ok(SyncState::from_columns(status, updated_at))
    }

    /// Counts submissions not yet SYNCED.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM submissions s
            LEFT JOIN sync_state st ON st.submission_id = s.id
            WHERE COALESCE(st.status, 'PENDING') = 'PENDING'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use alta_core::validation::sample_submission;

    async fn accepted() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stored = db
            .submissions()
            .accept(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap();
        (db, stored.local_id)
    }

    #[tokio::test]
    async fn test_new_submission_is_pending() {
        let (db, id) = accepted().await;

        let state = db.sync_state().get_state(id).await.unwrap();
        assert_eq!(state.status, SyncStatus::Pending);
        assert!(state.updated_at.is_some());
        assert_eq!(db.sync_state().count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_synced_is_idempotent() {
        let (db, id) = accepted().await;
        let repo = db.sync_state();

        let first = repo.mark_synced(id).await.unwrap();
        let second = repo.mark_synced(id).await.unwrap();

        assert!(first.is_synced());
        assert!(second.is_synced());
        assert!(second.updated_at >= first.updated_at);

        let state = repo.get_state(id).await.unwrap();
        assert!(state.is_synced());
        assert_eq!(repo.count_pending().await.unwrap(), 0);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_state")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_mark_synced_creates_missing_row() {
        let (db, id) = accepted().await;
        sqlx::query("DELETE FROM sync_state")
            .execute(db.pool())
            .await
            .unwrap();

        assert!(!db.sync_state().get_state(id).await.unwrap().is_synced());
        assert!(db.sync_state().mark_synced(id).await.unwrap().is_synced());
        assert!(db.sync_state().get_state(id).await.unwrap().is_synced());
    }

    #[tokio::test]
    async fn test_failed_upsert_is_mark_failed() {
        let (db, id) = accepted().await;
        sqlx::query(
            r#"
            CREATE TRIGGER freeze_state BEFORE UPDATE ON sync_state
            BEGIN SELECT RAISE(ABORT, 'database is locked'); END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = db.sync_state().mark_synced(id).await.unwrap_err();

        assert!(matches!(err, DbError::MarkFailed { local_id, .. } if local_id == id));
        assert!(err.is_storage());
        assert!(!db.sync_state().get_state(id).await.unwrap().is_synced());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_marks_on_shared_file_all_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("buffer.db")).max_connections(5))
            .await
            .unwrap();
        let id = db
            .submissions()
            .accept(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap()
            .local_id;

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let repo = db.sync_state();
                tokio::spawn(async move { repo.mark_synced(id).await })
            })
            .collect();

        for task in tasks {
            let state = task.await.unwrap().unwrap();
            assert_eq!(state.status, SyncStatus::Synced);
        }

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sync_state")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert!(db.sync_state().get_state(id).await.unwrap().is_synced());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (db, _) = accepted().await;
        let repo = db.sync_state();

        assert!(matches!(
            repo.mark_synced(404).await,
            Err(DbError::UnknownSubmission(404))
        ));
        assert!(matches!(
            repo.get_state(404).await,
            Err(DbError::UnknownSubmission(404))
        ));
    }
}
