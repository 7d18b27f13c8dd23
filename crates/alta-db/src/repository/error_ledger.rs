//! # Error Ledger Repository
//!
//! Append-only record of replication failures.
//!
//! Entries are never updated or deleted here; they exist for diagnosis and
//! manual replay. A failure that happened before local acceptance is
//! recorded with no submission id.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use alta_core::{ErrorCategory, ErrorLedgerEntry};

/// Repository for the replication error ledger.
#[derive(Debug, Clone)]
pub struct ErrorLedgerRepository {
    pool: SqlitePool,
}

impl ErrorLedgerRepository {
    /// Creates a new ErrorLedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ErrorLedgerRepository { pool }
    }

    /// Appends one failure.
    ///
    /// A `local_id` that was never accepted fails with
    /// [`DbError::UnknownSubmission`] and writes nothing.
    ///
    /// ## Example
    /// ```rust,ignore
    /// db.error_ledger()
    ///     .append(Some(local_id), ErrorCategory::Timeout, "timed out after 30s")
    ///     .await?;
    /// ```
    pub async fn append(
        &self,
        local_id: Option<i64>,
        category: ErrorCategory,
        message: &str,
    ) -> DbResult<ErrorLedgerEntry> {
        let entry = ErrorLedgerEntry {
            id: Uuid::new_v4().to_string(),
            local_id,
            category,
            message: message.to_string(),
            created_at: Utc::now(),
        };

        debug!(
            entry_id = %entry.id,
            local_id = ?entry.local_id,
            category = %entry.category,
            "Appending replication error"
        );

        sqlx::query(
            r#"
            INSERT INTO replication_errors (id, submission_id, category, message, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.id)
        .bind(entry.local_id)
        .bind(entry.category)
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::ledger(local_id, e))?;

        Ok(entry)
    }

    /// Entries recorded for one submission, oldest first.
    pub async fn for_submission(&self, local_id: i64) -> DbResult<Vec<ErrorLedgerEntry>> {
        let entries = sqlx::query_as(
            r#"
            SELECT
                id,
                submission_id AS local_id,
                category,
                message,
                created_at
            FROM replication_errors
            WHERE submission_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(local_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Total number of ledger entries.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM replication_errors")
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

    #[tokio::test]
    async fn test_append_and_read_back_in_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stored = db
            .submissions()
            .accept(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap();
        let ledger = db.error_ledger();

        ledger
            .append(Some(stored.local_id), ErrorCategory::Unreachable, "connection refused")
            .await
            .unwrap();
        ledger
            .append(Some(stored.local_id), ErrorCategory::Timeout, "timed out after 30s")
            .await
            .unwrap();

        let entries = ledger.for_submission(stored.local_id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, ErrorCategory::Unreachable);
        assert_eq!(entries[1].category, ErrorCategory::Timeout);
        assert_eq!(entries[1].local_id, Some(stored.local_id));
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[tokio::test]
    async fn test_entry_without_submission() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.error_ledger();

        let entry = ledger
            .append(None, ErrorCategory::Internal, "payload rejected before accept")
            .await
            .unwrap();

        assert!(entry.local_id.is_none());
        assert_eq!(ledger.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_submission_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .error_ledger()
            .append(Some(77), ErrorCategory::Rejected, "no such submission")
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::UnknownSubmission(77)));
        assert_eq!(db.error_ledger().count().await.unwrap(), 0);
    }
}
