//! # Buffer Error Types
//!
//! What can go wrong in the local buffer, named after the operation that
//! failed.
//!
//! ## Failure Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  accept ─── validate ──✗──► Validation      nothing written            │
//! │        └─── tx (header, lines, state) ──✗──► AcceptAborted  rolled back │
//! │                                                                         │
//! │  mark_synced ── upsert ──✗──► MarkFailed    state row unchanged        │
//! │             └── no such id ──► UnknownSubmission                       │
//! │                                                                         │
//! │  ledger append ── insert ──✗──► LedgerAppendFailed                      │
//! │               └── dangling id ──► UnknownSubmission                    │
//! │                                                                         │
//! │  any call on a closed / starved pool ──► Unavailable                    │
//! │  reads ──✗──► Read                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `SyncError` (alta-sync) routes `Validation` to 400, `UnknownSubmission`
//! to 404 and everything else to a 500 storage error.

use alta_core::ValidationErrors;
use thiserror::Error;

/// Local buffer errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Input rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The local id was never accepted.
    #[error("Submission not found: {0}")]
    UnknownSubmission(i64),

    /// The accept transaction did not commit. No header, line or state row
    /// from this call is visible.
    #[error("Submission not accepted: {0}")]
    AcceptAborted(String),

    /// The SYNCED upsert did not apply.
    #[error("Could not mark submission {local_id} synced: {reason}")]
    MarkFailed { local_id: i64, reason: String },

    /// A replication failure could not be recorded.
    #[error("Could not record replication error: {0}")]
    LedgerAppendFailed(String),

    /// The buffer file could not be opened, or the pool is closed or has no
    /// free connection.
    #[error("Buffer unavailable: {0}")]
    Unavailable(String),

    /// Schema migration failed at startup.
    #[error("Buffer migration failed: {0}")]
    Migration(String),

    /// A read query failed.
    #[error("Buffer read failed: {0}")]
    Read(String),
}

impl DbError {
    /// Returns true for failures of the store itself, as opposed to
    /// rejected input or a missing record.
    pub fn is_storage(&self) -> bool {
        !matches!(self, DbError::Validation(_) | DbError::UnknownSubmission(_))
    }

    /// Wraps a failure inside the accept transaction. A closed pool stays
    /// [`DbError::Unavailable`].
    pub(crate) fn accept(err: sqlx::Error) -> Self {
        match DbError::from(err) {
            DbError::Read(reason) => DbError::AcceptAborted(reason),
            other => other,
        }
    }

    /// Wraps a failure of the SYNCED upsert for `local_id`.
    pub(crate) fn mark(local_id: i64, err: sqlx::Error) -> Self {
        match DbError::from(err) {
            DbError::Read(reason) => DbError::MarkFailed { local_id, reason },
            other => other,
        }
    }

    /// Wraps a failure of a ledger insert. A dangling submission id becomes
    /// [`DbError::UnknownSubmission`].
    pub(crate) fn ledger(local_id: Option<i64>, err: sqlx::Error) -> Self {
        if let (Some(id), sqlx::Error::Database(db_err)) = (local_id, &err) {
            if db_err.message().contains("FOREIGN KEY constraint failed") {
                return DbError::UnknownSubmission(id);
            }
        }
        match DbError::from(err) {
            DbError::Read(reason) => DbError::LedgerAppendFailed(reason),
            other => other,
        }
    }
}

/// Pool-level failures become `Unavailable`; everything else is a failed
/// statement and is reported as `Read` until an operation wrapper names it.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => DbError::Unavailable("pool is closed".to_string()),
            sqlx::Error::PoolTimedOut => {
                DbError::Unavailable("no free connection in time".to_string())
            }
            sqlx::Error::Io(e) => DbError::Unavailable(e.to_string()),
            sqlx::Error::Database(db_err) => DbError::Read(db_err.message().to_string()),
            other => DbError::Read(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

/// Result type for buffer operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use alta_core::ValidationError;

    #[test]
    fn test_unknown_submission_message() {
        let err = DbError::UnknownSubmission(7);
        assert_eq!(err.to_string(), "Submission not found: 7");
        assert!(!err.is_storage());
    }

    #[test]
    fn test_validation_is_not_storage() {
        let err: DbError = ValidationErrors::from(ValidationError::required("project")).into();
        assert!(matches!(err, DbError::Validation(_)));
        assert!(!err.is_storage());
    }

    #[test]
    fn test_closed_pool_stays_unavailable_inside_operations() {
        let err = DbError::accept(sqlx::Error::PoolClosed);
        assert!(matches!(err, DbError::Unavailable(_)));
        assert!(err.is_storage());

        let err = DbError::mark(3, sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::Unavailable(_)));
    }

    #[test]
    fn test_operation_wrappers_name_the_failure() {
        let err = DbError::accept(sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::AcceptAborted(_)));

        let err = DbError::mark(3, sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::MarkFailed { local_id: 3, .. }));
        assert!(err.to_string().starts_with("Could not mark submission 3 synced"));

        let err = DbError::ledger(None, sqlx::Error::RowNotFound);
        assert!(matches!(err, DbError::LedgerAppendFailed(_)));
    }
}
