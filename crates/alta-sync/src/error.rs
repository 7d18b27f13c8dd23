//! # Sync Error Types
//!
//! Error types for submission, replication and configuration.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Caller errors  │  │  Local buffer   │  │     Replication         │ │
//! │  │                 │  │                 │  │  (never fails submit)   │ │
//! │  │  Validation     │  │  Storage        │  │  Unreachable            │ │
//! │  │  NotFound       │  │                 │  │  Timeout                │ │
//! │  │                 │  │                 │  │  Rejected / Internal    │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐                                                   │
//! │  │  Configuration  │                                                   │
//! │  │  InvalidConfig  │                                                   │
//! │  │  ConfigLoad     │                                                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use alta_core::{ErrorCategory, ValidationErrors};
use alta_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// Replication Error
// =============================================================================

/// A failed attempt to mirror a submission into the authoritative store.
///
/// Caught by the coordinator and recorded in the error ledger; only explicit
/// retry paths ever return it to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// Connection could not be established or was lost.
    #[error("Remote store unreachable: {0}")]
    Unreachable(String),

    /// The attempt exceeded the bounded replicate timeout.
    #[error("Replication timed out after {0:?}")]
    Timeout(Duration),

    /// The remote store refused the write (constraint, permission, credentials).
    #[error("Remote store rejected the write: {0}")]
    Rejected(String),

    /// Anything else.
    #[error("Replication failed: {0}")]
    Internal(String),
}

impl ReplicationError {
    /// Category tag written to the error ledger.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReplicationError::Unreachable(_) => ErrorCategory::Unreachable,
            ReplicationError::Timeout(_) => ErrorCategory::Timeout,
            ReplicationError::Rejected(_) => ErrorCategory::Rejected,
            ReplicationError::Internal(_) => ErrorCategory::Internal,
        }
    }
}

/// Convert sqlx errors from the remote connection.
///
/// ```text
/// Io / Tls / Pool* / Protocol → Unreachable
/// Database (server said no)   → Rejected
/// Other                       → Internal
/// ```
impl From<sqlx::Error> for ReplicationError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => ReplicationError::Unreachable(err.to_string()),

            sqlx::Error::Database(db_err) => ReplicationError::Rejected(db_err.message().to_string()),

            other => ReplicationError::Internal(other.to_string()),
        }
    }
}

// =============================================================================
// Sync Error
// =============================================================================

/// Service-level error taxonomy.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Caller Errors
    // =========================================================================
    /// Input rejected before anything was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Reference to a local id that was never accepted.
    #[error("{0}")]
    NotFound(String),

    // =========================================================================
    // Local Buffer Errors
    // =========================================================================
    /// The local buffer could not complete the operation.
    #[error("Storage error: {0}")]
    Storage(DbError),

    // =========================================================================
    // Replication Errors
    // =========================================================================
    /// Remote write failed (explicit retry paths only).
    #[error(transparent)]
    Replication(#[from] ReplicationError),

    /// Background task channel closed.
    #[error("Channel error: {0}")]
    ChannelError(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for SyncError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Validation(errors) => SyncError::Validation(errors),
            DbError::UnknownSubmission(_) => SyncError::NotFound(err.to_string()),
            other => SyncError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alta_core::ValidationError;

    #[test]
    fn test_db_error_routing() {
        let err: SyncError = DbError::UnknownSubmission(9).into();
        assert!(matches!(err, SyncError::NotFound(_)));
        assert_eq!(err.to_string(), "Submission not found: 9");

        let err: SyncError =
            DbError::Validation(ValidationError::required("project").into()).into();
        assert!(matches!(err, SyncError::Validation(_)));

        let err: SyncError = DbError::Unavailable("pool is closed".into()).into();
        assert!(matches!(err, SyncError::Storage(_)));

        let err: SyncError = DbError::MarkFailed {
            local_id: 4,
            reason: "database is locked".into(),
        }
        .into();
        assert!(matches!(err, SyncError::Storage(_)));
    }

    #[test]
    fn test_replication_categories() {
        assert_eq!(
            ReplicationError::Timeout(Duration::from_secs(30)).category(),
            ErrorCategory::Timeout
        );
        assert_eq!(
            ReplicationError::from(sqlx::Error::PoolTimedOut).category(),
            ErrorCategory::Unreachable
        );
        assert_eq!(
            ReplicationError::from(sqlx::Error::RowNotFound).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::from(ReplicationError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.to_string(), "Replication timed out after 30s");
    }
}
