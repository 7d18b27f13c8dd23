//! # Buffer Pool
//!
//! Opens the SQLite buffer file and hands out repositories over one shared
//! pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Database::new(DbConfig::new(path))                                    │
//! │       │  open / create file, WAL, foreign keys on                      │
//! │       │  apply embedded migrations                                     │
//! │       ▼                                                                 │
//! │  SqlitePool (max_connections)                                          │
//! │       │                                                                 │
//! │       ├── submit        ──► accept: one write transaction              │
//! │       ├── list pending  ──► one read transaction (single snapshot)     │
//! │       └── acknowledge   ──► one upsert statement                       │
//! │                                                                         │
//! │  Writers queue on SQLite's write lock for up to BUSY_TIMEOUT.          │
//! │  Readers never wait on writers (WAL).                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::error_ledger::ErrorLedgerRepository;
use crate::repository::submission::SubmissionRepository;
use crate::repository::sync_state::SyncStateRepository;

const IN_MEMORY: &str = ":memory:";

/// How long a writer waits for SQLite's write lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// How long a caller waits for a free pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Configuration
// =============================================================================

/// Where the buffer lives and how many connections share it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for tests.
    pub database_path: PathBuf,

    /// Pool size. Default: 5
    pub max_connections: u32,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// A private in-memory buffer. One connection, since every new
    /// connection to `:memory:` would see an empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(IN_MEMORY),
            max_connections: 1,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Buffer handle providing repository access.
///
/// Cheap to clone (wraps the pool). Passed explicitly to whatever needs the
/// buffer; there is no process-wide instance.
///
/// ```text
/// Database
///   ├── submissions()  → SubmissionRepository   (BufferStore)
///   ├── sync_state()   → SyncStateRepository    (SyncStateTracker)
///   └── error_ledger() → ErrorLedgerRepository  (ErrorLedger)
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the buffer and brings its schema up to date.
    ///
    /// Fails with [`DbError::Unavailable`] when the file cannot be opened and
    /// [`DbError::Migration`] when the schema cannot be applied. Either way
    /// the service must not start.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Opening local buffer"
        );

        let options = if config.database_path.as_os_str() == IN_MEMORY {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::Unavailable(e.to_string()))?
        } else {
            SqliteConnectOptions::new().filename(&config.database_path)
        };
        let options = options
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            // An in-memory buffer dies with its last connection
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| {
                DbError::Unavailable(format!("{}: {}", config.database_path.display(), e))
            })?;

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The buffer store proper.
    pub fn submissions(&self) -> SubmissionRepository {
        SubmissionRepository::new(self.pool.clone())
    }

    pub fn sync_state(&self) -> SyncStateRepository {
        SyncStateRepository::new(self.pool.clone())
    }

    pub fn error_ledger(&self) -> ErrorLedgerRepository {
        ErrorLedgerRepository::new(self.pool.clone())
    }

    /// Closes the pool. Later repository calls fail with
    /// [`DbError::Unavailable`].
    pub async fn close(&self) {
        info!("Closing local buffer");
        self.pool.close().await;
    }

    /// Checks if the buffer can execute queries.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unhealthy() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        assert!(!db.health_check().await);
    }

    #[tokio::test]
    async fn test_file_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buffer.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
        db.close().await;

        // Reopening reapplies nothing
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(db.health_check().await);
    }

    #[tokio::test]
    async fn test_unopenable_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("buffer.db");

        let err = Database::new(DbConfig::new(&path)).await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable(_)));
        assert!(err.to_string().contains("buffer.db"));
    }
}
