//! # alta-db: Local Buffer for Alta Intake
//!
//! Durable local storage for submissions, their sync state and the
//! replication error ledger. SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Alta Intake Data Flow                            │
//! │                                                                         │
//! │  SyncCoordinator::submit                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     alta-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Submission    │    │ 001_buffer_  │  │   │
//! │  │   │ SqlitePool    │◄───│ SyncState     │    │   schema.sql │  │   │
//! │  │   │               │    │ ErrorLedger   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use alta_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("alta.db")).await?;
//!
//! let stored = db.submissions().accept(&submission).await?;
//! db.sync_state().mark_synced(stored.local_id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::error_ledger::ErrorLedgerRepository;
pub use repository::submission::SubmissionRepository;
pub use repository::sync_state::SyncStateRepository;
