//! # alta-sync: Replication Layer for Alta Intake
//!
//! Mirrors submissions from the local buffer into the authoritative
//! PostgreSQL store, and exposes the primitives for reconciling whatever
//! could not be mirrored at submit time.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dual-Write Intake Buffer                         │
//! │                                                                         │
//! │   submit ──► SyncCoordinator                                           │
//! │                 │                                                       │
//! │                 ├─ 1. accept ──────────► alta-db (SQLite buffer)       │
//! │                 │                          submissions + lines          │
//! │                 │                          sync_state = PENDING         │
//! │                 │                                                       │
//! │                 ├─ 2. replicate ───────► RemoteStore (PostgreSQL)      │
//! │                 │     (bounded timeout)                                 │
//! │                 │                                                       │
//! │                 └─ 3. mark_synced  or  error ledger entry              │
//! │                                                                         │
//! │   PendingReconciler ── list_pending / retry_pending                    │
//! │   Acknowledger ─────── acknowledge (idempotent mark_synced)            │
//! │   RetryWorker ──────── optional background retries with backoff        │
//! │   ClientDirectory ──── RUT → client name, empty on any failure         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`config`] - Service configuration (TOML + env overrides)
//! - [`coordinator`] - Accept-then-replicate orchestration
//! - [`error`] - Replication and service error types
//! - [`lookup`] - Client name directory
//! - [`reconciler`] - Pending listing, retry cycles, acknowledgement
//! - [`remote`] - `RemoteStore` trait and PostgreSQL implementation
//! - [`worker`] - Background retry loop
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use alta_db::{Database, DbConfig};
//! use alta_sync::{AppConfig, PgRemoteStore, SyncCoordinator};
//!
//! let config = AppConfig::load(None)?;
//! let db = Database::new(DbConfig::new(&config.buffer.path)).await?;
//! let remote = PgRemoteStore::connect_lazy(&config.remote)?;
//!
//! let coordinator = SyncCoordinator::new(db, Arc::new(remote), config.remote.replicate_timeout());
//! let receipt = coordinator.submit(&submission).await?;
//! println!("local id {} → {:?}", receipt.local_id, receipt.sync_outcome);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod coordinator;
pub mod error;
pub mod lookup;
pub mod reconciler;
pub mod remote;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{
    AppConfig, BufferSettings, LoggingSettings, LookupSettings, RemoteSettings, RetrySettings,
    ServerSettings,
};
pub use coordinator::SyncCoordinator;
pub use error::{ReplicationError, SyncError, SyncResult};
pub use lookup::ClientDirectory;
pub use reconciler::{Acknowledger, PendingReconciler, RetryReport};
pub use remote::{PgRemoteStore, RemoteStore};
pub use worker::{RetryPolicy, RetryWorker, RetryWorkerHandle};
