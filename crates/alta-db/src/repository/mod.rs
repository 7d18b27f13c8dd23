//! # Repository Module
//!
//! Repositories over the local buffer.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories                                         │
//! │                                                                         │
//! │  SyncCoordinator / PendingReconciler / Acknowledger                    │
//! │       │                                                                 │
//! │       │  db.submissions().accept(&submission)                          │
//! │       ▼                                                                 │
//! │  SubmissionRepository                                                  │
//! │  ├── accept(&self, submission)                                         │
//! │  ├── get(&self, local_id)                                              │
//! │  ├── list_unsynced(&self)                                              │
//! │  └── next_local_id(&self)                                              │
//! │  SyncStateRepository                                                   │
//! │  ├── mark_synced(&self, local_id)                                      │
//! │  └── get_state(&self, local_id)                                        │
//! │  ErrorLedgerRepository                                                 │
//! │  ├── append(&self, local_id, category, message)                        │
//! │  └── for_submission(&self, local_id)                                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`SubmissionRepository`](submission::SubmissionRepository) - Accept and read submissions
//! - [`SyncStateRepository`](sync_state::SyncStateRepository) - PENDING / SYNCED tracking
//! - [`ErrorLedgerRepository`](error_ledger::ErrorLedgerRepository) - Replication failures

pub mod error_ledger;
pub mod submission;
pub mod sync_state;
