//! # alta-core: Pure Domain Logic for Alta Intake
//!
//! Types and rules for service-request submissions, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Alta Intake Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    intake-api (axum)                            │   │
//! │  │    POST submit ──► GET pending ──► POST acknowledge            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    alta-sync (coordination)                     │   │
//! │  │    SyncCoordinator, PendingReconciler, Acknowledger, Remote    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ alta-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   error   │  │ validation│                  │   │
//! │  │   │ Submission│  │ Validation│  │  RUT, date│                  │   │
//! │  │   │ SyncState │  │  Errors   │  │  lines    │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    alta-db (Local Buffer)                       │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (SubmissionHeader, AddressLine, SyncState, etc.)
//! - [`error`] - Validation error types
//! - [`validation`] - Client-id normalization and submission rules
//!
//! ## Example Usage
//!
//! ```rust
//! use alta_core::validation::normalize_client_id;
//! use alta_core::SyncStatus;
//!
//! assert_eq!(normalize_client_id("12.345.678-9"), "123456789");
//! assert_eq!(SyncStatus::default(), SyncStatus::Pending);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{ValidationError, ValidationErrors};
pub use types::*;
pub use validation::{normalize_client_id, validate_submission};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum length of a normalized client id.
pub const CLIENT_ID_MIN_LEN: usize = 8;

/// Maximum length of a normalized client id.
pub const CLIENT_ID_MAX_LEN: usize = 10;

/// Wire format of intake dates.
pub const INTAKE_DATE_FORMAT: &str = "%d-%m-%Y";

/// Maximum address lines in one submission.
pub const MAX_ADDRESS_LINES: usize = 200;

/// Maximum length of any free-text field.
pub const MAX_TEXT_LEN: usize = 500;

/// Longest accepted contract term (50 years).
pub const MAX_TERM_MONTHS: i64 = 600;

/// Formats a date the way intake dates travel on the wire.
pub fn format_intake_date(date: chrono::NaiveDate) -> String {
    date.format(INTAKE_DATE_FORMAT).to_string()
}
