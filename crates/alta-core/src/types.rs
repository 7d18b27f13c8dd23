//! # Domain Types
//!
//! Core domain types used throughout the intake service.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌─────────────────┐   ┌──────────────────┐     │
//! │  │ SubmissionHeader │   │  AddressLine    │   │   SyncState      │     │
//! │  │ ──────────────── │   │ ─────────────── │   │ ──────────────── │     │
//! │  │ client_id (RUT)  │ 1:N ordinal        │   │ status           │     │
//! │  │ intake_date      │──►│ address         │   │ updated_at       │     │
//! │  │ costs, currency  │   │ service         │   └──────────────────┘     │
//! │  │ term_months      │   │ capacity        │                            │
//! │  └──────────────────┘   └─────────────────┘   ┌──────────────────┐     │
//! │                                               │ ErrorLedgerEntry │     │
//! │  NewSubmission     = header + lines (input)   │ ──────────────── │     │
//! │  StoredSubmission  = local_id + created_at    │ category         │     │
//! │                      + header + lines         │ message          │     │
//! │  TrackedSubmission = stored + sync state      └──────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! The local buffer assigns `local_id` (strictly increasing, never reused).
//! The authoritative store assigns its own `remote_id`; the two are never
//! assumed equal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Submission Header
// =============================================================================

/// One service-request intake, as filled in on the form.
///
/// Business fields are immutable once accepted; only the sync state of the
/// submission changes afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SubmissionHeader {
    /// Intake date, `dd-mm-YYYY`.
    pub intake_date: String,

    /// Client tax id (RUT). Stored normalized: no separators, lowercase.
    pub client_id: String,

    pub client_name: String,

    /// SAM ticket number, if one exists yet.
    #[serde(default)]
    pub sam_number: String,

    pub business_name: String,

    pub account_executive: String,
    #[serde(default)]
    pub account_executive_phone: String,

    #[serde(default)]
    pub client_contact: String,
    #[serde(default)]
    pub client_contact_phone: String,

    #[serde(default)]
    pub technical_contact: String,
    #[serde(default)]
    pub technical_contact_phone: String,

    #[serde(default)]
    pub project_manager: String,
    #[serde(default)]
    pub project_manager_phone: String,

    pub project: String,

    /// PEP expense code.
    #[serde(default)]
    pub expense_code: String,

    pub provider: String,
    pub activity: String,
    pub address_type: String,

    #[serde(default)]
    pub other_costs_concept: String,
    #[serde(default)]
    pub other_costs_currency: String,
    #[serde(default)]
    pub other_costs_amount: f64,

    #[serde(default)]
    pub installation_currency: String,
    #[serde(default)]
    pub installation_cost: f64,

    pub rent_currency: String,
    #[serde(default)]
    pub rent_amount: f64,

    /// Contract term in months.
    pub term_months: i64,
}

// =============================================================================
// Address Line
// =============================================================================

/// A service address attached to exactly one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AddressLine {
    /// Position within the submission. Caller-supplied, unique per parent.
    pub ordinal: i64,
    pub address: String,
    pub service: String,
    pub capacity: String,
}

// =============================================================================
// Submissions
// =============================================================================

/// An incoming submission: header fields plus its address lines.
///
/// On the wire the header fields sit at the top level next to
/// `addressLines`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    #[serde(flatten)]
    pub header: SubmissionHeader,

    #[serde(default)]
    pub address_lines: Vec<AddressLine>,
}

/// A submission durably accepted by the local buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSubmission {
    pub local_id: i64,
    pub created_at: DateTime<Utc>,
    pub header: SubmissionHeader,
    /// Ordered by ordinal.
    pub address_lines: Vec<AddressLine>,
}

/// A stored submission together with its current sync state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedSubmission {
    #[serde(flatten)]
    pub submission: StoredSubmission,
    pub sync_state: SyncState,
}

// =============================================================================
// Sync Status
// =============================================================================

/// Whether a submission has been mirrored into the authoritative store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncStatus {
    /// Accepted locally, not yet confirmed remotely.
    #[default]
    Pending,
    /// Confirmed in the authoritative store.
    Synced,
}

impl SyncStatus {
    /// Returns the stored representation.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "PENDING",
            SyncStatus::Synced => "SYNCED",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync state of one submission.
///
/// `updated_at` is `None` only when no state row exists, which reads as
/// PENDING.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub status: SyncStatus,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Builds a state from the nullable columns of a LEFT JOIN.
    pub fn from_columns(status: Option<SyncStatus>, updated_at: Option<DateTime<Utc>>) -> Self {
        SyncState {
            status: status.unwrap_or_default(),
            updated_at,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.status == SyncStatus::Synced
    }
}

/// Sync state reported for a single local id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSyncState {
    pub local_id: i64,
    #[serde(flatten)]
    pub state: SyncState,
}

// =============================================================================
// Error Ledger
// =============================================================================

/// Category tag of a replication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Connection could not be established or was lost.
    Unreachable,
    /// The attempt exceeded the replicate timeout.
    Timeout,
    /// The remote store refused the write (constraint, permission).
    Rejected,
    /// Anything else.
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Unreachable => "unreachable",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Rejected => "rejected",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// An append-only record of one replication failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ErrorLedgerEntry {
    /// UUID v4.
    pub id: String,
    /// Submission the failure belongs to; `None` if it happened before
    /// local acceptance.
    pub local_id: Option<i64>,
    pub category: ErrorCategory,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Submit Result
// =============================================================================

/// Outcome of the remote mirroring attempt for an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum SyncOutcome {
    /// Mirrored; the authoritative store assigned `remote_id`.
    Synced {
        #[serde(rename = "remoteId")]
        remote_id: i64,
    },
    /// Left PENDING for a later retry.
    Pending { reason: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

/// Result of a submit: local acceptance and remote outcome, kept apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceipt {
    pub local_id: i64,
    pub sync_outcome: SyncOutcome,
}

/// Form pre-fill values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSequence {
    pub next_local_id: i64,
    /// Today, `dd-mm-YYYY`.
    pub intake_date: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
