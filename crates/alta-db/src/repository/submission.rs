//! # Submission Repository
//!
//! The local buffer store: durable acceptance of submissions.
//!
//! ## Accept Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       accept(submission)                                │
//! │                                                                         │
//! │  validate_submission() ──✗──► DbError::Validation (nothing written)    │
//! │       │ normalized copy                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │                                                                 │   │
//! │  │  1. INSERT INTO submissions (...)        → local_id            │   │
//! │  │  2. INSERT INTO address_lines (...)      × N                   │   │
//! │  │  3. INSERT INTO sync_state (PENDING)                           │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← all three or nothing; any failure ──► DbError::AcceptAborted │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reads
//! - [`SubmissionRepository::get`] - one submission by local id
//! - [`SubmissionRepository::list_unsynced`] - everything not yet SYNCED,
//!   newest first, read inside one transaction so headers and lines come
//!   from the same snapshot

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use alta_core::{
    validate_submission, AddressLine, NewSubmission, StoredSubmission, SubmissionHeader,
    SyncState, SyncStatus, TrackedSubmission,
};

// =============================================================================
// Row Types
// =============================================================================

const HEADER_COLUMNS: &str = r#"
    s.id, s.created_at,
    s.intake_date, s.client_id, s.client_name, s.sam_number, s.business_name,
    s.account_executive, s.account_executive_phone,
    s.client_contact, s.client_contact_phone,
    s.technical_contact, s.technical_contact_phone,
    s.project_manager, s.project_manager_phone,
    s.project, s.expense_code, s.provider, s.activity, s.address_type,
    s.other_costs_concept, s.other_costs_currency, s.other_costs_amount,
    s.installation_currency, s.installation_cost,
    s.rent_currency, s.rent_amount, s.term_months
"#;

#[derive(Debug, FromRow)]
struct SubmissionRow {
    id: i64,
    created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    header: SubmissionHeader,
}

#[derive(Debug, FromRow)]
struct TrackedRow {
    #[sqlx(flatten)]
    submission: SubmissionRow,
    status: Option<SyncStatus>,
    state_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    submission_id: i64,
    #[sqlx(flatten)]
    line: AddressLine,
}

impl SubmissionRow {
    fn into_stored(self, address_lines: Vec<AddressLine>) -> StoredSubmission {
        StoredSubmission {
            local_id: self.id,
            created_at: self.created_at,
            header: self.header,
            address_lines,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for buffered submissions.
#[derive(Debug, Clone)]
pub struct SubmissionRepository {
    pool: SqlitePool,
}

impl SubmissionRepository {
    /// Creates a new SubmissionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SubmissionRepository { pool }
    }

    /// Durably accepts a submission.
    ///
    /// Validates and normalizes first; on success the header, its lines and
    /// a PENDING sync state are committed together and the stored
    /// (normalized) copy is returned.
    ///
    /// ## Errors
    /// * [`DbError::Validation`] - input rejected, nothing written
    /// * [`DbError::AcceptAborted`] - the transaction rolled back
    /// * [`DbError::Unavailable`] - no connection to write with
    pub async fn accept(&self, submission: &NewSubmission) -> DbResult<StoredSubmission> {
        let normalized = validate_submission(submission)?;
        let created_at = Utc::now();

        let mut tx = self.pool.begin().await.map_err(DbError::accept)?;

        let local_id = insert_header(&mut tx, &normalized.header, created_at).await?;

        for line in &normalized.address_lines {
            sqlx::query(
                r#"
                INSERT INTO address_lines (submission_id, ordinal, address, service, capacity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(local_id)
            .bind(line.ordinal)
            .bind(&line.address)
            .bind(&line.service)
            .bind(&line.capacity)
            .execute(&mut *tx)
            .await
            .map_err(DbError::accept)?;
        }

        sqlx::query(
            r#"
            INSERT INTO sync_state (submission_id, status, updated_at)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(local_id)
        .bind(SyncStatus::Pending)
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::accept)?;

        tx.commit().await.map_err(DbError::accept)?;

        info!(
            local_id,
            client_id = %normalized.header.client_id,
            lines = normalized.address_lines.len(),
            "Submission accepted"
        );

        let mut address_lines = normalized.address_lines;
        address_lines.sort_by_key(|l| l.ordinal);

        Ok(StoredSubmission {
            local_id,
            created_at,
            header: normalized.header,
            address_lines,
        })
    }

    /// Gets a submission by local id, lines ordered by ordinal.
    pub async fn get(&self, local_id: i64) -> DbResult<StoredSubmission> {
        let row: Option<SubmissionRow> = sqlx::query_as(&format!(
            "SELECT {HEADER_COLUMNS} FROM submissions s WHERE s.id = ?1"
        ))
        .bind(local_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or(DbError::UnknownSubmission(local_id))?;

        let lines: Vec<AddressLine> = sqlx::query_as(
            r#"
            SELECT ordinal, address, service, capacity
            FROM address_lines
            WHERE submission_id = ?1
            ORDER BY ordinal ASC
            "#,
        )
        .bind(local_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(row.into_stored(lines))
    }

    /// Lists every submission whose state is not SYNCED, newest first.
    ///
    /// A submission without a state row counts as PENDING.
    pub async fn list_unsynced(&self) -> DbResult<Vec<TrackedSubmission>> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<TrackedRow> = sqlx::query_as(&format!(
            r#"
            SELECT {HEADER_COLUMNS},
                st.status AS status,
                st.updated_at AS state_updated_at
            FROM submissions s
            LEFT JOIN sync_state st ON st.submission_id = s.id
            WHERE COALESCE(st.status, 'PENDING') = 'PENDING'
            ORDER BY s.id DESC
            "#
        ))
        .fetch_all(&mut *tx)
        .await?;

        let line_rows: Vec<LineRow> = sqlx::query_as(
            r#"
            SELECT l.submission_id, l.ordinal, l.address, l.service, l.capacity
            FROM address_lines l
            LEFT JOIN sync_state st ON st.submission_id = l.submission_id
            WHERE COALESCE(st.status, 'PENDING') = 'PENDING'
            ORDER BY l.submission_id, l.ordinal ASC
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut lines_by_id: HashMap<i64, Vec<AddressLine>> = HashMap::new();
        for row in line_rows {
            lines_by_id.entry(row.submission_id).or_default().push(row.line);
        }

        debug!(count = rows.len(), "Listed unsynced submissions");

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = lines_by_id.remove(&row.submission.id).unwrap_or_default();
                TrackedSubmission {
                    sync_state: SyncState::from_columns(row.status, row.state_updated_at),
                    submission: row.submission.into_stored(lines),
                }
            })
            .collect())
    }

    /// Returns the local id the next accepted submission will receive.
    ///
    /// Advisory only: a concurrent accept may take it first.
    pub async fn next_local_id(&self) -> DbResult<i64> {
        let seq: Option<i64> =
            sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = 'submissions'")
                .fetch_optional(&self.pool)
                .await?;

        Ok(seq.unwrap_or(0) + 1)
    }

    /// Counts buffered submissions.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM submissions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn insert_header(
    tx: &mut Transaction<'_, Sqlite>,
    h: &SubmissionHeader,
    created_at: DateTime<Utc>,
) -> DbResult<i64> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO submissions (
            created_at,
            intake_date, client_id, client_name, sam_number, business_name,
            account_executive, account_executive_phone,
            client_contact, client_contact_phone,
            technical_contact, technical_contact_phone,
            project_manager, project_manager_phone,
            project, expense_code, provider, activity, address_type,
            other_costs_concept, other_costs_currency, other_costs_amount,
            installation_currency, installation_cost,
            rent_currency, rent_amount, term_months
        ) VALUES (
            ?1,
            ?2, ?3, ?4, ?5, ?6,
            ?7, ?8,
            ?9, ?10,
            ?11, ?12,
            ?13, ?14,
            ?15, ?16, ?17, ?18, ?19,
            ?20, ?21, ?22,
            ?23, ?24,
            ?25, ?26, ?27
        )
        RETURNING id
        "#,
    )
    .bind(created_at)
    .bind(&h.intake_date)
    .bind(&h.client_id)
    .bind(&h.client_name)
    .bind(&h.sam_number)
    .bind(&h.business_name)
    .bind(&h.account_executive)
    .bind(&h.account_executive_phone)
    .bind(&h.client_contact)
    .bind(&h.client_contact_phone)
    .bind(&h.technical_contact)
    .bind(&h.technical_contact_phone)
    .bind(&h.project_manager)
    .bind(&h.project_manager_phone)
    .bind(&h.project)
    .bind(&h.expense_code)
    .bind(&h.provider)
    .bind(&h.activity)
    .bind(&h.address_type)
    .bind(&h.other_costs_concept)
    .bind(&h.other_costs_currency)
    .bind(h.other_costs_amount)
    .bind(&h.installation_currency)
    .bind(h.installation_cost)
    .bind(&h.rent_currency)
    .bind(h.rent_amount)
    .bind(h.term_months)
    .fetch_one(&mut **tx)
    .await
    .map_err(DbError::accept)?;

    debug!(local_id = id, "Inserted submission header");

    Ok(id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use alta_core::validation::sample_submission;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_accept_then_get_round_trips_normalized() {
        let db = test_db().await;
        let repo = db.submissions();

        let input = sample_submission("12.345.678-9", &[1, 2]);
        let stored = repo.accept(&input).await.unwrap();
        assert_eq!(stored.local_id, 1);

        let fetched = repo.get(stored.local_id).await.unwrap();
        assert_eq!(fetched.header.client_id, "123456789");
        assert_eq!(fetched.header.project, input.header.project);
        assert_eq!(fetched.header.rent_amount, input.header.rent_amount);
        assert_eq!(fetched.address_lines, input.address_lines);
        assert_eq!(fetched.header, stored.header);
    }

    #[tokio::test]
    async fn test_local_ids_strictly_increase() {
        let db = test_db().await;
        let repo = db.submissions();

        assert_eq!(repo.next_local_id().await.unwrap(), 1);

        let a = repo.accept(&sample_submission("11111111-1", &[1])).await.unwrap();
        let b = repo.accept(&sample_submission("11111111-1", &[1])).await.unwrap();

        assert!(b.local_id > a.local_id);
        assert_eq!(repo.next_local_id().await.unwrap(), b.local_id + 1);
    }

    #[tokio::test]
    async fn test_zero_lines_never_stored() {
        let db = test_db().await;
        let repo = db.submissions();

        let err = repo
            .accept(&sample_submission("12.345.678-9", &[]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Validation(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.list_unsynced().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_line_insert_leaves_nothing() {
        let db = test_db().await;
        let repo = db.submissions();

        sqlx::query(
            r#"
            CREATE TRIGGER reject_third_line BEFORE INSERT ON address_lines
            WHEN NEW.ordinal = 3
            BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END
            "#,
        )
        .execute(db.pool())
        .await
        .unwrap();

        let err = repo
            .accept(&sample_submission("12.345.678-9", &[1, 2, 3]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::AcceptAborted(_)));
        assert!(err.is_storage());
        assert_eq!(repo.count().await.unwrap(), 0);
        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM address_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_closed_store_is_storage_error() {
        let db = test_db().await;
        db.close().await;

        let err = db
            .submissions()
            .accept(&sample_submission("12.345.678-9", &[1]))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Unavailable(_)));
        assert!(err.is_storage());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_accepts_on_shared_file_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("buffer.db")).max_connections(5))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let repo = db.submissions();
                tokio::spawn(async move {
                    repo.accept(&sample_submission("12.345.678-9", &[1, 2])).await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().local_id);
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=64).collect::<Vec<i64>>());

        let pending = db.submissions().list_unsynced().await.unwrap();
        assert_eq!(pending.len(), 64);
        assert!(pending.iter().all(|p| p.submission.address_lines.len() == 2));
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let db = test_db().await;

        let err = db.submissions().get(99).await.unwrap_err();
        assert!(matches!(err, DbError::UnknownSubmission(99)));
    }

    #[tokio::test]
    async fn test_list_unsynced_newest_first_lines_ordered() {
        let db = test_db().await;
        let repo = db.submissions();

        let first = repo.accept(&sample_submission("11111111-1", &[2, 1])).await.unwrap();
        let second = repo.accept(&sample_submission("22222222-2", &[1])).await.unwrap();

        let pending = repo.list_unsynced().await.unwrap();
        let ids: Vec<i64> = pending.iter().map(|p| p.submission.local_id).collect();
        assert_eq!(ids, vec![second.local_id, first.local_id]);

        let ordinals: Vec<i64> = pending[1]
            .submission
            .address_lines
            .iter()
            .map(|l| l.ordinal)
            .collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(pending[1].sync_state.status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_list_unsynced_excludes_synced() {
        let db = test_db().await;
        let repo = db.submissions();

        let a = repo.accept(&sample_submission("11111111-1", &[1])).await.unwrap();
        let b = repo.accept(&sample_submission("22222222-2", &[1])).await.unwrap();
        db.sync_state().mark_synced(a.local_id).await.unwrap();

        let pending = repo.list_unsynced().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].submission.local_id, b.local_id);
    }

    #[tokio::test]
    async fn test_missing_state_row_listed_as_pending() {
        let db = test_db().await;
        let repo = db.submissions();

        let a = repo.accept(&sample_submission("11111111-1", &[1])).await.unwrap();
        sqlx::query("DELETE FROM sync_state WHERE submission_id = ?1")
            .bind(a.local_id)
            .execute(db.pool())
            .await
            .unwrap();

        let pending = repo.list_unsynced().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].sync_state.status, SyncStatus::Pending);
        assert!(pending[0].sync_state.updated_at.is_none());
    }
}
