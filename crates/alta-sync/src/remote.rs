//! # Remote Store
//!
//! The authoritative store that buffered submissions are mirrored into.
//!
//! ## Replicate Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    PgRemoteStore::replicate                             │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    INSERT INTO service_requests (...) RETURNING id   → remote_id       │
//! │    INSERT INTO service_request_addresses (...)       × N               │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any failure → transaction dropped → rolled back → ReplicationError    │
//! │  (no orphaned remote header)                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The remote id comes back from the header insert itself, so concurrent
//! writers on the same connection pool never read each other's identity.
//!
//! A retry after a crash between COMMIT and the local mark can produce a
//! second remote header for the same submission. Replication is
//! at-least-once.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info};

use alta_core::{AddressLine, StoredSubmission};

use crate::config::RemoteSettings;
use crate::error::ReplicationError;

// =============================================================================
// Trait
// =============================================================================

/// An authoritative store reached over an unreliable connection.
///
/// Implementations make one attempt per call and never retry internally.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Inserts the header and its lines; returns the store-assigned id.
    ///
    /// Either everything is written or nothing is.
    async fn replicate(&self, submission: &StoredSubmission) -> Result<i64, ReplicationError>;
}

// =============================================================================
// PostgreSQL Implementation
// =============================================================================

static REMOTE_MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// [`RemoteStore`] backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgRemoteStore {
    pool: PgPool,
}

impl PgRemoteStore {
    /// Creates the store without touching the network.
    ///
    /// Connections are opened on first use, so startup never depends on the
    /// remote store being reachable.
    pub fn connect_lazy(settings: &RemoteSettings) -> Result<Self, ReplicationError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.connect_timeout())
            .connect_lazy(&settings.database_url)
            .map_err(|e| ReplicationError::Internal(e.to_string()))?;

        Ok(PgRemoteStore { pool })
    }

    /// Applies `migrations/postgres` to the authoritative store.
    pub async fn run_migrations(&self) -> Result<(), ReplicationError> {
        REMOTE_MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| ReplicationError::Unreachable(e.to_string()))?;

        info!("Remote schema up to date");
        Ok(())
    }

    /// Closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RemoteStore for PgRemoteStore {
    async fn replicate(&self, submission: &StoredSubmission) -> Result<i64, ReplicationError> {
        let h = &submission.header;
        let mut tx = self.pool.begin().await?;

        let remote_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO service_requests (
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
                $1, $2, $3, $4, $5,
                $6, $7,
                $8, $9,
                $10, $11,
                $12, $13,
                $14, $15, $16, $17, $18,
                $19, $20, $21,
                $22, $23,
                $24, $25, $26
            )
            RETURNING id
            "#,
        )
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
        .fetch_one(&mut *tx)
        .await?;

        for line in &submission.address_lines {
            insert_line(&mut tx, remote_id, line).await?;
        }

        tx.commit().await?;

        debug!(
            local_id = submission.local_id,
            remote_id,
            lines = submission.address_lines.len(),
            "Remote insert committed"
        );

        Ok(remote_id)
    }
}

async fn insert_line(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    remote_id: i64,
    line: &AddressLine,
) -> Result<(), ReplicationError> {
    sqlx::query(
        r#"
        INSERT INTO service_request_addresses
            (service_request_id, ordinal, address, service, capacity)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(remote_id)
    .bind(line.ordinal)
    .bind(&line.address)
    .bind(&line.service)
    .bind(&line.capacity)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
