//! Obligation persistence operations.
//!
//! `filed_at` is one-way at this layer too: `mark_filed` only writes the
//! timestamp when the column is still null.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use nisdesk_core::{Authority, IncidentId, ObligationId};
use nisdesk_state::ObligationRecord;

/// Insert a new obligation.
pub async fn insert(pool: &PgPool, record: &ObligationRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO obligations (id, incident_id, authority, deadline_at, filed_at,
         submission_ref, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(record.id.as_uuid())
    .bind(record.incident_id.as_uuid())
    .bind(record.authority.as_str())
    .bind(record.deadline_at)
    .bind(record.filed_at)
    .bind(&record.submission_ref)
    .bind(record.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Record a filing. The COALESCE keeps an existing `filed_at`; the
/// submission reference is always refreshed.
pub async fn mark_filed(
    pool: &PgPool,
    id: ObligationId,
    filed_at: DateTime<Utc>,
    submission_ref: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE obligations SET filed_at = COALESCE(filed_at, $1), submission_ref = $2
         WHERE id = $3",
    )
    .bind(filed_at)
    .bind(submission_ref)
    .bind(id.as_uuid())
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all obligations for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ObligationRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ObligationRow>(
        "SELECT id, incident_id, authority, deadline_at, filed_at, submission_ref, created_at
         FROM obligations ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(ObligationRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct ObligationRow {
    id: Uuid,
    incident_id: Uuid,
    authority: String,
    deadline_at: Option<DateTime<Utc>>,
    filed_at: Option<DateTime<Utc>>,
    submission_ref: String,
    created_at: DateTime<Utc>,
}

impl ObligationRow {
    fn into_record(self) -> ObligationRecord {
        ObligationRecord {
            id: ObligationId::from_uuid(self.id),
            incident_id: IncidentId::from_uuid(self.incident_id),
            authority: Authority::parse(&self.authority).unwrap_or(Authority::PrimaryRegulator),
            deadline_at: self.deadline_at,
            filed_at: self.filed_at,
            submission_ref: self.submission_ref,
            created_at: self.created_at,
        }
    }
}
