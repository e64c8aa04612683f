//! Compliance record persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use nisdesk_core::{OrgId, RecordId};
use nisdesk_state::{ComplianceRecord, RecordStatus};

/// Insert a new compliance record.
pub async fn insert(pool: &PgPool, record: &ComplianceRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO compliance_records (id, org_id, requirement, status, last_updated)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(record.id.as_uuid())
    .bind(record.org_id.as_uuid())
    .bind(&record.requirement)
    .bind(record.status.as_str())
    .bind(record.last_updated)
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist a status change.
pub async fn update_status(
    pool: &PgPool,
    id: RecordId,
    status: RecordStatus,
    last_updated: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE compliance_records SET status = $1, last_updated = $2 WHERE id = $3")
        .bind(status.as_str())
        .bind(last_updated)
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a compliance record.
pub async fn delete(pool: &PgPool, id: RecordId) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM compliance_records WHERE id = $1")
        .bind(id.as_uuid())
        .execute(pool)
        .await?;
    Ok(())
}

/// Load all compliance records for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<ComplianceRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RecordRow>(
        "SELECT id, org_id, requirement, status, last_updated
         FROM compliance_records ORDER BY last_updated",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(RecordRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct RecordRow {
    id: Uuid,
    org_id: Uuid,
    requirement: String,
    status: String,
    last_updated: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self) -> ComplianceRecord {
        ComplianceRecord {
            id: RecordId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            requirement: self.requirement,
            status: RecordStatus::parse(&self.status).unwrap_or(RecordStatus::Pending),
            last_updated: self.last_updated,
        }
    }
}
