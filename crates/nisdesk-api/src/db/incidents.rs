//! Incident persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use nisdesk_core::{Classification, IncidentId, IncidentStatus, OrgId, Severity, SiteId};
use nisdesk_state::IncidentRecord;

/// Insert a new incident.
pub async fn insert(pool: &PgPool, record: &IncidentRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO incidents (id, org_id, site_id, title, classification, severity,
         aware_at, status, reported_at, report_notes, report_reference, description,
         created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(record.id.as_uuid())
    .bind(record.org_id.as_uuid())
    .bind(record.site_id.map(|s| *s.as_uuid()))
    .bind(&record.title)
    .bind(record.classification.as_str())
    .bind(record.severity.as_str())
    .bind(record.aware_at)
    .bind(record.status.as_str())
    .bind(record.reported_at)
    .bind(&record.report_notes)
    .bind(&record.report_reference)
    .bind(&record.description)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist a reported incident's clock fields after `mark_reported`.
pub async fn mark_reported(pool: &PgPool, record: &IncidentRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE incidents SET status = $1, reported_at = $2, report_notes = $3,
         report_reference = $4, updated_at = $5 WHERE id = $6",
    )
    .bind(record.status.as_str())
    .bind(record.reported_at)
    .bind(&record.report_notes)
    .bind(&record.report_reference)
    .bind(record.updated_at)
    .bind(record.id.as_uuid())
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all incidents for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<IncidentRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, IncidentRow>(
        "SELECT id, org_id, site_id, title, classification, severity, aware_at,
         status, reported_at, report_notes, report_reference, description,
         created_at, updated_at
         FROM incidents ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(IncidentRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct IncidentRow {
    id: Uuid,
    org_id: Uuid,
    site_id: Option<Uuid>,
    title: String,
    classification: String,
    severity: String,
    aware_at: Option<DateTime<Utc>>,
    status: String,
    reported_at: Option<DateTime<Utc>>,
    report_notes: String,
    report_reference: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IncidentRow {
    fn into_record(self) -> IncidentRecord {
        IncidentRecord {
            id: IncidentId::from_uuid(self.id),
            org_id: OrgId::from_uuid(self.org_id),
            site_id: self.site_id.map(SiteId::from_uuid),
            title: self.title,
            classification: Classification::parse(&self.classification)
                .unwrap_or_default(),
            severity: Severity::parse(&self.severity).unwrap_or_default(),
            aware_at: self.aware_at,
            status: IncidentStatus::parse(&self.status).unwrap_or_default(),
            reported_at: self.reported_at,
            report_notes: self.report_notes,
            report_reference: self.report_reference,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
