//! Org persistence operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use nisdesk_core::{OrgId, UserId};
use nisdesk_state::OrgRecord;

/// Insert a new org.
pub async fn insert(pool: &PgPool, record: &OrgRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orgs (id, created_by, name, description, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(record.id.as_uuid())
    .bind(record.created_by.as_uuid())
    .bind(&record.name)
    .bind(&record.description)
    .bind(record.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load all orgs for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<OrgRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrgRow>(
        "SELECT id, created_by, name, description, created_at FROM orgs ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(OrgRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct OrgRow {
    id: Uuid,
    created_by: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl OrgRow {
    fn into_record(self) -> OrgRecord {
        OrgRecord {
            id: OrgId::from_uuid(self.id),
            created_by: UserId::from_uuid(self.created_by),
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}
