//! Membership persistence, including the row-locking guarded mutations.
//!
//! `change_role` and `set_active` are the Postgres counterpart of
//! `MembershipDirectory`: one transaction locks every membership row of
//! the org with `SELECT ... FOR UPDATE`, recomputes the active-owner
//! count from the locked rows, evaluates the guard against that count,
//! and applies the update before commit. A concurrent mutation on the
//! same org blocks until this one commits, so both cannot demote "one of
//! two owners".

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;

use nisdesk_core::{MembershipId, OrgId, OrgRole, UserId};
use nisdesk_guard::{guard_role_change, guard_toggle_active};
use nisdesk_state::{DirectoryError, MembershipRecord};

use crate::error::AppError;

/// Failure of a guarded membership transaction: either the database or
/// the same policy decisions the in-memory directory makes.
#[derive(Debug, Error)]
pub enum TxnError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
    #[error(transparent)]
    Domain(#[from] DirectoryError),
}

impl From<TxnError> for AppError {
    fn from(err: TxnError) -> Self {
        match err {
            TxnError::Db(e) => e.into(),
            TxnError::Domain(e) => e.into(),
        }
    }
}

/// Insert or update a membership row.
pub async fn upsert(pool: &PgPool, record: &MembershipRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO memberships (id, user_id, org_id, role, is_active,
         invited_by, invited_at, accepted_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         ON CONFLICT (user_id, org_id) DO UPDATE SET
         role = EXCLUDED.role, is_active = EXCLUDED.is_active,
         accepted_at = EXCLUDED.accepted_at",
    )
    .bind(record.id.as_uuid())
    .bind(record.user_id.as_uuid())
    .bind(record.org_id.as_uuid())
    .bind(record.role.as_str())
    .bind(record.is_active)
    .bind(record.invited_by.map(|u| *u.as_uuid()))
    .bind(record.invited_at)
    .bind(record.accepted_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Change a member's role inside a row-locking transaction.
pub async fn change_role(
    pool: &PgPool,
    org_id: OrgId,
    target_id: MembershipId,
    actor_user: UserId,
    new_role: OrgRole,
) -> Result<MembershipRecord, TxnError> {
    let mut txn = pool.begin().await?;
    let rows = lock_org_rows(&mut txn, org_id).await?;

    let target = rows
        .iter()
        .find(|m| m.id == target_id)
        .ok_or(DirectoryError::NotFound)?
        .clone();
    let actor = rows
        .iter()
        .find(|m| m.user_id == actor_user)
        .ok_or(DirectoryError::ActorNotMember)?;
    let other_owners = other_active_owners(&rows, target_id);

    guard_role_change(&actor.snapshot(), &target.snapshot(), new_role, other_owners)
        .map_err(DirectoryError::Guard)?;

    sqlx::query("UPDATE memberships SET role = $1 WHERE id = $2")
        .bind(new_role.as_str())
        .bind(target_id.as_uuid())
        .execute(&mut *txn)
        .await?;
    txn.commit().await?;

    Ok(MembershipRecord {
        role: new_role,
        ..target
    })
}

/// Toggle a member's active flag inside a row-locking transaction.
pub async fn set_active(
    pool: &PgPool,
    org_id: OrgId,
    target_id: MembershipId,
    actor_user: UserId,
    new_active: bool,
) -> Result<MembershipRecord, TxnError> {
    let mut txn = pool.begin().await?;
    let rows = lock_org_rows(&mut txn, org_id).await?;

    let target = rows
        .iter()
        .find(|m| m.id == target_id)
        .ok_or(DirectoryError::NotFound)?
        .clone();
    let actor = rows
        .iter()
        .find(|m| m.user_id == actor_user)
        .ok_or(DirectoryError::ActorNotMember)?;
    let other_owners = other_active_owners(&rows, target_id);

    guard_toggle_active(&actor.snapshot(), &target.snapshot(), new_active, other_owners)
        .map_err(DirectoryError::Guard)?;

    sqlx::query("UPDATE memberships SET is_active = $1 WHERE id = $2")
        .bind(new_active)
        .bind(target_id.as_uuid())
        .execute(&mut *txn)
        .await?;
    txn.commit().await?;

    Ok(MembershipRecord {
        is_active: new_active,
        ..target
    })
}

/// Lock and fetch every membership row of the org.
async fn lock_org_rows(
    txn: &mut Transaction<'_, Postgres>,
    org_id: OrgId,
) -> Result<Vec<MembershipRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MembershipRow>(
        "SELECT id, user_id, org_id, role, is_active, invited_by, invited_at, accepted_at
         FROM memberships WHERE org_id = $1 FOR UPDATE",
    )
    .bind(org_id.as_uuid())
    .fetch_all(&mut **txn)
    .await?;
    Ok(rows.into_iter().map(MembershipRow::into_record).collect())
}

fn other_active_owners(rows: &[MembershipRecord], target_id: MembershipId) -> usize {
    rows.iter()
        .filter(|m| m.id != target_id && m.is_active && m.role == OrgRole::Owner)
        .count()
}

/// Load all memberships for startup hydration.
pub async fn load_all(pool: &PgPool) -> Result<Vec<MembershipRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, MembershipRow>(
        "SELECT id, user_id, org_id, role, is_active, invited_by, invited_at, accepted_at
         FROM memberships",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(MembershipRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    id: Uuid,
    user_id: Uuid,
    org_id: Uuid,
    role: String,
    is_active: bool,
    invited_by: Option<Uuid>,
    invited_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
}

impl MembershipRow {
    fn into_record(self) -> MembershipRecord {
        MembershipRecord {
            id: MembershipId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            org_id: OrgId::from_uuid(self.org_id),
            // The role column is CHECK-constrained to valid values.
            role: OrgRole::parse(&self.role).unwrap_or(OrgRole::Member),
            is_active: self.is_active,
            invited_by: self.invited_by.map(UserId::from_uuid),
            invited_at: self.invited_at,
            accepted_at: self.accepted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: OrgRole, active: bool) -> MembershipRecord {
        MembershipRecord {
            is_active: active,
            role,
            ..MembershipRecord::new(UserId::new(), OrgId::new(), role)
        }
    }

    #[test]
    fn other_active_owners_excludes_target_and_inactive() {
        let target = row(OrgRole::Owner, true);
        let rows = vec![
            target.clone(),
            row(OrgRole::Owner, true),
            row(OrgRole::Owner, false),
            row(OrgRole::Admin, true),
        ];
        assert_eq!(other_active_owners(&rows, target.id), 1);
    }
}
