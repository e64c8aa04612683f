//! # Membership Directory
//!
//! The authoritative in-memory view of memberships, keyed by organisation.
//! Guarded mutations (role changes, activation toggles) evaluate the rules
//! and apply the write under a single lock, so the owner count a rule saw
//! is the owner count the write lands against.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::debug;

use nisdesk_core::{MembershipId, OrgId, OrgRole, UserId};
use nisdesk_guard::{guard_role_change, guard_toggle_active, GuardError};

use crate::records::{InviteRecord, MembershipRecord};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("membership not found")]
    NotFound,

    #[error("acting user is not a member of this organisation")]
    ActorNotMember,

    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Shared membership directory. Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct MembershipDirectory {
    inner: Arc<RwLock<HashMap<MembershipId, MembershipRecord>>>,
}

impl MembershipDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: MembershipRecord) -> MembershipId {
        let id = record.id;
        self.inner.write().insert(id, record);
        id
    }

    pub fn get(&self, id: MembershipId) -> Option<MembershipRecord> {
        self.inner.read().get(&id).cloned()
    }

    /// The membership of `user_id` in `org_id`, if any.
    pub fn find(&self, org_id: OrgId, user_id: UserId) -> Option<MembershipRecord> {
        self.inner
            .read()
            .values()
            .find(|m| m.org_id == org_id && m.user_id == user_id)
            .cloned()
    }

    /// All memberships of an organisation, owners first, then by role
    /// descending.
    pub fn list_org(&self, org_id: OrgId) -> Vec<MembershipRecord> {
        let mut rows: Vec<MembershipRecord> = self
            .inner
            .read()
            .values()
            .filter(|m| m.org_id == org_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.role.cmp(&a.role).then(a.user_id.to_string().cmp(&b.user_id.to_string())));
        rows
    }

    /// All organisations a user is an active member of.
    pub fn list_user(&self, user_id: UserId) -> Vec<MembershipRecord> {
        self.inner
            .read()
            .values()
            .filter(|m| m.user_id == user_id && m.is_active)
            .cloned()
            .collect()
    }

    pub fn active_owner_count(&self, org_id: OrgId) -> usize {
        self.inner
            .read()
            .values()
            .filter(|m| m.org_id == org_id && m.is_active && m.role == OrgRole::Owner)
            .count()
    }

    /// Change a member's role, applying the guard rules.
    ///
    /// Evaluation and write happen under one write lock, so the owner
    /// count cannot drift between the check and the update.
    pub fn change_role(
        &self,
        actor_user: UserId,
        target_id: MembershipId,
        new_role: OrgRole,
    ) -> Result<MembershipRecord, DirectoryError> {
        let mut rows = self.inner.write();
        let target = rows.get(&target_id).ok_or(DirectoryError::NotFound)?.clone();
        let actor = rows
            .values()
            .find(|m| m.org_id == target.org_id && m.user_id == actor_user)
            .ok_or(DirectoryError::ActorNotMember)?
            .clone();
        let other_owners = rows
            .values()
            .filter(|m| {
                m.org_id == target.org_id
                    && m.id != target.id
                    && m.is_active
                    && m.role == OrgRole::Owner
            })
            .count();

        guard_role_change(&actor.snapshot(), &target.snapshot(), new_role, other_owners)?;

        let row = rows.get_mut(&target_id).ok_or(DirectoryError::NotFound)?;
        row.role = new_role;
        debug!(membership = %target_id, role = new_role.as_str(), "membership role changed");
        Ok(row.clone())
    }

    /// Activate or deactivate a member, applying the guard rules. Same
    /// locking discipline as [`Self::change_role`].
    pub fn set_active(
        &self,
        actor_user: UserId,
        target_id: MembershipId,
        new_active: bool,
    ) -> Result<MembershipRecord, DirectoryError> {
        let mut rows = self.inner.write();
        let target = rows.get(&target_id).ok_or(DirectoryError::NotFound)?.clone();
        let actor = rows
            .values()
            .find(|m| m.org_id == target.org_id && m.user_id == actor_user)
            .ok_or(DirectoryError::ActorNotMember)?
            .clone();
        let other_owners = rows
            .values()
            .filter(|m| {
                m.org_id == target.org_id
                    && m.id != target.id
                    && m.is_active
                    && m.role == OrgRole::Owner
            })
            .count();

        guard_toggle_active(&actor.snapshot(), &target.snapshot(), new_active, other_owners)?;

        let row = rows.get_mut(&target_id).ok_or(DirectoryError::NotFound)?;
        row.is_active = new_active;
        debug!(membership = %target_id, active = new_active, "membership activation changed");
        Ok(row.clone())
    }

    /// Redeem an invitation for a user: reactivate and re-role an existing
    /// membership, or create a fresh active one.
    pub fn accept_invite(&self, invite: &InviteRecord, user_id: UserId) -> MembershipRecord {
        let now = Utc::now();
        let mut rows = self.inner.write();
        if let Some(row) = rows
            .values_mut()
            .find(|m| m.org_id == invite.org_id && m.user_id == user_id)
        {
            row.is_active = true;
            row.role = invite.role;
            row.accepted_at = Some(now);
            return row.clone();
        }
        let mut record = MembershipRecord::new(user_id, invite.org_id, invite.role);
        record.invited_by = invite.invited_by;
        record.accepted_at = Some(now);
        rows.insert(record.id, record.clone());
        record
    }
}
