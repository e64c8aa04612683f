//! # Membership Snapshot
//!
//! The guard-relevant view of a membership: who, where, which role, and
//! whether the membership is active. The guard engine receives two of
//! these (actor and target) plus an owner count; it never touches storage.

use serde::{Deserialize, Serialize};

use crate::id::{MembershipId, OrgId, UserId};
use crate::role::OrgRole;

/// A point-in-time snapshot of one membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    pub id: MembershipId,
    pub user_id: UserId,
    pub org_id: OrgId,
    pub role: OrgRole,
    pub is_active: bool,
}

impl MembershipSnapshot {
    /// Whether this membership can act as an organisation owner right now.
    pub fn is_acting_owner(&self) -> bool {
        self.role == OrgRole::Owner && self.is_active
    }

    /// Whether actor and target refer to the same user.
    pub fn same_user(&self, other: &MembershipSnapshot) -> bool {
        self.user_id == other.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(role: OrgRole, is_active: bool) -> MembershipSnapshot {
        MembershipSnapshot {
            id: MembershipId::new(),
            user_id: UserId::new(),
            org_id: OrgId::new(),
            role,
            is_active,
        }
    }

    #[test]
    fn acting_owner_requires_active() {
        assert!(snapshot(OrgRole::Owner, true).is_acting_owner());
        assert!(!snapshot(OrgRole::Owner, false).is_acting_owner());
        assert!(!snapshot(OrgRole::Admin, true).is_acting_owner());
    }

    #[test]
    fn same_user_compares_user_ids() {
        let a = snapshot(OrgRole::Owner, true);
        let mut b = snapshot(OrgRole::Member, true);
        assert!(!a.same_user(&b));
        b.user_id = a.user_id;
        assert!(a.same_user(&b));
    }
}
