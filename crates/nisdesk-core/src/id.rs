//! # Identifier Newtypes
//!
//! UUID-backed newtypes for every entity in the data model. Using distinct
//! types keeps an `IncidentId` from ever being passed where a
//! `MembershipId` is expected; all are always valid by construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

uuid_id!(
    /// A unique identifier for an organisation (tenant).
    OrgId
);
uuid_id!(
    /// A unique identifier for a user account.
    UserId
);
uuid_id!(
    /// A unique identifier for a membership (one user in one org).
    MembershipId
);
uuid_id!(
    /// A unique identifier for a site (operational location of an org).
    SiteId
);
uuid_id!(
    /// A unique identifier for a security incident.
    IncidentId
);
uuid_id!(
    /// A unique identifier for a per-authority reporting obligation.
    ObligationId
);
uuid_id!(
    /// A unique identifier for an organisation invitation.
    InviteId
);
uuid_id!(
    /// A unique identifier for a compliance record.
    RecordId
);
uuid_id!(
    /// A unique identifier for an incident note.
    NoteId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(OrgId::new(), OrgId::new());
        assert_ne!(IncidentId::new(), IncidentId::new());
    }

    #[test]
    fn id_from_uuid_roundtrip() {
        let raw = Uuid::new_v4();
        let id = MembershipId::from_uuid(raw);
        assert_eq!(*id.as_uuid(), raw);
    }

    #[test]
    fn id_display_is_uuid() {
        let id = ObligationId::from_uuid(Uuid::nil());
        assert_eq!(format!("{id}"), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn distinct_ids_hash_distinctly() {
        use std::collections::HashSet;
        let a = OrgId::new();
        let b = OrgId::new();
        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }
}
