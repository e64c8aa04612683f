//! # Organisation Roles
//!
//! The single ordered role enumeration consumed by the guard engine and by
//! any surface that needs to compare roles. `member < admin < owner`;
//! discriminants are the canonical ordinals, so `Ord` on the enum is the
//! role ordering.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A membership role within an organisation, strictly ordered
/// `Member < Admin < Owner`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OrgRole {
    /// Baseline role; can view and work within the org.
    Member = 1,
    /// Can manage content and send invitations.
    Admin = 2,
    /// Highest role; required to exist (active) at least once per org.
    Owner = 3,
}

impl OrgRole {
    /// All roles, in ascending order of privilege.
    pub fn all() -> &'static [OrgRole] {
        &[OrgRole::Member, OrgRole::Admin, OrgRole::Owner]
    }

    /// The canonical ordinal (`member` 1, `admin` 2, `owner` 3).
    pub fn ordinal(&self) -> u8 {
        *self as u8
    }

    /// The canonical lowercase string name of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Parse a role from its string form (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidRole`] for anything outside the
    /// closed role set.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(ValidationError::InvalidRole(other.to_string())),
        }
    }

    /// Whether this role may manage content and invitations (admin or owner).
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Owner)
    }
}

impl std::fmt::Display for OrgRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OrgRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
