//! # nisdesk-core — Core Domain Types
//!
//! Shared vocabulary for the nisdesk stack: identifier newtypes, the
//! organisation role ordering, the regulatory authority catalogue, and the
//! incident enumerations. Everything here is plain data — the decision
//! logic lives in `nisdesk-guard` (membership rules) and `nisdesk-clock`
//! (deadline timers).
//!
//! ## Role ordering
//!
//! The role ordinal (`member < admin < owner`) is defined exactly once, in
//! [`OrgRole`]. Both the guard engine and any presentation code comparing
//! roles consume this enumeration; there is no duplicated ordinal map.

pub mod authority;
pub mod error;
pub mod id;
pub mod incident;
pub mod membership;
pub mod role;

pub use authority::Authority;
pub use error::ValidationError;
pub use id::{
    IncidentId, InviteId, MembershipId, NoteId, ObligationId, OrgId, RecordId, SiteId, UserId,
};
pub use incident::{Classification, IncidentStatus, Severity};
pub use membership::MembershipSnapshot;
pub use role::OrgRole;
