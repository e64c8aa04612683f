//! # nisdesk-state — Domain Records & In-Memory Stores
//!
//! Owning records for every entity in the data model, a generic
//! [`Store`] for Uuid-keyed shared state, and the [`MembershipDirectory`]
//! — the structure that evaluates guard decisions and applies the
//! resulting mutation under a single write lock, so the "at least one
//! active owner" invariant cannot be broken by concurrent requests in
//! in-memory mode.
//!
//! Records carry their own transition methods (`IncidentRecord::
//! mark_reported`, `ObligationRecord::file`); invalid histories are not
//! representable through the public methods.

pub mod directory;
pub mod records;
pub mod store;

pub use directory::{DirectoryError, MembershipDirectory};
pub use records::{
    seed_default_obligations, ComplianceRecord, IncidentRecord, InviteRecord, InviteStatus,
    MembershipRecord, NoteRecord, ObligationRecord, OrgRecord, RecordStatus, SiteRecord,
};
pub use store::Store;
