//! # API Route Modules
//!
//! Route modules for the nisdesk API surface:
//!
//! - `orgs` — organisation creation and retrieval; the creator becomes
//!   the first active owner.
//! - `members` — members panel plus the guarded role-change and
//!   activation-toggle mutations.
//! - `invites` — invitation lifecycle (create, accept by token, cancel).
//! - `sites` — operational locations; feed the Annex E export.
//! - `incidents` — incident intake, listing with summary clocks, the
//!   timer badge, and the legacy report stamp.
//! - `obligations` — per-authority reporting obligations: seeding and
//!   idempotent filing.
//! - `notes` — free-text incident notes.
//! - `records` — compliance record tracking (pending/complete/failed).
//! - `exports` — Annex E JSON artifact and its schema.

pub mod exports;
pub mod incidents;
pub mod invites;
pub mod members;
pub mod notes;
pub mod obligations;
pub mod orgs;
pub mod records;
pub mod sites;
