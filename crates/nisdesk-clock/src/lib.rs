//! # nisdesk-clock — Deadline Engine
//!
//! Pure functions that classify an incident or obligation against its
//! statutory notification clock: pending (with time remaining), overdue
//! (with time elapsed), or filed (on time / late). There are no error
//! conditions anywhere in this crate — missing data degrades to the
//! `Unknown` state rather than failing.
//!
//! Two clock models coexist:
//!
//! - the **legacy single clock**: one fixed 72-hour deadline from the
//!   incident's aware-at timestamp, closed by `reported_at`;
//! - the **per-authority model**: one [`ObligationClock`] per authority,
//!   each with an independently computed deadline and its own filed-at.
//!
//! When any obligations exist they take precedence over the legacy fields;
//! see [`incident_summary_status`].

pub mod summary;
pub mod timer;

pub use summary::{incident_summary_status, next_deadline, ObligationClock};
pub use timer::{
    compute_deadline, humanize, reported_lag, timer_status, TimerState, TimerStatus,
    LEGACY_WINDOW_HOURS,
};
