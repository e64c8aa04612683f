//! # nisdesk-annex — Annex E Incident Report Export
//!
//! Builds the Annex E (NIS incident reporting, Ofgem) payload for an
//! incident. The payload keeps the established key set — `contact_info`,
//! `org_details`, `incident_times`, and the descriptive blocks — and also
//! carries a richer `organisation` block with nested site details for
//! presentation-layer exports.
//!
//! The matching draft-07 JSON schema is available from
//! [`schema::json_schema`]; `contact_info`, `org_details`, and
//! `incident_times` are the only required sections.

pub mod report;
pub mod schema;

pub use report::{
    build_report, AnnexEReport, DescriptionOverrides, IncidentFacts, Reporter, ReportOverrides,
    ReportStage, ReportStatus, RootCause, RootCauseCategory, SiteFacts,
};
pub use schema::json_schema;
