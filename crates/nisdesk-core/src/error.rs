//! Validation errors for core domain types.

use thiserror::Error;

/// Errors raised when constructing core domain values from untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The role string is not one of `member`, `admin`, `owner`.
    #[error("invalid role: {0:?}")]
    InvalidRole(String),

    /// The authority string is not in the closed authority catalogue.
    #[error("invalid authority: {0:?}")]
    InvalidAuthority(String),

    /// The incident severity string is not recognised.
    #[error("invalid severity: {0:?}")]
    InvalidSeverity(String),

    /// The incident classification string is not recognised.
    #[error("invalid classification: {0:?}")]
    InvalidClassification(String),

    /// The incident status string is not recognised.
    #[error("invalid incident status: {0:?}")]
    InvalidIncidentStatus(String),

    /// An organisation name must be non-empty.
    #[error("organisation name must not be empty")]
    EmptyOrgName,
}
