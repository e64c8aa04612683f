//! Incident enumerations: classification, severity, and lifecycle status.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The CIA classification of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Availability,
    Integrity,
    Confidentiality,
    Other,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Availability => "availability",
            Self::Integrity => "integrity",
            Self::Confidentiality => "confidentiality",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "availability" => Ok(Self::Availability),
            "integrity" => Ok(Self::Integrity),
            "confidentiality" => Ok(Self::Confidentiality),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::InvalidClassification(other.to_string())),
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::Other
    }
}

/// Incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(ValidationError::InvalidSeverity(other.to_string())),
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Medium
    }
}

/// Legacy single-clock incident lifecycle: an incident is open until its
/// regulatory report is submitted, after which it is reported.
///
/// Invariant (enforced by the incident record on every save): `reported_at`
/// is non-null if and only if the status is [`IncidentStatus::Reported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Reported,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Reported => "reported",
        }
    }

    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "reported" => Ok(Self::Reported),
            other => Err(ValidationError::InvalidIncidentStatus(other.to_string())),
        }
    }
}

impl Default for IncidentStatus {
    fn default() -> Self {
        Self::Open
    }
}
