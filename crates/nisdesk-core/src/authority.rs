//! # Regulatory Authority Catalogue
//!
//! The closed set of authorities a reporting obligation can be owed to,
//! each with its own statutory notification window. Every currently defined
//! authority uses the 72-hour window; the window lives on the authority so
//! a future authority with a different clock needs no engine change.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A regulator or stakeholder category that an incident obligation is owed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    /// The primary energy regulator (Ofgem in the original deployment).
    PrimaryRegulator,
    /// The data-protection authority (ICO).
    DataProtection,
    /// Affected customers.
    Customers,
    /// The organisation's insurer.
    Insurer,
}

impl Authority {
    /// All authorities, in default seeding order.
    pub fn all() -> &'static [Authority] {
        &[
            Authority::PrimaryRegulator,
            Authority::DataProtection,
            Authority::Customers,
            Authority::Insurer,
        ]
    }

    /// The canonical snake_case string name of this authority.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryRegulator => "primary_regulator",
            Self::DataProtection => "data_protection",
            Self::Customers => "customers",
            Self::Insurer => "insurer",
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PrimaryRegulator => "Primary regulator (Ofgem)",
            Self::DataProtection => "Data-protection authority (ICO)",
            Self::Customers => "Customers",
            Self::Insurer => "Insurer",
        }
    }

    /// The statutory notification window for this authority, counted from
    /// the moment the organisation became aware of the incident.
    pub fn notification_window(&self) -> Duration {
        // All four currently use the 72-hour clock.
        Duration::hours(72)
    }

    /// Parse an authority from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAuthority`] for anything outside
    /// the catalogue.
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary_regulator" => Ok(Self::PrimaryRegulator),
            "data_protection" => Ok(Self::DataProtection),
            "customers" => Ok(Self::Customers),
            "insurer" => Ok(Self::Insurer),
            other => Err(ValidationError::InvalidAuthority(other.to_string())),
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Authority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
