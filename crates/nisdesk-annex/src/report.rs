//! Annex E payload assembly.
//!
//! Inputs are plain fact structs supplied by the caller (the API layer
//! reads them from storage); the builder resolves reporter and
//! essential-service fallbacks from the site, merges caller overrides over
//! sensible defaults, and formats timestamps at minute precision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nisdesk_core::IncidentId;

// ── Enumerations (schema-constrained) ────────────────────────────────

/// Detection confidence reported in Annex E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Detected,
    Suspected,
}

/// Incident stage reported in Annex E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStage {
    Ongoing,
    Ended,
    OngoingButManaged,
}

/// Root cause categories defined by the Annex E form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCauseCategory {
    SystemFailure,
    NaturalPhenomena,
    HumanError,
    MaliciousActions,
    ThirdPartyFailure,
    Other,
}

/// Annex E severity scale. Distinct from the internal incident severity —
/// the form uses `major` where the tracker uses `critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnexSeverity {
    Major,
    High,
    Medium,
    Low,
}

/// Serialize `Option<T>` as the enum string or `""` when unset, matching
/// the schema enums that include the empty string.
mod empty_when_none {
    use serde::ser::Serializer;
    use serde::Serialize;

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }
}

// ── Payload sections ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub role: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgDetails {
    pub organisation: String,
    pub essential_service: String,
    pub sites_assets: Vec<String>,
    pub internal_incident_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentTimes {
    pub detected_at: Option<String>,
    pub occurred_at: Option<String>,
    pub reported_internally_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionBlock {
    pub incident_types: Vec<String>,
    pub summary: String,
    pub discovery: String,
    /// Free text (e.g. "18h", "2 days").
    pub duration: String,
    pub locations: Vec<String>,
    pub services_systems_affected: Vec<String>,
    pub impact_on_services_users: String,
    pub impact_on_safety: String,
    pub suspected_cause: String,
    pub cross_border_impact: String,
    pub other_relevant_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCause {
    pub category: RootCauseCategory,
    pub other_text: String,
}

impl Default for RootCause {
    fn default() -> Self {
        Self {
            category: RootCauseCategory::Other,
            other_text: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub postcode: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteContact {
    pub name: String,
    pub role: String,
    pub email: String,
    pub phone: String,
    pub ooh_phone: String,
    pub dpo_email: String,
}

/// The convenience `organisation` block with nested site details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganisationBlock {
    pub name: String,
    pub site: SiteBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteBlock {
    pub name: String,
    pub essential_service: String,
    pub network_role: String,
    pub eic_code: String,
    pub timezone: String,
    pub address: Address,
    pub contact: SiteContact,
}

/// The complete Annex E payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnexEReport {
    pub contact_info: ContactInfo,
    pub org_details: OrgDetails,
    pub incident_times: IncidentTimes,
    pub type_of_incident: String,
    #[serde(serialize_with = "empty_when_none::serialize")]
    pub status: Option<ReportStatus>,
    #[serde(serialize_with = "empty_when_none::serialize")]
    pub stage: Option<ReportStage>,
    pub description: DescriptionBlock,
    pub root_cause: RootCause,
    pub categorisation: String,
    #[serde(serialize_with = "empty_when_none::serialize")]
    pub severity: Option<AnnexSeverity>,
    pub mitigations: String,
    pub who_else_informed: Vec<String>,
    pub organisation: OrganisationBlock,
}

// ── Builder inputs ───────────────────────────────────────────────────

/// The incident facts the builder needs.
#[derive(Debug, Clone, Default)]
pub struct IncidentFacts {
    pub id: Option<IncidentId>,
    pub title: String,
    pub aware_at: Option<DateTime<Utc>>,
    pub report_notes: String,
    pub org_name: String,
}

/// Site facts; every field may be empty when the incident has no site.
#[derive(Debug, Clone, Default)]
pub struct SiteFacts {
    pub name: String,
    pub essential_service: String,
    pub network_role: String,
    pub eic_code: String,
    pub timezone: String,
    pub address: Address,
    pub contact: SiteContact,
}

/// The person submitting the report. Blank name/email fall back to the
/// site contact.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    pub name: String,
    pub email: String,
    pub role: String,
    pub phone: String,
}

/// Field-level overrides merged over the description defaults.
#[derive(Debug, Clone, Default)]
pub struct DescriptionOverrides {
    pub incident_types: Option<Vec<String>>,
    pub summary: Option<String>,
    pub discovery: Option<String>,
    pub duration: Option<String>,
    pub locations: Option<Vec<String>>,
    pub services_systems_affected: Option<Vec<String>>,
    pub impact_on_services_users: Option<String>,
    pub impact_on_safety: Option<String>,
    pub suspected_cause: Option<String>,
    pub cross_border_impact: Option<String>,
    pub other_relevant_info: Option<String>,
}

/// Caller-supplied report fields. Anything left `None` falls back to a
/// default or a value inferred from the site.
#[derive(Debug, Clone, Default)]
pub struct ReportOverrides {
    pub essential_service: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub reported_internally_at: Option<DateTime<Utc>>,
    pub status: Option<ReportStatus>,
    pub stage: Option<ReportStage>,
    pub description: Option<DescriptionOverrides>,
    pub root_cause: Option<RootCause>,
    pub categorisation: Option<String>,
    pub severity: Option<AnnexSeverity>,
    pub mitigations: Option<String>,
    pub who_else_informed: Option<Vec<String>>,
}

// ── Builder ──────────────────────────────────────────────────────────

/// ISO 8601 at minute precision, or `None`.
fn fmt_minute(dt: Option<DateTime<Utc>>) -> Option<String> {
    dt.map(|t| t.format("%Y-%m-%dT%H:%M%:z").to_string())
}

fn first_non_blank(primary: &str, fallback: &str) -> String {
    if primary.trim().is_empty() {
        fallback.trim().to_string()
    } else {
        primary.trim().to_string()
    }
}

/// Build an Annex E payload from incident, site, and reporter facts plus
/// any caller overrides.
pub fn build_report(
    incident: &IncidentFacts,
    site: Option<&SiteFacts>,
    reporter: &Reporter,
    overrides: &ReportOverrides,
) -> AnnexEReport {
    let empty_site = SiteFacts::default();
    let site = site.unwrap_or(&empty_site);

    let sites_assets: Vec<String> = if site.name.is_empty() {
        Vec::new()
    } else {
        vec![site.name.clone()]
    };

    // Reporter fields fall back to the site contact when blank.
    let contact_info = ContactInfo {
        name: first_non_blank(&reporter.name, &site.contact.name),
        role: first_non_blank(&reporter.role, &site.contact.role),
        phone: first_non_blank(&reporter.phone, &site.contact.phone),
        email: first_non_blank(&reporter.email, &site.contact.email),
    };

    // Essential service: explicit override > site field > "".
    let essential_service = overrides
        .essential_service
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| site.essential_service.clone());

    let mut description = DescriptionBlock {
        summary: incident.title.trim().to_string(),
        locations: sites_assets.clone(),
        other_relevant_info: incident.report_notes.trim().to_string(),
        ..DescriptionBlock::default()
    };
    if let Some(over) = &overrides.description {
        merge_description(&mut description, over);
    }

    let organisation = OrganisationBlock {
        name: incident.org_name.clone(),
        site: SiteBlock {
            name: site.name.clone(),
            essential_service: site.essential_service.clone(),
            network_role: site.network_role.clone(),
            eic_code: site.eic_code.clone(),
            timezone: if site.timezone.is_empty() {
                "Europe/London".to_string()
            } else {
                site.timezone.clone()
            },
            address: {
                let mut address = site.address.clone();
                if address.country_code.is_empty() {
                    address.country_code = "GB".to_string();
                }
                address
            },
            contact: site.contact.clone(),
        },
    };

    AnnexEReport {
        contact_info,
        org_details: OrgDetails {
            organisation: incident.org_name.clone(),
            essential_service,
            sites_assets,
            internal_incident_id: incident
                .id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        },
        incident_times: IncidentTimes {
            detected_at: fmt_minute(incident.aware_at),
            occurred_at: fmt_minute(overrides.occurred_at),
            reported_internally_at: fmt_minute(overrides.reported_internally_at),
        },
        type_of_incident: String::new(),
        status: overrides.status,
        stage: overrides.stage,
        description,
        root_cause: overrides.root_cause.clone().unwrap_or_default(),
        categorisation: overrides.categorisation.clone().unwrap_or_default(),
        severity: overrides.severity,
        mitigations: overrides.mitigations.clone().unwrap_or_default(),
        who_else_informed: overrides.who_else_informed.clone().unwrap_or_default(),
        organisation,
    }
}

fn merge_description(base: &mut DescriptionBlock, over: &DescriptionOverrides) {
    macro_rules! merge {
        ($field:ident) => {
            if let Some(v) = &over.$field {
                base.$field = v.clone();
            }
        };
    }
    merge!(incident_types);
    merge!(summary);
    merge!(discovery);
    merge!(duration);
    merge!(locations);
    merge!(services_systems_affected);
    merge!(impact_on_services_users);
    merge!(impact_on_safety);
    merge!(suspected_cause);
    merge!(cross_border_impact);
    merge!(other_relevant_info);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn facts() -> IncidentFacts {
        IncidentFacts {
            id: Some(IncidentId::new()),
            title: "  Substation SCADA outage  ".to_string(),
            aware_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 45).unwrap()),
            report_notes: "Contained by 14:00.".to_string(),
            org_name: "Northern Grid Ltd".to_string(),
        }
    }

    fn site() -> SiteFacts {
        SiteFacts {
            name: "Leeds North".to_string(),
            essential_service: "Electricity distribution".to_string(),
            timezone: String::new(),
            contact: SiteContact {
                name: "Site Duty Manager".to_string(),
                email: "duty@northerngrid.example".to_string(),
                ..SiteContact::default()
            },
            ..SiteFacts::default()
        }
    }

    #[test]
    fn payload_has_schema_required_sections() {
        let report = build_report(
            &facts(),
            Some(&site()),
            &Reporter {
                name: "A. Analyst".to_string(),
                email: "analyst@northerngrid.example".to_string(),
                ..Reporter::default()
            },
            &ReportOverrides::default(),
        );
        let value = serde_json::to_value(&report).unwrap();
        for key in ["contact_info", "org_details", "incident_times"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["contact_info"]["name"], "A. Analyst");
        assert_eq!(value["org_details"]["organisation"], "Northern Grid Ltd");
    }

    #[test]
    fn reporter_falls_back_to_site_contact() {
        let report = build_report(
            &facts(),
            Some(&site()),
            &Reporter::default(),
            &ReportOverrides::default(),
        );
        assert_eq!(report.contact_info.name, "Site Duty Manager");
        assert_eq!(report.contact_info.email, "duty@northerngrid.example");
    }

    #[test]
    fn essential_service_override_beats_site() {
        let overrides = ReportOverrides {
            essential_service: Some("Gas transmission".to_string()),
            ..ReportOverrides::default()
        };
        let report = build_report(&facts(), Some(&site()), &Reporter::default(), &overrides);
        assert_eq!(report.org_details.essential_service, "Gas transmission");
    }

    #[test]
    fn detected_at_is_minute_precision() {
        let report = build_report(
            &facts(),
            None,
            &Reporter::default(),
            &ReportOverrides::default(),
        );
        // Seconds are truncated from display.
        assert_eq!(
            report.incident_times.detected_at.as_deref(),
            Some("2025-06-01T09:30+00:00")
        );
    }

    #[test]
    fn unset_status_serializes_as_empty_string() {
        let report = build_report(
            &facts(),
            None,
            &Reporter::default(),
            &ReportOverrides::default(),
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "");
        assert_eq!(value["stage"], "");
        assert_eq!(value["severity"], "");
        assert_eq!(value["root_cause"]["category"], "other");
    }

    #[test]
    fn description_defaults_from_incident_and_site() {
        let report = build_report(
            &facts(),
            Some(&site()),
            &Reporter::default(),
            &ReportOverrides::default(),
        );
        assert_eq!(report.description.summary, "Substation SCADA outage");
        assert_eq!(report.description.locations, vec!["Leeds North"]);
        assert_eq!(report.description.other_relevant_info, "Contained by 14:00.");
    }

    #[test]
    fn description_overrides_merge_over_defaults() {
        let overrides = ReportOverrides {
            description: Some(DescriptionOverrides {
                duration: Some("18h".to_string()),
                ..DescriptionOverrides::default()
            }),
            ..ReportOverrides::default()
        };
        let report = build_report(&facts(), Some(&site()), &Reporter::default(), &overrides);
        assert_eq!(report.description.duration, "18h");
        // Untouched defaults survive.
        assert_eq!(report.description.summary, "Substation SCADA outage");
    }

    #[test]
    fn site_defaults_fill_timezone_and_country() {
        let report = build_report(
            &facts(),
            Some(&site()),
            &Reporter::default(),
            &ReportOverrides::default(),
        );
        assert_eq!(report.organisation.site.timezone, "Europe/London");
        assert_eq!(report.organisation.site.address.country_code, "GB");
    }
}
