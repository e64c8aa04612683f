//! Draft-07 JSON schema for the Annex E export payload.
//!
//! The schema stays compatible with the established export keys. The
//! convenience `organisation` block (nested site info) is included in
//! payloads but deliberately not required here.

use serde_json::{json, Value};

/// The Annex E JSON schema (draft-07).
pub fn json_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "Annex E – NIS Incident Reporting (Ofgem)",
        "type": "object",
        "required": ["contact_info", "org_details", "incident_times"],
        "properties": {
            "contact_info": {
                "type": "object",
                "required": ["name", "email"],
                "properties": {
                    "name": {"type": "string"},
                    "role": {"type": "string"},
                    "phone": {"type": "string"},
                    "email": {"type": "string", "format": "email"},
                },
            },
            "org_details": {
                "type": "object",
                "required": ["organisation", "essential_service"],
                "properties": {
                    "organisation": {"type": "string"},
                    "essential_service": {"type": "string"},
                    "sites_assets": {"type": "array", "items": {"type": "string"}},
                    "internal_incident_id": {"type": "string"},
                },
            },
            "incident_times": {
                "type": "object",
                "properties": {
                    "detected_at": {"type": ["string", "null"], "format": "date-time"},
                    "occurred_at": {"type": ["string", "null"], "format": "date-time"},
                    "reported_internally_at": {"type": ["string", "null"], "format": "date-time"},
                },
            },
            "type_of_incident": {"type": "string"},
            "status": {"type": "string", "enum": ["detected", "suspected", ""]},
            "stage": {"type": "string", "enum": ["ongoing", "ended", "ongoing_but_managed", ""]},
            "description": {
                "type": "object",
                "properties": {
                    "incident_types": {"type": "array", "items": {"type": "string"}},
                    "summary": {"type": "string"},
                    "discovery": {"type": "string"},
                    "duration": {"type": "string"},
                    "locations": {"type": "array", "items": {"type": "string"}},
                    "services_systems_affected": {"type": "array", "items": {"type": "string"}},
                    "impact_on_services_users": {"type": "string"},
                    "impact_on_safety": {"type": "string"},
                    "suspected_cause": {"type": "string"},
                    "cross_border_impact": {"type": "string"},
                    "other_relevant_info": {"type": "string"},
                },
            },
            "root_cause": {
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": [
                            "system_failure",
                            "natural_phenomena",
                            "human_error",
                            "malicious_actions",
                            "third_party_failure",
                            "other",
                            "",
                        ],
                    },
                    "other_text": {"type": "string"},
                },
            },
            "categorisation": {"type": "string"},
            "severity": {"type": "string", "enum": ["major", "high", "medium", "low", ""]},
            "mitigations": {"type": "string"},
            "who_else_informed": {"type": "array", "items": {"type": "string"}},
        },
    })
}
