//! # Annex E Export API
//!
//! Serves the Annex E incident report as a downloadable JSON artifact,
//! assembled from the stored incident, its site, and the organisation.
//! The matching draft-07 schema is served as a static document.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;
use uuid::Uuid;

use nisdesk_annex::report::{Address, SiteContact};
use nisdesk_annex::{build_report, IncidentFacts, ReportOverrides, Reporter, SiteFacts};
use nisdesk_core::{IncidentId, OrgId};
use nisdesk_state::SiteRecord;

use crate::error::AppError;
use crate::extract::ActingUser;
use crate::routes::incidents::require_incident;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/orgs/:org_id/incidents/:incident_id/export/annex-e",
            get(export_annex_e),
        )
        .route("/v1/annex-e/schema", get(annex_e_schema))
}

fn site_facts(site: &SiteRecord) -> SiteFacts {
    SiteFacts {
        name: site.name.clone(),
        essential_service: site.essential_service.clone(),
        network_role: site.network_role.clone(),
        eic_code: site.eic_code.clone(),
        timezone: site.timezone.clone(),
        address: Address {
            line1: site.address_line1.clone(),
            line2: site.address_line2.clone(),
            city: site.city.clone(),
            postcode: site.postcode.clone(),
            country_code: site.country_code.clone(),
        },
        contact: SiteContact {
            name: site.contact_name.clone(),
            role: site.contact_role.clone(),
            email: site.contact_email.clone(),
            phone: site.contact_phone.clone(),
            ooh_phone: site.ooh_phone.clone(),
            dpo_email: site.dpo_email.clone(),
        },
    }
}

/// GET .../export/annex-e — The Annex E artifact.
///
/// Returned with an attachment disposition so browsers download rather
/// than render it.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/export/annex-e",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    responses(
        (status = 200, description = "Annex E JSON artifact"),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "exports"
)]
pub async fn export_annex_e(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    let org = state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    let incident = require_incident(&state, org_id, incident_id)?;

    let facts = IncidentFacts {
        id: Some(incident.id),
        title: incident.title.clone(),
        aware_at: incident.aware_at,
        report_notes: incident.report_notes.clone(),
        org_name: org.name.clone(),
    };
    let site = incident
        .site_id
        .and_then(|id| state.sites.get(id.as_uuid()))
        .map(|s| site_facts(&s));
    let report = build_report(
        &facts,
        site.as_ref(),
        &Reporter::default(),
        &ReportOverrides::default(),
    );

    let filename = format!("annex-e-{incident_id}.json");
    let headers = [(
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
    )];
    Ok((headers, Json(report)).into_response())
}

/// GET /v1/annex-e/schema — The draft-07 schema for the artifact.
#[utoipa::path(
    get,
    path = "/v1/annex-e/schema",
    responses((status = 200, description = "Annex E JSON schema")),
    tag = "exports"
)]
pub async fn annex_e_schema() -> Json<Value> {
    Json(nisdesk_annex::json_schema())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ACTING_USER_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use http_body_util::BodyExt;
    use nisdesk_core::{OrgRole, SiteId, UserId};
    use nisdesk_state::{IncidentRecord, MembershipRecord, OrgRecord};
    use tower::ServiceExt;

    async fn body_json(resp: axum::response::Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn seeded() -> (AppState, OrgId, UserId, IncidentId) {
        let state = AppState::new();
        let org = OrgId::new();
        let user = UserId::new();
        state.orgs.insert(
            *org.as_uuid(),
            OrgRecord {
                id: org,
                created_by: user,
                name: "Northern Grid".into(),
                description: String::new(),
                created_at: Utc::now(),
            },
        );
        state
            .memberships
            .insert(MembershipRecord::new(user, org, OrgRole::Member));

        let site = SiteRecord {
            id: SiteId::new(),
            org_id: org,
            name: "Leeds substation".into(),
            essential_service: "Electricity distribution".into(),
            contact_name: "Dana Hyde".into(),
            contact_email: "dana@example.com".into(),
            ..SiteRecord::default()
        };
        let site_id = site.id;
        state.sites.insert(*site_id.as_uuid(), site);

        let mut incident = IncidentRecord::new(org, "SCADA outage".into(), Some(Utc::now()));
        incident.site_id = Some(site_id);
        incident.report_notes = "Restored within 4 hours.".into();
        let incident_id = incident.id;
        state.incidents.insert(*incident_id.as_uuid(), incident);
        (state, org, user, incident_id)
    }

    #[tokio::test]
    async fn export_carries_required_sections_and_fallbacks() {
        let (state, org, user, incident) = seeded();
        let app = router().with_state(state);

        let req = Request::builder()
            .method("GET")
            .uri(format!(
                "/v1/orgs/{org}/incidents/{incident}/export/annex-e"
            ))
            .header(ACTING_USER_HEADER, user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment;"));

        let report = body_json(resp).await;
        // Schema-required sections.
        for key in ["contact_info", "org_details", "incident_times"] {
            assert!(report.get(key).is_some(), "missing {key}");
        }
        // Reporter fell back to the site contact.
        assert_eq!(report["contact_info"]["name"], "Dana Hyde");
        assert_eq!(report["org_details"]["organisation"], "Northern Grid");
        assert_eq!(
            report["org_details"]["essential_service"],
            "Electricity distribution"
        );
        assert_eq!(
            report["org_details"]["internal_incident_id"],
            incident.to_string()
        );
        assert_eq!(report["organisation"]["site"]["name"], "Leeds substation");
    }

    #[tokio::test]
    async fn export_without_site_still_valid() {
        let (state, org, user, _) = seeded();
        let bare = IncidentRecord::new(org, "Phishing wave".into(), None);
        let bare_id = bare.id;
        state.incidents.insert(*bare_id.as_uuid(), bare);
        let app = router().with_state(state);

        let req = Request::builder()
            .method("GET")
            .uri(format!("/v1/orgs/{org}/incidents/{bare_id}/export/annex-e"))
            .header(ACTING_USER_HEADER, user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let report = body_json(resp).await;
        assert_eq!(report["org_details"]["sites_assets"], serde_json::json!([]));
        assert_eq!(report["incident_times"]["detected_at"], Value::Null);
    }

    #[tokio::test]
    async fn schema_is_draft_07() {
        let app = router().with_state(AppState::new());
        let req = Request::builder()
            .method("GET")
            .uri("/v1/annex-e/schema")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let schema = body_json(resp).await;
        assert_eq!(
            schema["$schema"],
            "http://json-schema.org/draft-07/schema#"
        );
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "contact_info"));
    }
}
