//! # Sites API
//!
//! Operational locations of an organisation. Site details feed the
//! organisation/site block of the Annex E export.
//!
//! ## Endpoints
//!
//! - `POST /v1/orgs/:org_id/sites` — Create a site (admin+)
//! - `GET  /v1/orgs/:org_id/sites` — List sites

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_core::{OrgId, SiteId};
use nisdesk_state::SiteRecord;

use crate::error::AppError;
use crate::extract::ActingUser;
use crate::state::AppState;

/// Request to create a site. Everything past the name is optional and
/// defaults to empty; the Annex E builder substitutes defaults where it
/// must (timezone, country code).
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields, default)]
pub struct CreateSiteRequest {
    pub name: String,
    pub essential_service: String,
    pub network_role: String,
    pub eic_code: String,
    pub timezone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub postcode: String,
    pub country_code: String,
    pub contact_name: String,
    pub contact_role: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub ooh_phone: String,
    pub dpo_email: String,
}

/// A site as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub name: String,
    pub essential_service: String,
    pub network_role: String,
    pub eic_code: String,
    pub timezone: String,
    pub city: String,
    pub contact_name: String,
    pub contact_email: String,
}

impl SiteResponse {
    fn from_record(record: &SiteRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            org_id: *record.org_id.as_uuid(),
            name: record.name.clone(),
            essential_service: record.essential_service.clone(),
            network_role: record.network_role.clone(),
            eic_code: record.eic_code.clone(),
            timezone: record.timezone.clone(),
            city: record.city.clone(),
            contact_name: record.contact_name.clone(),
            contact_email: record.contact_email.clone(),
        }
    }
}

/// Site list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SiteListResponse {
    pub sites: Vec<SiteResponse>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/orgs/:org_id/sites", post(create_site).get(list_sites))
}

/// POST /v1/orgs/:org_id/sites — Create a site.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/sites",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    request_body = CreateSiteRequest,
    responses(
        (status = 201, description = "Site created", body = SiteResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorBody),
        (status = 422, description = "Blank name", body = crate::error::ErrorBody),
    ),
    tag = "sites"
)]
pub async fn create_site(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
    Json(req): Json<CreateSiteRequest>,
) -> Result<(StatusCode, Json<SiteResponse>), AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_admin(org_id, user)?;

    if req.name.trim().is_empty() {
        return Err(AppError::Validation("site name must not be blank".to_string()));
    }

    let site = SiteRecord {
        id: SiteId::new(),
        org_id,
        name: req.name.trim().to_string(),
        essential_service: req.essential_service,
        network_role: req.network_role,
        eic_code: req.eic_code,
        timezone: req.timezone,
        address_line1: req.address_line1,
        address_line2: req.address_line2,
        city: req.city,
        postcode: req.postcode,
        country_code: req.country_code,
        contact_name: req.contact_name,
        contact_role: req.contact_role,
        contact_email: req.contact_email,
        contact_phone: req.contact_phone,
        ooh_phone: req.ooh_phone,
        dpo_email: req.dpo_email,
    };
    state.sites.insert(*site.id.as_uuid(), site.clone());

    Ok((StatusCode::CREATED, Json(SiteResponse::from_record(&site))))
}

/// GET /v1/orgs/:org_id/sites — List sites.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/sites",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    responses(
        (status = 200, description = "Sites", body = SiteListResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
    ),
    tag = "sites"
)]
pub async fn list_sites(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<SiteListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    let sites = state
        .sites
        .filter(|s| s.org_id == org_id)
        .iter()
        .map(SiteResponse::from_record)
        .collect();
    Ok(Json(SiteListResponse { sites }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ACTING_USER_HEADER;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use http_body_util::BodyExt;
    use nisdesk_core::{OrgRole, UserId};
    use nisdesk_state::{MembershipRecord, OrgRecord};
    use tower::ServiceExt;

    #[tokio::test]
    async fn create_and_list_sites() {
        let state = AppState::new();
        let org = OrgId::new();
        let owner = UserId::new();
        state.orgs.insert(
            *org.as_uuid(),
            OrgRecord {
                id: org,
                created_by: owner,
                name: "Grid Co".into(),
                description: String::new(),
                created_at: Utc::now(),
            },
        );
        state
            .memberships
            .insert(MembershipRecord::new(owner, org, OrgRole::Owner));
        let app = router().with_state(state);

        let req = Request::builder()
            .method("POST")
            .uri(format!("/v1/orgs/{org}/sites"))
            .header(ACTING_USER_HEADER, owner.to_string())
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"name": "Substation North", "essential_service": "electricity distribution"}"#,
            ))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = Request::builder()
            .method("GET")
            .uri(format!("/v1/orgs/{org}/sites"))
            .header(ACTING_USER_HEADER, owner.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let list: SiteListResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(list.sites.len(), 1);
        assert_eq!(list.sites[0].name, "Substation North");
    }
}
