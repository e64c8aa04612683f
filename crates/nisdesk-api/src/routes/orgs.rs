//! # Organisation API
//!
//! ## Endpoints
//!
//! - `POST /v1/orgs`         — Create an organisation; the acting user
//!   becomes its first active owner
//! - `GET  /v1/orgs/:org_id` — Fetch an organisation (members only)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_core::{OrgId, OrgRole, ValidationError};
use nisdesk_state::{MembershipRecord, OrgRecord};

use crate::db;
use crate::error::AppError;
use crate::extract::ActingUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to create an organisation.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateOrgRequest {
    /// Organisation name. Must not be blank.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// An organisation as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrgResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    /// The acting user's role in this organisation.
    pub your_role: String,
}

fn to_response(org: &OrgRecord, membership: &MembershipRecord) -> OrgResponse {
    OrgResponse {
        id: *org.id.as_uuid(),
        name: org.name.clone(),
        description: org.description.clone(),
        created_by: *org.created_by.as_uuid(),
        created_at: org.created_at,
        your_role: membership.role.as_str().to_string(),
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orgs", post(create_org))
        .route("/v1/orgs/:org_id", get(get_org))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/orgs — Create an organisation.
#[utoipa::path(
    post,
    path = "/v1/orgs",
    request_body = CreateOrgRequest,
    responses(
        (status = 201, description = "Organisation created", body = OrgResponse),
        (status = 422, description = "Blank name", body = crate::error::ErrorBody),
    ),
    tag = "orgs"
)]
pub async fn create_org(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Json(req): Json<CreateOrgRequest>,
) -> Result<(StatusCode, Json<OrgResponse>), AppError> {
    if req.name.trim().is_empty() {
        return Err(ValidationError::EmptyOrgName.into());
    }

    let org = OrgRecord {
        id: OrgId::new(),
        created_by: user,
        name: req.name.trim().to_string(),
        description: req.description.trim().to_string(),
        created_at: Utc::now(),
    };
    let mut membership = MembershipRecord::new(user, org.id, OrgRole::Owner);
    membership.accepted_at = Some(org.created_at);

    if let Some(pool) = &state.db_pool {
        db::orgs::insert(pool, &org).await?;
        db::memberships::upsert(pool, &membership).await?;
    }

    state.orgs.insert(*org.id.as_uuid(), org.clone());
    state.memberships.insert(membership.clone());
    tracing::info!(org = %org.id, "organisation created");

    Ok((StatusCode::CREATED, Json(to_response(&org, &membership))))
}

/// GET /v1/orgs/:org_id — Fetch an organisation.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    responses(
        (status = 200, description = "Organisation details", body = OrgResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
        (status = 404, description = "Organisation not found", body = crate::error::ErrorBody),
    ),
    tag = "orgs"
)]
pub async fn get_org(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<OrgResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let org = state.require_org(org_id)?;
    let membership = state.require_member(org_id, user)?;
    Ok(Json(to_response(&org, &membership)))
}
