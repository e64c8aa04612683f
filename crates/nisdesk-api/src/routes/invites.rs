//! # Invitations API
//!
//! Invitation lifecycle. Email delivery is out of scope; the token is
//! returned to the caller, who conveys it out of band.
//!
//! ## Endpoints
//!
//! - `POST /v1/orgs/:org_id/invites`                    — Create (admin+)
//! - `GET  /v1/orgs/:org_id/invites`                    — List (admin+)
//! - `POST /v1/invites/:token/accept`                   — Accept by token
//! - `POST /v1/orgs/:org_id/invites/:invite_id/cancel`  — Cancel (admin+)

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_core::{InviteId, OrgId, OrgRole};
use nisdesk_state::{InviteRecord, InviteStatus};

use crate::db;
use crate::error::AppError;
use crate::extract::ActingUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to invite someone into the organisation.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateInviteRequest {
    pub email: String,
    /// Role the invitee will receive; one of "member", "admin", "owner".
    pub role: String,
}

/// An invitation as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InviteResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub email: String,
    pub role: String,
    /// Redemption token, conveyed to the invitee out of band.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// "PENDING", "ACCEPTED", or "CANCELLED" (expiry reads as cancelled).
    pub status: String,
}

impl InviteResponse {
    fn from_record(record: &InviteRecord, now: DateTime<Utc>) -> Self {
        let status = match record.status(now) {
            InviteStatus::Pending => "PENDING",
            InviteStatus::Accepted => "ACCEPTED",
            InviteStatus::Cancelled => "CANCELLED",
        };
        Self {
            id: *record.id.as_uuid(),
            org_id: *record.org_id.as_uuid(),
            email: record.email.clone(),
            role: record.role.as_str().to_string(),
            token: record.token.clone(),
            expires_at: record.expires_at,
            status: status.to_string(),
        }
    }
}

/// Result of accepting an invitation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AcceptInviteResponse {
    pub org_id: Uuid,
    pub membership_id: Uuid,
    pub role: String,
    pub is_active: bool,
}

/// Invitation list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InviteListResponse {
    pub invites: Vec<InviteResponse>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/orgs/:org_id/invites",
            post(create_invite).get(list_invites),
        )
        .route("/v1/invites/:token/accept", post(accept_invite))
        .route(
            "/v1/orgs/:org_id/invites/:invite_id/cancel",
            post(cancel_invite),
        )
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/orgs/:org_id/invites — Create an invitation.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/invites",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    request_body = CreateInviteRequest,
    responses(
        (status = 201, description = "Invitation created", body = InviteResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorBody),
        (status = 422, description = "Bad email or role", body = crate::error::ErrorBody),
    ),
    tag = "invites"
)]
pub async fn create_invite(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
    Json(req): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<InviteResponse>), AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_admin(org_id, user)?;

    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(format!("invalid email: {}", req.email)));
    }
    let role = OrgRole::parse(&req.role)?;

    let invite = InviteRecord::new(org_id, email, role, Some(user));
    state.invites.insert(*invite.id.as_uuid(), invite.clone());
    tracing::info!(org = %org_id, invite = %invite.id, "invitation created");

    Ok((
        StatusCode::CREATED,
        Json(InviteResponse::from_record(&invite, Utc::now())),
    ))
}

/// GET /v1/orgs/:org_id/invites — List invitations.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/invites",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    responses(
        (status = 200, description = "Invitations", body = InviteListResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorBody),
    ),
    tag = "invites"
)]
pub async fn list_invites(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<InviteListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_admin(org_id, user)?;

    let now = Utc::now();
    let invites = state
        .invites
        .filter(|i| i.org_id == org_id)
        .iter()
        .map(|i| InviteResponse::from_record(i, now))
        .collect();
    Ok(Json(InviteListResponse { invites }))
}

/// POST /v1/invites/:token/accept — Redeem an invitation.
///
/// Idempotent on an existing membership: accepting reactivates and
/// re-roles it rather than creating a duplicate.
#[utoipa::path(
    post,
    path = "/v1/invites/{token}/accept",
    params(("token" = String, Path, description = "Invitation token")),
    responses(
        (status = 200, description = "Membership created or reactivated", body = AcceptInviteResponse),
        (status = 404, description = "Unknown token", body = crate::error::ErrorBody),
        (status = 409, description = "Invitation no longer pending", body = crate::error::ErrorBody),
    ),
    tag = "invites"
)]
pub async fn accept_invite(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(token): Path<String>,
) -> Result<Json<AcceptInviteResponse>, AppError> {
    let now = Utc::now();
    let invite = state
        .invites
        .filter(|i| i.token == token)
        .into_iter()
        .next()
        .ok_or_else(|| AppError::not_found("invitation not found"))?;

    if !invite.is_pending(now) {
        return Err(AppError::Conflict(
            "This invitation is no longer valid.".to_string(),
        ));
    }

    let membership = state.memberships.accept_invite(&invite, user);
    let _ = state.invites.try_update::<_, ()>(invite.id.as_uuid(), |i| {
        i.used_at = Some(now);
        Ok(())
    });

    if let Some(pool) = &state.db_pool {
        db::memberships::upsert(pool, &membership).await?;
    }
    tracing::info!(org = %invite.org_id, membership = %membership.id, "invitation accepted");

    Ok(Json(AcceptInviteResponse {
        org_id: *invite.org_id.as_uuid(),
        membership_id: *membership.id.as_uuid(),
        role: membership.role.as_str().to_string(),
        is_active: membership.is_active,
    }))
}

/// POST /v1/orgs/:org_id/invites/:invite_id/cancel — Cancel an invitation.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/invites/{invite_id}/cancel",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("invite_id" = Uuid, Path, description = "Invitation UUID"),
    ),
    responses(
        (status = 200, description = "Invitation cancelled", body = InviteResponse),
        (status = 403, description = "Admin access required", body = crate::error::ErrorBody),
        (status = 404, description = "Invitation not found", body = crate::error::ErrorBody),
        (status = 409, description = "Invitation no longer pending", body = crate::error::ErrorBody),
    ),
    tag = "invites"
)]
pub async fn cancel_invite(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, invite_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<InviteResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let invite_id = InviteId::from_uuid(invite_id);
    state.require_org(org_id)?;
    state.require_admin(org_id, user)?;

    let now = Utc::now();
    let result = state
        .invites
        .try_update(invite_id.as_uuid(), |invite| {
            if invite.org_id != org_id {
                return Err(AppError::not_found("invitation not found"));
            }
            if !invite.is_pending(now) {
                return Err(AppError::Conflict(
                    "This invitation is no longer valid.".to_string(),
                ));
            }
            invite.cancelled_at = Some(now);
            Ok(InviteResponse::from_record(invite, now))
        })
        .ok_or_else(|| AppError::not_found("invitation not found"))??;

    Ok(Json(result))
}
