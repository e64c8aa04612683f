//! # Members API
//!
//! The members panel plus the two guarded mutations. Role changes and
//! activation toggles go through the guard engine; with a database
//! configured they run in the row-locking transaction, otherwise under
//! the directory's write lock. Either way the owner count the guard saw
//! is the one the write lands against.
//!
//! ## Endpoints
//!
//! - `GET  /v1/orgs/:org_id/members`                         — Members panel
//! - `POST /v1/orgs/:org_id/members/:membership_id/role`     — Change a role
//! - `POST /v1/orgs/:org_id/members/:membership_id/active`   — Toggle activation

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_core::{MembershipId, OrgId, OrgRole, UserId};
use nisdesk_state::MembershipRecord;

use crate::db;
use crate::error::AppError;
use crate::extract::ActingUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// One member of the organisation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub is_active: bool,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl MemberResponse {
    fn from_record(record: &MembershipRecord) -> Self {
        Self {
            membership_id: *record.id.as_uuid(),
            user_id: *record.user_id.as_uuid(),
            role: record.role.as_str().to_string(),
            is_active: record.is_active,
            accepted_at: record.accepted_at,
        }
    }
}

/// Members panel payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberListResponse {
    pub members: Vec<MemberResponse>,
    /// Number of active owners; never drops below 1.
    pub active_owner_count: usize,
}

/// Request to change a member's role.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ChangeRoleRequest {
    /// One of "member", "admin", "owner".
    pub role: String,
}

/// Request to activate or deactivate a member.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SetActiveRequest {
    pub active: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orgs/:org_id/members", get(list_members))
        .route(
            "/v1/orgs/:org_id/members/:membership_id/role",
            post(change_role),
        )
        .route(
            "/v1/orgs/:org_id/members/:membership_id/active",
            post(set_active),
        )
}

/// The target membership, checked to belong to the org in the path.
fn require_target(
    state: &AppState,
    org_id: OrgId,
    membership_id: MembershipId,
) -> Result<MembershipRecord, AppError> {
    state
        .memberships
        .get(membership_id)
        .filter(|m| m.org_id == org_id)
        .ok_or_else(|| AppError::not_found(format!("membership {membership_id} not found")))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/orgs/:org_id/members — Members panel data.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/members",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    responses(
        (status = 200, description = "Organisation members", body = MemberListResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
    ),
    tag = "members"
)]
pub async fn list_members(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<MemberListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    let members: Vec<MemberResponse> = state
        .memberships
        .list_org(org_id)
        .iter()
        .map(MemberResponse::from_record)
        .collect();
    let active_owner_count = state.memberships.active_owner_count(org_id);
    Ok(Json(MemberListResponse {
        members,
        active_owner_count,
    }))
}

/// POST /v1/orgs/:org_id/members/:membership_id/role — Guarded role change.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/members/{membership_id}/role",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("membership_id" = Uuid, Path, description = "Target membership UUID"),
    ),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = MemberResponse),
        (status = 403, description = "Actor is not an active owner", body = crate::error::ErrorBody),
        (status = 404, description = "Membership not found", body = crate::error::ErrorBody),
        (status = 409, description = "Self-lowering or last-owner rule", body = crate::error::ErrorBody),
        (status = 422, description = "Unknown role", body = crate::error::ErrorBody),
    ),
    tag = "members"
)]
pub async fn change_role(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ChangeRoleRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let membership_id = MembershipId::from_uuid(membership_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_target(&state, org_id, membership_id)?;
    let new_role = OrgRole::parse(&req.role)?;

    let updated = apply_role_change(&state, org_id, membership_id, user, new_role).await?;
    Ok(Json(MemberResponse::from_record(&updated)))
}

/// POST /v1/orgs/:org_id/members/:membership_id/active — Guarded toggle.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/members/{membership_id}/active",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("membership_id" = Uuid, Path, description = "Target membership UUID"),
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Activation changed", body = MemberResponse),
        (status = 403, description = "Actor is not an active owner", body = crate::error::ErrorBody),
        (status = 404, description = "Membership not found", body = crate::error::ErrorBody),
        (status = 409, description = "Self-deactivation or last-owner rule", body = crate::error::ErrorBody),
    ),
    tag = "members"
)]
pub async fn set_active(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let membership_id = MembershipId::from_uuid(membership_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_target(&state, org_id, membership_id)?;

    let updated = apply_set_active(&state, org_id, membership_id, user, req.active).await?;
    Ok(Json(MemberResponse::from_record(&updated)))
}

async fn apply_role_change(
    state: &AppState,
    org_id: OrgId,
    membership_id: MembershipId,
    actor: UserId,
    new_role: OrgRole,
) -> Result<MembershipRecord, AppError> {
    let updated = if let Some(pool) = &state.db_pool {
        let record =
            db::memberships::change_role(pool, org_id, membership_id, actor, new_role).await?;
        // Mirror the committed row into the in-memory directory.
        state.memberships.insert(record.clone());
        record
    } else {
        state.memberships.change_role(actor, membership_id, new_role)?
    };
    tracing::info!(org = %org_id, membership = %membership_id, role = new_role.as_str(),
        "member role changed");
    Ok(updated)
}

async fn apply_set_active(
    state: &AppState,
    org_id: OrgId,
    membership_id: MembershipId,
    actor: UserId,
    new_active: bool,
) -> Result<MembershipRecord, AppError> {
    let updated = if let Some(pool) = &state.db_pool {
        let record =
            db::memberships::set_active(pool, org_id, membership_id, actor, new_active).await?;
        state.memberships.insert(record.clone());
        record
    } else {
        state.memberships.set_active(actor, membership_id, new_active)?
    };
    tracing::info!(org = %org_id, membership = %membership_id, active = new_active,
        "member activation changed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorBody;
    use crate::extract::ACTING_USER_HEADER;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    struct Fixture {
        state: AppState,
        app: Router,
        org: OrgId,
        owner_user: UserId,
        owner_membership: MembershipId,
    }

    fn fixture() -> Fixture {
        let state = AppState::new();
        let org = OrgId::new();
        let owner_user = UserId::new();
        state.orgs.insert(
            *org.as_uuid(),
            nisdesk_state::OrgRecord {
                id: org,
                created_by: owner_user,
                name: "Grid Co".into(),
                description: String::new(),
                created_at: Utc::now(),
            },
        );
        let owner_membership = state
            .memberships
            .insert(MembershipRecord::new(owner_user, org, OrgRole::Owner));
        let app = router().with_state(state.clone());
        Fixture {
            state,
            app,
            org,
            owner_user,
            owner_membership,
        }
    }

    fn add_member(f: &Fixture, role: OrgRole) -> (UserId, MembershipId) {
        let user = UserId::new();
        let id = f
            .state
            .memberships
            .insert(MembershipRecord::new(user, f.org, role));
        (user, id)
    }

    fn post_role(f: &Fixture, actor: UserId, target: MembershipId, role: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!(
                "/v1/orgs/{}/members/{}/role",
                f.org,
                target.as_uuid()
            ))
            .header(ACTING_USER_HEADER, actor.to_string())
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"role": "{role}"}}"#)))
            .unwrap()
    }

    fn post_active(f: &Fixture, actor: UserId, target: MembershipId, active: bool) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(format!(
                "/v1/orgs/{}/members/{}/active",
                f.org,
                target.as_uuid()
            ))
            .header(ACTING_USER_HEADER, actor.to_string())
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"active": {active}}}"#)))
            .unwrap()
    }

    #[tokio::test]
    async fn owner_promotes_member_to_admin() {
        let f = fixture();
        let (_, member) = add_member(&f, OrgRole::Member);
        let resp = f
            .app
            .clone()
            .oneshot(post_role(&f, f.owner_user, member, "admin"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: MemberResponse = body_json(resp).await;
        assert_eq!(updated.role, "admin");
    }

    #[tokio::test]
    async fn admin_cannot_change_roles() {
        let f = fixture();
        let (admin_user, _) = add_member(&f, OrgRole::Admin);
        let (_, member) = add_member(&f, OrgRole::Member);
        let resp = f
            .app
            .clone()
            .oneshot(post_role(&f, admin_user, member, "admin"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: ErrorBody = body_json(resp).await;
        assert_eq!(body.error.message, "Only owners can perform this action.");
    }

    #[tokio::test]
    async fn sole_owner_self_demotion_conflicts_with_self_reason() {
        let f = fixture();
        let resp = f
            .app
            .clone()
            .oneshot(post_role(&f, f.owner_user, f.owner_membership, "member"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: ErrorBody = body_json(resp).await;
        // Self rule wins over the last-owner rule.
        assert_eq!(body.error.message, "You can't lower your own role.");
    }

    #[tokio::test]
    async fn last_owner_deactivation_conflicts() {
        let f = fixture();
        let (second_owner_user, _) = add_member(&f, OrgRole::Owner);
        let resp = f
            .app
            .clone()
            .oneshot(post_active(&f, second_owner_user, f.owner_membership, false))
            .await
            .unwrap();
        // Two active owners; deactivating one is fine.
        assert_eq!(resp.status(), StatusCode::OK);

        // Now the second owner is the last active one.
        let members = f.state.memberships.list_org(f.org);
        let last = members
            .iter()
            .find(|m| m.user_id == second_owner_user)
            .unwrap();
        let resp = f
            .app
            .clone()
            .oneshot(post_active(&f, f.owner_user, last.id, false))
            .await
            .unwrap();
        // The actor is deactivated, so the hierarchy check fires first.
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn deactivate_then_reactivate_member() {
        let f = fixture();
        let (_, member) = add_member(&f, OrgRole::Member);
        let resp = f
            .app
            .clone()
            .oneshot(post_active(&f, f.owner_user, member, false))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: MemberResponse = body_json(resp).await;
        assert!(!updated.is_active);

        let resp = f
            .app
            .clone()
            .oneshot(post_active(&f, f.owner_user, member, true))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: MemberResponse = body_json(resp).await;
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn unknown_role_is_validation_error() {
        let f = fixture();
        let (_, member) = add_member(&f, OrgRole::Member);
        let resp = f
            .app
            .clone()
            .oneshot(post_role(&f, f.owner_user, member, "superuser"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn target_from_other_org_is_not_found() {
        let f = fixture();
        let other_org = OrgId::new();
        let foreign = f
            .state
            .memberships
            .insert(MembershipRecord::new(UserId::new(), other_org, OrgRole::Member));
        let resp = f
            .app
            .clone()
            .oneshot(post_role(&f, f.owner_user, foreign, "admin"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn members_panel_reports_active_owner_count() {
        let f = fixture();
        add_member(&f, OrgRole::Owner);
        add_member(&f, OrgRole::Member);

        let req = Request::builder()
            .method("GET")
            .uri(format!("/v1/orgs/{}/members", f.org))
            .header(ACTING_USER_HEADER, f.owner_user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = f.app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let list: MemberListResponse = body_json(resp).await;
        assert_eq!(list.members.len(), 3);
        assert_eq!(list.active_owner_count, 2);
    }
}
