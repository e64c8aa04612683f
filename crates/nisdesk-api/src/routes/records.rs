//! # Compliance Records API
//!
//! The organisation's self-assessment tracker: one record per
//! requirement, cycling through pending / complete / failed.
//!
//! ## Endpoints
//!
//! - `POST   /v1/orgs/:org_id/records`                    — Create
//! - `GET    /v1/orgs/:org_id/records`                    — List
//! - `POST   /v1/orgs/:org_id/records/:record_id/status`  — Update status
//! - `DELETE /v1/orgs/:org_id/records/:record_id`         — Delete

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_core::{OrgId, RecordId};
use nisdesk_state::{ComplianceRecord, RecordStatus};

use crate::db;
use crate::error::AppError;
use crate::extract::ActingUser;
use crate::state::AppState;

/// Request to start tracking a requirement.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateRecordRequest {
    pub requirement: String,
    /// "pending", "complete", or "failed". Defaults to pending.
    #[serde(default)]
    pub status: Option<String>,
}

/// Request to move a record to a new status.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// A tracked requirement.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub requirement: String,
    pub status: String,
    pub last_updated: DateTime<Utc>,
}

/// Record list with a status tally for the dashboard.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordListResponse {
    pub records: Vec<RecordResponse>,
    pub total: usize,
    pub pending: usize,
    pub complete: usize,
    pub failed: usize,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/orgs/:org_id/records", post(create_record).get(list_records))
        .route(
            "/v1/orgs/:org_id/records/:record_id",
            axum::routing::delete(delete_record),
        )
        .route(
            "/v1/orgs/:org_id/records/:record_id/status",
            post(update_status),
        )
}

fn to_response(record: &ComplianceRecord) -> RecordResponse {
    RecordResponse {
        id: *record.id.as_uuid(),
        org_id: *record.org_id.as_uuid(),
        requirement: record.requirement.clone(),
        status: record.status.as_str().to_string(),
        last_updated: record.last_updated,
    }
}

fn parse_status(raw: &str) -> Result<RecordStatus, AppError> {
    RecordStatus::parse(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown record status {raw:?}; expected pending, complete, or failed"
        ))
    })
}

/// POST /v1/orgs/:org_id/records — Track a requirement.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/records",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    request_body = CreateRecordRequest,
    responses(
        (status = 201, description = "Record created", body = RecordResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
        (status = 422, description = "Blank requirement or bad status", body = crate::error::ErrorBody),
    ),
    tag = "records"
)]
pub async fn create_record(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<RecordResponse>), AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    if req.requirement.trim().is_empty() {
        return Err(AppError::Validation("requirement must not be blank".to_string()));
    }
    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => RecordStatus::Pending,
    };

    let record = ComplianceRecord::new(org_id, req.requirement.trim().to_string(), status);
    if let Some(pool) = &state.db_pool {
        db::records::insert(pool, &record).await?;
    }
    state
        .compliance_records
        .insert(*record.id.as_uuid(), record.clone());

    Ok((StatusCode::CREATED, Json(to_response(&record))))
}

/// GET /v1/orgs/:org_id/records — List with a status tally.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/records",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    responses(
        (status = 200, description = "Tracked requirements", body = RecordListResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
    ),
    tag = "records"
)]
pub async fn list_records(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<RecordListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    let mut records = state.compliance_records.filter(|r| r.org_id == org_id);
    records.sort_by(|a, b| a.requirement.cmp(&b.requirement));
    let tally = |s: RecordStatus| records.iter().filter(|r| r.status == s).count();
    Ok(Json(RecordListResponse {
        total: records.len(),
        pending: tally(RecordStatus::Pending),
        complete: tally(RecordStatus::Complete),
        failed: tally(RecordStatus::Failed),
        records: records.iter().map(to_response).collect(),
    }))
}

/// POST /v1/orgs/:org_id/records/:record_id/status — Move a record.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/records/{record_id}/status",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("record_id" = Uuid, Path, description = "Record UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Record after the move", body = RecordResponse),
        (status = 404, description = "Record not found", body = crate::error::ErrorBody),
        (status = 422, description = "Bad status", body = crate::error::ErrorBody),
    ),
    tag = "records"
)]
pub async fn update_status(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, record_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<RecordResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let record_id = RecordId::from_uuid(record_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    let status = parse_status(&req.status)?;
    let now = Utc::now();
    let updated = state
        .compliance_records
        .try_update::<_, AppError>(record_id.as_uuid(), |record| {
            if record.org_id != org_id {
                return Err(AppError::not_found(format!("record {record_id} not found")));
            }
            record.set_status(status, now);
            Ok(record.clone())
        })
        .ok_or_else(|| AppError::not_found(format!("record {record_id} not found")))??;

    if let Some(pool) = &state.db_pool {
        db::records::update_status(pool, updated.id, updated.status, updated.last_updated).await?;
    }
    Ok(Json(to_response(&updated)))
}

/// DELETE /v1/orgs/:org_id/records/:record_id — Stop tracking.
#[utoipa::path(
    delete,
    path = "/v1/orgs/{org_id}/records/{record_id}",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("record_id" = Uuid, Path, description = "Record UUID"),
    ),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 404, description = "Record not found", body = crate::error::ErrorBody),
    ),
    tag = "records"
)]
pub async fn delete_record(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, record_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let record_id = RecordId::from_uuid(record_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    let exists = state
        .compliance_records
        .get(record_id.as_uuid())
        .is_some_and(|r| r.org_id == org_id);
    if !exists {
        return Err(AppError::not_found(format!("record {record_id} not found")));
    }

    if let Some(pool) = &state.db_pool {
        db::records::delete(pool, record_id).await?;
    }
    state.compliance_records.remove(record_id.as_uuid());
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ACTING_USER_HEADER;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use nisdesk_core::{OrgRole, UserId};
    use nisdesk_state::{MembershipRecord, OrgRecord};
    use tower::ServiceExt;

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn seeded() -> (AppState, OrgId, UserId) {
        let state = AppState::new();
        let org = OrgId::new();
        let user = UserId::new();
        state.orgs.insert(
            *org.as_uuid(),
            OrgRecord {
                id: org,
                created_by: user,
                name: "Grid Co".into(),
                description: String::new(),
                created_at: Utc::now(),
            },
        );
        state
            .memberships
            .insert(MembershipRecord::new(user, org, OrgRole::Member));
        (state, org, user)
    }

    async fn create(app: &Router, org: OrgId, user: UserId, body: &str) -> RecordResponse {
        let req = Request::builder()
            .method("POST")
            .uri(format!("/v1/orgs/{org}/records"))
            .header(ACTING_USER_HEADER, user.to_string())
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }

    #[tokio::test]
    async fn lifecycle_create_move_delete() {
        let (state, org, user) = seeded();
        let app = router().with_state(state);

        let record = create(
            &app,
            org,
            user,
            r#"{"requirement": "Annual penetration test"}"#,
        )
        .await;
        assert_eq!(record.status, "pending");

        let req = Request::builder()
            .method("POST")
            .uri(format!("/v1/orgs/{org}/records/{}/status", record.id))
            .header(ACTING_USER_HEADER, user.to_string())
            .header("content-type", "application/json")
            .body(Body::from(r#"{"status": "complete"}"#))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let moved: RecordResponse = body_json(resp).await;
        assert_eq!(moved.status, "complete");
        assert!(moved.last_updated >= record.last_updated);

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/v1/orgs/{org}/records/{}", record.id))
            .header(ACTING_USER_HEADER, user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = Request::builder()
            .method("GET")
            .uri(format!("/v1/orgs/{org}/records"))
            .header(ACTING_USER_HEADER, user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let list: RecordListResponse = body_json(resp).await;
        assert_eq!(list.total, 0);
    }

    #[tokio::test]
    async fn tally_counts_by_status() {
        let (state, org, user) = seeded();
        let app = router().with_state(state);
        create(&app, org, user, r#"{"requirement": "Backups tested"}"#).await;
        create(
            &app,
            org,
            user,
            r#"{"requirement": "MFA rollout", "status": "complete"}"#,
        )
        .await;
        create(
            &app,
            org,
            user,
            r#"{"requirement": "Tabletop exercise", "status": "failed"}"#,
        )
        .await;

        let req = Request::builder()
            .method("GET")
            .uri(format!("/v1/orgs/{org}/records"))
            .header(ACTING_USER_HEADER, user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let list: RecordListResponse = body_json(resp).await;
        assert_eq!((list.pending, list.complete, list.failed), (1, 1, 1));
        assert_eq!(list.records[0].requirement, "Backups tested");
    }

    #[tokio::test]
    async fn unknown_status_rejected() {
        let (state, org, user) = seeded();
        let app = router().with_state(state);
        let req = Request::builder()
            .method("POST")
            .uri(format!("/v1/orgs/{org}/records"))
            .header(ACTING_USER_HEADER, user.to_string())
            .header("content-type", "application/json")
            .body(Body::from(r#"{"requirement": "X", "status": "done"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn record_scoped_to_org() {
        let (state, org, user) = seeded();
        let (state2, org2, user2) = {
            let org2 = OrgId::new();
            let user2 = UserId::new();
            state.orgs.insert(
                *org2.as_uuid(),
                OrgRecord {
                    id: org2,
                    created_by: user2,
                    name: "Other Co".into(),
                    description: String::new(),
                    created_at: Utc::now(),
                },
            );
            state
                .memberships
                .insert(MembershipRecord::new(user2, org2, OrgRole::Member));
            (state.clone(), org2, user2)
        };
        let app = router().with_state(state2);

        let record = create(&app, org, user, r#"{"requirement": "Ours"}"#).await;

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/v1/orgs/{org2}/records/{}", record.id))
            .header(ACTING_USER_HEADER, user2.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
