//! # Incident Notes API
//!
//! A lightweight chronological log per incident. Notes never mutate the
//! incident's clocks; they exist for handover context and the eventual
//! post-incident report. Kept in memory only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_core::{IncidentId, OrgId};
use nisdesk_state::NoteRecord;

use crate::error::AppError;
use crate::extract::ActingUser;
use crate::routes::incidents::require_incident;
use crate::state::AppState;

/// Request to append a note to an incident.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateNoteRequest {
    pub body: String,
}

/// One note on an incident's log.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub incident_id: Uuid,
    pub body: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Note list, oldest first.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NoteListResponse {
    pub notes: Vec<NoteResponse>,
    pub total: usize,
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/v1/orgs/:org_id/incidents/:incident_id/notes",
        get(list_notes).post(create_note),
    )
}

fn to_response(record: &NoteRecord) -> NoteResponse {
    NoteResponse {
        id: *record.id.as_uuid(),
        incident_id: *record.incident_id.as_uuid(),
        body: record.body.clone(),
        created_by: record.created_by.map(|u| *u.as_uuid()),
        created_at: record.created_at,
    }
}

/// GET /v1/orgs/:org_id/incidents/:incident_id/notes — The incident log.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/notes",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    responses(
        (status = 200, description = "Notes, oldest first", body = NoteListResponse),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "notes"
)]
pub async fn list_notes(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<NoteListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_incident(&state, org_id, incident_id)?;

    let mut records = state.notes.filter(|n| n.incident_id == incident_id);
    records.sort_by_key(|n| n.created_at);
    let total = records.len();
    let notes = records.iter().map(to_response).collect();
    Ok(Json(NoteListResponse { notes, total }))
}

/// POST /v1/orgs/:org_id/incidents/:incident_id/notes — Append a note.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/notes",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note appended", body = NoteResponse),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
        (status = 422, description = "Blank body", body = crate::error::ErrorBody),
    ),
    tag = "notes"
)]
pub async fn create_note(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_incident(&state, org_id, incident_id)?;

    if req.body.trim().is_empty() {
        return Err(AppError::Validation("note body must not be blank".to_string()));
    }

    let note = NoteRecord {
        id: nisdesk_core::NoteId::new(),
        incident_id,
        body: req.body.trim().to_string(),
        created_by: Some(user),
        created_at: Utc::now(),
    };
    state.notes.insert(*note.id.as_uuid(), note.clone());
    Ok((StatusCode::CREATED, Json(to_response(&note))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ACTING_USER_HEADER;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use nisdesk_core::{OrgRole, UserId};
    use nisdesk_state::{IncidentRecord, MembershipRecord, OrgRecord};
    use tower::ServiceExt;

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
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
                name: "Grid Co".into(),
                description: String::new(),
                created_at: Utc::now(),
            },
        );
        state
            .memberships
            .insert(MembershipRecord::new(user, org, OrgRole::Member));
        let incident = IncidentRecord::new(org, "Outage".into(), Some(Utc::now()));
        let id = incident.id;
        state.incidents.insert(*id.as_uuid(), incident);
        (state, org, user, id)
    }

    #[tokio::test]
    async fn append_and_list_in_order() {
        let (state, org, user, incident) = seeded();
        let app = router().with_state(state);
        for body in ["Pumps back online", "Regulator called"] {
            let req = Request::builder()
                .method("POST")
                .uri(format!("/v1/orgs/{org}/incidents/{incident}/notes"))
                .header(ACTING_USER_HEADER, user.to_string())
                .header("content-type", "application/json")
                .body(Body::from(format!(r#"{{"body": "{body}"}}"#)))
                .unwrap();
            let resp = app.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = Request::builder()
            .method("GET")
            .uri(format!("/v1/orgs/{org}/incidents/{incident}/notes"))
            .header(ACTING_USER_HEADER, user.to_string())
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let list: NoteListResponse = body_json(resp).await;
        assert_eq!(list.total, 2);
        assert_eq!(list.notes[0].body, "Pumps back online");
        assert_eq!(list.notes[0].created_by, Some(*user.as_uuid()));
    }

    #[tokio::test]
    async fn blank_note_rejected() {
        let (state, org, user, incident) = seeded();
        let app = router().with_state(state);
        let req = Request::builder()
            .method("POST")
            .uri(format!("/v1/orgs/{org}/incidents/{incident}/notes"))
            .header(ACTING_USER_HEADER, user.to_string())
            .header("content-type", "application/json")
            .body(Body::from(r#"{"body": "   "}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
