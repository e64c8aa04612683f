//! # Obligations API
//!
//! Per-authority notification obligations on an incident. Each carries
//! its own clock from the incident's aware-at plus that authority's
//! notification window; filing stamps `filed_at` exactly once.
//!
//! ## Endpoints
//!
//! - `GET  /v1/orgs/:org_id/incidents/:incident_id/obligations`                       — List with clocks
//! - `POST /v1/orgs/:org_id/incidents/:incident_id/obligations/seed`                  — Backfill missing authorities
//! - `POST /v1/orgs/:org_id/incidents/:incident_id/obligations/:obligation_id/file`   — File with the authority

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_clock::timer_status;
use nisdesk_core::{Authority, IncidentId, ObligationId, OrgId};
use nisdesk_state::ObligationRecord;

use crate::db;
use crate::error::AppError;
use crate::extract::ActingUser;
use crate::routes::incidents::{require_incident, TimerBadge};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// One notification obligation with its live clock.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObligationResponse {
    pub id: Uuid,
    pub incident_id: Uuid,
    /// "primary_regulator", "data_protection", "customers", or "insurer".
    pub authority: String,
    pub deadline_at: Option<DateTime<Utc>>,
    pub filed_at: Option<DateTime<Utc>>,
    pub submission_ref: String,
    pub timer: TimerBadge,
}

/// Obligation list, ordered by deadline.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ObligationListResponse {
    pub obligations: Vec<ObligationResponse>,
    pub total: usize,
}

/// Request to file an obligation with its authority.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields, default)]
pub struct FileObligationRequest {
    /// The authority's acknowledgement or case reference, if any.
    pub submission_ref: Option<String>,
}

// ---------------------------------------------------------------------------
// Router & helpers
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/orgs/:org_id/incidents/:incident_id/obligations",
            get(list_obligations),
        )
        .route(
            "/v1/orgs/:org_id/incidents/:incident_id/obligations/seed",
            post(seed_obligations),
        )
        .route(
            "/v1/orgs/:org_id/incidents/:incident_id/obligations/:obligation_id/file",
            post(file_obligation),
        )
}

fn to_response(record: &ObligationRecord, now: DateTime<Utc>) -> ObligationResponse {
    let status = timer_status(record.deadline_at, record.filed_at, now);
    ObligationResponse {
        id: *record.id.as_uuid(),
        incident_id: *record.incident_id.as_uuid(),
        authority: record.authority.as_str().to_string(),
        deadline_at: record.deadline_at,
        filed_at: record.filed_at,
        submission_ref: record.submission_ref.clone(),
        timer: status.into(),
    }
}

fn incident_obligations(state: &AppState, incident_id: IncidentId) -> Vec<ObligationRecord> {
    // Soonest deadline first; catalogue order breaks ties so listings
    // are stable across requests.
    let position =
        |a: Authority| Authority::all().iter().position(|x| *x == a).unwrap_or(usize::MAX);
    let mut records = state.obligations.filter(|o| o.incident_id == incident_id);
    records.sort_by(|a, b| match (a.deadline_at, b.deadline_at) {
        (Some(x), Some(y)) => x.cmp(&y).then(position(a.authority).cmp(&position(b.authority))),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => position(a.authority).cmp(&position(b.authority)),
    });
    records
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /v1/orgs/:org_id/incidents/:incident_id/obligations — List obligations.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/obligations",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    responses(
        (status = 200, description = "Obligations with clocks", body = ObligationListResponse),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "obligations"
)]
pub async fn list_obligations(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ObligationListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_incident(&state, org_id, incident_id)?;

    let now = Utc::now();
    let records = incident_obligations(&state, incident_id);
    let total = records.len();
    let obligations = records.iter().map(|o| to_response(o, now)).collect();
    Ok(Json(ObligationListResponse { obligations, total }))
}

/// POST /v1/orgs/:org_id/incidents/:incident_id/obligations/seed — Backfill.
///
/// Creates obligations only for authorities the incident does not
/// already have, so re-seeding never duplicates or resets a clock.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/obligations/seed",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    responses(
        (status = 200, description = "Full obligation set after seeding", body = ObligationListResponse),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "obligations"
)]
pub async fn seed_obligations(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ObligationListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    let incident = require_incident(&state, org_id, incident_id)?;

    let existing: Vec<Authority> = state
        .obligations
        .filter(|o| o.incident_id == incident_id)
        .iter()
        .map(|o| o.authority)
        .collect();
    let missing: Vec<ObligationRecord> = Authority::all()
        .iter()
        .filter(|a| !existing.contains(a))
        .map(|a| ObligationRecord::new(incident_id, *a, incident.aware_at))
        .collect();

    if let Some(pool) = &state.db_pool {
        for obligation in &missing {
            db::obligations::insert(pool, obligation).await?;
        }
    }
    let seeded = missing.len();
    for obligation in missing {
        state
            .obligations
            .insert(*obligation.id.as_uuid(), obligation);
    }
    if seeded > 0 {
        tracing::info!(incident = %incident_id, seeded, "obligations backfilled");
    }

    let now = Utc::now();
    let records = incident_obligations(&state, incident_id);
    let total = records.len();
    let obligations = records.iter().map(|o| to_response(o, now)).collect();
    Ok(Json(ObligationListResponse { obligations, total }))
}

/// POST .../obligations/:obligation_id/file — Mark filed with the authority.
///
/// `filed_at` is stamped on the first call and never moves; repeat calls
/// may still update the submission reference.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/obligations/{obligation_id}/file",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
        ("obligation_id" = Uuid, Path, description = "Obligation UUID"),
    ),
    request_body = FileObligationRequest,
    responses(
        (status = 200, description = "Obligation after filing", body = ObligationResponse),
        (status = 404, description = "Obligation not found", body = crate::error::ErrorBody),
    ),
    tag = "obligations"
)]
pub async fn file_obligation(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id, obligation_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(req): Json<FileObligationRequest>,
) -> Result<Json<ObligationResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    let obligation_id = ObligationId::from_uuid(obligation_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_incident(&state, org_id, incident_id)?;

    let now = Utc::now();
    let updated = state
        .obligations
        .try_update::<_, AppError>(obligation_id.as_uuid(), |obligation| {
            if obligation.incident_id != incident_id {
                return Err(AppError::not_found(format!(
                    "obligation {obligation_id} not found"
                )));
            }
            obligation.file(now, req.submission_ref.as_deref());
            Ok(obligation.clone())
        })
        .ok_or_else(|| AppError::not_found(format!("obligation {obligation_id} not found")))??;

    if let Some(pool) = &state.db_pool {
        db::obligations::mark_filed(
            pool,
            updated.id,
            updated.filed_at.unwrap_or(now),
            &updated.submission_ref,
        )
        .await?;
    }
    tracing::info!(
        incident = %incident_id,
        authority = updated.authority.as_str(),
        "obligation filed"
    );

    Ok(Json(to_response(&updated, now)))
}
