//! # Incidents API
//!
//! Incident intake and the notification clocks around it. Creating an
//! incident seeds one obligation per authority in the catalogue; the
//! summary badge on listings aggregates those clocks, falling back to
//! the legacy single 72-hour clock for incidents with no obligations.
//!
//! ## Endpoints
//!
//! - `POST /v1/orgs/:org_id/incidents`                      — Create
//! - `GET  /v1/orgs/:org_id/incidents`                      — List with summary clocks
//! - `GET  /v1/orgs/:org_id/incidents/:incident_id`         — Fetch one
//! - `GET  /v1/orgs/:org_id/incidents/:incident_id/timer`   — Timer badge
//! - `POST /v1/orgs/:org_id/incidents/:incident_id/report`  — Legacy report stamp

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use nisdesk_clock::{incident_summary_status, timer_status, ObligationClock, TimerStatus};
use nisdesk_core::{Classification, IncidentId, OrgId, Severity, SiteId};
use nisdesk_state::{seed_default_obligations, IncidentRecord};

use crate::db;
use crate::error::AppError;
use crate::extract::ActingUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to record an incident.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateIncidentRequest {
    pub title: String,
    /// When the organisation became aware. Defaults to now; the clocks
    /// start here.
    #[serde(default)]
    pub aware_at: Option<DateTime<Utc>>,
    /// Optional site the incident occurred at.
    #[serde(default)]
    pub site_id: Option<Uuid>,
    /// "availability", "integrity", "confidentiality", or "other".
    #[serde(default)]
    pub classification: Option<String>,
    /// "low", "medium", "high", or "critical".
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// The timer badge: state, human-readable detail, and a css hint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimerBadge {
    /// "pending", "overdue", "filed", or "unknown".
    pub state: String,
    /// e.g. "41h 07m remaining", "late", "on time".
    pub detail: String,
    /// "green", "red", or "".
    pub css_hint: String,
}

impl From<TimerStatus> for TimerBadge {
    fn from(status: TimerStatus) -> Self {
        Self {
            state: status.state.as_str().to_string(),
            detail: status.detail,
            css_hint: status.css_hint,
        }
    }
}

/// An incident as returned by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncidentResponse {
    pub id: Uuid,
    pub org_id: Uuid,
    pub site_id: Option<Uuid>,
    pub title: String,
    pub classification: String,
    pub severity: String,
    pub aware_at: Option<DateTime<Utc>>,
    pub status: String,
    pub reported_at: Option<DateTime<Utc>>,
    /// Legacy single-clock deadline (aware-at + 72h).
    pub deadline_at: Option<DateTime<Utc>>,
    /// Aggregate clock over the incident's obligations.
    pub summary: TimerBadge,
    pub created_at: DateTime<Utc>,
}

/// Incident list.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncidentListResponse {
    pub incidents: Vec<IncidentResponse>,
    pub total: usize,
}

/// Request to stamp the legacy regulatory report.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(deny_unknown_fields, default)]
pub struct ReportRequest {
    pub notes: String,
    pub reference: String,
}

// ---------------------------------------------------------------------------
// Router & helpers
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/orgs/:org_id/incidents",
            post(create_incident).get(list_incidents),
        )
        .route("/v1/orgs/:org_id/incidents/:incident_id", get(get_incident))
        .route(
            "/v1/orgs/:org_id/incidents/:incident_id/timer",
            get(incident_timer),
        )
        .route(
            "/v1/orgs/:org_id/incidents/:incident_id/report",
            post(report_incident),
        )
}

/// Fetch an incident scoped to the org in the path, or 404.
pub(crate) fn require_incident(
    state: &AppState,
    org_id: OrgId,
    incident_id: IncidentId,
) -> Result<IncidentRecord, AppError> {
    state
        .incidents
        .get(incident_id.as_uuid())
        .filter(|i| i.org_id == org_id)
        .ok_or_else(|| AppError::not_found(format!("incident {incident_id} not found")))
}

/// The obligation clocks of one incident.
pub(crate) fn obligation_clocks(state: &AppState, incident_id: IncidentId) -> Vec<ObligationClock> {
    state
        .obligations
        .filter(|o| o.incident_id == incident_id)
        .iter()
        .map(|o| o.clock())
        .collect()
}

fn to_response(state: &AppState, incident: &IncidentRecord, now: DateTime<Utc>) -> IncidentResponse {
    let clocks = obligation_clocks(state, incident.id);
    let summary =
        incident_summary_status(&clocks, incident.aware_at, incident.reported_at, now);
    IncidentResponse {
        id: *incident.id.as_uuid(),
        org_id: *incident.org_id.as_uuid(),
        site_id: incident.site_id.map(|s| *s.as_uuid()),
        title: incident.title.clone(),
        classification: incident.classification.as_str().to_string(),
        severity: incident.severity.as_str().to_string(),
        aware_at: incident.aware_at,
        status: incident.status.as_str().to_string(),
        reported_at: incident.reported_at,
        deadline_at: incident.legacy_deadline_at(),
        summary: summary.into(),
        created_at: incident.created_at,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/orgs/:org_id/incidents — Record an incident.
///
/// Seeds the default obligation set (one per authority) from aware-at.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/incidents",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    request_body = CreateIncidentRequest,
    responses(
        (status = 201, description = "Incident recorded", body = IncidentResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
        (status = 422, description = "Blank title or bad enum value", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn create_incident(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
    Json(req): Json<CreateIncidentRequest>,
) -> Result<(StatusCode, Json<IncidentResponse>), AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    if req.title.trim().is_empty() {
        return Err(AppError::Validation("incident title must not be blank".to_string()));
    }
    if let Some(site_id) = req.site_id {
        let site = state.sites.get(&site_id);
        if !site.is_some_and(|s| s.org_id == org_id) {
            return Err(AppError::not_found(format!("site {site_id} not found")));
        }
    }

    let now = Utc::now();
    let mut incident =
        IncidentRecord::new(org_id, req.title.trim().to_string(), Some(req.aware_at.unwrap_or(now)));
    incident.site_id = req.site_id.map(SiteId::from_uuid);
    incident.description = req.description;
    if let Some(raw) = &req.classification {
        incident.classification = Classification::parse(raw)?;
    }
    if let Some(raw) = &req.severity {
        incident.severity = Severity::parse(raw)?;
    }

    let obligations = seed_default_obligations(&incident);

    if let Some(pool) = &state.db_pool {
        db::incidents::insert(pool, &incident).await?;
        for obligation in &obligations {
            db::obligations::insert(pool, obligation).await?;
        }
    }

    state
        .incidents
        .insert(*incident.id.as_uuid(), incident.clone());
    for obligation in obligations {
        state
            .obligations
            .insert(*obligation.id.as_uuid(), obligation);
    }
    tracing::info!(org = %org_id, incident = %incident.id, "incident recorded");

    Ok((StatusCode::CREATED, Json(to_response(&state, &incident, now))))
}

/// GET /v1/orgs/:org_id/incidents — List incidents with summary clocks.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/incidents",
    params(("org_id" = Uuid, Path, description = "Organisation UUID")),
    responses(
        (status = 200, description = "Incidents", body = IncidentListResponse),
        (status = 403, description = "Not a member", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn list_incidents(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path(org_id): Path<Uuid>,
) -> Result<Json<IncidentListResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;

    let now = Utc::now();
    let mut records = state.incidents.filter(|i| i.org_id == org_id);
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let total = records.len();
    let incidents = records
        .iter()
        .map(|i| to_response(&state, i, now))
        .collect();
    Ok(Json(IncidentListResponse { incidents, total }))
}

/// GET /v1/orgs/:org_id/incidents/:incident_id — Fetch one incident.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    responses(
        (status = 200, description = "Incident details", body = IncidentResponse),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn get_incident(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<IncidentResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    let incident = require_incident(&state, org_id, IncidentId::from_uuid(incident_id))?;
    Ok(Json(to_response(&state, &incident, Utc::now())))
}

/// GET /v1/orgs/:org_id/incidents/:incident_id/timer — The timer badge.
///
/// The legacy single-clock badge, consumed directly by a rendering
/// layer.
#[utoipa::path(
    get,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/timer",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    responses(
        (status = 200, description = "Timer badge", body = TimerBadge),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn incident_timer(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TimerBadge>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    let incident = require_incident(&state, org_id, IncidentId::from_uuid(incident_id))?;

    let status = timer_status(incident.legacy_deadline_at(), incident.reported_at, Utc::now());
    Ok(Json(status.into()))
}

/// POST /v1/orgs/:org_id/incidents/:incident_id/report — Legacy report stamp.
///
/// Idempotent: `reported_at` is stamped once; repeat calls only refresh
/// the notes and reference.
#[utoipa::path(
    post,
    path = "/v1/orgs/{org_id}/incidents/{incident_id}/report",
    params(
        ("org_id" = Uuid, Path, description = "Organisation UUID"),
        ("incident_id" = Uuid, Path, description = "Incident UUID"),
    ),
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Report recorded", body = IncidentResponse),
        (status = 404, description = "Incident not found", body = crate::error::ErrorBody),
    ),
    tag = "incidents"
)]
pub async fn report_incident(
    State(state): State<AppState>,
    ActingUser(user): ActingUser,
    Path((org_id, incident_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<IncidentResponse>, AppError> {
    let org_id = OrgId::from_uuid(org_id);
    let incident_id = IncidentId::from_uuid(incident_id);
    state.require_org(org_id)?;
    state.require_member(org_id, user)?;
    require_incident(&state, org_id, incident_id)?;

    let now = Utc::now();
    let updated = state
        .incidents
        .try_update::<_, AppError>(incident_id.as_uuid(), |incident| {
            incident.mark_reported(now);
            if !req.notes.trim().is_empty() {
                incident.report_notes = req.notes.trim().to_string();
            }
            if !req.reference.trim().is_empty() {
                incident.report_reference = req.reference.trim().to_string();
            }
            Ok(incident.clone())
        })
        .ok_or_else(|| AppError::not_found(format!("incident {incident_id} not found")))??;

    if let Some(pool) = &state.db_pool {
        db::incidents::mark_reported(pool, &updated).await?;
    }
    tracing::info!(org = %org_id, incident = %incident_id, "incident reported");

    Ok(Json(to_response(&state, &updated, now)))
}
