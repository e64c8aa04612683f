//! # nisdesk-api — Axum API Service
//!
//! The HTTP surface over the nisdesk domain crates: organisations with
//! guarded memberships, incident intake with per-authority notification
//! clocks, compliance requirement tracking, and Annex E export.
//!
//! ## API Surface
//!
//! | Prefix                                   | Module                  | Domain                  |
//! |------------------------------------------|-------------------------|-------------------------|
//! | `/v1/orgs`                               | [`routes::orgs`]        | Organisations           |
//! | `/v1/orgs/*/members/*`                   | [`routes::members`]     | Guarded memberships     |
//! | `/v1/orgs/*/invites`, `/v1/invites/*`    | [`routes::invites`]     | Invitation lifecycle    |
//! | `/v1/orgs/*/sites`                       | [`routes::sites`]       | Operational sites       |
//! | `/v1/orgs/*/incidents/*`                 | [`routes::incidents`]   | Incidents & clocks      |
//! | `/v1/orgs/*/incidents/*/obligations/*`   | [`routes::obligations`] | Notification obligations|
//! | `/v1/orgs/*/incidents/*/notes`           | [`routes::notes`]       | Incident log            |
//! | `/v1/orgs/*/records/*`                   | [`routes::records`]     | Compliance records      |
//! | `/v1/orgs/*/incidents/*/export/annex-e`  | [`routes::exports`]     | Annex E artifacts       |
//!
//! The acting user is conveyed by the `x-acting-user` header (see
//! [`extract::ActingUser`]); upstream authentication is out of scope.
//! Health probes and `/openapi.json` require no acting user.
//!
//! Storage is in-memory with optional Postgres write-through: when
//! `DATABASE_URL` is set the durable entities are persisted and
//! re-hydrated at startup (see [`db`]).

pub mod db;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router.
///
/// Health probes are mounted outside the body-limit and trace layers so
/// they stay cheap under load.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::orgs::router())
        .merge(routes::members::router())
        .merge(routes::invites::router())
        .merge(routes::sites::router())
        .merge(routes::incidents::router())
        .merge(routes::obligations::router())
        .merge(routes::notes::router())
        .merge(routes::records::router())
        .merge(routes::exports::router())
        .merge(openapi::router())
        // 2 MiB body cap; no endpoint takes larger payloads.
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let probes = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(probes).merge(api)
}

/// Liveness probe — 200 whenever the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies stores are accessible and, when
/// configured, that the database answers. Returns 200 "ready" or 503
/// with a diagnostic message.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let _ = state.orgs.len();
    let _ = state.incidents.len();

    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}
