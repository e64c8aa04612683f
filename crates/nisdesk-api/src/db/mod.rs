//! # Database Persistence Layer
//!
//! Postgres persistence via SQLx. The layer is optional: when
//! `DATABASE_URL` is set, orgs, memberships, incidents, obligations, and
//! compliance records are persisted and re-hydrated into the in-memory
//! stores at startup. When absent, the API runs in-memory only.
//!
//! Guarded membership mutations have a dedicated transactional path in
//! [`memberships`]: the org's membership rows are locked with
//! `SELECT ... FOR UPDATE`, the owner count is recomputed inside the
//! transaction, and the guard is evaluated against that count before the
//! update lands. Two processes cannot both demote "one of two owners".
//!
//! Sites, invites, and notes are in-memory only in this build.

pub mod incidents;
pub mod memberships;
pub mod obligations;
pub mod orgs;
pub mod records;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::state::AppState;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set — running in-memory only mode. \
                 State will not survive restarts."
            );
            return Ok(None);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Load all persisted records into the in-memory stores at startup.
pub async fn hydrate(state: &AppState, pool: &PgPool) -> Result<(), sqlx::Error> {
    for org in orgs::load_all(pool).await? {
        state.orgs.insert(*org.id.as_uuid(), org);
    }
    for membership in memberships::load_all(pool).await? {
        state.memberships.insert(membership);
    }
    for incident in incidents::load_all(pool).await? {
        state.incidents.insert(*incident.id.as_uuid(), incident);
    }
    for obligation in obligations::load_all(pool).await? {
        state.obligations.insert(*obligation.id.as_uuid(), obligation);
    }
    for record in records::load_all(pool).await? {
        state
            .compliance_records
            .insert(*record.id.as_uuid(), record);
    }
    tracing::info!(
        orgs = state.orgs.len(),
        incidents = state.incidents.len(),
        obligations = state.obligations.len(),
        "state hydrated from database"
    );
    Ok(())
}
