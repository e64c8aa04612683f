//! # Application State
//!
//! Shared state handed to every handler: in-memory stores per record
//! type, the membership directory, runtime configuration, and the
//! optional Postgres pool. Cloning an `AppState` clones handles, not
//! contents.
//!
//! The in-memory stores serve all reads. When a pool is configured,
//! writes go through Postgres first (guarded membership mutations run
//! in a row-locking transaction there) and the stores are updated from
//! the committed result.

use sqlx::PgPool;

use nisdesk_core::{OrgId, OrgRole, UserId};
use nisdesk_state::{
    ComplianceRecord, IncidentRecord, InviteRecord, MembershipDirectory, MembershipRecord,
    NoteRecord, ObligationRecord, OrgRecord, SiteRecord, Store,
};

use crate::error::AppError;

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// TCP port for the HTTP listener (`NISDESK_PORT`, default 8080).
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = std::env::var("NISDESK_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);
        Self { port }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub orgs: Store<OrgRecord>,
    pub sites: Store<SiteRecord>,
    pub incidents: Store<IncidentRecord>,
    pub obligations: Store<ObligationRecord>,
    pub invites: Store<InviteRecord>,
    pub notes: Store<NoteRecord>,
    pub compliance_records: Store<ComplianceRecord>,
    pub memberships: MembershipDirectory,
    pub db_pool: Option<PgPool>,
}

impl AppState {
    /// Fresh in-memory-only state. Used by tests and no-database mode.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            config,
            orgs: Store::new(),
            sites: Store::new(),
            incidents: Store::new(),
            obligations: Store::new(),
            invites: Store::new(),
            notes: Store::new(),
            compliance_records: Store::new(),
            memberships: MembershipDirectory::new(),
            db_pool,
        }
    }

    /// Fetch an org or 404.
    pub fn require_org(&self, org_id: OrgId) -> Result<OrgRecord, AppError> {
        self.orgs
            .get(org_id.as_uuid())
            .ok_or_else(|| AppError::not_found(format!("org {org_id} not found")))
    }

    /// The acting user's active membership in the org, or 403.
    ///
    /// Every org-scoped route passes through here: non-members and
    /// deactivated members get the same rejection.
    pub fn require_member(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> Result<MembershipRecord, AppError> {
        self.memberships
            .find(org_id, user_id)
            .filter(|m| m.is_active)
            .ok_or_else(|| {
                AppError::Forbidden("You are not a member of this organisation.".to_string())
            })
    }

    /// An active membership at admin level or above, or 403.
    pub fn require_admin(
        &self,
        org_id: OrgId,
        user_id: UserId,
    ) -> Result<MembershipRecord, AppError> {
        let membership = self.require_member(org_id, user_id)?;
        if membership.role >= OrgRole::Admin {
            Ok(membership)
        } else {
            Err(AppError::Forbidden(
                "Admin access is required for this action.".to_string(),
            ))
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
