//! Owning records for every entity in the data model, with their
//! transition methods.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nisdesk_clock::{compute_deadline, ObligationClock, LEGACY_WINDOW_HOURS};
use nisdesk_core::{
    Authority, Classification, IncidentId, IncidentStatus, InviteId, MembershipId,
    MembershipSnapshot, NoteId, ObligationId, OrgId, OrgRole, RecordId, Severity, SiteId, UserId,
};

// ── Organisation ─────────────────────────────────────────────────────

/// An organisation (tenant). Owns memberships, sites, incidents, and
/// compliance records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRecord {
    pub id: OrgId,
    /// The creating user; they receive the initial active owner membership.
    pub created_by: UserId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ── Site ─────────────────────────────────────────────────────────────

/// An operational location of an organisation. Feeds the Annex E
/// organisation/site block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteRecord {
    pub id: SiteId,
    pub org_id: OrgId,
    pub name: String,
    pub essential_service: String,
    pub network_role: String,
    pub eic_code: String,
    pub timezone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub postcode: String,
    pub country_code: String,
    pub contact_name: String,
    pub contact_role: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub ooh_phone: String,
    pub dpo_email: String,
}

// ── Membership ───────────────────────────────────────────────────────

/// One user's membership in one organisation. Never physically deleted by
/// the guarded flows — deactivated instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: MembershipId,
    pub user_id: UserId,
    pub org_id: OrgId,
    pub role: OrgRole,
    pub is_active: bool,
    pub invited_by: Option<UserId>,
    pub invited_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
}

impl MembershipRecord {
    /// A fresh active membership, as created on org creation or invite
    /// acceptance.
    pub fn new(user_id: UserId, org_id: OrgId, role: OrgRole) -> Self {
        Self {
            id: MembershipId::new(),
            user_id,
            org_id,
            role,
            is_active: true,
            invited_by: None,
            invited_at: None,
            accepted_at: None,
        }
    }

    /// The guard-relevant view of this record.
    pub fn snapshot(&self) -> MembershipSnapshot {
        MembershipSnapshot {
            id: self.id,
            user_id: self.user_id,
            org_id: self.org_id,
            role: self.role,
            is_active: self.is_active,
        }
    }
}

// ── Invitation ───────────────────────────────────────────────────────

/// Lifecycle status of an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InviteStatus {
    Pending,
    Accepted,
    Cancelled,
}

/// An invitation to join an organisation, addressed by email and redeemed
/// by token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteRecord {
    pub id: InviteId,
    pub org_id: OrgId,
    pub email: String,
    pub role: OrgRole,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub invited_by: Option<UserId>,
}

impl InviteRecord {
    /// Default invitation validity.
    pub const VALIDITY_DAYS: i64 = 7;

    pub fn new(org_id: OrgId, email: String, role: OrgRole, invited_by: Option<UserId>) -> Self {
        Self {
            id: InviteId::new(),
            org_id,
            email,
            role,
            token: Uuid::new_v4().simple().to_string(),
            expires_at: Utc::now() + Duration::days(Self::VALIDITY_DAYS),
            used_at: None,
            cancelled_at: None,
            invited_by,
        }
    }

    pub fn status(&self, now: DateTime<Utc>) -> InviteStatus {
        if self.used_at.is_some() {
            InviteStatus::Accepted
        } else if self.cancelled_at.is_some() || self.expires_at < now {
            InviteStatus::Cancelled
        } else {
            InviteStatus::Pending
        }
    }

    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == InviteStatus::Pending
    }
}

// ── Incident ─────────────────────────────────────────────────────────

/// A security incident.
///
/// Invariant, upheld by construction and [`IncidentRecord::mark_reported`]
/// being the only status transition: `reported_at` is non-null if and only
/// if `status` is [`IncidentStatus::Reported`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub id: IncidentId,
    pub org_id: OrgId,
    pub site_id: Option<SiteId>,
    pub title: String,
    pub classification: Classification,
    pub severity: Severity,
    /// When the organisation became aware; starts the notification clock.
    pub aware_at: Option<DateTime<Utc>>,
    pub status: IncidentStatus,
    pub reported_at: Option<DateTime<Utc>>,
    pub report_notes: String,
    pub report_reference: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IncidentRecord {
    pub fn new(org_id: OrgId, title: String, aware_at: Option<DateTime<Utc>>) -> Self {
        let now = Utc::now();
        Self {
            id: IncidentId::new(),
            org_id,
            site_id: None,
            title,
            classification: Classification::default(),
            severity: Severity::default(),
            aware_at,
            status: IncidentStatus::default(),
            reported_at: None,
            report_notes: String::new(),
            report_reference: String::new(),
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The legacy single-clock deadline: aware-at plus 72 hours.
    pub fn legacy_deadline_at(&self) -> Option<DateTime<Utc>> {
        compute_deadline(self.aware_at, Duration::hours(LEGACY_WINDOW_HOURS))
    }

    /// Mark the regulatory report as submitted.
    ///
    /// Idempotent: `reported_at` is stamped exactly once, on the first
    /// call; later calls only refresh notes/reference and `updated_at`.
    pub fn mark_reported(&mut self, now: DateTime<Utc>) {
        if self.reported_at.is_none() {
            self.reported_at = Some(now);
        }
        self.status = IncidentStatus::Reported;
        self.updated_at = now;
    }

    /// Whether the reported-at/status invariant holds.
    pub fn clock_invariant_holds(&self) -> bool {
        self.reported_at.is_some() == (self.status == IncidentStatus::Reported)
    }
}

// ── Obligation ───────────────────────────────────────────────────────

/// A per-authority reporting obligation tied to one incident.
///
/// Invariant: `filed_at`, once set, is never cleared. There is no
/// un-filing operation; [`ObligationRecord::file`] is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationRecord {
    pub id: ObligationId,
    pub incident_id: IncidentId,
    pub authority: Authority,
    pub deadline_at: Option<DateTime<Utc>>,
    pub filed_at: Option<DateTime<Utc>>,
    pub submission_ref: String,
    pub created_at: DateTime<Utc>,
}

impl ObligationRecord {
    pub fn new(
        incident_id: IncidentId,
        authority: Authority,
        aware_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: ObligationId::new(),
            incident_id,
            authority,
            deadline_at: compute_deadline(aware_at, authority.notification_window()),
            filed_at: None,
            submission_ref: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Record the submission. `filed_at` is stamped only on the first
    /// call; a repeat call may still update the submission reference.
    ///
    /// Returns whether this call newly filed the obligation.
    pub fn file(&mut self, now: DateTime<Utc>, submission_ref: Option<&str>) -> bool {
        if let Some(reference) = submission_ref {
            self.submission_ref = reference.trim().to_string();
        }
        if self.filed_at.is_none() {
            self.filed_at = Some(now);
            true
        } else {
            false
        }
    }

    /// The clock-relevant view consumed by the deadline engine.
    pub fn clock(&self) -> ObligationClock {
        ObligationClock {
            authority: self.authority,
            deadline_at: self.deadline_at,
            filed_at: self.filed_at,
        }
    }
}

/// Create the default obligation set for an incident: one per authority in
/// the catalogue, each with its own notification window from aware-at.
pub fn seed_default_obligations(incident: &IncidentRecord) -> Vec<ObligationRecord> {
    Authority::all()
        .iter()
        .map(|authority| ObligationRecord::new(incident.id, *authority, incident.aware_at))
        .collect()
}

// ── Notes & compliance records ───────────────────────────────────────

/// A free-text note on an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub incident_id: IncidentId,
    pub body: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Tracking status of a compliance requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Complete,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A tracked compliance requirement for an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    pub id: RecordId,
    pub org_id: OrgId,
    pub requirement: String,
    pub status: RecordStatus,
    pub last_updated: DateTime<Utc>,
}

impl ComplianceRecord {
    pub fn new(org_id: OrgId, requirement: String, status: RecordStatus) -> Self {
        Self {
            id: RecordId::new(),
            org_id,
            requirement,
            status,
            last_updated: Utc::now(),
        }
    }

    pub fn set_status(&mut self, status: RecordStatus, now: DateTime<Utc>) {
        self.status = status;
        self.last_updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn incident_clock_invariant_holds_through_reporting() {
        let mut incident = IncidentRecord::new(OrgId::new(), "outage".into(), Some(at(0)));
        assert!(incident.clock_invariant_holds());
        assert_eq!(incident.legacy_deadline_at(), Some(at(0) + Duration::hours(72)));

        incident.mark_reported(at(5));
        assert!(incident.clock_invariant_holds());
        assert_eq!(incident.reported_at, Some(at(5)));

        // Second report keeps the original stamp.
        incident.mark_reported(at(9));
        assert_eq!(incident.reported_at, Some(at(5)));
        assert!(incident.clock_invariant_holds());
    }

    #[test]
    fn obligation_filing_is_idempotent() {
        let mut ob = ObligationRecord::new(IncidentId::new(), Authority::DataProtection, Some(at(0)));
        assert!(ob.file(at(2), Some("ICO-123")));
        assert_eq!(ob.filed_at, Some(at(2)));
        assert_eq!(ob.submission_ref, "ICO-123");

        // Re-filing does not move filed_at but may update the reference.
        assert!(!ob.file(at(4), Some("ICO-123-rev2")));
        assert_eq!(ob.filed_at, Some(at(2)));
        assert_eq!(ob.submission_ref, "ICO-123-rev2");

        // And a re-file with no reference leaves it alone.
        assert!(!ob.file(at(5), None));
        assert_eq!(ob.submission_ref, "ICO-123-rev2");
    }

    #[test]
    fn obligation_deadline_uses_authority_window() {
        let ob = ObligationRecord::new(IncidentId::new(), Authority::PrimaryRegulator, Some(at(0)));
        assert_eq!(ob.deadline_at, Some(at(0) + Duration::hours(72)));
        let without_aware =
            ObligationRecord::new(IncidentId::new(), Authority::Customers, None);
        assert_eq!(without_aware.deadline_at, None);
    }

    #[test]
    fn default_obligations_cover_the_catalogue() {
        let incident = IncidentRecord::new(OrgId::new(), "outage".into(), Some(at(0)));
        let seeded = seed_default_obligations(&incident);
        assert_eq!(seeded.len(), Authority::all().len());
        let authorities: Vec<Authority> = seeded.iter().map(|o| o.authority).collect();
        assert!(authorities.contains(&Authority::PrimaryRegulator));
        assert!(authorities.contains(&Authority::Insurer));
        assert!(seeded.iter().all(|o| o.incident_id == incident.id));
    }

    #[test]
    fn invite_status_lifecycle() {
        let mut invite = InviteRecord::new(
            OrgId::new(),
            "new@example.com".into(),
            OrgRole::Member,
            None,
        );
        let now = Utc::now();
        assert_eq!(invite.status(now), InviteStatus::Pending);
        assert!(invite.is_pending(now));

        // Expired invites read as cancelled.
        assert_eq!(
            invite.status(now + Duration::days(8)),
            InviteStatus::Cancelled
        );

        invite.used_at = Some(now);
        assert_eq!(invite.status(now), InviteStatus::Accepted);
    }

    #[test]
    fn invite_tokens_are_unique() {
        let a = InviteRecord::new(OrgId::new(), "a@example.com".into(), OrgRole::Member, None);
        let b = InviteRecord::new(OrgId::new(), "b@example.com".into(), OrgRole::Member, None);
        assert_ne!(a.token, b.token);
    }

    #[test]
    fn compliance_record_status_touches_last_updated() {
        let mut record =
            ComplianceRecord::new(OrgId::new(), "NIS2 Art. 21 audit".into(), RecordStatus::Pending);
        record.set_status(RecordStatus::Complete, at(10));
        assert_eq!(record.status, RecordStatus::Complete);
        assert_eq!(record.last_updated, at(10));
    }

    #[test]
    fn record_status_parse() {
        assert_eq!(RecordStatus::parse("Complete"), Some(RecordStatus::Complete));
        assert_eq!(RecordStatus::parse("bogus"), None);
    }
}
