//! Incident-level aggregation across per-authority obligations, with the
//! legacy single-clock fallback.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use nisdesk_core::Authority;

use crate::timer::{timer_status, TimerStatus, LEGACY_WINDOW_HOURS};

/// The clock-relevant view of one obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationClock {
    pub authority: Authority,
    pub deadline_at: Option<DateTime<Utc>>,
    pub filed_at: Option<DateTime<Utc>>,
}

/// The earliest deadline among obligations that have not been filed.
///
/// `None` when nothing is pending — either there are no obligations or
/// every one of them has been filed.
pub fn next_deadline(obligations: &[ObligationClock]) -> Option<DateTime<Utc>> {
    obligations
        .iter()
        .filter(|ob| ob.filed_at.is_none())
        .filter_map(|ob| ob.deadline_at)
        .min()
}

/// Summarise an incident's clock position.
///
/// When any obligations exist, the summary is derived purely from them and
/// the legacy fields are ignored:
///
/// - all filed → `Filed`, detail `"late"` if any single obligation was
///   filed after its deadline, `"unknown"` if none were late but some had
///   no deadline to compare against, `"on time"` otherwise;
/// - otherwise → the timer status of the earliest pending deadline.
///
/// With no obligations, the legacy single 72-hour clock applies over
/// `legacy_aware_at` / `legacy_reported_at`.
pub fn incident_summary_status(
    obligations: &[ObligationClock],
    legacy_aware_at: Option<DateTime<Utc>>,
    legacy_reported_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TimerStatus {
    if obligations.is_empty() {
        let deadline = legacy_aware_at.map(|t| t + Duration::hours(LEGACY_WINDOW_HOURS));
        return timer_status(deadline, legacy_reported_at, now);
    }

    if obligations.iter().all(|ob| ob.filed_at.is_some()) {
        let any_late = obligations.iter().any(|ob| match (ob.filed_at, ob.deadline_at) {
            (Some(filed), Some(deadline)) => filed > deadline,
            _ => false,
        });
        let any_unjudged = obligations.iter().any(|ob| ob.deadline_at.is_none());
        let detail = if any_late {
            "late"
        } else if any_unjudged {
            "unknown"
        } else {
            "on time"
        };
        return TimerStatus::filed(detail);
    }

    timer_status(next_deadline(obligations), None, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerState;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap()
    }

    fn clock(
        deadline: Option<DateTime<Utc>>,
        filed: Option<DateTime<Utc>>,
    ) -> ObligationClock {
        ObligationClock {
            authority: Authority::PrimaryRegulator,
            deadline_at: deadline,
            filed_at: filed,
        }
    }

    #[test]
    fn next_deadline_picks_earliest_unfiled() {
        let obligations = [
            clock(Some(at(20)), None),
            clock(Some(at(10)), None),
            // Filed — out of contention even with the earliest deadline.
            clock(Some(at(5)), Some(at(4))),
        ];
        assert_eq!(next_deadline(&obligations), Some(at(10)));
    }

    #[test]
    fn next_deadline_none_when_all_filed() {
        let obligations = [clock(Some(at(5)), Some(at(4)))];
        assert_eq!(next_deadline(&obligations), None);
        assert_eq!(next_deadline(&[]), None);
    }

    #[test]
    fn summary_prefers_pending_over_filed() {
        // One filed on time, one still pending: the badge shows the
        // countdown, not the filed state.
        let obligations = [
            clock(Some(at(5)), Some(at(4))),
            clock(Some(at(12)), None),
        ];
        let status = incident_summary_status(&obligations, None, None, at(9));
        assert_eq!(status.state, TimerState::Pending);
        assert_eq!(status.detail, "3h 00m remaining");
    }

    #[test]
    fn summary_all_filed_on_time() {
        let obligations = [
            clock(Some(at(5)), Some(at(4))),
            clock(Some(at(10)), Some(at(10))),
        ];
        let status = incident_summary_status(&obligations, None, None, at(20));
        assert_eq!(status.state, TimerState::Filed);
        assert_eq!(status.detail, "on time");
        assert_eq!(status.css_hint, "green");
    }

    #[test]
    fn summary_all_filed_any_late_is_late() {
        let obligations = [
            clock(Some(at(5)), Some(at(4))),
            clock(Some(at(10)), Some(at(11))),
        ];
        let status = incident_summary_status(&obligations, None, None, at(20));
        assert_eq!(status.detail, "late");
        assert_eq!(status.css_hint, "red");
    }

    #[test]
    fn summary_filed_without_deadline_is_unjudged() {
        let obligations = [clock(None, Some(at(4)))];
        let status = incident_summary_status(&obligations, None, None, at(20));
        assert_eq!(status.state, TimerState::Filed);
        assert_eq!(status.detail, "unknown");
    }

    #[test]
    fn summary_obligations_override_legacy_fields() {
        // Legacy fields say "reported"; the pending obligation wins.
        let obligations = [clock(Some(at(12)), None)];
        let status = incident_summary_status(&obligations, Some(at(0)), Some(at(1)), at(9));
        assert_eq!(status.state, TimerState::Pending);
    }

    #[test]
    fn summary_falls_back_to_legacy_clock() {
        // No obligations: the 72 h clock over aware_at applies.
        let status = incident_summary_status(&[], Some(at(0)), None, at(10));
        assert_eq!(status.state, TimerState::Pending);
        assert_eq!(status.detail, "62h 00m remaining");

        let reported = incident_summary_status(&[], Some(at(0)), Some(at(10)), at(20));
        assert_eq!(reported.state, TimerState::Filed);
        assert_eq!(reported.detail, "on time");
    }

    #[test]
    fn summary_legacy_without_aware_at_is_unknown() {
        let status = incident_summary_status(&[], None, None, at(10));
        assert_eq!(status.state, TimerState::Unknown);
    }
}
