//! Single-clock timer classification and duration rendering.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hours in the legacy single-clock notification window.
pub const LEGACY_WINDOW_HOURS: i64 = 72;

/// Classification of a deadline clock at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Deadline is in the future and nothing has been filed.
    Pending,
    /// Deadline has passed and nothing has been filed.
    Overdue,
    /// A submission has been recorded.
    Filed,
    /// Not enough data to classify (no aware-at / no deadline).
    Unknown,
}

impl TimerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Overdue => "overdue",
            Self::Filed => "filed",
            Self::Unknown => "unknown",
        }
    }
}

/// The timer badge consumed directly by a rendering layer: a state, a
/// human-readable detail, and a css hint (`"red"`, `"green"`, or `""`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStatus {
    pub state: TimerState,
    pub detail: String,
    pub css_hint: String,
}

impl TimerStatus {
    fn unknown() -> Self {
        Self {
            state: TimerState::Unknown,
            detail: "unknown".to_string(),
            css_hint: String::new(),
        }
    }

    pub(crate) fn filed(detail: &str) -> Self {
        Self {
            state: TimerState::Filed,
            detail: detail.to_string(),
            css_hint: match detail {
                "on time" => "green",
                "late" => "red",
                _ => "",
            }
            .to_string(),
        }
    }
}

/// Compute a deadline from an aware-at timestamp and a notification window.
///
/// Returns `None` when the organisation has not recorded when it became
/// aware — no clock can run without a start.
pub fn compute_deadline(
    aware_at: Option<DateTime<Utc>>,
    window: Duration,
) -> Option<DateTime<Utc>> {
    aware_at.map(|t| t + window)
}

/// Render a duration as `"41h 07m"`. Always computed from the absolute
/// value — a negative duration is never displayed.
pub fn humanize(delta: Duration) -> String {
    let total_minutes = delta.num_minutes().abs();
    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);
    format!("{hours}h {minutes:02}m")
}

/// Render the lag between awareness and reporting as `"Hh MMm"`, clamped
/// to zero. Used by exports. `None` when either timestamp is missing.
pub fn reported_lag(
    aware_at: Option<DateTime<Utc>>,
    reported_at: Option<DateTime<Utc>>,
) -> Option<String> {
    let (aware, reported) = (aware_at?, reported_at?);
    let lag = (reported - aware).max(Duration::zero());
    Some(humanize(lag))
}

/// Classify one clock against its deadline.
///
/// Rules, in order:
///
/// 1. filed-at set → `Filed`; detail `"on time"` iff `filed_at <= deadline_at`
///    (non-strict: filing exactly at the deadline is on time), `"late"`
///    otherwise, `"unknown"` when there is no deadline to compare against;
/// 2. no deadline → `Unknown`;
/// 3. now before deadline → `Pending`, detail is the remaining duration;
/// 4. otherwise → `Overdue`, detail is the elapsed duration.
pub fn timer_status(
    deadline_at: Option<DateTime<Utc>>,
    filed_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> TimerStatus {
    if let Some(filed) = filed_at {
        return match deadline_at {
            Some(deadline) if filed <= deadline => TimerStatus::filed("on time"),
            Some(_) => TimerStatus::filed("late"),
            None => TimerStatus::filed("unknown"),
        };
    }

    let Some(deadline) = deadline_at else {
        return TimerStatus::unknown();
    };

    if now < deadline {
        TimerStatus {
            state: TimerState::Pending,
            detail: format!("{} remaining", humanize(deadline - now)),
            css_hint: String::new(),
        }
    } else {
        TimerStatus {
            state: TimerState::Overdue,
            detail: format!("{} overdue", humanize(now - deadline)),
            css_hint: "red".to_string(),
        }
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
    fn deadline_is_aware_plus_window() {
        let aware = at(0);
        let deadline = compute_deadline(Some(aware), Duration::hours(72)).unwrap();
        assert_eq!(deadline, aware + Duration::hours(72));
    }

    #[test]
    fn deadline_is_none_without_aware_at() {
        assert_eq!(compute_deadline(None, Duration::hours(72)), None);
    }

    #[test]
    fn pending_before_deadline() {
        let status = timer_status(Some(at(10)), None, at(8));
        assert_eq!(status.state, TimerState::Pending);
        assert_eq!(status.detail, "2h 00m remaining");
        assert_eq!(status.css_hint, "");
    }

    #[test]
    fn overdue_after_deadline() {
        let status = timer_status(Some(at(8)), None, at(11));
        assert_eq!(status.state, TimerState::Overdue);
        assert_eq!(status.detail, "3h 00m overdue");
        assert_eq!(status.css_hint, "red");
    }

    #[test]
    fn filed_before_deadline_is_on_time() {
        let status = timer_status(Some(at(10)), Some(at(9)), at(12));
        assert_eq!(status.state, TimerState::Filed);
        assert_eq!(status.detail, "on time");
        assert_eq!(status.css_hint, "green");
    }

    #[test]
    fn filed_exactly_at_deadline_is_on_time() {
        // Non-strict boundary: filed_at == deadline_at is on time, not late.
        let status = timer_status(Some(at(10)), Some(at(10)), at(12));
        assert_eq!(status.detail, "on time");
    }

    #[test]
    fn filed_after_deadline_is_late() {
        let status = timer_status(Some(at(10)), Some(at(11)), at(12));
        assert_eq!(status.state, TimerState::Filed);
        assert_eq!(status.detail, "late");
        assert_eq!(status.css_hint, "red");
    }

    #[test]
    fn filed_without_deadline_has_no_judgment() {
        let status = timer_status(None, Some(at(11)), at(12));
        assert_eq!(status.state, TimerState::Filed);
        assert_eq!(status.detail, "unknown");
        assert_eq!(status.css_hint, "");
    }

    #[test]
    fn no_data_is_unknown() {
        let status = timer_status(None, None, at(12));
        assert_eq!(status.state, TimerState::Unknown);
    }

    #[test]
    fn humanize_never_negative() {
        assert_eq!(humanize(Duration::minutes(-185)), "3h 05m");
        assert_eq!(humanize(Duration::minutes(185)), "3h 05m");
    }

    #[test]
    fn reported_lag_clamps_to_zero() {
        // Reported before aware (clock skew in entry) renders as zero.
        assert_eq!(
            reported_lag(Some(at(10)), Some(at(8))).unwrap(),
            "0h 00m"
        );
        assert_eq!(
            reported_lag(Some(at(8)), Some(at(10))).unwrap(),
            "2h 00m"
        );
        assert_eq!(reported_lag(None, Some(at(10))), None);
    }

    #[test]
    fn timer_state_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&TimerState::Overdue).unwrap(),
            "\"overdue\""
        );
    }
}
