use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::BookingStatus;

/// Whether an existing booking may still be canceled.
///
/// `Locked` is distinct from `NotOffered` on purpose: a cancel control inside
/// the lead-time window stays visible but inert, and the UI has to explain
/// why. `NotOffered` hides the control entirely (nothing to cancel, or the
/// session already started).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelAvailability {
    NotOffered,
    Locked,
    Allowed,
}

impl CancelAvailability {
    pub fn is_allowed(self) -> bool {
        matches!(self, CancelAvailability::Allowed)
    }
}

/// Evaluates the cancellation window for a booking against a session start
/// time. `cancel_before_hours == None` means no lead-time restriction.
pub fn evaluate(
    booking_status: Option<BookingStatus>,
    starts_at: DateTime<Utc>,
    cancel_before_hours: Option<u32>,
    now: DateTime<Utc>,
) -> CancelAvailability {
    if booking_status != Some(BookingStatus::Booked) {
        return CancelAvailability::NotOffered;
    }
    if starts_at <= now {
        return CancelAvailability::NotOffered;
    }
    match cancel_before_hours {
        None => CancelAvailability::Allowed,
        Some(threshold) => {
            if starts_at - now < Duration::hours(i64::from(threshold)) {
                CancelAvailability::Locked
            } else {
                CancelAvailability::Allowed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2026-03-02T08:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_not_offered_unless_booked() {
        let start = now() + Duration::hours(10);
        for status in [
            BookingStatus::CheckedIn,
            BookingStatus::Canceled,
            BookingStatus::NoShow,
        ] {
            assert_eq!(
                evaluate(Some(status), start, None, now()),
                CancelAvailability::NotOffered
            );
        }
        assert_eq!(
            evaluate(None, start, None, now()),
            CancelAvailability::NotOffered
        );
    }

    #[test]
    fn test_not_offered_for_past_session() {
        let start = now() - Duration::minutes(1);
        assert_eq!(
            evaluate(Some(BookingStatus::Booked), start, None, now()),
            CancelAvailability::NotOffered
        );
        assert_eq!(
            evaluate(Some(BookingStatus::Booked), now(), None, now()),
            CancelAvailability::NotOffered
        );
    }

    #[test]
    fn test_allowed_without_threshold() {
        let start = now() + Duration::minutes(5);
        assert_eq!(
            evaluate(Some(BookingStatus::Booked), start, None, now()),
            CancelAvailability::Allowed
        );
    }

    #[test]
    fn test_locked_inside_window() {
        // 2 hours out with a 4-hour threshold: visible but inert.
        let start = now() + Duration::hours(2);
        assert_eq!(
            evaluate(Some(BookingStatus::Booked), start, Some(4), now()),
            CancelAvailability::Locked
        );
    }

    #[test]
    fn test_allowed_outside_window() {
        let start = now() + Duration::hours(5);
        assert_eq!(
            evaluate(Some(BookingStatus::Booked), start, Some(4), now()),
            CancelAvailability::Allowed
        );
    }

    #[test]
    fn test_exact_threshold_is_allowed() {
        // hours-until-start == threshold is not strictly inside the window
        let start = now() + Duration::hours(4);
        assert_eq!(
            evaluate(Some(BookingStatus::Booked), start, Some(4), now()),
            CancelAvailability::Allowed
        );
    }
}
