use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::capacity::SeatLedger;
use crate::cancellation;
use crate::eligibility::{self, MemberContext};
use crate::models::{BookingRef, BookingRow, BookingStatus, CategoryRow, SessionRow, SessionView};

/// Label shown for sessions whose category is missing or unknown to the
/// categories lookup. Absent category metadata degrades the label only.
pub const FALLBACK_CATEGORY_LABEL: &str = "Class";

/// Groups the member's booking rows by session id, one bucket per session.
pub fn group_bookings_by_session(bookings: &[BookingRow]) -> HashMap<String, Vec<&BookingRow>> {
    let mut map: HashMap<String, Vec<&BookingRow>> = HashMap::new();
    for booking in bookings {
        map.entry(booking.session_id.clone()).or_default().push(booking);
    }
    map
}

/// Builds the category label lookup once per fetch cycle.
pub fn category_labels(categories: &[CategoryRow]) -> HashMap<String, String> {
    categories
        .iter()
        .map(|c| (c.id.clone(), c.name.clone()))
        .collect()
}

/// Picks the member's current booking for one session.
///
/// The store guarantees at most one active (booked/checked-in) row per
/// member and session; if it returns more anyway, the most recently created
/// one wins and the anomaly is logged. With no active row, the most recent
/// row of any status is shown so a canceled booking can be re-booked.
pub fn select_booking<'a>(session_id: &str, rows: &[&'a BookingRow]) -> Option<&'a BookingRow> {
    let active: Vec<&BookingRow> = rows
        .iter()
        .copied()
        .filter(|b| b.status != BookingStatus::Canceled)
        .collect();

    if active.len() > 1 {
        warn!(
            session_id,
            count = active.len(),
            "multiple non-canceled bookings for one session, keeping most recent"
        );
    }

    active
        .into_iter()
        .max_by_key(|b| b.created_at)
        .or_else(|| rows.iter().copied().max_by_key(|b| b.created_at))
}

/// Joins session rows, the member's bookings, seat counts, and category
/// labels into one `SessionView` per session. Single pass over the sessions;
/// all lookups go through maps built once per cycle.
pub fn build_views(
    sessions: &[SessionRow],
    ledger: &SeatLedger,
    member: &MemberContext,
    bookings: &[BookingRow],
    categories: &[CategoryRow],
    now: DateTime<Utc>,
) -> Vec<SessionView> {
    let by_session = group_bookings_by_session(bookings);
    let labels = category_labels(categories);
    let no_rows: Vec<&BookingRow> = Vec::new();

    sessions
        .iter()
        .map(|session| {
            let rows = by_session.get(&session.id).unwrap_or(&no_rows);
            let booking = select_booking(&session.id, rows);

            let remaining = ledger.remaining(&session.id);
            let is_full = session.capacity.is_some() && remaining == Some(0);

            let eligibility = eligibility::evaluate(session, member, is_full);
            let cancellation = cancellation::evaluate(
                booking.map(|b| b.status),
                session.starts_at,
                session.cancel_before_hours,
                now,
            );

            let category_label = session
                .category_id
                .as_ref()
                .and_then(|id| labels.get(id).cloned())
                .unwrap_or_else(|| FALLBACK_CATEGORY_LABEL.to_string());

            SessionView {
                session_id: session.id.clone(),
                title: session.title.clone(),
                description: session.description.clone(),
                starts_at: session.starts_at,
                ends_at: session.ends_at,
                category_label,
                capacity: session.capacity,
                remaining_seats: remaining,
                is_full,
                booking: booking.map(|b| BookingRef {
                    id: b.id.clone(),
                    status: b.status,
                }),
                can_book_with_membership: eligibility.can_book_with_membership,
                drop_in_offered: eligibility.drop_in_offered,
                drop_in_price: eligibility.drop_in_price,
                drop_in_locked: eligibility.drop_in_locked,
                cancellation,
            }
        })
        .collect()
}
