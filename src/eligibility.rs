use crate::models::{BookingKind, BookingRow, MemberProfile, MembershipRow, SessionRow};

/// Everything about the member that eligibility needs, computed once per
/// fetch cycle and read for every session.
#[derive(Debug, Clone)]
pub struct MemberContext {
    pub membership: Option<MembershipRow>,
    pub unpaid_drop_in_total: f64,
    pub max_dropin_debt: Option<f64>,
}

impl MemberContext {
    /// Builds the context from the member's membership row (at most one,
    /// selected by the store), profile, and full booking history. Unpaid
    /// drop-in charges are summed across all bookings regardless of status.
    pub fn new(
        membership: Option<MembershipRow>,
        profile: Option<&MemberProfile>,
        bookings: &[BookingRow],
    ) -> Self {
        let unpaid_drop_in_total = bookings
            .iter()
            .filter(|b| b.kind == BookingKind::DropIn && !b.drop_in_paid.unwrap_or(false))
            .filter_map(|b| b.drop_in_price)
            .sum();

        Self {
            membership,
            unpaid_drop_in_total,
            max_dropin_debt: profile.and_then(|p| p.max_dropin_debt),
        }
    }

    pub fn has_active_membership(&self) -> bool {
        self.membership.as_ref().is_some_and(MembershipRow::is_active)
    }

    /// Debt gate: at or above the ceiling, drop-in purchase is blocked for
    /// every session until the debt is reduced. No ceiling means no gate.
    pub fn drop_in_blocked_by_debt(&self) -> bool {
        self.max_dropin_debt
            .is_some_and(|ceiling| self.unpaid_drop_in_total >= ceiling)
    }
}

/// Per-session eligibility outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eligibility {
    pub can_book_with_membership: bool,
    pub drop_in_offered: bool,
    pub drop_in_price: Option<f64>,
    pub drop_in_locked: bool,
}

fn normalize(id: &str) -> String {
    id.trim().to_ascii_lowercase()
}

/// Whether the member's plan covers the session's category. An inactive or
/// missing membership covers nothing; an empty authorized set covers
/// everything; an uncategorized session is covered by any active plan.
pub fn membership_covers(membership: Option<&MembershipRow>, category_id: Option<&str>) -> bool {
    let Some(membership) = membership.filter(|m| m.is_active()) else {
        return false;
    };
    if membership.authorized_category_ids.is_empty() {
        return true;
    }
    let Some(category_id) = category_id else {
        return true;
    };
    let wanted = normalize(category_id);
    membership
        .authorized_category_ids
        .iter()
        .any(|id| normalize(id) == wanted)
}

/// Price shown for a drop-in on this session: the member-discounted price
/// when the member holds an active membership and the session defines one,
/// otherwise the base price. `None` means the drop-in is unpriced.
pub fn drop_in_price(session: &SessionRow, has_active_membership: bool) -> Option<f64> {
    if has_active_membership && session.member_drop_in_price.is_some() {
        session.member_drop_in_price
    } else {
        session.drop_in_price
    }
}

/// Evaluates one session for one member. Pure: identical inputs yield
/// identical output, and no input record is mutated.
pub fn evaluate(session: &SessionRow, member: &MemberContext, is_full: bool) -> Eligibility {
    let can_book_with_membership =
        membership_covers(member.membership.as_ref(), session.category_id.as_deref());
    let drop_in_locked = member.drop_in_blocked_by_debt();

    // Drop-in surfaces only when membership booking is not already satisfied
    // and a seat actually remains.
    let drop_in_offered =
        !can_book_with_membership && !is_full && session.drop_in_enabled() && !drop_in_locked;

    Eligibility {
        can_book_with_membership,
        drop_in_offered,
        drop_in_price: drop_in_price(session, member.has_active_membership()),
        drop_in_locked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use chrono::Utc;

    fn session(category: Option<&str>) -> SessionRow {
        SessionRow {
            id: "s1".into(),
            title: "WOD".into(),
            description: None,
            starts_at: Utc::now(),
            ends_at: None,
            capacity: Some(10),
            cancel_before_hours: None,
            category_id: category.map(String::from),
            drop_in_enabled: Some(true),
            drop_in_price: Some(12.0),
            member_drop_in_price: Some(8.0),
        }
    }

    fn membership(categories: &[&str]) -> MembershipRow {
        MembershipRow {
            id: "m1".into(),
            status: "active".into(),
            authorized_category_ids: categories.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn drop_in_booking(price: f64, paid: bool) -> BookingRow {
        BookingRow {
            id: "b1".into(),
            session_id: "s1".into(),
            status: BookingStatus::Booked,
            kind: BookingKind::DropIn,
            drop_in_price: Some(price),
            drop_in_paid: Some(paid),
            created_at: Utc::now(),
        }
    }

    fn member(membership: Option<MembershipRow>) -> MemberContext {
        MemberContext::new(membership, None, &[])
    }

    #[test]
    fn test_no_membership_means_not_eligible() {
        assert!(!membership_covers(None, Some("yoga")));
        assert!(!membership_covers(None, None));
    }

    #[test]
    fn test_inactive_membership_means_not_eligible() {
        let mut m = membership(&[]);
        m.status = "expired".into();
        assert!(!membership_covers(Some(&m), None));
    }

    #[test]
    fn test_empty_category_set_covers_everything() {
        let m = membership(&[]);
        assert!(membership_covers(Some(&m), Some("yoga")));
        assert!(membership_covers(Some(&m), Some("pilates")));
        assert!(membership_covers(Some(&m), None));
    }

    #[test]
    fn test_uncategorized_session_always_covered() {
        let m = membership(&["yoga"]);
        assert!(membership_covers(Some(&m), None));
    }

    #[test]
    fn test_category_match_is_normalized() {
        let m = membership(&[" Yoga "]);
        assert!(membership_covers(Some(&m), Some("yoga")));
        assert!(!membership_covers(Some(&m), Some("pilates")));
    }

    #[test]
    fn test_category_mismatch_offers_drop_in_at_member_price() {
        let m = member(Some(membership(&["yoga"])));
        let s = session(Some("pilates"));
        let out = evaluate(&s, &m, false);
        assert!(!out.can_book_with_membership);
        assert!(out.drop_in_offered);
        assert_eq!(out.drop_in_price, Some(8.0));
    }

    #[test]
    fn test_base_price_without_membership() {
        let m = member(None);
        let s = session(Some("pilates"));
        let out = evaluate(&s, &m, false);
        assert_eq!(out.drop_in_price, Some(12.0));
        assert!(out.drop_in_offered);
    }

    #[test]
    fn test_unpriced_drop_in_still_offered() {
        let m = member(None);
        let mut s = session(None);
        s.drop_in_price = None;
        s.member_drop_in_price = None;
        let out = evaluate(&s, &m, false);
        assert!(out.drop_in_offered);
        assert_eq!(out.drop_in_price, None);
    }

    #[test]
    fn test_full_session_suppresses_drop_in() {
        let m = member(None);
        let s = session(Some("pilates"));
        let out = evaluate(&s, &m, true);
        assert!(!out.drop_in_offered);
    }

    #[test]
    fn test_membership_eligible_suppresses_drop_in() {
        let m = member(Some(membership(&[])));
        let s = session(Some("yoga"));
        let out = evaluate(&s, &m, false);
        assert!(out.can_book_with_membership);
        assert!(!out.drop_in_offered);
    }

    #[test]
    fn test_debt_ceiling_blocks_drop_in_everywhere() {
        let profile = MemberProfile {
            id: "u1".into(),
            max_dropin_debt: Some(40.0),
        };
        let bookings = [drop_in_booking(30.0, false), drop_in_booking(20.0, false)];
        let m = MemberContext::new(None, Some(&profile), &bookings);
        assert_eq!(m.unpaid_drop_in_total, 50.0);
        assert!(m.drop_in_blocked_by_debt());

        let out = evaluate(&session(Some("pilates")), &m, false);
        assert!(!out.drop_in_offered);
        assert!(out.drop_in_locked);
    }

    #[test]
    fn test_paid_drop_ins_do_not_count_as_debt() {
        let profile = MemberProfile {
            id: "u1".into(),
            max_dropin_debt: Some(40.0),
        };
        let bookings = [drop_in_booking(30.0, true), drop_in_booking(20.0, false)];
        let m = MemberContext::new(None, Some(&profile), &bookings);
        assert_eq!(m.unpaid_drop_in_total, 20.0);
        assert!(!m.drop_in_blocked_by_debt());
    }

    #[test]
    fn test_no_ceiling_means_no_gate() {
        let bookings = [drop_in_booking(500.0, false)];
        let m = MemberContext::new(None, None, &bookings);
        assert!(!m.drop_in_blocked_by_debt());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let m = member(Some(membership(&["yoga"])));
        let s = session(Some("pilates"));
        assert_eq!(evaluate(&s, &m, false), evaluate(&s, &m, false));
    }
}
