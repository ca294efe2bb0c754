use std::collections::HashMap;

/// Remaining seats for a session given its declared capacity and the count of
/// active (booked or checked-in) bookings. `None` capacity means unlimited,
/// so no seat accounting is attempted. Never negative.
pub fn compute_remaining(capacity: Option<u32>, active_bookings: u32) -> Option<u32> {
    capacity.map(|cap| cap.saturating_sub(active_bookings))
}

/// Best-effort per-session seat counts held between full refreshes.
///
/// The ledger mirrors the server's aggregate counts at fetch time and accepts
/// immediate local deltas after a booking or cancellation commits, so callers
/// can show the new count without waiting for the next refresh. The next full
/// refresh replaces the ledger wholesale; a disagreement with the server is
/// resolved by the refresh value winning silently.
#[derive(Debug, Clone, Default)]
pub struct SeatLedger {
    seats: HashMap<String, Option<u32>>,
}

impl SeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the remaining count for a session as of the current fetch
    /// cycle. `None` marks the session as unlimited.
    pub fn record(&mut self, session_id: impl Into<String>, remaining: Option<u32>) {
        self.seats.insert(session_id.into(), remaining);
    }

    /// Last known remaining count, flattened: unknown sessions and unlimited
    /// sessions both read as `None`.
    pub fn remaining(&self, session_id: &str) -> Option<u32> {
        self.seats.get(session_id).copied().flatten()
    }

    /// Applies a client-only ±1 correction after a commit. No-ops when the
    /// cached value is unlimited or the session is unknown: the ledger never
    /// invents a bound. The result stays clamped at zero.
    pub fn adjust(&mut self, session_id: &str, delta: i32) {
        if let Some(Some(current)) = self.seats.get(session_id).copied() {
            let adjusted = (i64::from(current) + i64::from(delta)).max(0) as u32;
            self.seats.insert(session_id.to_string(), Some(adjusted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_remaining_basic() {
        assert_eq!(compute_remaining(Some(10), 3), Some(7));
        assert_eq!(compute_remaining(Some(10), 10), Some(0));
    }

    #[test]
    fn test_compute_remaining_clamps_at_zero() {
        assert_eq!(compute_remaining(Some(5), 8), Some(0));
    }

    #[test]
    fn test_compute_remaining_unlimited() {
        assert_eq!(compute_remaining(None, 0), None);
        assert_eq!(compute_remaining(None, 100), None);
    }

    #[test]
    fn test_adjust_after_booking() {
        let mut ledger = SeatLedger::new();
        ledger.record("s1", compute_remaining(Some(5), 3));
        assert_eq!(ledger.remaining("s1"), Some(2));
        ledger.adjust("s1", -1);
        assert_eq!(ledger.remaining("s1"), Some(1));
    }

    #[test]
    fn test_adjust_after_cancel_restores_seat() {
        let mut ledger = SeatLedger::new();
        ledger.record("s1", Some(0));
        ledger.adjust("s1", 1);
        assert_eq!(ledger.remaining("s1"), Some(1));
    }

    #[test]
    fn test_adjust_never_goes_negative() {
        let mut ledger = SeatLedger::new();
        ledger.record("s1", Some(0));
        ledger.adjust("s1", -1);
        assert_eq!(ledger.remaining("s1"), Some(0));
    }

    #[test]
    fn test_adjust_noop_on_unlimited() {
        let mut ledger = SeatLedger::new();
        ledger.record("s1", None);
        ledger.adjust("s1", -1);
        assert_eq!(ledger.remaining("s1"), None);
    }

    #[test]
    fn test_adjust_noop_on_unknown_session() {
        let mut ledger = SeatLedger::new();
        ledger.adjust("missing", -1);
        assert_eq!(ledger.remaining("missing"), None);
    }
}
