//! Return-rate calculation.

/// Reliability score derived from a member's borrow history.
///
/// `max(0, 100 - overdue/total * 100)`. A member with no history is fully
/// trusted: the rate is defined as 100 for `total = 0`, which is only used
/// as the initial default — the sweeper never recomputes zero-history
/// members.
pub fn return_rate(total: i64, overdue: i64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    let rate = 100.0 - (overdue as f64 / total as f64) * 100.0;
    rate.max(0.0)
}

/// Members below this rate are blocked from borrowing.
pub const MIN_BORROW_RATE: f64 = 30.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_is_fully_trusted() {
        assert_eq!(return_rate(0, 0), 100.0);
    }

    #[test]
    fn test_no_overdue_keeps_full_rate() {
        assert_eq!(return_rate(10, 0), 100.0);
    }

    #[test]
    fn test_partial_overdue() {
        assert_eq!(return_rate(4, 1), 75.0);
        assert_eq!(return_rate(10, 3), 70.0);
    }

    #[test]
    fn test_all_overdue_clamps_to_zero() {
        assert_eq!(return_rate(5, 5), 0.0);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        // Sweeping twice with the same counts must produce the same rate.
        let first = return_rate(8, 2);
        let second = return_rate(8, 2);
        assert_eq!(first, second);
    }
}
