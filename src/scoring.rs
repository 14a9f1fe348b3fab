//! Activity score
//!
//! Fixed linear weights over the cumulative counters:
//! `min(100, floor(clicks * 1.8) + floor(keys * 0.6) + floor(focus * 5))`.
//! Each term is floored before the sum, so the weights are applied in tenths
//! with integer division.

/// Upper bound of the score
pub const MAX_SCORE: u32 = 100;

/// Scores strictly above this are considered high activity
pub const ACTIVITY_SCORE_THRESHOLD: u32 = 80;

const CLICK_WEIGHT_TENTHS: u64 = 18;
const KEY_WEIGHT_TENTHS: u64 = 6;
const FOCUS_WEIGHT: u64 = 5;

/// Compute the bounded activity score from cumulative counters.
pub fn compute_score(clicks: u64, keys: u64, focus: u64) -> u32 {
    let click_term = clicks.saturating_mul(CLICK_WEIGHT_TENTHS) / 10;
    let key_term = keys.saturating_mul(KEY_WEIGHT_TENTHS) / 10;
    let focus_term = focus.saturating_mul(FOCUS_WEIGHT);

    let sum = click_term
        .saturating_add(key_term)
        .saturating_add(focus_term);

    sum.min(MAX_SCORE as u64) as u32
}

/// Whether a score should be flagged as high activity
pub fn is_elevated(score: u32, threshold: u32) -> bool {
    score > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_counters() {
        assert_eq!(compute_score(0, 0, 0), 0);
    }

    #[test]
    fn test_terms_floored_individually() {
        // 1.8 + 0.6 would be 2.4 -> 2 if summed first; floored terms give 1 + 0
        assert_eq!(compute_score(1, 1, 0), 1);
        // 3 * 1.8 = 5.4 -> 5, 5 * 0.6 = 3.0 -> 3, 2 * 5 = 10
        assert_eq!(compute_score(3, 5, 2), 18);
    }

    #[test]
    fn test_focus_heavy_score() {
        assert_eq!(compute_score(0, 0, 17), 85);
        assert!(is_elevated(85, ACTIVITY_SCORE_THRESHOLD));
        assert!(!is_elevated(80, ACTIVITY_SCORE_THRESHOLD));
    }

    #[test]
    fn test_clamped_to_max() {
        assert_eq!(compute_score(1000, 1000, 1000), MAX_SCORE);
        assert_eq!(compute_score(u64::MAX, u64::MAX, u64::MAX), MAX_SCORE);
    }

    #[test]
    fn test_monotonic_in_each_counter() {
        for base in 0..40u64 {
            let s = compute_score(base, base / 2, base / 3);
            assert!(compute_score(base + 1, base / 2, base / 3) >= s);
            assert!(compute_score(base, base / 2 + 1, base / 3) >= s);
            assert!(compute_score(base, base / 2, base / 3 + 1) >= s);
            assert!(s <= MAX_SCORE);
        }
    }
}
