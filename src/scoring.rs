//! Channel sub-scores
//!
//! Each channel's daily value is normalized into a bounded 0-100
//! contribution before weighting. All clamps are saturating: values below
//! 0 become 0, above 100 become 100.

/// Sleep hours that map to a sub-score of exactly 100
pub const OPTIMAL_SLEEP_HOURS: f64 = 8.0;

/// Normalizes raw daily values into 0-100 sub-scores
pub struct SubScorer;

impl SubScorer {
    /// Sleep sub-score: linear in hours, 8 h = 100
    ///
    /// More than 8 hours does not help further; the clamp absorbs it.
    pub fn sleep(hours: f64) -> f64 {
        clamp_score((hours / OPTIMAL_SLEEP_HOURS) * 100.0)
    }

    /// HRV sub-score: 50 at baseline, ±2 points per percent deviation
    ///
    /// Higher HRV than baseline indicates better recovery.
    pub fn hrv(value: f64, baseline: f64) -> f64 {
        let pct = (value - baseline) / baseline * 100.0;
        clamp_score(50.0 + pct * 2.0)
    }

    /// Resting-HR sub-score: 50 at baseline, ∓5 points per bpm deviation
    ///
    /// Elevated resting HR indicates incomplete recovery, so the slope is
    /// negative in `(value - baseline)`.
    pub fn resting_hr(value: f64, baseline: f64) -> f64 {
        let delta = value - baseline;
        clamp_score(50.0 - delta * 5.0)
    }

    /// Percent deviation of a value from its baseline
    pub fn pct_vs_baseline(value: f64, baseline: f64) -> f64 {
        (value - baseline) / baseline * 100.0
    }
}

/// Saturating clamp into the sub-score range [0, 100]
fn clamp_score(raw: f64) -> f64 {
    raw.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sleep_score_anchor_points() {
        assert_eq!(SubScorer::sleep(8.0), 100.0);
        assert_eq!(SubScorer::sleep(4.0), 50.0);
        assert_eq!(SubScorer::sleep(0.0), 0.0);
        // 9.5 h scores 100 after the clamp
        assert_eq!(SubScorer::sleep(9.5), 100.0);
        assert_eq!(SubScorer::sleep(12.0), 100.0);
    }

    #[test]
    fn test_hrv_score_at_baseline_is_fifty() {
        assert_eq!(SubScorer::hrv(65.0, 65.0), 50.0);
    }

    #[test]
    fn test_hrv_score_ten_percent_above_baseline() {
        // +10% deviation adds 20 points
        let score = SubScorer::hrv(71.5, 65.0);
        assert!((score - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_resting_hr_score_anchor_points() {
        assert_eq!(SubScorer::resting_hr(58.0, 58.0), 50.0);
        // 3 bpm below baseline adds 15 points
        assert_eq!(SubScorer::resting_hr(55.0, 58.0), 65.0);
        // 3 bpm above baseline subtracts 15 points
        assert_eq!(SubScorer::resting_hr(61.0, 58.0), 35.0);
    }

    #[test]
    fn test_clamp_saturates() {
        assert_eq!(SubScorer::hrv(200.0, 50.0), 100.0);
        assert_eq!(SubScorer::hrv(1.0, 50.0), 0.0);
        assert_eq!(SubScorer::resting_hr(90.0, 58.0), 0.0);
        assert_eq!(SubScorer::resting_hr(30.0, 58.0), 100.0);
    }

    proptest! {
        #[test]
        fn prop_sub_scores_stay_bounded(
            hours in 0.0f64..24.0,
            value in 10.0f64..200.0,
            baseline in 10.0f64..200.0,
        ) {
            for score in [
                SubScorer::sleep(hours),
                SubScorer::hrv(value, baseline),
                SubScorer::resting_hr(value, baseline),
            ] {
                prop_assert!((0.0..=100.0).contains(&score));
            }
        }

        #[test]
        fn prop_resting_hr_monotonically_decreasing(
            baseline in 40.0f64..80.0,
            lo in -20.0f64..20.0,
            bump in 0.01f64..20.0,
        ) {
            let a = SubScorer::resting_hr(baseline + lo, baseline);
            let b = SubScorer::resting_hr(baseline + lo + bump, baseline);
            prop_assert!(b <= a);
        }

        #[test]
        fn prop_hrv_monotonically_increasing(
            baseline in 20.0f64..120.0,
            lo in -20.0f64..20.0,
            bump in 0.01f64..20.0,
        ) {
            let a = SubScorer::hrv(baseline + lo, baseline);
            let b = SubScorer::hrv(baseline + lo + bump, baseline);
            prop_assert!(b >= a);
        }
    }
}
