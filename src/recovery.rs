//! Recovery and strain aggregation
//!
//! Combines the per-channel sub-scores into the final [`ScoreReport`]:
//! a weighted recovery score, a calorie-derived strain score, a strain
//! target band, and a training recommendation.
//!
//! The reference instant `now` is injected rather than read from the wall
//! clock, so a run is reproducible: the same tables and the same `now`
//! always produce the same report.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::baseline::BaselineEstimator;
use crate::config::AnalysisConfig;
use crate::daily::DailySelector;
use crate::error::Result;
use crate::models::{
    Channel, HealthData, HrvMetrics, MetricsBreakdown, Recommendation, RestingHrMetrics,
    ScoreReport, SleepMetrics, StrainTarget,
};
use crate::scoring::SubScorer;

/// Recovery weighting: sleep and HRV carry most of the signal, resting HR
/// is deliberately weighted lower.
pub const SLEEP_WEIGHT: f64 = 0.4;
pub const HRV_WEIGHT: f64 = 0.4;
pub const RESTING_HR_WEIGHT: f64 = 0.2;

/// Strain is active calories on a 0-21 exertion scale, 50 kcal per point.
pub const STRAIN_CALORIES_PER_POINT: f64 = 50.0;
pub const STRAIN_MAX: f64 = 21.0;

/// Core scoring engine
pub struct RecoveryCalculator;

impl RecoveryCalculator {
    /// Score one snapshot of the health tables as of `now`
    ///
    /// Missing daily values recover through the configured fallbacks; an
    /// empty baseline window for HRV or resting HR is a hard error.
    pub fn calculate(
        data: &HealthData,
        now: DateTime<Utc>,
        config: &AnalysisConfig,
    ) -> Result<ScoreReport> {
        let selector = DailySelector::new(now, config.fallback);
        let estimator = BaselineEstimator::new(now, config.baseline_window_days);

        let hrv_value = selector.hrv(&data.hrv);
        let hrv_baseline = estimator.mean(&data.hrv, Channel::Hrv)?;
        let hrv_pct = SubScorer::pct_vs_baseline(hrv_value, hrv_baseline);

        let rhr_value = selector.resting_hr(&data.resting_hr);
        let rhr_baseline = estimator.mean(&data.resting_hr, Channel::RestingHr)?;

        let sleep = selector.sleep(&data.sleep);
        let calories = selector.calories(&data.calories);

        let sleep_sub = SubScorer::sleep(sleep.total);
        let hrv_sub = SubScorer::hrv(hrv_value, hrv_baseline);
        let rhr_sub = SubScorer::resting_hr(rhr_value, rhr_baseline);

        debug!(
            sleep_sub,
            hrv_sub, rhr_sub, "sub-scores before weighting"
        );

        let recovery_score = Self::recovery_score(sleep_sub, hrv_sub, rhr_sub);
        let strain_score = Self::strain_score(calories);
        let strain_target = StrainTarget::from_recovery(recovery_score);
        let recommendation = Recommendation::from_recovery(recovery_score);

        info!(
            recovery_score,
            strain_score,
            strain_target = %strain_target,
            "snapshot scored"
        );

        Ok(ScoreReport {
            recovery_score,
            strain_score,
            strain_target,
            recommendation: recommendation.message().to_string(),
            metrics: MetricsBreakdown {
                sleep: SleepMetrics {
                    hours: sleep.hours,
                    minutes: sleep.minutes,
                    total_hours: round_to(sleep.total, 1),
                },
                hrv: HrvMetrics {
                    value: round_to(hrv_value, 1),
                    baseline: round_to(hrv_baseline, 1),
                    vs_baseline_pct: round_to(hrv_pct, 1),
                },
                resting_hr: RestingHrMetrics {
                    value: rhr_value.round() as i64,
                    baseline: rhr_baseline.round() as i64,
                    vs_baseline_bpm: (rhr_value - rhr_baseline).round() as i64,
                },
                calories: calories.round() as i64,
            },
        })
    }

    /// Weighted recovery score, rounded to the nearest integer
    ///
    /// Rounding policy: half-away-from-zero (`f64::round`). An exact 67.5
    /// therefore rounds up to 68.
    pub fn recovery_score(sleep_sub: f64, hrv_sub: f64, rhr_sub: f64) -> u8 {
        let weighted =
            sleep_sub * SLEEP_WEIGHT + hrv_sub * HRV_WEIGHT + rhr_sub * RESTING_HR_WEIGHT;
        weighted.round().clamp(0.0, 100.0) as u8
    }

    /// Daily strain from active calories, clamped to [0, 21], one decimal
    pub fn strain_score(calories: f64) -> f64 {
        let strain = (calories / STRAIN_CALORIES_PER_POINT).clamp(0.0, STRAIN_MAX);
        round_to(strain, 1)
    }
}

/// Round to `decimals` decimal places, half away from zero
fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
