//! Rolling baseline estimation
//!
//! HRV and resting-HR sub-scores are normalized against a personal
//! reference point: the arithmetic mean of all readings in a trailing
//! 30-day window ending now, inclusive of today's reading if present.
//! Sleep and calories carry no baseline.

use chrono::{DateTime, Duration, Utc};
use statrs::statistics::Statistics;

use crate::error::CalculationError;
use crate::models::{Channel, Reading};

/// Default trailing window length in days
pub const BASELINE_WINDOW_DAYS: i64 = 30;

/// Computes the trailing mean used as a personal reference point
#[derive(Debug, Clone, Copy)]
pub struct BaselineEstimator {
    cutoff: DateTime<Utc>,
}

impl BaselineEstimator {
    /// Window covers `[now - window_days, ..]` with no upper bound
    pub fn new(now: DateTime<Utc>, window_days: i64) -> Self {
        BaselineEstimator {
            cutoff: now - Duration::days(window_days),
        }
    }

    /// Mean of the windowed readings for `channel`
    ///
    /// An empty window leaves the mean undefined; that is surfaced as
    /// [`CalculationError::InsufficientBaselineData`] rather than a NaN,
    /// since a guessed baseline would skew every downstream sub-score.
    pub fn mean(&self, readings: &[Reading], channel: Channel) -> Result<f64, CalculationError> {
        let windowed: Vec<f64> = readings
            .iter()
            .filter(|r| r.timestamp >= self.cutoff)
            .map(|r| r.value)
            .collect();

        if windowed.is_empty() {
            return Err(CalculationError::InsufficientBaselineData { channel });
        }

        Ok(windowed.mean())
    }
}
