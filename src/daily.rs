//! Daily value selection
//!
//! Picks the single scalar that represents "today" (or "last night" for
//! sleep) from each metric table. Missing data is not an error here: each
//! channel recovers through the documented [`FallbackPolicy`] defaults and
//! the run proceeds.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Channel, Reading, SleepInterval};

/// Sleep durations above this are treated as duplicate or overlapping
/// export records and capped.
pub const SLEEP_CAP_HOURS: f64 = 12.0;

/// Defaults substituted when a channel has no reading for today or yesterday
///
/// These are an explicit "no data yet today" policy, not error handling.
/// Tests override them through [`crate::config::AnalysisConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Default HRV in milliseconds
    pub hrv_ms: f64,
    /// Default resting heart rate in bpm
    pub resting_hr_bpm: f64,
    /// Default sleep duration in hours
    pub sleep_hours: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy {
            hrv_ms: 67.0,
            resting_hr_bpm: 58.0,
            sleep_hours: 7.5,
        }
    }
}

/// Display decomposition of a sleep duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepDuration {
    /// Whole hours
    pub hours: u32,
    /// Remaining minutes
    pub minutes: u32,
    /// Undecomposed duration for scoring
    pub total: f64,
}

impl SleepDuration {
    pub fn from_hours(total: f64) -> Self {
        SleepDuration {
            hours: total as u32,
            minutes: ((total % 1.0) * 60.0) as u32,
            total,
        }
    }
}

/// Selects each channel's representative value for one calendar day
///
/// All date comparisons use the UTC calendar date of the UTC-normalized
/// timestamp; full instants are never compared.
#[derive(Debug, Clone)]
pub struct DailySelector {
    today: NaiveDate,
    yesterday: NaiveDate,
    policy: FallbackPolicy,
}

impl DailySelector {
    pub fn new(now: DateTime<Utc>, policy: FallbackPolicy) -> Self {
        let today = now.date_naive();
        // NaiveDate::MIN - 1 day cannot occur for any representable DateTime
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        DailySelector {
            today,
            yesterday,
            policy,
        }
    }

    /// Today's HRV in ms, falling back to yesterday, then the policy default
    pub fn hrv(&self, readings: &[Reading]) -> f64 {
        self.latest_for_day(readings, self.today)
            .or_else(|| self.latest_for_day(readings, self.yesterday))
            .unwrap_or_else(|| {
                debug!(channel = %Channel::Hrv, default = self.policy.hrv_ms, "no reading today or yesterday, using fallback");
                self.policy.hrv_ms
            })
    }

    /// Today's resting HR in bpm, same fallback chain as HRV
    pub fn resting_hr(&self, readings: &[Reading]) -> f64 {
        self.latest_for_day(readings, self.today)
            .or_else(|| self.latest_for_day(readings, self.yesterday))
            .unwrap_or_else(|| {
                debug!(channel = %Channel::RestingHr, default = self.policy.resting_hr_bpm, "no reading today or yesterday, using fallback");
                self.policy.resting_hr_bpm
            })
    }

    /// Last night's sleep duration in hours
    ///
    /// Sleep is attributed to the night it started: intervals whose start
    /// date is yesterday are summed, so naps and fragmented sleep all count.
    /// The sum is capped at [`SLEEP_CAP_HOURS`].
    pub fn sleep(&self, intervals: &[SleepInterval]) -> SleepDuration {
        let mut matched = false;
        let mut total = 0.0;
        for interval in intervals {
            if interval.start.date_naive() == self.yesterday {
                matched = true;
                total += interval.duration_hours();
            }
        }

        let hours = if matched {
            total.min(SLEEP_CAP_HOURS)
        } else {
            debug!(channel = %Channel::Sleep, default = self.policy.sleep_hours, "no sleep intervals for last night, using fallback");
            self.policy.sleep_hours
        };

        SleepDuration::from_hours(hours)
    }

    /// Active calories burned today
    ///
    /// Calories accumulate across the day, so all of today's readings are
    /// summed. An empty day is simply 0 kcal, not a fallback.
    pub fn calories(&self, readings: &[Reading]) -> f64 {
        readings
            .iter()
            .filter(|r| r.timestamp.date_naive() == self.today)
            .map(|r| r.value)
            .sum()
    }

    /// Last reading (in source order) dated `day`, if any
    fn latest_for_day(&self, readings: &[Reading], day: NaiveDate) -> Option<f64> {
        readings
            .iter()
            .filter(|r| r.timestamp.date_naive() == day)
            .last()
            .map(|r| r.value)
    }
}
