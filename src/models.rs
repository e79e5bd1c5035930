//! Core data structures for health metrics and score reports
//!
//! The extraction step (XML export or pre-extracted CSV tables) produces one
//! ordered [`Reading`] sequence per biometric channel, plus a sequence of
//! [`SleepInterval`]s. The scoring engine consumes these tables read-only and
//! produces a single [`ScoreReport`] snapshot per run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Biometric channels tracked by the scoring engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    /// Heart-rate variability (SDNN, milliseconds)
    Hrv,
    /// Resting heart rate (beats per minute)
    RestingHr,
    /// Sleep intervals (hours)
    Sleep,
    /// Active energy burned (kilocalories)
    Calories,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Hrv => write!(f, "HRV"),
            Channel::RestingHr => write!(f, "Resting HR"),
            Channel::Sleep => write!(f, "Sleep"),
            Channel::Calories => write!(f, "Calories"),
        }
    }
}

/// A single timestamped metric reading
///
/// Readings are immutable once extracted and kept in source order.
/// Duplicate timestamps are possible in Apple Health exports; when selecting
/// a daily value the last reading in source order wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// UTC-normalized measurement instant
    pub timestamp: DateTime<Utc>,
    /// Metric value in the channel's native unit
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Reading { timestamp, value }
    }
}

/// One sleep session as exported (naps and fragmented sleep appear as
/// separate intervals that share a start date)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepInterval {
    /// UTC-normalized session start
    pub start: DateTime<Utc>,
    /// UTC-normalized session end
    pub end: DateTime<Utc>,
}

impl SleepInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        SleepInterval { start, end }
    }

    /// Interval duration in hours
    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}

/// The four metric tables produced by extraction
///
/// Each table is ordered chronologically as it appeared in the source export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthData {
    /// HRV readings in milliseconds
    pub hrv: Vec<Reading>,
    /// Resting heart rate readings in bpm
    pub resting_hr: Vec<Reading>,
    /// Sleep sessions
    pub sleep: Vec<SleepInterval>,
    /// Active calorie readings in kcal
    pub calories: Vec<Reading>,
}

impl HealthData {
    /// Total record count across all tables
    pub fn record_count(&self) -> usize {
        self.hrv.len() + self.resting_hr.len() + self.sleep.len() + self.calories.len()
    }
}

/// Strain target band derived from the recovery score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrainTarget {
    /// Recovery ≥ 70: room for a hard effort
    #[serde(rename = "15-18")]
    Hard,
    /// Recovery 50-69: moderate effort
    #[serde(rename = "10-14")]
    Moderate,
    /// Recovery < 50: keep exertion light
    #[serde(rename = "6-9")]
    Light,
}

impl StrainTarget {
    /// Band selection is a step function of the rounded recovery score
    pub fn from_recovery(recovery_score: u8) -> Self {
        if recovery_score >= 70 {
            StrainTarget::Hard
        } else if recovery_score >= 50 {
            StrainTarget::Moderate
        } else {
            StrainTarget::Light
        }
    }

    /// Display band, e.g. "15-18"
    pub fn band(&self) -> &'static str {
        match self {
            StrainTarget::Hard => "15-18",
            StrainTarget::Moderate => "10-14",
            StrainTarget::Light => "6-9",
        }
    }
}

impl fmt::Display for StrainTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.band())
    }
}

/// Daily training recommendation derived from the recovery score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Recovery ≥ 70
    TrainHard,
    /// Recovery 50-69
    Moderate,
    /// Recovery < 50
    Rest,
}

impl Recommendation {
    /// Same three-way split as [`StrainTarget::from_recovery`]
    pub fn from_recovery(recovery_score: u8) -> Self {
        if recovery_score >= 70 {
            Recommendation::TrainHard
        } else if recovery_score >= 50 {
            Recommendation::Moderate
        } else {
            Recommendation::Rest
        }
    }

    /// User-facing recommendation text
    pub fn message(&self) -> &'static str {
        match self {
            Recommendation::TrainHard => "Your body is primed for a hard workout today!",
            Recommendation::Moderate => "Moderate activity recommended. Listen to your body.",
            Recommendation::Rest => "Prioritize rest and recovery today.",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Sleep portion of the metrics breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepMetrics {
    /// Whole hours slept
    pub hours: u32,
    /// Remaining minutes
    pub minutes: u32,
    /// Undecomposed duration in hours, one decimal
    pub total_hours: f64,
}

/// HRV portion of the metrics breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HrvMetrics {
    /// Resolved daily HRV in ms, one decimal
    pub value: f64,
    /// 30-day trailing mean in ms, one decimal
    pub baseline: f64,
    /// Percent deviation from baseline, one decimal
    pub vs_baseline_pct: f64,
}

/// Resting-HR portion of the metrics breakdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestingHrMetrics {
    /// Resolved daily resting HR in bpm
    pub value: i64,
    /// 30-day trailing mean in bpm
    pub baseline: i64,
    /// Deviation from baseline in bpm
    pub vs_baseline_bpm: i64,
}

/// Resolved values and baselines echoed back in the report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsBreakdown {
    pub sleep: SleepMetrics,
    pub hrv: HrvMetrics,
    pub resting_hr: RestingHrMetrics,
    /// Active calories burned today, whole kcal
    pub calories: i64,
}

/// The output snapshot of one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Weighted recovery score, 0-100
    pub recovery_score: u8,
    /// Daily strain on the 0-21 exertion scale, one decimal
    pub strain_score: f64,
    /// Suggested strain band for today
    pub strain_target: StrainTarget,
    /// Three-tier training recommendation
    pub recommendation: String,
    /// Resolved per-channel values and baselines
    pub metrics: MetricsBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sleep_interval_duration() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 22, 30, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 3, 11, 6, 0, 0).unwrap();
        let interval = SleepInterval::new(start, end);
        assert!((interval.duration_hours() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_strain_target_boundaries() {
        assert_eq!(StrainTarget::from_recovery(70), StrainTarget::Hard);
        assert_eq!(StrainTarget::from_recovery(69), StrainTarget::Moderate);
        assert_eq!(StrainTarget::from_recovery(50), StrainTarget::Moderate);
        assert_eq!(StrainTarget::from_recovery(49), StrainTarget::Light);
    }

    #[test]
    fn test_strain_target_serializes_as_band() {
        let json = serde_json::to_string(&StrainTarget::Hard).unwrap();
        assert_eq!(json, "\"15-18\"");
        let json = serde_json::to_string(&StrainTarget::Light).unwrap();
        assert_eq!(json, "\"6-9\"");
    }

    #[test]
    fn test_recommendation_tiers_match_targets() {
        for score in 0..=100u8 {
            let rec = Recommendation::from_recovery(score);
            let target = StrainTarget::from_recovery(score);
            match target {
                StrainTarget::Hard => assert_eq!(rec, Recommendation::TrainHard),
                StrainTarget::Moderate => assert_eq!(rec, Recommendation::Moderate),
                StrainTarget::Light => assert_eq!(rec, Recommendation::Rest),
            }
        }
    }
}
