//! Metric table import
//!
//! Two ways into the scoring engine: pre-extracted CSV tables (this module)
//! or the raw Apple Health `export.xml` ([`xml`]). Either way the result is
//! a [`HealthData`] with all timestamps normalized to UTC.
//!
//! Table schemas:
//! - `hrv.csv`        — `date,hrv`
//! - `resting_hr.csv` — `date,resting_hr`
//! - `sleep.csv`      — `start,end,value` (value is an unused category field)
//! - `calories.csv`   — `date,calories`
//!
//! A missing table or an unparseable timestamp aborts the run; there is no
//! partial-result mode.

pub mod xml;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::{Channel, HealthData, Reading, SleepInterval};

/// File names of the four extracted tables
pub const HRV_TABLE: &str = "hrv.csv";
pub const RESTING_HR_TABLE: &str = "resting_hr.csv";
pub const SLEEP_TABLE: &str = "sleep.csv";
pub const CALORIES_TABLE: &str = "calories.csv";

/// Load the four metric tables from `dir`
pub fn load_health_data(dir: &Path) -> Result<HealthData, ExtractionError> {
    let data = HealthData {
        hrv: load_reading_table(&dir.join(HRV_TABLE), Channel::Hrv, "date", "hrv")?,
        resting_hr: load_reading_table(
            &dir.join(RESTING_HR_TABLE),
            Channel::RestingHr,
            "date",
            "resting_hr",
        )?,
        sleep: load_sleep_table(&dir.join(SLEEP_TABLE))?,
        calories: load_reading_table(
            &dir.join(CALORIES_TABLE),
            Channel::Calories,
            "date",
            "calories",
        )?,
    };

    debug!(records = data.record_count(), dir = %dir.display(), "loaded metric tables");
    Ok(data)
}

/// Load a `{date, value}` table into readings, preserving source order
fn load_reading_table(
    path: &Path,
    channel: Channel,
    date_column: &str,
    value_column: &str,
) -> Result<Vec<Reading>, ExtractionError> {
    let mut reader = open_table(path, channel)?;
    let date_idx = column_index(&mut reader, path, date_column)?;
    let value_idx = column_index(&mut reader, path, value_column)?;

    let mut readings = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractionError::Csv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let timestamp = parse_instant(field(&record, date_idx), channel)?;
        let raw_value = field(&record, value_idx);
        let value = raw_value
            .parse::<f64>()
            .map_err(|_| ExtractionError::InvalidValue {
                channel,
                value: raw_value.to_string(),
            })?;
        readings.push(Reading::new(timestamp, value));
    }

    Ok(readings)
}

/// Load the sleep table; the trailing `value` category column is ignored
fn load_sleep_table(path: &Path) -> Result<Vec<SleepInterval>, ExtractionError> {
    let mut reader = open_table(path, Channel::Sleep)?;
    let start_idx = column_index(&mut reader, path, "start")?;
    let end_idx = column_index(&mut reader, path, "end")?;

    let mut intervals = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractionError::Csv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let start = parse_instant(field(&record, start_idx), Channel::Sleep)?;
        let end = parse_instant(field(&record, end_idx), Channel::Sleep)?;
        intervals.push(SleepInterval::new(start, end));
    }

    Ok(intervals)
}

fn open_table(
    path: &Path,
    channel: Channel,
) -> Result<csv::Reader<std::fs::File>, ExtractionError> {
    if !path.exists() {
        return Err(ExtractionError::MissingTable {
            channel,
            path: path.to_path_buf(),
        });
    }
    ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| ExtractionError::Csv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn column_index(
    reader: &mut csv::Reader<std::fs::File>,
    path: &Path,
    column: &str,
) -> Result<usize, ExtractionError> {
    // headers() on a fresh reader does not consume data records
    let headers = match reader.headers() {
        Ok(h) => h,
        Err(e) => {
            return Err(ExtractionError::Csv {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(column))
        .ok_or_else(|| ExtractionError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })
}

fn field(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

/// Parse a timestamp as a timezone-aware instant, normalized to UTC
///
/// Apple Health writes `2025-03-14 07:30:00 -0800`; RFC 3339 and a few
/// naive formats (assumed UTC) are accepted as well.
pub fn parse_instant(raw: &str, channel: Channel) -> Result<DateTime<Utc>, ExtractionError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    // bare dates land at UTC midnight
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    Err(ExtractionError::InvalidTimestamp {
        channel,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn write_tables(dir: &Path) {
        fs::write(
            dir.join(HRV_TABLE),
            "date,hrv\n2025-03-14 07:30:00 -0800,62.5\n2025-03-15 07:10:00 -0800,70.0\n",
        )
        .unwrap();
        fs::write(
            dir.join(RESTING_HR_TABLE),
            "date,resting_hr\n2025-03-15T06:00:00+00:00,55\n",
        )
        .unwrap();
        fs::write(
            dir.join(SLEEP_TABLE),
            "start,end,value\n2025-03-14 23:00:00 +0000,2025-03-15 07:00:00 +0000,HKCategoryValueSleepAnalysisAsleep\n",
        )
        .unwrap();
        fs::write(
            dir.join(CALORIES_TABLE),
            "date,calories\n2025-03-15 09:00:00 +0000,412.7\n",
        )
        .unwrap();
    }

    #[test]
    fn test_load_all_tables() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());

        let data = load_health_data(dir.path()).unwrap();
        assert_eq!(data.hrv.len(), 2);
        assert_eq!(data.resting_hr.len(), 1);
        assert_eq!(data.sleep.len(), 1);
        assert_eq!(data.calories.len(), 1);

        // offsets are normalized to UTC: 07:30 -0800 is 15:30 UTC
        assert_eq!(
            data.hrv[0].timestamp,
            Utc.with_ymd_and_hms(2025, 3, 14, 15, 30, 0).unwrap()
        );
        assert_eq!(data.hrv[1].value, 70.0);
        assert!((data.sleep[0].duration_hours() - 8.0).abs() < 1e-9);
        assert_eq!(data.calories[0].value, 412.7);
    }

    #[test]
    fn test_missing_table_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());
        fs::remove_file(dir.path().join(CALORIES_TABLE)).unwrap();

        let err = load_health_data(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::MissingTable {
                channel: Channel::Calories,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());
        fs::write(dir.path().join(HRV_TABLE), "date,hrv\nnot-a-date,62.5\n").unwrap();

        let err = load_health_data(dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_tables(dir.path());
        fs::write(dir.path().join(HRV_TABLE), "when,hrv\n2025-03-15,62.5\n").unwrap();

        let err = load_health_data(dir.path()).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingColumn { .. }));
    }

    #[test]
    fn test_parse_instant_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 15, 7, 0, 0).unwrap();
        for raw in [
            "2025-03-15T07:00:00+00:00",
            "2025-03-15 07:00:00 +0000",
            "2025-03-15 07:00:00",
            "2025-03-14 23:00:00 -0800",
        ] {
            assert_eq!(parse_instant(raw, Channel::Hrv).unwrap(), expected);
        }

        let midnight = parse_instant("2025-03-15", Channel::Hrv).unwrap();
        assert_eq!(
            midnight,
            Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap()
        );

        assert!(parse_instant("yesterday", Channel::Hrv).is_err());
    }
}
