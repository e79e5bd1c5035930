//! Apple Health export extraction
//!
//! Streams `export.xml` (which can run to hundreds of megabytes) and pulls
//! the four record types the scoring engine cares about, filtered to a
//! trailing window of days. The extracted tables can be scored directly or
//! written back out as the four CSV tables.

use chrono::{DateTime, Duration, Utc};
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::{debug, info};

use super::{parse_instant, CALORIES_TABLE, HRV_TABLE, RESTING_HR_TABLE, SLEEP_TABLE};
use crate::error::ExtractionError;
use crate::models::{Channel, HealthData, Reading, SleepInterval};

const HRV_TYPE: &str = "HKQuantityTypeIdentifierHeartRateVariabilitySDNN";
const RESTING_HR_TYPE: &str = "HKQuantityTypeIdentifierRestingHeartRate";
const SLEEP_TYPE: &str = "HKCategoryTypeIdentifierSleepAnalysis";
const CALORIES_TYPE: &str = "HKQuantityTypeIdentifierActiveEnergyBurned";

/// Tables pulled from one export, plus the sleep category strings that the
/// CSV contract carries along unused
#[derive(Debug, Clone, Default)]
pub struct ExtractedTables {
    pub data: HealthData,
    /// Parallel to `data.sleep`, e.g. "HKCategoryValueSleepAnalysisAsleepCore"
    sleep_categories: Vec<String>,
}

impl ExtractedTables {
    /// Write the four CSV tables into `dir` with the schemas the loader expects
    pub fn write_csv_tables(&self, dir: &Path) -> Result<(), ExtractionError> {
        write_reading_table(&dir.join(HRV_TABLE), "hrv", &self.data.hrv)?;
        write_reading_table(
            &dir.join(RESTING_HR_TABLE),
            "resting_hr",
            &self.data.resting_hr,
        )?;
        write_reading_table(&dir.join(CALORIES_TABLE), "calories", &self.data.calories)?;

        let path = dir.join(SLEEP_TABLE);
        let mut writer = csv::Writer::from_path(&path).map_err(|e| ExtractionError::Csv {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let csv_err = |e: csv::Error| ExtractionError::Csv {
            path: path.clone(),
            reason: e.to_string(),
        };
        writer
            .write_record(["start", "end", "value"])
            .map_err(csv_err)?;
        for (interval, category) in self.data.sleep.iter().zip(&self.sleep_categories) {
            writer
                .write_record([
                    interval.start.to_rfc3339(),
                    interval.end.to_rfc3339(),
                    category.clone(),
                ])
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|e| ExtractionError::Csv {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        info!(records = self.data.record_count(), dir = %dir.display(), "wrote metric tables");
        Ok(())
    }
}

fn write_reading_table(
    path: &Path,
    value_column: &str,
    readings: &[Reading],
) -> Result<(), ExtractionError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ExtractionError::Csv {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let csv_err = |e: csv::Error| ExtractionError::Csv {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    writer
        .write_record(["date", value_column])
        .map_err(csv_err)?;
    for reading in readings {
        writer
            .write_record([reading.timestamp.to_rfc3339(), reading.value.to_string()])
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|e| ExtractionError::Csv {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Streaming extractor for Apple Health `export.xml`
pub struct ExportExtractor {
    cutoff: DateTime<Utc>,
}

impl ExportExtractor {
    /// Keep records whose start date falls within the trailing `days`
    pub fn new(now: DateTime<Utc>, days: u32) -> Self {
        ExportExtractor {
            cutoff: now - Duration::days(i64::from(days)),
        }
    }

    /// Extract the four metric tables from the export at `path`
    ///
    /// Records outside the window or of other types are skipped; a matching
    /// record with an unparseable timestamp or value aborts the run.
    pub fn extract(&self, path: &Path) -> Result<ExtractedTables, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader =
            Reader::from_file(path).map_err(|e| ExtractionError::MalformedXml {
                reason: e.to_string(),
            })?;
        reader.trim_text(true);

        let mut tables = ExtractedTables::default();
        let mut buf = Vec::new();
        let mut seen = 0usize;

        loop {
            match reader.read_event_into(&mut buf) {
                // Record elements are self-closing in practice, but a
                // start tag with children is legal XML too
                Ok(Event::Empty(element)) | Ok(Event::Start(element)) => {
                    if element.name().as_ref() == b"Record" {
                        seen += 1;
                        self.ingest_record(&element, &mut tables)?;
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ExtractionError::MalformedXml {
                        reason: e.to_string(),
                    })
                }
            }
            buf.clear();
        }

        debug!(
            seen,
            kept = tables.data.record_count(),
            cutoff = %self.cutoff,
            "export scan complete"
        );
        Ok(tables)
    }

    fn ingest_record(
        &self,
        element: &BytesStart<'_>,
        tables: &mut ExtractedTables,
    ) -> Result<(), ExtractionError> {
        let mut record_type = None;
        let mut start_date = None;
        let mut end_date = None;
        let mut value = None;

        for attr in element.attributes() {
            let attr: Attribute = attr.map_err(|e| ExtractionError::MalformedXml {
                reason: e.to_string(),
            })?;
            let text = attr
                .unescape_value()
                .map_err(|e| ExtractionError::MalformedXml {
                    reason: e.to_string(),
                })?
                .into_owned();
            match attr.key.as_ref() {
                b"type" => record_type = Some(text),
                b"startDate" => start_date = Some(text),
                b"endDate" => end_date = Some(text),
                b"value" => value = Some(text),
                _ => {}
            }
        }

        let channel = match record_type.as_deref() {
            Some(HRV_TYPE) => Channel::Hrv,
            Some(RESTING_HR_TYPE) => Channel::RestingHr,
            Some(SLEEP_TYPE) => Channel::Sleep,
            Some(CALORIES_TYPE) => Channel::Calories,
            _ => return Ok(()),
        };

        let raw_start = start_date.unwrap_or_default();
        let start = parse_instant(&raw_start, channel)?;
        if start < self.cutoff {
            return Ok(());
        }

        match channel {
            Channel::Sleep => {
                let raw_end = end_date.unwrap_or_default();
                let end = parse_instant(&raw_end, channel)?;
                tables.data.sleep.push(SleepInterval::new(start, end));
                tables.sleep_categories.push(value.unwrap_or_default());
            }
            _ => {
                let raw_value = value.unwrap_or_default();
                let parsed =
                    raw_value
                        .parse::<f64>()
                        .map_err(|_| ExtractionError::InvalidValue {
                            channel,
                            value: raw_value.clone(),
                        })?;
                let reading = Reading::new(start, parsed);
                match channel {
                    Channel::Hrv => tables.data.hrv.push(reading),
                    Channel::RestingHr => tables.data.resting_hr.push(reading),
                    Channel::Calories => tables.data.calories.push(reading),
                    Channel::Sleep => unreachable!(),
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::load_health_data;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    const SAMPLE_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<HealthData locale="en_US">
 <ExportDate value="2025-03-15 10:00:00 -0800"/>
 <Record type="HKQuantityTypeIdentifierHeartRateVariabilitySDNN" sourceName="Watch" unit="ms" startDate="2025-03-15 07:10:00 +0000" endDate="2025-03-15 07:11:00 +0000" value="70.2"/>
 <Record type="HKQuantityTypeIdentifierHeartRateVariabilitySDNN" sourceName="Watch" unit="ms" startDate="2024-11-01 07:10:00 +0000" endDate="2024-11-01 07:11:00 +0000" value="50.0"/>
 <Record type="HKQuantityTypeIdentifierRestingHeartRate" sourceName="Watch" unit="count/min" startDate="2025-03-15 06:00:00 +0000" endDate="2025-03-15 06:00:00 +0000" value="55"/>
 <Record type="HKCategoryTypeIdentifierSleepAnalysis" sourceName="Watch" startDate="2025-03-14 23:00:00 +0000" endDate="2025-03-15 07:00:00 +0000" value="HKCategoryValueSleepAnalysisAsleepCore"/>
 <Record type="HKQuantityTypeIdentifierActiveEnergyBurned" sourceName="Watch" unit="kcal" startDate="2025-03-15 09:00:00 +0000" endDate="2025-03-15 09:05:00 +0000" value="12.5"/>
 <Record type="HKQuantityTypeIdentifierHeartRate" sourceName="Watch" unit="count/min" startDate="2025-03-15 09:00:00 +0000" endDate="2025-03-15 09:00:00 +0000" value="120"/>
</HealthData>
"#;

    fn extractor() -> ExportExtractor {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 12, 0, 0).unwrap();
        ExportExtractor::new(now, 90)
    }

    #[test]
    fn test_extracts_matching_records_within_window() {
        let dir = TempDir::new().unwrap();
        let export = dir.path().join("export.xml");
        fs::write(&export, SAMPLE_EXPORT).unwrap();

        let tables = extractor().extract(&export).unwrap();
        // the 2024-11-01 HRV record is outside the 90-day window and the
        // plain heart-rate record is not a tracked type
        assert_eq!(tables.data.hrv.len(), 1);
        assert_eq!(tables.data.hrv[0].value, 70.2);
        assert_eq!(tables.data.resting_hr.len(), 1);
        assert_eq!(tables.data.sleep.len(), 1);
        assert_eq!(tables.data.calories.len(), 1);
        assert!((tables.data.sleep[0].duration_hours() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_written_tables_round_trip_through_loader() {
        let dir = TempDir::new().unwrap();
        let export = dir.path().join("export.xml");
        fs::write(&export, SAMPLE_EXPORT).unwrap();

        let tables = extractor().extract(&export).unwrap();
        tables.write_csv_tables(dir.path()).unwrap();

        let loaded = load_health_data(dir.path()).unwrap();
        assert_eq!(loaded, tables.data);

        let sleep_csv = fs::read_to_string(dir.path().join(SLEEP_TABLE)).unwrap();
        assert!(sleep_csv.contains("HKCategoryValueSleepAnalysisAsleepCore"));
    }

    #[test]
    fn test_missing_export_file() {
        let err = extractor()
            .extract(Path::new("/nonexistent/export.xml"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::FileNotFound { .. }));
    }

    #[test]
    fn test_bad_value_in_tracked_record_is_fatal() {
        let dir = TempDir::new().unwrap();
        let export = dir.path().join("export.xml");
        fs::write(
            &export,
            r#"<HealthData><Record type="HKQuantityTypeIdentifierRestingHeartRate" startDate="2025-03-15 06:00:00 +0000" endDate="2025-03-15 06:00:00 +0000" value="n/a"/></HealthData>"#,
        )
        .unwrap();

        let err = extractor().extract(&export).unwrap_err();
        assert!(matches!(
            err,
            ExtractionError::InvalidValue {
                channel: Channel::RestingHr,
                ..
            }
        ));
    }
}
