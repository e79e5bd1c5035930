//! Report output
//!
//! The [`ScoreReport`] contract is the JSON shape; the terminal rendering
//! is presentation only and mirrors the analysis summary the tool prints
//! after each run.

use colored::Colorize;
use std::io::Write;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::error::Result;
use crate::models::{ScoreReport, StrainTarget};

/// Assembles the external-facing views of a score report
pub struct ResultFormatter;

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Today")]
    today: String,
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "vs Baseline")]
    vs_baseline: String,
}

impl ResultFormatter {
    /// Pretty-printed JSON per the output contract
    pub fn to_json(report: &ScoreReport) -> Result<String> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Write the JSON report to `path`
    pub fn write_json(report: &ScoreReport, path: &Path) -> Result<()> {
        let json = Self::to_json(report)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Metrics breakdown as a terminal table
    pub fn metrics_table(report: &ScoreReport) -> String {
        let m = &report.metrics;
        let rows = vec![
            MetricRow {
                metric: "HRV".to_string(),
                today: format!("{:.1} ms", m.hrv.value),
                baseline: format!("{:.1} ms", m.hrv.baseline),
                vs_baseline: format!("{:+.1}%", m.hrv.vs_baseline_pct),
            },
            MetricRow {
                metric: "Resting HR".to_string(),
                today: format!("{} bpm", m.resting_hr.value),
                baseline: format!("{} bpm", m.resting_hr.baseline),
                vs_baseline: format!("{:+} bpm", m.resting_hr.vs_baseline_bpm),
            },
            MetricRow {
                metric: "Sleep".to_string(),
                today: format!("{}h {}m", m.sleep.hours, m.sleep.minutes),
                baseline: "-".to_string(),
                vs_baseline: "-".to_string(),
            },
            MetricRow {
                metric: "Calories".to_string(),
                today: format!("{} kcal", m.calories),
                baseline: "-".to_string(),
                vs_baseline: "-".to_string(),
            },
        ];

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }

    /// Print the full analysis summary to stdout
    pub fn print(report: &ScoreReport) {
        println!("{}", "TODAY'S METRICS".bold());
        println!("{}", Self::metrics_table(report));
        println!();

        let score_line = format!("Recovery Score: {}%", report.recovery_score);
        let colored_score = match report.strain_target {
            StrainTarget::Hard => score_line.green().bold(),
            StrainTarget::Moderate => score_line.yellow().bold(),
            StrainTarget::Light => score_line.red().bold(),
        };
        println!("{}", colored_score);
        println!("Strain Score: {:.1}/21", report.strain_score);
        println!("Strain Target: {}", report.strain_target);
        println!();
        println!("{}", report.recommendation.cyan());
    }
}
