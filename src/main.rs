use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use recovrs::config::AnalysisConfig;
use recovrs::error::{RecovrsError, Result};
use recovrs::import::xml::ExportExtractor;
use recovrs::import::load_health_data;
use recovrs::logging::{init_logging, LogFormat, LogLevel};
use recovrs::recovery::RecoveryCalculator;
use recovrs::report::ResultFormatter;

/// recovrs - Recovery and Strain Scoring CLI
///
/// Computes a daily recovery score, strain score, and training
/// recommendation from Apple Health biometrics (HRV, resting heart rate,
/// sleep, active calories).
#[derive(Parser)]
#[command(name = "recovrs")]
#[command(version = "0.1.0")]
#[command(about = "Recovery and strain scoring from Apple Health exports", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON instead of human-readable text
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the four metric tables from an Apple Health export.xml
    Extract {
        /// Path to export.xml
        #[arg(short, long)]
        file: PathBuf,

        /// Days of history to keep (defaults to the configured window)
        #[arg(short, long)]
        days: Option<u32>,

        /// Directory for the extracted CSV tables
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Score today's recovery and strain from extracted tables
    Analyze {
        /// Directory containing the four CSV tables
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Also write the report as JSON to this path
        #[arg(short, long)]
        json: Option<PathBuf>,

        /// Score as of this date instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(LogLevel::from_verbosity(cli.verbose), format);

    if let Err(err) = run(cli) {
        tracing::error!(error = %err, "run failed");
        eprintln!("{}", err.user_message().red());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = AnalysisConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Extract { file, days, output } => {
            let days = days.unwrap_or(config.extract_window_days);
            println!(
                "{}",
                format!("Extracting last {} days of health data...", days)
                    .green()
                    .bold()
            );

            let extractor = ExportExtractor::new(Utc::now(), days);
            let tables = extractor.extract(&file)?;
            fs::create_dir_all(&output)?;
            tables.write_csv_tables(&output)?;

            println!(
                "{}",
                format!(
                    "✓ Extracted {} records into {}",
                    tables.data.record_count(),
                    output.display()
                )
                .green()
            );
        }

        Commands::Analyze { dir, json, date } => {
            let now = match date {
                Some(raw) => parse_analysis_date(&raw)?,
                None => Utc::now(),
            };

            let data = load_health_data(&dir)?;
            let report = RecoveryCalculator::calculate(&data, now, &config)?;

            ResultFormatter::print(&report);

            if let Some(path) = json {
                ResultFormatter::write_json(&report, &path)?;
                println!();
                println!(
                    "{}",
                    format!("✓ Report written to {}", path.display()).green()
                );
            }
        }
    }

    Ok(())
}

/// A bare date scores as of the end of that UTC day, so the full day's
/// readings are visible to the selector.
fn parse_analysis_date(raw: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        RecovrsError::Configuration(format!("invalid --date '{}', expected YYYY-MM-DD", raw))
    })?;
    let naive = date
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| RecovrsError::Configuration(format!("invalid --date '{}'", raw)))?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}
