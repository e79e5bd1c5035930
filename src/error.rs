//! Unified error hierarchy for recovrs
//!
//! Provides structured error types for extraction and scoring failures,
//! with severity mapping into the tracing system.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::Channel;

/// Top-level error type for all recovrs operations
#[derive(Debug, Error)]
pub enum RecovrsError {
    /// Health-data extraction errors (XML export or CSV tables)
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Scoring calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Report serialization errors
    #[error("Report serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while turning an export into metric tables
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Input file not found at specified path
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Required table file is missing from the data directory
    #[error("Missing {channel} table: {path}")]
    MissingTable { channel: Channel, path: PathBuf },

    /// Expected column absent from a table header
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Timestamp field could not be parsed as a timezone-aware instant
    #[error("Unparseable timestamp '{value}' in {channel} table")]
    InvalidTimestamp { channel: Channel, value: String },

    /// Numeric field could not be parsed
    #[error("Invalid {channel} value '{value}'")]
    InvalidValue { channel: Channel, value: String },

    /// Malformed XML in the health export
    #[error("Malformed export XML: {reason}")]
    MalformedXml { reason: String },

    /// CSV-level read failure
    #[error("CSV error in {path}: {reason}")]
    Csv { path: PathBuf, reason: String },
}

/// Errors raised by the scoring engine
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Baseline window contains no readings; the mean is undefined
    #[error("Insufficient baseline data for {channel}: no readings in the trailing window")]
    InsufficientBaselineData { channel: Channel },

    /// Invalid parameter supplied to a calculation
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },
}

/// Result type alias for recovrs operations
pub type Result<T> = std::result::Result<T, RecovrsError>;

impl RecovrsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RecovrsError::Extraction(ExtractionError::FileNotFound { .. }) => {
                ErrorSeverity::Warning
            }
            RecovrsError::Calculation(CalculationError::InsufficientBaselineData { .. }) => {
                ErrorSeverity::Warning
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RecovrsError::Extraction(ExtractionError::FileNotFound { path }) => {
                format!("Could not find health export: {}", path.display())
            }
            RecovrsError::Extraction(ExtractionError::MissingTable { channel, path }) => {
                format!(
                    "The {} table is missing ({}). Run `recovrs extract` first.",
                    channel,
                    path.display()
                )
            }
            RecovrsError::Calculation(CalculationError::InsufficientBaselineData { channel }) => {
                format!(
                    "Not enough {} history to compute a baseline. At least one reading in the trailing 30 days is required.",
                    channel
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents the run from completing
    Error,
    /// Recoverable or expected-missing-data condition
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
