// Library interface for the recovrs modules
// This allows integration tests to access the scoring engine directly

pub mod baseline;
pub mod config;
pub mod daily;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod recovery;
pub mod report;
pub mod scoring;

// Re-export commonly used types for convenience
pub use baseline::{BaselineEstimator, BASELINE_WINDOW_DAYS};
pub use config::AnalysisConfig;
pub use daily::{DailySelector, FallbackPolicy, SleepDuration};
pub use error::{RecovrsError, Result};
pub use logging::{LogFormat, LogLevel};
pub use models::{
    Channel, HealthData, Reading, Recommendation, ScoreReport, SleepInterval, StrainTarget,
};
pub use recovery::RecoveryCalculator;
pub use report::ResultFormatter;
pub use scoring::SubScorer;
