//! Application configuration
//!
//! Scoring weights and band thresholds are fixed domain constants; what is
//! configurable are the fallback defaults, the baseline window, and the
//! extraction window. Config lives in a TOML file under the platform config
//! directory and everything has a sensible default, so a missing file is
//! not an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::baseline::BASELINE_WINDOW_DAYS;
use crate::daily::FallbackPolicy;
use crate::error::{RecovrsError, Result};

/// Default extraction lookback in days
pub const DEFAULT_EXTRACT_DAYS: u32 = 90;

/// Analysis and extraction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Per-channel defaults when today/yesterday have no reading
    pub fallback: FallbackPolicy,

    /// Trailing window for HRV and resting-HR baselines, in days
    pub baseline_window_days: i64,

    /// How far back `recovrs extract` reaches into the export, in days
    pub extract_window_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            fallback: FallbackPolicy::default(),
            baseline_window_days: BASELINE_WINDOW_DAYS,
            extract_window_days: DEFAULT_EXTRACT_DAYS,
        }
    }
}

impl AnalysisConfig {
    /// Platform config path, e.g. `~/.config/recovrs/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("recovrs").join("config.toml"))
    }

    /// Load from `path`, or fall back to defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(p) => p,
            None => return Ok(Self::default()),
        };

        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)?;
        let config: AnalysisConfig = toml::from_str(&raw).map_err(|e| {
            RecovrsError::Configuration(format!("{}: {}", path.display(), e))
        })?;

        if config.baseline_window_days <= 0 {
            return Err(RecovrsError::Configuration(format!(
                "baseline_window_days must be positive, got {}",
                config.baseline_window_days
            )));
        }

        Ok(config)
    }

    /// Write the config as TOML, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(self)
            .map_err(|e| RecovrsError::Configuration(e.to_string()))?;
        fs::write(path, raw)?;
        Ok(())
    }
}
