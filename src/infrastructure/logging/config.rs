//! Logger settings and their parsed forms.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::models::LoggingConfig;

/// Logger settings, resolved from the `logging` section of the config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Console output format
    pub format: LogFormat,

    /// Directory for rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Write to the console (stderr) as well
    pub enable_stderr: bool,

    /// Log file rotation
    pub rotation: RotationPolicy,
}

/// Console output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable, colored.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(format!("Invalid log format: {s}")),
        }
    }
}

/// When the log file rolls over.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day.
    #[default]
    Daily,
    /// New file every hour.
    Hourly,
    /// One file, never rotated.
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

impl LogConfig {
    /// Resolve the user-facing settings. An unknown format falls back to
    /// pretty; the config loader rejects it before this point.
    pub fn from_settings(settings: &LoggingConfig) -> Self {
        Self {
            level: settings.level.clone(),
            format: settings.format.parse().unwrap_or(LogFormat::Pretty),
            log_dir: settings.log_dir.as_ref().map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Raise the level to `debug` (or `trace` when `verbose > 1`).
    #[must_use]
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.level = "debug".to_string(),
            _ => self.level = "trace".to_string(),
        }
        self
    }
}
