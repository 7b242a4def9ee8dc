//! Layered config loading and validation.

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use thiserror::Error;

use crate::domain::models::config::{Config, PhaseConfig};
use crate::domain::models::ModeKind;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown `logging.level`.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown `logging.format`.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    /// A `snapshots` path is empty.
    #[error("Snapshot path for {0} cannot be empty")]
    EmptySnapshotPath(&'static str),

    /// A `reporting` path is empty.
    #[error("Report path for {0} cannot be empty")]
    EmptyReportPath(&'static str),

    /// `engine.run_timeout_secs` is zero.
    #[error("Invalid run_timeout_secs: 0. Must be at least 1")]
    InvalidRunTimeout,

    /// `campaign.max_runs` is zero.
    #[error("Invalid max_runs: 0. Omit it for no cap")]
    InvalidMaxRuns,

    #[error("Invalid threshold for {phase}: {mode} mode needs a threshold of at least 1")]
    /// A runout phase with a zero threshold.
    InvalidThreshold {
        /// Phase section name.
        phase: &'static str,
        /// Its mode.
        mode: ModeKind,
    },

    #[error("Invalid mode for {phase}: {mode} mode never stops on its own. Set max_runs or use runout/timeout")]
    /// A phase whose mode cannot end its campaign, with no run cap.
    UnboundedPhase {
        /// Phase section name.
        phase: &'static str,
        /// Its mode.
        mode: ModeKind,
    },
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ravel/config.yaml (project config)
    /// 3. .ravel/local.yaml (local overrides, optional)
    /// 4. Environment variables (RAVEL_* prefix, `__` between sections)
    pub fn load() -> Result<Config> {
        let config: Config = Self::figment()
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring
    /// environment overrides
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("RAVEL_").split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".ravel/config.yaml"))
            .merge(Yaml::file(".ravel/local.yaml"))
            .merge(Env::prefixed("RAVEL_").split("__"))
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let snapshots = &config.snapshots;
        for (name, path) in [
            ("sinfo", &snapshots.sinfo),
            ("iroot", &snapshots.iroot),
            ("memo", &snapshots.memo),
            ("race", &snapshots.race),
            ("search", &snapshots.search),
        ] {
            if path.is_empty() {
                return Err(ConfigError::EmptySnapshotPath(name));
            }
        }

        if config.reporting.coverage_log.is_empty() {
            return Err(ConfigError::EmptyReportPath("coverage_log"));
        }
        if config.reporting.timing_log.is_empty() {
            return Err(ConfigError::EmptyReportPath("timing_log"));
        }

        if config.engine.run_timeout_secs == 0 {
            return Err(ConfigError::InvalidRunTimeout);
        }

        let campaign = &config.campaign;
        if campaign.max_runs == Some(0) {
            return Err(ConfigError::InvalidMaxRuns);
        }
        for (phase, settings) in [
            ("native", &campaign.native),
            ("profile", &campaign.profile),
            ("active", &campaign.active),
            ("race", &campaign.race),
            ("chess", &campaign.chess),
            ("random", &campaign.random),
        ] {
            Self::validate_phase(phase, settings, campaign.max_runs)?;
        }

        Ok(())
    }

    /// Reject settings under which `phase` could never stop.
    ///
    /// A run count of zero stops before the first run. `stable` needs a
    /// coverage metric (profile, race) and `finish` needs a kind that runs
    /// out of work (active, chess); any other pairing only stops at
    /// `max_runs`.
    pub fn validate_phase(
        phase: &'static str,
        settings: &PhaseConfig,
        max_runs: Option<u64>,
    ) -> Result<(), ConfigError> {
        if settings.mode == ModeKind::Runout && settings.threshold == 0 {
            return Err(ConfigError::InvalidThreshold {
                phase,
                mode: settings.mode,
            });
        }
        if max_runs.is_none() && !stops_on_its_own(phase, settings.mode) {
            return Err(ConfigError::UnboundedPhase {
                phase,
                mode: settings.mode,
            });
        }
        Ok(())
    }
}

fn stops_on_its_own(phase: &str, mode: ModeKind) -> bool {
    match mode {
        ModeKind::Runout | ModeKind::Timeout => true,
        ModeKind::Stable => matches!(phase, "profile" | "race"),
        ModeKind::Finish => matches!(phase, "active" | "chess"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{EngineConfig, LoggingConfig};
    use crate::domain::models::StopMode;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.snapshots.memo, "memo.json");
        assert_eq!(config.engine.run_timeout_secs, 3600);
        assert_eq!(config.campaign.profile.stop_mode(), StopMode::Stable(3));
        assert_eq!(config.campaign.active.stop_mode(), StopMode::Finish);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
logging:
  level: debug
  format: json
snapshots:
  memo: /work/memo.json
engine:
  command: [pin, -t, idiom.so]
  run_timeout_secs: 60
campaign:
  max_runs: 500
  profile:
    mode: runout
    threshold: 10
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.snapshots.memo, "/work/memo.json");
        assert_eq!(config.snapshots.iroot, "iroot.json");
        assert_eq!(config.engine.command, vec!["pin", "-t", "idiom.so"]);
        assert_eq!(config.campaign.max_runs, Some(500));
        assert_eq!(config.campaign.profile.stop_mode(), StopMode::Runout(10));
        assert_eq!(config.campaign.race.stop_mode(), StopMode::Stable(3));

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let config = Config {
            logging: LoggingConfig {
                format: "xml".to_string(),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_validate_empty_snapshot_path() {
        let mut config = Config::default();
        config.snapshots.iroot = String::new();

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::EmptySnapshotPath("iroot")
        ));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = Config {
            engine: EngineConfig {
                run_timeout_secs: 0,
                ..EngineConfig::default()
            },
            ..Config::default()
        };

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidRunTimeout
        ));
    }

    #[test]
    fn test_validate_zero_runout() {
        let mut config = Config::default();
        config.campaign.native = PhaseConfig::new(ModeKind::Runout, 0);

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidThreshold {
                phase: "native",
                mode: ModeKind::Runout
            }
        ));

        // A zero timeout is a legitimate single-run campaign.
        config.campaign.native = PhaseConfig::new(ModeKind::Timeout, 0);
        assert_eq!(
            config.campaign.native.stop_mode(),
            StopMode::Timeout(Duration::ZERO)
        );
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_unbounded_phases() {
        let mut config = Config::default();
        config.campaign.profile = PhaseConfig::new(ModeKind::Finish, 1);
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::UnboundedPhase {
                phase: "profile",
                mode: ModeKind::Finish
            }
        ));

        // A run cap makes any pairing terminate.
        config.campaign.max_runs = Some(50);
        assert!(ConfigLoader::validate(&config).is_ok());

        for (phase, mode) in [
            ("native", ModeKind::Stable),
            ("native", ModeKind::Finish),
            ("race", ModeKind::Finish),
            ("active", ModeKind::Stable),
            ("random", ModeKind::Stable),
        ] {
            let settings = PhaseConfig::new(mode, 3);
            assert!(
                ConfigLoader::validate_phase(phase, &settings, None).is_err(),
                "{phase} with {mode} should be rejected"
            );
            assert!(ConfigLoader::validate_phase(phase, &settings, Some(10)).is_ok());
        }

        for (phase, mode) in [
            ("profile", ModeKind::Stable),
            ("race", ModeKind::Stable),
            ("active", ModeKind::Finish),
            ("chess", ModeKind::Finish),
            ("random", ModeKind::Timeout),
        ] {
            assert!(ConfigLoader::validate_phase(phase, &PhaseConfig::new(mode, 3), None).is_ok());
        }
    }

    #[test]
    fn test_validate_zero_max_runs() {
        let mut config = Config::default();
        config.campaign.max_runs = Some(0);
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxRuns
        ));
    }

    #[test]
    fn test_env_override() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "logging:\n  level: info\n  format: json\n").unwrap();

        temp_env::with_vars(
            [
                ("RAVEL_LOGGING__LEVEL", Some("debug")),
                ("RAVEL_ENGINE__RUN_TIMEOUT_SECS", Some("90")),
            ],
            || {
                let config = ConfigLoader::load_from_file(&path).unwrap();
                assert_eq!(config.logging.level, "debug");
                assert_eq!(config.logging.format, "json");
                assert_eq!(config.engine.run_timeout_secs, 90);
            },
        );
    }

    #[test]
    fn test_hierarchical_merging() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let mut base_file = NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "logging:\n  level: info\n  format: json\nsnapshots:\n  memo: base.json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = NamedTempFile::new().unwrap();
        writeln!(override_file, "logging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, "debug", "Override should win");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(config.snapshots.memo, "base.json");
    }
}
