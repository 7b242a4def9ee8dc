//! Configuration sections shared by the CLI and the campaigns.

use serde::{Deserialize, Serialize};

use super::campaign::{ModeKind, StopMode};

/// Main configuration structure for Ravel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where the engine's snapshots live
    #[serde(default)]
    pub snapshots: SnapshotPaths,

    /// How the instrumentation engine is launched
    #[serde(default)]
    pub engine: EngineConfig,

    /// Coverage and timing log files
    #[serde(default)]
    pub reporting: ReportingConfig,

    /// Default continuation policies per campaign kind
    #[serde(default)]
    pub campaign: CampaignConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Snapshot file locations shared with the instrumentation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SnapshotPaths {
    /// Static registry (images and instructions)
    #[serde(default = "default_sinfo_path")]
    pub sinfo: String,

    /// iRoot catalog
    #[serde(default = "default_iroot_path")]
    pub iroot: String,

    /// Memo (evidence database)
    #[serde(default = "default_memo_path")]
    pub memo: String,

    /// Race detector database
    #[serde(default = "default_race_path")]
    pub race: String,

    /// Systematic search state
    #[serde(default = "default_search_path")]
    pub search: String,

    /// Log of targeted runs written by the active scheduler
    #[serde(default = "default_test_history_path")]
    pub test_history: String,
}

fn default_sinfo_path() -> String {
    "sinfo.json".to_string()
}

fn default_iroot_path() -> String {
    "iroot.json".to_string()
}

fn default_memo_path() -> String {
    "memo.json".to_string()
}

fn default_race_path() -> String {
    "race.json".to_string()
}

fn default_search_path() -> String {
    "search.json".to_string()
}

fn default_test_history_path() -> String {
    "test_history.json".to_string()
}

impl Default for SnapshotPaths {
    fn default() -> Self {
        Self {
            sinfo: default_sinfo_path(),
            iroot: default_iroot_path(),
            memo: default_memo_path(),
            race: default_race_path(),
            search: default_search_path(),
            test_history: default_test_history_path(),
        }
    }
}

/// Launch configuration for the external instrumentation engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Command prefix that runs the engine; empty runs the target directly
    #[serde(default)]
    pub command: Vec<String>,

    /// Per-run time budget in seconds; a run exceeding it is a hang
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,

    /// Treat a non-zero exit status as an output mismatch
    #[serde(default)]
    pub mismatch_on_nonzero_exit: bool,

    /// Hand the console's stdin to the target; otherwise it reads EOF
    #[serde(default = "default_inherit_stdin")]
    pub inherit_stdin: bool,
}

const fn default_run_timeout_secs() -> u64 {
    3600
}

const fn default_inherit_stdin() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec![],
            run_timeout_secs: default_run_timeout_secs(),
            mismatch_on_nonzero_exit: false,
            inherit_stdin: default_inherit_stdin(),
        }
    }
}

/// Append-only report files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReportingConfig {
    /// Per-run observed-iRoot counts
    #[serde(default = "default_coverage_log")]
    pub coverage_log: String,

    /// Per-run wall-clock time of native runs
    #[serde(default = "default_timing_log")]
    pub timing_log: String,
}

fn default_coverage_log() -> String {
    "coverage".to_string()
}

fn default_timing_log() -> String {
    "timing".to_string()
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            coverage_log: default_coverage_log(),
            timing_log: default_timing_log(),
        }
    }
}

/// Continuation policy of one campaign phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PhaseConfig {
    /// When the phase stops
    pub mode: ModeKind,
    /// Runs (runout, stable) or seconds (timeout); unused by finish
    pub threshold: u64,
}

impl PhaseConfig {
    /// Phase settings from a mode and its threshold.
    pub const fn new(mode: ModeKind, threshold: u64) -> Self {
        Self { mode, threshold }
    }

    /// The controller's stop condition for these settings.
    pub fn stop_mode(&self) -> StopMode {
        StopMode::new(self.mode, self.threshold)
    }
}

/// Campaign defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CampaignConfig {
    /// Hard cap on runs per phase, whatever the mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_runs: Option<u64>,

    /// Native runs
    #[serde(default = "default_native_phase")]
    pub native: PhaseConfig,

    /// Profiling runs
    #[serde(default = "default_profile_phase")]
    pub profile: PhaseConfig,

    /// Targeted runs
    #[serde(default = "default_active_phase")]
    pub active: PhaseConfig,

    /// Race discovery runs
    #[serde(default = "default_race_phase")]
    pub race: PhaseConfig,

    /// Systematic runs
    #[serde(default = "default_chess_phase")]
    pub chess: PhaseConfig,

    /// Randomized-scheduler runs
    #[serde(default = "default_random_phase")]
    pub random: PhaseConfig,
}

const fn default_native_phase() -> PhaseConfig {
    PhaseConfig::new(ModeKind::Runout, 1)
}

const fn default_profile_phase() -> PhaseConfig {
    PhaseConfig::new(ModeKind::Stable, 3)
}

const fn default_active_phase() -> PhaseConfig {
    PhaseConfig::new(ModeKind::Finish, 1)
}

const fn default_race_phase() -> PhaseConfig {
    PhaseConfig::new(ModeKind::Stable, 3)
}

const fn default_chess_phase() -> PhaseConfig {
    PhaseConfig::new(ModeKind::Finish, 1)
}

const fn default_random_phase() -> PhaseConfig {
    PhaseConfig::new(ModeKind::Runout, 1)
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            max_runs: None,
            native: default_native_phase(),
            profile: default_profile_phase(),
            active: default_active_phase(),
            race: default_race_phase(),
            chess: default_chess_phase(),
            random: default_random_phase(),
        }
    }
}
