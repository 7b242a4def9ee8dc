//! Campaign vocabulary: what to run, when to stop, and where a campaign is.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Continuation policy family, as named in configuration and on the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    /// A fixed number of runs.
    Runout,
    /// A wall-clock budget in seconds.
    Timeout,
    /// Until the coverage metric stops changing.
    Stable,
    /// Until the campaign kind runs out of work.
    Finish,
}

impl FromStr for ModeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runout" => Ok(ModeKind::Runout),
            "timeout" => Ok(ModeKind::Timeout),
            "stable" => Ok(ModeKind::Stable),
            "finish" => Ok(ModeKind::Finish),
            _ => Err(format!(
                "Invalid mode: {s}. Must be one of: runout, timeout, stable, finish"
            )),
        }
    }
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModeKind::Runout => "runout",
            ModeKind::Timeout => "timeout",
            ModeKind::Stable => "stable",
            ModeKind::Finish => "finish",
        };
        f.pad(s)
    }
}

/// Randomized scheduler driving a random campaign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RandomScheduler {
    /// Probabilistic priority changes with strict (non-preemptive) priorities.
    #[default]
    Pct,
    /// Probabilistic priority changes for long executions.
    PctLarge,
    /// Random delays injected at each change point.
    RandDelay,
}

impl FromStr for RandomScheduler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "pct" => Ok(RandomScheduler::Pct),
            "pct-large" => Ok(RandomScheduler::PctLarge),
            "rand-delay" => Ok(RandomScheduler::RandDelay),
            _ => Err(format!(
                "Invalid scheduler: {s}. Must be one of: pct, pct-large, rand-delay"
            )),
        }
    }
}

impl fmt::Display for RandomScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RandomScheduler::Pct => "pct",
            RandomScheduler::PctLarge => "pct-large",
            RandomScheduler::RandDelay => "rand-delay",
        };
        f.pad(s)
    }
}

/// When a campaign stops after a non-fatal run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopMode {
    /// Stop once this many runs completed.
    Runout(u64),
    /// Stop once this much wall-clock time elapsed since the campaign began.
    Timeout(Duration),
    /// Stop once the coverage metric stayed unchanged for this many runs.
    Stable(u32),
    /// Stop only when the campaign kind reports its search exhausted.
    Finish,
}

impl StopMode {
    /// Combine a mode family with its threshold. The threshold is a run
    /// count for `runout` and `stable` and seconds for `timeout`.
    pub fn new(kind: ModeKind, threshold: u64) -> Self {
        match kind {
            ModeKind::Runout => StopMode::Runout(threshold),
            ModeKind::Timeout => StopMode::Timeout(Duration::from_secs(threshold)),
            ModeKind::Stable => StopMode::Stable(u32::try_from(threshold).unwrap_or(u32::MAX)),
            ModeKind::Finish => StopMode::Finish,
        }
    }

    /// The mode family, without its threshold.
    pub const fn kind(&self) -> ModeKind {
        match self {
            StopMode::Runout(_) => ModeKind::Runout,
            StopMode::Timeout(_) => ModeKind::Timeout,
            StopMode::Stable(_) => ModeKind::Stable,
            StopMode::Finish => ModeKind::Finish,
        }
    }
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopMode::Runout(n) => write!(f, "runout({n})"),
            StopMode::Timeout(t) => write!(f, "timeout({}s)", t.as_secs()),
            StopMode::Stable(k) => write!(f, "stable({k})"),
            StopMode::Finish => write!(f, "finish"),
        }
    }
}

/// Lifecycle of one campaign controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignState {
    /// No run launched yet.
    NotStarted,
    /// Between runs.
    Running,
    /// The stop mode was satisfied.
    Converged,
    /// A run crashed, hung or mismatched.
    Fatal,
}

impl CampaignState {
    /// Converged or fatal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, CampaignState::Converged | CampaignState::Fatal)
    }

    /// A run failed fatally.
    pub const fn is_fatal(self) -> bool {
        matches!(self, CampaignState::Fatal)
    }
}

impl fmt::Display for CampaignState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CampaignState::NotStarted => "not_started",
            CampaignState::Running => "running",
            CampaignState::Converged => "converged",
            CampaignState::Fatal => "fatal",
        };
        f.pad(s)
    }
}

/// Scalar coverage signal tracked by `stable` mode. Two components so
/// that a kind can track a pair of counts (e.g. static races and racy
/// instructions); kinds with a single count leave `secondary` at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMetric {
    /// Main count.
    pub primary: usize,
    /// Tie-breaking count, zero when unused.
    pub secondary: usize,
}

impl CoverageMetric {
    /// Metric with only a primary count.
    pub const fn single(value: usize) -> Self {
        Self {
            primary: value,
            secondary: 0,
        }
    }
}

/// Plateau detector for `stable` mode.
///
/// The previous metric starts at zero, so a campaign whose metric stays at
/// zero from the first run counts as stable from that run on.
#[derive(Debug, Clone, Default)]
pub struct StabilityTracker {
    previous: CoverageMetric,
    stable_count: u32,
}

impl StabilityTracker {
    /// Tracker with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the metric observed after a run and return the stability count.
    pub fn observe(&mut self, metric: CoverageMetric) -> u32 {
        if metric == self.previous {
            self.stable_count += 1;
        } else {
            self.stable_count = 0;
        }
        self.previous = metric;
        self.stable_count
    }

    /// Consecutive runs without a metric change.
    pub const fn stable_count(&self) -> u32 {
        self.stable_count
    }
}

/// Immutable description of one repeatable external run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Target program.
    pub program: PathBuf,
    /// Arguments passed to the target program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Engine options, passed through uninterpreted.
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl RunSpec {
    /// Run of `program` with `args` and no engine options.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            options: BTreeMap::new(),
        }
    }

    /// Set one engine option, replacing an earlier value.
    #[must_use]
    pub fn with_option(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.options.insert(name.into(), value.to_string());
        self
    }
}

/// Per-phase statistics reported once a campaign finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignStats {
    /// Campaign kind label.
    pub label: String,
    /// Runs launched.
    pub runs: usize,
    /// Total wall-clock time of those runs.
    pub used_time: Duration,
    /// Final state.
    pub state: CampaignState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("runout".parse::<ModeKind>().unwrap(), ModeKind::Runout);
        assert_eq!("STABLE".parse::<ModeKind>().unwrap(), ModeKind::Stable);
        assert!("forever".parse::<ModeKind>().is_err());

        assert_eq!(StopMode::new(ModeKind::Runout, 3), StopMode::Runout(3));
        assert_eq!(
            StopMode::new(ModeKind::Timeout, 60),
            StopMode::Timeout(Duration::from_secs(60))
        );
        assert_eq!(StopMode::new(ModeKind::Finish, 7), StopMode::Finish);
        assert_eq!(StopMode::new(ModeKind::Stable, 2).kind(), ModeKind::Stable);
    }

    #[test]
    fn test_random_scheduler_parsing() {
        assert_eq!("pct".parse::<RandomScheduler>().unwrap(), RandomScheduler::Pct);
        assert_eq!(
            "pct_large".parse::<RandomScheduler>().unwrap(),
            RandomScheduler::PctLarge
        );
        assert_eq!(
            "rand-delay".parse::<RandomScheduler>().unwrap(),
            RandomScheduler::RandDelay
        );
        assert!("chess".parse::<RandomScheduler>().is_err());
        assert_eq!(RandomScheduler::PctLarge.to_string(), "pct-large");
    }

    #[test]
    fn test_stability_plateau() {
        let mut tracker = StabilityTracker::new();
        let counts: Vec<u32> = [3, 3, 3]
            .into_iter()
            .map(|n| tracker.observe(CoverageMetric::single(n)))
            .collect();
        assert_eq!(counts, vec![0, 1, 2]);

        let mut tracker = StabilityTracker::new();
        let counts: Vec<u32> = [3, 4, 4]
            .into_iter()
            .map(|n| tracker.observe(CoverageMetric::single(n)))
            .collect();
        assert_eq!(counts, vec![0, 0, 1]);
    }

    #[test]
    fn test_stability_starts_from_zero() {
        let mut tracker = StabilityTracker::new();
        assert_eq!(tracker.observe(CoverageMetric::default()), 1);
        assert_eq!(
            tracker.observe(CoverageMetric {
                primary: 0,
                secondary: 1
            }),
            0
        );
    }

    #[test]
    fn test_run_spec_options() {
        let spec = RunSpec::new("/bin/app", vec!["-n".into(), "4".into()])
            .with_option("target_idiom", 1)
            .with_option("enable_observer", true);
        assert_eq!(spec.options.get("target_idiom").map(String::as_str), Some("1"));
        assert_eq!(spec.options.len(), 2);
    }
}
