//! Outcome of one external run of the target program.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    /// The target finished as expected.
    Normal,
    /// The target died from a signal.
    Crash,
    /// The target did not finish within its time budget and was killed.
    Hang,
    /// The target finished but its output or exit status was wrong.
    Mismatch,
}

impl TestOutcome {
    /// Anything but a normal finish.
    pub const fn is_fatal(self) -> bool {
        !matches!(self, TestOutcome::Normal)
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestOutcome::Normal => "normal",
            TestOutcome::Crash => "crash",
            TestOutcome::Hang => "hang",
            TestOutcome::Mismatch => "mismatch",
        };
        f.pad(s)
    }
}

/// One completed run, appended to a campaign's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunRecord {
    /// Launch time.
    pub started_at: DateTime<Utc>,
    /// Time the target exited or was killed.
    pub finished_at: DateTime<Utc>,
    /// How the run ended.
    pub outcome: TestOutcome,
}

impl TestRunRecord {
    /// Wall-clock time the run took.
    pub fn used_time(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// The run ended the campaign.
    pub const fn is_fatal(&self) -> bool {
        self.outcome.is_fatal()
    }
}
