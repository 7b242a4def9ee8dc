//! Test history: the engine's log of targeted runs.
//!
//! Every active run appends one entry naming the iRoot it targeted, the
//! scheduler seed and, once the run finished, whether the iRoot was
//! exposed. The database is read-only on this side.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::iroot::{IRootDb, IRootId, Idiom};
use crate::domain::errors::{DomainError, DomainResult};

/// One targeted run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestHistoryEntry {
    /// The iRoot the run targeted.
    pub iroot_id: IRootId,
    /// Scheduler seed of the run.
    pub seed: u64,
    /// `None` when the run never reported a result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

impl TestHistoryEntry {
    /// `Success`, `Fail` or `None`.
    pub fn result_label(&self) -> &'static str {
        match self.success {
            Some(true) => "Success",
            Some(false) => "Fail",
            None => "None",
        }
    }
}

/// Persisted shape of the test history, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestHistorySnapshot {
    /// Entries in the order the runs happened.
    #[serde(default)]
    pub history: Vec<TestHistoryEntry>,
}

/// Entries resolved against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestHistory {
    entries: Vec<(TestHistoryEntry, Idiom)>,
}

impl TestHistory {
    /// Resolve every entry's iRoot; an unknown iRoot fails the load.
    pub fn from_snapshot(snapshot: TestHistorySnapshot, catalog: &IRootDb) -> DomainResult<Self> {
        let entries = snapshot
            .history
            .into_iter()
            .map(|entry| {
                catalog
                    .idiom_of(entry.iroot_id)
                    .map(|idiom| (entry, idiom))
                    .ok_or(DomainError::UnknownIRoot(entry.iroot_id))
            })
            .collect::<DomainResult<_>>()?;
        Ok(Self { entries })
    }

    /// Entries in run order with the idiom of their iRoot.
    pub fn entries(&self) -> impl Iterator<Item = (&TestHistoryEntry, Idiom)> {
        self.entries.iter().map(|(entry, idiom)| (entry, *idiom))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No run recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn of(&self, idiom: Idiom) -> impl Iterator<Item = &TestHistoryEntry> {
        self.entries
            .iter()
            .filter(move |(_, i)| *i == idiom)
            .map(|(entry, _)| entry)
    }

    /// Runs of `idiom` that exposed their target.
    pub fn num_success(&self, idiom: Idiom) -> usize {
        self.of(idiom).filter(|e| e.success == Some(true)).count()
    }

    /// Runs of `idiom` that finished without exposing their target.
    pub fn num_fail(&self, idiom: Idiom) -> usize {
        self.of(idiom).filter(|e| e.success == Some(false)).count()
    }

    /// Distinct iRoots of `idiom` that were targeted.
    pub fn num_iroot(&self, idiom: Idiom) -> usize {
        self.of(idiom)
            .map(|e| e.iroot_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct iRoots of `idiom` exposed at least once.
    pub fn num_success_iroot(&self, idiom: Idiom) -> usize {
        self.of(idiom)
            .filter(|e| e.success == Some(true))
            .map(|e| e.iroot_id)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Counts for every idiom.
    pub fn summary(&self) -> TestHistorySummary {
        TestHistorySummary {
            per_idiom: Idiom::ALL.map(|idiom| {
                let success_iroots = self.num_success_iroot(idiom);
                IdiomHistory {
                    idiom,
                    success: self.num_success(idiom),
                    fail: self.num_fail(idiom),
                    success_iroots,
                    fail_iroots: self.num_iroot(idiom) - success_iroots,
                }
            }),
        }
    }
}

/// Targeted-run counts of one idiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdiomHistory {
    /// The idiom counted.
    pub idiom: Idiom,
    /// Runs that exposed their target.
    pub success: usize,
    /// Runs that did not.
    pub fail: usize,
    /// iRoots exposed at least once.
    pub success_iroots: usize,
    /// Targeted iRoots never exposed.
    pub fail_iroots: usize,
}

impl IdiomHistory {
    /// Runs with a result.
    pub fn tests(&self) -> usize {
        self.success + self.fail
    }
}

/// Per-idiom counts over the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestHistorySummary {
    /// One entry per idiom, in idiom order.
    pub per_idiom: [IdiomHistory; 5],
}

impl fmt::Display for TestHistorySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test History Summary")?;
        writeln!(f, "---------------------------")?;
        for counts in &self.per_idiom {
            writeln!(f, "# {:<17} = {}", format!("{} tests", counts.idiom), counts.tests())?;
            writeln!(f, "  # succ            = {}", counts.success)?;
            writeln!(f, "  # fail            = {}", counts.fail)?;
            writeln!(f, "  # succ iroot      = {}", counts.success_iroots)?;
            writeln!(f, "  # fail iroot      = {}", counts.fail_iroots)?;
        }
        Ok(())
    }
}
