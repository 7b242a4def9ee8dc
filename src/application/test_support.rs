//! Scripted launcher and campaign kind for controller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::death_test::CampaignKind;
use crate::domain::errors::DomainResult;
use crate::domain::models::{CoverageMetric, RunSpec, TestOutcome, TestRunRecord};
use crate::domain::ports::{CoverageSink, TargetLauncher};

/// Replays a fixed list of outcomes, then reports `Normal` forever.
pub struct ScriptedLauncher {
    outcomes: Mutex<VecDeque<TestOutcome>>,
    calls: AtomicUsize,
    last_spec: Mutex<Option<RunSpec>>,
    delay: Option<Duration>,
}

impl ScriptedLauncher {
    pub fn new(outcomes: Vec<TestOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            last_spec: Mutex::new(None),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_spec(&self) -> Option<RunSpec> {
        self.last_spec.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetLauncher for ScriptedLauncher {
    async fn execute(&self, spec: &RunSpec) -> DomainResult<TestOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        Ok(next.unwrap_or(TestOutcome::Normal))
    }
}

/// Campaign kind whose metric and exhaustion follow a script.
pub struct ScriptedKind {
    label: String,
    metrics: Option<Vec<usize>>,
    exhausted_after: Option<usize>,
    options: Vec<(String, String)>,
    after_runs: Arc<AtomicUsize>,
}

impl ScriptedKind {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            metrics: None,
            exhausted_after: None,
            options: Vec::new(),
            after_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Metric reported after the n-th run; the last value repeats.
    pub fn with_metrics(mut self, metrics: &[usize]) -> Self {
        self.metrics = Some(metrics.to_vec());
        self
    }

    pub fn exhausted_after(mut self, runs: usize) -> Self {
        self.exhausted_after = Some(runs);
        self
    }

    pub fn with_option(mut self, knob: &str, value: &str) -> Self {
        self.options.push((knob.to_string(), value.to_string()));
        self
    }

    pub fn after_runs(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.after_runs)
    }

    fn runs(&self) -> usize {
        self.after_runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CampaignKind for ScriptedKind {
    fn label(&self) -> &str {
        &self.label
    }

    fn configure(&self, spec: RunSpec) -> RunSpec {
        self.options
            .iter()
            .fold(spec, |spec, (knob, value)| spec.with_option(knob.as_str(), value))
    }

    async fn after_run(&mut self, _iteration: usize, _record: &TestRunRecord) -> DomainResult<()> {
        self.after_runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn coverage_metric(&self) -> Option<CoverageMetric> {
        let metrics = self.metrics.as_ref()?;
        let runs = self.runs();
        if runs == 0 {
            return Some(CoverageMetric::default());
        }
        let value = metrics
            .get(runs - 1)
            .or_else(|| metrics.last())
            .copied()
            .unwrap_or_default();
        Some(CoverageMetric::single(value))
    }

    fn exhausted(&self) -> bool {
        self.exhausted_after
            .map_or(false, |limit| self.runs() >= limit)
    }
}

/// Coverage sink that keeps what it was given.
#[derive(Default)]
pub struct RecordingSink {
    coverage: Mutex<Vec<(String, [usize; 5])>>,
    timings: AtomicUsize,
}

impl RecordingSink {
    pub fn coverage_lines(&self) -> Vec<(String, [usize; 5])> {
        self.coverage.lock().unwrap().clone()
    }

    pub fn timings(&self) -> usize {
        self.timings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CoverageSink for RecordingSink {
    async fn record_coverage(
        &self,
        label: &str,
        _used_time: Duration,
        observed: [usize; 5],
    ) -> DomainResult<()> {
        self.coverage
            .lock()
            .unwrap()
            .push((label.to_string(), observed));
        Ok(())
    }

    async fn record_timing(&self, _used_time: Duration) -> DomainResult<()> {
        self.timings.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
