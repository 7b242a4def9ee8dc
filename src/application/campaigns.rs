//! Campaign kinds plugged into a [`DeathTest`](super::DeathTest).
//!
//! - native: plain runs, wall-clock time appended to the timing log
//! - profile: coverage building; the predicted-iRoot count is the
//!   stability signal
//! - active: targeted exposure; exhausted once no candidate is left
//! - race: race discovery; static races and racy instructions are the
//!   stability signal
//! - chess: scheduler-guided search; exhausted once the search is done
//! - random: runs under a randomized scheduler; coverage is logged but
//!   nothing is tracked, so only runout and timeout stop it

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use super::death_test::CampaignKind;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    CoverageMetric, Idiom, RandomScheduler, RunSpec, SnapshotPaths, TestRunRecord,
};
use crate::domain::ports::{CoverageSink, Evidence, SnapshotStore};

/// Snapshot locations plus the store that reads them.
#[derive(Clone)]
pub struct SnapshotReader {
    store: Arc<dyn SnapshotStore>,
    paths: SnapshotPaths,
}

impl SnapshotReader {
    /// Reader over the snapshots named in `paths`.
    pub fn new(store: Arc<dyn SnapshotStore>, paths: SnapshotPaths) -> Self {
        Self { store, paths }
    }

    /// Snapshot locations read from.
    pub fn paths(&self) -> &SnapshotPaths {
        &self.paths
    }

    /// Static registry, catalog and memo as they are on disk now.
    pub async fn evidence(&self) -> DomainResult<Evidence> {
        self.store.load_evidence(&self.paths).await
    }

    /// Reload the memo and append its observed counts to the coverage log.
    async fn log_coverage(
        &self,
        sink: &dyn CoverageSink,
        label: &str,
        record: &TestRunRecord,
    ) -> DomainResult<Evidence> {
        let evidence = self.evidence().await?;
        let observed = evidence.memo.observed_counts(&evidence.catalog);
        sink.record_coverage(label, record.used_time(), observed)
            .await?;
        Ok(evidence)
    }

    /// Engine knobs naming the static registry, catalog and memo files.
    /// The engine reads and writes the same files, so each is passed as
    /// both input and output.
    fn with_memo_options(&self, spec: RunSpec) -> RunSpec {
        spec.with_option("sinfo_in", &self.paths.sinfo)
            .with_option("sinfo_out", &self.paths.sinfo)
            .with_option("iroot_in", &self.paths.iroot)
            .with_option("iroot_out", &self.paths.iroot)
            .with_option("memo_in", &self.paths.memo)
            .with_option("memo_out", &self.paths.memo)
    }
}

/// Uninstrumented runs, timed.
pub struct NativeCampaign {
    sink: Arc<dyn CoverageSink>,
}

impl NativeCampaign {
    /// Native campaign recording timings to `sink`.
    pub fn new(sink: Arc<dyn CoverageSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl CampaignKind for NativeCampaign {
    fn label(&self) -> &str {
        "native"
    }

    async fn after_run(&mut self, _iteration: usize, record: &TestRunRecord) -> DomainResult<()> {
        self.sink.record_timing(record.used_time()).await
    }
}

/// Profiling runs that predict iRoots and grow the candidate queue.
pub struct ProfileCampaign {
    reader: SnapshotReader,
    sink: Arc<dyn CoverageSink>,
    predicted_size: usize,
}

impl ProfileCampaign {
    /// Profile campaign reading the memo through `reader`.
    pub fn new(reader: SnapshotReader, sink: Arc<dyn CoverageSink>) -> Self {
        Self {
            reader,
            sink,
            predicted_size: 0,
        }
    }
}

#[async_trait]
impl CampaignKind for ProfileCampaign {
    fn label(&self) -> &str {
        "profile"
    }

    fn configure(&self, spec: RunSpec) -> RunSpec {
        self.reader.with_memo_options(spec)
    }

    async fn after_run(&mut self, _iteration: usize, record: &TestRunRecord) -> DomainResult<()> {
        let evidence = self
            .reader
            .log_coverage(self.sink.as_ref(), self.label(), record)
            .await?;
        self.predicted_size = evidence.memo.predicted_size();
        debug!(predicted = self.predicted_size, "Profile memo reloaded");
        Ok(())
    }

    fn coverage_metric(&self) -> Option<CoverageMetric> {
        Some(CoverageMetric::single(self.predicted_size))
    }
}

/// Targeted runs that try to expose queued candidates.
pub struct ActiveCampaign {
    reader: SnapshotReader,
    sink: Arc<dyn CoverageSink>,
    target: Option<Idiom>,
    has_candidate: bool,
}

impl ActiveCampaign {
    /// `target` restricts the campaign to one idiom; `None` targets any.
    pub fn new(reader: SnapshotReader, sink: Arc<dyn CoverageSink>, target: Option<Idiom>) -> Self {
        Self {
            reader,
            sink,
            target,
            has_candidate: true,
        }
    }
}

#[async_trait]
impl CampaignKind for ActiveCampaign {
    fn label(&self) -> &str {
        "active"
    }

    fn configure(&self, spec: RunSpec) -> RunSpec {
        let spec = self.reader.with_memo_options(spec);
        match self.target {
            Some(idiom) => spec.with_option("target_idiom", idiom.index() + 1),
            None => spec,
        }
    }

    async fn after_run(&mut self, _iteration: usize, record: &TestRunRecord) -> DomainResult<()> {
        let evidence = self
            .reader
            .log_coverage(self.sink.as_ref(), self.label(), record)
            .await?;
        self.has_candidate = evidence.memo.has_candidate(&evidence.catalog, self.target);
        debug!(
            candidates = evidence.memo.candidate_size(),
            has_candidate = self.has_candidate,
            "Active memo reloaded"
        );
        Ok(())
    }

    fn exhausted(&self) -> bool {
        !self.has_candidate
    }
}

/// Race-detector runs that accumulate static races.
pub struct RaceCampaign {
    store: Arc<dyn SnapshotStore>,
    paths: SnapshotPaths,
    metric: CoverageMetric,
}

impl RaceCampaign {
    /// Race campaign tracking the race database at `paths.race`.
    pub fn new(store: Arc<dyn SnapshotStore>, paths: SnapshotPaths) -> Self {
        Self {
            store,
            paths,
            metric: CoverageMetric::default(),
        }
    }
}

#[async_trait]
impl CampaignKind for RaceCampaign {
    fn label(&self) -> &str {
        "race"
    }

    fn configure(&self, spec: RunSpec) -> RunSpec {
        spec.with_option("sinfo_in", &self.paths.sinfo)
            .with_option("sinfo_out", &self.paths.sinfo)
            .with_option("race_in", &self.paths.race)
            .with_option("race_out", &self.paths.race)
    }

    async fn after_run(&mut self, _iteration: usize, _record: &TestRunRecord) -> DomainResult<()> {
        let sinfo = self
            .store
            .load_static_info(Path::new(&self.paths.sinfo))
            .await?;
        let races = self
            .store
            .load_race_db(Path::new(&self.paths.race), &sinfo)
            .await?;
        self.metric = CoverageMetric {
            primary: races.num_static_races(),
            secondary: races.num_racy_insts(),
        };
        debug!(
            static_races = self.metric.primary,
            racy_insts = self.metric.secondary,
            "Race database reloaded"
        );
        Ok(())
    }

    fn coverage_metric(&self) -> Option<CoverageMetric> {
        Some(self.metric)
    }
}

/// Runs under a systematic scheduler until it explored its search space.
pub struct ChessCampaign {
    reader: SnapshotReader,
    sink: Arc<dyn CoverageSink>,
    sched_race: bool,
    search_done: bool,
}

impl ChessCampaign {
    /// Systematic campaign; the search state decides when it is done.
    pub fn new(reader: SnapshotReader, sink: Arc<dyn CoverageSink>) -> Self {
        Self {
            reader,
            sink,
            sched_race: false,
            search_done: false,
        }
    }

    /// Also schedule the racy accesses recorded in the race database.
    pub fn with_race_scheduling(mut self, enabled: bool) -> Self {
        self.sched_race = enabled;
        self
    }
}

#[async_trait]
impl CampaignKind for ChessCampaign {
    fn label(&self) -> &str {
        "chess"
    }

    fn configure(&self, spec: RunSpec) -> RunSpec {
        let paths = self.reader.paths();
        let spec = self
            .reader
            .with_memo_options(spec)
            .with_option("search_in", &paths.search)
            .with_option("search_out", &paths.search);
        if self.sched_race {
            spec.with_option("sched_race", 1)
                .with_option("race_in", &paths.race)
        } else {
            spec
        }
    }

    async fn after_run(&mut self, _iteration: usize, record: &TestRunRecord) -> DomainResult<()> {
        let search = self
            .reader
            .store
            .load_search_info(Path::new(&self.reader.paths.search))
            .await?;
        self.search_done = search.done;
        self.reader
            .log_coverage(self.sink.as_ref(), self.label(), record)
            .await?;
        debug!(
            search_done = search.done,
            search_runs = search.num_runs,
            "Search state reloaded"
        );
        Ok(())
    }

    fn exhausted(&self) -> bool {
        self.search_done
    }
}

/// Runs under a randomized scheduler, logging coverage after each.
pub struct RandomCampaign {
    reader: SnapshotReader,
    sink: Arc<dyn CoverageSink>,
    scheduler: RandomScheduler,
}

impl RandomCampaign {
    /// Random campaign under `scheduler`, whose name labels the coverage
    /// lines.
    pub fn new(
        reader: SnapshotReader,
        sink: Arc<dyn CoverageSink>,
        scheduler: RandomScheduler,
    ) -> Self {
        Self {
            reader,
            sink,
            scheduler,
        }
    }
}

#[async_trait]
impl CampaignKind for RandomCampaign {
    fn label(&self) -> &str {
        "random"
    }

    fn configure(&self, spec: RunSpec) -> RunSpec {
        let spec = self.reader.with_memo_options(spec);
        match self.scheduler {
            RandomScheduler::Pct => spec.with_option("strict", 1),
            RandomScheduler::PctLarge => spec,
            RandomScheduler::RandDelay => spec.with_option("delay", 1),
        }
    }

    async fn after_run(&mut self, iteration: usize, record: &TestRunRecord) -> DomainResult<()> {
        info!(
            scheduler = %self.scheduler,
            iteration,
            used_time = record.used_time().as_secs_f64(),
            "Random iteration done"
        );
        // Coverage lines carry the scheduler's name.
        let label = self.scheduler.to_string();
        self.reader
            .log_coverage(self.sink.as_ref(), &label, record)
            .await?;
        Ok(())
    }
}
