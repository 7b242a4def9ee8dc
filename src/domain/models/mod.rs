//! Domain models: the engine's databases, the memo and campaign vocabulary.

pub mod campaign;
pub mod config;
pub mod history;
pub mod iroot;
pub mod memo;
pub mod race;
pub mod search;
pub mod static_info;
pub mod test_run;

pub use campaign::{
    CampaignState, CampaignStats, CoverageMetric, ModeKind, RandomScheduler, RunSpec,
    StabilityTracker, StopMode,
};
pub use config::{
    CampaignConfig, Config, EngineConfig, LoggingConfig, PhaseConfig, ReportingConfig,
    SnapshotPaths,
};
pub use history::{
    IdiomHistory, TestHistory, TestHistoryEntry, TestHistorySnapshot, TestHistorySummary,
};
pub use iroot::{EventId, EventKind, IRoot, IRootDb, IRootDbSnapshot, IRootEvent, IRootId, Idiom};
pub use memo::{
    CandidateRecord, ClassCounts, IRootInfo, Memo, MemoSnapshot, MemoSummary,
    CANDIDATE_RETRY_LIMIT, TOTAL_FAILURE_LIMIT,
};
pub use race::{RaceDb, RaceDbSnapshot, StaticRace, StaticRaceEvent};
pub use search::SearchInfo;
pub use static_info::{DebugInfo, Image, ImageId, Inst, InstId, StaticInfo, StaticInfoSnapshot};
pub use test_run::{TestOutcome, TestRunRecord};
