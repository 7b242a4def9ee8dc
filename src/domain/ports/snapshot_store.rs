//! Snapshot store port: persistent storage shared with the engine.

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    IRootDb, Memo, RaceDb, SearchInfo, SnapshotPaths, StaticInfo, TestHistory,
};

/// Static registry, catalog and memo loaded together.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    /// Images and instructions.
    pub sinfo: StaticInfo,
    /// iRoots resolved against `sinfo`.
    pub catalog: IRootDb,
    /// Evidence resolved against `catalog`.
    pub memo: Memo,
}

/// Load and save the engine's databases.
///
/// Every load treats a missing file as an empty database so a campaign can
/// cold-start. A single load or save is atomic with respect to readers.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load images and instructions.
    async fn load_static_info(&self, path: &Path) -> DomainResult<StaticInfo>;

    /// Load the catalog, resolving events against `sinfo`.
    async fn load_catalog(&self, path: &Path, sinfo: &StaticInfo) -> DomainResult<IRootDb>;

    /// Load a memo, resolving every id against `catalog`.
    async fn load_memo(&self, path: &Path, catalog: &IRootDb) -> DomainResult<Memo>;

    /// Atomically replace the memo at `path`.
    async fn save_memo(&self, memo: &Memo, path: &Path) -> DomainResult<()>;

    /// Load the race detector's static races.
    async fn load_race_db(&self, path: &Path, sinfo: &StaticInfo) -> DomainResult<RaceDb>;

    /// Load the systematic scheduler's progress.
    async fn load_search_info(&self, path: &Path) -> DomainResult<SearchInfo>;

    /// Load the targeted-run log, resolving iRoots against `catalog`.
    async fn load_test_history(&self, path: &Path, catalog: &IRootDb)
        -> DomainResult<TestHistory>;

    /// Load the static registry, catalog and memo named in `paths`.
    async fn load_evidence(&self, paths: &SnapshotPaths) -> DomainResult<Evidence> {
        let sinfo = self.load_static_info(Path::new(&paths.sinfo)).await?;
        let catalog = self.load_catalog(Path::new(&paths.iroot), &sinfo).await?;
        let memo = self.load_memo(Path::new(&paths.memo), &catalog).await?;
        Ok(Evidence {
            sinfo,
            catalog,
            memo,
        })
    }
}
