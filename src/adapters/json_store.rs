//! JSON snapshot store.
//!
//! Each database lives in its own JSON file. A missing file loads as an
//! empty database. Saves go to a sibling temporary file that is renamed over
//! the destination, so a reader never sees a half-written snapshot.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    IRootDb, IRootDbSnapshot, Memo, MemoSnapshot, RaceDb, RaceDbSnapshot, SearchInfo, StaticInfo,
    StaticInfoSnapshot, TestHistory, TestHistorySnapshot,
};
use crate::domain::ports::SnapshotStore;

/// [`SnapshotStore`] over one JSON file per database.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotStore;

impl JsonSnapshotStore {
    /// The store is stateless; paths come with each call.
    pub fn new() -> Self {
        Self
    }

    /// Read and decode `path`, or `None` if it does not exist.
    pub async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> DomainResult<Option<T>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Snapshot missing, treating as empty");
                return Ok(None);
            }
            Err(e) => return Err(snapshot_error(path, e)),
        };

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| snapshot_error(path, e))
    }

    /// Encode `value` and atomically replace `path` with it.
    pub async fn write_json<T: Serialize + Sync>(&self, value: &T, path: &Path) -> DomainResult<()> {
        let content = serde_json::to_string_pretty(value)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| snapshot_error(path, e))?;
            }
        }

        let tmp = temp_path(path);
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| snapshot_error(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temporary snapshot");
            }
            return Err(snapshot_error(path, e));
        }

        debug!(path = %path.display(), "Snapshot saved");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    path.with_file_name(name)
}

fn snapshot_error(path: &Path, err: impl std::fmt::Display) -> DomainError {
    DomainError::Snapshot {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn load_static_info(&self, path: &Path) -> DomainResult<StaticInfo> {
        let snapshot: StaticInfoSnapshot = self.read_json(path).await?.unwrap_or_default();
        StaticInfo::from_snapshot(snapshot)
    }

    async fn load_catalog(&self, path: &Path, sinfo: &StaticInfo) -> DomainResult<IRootDb> {
        let snapshot: IRootDbSnapshot = self.read_json(path).await?.unwrap_or_default();
        IRootDb::from_snapshot(snapshot, sinfo)
    }

    async fn load_memo(&self, path: &Path, catalog: &IRootDb) -> DomainResult<Memo> {
        let snapshot: MemoSnapshot = self.read_json(path).await?.unwrap_or_default();
        Memo::from_snapshot(snapshot, catalog)
    }

    async fn save_memo(&self, memo: &Memo, path: &Path) -> DomainResult<()> {
        self.write_json(&memo.to_snapshot(), path).await
    }

    async fn load_race_db(&self, path: &Path, sinfo: &StaticInfo) -> DomainResult<RaceDb> {
        let snapshot: RaceDbSnapshot = self.read_json(path).await?.unwrap_or_default();
        RaceDb::from_snapshot(snapshot, sinfo)
    }

    async fn load_search_info(&self, path: &Path) -> DomainResult<SearchInfo> {
        Ok(self.read_json(path).await?.unwrap_or_default())
    }

    async fn load_test_history(
        &self,
        path: &Path,
        catalog: &IRootDb,
    ) -> DomainResult<TestHistory> {
        let snapshot: TestHistorySnapshot = self.read_json(path).await?.unwrap_or_default();
        TestHistory::from_snapshot(snapshot, catalog)
    }
}
