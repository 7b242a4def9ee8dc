//! Offline memo operations between campaigns.
//!
//! Each operation loads the memo named by `memo_in`, applies one change and
//! saves the result to `memo_out` (often the same file). An operation whose
//! input memo does not exist yet is skipped.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{IRootDb, Idiom, Memo, MemoSummary, SnapshotPaths};
use crate::domain::ports::SnapshotStore;

/// One offline change to a memo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoOperation {
    /// The program input changed: forget predictions and the work queue.
    InputChange,
    /// Give up on every iRoot that was never exposed.
    Close,
    /// Shrink the work queue.
    Refine {
        /// Also drop candidates already given up on.
        respect_failed: bool,
    },
    /// Fold another memo into this one.
    Merge {
        /// Memo to fold in.
        other: PathBuf,
    },
    /// Merge, then refine.
    Apply {
        /// Memo to fold in.
        other: PathBuf,
        /// Passed to the refine step.
        respect_failed: bool,
    },
    /// Randomly keep at most `num` queued candidates of `idiom`. Without a
    /// seed one is drawn and logged.
    Sample {
        /// Idiom whose queue is trimmed.
        idiom: Idiom,
        /// Candidates to keep.
        num: usize,
        /// Shuffle seed.
        seed: Option<u64>,
    },
}

impl fmt::Display for MemoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MemoOperation::InputChange => "input-change",
            MemoOperation::Close => "close",
            MemoOperation::Refine { .. } => "refine",
            MemoOperation::Merge { .. } => "merge",
            MemoOperation::Apply { .. } => "apply",
            MemoOperation::Sample { .. } => "sample",
        };
        f.pad(s)
    }
}

/// Applies [`MemoOperation`]s to memo files.
pub struct MemoTool {
    store: Arc<dyn SnapshotStore>,
    sinfo: PathBuf,
    iroot: PathBuf,
}

impl MemoTool {
    /// Tool resolving memos against the registry and catalog in `paths`.
    pub fn new(store: Arc<dyn SnapshotStore>, paths: &SnapshotPaths) -> Self {
        Self {
            store,
            sinfo: PathBuf::from(&paths.sinfo),
            iroot: PathBuf::from(&paths.iroot),
        }
    }

    async fn catalog(&self) -> DomainResult<IRootDb> {
        let sinfo = self.store.load_static_info(&self.sinfo).await?;
        self.store.load_catalog(&self.iroot, &sinfo).await
    }

    /// Load `memo_in`, apply `operation`, save to `memo_out`.
    ///
    /// Returns the summary of the saved memo, or `None` when an input memo
    /// is missing and nothing was done.
    pub async fn run(
        &self,
        operation: &MemoOperation,
        memo_in: &Path,
        memo_out: &Path,
    ) -> DomainResult<Option<MemoSummary>> {
        if !exists(memo_in).await? {
            info!(memo = %memo_in.display(), %operation, "Memo missing, nothing to do");
            return Ok(None);
        }
        if let MemoOperation::Merge { other } | MemoOperation::Apply { other, .. } = operation {
            if !exists(other).await? {
                info!(memo = %other.display(), %operation, "Memo to merge missing, nothing to do");
                return Ok(None);
            }
        }

        let catalog = self.catalog().await?;
        let mut memo = self.store.load_memo(memo_in, &catalog).await?;

        match operation {
            MemoOperation::InputChange => {
                memo.clear_predicted();
                memo.clear_candidates();
            }
            MemoOperation::Close => memo.close_unexposed(),
            MemoOperation::Refine { respect_failed } => {
                let removed = memo.refine(*respect_failed);
                info!(removed, "Candidates refined");
            }
            MemoOperation::Merge { other } => {
                let other = self.store.load_memo(other, &catalog).await?;
                memo.merge(&other);
            }
            MemoOperation::Apply {
                other,
                respect_failed,
            } => {
                let other = self.store.load_memo(other, &catalog).await?;
                memo.merge(&other);
                let removed = memo.refine(*respect_failed);
                info!(removed, "Candidates refined");
            }
            MemoOperation::Sample { idiom, num, seed } => {
                let seed = seed.unwrap_or_else(rand::random);
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let removed = memo.sample_candidates(&catalog, *idiom, *num, &mut rng);
                info!(%idiom, num, seed, removed, "Candidates sampled");
            }
        }

        self.store.save_memo(&memo, memo_out).await?;
        info!(%operation, memo = %memo_out.display(), "Memo {} done", operation);
        Ok(Some(memo.summary(&catalog)))
    }

    /// Load a memo without changing it.
    pub async fn load(&self, memo_in: &Path) -> DomainResult<(IRootDb, Memo)> {
        let catalog = self.catalog().await?;
        let memo = self.store.load_memo(memo_in, &catalog).await?;
        Ok((catalog, memo))
    }
}

async fn exists(path: &Path) -> DomainResult<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| DomainError::Snapshot {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}
