//! Common test utilities for integration tests
//!
//! Provides snapshot fixtures and helpers shared across integration test
//! files.

use std::path::{Path, PathBuf};

use ravel::adapters::JsonSnapshotStore;
use ravel::domain::models::{
    EventId, EventKind, IRoot, IRootDbSnapshot, IRootEvent, IRootId, Idiom, Image, ImageId, Inst,
    InstId, MemoSnapshot, ReportingConfig, SnapshotPaths, StaticInfoSnapshot,
};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn path_in(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

/// Snapshot paths inside `dir`
pub fn snapshot_paths(dir: &Path) -> SnapshotPaths {
    SnapshotPaths {
        sinfo: path_in(dir, "sinfo.json"),
        iroot: path_in(dir, "iroot.json"),
        memo: path_in(dir, "memo.json"),
        race: path_in(dir, "race.json"),
        search: path_in(dir, "search.json"),
        test_history: path_in(dir, "test_history.json"),
    }
}

/// Report file paths inside `dir`
#[allow(dead_code)]
pub fn report_paths(dir: &Path) -> ReportingConfig {
    ReportingConfig {
        coverage_log: path_in(dir, "coverage"),
        timing_log: path_in(dir, "timing"),
    }
}

/// One iRoot of each idiom, ids 1 through 5 (iRoot `n` has idiom `n`).
pub fn catalog_snapshot() -> (StaticInfoSnapshot, IRootDbSnapshot) {
    let sinfo = StaticInfoSnapshot {
        images: vec![Image {
            id: ImageId(1),
            name: "/opt/bench/app".to_string(),
        }],
        insts: (1..=4)
            .map(|id| Inst {
                id: InstId(id),
                image_id: ImageId(1),
                offset: u64::from(id) * 0x20,
                debug_info: None,
            })
            .collect(),
    };

    let kinds = [
        EventKind::MemWrite,
        EventKind::MemRead,
        EventKind::MemWrite,
        EventKind::MemRead,
    ];
    let events = kinds
        .iter()
        .enumerate()
        .map(|(idx, kind)| {
            let id = u32::try_from(idx).expect("small index") + 1;
            IRootEvent {
                id: EventId(id),
                inst_id: InstId(id),
                kind: *kind,
            }
        })
        .collect();

    let iroots = Idiom::ALL
        .iter()
        .enumerate()
        .map(|(idx, idiom)| IRoot {
            id: IRootId(u32::try_from(idx).expect("small index") + 1),
            idiom: *idiom,
            event_ids: (1..=idiom.num_events())
                .map(|e| EventId(u32::try_from(e).expect("small index")))
                .collect(),
        })
        .collect();

    (sinfo, IRootDbSnapshot { events, iroots })
}

/// Write the static registry and catalog fixture, plus `memo` if given.
pub async fn write_fixture(paths: &SnapshotPaths, memo: Option<&MemoSnapshot>) {
    let store = JsonSnapshotStore::new();
    let (sinfo, catalog) = catalog_snapshot();
    store
        .write_json(&sinfo, Path::new(&paths.sinfo))
        .await
        .expect("Failed to write static registry");
    store
        .write_json(&catalog, Path::new(&paths.iroot))
        .await
        .expect("Failed to write catalog");
    if let Some(memo) = memo {
        write_memo(Path::new(&paths.memo), memo).await;
    }
}

pub async fn write_memo(path: &Path, memo: &MemoSnapshot) {
    JsonSnapshotStore::new()
        .write_json(memo, path)
        .await
        .expect("Failed to write memo");
}

#[allow(dead_code)]
pub fn memo_path(paths: &SnapshotPaths) -> PathBuf {
    PathBuf::from(&paths.memo)
}
