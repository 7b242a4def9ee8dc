//! Read-only views of the engine's databases.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::adapters::JsonSnapshotStore;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, IRootDb, IRootId, Idiom, Memo, StaticInfo, TestHistory};
use crate::domain::ports::SnapshotStore;

/// Database display
#[derive(Args, Debug)]
pub struct DisplayArgs {
    /// Static registry to read (defaults to the configured one)
    #[arg(long, global = true)]
    pub sinfo_in: Option<PathBuf>,

    /// iRoot catalog to read (defaults to the configured one)
    #[arg(long, global = true)]
    pub iroot_in: Option<PathBuf>,

    /// Memo to read (defaults to the configured one)
    #[arg(long, global = true)]
    pub memo_in: Option<PathBuf>,

    /// Test history to read (defaults to the configured one)
    #[arg(long, global = true)]
    pub test_history: Option<PathBuf>,

    /// What to show
    #[command(subcommand)]
    pub command: DisplayCommands,
}

/// Display subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCommands {
    /// Loaded images
    Images,
    /// Static instructions
    Insts,
    /// Catalogued iRoots and their events
    Iroots,
    /// Memo class counts per idiom
    MemoSummary,
    /// iRoots the memo records as exposed
    MemoExposed,
    /// Print 1 if a candidate of IDIOM (or of any idiom) is queued, else 0
    HasCandidate {
        /// Idiom to check (1-5); any idiom when omitted
        idiom: Option<Idiom>,
    },
    /// Every targeted run with its result and seed
    TestHistory,
    /// Targeted-run counts per idiom
    TestHistorySummary,
}

/// Rendered table plus the structured data behind it.
#[derive(Debug, Serialize)]
pub struct DisplayOutput {
    #[serde(skip)]
    human: String,
    data: serde_json::Value,
}

impl CommandOutput for DisplayOutput {
    fn to_human(&self) -> String {
        self.human.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        self.data.clone()
    }
}

#[derive(Debug, Serialize)]
struct ExposedIRoot {
    id: IRootId,
    idiom: Idiom,
}

/// Snapshot files named on the command line or in configuration.
struct Sources {
    sinfo: PathBuf,
    iroot: PathBuf,
    memo: PathBuf,
    test_history: PathBuf,
}

impl Sources {
    fn new(args: &DisplayArgs, config: &Config) -> Self {
        let paths = &config.snapshots;
        let pick = |arg: &Option<PathBuf>, default: &str| {
            arg.clone().unwrap_or_else(|| PathBuf::from(default))
        };
        Self {
            sinfo: pick(&args.sinfo_in, &paths.sinfo),
            iroot: pick(&args.iroot_in, &paths.iroot),
            memo: pick(&args.memo_in, &paths.memo),
            test_history: pick(&args.test_history, &paths.test_history),
        }
    }
}

async fn load_sinfo(store: &JsonSnapshotStore, path: &Path) -> Result<StaticInfo> {
    store
        .load_static_info(path)
        .await
        .with_context(|| format!("Failed to load static registry {}", path.display()))
}

async fn load_catalog(
    store: &JsonSnapshotStore,
    sources: &Sources,
) -> Result<(StaticInfo, IRootDb)> {
    let sinfo = load_sinfo(store, &sources.sinfo).await?;
    let catalog = store
        .load_catalog(&sources.iroot, &sinfo)
        .await
        .with_context(|| format!("Failed to load iRoot catalog {}", sources.iroot.display()))?;
    Ok((sinfo, catalog))
}

async fn load_memo(store: &JsonSnapshotStore, sources: &Sources) -> Result<(IRootDb, Memo)> {
    let (_, catalog) = load_catalog(store, sources).await?;
    let memo = store
        .load_memo(&sources.memo, &catalog)
        .await
        .with_context(|| format!("Failed to load memo {}", sources.memo.display()))?;
    Ok((catalog, memo))
}

async fn load_test_history(store: &JsonSnapshotStore, sources: &Sources) -> Result<TestHistory> {
    let (_, catalog) = load_catalog(store, sources).await?;
    store
        .load_test_history(&sources.test_history, &catalog)
        .await
        .with_context(|| {
            format!(
                "Failed to load test history {}",
                sources.test_history.display()
            )
        })
}

/// Handle display commands
pub async fn execute(args: DisplayArgs, config: &Config, json_mode: bool) -> Result<()> {
    let sources = Sources::new(&args, config);
    let store = JsonSnapshotStore::new();
    let formatter = TableFormatter::new();

    let out = match args.command {
        DisplayCommands::Images => {
            let sinfo = load_sinfo(&store, &sources.sinfo).await?;
            DisplayOutput {
                human: formatter.format_images(sinfo.images()),
                data: serde_json::to_value(sinfo.images().collect::<Vec<_>>())?,
            }
        }
        DisplayCommands::Insts => {
            let sinfo = load_sinfo(&store, &sources.sinfo).await?;
            DisplayOutput {
                human: formatter.format_insts(sinfo.insts(), &sinfo),
                data: serde_json::to_value(sinfo.insts().collect::<Vec<_>>())?,
            }
        }
        DisplayCommands::Iroots => {
            let (sinfo, catalog) = load_catalog(&store, &sources).await?;
            DisplayOutput {
                human: formatter.format_iroots(&catalog, &sinfo),
                data: serde_json::to_value(catalog.to_snapshot())?,
            }
        }
        DisplayCommands::MemoSummary => {
            let (catalog, memo) = load_memo(&store, &sources).await?;
            let summary = memo.summary(&catalog);
            DisplayOutput {
                human: formatter.format_memo_summary(&summary),
                data: serde_json::to_value(summary)?,
            }
        }
        DisplayCommands::MemoExposed => {
            let (catalog, memo) = load_memo(&store, &sources).await?;
            let exposed: Vec<ExposedIRoot> = memo
                .exposed()
                .iter()
                .filter_map(|id| {
                    catalog
                        .idiom_of(*id)
                        .map(|idiom| ExposedIRoot { id: *id, idiom })
                })
                .collect();
            let human = if exposed.is_empty() {
                "No exposed iRoots.".to_string()
            } else {
                exposed
                    .iter()
                    .map(|e| format!("{:<5} {}", e.id.0, e.idiom))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            DisplayOutput {
                human,
                data: serde_json::to_value(&exposed)?,
            }
        }
        DisplayCommands::HasCandidate { idiom } => {
            let (catalog, memo) = load_memo(&store, &sources).await?;
            let found = memo.has_candidate(&catalog, idiom);
            DisplayOutput {
                human: u8::from(found).to_string(),
                data: serde_json::json!({ "idiom": idiom, "has_candidate": found }),
            }
        }
        DisplayCommands::TestHistory => {
            let history = load_test_history(&store, &sources).await?;
            let entries: Vec<_> = history.entries().map(|(entry, _)| *entry).collect();
            DisplayOutput {
                human: formatter.format_test_history(&history),
                data: serde_json::to_value(entries)?,
            }
        }
        DisplayCommands::TestHistorySummary => {
            let summary = load_test_history(&store, &sources).await?.summary();
            DisplayOutput {
                human: formatter.format_test_history_summary(&summary),
                data: serde_json::to_value(summary)?,
            }
        }
    };

    output(&out, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_prefer_arguments() {
        let args = DisplayArgs {
            sinfo_in: Some(PathBuf::from("/tmp/other-sinfo.json")),
            iroot_in: None,
            memo_in: None,
            test_history: None,
            command: DisplayCommands::Images,
        };
        let sources = Sources::new(&args, &Config::default());
        assert_eq!(sources.sinfo, PathBuf::from("/tmp/other-sinfo.json"));
        assert_eq!(sources.iroot, PathBuf::from("iroot.json"));
        assert_eq!(sources.memo, PathBuf::from("memo.json"));
        assert_eq!(sources.test_history, PathBuf::from("test_history.json"));
    }

    #[tokio::test]
    async fn test_has_candidate_and_history_from_files() {
        use crate::domain::models::{
            EventId, EventKind, IRoot, IRootDbSnapshot, IRootEvent, ImageId, Image, Inst,
            InstId, StaticInfoSnapshot, TestHistoryEntry, TestHistorySnapshot,
        };

        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonSnapshotStore::new();
        let path = |name: &str| dir.path().join(name);
        let sources = Sources {
            sinfo: path("sinfo.json"),
            iroot: path("iroot.json"),
            memo: path("memo.json"),
            test_history: path("test_history.json"),
        };

        let sinfo = StaticInfoSnapshot {
            images: vec![Image {
                id: ImageId(1),
                name: "app".to_string(),
            }],
            insts: vec![Inst {
                id: InstId(1),
                image_id: ImageId(1),
                offset: 0x8,
                debug_info: None,
            }],
        };
        let catalog = IRootDbSnapshot {
            events: vec![IRootEvent {
                id: EventId(1),
                inst_id: InstId(1),
                kind: EventKind::MemWrite,
            }],
            iroots: vec![IRoot {
                id: IRootId(1),
                idiom: Idiom::Idiom1,
                event_ids: vec![EventId(1), EventId(1)],
            }],
        };
        store.write_json(&sinfo, &sources.sinfo).await.unwrap();
        store.write_json(&catalog, &sources.iroot).await.unwrap();

        let mut memo = Memo::new();
        memo.add_candidate(IRootId(1));
        store.save_memo(&memo, &sources.memo).await.unwrap();
        store
            .write_json(
                &TestHistorySnapshot {
                    history: vec![TestHistoryEntry {
                        iroot_id: IRootId(1),
                        seed: 5,
                        success: Some(false),
                    }],
                },
                &sources.test_history,
            )
            .await
            .unwrap();

        let (catalog, memo) = load_memo(&store, &sources).await.unwrap();
        assert!(memo.has_candidate(&catalog, Some(Idiom::Idiom1)));
        assert!(!memo.has_candidate(&catalog, Some(Idiom::Idiom2)));

        let history = load_test_history(&store, &sources).await.unwrap();
        assert_eq!(history.num_fail(Idiom::Idiom1), 1);
        assert_eq!(history.summary().per_idiom[0].fail_iroots, 1);
    }

    #[test]
    fn test_output_splits_human_and_json() {
        let out = DisplayOutput {
            human: "table".to_string(),
            data: serde_json::json!([1, 2]),
        };
        assert_eq!(out.to_human(), "table");
        assert_eq!(out.to_json(), serde_json::json!([1, 2]));
    }
}
