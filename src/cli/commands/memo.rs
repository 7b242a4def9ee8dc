//! Memo CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::adapters::JsonSnapshotStore;
use crate::cli::output::table::TableFormatter;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Idiom, MemoSummary};
use crate::services::{MemoOperation, MemoTool};

/// Offline memo operation
#[derive(Args, Debug)]
pub struct MemoArgs {
    /// Memo to read (defaults to the configured memo)
    #[arg(long, global = true)]
    pub memo_in: Option<PathBuf>,

    /// Memo to write (defaults to the configured memo)
    #[arg(long, global = true)]
    pub memo_out: Option<PathBuf>,

    /// Operation to apply
    #[command(subcommand)]
    pub command: MemoCommands,
}

/// Memo subcommands
#[derive(Subcommand, Debug)]
pub enum MemoCommands {
    /// Fold another memo into this one
    Merge {
        /// Memo to merge in
        other: PathBuf,
    },
    /// Merge another memo, then refine the candidate queue
    Apply {
        /// Memo to merge in
        other: PathBuf,
        /// Keep candidates that already failed
        #[arg(long)]
        no_memo_failed: bool,
    },
    /// Drop candidates that were exposed or exhausted their retries
    Refine {
        /// Keep candidates that already failed
        #[arg(long)]
        no_memo_failed: bool,
    },
    /// Mark every unexposed iRoot as failed
    Close,
    /// Forget predictions and candidates after the program input changed
    InputChange,
    /// Randomly keep at most NUM queued candidates of one idiom
    Sample {
        /// Idiom whose candidates are sampled (1-5)
        #[arg(short, long)]
        idiom: Idiom,
        /// Candidates to keep
        #[arg(short, long)]
        num: usize,
        /// Seed for a reproducible sample
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl From<MemoCommands> for MemoOperation {
    fn from(command: MemoCommands) -> Self {
        match command {
            MemoCommands::Merge { other } => MemoOperation::Merge { other },
            MemoCommands::Apply {
                other,
                no_memo_failed,
            } => MemoOperation::Apply {
                other,
                respect_failed: !no_memo_failed,
            },
            MemoCommands::Refine { no_memo_failed } => MemoOperation::Refine {
                respect_failed: !no_memo_failed,
            },
            MemoCommands::Close => MemoOperation::Close,
            MemoCommands::InputChange => MemoOperation::InputChange,
            MemoCommands::Sample { idiom, num, seed } => MemoOperation::Sample { idiom, num, seed },
        }
    }
}

/// Result of a memo command
#[derive(Debug, Serialize)]
pub struct MemoOutput {
    /// Operation name
    pub operation: String,
    /// Memo read
    pub memo_in: PathBuf,
    /// Memo written
    pub memo_out: PathBuf,
    /// False when the input memo was missing
    pub applied: bool,
    /// Class counts of the written memo
    pub summary: Option<MemoSummary>,
}

impl CommandOutput for MemoOutput {
    fn to_human(&self) -> String {
        match &self.summary {
            Some(summary) => format!(
                "Memo {} written to {}\n{}",
                self.operation,
                self.memo_out.display(),
                TableFormatter::new().format_memo_summary(summary)
            ),
            None => format!(
                "Nothing to do: input memo missing for {}",
                self.operation
            ),
        }
    }
}

/// Handle memo commands
pub async fn execute(args: MemoArgs, config: &Config, json_mode: bool) -> Result<()> {
    let paths = &config.snapshots;
    let memo_in = args
        .memo_in
        .unwrap_or_else(|| PathBuf::from(&paths.memo));
    let memo_out = args
        .memo_out
        .unwrap_or_else(|| PathBuf::from(&paths.memo));

    let tool = MemoTool::new(Arc::new(JsonSnapshotStore::new()), paths);
    let operation = MemoOperation::from(args.command);

    let summary = tool
        .run(&operation, &memo_in, &memo_out)
        .await
        .with_context(|| format!("Memo {operation} failed"))?;

    let out = MemoOutput {
        operation: operation.to_string(),
        memo_in,
        memo_out,
        applied: summary.is_some(),
        summary,
    };
    output(&out, json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_candidates_respected_by_default() {
        let op = MemoOperation::from(MemoCommands::Refine {
            no_memo_failed: false,
        });
        assert_eq!(
            op,
            MemoOperation::Refine {
                respect_failed: true
            }
        );

        let op = MemoOperation::from(MemoCommands::Apply {
            other: PathBuf::from("other.json"),
            no_memo_failed: true,
        });
        assert_eq!(
            op,
            MemoOperation::Apply {
                other: PathBuf::from("other.json"),
                respect_failed: false
            }
        );
    }

    #[test]
    fn test_skipped_output() {
        let out = MemoOutput {
            operation: "close".to_string(),
            memo_in: PathBuf::from("memo.json"),
            memo_out: PathBuf::from("memo.json"),
            applied: false,
            summary: None,
        };
        assert!(out.to_human().contains("Nothing to do"));
        assert_eq!(out.to_json()["applied"], serde_json::json!(false));
    }
}
