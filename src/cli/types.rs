//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::cli::commands::display::DisplayArgs;
use crate::cli::commands::memo::MemoArgs;
use crate::domain::models::{Idiom, ModeKind, RandomScheduler};

/// Command-line entry point
#[derive(Parser)]
#[command(name = "ravel")]
#[command(about = "Ravel - interleaving coverage campaigns for concurrency bug search", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .ravel/config.yaml and .ravel/local.yaml)
    #[arg(short, long, global = true, env = "RAVEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Top-level subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the target without instrumentation and record run times
    Native(PhaseArgs),

    /// Build coverage: predict iRoots and queue candidates
    Profile(PhaseArgs),

    /// Try to expose queued candidate iRoots
    Active(ActiveArgs),

    /// Discover data races
    Race(PhaseArgs),

    /// Run under the systematic scheduler until its search is done
    Chess(PhaseArgs),

    /// Run under a randomized scheduler (pct, pct-large or rand-delay)
    Random(RandomArgs),

    /// Profile, then actively test the candidates it found
    Idiom(IdiomArgs),

    /// Discover races, then run the systematic scheduler
    ChessRace(ChessRaceArgs),

    /// Offline memo operations
    Memo(MemoArgs),

    /// Show the contents of a database
    Display(DisplayArgs),
}

/// The program under test and engine options shared by every campaign
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Engine option passed through as `-<knob> <value>` (repeatable)
    #[arg(short = 'o', long = "option", value_name = "KNOB=VALUE", value_parser = parse_knob)]
    pub options: Vec<(String, String)>,

    /// Stop after this many runs per phase, whatever the mode
    #[arg(long)]
    pub max_runs: Option<u64>,

    /// Program under test and its arguments, after `--`
    #[arg(required = true, last = true, value_name = "PROGRAM")]
    pub program: Vec<String>,
}

/// One-phase campaign
#[derive(Args, Debug, Clone)]
pub struct PhaseArgs {
    /// Stop mode: runout, timeout, stable or finish
    #[arg(short, long)]
    pub mode: Option<ModeKind>,

    /// Runs (runout, stable) or seconds (timeout)
    #[arg(short, long)]
    pub threshold: Option<u64>,

    /// Program under test
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Active campaign
#[derive(Args, Debug, Clone)]
pub struct ActiveArgs {
    /// Only target candidates of this idiom (1-5)
    #[arg(short, long)]
    pub idiom: Option<Idiom>,

    /// Stop mode and target
    #[command(flatten)]
    pub phase: PhaseArgs,
}

/// Random campaign
#[derive(Args, Debug, Clone)]
pub struct RandomArgs {
    /// Randomized scheduler: pct, pct-large or rand-delay
    #[arg(short, long, default_value_t = RandomScheduler::Pct)]
    pub scheduler: RandomScheduler,

    /// Stop mode and target
    #[command(flatten)]
    pub phase: PhaseArgs,
}

/// Profile then active campaign
#[derive(Args, Debug, Clone)]
pub struct IdiomArgs {
    /// Stop mode of the profile phase
    #[arg(long)]
    pub profile_mode: Option<ModeKind>,

    /// Threshold of the profile phase
    #[arg(long)]
    pub profile_threshold: Option<u64>,

    /// Stop mode of the active phase
    #[arg(long)]
    pub active_mode: Option<ModeKind>,

    /// Threshold of the active phase
    #[arg(long)]
    pub active_threshold: Option<u64>,

    /// Only target candidates of this idiom (1-5)
    #[arg(short, long)]
    pub idiom: Option<Idiom>,

    /// Program under test
    #[command(flatten)]
    pub target: TargetArgs,
}

/// Race then chess campaign
#[derive(Args, Debug, Clone)]
pub struct ChessRaceArgs {
    /// Stop mode of the race phase
    #[arg(long)]
    pub race_mode: Option<ModeKind>,

    /// Threshold of the race phase
    #[arg(long)]
    pub race_threshold: Option<u64>,

    /// Stop mode of the chess phase
    #[arg(long)]
    pub chess_mode: Option<ModeKind>,

    /// Threshold of the chess phase
    #[arg(long)]
    pub chess_threshold: Option<u64>,

    /// Program under test
    #[command(flatten)]
    pub target: TargetArgs,
}

fn parse_knob(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((knob, value)) if !knob.is_empty() => Ok((knob.to_string(), value.to_string())),
        _ => Err(format!("Invalid option: {s}. Expected KNOB=VALUE")),
    }
}
