//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - TargetLauncher: run the target program once under the engine
//! - SnapshotStore: load and save the engine's databases
//! - CoverageSink: append-only coverage and timing reports
//!
//! These traits keep the campaign engine independent of process management
//! and storage formats.

pub mod coverage_sink;
pub mod launcher;
pub mod snapshot_store;

pub use coverage_sink::CoverageSink;
pub use launcher::TargetLauncher;
pub use snapshot_store::{Evidence, SnapshotStore};
