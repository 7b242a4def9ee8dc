//! Infrastructure adapters for external systems.

pub mod coverage_log;
pub mod json_store;
pub mod process_launcher;

pub use coverage_log::FileCoverageSink;
pub use json_store::JsonSnapshotStore;
pub use process_launcher::ProcessLauncher;
