//! Configuration loading
//!
//! Defaults, project YAML files and `RAVEL_*` environment variables are
//! layered with figment, then validated before any campaign starts.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
