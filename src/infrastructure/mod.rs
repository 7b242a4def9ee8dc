//! Infrastructure layer module
//!
//! Process-wide concerns that sit outside the campaign engine:
//! - Configuration management (figment layering and validation)
//! - Logging infrastructure (tracing subscriber setup)

pub mod config;
pub mod logging;
