//! Ravel - interleaving coverage campaigns for concurrency bug search
//!
//! Ravel drives an external instrumentation engine over a multithreaded
//! program, one run at a time, and decides when a testing campaign has
//! converged. Between runs it reads back the engine's databases: the static
//! registry of images and instructions, the catalog of interleaving idioms
//! (iRoots), and the memo of evidence about which iRoots were observed,
//! predicted, exposed or given up on.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): databases, campaign vocabulary and ports
//! - **Application Layer** (`application`): the death-test controller,
//!   campaign kinds and the two-phase composer
//! - **Service Layer** (`services`): offline memo operations
//! - **Adapters** (`adapters`): JSON snapshots, the process launcher and
//!   report files
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use application::{CampaignKind, DeathTest, TwoPhaseCampaign};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    CampaignState, Config, IRootDb, Memo, MemoSummary, StaticInfo, StopMode,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{MemoOperation, MemoTool};
