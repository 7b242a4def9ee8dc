//! Domain layer for the Ravel campaign engine
//!
//! Pure data model (static registry, iRoot catalog, memo, run records) and
//! the ports that adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
