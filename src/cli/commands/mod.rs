//! CLI command implementations.

pub mod campaign;
pub mod display;
pub mod memo;
