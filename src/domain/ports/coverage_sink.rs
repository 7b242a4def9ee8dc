//! Reporting port for the append-only coverage audit trail.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// Observational sink; nothing written here is read back by the engine.
#[async_trait]
pub trait CoverageSink: Send + Sync {
    /// Record one completed run with its observed-iRoot counts per idiom.
    async fn record_coverage(
        &self,
        label: &str,
        used_time: Duration,
        observed: [usize; 5],
    ) -> DomainResult<()>;

    /// Record the wall-clock time of one completed run.
    async fn record_timing(&self, used_time: Duration) -> DomainResult<()>;
}
