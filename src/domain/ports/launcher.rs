//! Launch port: run the target once under the instrumentation engine.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{RunSpec, TestOutcome};

/// Executes one run of the target program and classifies it.
///
/// The call blocks until the run finished or was forcibly terminated; the
/// implementation is responsible for bounding a hanging run and reporting
/// it as [`TestOutcome::Hang`]. Errors are reserved for failing to launch
/// at all.
#[async_trait]
pub trait TargetLauncher: Send + Sync {
    /// Launch `spec` once and wait for its outcome.
    async fn execute(&self, spec: &RunSpec) -> DomainResult<TestOutcome>;
}
