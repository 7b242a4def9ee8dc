//! Launch the target program under the instrumentation engine.
//!
//! The command line is `engine_command... -<knob> <value>... -- program args...`.
//! With no engine command configured the target runs directly and the
//! knobs are not passed anywhere.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EngineConfig, RunSpec, TestOutcome};
use crate::domain::ports::TargetLauncher;

/// [`TargetLauncher`] running one child process per run.
///
/// stdout and stderr are always inherited. stdin is inherited by default
/// so interactive targets behave as they would on the console.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    engine_command: Vec<String>,
    run_timeout: Duration,
    mismatch_on_nonzero_exit: bool,
    inherit_stdin: bool,
}

impl ProcessLauncher {
    /// Launcher with an explicit engine prefix and per-run budget.
    pub fn new(engine_command: Vec<String>, run_timeout: Duration) -> Self {
        Self {
            engine_command,
            run_timeout,
            mismatch_on_nonzero_exit: false,
            inherit_stdin: true,
        }
    }

    /// Launcher built from the `engine` config section.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            engine_command: config.command.clone(),
            run_timeout: Duration::from_secs(config.run_timeout_secs),
            mismatch_on_nonzero_exit: config.mismatch_on_nonzero_exit,
            inherit_stdin: config.inherit_stdin,
        }
    }

    /// Classify a non-zero exit status as [`TestOutcome::Mismatch`].
    #[must_use]
    pub fn with_mismatch_on_nonzero_exit(mut self, enabled: bool) -> Self {
        self.mismatch_on_nonzero_exit = enabled;
        self
    }

    /// `false` closes the target's stdin.
    #[must_use]
    pub fn with_inherit_stdin(mut self, enabled: bool) -> Self {
        self.inherit_stdin = enabled;
        self
    }

    fn stdin(&self) -> Stdio {
        if self.inherit_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    }

    /// Full argv for one run of `spec`.
    pub fn command_line(&self, spec: &RunSpec) -> Vec<String> {
        let program = spec.program.to_string_lossy().into_owned();
        if self.engine_command.is_empty() {
            let mut argv = Vec::with_capacity(1 + spec.args.len());
            argv.push(program);
            argv.extend(spec.args.iter().cloned());
            return argv;
        }

        let mut argv = self.engine_command.clone();
        for (knob, value) in &spec.options {
            argv.push(format!("-{knob}"));
            argv.push(value.clone());
        }
        argv.push("--".to_string());
        argv.push(program);
        argv.extend(spec.args.iter().cloned());
        argv
    }

    fn classify(&self, status: ExitStatus) -> TestOutcome {
        if terminated_by_signal(status) {
            return TestOutcome::Crash;
        }
        if !status.success() && self.mismatch_on_nonzero_exit {
            return TestOutcome::Mismatch;
        }
        TestOutcome::Normal
    }
}

#[cfg(unix)]
fn terminated_by_signal(status: ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    status.signal().is_some()
}

#[cfg(not(unix))]
fn terminated_by_signal(status: ExitStatus) -> bool {
    status.code().is_none()
}

#[async_trait]
impl TargetLauncher for ProcessLauncher {
    async fn execute(&self, spec: &RunSpec) -> DomainResult<TestOutcome> {
        let argv = self.command_line(spec);
        let Some((program, args)) = argv.split_first() else {
            return Err(DomainError::LaunchFailed("empty command line".to_string()));
        };

        if self.engine_command.is_empty() && !spec.options.is_empty() {
            warn!(
                options = spec.options.len(),
                "No engine command configured, engine options are ignored"
            );
        }
        debug!(command = %argv.join(" "), "Launching run");

        let mut child = Command::new(program)
            .args(args)
            .stdin(self.stdin())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DomainError::LaunchFailed(format!("{program}: {e}")))?;

        let status = match tokio::time::timeout(self.run_timeout, child.wait()).await {
            Ok(status) => status.map_err(|e| {
                DomainError::LaunchFailed(format!("Failed to wait for {program}: {e}"))
            })?,
            Err(_) => {
                warn!(
                    timeout_secs = self.run_timeout.as_secs_f64(),
                    "Run exceeded its time budget, killing it"
                );
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill hanging run");
                }
                return Ok(TestOutcome::Hang);
            }
        };

        let outcome = self.classify(status);
        debug!(status = ?status.code(), outcome = %outcome, "Run finished");
        Ok(outcome)
    }
}
