//! Append-only coverage and timing files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::ReportingConfig;
use crate::domain::ports::CoverageSink;

/// One line per run: label, elapsed seconds and observed iRoots per idiom.
pub fn format_coverage_line(label: &str, used_time: Duration, observed: [usize; 5]) -> String {
    let [n1, n2, n3, n4, n5] = observed;
    format!(
        "{label:<25} {:<10.6} {n1:<6} {n2:<6} {n3:<6} {n4:<6} {n5:<6}\n",
        used_time.as_secs_f64()
    )
}

/// Elapsed seconds of a native run.
pub fn format_timing_line(used_time: Duration) -> String {
    format!("{:.6}\n", used_time.as_secs_f64())
}

/// Appends coverage and timing lines to two report files.
#[derive(Debug, Clone)]
pub struct FileCoverageSink {
    coverage_path: PathBuf,
    timing_path: PathBuf,
}

impl FileCoverageSink {
    /// Sink writing to the given coverage and timing files.
    pub fn new(coverage_path: impl Into<PathBuf>, timing_path: impl Into<PathBuf>) -> Self {
        Self {
            coverage_path: coverage_path.into(),
            timing_path: timing_path.into(),
        }
    }

    /// Sink for the `reporting` config section.
    pub fn from_config(config: &ReportingConfig) -> Self {
        Self::new(&config.coverage_log, &config.timing_log)
    }

    async fn append(path: &Path, line: &str) -> DomainResult<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| DomainError::Reporting(format!("{}: {e}", path.display())))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| DomainError::Reporting(format!("{}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| DomainError::Reporting(format!("{}: {e}", path.display())))
    }
}

#[async_trait]
impl CoverageSink for FileCoverageSink {
    async fn record_coverage(
        &self,
        label: &str,
        used_time: Duration,
        observed: [usize; 5],
    ) -> DomainResult<()> {
        Self::append(
            &self.coverage_path,
            &format_coverage_line(label, used_time, observed),
        )
        .await
    }

    async fn record_timing(&self, used_time: Duration) -> DomainResult<()> {
        Self::append(&self.timing_path, &format_timing_line(used_time)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_coverage_line_layout() {
        let line = format_coverage_line("profile", Duration::from_millis(1500), [3, 1, 0, 0, 12]);
        let fields: Vec<&str> = line.split_whitespace().collect();
        assert_eq!(fields, vec!["profile", "1.500000", "3", "1", "0", "0", "12"]);
        assert_eq!(line.find("1.500000"), Some(26));
        assert!(line.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_lines_are_appended() {
        let dir = TempDir::new().unwrap();
        let sink = FileCoverageSink::new(dir.path().join("coverage"), dir.path().join("timing"));

        sink.record_coverage("profile", Duration::from_secs(1), [1, 0, 0, 0, 0])
            .await
            .unwrap();
        sink.record_coverage("profile", Duration::from_secs(2), [2, 0, 0, 0, 0])
            .await
            .unwrap();
        sink.record_timing(Duration::from_millis(250)).await.unwrap();

        let coverage = std::fs::read_to_string(dir.path().join("coverage")).unwrap();
        assert_eq!(coverage.lines().count(), 2);
        let timing = std::fs::read_to_string(dir.path().join("timing")).unwrap();
        assert_eq!(timing, "0.250000\n");
    }
}
