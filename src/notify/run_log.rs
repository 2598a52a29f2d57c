//! Append-only run log.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::ProviderOutcome;
use crate::notify::OutcomeSink;

/// Appends one timestamped entry per provider outcome.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `[<UTC timestamp>] <provider>: <text>` followed by a newline.
    pub fn format_entry(at: DateTime<Utc>, provider: &str, outcome: &ProviderOutcome) -> String {
        let text = match outcome {
            ProviderOutcome::Changed { detail, .. } => detail.trim_end().to_string(),
            ProviderOutcome::Error { detail, .. } => format!("ERROR\n{}", detail.trim_end()),
            ProviderOutcome::Unchanged {
                bootstrapped: true, ..
            } => "initial snapshot recorded".to_string(),
            ProviderOutcome::Unchanged { .. } => "no changes".to_string(),
        };
        format!(
            "[{}] {provider}: {text}\n",
            at.to_rfc3339_opts(SecondsFormat::Micros, true)
        )
    }

    async fn append(&self, entry: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(entry.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl OutcomeSink for RunLog {
    fn name(&self) -> &str {
        "run log"
    }

    async fn record(&self, provider: &str, outcome: &ProviderOutcome) -> Result<()> {
        let entry = Self::format_entry(Utc::now(), provider, outcome);
        self.append(&entry)
            .await
            .map_err(|e| AppError::persistence(self.path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_format_entries() {
        assert_eq!(
            RunLog::format_entry(at(), "POhWER", &ProviderOutcome::unchanged(false)),
            "[2026-10-16T08:00:00.000000Z] POhWER: no changes\n"
        );
        assert_eq!(
            RunLog::format_entry(at(), "POhWER", &ProviderOutcome::unchanged(true)),
            "[2026-10-16T08:00:00.000000Z] POhWER: initial snapshot recorded\n"
        );
        assert_eq!(
            RunLog::format_entry(at(), "Acme", &ProviderOutcome::error("[transport] timed out")),
            "[2026-10-16T08:00:00.000000Z] Acme: ERROR\n[transport] timed out\n"
        );
    }

    #[test]
    fn test_format_report_entry() {
        let report = "Changes Detected in Acme:\n\n\tProvided Areas Have changed:\n\n";
        let entry = RunLog::format_entry(at(), "Acme", &ProviderOutcome::changed(report));
        assert!(entry.starts_with("[2026-10-16T08:00:00.000000Z] Acme: Changes Detected in Acme:"));
        assert!(entry.ends_with("Have changed:\n"));
    }

    #[tokio::test]
    async fn test_record_appends() {
        let tmp = TempDir::new().unwrap();
        let log = RunLog::new(tmp.path().join("logs/changes.log"));

        log.record("A", &ProviderOutcome::unchanged(false))
            .await
            .unwrap();
        log.record("B", &ProviderOutcome::error("boom"))
            .await
            .unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("] A: no changes"));
        assert!(lines[1].ends_with("] B: ERROR"));
        assert_eq!(lines[2], "boom");
    }
}
