//! The single JSON artifact each run leaves behind.

use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use chrono_tz::Asia::Seoul;
use serde::Serialize;

use crate::schedule::TargetDate;

/// Final classification of one process invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    Waiting,
    AlreadyBooked,
    WeekendSkip,
    Failed,
    Test,
}

impl RunStatus {
    /// Process exit code the status maps to.
    pub fn exit_success(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// One run's outcome. Written exactly once per invocation, overwriting the
/// previous run's file.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// ISO-8601 timestamp in Korean local time.
    pub timestamp: String,
    /// Unpadded `YYYY-M-D` target date.
    pub date: String,
    /// Clock label of the class this run was after.
    #[serde(rename = "class")]
    pub class_label: String,
    pub status: RunStatus,
    pub message: String,
    /// `true`/`false` once verification ran, `null` when it did not apply.
    pub verified: Option<bool>,
}

impl RunReport {
    pub fn new(
        status: RunStatus,
        target: &TargetDate,
        class_label: &str,
        message: impl Into<String>,
        verified: Option<bool>,
    ) -> Self {
        let timestamp = Utc::now()
            .with_timezone(&Seoul)
            .format("%Y-%m-%dT%H:%M:%S%.3f%:z")
            .to_string();
        Self {
            timestamp,
            date: target.date_string(),
            class_label: class_label.to_string(),
            status,
            message: message.into(),
            verified,
        }
    }

    /// Writes the pretty-printed report, creating parent directories.
    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("serializing run report")?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }
}
