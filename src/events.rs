//! Build event types handed over by the build runtime
//!
//! A `BuildEvent` arrives as JSON (stdin for the CLI) and carries everything
//! needed to notify a job's robots, including the causes that triggered it.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Status of the build at the time of the event
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Started,
    Success,
    Failure,
    Unstable,
    Aborted,
}

impl BuildStatus {
    /// Label shown in notifications
    pub fn label(&self) -> &'static str {
        match self {
            BuildStatus::Started => "started",
            BuildStatus::Success => "succeeded",
            BuildStatus::Failure => "failed",
            BuildStatus::Unstable => "is unstable",
            BuildStatus::Aborted => "was aborted",
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self, BuildStatus::Started)
    }
}

/// One reason a build was triggered
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct TriggerCause {
    /// Id of the user who triggered the build, if a user did
    #[serde(default)]
    pub user_id: Option<String>,
    /// Human-readable description, e.g. "Started by an SCM change"
    #[serde(default)]
    pub short_description: String,
}

impl TriggerCause {
    pub fn user(user_id: impl Into<String>, short_description: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            short_description: short_description.into(),
        }
    }

    pub fn other(short_description: impl Into<String>) -> Self {
        Self {
            user_id: None,
            short_description: short_description.into(),
        }
    }
}

/// A build lifecycle event to notify about
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildEvent {
    pub job: String,
    pub number: u64,
    pub status: BuildStatus,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub causes: Vec<TriggerCause>,
    /// Robot ids to notify; all robots of the job when absent
    #[serde(default)]
    pub robots: Option<Vec<String>>,
    #[serde(default)]
    pub mention_all: bool,
}

/// Per-build log the notifier writes its diagnostics to
pub trait BuildLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Build log writing `[wxwork]` prefixed lines to stderr
pub struct StderrBuildLog;

impl BuildLog for StderrBuildLog {
    fn info(&self, message: &str) {
        eprintln!("[wxwork] {}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("[wxwork] ERROR: {}", message);
    }
}

/// Build log that keeps its lines in memory
#[derive(Default)]
pub struct MemoryBuildLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryBuildLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl BuildLog for MemoryBuildLog {
    fn info(&self, message: &str) {
        self.push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.push(format!("ERROR: {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_build_event() {
        let event: BuildEvent = serde_json::from_value(json!({
            "job": "backend",
            "number": 42,
            "status": "FAILURE",
            "duration_ms": 61000,
            "causes": [
                {"user_id": "alice", "short_description": "Started by user Alice"}
            ]
        }))
        .unwrap();

        assert_eq!(event.job, "backend");
        assert_eq!(event.status, BuildStatus::Failure);
        assert_eq!(event.causes[0].user_id.as_deref(), Some("alice"));
        assert!(event.robots.is_none());
        assert!(!event.mention_all);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(BuildStatus::Success.label(), "succeeded");
        assert!(!BuildStatus::Started.is_finished());
        assert!(BuildStatus::Aborted.is_finished());
    }

    #[test]
    fn test_memory_build_log() {
        let log = MemoryBuildLog::new();
        log.info("hello");
        log.error("boom");
        assert_eq!(log.lines(), vec!["hello", "ERROR: boom"]);
    }
}
