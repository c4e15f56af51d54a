//! Configuration schema for wxwork-robot-notifier
//!
//! Jobs and their robots, the users available for executor lookup, and the
//! settings of the notifier itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{NotifierError, Result};
use crate::executor::{InMemoryUserDirectory, UserProfile};
use crate::robot::{JobRobots, DEFAULT_TIMEOUT_SECS};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,

    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,

    /// Webhook request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token required by the robot test endpoint
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Jobs keyed by name
    #[serde(default)]
    pub jobs: BTreeMap<String, JobConfig>,

    /// Users available for executor lookup
    #[serde(default)]
    pub users: Vec<UserProfile>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Configuration of a single job
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct JobConfig {
    /// Robots attached to this job; ids are unique
    #[serde(default)]
    pub robots: JobRobots,
}

impl AppConfig {
    pub fn job(&self, name: &str) -> Result<&JobConfig> {
        self.jobs
            .get(name)
            .ok_or_else(|| NotifierError::UnknownJob(name.to_string()))
    }

    pub fn user_directory(&self) -> InMemoryUserDirectory {
        InMemoryUserDirectory::new(self.users.iter().cloned())
    }

    /// Robot jobs as a name → robots map
    pub fn job_robots(&self) -> BTreeMap<String, JobRobots> {
        self.jobs
            .iter()
            .map(|(name, job)| (name.clone(), job.robots.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::UserDirectory;
    use serde_json::json;

    #[test]
    fn test_default_app_config() {
        let config: AppConfig = serde_json::from_value(json!({
            "version": "1.0"
        }))
        .unwrap();

        assert_eq!(config.version, "1.0");
        assert!(!config.debug);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.admin_token.is_none());
        assert!(config.jobs.is_empty());
        assert!(config.users.is_empty());
    }

    #[test]
    fn test_jobs_and_users() {
        let config: AppConfig = serde_json::from_value(json!({
            "version": "1.0",
            "jobs": {
                "backend": {
                    "robots": [
                        {"id": "ops", "name": "Ops", "webhook": "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=a"}
                    ]
                }
            },
            "users": [
                {"id": "alice", "display_name": "Alice", "property": {"mobile": "13800000000"}}
            ]
        }))
        .unwrap();

        let job = config.job("backend").unwrap();
        assert_eq!(job.robots.len(), 1);
        assert!(job.robots.get("ops").is_some());
        assert!(matches!(config.job("frontend"), Err(NotifierError::UnknownJob(_))));

        let directory = config.user_directory();
        assert_eq!(directory.get_by_id("alice").unwrap().display_name, "Alice");
        assert_eq!(config.job_robots().len(), 1);
    }

    #[test]
    fn test_blank_robot_rejected() {
        let result: std::result::Result<AppConfig, _> = serde_json::from_value(json!({
            "version": "1.0",
            "jobs": {"backend": {"robots": [{"id": "ops", "name": "", "webhook": "https://a.b/c"}]}}
        }));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("name"));
    }
}
