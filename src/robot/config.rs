//! Robot configuration and field validation

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{NotifierError, Result};
use crate::registry::FormValidation;

/// A named WXWork robot webhook attached to a job
///
/// Fields are private; a `RobotConfig` can only be obtained through
/// [`RobotConfig::new`], so every instance has non-blank fields and a
/// parseable webhook URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRobotConfig")]
pub struct RobotConfig {
    id: String,
    name: String,
    webhook: String,
}

/// Unvalidated robot fields, as they arrive from config files and forms
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRobotConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub webhook: String,
}

impl TryFrom<RawRobotConfig> for RobotConfig {
    type Error = NotifierError;

    fn try_from(raw: RawRobotConfig) -> Result<Self> {
        RobotConfig::new(raw.id, raw.name, raw.webhook)
    }
}

impl RobotConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        webhook: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into().trim().to_string();
        let name = name.into().trim().to_string();
        let webhook = webhook.into().trim().to_string();

        for (field, verdict) in [
            ("id", check_id(&id)),
            ("name", check_name(&name)),
            ("webhook", check_webhook(&webhook)),
        ] {
            if !verdict.is_ok() {
                return Err(NotifierError::validation(field, verdict.message()));
            }
        }

        Ok(Self { id, name, webhook })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn webhook(&self) -> &str {
        &self.webhook
    }
}

/// Check the robot id field
pub fn check_id(id: &str) -> FormValidation {
    if id.trim().is_empty() {
        return FormValidation::error("Robot id must not be blank");
    }
    FormValidation::ok()
}

/// Check the robot name field
pub fn check_name(name: &str) -> FormValidation {
    if name.trim().is_empty() {
        return FormValidation::error("Robot name must not be blank");
    }
    FormValidation::ok()
}

/// Check the robot webhook field
pub fn check_webhook(webhook: &str) -> FormValidation {
    let webhook = webhook.trim();
    if webhook.is_empty() {
        return FormValidation::error("Robot webhook must not be blank");
    }
    match Url::parse(webhook) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            FormValidation::ok()
        }
        _ => FormValidation::error("Robot webhook is not a valid URL"),
    }
}

/// The robots configured for one job, in declaration order, ids unique
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobRobots {
    robots: Vec<RobotConfig>,
}

impl JobRobots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a robot, rejecting an id that is already present
    pub fn add(&mut self, robot: RobotConfig) -> Result<()> {
        if self.get(robot.id()).is_some() {
            return Err(NotifierError::DuplicateRobot(robot.id().to_string()));
        }
        self.robots.push(robot);
        Ok(())
    }

    /// Remove a robot by id, returning it if present
    pub fn remove(&mut self, id: &str) -> Option<RobotConfig> {
        let index = self.robots.iter().position(|r| r.id() == id)?;
        Some(self.robots.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&RobotConfig> {
        self.robots.iter().find(|r| r.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RobotConfig> {
        self.robots.iter()
    }

    pub fn len(&self) -> usize {
        self.robots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty()
    }
}

impl TryFrom<Vec<RobotConfig>> for JobRobots {
    type Error = NotifierError;

    fn try_from(robots: Vec<RobotConfig>) -> Result<Self> {
        let mut job = JobRobots::new();
        for robot in robots {
            job.add(robot)?;
        }
        Ok(job)
    }
}

impl<'de> Deserialize<'de> for JobRobots {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let robots = Vec::<RobotConfig>::deserialize(deserializer)?;
        JobRobots::try_from(robots).map_err(serde::de::Error::custom)
    }
}
