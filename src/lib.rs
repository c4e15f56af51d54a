//! Core logic for wxwork-robot-notifier
//!
//! Forwards build events to WeChat Work group chats through robot webhooks.
//! Robot configurations are validated field by field, the person who ran the
//! build is looked up for @mention, and each robot gets exactly one POST.

mod config;
mod error;
mod events;
mod executor;
mod logging;
mod notifier;
mod registry;
mod robot;
mod web;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;

pub use config::{
    default_config, get_config_path, load_config, load_config_from_path, save_config,
    save_config_to_path, AppConfig, JobConfig,
};
pub use error::{NotifierError, Result, TransportError};
pub use events::*;
pub use executor::*;
pub use logging::{init as init_logging, init_from_config as init_logging_from_config};
pub use notifier::*;
pub use registry::*;
pub use robot::{
    check_id, check_name, check_webhook, JobRobots, MarkdownMessage, Message, RawRobotConfig,
    RobotConfig, RobotResponse, RobotSender, TextMessage, WXWorkRobotSender, WebhookClient,
    DEFAULT_TIMEOUT_SECS, MENTION_ALL,
};
pub use web::{bind_server, configure, serve, start_web_server, AppState, ADMIN_TOKEN_HEADER};

/// Parse a build event from stdin
pub fn parse_event() -> Result<BuildEvent> {
    let mut buffer = String::new();
    std::io::stdin().read_to_string(&mut buffer)?;
    parse_event_str(&buffer)
}

/// Parse a build event from a JSON string
pub fn parse_event_str(input: &str) -> Result<BuildEvent> {
    if input.trim().is_empty() {
        return Err(NotifierError::ConfigError("empty build event input".to_string()));
    }
    Ok(serde_json::from_str(input)?)
}

/// Notification manager for the command line
///
/// Owns the loaded configuration and the sender, and runs the async
/// notification flows to completion on a private runtime.
pub struct NotificationManager {
    config: AppConfig,
    sender: Arc<dyn RobotSender>,
}

impl NotificationManager {
    /// Load configuration from `path` and build a WXWork sender from it
    pub fn load(path: &Path) -> Result<Self> {
        let config = load_config_from_path(path)?;
        logging::init_from_config(&config);
        tracing::debug!(path = %path.display(), jobs = config.jobs.len(), "configuration loaded");
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let sender = Arc::new(WXWorkRobotSender::with_timeout(config.timeout_secs)?);
        Ok(Self::with_sender(config, sender))
    }

    pub fn with_sender(config: AppConfig, sender: Arc<dyn RobotSender>) -> Self {
        Self { config, sender }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sender(&self) -> Arc<dyn RobotSender> {
        Arc::clone(&self.sender)
    }

    /// Notify the robots of the event's job, blocking until every send finished
    pub fn notify(&self, event: &BuildEvent, log: &dyn BuildLog) -> Result<Vec<Delivery>> {
        let runtime = Runtime::new()?;
        runtime.block_on(self.notify_async(event, log))
    }

    pub async fn notify_async(&self, event: &BuildEvent, log: &dyn BuildLog) -> Result<Vec<Delivery>> {
        let notifier = BuildNotifier::new(
            self.sender(),
            self.config.job_robots(),
            Arc::new(self.config.user_directory()),
        );
        notifier.notify(event, log).await
    }

    /// Run the robot test flow against the given fields, blocking
    pub fn test_robot(&self, id: &str, name: &str, webhook: &str) -> Result<FormValidation> {
        let runtime = Runtime::new()?;
        Ok(runtime.block_on(test_robot(self.sender.as_ref(), id, name, webhook)))
    }

    /// Run the robot test flow against a robot saved for `job`
    pub fn test_saved_robot(&self, job: &str, robot_id: &str) -> Result<FormValidation> {
        let robot = self
            .config
            .job(job)?
            .robots
            .get(robot_id)
            .cloned()
            .ok_or_else(|| {
                NotifierError::ConfigError(format!("robot {} is not configured for job {}", robot_id, job))
            })?;
        self.test_robot(robot.id(), robot.name(), robot.webhook())
    }

    /// Web server state built from this manager
    pub fn app_state(&self) -> AppState {
        AppState {
            registry: DescriptorRegistry::init(),
            sender: self.sender(),
            admin_token: self.config.admin_token.clone(),
        }
    }
}
