//! Robot module
//!
//! Robot configurations, message types, and the sender that posts them to
//! WeChat Work group robot webhooks.

pub mod config;
pub mod message;
pub mod r#trait;
pub mod webhook;
pub mod wxwork;

pub use config::{check_id, check_name, check_webhook, JobRobots, RawRobotConfig, RobotConfig};
pub use message::{MarkdownMessage, Message, TextMessage, MENTION_ALL};
pub use r#trait::{RobotResponse, RobotSender};
pub use webhook::{WebhookClient, DEFAULT_TIMEOUT_SECS};
pub use wxwork::WXWorkRobotSender;
