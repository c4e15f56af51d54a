//! Robot sender trait definition
//!
//! The sender is handed to its callers as `Arc<dyn RobotSender>`, so tests and
//! alternative providers can replace the WXWork implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::robot::config::RobotConfig;
use crate::robot::message::Message;

/// Result of one send attempt that reached the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RobotResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error_message: Some(message.into()),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}

/// Posts messages to robot webhooks
#[async_trait]
pub trait RobotSender: Send + Sync {
    /// Provider identifier, e.g. "wxwork"
    fn provider(&self) -> &'static str;

    /// Send one message to one robot, exactly once
    ///
    /// `Err` means the provider never answered (see `TransportError`);
    /// a provider-reported failure is `Ok` with `ok == false`.
    async fn send(&self, robot: &RobotConfig, message: &Message) -> Result<RobotResponse>;
}
