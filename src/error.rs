//! Error types for wxwork-robot-notifier
//!
//! Structured error types built with `thiserror`. Provider-reported failures
//! are not errors here: they come back as a `RobotResponse` with `ok == false`.

use std::io;
use thiserror::Error;

/// Main error type for the notifier
#[derive(Error, Debug)]
pub enum NotifierError {
    /// A required robot field is blank or malformed
    #[error("{message}")]
    Validation {
        /// Name of the offending field ("id", "name", "webhook")
        field: &'static str,
        /// Human-readable message naming the field
        message: String,
    },

    /// The webhook could not be reached or answered with a non-2xx status
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Two robots of the same job share an id
    #[error("Duplicate robot id: {0}")]
    DuplicateRobot(String),

    /// No job with this name is configured
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    /// Configuration could not be loaded or saved
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during JSON parsing
    #[error("JSON parsing error: {0}")]
    JsonParseError(#[from] serde_json::Error),

    /// I/O error (stdin, config file, runtime creation)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

/// The ways a single webhook round trip can fail before a provider answer is available
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request did not complete within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// The connection to the webhook host could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// The webhook answered with a non-success HTTP status
    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    /// Any other failure while building, sending or reading the request
    #[error("request failed: {0}")]
    Request(String),
}

impl NotifierError {
    /// Build a validation error for `field`
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// True when the error came from the network rather than from input or config
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result type alias for the notifier
pub type Result<T> = std::result::Result<T, NotifierError>;
