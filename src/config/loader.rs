//! Configuration file loading and saving
//!
//! This module handles loading configuration from ~/.wxwork-robot-notifier.json
//! and saving configuration updates.

use crate::config::schema::AppConfig;
use crate::error::{NotifierError, Result};
use dirs::home_dir;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE_NAME: &str = ".wxwork-robot-notifier.json";

/// Get the default configuration file path
/// Returns ~/.wxwork-robot-notifier.json, or the file in the working directory without a home
pub fn get_config_path() -> PathBuf {
    home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// Load configuration from the default path
/// If the file doesn't exist, returns a default configuration
pub fn load_config() -> Result<AppConfig> {
    load_config_from_path(&get_config_path())
}

/// Load configuration from a specific path
///
/// A missing file is not an error: the defaults are used until the first save.
pub fn load_config_from_path(path: &Path) -> Result<AppConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(default_config());
        }
        Err(e) => return Err(config_error("read", path, e)),
    };

    let config = serde_json::from_str(&content).map_err(|e| config_error("parse", path, e))?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Save configuration to the default path
pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to_path(config, &get_config_path())
}

/// Save configuration to a specific path, creating missing parent directories
pub fn save_config_to_path(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| config_error("create directory for", path, e))?;
    }

    let content =
        serde_json::to_string_pretty(config).map_err(|e| config_error("serialize", path, e))?;
    fs::write(path, content).map_err(|e| config_error("write", path, e))?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

fn config_error(action: &str, path: &Path, e: impl std::fmt::Display) -> NotifierError {
    NotifierError::ConfigError(format!("Failed to {} {}: {}", action, path.display(), e))
}

/// Create a default configuration: no jobs, no users, no admin token
pub fn default_config() -> AppConfig {
    AppConfig {
        version: "1.0".to_string(),
        debug: false,
        timeout_secs: crate::robot::DEFAULT_TIMEOUT_SECS,
        admin_token: None,
        jobs: Default::default(),
        users: Vec::new(),
    }
}
