//! Configuration management module
//!
//! This module handles loading and saving the notifier configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, get_config_path, load_config, load_config_from_path, save_config, save_config_to_path};
pub use schema::{AppConfig, JobConfig};
