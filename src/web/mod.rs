//! Web UI module for robot configuration
//!
//! Field validation and robot testing over HTTP, using Actix-web.

pub mod server;

pub use server::{bind_server, configure, serve, start_web_server, AppState, ADMIN_TOKEN_HEADER};
