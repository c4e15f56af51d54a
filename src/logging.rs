//! Logging setup
//!
//! Installs a `tracing-subscriber` fmt subscriber on stderr. `RUST_LOG`
//! takes precedence over the config `debug` flag.

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Initialize logging from config
pub fn init_from_config(config: &AppConfig) {
    init(config.debug);
}

/// Initialize logging; calling it more than once is harmless
pub fn init(debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "wxwork_robot_notifier=debug,info"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert!(default_directive(true).contains("debug"));
    }

    #[test]
    fn test_init_twice() {
        init(false);
        init(true);
    }
}
