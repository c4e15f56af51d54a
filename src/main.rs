//! CLI entry point for wxwork-robot-notifier
//!
//! Validates robot configurations, sends test messages, forwards build
//! events read from stdin, and serves the configuration API.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use wxwork_robot_notifier::{
    check_id, check_name, check_webhook, get_config_path, init_logging, parse_event,
    start_web_server, FormValidation, NotificationManager, NotifierError, StderrBuildLog,
};

/// Command-line arguments for wxwork-robot-notifier
#[derive(Parser, Debug)]
#[command(
    name = "wxwork-robot-notifier",
    about = "Forward build events to WeChat Work group robots",
    version
)]
struct Cli {
    /// Configuration file (default: ~/.wxwork-robot-notifier.json)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate robot fields without sending anything
    Check(RobotArgs),

    /// Send the test message to a robot
    Test(TestArgs),

    /// Read a build event as JSON from stdin and notify the job's robots
    Notify,

    /// Serve the robot configuration API
    Serve(ServeArgs),
}

/// Robot fields given on the command line
#[derive(Args, Debug)]
struct RobotArgs {
    #[arg(long, default_value = "")]
    id: String,

    #[arg(long, default_value = "")]
    name: String,

    #[arg(long, default_value = "")]
    webhook: String,
}

/// Arguments for the test command
#[derive(Args, Debug)]
struct TestArgs {
    /// Job whose saved robot should be tested (requires --robot)
    #[arg(long, requires = "robot")]
    job: Option<String>,

    /// Id of a saved robot (requires --job)
    #[arg(long, requires = "job")]
    robot: Option<String>,

    #[command(flatten)]
    fields: RobotArgs,
}

/// Arguments for the serve command
#[derive(Args, Debug)]
struct ServeArgs {
    /// Port for web server (default: 3000)
    #[arg(short, long, default_value = "3000")]
    port: u16,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check(args) => {
            init_logging(false);
            Ok(check_command(&args))
        }
        Commands::Test(args) => config_path(cli.config).and_then(|path| test_command(&path, args)),
        Commands::Notify => config_path(cli.config).and_then(|path| notify_command(&path)),
        Commands::Serve(args) => config_path(cli.config).and_then(|path| serve_command(&path, args)),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn config_path(config: Option<String>) -> Result<PathBuf, NotifierError> {
    match config {
        Some(path) => {
            let expanded = shellexpand::full(&path)
                .map_err(|e| NotifierError::ConfigError(format!("Failed to expand path: {}", e)))?;
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => Ok(get_config_path()),
    }
}

fn print_verdict(label: &str, verdict: &FormValidation) {
    if verdict.is_ok() {
        println!("{}: ok", label);
    } else {
        println!("{}: {}", label, verdict.message());
    }
}

/// Handle the check command - print one verdict per field
fn check_command(args: &RobotArgs) -> bool {
    let verdicts = [
        ("id", check_id(&args.id)),
        ("name", check_name(&args.name)),
        ("webhook", check_webhook(&args.webhook)),
    ];
    for (label, verdict) in &verdicts {
        print_verdict(label, verdict);
    }
    verdicts.iter().all(|(_, v)| v.is_ok())
}

/// Handle the test command - send the test message
fn test_command(path: &Path, args: TestArgs) -> Result<bool, NotifierError> {
    let manager = NotificationManager::load(path)?;
    let verdict = match (args.job, args.robot) {
        (Some(job), Some(robot)) => manager.test_saved_robot(&job, &robot)?,
        _ => manager.test_robot(&args.fields.id, &args.fields.name, &args.fields.webhook)?,
    };
    print_verdict("test", &verdict);
    Ok(verdict.is_ok())
}

/// Handle the notify command - forward a build event from stdin
fn notify_command(path: &Path) -> Result<bool, NotifierError> {
    let manager = NotificationManager::load(path)?;
    let event = parse_event()?;
    let deliveries = manager.notify(&event, &StderrBuildLog)?;
    Ok(deliveries.iter().all(|d| d.is_ok()))
}

/// Handle the serve command - run the configuration API until stopped
fn serve_command(path: &Path, args: ServeArgs) -> Result<bool, NotifierError> {
    let manager = NotificationManager::load(path)?;
    let state = manager.app_state();

    println!("Config file: {}", path.display());
    println!("Listening on http://127.0.0.1:{}", args.port);
    println!("Press Ctrl+C to stop the server");

    actix_rt::System::new().block_on(start_web_server(state, args.port))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_command() {
        let cli = Cli::try_parse_from([
            "wxwork-robot-notifier",
            "check",
            "--id",
            "ops",
            "--name",
            "Ops",
            "--webhook",
            "https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=k",
        ])
        .unwrap();
        match cli.command {
            Commands::Check(args) => assert!(check_command(&args)),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_check_command_blank_fields() {
        let cli = Cli::try_parse_from(["wxwork-robot-notifier", "check", "--id", "ops"]).unwrap();
        match cli.command {
            Commands::Check(args) => assert!(!check_command(&args)),
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_test_requires_job_and_robot_together() {
        assert!(Cli::try_parse_from(["wxwork-robot-notifier", "test", "--job", "backend"]).is_err());

        let cli = Cli::try_parse_from([
            "wxwork-robot-notifier",
            "--config",
            "/tmp/notifier.json",
            "test",
            "--job",
            "backend",
            "--robot",
            "ops",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/notifier.json"));
        match cli.command {
            Commands::Test(args) => {
                assert_eq!(args.job.as_deref(), Some("backend"));
                assert_eq!(args.robot.as_deref(), Some("ops"));
            }
            _ => panic!("Expected Test command"),
        }
    }

    #[test]
    fn test_serve_default_port() {
        let cli = Cli::try_parse_from(["wxwork-robot-notifier", "serve"]).unwrap();
        match cli.command {
            Commands::Serve(args) => assert_eq!(args.port, 3000),
            _ => panic!("Expected Serve command"),
        }
    }
}
