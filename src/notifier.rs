//! Build notification dispatch
//!
//! Turns build events into robot messages and drives the robot test flow
//! used by the UI. The sender is injected so both can run against a stub.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::error::{NotifierError, Result};
use crate::events::{BuildEvent, BuildLog};
use crate::executor::{resolve_executor, RunUser, UserDirectory};
use crate::registry::FormValidation;
use crate::robot::{JobRobots, Message, RobotConfig, RobotResponse, RobotSender, TextMessage};

/// Content of the message sent by the robot test flow
pub const TEST_MESSAGE: &str = "WXWork robot test succeeded!";

/// Shown when a robot test never got an answer from the provider
pub const TEST_TRANSPORT_FAILURE: &str = "an error occurred testing the robot";

/// Send the test message to an unsaved robot configuration
///
/// Blank fields, provider errors and transport failures all come back as an
/// error verdict, each with its own message.
pub async fn test_robot(
    sender: &dyn RobotSender,
    id: &str,
    name: &str,
    webhook: &str,
) -> FormValidation {
    let robot = match RobotConfig::new(id, name, webhook) {
        Ok(robot) => robot,
        Err(e) => return FormValidation::error(e.to_string()),
    };

    let message: Message = TextMessage::new(TEST_MESSAGE).mention_all(true).into();
    match sender.send(&robot, &message).await {
        Ok(response) if response.ok => {
            info!(robot = robot.id(), "robot test succeeded");
            FormValidation::ok_with("Test succeeded")
        }
        Ok(response) => FormValidation::error(
            response
                .error_message()
                .unwrap_or("robot reported an unknown error"),
        ),
        Err(e) => {
            error!(robot = robot.id(), error = %e, "robot test failed");
            FormValidation::error(TEST_TRANSPORT_FAILURE)
        }
    }
}

/// Outcome of notifying one robot
#[derive(Debug)]
pub struct Delivery {
    pub robot_id: String,
    pub result: Result<RobotResponse>,
}

impl Delivery {
    pub fn is_ok(&self) -> bool {
        matches!(&self.result, Ok(response) if response.ok)
    }
}

/// Sends build notifications to the robots of each job
pub struct BuildNotifier {
    sender: Arc<dyn RobotSender>,
    jobs: BTreeMap<String, JobRobots>,
    directory: Arc<dyn UserDirectory>,
}

impl BuildNotifier {
    pub fn new(
        sender: Arc<dyn RobotSender>,
        jobs: BTreeMap<String, JobRobots>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            sender,
            jobs,
            directory,
        }
    }

    /// Notify the robots selected by `event`
    ///
    /// Robots are sent to one after another; a failing robot is logged and
    /// does not stop the rest.
    pub async fn notify(&self, event: &BuildEvent, log: &dyn BuildLog) -> Result<Vec<Delivery>> {
        let robots = self
            .jobs
            .get(&event.job)
            .ok_or_else(|| NotifierError::UnknownJob(event.job.clone()))?;

        let targets = select_robots(robots, event.robots.as_deref(), log);
        if targets.is_empty() {
            log.info(&format!("no robots to notify for job {}", event.job));
            return Ok(Vec::new());
        }

        let executor = resolve_executor(&event.causes, self.directory.as_ref(), log);
        let message = build_message(event, &executor);

        let mut deliveries = Vec::with_capacity(targets.len());
        for robot in targets {
            let result = self.sender.send(robot, &message).await;
            match &result {
                Ok(response) if response.ok => log.info(&format!("robot {}: sent", robot.id())),
                Ok(response) => log.error(&format!(
                    "robot {}: {}",
                    robot.id(),
                    response.error_message().unwrap_or("unknown error")
                )),
                Err(e) => log.error(&format!("robot {}: {}", robot.id(), e)),
            }
            deliveries.push(Delivery {
                robot_id: robot.id().to_string(),
                result,
            });
        }

        info!(
            job = %event.job,
            number = event.number,
            sent = deliveries.iter().filter(|d| d.is_ok()).count(),
            total = deliveries.len(),
            "build notification dispatched"
        );
        Ok(deliveries)
    }
}

fn select_robots<'a>(
    robots: &'a JobRobots,
    wanted: Option<&[String]>,
    log: &dyn BuildLog,
) -> Vec<&'a RobotConfig> {
    let Some(wanted) = wanted else {
        return robots.iter().collect();
    };

    let mut selected: Vec<&RobotConfig> = Vec::new();
    for id in wanted {
        match robots.get(id) {
            Some(robot) if !selected.iter().any(|r| r.id() == robot.id()) => selected.push(robot),
            Some(_) => {}
            None => log.error(&format!("robot {} is not configured for this job, skipping", id)),
        }
    }
    selected
}

/// Render the text message for a build event
pub fn build_message(event: &BuildEvent, executor: &RunUser) -> Message {
    let mut lines = vec![
        format!("【{}】#{} {}", event.job, event.number, event.status.label()),
        format!("Executor: {}", executor.name),
    ];
    if let Some(ms) = event.duration_ms.filter(|_| event.status.is_finished()) {
        lines.push(format!("Duration: {}", format_duration(Duration::from_millis(ms))));
    }
    if let Some(url) = &event.url {
        lines.push(format!("Details: {}", url));
    }

    let mut text = TextMessage::new(lines.join("\n")).mention_all(event.mention_all);
    if let Some(mobile) = &executor.mobile {
        text = text.mention(mobile.clone());
    }
    text.into()
}

/// Human-readable duration, e.g. "1 min 5 sec"
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{} sec", seconds),
        (0, _) => format!("{} min {} sec", minutes, seconds),
        _ => format!("{} hr {} min {} sec", hours, minutes, seconds),
    }
}
