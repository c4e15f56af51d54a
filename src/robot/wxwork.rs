//! WeChat Work (企业微信) group robot sender

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::robot::config::RobotConfig;
use crate::robot::message::Message;
use crate::robot::r#trait::{RobotResponse, RobotSender};
use crate::robot::webhook::WebhookClient;

/// Sends messages through WXWork group robot webhooks
pub struct WXWorkRobotSender {
    client: WebhookClient,
}

impl WXWorkRobotSender {
    pub fn new(client: WebhookClient) -> Self {
        Self { client }
    }

    /// Create a sender whose requests time out after `timeout_secs`
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self::new(WebhookClient::with_timeout(timeout_secs)?))
    }
}

/// WXWork webhook answer body
#[derive(Debug, Deserialize)]
struct WXWorkReply {
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Interpret a 2xx response body from a WXWork robot
fn parse_reply(body: &str) -> RobotResponse {
    match serde_json::from_str::<WXWorkReply>(body) {
        Ok(reply) if reply.errcode == 0 => RobotResponse::ok(),
        Ok(reply) => {
            let message = if reply.errmsg.is_empty() {
                format!("robot returned errcode {}", reply.errcode)
            } else {
                reply.errmsg
            };
            RobotResponse::failed(message)
        }
        Err(e) => {
            warn!(error = %e, "unexpected robot response body");
            RobotResponse::failed(format!("unexpected response from robot: {}", body))
        }
    }
}

#[async_trait]
impl RobotSender for WXWorkRobotSender {
    fn provider(&self) -> &'static str {
        "wxwork"
    }

    async fn send(&self, robot: &RobotConfig, message: &Message) -> Result<RobotResponse> {
        debug!(robot = robot.id(), msgtype = message.msgtype(), "sending robot message");
        let body = self.client.post_json(robot.webhook(), &message.to_json()).await?;
        let response = parse_reply(&body);
        if !response.ok {
            warn!(
                robot = robot.id(),
                error = response.error_message().unwrap_or_default(),
                "robot rejected message"
            );
        }
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NotifierError, TransportError};
    use crate::robot::message::TextMessage;
    use mockito::Matcher;
    use serde_json::json;

    fn robot_for(server: &mockito::ServerGuard) -> RobotConfig {
        RobotConfig::new(
            "ops",
            "Ops group",
            format!("{}/cgi-bin/webhook/send?key=test", server.url()),
        )
        .unwrap()
    }

    fn ping() -> Message {
        TextMessage::new("ping").mention_all(true).into()
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(parse_reply(r#"{"errcode":0,"errmsg":"ok"}"#), RobotResponse::ok());
        assert_eq!(
            parse_reply(r#"{"errcode":93000,"errmsg":"bad token"}"#),
            RobotResponse::failed("bad token")
        );
        assert_eq!(
            parse_reply(r#"{"errcode":45009}"#),
            RobotResponse::failed("robot returned errcode 45009")
        );
        let response = parse_reply("<html>gateway</html>");
        assert!(!response.ok);
        assert!(response
            .error_message()
            .unwrap()
            .starts_with("unexpected response from robot"));
    }

    #[tokio::test]
    async fn test_send_ok() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/cgi-bin/webhook/send")
            .match_query(Matcher::UrlEncoded("key".into(), "test".into()))
            .match_body(Matcher::Json(json!({
                "msgtype": "text",
                "text": {"content": "ping", "mentioned_mobile_list": ["@all"]}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errcode":0,"errmsg":"ok"}"#)
            .create_async()
            .await;

        let sender = WXWorkRobotSender::with_timeout(5).unwrap();
        let response = sender.send(&robot_for(&server), &ping()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response, RobotResponse::ok());
    }

    #[tokio::test]
    async fn test_send_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/cgi-bin/webhook/send")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errcode":93000,"errmsg":"bad token"}"#)
            .create_async()
            .await;

        let sender = WXWorkRobotSender::with_timeout(5).unwrap();
        let response = sender.send(&robot_for(&server), &ping()).await.unwrap();

        assert!(!response.ok);
        assert_eq!(response.error_message(), Some("bad token"));
    }

    #[tokio::test]
    async fn test_send_unreachable_is_transport_error() {
        let sender = WXWorkRobotSender::with_timeout(2).unwrap();
        let robot = RobotConfig::new("ops", "Ops", "http://127.0.0.1:1/cgi-bin/webhook/send").unwrap();

        let err = sender.send(&robot, &ping()).await.unwrap_err();
        assert!(matches!(err, NotifierError::Transport(_)));
    }

    #[tokio::test]
    async fn test_send_http_error_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/cgi-bin/webhook/send")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("unavailable")
            .create_async()
            .await;

        let sender = WXWorkRobotSender::with_timeout(5).unwrap();
        let err = sender.send(&robot_for(&server), &ping()).await.unwrap_err();
        assert!(matches!(
            err,
            NotifierError::Transport(TransportError::Status(503, _))
        ));
    }
}
