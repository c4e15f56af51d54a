//! HTTP client for robot webhooks
//!
//! Thin wrapper around `reqwest` that posts a JSON payload once and maps
//! every transport failure to an explicit `TransportError`.

use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{NotifierError, Result, TransportError};

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Webhook HTTP client with a fixed per-request timeout
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    timeout: Duration,
}

impl WebhookClient {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with a custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                NotifierError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `payload` as JSON and return the body of a 2xx response
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<String> {
        debug!(url = %redact(url), "posting to webhook");

        let response = self
            .client
            .post(url)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        debug!(status = status.as_u16(), "webhook answered");

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::Status(status.as_u16(), body).into())
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> NotifierError {
    let kind = if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    };
    NotifierError::Transport(kind)
}

/// Strip the query string, which carries the robot key
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_webhook_client_creation() {
        let client = WebhookClient::new().unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));

        let client = WebhookClient::with_timeout(10).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("https://qyapi.weixin.qq.com/cgi-bin/webhook/send?key=secret"),
            "https://qyapi.weixin.qq.com/cgi-bin/webhook/send"
        );
        assert_eq!(redact("http://localhost/hook"), "http://localhost/hook");
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let client = WebhookClient::new().unwrap();
        let err = client
            .post_json(&format!("{}/hook", server.url()), &json!({}))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(
            err,
            NotifierError::Transport(TransportError::Status(500, ref body)) if body == "oops"
        ));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let client = WebhookClient::with_timeout(2).unwrap();
        let err = client
            .post_json("http://127.0.0.1:1/hook", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifierError::Transport(TransportError::Connect(_))));
    }

    #[tokio::test]
    async fn test_silent_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let client = WebhookClient::with_timeout(1).unwrap();
        let err = client
            .post_json(&format!("http://{}/hook", addr), &json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, NotifierError::Transport(TransportError::Timeout)));
        silent.abort();
    }
}
