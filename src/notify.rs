//! Webhook delivery of announcement messages.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::json;
use thiserror::Error;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info};
use url::Url;

use crate::TARGET_WEB_REQUEST;

/// Minimum spacing between consecutive webhook posts, to respect
/// endpoint throttling.
pub const MESSAGE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid webhook endpoint {0:?}")]
    InvalidEndpoint(String),
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver each message as an individual post. Returns how many were
    /// accepted by the endpoint.
    async fn send(&self, messages: &[String]) -> Result<usize, NotifyError>;
}

/// Production notifier: one JSON POST per message to an incoming-webhook
/// URL, with the configured display name attached.
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
    username: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            username: username.into(),
        }
    }
}

fn payload(message: &str, username: &str) -> serde_json::Value {
    json!({
        "text": message,
        "username": username,
    })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    /// Delivery is at-least-once: a transport failure aborts the batch
    /// with an error so the caller can retry the whole feed next run,
    /// while a non-2xx response is logged and the batch continues.
    async fn send(&self, messages: &[String]) -> Result<usize, NotifyError> {
        let endpoint = match Url::parse(&self.endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => return Err(NotifyError::InvalidEndpoint(self.endpoint.clone())),
        };

        let mut delivered = 0;
        for message in messages {
            sleep(MESSAGE_INTERVAL).await;

            let body = payload(message, &self.username);
            debug!(target: TARGET_WEB_REQUEST, "Posting webhook payload: {}", body);

            let response = self
                .client
                .post(endpoint.clone())
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.to_string())
                .send()
                .await?;

            if response.status().is_success() {
                info!(target: TARGET_WEB_REQUEST, "Webhook accepted message");
                delivered += 1;
            } else {
                let status = response.status();
                let error_text = response.text().await.unwrap_or_default();
                error!(
                    target: TARGET_WEB_REQUEST,
                    "Webhook returned {}: {}", status, error_text
                );
            }
        }

        Ok(delivered)
    }
}
