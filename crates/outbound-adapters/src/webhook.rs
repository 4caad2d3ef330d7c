//! Discord webhook sink.

use async_trait::async_trait;
use domains::{DeliveryError, NotificationSink, WebhookMessage};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

/// Posts payloads to a webhook URL. Discord answers `204 No Content` when it
/// accepted the message; anything else counts as a failed delivery.
pub struct WebhookSink {
    client: reqwest::Client,
    url: SecretString,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client, url: SecretString) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url.expose_secret())
            .json(message)
            .send()
            .await
            // The URL carries the webhook token; keep it out of error text.
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(()),
            status => {
                debug!(status = status.as_u16(), "webhook rejected payload");
                Err(DeliveryError::UnexpectedStatus {
                    status: status.as_u16(),
                })
            }
        }
    }
}
