//! HTTP reachability probe for the public website.

use std::time::Duration;

use async_trait::async_trait;
use domains::{DeliveryError, ReachabilityProbe};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpProbe {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self) -> Result<String, DeliveryError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))
    }
}
