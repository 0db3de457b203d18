use crate::core::domain::{
    error::NotifyError, model::monitor_config::MonitorConfig, value_object::EndpointUrl,
};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Downstream action fired once per confirmed idle episode.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ShutdownNotifier: Send + Sync {
    /// Performs exactly one call. Never retries.
    async fn notify(&self) -> Result<(), NotifyError>;
}

/// Sends an empty `POST` to the configured shutdown webhook.
#[derive(Debug)]
pub struct WebhookNotifier {
    http_client: Client,
    url: EndpointUrl,
}

impl WebhookNotifier {
    /// Creates a new `WebhookNotifier` with the configured webhook timeout.
    ///
    /// # Errors
    /// Returns `NotifyError::Client` if the HTTP client cannot be built.
    pub fn new(config: &MonitorConfig) -> Result<Self, NotifyError> {
        let timeouts = config.timeouts();
        let http_client = Client::builder()
            .connect_timeout(timeouts.webhook)
            .timeout(timeouts.webhook)
            .build()
            .map_err(|e| NotifyError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            url: config.webhook_url().clone(),
        })
    }
}

#[async_trait]
impl ShutdownNotifier for WebhookNotifier {
    async fn notify(&self) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(self.url.as_url().clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Timeout(e.to_string())
                } else {
                    NotifyError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Shutdown webhook accepted");
        Ok(())
    }
}
