//! HTTP client for the Proxmox VE QEMU status endpoints.

use crate::core::domain::{
    error::ApiError,
    model::{
        monitor_config::MonitorConfig,
        sample::Sample,
        vm_status::{ApiResponse, VmStatusCurrent},
    },
    value_object::ApiToken,
};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{Client, Method, Response, header::AUTHORIZATION};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Operations the monitor needs from the hypervisor.
///
/// Implementations never panic on remote failures: every transport,
/// status or payload problem comes back as an [`ApiError`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait HypervisorApi: Send + Sync {
    /// Polls the current status of the monitored VM.
    async fn check_status(&self) -> Result<Sample, ApiError>;

    /// Asks the hypervisor to start the monitored VM.
    ///
    /// Success means the request was accepted, not that the guest booted.
    async fn start_vm(&self) -> Result<(), ApiError>;
}

/// Token-authenticated client for one VM on one node.
///
/// The underlying `reqwest::Client` keeps a connection pool that is reused
/// across ticks and released when the client is dropped.
#[derive(Debug)]
pub struct HypervisorClient {
    http_client: Client,
    api_base: String,
    node: String,
    vm_id: String,
    token: ApiToken,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl HypervisorClient {
    /// Creates a new `HypervisorClient` from a validated configuration.
    ///
    /// # Errors
    /// Returns `ApiError::Client` if the HTTP client cannot be built.
    pub fn new(config: &MonitorConfig) -> Result<Self, ApiError> {
        let timeouts = config.timeouts();
        let http_client = Client::builder()
            .danger_accept_invalid_certs(config.accept_invalid_certs())
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.connect + timeouts.read)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        let rate_limiter = config.rate_limit().map(|rl| {
            let quota = Quota::per_second(rl.requests_per_second).allow_burst(rl.burst_size);
            Arc::new(DefaultDirectRateLimiter::direct(quota))
        });

        Ok(Self {
            http_client,
            api_base: config.host().api_base(),
            node: config.node().to_string(),
            vm_id: config.vm_id().to_string(),
            token: config.token().clone(),
            rate_limiter,
        })
    }

    fn status_url(&self, action: &str) -> String {
        format!(
            "{}/nodes/{}/qemu/{}/status/{}",
            self.api_base, self.node, self.vm_id, action
        )
    }

    /// Sends one authenticated request and rejects non-success statuses.
    async fn execute_request(&self, method: Method, url: &str) -> Result<Response, ApiError> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        let response = self
            .http_client
            .request(method, url)
            .header(AUTHORIZATION, self.token.as_authorization_header())
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl HypervisorApi for HypervisorClient {
    async fn check_status(&self) -> Result<Sample, ApiError> {
        let response = self
            .execute_request(Method::GET, &self.status_url("current"))
            .await?;

        let status = response
            .json::<ApiResponse<VmStatusCurrent>>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(e.to_string())
                } else {
                    ApiError::Payload(e.to_string())
                }
            })?
            .data;

        debug!(
            vm_id = %self.vm_id,
            status = %status.status,
            cpu = status.cpu,
            uptime = status.uptime,
            "VM status received"
        );
        Ok(status.into_sample(SystemTime::now()))
    }

    async fn start_vm(&self) -> Result<(), ApiError> {
        self.execute_request(Method::POST, &self.status_url("start"))
            .await?;
        debug!(vm_id = %self.vm_id, "VM start request accepted");
        Ok(())
    }
}

fn request_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout(e.to_string())
    } else {
        ApiError::Transport(e.to_string())
    }
}
