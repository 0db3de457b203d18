//! Immutable monitor configuration, validated once at startup.

use crate::core::domain::{
    error::ConfigError,
    value_object::{
        ApiToken, CpuThreshold, EndpointUrl, validate_api_token, validate_cpu_threshold,
        validate_endpoint_url,
    },
};
use std::num::NonZeroU32;
use std::time::Duration;

/// Rate limiting for hypervisor API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum number of requests per second.
    pub requests_per_second: NonZeroU32,
    /// Maximum burst size.
    pub burst_size: NonZeroU32,
}

/// HTTP timeouts applied to outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub read: Duration,
    /// Total time allowed for the shutdown webhook call.
    pub webhook: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(10),
            webhook: Duration::from_secs(5),
        }
    }
}

/// Everything the monitor needs to watch one VM.
///
/// Built through [`MonitorConfig::builder`], which fails fast with a
/// descriptive [`ConfigError`] when a required field is missing or a
/// value is out of range.
///
/// # Examples
///
/// ```
/// use pve_idle_monitor::MonitorConfig;
/// use std::time::Duration;
///
/// let config = MonitorConfig::builder()
///     .host("https://pve.local:8006")
///     .node("pve")
///     .vm_id("100")
///     .token("monitor@pve!idle", "5f1e-44aa")
///     .cpu_threshold(10.0)
///     .poll_interval(Duration::from_secs(60))
///     .threshold_count(3)
///     .webhook_url("https://hooks.example.com/shutdown")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.threshold_count().get(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    host: EndpointUrl,
    node: String,
    vm_id: String,
    token: ApiToken,
    cpu_threshold: CpuThreshold,
    poll_interval: Duration,
    threshold_count: NonZeroU32,
    webhook_url: EndpointUrl,
    timeouts: HttpTimeouts,
    accept_invalid_certs: bool,
    degraded_after: NonZeroU32,
    rate_limit: Option<RateLimitConfig>,
}

impl MonitorConfig {
    /// Creates a new builder for MonitorConfig
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::default()
    }

    pub fn host(&self) -> &EndpointUrl {
        &self.host
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    pub fn vm_id(&self) -> &str {
        &self.vm_id
    }

    pub fn token(&self) -> &ApiToken {
        &self.token
    }

    pub fn cpu_threshold(&self) -> CpuThreshold {
        self.cpu_threshold
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Number of consecutive low samples that confirm an idle episode.
    pub fn threshold_count(&self) -> NonZeroU32 {
        self.threshold_count
    }

    pub fn webhook_url(&self) -> &EndpointUrl {
        &self.webhook_url
    }

    pub fn timeouts(&self) -> HttpTimeouts {
        self.timeouts
    }

    /// Whether self-signed hypervisor certificates are accepted.
    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Consecutive failed polls after which health is reported as degraded.
    pub fn degraded_after(&self) -> NonZeroU32 {
        self.degraded_after
    }

    pub fn rate_limit(&self) -> Option<RateLimitConfig> {
        self.rate_limit
    }
}

/// Builder for MonitorConfig
#[derive(Debug)]
pub struct MonitorConfigBuilder {
    host: Option<String>,
    node: Option<String>,
    vm_id: Option<String>,
    token_id: Option<String>,
    secret: Option<String>,
    cpu_threshold: f64,
    poll_interval: Duration,
    threshold_count: u32,
    webhook_url: Option<String>,
    timeouts: HttpTimeouts,
    accept_invalid_certs: bool,
    degraded_after: u32,
    rate_limit: Option<(u32, u32)>,
}

impl Default for MonitorConfigBuilder {
    fn default() -> Self {
        Self {
            host: None,
            node: None,
            vm_id: None,
            token_id: None,
            secret: None,
            cpu_threshold: 10.0,
            poll_interval: Duration::from_secs(60),
            threshold_count: 3,
            webhook_url: None,
            timeouts: HttpTimeouts::default(),
            accept_invalid_certs: true,
            degraded_after: 3,
            rate_limit: None,
        }
    }
}

impl MonitorConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    pub fn vm_id(mut self, vm_id: impl Into<String>) -> Self {
        self.vm_id = Some(vm_id.into());
        self
    }

    pub fn token(mut self, token_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.token_id = Some(token_id.into());
        self.secret = Some(secret.into());
        self
    }

    pub fn cpu_threshold(mut self, percent: f64) -> Self {
        self.cpu_threshold = percent;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn threshold_count(mut self, count: u32) -> Self {
        self.threshold_count = count;
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connect = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.read = timeout;
        self
    }

    pub fn webhook_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.webhook = timeout;
        self
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn degraded_after(mut self, failures: u32) -> Self {
        self.degraded_after = failures;
        self
    }

    pub fn rate_limit(mut self, requests_per_second: u32, burst_size: u32) -> Self {
        self.rate_limit = Some((requests_per_second, burst_size));
        self
    }

    /// Validates every field and produces the immutable configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending field.
    pub fn build(self) -> Result<MonitorConfig, ConfigError> {
        let host = validate_endpoint_url("host", &required(self.host, "host")?)?;
        let node = required(self.node, "node")?.trim().to_string();
        if node
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%'))
        {
            return Err(ConfigError::field(
                "node",
                "Node name must not contain whitespace or URL delimiters",
            ));
        }
        let vm_id = required(self.vm_id, "vm_id")?;
        if !vm_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::field("vm_id", "VM id must be numeric"));
        }

        let token_id = required(self.token_id, "token_id")?;
        let secret = required(self.secret, "secret")?;
        validate_api_token(&token_id, &secret)?;

        let webhook_url =
            validate_endpoint_url("webhook_url", &required(self.webhook_url, "webhook_url")?)?;

        validate_cpu_threshold(self.cpu_threshold)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::field(
                "poll_interval",
                "Poll interval must be greater than zero",
            ));
        }
        let threshold_count = NonZeroU32::new(self.threshold_count).ok_or_else(|| {
            ConfigError::field("threshold_count", "Threshold count must be at least 1")
        })?;
        let degraded_after = NonZeroU32::new(self.degraded_after).ok_or_else(|| {
            ConfigError::field("degraded_after", "Degraded-after count must be at least 1")
        })?;

        let timeouts = self.timeouts;
        for (field, timeout) in [
            ("connect_timeout", timeouts.connect),
            ("read_timeout", timeouts.read),
            ("webhook_timeout", timeouts.webhook),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::field(field, "Timeout must be greater than zero"));
            }
        }
        // A notifying tick makes both calls back to back.
        if timeouts.connect + timeouts.read + timeouts.webhook >= self.poll_interval {
            return Err(ConfigError::ConstraintViolation(format!(
                "Tick timeout ({:?} connect + {:?} read + {:?} webhook) must be smaller than the poll interval ({:?})",
                timeouts.connect, timeouts.read, timeouts.webhook, self.poll_interval
            )));
        }

        let rate_limit = match self.rate_limit {
            None => None,
            Some((rps, burst)) => Some(RateLimitConfig {
                requests_per_second: NonZeroU32::new(rps).ok_or_else(|| {
                    ConfigError::field("rate_limit", "Requests per second must be at least 1")
                })?,
                burst_size: NonZeroU32::new(burst).ok_or_else(|| {
                    ConfigError::field("rate_limit", "Burst size must be at least 1")
                })?,
            }),
        };

        Ok(MonitorConfig {
            host,
            node,
            vm_id,
            token: ApiToken::new_unchecked(token_id, secret),
            cpu_threshold: CpuThreshold::new_unchecked(self.cpu_threshold),
            poll_interval: self.poll_interval,
            threshold_count,
            webhook_url,
            timeouts,
            accept_invalid_certs: self.accept_invalid_certs,
            degraded_after,
            rate_limit,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::field(field, format!("{} is required", field))),
    }
}
