//! YAML configuration file loading.
//!
//! The file layout follows the deployment's `/config/config.yaml`; sections
//! that belong to other services (smb, nfs, mount, timezone) are ignored.

use crate::core::domain::{
    error::ConfigError, model::monitor_config::MonitorConfig,
    value_object::serde_helpers::string_or_number,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default location inside the container image.
pub const DEFAULT_CONFIG_PATH: &str = "/config/config.yaml";

/// Raw contents of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub credentials: CredentialsSection,
    pub proxmox: ProxmoxSection,
    pub http: HttpSection,
    pub monitor: MonitorSection,
    pub log_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    pub proxmox_host: String,
    pub token_id: String,
    pub secret: String,
    pub shutdown_webhook_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProxmoxSection {
    pub node_name: String,
    #[serde(deserialize_with = "string_or_number::deserialize")]
    pub vm_id: String,
    pub cpu: CpuSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CpuSection {
    /// Percent
    pub threshold: f64,
    /// Seconds
    pub check_interval: u64,
    pub threshold_count: u32,
}

impl Default for CpuSection {
    fn default() -> Self {
        Self {
            threshold: 10.0,
            check_interval: 60,
            threshold_count: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// Seconds
    pub connect_timeout: u64,
    /// Seconds
    pub read_timeout: u64,
    /// Seconds
    pub webhook_timeout: u64,
    pub accept_invalid_certs: bool,
    pub rate_limit: Option<RateLimitSection>,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            connect_timeout: 5,
            read_timeout: 10,
            webhook_timeout: 5,
            accept_invalid_certs: true,
            rate_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateLimitSection {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MonitorSection {
    pub degraded_after: u32,
}

impl Default for MonitorSection {
    fn default() -> Self {
        Self { degraded_after: 3 }
    }
}

impl FileConfig {
    /// Reads and parses the YAML file at `path`.
    ///
    /// # Errors
    /// `ConfigError::Load` if the file cannot be read, `ConfigError::Parse`
    /// if it is not valid YAML for this layout.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Load {
                    path: display.clone(),
                    source,
                })?;
        Self::parse(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: display,
                message,
            },
            other => other,
        })
    }

    /// Parses YAML text. An empty document yields all defaults.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates the file contents into a [`MonitorConfig`].
    pub fn into_monitor_config(self) -> Result<MonitorConfig, ConfigError> {
        let mut builder = MonitorConfig::builder()
            .host(self.credentials.proxmox_host)
            .node(self.proxmox.node_name)
            .vm_id(self.proxmox.vm_id)
            .token(self.credentials.token_id, self.credentials.secret)
            .webhook_url(self.credentials.shutdown_webhook_url)
            .cpu_threshold(self.proxmox.cpu.threshold)
            .poll_interval(Duration::from_secs(self.proxmox.cpu.check_interval))
            .threshold_count(self.proxmox.cpu.threshold_count)
            .connect_timeout(Duration::from_secs(self.http.connect_timeout))
            .read_timeout(Duration::from_secs(self.http.read_timeout))
            .webhook_timeout(Duration::from_secs(self.http.webhook_timeout))
            .accept_invalid_certs(self.http.accept_invalid_certs)
            .degraded_after(self.monitor.degraded_after);

        if let Some(rl) = self.http.rate_limit {
            builder = builder.rate_limit(rl.requests_per_second, rl.burst_size);
        }

        builder.build()
    }
}
