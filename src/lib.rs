mod core;
mod monitor;

pub use crate::core::domain::error::{
    ApiError, ConfigError, MonitorError, MonitorResult, NotifyError,
};
pub use crate::core::domain::model::{
    monitor_config::{HttpTimeouts, MonitorConfig, MonitorConfigBuilder, RateLimitConfig},
    monitor_snapshot::{HealthState, LoopPhase, MonitorSnapshot},
    sample::{Sample, format_uptime},
};
pub use crate::core::domain::value_object::{ApiToken, CpuThreshold, EndpointUrl};
pub use crate::core::infrastructure::{
    api_client::{HypervisorApi, HypervisorClient},
    config_loader::{
        CpuSection, CredentialsSection, DEFAULT_CONFIG_PATH, FileConfig, HttpSection,
        MonitorSection, ProxmoxSection, RateLimitSection,
    },
    logging::{init_tracing, level_directive},
};
pub use crate::monitor::application::service::{
    monitor_loop::{MonitorLoop, TickOutcome},
    shutdown_notifier::{ShutdownNotifier, WebhookNotifier},
    threshold_tracker::{Decision, ThresholdPolicy, ThresholdTracker, TrackerState},
};

/// Builds the production monitor loop for a validated configuration.
///
/// The loop polls the VM status with token authentication and posts to the
/// shutdown webhook once per confirmed idle episode.
///
/// # Examples
///
/// ```no_run
/// use pve_idle_monitor::{MonitorConfig, MonitorResult};
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() -> MonitorResult<()> {
///     let config = MonitorConfig::builder()
///         .host("https://pve.example.com:8006")
///         .node("pve")
///         .vm_id("100")
///         .token("monitor@pve!idle", "5f1e-44aa")
///         .cpu_threshold(10.0)
///         .poll_interval(Duration::from_secs(60))
///         .threshold_count(3)
///         .webhook_url("https://hooks.example.com/shutdown")
///         .build()?;
///
///     let monitor = pve_idle_monitor::build_monitor(&config)?;
///     let snapshots = monitor.subscribe();
///     let token = CancellationToken::new();
///
///     monitor.run(token.clone()).await;
///     println!("last action: {}", snapshots.borrow().last_action);
///     Ok(())
/// }
/// ```
///
/// # Errors
///
/// Returns an error if either HTTP client cannot be constructed.
pub fn build_monitor(
    config: &MonitorConfig,
) -> MonitorResult<MonitorLoop<HypervisorClient, WebhookNotifier>> {
    let api = HypervisorClient::new(config)?;
    let notifier = WebhookNotifier::new(config)?;
    Ok(MonitorLoop::new(api, notifier, config))
}
