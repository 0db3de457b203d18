//! Externally observable view of the monitor loop.

use std::time::SystemTime;

/// Phase of the monitor loop within one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopPhase {
    /// Waiting for the next tick.
    #[default]
    Idle,
    /// Awaiting the hypervisor status response.
    Polling,
    /// Feeding the sample to the threshold tracker.
    Evaluating,
    /// Calling the shutdown webhook.
    Notifying,
}

/// Health of the hypervisor status polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HealthState {
    #[default]
    Healthy,
    /// Consecutive failed polls reached the configured bound.
    Degraded,
}

/// Latest state published by the monitor loop after each phase change.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorSnapshot {
    pub phase: LoopPhase,
    pub health: HealthState,
    pub last_check_time: Option<SystemTime>,
    pub vm_running: Option<bool>,
    pub cpu_usage_percent: Option<f64>,
    pub uptime_seconds: Option<f64>,
    pub low_cpu_count: u32,
    pub threshold_count: u32,
    pub triggered: bool,
    pub consecutive_failures: u32,
    pub last_action: String,
    pub last_shutdown_time: Option<SystemTime>,
}

impl MonitorSnapshot {
    pub(crate) fn initial(threshold_count: u32) -> Self {
        Self {
            phase: LoopPhase::Idle,
            health: HealthState::Healthy,
            last_check_time: None,
            vm_running: None,
            cpu_usage_percent: None,
            uptime_seconds: None,
            low_cpu_count: 0,
            threshold_count,
            triggered: false,
            consecutive_failures: 0,
            last_action: "Monitor started".to_string(),
            last_shutdown_time: None,
        }
    }
}
