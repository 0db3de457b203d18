//! A single observation of the monitored VM.

use crate::core::domain::value_object::serde_helpers::system_time;
use serde::Serialize;
use std::time::SystemTime;

/// One status poll of the monitored VM.
///
/// Produced by the hypervisor client each tick and consumed by the
/// threshold tracker in the same tick; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// When the status was received.
    #[serde(serialize_with = "system_time::serialize")]
    pub timestamp: SystemTime,
    /// CPU usage in percent. May exceed 100 on multi-vCPU guests.
    pub cpu_usage_percent: f64,
    /// Whether the hypervisor reports the VM as `running`.
    pub vm_running: bool,
    /// Seconds since the VM was started (0 when stopped).
    pub uptime_seconds: f64,
}

impl Sample {
    pub fn new(cpu_usage_percent: f64, vm_running: bool, uptime_seconds: f64) -> Self {
        Self {
            timestamp: SystemTime::now(),
            cpu_usage_percent,
            vm_running,
            uptime_seconds,
        }
    }

    /// A sample of a running VM.
    pub fn running(cpu_usage_percent: f64, uptime_seconds: f64) -> Self {
        Self::new(cpu_usage_percent, true, uptime_seconds)
    }

    /// A sample of a stopped VM.
    pub fn stopped() -> Self {
        Self::new(0.0, false, 0.0)
    }
}

/// Formats an uptime in seconds as `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_uptime(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}
