//! Wire models for the QEMU status endpoints.

use crate::core::domain::model::sample::Sample;
use serde::Deserialize;
use std::time::SystemTime;

/// Proxmox wraps every payload in a `data` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub data: T,
}

/// Runtime status from `/nodes/{node}/qemu/{vmid}/status/current`.
///
/// Only the fields the monitor needs are decoded; all three are required
/// and a payload missing any of them is rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct VmStatusCurrent {
    /// Current VM status (e.g., "running", "stopped", "paused").
    pub status: String,
    /// CPU usage as a fraction (1.0 = one full core).
    pub cpu: f64,
    /// Uptime in seconds.
    pub uptime: f64,
}

impl VmStatusCurrent {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }

    pub fn into_sample(self, timestamp: SystemTime) -> Sample {
        Sample {
            timestamp,
            cpu_usage_percent: self.cpu * 100.0,
            vm_running: self.is_running(),
            uptime_seconds: self.uptime,
        }
    }
}
