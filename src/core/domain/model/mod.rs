pub mod monitor_config;
pub mod monitor_snapshot;
pub mod sample;
pub(crate) mod vm_status;
