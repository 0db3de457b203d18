pub mod monitor_loop;
pub mod shutdown_notifier;
pub mod threshold_tracker;
