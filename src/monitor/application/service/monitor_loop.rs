use crate::{
    core::{
        domain::{
            error::ApiError,
            model::{
                monitor_config::MonitorConfig,
                monitor_snapshot::{HealthState, LoopPhase, MonitorSnapshot},
                sample::{Sample, format_uptime},
            },
        },
        infrastructure::api_client::HypervisorApi,
    },
    monitor::application::service::{
        shutdown_notifier::ShutdownNotifier,
        threshold_tracker::{Decision, ThresholdPolicy, ThresholdTracker, TrackerState},
    },
};
use std::num::NonZeroU32;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The status poll failed; tracker state was left untouched.
    Skipped,
    /// The sample was evaluated without reaching the trigger.
    Evaluated(Decision),
    /// The idle episode was confirmed and the webhook accepted the call.
    ShutdownNotified,
    /// The idle episode was confirmed but the webhook call failed.
    ShutdownFailed,
}

/// Polls the hypervisor on a fixed cadence and fires the shutdown
/// notifier once per confirmed idle episode.
///
/// Ticks run strictly one after another: a slow poll delays the next
/// tick instead of overlapping it. Dependency failures are logged and
/// contained; the loop only ends through its cancellation token.
pub struct MonitorLoop<A, N> {
    api: A,
    notifier: N,
    tracker: ThresholdTracker,
    poll_interval: Duration,
    degraded_after: NonZeroU32,
    consecutive_failures: u32,
    snapshot: watch::Sender<MonitorSnapshot>,
}

impl<A, N> MonitorLoop<A, N>
where
    A: HypervisorApi,
    N: ShutdownNotifier,
{
    pub fn new(api: A, notifier: N, config: &MonitorConfig) -> Self {
        let policy = ThresholdPolicy::from_config(config);
        let (snapshot, _) = watch::channel(MonitorSnapshot::initial(policy.threshold_count.get()));
        Self {
            api,
            notifier,
            tracker: ThresholdTracker::new(policy),
            poll_interval: config.poll_interval(),
            degraded_after: config.degraded_after(),
            consecutive_failures: 0,
            snapshot,
        }
    }

    /// Subscribes to the snapshot published after every phase change.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn tracker_state(&self) -> TrackerState {
        self.tracker.state()
    }

    pub fn health(&self) -> HealthState {
        self.snapshot.borrow().health
    }

    /// Runs ticks until `cancellation_token` is cancelled.
    ///
    /// Cancellation is honoured between ticks, so an in-flight tick always
    /// completes. The HTTP clients are dropped when this returns.
    pub async fn run(mut self, cancellation_token: CancellationToken) {
        info!(
            poll_interval = ?self.poll_interval,
            threshold = %self.tracker.policy().threshold,
            threshold_count = self.tracker.policy().threshold_count.get(),
            "Monitor loop started"
        );

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => {
                    info!("Monitor loop cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }
            self.tick().await;
        }

        info!("Monitor loop stopped");
    }

    /// Performs one poll, evaluation and, if confirmed, notification.
    pub async fn tick(&mut self) -> TickOutcome {
        self.set_phase(LoopPhase::Polling);
        let sample = match self.api.check_status().await {
            Ok(sample) => sample,
            Err(e) => {
                self.record_failure(&e);
                self.set_phase(LoopPhase::Idle);
                return TickOutcome::Skipped;
            }
        };
        self.record_success();

        self.set_phase(LoopPhase::Evaluating);
        let decision = self.tracker.observe(&sample);
        self.log_decision(&sample, decision);
        self.publish_sample(&sample, decision);

        let outcome = if decision == Decision::TriggerShutdown {
            self.set_phase(LoopPhase::Notifying);
            self.fire_shutdown(&sample).await
        } else {
            TickOutcome::Evaluated(decision)
        };

        self.set_phase(LoopPhase::Idle);
        outcome
    }

    async fn fire_shutdown(&mut self, sample: &Sample) -> TickOutcome {
        info!(
            cpu = sample.cpu_usage_percent,
            count = self.tracker.state().consecutive_low_count,
            "Idle episode confirmed, sending shutdown webhook"
        );

        match self.notifier.notify().await {
            Ok(()) => {
                info!(
                    uptime = %format_uptime(sample.uptime_seconds),
                    "Shutdown webhook sent"
                );
                self.tracker.reset();
                let state = self.tracker.state();
                self.snapshot.send_modify(|s| {
                    s.last_action = "Shutdown webhook sent".to_string();
                    s.last_shutdown_time = Some(SystemTime::now());
                    s.low_cpu_count = state.consecutive_low_count;
                    s.triggered = state.triggered;
                });
                TickOutcome::ShutdownNotified
            }
            Err(e) => {
                error!(error = %e, "Shutdown webhook failed");
                self.snapshot.send_modify(|s| {
                    s.last_action = format!("Shutdown webhook failed: {}", e);
                });
                TickOutcome::ShutdownFailed
            }
        }
    }

    fn record_failure(&mut self, e: &ApiError) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let failures = self.consecutive_failures;
        error!(error = %e, consecutive_failures = failures, "VM status check failed, skipping sample");

        let degraded = failures >= self.degraded_after.get();
        if degraded && self.health() == HealthState::Healthy {
            warn!(
                consecutive_failures = failures,
                "Hypervisor API unreachable, monitor health degraded"
            );
        }

        self.snapshot.send_modify(|s| {
            s.consecutive_failures = failures;
            s.last_action = format!("Status check failed: {}", e);
            if degraded {
                s.health = HealthState::Degraded;
            }
        });
    }

    fn record_success(&mut self) {
        if self.health() == HealthState::Degraded {
            info!(
                failed_polls = self.consecutive_failures,
                "Hypervisor API reachable again, monitor health restored"
            );
        }
        self.consecutive_failures = 0;
        self.snapshot.send_modify(|s| {
            s.consecutive_failures = 0;
            s.health = HealthState::Healthy;
        });
    }

    fn log_decision(&self, sample: &Sample, decision: Decision) {
        let state = self.tracker.state();
        let target = self.tracker.policy().threshold_count.get();
        match decision {
            Decision::NoAction => debug!(
                cpu = sample.cpu_usage_percent,
                running = sample.vm_running,
                "No change"
            ),
            Decision::CounterIncremented => debug!(
                cpu = sample.cpu_usage_percent,
                "Low CPU count {}/{}",
                state.consecutive_low_count,
                target
            ),
            Decision::CounterReset => info!(
                cpu = sample.cpu_usage_percent,
                running = sample.vm_running,
                "Idle streak reset"
            ),
            Decision::TriggerShutdown => {}
        }
    }

    fn publish_sample(&self, sample: &Sample, decision: Decision) {
        let state = self.tracker.state();
        let target = self.tracker.policy().threshold_count.get();
        self.snapshot.send_modify(|s| {
            s.last_check_time = Some(sample.timestamp);
            s.vm_running = Some(sample.vm_running);
            s.cpu_usage_percent = Some(sample.cpu_usage_percent);
            s.uptime_seconds = Some(sample.uptime_seconds);
            s.low_cpu_count = state.consecutive_low_count;
            s.triggered = state.triggered;
            match decision {
                Decision::CounterIncremented => {
                    s.last_action = format!("Low CPU count {}/{}", state.consecutive_low_count, target);
                }
                Decision::CounterReset => s.last_action = "Idle streak reset".to_string(),
                Decision::TriggerShutdown => s.last_action = "Sending shutdown webhook".to_string(),
                Decision::NoAction => {}
            }
        });
    }

    fn set_phase(&self, phase: LoopPhase) {
        self.snapshot.send_modify(|s| s.phase = phase);
    }
}
