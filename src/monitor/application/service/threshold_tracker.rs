//! Hysteresis over consecutive low-CPU samples.
//!
//! [`TrackerState::evaluate`] is a pure transition function. The stateful
//! [`ThresholdTracker`] wraps it and adds restart detection from the
//! reported uptime.

use crate::core::domain::{
    model::{monitor_config::MonitorConfig, sample::Sample},
    value_object::CpuThreshold,
};
use std::num::NonZeroU32;
use tracing::info;

/// Outcome of feeding one sample to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoAction,
    CounterIncremented,
    CounterReset,
    /// The idle episode is confirmed; fire the shutdown action.
    TriggerShutdown,
}

/// Threshold and required streak length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub threshold: CpuThreshold,
    pub threshold_count: NonZeroU32,
}

impl ThresholdPolicy {
    pub fn new(threshold: CpuThreshold, threshold_count: NonZeroU32) -> Self {
        Self {
            threshold,
            threshold_count,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.cpu_threshold(), config.threshold_count())
    }
}

/// Counter and episode flag.
///
/// `triggered` becomes true only once `consecutive_low_count` has reached
/// the threshold count since the last reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackerState {
    pub consecutive_low_count: u32,
    pub triggered: bool,
}

impl TrackerState {
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.consecutive_low_count == 0 && !self.triggered
    }

    /// Computes the next state and decision for `sample`.
    #[must_use]
    pub fn evaluate(self, sample: &Sample, policy: &ThresholdPolicy) -> (TrackerState, Decision) {
        let rest = TrackerState::default();

        if !sample.vm_running {
            let decision = if self.is_at_rest() {
                Decision::NoAction
            } else {
                Decision::CounterReset
            };
            return (rest, decision);
        }

        if policy.threshold.is_low(sample.cpu_usage_percent) {
            let count = self.consecutive_low_count.saturating_add(1);
            let target = policy.threshold_count.get();
            let next = TrackerState {
                consecutive_low_count: count,
                triggered: self.triggered,
            };

            if count == target && !self.triggered {
                (
                    TrackerState {
                        triggered: true,
                        ..next
                    },
                    Decision::TriggerShutdown,
                )
            } else if count > target || self.triggered {
                (next, Decision::NoAction)
            } else {
                (next, Decision::CounterIncremented)
            }
        } else if self.is_at_rest() {
            (self, Decision::NoAction)
        } else {
            (rest, Decision::CounterReset)
        }
    }
}

/// Stateful tracker fed once per successful poll.
#[derive(Debug, Clone)]
pub struct ThresholdTracker {
    policy: ThresholdPolicy,
    state: TrackerState,
    last_uptime_seconds: Option<f64>,
}

impl ThresholdTracker {
    pub fn new(policy: ThresholdPolicy) -> Self {
        Self {
            policy,
            state: TrackerState::default(),
            last_uptime_seconds: None,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Feeds one sample and returns the decision.
    ///
    /// A running VM whose uptime went backwards was restarted since the
    /// previous sample; the streak is cleared before the sample is counted.
    pub fn observe(&mut self, sample: &Sample) -> Decision {
        let mut restarted = false;
        if sample.vm_running {
            if let Some(previous) = self.last_uptime_seconds {
                if sample.uptime_seconds < previous {
                    info!(
                        previous_uptime = previous,
                        uptime = sample.uptime_seconds,
                        "VM restart detected, clearing idle streak"
                    );
                    restarted = !self.state.is_at_rest();
                    self.state = TrackerState::default();
                }
            }
        }

        let (next, decision) = self.state.evaluate(sample, &self.policy);
        self.state = next;
        self.last_uptime_seconds = sample.vm_running.then_some(sample.uptime_seconds);

        if restarted && decision == Decision::NoAction {
            Decision::CounterReset
        } else {
            decision
        }
    }

    /// Returns to the initial state, re-arming the trigger.
    pub fn reset(&mut self) {
        self.state = TrackerState::default();
    }
}
