use crate::core::domain::error::ConfigError;
use std::fmt;

/// CPU usage percentage below which a sample counts as idle.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct CpuThreshold(f64);

impl CpuThreshold {
    /// Creates a new threshold without validation.
    pub(crate) fn new_unchecked(percent: f64) -> Self {
        Self(percent)
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.0
    }

    /// Returns true if `cpu_usage_percent` is strictly below the threshold.
    ///
    /// Usage exactly equal to the threshold is not idle.
    #[must_use]
    pub fn is_low(&self, cpu_usage_percent: f64) -> bool {
        cpu_usage_percent < self.0
    }
}

impl fmt::Display for CpuThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

/// Validates that a threshold is a finite percentage in `[0, 100]`.
pub(crate) fn validate_cpu_threshold(percent: f64) -> Result<(), ConfigError> {
    if !percent.is_finite() {
        return Err(ConfigError::field(
            "cpu_threshold",
            "Threshold must be a finite number",
        ));
    }
    if !(0.0..=100.0).contains(&percent) {
        return Err(ConfigError::field(
            "cpu_threshold",
            format!("Threshold must be between 0 and 100, got {}", percent),
        ));
    }
    Ok(())
}
