//! Configuration for circuit breaker behavior.

use resiliens_core::{ConfigError, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RESET_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What a circuit does with calls once its reset timeout has elapsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HalfOpenPolicy {
    /// Keep refusing calls until a success is recorded some other way
    /// (for example `force_reset`)
    #[default]
    Reject,
    /// Let a single trial call through at a time
    Probe,
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Registry name; derived from the first wrapped operation when unset
    pub name: Option<String>,
    /// Failures needed to open the circuit. Consecutive failures without a
    /// sliding window, failures inside the window otherwise
    pub failure_threshold: u32,
    /// Time the circuit stays open before it reads as half-open
    #[serde(rename = "reset_timeout_ms", with = "resiliens_core::serde_ms")]
    pub reset_timeout: Duration,
    /// Capacity of the outcome window used for rate-based thresholding
    pub sliding_window_size: Option<usize>,
    /// Behaviour once the reset timeout has elapsed
    pub half_open: HalfOpenPolicy,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            name: None,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
            sliding_window_size: None,
            half_open: HalfOpenPolicy::default(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Reject settings the breaker cannot operate with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::ZeroFailureThreshold);
        }
        if self.sliding_window_size == Some(0) {
            return Err(ConfigError::ZeroWindowSize);
        }
        Ok(())
    }
}
