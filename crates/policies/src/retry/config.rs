//! Configuration for retry behavior.

use resiliens_core::{ConfigError, DEFAULT_BACKOFF_BASE, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total calls made, the first one included
    pub max_attempts: u32,
    /// Delay before the first retry, and every retry when no multiplier is set
    #[serde(rename = "backoff_base_ms", with = "resiliens_core::serde_ms")]
    pub backoff_base: Duration,
    /// Exponent applied to the number of failures so far
    pub backoff_multiplier: Option<f64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_multiplier: None,
        }
    }
}

impl RetryConfig {
    /// Constant delay between attempts
    pub fn constant(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts,
            backoff_base,
            backoff_multiplier: None,
        }
    }

    /// Delay growing as `backoff_base × failures^multiplier`
    pub fn exponential(max_attempts: u32, backoff_base: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts,
            backoff_base,
            backoff_multiplier: Some(multiplier),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ZeroMaxAttempts);
        }
        match self.backoff_multiplier {
            Some(multiplier) if !multiplier.is_finite() || multiplier <= 0.0 => {
                Err(ConfigError::InvalidBackoffMultiplier(multiplier))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff_base, Duration::from_secs(1));
        assert_eq!(config.backoff_multiplier, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            RetryConfig::constant(0, Duration::ZERO).validate(),
            Err(ConfigError::ZeroMaxAttempts)
        );
        assert_eq!(
            RetryConfig::exponential(3, Duration::ZERO, -1.0).validate(),
            Err(ConfigError::InvalidBackoffMultiplier(-1.0))
        );
        assert!(RetryConfig::exponential(3, Duration::ZERO, f64::NAN)
            .validate()
            .is_err());
        assert!(RetryConfig::exponential(3, Duration::ZERO, 0.5).validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: RetryConfig =
            serde_json::from_str(r#"{"max_attempts": 5, "backoff_multiplier": 2.0}"#).unwrap();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_base, DEFAULT_BACKOFF_BASE);
        assert_eq!(config.backoff_multiplier, Some(2.0));

        let json = serde_json::to_value(RetryConfig::constant(2, Duration::from_millis(250))).unwrap();
        assert_eq!(json["backoff_base_ms"], 250);
    }
}
