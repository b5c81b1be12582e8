//! Core error type definitions

use chrono::{DateTime, Utc};

/// Result type alias for calls routed through a policy
pub type Result<T, E> = std::result::Result<T, Error<E>>;

/// Outcome of a protected call that did not produce a value.
///
/// `E` is the wrapped operation's own error type. Failures the policy does not
/// recognise are handed back untouched in [`Error::Inner`].
#[derive(Debug)]
pub enum Error<E> {
    /// The operation's own failure, passed through unchanged
    Inner(E),

    /// The circuit refused the call and no fallback was configured
    CircuitOpen(CircuitOpenError<E>),

    /// Every attempt failed with a classified failure and no fallback was configured
    RetryExhausted { attempts: u32, source: E },
}

/// Diagnostics captured when an open circuit refuses a call
#[derive(Debug, Clone)]
pub struct CircuitOpenError<E> {
    pub name: String,
    pub failure_count: usize,
    pub open_until: DateTime<Utc>,
    pub seconds_remaining: i64,
    pub last_failure: Option<E>,
}

/// Invalid policy configuration, reported when the policy is built
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("failure threshold must be greater than zero")]
    ZeroFailureThreshold,

    #[error("sliding window size must be greater than zero")]
    ZeroWindowSize,

    #[error("max attempts must be greater than zero")]
    ZeroMaxAttempts,

    #[error("backoff multiplier must be a finite number greater than zero (got {0})")]
    InvalidBackoffMultiplier(f64),

    #[error("a fallback policy requires either a plain or a failure-aware fallback and neither was given")]
    MissingFallback,

    #[error("a fallback policy accepts exactly one fallback but both a plain and a failure-aware fallback were given")]
    ConflictingFallbacks,
}

/// A registry operation named a circuit breaker that was never registered
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no circuit breaker registered under '{name}'")]
pub struct UnknownCircuit {
    pub name: String,
}
