//! Resilience policies for async Rust: circuit breakers, retries and fallbacks.
//!
//! Every policy wraps an async operation and hands back something with the
//! same calling shape, so policies compose by wrapping each other.
//!
//! ## Key Components
//!
//! - **`circuit`**: the circuit breaker, its process-wide registry, and
//!   breaker-protected streams.
//! - **`retry`**: re-run an operation after classified failures with
//!   constant or exponential backoff.
//! - **`fallback`**: substitute a value when an operation fails.
//!
//! Errors, classifiers and defaults live in `resiliens-core` and are
//! re-exported here.

pub mod circuit;
pub mod fallback;
pub mod retry;

pub use circuit::{
    CircuitBreaker, CircuitBreakerBuilder, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitSnapshot, Guarded,
    HalfOpenPolicy, ManagedCircuit, ObservedStream,
};
pub use fallback::{FallbackPolicy, FallbackPolicyBuilder, WithFallback};
pub use resiliens_core::{
    AsDynError, CircuitOpenError, CircuitStatus, Classifier, ConfigError, Error, Result, UnknownCircuit,
};
pub use retry::{RetryConfig, RetryPolicy, RetryPolicyBuilder, Retrying};
