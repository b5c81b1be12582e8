//! Fallback substitution.
//!
//! [`FallbackPolicy`] runs an operation and, when it fails with a classified
//! failure, returns the result of a substitute instead. The substitute types
//! here are shared with the circuit breaker and retry policies.

pub mod policy;
pub mod substitute;

pub use policy::{FallbackPolicy, FallbackPolicyBuilder, WithFallback};
pub use substitute::{FailureAwareFn, PlainFn, Substitute};
