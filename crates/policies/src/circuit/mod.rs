//! Circuit breaking for flaky or overloaded operations.
//!
//! This module is organized into focused sub-modules:
//!
//! - [`window`] - Fixed-capacity window of recent outcomes
//! - [`state`] - The mutable record owned by one breaker
//! - [`transitions`] - Outcome recording and the derived half-open status
//! - [`config`] - Serializable breaker configuration
//! - [`breaker`] - The breaker itself: admission, observation, introspection
//! - [`guarded`] - Wrapped operations with fallback dispatch
//! - [`stream`] - Streams whose whole iteration is observed
//! - [`registry`] - Named lookup with bulk force operations
//!
//! ## States
//!
//! ```text
//! Closed → Open:      failure threshold reached (consecutive, or within the window)
//! Open → Half-Open:   reset timeout elapsed (derived on read, never stored)
//! Half-Open → Closed: a success is recorded
//! Half-Open → Open:   a classified failure is recorded
//! ```
//!
//! With the default [`HalfOpenPolicy::Reject`] a half-open circuit keeps
//! routing calls to the fallback and only closes once a success is recorded,
//! for example through `force_reset`.
//! [`HalfOpenPolicy::Probe`] lets one trial call through at a time.
//!
//! ## Example
//!
//! ```rust,no_run
//! use resiliens::circuit::{CircuitBreaker, CircuitBreakerRegistry};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! #[derive(Debug, Clone)]
//! struct Unavailable;
//!
//! let registry = CircuitBreakerRegistry::shared();
//! let breaker = CircuitBreaker::<Unavailable>::builder()
//!     .name("inventory")
//!     .failure_threshold(3)
//!     .reset_timeout(Duration::from_secs(10))
//!     .registry(&registry)
//!     .build()?;
//!
//! let lookup = breaker
//!     .wrap(|sku: u32| async move { if sku > 0 { Ok(sku * 2) } else { Err(Unavailable) } })
//!     .with_fallback(|_sku: u32| async { Ok(0) });
//!
//! let stock = lookup.call(21).await;
//! assert!(matches!(stock, Ok(42)));
//! # Ok(())
//! # }
//! ```

pub mod breaker;
pub mod config;
pub mod guarded;
pub mod registry;
pub mod state;
pub mod stream;
#[cfg(test)]
pub mod tests;
pub mod transitions;
pub mod types;
pub mod window;

pub use breaker::{CircuitBreaker, CircuitBreakerBuilder};
pub use config::{CircuitBreakerConfig, HalfOpenPolicy};
pub use guarded::Guarded;
pub use registry::{CircuitBreakerRegistry, ManagedCircuit};
pub use state::CircuitState;
pub use stream::ObservedStream;
pub use transitions::Transition;
pub use types::CircuitSnapshot;
pub use window::SlidingWindow;
