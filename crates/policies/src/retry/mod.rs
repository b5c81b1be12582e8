//! Retry policy with constant or exponential backoff.
//!
//! A call is attempted up to `max_attempts` times. Only failures accepted by
//! the policy's classifier are retried; anything else is returned at once.
//!
//! ```no_run
//! use resiliens::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let retry = RetryPolicy::<std::io::Error>::builder()
//!     .max_attempts(5)
//!     .backoff_base(Duration::from_millis(100))
//!     .backoff_multiplier(2.0)
//!     .build()?;
//!
//! let _hostname = retry
//!     .call(|| async { std::fs::read_to_string("/etc/hostname") })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod backoff;
mod config;
mod policy;

pub use backoff::{delay, Backoff};
pub use config::RetryConfig;
pub use policy::{RetryPolicy, RetryPolicyBuilder, Retrying};
