//! Core types, errors, and defaults shared by the `resiliens` policies.
//!
//! ## Key Components
//!
//! - **`errors`**: the [`Error`] returned by protected calls, the diagnostics
//!   of a refused call ([`CircuitOpenError`]) and construction-time
//!   [`ConfigError`]s.
//! - **`classify`**: the [`Classifier`] deciding which failures a policy reacts to.
//! - **`types`**: the externally observed [`CircuitStatus`].
//! - **`constants`**: default thresholds, timeouts and backoff settings.

pub mod classify;
pub mod constants;
pub mod errors;
pub mod serde_ms;
pub mod types;

pub use self::{
    classify::{AsDynError, Classifier},
    constants::*,
    errors::{CircuitOpenError, ConfigError, Error, Result, UnknownCircuit},
    types::CircuitStatus,
};
