//! Error types shared by every resilience policy

mod builders;
mod display;
mod types;

pub use types::{CircuitOpenError, ConfigError, Error, Result, UnknownCircuit};
