//! Shared domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally observed state of a circuit breaker.
///
/// `HalfOpen` is never stored. It is derived from a stored `Open` once the
/// reset timeout has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitStatus {
    /// Calls pass through to the operation
    Closed,
    /// Calls are refused or routed to the fallback
    Open,
    /// Reset timeout elapsed since the circuit opened
    HalfOpen,
}

impl CircuitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitStatus::Closed => "CLOSED",
            CircuitStatus::Open => "OPEN",
            CircuitStatus::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
