//! Read-only views of circuit breaker state.

use chrono::{DateTime, Utc};
use resiliens_core::CircuitStatus;
use serde::Serialize;

/// Point-in-time statistics about a circuit breaker, all read at the same instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSnapshot {
    pub name: String,
    pub status: CircuitStatus,
    pub failure_threshold: u32,
    pub failure_count: usize,
    /// Debug rendering of the most recent classified failure
    pub last_failure: Option<String>,
    pub open_until: DateTime<Utc>,
    pub open_seconds_remaining: i64,
}
