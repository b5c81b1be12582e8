//! State transition logic for circuit breaker.
//!
//! Everything here is a pure function of the stored state and the time it is
//! handed; nothing reads the clock on its own.

use super::state::CircuitState;
use resiliens_core::CircuitStatus;
use std::time::Duration;
use tokio::time::Instant;

/// Stored-status change caused by recording an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Opened,
    /// Open again after a failure while already open, restarting the reset timeout
    Reopened,
    Closed,
    Unchanged,
}

impl<E> CircuitState<E> {
    /// Status as seen from outside: a stored `Open` reads as `HalfOpen` once
    /// `reset_timeout` has elapsed since it opened
    pub fn observed_status(&self, reset_timeout: Duration, now: Instant) -> CircuitStatus {
        match self.status {
            CircuitStatus::Open if now >= self.opened_at + reset_timeout => CircuitStatus::HalfOpen,
            status => status,
        }
    }

    /// Whole seconds until the circuit reads as half-open.
    ///
    /// Positive remainders round up, negative ones round down, so any value
    /// above zero means "still open".
    pub fn open_seconds_remaining(&self, reset_timeout: Duration, now: Instant) -> i64 {
        let deadline = self.opened_at + reset_timeout;
        if deadline > now {
            (deadline - now).as_secs_f64().ceil() as i64
        } else {
            -((now - deadline).as_secs_f64().ceil() as i64)
        }
    }

    /// Record a successful call
    pub fn record_success(&mut self) -> Transition {
        let was_open = self.status == CircuitStatus::Open;

        self.status = CircuitStatus::Closed;
        self.last_failure = None;
        self.consecutive_failures = 0;
        if let Some(window) = self.window.as_mut() {
            window.add(true);
        }

        if was_open {
            Transition::Closed
        } else {
            Transition::Unchanged
        }
    }

    /// Record a classified failure.
    ///
    /// A closed circuit opens once `threshold` is reached. A failure recorded
    /// while the circuit is open (a failed trial call) opens it again with a
    /// fresh reset timeout, whatever the tally.
    pub fn record_failure(&mut self, failure: E, threshold: usize, now: Instant) -> Transition {
        self.last_failure = Some(failure);
        self.consecutive_failures += 1;
        if let Some(window) = self.window.as_mut() {
            window.add(false);
        }

        if self.status == CircuitStatus::Open {
            self.open(now);
            return Transition::Reopened;
        }
        if self.threshold_tally() >= threshold {
            self.open(now);
            return Transition::Opened;
        }
        Transition::Unchanged
    }

    /// Open the circuit regardless of the failure tally
    pub fn force_open(&mut self, now: Instant) -> Transition {
        let was_open = self.status == CircuitStatus::Open;
        self.open(now);
        if was_open {
            Transition::Unchanged
        } else {
            Transition::Opened
        }
    }

    fn open(&mut self, now: Instant) {
        self.status = CircuitStatus::Open;
        self.opened_at = now;
    }
}
