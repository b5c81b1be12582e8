//! Mutable record owned by a single circuit breaker.

use super::window::SlidingWindow;
use resiliens_core::CircuitStatus;
use tokio::time::Instant;

/// Stored state of a circuit breaker.
///
/// Only `Closed` and `Open` are ever stored; `HalfOpen` is derived on read by
/// [`CircuitState::observed_status`].
#[derive(Debug)]
pub struct CircuitState<E> {
    pub(super) status: CircuitStatus,
    pub(super) consecutive_failures: usize,
    pub(super) window: Option<SlidingWindow>,
    pub(super) last_failure: Option<E>,
    pub(super) opened_at: Instant,
}

impl<E> CircuitState<E> {
    /// Closed state, optionally counting failures over a window of `window_size` outcomes
    pub fn new(window_size: Option<usize>, now: Instant) -> Self {
        Self {
            status: CircuitStatus::Closed,
            consecutive_failures: 0,
            window: window_size.map(SlidingWindow::new),
            last_failure: None,
            opened_at: now,
        }
    }

    /// Status as stored, without the half-open derivation
    pub fn stored_status(&self) -> CircuitStatus {
        self.status
    }

    /// Classified failures since the last success
    pub fn failure_count(&self) -> usize {
        self.consecutive_failures
    }

    /// Failures held in the sliding window, if one is configured
    pub fn window_failure_count(&self) -> Option<usize> {
        self.window.as_ref().map(SlidingWindow::failure_count)
    }

    /// Failures compared against the threshold: the window's tally when a
    /// window is configured, consecutive failures otherwise
    pub fn threshold_tally(&self) -> usize {
        self.window_failure_count().unwrap_or(self.consecutive_failures)
    }

    pub fn last_failure(&self) -> Option<&E> {
        self.last_failure.as_ref()
    }
}
