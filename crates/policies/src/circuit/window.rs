//! Fixed-capacity window of recent call outcomes.

use std::collections::VecDeque;

/// Ring of the most recent outcomes, `true` for success.
///
/// Holds at most `capacity` entries; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    outcomes: VecDeque<bool>,
    capacity: usize,
}

impl SlidingWindow {
    /// Create an empty window. `capacity` must be non-zero.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0, "sliding window capacity must be non-zero");
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record an outcome, evicting the oldest one when full
    pub fn add(&mut self, success: bool) {
        if self.outcomes.len() >= self.capacity {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(success);
    }

    /// Number of failures currently held
    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|success| !**success).count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
