//! Delays inserted between retry attempts.

use super::config::RetryConfig;
use std::time::Duration;

/// Delay before the retry that follows the `failures`-th failure.
///
/// Without a multiplier every delay is `base`; with one it is
/// `base × max(failures^multiplier, 1)`. Saturates at [`Duration::MAX`].
pub fn delay(base: Duration, multiplier: Option<f64>, failures: u32) -> Duration {
    let Some(multiplier) = multiplier else {
        return base;
    };
    let factor = f64::from(failures).powf(multiplier).max(1.0);
    let nanos = (base.as_nanos() as f64 * factor).round();
    if nanos >= u64::MAX as f64 {
        return Duration::MAX;
    }
    Duration::from_nanos(nanos as u64).max(base)
}

/// Per-call backoff schedule: yields one delay for each retry still allowed.
///
/// A fresh schedule is created for every call, so nothing carries over between
/// unrelated invocations of the same policy.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    multiplier: Option<f64>,
    failures: u32,
    retries_left: u32,
}

impl Backoff {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            base: config.backoff_base,
            multiplier: config.backoff_multiplier,
            failures: 0,
            retries_left: config.max_attempts.saturating_sub(1),
        }
    }

    /// Failures recorded so far
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.retries_left == 0 {
            return None;
        }
        self.retries_left -= 1;
        self.failures += 1;
        Some(delay(self.base, self.multiplier, self.failures))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.retries_left as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Backoff {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BASE: Duration = Duration::from_millis(100);

    #[test]
    fn test_constant_backoff() {
        let schedule: Vec<_> = Backoff::new(&RetryConfig::constant(4, BASE)).collect();
        assert_eq!(schedule, vec![BASE; 3]);
    }

    #[test]
    fn test_exponential_backoff() {
        let schedule: Vec<_> = Backoff::new(&RetryConfig::exponential(4, BASE, 2.0)).collect();
        assert_eq!(
            schedule,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(400),
                Duration::from_millis(900)
            ]
        );
    }

    #[test]
    fn test_single_attempt_never_sleeps() {
        let mut backoff = Backoff::new(&RetryConfig::constant(1, BASE));
        assert_eq!(backoff.len(), 0);
        assert_eq!(backoff.next(), None);
        assert_eq!(backoff.failures(), 0);
    }

    #[test]
    fn test_fractional_multiplier_never_shrinks_below_base() {
        assert_eq!(delay(BASE, Some(0.5), 0), BASE);
        assert_eq!(delay(BASE, Some(0.5), 4), Duration::from_millis(200));
    }

    #[test]
    fn test_huge_delay_saturates() {
        assert_eq!(delay(Duration::from_secs(u64::MAX / 2), Some(10.0), 1_000), Duration::MAX);
    }

    proptest! {
        #[test]
        fn test_exponential_schedule_is_non_decreasing(
            attempts in 1u32..30,
            base_ms in 0u64..10_000,
            multiplier in 0.1f64..4.0
        ) {
            let config = RetryConfig::exponential(attempts, Duration::from_millis(base_ms), multiplier);
            let schedule: Vec<_> = Backoff::new(&config).collect();

            prop_assert_eq!(schedule.len(), attempts as usize - 1);
            for pair in schedule.windows(2) {
                prop_assert!(pair[0] <= pair[1]);
            }
            for step in &schedule {
                prop_assert!(*step >= config.backoff_base);
            }
        }
    }
}
