//! Integration tests for circuit breaker functionality.
//!
//! These tests focus on the interaction between the breaker, wrapped
//! operations, fallbacks, streams and the registry.

#[cfg(test)]
mod integration_tests {
    use super::super::{
        breaker::CircuitBreaker,
        config::HalfOpenPolicy,
        registry::CircuitBreakerRegistry,
        state::CircuitState,
        transitions::Transition,
    };
    use futures::channel::oneshot;
    use futures::{stream, StreamExt};
    use proptest::prelude::*;
    use resiliens_core::{CircuitStatus, Error, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, thiserror::Error)]
    enum PriceError {
        #[error("pricing service timed out")]
        Timeout,
        #[error("unknown product {0}")]
        UnknownProduct(u32),
    }

    fn transient(error: &PriceError) -> bool {
        matches!(error, PriceError::Timeout)
    }

    async fn fetch_price(product: u32) -> std::result::Result<u32, PriceError> {
        match product {
            0 => Err(PriceError::Timeout),
            p if p > 1_000 => Err(PriceError::UnknownProduct(p)),
            p => Ok(p * 100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_circuit_breaker_lifecycle() {
        let registry = CircuitBreakerRegistry::shared();
        let breaker = CircuitBreaker::builder()
            .failure_threshold(2)
            .reset_timeout(Duration::from_millis(100))
            .classify(transient)
            .registry(&registry)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price).with_fallback(|_| async { Ok(0) });

        // The unnamed breaker adopts the operation's name and registers itself
        assert!(breaker.name().ends_with("fetch_price"));
        assert!(registry.get(breaker.name()).is_some());

        assert_eq!(prices.call(3).await.unwrap(), 300);

        for _ in 0..2 {
            let result = prices.call(0).await;
            assert!(matches!(result, Err(Error::Inner(PriceError::Timeout))));
        }
        assert_eq!(breaker.status(), CircuitStatus::Open);
        assert!(!registry.all_closed());

        // Open: the fallback answers instead of the operation
        assert_eq!(prices.call(3).await.unwrap(), 0);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(breaker.status(), CircuitStatus::HalfOpen);
        // Half-open still routes to the fallback under the default policy
        assert_eq!(prices.call(3).await.unwrap(), 0);

        registry.force_reset(breaker.name()).unwrap();
        assert_eq!(prices.call(3).await.unwrap(), 300);
        assert!(registry.all_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_without_fallback_reports_diagnostics() {
        let breaker = CircuitBreaker::builder()
            .name("pricing")
            .failure_threshold(1)
            .reset_timeout(Duration::from_millis(2_500))
            .classify(transient)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price);

        let _ = prices.call(0).await;
        let error = prices.call(5).await.unwrap_err();

        let open = error.as_circuit_open().expect("circuit should be open");
        assert_eq!(open.name, "pricing");
        assert_eq!(open.failure_count, 1);
        assert_eq!(open.seconds_remaining, 3);
        assert_eq!(open.last_failure, Some(PriceError::Timeout));
        assert!(error.to_string().starts_with("[Circuit breaker: pricing] Reached 1 failures"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_fallback_receives_last_failure() {
        let breaker = CircuitBreaker::builder()
            .name("pricing")
            .failure_threshold(1)
            .build()
            .unwrap();
        let prices = breaker
            .wrap(fetch_price)
            .with_failure_fallback(|failure: Option<PriceError>, product: u32| async move {
                match failure {
                    Some(PriceError::Timeout) => Ok(product),
                    _ => Ok(1),
                }
            });

        let _ = prices.call(0).await;
        assert_eq!(prices.call(7).await.unwrap(), 7);

        // A forced open circuit has no failure to hand over
        breaker.force_reset();
        breaker.force_open();
        assert_eq!(prices.call(7).await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plain_fallback_takes_precedence() {
        let breaker = CircuitBreaker::builder().name("pricing").build().unwrap();
        let prices = breaker
            .wrap(fetch_price)
            .with_failure_fallback(|_, _| async { Ok(1) })
            .with_fallback(|_| async { Ok(2) });

        breaker.force_open();
        assert_eq!(prices.call(7).await.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unclassified_failure_leaves_no_trace() {
        let breaker = CircuitBreaker::builder()
            .failure_threshold(2)
            .sliding_window(4)
            .classify(transient)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price);

        let _ = prices.call(0).await;
        let before = breaker.snapshot();

        let result = prices.call(5_000).await;
        assert!(matches!(result, Err(Error::Inner(PriceError::UnknownProduct(5_000)))));

        let after = breaker.snapshot();
        assert_eq!(before.failure_count, after.failure_count);
        assert_eq!(before.status, after.status);
        assert_eq!(before.last_failure, after.last_failure);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sliding_window_opens_on_rate_not_streak() {
        let breaker = CircuitBreaker::builder()
            .failure_threshold(3)
            .sliding_window(5)
            .classify(transient)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price);

        // fail, ok, fail, ok: two failures in the window
        for product in [0, 1, 0, 1] {
            let _ = prices.call(product).await;
        }
        assert_eq!(breaker.failure_count(), 0);
        assert_eq!(breaker.window_failure_count(), Some(2));
        assert_eq!(breaker.status(), CircuitStatus::Closed);

        let _ = prices.call(0).await;
        assert_eq!(breaker.failure_count(), 1);
        assert_eq!(breaker.window_failure_count(), Some(3));
        assert_eq!(breaker.status(), CircuitStatus::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_admits_single_trial_call() {
        let breaker = CircuitBreaker::<PriceError>::builder()
            .name("pricing")
            .failure_threshold(1)
            .reset_timeout(Duration::from_secs(1))
            .half_open(HalfOpenPolicy::Probe)
            .build()
            .unwrap();
        let executed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&executed);
        let gated = breaker.wrap(move |gate: Option<oneshot::Receiver<()>>| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                Ok(1)
            }
        });

        breaker.force_open();
        assert!(gated.call(None).await.unwrap_err().is_circuit_open());
        tokio::time::advance(Duration::from_secs(1)).await;

        let (release, gate) = oneshot::channel();
        let probe = gated.call(Some(gate));
        futures::pin_mut!(probe);
        assert!(futures::poll!(probe.as_mut()).is_pending());

        // The trial call is still running, so a second call is refused
        assert!(gated.call(None).await.unwrap_err().is_circuit_open());
        assert_eq!(executed.load(Ordering::SeqCst), 1);

        release.send(()).unwrap();
        assert_eq!(probe.await.unwrap(), 1);
        assert_eq!(breaker.status(), CircuitStatus::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_probe_reopens_with_fresh_timeout() {
        let breaker = CircuitBreaker::builder()
            .failure_threshold(1)
            .reset_timeout(Duration::from_secs(4))
            .half_open(HalfOpenPolicy::Probe)
            .classify(transient)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price);

        let _ = prices.call(0).await;
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(breaker.status(), CircuitStatus::HalfOpen);

        let _ = prices.call(0).await;
        assert_eq!(breaker.status(), CircuitStatus::Open);
        assert_eq!(breaker.open_seconds_remaining(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_count_with_window() {
        let breaker = CircuitBreaker::builder()
            .failure_threshold(3)
            .sliding_window(5)
            .classify(transient)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price);

        for product in [0, 0, 1] {
            let _ = prices.call(product).await;
        }

        assert_eq!(breaker.failure_count(), 0);
        assert!(breaker.last_failure().is_none());
        assert_eq!(breaker.window_failure_count(), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trial_after_force_open_reopens() {
        let breaker = CircuitBreaker::builder()
            .failure_threshold(5)
            .reset_timeout(Duration::from_secs(4))
            .half_open(HalfOpenPolicy::Probe)
            .classify(transient)
            .build()
            .unwrap();
        let prices = breaker.wrap(fetch_price);

        breaker.force_open();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(breaker.status(), CircuitStatus::HalfOpen);

        let result = prices.call(0).await;
        assert!(matches!(result, Err(Error::Inner(PriceError::Timeout))));
        assert_eq!(breaker.status(), CircuitStatus::Open);
        assert_eq!(breaker.open_seconds_remaining(), 4);

        // Still open, so the next call is refused rather than tried
        assert!(prices.call(3).await.unwrap_err().is_circuit_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_probe_releases_slot() {
        let breaker = CircuitBreaker::<PriceError>::builder()
            .failure_threshold(1)
            .reset_timeout(Duration::from_secs(1))
            .half_open(HalfOpenPolicy::Probe)
            .build()
            .unwrap();
        let gated = breaker.wrap(|gate: Option<oneshot::Receiver<()>>| async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(())
        });

        breaker.force_open();
        tokio::time::advance(Duration::from_secs(1)).await;

        let (_release, gate) = oneshot::channel();
        {
            let probe = gated.call(Some(gate));
            futures::pin_mut!(probe);
            assert!(futures::poll!(probe.as_mut()).is_pending());
        }

        assert!(gated.call(None).await.is_ok());
        assert_eq!(breaker.status(), CircuitStatus::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_fallback_when_open() {
        let breaker = CircuitBreaker::<PriceError>::builder()
            .name("ticker")
            .failure_threshold(1)
            .build()
            .unwrap();
        let ticker = breaker
            .wrap_stream(|count: u32| stream::iter((0..count).map(Ok)))
            .with_fallback(|_| stream::iter(vec![Ok(u32::MAX)]));

        let live: Vec<Result<u32, PriceError>> = ticker.call_stream(3).unwrap().collect().await;
        assert_eq!(live.len(), 3);

        breaker.force_open();
        let cached: Vec<u32> = ticker
            .call_stream(3)
            .unwrap()
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(cached, vec![u32::MAX]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_failure_counts_like_direct_failure() {
        let breaker = CircuitBreaker::builder()
            .name("ticker")
            .failure_threshold(2)
            .classify(transient)
            .build()
            .unwrap();
        let ticker = breaker.wrap_stream(|fail: bool| {
            stream::iter(vec![
                Ok(1),
                if fail { Err(PriceError::Timeout) } else { Ok(2) },
            ])
        });

        for _ in 0..2 {
            let items: Vec<_> = ticker.call_stream(true).unwrap().collect().await;
            assert!(matches!(items.as_slice(), [Ok(1), Err(Error::Inner(PriceError::Timeout))]));
        }
        assert_eq!(breaker.status(), CircuitStatus::Open);
        assert!(ticker.call_stream(false).err().unwrap().is_circuit_open());
    }

    proptest! {
        #[test]
        fn test_consecutive_failures_open_exactly_at_threshold(threshold in 1usize..20, extra in 0usize..5) {
            let now = tokio::time::Instant::now();
            let mut state: CircuitState<()> = CircuitState::new(None, now);

            for failure in 1..=threshold + extra {
                let transition = state.record_failure((), threshold, now);
                if failure < threshold {
                    prop_assert_eq!(transition, Transition::Unchanged);
                    prop_assert_eq!(state.stored_status(), CircuitStatus::Closed);
                } else if failure == threshold {
                    prop_assert_eq!(transition, Transition::Opened);
                } else {
                    prop_assert_eq!(state.stored_status(), CircuitStatus::Open);
                }
            }
        }

        #[test]
        fn test_window_opens_iff_recent_failures_reach_threshold(
            capacity in 1usize..10,
            threshold in 1usize..10,
            outcomes in prop::collection::vec(any::<bool>(), 1..60)
        ) {
            let now = tokio::time::Instant::now();
            let mut state: CircuitState<()> = CircuitState::new(Some(capacity), now);
            let mut expected = CircuitStatus::Closed;

            for (index, success) in outcomes.iter().enumerate() {
                if *success {
                    state.record_success();
                    expected = CircuitStatus::Closed;
                } else {
                    state.record_failure((), threshold, now);
                    let start = (index + 1).saturating_sub(capacity);
                    let recent_failures = outcomes[start..=index].iter().filter(|o| !**o).count();
                    if recent_failures >= threshold {
                        expected = CircuitStatus::Open;
                    }
                }
                prop_assert_eq!(state.stored_status(), expected);
            }
        }
    }
}
