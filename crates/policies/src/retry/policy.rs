//! Retry policy: re-run an operation after classified failures.

use super::backoff::Backoff;
use super::config::RetryConfig;
use crate::circuit::CircuitBreaker;
use crate::fallback::{PlainFn, Substitute};
use futures::future::BoxFuture;
use futures::FutureExt;
use resiliens_core::{Classifier, ConfigError, Error, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Why the attempt loop stopped without a value
enum Stop<X> {
    /// A failure the policy does not retry
    Fatal(X),
    /// Every attempt failed; carries the last failure
    Exhausted { attempts: u32, last: X },
}

/// Retries an operation while it fails with a classified failure.
///
/// The policy holds configuration only. Each call gets its own [`Backoff`]
/// schedule, so attempts never accumulate across calls.
pub struct RetryPolicy<E> {
    config: RetryConfig,
    classifier: Classifier<E>,
}

impl<E> RetryPolicy<E>
where
    E: Send + 'static,
{
    pub fn builder() -> RetryPolicyBuilder<E> {
        RetryPolicyBuilder::new()
    }

    pub fn new(config: RetryConfig, classifier: Classifier<E>) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails with an unclassified failure,
    /// or runs out of attempts.
    ///
    /// Unclassified failures come back as [`Error::Inner`], exhaustion as
    /// [`Error::RetryExhausted`] carrying the last failure.
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.attempt(operation, |error| self.classifier.classifies(error))
            .await
            .map_err(|stop| match stop {
                Stop::Fatal(error) => Error::Inner(error),
                Stop::Exhausted { attempts, last } => Error::retry_exhausted(attempts, last),
            })
    }

    /// Run `operation` through `breaker`, retrying classified failures.
    ///
    /// A call refused by the open circuit is returned at once and never retried.
    pub async fn call_with_breaker<F, Fut, T>(&self, breaker: &CircuitBreaker<E>, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Clone + fmt::Debug + Sync,
    {
        let retryable = |error: &Error<E>| match error {
            Error::Inner(inner) => self.classifier.classifies(inner),
            Error::CircuitOpen(_) | Error::RetryExhausted { .. } => false,
        };

        let attempt = move || {
            let outcome = operation();
            breaker.call(move || outcome)
        };
        self.attempt(attempt, retryable)
            .await
            .map_err(|stop| match stop {
                Stop::Fatal(error) => error,
                Stop::Exhausted {
                    attempts,
                    last: Error::Inner(last),
                } => Error::retry_exhausted(attempts, last),
                Stop::Exhausted { last, .. } => last,
            })
    }

    /// Wrap `operation` so every call is retried by this policy
    pub fn wrap<A, T, F, Fut>(self, operation: F) -> Retrying<A, T, E>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        Retrying {
            policy: Arc::new(self),
            operation: Arc::new(move |args| operation(args).boxed()),
            fallback: None,
            failure_fallback: None,
        }
    }

    async fn attempt<F, Fut, T, X>(&self, mut operation: F, retryable: impl Fn(&X) -> bool) -> std::result::Result<T, Stop<X>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, X>>,
    {
        let mut backoff = Backoff::new(&self.config);
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let error = match operation().await {
                Ok(value) => {
                    if attempts > 1 {
                        tracing::debug!(attempts, "operation succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(error) if !retryable(&error) => return Err(Stop::Fatal(error)),
                Err(error) => error,
            };

            match backoff.next() {
                Some(delay) => {
                    tracing::debug!(
                        attempt = attempts,
                        max_attempts = self.config.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    if delay > Duration::ZERO {
                        sleep(delay).await;
                    }
                }
                None => {
                    tracing::warn!(attempts, "giving up after repeated failures");
                    return Err(Stop::Exhausted { attempts, last: error });
                }
            }
        }
    }
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            classifier: self.classifier.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("config", &self.config)
            .field("classifier", &self.classifier)
            .finish()
    }
}

/// An operation wrapped by a [`RetryPolicy`].
///
/// Once attempts run out, the failure-aware fallback is called with the last
/// failure if one is set, otherwise the plain fallback; without either the
/// call fails with [`Error::RetryExhausted`].
pub struct Retrying<A, T, E> {
    policy: Arc<RetryPolicy<E>>,
    operation: PlainFn<A, BoxFuture<'static, std::result::Result<T, E>>>,
    fallback: Option<Substitute<A, T, E>>,
    failure_fallback: Option<Substitute<A, T, E>>,
}

impl<A, T, E> Retrying<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn with_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.fallback = Some(Substitute::plain(fallback));
        self
    }

    pub fn with_failure_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(E, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.failure_fallback = Some(Substitute::failure_aware(fallback));
        self
    }

    pub fn policy(&self) -> &RetryPolicy<E> {
        &self.policy
    }

    pub async fn call(&self, args: A) -> Result<T, E> {
        let classifier = &self.policy.classifier;
        let outcome = self
            .policy
            .attempt(|| (self.operation)(args.clone()), |error| classifier.classifies(error))
            .await;

        match outcome {
            Ok(value) => Ok(value),
            Err(Stop::Fatal(error)) => Err(Error::Inner(error)),
            Err(Stop::Exhausted { attempts, last }) => {
                match self.failure_fallback.as_ref().or(self.fallback.as_ref()) {
                    Some(fallback) => {
                        tracing::debug!(attempts, "retries exhausted, invoking fallback");
                        fallback.invoke(last, args).await.map_err(Error::Inner)
                    }
                    None => Err(Error::retry_exhausted(attempts, last)),
                }
            }
        }
    }
}

impl<A, T, E> Clone for Retrying<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            operation: Arc::clone(&self.operation),
            fallback: self.fallback.clone(),
            failure_fallback: self.failure_fallback.clone(),
        }
    }
}

impl<A, T, E> fmt::Debug for Retrying<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrying")
            .field("policy", &self.policy)
            .field("fallback", &self.fallback)
            .field("failure_fallback", &self.failure_fallback)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RetryPolicy`]
pub struct RetryPolicyBuilder<E> {
    config: RetryConfig,
    classifier: Classifier<E>,
}

impl<E> RetryPolicyBuilder<E>
where
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            config: RetryConfig::default(),
            classifier: Classifier::All,
        }
    }

    pub fn config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.config.backoff_base = base;
        self
    }

    /// Grow the delay as `base × failures^multiplier`
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.config.backoff_multiplier = Some(multiplier);
        self
    }

    /// Only failures matching `predicate` are retried
    pub fn classify<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.classifier = Classifier::predicate(predicate);
        self
    }

    pub fn classifier(mut self, classifier: Classifier<E>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn build(self) -> std::result::Result<RetryPolicy<E>, ConfigError> {
        RetryPolicy::new(self.config, self.classifier)
    }
}

impl<E> Default for RetryPolicyBuilder<E>
where
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
