//! Circuit breaker state management and execution logic.

use super::config::{CircuitBreakerConfig, HalfOpenPolicy};
use super::guarded::Guarded;
use super::registry::{CircuitBreakerRegistry, ManagedCircuit};
use super::state::CircuitState;
use super::stream::ObservedStream;
use super::transitions::Transition;
use super::types::CircuitSnapshot;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use resiliens_core::{CircuitOpenError, CircuitStatus, Classifier, ConfigError, Error, Result};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::Instant;

/// Name reported by a breaker that was never named and never wrapped an operation
const UNNAMED: &str = "<unnamed>";

/// Circuit breaker implementation
pub struct CircuitBreaker<E> {
    name: OnceCell<String>,
    config: CircuitBreakerConfig,
    classifier: Classifier<E>,
    state: Mutex<CircuitState<E>>,
    probe_in_flight: Arc<AtomicBool>,
    registry: Option<Weak<CircuitBreakerRegistry>>,
}

/// Whether a call may reach the protected operation
pub(crate) enum Admission<E> {
    Granted(Permit),
    Refused { last_failure: Option<E> },
}

/// Held for the duration of an admitted call. A half-open trial call
/// releases its probe slot when the permit is dropped, whatever the outcome.
pub(crate) struct Permit {
    probe: Option<Arc<AtomicBool>>,
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(probe) = self.probe.take() {
            probe.store(false, Ordering::Release);
        }
    }
}

impl<E> CircuitBreaker<E>
where
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Start configuring a circuit breaker
    pub fn builder() -> CircuitBreakerBuilder<E> {
        CircuitBreakerBuilder::new()
    }

    /// Create a circuit breaker from a validated configuration
    pub fn new(
        config: CircuitBreakerConfig,
        classifier: Classifier<E>,
    ) -> std::result::Result<Arc<Self>, ConfigError> {
        CircuitBreakerBuilder::new()
            .config(config)
            .classifier(classifier)
            .build()
    }

    /// Name under which the breaker is registered
    pub fn name(&self) -> &str {
        self.name.get().map(String::as_str).unwrap_or(UNNAMED)
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn failure_threshold(&self) -> u32 {
        self.config.failure_threshold
    }

    pub fn reset_timeout(&self) -> Duration {
        self.config.reset_timeout
    }

    /// Get the current state of the circuit, derived fresh on every read
    pub fn status(&self) -> CircuitStatus {
        self.state
            .lock()
            .observed_status(self.config.reset_timeout, Instant::now())
    }

    pub fn is_open(&self) -> bool {
        self.status() == CircuitStatus::Open
    }

    pub fn is_closed(&self) -> bool {
        self.status() == CircuitStatus::Closed
    }

    /// Classified failures since the last success
    pub fn failure_count(&self) -> usize {
        self.state.lock().failure_count()
    }

    /// Failures held in the sliding window; `None` without a window
    pub fn window_failure_count(&self) -> Option<usize> {
        self.state.lock().window_failure_count()
    }

    pub fn last_failure(&self) -> Option<E> {
        self.state.lock().last_failure().cloned()
    }

    /// Whole seconds until the circuit reads as half-open; zero or negative once it does
    pub fn open_seconds_remaining(&self) -> i64 {
        self.state
            .lock()
            .open_seconds_remaining(self.config.reset_timeout, Instant::now())
    }

    /// Wall-clock time at which the circuit reads as half-open
    pub fn open_until(&self) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::seconds(self.open_seconds_remaining())
    }

    /// Current statistics, read under a single lock
    pub fn snapshot(&self) -> CircuitSnapshot {
        let now = Instant::now();
        let state = self.state.lock();
        let remaining = state.open_seconds_remaining(self.config.reset_timeout, now);

        CircuitSnapshot {
            name: self.name().to_string(),
            status: state.observed_status(self.config.reset_timeout, now),
            failure_threshold: self.config.failure_threshold,
            failure_count: state.failure_count(),
            last_failure: state.last_failure().map(|failure| format!("{failure:?}")),
            open_until: Utc::now() + chrono::Duration::seconds(remaining),
            open_seconds_remaining: remaining,
        }
    }

    /// Diagnostics for a refused call
    pub fn open_error(&self) -> CircuitOpenError<E> {
        let now = Instant::now();
        let state = self.state.lock();
        let remaining = state.open_seconds_remaining(self.config.reset_timeout, now);

        CircuitOpenError {
            name: self.name().to_string(),
            failure_count: state.failure_count(),
            open_until: Utc::now() + chrono::Duration::seconds(remaining),
            seconds_remaining: remaining,
            last_failure: state.last_failure().cloned(),
        }
    }

    /// Open the circuit now, bypassing the failure threshold
    pub fn force_open(&self) {
        let transition = self.state.lock().force_open(Instant::now());
        if transition == Transition::Opened {
            tracing::warn!(circuit = %self.name(), "circuit breaker forced open");
        }
    }

    /// Close the circuit exactly as a successful call would
    pub fn force_reset(&self) {
        self.record_success();
    }

    /// Execute an operation through the circuit breaker
    pub async fn call<F, Fut, T>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        match self.admit() {
            Admission::Granted(permit) => {
                let outcome = operation().await;
                let result = self.observe(outcome);
                drop(permit);
                result
            }
            Admission::Refused { .. } => Err(Error::CircuitOpen(self.open_error())),
        }
    }

    /// Execute a streaming operation through the circuit breaker.
    ///
    /// The outcome is recorded when the stream ends or yields its first
    /// classified failure, not when it is created.
    pub fn call_stream<F, S, T>(self: &Arc<Self>, operation: F) -> Result<ObservedStream<S, E>, E>
    where
        F: FnOnce() -> S,
        S: Stream<Item = std::result::Result<T, E>>,
    {
        match self.admit() {
            Admission::Granted(permit) => Ok(ObservedStream::new(operation(), Arc::clone(self), permit)),
            Admission::Refused { .. } => Err(Error::CircuitOpen(self.open_error())),
        }
    }

    /// Wrap an async operation so every call goes through this breaker.
    ///
    /// An unnamed breaker takes the operation's type name and registers itself
    /// with the registry it was built with.
    pub fn wrap<A, T, F, Fut>(self: &Arc<Self>, operation: F) -> Guarded<A, BoxFuture<'static, std::result::Result<T, E>>, E>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.adopt_name::<F>();
        Guarded::new(Arc::clone(self), Arc::new(move |args| operation(args).boxed()))
    }

    /// Wrap a stream-producing operation so every stream it yields is observed by this breaker
    pub fn wrap_stream<A, T, F, S>(self: &Arc<Self>, operation: F) -> Guarded<A, BoxStream<'static, std::result::Result<T, E>>, E>
    where
        F: Fn(A) -> S + Send + Sync + 'static,
        S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    {
        self.adopt_name::<F>();
        Guarded::new(Arc::clone(self), Arc::new(move |args| operation(args).boxed()))
    }

    fn adopt_name<F>(self: &Arc<Self>) {
        self.name.get_or_init(|| std::any::type_name::<F>().to_string());
        self.register();
    }

    fn register(self: &Arc<Self>) {
        if let Some(registry) = self.registry.as_ref().and_then(Weak::upgrade) {
            registry.register(Arc::clone(self) as Arc<dyn ManagedCircuit>);
        }
    }

    pub(crate) fn admit(&self) -> Admission<E> {
        let state = self.state.lock();
        if state.stored_status() == CircuitStatus::Closed {
            return Admission::Granted(Permit { probe: None });
        }

        if self.config.half_open == HalfOpenPolicy::Probe
            && state.observed_status(self.config.reset_timeout, Instant::now()) == CircuitStatus::HalfOpen
            && self
                .probe_in_flight
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            tracing::debug!(circuit = %self.name(), "letting trial call through half-open circuit");
            return Admission::Granted(Permit {
                probe: Some(Arc::clone(&self.probe_in_flight)),
            });
        }

        tracing::debug!(circuit = %self.name(), "circuit open, refusing call");
        Admission::Refused {
            last_failure: state.last_failure().cloned(),
        }
    }

    /// Record the outcome of an admitted call
    pub(crate) fn observe<T>(&self, outcome: std::result::Result<T, E>) -> Result<T, E> {
        match outcome {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(error) => Err(self.observe_failure(error)),
        }
    }

    /// Record a failure if it is classified; unclassified failures leave no trace
    pub(crate) fn observe_failure(&self, error: E) -> Error<E> {
        if self.classifier.classifies(&error) {
            self.record_failure(error.clone());
        }
        Error::Inner(error)
    }

    pub(crate) fn record_success(&self) {
        let transition = self.state.lock().record_success();
        if transition == Transition::Closed {
            tracing::info!(circuit = %self.name(), "circuit breaker closed");
        }
    }

    fn record_failure(&self, failure: E) {
        let (transition, failures) = {
            let mut state = self.state.lock();
            let transition =
                state.record_failure(failure, self.config.failure_threshold as usize, Instant::now());
            (transition, state.threshold_tally())
        };

        match transition {
            Transition::Opened => tracing::warn!(
                circuit = %self.name(),
                failures,
                reset_timeout_ms = self.config.reset_timeout.as_millis() as u64,
                "circuit breaker opened"
            ),
            Transition::Reopened => tracing::warn!(
                circuit = %self.name(),
                failures,
                "circuit breaker re-opened after failed trial call"
            ),
            Transition::Closed | Transition::Unchanged => {}
        }
    }
}

impl<E> ManagedCircuit for CircuitBreaker<E>
where
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        CircuitBreaker::name(self)
    }

    fn status(&self) -> CircuitStatus {
        CircuitBreaker::status(self)
    }

    fn failure_threshold(&self) -> u32 {
        CircuitBreaker::failure_threshold(self)
    }

    fn failure_count(&self) -> usize {
        CircuitBreaker::failure_count(self)
    }

    fn open_until(&self) -> DateTime<Utc> {
        CircuitBreaker::open_until(self)
    }

    fn open_seconds_remaining(&self) -> i64 {
        CircuitBreaker::open_seconds_remaining(self)
    }

    fn snapshot(&self) -> CircuitSnapshot {
        CircuitBreaker::snapshot(self)
    }

    fn force_open(&self) {
        CircuitBreaker::force_open(self)
    }

    fn force_reset(&self) {
        CircuitBreaker::force_reset(self)
    }

    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl<E> fmt::Debug for CircuitBreaker<E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name.get())
            .field("config", &self.config)
            .field("classifier", &self.classifier)
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// Builder for [`CircuitBreaker`]
pub struct CircuitBreakerBuilder<E> {
    config: CircuitBreakerConfig,
    classifier: Classifier<E>,
    registry: Option<Weak<CircuitBreakerRegistry>>,
}

impl<E> CircuitBreakerBuilder<E>
where
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            config: CircuitBreakerConfig::default(),
            classifier: Classifier::All,
            registry: None,
        }
    }

    /// Replace every setting with `config`
    pub fn config(mut self, config: CircuitBreakerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = Some(name.into());
        self
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// Count failures over the most recent `size` outcomes instead of consecutively
    pub fn sliding_window(mut self, size: usize) -> Self {
        self.config.sliding_window_size = Some(size);
        self
    }

    pub fn half_open(mut self, policy: HalfOpenPolicy) -> Self {
        self.config.half_open = policy;
        self
    }

    /// Only failures matching `predicate` count against the circuit
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

    /// Register the breaker in `registry` once it has a name
    pub fn registry(mut self, registry: &Arc<CircuitBreakerRegistry>) -> Self {
        self.registry = Some(Arc::downgrade(registry));
        self
    }

    pub fn build(self) -> std::result::Result<Arc<CircuitBreaker<E>>, ConfigError> {
        self.config.validate()?;

        let named = self.config.name.is_some();
        let name = match self.config.name.clone() {
            Some(configured) => OnceCell::with_value(configured),
            None => OnceCell::new(),
        };

        let breaker = Arc::new(CircuitBreaker {
            name,
            state: Mutex::new(CircuitState::new(self.config.sliding_window_size, Instant::now())),
            config: self.config,
            classifier: self.classifier,
            probe_in_flight: Arc::new(AtomicBool::new(false)),
            registry: self.registry,
        });

        if named {
            breaker.register();
        }
        Ok(breaker)
    }
}

impl<E> Default for CircuitBreakerBuilder<E>
where
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
