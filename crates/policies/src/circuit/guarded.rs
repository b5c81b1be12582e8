//! Operations wrapped by a circuit breaker, with optional fallbacks.

use super::breaker::{Admission, CircuitBreaker};
use super::stream::ObservedStream;
use crate::fallback::{FailureAwareFn, PlainFn};
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, Stream, StreamExt, TryStreamExt};
use resiliens_core::{Error, Result};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// An operation protected by a [`CircuitBreaker`].
///
/// `R` is what the operation produces when invoked: a boxed future for
/// ordinary calls, a boxed stream for streaming calls. While the circuit
/// refuses calls, the plain fallback is preferred, then the failure-aware
/// one (which receives the last recorded failure); without either the call
/// fails with [`Error::CircuitOpen`].
pub struct Guarded<A, R, E> {
    breaker: Arc<CircuitBreaker<E>>,
    operation: PlainFn<A, R>,
    fallback: Option<PlainFn<A, R>>,
    failure_fallback: Option<FailureAwareFn<Option<E>, A, R>>,
}

impl<A, R, E> Guarded<A, R, E> {
    pub(crate) fn new(breaker: Arc<CircuitBreaker<E>>, operation: PlainFn<A, R>) -> Self {
        Self {
            breaker,
            operation,
            fallback: None,
            failure_fallback: None,
        }
    }

    /// The breaker every call goes through
    pub fn breaker(&self) -> &Arc<CircuitBreaker<E>> {
        &self.breaker
    }

    fn fallback_for(&self, last_failure: Option<E>, args: A) -> Option<R> {
        if let Some(fallback) = &self.fallback {
            return Some(fallback(args));
        }
        self.failure_fallback
            .as_ref()
            .map(|fallback| fallback(last_failure, args))
    }
}

impl<A, T, E> Guarded<A, BoxFuture<'static, std::result::Result<T, E>>, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Called with the original arguments while the circuit refuses calls
    pub fn with_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.fallback = Some(Arc::new(move |args| fallback(args).boxed()));
        self
    }

    /// Called with the last recorded failure and the original arguments while
    /// the circuit refuses calls
    pub fn with_failure_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(Option<E>, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.failure_fallback = Some(Arc::new(move |failure, args| fallback(failure, args).boxed()));
        self
    }

    pub async fn call(&self, args: A) -> Result<T, E> {
        match self.breaker.admit() {
            Admission::Granted(permit) => {
                let outcome = (self.operation)(args).await;
                let result = self.breaker.observe(outcome);
                drop(permit);
                result
            }
            Admission::Refused { last_failure } => match self.fallback_for(last_failure, args) {
                Some(fallback) => {
                    tracing::debug!(circuit = %self.breaker.name(), "circuit open, invoking fallback");
                    fallback.await.map_err(Error::Inner)
                }
                None => Err(Error::CircuitOpen(self.breaker.open_error())),
            },
        }
    }
}

impl<A, T, E> Guarded<A, BoxStream<'static, std::result::Result<T, E>>, E>
where
    A: Send + 'static,
    T: Send + 'static,
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    /// Stream returned with the original arguments while the circuit refuses calls
    pub fn with_fallback<F, S>(mut self, fallback: F) -> Self
    where
        F: Fn(A) -> S + Send + Sync + 'static,
        S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    {
        self.fallback = Some(Arc::new(move |args| fallback(args).boxed()));
        self
    }

    /// Stream built from the last recorded failure and the original arguments
    /// while the circuit refuses calls
    pub fn with_failure_fallback<F, S>(mut self, fallback: F) -> Self
    where
        F: Fn(Option<E>, A) -> S + Send + Sync + 'static,
        S: Stream<Item = std::result::Result<T, E>> + Send + 'static,
    {
        self.failure_fallback = Some(Arc::new(move |failure, args| fallback(failure, args).boxed()));
        self
    }

    /// Start a stream through the breaker. Its outcome is recorded when the
    /// stream finishes or fails, see [`ObservedStream`].
    pub fn call_stream(&self, args: A) -> Result<BoxStream<'static, Result<T, E>>, E> {
        match self.breaker.admit() {
            Admission::Granted(permit) => {
                let stream = (self.operation)(args);
                Ok(ObservedStream::new(stream, Arc::clone(&self.breaker), permit).boxed())
            }
            Admission::Refused { last_failure } => match self.fallback_for(last_failure, args) {
                Some(fallback) => {
                    tracing::debug!(circuit = %self.breaker.name(), "circuit open, streaming from fallback");
                    Ok(fallback.map_err(Error::Inner).boxed())
                }
                None => Err(Error::CircuitOpen(self.breaker.open_error())),
            },
        }
    }
}

impl<A, R, E> Clone for Guarded<A, R, E> {
    fn clone(&self) -> Self {
        Self {
            breaker: Arc::clone(&self.breaker),
            operation: Arc::clone(&self.operation),
            fallback: self.fallback.clone(),
            failure_fallback: self.failure_fallback.clone(),
        }
    }
}

impl<A, R, E> fmt::Debug for Guarded<A, R, E>
where
    E: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("breaker", &self.breaker)
            .field("fallback", &self.fallback.is_some())
            .field("failure_fallback", &self.failure_fallback.is_some())
            .finish()
    }
}
