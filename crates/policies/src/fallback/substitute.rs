//! Substitute callables invoked in place of a failed operation.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Shared callable taking the original arguments
pub type PlainFn<A, R> = Arc<dyn Fn(A) -> R + Send + Sync>;

/// Shared callable taking a failure followed by the original arguments
pub type FailureAwareFn<X, A, R> = Arc<dyn Fn(X, A) -> R + Send + Sync>;

/// A single fallback: either plain, or aware of the failure it replaces
pub enum Substitute<A, T, E> {
    /// Called with the original arguments
    Plain(PlainFn<A, BoxFuture<'static, Result<T, E>>>),
    /// Called with the failure, then the original arguments
    FailureAware(FailureAwareFn<E, A, BoxFuture<'static, Result<T, E>>>),
}

impl<A, T, E> Substitute<A, T, E> {
    pub fn plain<F, Fut>(fallback: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Substitute::Plain(Arc::new(move |args| fallback(args).boxed()))
    }

    pub fn failure_aware<F, Fut>(fallback: F) -> Self
    where
        F: Fn(E, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Substitute::FailureAware(Arc::new(move |failure, args| fallback(failure, args).boxed()))
    }

    /// Start the substitute call in place of the failed one
    pub fn invoke(&self, failure: E, args: A) -> BoxFuture<'static, Result<T, E>> {
        match self {
            Substitute::Plain(fallback) => fallback(args),
            Substitute::FailureAware(fallback) => fallback(failure, args),
        }
    }
}

impl<A, T, E> Clone for Substitute<A, T, E> {
    fn clone(&self) -> Self {
        match self {
            Substitute::Plain(fallback) => Substitute::Plain(Arc::clone(fallback)),
            Substitute::FailureAware(fallback) => Substitute::FailureAware(Arc::clone(fallback)),
        }
    }
}

impl<A, T, E> fmt::Debug for Substitute<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Substitute::Plain(_) => write!(f, "Substitute::Plain(<fn>)"),
            Substitute::FailureAware(_) => write!(f, "Substitute::FailureAware(<fn>)"),
        }
    }
}
