//! Streams whose outcome is recorded by a circuit breaker.

use super::breaker::{CircuitBreaker, Permit};
use futures::ready;
use futures::stream::{FusedStream, Stream};
use pin_project_lite::pin_project;
use resiliens_core::Result;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

pin_project! {
    /// A stream produced through a circuit breaker.
    ///
    /// Running to completion records a success. The first `Err` item ends the
    /// stream and, if classified, records a failure; items yielded before it
    /// stay with the consumer. Dropping the stream early records nothing.
    pub struct ObservedStream<S, E> {
        #[pin]
        inner: S,
        breaker: Arc<CircuitBreaker<E>>,
        permit: Option<Permit>,
        finished: bool,
    }
}

impl<S, E> ObservedStream<S, E> {
    pub(crate) fn new(inner: S, breaker: Arc<CircuitBreaker<E>>, permit: Permit) -> Self {
        Self {
            inner,
            breaker,
            permit: Some(permit),
            finished: false,
        }
    }
}

impl<S, E> fmt::Debug for ObservedStream<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservedStream")
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<S, T, E> Stream for ObservedStream<S, E>
where
    S: Stream<Item = std::result::Result<T, E>>,
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        if *this.finished {
            return Poll::Ready(None);
        }

        match ready!(this.inner.poll_next(cx)) {
            Some(Ok(item)) => Poll::Ready(Some(Ok(item))),
            Some(Err(error)) => {
                *this.finished = true;
                let error = this.breaker.observe_failure(error);
                this.permit.take();
                Poll::Ready(Some(Err(error)))
            }
            None => {
                *this.finished = true;
                this.breaker.record_success();
                this.permit.take();
                Poll::Ready(None)
            }
        }
    }
}

impl<S, T, E> FusedStream for ObservedStream<S, E>
where
    S: Stream<Item = std::result::Result<T, E>>,
    E: Clone + fmt::Debug + Send + Sync + 'static,
{
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
