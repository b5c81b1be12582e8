//! Fallback policy: replace a classified failure with a substitute's result.

use super::substitute::{PlainFn, Substitute};
use futures::future::BoxFuture;
use futures::FutureExt;
use resiliens_core::{Classifier, ConfigError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Invokes a substitute when the operation fails with a classified failure.
///
/// Unclassified failures are returned to the caller as they are, and the
/// substitute's own result (value or error) is returned unchanged.
pub struct FallbackPolicy<A, T, E> {
    classifier: Classifier<E>,
    substitute: Substitute<A, T, E>,
}

impl<A, T, E> FallbackPolicy<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn builder() -> FallbackPolicyBuilder<A, T, E> {
        FallbackPolicyBuilder::new()
    }

    pub fn new(substitute: Substitute<A, T, E>, classifier: Classifier<E>) -> Self {
        Self {
            classifier,
            substitute,
        }
    }

    pub fn substitute(&self) -> &Substitute<A, T, E> {
        &self.substitute
    }

    /// Run `operation` with `args`, falling back to the substitute on a classified failure
    pub async fn call<F, Fut>(&self, args: A, operation: F) -> Result<T, E>
    where
        F: FnOnce(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match operation(args.clone()).await {
            Ok(value) => Ok(value),
            Err(error) if self.classifier.classifies(&error) => {
                tracing::debug!("operation failed, invoking fallback");
                self.substitute.invoke(error, args).await
            }
            Err(error) => Err(error),
        }
    }

    /// Wrap `operation` so every call is protected by this policy
    pub fn wrap<F, Fut>(self, operation: F) -> WithFallback<A, T, E>
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        WithFallback {
            policy: Arc::new(self),
            operation: Arc::new(move |args| operation(args).boxed()),
        }
    }
}

impl<A, T, E> Clone for FallbackPolicy<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            substitute: self.substitute.clone(),
        }
    }
}

impl<A, T, E> fmt::Debug for FallbackPolicy<A, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackPolicy")
            .field("classifier", &self.classifier)
            .field("substitute", &self.substitute)
            .finish()
    }
}

/// An operation wrapped by a [`FallbackPolicy`]
pub struct WithFallback<A, T, E> {
    policy: Arc<FallbackPolicy<A, T, E>>,
    operation: PlainFn<A, BoxFuture<'static, Result<T, E>>>,
}

impl<A, T, E> WithFallback<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub async fn call(&self, args: A) -> Result<T, E> {
        self.policy.call(args, |args| (self.operation)(args)).await
    }

    pub fn policy(&self) -> &FallbackPolicy<A, T, E> {
        &self.policy
    }
}

impl<A, T, E> Clone for WithFallback<A, T, E> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
            operation: Arc::clone(&self.operation),
        }
    }
}

/// Builder for [`FallbackPolicy`]; exactly one fallback must be supplied
pub struct FallbackPolicyBuilder<A, T, E> {
    classifier: Classifier<E>,
    plain: Option<Substitute<A, T, E>>,
    failure_aware: Option<Substitute<A, T, E>>,
}

impl<A, T, E> FallbackPolicyBuilder<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            classifier: Classifier::All,
            plain: None,
            failure_aware: None,
        }
    }

    /// Substitute called with the original arguments
    pub fn fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.plain = Some(Substitute::plain(fallback));
        self
    }

    /// Substitute called with the failure followed by the original arguments
    pub fn fallback_with_failure<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn(E, A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.failure_aware = Some(Substitute::failure_aware(fallback));
        self
    }

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

    pub fn build(self) -> Result<FallbackPolicy<A, T, E>, ConfigError> {
        let substitute = match (self.plain, self.failure_aware) {
            (Some(plain), None) => plain,
            (None, Some(failure_aware)) => failure_aware,
            (None, None) => return Err(ConfigError::MissingFallback),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingFallbacks),
        };
        Ok(FallbackPolicy::new(substitute, self.classifier))
    }
}

impl<A, T, E> Default for FallbackPolicyBuilder<A, T, E>
where
    A: Clone + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
