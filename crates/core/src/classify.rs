//! Failure classification.
//!
//! A policy only reacts to failures its [`Classifier`] recognises. Everything
//! else is handed back to the caller without touching policy state.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// Decides whether a failure is one the policy should observe
pub enum Classifier<E> {
    /// Every failure is classified
    All,
    /// Custom classification predicate
    Custom(Arc<dyn Fn(&E) -> bool + Send + Sync>),
}

impl<E> Classifier<E> {
    /// Build a classifier from a predicate
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Classifier::Custom(Arc::new(predicate))
    }

    /// Check whether `error` is a classified failure
    pub fn classifies(&self, error: &E) -> bool {
        match self {
            Classifier::All => true,
            Classifier::Custom(predicate) => predicate(error),
        }
    }
}

impl<E: AsDynError + 'static> Classifier<E> {
    /// Classify failures whose concrete error type is `K`.
    ///
    /// Works with type-erased error handles, where the concrete type is only
    /// known at runtime.
    pub fn kind<K>() -> Self
    where
        K: StdError + 'static,
    {
        Classifier::predicate(|error: &E| error.as_dyn_error().is::<K>())
    }
}

impl<E> Default for Classifier<E> {
    fn default() -> Self {
        Classifier::All
    }
}

impl<E> Clone for Classifier<E> {
    fn clone(&self) -> Self {
        match self {
            Classifier::All => Classifier::All,
            Classifier::Custom(predicate) => Classifier::Custom(Arc::clone(predicate)),
        }
    }
}

impl<E> fmt::Debug for Classifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classifier::All => write!(f, "Classifier::All"),
            Classifier::Custom(_) => write!(f, "Classifier::Custom(<predicate>)"),
        }
    }
}

/// Type-erased error handles that can be inspected for their concrete type
pub trait AsDynError {
    fn as_dyn_error(&self) -> &(dyn StdError + 'static);
}

impl AsDynError for Box<dyn StdError + Send + Sync> {
    fn as_dyn_error(&self) -> &(dyn StdError + 'static) {
        &**self
    }
}

impl AsDynError for Arc<dyn StdError + Send + Sync> {
    fn as_dyn_error(&self) -> &(dyn StdError + 'static) {
        &**self
    }
}
