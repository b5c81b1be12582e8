//! Constructors and accessors for policy errors

use super::types::{CircuitOpenError, Error, UnknownCircuit};

impl<E> Error<E> {
    /// Wrap the operation's own failure
    #[must_use]
    pub fn inner(error: E) -> Self {
        Error::Inner(error)
    }

    /// Create a retry exhaustion error carrying the last failure
    #[must_use]
    pub fn retry_exhausted(attempts: u32, source: E) -> Self {
        Error::RetryExhausted { attempts, source }
    }

    /// True if an open circuit refused the call
    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Error::CircuitOpen(_))
    }

    /// True if the retry policy gave up
    pub fn is_retry_exhausted(&self) -> bool {
        matches!(self, Error::RetryExhausted { .. })
    }

    /// Borrow the operation's failure, if this error carries one
    pub fn as_inner(&self) -> Option<&E> {
        match self {
            Error::Inner(error) | Error::RetryExhausted { source: error, .. } => Some(error),
            Error::CircuitOpen(_) => None,
        }
    }

    /// Take the operation's failure, if this error carries one
    pub fn into_inner(self) -> Option<E> {
        match self {
            Error::Inner(error) | Error::RetryExhausted { source: error, .. } => Some(error),
            Error::CircuitOpen(_) => None,
        }
    }

    /// Borrow the open-circuit diagnostics
    pub fn as_circuit_open(&self) -> Option<&CircuitOpenError<E>> {
        match self {
            Error::CircuitOpen(open) => Some(open),
            _ => None,
        }
    }
}

impl<E> From<CircuitOpenError<E>> for Error<E> {
    fn from(error: CircuitOpenError<E>) -> Self {
        Error::CircuitOpen(error)
    }
}

impl UnknownCircuit {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
