//! Display implementations for error types

use super::types::{CircuitOpenError, Error};
use std::fmt;

const OPEN_UNTIL_FORMAT: &str = "%m/%d/%Y, %H:%M:%S";

impl<E: fmt::Debug> fmt::Display for CircuitOpenError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Circuit breaker: {}] Reached {} failures and will be open until {} ({} sec remaining)",
            self.name,
            self.failure_count,
            self.open_until.format(OPEN_UNTIL_FORMAT),
            self.seconds_remaining,
        )?;
        match &self.last_failure {
            Some(failure) => write!(f, " (Last failure: {failure:?})"),
            None => write!(f, " (Last failure: None)"),
        }
    }
}

impl<E: fmt::Display + fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Inner(error) => write!(f, "{error}"),
            Error::CircuitOpen(open) => write!(f, "{open}"),
            Error::RetryExhausted { attempts, source } => {
                write!(f, "gave up after {attempts} attempts: {source}")
            }
        }
    }
}

impl<E: fmt::Debug> std::error::Error for CircuitOpenError<E> {}

impl<E> std::error::Error for Error<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Inner(error) => error.source(),
            Error::CircuitOpen(_) => None,
            Error::RetryExhausted { source, .. } => Some(source),
        }
    }
}
