//! Helpers shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Route library events to the test output; `RUST_LOG=resiliens=debug` shows them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ServiceError {
    #[error("service unavailable")]
    Unavailable,
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl ServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Unavailable)
    }
}

/// A fake downstream service that fails its first `failures` calls
#[derive(Debug, Clone)]
pub struct FlakyService {
    calls: Arc<AtomicU32>,
    failures: u32,
}

impl FlakyService {
    pub fn new(failures: u32) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures,
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn fetch(&self, key: u32) -> Result<String, ServiceError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(ServiceError::Unavailable)
        } else {
            Ok(format!("value-{key}"))
        }
    }
}
