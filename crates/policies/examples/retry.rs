//! Retry five times with a constant backoff, then hand the last failure to a fallback.

use resiliens::RetryPolicy;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, thiserror::Error)]
#[error("connection refused")]
struct ConnectionError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let attempts = Arc::new(AtomicU32::new(0));
    let policy = RetryPolicy::<ConnectionError>::builder()
        .max_attempts(5)
        .backoff_base(Duration::from_millis(500))
        .build()?;

    let counter = Arc::clone(&attempts);
    let tally = Arc::clone(&attempts);
    let request = policy
        .wrap(move |()| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(ConnectionError) }
        })
        .with_failure_fallback(move |failure, ()| {
            let tried = tally.load(Ordering::SeqCst);
            async move {
                println!("Couldn't reach the imaginary API but at least I tried {tried} times.");
                println!("The failure that kept happening: {failure}");
                Ok(())
            }
        });

    if let Err(error) = request.call(()).await {
        println!("call failed: {error}");
    }

    Ok(())
}
