//! Open a circuit after five failures and count how often the operation ran.
//!
//! Run with `RUST_LOG=resiliens=debug cargo run --example circuit_breaker`.

use resiliens::CircuitBreaker;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, thiserror::Error)]
#[error("connection refused")]
struct ConnectionError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let calls = Arc::new(AtomicU32::new(0));
    let breaker = CircuitBreaker::<ConnectionError>::builder()
        .name("imaginary-api")
        .failure_threshold(5)
        .build()?;

    let counter = Arc::clone(&calls);
    let request = breaker.wrap(move |()| {
        counter.fetch_add(1, Ordering::SeqCst);
        // Pretend this is a network request
        async { Err::<(), _>(ConnectionError) }
    });

    for _ in 0..10 {
        if let Err(error) = request.call(()).await {
            println!("{error}");
        }
    }

    println!("The underlying operation ran {} times", calls.load(Ordering::SeqCst));

    Ok(())
}
