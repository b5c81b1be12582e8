//! Route calls to a failure-aware fallback once the circuit opens.

use resiliens::CircuitBreaker;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, thiserror::Error)]
#[error("connection refused")]
struct ConnectionError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let breaker = CircuitBreaker::<ConnectionError>::builder()
        .failure_threshold(5)
        .build()?;

    let request = breaker
        .wrap(|_foo: &'static str| async { Err::<(), _>(ConnectionError) })
        .with_failure_fallback(|failure: Option<ConnectionError>, foo| async move {
            match failure {
                Some(failure) => println!("A call with foo={foo} was refused after: {failure}"),
                None => println!("A call with foo={foo} was refused"),
            }
            Ok(())
        });

    for _ in 0..10 {
        match request.call("bar").await {
            Ok(()) => {}
            Err(error) => println!("call failed: {error}"),
        }
    }

    println!("{} is {}", breaker.name(), breaker.status());

    Ok(())
}
