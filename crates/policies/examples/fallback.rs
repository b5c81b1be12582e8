//! Replace a failed call with a plain or a failure-aware fallback.

use resiliens::FallbackPolicy;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, thiserror::Error)]
#[error("connection refused")]
struct ConnectionError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let failure_aware = FallbackPolicy::builder()
        .fallback_with_failure(|failure: ConnectionError, foo: &'static str| async move {
            Ok(format!("Original argument: {foo} - Failure: {failure}"))
        })
        .build()?
        .wrap(|_foo| async { Err(ConnectionError) });

    let plain = FallbackPolicy::builder()
        .fallback(|foo: &'static str| async move { Ok(format!("Original argument: {foo}")) })
        .build()?
        .wrap(|_foo| async { Err::<String, _>(ConnectionError) });

    for (name, outcome) in [("some_function", failure_aware.call("bar").await), ("some_other_function", plain.call("fuzz").await)] {
        match outcome {
            Ok(message) => println!("{name}: {message}"),
            Err(error) => println!("{name} failed: {error}"),
        }
    }

    Ok(())
}
