//! Timeout wrappers for async operations.

use orbis_core::{OrbisError, OrbisResult};
use std::future::Future;
use std::time::Duration;

/// Wraps an async operation with a timeout.
pub async fn with_timeout<F, Fut, T>(duration: Duration, f: F) -> OrbisResult<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = OrbisResult<T>>,
{
    tokio::time::timeout(duration, f())
        .await
        .map_err(|_| OrbisError::Timeout(format!("Operation timed out after {:?}", duration)))?
}

/// Bounds `fut` by `duration`, building the error with `on_elapsed` when it
/// does not finish in time.
///
/// Lets layers with their own error type (such as the cache store) keep it
/// instead of going through [`OrbisError`].
pub async fn with_timeout_or<Fut, T, E, G>(duration: Duration, fut: Fut, on_elapsed: G) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    G: FnOnce(Duration) -> E,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_elapsed(duration)),
    }
}
