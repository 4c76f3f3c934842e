//! Bounded retry for idempotent page fetches.
//!
//! Retries are an explicit loop with an attempt counter, so stack depth does not grow
//! with the retry count. There is no backoff here: every attempt goes back through
//! the client's [`RateLimiter`](crate::utils::RateLimiter), which already spaces
//! requests by the configured delay.

use std::fmt::Display;
use std::future::Future;

/// Errors that can tell whether the failed operation is worth repeating.
pub trait Retryable {
    /// `true` for transient failures (bad status, empty page, transport error).
    fn is_retryable(&self) -> bool;
}

/// Execute an async operation, retrying transient failures.
///
/// `operation` receives the zero-based attempt index. A retryable error is retried
/// while the attempt index is below `max_retries`; after that, or for any
/// non-retryable error, the error of the last attempt is returned unchanged. A
/// persistently failing operation therefore runs `max_retries + 1` times.
pub async fn with_retry<T, E, F, Fut>(max_retries: u32, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} transient failures",
                        attempt + 1,
                        attempt
                    );
                }
                return Ok(value);
            }
            Err(error) if error.is_retryable() && attempt < max_retries => {
                tracing::debug!("Got error (try {}): {}", attempt, error);
                attempt += 1;
            }
            Err(error) => {
                if error.is_retryable() {
                    tracing::debug!("Giving up (try {}): {}", attempt, error);
                }
                return Err(error);
            }
        }
    }
}
