//! Single-flight rate limiting for outbound API requests.
//!
//! arXiv's terms of use ask clients to make no more than one request every three
//! seconds. [`RateLimiter`] enforces a minimum interval between the *start* of one
//! request and the start of the next, across every task that shares the limiter.
//!
//! The limiter is a strict single-token bucket: the lock is held while waiting and
//! for as long as the returned [`RateLimitPermit`] lives, so concurrent callers are
//! dispatched one at a time, in the order they called [`RateLimiter::acquire`].

use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::{sleep, Instant};
use tracing::info;

/// Serializes request dispatch with a minimum delay between requests.
#[derive(Debug)]
pub struct RateLimiter {
    period: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a limiter enforcing `period` between consecutive requests.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            last_request: Mutex::new(None),
        }
    }

    /// Create a limiter from a delay in seconds.
    ///
    /// Negative and non-finite delays are treated as zero. Delays too large for a
    /// [`Duration`] saturate.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        Self::new(Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX))
    }

    /// Minimum interval between request dispatches.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait until a request may be dispatched.
    ///
    /// The returned permit keeps every other caller queued. When it is dropped,
    /// whether the guarded request succeeded, failed or was cancelled, the current
    /// time is recorded as the last request and the next caller is released.
    pub async fn acquire(&self) -> RateLimitPermit<'_> {
        let guard = self.last_request.lock().await;

        if let Some(last) = *guard {
            let elapsed = last.elapsed();
            if elapsed < self.period {
                let wait = self.period - elapsed;
                info!(seconds = wait.as_secs_f64(), "Sleeping");
                sleep(wait).await;
            }
        }

        RateLimitPermit { guard }
    }

    /// Timestamp recorded when the previous permit was released.
    pub async fn last_request(&self) -> Option<Instant> {
        *self.last_request.lock().await
    }

    /// Overwrite the recorded timestamp of the previous request.
    pub async fn set_last_request(&self, at: Option<Instant>) {
        *self.last_request.lock().await = at;
    }
}

/// Exclusive right to dispatch one request.
#[must_use = "the permit releases the rate limiter as soon as it is dropped"]
#[derive(Debug)]
pub struct RateLimitPermit<'a> {
    guard: MutexGuard<'a, Option<Instant>>,
}

impl Drop for RateLimitPermit<'_> {
    fn drop(&mut self) {
        *self.guard = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::join_all;

    #[tokio::test(start_paused = true)]
    async fn test_first_acquire_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        let start = Instant::now();

        drop(limiter.acquire().await);

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(limiter.last_request().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_acquire_waits_for_period() {
        let limiter = RateLimiter::new(Duration::from_secs(3));

        drop(limiter.acquire().await);
        let released = limiter.last_request().await.unwrap();
        drop(limiter.acquire().await);

        assert!(released.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_period_skips_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        limiter
            .set_last_request(Some(Instant::now() - Duration::from_secs(3)))
            .await;

        let start = Instant::now();
        drop(limiter.acquire().await);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_elapsed_waits_remaining() {
        let limiter = RateLimiter::new(Duration::from_secs(3));
        limiter
            .set_last_request(Some(Instant::now() - Duration::from_secs(2)))
            .await;

        let start = Instant::now();
        drop(limiter.acquire().await);
        let waited = start.elapsed();
        assert!(waited >= Duration::from_secs(1));
        assert!(waited < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_waits() {
        let limiter = RateLimiter::from_secs_f64(0.0);
        let start = Instant::now();

        for _ in 0..5 {
            drop(limiter.acquire().await);
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_negative_delay_is_clamped() {
        assert_eq!(RateLimiter::from_secs_f64(-1.5).period(), Duration::ZERO);
        assert_eq!(RateLimiter::from_secs_f64(f64::NAN).period(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_dispatches_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_secs(1));

        let dispatches = join_all((0..5).map(|_| async {
            let _permit = limiter.acquire().await;
            let dispatched = Instant::now();
            tokio::task::yield_now().await;
            dispatched
        }))
        .await;

        let mut dispatches = dispatches;
        dispatches.sort();
        for pair in dispatches.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timestamp_recorded_when_guarded_work_fails() {
        let limiter = RateLimiter::new(Duration::from_secs(3));

        let result: Result<(), &str> = async {
            let _permit = limiter.acquire().await;
            Err("request failed")
        }
        .await;

        assert!(result.is_err());
        assert!(limiter.last_request().await.is_some());
    }
}
