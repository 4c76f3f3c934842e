//! arXiv API client.
//!
//! A [`Client`] owns the three pieces of shared state every request goes through:
//! the rate limiter, the retry policy from its [`ClientConfig`], and a
//! reference-counted HTTP session. Result streams borrow the client, so one client
//! can serve any number of concurrent searches.
//!
//! ```rust,no_run
//! use arxiv_fetch::{Client, SearchQuery};
//! use futures_util::TryStreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> arxiv_fetch::Result<()> {
//! let client = Client::new();
//! let query = SearchQuery::new("cat:cs.LG AND ti:transformer").max_results(20);
//!
//! let titles = client
//!     .scoped(|client| async move {
//!         client
//!             .results(&query, 0)
//!             .map_ok(|result| result.title)
//!             .try_collect::<Vec<_>>()
//!             .await
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod fetch;
mod pagination;

pub use pagination::ResultStream;

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{ArxivError, Result};
use crate::utils::{HttpClient, HttpConnector, RateLimiter, RefCounted};

/// Client for the arXiv query API and announcement feeds
pub struct Client {
    config: ClientConfig,
    rate_limiter: RateLimiter,
    session: RefCounted<HttpConnector>,
}

impl Client {
    /// Create a client with the default configuration
    pub fn new() -> Self {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client; out-of-range settings are clamped
    pub fn with_config(config: ClientConfig) -> Self {
        let config = config.normalized();
        let connector = HttpConnector::new(config.user_agent.clone(), config.timeout());

        Self {
            rate_limiter: RateLimiter::new(config.delay()),
            session: RefCounted::new(connector),
            config,
        }
    }

    /// Effective configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The limiter shared by every request of this client
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Enter the shared session, opening the connection pool for the first user.
    pub async fn open(&self) -> Result<()> {
        self.session.acquire().await?;
        Ok(())
    }

    /// Leave the shared session; the last user closes the connection pool.
    pub async fn close(&self) -> Result<()> {
        self.session.release().await?;
        Ok(())
    }

    /// Whether the session is currently open
    pub async fn is_open(&self) -> bool {
        self.session.current().await.is_some()
    }

    /// Number of users currently inside the session
    pub async fn session_users(&self) -> usize {
        self.session.refcount().await
    }

    /// Run `body` inside the session.
    ///
    /// The session is left even when `body` fails; in that case the body's error is
    /// returned and a failure to close is only logged.
    pub async fn scoped<'a, F, Fut, T>(&'a self, body: F) -> Result<T>
    where
        F: FnOnce(&'a Client) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.open().await?;
        let outcome = body(self).await;
        let closed = self.close().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(close_error)) => Err(close_error),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(close_error)) => {
                warn!("Failed to close session after error: {}", close_error);
                Err(error)
            }
        }
    }

    async fn http(&self) -> Result<Arc<HttpClient>> {
        self.session.current().await.ok_or(ArxivError::SessionNotOpen)
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Client(page_size={}, delay_seconds={}, num_retries={})",
            self.config.page_size, self.config.delay_seconds, self.config.num_retries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::SessionError;

    #[test]
    fn test_with_config_clamps() {
        let client = Client::with_config(ClientConfig {
            page_size: 10_000,
            delay_seconds: -1.0,
            ..Default::default()
        });

        assert_eq!(client.config().page_size, 2000);
        assert!(client.rate_limiter().period().is_zero());
    }

    #[test]
    fn test_with_config_accepts_huge_delay() {
        let client = Client::with_config(ClientConfig::default().delay_seconds(1e20));
        assert_eq!(client.rate_limiter().period(), std::time::Duration::MAX);
    }

    #[test]
    fn test_display() {
        let client = Client::new();
        assert_eq!(
            client.to_string(),
            "Client(page_size=100, delay_seconds=3, num_retries=3)"
        );
    }

    #[tokio::test]
    async fn test_open_close_nesting() {
        let client = Client::new();
        assert!(!client.is_open().await);

        client.open().await.unwrap();
        client.open().await.unwrap();
        assert_eq!(client.session_users().await, 2);

        client.close().await.unwrap();
        assert!(client.is_open().await);

        client.close().await.unwrap();
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn test_close_without_open() {
        let client = Client::new();
        let err = client.close().await.unwrap_err();
        assert!(matches!(err, ArxivError::Session(SessionError::UnbalancedRelease)));
    }

    #[tokio::test]
    async fn test_scoped_closes_after_error() {
        let client = Client::new();

        let result: Result<()> = client
            .scoped(|client| async move {
                assert!(client.is_open().await);
                Err(ArxivError::SessionNotOpen)
            })
            .await;

        assert!(matches!(result, Err(ArxivError::SessionNotOpen)));
        assert_eq!(client.session_users().await, 0);
    }

    #[tokio::test]
    async fn test_http_requires_open_session() {
        let client = Client::new();
        assert!(matches!(client.http().await, Err(ArxivError::SessionNotOpen)));

        client.open().await.unwrap();
        assert!(client.http().await.is_ok());
        client.close().await.unwrap();
    }
}
