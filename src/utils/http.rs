//! HTTP client utilities.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::utils::SessionProvider;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client (connection pool) with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with a custom user agent and request timeout
    pub fn with_user_agent(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// Opens an [`HttpClient`] pool on demand for a [`RefCounted`](crate::utils::RefCounted)
/// session.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    user_agent: String,
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, Duration::from_secs(30))
    }
}

#[async_trait]
impl SessionProvider for HttpConnector {
    type Session = HttpClient;
    type Error = reqwest::Error;

    async fn open(&self) -> Result<HttpClient, reqwest::Error> {
        debug!(user_agent = %self.user_agent, "Opening HTTP connection pool");
        HttpClient::with_user_agent(&self.user_agent, self.timeout)
    }

    async fn close(&self, session: Arc<HttpClient>) -> Result<(), reqwest::Error> {
        // Idle connections go away with the last handle to the pool.
        debug!(
            outstanding = Arc::strong_count(&session) - 1,
            "Closing HTTP connection pool"
        );
        drop(session);
        Ok(())
    }
}
