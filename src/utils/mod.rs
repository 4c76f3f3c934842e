//! Utility modules supporting the arXiv client.
//!
//! - [`HttpClient`]: pooled HTTP client with the crate's user agent
//! - [`HttpConnector`]: opens an [`HttpClient`] for a shared [`RefCounted`] session
//! - [`RateLimiter`]: single-flight limiter enforcing a minimum delay between requests
//! - [`RefCounted`]: reference-counted session shared by concurrent users
//! - [`with_retry`]: bounded retry of transient failures
//! - [`Bounded`]: stream adapter enforcing a caller-facing item limit
//! - [`validate_arxiv_url`], [`short_id`]: arXiv identifier helpers
//!
//! # Rate limiting
//!
//! ```rust,no_run
//! use arxiv_fetch::utils::RateLimiter;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let limiter = RateLimiter::from_secs_f64(3.0);
//! {
//!     let _permit = limiter.acquire().await;
//!     // dispatch one request here
//! }
//! // the next acquire waits until three seconds after the permit was dropped
//! let _permit = limiter.acquire().await;
//! # }
//! ```

mod http;
mod rate_limit;
mod refcount;
mod retry;
mod streaming;
mod validate;

pub use http::{HttpClient, HttpConnector, DEFAULT_USER_AGENT};
pub use rate_limit::{RateLimitPermit, RateLimiter};
pub use refcount::{RefCounted, SessionError, SessionProvider};
pub use retry::{with_retry, Retryable};
pub use streaming::Bounded;
pub use validate::{same_paper, short_id, strip_version, validate_arxiv_url, ABS_URL};
