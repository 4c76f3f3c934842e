//! # arxiv-fetch
//!
//! An async client for the arXiv query API and its daily announcement feeds.
//!
//! Results are produced as lazy streams: pages are fetched only as the caller
//! consumes them, every request goes through one shared rate limiter (arXiv asks for
//! at least three seconds between requests), and failed page requests are retried a
//! bounded number of times.
//!
//! ## Architecture
//!
//! - [`client`]: the [`Client`], its session lifecycle and result streams
//! - [`models`]: queries ([`SearchQuery`], [`FeedQuery`]) and results
//! - [`feed`]: Atom/RSS document parsing
//! - [`utils`]: rate limiter, retry loop, reference-counted sessions, HTTP pool
//! - [`config`]: configuration file and environment handling
//! - [`error`]: the [`ArxivError`] type

pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use client::{Client, ResultStream};
pub use config::ClientConfig;
pub use error::{ArxivError, Result};
pub use feed::{parse_feed, ParsedFeed};
pub use models::{
    AnnounceType, Author, FeedQuery, FeedResult, FeedType, Link, SearchQuery, SearchResult,
    SortCriterion, SortOrder,
};
pub use utils::{RateLimiter, RefCounted, SessionProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
