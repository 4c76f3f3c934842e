//! Errors raised by the arXiv client.

use url::Url;

use crate::utils::{Retryable, SessionError};

/// Errors that can occur while fetching results from arXiv
#[derive(Debug, thiserror::Error)]
pub enum ArxivError {
    /// The server answered with a status other than 200 OK
    #[error("Page request resulted in HTTP {status} (try {attempt}): {url}")]
    Http { url: Url, attempt: u32, status: u16 },

    /// A continuation page came back without entries
    #[error("Page of results was unexpectedly empty (try {attempt}): {url}")]
    EmptyPage { url: Url, attempt: u32 },

    /// Connection, timeout or body transfer failure
    #[error("Request failed (try {attempt}): {url}: {source}")]
    Transport {
        url: Url,
        attempt: u32,
        #[source]
        source: reqwest::Error,
    },

    /// Results were requested without opening the client session first
    #[error("Client session is not open; call `Client::open` or `Client::scoped` first")]
    SessionNotOpen,

    /// Opening or closing the shared session failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Unknown syndication feed type
    #[error("Invalid feed type: {0} (expected RSS or ATOM)")]
    InvalidFeedType(String),

    /// Malformed endpoint URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ArxivError {
    /// Zero-based attempt index of a failed page request.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            ArxivError::Http { attempt, .. }
            | ArxivError::EmptyPage { attempt, .. }
            | ArxivError::Transport { attempt, .. } => Some(*attempt),
            _ => None,
        }
    }

    /// URL of a failed page request.
    pub fn url(&self) -> Option<&Url> {
        match self {
            ArxivError::Http { url, .. }
            | ArxivError::EmptyPage { url, .. }
            | ArxivError::Transport { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl Retryable for ArxivError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ArxivError::Http { .. } | ArxivError::EmptyPage { .. } | ArxivError::Transport { .. }
        )
    }
}

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, ArxivError>;
