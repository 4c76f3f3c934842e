//! Single-page fetching: rate limiting, status checks, parsing and retries.

use reqwest::StatusCode;
use tracing::{info, warn};
use url::{ParseError, Url};

use super::Client;
use crate::error::{ArxivError, Result};
use crate::feed::{parse_feed, ParsedFeed};
use crate::models::{FeedQuery, SearchQuery};
use crate::utils::{with_retry, HttpClient};

impl Client {
    /// URL of the API page starting at `start`.
    pub fn search_url(&self, search: &SearchQuery, start: usize) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_url)?;
        url.query_pairs_mut()
            .extend_pairs(search.url_args())
            .append_pair("start", &start.to_string())
            .append_pair("max_results", &self.config.page_size.to_string());
        Ok(url)
    }

    /// URL of an announcement feed, e.g. `https://rss.arxiv.org/rss/cs.LG`.
    pub fn feed_url(&self, query: &FeedQuery) -> Result<Url> {
        let mut url = Url::parse(&self.config.feed_url)?;
        url.path_segments_mut()
            .map_err(|_| ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .push(query.feed_type.path_segment())
            .push(&query.name);
        Ok(url)
    }

    /// Fetch and parse one feed document, retrying transient failures.
    ///
    /// `first_page` tolerates an empty document; on any later page an empty
    /// document is treated as a transient failure. Requires an open session.
    pub async fn fetch(&self, url: &Url, first_page: bool) -> Result<ParsedFeed> {
        let http = self.http().await?;
        self.fetch_with_retry(&http, url, first_page).await
    }

    pub(super) async fn fetch_with_retry(
        &self,
        http: &HttpClient,
        url: &Url,
        first_page: bool,
    ) -> Result<ParsedFeed> {
        with_retry(self.config.num_retries, |attempt| {
            self.fetch_page(http, url, first_page, attempt)
        })
        .await
    }

    async fn fetch_page(
        &self,
        http: &HttpClient,
        url: &Url,
        first_page: bool,
        attempt: u32,
    ) -> Result<ParsedFeed> {
        let _permit = self.rate_limiter.acquire().await;
        info!(%url, first_page, attempt, "Requesting page");

        let response = http
            .client()
            .get(url.clone())
            .send()
            .await
            .map_err(|source| ArxivError::Transport {
                url: url.clone(),
                attempt,
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ArxivError::Http {
                url: url.clone(),
                attempt,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ArxivError::Transport {
                url: url.clone(),
                attempt,
                source,
            })?;

        let feed = parse_feed(&body);
        if feed.entries.is_empty() && !first_page {
            return Err(ArxivError::EmptyPage {
                url: url.clone(),
                attempt,
            });
        }
        if let Some(reason) = &feed.bozo {
            warn!(%url, "Bozo feed; consider handling: {}", reason);
        }

        Ok(feed)
    }
}
