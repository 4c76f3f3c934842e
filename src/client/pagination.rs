//! Lazy result streams over paginated searches and announcement feeds.

use async_stream::try_stream;
use futures_util::stream::{BoxStream, StreamExt};
use std::collections::HashSet;
use tracing::{info, warn};

use super::Client;
use crate::error::ArxivError;
use crate::feed::RawEntry;
use crate::models::{feed_entry_id, FeedQuery, FeedResult, SearchQuery, SearchResult};
use crate::utils::{same_paper, strip_version, Bounded};

/// Lazily fetched results; each poll may trigger (at most) one page request.
///
/// Dropping the stream stops all further requests.
pub type ResultStream<'a, T> = BoxStream<'a, Result<T, ArxivError>>;

impl Client {
    /// Stream the results of `search`, skipping the first `offset` of them.
    ///
    /// Pages of `page_size` results are requested only as the stream is consumed.
    /// At most `max_results - offset` results are produced; with
    /// `offset >= max_results` the stream is empty and no request is made.
    ///
    /// The session must be open (see [`Client::open`]); otherwise the first item is
    /// [`ArxivError::SessionNotOpen`].
    pub fn results<'a>(&'a self, search: &'a SearchQuery, offset: usize) -> ResultStream<'a, SearchResult> {
        let limit = search.max_results.map(|max| max.saturating_sub(offset));
        Bounded::new(self.search_pages(search, offset, limit), limit).boxed()
    }

    /// Stream the entries of an announcement feed, skipping the first `offset`.
    ///
    /// The feed is requested once, on first poll. When the query carries an
    /// `id_list`, only those papers are kept (in feed order, each once) before the
    /// `offset` and limit are applied.
    pub fn feed_results<'a>(&'a self, query: &'a FeedQuery, offset: usize) -> ResultStream<'a, FeedResult> {
        let limit = query.limit().saturating_sub(offset);
        Bounded::new(self.feed_entries(query, offset, limit), Some(limit)).boxed()
    }

    fn search_pages<'a>(
        &'a self,
        search: &'a SearchQuery,
        offset: usize,
        limit: Option<usize>,
    ) -> ResultStream<'a, SearchResult> {
        try_stream! {
            let http = self.http().await?;
            let page_size = self.config.page_size;
            let mut remaining = limit;
            let mut current = offset;

            'pages: loop {
                let first_page = current == offset;
                let url = self.search_url(search, current)?;
                let feed = self.fetch_with_retry(&http, &url, first_page).await?;

                let page_len = feed.entries.len();
                if page_len == 0 {
                    info!("Got empty first page; stopping generation");
                    break;
                }
                if first_page {
                    info!(
                        "Got first page: {} of {} total results",
                        page_len,
                        feed.total_results.map_or_else(|| "?".to_string(), |t| t.to_string())
                    );
                } else {
                    info!("Got page: {} results at offset {}", page_len, current);
                }

                for entry in feed.entries {
                    match SearchResult::from_entry(entry) {
                        Ok(result) => {
                            yield result;
                            if let Some(left) = remaining.as_mut() {
                                *left -= 1;
                                if *left == 0 {
                                    break 'pages;
                                }
                            }
                        }
                        Err(err) => warn!("Skipping partial result: {}", err),
                    }
                }

                current += page_len;
                match feed.total_results {
                    Some(total) if current >= total => break,
                    None if page_len < page_size => break,
                    _ => {}
                }
            }
        }
        .boxed()
    }

    fn feed_entries<'a>(
        &'a self,
        query: &'a FeedQuery,
        offset: usize,
        limit: usize,
    ) -> ResultStream<'a, FeedResult> {
        try_stream! {
            if limit > 0 {
                let http = self.http().await?;
                let url = self.feed_url(query)?;
                let feed = self.fetch_with_retry(&http, &url, true).await?;

                if feed.entries.is_empty() {
                    info!("Got empty feed; stopping generation");
                } else {
                    info!("Got feed: {} entries", feed.entries.len());
                }

                let mut filter = IdFilter::new(&query.id_list);
                let window = feed
                    .entries
                    .into_iter()
                    .filter(|entry| filter.admits(entry))
                    .skip(offset)
                    .take(limit);

                for entry in window {
                    match FeedResult::from_entry(entry) {
                        Ok(result) => yield result,
                        Err(err) => warn!("Skipping partial result: {}", err),
                    }
                }
            }
        }
        .boxed()
    }
}

/// Keeps feed entries for the requested papers, each paper once.
struct IdFilter<'q> {
    wanted: &'q [String],
    seen: HashSet<String>,
}

impl<'q> IdFilter<'q> {
    fn new(wanted: &'q [String]) -> Self {
        Self {
            wanted,
            seen: HashSet::new(),
        }
    }

    fn admits(&mut self, entry: &RawEntry) -> bool {
        if self.wanted.is_empty() {
            return true;
        }
        let Some(id) = feed_entry_id(entry) else {
            return false;
        };
        if !self.wanted.iter().any(|wanted| same_paper(wanted, &id)) {
            return false;
        }
        self.seen.insert(strip_version(&id).to_ascii_lowercase())
    }
}
