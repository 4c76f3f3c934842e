//! Core data models for arXiv queries and results.

mod query;
mod result;

pub use query::{
    FeedQuery, FeedType, SearchQuery, SortCriterion, SortOrder, FEED_MAX_RESULTS, MAX_PAGE_SIZE,
};
pub(crate) use result::feed_entry_id;
pub use result::{AnnounceType, Author, FeedResult, Link, MissingFieldError, SearchResult};
