//! Search and feed query models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ArxivError;

/// Largest page the query API serves, and the most entries a syndication feed lists.
pub const MAX_PAGE_SIZE: usize = 2000;

/// Upper bound on results a single feed request can produce.
pub const FEED_MAX_RESULTS: usize = 2000;

/// Sort field for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortCriterion {
    #[default]
    Relevance,
    LastUpdatedDate,
    SubmittedDate,
}

impl SortCriterion {
    /// Value of the `sortBy` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortCriterion::Relevance => "relevance",
            SortCriterion::LastUpdatedDate => "lastUpdatedDate",
            SortCriterion::SubmittedDate => "submittedDate",
        }
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "relevance" => Ok(SortCriterion::Relevance),
            "lastupdateddate" | "updated" => Ok(SortCriterion::LastUpdatedDate),
            "submitteddate" | "submitted" => Ok(SortCriterion::SubmittedDate),
            _ => Err(format!("unknown sort criterion: {}", s)),
        }
    }
}

/// Sort order for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Value of the `sortOrder` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ascending",
            SortOrder::Descending => "descending",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ascending" | "asc" => Ok(SortOrder::Ascending),
            "descending" | "desc" => Ok(SortOrder::Descending),
            _ => Err(format!("unknown sort order: {}", s)),
        }
    }
}

/// A query against the arXiv API
///
/// `query` uses the API's field-prefixed syntax (`ti:`, `au:`, `abs:`, `cat:`, `all:`),
/// `id_list` restricts results to specific papers. Either may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Search query string
    pub query: String,

    /// Paper identifiers to restrict the search to
    pub id_list: Vec<String>,

    /// Maximum number of results; `None` fetches every available result
    pub max_results: Option<usize>,

    /// Sort by field
    pub sort_by: SortCriterion,

    /// Sort order
    pub sort_order: SortOrder,
}

impl SearchQuery {
    /// Create a new search query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Look up specific papers by identifier
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().id_list(ids)
    }

    /// Set the identifier restriction
    pub fn id_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_list = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }

    /// Set sort by
    pub fn sort_by(mut self, sort: SortCriterion) -> Self {
        self.sort_by = sort;
        self
    }

    /// Set sort order
    pub fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = order;
        self
    }

    /// Query parameters shared by every page request, in request order.
    pub fn url_args(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search_query", self.query.clone()),
            ("id_list", self.id_list.join(",")),
            ("sortBy", self.sort_by.as_str().to_string()),
            ("sortOrder", self.sort_order.as_str().to_string()),
        ]
    }
}

/// Syndication feed format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeedType {
    #[default]
    Rss,
    Atom,
}

impl FeedType {
    /// Path segment the feed service uses for this format
    pub fn path_segment(&self) -> &'static str {
        match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
        }
    }
}

impl fmt::Display for FeedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedType::Rss => f.write_str("RSS"),
            FeedType::Atom => f.write_str("ATOM"),
        }
    }
}

impl FromStr for FeedType {
    type Err = ArxivError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RSS" => Ok(FeedType::Rss),
            "ATOM" => Ok(FeedType::Atom),
            _ => Err(ArxivError::InvalidFeedType(s.to_string())),
        }
    }
}

/// A request for a daily announcement feed
///
/// `name` is an archive or category (`cs`, `cs.LG`) or several joined with `+`
/// (`cs+math.AG`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedQuery {
    /// Archive or category name
    pub name: String,

    /// Feed format
    pub feed_type: FeedType,

    /// Only keep entries for these papers (version-insensitive)
    pub id_list: Vec<String>,

    /// Maximum number of results; capped at [`FEED_MAX_RESULTS`]
    pub max_results: Option<usize>,
}

impl FeedQuery {
    /// Create a new feed query
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the feed format
    pub fn feed_type(mut self, feed_type: FeedType) -> Self {
        self.feed_type = feed_type;
        self
    }

    /// Keep only the given papers
    pub fn id_list<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.id_list = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max.min(FEED_MAX_RESULTS));
        self
    }

    /// Effective result limit, never above the feed cap.
    pub fn limit(&self) -> usize {
        self.max_results
            .map_or(FEED_MAX_RESULTS, |max| max.min(FEED_MAX_RESULTS))
    }
}
