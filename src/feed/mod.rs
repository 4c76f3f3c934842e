//! Feed documents as returned by the arXiv API and RSS service.
//!
//! The query API answers with Atom documents carrying OpenSearch paging metadata
//! and `arxiv:` extension elements; the syndication service serves either RSS 2.0
//! or Atom. [`parse_feed`] reads all of them into one [`ParsedFeed`] shape with an
//! explicit, optional field per element the result models care about.

mod parser;

pub use parser::parse_feed;

use crate::models::{Author, Link};

/// A parsed feed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedFeed {
    /// Feed (or RSS channel) title.
    pub title: Option<String>,

    /// Feed-level update timestamp, as published.
    pub updated: Option<String>,

    /// `opensearch:totalResults`: size of the whole result set.
    pub total_results: Option<usize>,

    /// `opensearch:startIndex`: offset of the first entry of this page.
    pub start_index: Option<usize>,

    /// `opensearch:itemsPerPage`: requested page size.
    pub items_per_page: Option<usize>,

    /// Entries in document order.
    pub entries: Vec<RawEntry>,

    /// Set when the document was malformed; entries read before the problem are kept.
    pub bozo: Option<String>,
}

impl ParsedFeed {
    /// Whether the parser hit malformed input.
    pub fn is_bozo(&self) -> bool {
        self.bozo.is_some()
    }
}

/// One `<entry>` (Atom) or `<item>` (RSS) with every field optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    /// `<id>` or `<guid>`.
    pub id: Option<String>,
    pub title: Option<String>,
    /// `<summary>` or `<description>`.
    pub summary: Option<String>,
    /// `<published>` or `<pubDate>`.
    pub published: Option<String>,
    pub updated: Option<String>,
    /// `<author>` elements, or the comma-separated `<dc:creator>` list.
    pub authors: Vec<Author>,
    /// `term` attributes of `<category>`, or their text in RSS.
    pub categories: Vec<String>,
    pub links: Vec<Link>,
    /// `<arxiv:comment>`.
    pub comment: Option<String>,
    /// `<arxiv:journal_ref>`.
    pub journal_ref: Option<String>,
    /// `<arxiv:doi>`.
    pub doi: Option<String>,
    /// `term` of `<arxiv:primary_category>`.
    pub primary_category: Option<String>,
    /// `<arxiv:announce_type>`.
    pub announce_type: Option<String>,
}
