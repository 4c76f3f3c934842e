//! Result models built from parsed feed entries.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

use crate::feed::RawEntry;
use crate::utils::{short_id, ABS_URL};

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Title used when an entry carries none.
const MISSING_TITLE: &str = "0";

/// A required field was absent from a feed entry; the entry is skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Entry is missing required field: {field}")]
pub struct MissingFieldError {
    pub field: &'static str,
}

impl MissingFieldError {
    fn new(field: &'static str) -> Self {
        Self { field }
    }
}

/// A paper author
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            affiliation: None,
        }
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A link attached to a paper (abstract page, PDF, DOI resolver)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            ..Default::default()
        }
    }

    fn is_pdf(&self) -> bool {
        self.title.as_deref() == Some("pdf")
            || self.content_type.as_deref() == Some("application/pdf")
    }
}

/// A paper returned by the query API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Abstract page URL, e.g. `http://arxiv.org/abs/2107.05580v1`
    pub entry_id: String,

    /// When the latest version was submitted
    pub updated: Option<DateTime<Utc>>,

    /// When the first version was submitted
    pub published: Option<DateTime<Utc>>,

    pub title: String,

    pub authors: Vec<Author>,

    /// Abstract text
    pub summary: String,

    /// Author comment (page counts, conference, ...)
    pub comment: Option<String>,

    pub journal_ref: Option<String>,

    pub doi: Option<String>,

    pub primary_category: Option<String>,

    pub categories: Vec<String>,

    pub links: Vec<Link>,
}

impl SearchResult {
    /// Build a result from a parsed entry; entries without an id are rejected.
    pub fn from_entry(entry: RawEntry) -> Result<Self, MissingFieldError> {
        let entry_id = entry.id.ok_or(MissingFieldError::new("id"))?;
        let title = entry_title(entry.title, &entry_id);

        Ok(Self {
            updated: entry.updated.as_deref().and_then(parse_date),
            published: entry.published.as_deref().and_then(parse_date),
            title,
            authors: entry.authors,
            summary: entry.summary.unwrap_or_default(),
            comment: entry.comment,
            journal_ref: entry.journal_ref,
            doi: entry.doi,
            primary_category: entry.primary_category,
            categories: entry.categories,
            links: entry.links,
            entry_id,
        })
    }

    /// Short identifier, e.g. `2107.05580v1` or `quant-ph/0201082v1`
    pub fn short_id(&self) -> &str {
        short_id(&self.entry_id)
    }

    /// URL of the PDF, when the entry links one
    pub fn pdf_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.is_pdf())
            .map(|l| l.href.as_str())
    }
}

impl TryFrom<RawEntry> for SearchResult {
    type Error = MissingFieldError;

    fn try_from(entry: RawEntry) -> Result<Self, Self::Error> {
        Self::from_entry(entry)
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.short_id(), self.title)
    }
}

/// How a paper entered a daily announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnounceType {
    /// First announcement
    New,
    /// New version of an earlier paper
    Replace,
    /// Cross-listed from another category
    Cross,
    /// New version of a cross-listed paper
    ReplaceCross,
}

impl AnnounceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnounceType::New => "new",
            AnnounceType::Replace => "replace",
            AnnounceType::Cross => "cross",
            AnnounceType::ReplaceCross => "replace-cross",
        }
    }
}

impl fmt::Display for AnnounceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnounceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(AnnounceType::New),
            "replace" => Ok(AnnounceType::Replace),
            "cross" => Ok(AnnounceType::Cross),
            "replace-cross" => Ok(AnnounceType::ReplaceCross),
            other => Err(format!("unknown announce type: {}", other)),
        }
    }
}

/// A paper listed in a daily announcement feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedResult {
    /// Abstract page URL, e.g. `https://arxiv.org/abs/2401.00001v1`
    pub entry_id: String,

    /// Announcement date
    pub feed_date: Option<DateTime<Utc>>,

    pub title: String,

    pub authors: Vec<Author>,

    /// Abstract text without the announcement preamble
    pub summary: String,

    pub announce_type: Option<AnnounceType>,

    pub journal_ref: Option<String>,

    pub doi: Option<String>,

    pub categories: Vec<String>,

    pub links: Vec<Link>,
}

impl FeedResult {
    /// Build a result from a feed item; items whose paper id cannot be found are rejected.
    pub fn from_entry(entry: RawEntry) -> Result<Self, MissingFieldError> {
        let id = feed_entry_id(&entry).ok_or(MissingFieldError::new("id"))?;
        let entry_id = format!("{}{}", ABS_URL, id);
        let raw_summary = entry.summary.unwrap_or_default();

        let announce_type = entry
            .announce_type
            .as_deref()
            .or_else(|| announce_type_from_summary(&raw_summary))
            .and_then(|value| match value.parse() {
                Ok(kind) => Some(kind),
                Err(err) => {
                    warn!(entry_id = %entry_id, "Ignoring {}", err);
                    None
                }
            });

        let summary = match raw_summary.split_once("Abstract:") {
            Some((_, abstract_text)) => abstract_text.trim().to_string(),
            None => raw_summary.trim().to_string(),
        };

        Ok(Self {
            feed_date: entry
                .published
                .as_deref()
                .or(entry.updated.as_deref())
                .and_then(parse_date),
            title: entry_title(entry.title, &entry_id),
            authors: entry.authors,
            summary,
            announce_type,
            journal_ref: entry.journal_ref,
            doi: entry.doi,
            categories: entry.categories,
            links: entry.links,
            entry_id,
        })
    }

    /// Short identifier, e.g. `2401.00001v1`
    pub fn short_id(&self) -> &str {
        short_id(&self.entry_id)
    }
}

impl TryFrom<RawEntry> for FeedResult {
    type Error = MissingFieldError;

    fn try_from(entry: RawEntry) -> Result<Self, Self::Error> {
        Self::from_entry(entry)
    }
}

impl fmt::Display for FeedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.announce_type {
            Some(kind) => write!(f, "{} [{}]: {}", self.short_id(), kind, self.title),
            None => write!(f, "{}: {}", self.short_id(), self.title),
        }
    }
}

/// Paper identifier of a feed item.
///
/// Announcement summaries open with `arXiv:<id>`; otherwise the OAI guid or an
/// abstract link is used.
pub(crate) fn feed_entry_id(entry: &RawEntry) -> Option<String> {
    let from_summary = entry
        .summary
        .as_deref()
        .and_then(|s| s.split_whitespace().next())
        .and_then(|token| {
            token
                .get(..6)
                .filter(|prefix| prefix.eq_ignore_ascii_case("arxiv:"))
                .map(|_| token[6..].trim())
        })
        .filter(|id| !id.is_empty());

    let from_guid = || {
        entry
            .id
            .as_deref()
            .and_then(|id| id.split_once("oai:arXiv.org:"))
            .map(|(_, id)| id)
    };

    let from_link = || {
        entry
            .links
            .iter()
            .find(|l| l.href.contains("arxiv.org/abs/"))
            .map(|l| short_id(&l.href))
    };

    from_summary
        .or_else(from_guid)
        .or_else(from_link)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn announce_type_from_summary(summary: &str) -> Option<&str> {
    let (_, rest) = summary.split_once("Announce Type:")?;
    rest.split_whitespace().next()
}

fn entry_title(title: Option<String>, entry_id: &str) -> String {
    match title {
        Some(title) => collapse_whitespace(&title),
        None => {
            warn!(entry_id, "Result has no title");
            MISSING_TITLE.to_string()
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|date| date.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn search_entry() -> RawEntry {
        RawEntry {
            id: Some("http://arxiv.org/abs/2107.05580v1".to_string()),
            title: Some("Quantum   many-body\n  physics".to_string()),
            summary: Some("Abstract text.".to_string()),
            published: Some("2021-07-12T17:54:10Z".to_string()),
            updated: Some("2021-07-13T09:00:00-04:00".to_string()),
            authors: vec![Author::new("Jane Doe")],
            categories: vec!["quant-ph".to_string()],
            links: vec![
                Link::new("http://arxiv.org/abs/2107.05580v1"),
                Link {
                    href: "http://arxiv.org/pdf/2107.05580v1".to_string(),
                    title: Some("pdf".to_string()),
                    rel: Some("related".to_string()),
                    content_type: Some("application/pdf".to_string()),
                },
            ],
            primary_category: Some("quant-ph".to_string()),
            ..Default::default()
        }
    }

    fn feed_entry() -> RawEntry {
        RawEntry {
            id: Some("oai:arXiv.org:2401.00001v1".to_string()),
            title: Some("Learning Things".to_string()),
            summary: Some(
                "arXiv:2401.00001v1 Announce Type: new \nAbstract: We learn things.".to_string(),
            ),
            published: Some("Tue, 02 Jan 2024 00:00:00 -0500".to_string()),
            announce_type: Some("new".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_search_result_from_entry() {
        let result = SearchResult::from_entry(search_entry()).unwrap();

        assert_eq!(result.short_id(), "2107.05580v1");
        assert_eq!(result.title, "Quantum many-body physics");
        assert_eq!(result.pdf_url(), Some("http://arxiv.org/pdf/2107.05580v1"));
        assert_eq!(result.primary_category.as_deref(), Some("quant-ph"));

        let published = result.published.unwrap();
        assert_eq!((published.year(), published.month(), published.day()), (2021, 7, 12));
        assert_eq!(result.updated.unwrap().hour(), 13);
    }

    #[test]
    fn test_search_result_requires_id() {
        let entry = RawEntry {
            id: None,
            ..search_entry()
        };

        let err = SearchResult::try_from(entry).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_missing_title_and_bad_dates_are_tolerated() {
        let entry = RawEntry {
            title: None,
            published: Some("yesterday".to_string()),
            ..search_entry()
        };

        let result = SearchResult::from_entry(entry).unwrap();
        assert_eq!(result.title, "0");
        assert!(result.published.is_none());
    }

    #[test]
    fn test_feed_result_from_entry() {
        let result = FeedResult::from_entry(feed_entry()).unwrap();

        assert_eq!(result.entry_id, "https://arxiv.org/abs/2401.00001v1");
        assert_eq!(result.summary, "We learn things.");
        assert_eq!(result.announce_type, Some(AnnounceType::New));
        assert_eq!(result.feed_date.unwrap().hour(), 5);
    }

    #[test]
    fn test_feed_result_id_fallbacks() {
        let from_guid = RawEntry {
            summary: Some("Plain description".to_string()),
            ..feed_entry()
        };
        assert_eq!(feed_entry_id(&from_guid).as_deref(), Some("2401.00001v1"));

        let bare_prefix = RawEntry {
            summary: Some("arXiv: Announce Type: new".to_string()),
            ..feed_entry()
        };
        assert_eq!(feed_entry_id(&bare_prefix).as_deref(), Some("2401.00001v1"));

        let from_link = RawEntry {
            id: None,
            summary: None,
            links: vec![Link::new("https://arxiv.org/abs/2401.00002")],
            ..feed_entry()
        };
        assert_eq!(feed_entry_id(&from_link).as_deref(), Some("2401.00002"));

        let nothing = RawEntry {
            id: Some("tag:example.com,2024:1".to_string()),
            summary: None,
            ..feed_entry()
        };
        assert_eq!(FeedResult::from_entry(nothing).unwrap_err().field, "id");
    }

    #[test]
    fn test_announce_type_from_summary_and_unknown_values() {
        let from_summary = RawEntry {
            announce_type: None,
            summary: Some("arXiv:2401.00003v2 Announce Type: replace-cross \nAbstract: x".into()),
            ..feed_entry()
        };
        assert_eq!(
            FeedResult::from_entry(from_summary).unwrap().announce_type,
            Some(AnnounceType::ReplaceCross)
        );

        let unknown = RawEntry {
            announce_type: Some("withdrawn".to_string()),
            ..feed_entry()
        };
        assert_eq!(FeedResult::from_entry(unknown).unwrap().announce_type, None);
    }

    #[test]
    fn test_announce_type_serializes_kebab_case() {
        let json = serde_json::to_string(&AnnounceType::ReplaceCross).unwrap();
        assert_eq!(json, "\"replace-cross\"");
    }
}
