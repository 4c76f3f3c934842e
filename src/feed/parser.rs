//! Event-driven Atom/RSS reader.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{ParsedFeed, RawEntry};
use crate::models::{Author, Link};

/// Parse a feed document.
///
/// Never fails: a document that stops being well-formed midway keeps the entries
/// read so far and reports the problem in [`ParsedFeed::bozo`].
pub fn parse_feed(bytes: &[u8]) -> ParsedFeed {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut builder = FeedBuilder::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => builder.start(&e),
            Ok(Event::Empty(e)) => {
                builder.start(&e);
                builder.end();
            }
            Ok(Event::Text(e)) => match e.unescape() {
                Ok(text) => builder.text(&text),
                Err(err) => {
                    builder.mark_bozo(format!("undecodable text: {}", err));
                    builder.text(&String::from_utf8_lossy(&e));
                }
            },
            Ok(Event::CData(e)) => builder.text(&String::from_utf8_lossy(&e)),
            Ok(Event::End(_)) => builder.end(),
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                builder.mark_bozo(format!(
                    "{} at position {}",
                    err,
                    reader.buffer_position()
                ));
                break;
            }
        }
        buf.clear();
    }

    builder.finish()
}

#[derive(Debug, Default)]
struct FeedBuilder {
    feed: ParsedFeed,
    saw_root: bool,
    /// Local names of the currently open elements.
    stack: Vec<String>,
    entry: Option<RawEntry>,
    author: Option<Author>,
    text: String,
}

impl FeedBuilder {
    fn start(&mut self, e: &BytesStart<'_>) {
        let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();

        if self.stack.is_empty() && matches!(name.as_str(), "feed" | "rss" | "RDF") {
            self.saw_root = true;
        }

        match name.as_str() {
            "entry" | "item" => self.entry = Some(RawEntry::default()),
            "author" if self.entry.is_some() => self.author = Some(Author::default()),
            "link" => {
                if let (Some(entry), Some(href)) = (self.entry.as_mut(), attr(e, b"href")) {
                    entry.links.push(Link {
                        href,
                        title: attr(e, b"title"),
                        rel: attr(e, b"rel"),
                        content_type: attr(e, b"type"),
                    });
                }
            }
            "category" => {
                if let (Some(entry), Some(term)) = (self.entry.as_mut(), attr(e, b"term")) {
                    entry.categories.push(term);
                }
            }
            "primary_category" => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.primary_category = attr(e, b"term");
                }
            }
            _ => {}
        }

        self.stack.push(name);
        self.text.clear();
    }

    fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn end(&mut self) {
        let Some(name) = self.stack.pop() else {
            return;
        };
        let text = std::mem::take(&mut self.text).trim().to_string();

        if self.entry.is_some() {
            self.end_in_entry(&name, text);
        } else {
            self.end_in_feed(&name, text);
        }
    }

    fn end_in_entry(&mut self, name: &str, text: String) {
        if let Some(author) = self.author.as_mut() {
            match name {
                "name" => author.name = text,
                "affiliation" => author.affiliation = Some(text).filter(|a| !a.is_empty()),
                "author" => {
                    if author.name.is_empty() {
                        author.name = text;
                    }
                    let author = self.author.take().unwrap_or_default();
                    if let Some(entry) = self.entry.as_mut() {
                        if !author.name.is_empty() {
                            entry.authors.push(author);
                        }
                    }
                }
                _ => {}
            }
            return;
        }

        if matches!(name, "entry" | "item") {
            if let Some(entry) = self.entry.take() {
                self.feed.entries.push(entry);
            }
            return;
        }

        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        let value = Some(text.clone()).filter(|t| !t.is_empty());
        match name {
            "id" | "guid" => entry.id = value,
            "title" => entry.title = value,
            "summary" | "description" => entry.summary = value,
            "published" | "pubDate" => entry.published = value,
            "updated" => entry.updated = value,
            "creator" => entry.authors.extend(
                text.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(Author::new),
            ),
            "category" if value.is_some() => entry.categories.push(text),
            "link" if value.is_some() && entry.links.iter().all(|l| l.href != text) => {
                entry.links.push(Link {
                    href: text,
                    title: None,
                    rel: Some("alternate".to_string()),
                    content_type: None,
                })
            }
            "comment" => entry.comment = value,
            "journal_ref" => entry.journal_ref = value,
            "doi" => entry.doi = value,
            "announce_type" => entry.announce_type = value,
            _ => {}
        }
    }

    fn end_in_feed(&mut self, name: &str, text: String) {
        match name {
            "totalResults" => self.feed.total_results = text.parse().ok(),
            "startIndex" => self.feed.start_index = text.parse().ok(),
            "itemsPerPage" => self.feed.items_per_page = text.parse().ok(),
            "title" if self.feed.title.is_none() && !text.is_empty() => {
                self.feed.title = Some(text)
            }
            "updated" | "lastBuildDate" | "pubDate"
                if self.feed.updated.is_none() && !text.is_empty() =>
            {
                self.feed.updated = Some(text)
            }
            _ => {}
        }
    }

    fn mark_bozo(&mut self, reason: String) {
        if self.feed.bozo.is_none() {
            self.feed.bozo = Some(reason);
        }
    }

    fn finish(mut self) -> ParsedFeed {
        // Keep whatever an interrupted document managed to describe.
        if let Some(entry) = self.entry.take() {
            if self.feed.bozo.is_some() {
                self.feed.entries.push(entry);
            }
        }
        if !self.saw_root {
            self.mark_bozo("document has no feed or rss root element".to_string());
        }
        self.feed
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}
