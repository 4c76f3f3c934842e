//! arXiv identifier helpers.
//!
//! arXiv uses two identifier schemes: `YYMM.NNNNN` (post-2007, four or five digit
//! sequence numbers) and `archive(.subject)/YYMMNNN` (legacy). Either may carry a
//! `vN` version suffix.

use regex::Regex;
use std::sync::LazyLock;

static POST_2007_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://arxiv\.org/abs/\d{4}\.\d{4,5}(v\d+)?$").unwrap());

static LEGACY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://arxiv\.org/abs/[a-zA-Z0-9_.+-]+/\d{7}(v\d+)?$").unwrap()
});

static VERSION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v\d+$").unwrap());

/// Base URL of arXiv abstract pages.
pub const ABS_URL: &str = "https://arxiv.org/abs/";

/// Check whether `url` is an arXiv abstract URL in either identifier scheme.
pub fn validate_arxiv_url(url: &str) -> bool {
    POST_2007_URL.is_match(url) || LEGACY_URL.is_match(url)
}

/// Short identifier of an entry, e.g. `2107.05580v1` or `quant-ph/0201082v1`.
///
/// Everything after `arxiv.org/abs/` is kept; other inputs are returned as-is.
pub fn short_id(entry_id: &str) -> &str {
    match entry_id.split_once("arxiv.org/abs/") {
        Some((_, id)) => id,
        None => entry_id,
    }
}

/// Identifier with any trailing `vN` version suffix removed.
pub fn strip_version(id: &str) -> &str {
    match VERSION_SUFFIX.find(id) {
        Some(m) => &id[..m.start()],
        None => id,
    }
}

/// Whether two identifiers name the same paper, ignoring version suffixes.
pub fn same_paper(a: &str, b: &str) -> bool {
    let (a, b) = (short_id(a.trim()), short_id(b.trim()));
    a.eq_ignore_ascii_case(b) || strip_version(a).eq_ignore_ascii_case(strip_version(b))
}
