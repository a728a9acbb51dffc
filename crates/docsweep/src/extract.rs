//! URL extraction from markdown
//!
//! Recognizes markdown links `[text](url)` and bare `http(s)://` tokens.
//! Pure text operation: no network access, never fails.

use regex::Regex;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

/// `[text](url)` or `[text](url "title")`, http(s) targets only
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[[^\]]*\]\(\s*<?(https?://[^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#)
        .expect("valid regex")
});

/// Bare URL, terminated by whitespace, `)`, `]` or angle brackets
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)\]<>]+").expect("valid regex"));

/// Punctuation that prose attaches to a bare URL
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', '*', '`'];

/// Extract the set of unique absolute URLs referenced in `markdown`
///
/// A URL that appears several times, or in both link and bare form,
/// appears once in the result.
pub fn extract_urls(markdown: &str) -> BTreeSet<String> {
    let mut urls = BTreeSet::new();
    let mut link_spans: Vec<Range<usize>> = Vec::new();

    for caps in MARKDOWN_LINK.captures_iter(markdown) {
        if let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) {
            link_spans.push(whole.range());
            urls.insert(target.as_str().to_string());
        }
    }

    for m in BARE_URL.find_iter(markdown) {
        // Already captured as the target of a markdown link
        if link_spans.iter().any(|span| span.contains(&m.start())) {
            continue;
        }
        let url = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
        if has_host(url) {
            urls.insert(url.to_string());
        }
    }

    urls
}

/// Reject scheme-only leftovers such as `https://` followed by punctuation
fn has_host(url: &str) -> bool {
    url.split_once("://")
        .map(|(_, rest)| !rest.is_empty())
        .unwrap_or(false)
}
