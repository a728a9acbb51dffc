//! Markdown link removal
//!
//! For every URL marked for removal, a line holding nothing but that link
//! (optionally as a list item) is deleted together with its line break.
//! Any other `[text](url)` occurrence is unwrapped to `text`. Link text
//! may wrap across lines, the same as in URL extraction. Rules are
//! reapplied until the text stops changing, so nested links to a removed
//! URL come out fully unwrapped.

use regex::{Captures, Regex};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Remove or unwrap every markdown link pointing at one of `urls`
///
/// Text outside the matched links is preserved byte for byte. Bare URLs
/// are left in place.
pub fn remove_links<I, S>(markdown: &str, urls: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cleaned = markdown.to_string();
    for url in urls {
        let url = url.as_ref();
        if url.is_empty() {
            continue;
        }
        match LinkPatterns::for_url(url) {
            Ok(patterns) => cleaned = patterns.apply(&cleaned),
            Err(e) => warn!(url = %url, error = %e, "Skipping URL with unusable pattern"),
        }
    }
    cleaned
}

/// Compiled rewrite rules for one URL
struct LinkPatterns {
    standalone_line: Regex,
    inline_link: Regex,
}

impl LinkPatterns {
    fn for_url(url: &str) -> Result<Self, regex::Error> {
        let target = format!(
            r#"\([ \t]*<?{}>?(?:[ \t]+"[^"\n]*")?[ \t]*\)"#,
            regex::escape(url)
        );
        let standalone_line = Regex::new(&format!(
            r"(?m)^[ \t]*(?:[-*+][ \t]+|\d+[.)][ \t]+)?!?\[[^\]]*\]{}[ \t]*(?:\r?\n|$)",
            target
        ))?;
        let inline_link = Regex::new(&format!(r"!?\[([^\]]*)\]{}", target))?;
        Ok(Self {
            standalone_line,
            inline_link,
        })
    }

    fn apply(&self, markdown: &str) -> String {
        let mut current = markdown.to_string();
        // Every rewrite shortens the text, so this terminates
        while let Some(next) = self.apply_once(&current) {
            current = next;
        }
        if current.len() != markdown.len() {
            debug!(
                before = markdown.len(),
                after = current.len(),
                "Rewrote links"
            );
        }
        current
    }

    fn apply_once(&self, markdown: &str) -> Option<String> {
        let without_lines = self.standalone_line.replace_all(markdown, "");
        let unwrapped = self
            .inline_link
            .replace_all(&without_lines, |caps: &Captures| caps[1].to_string());

        if matches!(without_lines, Cow::Borrowed(_)) && matches!(unwrapped, Cow::Borrowed(_)) {
            return None;
        }
        Some(unwrapped.into_owned())
    }
}
