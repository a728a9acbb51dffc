//! Section classification for URLs
//!
//! Locates the line that references a URL, walks back to the nearest
//! heading and maps the heading text to a [`SectionType`].

use crate::types::{SectionType, UrlContext};

/// Section name used when no heading can be found
pub const UNKNOWN_SECTION: &str = "Unknown";

/// Lines of context kept on each side of the URL's line
const CONTEXT_LINES: usize = 5;

/// Heading keywords per section type, in precedence order
const SECTION_KEYWORDS: &[(SectionType, &[&str])] = &[
    (
        SectionType::ProductInfo,
        &[
            "intro",
            "overview",
            "about",
            "service info",
            "common use",
            "compatibility",
        ],
    ),
    (
        SectionType::Setup,
        &[
            "setup",
            "configuration",
            "install",
            "set up",
            "vendor set up",
            "kibana set up",
        ],
    ),
    (
        SectionType::Documentation,
        &[
            "documentation",
            "reference",
            "resources",
            "documentation sites",
        ],
    ),
    (
        SectionType::Troubleshooting,
        &["troubleshoot", "error", "issue"],
    ),
];

/// Classify the section `url` appears in within `markdown`
///
/// A URL that does not occur verbatim yields an `Unknown`/`Other`
/// context with a diagnostic instead of an error.
pub fn classify(markdown: &str, url: &str) -> UrlContext {
    let lines: Vec<&str> = markdown.split('\n').collect();

    let Some(url_line) = lines.iter().position(|line| line.contains(url)) else {
        tracing::debug!(url = %url, "URL not found verbatim in document");
        return UrlContext {
            url: url.to_string(),
            section: UNKNOWN_SECTION.to_string(),
            section_type: SectionType::Other,
            surrounding_text: "URL not found in content".to_string(),
        };
    };

    let section = lines[..=url_line]
        .iter()
        .rev()
        .map(|line| line.trim())
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .unwrap_or_else(|| UNKNOWN_SECTION.to_string());

    let start = url_line.saturating_sub(CONTEXT_LINES);
    let end = (url_line + CONTEXT_LINES + 1).min(lines.len());

    UrlContext {
        url: url.to_string(),
        section_type: section_type_for(&section),
        section,
        surrounding_text: lines[start..end].join("\n"),
    }
}

/// Map heading text to a section type; first matching category wins
pub fn section_type_for(heading: &str) -> SectionType {
    let heading = heading.to_lowercase();
    SECTION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| heading.contains(k)))
        .map(|(section_type, _)| *section_type)
        .unwrap_or(SectionType::Other)
}
