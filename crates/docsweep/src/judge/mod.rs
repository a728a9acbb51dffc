//! LLM judgment of link relevance
//!
//! The [`Judge`] trait abstracts the model call. Prompt construction and
//! answer parsing live here so they can be tested without a model.

mod gemini;

pub use gemini::GeminiJudge;

use crate::convert::preview;
use crate::error::JudgeError;
use crate::types::{SectionType, UrlContext};
use async_trait::async_trait;

/// Characters of fetched content included in the prompt
pub const CONTENT_PREVIEW_CHARS: usize = 1000;

/// Capability to answer a free-form prompt
#[async_trait]
pub trait Judge: Send + Sync {
    /// Send `prompt` to the model and return its raw text answer
    async fn evaluate(&self, prompt: &str) -> Result<String, JudgeError>;
}

/// Decision carried by a judge answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    /// Answer led with KEEP
    Keep,
    /// Answer led with REMOVE
    Remove,
    /// Answer led with anything else
    Unclear,
}

/// Parsed judge answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeAnswer {
    pub judgment: Judgment,
    /// Text after the leading token, trimmed of separators
    pub rationale: String,
}

impl JudgeAnswer {
    /// Only an explicit REMOVE removes; everything else keeps the link
    pub fn should_remove(&self) -> bool {
        self.judgment == Judgment::Remove
    }
}

/// Markup a model may wrap around its leading token
const LEADING_DECORATION: &[char] = &['*', '_', '`', '"', '\'', '#', '>', '-'];

/// Separators between the leading token and the rationale
const RATIONALE_SEPARATORS: &[char] = &[' ', ':', '-', '.', ',', '*', '_', '`', '\n', '\t'];

/// Parse a judge answer by its leading token
///
/// The first run of ASCII letters, after skipping whitespace and markup,
/// is compared case-insensitively with `KEEP` and `REMOVE`.
pub fn parse_answer(raw: &str) -> JudgeAnswer {
    let body = raw.trim_start_matches(|c: char| c.is_whitespace() || LEADING_DECORATION.contains(&c));
    let token_len = body
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(body.len());
    let (token, rest) = body.split_at(token_len);

    let judgment = if token.eq_ignore_ascii_case("REMOVE") {
        Judgment::Remove
    } else if token.eq_ignore_ascii_case("KEEP") {
        Judgment::Keep
    } else {
        Judgment::Unclear
    };

    let rationale = match judgment {
        Judgment::Unclear => raw.trim().to_string(),
        _ => rest.trim_matches(RATIONALE_SEPARATORS).trim().to_string(),
    };

    JudgeAnswer {
        judgment,
        rationale,
    }
}

/// Validation criteria for a section type
pub fn criteria_for(section_type: SectionType) -> &'static str {
    match section_type {
        SectionType::ProductInfo => {
            "Content should be about the product (general info, features, overview)."
        }
        SectionType::Setup => {
            "Content MUST contain explicit logging or syslog setup/configuration instructions."
        }
        SectionType::Documentation => {
            "Content should be documentation or reference material (guides, API or configuration reference)."
        }
        SectionType::Troubleshooting => {
            "Content should contain troubleshooting or diagnostic information."
        }
        SectionType::Other => "Content should be relevant to the section.",
    }
}

/// Build the KEEP/REMOVE classification prompt for one URL
pub fn build_prompt(
    integration_name: &str,
    context: &UrlContext,
    status_code: u16,
    content: &str,
) -> String {
    format!(
        "Evaluate if this URL should be kept in the \"{section}\" section of the {product} setup documentation.\n\
         \n\
         Product: {product}\n\
         Section: {section} (Type: {section_type})\n\
         URL: {url}\n\
         Status: {status_code}\n\
         \n\
         Where the link appears in the document:\n\
         {surrounding}\n\
         \n\
         Content preview (first {preview_len} chars):\n\
         {content}\n\
         \n\
         Validation criteria for {section_type}:\n\
         {criteria}\n\
         \n\
         Should this URL be kept? Answer with KEEP or REMOVE as the first word, followed by a brief reason.",
        section = context.section,
        product = integration_name,
        section_type = context.section_type,
        url = context.url,
        status_code = status_code,
        surrounding = context.surrounding_text,
        preview_len = CONTENT_PREVIEW_CHARS,
        content = preview(content, CONTENT_PREVIEW_CHARS),
        criteria = criteria_for(context.section_type),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remove() {
        let answer = parse_answer("REMOVE: page is a marketing landing page");
        assert_eq!(answer.judgment, Judgment::Remove);
        assert!(answer.should_remove());
        assert_eq!(answer.rationale, "page is a marketing landing page");
    }

    #[test]
    fn test_parse_keep() {
        let answer = parse_answer("KEEP - describes syslog forwarding");
        assert_eq!(answer.judgment, Judgment::Keep);
        assert!(!answer.should_remove());
        assert_eq!(answer.rationale, "describes syslog forwarding");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(parse_answer("remove. outdated").judgment, Judgment::Remove);
        assert_eq!(parse_answer("Remove").judgment, Judgment::Remove);
        assert_eq!(parse_answer("keep").judgment, Judgment::Keep);
    }

    #[test]
    fn test_parse_skips_markup() {
        let answer = parse_answer("  **REMOVE** - unrelated product\n");
        assert_eq!(answer.judgment, Judgment::Remove);
        assert_eq!(answer.rationale, "unrelated product");

        assert_eq!(parse_answer("`KEEP`").judgment, Judgment::Keep);
        assert_eq!(parse_answer("\"REMOVE\": nope").judgment, Judgment::Remove);
    }

    #[test]
    fn test_parse_requires_whole_token() {
        // Only the leading token counts, not words later in the answer
        assert_eq!(
            parse_answer("I would not REMOVE this").judgment,
            Judgment::Unclear
        );
        assert_eq!(parse_answer("REMOVED").judgment, Judgment::Unclear);
        assert_eq!(parse_answer("KEEPING it").judgment, Judgment::Unclear);
    }

    #[test]
    fn test_parse_unclear_keeps() {
        for raw in ["", "   ", "Maybe?", "42", "The page is fine."] {
            let answer = parse_answer(raw);
            assert_eq!(answer.judgment, Judgment::Unclear, "raw: {:?}", raw);
            assert!(!answer.should_remove());
        }
        assert_eq!(parse_answer("  Maybe? ").rationale, "Maybe?");
    }

    #[test]
    fn test_parse_token_without_rationale() {
        let answer = parse_answer("REMOVE");
        assert_eq!(answer.judgment, Judgment::Remove);
        assert!(answer.rationale.is_empty());
    }

    #[test]
    fn test_build_prompt() {
        let context = UrlContext {
            url: "https://vendor.com/setup".to_string(),
            section: "Vendor set up steps".to_string(),
            section_type: SectionType::Setup,
            surrounding_text: "- [Guide](https://vendor.com/setup)".to_string(),
        };
        let content = "x".repeat(1500);
        let prompt = build_prompt("Acme Firewall", &context, 200, &content);

        assert!(prompt.contains("Product: Acme Firewall"));
        assert!(prompt.contains("Section: Vendor set up steps (Type: setup)"));
        assert!(prompt.contains("URL: https://vendor.com/setup"));
        assert!(prompt.contains("Status: 200"));
        assert!(prompt.contains("logging or syslog"));
        assert!(prompt.contains("KEEP or REMOVE"));
        assert!(prompt.contains(&"x".repeat(1000)));
        assert!(!prompt.contains(&"x".repeat(1001)));
    }

    #[test]
    fn test_criteria_differ_per_section() {
        let all = [
            SectionType::ProductInfo,
            SectionType::Setup,
            SectionType::Documentation,
            SectionType::Troubleshooting,
            SectionType::Other,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(criteria_for(*a), criteria_for(*b));
            }
        }
    }
}
