//! Core types for DocSweep

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Coarse category of the markdown section a URL appears in
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    /// Introduction, overview, compatibility and similar sections
    ProductInfo,
    /// Vendor or product setup and configuration steps
    Setup,
    /// Reference and documentation link lists
    Documentation,
    /// Troubleshooting, errors and known issues
    Troubleshooting,
    /// Anything else, including URLs outside any heading
    #[default]
    Other,
}

impl SectionType {
    /// Wire name of the section type
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::ProductInfo => "product_info",
            SectionType::Setup => "setup",
            SectionType::Documentation => "documentation",
            SectionType::Troubleshooting => "troubleshooting",
            SectionType::Other => "other",
        }
    }
}

impl FromStr for SectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "product_info" => Ok(SectionType::ProductInfo),
            "setup" => Ok(SectionType::Setup),
            "documentation" => Ok(SectionType::Documentation),
            "troubleshooting" => Ok(SectionType::Troubleshooting),
            "other" => Ok(SectionType::Other),
            _ => Err(format!("Invalid section type: {}", s)),
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a URL sits in a document
///
/// Computed per (markdown, url) pair; stale as soon as the markdown changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UrlContext {
    /// The URL that was located
    pub url: String,

    /// Nearest preceding heading text, or "Unknown"
    pub section: String,

    /// Category derived from the heading
    pub section_type: SectionType,

    /// Up to 5 lines either side of the URL's line, or a diagnostic
    pub surrounding_text: String,
}

/// Outcome of fetching one URL
///
/// Every fetch produces one of these; failures are encoded in
/// `status_code` (0 transport failure, 408 timeout) and `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FetchResult {
    /// The fetched URL
    pub url: String,

    /// HTTP status, 408 on navigation timeout, 0 on any other failure
    pub status_code: u16,

    /// Extracted plain text of the rendered page
    pub content: String,

    /// Description of the failure, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// True if content was cut at the length cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,

    /// True if the fetch was abandoned before the page answered
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
}

impl FetchResult {
    /// Successful render with extracted text
    pub fn ok(url: impl Into<String>, status_code: u16, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Failed render
    pub fn failed(url: impl Into<String>, status_code: u16, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status_code,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    /// Fetch abandoned through cancellation; says nothing about the page
    pub fn cancelled(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::failed(url, 0, error)
        }
    }

    /// True when the page answered 200
    pub fn is_ok(&self) -> bool {
        self.status_code == 200
    }
}

/// Keep/remove decision for one URL in one evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Verdict {
    /// The evaluated URL
    pub url: String,

    /// True if the link should be stripped from the document
    pub should_remove: bool,

    /// Human-readable justification
    pub reason: String,

    /// Status code observed by the fetcher
    pub status_code: u16,

    /// Category of the section the URL was found in
    pub section_type: SectionType,

    /// Heading of the section the URL was found in
    pub section: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_type_from_str() {
        assert_eq!(
            SectionType::from_str("product_info").unwrap(),
            SectionType::ProductInfo
        );
        assert_eq!(SectionType::from_str("SETUP").unwrap(), SectionType::Setup);
        assert_eq!(
            SectionType::from_str("Troubleshooting").unwrap(),
            SectionType::Troubleshooting
        );
        assert!(SectionType::from_str("setup steps").is_err());
    }

    #[test]
    fn test_section_type_display_matches_serde() {
        for section_type in [
            SectionType::ProductInfo,
            SectionType::Setup,
            SectionType::Documentation,
            SectionType::Troubleshooting,
            SectionType::Other,
        ] {
            let json = serde_json::to_string(&section_type).unwrap();
            assert_eq!(json, format!("\"{}\"", section_type));
        }
    }

    #[test]
    fn test_fetch_result_serialization() {
        let result = FetchResult::ok("https://example.com", 200, "Hello");
        let json = serde_json::to_string(&result).unwrap();
        // Optional None fields should be omitted
        assert!(!json.contains("error"));
        assert!(!json.contains("truncated"));
        assert!(json.contains("\"content\":\"Hello\""));
        assert!(result.is_ok());

        let failed = FetchResult::failed("https://example.com", 408, "timeout");
        assert!(!failed.is_ok());
        assert!(failed.content.is_empty());
        assert_eq!(failed.error.as_deref(), Some("timeout"));
        assert!(!failed.cancelled);
        assert!(!json.contains("cancelled"));
    }

    #[test]
    fn test_cancelled_fetch_result() {
        let result = FetchResult::cancelled("https://example.com", "Fetch cancelled");
        assert!(result.cancelled);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.error.as_deref(), Some("Fetch cancelled"));

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["cancelled"], true);
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = Verdict {
            url: "https://example.com".to_string(),
            should_remove: true,
            reason: "Status code 404 (not 200)".to_string(),
            status_code: 404,
            section_type: SectionType::Documentation,
            section: "Documentation sites".to_string(),
        };
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["section_type"], "documentation");
        assert_eq!(json["should_remove"], true);

        let back: Verdict = serde_json::from_value(json).unwrap();
        assert_eq!(back, verdict);
    }
}
