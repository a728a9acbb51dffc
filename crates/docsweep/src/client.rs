//! Fetch entry points for DocSweep
//!
//! This module provides the fetch options and a convenience function for
//! one-off fetches. The rendering itself is implemented by backends in the
//! [`fetchers`](crate::fetchers) module.

use crate::fetchers::{ContentFetcher, PageFetcher};
use crate::types::FetchResult;
use crate::{DEFAULT_USER_AGENT, MAX_CONTENT_CHARS};
use std::time::Duration;

/// Navigation timeout per page
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra wait after navigation for script-rendered content
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Options controlling a single page fetch
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Custom User-Agent
    pub user_agent: Option<String>,
    /// Time allowed for navigation before the fetch reports 408
    pub navigation_timeout: Duration,
    /// Wait applied after navigation by script-rendering backends
    pub settle_delay: Duration,
    /// Cap on extracted text length, in characters
    pub max_content_chars: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: None,
            navigation_timeout: NAVIGATION_TIMEOUT,
            settle_delay: SETTLE_DELAY,
            max_content_chars: MAX_CONTENT_CHARS,
        }
    }
}

impl FetchOptions {
    /// User-Agent to send, falling back to the default
    pub fn effective_user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

/// Fetch a URL with the default backend and options
///
/// For another backend or custom options, build a [`PageFetcher`]
/// directly.
pub async fn fetch(url: &str) -> FetchResult {
    PageFetcher::with_default_backend().fetch(url).await
}
