//! Page fetching for URL evaluation
//!
//! Design: [`PageFetcher`] owns the fetch policy (timeouts, settle delay,
//! text extraction, truncation, error mapping) and delegates rendering to
//! a pluggable [`BrowserBackend`]. Each fetch opens its own
//! [`BrowserSession`] and closes it on every exit path.

mod http;
#[cfg(feature = "chromium")]
mod chromium;

pub use http::HttpBackend;
#[cfg(feature = "chromium")]
pub use chromium::ChromiumBackend;

use crate::client::FetchOptions;
use crate::convert::{html_to_text, truncate_chars};
use crate::error::RenderError;
use crate::types::FetchResult;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Content placed in a successful result when the page has no text
pub const EMPTY_CONTENT: &str = "No content found in the URL";

/// Capability to fetch a URL's content
///
/// Implementations never fail: every outcome is a [`FetchResult`].
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch `url` and return its status and extracted text
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// A rendering engine able to open isolated browsing sessions
#[async_trait]
pub trait BrowserBackend: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// True if pages are rendered with JavaScript
    ///
    /// The settle delay is only applied for script-rendering backends.
    fn renders_scripts(&self) -> bool;

    /// Open a fresh session (browser context and page)
    async fn open(&self, options: &FetchOptions) -> Result<Box<dyn BrowserSession>, RenderError>;
}

/// One isolated browsing context holding a single page
#[async_trait]
pub trait BrowserSession: Send {
    /// Navigate to `url` and return the main document's HTTP status
    async fn navigate(&mut self, url: &str) -> Result<u16, RenderError>;

    /// Current page content as HTML
    async fn content(&mut self) -> Result<String, RenderError>;

    /// Release the session; safe to call more than once
    async fn close(&mut self) -> Result<(), RenderError>;
}

/// Fetcher that renders pages through a [`BrowserBackend`]
#[derive(Clone)]
pub struct PageFetcher {
    backend: Arc<dyn BrowserBackend>,
    options: FetchOptions,
    cancel: Option<CancellationToken>,
}

impl PageFetcher {
    /// Create a fetcher over the default backend
    ///
    /// Headless Chromium when the `chromium` feature is enabled (the
    /// default), plain HTTP otherwise.
    pub fn with_default_backend() -> Self {
        #[cfg(feature = "chromium")]
        {
            Self::new(ChromiumBackend::new())
        }
        #[cfg(not(feature = "chromium"))]
        {
            Self::new(HttpBackend::new())
        }
    }

    /// Create a fetcher over `backend` with default options
    pub fn new(backend: impl BrowserBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
            options: FetchOptions::default(),
            cancel: None,
        }
    }

    /// Replace the fetch options
    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Abandon in-flight renders when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Backend identifier
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Active options
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    async fn render(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
    ) -> Result<(u16, String), RenderError> {
        let status_code =
            match tokio::time::timeout(self.options.navigation_timeout, session.navigate(url))
                .await
            {
                Ok(result) => result?,
                Err(_) => return Err(RenderError::Timeout),
            };

        // Give client-side rendering a moment after the load settles
        if self.backend.renders_scripts() && !self.options.settle_delay.is_zero() {
            tokio::time::sleep(self.options.settle_delay).await;
        }

        let html = session.content().await?;
        Ok((status_code, html))
    }

    fn to_result(&self, url: &str, status_code: u16, html: &str) -> FetchResult {
        let text = html_to_text(html);
        if text.is_empty() {
            return FetchResult::ok(url, status_code, EMPTY_CONTENT);
        }

        let (content, truncated) = truncate_chars(text, self.options.max_content_chars);
        FetchResult {
            url: url.to_string(),
            status_code,
            content,
            truncated: truncated.then_some(true),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ContentFetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        if let Some(token) = &self.cancel {
            if token.is_cancelled() {
                return FetchResult::cancelled(url, RenderError::Cancelled.to_string());
            }
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return FetchResult::failed(url, 0, "Invalid URL: must start with http:// or https://");
        }

        debug!(backend = self.backend.name(), url = %url, "Opening browser session");
        let mut session = match self.backend.open(&self.options).await {
            Ok(session) => session,
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to open browser session");
                return FetchResult::failed(url, e.status_code(), e.to_string());
            }
        };

        let outcome = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => Err(RenderError::Cancelled),
                    outcome = self.render(session.as_mut(), url) => outcome,
                }
            }
            None => self.render(session.as_mut(), url).await,
        };

        if let Err(e) = session.close().await {
            warn!(url = %url, error = %e, "Failed to close browser session");
        }

        match outcome {
            Ok((status_code, html)) => {
                debug!(url = %url, status_code, "Page rendered");
                self.to_result(url, status_code, &html)
            }
            Err(RenderError::Cancelled) => {
                debug!(url = %url, "Fetch cancelled");
                FetchResult::cancelled(url, RenderError::Cancelled.to_string())
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Fetch failed");
                FetchResult::failed(url, e.status_code(), e.to_string())
            }
        }
    }
}
