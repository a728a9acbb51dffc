//! Plain HTTP backend
//!
//! Fetches the raw document with a browser-like GET. Pages that build
//! their content client-side come back without it; use the Chromium
//! backend for those.

use crate::client::FetchOptions;
use crate::error::RenderError;
use crate::fetchers::{BrowserBackend, BrowserSession};
use crate::DEFAULT_USER_AGENT;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use tracing::{debug, warn};

/// Binary content type prefixes
const BINARY_PREFIXES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "application/octet-stream",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-tar",
    "application/x-rar",
    "application/x-7z",
    "application/vnd.ms-",
    "application/vnd.openxmlformats",
    "font/",
];

/// Body bytes read before the rest of the response is dropped
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// HTTP backend built on reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpBackend;

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BrowserBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn renders_scripts(&self) -> bool {
        false
    }

    async fn open(&self, options: &FetchOptions) -> Result<Box<dyn BrowserSession>, RenderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(options.effective_user_agent())
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_USER_AGENT)),
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        // Fresh client per session: no cookies or connections shared
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(options.navigation_timeout)
            .timeout(options.navigation_timeout)
            .build()
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        Ok(Box::new(HttpSession {
            client: Some(client),
            body: None,
        }))
    }
}

/// One GET request and its body
struct HttpSession {
    client: Option<reqwest::Client>,
    body: Option<String>,
}

#[async_trait]
impl BrowserSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<u16, RenderError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(RenderError::Navigation(
                "Invalid URL: must start with http:// or https://".to_string(),
            ));
        }
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| RenderError::Navigation("session already closed".to_string()))?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(RenderError::from_reqwest)?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if content_type.as_deref().is_some_and(is_binary_content_type) {
            debug!(url = %url, content_type = ?content_type, "Skipping binary body");
            self.body = Some(String::new());
            return Ok(status_code);
        }

        let body = read_body_with_limit(response, MAX_BODY_BYTES).await?;
        self.body = Some(String::from_utf8_lossy(&body).into_owned());
        Ok(status_code)
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.body
            .clone()
            .ok_or_else(|| RenderError::Content("no page loaded".to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        self.client = None;
        self.body = None;
        Ok(())
    }
}

/// Check if content type indicates binary content
fn is_binary_content_type(content_type: &str) -> bool {
    let ct_lower = content_type.to_lowercase();
    BINARY_PREFIXES
        .iter()
        .any(|prefix| ct_lower.starts_with(prefix))
}

/// Read response body, stopping at `limit` bytes
async fn read_body_with_limit(
    response: reqwest::Response,
    limit: usize,
) -> Result<Bytes, RenderError> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => {
                body.extend_from_slice(&bytes);
                if body.len() >= limit {
                    warn!(limit, "Body limit reached, dropping remainder");
                    body.truncate(limit);
                    break;
                }
            }
            Err(e) if body.is_empty() => return Err(RenderError::from_reqwest(e)),
            Err(e) => {
                // Keep what arrived; text extraction copes with a cut document
                warn!("Error reading body chunk: {}", e);
                break;
            }
        }
    }

    Ok(Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_binary_content_type() {
        assert!(is_binary_content_type("image/png"));
        assert!(is_binary_content_type("application/pdf"));
        assert!(is_binary_content_type("application/octet-stream"));
        assert!(is_binary_content_type("application/vnd.ms-excel"));
        assert!(is_binary_content_type("font/woff2"));
        assert!(is_binary_content_type("IMAGE/JPEG"));

        assert!(!is_binary_content_type("text/html"));
        assert!(!is_binary_content_type("text/plain"));
        assert!(!is_binary_content_type("application/json"));
    }

    #[tokio::test]
    async fn test_navigate_rejects_other_schemes() {
        let backend = HttpBackend::new();
        let mut session = backend.open(&FetchOptions::default()).await.unwrap();
        let err = session.navigate("ftp://example.com").await.unwrap_err();
        assert!(matches!(err, RenderError::Navigation(_)));
        assert_eq!(err.status_code(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let backend = HttpBackend::new();
        let mut session = backend.open(&FetchOptions::default()).await.unwrap();
        session.close().await.unwrap();
        session.close().await.unwrap();
        assert!(session.content().await.is_err());
    }
}
