//! Headless Chromium backend
//!
//! Launches one browser process per session so concurrent fetches never
//! share a browser. Navigation completes once the main frame reports
//! `networkIdle`. The process is closed in [`BrowserSession::close`];
//! a session dropped without closing is killed by chromiumoxide.

use crate::client::FetchOptions;
use crate::error::RenderError;
use crate::fetchers::{BrowserBackend, BrowserSession};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    EventLifecycleEvent, SetLifecycleEventsEnabledParams,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Chromium backend built on chromiumoxide
#[derive(Debug, Clone, Default)]
pub struct ChromiumBackend {
    executable: Option<PathBuf>,
}

impl ChromiumBackend {
    /// Use the Chromium found on the system
    pub fn new() -> Self {
        Self { executable: None }
    }

    /// Use a specific Chromium/Chrome executable
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }
}

#[async_trait]
impl BrowserBackend for ChromiumBackend {
    fn name(&self) -> &'static str {
        "chromium"
    }

    fn renders_scripts(&self) -> bool {
        true
    }

    async fn open(&self, options: &FetchOptions) -> Result<Box<dyn BrowserSession>, RenderError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.navigation_timeout)
            .arg(format!("--user-agent={}", options.effective_user_agent()));
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = browser.close().await {
                    warn!(error = %close_err, "Failed to close browser after page error");
                }
                handler_task.abort();
                return Err(RenderError::Launch(e.to_string()));
            }
        };

        debug!("Chromium session opened");
        Ok(Box::new(ChromiumSession {
            browser,
            page: Some(page),
            handler_task: Some(handler_task),
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    fn page(&self) -> Result<&Page, RenderError> {
        self.page
            .as_ref()
            .ok_or_else(|| RenderError::Content("session already closed".to_string()))
    }
}

fn map_cdp(err: CdpError) -> RenderError {
    if matches!(err, CdpError::Timeout) {
        RenderError::Timeout
    } else {
        RenderError::Navigation(err.to_string())
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<u16, RenderError> {
        let page = self.page()?;
        page.execute(SetLifecycleEventsEnabledParams::new(true))
            .await
            .map_err(map_cdp)?;
        // Subscribe before navigating so no lifecycle event is missed
        let mut lifecycle = page
            .event_listener::<EventLifecycleEvent>()
            .await
            .map_err(map_cdp)?;

        page.goto(url).await.map_err(map_cdp)?;

        let request = page.wait_for_navigation_response().await.map_err(map_cdp)?;
        let status = request
            .and_then(|req| req.response.as_ref().map(|resp| resp.status))
            .ok_or(RenderError::NoResponse)?;

        // The caller bounds this wait with the navigation timeout
        let main_frame = page.mainframe().await.map_err(map_cdp)?;
        let mut started = false;
        while let Some(event) = lifecycle.next().await {
            if main_frame.as_ref().is_some_and(|id| *id != event.frame_id) {
                continue;
            }
            match event.name.as_str() {
                "init" => started = true,
                "networkIdle" if started => break,
                _ => {}
            }
        }
        debug!(url = %url, status, "Network idle");

        Ok(u16::try_from(status).unwrap_or(0))
    }

    async fn content(&mut self) -> Result<String, RenderError> {
        self.page()?
            .content()
            .await
            .map_err(|e| RenderError::Content(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), RenderError> {
        let Some(handler_task) = self.handler_task.take() else {
            return Ok(());
        };

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!(error = %e, "Page close failed, closing browser anyway");
            }
        }

        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Failed waiting for browser exit");
        }
        handler_task.abort();

        closed
            .map(|_| ())
            .map_err(|e| RenderError::Launch(format!("browser close failed: {}", e)))
    }
}
