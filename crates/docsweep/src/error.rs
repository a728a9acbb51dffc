//! Error types for DocSweep
//!
//! Only [`ConfigError`] ever reaches a caller of the pipeline. Render and
//! judge failures are absorbed into `FetchResult` and `Verdict` values.

use thiserror::Error;

/// Errors raised by a browsing backend while rendering one page
#[derive(Debug, Error)]
pub enum RenderError {
    /// Browser or HTTP client could not be started
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Navigation did not finish within the configured timeout
    #[error("Request timeout - page took too long to load")]
    Timeout,

    /// Navigation finished without a main document response
    #[error("Failed to load page: no response received")]
    NoResponse,

    /// Navigation failed (DNS, connection refused, TLS, ...)
    #[error("Navigation failed: {0}")]
    Navigation(String),

    /// Rendered page content could not be read
    #[error("Failed to read page content: {0}")]
    Content(String),

    /// Fetch was abandoned through a cancellation token
    #[error("Fetch cancelled")]
    Cancelled,
}

impl RenderError {
    /// Create an error from a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RenderError::Timeout
        } else if err.is_builder() {
            RenderError::Launch(err.to_string())
        } else {
            RenderError::Navigation(err.to_string())
        }
    }

    /// Status code reported in a `FetchResult` for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RenderError::Timeout => 408,
            _ => 0,
        }
    }
}

/// Errors raised by an LLM judge call
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Non-2xx response from the model API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required variable is not set
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    /// Variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_status_codes() {
        assert_eq!(RenderError::Timeout.status_code(), 408);
        assert_eq!(RenderError::NoResponse.status_code(), 0);
        assert_eq!(RenderError::Launch("boom".into()).status_code(), 0);
        assert_eq!(RenderError::Navigation("dns".into()).status_code(), 0);
        assert_eq!(RenderError::Cancelled.status_code(), 0);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RenderError::Timeout.to_string(),
            "Request timeout - page took too long to load"
        );
        assert_eq!(
            RenderError::NoResponse.to_string(),
            "Failed to load page: no response received"
        );
        assert_eq!(
            JudgeError::Api {
                status: 429,
                message: "quota".into()
            }
            .to_string(),
            "API error (429): quota"
        );
        assert_eq!(
            ConfigError::Missing("GOOGLE_API_KEY").to_string(),
            "Missing required setting: GOOGLE_API_KEY"
        );
        assert_eq!(
            ConfigError::Invalid {
                name: "DOCSWEEP_MAX_CONCURRENCY",
                value: "x".into()
            }
            .to_string(),
            "Invalid value for DOCSWEEP_MAX_CONCURRENCY: \"x\""
        );
    }
}
