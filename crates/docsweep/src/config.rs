//! Pipeline configuration

use crate::client::{FetchOptions, NAVIGATION_TIMEOUT, SETTLE_DELAY};
use crate::error::ConfigError;
use crate::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TRUSTED_DOMAIN, MAX_CONTENT_CHARS};
use std::str::FromStr;
use std::time::Duration;

/// Settings for a sweep run
#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    /// Maximum URL evaluations in flight
    pub max_concurrency: usize,
    /// Domains whose reachable links are always kept
    pub trusted_domains: Vec<String>,
    /// Time allowed for page navigation
    pub navigation_timeout: Duration,
    /// Wait after navigation for script-rendered content
    pub settle_delay: Duration,
    /// Cap on extracted page text
    pub max_content_chars: usize,
    /// Custom User-Agent for page fetches
    pub user_agent: Option<String>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            trusted_domains: vec![DEFAULT_TRUSTED_DOMAIN.to_string()],
            navigation_timeout: NAVIGATION_TIMEOUT,
            settle_delay: SETTLE_DELAY,
            max_content_chars: MAX_CONTENT_CHARS,
            user_agent: None,
        }
    }
}

impl SweepConfig {
    /// Defaults overridden by `DOCSWEEP_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by values from `lookup`
    ///
    /// Unset and blank values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |name: &'static str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("DOCSWEEP_MAX_CONCURRENCY") {
            let n: usize = parse_number("DOCSWEEP_MAX_CONCURRENCY", &value)?;
            if n == 0 {
                return Err(ConfigError::Invalid {
                    name: "DOCSWEEP_MAX_CONCURRENCY",
                    value,
                });
            }
            config.max_concurrency = n;
        }
        if let Some(value) = get("DOCSWEEP_TRUSTED_DOMAINS") {
            config.trusted_domains = value
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = get("DOCSWEEP_NAVIGATION_TIMEOUT_SECS") {
            config.navigation_timeout =
                Duration::from_secs(parse_number("DOCSWEEP_NAVIGATION_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("DOCSWEEP_SETTLE_DELAY_MS") {
            config.settle_delay =
                Duration::from_millis(parse_number("DOCSWEEP_SETTLE_DELAY_MS", &value)?);
        }
        if let Some(value) = get("DOCSWEEP_MAX_CONTENT_CHARS") {
            config.max_content_chars = parse_number("DOCSWEEP_MAX_CONTENT_CHARS", &value)?;
        }
        if let Some(value) = get("DOCSWEEP_USER_AGENT") {
            config.user_agent = Some(value.trim().to_string());
        }

        Ok(config)
    }

    /// Fetch options derived from this config
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            user_agent: self.user_agent.clone(),
            navigation_timeout: self.navigation_timeout,
            settle_delay: self.settle_delay,
            max_content_chars: self.max_content_chars,
        }
    }
}

fn parse_number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = SweepConfig::default();
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.trusted_domains, vec!["elastic.co".to_string()]);
        assert_eq!(config.navigation_timeout, Duration::from_secs(30));
        assert_eq!(config.settle_delay, Duration::from_secs(2));
        assert_eq!(config.max_content_chars, 50_000);
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = SweepConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SweepConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = SweepConfig::from_lookup(lookup(&[
            ("DOCSWEEP_MAX_CONCURRENCY", "8"),
            ("DOCSWEEP_TRUSTED_DOMAINS", "elastic.co, docs.acme.io,,"),
            ("DOCSWEEP_NAVIGATION_TIMEOUT_SECS", " 10 "),
            ("DOCSWEEP_SETTLE_DELAY_MS", "500"),
            ("DOCSWEEP_MAX_CONTENT_CHARS", "1000"),
            ("DOCSWEEP_USER_AGENT", "Sweeper/2.0"),
        ]))
        .unwrap();

        assert_eq!(config.max_concurrency, 8);
        assert_eq!(
            config.trusted_domains,
            vec!["elastic.co".to_string(), "docs.acme.io".to_string()]
        );
        assert_eq!(config.navigation_timeout, Duration::from_secs(10));
        assert_eq!(config.settle_delay, Duration::from_millis(500));
        assert_eq!(config.max_content_chars, 1000);
        assert_eq!(config.user_agent.as_deref(), Some("Sweeper/2.0"));
    }

    #[test]
    fn test_blank_values_ignored() {
        let config = SweepConfig::from_lookup(lookup(&[
            ("DOCSWEEP_MAX_CONCURRENCY", "  "),
            ("DOCSWEEP_USER_AGENT", ""),
        ]))
        .unwrap();
        assert_eq!(config, SweepConfig::default());
    }

    #[test]
    fn test_invalid_number() {
        let err = SweepConfig::from_lookup(lookup(&[("DOCSWEEP_SETTLE_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "DOCSWEEP_SETTLE_DELAY_MS",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = SweepConfig::from_lookup(lookup(&[("DOCSWEEP_MAX_CONCURRENCY", "0")]))
            .unwrap_err();
        assert!(err.to_string().contains("DOCSWEEP_MAX_CONCURRENCY"));
    }

    #[test]
    fn test_fetch_options() {
        let config = SweepConfig {
            settle_delay: Duration::ZERO,
            user_agent: Some("UA".to_string()),
            ..Default::default()
        };
        let options = config.fetch_options();
        assert_eq!(options.settle_delay, Duration::ZERO);
        assert_eq!(options.effective_user_agent(), "UA");
        assert_eq!(options.max_content_chars, 50_000);
    }
}
