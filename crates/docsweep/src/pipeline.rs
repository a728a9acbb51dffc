//! End-to-end sweep: extract, evaluate, remove

use crate::batch::{evaluate_all, BatchOptions};
use crate::config::SweepConfig;
use crate::error::ConfigError;
use crate::evaluate::Evaluator;
use crate::extract::extract_urls;
use crate::fetchers::{ContentFetcher, PageFetcher};
use crate::judge::Judge;
use crate::remove::remove_links;
use crate::types::Verdict;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Outcome of one sweep over a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SweepReport {
    /// Document with removed links stripped
    pub cleaned: String,
    /// One verdict per evaluated URL, unordered
    pub verdicts: Vec<Verdict>,
    /// URLs whose links were removed
    pub removed: BTreeSet<String>,
}

impl SweepReport {
    /// True if the sweep changed the document
    pub fn changed(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Builder for configuring a [`Sweeper`]
#[derive(Default)]
pub struct SweeperBuilder {
    config: SweepConfig,
    fetcher: Option<Arc<dyn ContentFetcher>>,
    judge: Option<Arc<dyn Judge>>,
    cancel: Option<CancellationToken>,
}

impl SweeperBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: SweepConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the concurrency bound
    pub fn max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Replace the trusted domain list
    pub fn trusted_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.trusted_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Add a trusted domain
    pub fn trusted_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.trusted_domains.push(domain.into());
        self
    }

    /// Use a custom content fetcher instead of the default page fetcher
    pub fn fetcher(mut self, fetcher: impl ContentFetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    /// Set the LLM judge (required)
    pub fn judge(mut self, judge: impl Judge + 'static) -> Self {
        self.judge = Some(Arc::new(judge));
        self
    }

    /// Token that abandons in-progress sweeps when cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build the sweeper
    pub fn build(self) -> Result<Sweeper, ConfigError> {
        let judge = self.judge.ok_or(ConfigError::Missing("judge"))?;
        if self.config.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                name: "max_concurrency",
                value: "0".to_string(),
            });
        }
        let cancel = self.cancel.unwrap_or_default();
        let fetcher = self.fetcher.unwrap_or_else(|| {
            Arc::new(
                PageFetcher::with_default_backend()
                    .with_options(self.config.fetch_options())
                    .with_cancellation(cancel.clone()),
            )
        });

        let evaluator = Evaluator::new(fetcher, judge)
            .with_trusted_domains(self.config.trusted_domains.iter().cloned());

        Ok(Sweeper {
            evaluator,
            config: self.config,
            cancel,
        })
    }
}

/// Configured link sweeper
#[derive(Clone)]
pub struct Sweeper {
    evaluator: Evaluator,
    config: SweepConfig,
    cancel: CancellationToken,
}

impl Sweeper {
    /// Create a new sweeper builder
    pub fn builder() -> SweeperBuilder {
        SweeperBuilder::new()
    }

    /// Configuration in use
    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Token shared with in-flight work; cancelling it abandons the sweep
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Evaluate every link in `markdown` and strip the ones that fail
    pub async fn sweep(&self, integration_name: &str, markdown: &str) -> SweepReport {
        self.sweep_with_cancellation(integration_name, markdown, self.cancel.clone())
            .await
    }

    /// Like [`sweep`](Self::sweep), abandoning evaluations when `cancel` fires
    ///
    /// URLs whose evaluation did not finish before cancellation are kept.
    pub async fn sweep_with_cancellation(
        &self,
        integration_name: &str,
        markdown: &str,
        cancel: CancellationToken,
    ) -> SweepReport {
        let urls = extract_urls(markdown);
        if urls.is_empty() {
            info!(integration = %integration_name, "No URLs found");
            return SweepReport {
                cleaned: markdown.to_string(),
                verdicts: Vec::new(),
                removed: BTreeSet::new(),
            };
        }

        let options = BatchOptions {
            max_concurrency: self.config.max_concurrency,
            cancel,
        };
        let verdicts = evaluate_all(
            &self.evaluator,
            &urls,
            markdown,
            integration_name,
            &options,
        )
        .await;

        let removed: BTreeSet<String> = verdicts
            .iter()
            .filter(|v| v.should_remove)
            .map(|v| v.url.clone())
            .collect();

        let cleaned = if removed.is_empty() {
            markdown.to_string()
        } else {
            remove_links(markdown, &removed)
        };

        info!(
            integration = %integration_name,
            urls = urls.len(),
            evaluated = verdicts.len(),
            removed = removed.len(),
            "Sweep finished"
        );

        SweepReport {
            cleaned,
            verdicts,
            removed,
        }
    }
}
