//! Bounded-parallel evaluation of many URLs
//!
//! Every URL is evaluated against the same markdown snapshot. At most
//! `max_concurrency` evaluations are in flight; a task that panics is
//! logged and left out of the result without disturbing the others.
//! Cancelling the batch abandons queued and in-flight evaluations alike;
//! only finished verdicts are returned.

use crate::evaluate::Evaluator;
use crate::types::Verdict;
use crate::DEFAULT_MAX_CONCURRENCY;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Options for one evaluation batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum evaluations in flight (values below 1 are treated as 1)
    pub max_concurrency: usize,
    /// Abandons queued and in-flight evaluations once cancelled
    pub cancel: CancellationToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            cancel: CancellationToken::new(),
        }
    }
}

impl BatchOptions {
    /// Default options with the given concurrency bound
    pub fn with_max_concurrency(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..Default::default()
        }
    }
}

/// Evaluate every URL in `urls` against `markdown`
///
/// Returns one verdict per URL that finished; order is not significant.
pub async fn evaluate_all<I, S>(
    evaluator: &Evaluator,
    urls: I,
    markdown: &str,
    integration_name: &str,
    options: &BatchOptions,
) -> Vec<Verdict>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
    if urls.is_empty() {
        return Vec::new();
    }

    let total = urls.len();
    let max_concurrency = options.max_concurrency.max(1);
    info!(urls = total, max_concurrency, "Evaluating URLs");

    let evaluator = Arc::new(evaluator.clone());
    let markdown: Arc<str> = Arc::from(markdown);
    let integration_name: Arc<str> = Arc::from(integration_name);
    let semaphore = Arc::new(Semaphore::new(max_concurrency));

    let mut tasks = JoinSet::new();
    for url in urls {
        let evaluator = Arc::clone(&evaluator);
        let markdown = Arc::clone(&markdown);
        let integration_name = Arc::clone(&integration_name);
        let semaphore = Arc::clone(&semaphore);
        let cancel = options.cancel.clone();

        tasks.spawn(async move {
            let _permit = tokio::select! {
                _ = cancel.cancelled() => None,
                permit = semaphore.acquire_owned() => permit.ok(),
            }?;
            if cancel.is_cancelled() {
                return None;
            }
            debug!(url = %url, "Evaluation started");
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(url = %url, "Evaluation abandoned");
                    None
                }
                verdict = evaluator.evaluate(&url, &markdown, &integration_name) => Some(verdict),
            }
        });
    }

    let mut verdicts = Vec::with_capacity(total);
    let mut skipped = 0usize;
    let mut failed = 0usize;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Some(verdict)) => verdicts.push(verdict),
            Ok(None) => skipped += 1,
            Err(e) => {
                failed += 1;
                error!(error = %e, "URL evaluation aborted, omitting it from results");
            }
        }
    }

    info!(
        evaluated = verdicts.len(),
        removed = verdicts.iter().filter(|v| v.should_remove).count(),
        skipped,
        failed,
        "URL evaluation finished"
    );
    verdicts
}
