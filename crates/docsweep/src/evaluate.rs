//! Keep/remove decision for a single URL
//!
//! Rules, first match wins:
//! 0. an abandoned (cancelled) fetch keeps the link
//! 1. status other than 200 removes the link
//! 2. a trusted domain answering 200 keeps the link
//! 3. otherwise the judge decides; anything but a clear REMOVE keeps it

use crate::fetchers::ContentFetcher;
use crate::judge::{build_prompt, parse_answer, Judge, Judgment};
use crate::section::classify;
use crate::types::{FetchResult, UrlContext, Verdict};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Evaluates URLs against their document context
#[derive(Clone)]
pub struct Evaluator {
    fetcher: Arc<dyn ContentFetcher>,
    judge: Arc<dyn Judge>,
    trusted_domains: Vec<String>,
}

impl Evaluator {
    /// Create an evaluator with injected fetcher and judge
    pub fn new(fetcher: Arc<dyn ContentFetcher>, judge: Arc<dyn Judge>) -> Self {
        Self {
            fetcher,
            judge,
            trusted_domains: Vec::new(),
        }
    }

    /// Set the domains whose reachable links are always kept
    pub fn with_trusted_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_domains = domains
            .into_iter()
            .map(|d| d.into().trim().trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();
        self
    }

    /// Trusted domains in use
    pub fn trusted_domains(&self) -> &[String] {
        &self.trusted_domains
    }

    /// Decide whether `url` should stay in `markdown`
    pub async fn evaluate(&self, url: &str, markdown: &str, integration_name: &str) -> Verdict {
        let context = classify(markdown, url);
        let fetched = self.fetcher.fetch(url).await;
        debug!(
            url = %url,
            status_code = fetched.status_code,
            section_type = %context.section_type,
            "Evaluating URL"
        );

        let (should_remove, reason) = self.decide(&context, &fetched, integration_name).await;

        Verdict {
            url: url.to_string(),
            should_remove,
            reason,
            status_code: fetched.status_code,
            section_type: context.section_type,
            section: context.section,
        }
    }

    async fn decide(
        &self,
        context: &UrlContext,
        fetched: &FetchResult,
        integration_name: &str,
    ) -> (bool, String) {
        if fetched.cancelled {
            debug!(url = %context.url, "Fetch cancelled, keeping URL");
            return (false, "Fetch cancelled, kept by default".to_string());
        }

        if fetched.status_code != 200 {
            let reason = match &fetched.error {
                Some(error) => format!("Status code {} (not 200): {}", fetched.status_code, error),
                None => format!("Status code {} (not 200)", fetched.status_code),
            };
            return (true, reason);
        }

        if let Some(domain) = self.trusted_domain_of(&context.url) {
            return (false, format!("{} domain with status 200", domain));
        }

        let prompt = build_prompt(integration_name, context, fetched.status_code, &fetched.content);
        match self.judge.evaluate(&prompt).await {
            Ok(raw) => {
                let answer = parse_answer(&raw);
                let reason = match (answer.judgment, answer.rationale.is_empty()) {
                    (Judgment::Remove, true) => "Judge answered REMOVE".to_string(),
                    (Judgment::Keep, true) => "Judge answered KEEP".to_string(),
                    (Judgment::Unclear, _) => {
                        format!("Unclear judge answer, kept by default: {}", answer.rationale)
                    }
                    (_, false) => answer.rationale.clone(),
                };
                (answer.should_remove(), reason)
            }
            Err(e) => {
                warn!(url = %context.url, error = %e, "Judge call failed, keeping URL");
                (false, format!("LLM evaluation failed: {}, kept by default", e))
            }
        }
    }

    /// The configured trusted domain `url` belongs to, if any
    fn trusted_domain_of(&self, url: &str) -> Option<&str> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        self.trusted_domains
            .iter()
            .find(|domain| {
                host == **domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JudgeError;
    use crate::types::SectionType;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticFetcher {
        status_code: u16,
        content: &'static str,
    }

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            FetchResult::ok(url, self.status_code, self.content)
        }
    }

    struct CannedJudge {
        answer: Result<&'static str, &'static str>,
        calls: AtomicUsize,
    }

    impl CannedJudge {
        fn answering(answer: &'static str) -> Arc<Self> {
            Arc::new(Self {
                answer: Ok(answer),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &'static str) -> Arc<Self> {
            Arc::new(Self {
                answer: Err(message),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Judge for CannedJudge {
        async fn evaluate(&self, _prompt: &str) -> Result<String, JudgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer
                .map(str::to_string)
                .map_err(|m| JudgeError::Network(m.to_string()))
        }
    }

    const DOC: &str = "## Vendor set up steps\n- [Guide](https://vendor.com/setup)\n\
                       ## Documentation sites\n- [Docs](https://www.elastic.co/guide)\n";

    fn evaluator(status_code: u16, judge: Arc<CannedJudge>) -> Evaluator {
        Evaluator::new(
            Arc::new(StaticFetcher {
                status_code,
                content: "Configure syslog forwarding to port 514",
            }),
            judge,
        )
        .with_trusted_domains(["elastic.co"])
    }

    struct AbandonedFetcher;

    #[async_trait]
    impl ContentFetcher for AbandonedFetcher {
        async fn fetch(&self, url: &str) -> FetchResult {
            FetchResult::cancelled(url, "Navigation cancelled")
        }
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_kept() {
        let judge = CannedJudge::answering("REMOVE");
        let evaluator = Evaluator::new(Arc::new(AbandonedFetcher), judge.clone());

        let verdict = evaluator
            .evaluate("https://vendor.com/setup", DOC, "Acme")
            .await;
        assert!(!verdict.should_remove);
        assert_eq!(verdict.status_code, 0);
        assert!(verdict.reason.contains("cancelled"));
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_200_always_removed() {
        let judge = CannedJudge::answering("KEEP");
        let evaluator = evaluator(404, judge.clone());

        for url in ["https://vendor.com/setup", "https://www.elastic.co/guide"] {
            let verdict = evaluator.evaluate(url, DOC, "Acme").await;
            assert!(verdict.should_remove, "{} should be removed", url);
            assert_eq!(verdict.status_code, 404);
            assert!(verdict.reason.contains("404"));
        }
        // Judge never consulted for dead links
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_timeout_and_transport_failure_removed() {
        for status in [0, 408, 500, 301] {
            let verdict = evaluator(status, CannedJudge::answering("KEEP"))
                .evaluate("https://vendor.com/setup", DOC, "Acme")
                .await;
            assert!(verdict.should_remove);
            assert_eq!(verdict.status_code, status);
        }
    }

    #[tokio::test]
    async fn test_trusted_domain_kept_without_judge() {
        let judge = CannedJudge::answering("REMOVE: irrelevant");
        let evaluator = Evaluator::new(
            Arc::new(StaticFetcher {
                status_code: 200,
                content: "",
            }),
            judge.clone(),
        )
        .with_trusted_domains(["elastic.co"]);

        let verdict = evaluator
            .evaluate("https://www.elastic.co/guide", DOC, "Acme")
            .await;
        assert!(!verdict.should_remove);
        assert_eq!(verdict.reason, "elastic.co domain with status 200");
        assert_eq!(verdict.section_type, SectionType::Documentation);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_judge_remove() {
        let verdict = evaluator(200, CannedJudge::answering("REMOVE: marketing page only"))
            .evaluate("https://vendor.com/setup", DOC, "Acme")
            .await;
        assert!(verdict.should_remove);
        assert_eq!(verdict.reason, "marketing page only");
        assert_eq!(verdict.section, "Vendor set up steps");
        assert_eq!(verdict.section_type, SectionType::Setup);
    }

    #[tokio::test]
    async fn test_judge_keep() {
        let verdict = evaluator(200, CannedJudge::answering("KEEP"))
            .evaluate("https://vendor.com/setup", DOC, "Acme")
            .await;
        assert!(!verdict.should_remove);
        assert_eq!(verdict.reason, "Judge answered KEEP");
    }

    #[tokio::test]
    async fn test_unclear_answer_fails_open() {
        let verdict = evaluator(200, CannedJudge::answering("It depends on the reader."))
            .evaluate("https://vendor.com/setup", DOC, "Acme")
            .await;
        assert!(!verdict.should_remove);
        assert!(verdict.reason.contains("kept by default"));
    }

    #[tokio::test]
    async fn test_judge_error_fails_open() {
        let verdict = evaluator(200, CannedJudge::failing("connection reset"))
            .evaluate("https://vendor.com/setup", DOC, "Acme")
            .await;
        assert!(!verdict.should_remove);
        assert_eq!(verdict.status_code, 200);
        assert!(verdict.reason.contains("LLM evaluation failed"));
        assert!(verdict.reason.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_url_missing_from_document() {
        let verdict = evaluator(200, CannedJudge::answering("KEEP"))
            .evaluate("https://elsewhere.com", DOC, "Acme")
            .await;
        assert_eq!(verdict.section, "Unknown");
        assert_eq!(verdict.section_type, SectionType::Other);
    }

    #[test]
    fn test_trusted_domain_matching() {
        let evaluator = evaluator(200, CannedJudge::answering("KEEP"))
            .with_trusted_domains([" .Elastic.co ", "docs.acme.io", ""]);
        assert_eq!(
            evaluator.trusted_domains(),
            &["elastic.co".to_string(), "docs.acme.io".to_string()]
        );

        assert_eq!(
            evaluator.trusted_domain_of("https://elastic.co/x"),
            Some("elastic.co")
        );
        assert_eq!(
            evaluator.trusted_domain_of("https://WWW.ELASTIC.CO/guide"),
            Some("elastic.co")
        );
        assert_eq!(
            evaluator.trusted_domain_of("https://docs.acme.io/api"),
            Some("docs.acme.io")
        );
        assert_eq!(evaluator.trusted_domain_of("https://notelastic.co/"), None);
        assert_eq!(evaluator.trusted_domain_of("https://acme.io/"), None);
        assert_eq!(
            evaluator.trusted_domain_of("https://elastic.co.evil.com/"),
            None
        );
        assert_eq!(evaluator.trusted_domain_of("not a url"), None);
    }
}
