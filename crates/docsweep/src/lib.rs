//! DocSweep - link validation for generated integration docs
//!
//! This crate checks every link in a markdown document and strips the
//! ones that are dead or irrelevant to the section they appear in.
//!
//! ## Pipeline
//!
//! 1. [`extract_urls`] collects the unique http(s) URLs in the document
//! 2. [`classify`] finds each URL's section heading and category
//! 3. a [`ContentFetcher`] loads the page and extracts its text
//! 4. [`Evaluator`] decides keep/remove: non-200 removes, a trusted domain
//!    keeps, otherwise a [`Judge`] is asked
//! 5. [`evaluate_all`] runs the evaluations with bounded concurrency
//! 6. [`remove_links`] strips the removed links from the document
//!
//! [`Sweeper`] wires the steps together.
//!
//! ## Fetcher System
//!
//! [`PageFetcher`] renders pages through a pluggable [`BrowserBackend`]:
//! - `ChromiumBackend` - headless Chromium, the default (feature `chromium`,
//!   on by default); waits for network idle before reading the DOM
//! - [`HttpBackend`] - plain HTTP GET with browser-like headers, opt-in
//!
//! [`PageFetcher::with_default_backend`] picks Chromium when it is compiled in.

pub mod batch;
pub mod client;
pub mod config;
mod convert;
mod error;
pub mod evaluate;
mod extract;
pub mod fetchers;
pub mod judge;
pub mod pipeline;
mod remove;
mod section;
mod types;

pub use batch::{evaluate_all, BatchOptions};
pub use client::{fetch, FetchOptions};
pub use config::SweepConfig;
pub use convert::{html_to_text, TRUNCATION_MARKER};
pub use error::{ConfigError, JudgeError, RenderError};
pub use evaluate::Evaluator;
pub use extract::extract_urls;
pub use fetchers::{BrowserBackend, BrowserSession, ContentFetcher, HttpBackend, PageFetcher};
#[cfg(feature = "chromium")]
pub use fetchers::ChromiumBackend;
pub use judge::{parse_answer, GeminiJudge, Judge, JudgeAnswer, Judgment};
pub use pipeline::{SweepReport, Sweeper, SweeperBuilder};
pub use remove::remove_links;
pub use section::{classify, section_type_for, UNKNOWN_SECTION};
pub use types::{FetchResult, SectionType, UrlContext, Verdict};

pub use tokio_util::sync::CancellationToken;

/// Default User-Agent string, browser-like so sites serve their normal page
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) DocSweep/0.1";

/// Maximum characters of extracted page text kept per fetch
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Default bound on concurrent URL evaluations
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Domain trusted by default
pub const DEFAULT_TRUSTED_DOMAIN: &str = "elastic.co";
