//! Example: Fetch a few live URLs and show what the evaluator would see
//!
//! Run with: cargo run -p docsweep --example fetch_urls
//!
//! Needs network access and, with the default `chromium` feature, a local
//! Chrome or Chromium. Status codes decide removal before any judge call.

use docsweep::{classify, ContentFetcher, FetchResult, PageFetcher};

/// Sample document with one live and one dead link
const DOCUMENT: &str = "## Overview\n\
- [Example](https://example.com)\n\
## Documentation sites\n\
- [Moby Dick](https://httpbin.org/html)\n\
- [Gone](https://httpbin.org/status/404)\n";

struct Case {
    url: &'static str,
    expect_status: u16,
    expect_contains: Option<&'static str>,
}

const CASES: &[Case] = &[
    Case {
        url: "https://example.com",
        expect_status: 200,
        expect_contains: Some("Example Domain"),
    },
    Case {
        url: "https://httpbin.org/html",
        expect_status: 200,
        expect_contains: Some("Herman Melville"),
    },
    Case {
        url: "https://httpbin.org/status/404",
        expect_status: 404,
        expect_contains: None,
    },
];

#[tokio::main]
async fn main() {
    println!("DocSweep fetch examples");
    println!("=======================\n");

    let fetcher = PageFetcher::with_default_backend();
    println!("Backend: {}\n", fetcher.backend_name());
    let mut failed = 0;

    for (i, case) in CASES.iter().enumerate() {
        let context = classify(DOCUMENT, case.url);
        println!("{}. {}", i + 1, case.url);
        println!(
            "   Section: {} ({})",
            context.section, context.section_type
        );

        let result = fetcher.fetch(case.url).await;
        print_summary(&result);

        if check(case, &result) {
            println!("   ✓ PASS\n");
        } else {
            println!("   ✗ FAIL\n");
            failed += 1;
        }
    }

    println!("=======================");
    println!("{} of {} cases failed", failed, CASES.len());
    if failed > 0 {
        std::process::exit(1);
    }
}

fn print_summary(result: &FetchResult) {
    println!("   Status: {}", result.status_code);
    let preview: String = result.content.chars().take(100).collect();
    if !preview.is_empty() {
        println!(
            "   Preview: {}{}",
            preview,
            if result.content.chars().count() > 100 { "..." } else { "" }
        );
    }
    if let Some(ref error) = result.error {
        println!("   Error: {}", error);
    }
}

fn check(case: &Case, result: &FetchResult) -> bool {
    if result.status_code != case.expect_status {
        println!(
            "   Expected status {}, got {}",
            case.expect_status, result.status_code
        );
        return false;
    }
    if let Some(expected) = case.expect_contains {
        if !result.content.contains(expected) {
            println!("   Expected content to contain '{}'", expected);
            return false;
        }
    }
    true
}
