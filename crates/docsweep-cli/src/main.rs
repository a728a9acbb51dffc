//! DocSweep CLI - validate and clean links in markdown documents

use clap::{Parser, Subcommand, ValueEnum};
use docsweep::{
    classify, extract_urls, CancellationToken, ContentFetcher, FetchResult, GeminiJudge,
    HttpBackend, PageFetcher, SweepConfig, SweepReport, Sweeper,
};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Output format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Markdown (cleaned document, or fetched text with frontmatter)
    #[default]
    Md,
    /// JSON format
    Json,
}

/// Page rendering backend
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Plain HTTP GET, no script execution
    Http,
    /// Headless Chromium
    #[cfg(feature = "chromium")]
    Chromium,
}

impl Default for Backend {
    #[cfg(feature = "chromium")]
    fn default() -> Self {
        Backend::Chromium
    }

    #[cfg(not(feature = "chromium"))]
    fn default() -> Self {
        Backend::Http
    }
}

/// DocSweep - remove dead and irrelevant links from integration docs
#[derive(Parser, Debug)]
#[command(name = "docsweep")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every link in a document and strip the failing ones
    Check {
        /// Markdown file, or `-` for stdin
        input: PathBuf,

        /// Product the document describes
        #[arg(long, short, env = "DOCSWEEP_INTEGRATION")]
        integration: String,

        /// Maximum URL evaluations in flight
        #[arg(long)]
        max_concurrency: Option<usize>,

        /// Trusted domain (repeatable, replaces the configured list)
        #[arg(long = "trusted-domain")]
        trusted_domains: Vec<String>,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        /// Rewrite the input file with the cleaned document
        #[arg(long)]
        write: bool,

        /// Page rendering backend [default: chromium when built with it, else http]
        #[arg(long)]
        backend: Option<Backend>,
    },
    /// Print the unique URLs found in a document
    Extract {
        /// Markdown file, or `-` for stdin
        input: PathBuf,
    },
    /// Print the section context of a URL as JSON
    Classify {
        /// Markdown file, or `-` for stdin
        input: PathBuf,

        /// URL to locate
        url: String,
    },
    /// Fetch a URL and print its extracted text
    Fetch {
        /// URL to fetch
        url: String,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,

        /// Page rendering backend [default: chromium when built with it, else http]
        #[arg(long)]
        backend: Option<Backend>,

        /// Custom User-Agent
        #[arg(long)]
        user_agent: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docsweep=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            input,
            integration,
            max_concurrency,
            trusted_domains,
            output,
            write,
            backend,
        } => {
            let options = CheckOptions {
                integration,
                max_concurrency,
                trusted_domains,
                output,
                write,
                backend: backend.unwrap_or_default(),
            };
            run_check(&input, options).await;
        }
        Commands::Extract { input } => {
            let markdown = read_input_or_exit(&input);
            for url in extract_urls(&markdown) {
                writeln_safe(&url);
            }
        }
        Commands::Classify { input, url } => {
            let markdown = read_input_or_exit(&input);
            print_json(&classify(&markdown, &url));
        }
        Commands::Fetch {
            url,
            output,
            backend,
            user_agent,
        } => {
            let mut config = load_config_or_exit();
            if user_agent.is_some() {
                config.user_agent = user_agent;
            }
            let result = page_fetcher(backend.unwrap_or_default(), &config)
                .fetch(&url)
                .await;
            match output {
                OutputFormat::Md => writeln_safe(&format_md_with_frontmatter(&result)),
                OutputFormat::Json => print_json(&result),
            }
        }
    }
}

struct CheckOptions {
    integration: String,
    max_concurrency: Option<usize>,
    trusted_domains: Vec<String>,
    output: OutputFormat,
    write: bool,
    backend: Backend,
}

async fn run_check(input: &Path, options: CheckOptions) {
    if options.write && is_stdin(input) {
        exit_with_error("--write needs a file path, not stdin");
    }

    let markdown = read_input_or_exit(input);
    let mut config = load_config_or_exit();
    if let Some(n) = options.max_concurrency {
        config.max_concurrency = n;
    }
    if !options.trusted_domains.is_empty() {
        config.trusted_domains = options.trusted_domains;
    }

    let judge = GeminiJudge::from_env().unwrap_or_else(|e| exit_with_error(&e.to_string()));
    let cancel = CancellationToken::new();
    let fetcher = page_fetcher(options.backend, &config).with_cancellation(cancel.clone());

    let sweeper = Sweeper::builder()
        .config(config)
        .fetcher(fetcher)
        .judge(judge)
        .cancellation(cancel.clone())
        .build()
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning remaining evaluations");
            cancel.cancel();
        }
    });

    let report = sweeper.sweep(&options.integration, &markdown).await;
    eprint!("{}", format_summary(&report));

    if options.write {
        if report.changed() {
            if let Err(e) = std::fs::write(input, &report.cleaned) {
                exit_with_error(&format!("Error writing {}: {}", input.display(), e));
            }
            info!(path = %input.display(), "Wrote cleaned document");
        } else {
            info!(path = %input.display(), "No changes");
        }
    }

    match options.output {
        OutputFormat::Md => write_safe(&report.cleaned),
        OutputFormat::Json => print_json(&report),
    }
}

fn page_fetcher(backend: Backend, config: &SweepConfig) -> PageFetcher {
    let fetcher = match backend {
        Backend::Http => PageFetcher::new(HttpBackend::new()),
        #[cfg(feature = "chromium")]
        Backend::Chromium => PageFetcher::new(docsweep::ChromiumBackend::new()),
    };
    fetcher.with_options(config.fetch_options())
}

fn load_config_or_exit() -> SweepConfig {
    SweepConfig::from_env().unwrap_or_else(|e| exit_with_error(&e.to_string()))
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn read_input_or_exit(path: &Path) -> String {
    let result = if is_stdin(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map(|_| buffer)
    } else {
        std::fs::read_to_string(path)
    };
    result.unwrap_or_else(|e| exit_with_error(&format!("Error reading {}: {}", path.display(), e)))
}

/// One line per verdict, removals first
fn format_summary(report: &SweepReport) -> String {
    let mut verdicts: Vec<_> = report.verdicts.iter().collect();
    verdicts.sort_by(|a, b| {
        b.should_remove
            .cmp(&a.should_remove)
            .then_with(|| a.url.cmp(&b.url))
    });

    let mut output = String::new();
    for verdict in verdicts {
        let action = if verdict.should_remove { "REMOVE" } else { "KEEP" };
        output.push_str(&format!(
            "{} [{}] {} ({})\n",
            action, verdict.status_code, verdict.url, verdict.reason
        ));
    }
    output.push_str(&format!(
        "{} evaluated, {} removed\n",
        report.verdicts.len(),
        report.removed.len()
    ));
    output
}

/// Format a fetch result as text with YAML frontmatter
fn format_md_with_frontmatter(result: &FetchResult) -> String {
    let mut output = String::new();

    output.push_str("---\n");
    output.push_str(&format!("url: {}\n", result.url));
    output.push_str(&format!("status_code: {}\n", result.status_code));
    if result.truncated == Some(true) {
        output.push_str("truncated: true\n");
    }
    output.push_str("---\n");

    // Failed fetches carry no content; show the error as body
    match &result.error {
        Some(err) if result.content.is_empty() => output.push_str(err),
        _ => output.push_str(&result.content),
    }

    output
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| exit_with_error(&format!("Error serializing output: {}", e)));
    writeln_safe(&json);
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Write to stdout with a trailing newline
fn writeln_safe(s: &str) {
    write_safe(&format!("{}\n", s));
}

/// Write to stdout, exit silently on broken pipe
fn write_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = handle.write_all(s.as_bytes()).and_then(|_| handle.flush()) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}
