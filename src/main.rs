//! Sitescribe main entry point
//!
//! This is the command-line interface for the Sitescribe crawler and
//! extractor.

use anyhow::Context;
use clap::Parser;
use sitescribe::config::{load_config_with_hash, Config, CrawlTarget};
use sitescribe::crawler::{crawl_until, shutdown_signal};
use sitescribe::extract::ExtractionPipeline;
use sitescribe::output::{print_crawl_summary, print_extraction_summary, DocumentWriter};
use sitescribe::storage::{discovery_path, read_discovery_file};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: u8 = 0;

/// Exit code when persistence failed for most documents
const EXIT_PERSISTENCE_FAILURE: u8 = 2;

/// Exit code after an operator interrupt (128 + SIGINT)
const EXIT_INTERRUPTED: u8 = 130;

/// Sitescribe: a polite single-domain crawler and Markdown extractor
///
/// Sitescribe discovers every reachable page of one domain while respecting
/// robots.txt and politeness delays, records the URLs in a JSON-lines file,
/// then converts each page's main content into a Markdown document.
#[derive(Parser, Debug)]
#[command(name = "sitescribe")]
#[command(version)]
#[command(about = "A polite single-domain crawler and Markdown extractor", long_about = None)]
struct Cli {
    /// URL the crawl starts from
    #[arg(value_name = "START_URL")]
    start_url: String,

    /// Allowed domain (defaults to the start URL's host without `www.`)
    #[arg(short, long, value_name = "DOMAIN")]
    domain: Option<String>,

    /// Root directory for the extracted documents
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Discovery file name inside the discovery directory
    #[arg(long, value_name = "FILE")]
    discovery_file: Option<String>,

    /// Only crawl and write the discovery file
    #[arg(long, conflicts_with = "extract_only")]
    crawl_only: bool,

    /// Only extract pages listed in an existing discovery file
    #[arg(long, conflicts_with = "crawl_only")]
    extract_only: bool,

    /// Validate inputs and show what would be done without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli, shutdown_signal).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sitescribe=info,warn"),
            1 => EnvFilter::new("sitescribe=debug,info"),
            2 => EnvFilter::new("sitescribe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Runs the requested phases; `shutdown` yields a fresh interrupt future per phase
async fn run<S, F>(cli: Cli, shutdown: S) -> anyhow::Result<u8>
where
    S: Fn() -> F,
    F: Future<Output = ()>,
{
    let mut config = resolve_config(cli.config.as_deref())?;
    if let Some(output) = &cli.output {
        config.output.documents_dir = output.display().to_string();
    }

    let target = CrawlTarget::from_seed(&cli.start_url, cli.domain.as_deref())
        .context("Could not resolve the crawl target")?;
    if !target.seed_in_scope() {
        anyhow::bail!(
            "Start URL {} is outside the allowed domain {}",
            target.seed,
            target.domain
        );
    }

    let discovery_file = discovery_path(
        Path::new(&config.output.discovery_dir),
        &target.seed,
        cli.discovery_file.as_deref(),
    );

    if cli.dry_run {
        handle_dry_run(&config, &target, &discovery_file, &cli);
        return Ok(EXIT_SUCCESS);
    }

    if !cli.extract_only {
        let interrupted = handle_crawl(&config, target, &discovery_file, shutdown()).await?;
        if interrupted {
            tracing::warn!("Crawl was interrupted, skipping extraction");
            return Ok(EXIT_INTERRUPTED);
        }
    }

    if cli.crawl_only {
        return Ok(EXIT_SUCCESS);
    }

    handle_extract(&config, &discovery_file, shutdown()).await
}

/// Loads the configuration file, or the validated defaults without one
fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            config
                .validate()
                .context("Default configuration is invalid")?;
            tracing::debug!("No configuration file given, using defaults");
            Ok(config)
        }
    }
}

/// Handles the --dry-run mode: shows the resolved target and configuration
fn handle_dry_run(config: &Config, target: &CrawlTarget, discovery_file: &Path, cli: &Cli) {
    println!("=== Sitescribe Dry Run ===\n");

    println!("Target:");
    println!("  Start URL: {}", target.seed);
    println!("  Allowed domain: {}", target.domain);
    println!();

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.concurrency);
    println!("  Per-host concurrency: {}", config.crawler.per_host_concurrency);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Max redirects: {}", config.crawler.max_redirects);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);
    match config.crawler.max_depth {
        Some(depth) => println!("  Max depth: {}", depth),
        None => println!("  Max depth: unbounded"),
    }
    match config.crawler.max_pages {
        Some(pages) => println!("  Max pages: {}", pages),
        None => println!("  Max pages: unbounded"),
    }

    println!("\nPoliteness:");
    println!("  Delay: {}ms", config.politeness.delay_ms);
    println!("  Autothrottle: {}", config.politeness.autothrottle);
    if config.politeness.autothrottle {
        println!(
            "  Autothrottle delays: start {}ms, max {}ms, target concurrency {}",
            config.politeness.autothrottle_start_delay_ms,
            config.politeness.autothrottle_max_delay_ms,
            config.politeness.autothrottle_target_concurrency
        );
    }

    println!("\nUser Agent:");
    println!("  Crawl: {}", config.user_agent.header_value());
    if let Some(agent) = &config.extraction.user_agent {
        println!("  Extraction: {}", agent);
    }

    println!("\nExtraction:");
    println!("  Workers: {}", config.extraction.concurrency);
    println!("  Favor: {:?}", config.extraction.favor);
    println!("  Tables: {}", config.extraction.include_tables);
    println!("  Images: {}", config.extraction.include_images);
    println!("  Comments: {}", config.extraction.include_comments);
    println!("  Links: {}", config.extraction.include_links);

    println!("\nOutput:");
    println!("  Discovery file: {}", discovery_file.display());
    println!("  Documents: {}", config.output.documents_dir);

    let phases = match (cli.crawl_only, cli.extract_only) {
        (true, _) => "crawl",
        (_, true) => "extract",
        _ => "crawl, then extract",
    };
    println!("\n✓ Configuration is valid");
    println!("✓ Would run: {}", phases);
}

/// Handles the crawl phase; returns whether it was interrupted
async fn handle_crawl<F>(
    config: &Config,
    target: CrawlTarget,
    discovery_file: &Path,
    shutdown: F,
) -> anyhow::Result<bool>
where
    F: Future<Output = ()>,
{
    tracing::info!(
        "Crawling {} (domain: {})",
        target.seed,
        target.domain
    );

    let summary = crawl_until(config, target, discovery_file, shutdown)
        .await
        .context("Crawl failed")?;

    print_crawl_summary(&summary);
    println!();
    Ok(summary.interrupted)
}

/// Handles the extraction phase
async fn handle_extract<F>(
    config: &Config,
    discovery_file: &Path,
    shutdown: F,
) -> anyhow::Result<u8>
where
    F: Future<Output = ()>,
{
    let records = read_discovery_file(discovery_file).with_context(|| {
        format!(
            "Could not read discovery file {}",
            discovery_file.display()
        )
    })?;

    if records.is_empty() {
        tracing::warn!(
            "No URLs found in {}, nothing to extract",
            discovery_file.display()
        );
    }

    let pipeline = ExtractionPipeline::new(config).context("Could not start extraction")?;
    let writer = DocumentWriter::new(&config.output.documents_dir);
    tracing::info!("Writing documents under {}", writer.root().display());

    let summary = pipeline.run_until(records, &writer, shutdown).await;
    print_extraction_summary(&summary);

    if summary.persistence_failed_for_majority() {
        tracing::error!(
            failed = summary.write_failures,
            "Most documents could not be saved"
        );
        return Ok(EXIT_PERSISTENCE_FAILURE);
    }
    if summary.interrupted {
        return Ok(EXIT_INTERRUPTED);
    }

    Ok(EXIT_SUCCESS)
}
