//! Sumi-Fanout main entry point
//!
//! This is the command-line interface for the Sumi-Fanout link crawler.

use anyhow::{bail, Context};
use clap::Parser;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_fanout::config::{
    read_config_with_hash, validate, validate_max_depth, Config, FetcherKind,
};
use sumi_fanout::crawler::{build_fetcher, crawl, Fetcher, StaticFetcher};
use sumi_fanout::output::{format_item, print_report};
use tracing_subscriber::EnvFilter;

const SAMPLE_SEED: &str = "https://golang.org/";
const SAMPLE_DEPTH: u32 = 4;

/// Sumi-Fanout: a bounded-depth concurrent link crawler
///
/// Crawls a link graph from a seed identifier, fetching every reachable
/// identifier at most once, and prints what it found.
#[derive(Parser, Debug)]
#[command(name = "sumi-fanout")]
#[command(version = "1.0.0")]
#[command(about = "A bounded-depth concurrent link crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG", required_unless_present = "sample")]
    config: Option<PathBuf>,

    /// Crawl the built-in golang.org sample graph instead of a configured one
    #[arg(long, conflicts_with = "config")]
    sample: bool,

    /// Override the seed identifier
    #[arg(long)]
    seed: Option<String>,

    /// Override the maximum depth
    #[arg(long)]
    depth: Option<u32>,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

/// What a single run will do, after config and flags are merged
struct RunPlan {
    seed: String,
    max_depth: u32,
    source: String,
    fetcher: Arc<dyn Fetcher>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let plan = build_plan(&cli)?;

    if cli.dry_run {
        handle_dry_run(&plan);
        return Ok(());
    }

    handle_crawl(plan).await;
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_fanout=info,warn"),
            1 => EnvFilter::new("sumi_fanout=debug,info"),
            2 => EnvFilter::new("sumi_fanout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Merges the configuration file (or the sample graph) with CLI overrides
fn build_plan(cli: &Cli) -> anyhow::Result<RunPlan> {
    if cli.sample {
        let max_depth = cli.depth.unwrap_or(SAMPLE_DEPTH);
        validate_max_depth(max_depth).context("invalid --depth for the sample graph")?;

        return Ok(RunPlan {
            seed: cli.seed.clone().unwrap_or_else(|| SAMPLE_SEED.to_string()),
            max_depth,
            source: "built-in golang.org sample".to_string(),
            fetcher: Arc::new(StaticFetcher::golang_sample()),
        });
    }

    let Some(path) = cli.config.as_ref() else {
        bail!("a configuration file is required unless --sample is given");
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (mut config, hash) = read_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    apply_overrides(&mut config, cli);
    validate(&config).with_context(|| format!("invalid configuration in {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    let fetcher = build_fetcher(&config).context("failed to build fetcher")?;
    let source = match config.fetcher.kind {
        FetcherKind::Static => format!("{} static pages from {}", config.pages.len(), path.display()),
        FetcherKind::Http => "HTTP".to_string(),
    };

    Ok(RunPlan {
        seed: config.crawler.seed,
        max_depth: config.crawler.max_depth,
        source,
        fetcher,
    })
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(seed) = &cli.seed {
        config.crawler.seed = seed.clone();
    }
    if let Some(depth) = cli.depth {
        config.crawler.max_depth = depth;
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(plan: &RunPlan) {
    println!("=== Sumi-Fanout Dry Run ===\n");
    println!("  Seed: {}", plan.seed);
    println!("  Max depth: {}", plan.max_depth);
    println!("  Fetcher: {}", plan.source);
    println!("\n✓ Configuration is valid");
}

/// Runs the crawl, printing each item as it arrives and a report at the end
async fn handle_crawl(plan: RunPlan) {
    tracing::info!("Fetcher: {}", plan.source);

    let mut stream = crawl(plan.seed, plan.max_depth, plan.fetcher);
    while let Some(item) = stream.next().await {
        println!("{}", format_item(&item));
    }

    let report = stream.report();
    tracing::info!(
        "Crawl completed: {} fetched, {} failed",
        report.fetched,
        report.failures.len()
    );
    print_report(&report);
}
