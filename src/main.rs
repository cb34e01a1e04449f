//! Sumi-Scribe main entry point
//!
//! This is the command-line interface for the Sumi-Scribe documentation harvester.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Duration;
use sumi_scribe::config::{load_config_with_hash, Config};
use sumi_scribe::crawler::build_http_client;
use sumi_scribe::output::print_summary;
use sumi_scribe::seeds::collect_seeds;
use sumi_scribe::Harvester;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Sumi-Scribe: a documentation corpus harvester
///
/// Sumi-Scribe crawls a documentation site from its seed URLs, visits every
/// in-scope page once, and writes the pages as one plain-text corpus.
#[derive(Parser, Debug)]
#[command(name = "sumi-scribe")]
#[command(version = "1.0.0")]
#[command(about = "A documentation corpus harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Write the corpus here instead of the configured output path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Validate config and list the seeds without fetching any page
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
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }

    let client = build_http_client(
        &config.user_agent,
        Duration::from_millis(config.crawl.fetch_timeout),
    )
    .context("Failed to build HTTP client")?;
    let seeds = collect_seeds(&config, &client).await?;

    if cli.dry_run {
        print_dry_run(&config, &seeds);
        return Ok(());
    }

    handle_harvest(config, seeds, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scribe=info,warn"),
            1 => EnvFilter::new("sumi_scribe=debug,info"),
            2 => EnvFilter::new("sumi_scribe=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective settings and seeds
fn print_dry_run(config: &Config, seeds: &[Url]) {
    println!("=== Sumi-Scribe Dry Run ===\n");

    println!("Crawl:");
    println!("  Workers: {}", config.crawl.max_concurrency);
    println!("  Politeness delay: {}ms", config.crawl.politeness_delay);
    println!("  Fetch timeout: {}ms", config.crawl.fetch_timeout);
    match config.crawl.max_pages {
        Some(max) => println!("  Page cap: {}", max),
        None => println!("  Page cap: none"),
    }

    println!("\nFilter:");
    println!("  Include: {:?}", config.filter.include_prefixes);
    println!("  Exclude: {:?}", config.filter.exclude_substrings);
    println!("  Query strings: {:?}", config.filter.query);

    println!("\nExtract:");
    println!("  Content selectors: {:?}", config.extract.content_selectors);
    println!("  Noise selectors: {:?}", config.extract.noise_selectors);

    println!("\nOutput:");
    println!("  Corpus: {}", config.output.path);
    println!("  Title: {}", config.output.title);
    println!("  Order: {:?}", config.output.order);

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config, seeds: Vec<Url>, quiet: bool) -> anyhow::Result<()> {
    let path = PathBuf::from(&config.output.path);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create corpus file {}", path.display()))?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing in-flight pages");
            on_signal.cancel();
        }
    });

    let harvester = Harvester::with_http_client(config)?;
    let outcome = harvester
        .run(seeds, BufWriter::new(file), cancel)
        .await
        .context("Harvest failed")?;

    tracing::info!("Corpus written to {}", path.display());
    if !quiet {
        print_summary(&outcome.summary);
    }

    Ok(())
}
