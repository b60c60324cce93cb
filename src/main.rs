//! Vasa-Harvest main entry point
//!
//! This is the command-line interface for the race-result harvester.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vasa_harvest::config::{load_config_with_hash, Config};
use vasa_harvest::harvest::{harvest, harvest_event, HarvestOptions};
use vasa_harvest::url::years_url;

/// Vasa-Harvest: a polite race-result harvester
///
/// Walks the result listings of every event of every year, follows each
/// participant's detail page, and stores bib numbers, classes and split
/// times as one JSON file per event. Events already listed in the progress
/// index are skipped, so an interrupted harvest picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "vasa-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite race-result harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Crawl events again even if the index lists them as done
    #[arg(long)]
    fresh: bool,

    /// Only harvest these years (repeatable)
    #[arg(long = "year", value_name = "YEAR")]
    years: Vec<String>,

    /// Crawl a single event; requires exactly one --year
    #[arg(long, value_name = "ID", requires = "years")]
    event: Option<String>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        return handle_dry_run(&config, &cli);
    }

    match &cli.event {
        Some(event_id) => handle_single_event(&config, &cli.years, event_id).await,
        None => handle_harvest(&config, cli.years.clone(), cli.fresh).await,
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vasa_harvest=info,warn"),
            1 => EnvFilter::new("vasa_harvest=debug,info"),
            2 => EnvFilter::new("vasa_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the effective settings and endpoints
fn handle_dry_run(config: &Config, cli: &Cli) -> anyhow::Result<()> {
    println!("=== Vasa-Harvest Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Years endpoint: {}", years_url(&config.site)?);
    println!(
        "  Events endpoint: {}{}",
        config.site.base_url.trim_end_matches('/'),
        config.site.events_path
    );
    println!(
        "  Seed URL: {}{}",
        config.site.base_url.trim_end_matches('/'),
        config.site.seed_path
    );

    println!("\nCrawler Configuration:");
    println!("  Request delay: {}ms", config.crawler.request_delay);
    println!(
        "  Retries: {} (initial backoff {}ms)",
        config.crawler.max_retries, config.crawler.retry_delay
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Max pages per event: {}", config.crawler.max_pages);
    println!(
        "  Concurrent events: {}",
        config.crawler.max_concurrent_events
    );
    println!("  Obey robots.txt: {}", config.crawler.obey_robots);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);
    println!("  Contact Email: {}", config.user_agent.contact_email);

    println!("\nSelectors:");
    println!("  Pagination: {}", config.selectors.pagination);
    println!("  Detail link pattern: {}", config.selectors.detail_link);
    println!("  Split rows: {}", config.selectors.split_rows);

    println!("\nOutput:");
    println!("  Events directory: {}", config.output.events_dir);
    println!("  Index: {}", config.output.index_path);

    println!("\n✓ Configuration is valid");
    match (&cli.event, cli.years.as_slice()) {
        (Some(event_id), [year]) => {
            println!("✓ Would crawl event {} of {}", event_id, year)
        }
        (_, []) => println!("✓ Would harvest every year listed by the site"),
        (_, years) => println!("✓ Would harvest years: {}", years.join(", ")),
    }

    Ok(())
}

/// Handles --event: one event into its output file and the index
async fn handle_single_event(config: &Config, years: &[String], event_id: &str) -> anyhow::Result<()> {
    let [year] = years else {
        bail!("--event needs exactly one --year, got {}", years.len());
    };

    let stats = harvest_event(config, year, event_id)
        .await
        .with_context(|| format!("Crawl of event {} ({}) failed", event_id, year))?;

    tracing::info!(
        "Event {} harvested: {} records, {} pages fetched, {} failed",
        event_id,
        stats.records_emitted,
        stats.pages_fetched,
        stats.failed_pages
    );
    Ok(())
}

/// Handles the main harvest loop
async fn handle_harvest(config: &Config, years: Vec<String>, fresh: bool) -> anyhow::Result<()> {
    if fresh {
        tracing::info!("Starting fresh harvest (ignoring the progress index)");
    } else {
        tracing::info!("Starting harvest (events in the progress index are skipped)");
    }

    let options = HarvestOptions { years, fresh };
    let summary = harvest(config, &options).await.context("Harvest failed")?;

    if summary.events_failed > 0 {
        tracing::warn!(
            "{} events failed and will be retried on the next run",
            summary.events_failed
        );
    }
    Ok(())
}
