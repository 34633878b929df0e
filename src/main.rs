//! Rival-Harvest main entry point
//!
//! This is the command-line interface for the competitor game-page harvester.

use anyhow::Context;
use clap::Parser;
use rival_harvest::config::{load_config_with_hash, Config};
use rival_harvest::extract::ContentExtractor;
use rival_harvest::fetch::{FetchConfig, FetchRequest, HttpFetcher};
use rival_harvest::scheduler::{StaticRegistry, UpdateScheduler, UpdateTaskResult};
use rival_harvest::sitemap::SitemapReader;
use rival_harvest::storage::open_state_store;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Rival-Harvest: competitor game-page acquisition
///
/// Reads competitor sitemaps, records which game pages are new since the last
/// refresh, and extracts structured game content from individual pages.
#[derive(Parser, Debug)]
#[command(name = "rival-harvest")]
#[command(version)]
#[command(about = "Competitor game-page harvester", long_about = None)]
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

    /// Refetch every site, ignoring stored snapshots
    #[arg(long, conflicts_with_all = ["daemon", "history", "dry_run", "parse"])]
    force: bool,

    /// Run scheduled updates until interrupted
    #[arg(long, conflicts_with_all = ["history", "dry_run", "parse"])]
    daemon: bool,

    /// Show stored task history and exit
    #[arg(long, conflicts_with_all = ["dry_run", "parse"])]
    history: bool,

    /// Validate config and list the sites that would be updated
    #[arg(long, conflicts_with = "parse")]
    dry_run: bool,

    /// Fetch one page and print its parse result as JSON
    #[arg(long, value_name = "URL")]
    parse: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.history {
        handle_history(&config)?;
    } else if let Some(url) = &cli.parse {
        handle_parse(&config, url).await?;
    } else if cli.daemon {
        handle_daemon(config).await?;
    } else {
        handle_update(config, cli.force).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("rival_harvest=info,warn"),
            1 => EnvFilter::new("rival_harvest=debug,info"),
            2 => EnvFilter::new("rival_harvest=trace,debug"),
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

/// Wires the fetcher, sitemap reader and state store into a scheduler
fn build_scheduler(config: &Config) -> anyhow::Result<UpdateScheduler> {
    let fetcher = Arc::new(HttpFetcher::new(FetchConfig::from(&config.fetch))?);
    let reader = Arc::new(SitemapReader::new(fetcher));
    let registry = Arc::new(StaticRegistry::new(config.websites.clone()));
    let store = open_state_store(Path::new(&config.storage.database_path))?;

    let scheduler = UpdateScheduler::builder(store, registry, reader).build()?;
    scheduler.update_config(config.scheduler.clone())?;
    Ok(scheduler)
}

/// Handles the --dry-run mode
fn handle_dry_run(config: &Config) {
    println!("=== Rival-Harvest Dry Run ===\n");

    println!("Fetch:");
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Retries: {}", config.fetch.retries);
    println!("  Concurrency: {}", config.fetch.concurrency);
    println!("  Cache: {}", config.fetch.enable_cache);

    println!("\nScheduler:");
    println!("  Interval: {}h", config.scheduler.interval_hours);
    println!("  Auto update: {}", config.scheduler.auto_update);
    println!("  Max concurrent sites: {}", config.scheduler.max_concurrent);
    println!("  Max retries: {}", config.scheduler.max_retries);

    println!("\nDatabase: {}", config.storage.database_path);

    let selected: Vec<_> = config
        .websites
        .iter()
        .filter(|site| site.enabled || !config.scheduler.only_enabled_sites)
        .collect();

    println!("\nWebsites ({} of {}):", selected.len(), config.websites.len());
    for site in &config.websites {
        let marker = if selected.iter().any(|s| s.id == site.id) { "+" } else { "-" };
        println!("  {} {} ({}) {}", marker, site.name, site.id, site.sitemap_url);
        if let Some(pattern) = &site.scraping.url_pattern {
            println!("      pattern: {}", pattern);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would update {} site(s)", selected.len());
}

/// Handles the --history mode
fn handle_history(config: &Config) -> anyhow::Result<()> {
    let store = open_state_store(Path::new(&config.storage.database_path))?;
    let history = store.load_history()?;

    if history.is_empty() {
        println!("No update runs recorded");
    }
    for task in &history {
        print_task(task);
    }

    let site_ids = store.snapshot_site_ids()?;
    if !site_ids.is_empty() {
        println!("\nStored sitemap snapshots:");
    }
    for site_id in &site_ids {
        let Some(snapshot) = store.load_snapshot(site_id)? else {
            continue;
        };
        println!(
            "  {} ({}): {:?}, {} URLs, fetched {}",
            snapshot.website_name,
            snapshot.website_id,
            snapshot.status,
            snapshot.total_urls,
            snapshot.last_fetched.format("%Y-%m-%d %H:%M:%S UTC")
        );
        if let Some(error) = &snapshot.error_message {
            println!("    error: {}", error);
        }
    }
    Ok(())
}

/// Handles the --parse mode
async fn handle_parse(config: &Config, url: &str) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(FetchConfig::from(&config.fetch))?;
    let response = fetcher
        .fetch(&FetchRequest::get(url))
        .await
        .with_context(|| format!("failed to fetch {url}"))?;

    let result = ContentExtractor::new().parse_content(&response, None);
    if !result.success {
        tracing::warn!(
            "Parser '{}' failed on {}: {}",
            result.parser_name,
            url,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Handles the default mode: one manual update
async fn handle_update(config: Config, force: bool) -> anyhow::Result<()> {
    let scheduler = build_scheduler(&config)?;

    if force {
        tracing::info!("Starting full refresh of {} site(s)", config.websites.len());
    } else {
        tracing::info!("Starting incremental update of {} site(s)", config.websites.len());
    }

    let result = scheduler.trigger_manual_update(force).await?;
    print_task(&result);
    Ok(())
}

/// Handles the --daemon mode
async fn handle_daemon(config: Config) -> anyhow::Result<()> {
    let scheduler = build_scheduler(&config)?;
    scheduler.start_scheduler(config.scheduler.clone())?;

    tracing::info!(
        "Scheduler started (every {}h); press Ctrl-C to stop",
        config.scheduler.interval_hours
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    tracing::info!("Stopping scheduler");
    if let Some(cancelled) = scheduler.stop_scheduler()? {
        tracing::warn!("Run {} cancelled", cancelled.task_id);
    }
    Ok(())
}

fn print_task(task: &UpdateTaskResult) {
    println!(
        "{} [{:?}] started {}",
        task.task_id,
        task.status,
        task.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  sites: {} total, {} ok, {} failed",
        task.total_sites, task.success_sites, task.failed_sites
    );
    println!(
        "  urls: {} new, {} updated",
        task.new_urls, task.updated_urls
    );
    println!("  duration: {}ms", task.duration_ms);
    for error in &task.errors {
        println!("  error: {}", error);
    }
}
