//! carsensor-crawler main entry point
//!
//! This is the command-line interface for the listing harvester.

use anyhow::Context;
use carsensor_crawler::config::{load_config_with_hash, Config};
use carsensor_crawler::output::{
    print_statistics, spawn_progress_logger, write_all, CsvSink, HarvestStatistics, RecordSink,
    SqliteSink,
};
use carsensor_crawler::{Coordinator, DiscoveryError, HarvestError};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use url::Url;

/// carsensor-crawler: a used-vehicle listing harvester
///
/// Discovers every model with enough listings, walks all of its result
/// pages and exports one row per listing.
#[derive(Parser, Debug)]
#[command(name = "carsensor-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A used-vehicle listing harvester", long_about = None)]
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

    /// Minimum listing count for a model to be crawled (overrides config)
    #[arg(long, value_name = "N")]
    threshold: Option<u64>,

    /// Discover models and list them without crawling
    #[arg(long, conflicts_with = "model")]
    dry_run: bool,

    /// Crawl a single model catalog URL, skipping discovery
    #[arg(long, value_name = "URL")]
    model: Option<Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(threshold) = cli.threshold {
        tracing::info!("Threshold overridden on the command line: {}", threshold);
        config.crawler.threshold = threshold;
    }

    let coordinator = Coordinator::new(&config).context("Failed to set up the crawler")?;

    if cli.dry_run {
        handle_dry_run(&coordinator).await
    } else {
        handle_crawl(coordinator, &config, &config_hash, cli.model).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("carsensor_crawler=info,warn"),
            1 => EnvFilter::new("carsensor_crawler=debug,info"),
            2 => EnvFilter::new("carsensor_crawler=trace,debug"),
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

/// Handles the --dry-run mode: shows which models would be crawled
async fn handle_dry_run(coordinator: &Coordinator) -> anyhow::Result<()> {
    println!("=== carsensor-crawler Dry Run ===\n");
    println!("Site root: {}\n", coordinator.site_root());

    let models = coordinator
        .discover()
        .await
        .context("Catalog discovery failed")?;

    println!("Models ({}):", models.len());
    for model in &models {
        println!("  - {} ({} listings)", model.url, model.count);
    }

    println!(
        "\n✓ Would crawl {} models, {} announced listings",
        models.len(),
        models.iter().map(|m| m.count).sum::<u64>()
    );

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    coordinator: Coordinator,
    config: &Config,
    config_hash: &str,
    model: Option<Url>,
) -> anyhow::Result<()> {
    let (progress_tx, progress_rx) = tokio::sync::mpsc::unbounded_channel();
    let progress_logger = spawn_progress_logger(progress_rx);
    let coordinator = coordinator.with_progress(progress_tx);

    // Ctrl-C stops every model before its next page; gathered records are kept
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current pages");
            cancel.cancel();
        }
    });

    let crawls = match model {
        Some(url) => {
            tracing::info!("Crawling single model: {}", url);
            coordinator.crawl_models(vec![url]).await
        }
        None => match coordinator.run().await {
            Ok(crawls) => crawls,
            Err(HarvestError::Discovery(DiscoveryError::Cancelled)) => {
                tracing::warn!("Cancelled during discovery, nothing to export");
                return Ok(());
            }
            Err(e) => {
                tracing::error!("Crawl failed: {}", e);
                return Err(e.into());
            }
        },
    };

    // Dropping the coordinator closes the progress channel
    drop(coordinator);
    let _ = progress_logger.await;

    let mut sinks: Vec<Box<dyn RecordSink>> = Vec::new();
    let csv_path = Path::new(&config.output.csv_path);
    sinks.push(Box::new(CsvSink::create(csv_path).with_context(|| {
        format!("Failed to create CSV output at {}", csv_path.display())
    })?));

    if let Some(database_path) = &config.output.database_path {
        let database_path = Path::new(database_path);
        sinks.push(Box::new(SqliteSink::open(database_path, config_hash).with_context(
            || format!("Failed to open database at {}", database_path.display()),
        )?));
    }

    write_all(&crawls, &mut sinks).context("Failed to write records")?;
    tracing::info!("Records written to {}", csv_path.display());

    let stats = HarvestStatistics::from_crawls(&crawls);
    print_statistics(&stats);

    Ok(())
}
