//! rarity-ranker - collection rarity ranking
//!
//! Fetches `{endpoint}/{collection}/{index}.json` for every item, builds
//! attribute frequency tables and prints the rarest items.

use anyhow::{Context, Result};
use clap::Parser;
use rarity_common::config::FrequencyMode;
use rarity_ranker::config::{ConfigOverrides, RankerConfig};
use rarity_ranker::services::fetch_pool::log_progress;
use rarity_ranker::services::report::format_report;
use rarity_ranker::RarityPipeline;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Command-line arguments for rarity-ranker
#[derive(Parser, Debug)]
#[command(name = "rarity-ranker")]
#[command(about = "Rank the rarest items of a numbered metadata collection")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "RARITY_CONFIG")]
    config: Option<PathBuf>,

    /// Metadata endpoint base URL
    #[arg(long, env = "RARITY_ENDPOINT")]
    endpoint: Option<String>,

    /// Collection identifier
    #[arg(long, env = "RARITY_COLLECTION")]
    collection: Option<String>,

    /// Number of items in the collection
    #[arg(short = 'n', long, env = "RARITY_COUNT")]
    count: Option<usize>,

    /// Concurrent fetch workers
    #[arg(short, long, env = "RARITY_WORKERS")]
    workers: Option<usize>,

    /// Number of ranked items to print
    #[arg(long, env = "RARITY_TOP_N")]
    top_n: Option<usize>,

    /// Per-fetch timeout in seconds
    #[arg(long, env = "RARITY_FETCH_TIMEOUT_SECS")]
    fetch_timeout_secs: Option<u64>,

    /// Frequency keying: value | category_value
    #[arg(long, env = "RARITY_FREQUENCY_MODE")]
    frequency_mode: Option<FrequencyMode>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            endpoint: self.endpoint.clone(),
            collection: self.collection.clone(),
            count: self.count,
            workers: self.workers,
            top_n: self.top_n,
            fetch_timeout_secs: self.fetch_timeout_secs,
            frequency_mode: self.frequency_mode,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) = RankerConfig::load(args.config.as_deref(), args.overrides())
        .context("Invalid configuration")?;

    rarity_common::logging::init_tracing(&config.logging)?;
    config_source.log();

    info!("Starting rarity-ranker v{}", env!("CARGO_PKG_VERSION"));
    info!(
        location = config.collection.source_location(),
        count = config.collection.count(),
        workers = config.options.pool.workers,
        mode = %config.options.frequency_mode,
        "Collection configured"
    );

    let source = config.build_source()?;

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping job distribution");
            ctrl_c_token.cancel();
        }
    });

    let (event_tx, event_rx) = mpsc::channel(256);
    let progress = tokio::spawn(log_progress(event_rx, config.collection.count()));

    let pipeline = RarityPipeline::with_events(Arc::new(source), config.options.clone(), event_tx);
    let report = pipeline.run(&config.collection, cancel).await?;

    // Pipeline owned the last event sender
    drop(pipeline);
    let _ = progress.await;

    if report.summary.failed > 0 || report.summary.cancelled {
        warn!(
            failed = report.summary.failed,
            skipped = report.summary.skipped(),
            "Some items were scored without attributes"
        );
    }

    print!("{}", format_report(&report.top));

    Ok(())
}
