//! Pipeline driver
//!
//! indices → fetch pool → results channel → aggregator → scorer → ranking
//!
//! The aggregator runs as its own task and is awaited after the pool
//! finishes, so every emitted item is recorded before statistics are
//! finalized and scoring starts.

use crate::error::{RankerError, Result};
use crate::models::{CollectionSpec, Item, RankedEntry, ScoreCard};
use crate::services::aggregator::{Aggregator, CollectionStats};
use crate::services::fetch_pool::{FetchEvent, FetchPool, FetchPoolConfig, FetchSummary};
use crate::services::metadata_source::MetadataSource;
use crate::services::{ranking, rarity_scorer};
use rarity_common::config::FrequencyMode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Tuning for one ranking run
#[derive(Debug, Clone)]
pub struct RankerOptions {
    pub pool: FetchPoolConfig,
    /// Number of ranked entries to report
    pub top_n: usize,
    pub frequency_mode: FrequencyMode,
}

impl Default for RankerOptions {
    fn default() -> Self {
        Self {
            pool: FetchPoolConfig::default(),
            top_n: rarity_common::config::DEFAULT_TOP_N,
            frequency_mode: FrequencyMode::default(),
        }
    }
}

/// Structured result of a run
#[derive(Debug, Clone)]
pub struct RarityReport {
    /// Dense item array, `items[i].id == i`
    pub items: Vec<Item>,
    /// One card per item, in id order
    pub scorecards: Vec<ScoreCard>,
    /// Highest rarity first, at most `top_n` entries
    pub top: Vec<RankedEntry>,
    pub stats: CollectionStats,
    pub summary: FetchSummary,
}

/// Fetch, aggregate, score and rank a collection
pub struct RarityPipeline {
    source: Arc<dyn MetadataSource>,
    options: RankerOptions,
    event_tx: Option<mpsc::Sender<FetchEvent>>,
}

impl RarityPipeline {
    pub fn new(source: Arc<dyn MetadataSource>, options: RankerOptions) -> Self {
        Self {
            source,
            options,
            event_tx: None,
        }
    }

    /// Create pipeline with an event channel for worker progress
    pub fn with_events(
        source: Arc<dyn MetadataSource>,
        options: RankerOptions,
        event_tx: mpsc::Sender<FetchEvent>,
    ) -> Self {
        Self {
            source,
            options,
            event_tx: Some(event_tx),
        }
    }

    /// Run the whole pipeline
    ///
    /// # Errors
    /// Configuration errors before any fetch starts, or a panicked task.
    /// Individual fetch failures are not errors.
    pub async fn run(&self, spec: &CollectionSpec, cancel: CancellationToken) -> Result<RarityReport> {
        self.options.pool.validate()?;

        let pool = match &self.event_tx {
            Some(tx) => FetchPool::with_events(
                self.options.pool.clone(),
                Arc::clone(&self.source),
                tx.clone(),
            ),
            None => FetchPool::new(self.options.pool.clone(), Arc::clone(&self.source)),
        };

        let (results_tx, results_rx) = mpsc::channel::<Item>(self.options.pool.workers);
        let consumer = tokio::spawn(
            Aggregator::new(spec.count(), self.options.frequency_mode).consume(results_rx),
        );

        let summary = pool.run(spec, results_tx, cancel).await?;

        let aggregator = consumer
            .await
            .map_err(|e| RankerError::Join(e.to_string()))?;
        let collection = aggregator.finalize();

        info!(
            items = collection.items.len(),
            received = collection.received,
            categories = collection.stats.values_in_category().len(),
            mode = %collection.stats.mode(),
            "Aggregation complete"
        );

        let scorecards = rarity_scorer::score_all(&collection.items, &collection.stats);
        let top = ranking::rank(&scorecards, self.options.top_n);

        Ok(RarityReport {
            items: collection.items,
            scorecards,
            top,
            stats: collection.stats,
            summary,
        })
    }
}
