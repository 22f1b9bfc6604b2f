//! Collection aggregator
//!
//! The only writer of the item array and frequency tables. Items arrive in
//! fetch-completion order; indexing by id restores a deterministic layout.
//! `finalize` consumes the aggregator and hands back an immutable
//! [`CollectionStats`], so scoring can never observe a partially built table.

use crate::error::{RankerError, Result};
use crate::models::Item;
use rarity_common::config::FrequencyMode;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Frequency tables built from every received item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    mode: FrequencyMode,
    values_in_category: HashMap<String, HashSet<String>>,
    value_counts: HashMap<String, u64>,
    pair_counts: HashMap<(String, String), u64>,
}

impl CollectionStats {
    fn new(mode: FrequencyMode) -> Self {
        Self {
            mode,
            values_in_category: HashMap::new(),
            value_counts: HashMap::new(),
            pair_counts: HashMap::new(),
        }
    }

    pub fn mode(&self) -> FrequencyMode {
        self.mode
    }

    /// Category → distinct values seen anywhere in the collection
    pub fn values_in_category(&self) -> &HashMap<String, HashSet<String>> {
        &self.values_in_category
    }

    /// Value → number of (category, value) occurrences, regardless of category
    ///
    /// Counted once per attribute pair, not once per item: an item carrying
    /// the same value under two categories adds 2. Equal to the number of
    /// items carrying the value whenever values are unique within an item.
    pub fn value_counts(&self) -> &HashMap<String, u64> {
        &self.value_counts
    }

    /// Number of distinct values recorded for `category`
    pub fn distinct_values(&self, category: &str) -> Option<usize> {
        self.values_in_category.get(category).map(HashSet::len)
    }

    /// Frequency of a (category, value) pair under the configured mode
    ///
    /// In `Value` mode identical value strings under different categories
    /// share one count.
    pub fn frequency(&self, category: &str, value: &str) -> Option<u64> {
        match self.mode {
            FrequencyMode::Value => self.value_counts.get(value).copied(),
            FrequencyMode::CategoryValue => self
                .pair_counts
                .get(&(category.to_string(), value.to_string()))
                .copied(),
        }
    }
}

/// Dense item array plus the finished statistics
#[derive(Debug, Clone)]
pub struct AggregatedCollection {
    /// Exactly `count` items, `items[i].id == i`
    pub items: Vec<Item>,
    pub stats: CollectionStats,
    /// Items actually received from the pool
    pub received: usize,
}

/// Single consumer of fetched items
pub struct Aggregator {
    slots: Vec<Option<Item>>,
    stats: CollectionStats,
    received: usize,
}

impl Aggregator {
    pub fn new(count: usize, mode: FrequencyMode) -> Self {
        Self {
            slots: vec![None; count],
            stats: CollectionStats::new(mode),
            received: 0,
        }
    }

    /// Store an item and fold its attributes into the frequency tables
    ///
    /// # Errors
    /// `RankerError::Aggregate` for an id outside the collection or an id
    /// already recorded; the tables are left untouched.
    pub fn record(&mut self, item: Item) -> Result<()> {
        let count = self.slots.len();
        let slot = self.slots.get_mut(item.id).ok_or_else(|| {
            RankerError::Aggregate(format!(
                "item id {} outside collection of {} items",
                item.id, count
            ))
        })?;

        if slot.is_some() {
            return Err(RankerError::Aggregate(format!(
                "item id {} recorded twice",
                item.id
            )));
        }

        for (category, value) in &item.attributes {
            self.stats
                .values_in_category
                .entry(category.clone())
                .or_default()
                .insert(value.clone());
            *self.stats.value_counts.entry(value.clone()).or_insert(0) += 1;
            *self
                .stats
                .pair_counts
                .entry((category.clone(), value.clone()))
                .or_insert(0) += 1;
        }

        *slot = Some(item);
        self.received += 1;
        Ok(())
    }

    /// Drain `results` until every sender is dropped
    pub async fn consume(mut self, mut results: mpsc::Receiver<Item>) -> Self {
        while let Some(item) = results.recv().await {
            let id = item.id;
            if let Err(e) = self.record(item) {
                warn!(index = id, error = %e, "Discarding item");
            }
        }
        debug!(received = self.received, "Results stream closed");
        self
    }

    pub fn received(&self) -> usize {
        self.received
    }

    /// Close aggregation; unfetched slots become empty items
    pub fn finalize(self) -> AggregatedCollection {
        let items = self
            .slots
            .into_iter()
            .enumerate()
            .map(|(id, slot)| slot.unwrap_or_else(|| Item::empty(id)))
            .collect();

        AggregatedCollection {
            items,
            stats: self.stats,
            received: self.received,
        }
    }
}
