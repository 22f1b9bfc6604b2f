//! Rarity scoring
//!
//! rarity = Σ over (category, value) in the item of
//! 1 / (frequency(value) × distinct_values(category)).
//! Pairs missing from either table contribute nothing.

use crate::models::{Item, ScoreCard};
use crate::services::aggregator::CollectionStats;

/// Rarity of one item against finished statistics
pub fn score(item: &Item, stats: &CollectionStats) -> f64 {
    item.attributes
        .iter()
        .filter_map(|(category, value)| {
            let frequency = stats.frequency(category, value)?;
            let distinct = stats.distinct_values(category)?;
            if frequency == 0 || distinct == 0 {
                return None;
            }
            Some(1.0 / (frequency as f64 * distinct as f64))
        })
        .sum()
}

pub fn score_item(item: &Item, stats: &CollectionStats) -> ScoreCard {
    ScoreCard {
        id: item.id,
        rarity: score(item, stats),
    }
}

/// Score every item, preserving item order
pub fn score_all(items: &[Item], stats: &CollectionStats) -> Vec<ScoreCard> {
    items.iter().map(|item| score_item(item, stats)).collect()
}
