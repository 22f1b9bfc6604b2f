//! Scoring and ranking results

use serde::Serialize;

/// Rarity score of one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCard {
    pub id: usize,
    /// Non-negative; 0.0 for an item without attributes
    pub rarity: f64,
}

/// One row of the top-N output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedEntry {
    /// 1-based position
    pub rank: usize,
    pub id: usize,
    pub rarity: f64,
}
