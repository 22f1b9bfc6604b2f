//! Top-N ranking of score cards

use crate::models::{RankedEntry, ScoreCard};

/// Stable descending sort by rarity, truncated to `n`
///
/// Equal rarities keep their input order. When fewer than `n` cards exist
/// all of them are returned.
pub fn rank(scorecards: &[ScoreCard], n: usize) -> Vec<RankedEntry> {
    let mut ordered: Vec<&ScoreCard> = scorecards.iter().collect();
    ordered.sort_by(|a, b| b.rarity.total_cmp(&a.rarity));

    ordered
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(position, card)| RankedEntry {
            rank: position + 1,
            id: card.id,
            rarity: card.rarity,
        })
        .collect()
}
