//! Data models for the rarity pipeline

pub mod collection;
pub mod item;
pub mod scorecard;

pub use collection::CollectionSpec;
pub use item::{Attributes, Item};
pub use scorecard::{RankedEntry, ScoreCard};
