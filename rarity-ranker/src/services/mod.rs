//! Pipeline stages

pub mod aggregator;
pub mod fetch_pool;
pub mod metadata_source;
pub mod ranking;
pub mod rarity_scorer;
pub mod report;

pub use aggregator::{AggregatedCollection, Aggregator, CollectionStats};
pub use fetch_pool::{FetchEvent, FetchPool, FetchPoolConfig, FetchSummary};
pub use metadata_source::{HttpMetadataSource, MetadataSource};
