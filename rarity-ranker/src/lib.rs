//! rarity-ranker library interface
//!
//! Fetches per-item metadata for a numbered collection, aggregates
//! attribute frequencies and ranks items by rarity.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;

pub use crate::error::{FetchError, RankerError, Result};
pub use crate::pipeline::{RankerOptions, RarityPipeline, RarityReport};
