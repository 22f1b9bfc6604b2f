//! Error types for rarity-ranker
//!
//! Fetch errors are per-item and never fatal: the pool logs them and the
//! item is scored with no attributes. `RankerError` covers run-level
//! failures, which abort before or after the worker pool runs.

use std::time::Duration;
use thiserror::Error;

/// Failure fetching one item from a metadata source
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network or connection error contacting the source
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-success status or unreadable body
    #[error("Response error: {0}")]
    Response(String),

    /// Body is not a JSON object
    #[error("Decode error: {0}")]
    Decode(String),

    /// Source did not answer within the per-fetch timeout
    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),
}

/// Run-level error type
#[derive(Debug, Error)]
pub enum RankerError {
    /// Invalid configuration, detected before fetching begins
    #[error("Configuration error: {0}")]
    Config(String),

    /// Item rejected by the aggregator (out of range or duplicate id)
    #[error("Aggregation error: {0}")]
    Aggregate(String),

    /// A worker or aggregator task panicked or was aborted
    #[error("Task join error: {0}")]
    Join(String),

    /// HTTP client construction failed (see `RankerConfig::build_source`)
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// TOML layer could not be read or parsed
    #[error("Common error: {0}")]
    Common(#[from] rarity_common::Error),
}

/// Convenience Result type using RankerError
pub type Result<T> = std::result::Result<T, RankerError>;
