//! # Rarity Common Library
//!
//! Shared code for the rarity tools:
//! - Error types
//! - Bootstrap TOML configuration and config file resolution
//! - Tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
