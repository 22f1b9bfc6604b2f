//! Configuration resolution for rarity-ranker
//!
//! **Priority:** CLI / ENV (via clap) → TOML → compiled defaults

use crate::error::Result;
use crate::models::CollectionSpec;
use crate::pipeline::RankerOptions;
use crate::services::fetch_pool::FetchPoolConfig;
use crate::services::HttpMetadataSource;
use rarity_common::config::{
    resolve_toml_config, ConfigSource, FrequencyMode, LoggingConfig, TomlConfig,
    DEFAULT_COLLECTION, DEFAULT_COUNT, DEFAULT_ENDPOINT, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_TOP_N, DEFAULT_WORKERS,
};
use std::path::Path;
use std::time::Duration;

/// Command-line and environment overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub endpoint: Option<String>,
    pub collection: Option<String>,
    pub count: Option<usize>,
    pub workers: Option<usize>,
    pub top_n: Option<usize>,
    pub fetch_timeout_secs: Option<u64>,
    pub frequency_mode: Option<FrequencyMode>,
}

/// Fully resolved run configuration
#[derive(Debug, Clone)]
pub struct RankerConfig {
    pub collection: CollectionSpec,
    pub options: RankerOptions,
    pub logging: LoggingConfig,
}

impl RankerConfig {
    /// Read the TOML layer (explicit file or platform default) and resolve
    ///
    /// Nothing is logged here; the returned `ConfigSource` is reported once
    /// tracing has been initialised from `logging`.
    pub fn load(
        explicit: Option<&Path>,
        overrides: ConfigOverrides,
    ) -> Result<(Self, ConfigSource)> {
        let (toml, source) = resolve_toml_config(explicit)?;
        let config = Self::resolve(overrides, toml)?;
        Ok((config, source))
    }

    /// Layer overrides over the TOML file over compiled defaults
    ///
    /// # Errors
    /// `RankerError::Config` for a zero count, zero workers, zero timeout or
    /// an empty endpoint/collection.
    pub fn resolve(overrides: ConfigOverrides, toml: TomlConfig) -> Result<Self> {
        let endpoint = overrides
            .endpoint
            .or(toml.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let collection_id = overrides
            .collection
            .or(toml.collection)
            .unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let count = overrides.count.or(toml.count).unwrap_or(DEFAULT_COUNT);

        let collection = CollectionSpec::from_endpoint(count, &endpoint, &collection_id)?;

        let pool = FetchPoolConfig {
            workers: overrides.workers.or(toml.workers).unwrap_or(DEFAULT_WORKERS),
            fetch_timeout: Duration::from_secs(
                overrides
                    .fetch_timeout_secs
                    .or(toml.fetch_timeout_secs)
                    .unwrap_or(DEFAULT_FETCH_TIMEOUT_SECS),
            ),
            ..FetchPoolConfig::default()
        };
        pool.validate()?;

        let options = RankerOptions {
            pool,
            top_n: overrides.top_n.or(toml.top_n).unwrap_or(DEFAULT_TOP_N),
            frequency_mode: overrides
                .frequency_mode
                .or(toml.frequency_mode)
                .unwrap_or_default(),
        };

        Ok(Self {
            collection,
            options,
            logging: toml.logging,
        })
    }

    /// HTTP source honouring the configured fetch timeout
    pub fn build_source(&self) -> Result<HttpMetadataSource> {
        Ok(HttpMetadataSource::new(self.options.pool.fetch_timeout)?)
    }
}
