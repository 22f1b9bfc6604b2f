//! Bootstrap configuration loading
//!
//! Settings are layered with the following priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line and environment layers are handled by the binary (clap `env`);
//! this module owns the TOML layer and the compiled defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Default metadata endpoint base
pub const DEFAULT_ENDPOINT: &str = "https://go-challenge.skip.money";

/// Default collection identifier
pub const DEFAULT_COLLECTION: &str = "azuki";

/// Default collection size
pub const DEFAULT_COUNT: usize = 10_000;

/// Default number of concurrent fetch workers
pub const DEFAULT_WORKERS: usize = 5;

/// Default number of ranked entries to report
pub const DEFAULT_TOP_N: usize = 5;

/// Default per-fetch timeout in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// How attribute-value frequencies are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyMode {
    /// Count by raw value string only; identical values in different
    /// categories share one count
    #[default]
    Value,
    /// Count by (category, value) pair
    CategoryValue,
}

impl FromStr for FrequencyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "value" => Ok(FrequencyMode::Value),
            "category_value" | "category-value" => Ok(FrequencyMode::CategoryValue),
            other => Err(Error::Config(format!(
                "Unknown frequency mode '{}' (expected 'value' or 'category_value')",
                other
            ))),
        }
    }
}

impl fmt::Display for FrequencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrequencyMode::Value => write!(f, "value"),
            FrequencyMode::CategoryValue => write!(f, "category_value"),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; unset fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Metadata endpoint base URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Collection identifier appended to the endpoint
    #[serde(default)]
    pub collection: Option<String>,

    /// Number of items in the collection
    #[serde(default)]
    pub count: Option<usize>,

    /// Number of concurrent fetch workers
    #[serde(default)]
    pub workers: Option<usize>,

    /// Number of ranked entries to report
    #[serde(default)]
    pub top_n: Option<usize>,

    /// Per-fetch timeout in seconds
    #[serde(default)]
    pub fetch_timeout_secs: Option<u64>,

    /// Frequency keying mode
    #[serde(default)]
    pub frequency_mode: Option<FrequencyMode>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Reject log levels tracing does not understand
    pub fn validate(&self) -> Result<()> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(Error::Config(format!("Invalid log level: {}", other))),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform config file location: `<config_dir>/rarity-ranker/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rarity-ranker").join("config.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {}: {}", path.display(), e)))?;

    config.logging.validate()?;
    Ok(config)
}

/// Where the TOML layer came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file found at the platform location (if one could be determined)
    Defaults { searched: Option<PathBuf> },
}

impl ConfigSource {
    /// Report the resolution outcome
    ///
    /// Resolution happens before the subscriber exists, so the binary calls
    /// this once tracing is installed.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => {
                info!("Loaded TOML configuration from {}", path.display())
            }
            ConfigSource::Defaults { searched: Some(path) } => {
                warn!("No config file at {}, using defaults", path.display())
            }
            ConfigSource::Defaults { searched: None } => {
                warn!("Could not determine config directory, using defaults")
            }
        }
    }
}

/// Resolve the TOML layer
///
/// An explicitly requested file must exist and parse. The platform default
/// file is optional: when absent, compiled defaults are used.
pub fn resolve_toml_config(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = load_toml_config(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        searched => Ok((TomlConfig::default(), ConfigSource::Defaults { searched })),
    }
}
