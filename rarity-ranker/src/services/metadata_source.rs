//! Item metadata sources
//!
//! A `MetadataSource` turns a collection location plus an item index into a
//! flat category → value mapping. The HTTP implementation fetches
//! `{base_location}/{index}.json`.

use crate::error::FetchError;
use crate::models::Attributes;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("rarity-ranker/", env!("CARGO_PKG_VERSION"));

/// Fetch capability for item attributes
#[async_trait::async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the attributes of item `index`
    ///
    /// # Errors
    /// Any `FetchError`; callers treat every failure the same way.
    async fn fetch(&self, base_location: &str, index: usize) -> Result<Attributes, FetchError>;
}

/// URL of one item's metadata document
pub fn item_url(base_location: &str, index: usize) -> String {
    format!("{}/{}.json", base_location.trim_end_matches('/'), index)
}

/// Flatten a JSON document into attributes
///
/// Strings are kept verbatim, numbers and booleans use their JSON text,
/// nested arrays/objects are kept as compact JSON, and `null` entries are
/// dropped.
pub fn coerce_attributes(document: Value) -> Result<Attributes, FetchError> {
    let map = match document {
        Value::Object(map) => map,
        other => {
            return Err(FetchError::Decode(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
    };

    let attributes = map
        .into_iter()
        .filter_map(|(category, value)| {
            let value = match value {
                Value::Null => return None,
                Value::String(s) => s,
                other => other.to_string(),
            };
            Some((category, value))
        })
        .collect();

    Ok(attributes)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// HTTP metadata source backed by reqwest
pub struct HttpMetadataSource {
    http_client: reqwest::Client,
}

impl HttpMetadataSource {
    /// Create a source whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self { http_client })
    }
}

#[async_trait::async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, base_location: &str, index: usize) -> Result<Attributes, FetchError> {
        let url = item_url(base_location, index);

        tracing::debug!(index, url = %url, "Requesting item metadata");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Response(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Response(format!("failed to read body of {}: {}", url, e)))?;

        let document: Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        coerce_attributes(document)
    }
}
