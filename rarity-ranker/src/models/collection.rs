//! Collection description supplied at startup

use crate::error::{RankerError, Result};

/// Size and location of the collection to rank
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    count: usize,
    source_location: String,
}

impl CollectionSpec {
    /// Validate and build a collection spec
    ///
    /// # Errors
    /// `RankerError::Config` if `count` is zero or the location is blank.
    pub fn new(count: usize, source_location: impl Into<String>) -> Result<Self> {
        let source_location = source_location.into();

        if count == 0 {
            return Err(RankerError::Config(
                "Collection count must be a positive integer".to_string(),
            ));
        }

        if source_location.trim().is_empty() {
            return Err(RankerError::Config(
                "Collection source location must not be empty".to_string(),
            ));
        }

        Ok(Self {
            count,
            source_location: source_location.trim_end_matches('/').to_string(),
        })
    }

    /// Build the source location from an endpoint base and collection id
    pub fn from_endpoint(count: usize, endpoint: &str, collection: &str) -> Result<Self> {
        let collection = collection.trim_matches('/');
        if collection.is_empty() {
            return Err(RankerError::Config(
                "Collection identifier must not be empty".to_string(),
            ));
        }
        Self::new(
            count,
            format!("{}/{}", endpoint.trim_end_matches('/'), collection),
        )
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn source_location(&self) -> &str {
        &self.source_location
    }
}
