//! Collection item with its attribute mapping

use serde::Serialize;
use std::collections::BTreeMap;

/// Category name → attribute value
///
/// Ordered so that per-item score summation is reproducible.
pub type Attributes = BTreeMap<String, String>;

/// One member of the collection
///
/// An item whose fetch failed is represented with empty attributes rather
/// than being absent, keeping the item array dense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    /// Index within the collection (0..count)
    pub id: usize,
    /// Category → value
    pub attributes: Attributes,
}

impl Item {
    pub fn new(id: usize, attributes: Attributes) -> Self {
        Self { id, attributes }
    }

    /// Placeholder for an item that was never fetched
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            attributes: Attributes::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
