//! Ledger of explicitly excluded entities

use crate::types::{Dimension, ExcludedItem, ExcludedItemType};
use std::collections::BTreeSet;

/// Set of excluded items, unique by `(type, value)`.
///
/// Kept separate from the filter set because exclusions also arrive from
/// quick actions outside the filter drawer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionLedger {
    items: BTreeSet<ExcludedItem>,
}

impl ExclusionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the item was newly added
    pub fn add(&mut self, item: ExcludedItem) -> bool {
        self.items.insert(item)
    }

    /// Returns whether the item was present
    pub fn remove(&mut self, item: &ExcludedItem) -> bool {
        self.items.remove(item)
    }

    pub fn contains(&self, item: &ExcludedItem) -> bool {
        self.items.contains(item)
    }

    /// Whether `value` is excluded for the given filter dimension
    pub fn excludes(&self, dimension: Dimension, value: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.dimension() == dimension && item.value == value)
    }

    pub fn items_of(&self, item_type: ExcludedItemType) -> impl Iterator<Item = &ExcludedItem> {
        self.items.iter().filter(move |item| item.item_type == item_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExcludedItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn to_vec(&self) -> Vec<ExcludedItem> {
        self.items.iter().cloned().collect()
    }
}

impl FromIterator<ExcludedItem> for ExclusionLedger {
    fn from_iter<I: IntoIterator<Item = ExcludedItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
