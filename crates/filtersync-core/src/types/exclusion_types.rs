//! Include/exclude item types

use super::Dimension;
use serde::{Deserialize, Serialize};

/// Kind of entity that can be included or excluded by a quick action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludedItemType {
    Source,
    Company,
    People,
    Topic,
    Location,
    Language,
    Journalist,
}

impl ExcludedItemType {
    /// Filter dimension that holds inclusions of this kind
    pub fn dimension(&self) -> Dimension {
        match self {
            ExcludedItemType::Source => Dimension::Sources,
            ExcludedItemType::Company => Dimension::Companies,
            ExcludedItemType::People => Dimension::People,
            ExcludedItemType::Topic => Dimension::Topics,
            ExcludedItemType::Location => Dimension::Locations,
            ExcludedItemType::Language => Dimension::Languages,
            ExcludedItemType::Journalist => Dimension::Journalists,
        }
    }
}

/// An entity referenced by an include/exclude action.
///
/// Identity is the `(item_type, value)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedItem {
    #[serde(rename = "type")]
    pub item_type: ExcludedItemType,
    pub value: String,
}

impl ExcludedItem {
    pub fn new(item_type: ExcludedItemType, value: impl Into<String>) -> Self {
        Self {
            item_type,
            value: value.into(),
        }
    }

    pub fn source(value: impl Into<String>) -> Self {
        Self::new(ExcludedItemType::Source, value)
    }

    pub fn dimension(&self) -> Dimension {
        self.item_type.dimension()
    }
}
