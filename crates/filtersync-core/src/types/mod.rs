//! Core type definitions for FilterSync
//!
//! This module contains the shared data model: filter sets and their
//! dimensions, saved presets, and include/exclude items.

mod exclusion_types;
mod filter_types;
mod preset_types;

pub use exclusion_types::*;
pub use filter_types::*;
pub use preset_types::*;

use serde::{Deserialize, Serialize};

/// Persistable snapshot of the engine's committed state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    /// Active filters
    pub filters: FilterSet,
    /// Excluded items, in ledger order
    pub exclusions: Vec<ExcludedItem>,
}
