//! Engine configuration

use crate::error::Result;
use crate::types::normalize_name;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Order in which saved presets are listed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PresetOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    NameAscending,
}

/// How preset names must differ from each other
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NamePolicy {
    /// "Tech" and "tech" collide
    #[default]
    CaseInsensitive,
    /// Only identical names collide
    CaseSensitive,
    AllowDuplicates,
}

impl NamePolicy {
    /// Whether `candidate` collides with `existing` under this policy
    pub fn collides(&self, existing: &str, candidate: &str) -> bool {
        match self {
            NamePolicy::CaseInsensitive => normalize_name(existing) == normalize_name(candidate),
            NamePolicy::CaseSensitive => existing.trim() == candidate.trim(),
            NamePolicy::AllowDuplicates => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub preset_order: PresetOrder,
    pub preset_name_policy: NamePolicy,
    /// Buffered toasts per subscriber before the oldest are dropped
    pub toast_capacity: usize,
    /// Clear an open draft's selected preset after a quick include/exclude
    pub clear_preset_on_quick_action: bool,
    /// Directory of the local database; the platform data directory when unset
    pub data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            preset_order: PresetOrder::default(),
            preset_name_policy: NamePolicy::default(),
            toast_capacity: 64,
            clear_preset_on_quick_action: true,
            data_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
