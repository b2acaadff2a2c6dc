//! Saved filter ("preset") types

use super::FilterSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a saved preset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetId(pub String);

impl PresetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PresetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PresetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A named, persisted filter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub id: PresetId,
    pub name: String,
    pub value: FilterSet,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Preset {
    pub fn new(name: impl Into<String>, value: FilterSet) -> Self {
        Self {
            id: PresetId::generate(),
            name: name.into(),
            value,
            created_at: chrono::Utc::now(),
        }
    }

    /// Case-folded name used for uniqueness checks
    pub fn name_key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Trim and case-fold a preset name
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
