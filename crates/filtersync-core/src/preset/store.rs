//! Persistence API consumed by the preset registry

use crate::error::{Error, Result};
use crate::types::{normalize_name, FilterSet, Preset, PresetId};
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

/// Create/list/delete API for saved presets.
///
/// Implementations may be remote and slow; callers must not assume a new
/// preset is visible until `create_preset` resolves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PresetStore: Send + Sync {
    /// Persist a new preset and return it with its assigned id
    async fn create_preset(&self, name: &str, value: &FilterSet) -> Result<Preset>;

    /// All presets currently persisted
    async fn list_presets(&self) -> Result<Vec<Preset>>;

    /// Persisted presets whose trimmed, case-folded name equals `name`'s
    async fn find_presets_by_name(&self, name: &str) -> Result<Vec<Preset>>;

    async fn delete_preset(&self, id: &PresetId) -> Result<()>;
}

/// Process-local preset store
#[derive(Debug, Default)]
pub struct InMemoryPresetStore {
    presets: Mutex<Vec<Preset>>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presets(presets: Vec<Preset>) -> Self {
        Self {
            presets: Mutex::new(presets),
        }
    }

    pub fn len(&self) -> usize {
        self.presets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.lock().is_empty()
    }
}

#[async_trait]
impl PresetStore for InMemoryPresetStore {
    async fn create_preset(&self, name: &str, value: &FilterSet) -> Result<Preset> {
        let preset = Preset::new(name, value.clone());
        debug!(id = %preset.id, name, "Storing preset in memory");
        self.presets.lock().push(preset.clone());
        Ok(preset)
    }

    async fn list_presets(&self) -> Result<Vec<Preset>> {
        Ok(self.presets.lock().clone())
    }

    async fn find_presets_by_name(&self, name: &str) -> Result<Vec<Preset>> {
        let key = normalize_name(name);
        Ok(self
            .presets
            .lock()
            .iter()
            .filter(|p| p.name_key() == key)
            .cloned()
            .collect())
    }

    async fn delete_preset(&self, id: &PresetId) -> Result<()> {
        let mut presets = self.presets.lock();
        let before = presets.len();
        presets.retain(|p| &p.id != id);
        if presets.len() == before {
            return Err(Error::PresetNotFound(id.to_string()));
        }
        Ok(())
    }
}
