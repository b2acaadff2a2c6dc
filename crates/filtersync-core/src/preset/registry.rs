//! Cached, ordered view over the preset persistence API

use super::PresetStore;
use crate::config::{EngineConfig, NamePolicy, PresetOrder};
use crate::error::{Error, Result};
use crate::types::{FilterSet, Preset, PresetId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Saved filters known to this client.
///
/// The cache is only replaced by `refresh` and only extended once a create
/// call has resolved, so a failed or abandoned request never leaves a
/// half-created preset behind.
pub struct PresetRegistry {
    store: Arc<dyn PresetStore>,
    cache: RwLock<Vec<Preset>>,
    /// Held from the name check until the new preset is cached
    create_lock: tokio::sync::Mutex<()>,
    order: PresetOrder,
    name_policy: NamePolicy,
}

impl PresetRegistry {
    pub fn new(store: Arc<dyn PresetStore>) -> Self {
        Self::with_config(store, &EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn PresetStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            cache: RwLock::new(Vec::new()),
            create_lock: tokio::sync::Mutex::new(()),
            order: config.preset_order,
            name_policy: config.preset_name_policy,
        }
    }

    /// Reload presets from the persistence API.
    ///
    /// On failure the cached list is kept as is.
    pub async fn refresh(&self) -> Result<Vec<Preset>> {
        let presets = self.store.list_presets().await.map_err(|e| {
            warn!("Failed to list presets: {}", e);
            e
        })?;
        *self.cache.write() = presets;
        Ok(self.list())
    }

    /// Persist a new preset. Fails on an empty name or a name collision.
    ///
    /// Names are checked against the cache and against the persisted
    /// presets, so presets this registry has not loaded yet still count.
    pub async fn create(&self, name: &str, value: FilterSet) -> Result<PresetId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidPresetName(
                "preset name must not be empty".to_string(),
            ));
        }
        value.validate()?;

        let _creating = self.create_lock.lock().await;
        self.check_name_available(name)?;
        if self.name_policy != NamePolicy::AllowDuplicates {
            let persisted = self.store.find_presets_by_name(name).await.map_err(|e| {
                warn!("Failed to look up preset name '{}': {}", name, e);
                e
            })?;
            if let Some(existing) = persisted
                .iter()
                .find(|p| self.name_policy.collides(&p.name, name))
            {
                return Err(Error::DuplicateName(existing.name.clone()));
            }
        }

        let preset = self.store.create_preset(name, &value).await.map_err(|e| {
            warn!("Failed to create preset '{}': {}", name, e);
            e
        })?;

        info!(id = %preset.id, name = %preset.name, "Created preset");
        let id = preset.id.clone();
        let mut cache = self.cache.write();
        cache.retain(|p| p.id != id);
        cache.push(preset);
        Ok(id)
    }

    /// Delete a preset through the persistence API and drop it from the cache
    pub async fn delete(&self, id: &PresetId) -> Result<()> {
        self.store.delete_preset(id).await?;
        self.cache.write().retain(|p| &p.id != id);
        info!(%id, "Deleted preset");
        Ok(())
    }

    pub fn resolve(&self, id: &PresetId) -> Result<Preset> {
        self.cache
            .read()
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| Error::PresetNotFound(id.to_string()))
    }

    /// Presets in the configured order. Stable for unchanged data.
    pub fn list(&self) -> Vec<Preset> {
        let mut presets = self.cache.read().clone();
        match self.order {
            PresetOrder::NewestFirst => presets.sort_by(|a, b| {
                b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
            }),
            PresetOrder::OldestFirst => presets.sort_by(|a, b| {
                a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
            }),
            PresetOrder::NameAscending => presets.sort_by(|a, b| {
                a.name_key().cmp(&b.name_key()).then_with(|| a.id.cmp(&b.id))
            }),
        }
        presets
    }

    /// Returns true when `selected` no longer resolves and must be cleared.
    ///
    /// Call after every refresh: presets can be deleted by other clients.
    pub fn invalidate_if_missing(&self, selected: Option<&PresetId>) -> bool {
        let Some(id) = selected else {
            return false;
        };
        let missing = !self.cache.read().iter().any(|p| &p.id == id);
        if missing {
            warn!(%id, "Selected preset no longer exists, clearing selection");
        }
        missing
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }

    fn check_name_available(&self, name: &str) -> Result<()> {
        let cache = self.cache.read();
        if let Some(existing) = cache
            .iter()
            .find(|p| self.name_policy.collides(&p.name, name))
        {
            return Err(Error::DuplicateName(existing.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistenceError;
    use crate::preset::{InMemoryPresetStore, MockPresetStore};
    use crate::types::Dimension;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn english() -> FilterSet {
        FilterSet::new().with_values(Dimension::Languages, ["en"])
    }

    fn registry() -> (Arc<InMemoryPresetStore>, PresetRegistry) {
        let store = Arc::new(InMemoryPresetStore::new());
        let registry = PresetRegistry::new(store.clone());
        (store, registry)
    }

    #[tokio::test]
    async fn test_create_then_resolve() {
        let (_, registry) = registry();
        let id = registry.create("  English ", english()).await.unwrap();

        let preset = registry.resolve(&id).unwrap();
        assert_eq!(preset.name, "English");
        assert_eq!(preset.value, english());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_case_insensitive() {
        let (store, registry) = registry();
        registry.create("Tech", english()).await.unwrap();

        let err = registry.create("tech", FilterSet::new()).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref name) if name == "Tech"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_case_sensitive_policy_allows_different_case() {
        let store = Arc::new(InMemoryPresetStore::new());
        let config = EngineConfig {
            preset_name_policy: NamePolicy::CaseSensitive,
            ..Default::default()
        };
        let registry = PresetRegistry::with_config(store, &config);

        registry.create("Tech", english()).await.unwrap();
        registry.create("tech", english()).await.unwrap();
        assert!(registry.create("Tech", english()).await.is_err());
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (_, registry) = registry();
        let err = registry.create("   ", english()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPresetName(_)));
    }

    #[tokio::test]
    async fn test_invalidate_after_external_delete() {
        let (store, registry) = registry();
        let id = registry.create("English", english()).await.unwrap();
        assert!(!registry.invalidate_if_missing(Some(&id)));

        // Another client deletes the preset.
        store.delete_preset(&id).await.unwrap();
        registry.refresh().await.unwrap();

        assert!(registry.invalidate_if_missing(Some(&id)));
        assert!(!registry.invalidate_if_missing(None));
        assert!(matches!(registry.resolve(&id), Err(Error::PresetNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_order_is_stable() {
        let now = Utc::now();
        let mut older = Preset::new("B older", english());
        older.created_at = now - Duration::minutes(5);
        let mut newer = Preset::new("a newer", FilterSet::new());
        newer.created_at = now;
        let store = Arc::new(InMemoryPresetStore::with_presets(vec![older.clone(), newer.clone()]));

        let registry = PresetRegistry::new(store.clone());
        registry.refresh().await.unwrap();
        let names: Vec<_> = registry.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a newer", "B older"]);
        assert_eq!(registry.list(), registry.list());

        let by_name = PresetRegistry::with_config(
            store,
            &EngineConfig {
                preset_order: PresetOrder::NameAscending,
                ..Default::default()
            },
        );
        by_name.refresh().await.unwrap();
        let names: Vec<_> = by_name.list().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["a newer", "B older"]);
    }

    #[tokio::test]
    async fn test_persistence_failure_leaves_cache_unchanged() {
        let mut mock = MockPresetStore::new();
        mock.expect_find_presets_by_name()
            .returning(|_| Ok(Vec::new()));
        mock.expect_create_preset()
            .times(1)
            .returning(|_, _| Err(Error::Persistence(PersistenceError::Unavailable)));
        let registry = PresetRegistry::new(Arc::new(mock));

        let err = registry.create("English", english()).await.unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_cache() {
        let existing = Preset::new("English", english());
        let mut mock = MockPresetStore::new();
        let listed = existing.clone();
        let mut calls = 0;
        mock.expect_list_presets().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(vec![listed.clone()])
            } else {
                Err(Error::Persistence(PersistenceError::Timeout))
            }
        });
        let registry = PresetRegistry::new(Arc::new(mock));

        registry.refresh().await.unwrap();
        assert!(registry.refresh().await.is_err());
        assert_eq!(registry.resolve(&existing.id).unwrap(), existing);
    }

    #[test]
    fn test_name_lookup_failure_skips_create() {
        let mut mock = MockPresetStore::new();
        mock.expect_find_presets_by_name()
            .returning(|_| Err(Error::Persistence(PersistenceError::Timeout)));
        mock.expect_create_preset().never();
        let registry = PresetRegistry::new(Arc::new(mock));

        let err = tokio_test::block_on(registry.create("English", english())).unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_allow_duplicates_skips_name_lookup() {
        let mut mock = MockPresetStore::new();
        mock.expect_find_presets_by_name().never();
        mock.expect_create_preset()
            .times(2)
            .returning(|name, value| Ok(Preset::new(name, value.clone())));
        let config = EngineConfig {
            preset_name_policy: NamePolicy::AllowDuplicates,
            ..Default::default()
        };
        let registry = PresetRegistry::with_config(Arc::new(mock), &config);

        tokio_test::block_on(registry.create("Tech", english())).unwrap();
        tokio_test::block_on(registry.create("Tech", english())).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
