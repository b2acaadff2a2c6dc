//! Preset persistence backed by SQLite

use super::{delete_preset, find_presets_by_name, insert_preset, list_presets, Storage};
use crate::error::{Error, Result};
use crate::preset::PresetStore;
use crate::types::{FilterSet, Preset, PresetId};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// [`PresetStore`] that keeps presets in the local database
pub struct SqlitePresetStore {
    storage: Arc<Storage>,
}

impl SqlitePresetStore {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Run a blocking database closure off the async executor
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let conn = storage.connection()?;
            f(&*conn)
        })
        .await
        .map_err(|e| Error::Internal(format!("Storage task failed: {}", e)))?
    }
}

#[async_trait]
impl PresetStore for SqlitePresetStore {
    async fn create_preset(&self, name: &str, value: &FilterSet) -> Result<Preset> {
        let preset = Preset::new(name, value.clone());
        let record = preset.clone();
        self.with_connection(move |conn| insert_preset(conn, &record))
            .await?;
        debug!(id = %preset.id, "Inserted preset");
        Ok(preset)
    }

    async fn list_presets(&self) -> Result<Vec<Preset>> {
        self.with_connection(list_presets).await
    }

    async fn find_presets_by_name(&self, name: &str) -> Result<Vec<Preset>> {
        let name = name.to_string();
        self.with_connection(move |conn| find_presets_by_name(conn, &name))
            .await
    }

    async fn delete_preset(&self, id: &PresetId) -> Result<()> {
        let target = id.clone();
        let removed = self
            .with_connection(move |conn| delete_preset(conn, &target))
            .await?;
        if !removed {
            return Err(Error::PresetNotFound(id.to_string()));
        }
        Ok(())
    }
}
