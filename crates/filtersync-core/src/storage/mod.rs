//! SQLite-based persistence layer
//!
//! This module provides:
//! - Database initialization and migrations
//! - Preset and engine state queries
//! - A [`PresetStore`](crate::preset::PresetStore) backed by the database
//! - Connection pooling

mod migrations;
mod preset_store;
mod queries;

pub use migrations::run_migrations;
pub use preset_store::SqlitePresetStore;
pub use queries::*;

use crate::config::EngineConfig;
use crate::error::{Error, Result, StorageError};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use tracing::info;

/// Database connection pool type
pub type DbPool = Pool<SqliteConnectionManager>;

/// Storage manager for database operations
pub struct Storage {
    pool: DbPool,
    db_path: PathBuf,
}

impl Storage {
    /// Create a new storage instance with a directory path
    pub fn new_with_path(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();

        std::fs::create_dir_all(data_dir).map_err(|e| {
            Error::Storage(StorageError::Database(format!(
                "Failed to create data directory: {}",
                e
            )))
        })?;

        let db_path = data_dir.join("filtersync.db");
        info!("Database path: {:?}", db_path);

        Self::from_path(db_path)
    }

    /// Create storage in the platform data directory
    pub fn new_default() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .map(|dir| dir.join("filtersync"))
            .ok_or_else(|| {
                Error::Storage(StorageError::Database(
                    "No data directory available on this platform".to_string(),
                ))
            })?;
        Self::new_with_path(data_dir)
    }

    /// Open storage in the configured data directory
    pub fn open(config: &EngineConfig) -> Result<Self> {
        match &config.data_dir {
            Some(dir) => Self::new_with_path(dir),
            None => Self::new_default(),
        }
    }

    /// Create storage from a specific database file
    pub fn from_path(db_path: PathBuf) -> Result<Self> {
        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))?;

        let storage = Self { pool, db_path };
        storage.initialize()?;

        Ok(storage)
    }

    /// Create in-memory storage (for testing)
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))?;

        let storage = Self {
            pool,
            db_path: PathBuf::from(":memory:"),
        };

        storage.initialize()?;

        Ok(storage)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.pool.get()?;
        run_migrations(&conn)?;
        info!("Database initialized successfully");
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool
            .get()
            .map_err(|e| Error::Storage(StorageError::Pool(e.to_string())))
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}
