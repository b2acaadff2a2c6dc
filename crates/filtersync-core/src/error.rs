//! Error types for FilterSync Core

use thiserror::Error;

/// Main error type for filter engine operations
#[derive(Error, Debug)]
pub enum Error {
    /// Draft session lifecycle misuse (e.g. applying twice)
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Malformed filter set, rejected before any store mutation
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid preset name: {0}")]
    InvalidPresetName(String),

    #[error("Duplicate preset name: {0}")]
    DuplicateName(String),

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures reported by the preset persistence API
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Service unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Connection pool error: {0}")]
    Pool(String),
}

impl Error {
    /// Message suitable for a toast or inline form error.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidFilter(_) => "Could not apply filters".to_string(),
            Error::DuplicateName(name) => {
                format!("A saved filter named \"{}\" already exists", name)
            }
            Error::InvalidPresetName(_) => "Please enter a name for the saved filter".to_string(),
            Error::PresetNotFound(_) => "The saved filter no longer exists".to_string(),
            Error::Persistence(_) | Error::Storage(_) => {
                "Could not save filters, please try again".to_string()
            }
            _ => "Something went wrong".to_string(),
        }
    }

    /// Whether the user can retry or continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DuplicateName(_)
                | Error::InvalidPresetName(_)
                | Error::PresetNotFound(_)
                | Error::Persistence(_)
                | Error::Storage(_)
        )
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<r2d2::Error> for Error {
    fn from(err: r2d2::Error) -> Self {
        Error::Storage(StorageError::Pool(err.to_string()))
    }
}

impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;
