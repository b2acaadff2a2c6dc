//! FilterSync Core Library
//!
//! This crate provides the filter state engine behind a search UI, including:
//! - Draft editing sessions for the filter drawer
//! - The applied filter store with atomic commits and one-step undo
//! - Saved filter presets and quick include/exclude actions
//! - SQLite-based persistence
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     filtersync-core                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  engine.rs     - Facade: apply, quick actions, undo, toasts │
//! │  draft.rs      - Draft sessions                             │
//! │  store.rs      - Applied filters, subscribers               │
//! │  journal.rs    - Single-level undo                          │
//! │  exclusion.rs  - Excluded entities                          │
//! │  preset/       - Preset registry, persistence API           │
//! │  filter.rs     - merge / diff / counter                     │
//! │  storage/      - SQLite database, queries                   │
//! │  types/        - Shared type definitions                    │
//! │  config.rs     - Engine configuration                       │
//! │  error.rs      - Error types                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod draft;
pub mod engine;
pub mod error;
pub mod exclusion;
pub mod filter;
pub mod journal;
pub mod preset;
pub mod storage;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;

pub use config::{EngineConfig, NamePolicy, PresetOrder};
pub use draft::{DraftSession, DraftState};
pub use engine::{FilterEngine, Toast, ToastKind, UndoHandle};
pub use exclusion::ExclusionLedger;
pub use journal::{UndoEntry, UndoJournal};
pub use preset::{InMemoryPresetStore, PresetRegistry, PresetStore};
pub use store::{AppliedFilterStore, CommitOrigin, SubscriptionId, UndoOutcome};

// Re-export storage
pub use storage::{SqlitePresetStore, Storage};
