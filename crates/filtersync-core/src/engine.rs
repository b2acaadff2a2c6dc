//! Filter engine facade
//!
//! Wires the applied store, exclusion ledger and preset registry together and
//! owns the cross-store operations: drawer apply, quick include/exclude,
//! undo, and saving presets. Every committing action emits a [`Toast`] whose
//! undo handle reverts exactly that action.

use crate::config::EngineConfig;
use crate::draft::DraftSession;
use crate::error::{Error, Result};
use crate::exclusion::ExclusionLedger;
use crate::filter;
use crate::preset::{PresetRegistry, PresetStore};
use crate::storage::{load_engine_state, save_engine_state, SqlitePresetStore, Storage};
use crate::store::{AppliedFilterStore, CommitOrigin, CommitRecord, SubscriptionId, UndoOutcome};
use crate::types::{EngineState, ExcludedItem, FilterSet, Preset, PresetId};
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tokio::sync::broadcast;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    FiltersApplied,
    PresetApplied,
    Included,
    Excluded,
    Undone,
    PresetSaved,
    Error,
}

/// User-facing notification emitted after engine actions
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    /// Present for committing actions
    pub undo: Option<UndoHandle>,
}

impl Toast {
    fn info(kind: ToastKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            undo: None,
        }
    }
}

/// Reverts the commit a toast was emitted for.
///
/// Becomes a no-op once any later commit or undo has replaced that entry.
#[derive(Clone)]
pub struct UndoHandle {
    sequence: u64,
    engine: Weak<EngineInner>,
}

impl UndoHandle {
    pub fn invoke(&self) -> UndoOutcome {
        match self.engine.upgrade() {
            Some(inner) => inner.undo(Some(self.sequence)),
            None => UndoOutcome::NothingToUndo,
        }
    }

    /// Whether invoking would still undo something
    pub fn is_current(&self) -> bool {
        self.engine
            .upgrade()
            .map(|inner| inner.store.undo_sequence() == Some(self.sequence))
            .unwrap_or(false)
    }
}

impl fmt::Debug for UndoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UndoHandle")
            .field("sequence", &self.sequence)
            .finish()
    }
}

struct EngineInner {
    config: EngineConfig,
    store: AppliedFilterStore,
    /// Also serializes engine writers so ledger and store move together
    ledger: Mutex<ExclusionLedger>,
    presets: PresetRegistry,
    toasts: broadcast::Sender<Toast>,
    /// Local database the engine was opened from, if any
    storage: Option<Arc<Storage>>,
}

impl EngineInner {
    fn undo(self: &Arc<Self>, expected: Option<u64>) -> UndoOutcome {
        let (outcome, pending) = {
            let mut ledger = self.ledger.lock();
            self.store.undo_matching(expected, |entry| {
                if let Some(exclusions) = &entry.exclusions {
                    *ledger = exclusions.clone();
                }
            })
        };
        if let Some(pending) = pending {
            self.store.notify(pending);
        }
        if let UndoOutcome::Restored { label, .. } = &outcome {
            self.emit(Toast::info(ToastKind::Undone, format!("Undone: {}", label)));
        }
        outcome
    }

    fn emit(&self, toast: Toast) {
        // No subscribers is fine.
        let _ = self.toasts.send(toast);
    }

    fn undo_handle(self: &Arc<Self>, sequence: u64) -> UndoHandle {
        UndoHandle {
            sequence,
            engine: Arc::downgrade(self),
        }
    }
}

/// Shared handle to the filter engine
#[derive(Clone)]
pub struct FilterEngine {
    inner: Arc<EngineInner>,
}

impl FilterEngine {
    pub fn new(config: EngineConfig, preset_store: Arc<dyn PresetStore>) -> Self {
        Self::build(config, preset_store, None)
    }

    /// Open an engine backed by the local database.
    ///
    /// Presets are loaded and the last persisted state is restored.
    pub async fn open_local(config: EngineConfig) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);
        let preset_store = Arc::new(SqlitePresetStore::new(Arc::clone(&storage)));
        let engine = Self::build(config, preset_store, Some(Arc::clone(&storage)));

        engine.refresh_presets().await?;
        engine.load(&storage)?;
        info!(presets = engine.presets().len(), "Opened local filter engine");
        Ok(engine)
    }

    fn build(
        config: EngineConfig,
        preset_store: Arc<dyn PresetStore>,
        storage: Option<Arc<Storage>>,
    ) -> Self {
        let (toasts, _) = broadcast::channel(config.toast_capacity.max(1));
        let presets = PresetRegistry::with_config(preset_store, &config);
        Self {
            inner: Arc::new(EngineInner {
                config,
                store: AppliedFilterStore::new(),
                ledger: Mutex::new(ExclusionLedger::new()),
                presets,
                toasts,
                storage,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn presets(&self) -> &PresetRegistry {
        &self.inner.presets
    }

    /// Current active filters
    pub fn read(&self) -> FilterSet {
        self.inner.store.read()
    }

    pub fn exclusions(&self) -> ExclusionLedger {
        self.inner.ledger.lock().clone()
    }

    /// Badge count for the active filters
    pub fn active_count(&self) -> usize {
        filter::counter(&self.inner.store.snapshot())
    }

    pub fn toasts(&self) -> broadcast::Receiver<Toast> {
        self.inner.toasts.subscribe()
    }

    /// Register a listener called after every change of the active filters.
    ///
    /// Listeners run once the engine has released its locks, so they may
    /// read engine state.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&FilterSet, CommitOrigin) + Send + Sync + 'static,
    {
        self.inner.store.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.store.unsubscribe(id)
    }

    /// Number of changes to the active filters so far
    pub fn revision(&self) -> u64 {
        self.inner.store.revision()
    }

    pub fn can_undo(&self) -> bool {
        self.inner.store.can_undo()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.inner.store.undo_label()
    }

    /// Whether the pending undo would revert a preset application
    pub fn undo_is_preset_applied(&self) -> bool {
        self.inner.store.undo_is_preset_applied()
    }

    // ===== Drafts =====

    /// Open a draft seeded from the active filters
    pub fn open_draft(&self) -> DraftSession {
        DraftSession::open_from_store(&self.inner.store)
    }

    /// Open a draft seeded from the active filters with a preset selected
    pub fn open_draft_with_preset(&self, id: &PresetId) -> Result<DraftSession> {
        let preset = self.inner.presets.resolve(id)?;
        let mut draft = self.open_draft();
        draft.select_preset(&preset)?;
        Ok(draft)
    }

    /// Commit a draft's working value as the active filters.
    ///
    /// Values the draft includes are dropped from the exclusion ledger in
    /// the same step. On success the draft is closed as applied.
    pub fn apply_draft(&self, draft: &mut DraftSession) -> Result<FilterSet> {
        let inner = &self.inner;
        if self.inner.config.clear_preset_on_quick_action {
            draft.sync_with_store(&inner.store);
        }
        draft.reconcile_presets(&inner.presets);
        if draft.is_open() {
            draft.working().validate()?;
        }

        let mut ledger = inner.ledger.lock();
        let next = draft.apply()?;
        let selected = draft
            .selected_preset_id()
            .and_then(|id| inner.presets.resolve(id).ok());

        let mut next_ledger = ledger.clone();
        for item in ledger.iter() {
            if next.contains_value(item.dimension(), &item.value) {
                next_ledger.remove(item);
            }
        }
        let exclusions = (next_ledger != *ledger).then(|| ledger.clone());

        let (origin, label, kind) = match &selected {
            Some(preset) => (
                CommitOrigin::PresetApply,
                format!("Applied \"{}\"", preset.name),
                ToastKind::PresetApplied,
            ),
            None => (
                CommitOrigin::DraftApply,
                "Filters applied".to_string(),
                ToastKind::FiltersApplied,
            ),
        };
        let pending = inner.store.commit_recorded(
            next.clone(),
            CommitRecord {
                origin,
                label: label.clone(),
                is_preset_applied: selected.is_some(),
                exclusions,
            },
        )?;
        *ledger = next_ledger;
        drop(ledger);

        let sequence = pending.revision();
        inner.store.notify(pending);

        inner.emit(Toast {
            message: label,
            kind,
            undo: Some(inner.undo_handle(sequence)),
        });
        Ok(next)
    }

    // ===== Quick actions =====

    /// Include an entity: drop it from the ledger and add it to its dimension
    pub fn include(&self, item: ExcludedItem) -> Result<FilterSet> {
        self.quick_action(item, false)
    }

    /// Exclude an entity: add it to the ledger and remove it from its dimension
    pub fn exclude(&self, item: ExcludedItem) -> Result<FilterSet> {
        self.quick_action(item, true)
    }

    fn quick_action(&self, item: ExcludedItem, exclude: bool) -> Result<FilterSet> {
        if item.value.trim().is_empty() {
            return Err(Error::InvalidFilter(
                "cannot include or exclude a blank value".to_string(),
            ));
        }
        let inner = &self.inner;
        let dimension = item.dimension();

        let mut ledger = inner.ledger.lock();
        let mut next_ledger = ledger.clone();
        let mut next = inner.store.read();
        let (label, kind) = if exclude {
            next.remove_value(dimension, &item.value)?;
            next_ledger.add(item.clone());
            (format!("Excluded {}", item.value), ToastKind::Excluded)
        } else {
            next.add_value(dimension, item.value.clone())?;
            next_ledger.remove(&item);
            (format!("Included {}", item.value), ToastKind::Included)
        };

        let pending = inner.store.commit_recorded(
            next.clone(),
            CommitRecord {
                origin: CommitOrigin::QuickAction,
                label: label.clone(),
                is_preset_applied: false,
                exclusions: Some(ledger.clone()),
            },
        )?;
        *ledger = next_ledger;
        drop(ledger);

        let sequence = pending.revision();
        inner.store.notify(pending);

        info!(?item, exclude, "Applied quick action");
        inner.emit(Toast {
            message: label,
            kind,
            undo: Some(inner.undo_handle(sequence)),
        });
        Ok(next)
    }

    /// Revert the last committing action, whatever it was
    pub fn undo(&self) -> UndoOutcome {
        self.inner.undo(None)
    }

    // ===== Presets =====

    /// Reload presets. Failures are reported as a toast and returned.
    pub async fn refresh_presets(&self) -> Result<Vec<Preset>> {
        self.inner
            .presets
            .refresh()
            .await
            .map_err(|e| self.report(e))
    }

    /// Save the draft's current working value as a preset.
    ///
    /// The value is captured before the request starts, so closing the draft
    /// while the request is in flight has no effect on it.
    pub async fn save_draft_as_preset(&self, draft: &DraftSession, name: &str) -> Result<PresetId> {
        let value = draft.working().clone();
        self.save_preset(name, value).await
    }

    pub async fn save_active_as_preset(&self, name: &str) -> Result<PresetId> {
        let value = self.read();
        self.save_preset(name, value).await
    }

    pub async fn save_preset(&self, name: &str, value: FilterSet) -> Result<PresetId> {
        let id = self
            .inner
            .presets
            .create(name, value)
            .await
            .map_err(|e| self.report(e))?;
        self.inner.emit(Toast::info(
            ToastKind::PresetSaved,
            format!("Saved \"{}\"", name.trim()),
        ));
        Ok(id)
    }

    pub async fn delete_preset(&self, id: &PresetId) -> Result<()> {
        self.inner
            .presets
            .delete(id)
            .await
            .map_err(|e| self.report(e))
    }

    /// Surface persistence failures on the toast channel
    fn report(&self, error: Error) -> Error {
        if matches!(error, Error::Persistence(_) | Error::Storage(_)) {
            warn!("Preset request failed: {}", error);
            self.inner
                .emit(Toast::info(ToastKind::Error, error.user_message()));
        }
        error
    }

    // ===== State =====

    pub fn state(&self) -> EngineState {
        let ledger = self.inner.ledger.lock();
        EngineState {
            filters: self.inner.store.read(),
            exclusions: ledger.to_vec(),
        }
    }

    /// Replace the committed state without recording undo.
    ///
    /// Inclusions that conflict with an exclusion are dropped.
    pub fn restore(&self, state: EngineState) -> Result<()> {
        let ledger_next: ExclusionLedger = state.exclusions.into_iter().collect();
        let mut filters = state.filters;
        for item in ledger_next.iter() {
            filters.remove_value(item.dimension(), &item.value)?;
        }

        let mut ledger = self.inner.ledger.lock();
        let pending = self.inner.store.restore(filters)?;
        *ledger = ledger_next;
        info!(exclusions = ledger.len(), "Restored engine state");
        drop(ledger);

        self.inner.store.notify(pending);
        Ok(())
    }

    /// Persist to the database the engine was opened from
    pub fn save_local(&self) -> Result<()> {
        match &self.inner.storage {
            Some(storage) => self.persist(storage),
            None => Err(Error::InvalidState(
                "engine was not opened from local storage".to_string(),
            )),
        }
    }

    pub fn persist(&self, storage: &Storage) -> Result<()> {
        let conn = storage.connection()?;
        save_engine_state(&conn, &self.state())
    }

    /// Load previously persisted state. Returns whether any was found.
    pub fn load(&self, storage: &Storage) -> Result<bool> {
        let conn = storage.connection()?;
        match load_engine_state(&conn)? {
            Some(state) => {
                self.restore(state)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
