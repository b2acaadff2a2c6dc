//! The active filter set and its atomic commit contract
//!
//! Readers always see a whole [`FilterSet`]: commits build the next value off
//! to the side and swap an `Arc` under the write lock. Subscribers are called
//! synchronously after the swap, outside the state locks, one change at a
//! time and in revision order.

use crate::error::Result;
use crate::exclusion::ExclusionLedger;
use crate::journal::{UndoEntry, UndoJournal};
use crate::types::FilterSet;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// What caused a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOrigin {
    /// Filter drawer apply
    DraftApply,
    /// Filter drawer apply of an unmodified saved preset
    PresetApply,
    /// Include/exclude action outside the drawer
    QuickAction,
    Undo,
    /// State loaded from storage
    Restore,
}

/// Callback invoked with the new active value after every commit
pub type Listener = Arc<dyn Fn(&FilterSet, CommitOrigin) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Result of an undo request
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// The store was restored to `filters`
    Restored { filters: FilterSet, label: String },
    NothingToUndo,
}

impl UndoOutcome {
    pub fn restored(&self) -> Option<&FilterSet> {
        match self {
            UndoOutcome::Restored { filters, .. } => Some(filters),
            UndoOutcome::NothingToUndo => None,
        }
    }
}

/// A change that still has to be delivered to subscribers.
///
/// Returned by the crate-internal mutators so callers holding their own
/// locks can release them before listeners run.
#[must_use]
pub(crate) struct PendingNotify {
    filters: Arc<FilterSet>,
    origin: CommitOrigin,
    revision: u64,
}

impl PendingNotify {
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }
}

/// Undo bookkeeping attached to a commit
#[derive(Debug, Clone)]
pub(crate) struct CommitRecord {
    pub origin: CommitOrigin,
    pub label: String,
    pub is_preset_applied: bool,
    pub exclusions: Option<ExclusionLedger>,
}

impl CommitRecord {
    fn drawer(is_preset_applied: bool) -> Self {
        let (origin, label) = if is_preset_applied {
            (CommitOrigin::PresetApply, "Saved filter applied")
        } else {
            (CommitOrigin::DraftApply, "Filters applied")
        };
        Self {
            origin,
            label: label.to_string(),
            is_preset_applied,
            exclusions: None,
        }
    }
}

/// Holds the filter set that currently drives search results
pub struct AppliedFilterStore {
    active: RwLock<Arc<FilterSet>>,
    /// Also serializes writers: held for the whole commit
    journal: Mutex<UndoJournal>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    /// Serializes delivery; holds the last revision delivered
    delivery: ReentrantMutex<Cell<u64>>,
    revision: AtomicU64,
    quick_action_revision: AtomicU64,
    next_subscription: AtomicU64,
}

impl AppliedFilterStore {
    pub fn new() -> Self {
        Self::with_filters(FilterSet::new())
    }

    pub fn with_filters(initial: FilterSet) -> Self {
        Self {
            active: RwLock::new(Arc::new(initial)),
            journal: Mutex::new(UndoJournal::new()),
            listeners: Mutex::new(Vec::new()),
            delivery: ReentrantMutex::new(Cell::new(0)),
            revision: AtomicU64::new(0),
            quick_action_revision: AtomicU64::new(0),
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Current active filters, by value
    pub fn read(&self) -> FilterSet {
        self.active.read().as_ref().clone()
    }

    /// Shared handle to the current active filters
    pub fn snapshot(&self) -> Arc<FilterSet> {
        Arc::clone(&self.active.read())
    }

    /// Number of commits so far
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Revision of the most recent quick include/exclude commit, 0 if none
    pub fn quick_action_revision(&self) -> u64 {
        self.quick_action_revision.load(Ordering::SeqCst)
    }

    /// Replace the active filters, recording the previous value for undo.
    ///
    /// Invalid filter sets are rejected and leave the store untouched.
    pub fn commit(&self, next: FilterSet, is_preset_applied: bool) -> Result<()> {
        let pending = self.commit_recorded(next, CommitRecord::drawer(is_preset_applied))?;
        self.notify(pending);
        Ok(())
    }

    /// Commit with explicit undo bookkeeping, without notifying subscribers.
    ///
    /// The caller must pass the returned change to [`Self::notify`].
    pub(crate) fn commit_recorded(
        &self,
        next: FilterSet,
        record: CommitRecord,
    ) -> Result<PendingNotify> {
        next.validate()?;

        let next = Arc::new(next);
        let revision = {
            let mut journal = self.journal.lock();
            let mut active = self.active.write();
            let previous = std::mem::replace(&mut *active, Arc::clone(&next));
            let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            if record.origin == CommitOrigin::QuickAction {
                self.quick_action_revision.store(revision, Ordering::SeqCst);
            }

            journal.push(UndoEntry {
                sequence: revision,
                filters: previous.as_ref().clone(),
                exclusions: record.exclusions,
                label: record.label,
                is_preset_applied: record.is_preset_applied,
                origin: record.origin,
                recorded_at: chrono::Utc::now(),
            });
            revision
        };

        info!(revision, origin = ?record.origin, "Committed active filters");
        Ok(PendingNotify {
            filters: next,
            origin: record.origin,
            revision,
        })
    }

    /// Restore the snapshot recorded by the last commit
    pub fn undo(&self) -> UndoOutcome {
        let (outcome, pending) = self.undo_matching(None, |_| {});
        if let Some(pending) = pending {
            self.notify(pending);
        }
        outcome
    }

    /// Undo only if the journal still holds `expected` (any entry when `None`).
    ///
    /// `on_restore` runs while the writer lock is held so that state kept
    /// outside the store can be rolled back in the same step. Subscribers are
    /// not notified; the caller passes the returned change to [`Self::notify`].
    pub(crate) fn undo_matching<F>(
        &self,
        expected: Option<u64>,
        on_restore: F,
    ) -> (UndoOutcome, Option<PendingNotify>)
    where
        F: FnOnce(&UndoEntry),
    {
        let (restored, label, revision) = {
            let mut journal = self.journal.lock();
            let matches = match (journal.peek(), expected) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(entry), Some(sequence)) => entry.sequence == sequence,
            };
            if !matches {
                debug!("Nothing to undo");
                return (UndoOutcome::NothingToUndo, None);
            }
            let Some(entry) = journal.take() else {
                return (UndoOutcome::NothingToUndo, None);
            };

            on_restore(&entry);
            let restored = Arc::new(entry.filters);
            *self.active.write() = Arc::clone(&restored);
            let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            (restored, entry.label, revision)
        };

        info!(label = %label, "Undid last filter change");
        let outcome = UndoOutcome::Restored {
            filters: restored.as_ref().clone(),
            label,
        };
        let pending = PendingNotify {
            filters: restored,
            origin: CommitOrigin::Undo,
            revision,
        };
        (outcome, Some(pending))
    }

    /// Replace the active filters without recording undo (e.g. on load).
    ///
    /// The caller must pass the returned change to [`Self::notify`].
    pub(crate) fn restore(&self, filters: FilterSet) -> Result<PendingNotify> {
        filters.validate()?;
        let filters = Arc::new(filters);
        let revision = {
            let mut journal = self.journal.lock();
            journal.clear();
            *self.active.write() = Arc::clone(&filters);
            self.revision.fetch_add(1, Ordering::SeqCst) + 1
        };
        Ok(PendingNotify {
            filters,
            origin: CommitOrigin::Restore,
            revision,
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.journal.lock().is_empty()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.journal.lock().label().map(str::to_string)
    }

    /// Sequence of the pending undo entry, if any
    pub(crate) fn undo_sequence(&self) -> Option<u64> {
        self.journal.lock().peek().map(|entry| entry.sequence)
    }

    /// Whether the pending undo entry came from a preset application
    pub fn undo_is_preset_applied(&self) -> bool {
        self.journal
            .lock()
            .peek()
            .map(|entry| entry.is_preset_applied)
            .unwrap_or(false)
    }

    /// Register a listener called after every change of the active filters
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&FilterSet, CommitOrigin) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.listeners.lock().push((id, Arc::new(listener)));
        debug!(?id, "Subscribed to applied filters");
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(sub, _)| *sub != id);
        listeners.len() != before
    }

    /// Deliver a change to subscribers.
    ///
    /// Deliveries are serialized. A change older than one already delivered
    /// is dropped, so subscribers never see the active value move backwards.
    pub(crate) fn notify(&self, pending: PendingNotify) {
        let delivered = self.delivery.lock();
        if pending.revision <= delivered.get() {
            debug!(revision = pending.revision, "Skipping superseded notification");
            return;
        }
        delivered.set(pending.revision);

        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            // A listener committed; the nested delivery already carried the newer value.
            if delivered.get() != pending.revision {
                break;
            }
            listener(&pending.filters, pending.origin);
        }
    }
}

impl Default for AppliedFilterStore {
    fn default() -> Self {
        Self::new()
    }
}
