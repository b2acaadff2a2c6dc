//! Draft editing sessions
//!
//! A draft is an uncommitted copy of a filter set, scoped to one editing
//! episode of the filter drawer. Nothing here touches the applied store;
//! the caller commits the value returned by [`DraftSession::apply`].

use crate::error::{Error, Result};
use crate::preset::PresetRegistry;
use crate::store::AppliedFilterStore;
use crate::types::{Dimension, DimensionValue, FilterSet, Preset, PresetId};
use tracing::debug;

/// Lifecycle of a draft session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftState {
    /// `working == base`
    Clean,
    /// `working != base`
    Dirty,
    /// Terminal: the working value was handed out for commit
    Applied,
    /// Terminal: closed without commit
    Discarded,
}

impl DraftState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DraftState::Applied | DraftState::Discarded)
    }
}

#[derive(Debug, Clone)]
pub struct DraftSession {
    base: FilterSet,
    working: FilterSet,
    selected_preset_id: Option<PresetId>,
    state: DraftState,
    /// Quick-action revision of the applied store last seen by this session,
    /// unset until the first sync
    seen_quick_action: Option<u64>,
}

impl DraftSession {
    pub fn open(seed: FilterSet) -> Self {
        Self {
            base: seed.clone(),
            working: seed,
            selected_preset_id: None,
            state: DraftState::Clean,
            seen_quick_action: None,
        }
    }

    /// Open seeded from the store's current active filters
    pub fn open_from_store(store: &AppliedFilterStore) -> Self {
        let mut session = Self::open(store.read());
        session.seen_quick_action = Some(store.quick_action_revision());
        session
    }

    pub fn open_with_preset(seed: FilterSet, preset: &Preset) -> Self {
        let mut session = Self::open(seed);
        session.working = preset.value.clone();
        session.selected_preset_id = Some(preset.id.clone());
        session.refresh_state();
        session
    }

    pub fn base(&self) -> &FilterSet {
        &self.base
    }

    pub fn working(&self) -> &FilterSet {
        &self.working
    }

    pub fn is_dirty(&self) -> bool {
        self.working != self.base
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn selected_preset_id(&self) -> Option<&PresetId> {
        self.selected_preset_id.as_ref()
    }

    /// Replace one dimension of the working value.
    ///
    /// Any manual edit drops the selected preset: presets are exact-match
    /// selections, not templates.
    pub fn edit(&mut self, dimension: Dimension, value: DimensionValue) -> Result<()> {
        self.ensure_open("edit")?;
        self.working.set(dimension, value)?;
        self.after_edit(dimension);
        Ok(())
    }

    pub fn add_value(&mut self, dimension: Dimension, value: impl Into<String>) -> Result<()> {
        self.ensure_open("edit")?;
        self.working.add_value(dimension, value)?;
        self.after_edit(dimension);
        Ok(())
    }

    pub fn remove_value(&mut self, dimension: Dimension, value: &str) -> Result<()> {
        self.ensure_open("edit")?;
        self.working.remove_value(dimension, value)?;
        self.after_edit(dimension);
        Ok(())
    }

    pub fn clear_dimension(&mut self, dimension: Dimension) -> Result<()> {
        self.ensure_open("edit")?;
        self.working.remove(dimension);
        self.after_edit(dimension);
        Ok(())
    }

    /// Load a preset's value into the working copy and mark it selected
    pub fn select_preset(&mut self, preset: &Preset) -> Result<()> {
        self.ensure_open("select a preset in")?;
        self.working = preset.value.clone();
        self.selected_preset_id = Some(preset.id.clone());
        self.refresh_state();
        debug!(preset = %preset.id, dirty = self.is_dirty(), "Selected preset in draft");
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_preset_id = None;
    }

    /// Return to the seed value
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_open("reset")?;
        self.working = self.base.clone();
        self.selected_preset_id = None;
        self.state = DraftState::Clean;
        Ok(())
    }

    /// Hand out the working value for commit and close the session
    pub fn apply(&mut self) -> Result<FilterSet> {
        self.ensure_open("apply")?;
        self.state = DraftState::Applied;
        Ok(self.working.clone())
    }

    pub fn discard(&mut self) -> Result<()> {
        self.ensure_open("discard")?;
        self.state = DraftState::Discarded;
        debug!("Discarded draft");
        Ok(())
    }

    /// End the session. An open session is discarded.
    pub fn close(mut self) -> DraftState {
        if self.is_open() {
            self.state = DraftState::Discarded;
        }
        self.state
    }

    /// Drop a selection whose preset was deleted. Returns whether it was cleared.
    pub fn reconcile_presets(&mut self, registry: &PresetRegistry) -> bool {
        let cleared = registry.invalidate_if_missing(self.selected_preset_id.as_ref());
        if cleared {
            self.selected_preset_id = None;
        }
        cleared
    }

    /// Drop the selected preset if a quick action changed the applied
    /// filters since the last sync. Returns whether it was cleared.
    ///
    /// A session that never synced (opened with [`Self::open`]) only records
    /// the current revision.
    pub fn sync_with_store(&mut self, store: &AppliedFilterStore) -> bool {
        let latest = store.quick_action_revision();
        let Some(seen) = self.seen_quick_action.replace(latest) else {
            return false;
        };
        if seen == latest {
            return false;
        }
        if self.selected_preset_id.take().is_some() {
            debug!("Cleared preset selection after quick action");
            true
        } else {
            false
        }
    }

    fn after_edit(&mut self, dimension: Dimension) {
        self.selected_preset_id = None;
        self.refresh_state();
        debug!(%dimension, dirty = self.is_dirty(), "Edited draft");
    }

    fn refresh_state(&mut self) {
        self.state = if self.is_dirty() {
            DraftState::Dirty
        } else {
            DraftState::Clean
        };
    }

    fn ensure_open(&self, action: &str) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::InvalidState(format!(
                "cannot {} a draft that is {:?}",
                action, self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CommitOrigin, CommitRecord};
    use pretty_assertions::assert_eq;

    fn seed() -> FilterSet {
        FilterSet::new().with_values(Dimension::Sources, ["a.com"])
    }

    fn preset() -> Preset {
        Preset::new("English", FilterSet::new().with_values(Dimension::Languages, ["en"]))
    }

    #[test]
    fn test_open_is_clean() {
        let draft = DraftSession::open(seed());
        assert_eq!(draft.state(), DraftState::Clean);
        assert!(!draft.is_dirty());
        assert_eq!(draft.working(), draft.base());
    }

    #[test]
    fn test_edit_marks_dirty_and_back() {
        let mut draft = DraftSession::open(seed());
        draft.add_value(Dimension::Sources, "b.com").unwrap();
        assert_eq!(draft.state(), DraftState::Dirty);

        draft.remove_value(Dimension::Sources, "b.com").unwrap();
        assert_eq!(draft.state(), DraftState::Clean);
    }

    #[test]
    fn test_reset_restores_base() {
        let mut draft = DraftSession::open(seed());
        draft.select_preset(&preset()).unwrap();
        draft
            .edit(Dimension::Labels, DimensionValue::values(["x"]))
            .unwrap();

        draft.reset().unwrap();
        assert!(!draft.is_dirty());
        assert_eq!(draft.working(), draft.base());
        assert!(draft.selected_preset_id().is_none());
    }

    #[test]
    fn test_preset_then_edit_clears_selection() {
        let preset = preset();
        let mut draft = DraftSession::open(seed());

        draft.select_preset(&preset).unwrap();
        assert_eq!(draft.working(), &preset.value);
        assert_eq!(draft.selected_preset_id(), Some(&preset.id));
        assert!(draft.is_dirty());

        draft
            .edit(Dimension::Sources, DimensionValue::values(["b.com"]))
            .unwrap();
        assert!(draft.selected_preset_id().is_none());
        assert_eq!(
            draft.working(),
            &FilterSet::new()
                .with_values(Dimension::Languages, ["en"])
                .with_values(Dimension::Sources, ["b.com"])
        );
    }

    #[test]
    fn test_selecting_preset_equal_to_base_is_clean() {
        let preset = Preset::new("Same", seed());
        let draft = DraftSession::open_with_preset(seed(), &preset);
        assert_eq!(draft.state(), DraftState::Clean);
        assert_eq!(draft.selected_preset_id(), Some(&preset.id));
    }

    #[test]
    fn test_apply_twice_is_invalid_state() {
        let mut draft = DraftSession::open(seed());
        assert_eq!(draft.apply().unwrap(), seed());
        assert_eq!(draft.state(), DraftState::Applied);

        assert!(matches!(draft.apply(), Err(Error::InvalidState(_))));
        assert!(matches!(draft.discard(), Err(Error::InvalidState(_))));
        assert!(draft.add_value(Dimension::Topics, "ai").is_err());
        assert_eq!(draft.close(), DraftState::Applied);
    }

    #[test]
    fn test_discard_then_apply_fails() {
        let mut draft = DraftSession::open(seed());
        draft.discard().unwrap();
        assert!(matches!(draft.apply(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_close_open_session_discards() {
        let draft = DraftSession::open(seed());
        assert_eq!(draft.close(), DraftState::Discarded);
    }

    #[test]
    fn test_unsynced_session_keeps_selection() {
        let store = AppliedFilterStore::new();
        let quick = CommitRecord {
            origin: CommitOrigin::QuickAction,
            label: "Excluded spam.com".to_string(),
            is_preset_applied: false,
            exclusions: None,
        };
        store.notify(store.commit_recorded(seed(), quick.clone()).unwrap());

        let preset = preset();
        let mut draft = DraftSession::open(store.read());
        draft.select_preset(&preset).unwrap();
        assert!(!draft.sync_with_store(&store));
        assert_eq!(draft.selected_preset_id(), Some(&preset.id));

        store.notify(store.commit_recorded(FilterSet::new(), quick).unwrap());
        assert!(draft.sync_with_store(&store));
        assert!(draft.selected_preset_id().is_none());
    }

    #[test]
    fn test_edit_rejects_wrong_kind() {
        let mut draft = DraftSession::open(seed());
        let err = draft
            .edit(Dimension::NoDuplicates, DimensionValue::values(["x"]))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));
        assert!(!draft.is_dirty());
    }
}
