//! Single-step undo journal
//!
//! Holds at most one snapshot of the state that preceded the last committing
//! action. Every commit overwrites it; one undo consumes it.

use crate::exclusion::ExclusionLedger;
use crate::store::CommitOrigin;
use crate::types::FilterSet;

/// Snapshot of the state before a committing action
#[derive(Debug, Clone)]
pub struct UndoEntry {
    /// Identifies the commit this entry belongs to
    pub sequence: u64,
    /// Active filters before the commit
    pub filters: FilterSet,
    /// Exclusion ledger before the commit, when the action touched it
    pub exclusions: Option<ExclusionLedger>,
    /// Human-readable description of the action being undone
    pub label: String,
    /// Whether the action applied a saved preset
    pub is_preset_applied: bool,
    pub origin: CommitOrigin,
    pub recorded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Default)]
pub struct UndoJournal {
    entry: Option<UndoEntry>,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry, replacing any previous one
    pub fn push(&mut self, entry: UndoEntry) {
        self.entry = Some(entry);
    }

    pub fn peek(&self) -> Option<&UndoEntry> {
        self.entry.as_ref()
    }

    /// Remove and return the entry
    pub fn take(&mut self) -> Option<UndoEntry> {
        self.entry.take()
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Label for an "Undo" affordance
    pub fn label(&self) -> Option<&str> {
        self.entry.as_ref().map(|e| e.label.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Dimension;

    fn entry(sequence: u64, label: &str) -> UndoEntry {
        UndoEntry {
            sequence,
            filters: FilterSet::new().with_values(Dimension::Sources, ["a.com"]),
            exclusions: None,
            label: label.to_string(),
            is_preset_applied: false,
            origin: CommitOrigin::DraftApply,
            recorded_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_push_overwrites() {
        let mut journal = UndoJournal::new();
        journal.push(entry(1, "first"));
        journal.push(entry(2, "second"));

        assert_eq!(journal.label(), Some("second"));
        assert_eq!(journal.peek().unwrap().sequence, 2);
    }

    #[test]
    fn test_take_consumes() {
        let mut journal = UndoJournal::new();
        journal.push(entry(1, "Excluded a.com"));

        let taken = journal.take().unwrap();
        assert_eq!(taken.label, "Excluded a.com");
        assert!(journal.is_empty());
        assert!(journal.take().is_none());
    }
}
