//! Bounded undo/redo history.
//!
//! # Responsibility
//! - Keep `(prior document, forward, inverse)` entries for committed edits.
//! - Drop the oldest entries past the configured depth.
//!
//! # Invariants
//! - Recording a new forward edit clears the redo stack.
//! - Whole-document replacements (reset, set, mode toggle) clear both stacks;
//!   they are never recorded as entries.

use crate::model::document::Document;
use crate::model::selection::Selection;
use crate::transform::Transaction;
use std::collections::VecDeque;

/// Undo depth used when the host does not configure one.
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// One committed edit.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Document before the edit; fallback when the inverse no longer applies.
    pub before: Document,
    pub selection_before: Selection,
    pub forward: Transaction,
    pub inverse: Transaction,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    depth: usize,
}

impl History {
    /// Creates an empty history keeping at most `depth` undo entries (min 1).
    pub fn new(depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            depth: depth.max(1),
        }
    }

    /// Records a new forward edit and invalidates redo.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.push_undo(entry);
    }

    /// Pushes an entry re-applied by redo, keeping the remaining redo stack.
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
        while self.undo.len() > self.depth {
            self.undo.pop_front();
        }
    }

    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop_back()
    }

    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::{History, HistoryEntry};
    use crate::model::document::Document;
    use crate::model::schema::SchemaId;
    use crate::model::selection::Selection;
    use crate::transform::Transaction;

    fn entry() -> HistoryEntry {
        HistoryEntry {
            before: Document::empty(SchemaId::Text),
            selection_before: Selection::cursor(1),
            forward: Transaction::new(),
            inverse: Transaction::new(),
        }
    }

    #[test]
    fn depth_is_bounded() {
        let mut history = History::new(3);
        for _ in 0..10 {
            history.record(entry());
        }
        assert_eq!(history.undo_depth(), 3);
    }

    #[test]
    fn recording_clears_redo() {
        let mut history = History::default();
        history.record(entry());
        let undone = history.pop_undo().expect("one entry");
        history.push_redo(undone);
        assert_eq!(history.redo_depth(), 1);

        history.record(entry());
        assert_eq!(history.redo_depth(), 0);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn clear_empties_both_stacks() {
        let mut history = History::default();
        history.record(entry());
        history.push_redo(entry());
        history.clear();
        assert_eq!((history.undo_depth(), history.redo_depth()), (0, 0));
    }
}
