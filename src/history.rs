//! Bounded undo/redo history for one surface.
//!
//! Each entry records what happened (`Add` or `Remove`), the element involved
//! and the list index it occupied, so that undoing an erase reinserts the
//! element at its original z-position rather than on top.

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

use std::collections::VecDeque;

use crate::doc::Element;

/// Kind of mutation an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub action: HistoryAction,
    pub element: Element,
    /// List index the element occupied when the mutation happened.
    pub index: usize,
}

impl HistoryEntry {
    #[must_use]
    pub fn new(action: HistoryAction, element: Element, index: usize) -> Self {
        Self { action, element, index }
    }
}

/// Undo and redo stacks. The undo stack evicts its oldest entry past `limit`.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
}

impl History {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { undo: VecDeque::new(), redo: Vec::new(), limit: limit.max(1) }
    }

    /// Record a fresh user mutation. Clears the redo stack.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.redo.clear();
        self.push_undo(entry);
    }

    /// Pop the most recent undoable entry.
    pub fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop_back()
    }

    /// Pop the most recent redoable entry.
    pub fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    /// Move an entry that was just undone onto the redo stack.
    pub fn push_redo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
    }

    /// Put an entry that was just redone back onto the undo stack, keeping
    /// the redo stack intact.
    pub fn push_undo(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    /// Drop the latest `Add` entry for `element`, wherever it sits in the
    /// undo stack. Used when a provisional element is withdrawn.
    pub fn forget(&mut self, element: &Element) {
        if let Some(pos) = self.undo.iter().rposition(|e| e.action == HistoryAction::Add && &e.element == element) {
            self.undo.remove(pos);
        }
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
}
