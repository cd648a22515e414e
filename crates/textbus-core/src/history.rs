//! Undo/redo history.
//!
//! Provides:
//! - `UndoManager` trait for abstracting undo implementations
//! - `History` - bounded snapshot stacks for the editor's view tree and
//!   selection

use std::collections::VecDeque;

use crate::selection::TbRange;
use crate::view::ViewTree;

/// Trait for managing undo/redo operations.
///
/// Implementations must actually perform the undo/redo, not just track
/// state. [`Editor`](crate::Editor) implements it over a [`History`].
pub trait UndoManager {
    /// Check if undo is available.
    fn can_undo(&self) -> bool;

    /// Check if redo is available.
    fn can_redo(&self) -> bool;

    /// Perform undo. Returns true if successful.
    fn undo(&mut self) -> bool;

    /// Perform redo. Returns true if successful.
    fn redo(&mut self) -> bool;

    /// Clear all undo/redo history.
    fn clear_history(&mut self);
}

/// Document state at one point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub tree: ViewTree,
    pub ranges: Vec<TbRange>,
}

impl Snapshot {
    pub fn new(tree: &ViewTree, ranges: &[TbRange]) -> Self {
        Self {
            tree: tree.clone(),
            ranges: ranges.to_vec(),
        }
    }
}

/// Undo and redo stacks of whole-document snapshots.
///
/// The undo stack is capped; the oldest snapshot is dropped first.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(100)
    }
}

impl History {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Record the state before an edit.
    pub fn record(&mut self, before: Snapshot) {
        // New edits invalidate anything undone so far
        self.redo_stack.clear();
        self.undo_stack.push_back(before);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.pop_front();
        }
        tracing::debug!(target: "textbus::command", depth = self.undo_stack.len(), "history recorded");
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Step back: `current` goes on the redo stack and the previous state is
    /// returned.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Content;

    fn snapshot(text: &str) -> Snapshot {
        let mut tree = ViewTree::new();
        tree.append(tree.root(), Content::Text(text.into())).unwrap();
        Snapshot::new(&tree, &[])
    }

    fn text(snapshot: &Snapshot) -> String {
        let root = snapshot.tree.root();
        let frag = snapshot.tree.fragment(root).unwrap();
        frag.text_between(0, frag.content_length())
    }

    #[test]
    fn test_undo_redo_order() {
        let mut history = History::new(10);
        history.record(snapshot("a"));
        history.record(snapshot("ab"));

        let back = history.undo(snapshot("abc")).unwrap();
        assert_eq!(text(&back), "ab");
        let back = history.undo(back).unwrap();
        assert_eq!(text(&back), "a");
        assert!(!history.can_undo());

        let forward = history.redo(back).unwrap();
        assert_eq!(text(&forward), "ab");
        assert!(history.can_redo());
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = History::new(10);
        history.record(snapshot("a"));
        let _ = history.undo(snapshot("ab"));
        assert!(history.can_redo());
        history.record(snapshot("a"));
        assert!(!history.can_redo());
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(2);
        for s in ["a", "b", "c"] {
            history.record(snapshot(s));
        }
        assert_eq!(history.undo_depth(), 2);
        let last = history.undo(snapshot("d")).unwrap();
        let first = history.undo(last).unwrap();
        assert_eq!(text(&first), "b");
        assert!(history.undo(first).is_none());
    }
}
