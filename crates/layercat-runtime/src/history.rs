#![forbid(unsafe_code)]

//! Snapshot undo/redo for the editor.
//!
//! Each applied command pushes an `Arc` of the full editor state. Undo pops
//! the current snapshot onto the redo stack and hands back the previous one;
//! any new push starts a fresh branch and clears redo.
//!
//! ```text
//! push(s2)   undo: [s0, s1, s2]   redo: []
//! undo()     undo: [s0, s1]       redo: [s2]     -> s1
//! push(s3)   undo: [s0, s1, s3]   redo: []
//! ```
//!
//! The undo stack never holds more than `max_depth` snapshots; the oldest are
//! evicted first, so the initial state is eventually forgotten.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::config::HistoryConfig;

/// Depth-limited snapshot history.
pub struct SnapshotHistory<T> {
    undo_stack: VecDeque<Arc<T>>,
    redo_stack: VecDeque<Arc<T>>,
    max_depth: usize,
}

impl<T> fmt::Debug for SnapshotHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotHistory")
            .field("undo_depth", &self.undo_stack.len())
            .field("redo_depth", &self.redo_stack.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl<T> SnapshotHistory<T> {
    /// Empty history. A depth of zero is treated as one.
    #[must_use]
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth: config.max_depth.max(1),
        }
    }

    /// Record a new current state and drop the redo branch.
    pub fn push(&mut self, state: T) {
        self.redo_stack.clear();
        self.undo_stack.push_back(Arc::new(state));
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back, returning the state to restore.
    pub fn undo(&mut self) -> Option<Arc<T>> {
        if self.undo_stack.len() < 2 {
            return None;
        }
        let current = self.undo_stack.pop_back()?;
        self.redo_stack.push_back(current);
        self.undo_stack.back().cloned()
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self) -> Option<Arc<T>> {
        let snapshot = self.redo_stack.pop_back()?;
        self.undo_stack.push_back(snapshot);
        self.undo_stack.back().cloned()
    }

    #[must_use]
    pub fn current(&self) -> Option<&Arc<T>> {
        self.undo_stack.back()
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() >= 2
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Snapshots on the undo stack, current included.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Forget everything, e.g. after loading a new document.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(depth: usize) -> SnapshotHistory<i32> {
        SnapshotHistory::new(&HistoryConfig { max_depth: depth })
    }

    #[test]
    fn undo_needs_two_snapshots() {
        let mut h = history(10);
        assert!(h.undo().is_none());
        h.push(1);
        assert!(!h.can_undo());
        h.push(2);
        assert_eq!(*h.undo().unwrap(), 1);
        assert!(h.can_redo());
    }

    #[test]
    fn redo_restores_undone() {
        let mut h = history(10);
        h.push(1);
        h.push(2);
        h.undo();
        assert_eq!(*h.redo().unwrap(), 2);
        assert!(h.redo().is_none());
    }

    #[test]
    fn push_clears_redo() {
        let mut h = history(10);
        h.push(1);
        h.push(2);
        h.undo();
        h.push(3);
        assert!(!h.can_redo());
        assert_eq!(**h.current().unwrap(), 3);
    }

    #[test]
    fn depth_limit_evicts_oldest() {
        let mut h = history(3);
        for v in 0..6 {
            h.push(v);
        }
        assert_eq!(h.undo_depth(), 3);
        assert_eq!(*h.undo().unwrap(), 4);
        assert_eq!(*h.undo().unwrap(), 3);
        assert!(h.undo().is_none());
    }

    #[test]
    fn zero_depth_keeps_current() {
        let mut h = history(0);
        h.push(7);
        assert_eq!(h.undo_depth(), 1);
    }

    #[test]
    fn clear_removes_all() {
        let mut h = history(5);
        h.push(1);
        h.push(2);
        h.undo();
        h.clear();
        assert_eq!(h.undo_depth() + h.redo_depth(), 0);
    }

    #[test]
    fn debug_reports_depths() {
        let mut h = history(5);
        h.push(1);
        let dbg = format!("{h:?}");
        assert!(dbg.contains("undo_depth: 1"));
    }
}
