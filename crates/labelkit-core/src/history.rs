//! Snapshot-based undo/redo.

use crate::document::LabelDocument;
use std::collections::VecDeque;

/// Maximum number of undo states kept by default.
pub const DEFAULT_UNDO_CAPACITY: usize = 50;

/// Undo and redo stacks of whole-document snapshots.
///
/// Snapshots never carry decoded image data. Recording a checkpoint clears
/// the redo stack, and the oldest checkpoint is evicted once `capacity` is
/// exceeded.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<LabelDocument>,
    redo_stack: Vec<LabelDocument>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Push the pre-mutation state (call before making changes).
    pub fn record_checkpoint(&mut self, current: &LabelDocument) {
        self.undo_stack.push_back(current.handle_free());
        self.redo_stack.clear();

        while self.undo_stack.len() > self.capacity {
            self.undo_stack.pop_front();
        }
    }

    /// Restore the last checkpoint into `current`.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self, current: &mut LabelDocument) -> bool {
        let Some(snapshot) = self.undo_stack.pop_back() else {
            return false;
        };
        self.redo_stack.push(current.handle_free());
        *current = snapshot;
        true
    }

    /// Re-apply the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self, current: &mut LabelDocument) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push_back(current.handle_free());
        *current = snapshot;
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget all checkpoints.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
