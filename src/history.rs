use std::collections::VecDeque;

use crate::canvas::Layer;

/// Maximum retained undo depth. The oldest snapshot falls off the back
/// once the stack is full.
pub const MAX_HISTORY: usize = 20;

/// Snapshot-based undo/redo over the layer stack.
///
/// Each entry is a deep copy of the entire layer vector taken at gesture
/// start (or just before a structural edit). Snapshots never cover the
/// base image: crop, rotate and flip rewrite the base destructively.
#[derive(Default)]
pub struct History {
    undo: VecDeque<Vec<Layer>>,
    redo: VecDeque<Vec<Layer>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pre-edit state. Any divergent redo future is discarded.
    pub fn push(&mut self, snapshot: Vec<Layer>) {
        self.redo.clear();
        self.undo.push_front(snapshot);
        if self.undo.len() > MAX_HISTORY {
            self.undo.pop_back();
        }
    }

    /// Step back: takes the current layers, returns the restored ones.
    /// `None` when there is nothing to undo (current is handed back
    /// untouched via the Err-like convention below).
    pub fn undo(&mut self, current: Vec<Layer>) -> Result<Vec<Layer>, Vec<Layer>> {
        match self.undo.pop_front() {
            Some(restored) => {
                self.redo.push_front(current);
                Ok(restored)
            }
            None => Err(current),
        }
    }

    /// Step forward after an undo.
    pub fn redo(&mut self, current: Vec<Layer>) -> Result<Vec<Layer>, Vec<Layer>> {
        match self.redo.pop_front() {
            Some(restored) => {
                self.undo.push_front(current);
                Ok(restored)
            }
            None => Err(current),
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
