//! Walking an old tree in step with the parser to find reusable subtrees.

use std::sync::Arc;

use crate::tree::subtree::Subtree;

#[derive(Debug, Clone)]
struct Entry {
    subtree: Subtree,
    /// Index within the parent entry's children
    child_index: usize,
    /// Absolute offset of the subtree's padding start
    byte_offset: u32,
}

/// Position in an old tree, advanced as the new parse moves forward
#[derive(Debug, Clone, Default)]
pub(crate) struct ReuseCursor {
    stack: Vec<Entry>,
    last_external_state: Option<Arc<[u8]>>,
}

impl ReuseCursor {
    pub fn new(root: &Subtree) -> Self {
        Self {
            stack: vec![Entry {
                subtree: root.clone(),
                child_index: 0,
                byte_offset: 0,
            }],
            last_external_state: None,
        }
    }

    pub fn subtree(&self) -> Option<&Subtree> {
        self.stack.last().map(|entry| &entry.subtree)
    }

    pub fn byte_offset(&self) -> u32 {
        self.stack.last().map_or(u32::MAX, |entry| entry.byte_offset)
    }

    /// Scanner state after the last external token before the cursor.
    pub fn last_external_state(&self) -> Option<&[u8]> {
        self.last_external_state.as_deref()
    }

    /// Move past the current subtree to the next one in source order.
    pub fn advance(&mut self) {
        let Some(last) = self.stack.last() else {
            return;
        };
        let byte_offset = last.byte_offset + last.subtree.total_bytes();
        if let Some(token) = last.subtree.last_external_token() {
            self.last_external_state = token.external_state().cloned();
        }

        loop {
            let Some(popped) = self.stack.pop() else {
                return;
            };
            let next_index = popped.child_index + 1;
            let Some(parent) = self.stack.last() else {
                return;
            };
            if let Some(next) = parent.subtree.children().get(next_index) {
                let entry = Entry {
                    subtree: next.clone(),
                    child_index: next_index,
                    byte_offset,
                };
                self.stack.push(entry);
                return;
            }
        }
    }

    /// Move to the current subtree's first child; false for leaves.
    pub fn descend(&mut self) -> bool {
        let Some(last) = self.stack.last() else {
            return false;
        };
        let Some(first) = last.subtree.children().first() else {
            return false;
        };
        let entry = Entry {
            subtree: first.clone(),
            child_index: 0,
            byte_offset: last.byte_offset,
        };
        self.stack.push(entry);
        true
    }

    /// Move past the first leaf of the current subtree.
    pub fn advance_past_leaf(&mut self) {
        while self.descend() {}
        self.advance();
    }
}
