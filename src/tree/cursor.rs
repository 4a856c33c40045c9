//! Stateful tree walking.

use text_size::TextSize;

use super::node::Node;

/// A cursor that remembers the path from its starting node, so moving to a
/// parent or sibling does not search from the root.
#[derive(Debug, Clone)]
pub struct TreeCursor<'tree> {
    /// Visited nodes with their index in the parent (0 for the start node)
    stack: Vec<(Node<'tree>, usize)>,
}

impl<'tree> TreeCursor<'tree> {
    pub fn new(node: Node<'tree>) -> Self {
        Self {
            stack: vec![(node, 0)],
        }
    }

    pub fn reset(&mut self, node: Node<'tree>) {
        self.stack.clear();
        self.stack.push((node, 0));
    }

    pub fn node(&self) -> Node<'tree> {
        self.stack[self.stack.len() - 1].0
    }

    /// Distance from the starting node.
    pub fn depth(&self) -> usize {
        self.stack.len() - 1
    }

    /// Field name of the current node within its parent.
    pub fn field_name(&self) -> Option<&'tree str> {
        let (parent, _) = self.stack.len().checked_sub(2).map(|i| self.stack[i])?;
        let (_, index) = self.stack[self.stack.len() - 1];
        parent.field_name_for_child(index)
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.node().child(0) {
            Some(child) => {
                self.stack.push((child, 0));
                true
            }
            None => false,
        }
    }

    pub fn goto_last_child(&mut self) -> bool {
        let node = self.node();
        let Some(index) = node.child_count().checked_sub(1) else {
            return false;
        };
        match node.child(index) {
            Some(child) => {
                self.stack.push((child, index));
                true
            }
            None => false,
        }
    }

    /// Move to the first child that ends after `byte`; returns its index.
    pub fn goto_first_child_for_byte(&mut self, byte: TextSize) -> Option<usize> {
        let node = self.node();
        let index = node.first_child_index_for_byte(byte);
        let child = node.child(index)?;
        self.stack.push((child, index));
        Some(index)
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        self.goto_sibling(|index| index.checked_add(1))
    }

    pub fn goto_previous_sibling(&mut self) -> bool {
        self.goto_sibling(|index| index.checked_sub(1))
    }

    fn goto_sibling(&mut self, step: impl Fn(usize) -> Option<usize>) -> bool {
        let len = self.stack.len();
        if len < 2 {
            return false;
        }
        let parent = self.stack[len - 2].0;
        let Some(index) = step(self.stack[len - 1].1) else {
            return false;
        };
        match parent.child(index) {
            Some(sibling) => {
                self.stack[len - 1] = (sibling, index);
                true
            }
            None => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }
}
