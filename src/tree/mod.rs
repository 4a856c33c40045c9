//! Persistent syntax trees.
//!
//! A [`Tree`] owns a root [`Subtree`](subtree::Subtree) and the
//! [`Language`] it was parsed with. Trees are immutable: editing returns a
//! new tree that shares every untouched subtree with the old one, so the
//! old tree stays valid and both can be read from different threads.
//!
//! ## Layers
//!
//! ```text
//! Tree ──→ Subtree (Arc, relative lengths, shared between trees)
//!   │
//!   └──→ Node<'tree> (subtree + absolute position, Copy)
//!          └──→ TreeCursor (remembers the path for parent/sibling moves)
//! ```

mod changes;
mod cursor;
mod edit;
mod lossless;
mod node;
pub(crate) mod subtree;

use std::fmt;

use text_size::TextSize;

use crate::base::{InputEdit, Length, Range};
use crate::diagnostics::{self, SyntaxError};
use crate::error::Result;
use crate::language::Language;

pub use cursor::TreeCursor;
pub use lossless::{LosslessLanguage, LosslessNode, LosslessToken, TRIVIA};
pub use node::{Children, Node};

use subtree::Subtree;

#[derive(Clone)]
pub struct Tree {
    root: Subtree,
    language: Language,
}

impl Tree {
    pub(crate) fn new(root: Subtree, language: Language) -> Self {
        Self { root, language }
    }

    pub(crate) fn root(&self) -> &Subtree {
        &self.root
    }

    pub fn root_node(&self) -> Node<'_> {
        Node::new(self, &self.root, Length::zero())
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    /// Length of the source the tree covers.
    pub fn len(&self) -> TextSize {
        self.root.total_size().bytes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == TextSize::new(0)
    }

    pub fn has_error(&self) -> bool {
        self.root.has_error()
    }

    pub fn walk(&self) -> TreeCursor<'_> {
        self.root_node().walk()
    }

    pub fn to_sexp(&self) -> String {
        self.root_node().to_sexp()
    }

    /// A tree with `edit` applied to its positions. The result is meant to
    /// be passed to the next parse; its structure is not re-validated.
    pub fn edit(&self, edit: &InputEdit) -> Result<Tree> {
        edit.validate(self.len())?;
        if edit.is_noop() {
            return Ok(self.clone());
        }
        tracing::trace!(
            start = u32::from(edit.start_byte),
            old_end = u32::from(edit.old_end_byte),
            new_end = u32::from(edit.new_end_byte),
            "editing tree"
        );
        Ok(Tree::new(edit::edit_subtree(&self.root, edit), self.language.clone()))
    }

    /// Apply edits in order; each edit is in the coordinates left by the
    /// previous one.
    pub fn edit_all(&self, edits: &[InputEdit]) -> Result<Tree> {
        edits.iter().try_fold(self.clone(), |tree, edit| tree.edit(edit))
    }

    /// Ranges whose syntax differs between this (edited) tree and `new`.
    pub fn changed_ranges(&self, new: &Tree) -> Vec<Range> {
        changes::changed_ranges(self, new)
    }

    /// The tree as a lossless rowan tree over `source`.
    pub fn to_lossless(&self, source: &str) -> LosslessNode {
        lossless::to_lossless(self, source)
    }

    /// Errors and missing tokens in the tree, in source order.
    pub fn diagnostics(&self) -> Vec<SyntaxError> {
        diagnostics::collect(self)
    }
}

/// Structural equality over the same language.
impl PartialEq for Tree {
    fn eq(&self, other: &Tree) -> bool {
        self.language.ptr_eq(&other.language) && self.root == other.root
    }
}

impl Eq for Tree {}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("language", &self.language.name())
            .field("root", &self.to_sexp())
            .finish()
    }
}
