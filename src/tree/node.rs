//! Read-only views over a [`Tree`].
//!
//! A [`Node`] pairs a subtree with its absolute position. Nodes are `Copy`
//! and borrow the tree; walking down is O(1) per step, while `parent` and
//! sibling lookups search from the root (use a [`TreeCursor`] for long walks).

use std::fmt;
use std::ops::Range as ByteRange;

use text_size::{TextRange, TextSize};

use crate::base::{Length, Point, Range};
use crate::language::{FieldId, Symbol};

use super::cursor::TreeCursor;
use super::subtree::Subtree;
use super::Tree;

/// A node of a [`Tree`].
///
/// Walk downwards with [`Node::children`] or a [`TreeCursor`]; both keep
/// the path, so each step is O(1). [`Node::parent`] and the sibling methods
/// search from the root and suit one-off lookups only.
///
/// ```
/// # fn demo(tree: &canopy::Tree) {
/// // Every named node, in document order.
/// let mut cursor = tree.walk();
/// let mut named = Vec::new();
/// loop {
///     let node = cursor.node();
///     if node.is_named() {
///         named.push(node.kind());
///     }
///     if cursor.goto_first_child() {
///         continue;
///     }
///     while !cursor.goto_next_sibling() {
///         if !cursor.goto_parent() {
///             return;
///         }
///     }
/// }
/// # }
/// ```
///
/// Siblings are cheapest through the parent's children:
///
/// ```
/// # fn demo(node: canopy::Node<'_>) {
/// for child in node.children().filter(|child| child.is_named()) {
///     println!("{} at {:?}", child.kind(), child.byte_range());
/// }
/// # }
/// ```
#[derive(Clone, Copy)]
pub struct Node<'tree> {
    tree: &'tree Tree,
    subtree: &'tree Subtree,
    /// Absolute start of the subtree's padding
    position: Length,
}

impl<'tree> Node<'tree> {
    pub(crate) fn new(tree: &'tree Tree, subtree: &'tree Subtree, position: Length) -> Self {
        Self {
            tree,
            subtree,
            position,
        }
    }

    pub(crate) fn subtree(&self) -> &'tree Subtree {
        self.subtree
    }

    pub(crate) fn position(&self) -> Length {
        self.position
    }

    pub fn tree(&self) -> &'tree Tree {
        self.tree
    }

    /// Stable identity: equal for the same shared subtree, even across trees.
    pub fn id(&self) -> usize {
        self.subtree.id()
    }

    // ------------------------------------------------------------------------
    // Kind
    // ------------------------------------------------------------------------

    pub fn kind(&self) -> &'tree str {
        self.tree.language().symbol_name(self.subtree.symbol())
    }

    pub fn kind_id(&self) -> Symbol {
        self.subtree.symbol()
    }

    pub fn is_named(&self) -> bool {
        self.subtree.is_named()
    }

    pub fn is_extra(&self) -> bool {
        self.subtree.is_extra()
    }

    pub fn is_missing(&self) -> bool {
        self.subtree.is_missing()
    }

    pub fn is_error(&self) -> bool {
        self.subtree.is_error()
    }

    pub fn has_error(&self) -> bool {
        self.subtree.has_error()
    }

    pub fn has_changes(&self) -> bool {
        self.subtree.has_changes()
    }

    // ------------------------------------------------------------------------
    // Position
    // ------------------------------------------------------------------------

    pub(crate) fn start(&self) -> Length {
        self.position + self.subtree.padding()
    }

    pub(crate) fn end(&self) -> Length {
        self.start() + self.subtree.size()
    }

    pub fn start_byte(&self) -> TextSize {
        self.start().bytes
    }

    pub fn end_byte(&self) -> TextSize {
        self.end().bytes
    }

    pub fn start_position(&self) -> Point {
        self.start().extent
    }

    pub fn end_position(&self) -> Point {
        self.end().extent
    }

    pub fn text_range(&self) -> TextRange {
        TextRange::new(self.start_byte(), self.end_byte())
    }

    pub fn byte_range(&self) -> ByteRange<usize> {
        self.start().byte_usize()..self.end().byte_usize()
    }

    pub fn range(&self) -> Range {
        Range::new(self.start(), self.end())
    }

    /// The node's text, or `None` if `source` is not the parsed text.
    pub fn utf8_text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.byte_range())
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    pub fn child_count(&self) -> usize {
        self.subtree.child_count()
    }

    pub fn child(&self, index: usize) -> Option<Node<'tree>> {
        let subtree = self.subtree.children().get(index)?;
        let offset = self.subtree.child_offsets()[index];
        Some(Node::new(self.tree, subtree, self.position + offset))
    }

    pub fn children(&self) -> Children<'tree> {
        Children {
            node: *self,
            index: 0,
        }
    }

    pub fn named_child_count(&self) -> usize {
        self.subtree.children().iter().filter(|c| c.is_named()).count()
    }

    pub fn named_child(&self, index: usize) -> Option<Node<'tree>> {
        self.named_children().nth(index)
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'tree>> + 'tree {
        self.children().filter(Node::is_named)
    }

    pub fn first_child(&self) -> Option<Node<'tree>> {
        self.child(0)
    }

    pub fn last_child(&self) -> Option<Node<'tree>> {
        self.child(self.child_count().checked_sub(1)?)
    }

    /// First child that ends after `byte`.
    pub fn first_child_for_byte(&self, byte: TextSize) -> Option<Node<'tree>> {
        let index = self.first_child_index_for_byte(byte);
        self.child(index)
    }

    pub fn first_named_child_for_byte(&self, byte: TextSize) -> Option<Node<'tree>> {
        let index = self.first_child_index_for_byte(byte);
        self.children().skip(index).find(Node::is_named)
    }

    pub(crate) fn first_child_index_for_byte(&self, byte: TextSize) -> usize {
        let children = self.subtree.children();
        let offsets = self.subtree.child_offsets();
        let (mut low, mut high) = (0, children.len());
        while low < high {
            let mid = low + (high - low) / 2;
            let end = self.position.bytes + offsets[mid].bytes + children[mid].total_size().bytes;
            if end > byte {
                high = mid;
            } else {
                low = mid + 1;
            }
        }
        low
    }

    // ------------------------------------------------------------------------
    // Fields
    // ------------------------------------------------------------------------

    pub fn child_by_field_name(&self, name: &str) -> Option<Node<'tree>> {
        let field = self.tree.language().field_id(name)?;
        self.child_by_field_id(field)
    }

    pub fn child_by_field_id(&self, field: FieldId) -> Option<Node<'tree>> {
        let production = self.tree.language().production(self.subtree.production_id())?;
        let target = production.child_for_field(field)?;
        self.children().filter(|c| !c.is_extra()).nth(target)
    }

    /// Field name of child `index`, if its production names it.
    pub fn field_name_for_child(&self, index: usize) -> Option<&'tree str> {
        let children = self.subtree.children();
        if children.get(index)?.is_extra() {
            return None;
        }
        let structural = children[..index].iter().filter(|c| !c.is_extra()).count();
        let language = self.tree.language();
        let production = language.production(self.subtree.production_id())?;
        language.field_name(production.field_for_child(structural)?)
    }

    // ------------------------------------------------------------------------
    // Parent and siblings
    // ------------------------------------------------------------------------

    /// Searches from the root; prefer a [`TreeCursor`] when walking.
    pub fn parent(&self) -> Option<Node<'tree>> {
        let root = self.tree.root_node();
        if root == *self {
            return None;
        }
        root.find_parent_of(self)
    }

    fn find_parent_of(&self, target: &Node<'tree>) -> Option<Node<'tree>> {
        if self.children().any(|child| child == *target) {
            return Some(*self);
        }
        let start = target.position.bytes;
        let end = start + target.subtree.total_size().bytes;
        self.children()
            .filter(|child| {
                let child_start = child.position.bytes;
                let child_end = child_start + child.subtree.total_size().bytes;
                child.child_count() > 0 && child_start <= start && end <= child_end
            })
            .find_map(|child| child.find_parent_of(target))
    }

    fn index_in_parent(&self) -> Option<(Node<'tree>, usize)> {
        let parent = self.parent()?;
        let index = parent
            .subtree
            .children()
            .iter()
            .position(|c| std::ptr::eq(c, self.subtree))?;
        Some((parent, index))
    }

    /// Costs a [`Node::parent`] lookup; iterate the parent's
    /// [`Node::children`] to visit every sibling.
    pub fn next_sibling(&self) -> Option<Node<'tree>> {
        let (parent, index) = self.index_in_parent()?;
        parent.child(index + 1)
    }

    pub fn prev_sibling(&self) -> Option<Node<'tree>> {
        let (parent, index) = self.index_in_parent()?;
        parent.child(index.checked_sub(1)?)
    }

    pub fn next_named_sibling(&self) -> Option<Node<'tree>> {
        let (parent, index) = self.index_in_parent()?;
        parent.children().skip(index + 1).find(Node::is_named)
    }

    pub fn prev_named_sibling(&self) -> Option<Node<'tree>> {
        let (parent, index) = self.index_in_parent()?;
        parent.children().take(index).filter(Node::is_named).last()
    }

    // ------------------------------------------------------------------------
    // Descendants
    // ------------------------------------------------------------------------

    /// Smallest node that spans `start..end`; `None` unless the range lies
    /// inside this node.
    pub fn descendant_for_byte_range(&self, start: TextSize, end: TextSize) -> Option<Node<'tree>> {
        self.descend_to(|n| (n.start_byte(), n.end_byte()), start, end, false)
    }

    /// Smallest named node that spans `start..end`.
    pub fn named_descendant_for_byte_range(&self, start: TextSize, end: TextSize) -> Option<Node<'tree>> {
        self.descend_to(|n| (n.start_byte(), n.end_byte()), start, end, true)
    }

    pub fn descendant_for_point_range(&self, start: Point, end: Point) -> Option<Node<'tree>> {
        self.descend_to(|n| (n.start_position(), n.end_position()), start, end, false)
    }

    fn descend_to<K: Ord + Copy>(
        &self,
        bounds: impl Fn(&Node<'tree>) -> (K, K),
        start: K,
        end: K,
        named_only: bool,
    ) -> Option<Node<'tree>> {
        let (self_start, self_end) = bounds(self);
        if start > end || start < self_start || end > self_end {
            return None;
        }
        let mut node = *self;
        let mut last_relevant = *self;
        loop {
            let mut descended = false;
            for child in node.children() {
                let (child_start, child_end) = bounds(&child);
                // Must reach the end of the range...
                if child_end < end {
                    continue;
                }
                // ...and extend past its start, unless the child is empty.
                if child_end <= start && child_start < child_end {
                    continue;
                }
                if start < child_start {
                    break;
                }
                node = child;
                if !named_only || node.is_named() {
                    last_relevant = node;
                }
                descended = true;
                break;
            }
            if !descended {
                return Some(last_relevant);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    pub fn walk(&self) -> TreeCursor<'tree> {
        TreeCursor::new(*self)
    }

    /// S-expression of the named structure below this node.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out, None);
        out
    }

    fn write_sexp(&self, out: &mut String, field: Option<&str>) {
        let visible = self.is_named() || self.is_missing();
        if visible {
            if !(out.is_empty() || out.ends_with('(') || out.ends_with(' ')) {
                out.push(' ');
            }
            if let Some(field) = field {
                out.push_str(field);
                out.push_str(": ");
            }
            if self.is_missing() {
                out.push_str("(MISSING ");
                if self.is_named() {
                    out.push_str(self.kind());
                } else {
                    out.push('"');
                    out.push_str(self.kind());
                    out.push('"');
                }
            } else {
                out.push('(');
                out.push_str(self.kind());
            }
        }
        for (index, child) in self.children().enumerate() {
            let child_field = self.field_name_for_child(index);
            child.write_sexp(out, child_field);
        }
        if visible {
            out.push(')');
        }
    }
}

/// Same subtree at the same position.
impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.subtree, other.subtree) && self.position == other.position
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{Node {} {} - {}}}",
            self.kind(),
            self.start_position(),
            self.end_position()
        )
    }
}

/// Iterator over a node's direct children
pub struct Children<'tree> {
    node: Node<'tree>,
    index: usize,
}

impl<'tree> Iterator for Children<'tree> {
    type Item = Node<'tree>;

    fn next(&mut self) -> Option<Node<'tree>> {
        let child = self.node.child(self.index)?;
        self.index += 1;
        Some(child)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.node.child_count().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Children<'_> {}
