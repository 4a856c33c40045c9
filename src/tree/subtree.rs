//! Persistent subtrees.
//!
//! A [`Subtree`] is an `Arc` handle to immutable node data. Positions are
//! relative: each subtree stores the whitespace before it (`padding`) and
//! its own `size`, so a subtree can be shared by two trees in which it sits
//! at different offsets. Absolute positions are computed on the way down
//! (see [`Node`](super::Node)).
//!
//! Mutation is copy-on-write through [`Subtree::data_mut`]; a subtree that
//! is shared is cloned shallowly (children are `Arc` bumps) before it
//! changes.

use std::sync::Arc;

use crate::base::Length;
use crate::language::{Language, ProductionId, StateId, Symbol};

// ============================================================================
// ERROR COSTS
// ============================================================================

pub(crate) const ERROR_COST_PER_RECOVERY: u32 = 500;
pub(crate) const ERROR_COST_PER_MISSING_TREE: u32 = 110;
pub(crate) const ERROR_COST_PER_SKIPPED_TREE: u32 = 100;
pub(crate) const ERROR_COST_PER_SKIPPED_LINE: u32 = 30;
pub(crate) const ERROR_COST_PER_SKIPPED_CHAR: u32 = 1;

// ============================================================================
// FLAGS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct Flags(u16);

impl Flags {
    pub const VISIBLE: u16 = 1 << 0;
    pub const NAMED: u16 = 1 << 1;
    pub const EXTRA: u16 = 1 << 2;
    pub const MISSING: u16 = 1 << 3;
    /// Built while ambiguity was live or during recovery
    pub const FRAGILE: u16 = 1 << 4;
    pub const HAS_CHANGES: u16 = 1 << 5;
    pub const HAS_EXTERNAL_TOKENS: u16 = 1 << 6;

    /// Bits that take part in structural equality.
    const STRUCTURAL: u16 = Self::VISIBLE | Self::NAMED | Self::EXTRA | Self::MISSING;

    pub fn contains(self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u16, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }

    fn structural(self) -> u16 {
        self.0 & Self::STRUCTURAL
    }
}

// ============================================================================
// SUBTREE
// ============================================================================

#[derive(Debug, Clone)]
pub(crate) struct SubtreeData {
    pub symbol: Symbol,
    /// Symbol the lexer produced, before keyword demotion
    pub lexed_symbol: Symbol,
    pub padding: Length,
    pub size: Length,
    /// Bytes past the end that were examined while building this subtree
    pub lookahead_bytes: u32,
    /// Parser state this subtree was pushed from
    pub parse_state: StateId,
    pub flags: Flags,
    pub error_cost: u32,
    pub dynamic_precedence: i32,
    pub production_id: ProductionId,
    pub children: Vec<Subtree>,
    /// Offset of each child's padding start from this subtree's padding start
    pub child_offsets: Vec<Length>,
    /// Scanner state after this token, for external tokens
    pub external_state: Option<Arc<[u8]>>,
}

// Frees uniquely owned descendants from a work list, so dropping a deep
// tree does not recurse once per level.
impl Drop for SubtreeData {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let Some(mut data) = Arc::into_inner(child.0) {
                pending.append(&mut data.children);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Subtree(Arc<SubtreeData>);

/// Inputs for a leaf built from a lexed token
pub(crate) struct LeafSpec {
    pub symbol: Symbol,
    pub lexed_symbol: Symbol,
    pub padding: Length,
    pub size: Length,
    pub lookahead_bytes: u32,
    pub parse_state: StateId,
    pub external_state: Option<Arc<[u8]>>,
}

impl Subtree {
    pub fn leaf(spec: LeafSpec, language: &Language) -> Subtree {
        let meta = language.metadata(spec.symbol);
        let mut flags = Flags::default();
        flags.set(Flags::VISIBLE, meta.visible);
        flags.set(Flags::NAMED, meta.named);
        flags.set(Flags::HAS_EXTERNAL_TOKENS, spec.external_state.is_some());
        let error_cost = if spec.symbol == Symbol::ERROR {
            error_span_cost(spec.size)
        } else {
            0
        };
        Subtree(Arc::new(SubtreeData {
            symbol: spec.symbol,
            lexed_symbol: spec.lexed_symbol,
            padding: spec.padding,
            size: spec.size,
            lookahead_bytes: spec.lookahead_bytes,
            parse_state: spec.parse_state,
            flags,
            error_cost,
            dynamic_precedence: 0,
            production_id: ProductionId::NONE,
            children: Vec::new(),
            child_offsets: Vec::new(),
            external_state: spec.external_state,
        }))
    }

    /// A zero-width token inserted by error recovery.
    pub fn missing_leaf(symbol: Symbol, parse_state: StateId, language: &Language) -> Subtree {
        let mut leaf = Subtree::leaf(
            LeafSpec {
                symbol,
                lexed_symbol: symbol,
                padding: Length::zero(),
                size: Length::zero(),
                lookahead_bytes: 0,
                parse_state,
                external_state: None,
            },
            language,
        );
        let data = leaf.data_mut();
        data.flags.set(Flags::MISSING, true);
        data.error_cost = ERROR_COST_PER_MISSING_TREE + ERROR_COST_PER_RECOVERY;
        leaf
    }

    /// An interior node; padding, size, lookahead, error cost and dynamic
    /// precedence are summarized from `children`.
    pub fn node(symbol: Symbol, children: Vec<Subtree>, production_id: ProductionId, language: &Language) -> Subtree {
        let meta = language.metadata(symbol);
        let is_error = symbol == Symbol::ERROR;
        let mut flags = Flags::default();
        flags.set(Flags::VISIBLE, meta.visible);
        flags.set(Flags::NAMED, meta.named);

        let mut child_offsets = Vec::with_capacity(children.len());
        let mut total = Length::zero();
        let mut lookahead_end = 0u32;
        let mut error_cost = 0u32;
        let mut dynamic_precedence = 0i32;
        for child in &children {
            child_offsets.push(total);
            total = total + child.total_size();
            lookahead_end = lookahead_end.max(u32::from(total.bytes) + child.lookahead_bytes());
            error_cost = error_cost.saturating_add(child.error_cost());
            if is_error && !child.is_extra() && child.is_visible() {
                error_cost = error_cost.saturating_add(ERROR_COST_PER_SKIPPED_TREE);
            }
            dynamic_precedence += child.dynamic_precedence();
            if child.has_external_tokens() {
                flags.set(Flags::HAS_EXTERNAL_TOKENS, true);
            }
        }

        let padding = children.first().map_or(Length::zero(), Subtree::padding);
        let size = total - padding;
        if is_error {
            error_cost = error_cost.saturating_add(error_span_cost(size));
        }
        if let Some(production) = language.production(production_id) {
            dynamic_precedence += i32::from(production.dynamic_precedence);
        }

        Subtree(Arc::new(SubtreeData {
            symbol,
            lexed_symbol: symbol,
            padding,
            size,
            lookahead_bytes: lookahead_end.saturating_sub(u32::from(total.bytes)),
            parse_state: StateId(0),
            flags,
            error_cost,
            dynamic_precedence,
            production_id,
            children,
            child_offsets,
            external_state: None,
        }))
    }

    pub fn error_node(children: Vec<Subtree>, language: &Language) -> Subtree {
        Subtree::node(Symbol::ERROR, children, ProductionId::NONE, language)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn symbol(&self) -> Symbol {
        self.0.symbol
    }

    pub fn lexed_symbol(&self) -> Symbol {
        self.0.lexed_symbol
    }

    pub fn padding(&self) -> Length {
        self.0.padding
    }

    pub fn size(&self) -> Length {
        self.0.size
    }

    pub fn total_size(&self) -> Length {
        self.0.padding + self.0.size
    }

    pub fn total_bytes(&self) -> u32 {
        u32::from(self.total_size().bytes)
    }

    pub fn lookahead_bytes(&self) -> u32 {
        self.0.lookahead_bytes
    }

    pub fn parse_state(&self) -> StateId {
        self.0.parse_state
    }

    pub fn error_cost(&self) -> u32 {
        self.0.error_cost
    }

    pub fn dynamic_precedence(&self) -> i32 {
        self.0.dynamic_precedence
    }

    pub fn production_id(&self) -> ProductionId {
        self.0.production_id
    }

    pub fn children(&self) -> &[Subtree] {
        &self.0.children
    }

    pub fn child_offsets(&self) -> &[Length] {
        &self.0.child_offsets
    }

    pub fn child_count(&self) -> usize {
        self.0.children.len()
    }

    pub fn external_state(&self) -> Option<&Arc<[u8]>> {
        self.0.external_state.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.0.flags.contains(Flags::VISIBLE)
    }

    pub fn is_named(&self) -> bool {
        self.0.flags.contains(Flags::NAMED)
    }

    pub fn is_extra(&self) -> bool {
        self.0.flags.contains(Flags::EXTRA)
    }

    pub fn is_missing(&self) -> bool {
        self.0.flags.contains(Flags::MISSING)
    }

    pub fn is_fragile(&self) -> bool {
        self.0.flags.contains(Flags::FRAGILE)
    }

    pub fn has_changes(&self) -> bool {
        self.0.flags.contains(Flags::HAS_CHANGES)
    }

    pub fn has_external_tokens(&self) -> bool {
        self.0.flags.contains(Flags::HAS_EXTERNAL_TOKENS)
    }

    pub fn is_error(&self) -> bool {
        self.0.symbol == Symbol::ERROR
    }

    pub fn has_error(&self) -> bool {
        self.0.error_cost > 0
    }

    /// Identity of the shared allocation.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Subtree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Leftmost leaf; `self` for leaves.
    pub fn first_leaf(&self) -> &Subtree {
        let mut tree = self;
        while let Some(first) = tree.children().first() {
            tree = first;
        }
        tree
    }

    /// Rightmost external token inside this subtree.
    pub fn last_external_token(&self) -> Option<&Subtree> {
        if !self.has_external_tokens() {
            return None;
        }
        if self.child_count() == 0 {
            return Some(self);
        }
        self.children()
            .iter()
            .rev()
            .find_map(Subtree::last_external_token)
    }

    // ------------------------------------------------------------------------
    // Copy-on-write updates
    // ------------------------------------------------------------------------

    pub fn data_mut(&mut self) -> &mut SubtreeData {
        Arc::make_mut(&mut self.0)
    }

    /// Set a flag, copying only when it actually changes.
    pub fn with_flag(mut self, bit: u16, on: bool) -> Subtree {
        if self.0.flags.contains(bit) != on {
            self.data_mut().flags.set(bit, on);
        }
        self
    }

    pub fn set_parse_state(&mut self, state: StateId) {
        if self.0.parse_state != state {
            self.data_mut().parse_state = state;
        }
    }

    pub fn set_lookahead_bytes(&mut self, bytes: u32) {
        if self.0.lookahead_bytes != bytes {
            self.data_mut().lookahead_bytes = bytes;
        }
    }

    /// Grow the size to cover trailing text that belongs to no child.
    pub fn extend_size(&mut self, trailing: Length) {
        if !trailing.is_zero() {
            let data = self.data_mut();
            data.size = data.size + trailing;
        }
    }

    /// Recompute child offsets after children were replaced.
    pub fn refresh_child_offsets(data: &mut SubtreeData) {
        let mut total = Length::zero();
        data.child_offsets.clear();
        for child in &data.children {
            data.child_offsets.push(total);
            total = total + child.total_size();
        }
    }
}

fn error_span_cost(size: Length) -> u32 {
    ERROR_COST_PER_RECOVERY
        + ERROR_COST_PER_SKIPPED_CHAR * u32::from(size.bytes)
        + ERROR_COST_PER_SKIPPED_LINE * size.extent.row
}

/// Structural equality: symbols, ranges, shape and error/extra flags.
/// Parser bookkeeping (parse state, lookahead, change marks) is ignored.
impl PartialEq for Subtree {
    fn eq(&self, other: &Subtree) -> bool {
        self.ptr_eq(other)
            || (self.0.symbol == other.0.symbol
                && self.0.padding == other.0.padding
                && self.0.size == other.0.size
                && self.0.flags.structural() == other.0.flags.structural()
                && self.0.children == other.0.children)
    }
}

impl Eq for Subtree {}
