//! The GLR driver loop.
//!
//! Every stack version owns a lookahead. The driver always advances the
//! active version that is furthest behind, so versions meet at the same
//! position and can be merged by [`Engine::condense`]. A version that hits
//! a syntax error is paused while others can still make progress; when none
//! can, the cheapest paused version is resumed through error recovery.

use std::sync::Arc;
use std::time::{Duration, Instant};

use text_size::TextSize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::base::Length;
use crate::error::{Error, Result};
use crate::language::{Language, ParseAction, ProductionId, StateId, Symbol};
use crate::lexer::Lexer;
use crate::tree::subtree::{Flags, LeafSpec, Subtree};

use super::config::ParserConfig;
use super::reuse::ReuseCursor;
use super::select;
use super::stack::{self, Head, StackNode};

/// Versions whose cost exceeds the best by more than this are dropped
const MAX_COST_DIFFERENCE: u32 = 16 * crate::tree::subtree::ERROR_COST_PER_SKIPPED_TREE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Status {
    Active,
    Paused,
    Halted,
}

#[derive(Debug, Clone)]
pub(super) struct Lookahead {
    pub tree: Subtree,
    /// Taken from the old tree; shifting it advances the reuse cursor
    pub reused: bool,
}

impl Lookahead {
    pub fn fresh(tree: Subtree) -> Self {
        Self { tree, reused: false }
    }

    /// Bytes of input that deciding on this lookahead depended on.
    fn decision_extent(&self) -> u32 {
        let leaf = self.tree.first_leaf();
        leaf.total_bytes() + leaf.lookahead_bytes()
    }
}

#[derive(Debug, Clone)]
pub(super) struct Version {
    pub head: Head,
    pub status: Status,
    pub lookahead: Option<Lookahead>,
    /// Real token waiting behind an inserted missing token
    pub queued: Option<Lookahead>,
    /// Position of the last missing-token insertion
    pub missing_at: Option<u32>,
}

impl Version {
    fn new(head: Head, lookahead: Option<Lookahead>) -> Self {
        Self {
            head,
            status: Status::Active,
            lookahead,
            queued: None,
            missing_at: None,
        }
    }
}

struct CachedToken {
    position: u32,
    state: StateId,
    external_state: Option<Arc<[u8]>>,
    tree: Subtree,
}

pub(super) struct Engine<'a> {
    pub(super) language: &'a Language,
    pub(super) lexer: Lexer<'a>,
    pub(super) config: &'a ParserConfig,
    pub(super) source_len: u32,
    cancellation: Option<&'a CancellationToken>,
    deadline: Option<(Instant, Duration)>,
    pub(super) versions: Vec<Version>,
    reuse: Option<ReuseCursor>,
    pub(super) accepted: Option<Subtree>,
    cached: Option<CachedToken>,
}

impl<'a> Engine<'a> {
    pub fn new(
        language: &'a Language,
        source: &'a str,
        old_tree: Option<&Subtree>,
        config: &'a ParserConfig,
        cancellation: Option<&'a CancellationToken>,
    ) -> Self {
        let start = StackNode::base(language.table().start_state());
        Self {
            language,
            lexer: Lexer::new(language, source),
            config,
            source_len: u32::from(TextSize::of(source)),
            cancellation,
            deadline: config.timeout.map(|timeout| (Instant::now() + timeout, timeout)),
            versions: vec![Version::new(start, None)],
            reuse: old_tree.filter(|_| config.reuse).map(ReuseCursor::new),
            accepted: None,
            cached: None,
        }
    }

    pub fn run(mut self) -> Result<Subtree> {
        loop {
            if let Some(index) = self.next_active() {
                self.advance(index)?;
                self.condense();
                continue;
            }
            if self.accepted.is_some() || !self.resume_paused()? {
                break;
            }
            self.condense();
        }
        match self.accepted.take() {
            Some(root) => Ok(root),
            // Only reachable with a table that can neither accept nor recover.
            None => Ok(self.finish_without_accept()),
        }
    }

    /// The active version furthest behind; ties go to the older version.
    fn next_active(&self) -> Option<usize> {
        self.versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.status == Status::Active)
            .min_by_key(|(index, v)| (v.head.position.bytes, *index))
            .map(|(index, _)| index)
    }

    fn active_count(&self) -> usize {
        self.versions.iter().filter(|v| v.status == Status::Active).count()
    }

    // ------------------------------------------------------------------------
    // Advancing one version
    // ------------------------------------------------------------------------

    fn advance(&mut self, index: usize) -> Result<()> {
        loop {
            let state = self.versions[index].head.state;
            let lookahead = self.current_lookahead(index)?;
            let symbol = lookahead.tree.first_leaf().symbol();
            let table = self.language.table();
            let mut actions = if lookahead.tree.is_error() {
                &[][..]
            } else {
                table.actions(state, symbol)
            };

            if actions.is_empty() {
                if lookahead.reused {
                    trace!(symbol = %symbol, "reused lookahead not valid here, relexing");
                    if let Some(cursor) = self.reuse.as_mut() {
                        cursor.advance_past_leaf();
                    }
                    self.versions[index].lookahead = None;
                    continue;
                }
                self.handle_error(index);
                return Ok(());
            }

            let mut lookahead = lookahead;
            // A reused node is shifted whole only on an unambiguous, non-extra
            // shift of its first leaf; a leading extra must be shifted alone.
            let extra_shift = actions
                .iter()
                .any(|action| matches!(action, ParseAction::Shift { extra: true, .. }));
            if (actions.len() > 1 || extra_shift) && lookahead.reused && lookahead.tree.child_count() > 0 {
                lookahead = self.break_down_to_leaf(lookahead);
                self.versions[index].lookahead = Some(lookahead.clone());
                actions = table.actions(state, lookahead.tree.symbol());
            }

            if actions.iter().any(|a| matches!(a, ParseAction::Accept)) {
                self.accept(index, &lookahead);
                return Ok(());
            }

            let shift = actions.iter().find_map(|action| match *action {
                ParseAction::Shift { state, extra } => Some((state, extra)),
                _ => None,
            });
            let productions: Vec<ProductionId> = actions
                .iter()
                .filter_map(|action| match *action {
                    ParseAction::Reduce { production } => Some(production),
                    _ => None,
                })
                .collect();
            let fragile = actions.len() > 1 || self.versions.len() > 1;

            let mut heads = Vec::new();
            for &production in &productions {
                heads.extend(self.reduce(index, production, fragile, &lookahead));
            }

            match shift {
                Some((next, extra)) => {
                    let detached = Lookahead::fresh(lookahead.tree.clone());
                    for head in heads {
                        self.versions.push(Version::new(head, Some(detached.clone())));
                    }
                    self.shift(index, next, extra, lookahead);
                    return Ok(());
                }
                None => {
                    let mut heads = heads.into_iter();
                    let Some(first) = heads.next() else {
                        // Every reduction failed its goto: treat as an error.
                        self.handle_error(index);
                        return Ok(());
                    };
                    let detached = Lookahead::fresh(lookahead.tree.clone());
                    for head in heads {
                        self.versions.push(Version::new(head, Some(detached.clone())));
                    }
                    self.versions[index].head = first;
                }
            }
        }
    }

    /// The version's lookahead, lexing or reusing one if needed. A token
    /// lexed for another version is relexed when this state lexes
    /// differently.
    fn current_lookahead(&mut self, index: usize) -> Result<Lookahead> {
        let state = self.versions[index].head.state;
        if let Some(lookahead) = self.versions[index].lookahead.clone() {
            if !self.needs_relex(&lookahead, state) {
                return Ok(lookahead);
            }
            trace!(state = state.0, "relexing lookahead for this state");
        }
        let lookahead = match self.versions[index].queued.take() {
            Some(queued) => queued,
            None => self.next_lookahead(index)?,
        };
        self.versions[index].lookahead = Some(lookahead.clone());
        Ok(lookahead)
    }

    fn needs_relex(&self, lookahead: &Lookahead, state: StateId) -> bool {
        let tree = &lookahead.tree;
        if lookahead.reused || tree.child_count() > 0 || tree.is_missing() || tree.parse_state() == state {
            return false;
        }
        let table = self.language.table();
        table.lex_mode(tree.parse_state()) != table.lex_mode(state)
            || self.lexer.resolve_keyword(state, tree.lexed_symbol()) != tree.symbol()
    }

    fn next_lookahead(&mut self, index: usize) -> Result<Lookahead> {
        let head = self.versions[index].head.clone();
        if self.reuse.is_some() && self.active_count() == 1 {
            if let Some(tree) = self.find_reusable(&head) {
                debug!(symbol = self.language.symbol_name(tree.symbol()), offset = u32::from(head.position.bytes), "reuse");
                return Ok(Lookahead { tree, reused: true });
            }
        }
        let tree = self.lex(head.position, head.state, head.external_state.clone())?;
        Ok(Lookahead::fresh(tree))
    }

    pub(super) fn lex(&mut self, position: Length, state: StateId, external_state: Option<Arc<[u8]>>) -> Result<Subtree> {
        self.check_interrupted()?;
        let offset = u32::from(position.bytes);
        if let Some(cached) = &self.cached {
            if cached.position == offset
                && cached.state == state
                && cached.external_state.as_deref() == external_state.as_deref()
            {
                return Ok(cached.tree.clone());
            }
        }

        let raw = self.lexer.lex(position, state, external_state.as_deref());
        let tree = Subtree::leaf(
            LeafSpec {
                symbol: raw.symbol,
                lexed_symbol: raw.lexed_symbol,
                padding: raw.padding,
                size: raw.size,
                lookahead_bytes: raw.lookahead_bytes,
                parse_state: state,
                external_state: raw.external_state,
            },
            self.language,
        );
        trace!(symbol = self.language.symbol_name(tree.symbol()), offset, "lexed");
        self.cached = Some(CachedToken {
            position: offset,
            state,
            external_state,
            tree: tree.clone(),
        });
        Ok(tree)
    }

    fn check_interrupted(&self) -> Result<()> {
        if self.cancellation.is_some_and(CancellationToken::is_cancelled) {
            debug!("parse cancelled");
            return Err(Error::Cancelled);
        }
        if let Some((deadline, timeout)) = self.deadline {
            if Instant::now() >= deadline {
                debug!(?timeout, "parse timed out");
                return Err(Error::Timeout(timeout));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Reuse
    // ------------------------------------------------------------------------

    fn find_reusable(&mut self, head: &Head) -> Option<Subtree> {
        let position = u32::from(head.position.bytes);
        let state = head.state;
        let cursor = self.reuse.as_mut()?;
        while let Some(tree) = cursor.subtree().cloned() {
            let start = cursor.byte_offset();
            let end = start + tree.total_bytes();
            if start > position {
                break;
            }
            if start < position || tree.total_size().is_zero() {
                if end <= position || !cursor.descend() {
                    cursor.advance();
                }
                continue;
            }
            if cursor.last_external_state() != head.external_state.as_deref() {
                trace!("external scanner state differs");
                cursor.advance();
                continue;
            }
            let rejected = if tree.has_changes() {
                Some("has_changes")
            } else if tree.has_error() {
                Some("has_error")
            } else if tree.is_fragile() {
                Some("fragile")
            } else if end > self.source_len {
                Some("past_end")
            } else {
                None
            };
            if let Some(reason) = rejected {
                trace!(symbol = self.language.symbol_name(tree.symbol()), reason, "cannot reuse");
                if !cursor.descend() {
                    cursor.advance();
                }
                continue;
            }
            if !can_reuse_first_leaf(self.language, &self.lexer, state, &tree) {
                trace!(symbol = self.language.symbol_name(tree.symbol()), "first leaf not reusable");
                cursor.advance_past_leaf();
                break;
            }
            return Some(tree);
        }
        None
    }

    /// Replace a reused non-terminal lookahead by its first leaf, keeping
    /// the reuse cursor on that leaf.
    fn break_down_to_leaf(&mut self, lookahead: Lookahead) -> Lookahead {
        let mut tree = lookahead.tree;
        while let Some(first) = tree.children().first().cloned() {
            if let Some(cursor) = self.reuse.as_mut() {
                cursor.descend();
            }
            tree = first;
        }
        Lookahead { tree, reused: true }
    }

    // ------------------------------------------------------------------------
    // Shift, reduce, accept
    // ------------------------------------------------------------------------

    pub(super) fn shift(&mut self, index: usize, next: StateId, extra: bool, lookahead: Lookahead) {
        let state = self.versions[index].head.state;
        let mut tree = lookahead.tree;
        let mut next = next;

        if tree.child_count() > 0 {
            // Descend until the subtree was pushed from this very state.
            while tree.child_count() > 0 && tree.parse_state() != state {
                let Some(first) = tree.children().first().cloned() else {
                    break;
                };
                if lookahead.reused {
                    if let Some(cursor) = self.reuse.as_mut() {
                        cursor.descend();
                    }
                }
                tree = first;
            }
            if tree.child_count() > 0 {
                if let Some(goto) = self.language.table().goto(state, tree.symbol()) {
                    next = goto;
                }
            }
        }

        if tree.is_extra() != extra {
            tree = tree.with_flag(Flags::EXTRA, extra);
        }
        if tree.child_count() == 0 && !lookahead.reused {
            tree.set_parse_state(state);
        }
        trace!(symbol = self.language.symbol_name(tree.symbol()), state = next.0, extra, "shift");

        let version = &mut self.versions[index];
        version.head = StackNode::push(&version.head, tree, next);
        version.lookahead = None;
        if lookahead.reused {
            if let Some(cursor) = self.reuse.as_mut() {
                cursor.advance();
            }
        }
    }

    /// Apply one reduction to version `index`; returns the resulting heads,
    /// one per distinct base.
    fn reduce(&mut self, index: usize, production_id: ProductionId, fragile: bool, lookahead: &Lookahead) -> Vec<Head> {
        let Some(production) = self.language.production(production_id) else {
            return Vec::new();
        };
        let head = self.versions[index].head.clone();
        let slices = stack::pop_count(&head, production.child_count as usize);
        let fragile = fragile || slices.len() > 1;

        let mut candidates: Vec<(Head, Subtree, Vec<Subtree>)> = Vec::new();
        for slice in slices {
            let mut children = slice.subtrees;
            let trailing_start = children
                .iter()
                .rposition(|child| !child.is_extra())
                .map_or(0, |last| last + 1);
            let trailing = children.split_off(trailing_start);

            let (mut node, elided) = self.build_node(production.lhs, production_id, children, fragile);
            if !elided {
                let node_end = slice.base.position + node.total_size();
                let decided = u32::from(head.position.bytes).saturating_sub(u32::from(node_end.bytes))
                    + lookahead.decision_extent();
                if decided > node.lookahead_bytes() {
                    node.set_lookahead_bytes(decided);
                }
                node.set_parse_state(slice.base.state);
            }

            match candidates.iter_mut().find(|(base, _, _)| Arc::ptr_eq(base, &slice.base)) {
                Some(existing) => {
                    if select::prefer(&node, &existing.1, self.config.ambiguity) {
                        trace!(symbol = self.language.symbol_name(node.symbol()), "select alternative");
                        existing.1 = node;
                        existing.2 = trailing;
                    }
                }
                None => candidates.push((slice.base, node, trailing)),
            }
        }

        let lhs = production.lhs;
        candidates
            .into_iter()
            .filter_map(|(base, node, trailing)| {
                let Some(next) = self.language.table().goto(base.state, lhs) else {
                    debug!(state = base.state.0, symbol = self.language.symbol_name(lhs), "missing goto");
                    return None;
                };
                trace!(symbol = self.language.symbol_name(lhs), state = next.0, "reduce");
                let mut head = StackNode::push(&base, node, next);
                for extra in trailing {
                    head = StackNode::push(&head, extra, next);
                }
                Some(head)
            })
            .collect()
    }

    /// A node for a reduction, or the only child of a hidden single-child
    /// production (`true` in the second field).
    fn build_node(
        &self,
        lhs: Symbol,
        production_id: ProductionId,
        mut children: Vec<Subtree>,
        fragile: bool,
    ) -> (Subtree, bool) {
        if children.len() == 1 && !self.language.metadata(lhs).visible {
            if let Some(only) = children.pop() {
                return (only, true);
            }
        }
        let node = Subtree::node(lhs, children, production_id, self.language).with_flag(Flags::FRAGILE, fragile);
        (node, false)
    }

    fn accept(&mut self, index: usize, lookahead: &Lookahead) {
        let head = self.versions[index].head.clone();
        let end = head.position + lookahead.tree.padding();
        for slice in stack::pop_all(&head) {
            let root = self.build_root(slice.subtrees, end);
            self.offer_root(root);
        }
        debug!(version = index, cost = head.error_cost, "accept");
        self.versions[index].status = Status::Halted;
    }

    /// Keep `root` if it beats the tree accepted so far.
    pub(super) fn offer_root(&mut self, root: Subtree) {
        let better = match &self.accepted {
            Some(existing) => select::prefer(&root, existing, self.config.ambiguity),
            None => true,
        };
        if better {
            self.accepted = Some(root);
        }
    }

    /// A root spanning `end` bytes. When the stack holds a node of the root
    /// symbol, its children are spliced in with the surrounding extras;
    /// anything else is wrapped.
    pub(super) fn build_root(&self, subtrees: Vec<Subtree>, end: Length) -> Subtree {
        let root_symbol = self.language.root_symbol();
        let spliced = subtrees
            .iter()
            .rposition(|tree| !tree.is_extra())
            .filter(|&last| {
                subtrees[last].symbol() == root_symbol && subtrees[..last].iter().all(Subtree::is_extra)
            });

        let mut root = match spliced {
            Some(last) => {
                let main = subtrees[last].clone();
                let mut children = subtrees[..last].to_vec();
                children.extend(main.children().iter().cloned());
                children.extend(subtrees[last + 1..].iter().cloned());
                Subtree::node(root_symbol, children, main.production_id(), self.language)
            }
            None => Subtree::node(root_symbol, subtrees, ProductionId::NONE, self.language),
        };
        root.extend_size(end - root.total_size());
        root.set_parse_state(self.language.table().start_state());
        root
    }

    fn finish_without_accept(&self) -> Subtree {
        let Some(version) = self.versions.iter().min_by_key(|v| v.head.error_cost) else {
            return self.build_root(Vec::new(), Length::zero());
        };
        let subtrees = stack::pop_all(&version.head)
            .into_iter()
            .next()
            .map(|slice| slice.subtrees)
            .unwrap_or_default();
        let error = Subtree::error_node(subtrees, self.language);
        self.build_root(vec![error], version.head.position)
    }

    // ------------------------------------------------------------------------
    // Version bookkeeping
    // ------------------------------------------------------------------------

    /// Park a version that cannot advance. Recovery starts once no version
    /// can advance (see [`Engine::resume_paused`]).
    fn handle_error(&mut self, index: usize) {
        if self.accepted.is_some() {
            trace!(version = index, "halt after accept");
            self.versions[index].status = Status::Halted;
        } else {
            debug!(version = index, "detect_error, pausing");
            self.versions[index].status = Status::Paused;
        }
    }

    /// Resume the cheapest paused version; false when there is none.
    fn resume_paused(&mut self) -> Result<bool> {
        let Some(index) = self
            .versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.status == Status::Paused)
            .min_by_key(|(index, v)| (v.head.error_cost, *index))
            .map(|(index, _)| index)
        else {
            return Ok(false);
        };
        for (i, version) in self.versions.iter_mut().enumerate() {
            if i != index && version.status == Status::Paused {
                version.status = Status::Halted;
            }
        }
        debug!(version = index, "resume");
        self.versions[index].status = Status::Active;
        self.recover(index)?;
        Ok(true)
    }

    /// Remove halted versions, merge equivalent ones, drop hopeless ones and
    /// cap the number of active versions.
    pub(super) fn condense(&mut self) {
        self.versions.retain(|v| v.status != Status::Halted);
        if let Some(accepted) = &self.accepted {
            let cost = accepted.error_cost();
            self.versions.retain(|v| v.head.error_cost <= cost);
        }

        let mut i = 0;
        while i < self.versions.len() {
            let mut j = i + 1;
            while j < self.versions.len() {
                if mergeable(&self.versions[i], &self.versions[j]) {
                    trace!(version = i, other = j, "merge");
                    let merged = StackNode::merge(&self.versions[i].head, &self.versions[j].head);
                    self.versions[i].head = merged;
                    self.versions.remove(j);
                } else {
                    j += 1;
                }
            }
            i += 1;
        }

        if let Some(best) = self.versions.iter().map(|v| v.head.error_cost).min() {
            let limit = best.saturating_add(MAX_COST_DIFFERENCE);
            self.versions.retain(|v| v.head.error_cost <= limit);
        }

        let active = self.active_count();
        if active > self.config.max_versions {
            let mut order: Vec<usize> = (0..self.versions.len())
                .filter(|&i| self.versions[i].status == Status::Active)
                .collect();
            order.sort_by_key(|&i| (self.versions[i].head.error_cost, i));
            for &i in &order[self.config.max_versions..] {
                self.versions[i].status = Status::Halted;
            }
            debug!(active, max = self.config.max_versions, "collapse");
            self.versions.retain(|v| v.status != Status::Halted);
        }
    }
}

fn mergeable(a: &Version, b: &Version) -> bool {
    let same_lookahead = match (&a.lookahead, &b.lookahead) {
        (None, None) => true,
        (Some(x), Some(y)) => x.tree.ptr_eq(&y.tree),
        _ => false,
    };
    a.status == Status::Active
        && b.status == Status::Active
        && a.head.state == b.head.state
        && a.head.position == b.head.position
        && a.head.same_external_state(&b.head)
        && a.queued.is_none()
        && b.queued.is_none()
        && same_lookahead
}

fn can_reuse_first_leaf(language: &Language, lexer: &Lexer<'_>, state: StateId, tree: &Subtree) -> bool {
    let leaf = tree.first_leaf();
    if leaf.is_missing() || leaf.is_error() || leaf.size().is_zero() {
        return false;
    }
    let table = language.table();
    table.lex_mode(leaf.parse_state()) == table.lex_mode(state)
        && lexer.resolve_keyword(state, leaf.lexed_symbol()) == leaf.symbol()
        && table.has_actions(state, leaf.symbol())
}
