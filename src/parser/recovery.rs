//! Error recovery.
//!
//! Recovery runs on one version once no version can advance. It tries, in
//! order:
//!
//! 1. inserting a zero-width missing token that lets the lookahead continue;
//! 2. skipping tokens and resuming once the next token fits the stack again,
//!    wrapping the skipped tokens in an `ERROR` extra;
//! 3. after too many skipped tokens, or at the end of input, popping entries
//!    off the stack until some state accepts the next token, and folding the
//!    popped and skipped subtrees into one `ERROR` node.
//!
//! At the end of input with no state left to resume from, the whole parse
//! becomes an `ERROR` node under the root.

use tracing::{debug, trace};

use crate::base::Length;
use crate::error::Result;
use crate::language::{Language, ParseAction, StateId, Symbol, SymbolKind};
use crate::tree::subtree::{Flags, Subtree};

use super::engine::{Engine, Lookahead, Status};
use super::stack::{FirstPath, Head, StackNode};

/// Reductions simulated before giving up on a candidate
const MAX_SIMULATED_REDUCTIONS: usize = 64;
/// Non-extra entries popped while searching for a state to resume from
const MAX_RECOVERY_DEPTH: usize = 16;

/// Where a version resumes after skipping
struct ResumePoint {
    depth: usize,
    state: StateId,
    extra: bool,
}

impl Engine<'_> {
    pub(super) fn recover(&mut self, index: usize) -> Result<()> {
        let head = self.versions[index].head.clone();
        let mut lookahead = match self.versions[index].lookahead.take() {
            Some(lookahead) => lookahead,
            None => self.lex(head.position, head.state, head.external_state.clone()).map(Lookahead::fresh)?,
        };
        // An inserted token that did not help gives way to the real one.
        if lookahead.tree.is_missing() {
            if let Some(queued) = self.versions[index].queued.take() {
                lookahead = queued;
            }
        }
        self.versions[index].queued = None;
        self.versions[index].status = Status::Active;

        let position = u32::from(head.position.bytes);
        if self.config.insert_missing
            && !lookahead.tree.is_error()
            && self.versions[index].missing_at != Some(position)
        {
            if let Some(symbol) = self.find_missing(&head, &lookahead.tree) {
                debug!(symbol = self.language.symbol_name(symbol), offset = position, "recover_with_missing");
                let missing = Subtree::missing_leaf(symbol, head.state, self.language);
                let version = &mut self.versions[index];
                version.missing_at = Some(position);
                version.queued = Some(Lookahead::fresh(lookahead.tree));
                version.lookahead = Some(Lookahead::fresh(missing));
                return Ok(());
            }
        }
        self.skip_and_resume(index, lookahead.tree)
    }

    /// First terminal whose insertion lets `next` be consumed.
    fn find_missing(&self, head: &Head, next: &Subtree) -> Option<Symbol> {
        let path = FirstPath::new(head);
        let states = path.states(0);
        let target = next.first_leaf().symbol();
        self.language
            .symbols()
            .filter(|(symbol, meta)| {
                *symbol != Symbol::END && meta.kind == SymbolKind::Terminal && !meta.extra && !meta.skip
            })
            .map(|(symbol, _)| symbol)
            .find(|&candidate| {
                simulate(self.language, states.to_vec(), candidate)
                    .is_some_and(|after| simulate(self.language, after, target).is_some())
            })
    }

    fn skip_and_resume(&mut self, index: usize, first: Subtree) -> Result<()> {
        let head = self.versions[index].head.clone();
        let path = FirstPath::new(&head);
        let mut skipped: Vec<Subtree> = Vec::new();
        let mut skipped_len = Length::zero();
        let mut external_state = head.external_state.clone();
        let mut token = first;

        loop {
            let symbol = token.first_leaf().symbol();
            let at_end = symbol == Symbol::END;
            if skipped.len() >= self.config.max_skipped_tokens || at_end {
                if let Some(point) = self.find_resume_point(&path, symbol, !skipped.is_empty()) {
                    self.resume(index, &path, point, skipped, token);
                    return Ok(());
                }
                if at_end {
                    let end = head.position + skipped_len + token.padding();
                    self.finish_with_error(index, &path, skipped, end);
                    return Ok(());
                }
            } else if !skipped.is_empty() && !token.is_error() && viable(self.language, path.states(0), symbol) {
                let point = ResumePoint {
                    depth: 0,
                    state: head.state,
                    extra: true,
                };
                self.resume(index, &path, point, skipped, token);
                return Ok(());
            }

            trace!(symbol = self.language.symbol_name(token.symbol()), "skip_token");
            skipped_len = skipped_len + token.total_size();
            if let Some(last) = token.last_external_token() {
                external_state = last.external_state().cloned();
            }
            skipped.push(token);
            token = self.lex(head.position + skipped_len, head.state, external_state.clone())?;
        }
    }

    /// Nearest stack depth from which `symbol` can be consumed, either
    /// through the grammar's error transition or by keeping the `ERROR`
    /// node as an extra.
    fn find_resume_point(&self, path: &FirstPath, symbol: Symbol, has_skipped: bool) -> Option<ResumePoint> {
        let table = self.language.table();
        for depth in 0..path.len() {
            if path.popped_count(depth) > MAX_RECOVERY_DEPTH {
                break;
            }
            if depth == 0 && !has_skipped {
                continue;
            }
            let node = path.node(depth);
            let states = path.states(depth);
            if let Some(error_state) = table.error_shift(node.state) {
                let mut after = states.to_vec();
                after.push(error_state);
                if simulate(self.language, after, symbol).is_some() {
                    return Some(ResumePoint {
                        depth,
                        state: error_state,
                        extra: false,
                    });
                }
            }
            if viable(self.language, states, symbol) {
                return Some(ResumePoint {
                    depth,
                    state: node.state,
                    extra: true,
                });
            }
        }
        None
    }

    fn resume(&mut self, index: usize, path: &FirstPath, point: ResumePoint, skipped: Vec<Subtree>, next: Subtree) {
        let mut children = path.popped(point.depth);
        let skipped_count = skipped.len();
        children.extend(skipped);
        let error = if children.len() == 1 && children[0].is_error() && children[0].child_count() == 0 {
            children.remove(0)
        } else {
            Subtree::error_node(children, self.language)
        };
        let error = error.with_flag(Flags::EXTRA, point.extra);
        debug!(
            version = index,
            depth = point.depth,
            skipped = skipped_count,
            cost = error.error_cost(),
            "recover"
        );

        let base = path.node(point.depth).clone();
        let version = &mut self.versions[index];
        version.head = StackNode::push(&base, error, point.state);
        version.lookahead = Some(Lookahead::fresh(next));
        version.queued = None;
        version.status = Status::Active;
    }

    /// End of input with nothing to resume from: everything on the stack
    /// and everything skipped goes under one `ERROR` node.
    fn finish_with_error(&mut self, index: usize, path: &FirstPath, skipped: Vec<Subtree>, end: Length) {
        let mut children = path.popped(path.len() - 1);
        children.extend(skipped);
        let error = Subtree::error_node(children, self.language);
        debug!(version = index, cost = error.error_cost(), "recover_eof");
        let root = self.build_root(vec![error], end);
        self.offer_root(root);
        self.versions[index].status = Status::Halted;
    }
}

/// Whether `symbol` can be shifted (or accepted) from `states`.
fn viable(language: &Language, states: &[StateId], symbol: Symbol) -> bool {
    simulate(language, states.to_vec(), symbol).is_some()
}

/// Run the reductions `symbol` triggers on a copy of the state stack and
/// return the stack after it is shifted, or `None` if it is rejected.
fn simulate(language: &Language, mut states: Vec<StateId>, symbol: Symbol) -> Option<Vec<StateId>> {
    let table = language.table();
    for _ in 0..MAX_SIMULATED_REDUCTIONS {
        let state = *states.last()?;
        let mut reduction = None;
        for action in table.actions(state, symbol) {
            match *action {
                ParseAction::Shift { state: next, extra } => {
                    if !extra {
                        states.push(next);
                    }
                    return Some(states);
                }
                ParseAction::Accept => return Some(states),
                ParseAction::Reduce { production } => {
                    reduction.get_or_insert(production);
                }
            }
        }
        let production = language.production(reduction?)?;
        let count = usize::from(production.child_count);
        if count >= states.len() {
            return None;
        }
        states.truncate(states.len() - count);
        let next = table.goto(*states.last()?, production.lhs)?;
        states.push(next);
    }
    None
}
