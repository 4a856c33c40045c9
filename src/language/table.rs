//! The compiled parse automaton.
//!
//! Tables are dense: one action-list index and one goto slot per
//! (state, symbol) pair. Conflicts are kept as multiple actions in a list;
//! the engine forks on them.

use super::symbol::{FieldId, ProductionId, StateId, Symbol};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseAction {
    /// Push the lookahead and move to `state`. Extras keep the current state.
    Shift { state: StateId, extra: bool },
    Reduce { production: ProductionId },
    Accept,
}

/// Which token rules and external tokens apply in a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LexMode {
    pub lex_state: u16,
    /// Index into the language's external token sets; 0 means none.
    pub external_lex_state: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub child_count: u16,
    pub dynamic_precedence: i16,
    /// `(field, structural child index)`; extras are not counted.
    pub fields: Vec<(FieldId, u16)>,
}

impl Production {
    pub fn field_for_child(&self, structural_index: usize) -> Option<FieldId> {
        self.fields
            .iter()
            .find(|(_, index)| *index as usize == structural_index)
            .map(|(field, _)| *field)
    }

    pub fn child_for_field(&self, field: FieldId) -> Option<usize> {
        self.fields
            .iter()
            .find(|(id, _)| *id == field)
            .map(|(_, index)| *index as usize)
    }
}

#[derive(Debug, Clone)]
pub struct ParseTable {
    pub(crate) symbol_count: usize,
    pub(crate) state_count: usize,
    /// `state * symbol_count + symbol` -> index into `action_lists` (0 = none)
    pub(crate) entries: Vec<u32>,
    pub(crate) action_lists: Vec<Box<[ParseAction]>>,
    pub(crate) gotos: Vec<Option<StateId>>,
    pub(crate) error_shifts: Vec<Option<StateId>>,
    pub(crate) lex_modes: Vec<LexMode>,
    pub(crate) start_state: StateId,
}

impl ParseTable {
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    pub fn start_state(&self) -> StateId {
        self.start_state
    }

    fn slot(&self, state: StateId, symbol: Symbol) -> Option<usize> {
        (state.index() < self.state_count && symbol.index() < self.symbol_count)
            .then(|| state.index() * self.symbol_count + symbol.index())
    }

    /// Actions for `symbol` in `state`; empty when the pair is a syntax error.
    pub fn actions(&self, state: StateId, symbol: Symbol) -> &[ParseAction] {
        match self.slot(state, symbol).map(|slot| self.entries[slot] as usize) {
            Some(index) if index != 0 => &self.action_lists[index][..],
            _ => &[],
        }
    }

    pub fn has_actions(&self, state: StateId, symbol: Symbol) -> bool {
        !self.actions(state, symbol).is_empty()
    }

    pub fn goto(&self, state: StateId, symbol: Symbol) -> Option<StateId> {
        self.slot(state, symbol).and_then(|slot| self.gotos[slot])
    }

    /// Target of the error-transition out of `state`, if the grammar has one.
    pub fn error_shift(&self, state: StateId) -> Option<StateId> {
        self.error_shifts.get(state.index()).copied().flatten()
    }

    pub fn lex_mode(&self, state: StateId) -> LexMode {
        self.lex_modes.get(state.index()).copied().unwrap_or_default()
    }
}
