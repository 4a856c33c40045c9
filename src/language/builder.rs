//! Load-time assembly of a [`Language`] from precompiled tables.
//!
//! Table generation is not this crate's job: a generator (or a test) feeds
//! the symbols, productions and per-state actions it computed into a
//! [`LanguageBuilder`], and [`LanguageBuilder::build`] validates and packs
//! them into the dense runtime form.

use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::symbol::{FieldId, ProductionId, StateId, Symbol, SymbolKind, SymbolMetadata};
use super::table::{LexMode, ParseAction, ParseTable, Production};
use super::{Language, LanguageData};
use crate::error::{Error, Result};
use crate::lexer::{ExternalScanner, TokenRules};

#[derive(Debug, Default, Clone)]
struct StateEntries {
    actions: Vec<(Symbol, ParseAction)>,
    gotos: Vec<(Symbol, StateId)>,
    error_shift: Option<StateId>,
    lex_state: u16,
}

pub struct LanguageBuilder {
    name: SmolStr,
    symbols: Vec<SymbolMetadata>,
    fields: IndexMap<SmolStr, FieldId>,
    productions: Vec<Production>,
    states: Vec<StateEntries>,
    start_state: StateId,
    root_symbol: Option<Symbol>,
    word_token: Option<Symbol>,
    token_rules: Option<Arc<dyn TokenRules>>,
    external_scanner: Option<Arc<dyn ExternalScanner>>,
}

impl LanguageBuilder {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        let mut end = SymbolMetadata::new("end", SymbolKind::Terminal);
        end.visible = false;
        end.named = false;
        Self {
            name: name.into(),
            symbols: vec![end],
            fields: IndexMap::new(),
            productions: Vec::new(),
            states: Vec::new(),
            start_state: StateId(0),
            root_symbol: None,
            word_token: None,
            token_rules: None,
            external_scanner: None,
        }
    }

    // ========================================================================
    // Symbols
    // ========================================================================

    fn push_symbol(&mut self, meta: SymbolMetadata) -> Symbol {
        let symbol = Symbol(self.symbols.len() as u16);
        self.symbols.push(meta);
        symbol
    }

    /// A named terminal such as `number`.
    pub fn token(&mut self, name: &str) -> Symbol {
        self.push_symbol(SymbolMetadata::new(name, SymbolKind::Terminal))
    }

    /// An anonymous terminal such as `"+"`.
    pub fn anonymous_token(&mut self, text: &str) -> Symbol {
        let mut meta = SymbolMetadata::new(text, SymbolKind::Terminal);
        meta.named = false;
        self.push_symbol(meta)
    }

    /// An anonymous terminal that is demoted to the word token where it is
    /// not valid.
    pub fn keyword(&mut self, text: &str) -> Symbol {
        let mut meta = SymbolMetadata::new(text, SymbolKind::Terminal);
        meta.named = false;
        meta.keyword = true;
        self.push_symbol(meta)
    }

    /// Whitespace-like terminal absorbed into padding.
    pub fn skip_token(&mut self, name: &str) -> Symbol {
        let mut meta = SymbolMetadata::new(name, SymbolKind::Terminal);
        meta.visible = false;
        meta.named = false;
        meta.skip = true;
        self.push_symbol(meta)
    }

    /// Comment-like terminal that may appear between any two tokens. Every
    /// state without an explicit entry gets an extra shift for it.
    pub fn extra_token(&mut self, name: &str) -> Symbol {
        let mut meta = SymbolMetadata::new(name, SymbolKind::Terminal);
        meta.extra = true;
        self.push_symbol(meta)
    }

    pub fn external_token(&mut self, name: &str, named: bool) -> Symbol {
        let mut meta = SymbolMetadata::new(name, SymbolKind::External);
        meta.named = named;
        self.push_symbol(meta)
    }

    pub fn nonterminal(&mut self, name: &str) -> Symbol {
        self.push_symbol(SymbolMetadata::new(name, SymbolKind::NonTerminal))
    }

    /// A non-terminal that does not appear in trees when it has a single child.
    pub fn hidden_nonterminal(&mut self, name: &str) -> Symbol {
        let mut meta = SymbolMetadata::new(name, SymbolKind::NonTerminal);
        meta.visible = false;
        meta.named = false;
        self.push_symbol(meta)
    }

    pub fn field(&mut self, name: &str) -> FieldId {
        let next = FieldId(self.fields.len() as u16);
        *self.fields.entry(SmolStr::new(name)).or_insert(next)
    }

    // ========================================================================
    // Productions
    // ========================================================================

    pub fn production(&mut self, lhs: Symbol, child_count: u16) -> ProductionId {
        self.production_with_precedence(lhs, child_count, 0)
    }

    pub fn production_with_precedence(
        &mut self,
        lhs: Symbol,
        child_count: u16,
        dynamic_precedence: i16,
    ) -> ProductionId {
        let id = ProductionId(self.productions.len() as u16);
        self.productions.push(Production {
            lhs,
            child_count,
            dynamic_precedence,
            fields: Vec::new(),
        });
        id
    }

    /// Name the `child_index`-th non-extra child of `production`.
    pub fn production_field(&mut self, production: ProductionId, field: FieldId, child_index: u16) -> &mut Self {
        if let Some(production) = self.productions.get_mut(production.0 as usize) {
            production.fields.push((field, child_index));
        }
        self
    }

    // ========================================================================
    // States
    // ========================================================================

    pub fn state(&mut self) -> StateId {
        let id = StateId(self.states.len() as u16);
        self.states.push(StateEntries::default());
        id
    }

    fn entries(&mut self, state: StateId) -> &mut StateEntries {
        if self.states.len() <= state.index() {
            self.states.resize_with(state.index() + 1, StateEntries::default);
        }
        &mut self.states[state.index()]
    }

    pub fn shift(&mut self, state: StateId, symbol: Symbol, next: StateId) -> &mut Self {
        self.entries(state)
            .actions
            .push((symbol, ParseAction::Shift { state: next, extra: false }));
        self
    }

    pub fn shift_extra(&mut self, state: StateId, symbol: Symbol) -> &mut Self {
        self.entries(state)
            .actions
            .push((symbol, ParseAction::Shift { state, extra: true }));
        self
    }

    pub fn reduce(&mut self, state: StateId, symbol: Symbol, production: ProductionId) -> &mut Self {
        self.entries(state)
            .actions
            .push((symbol, ParseAction::Reduce { production }));
        self
    }

    /// Reduce `production` on each of `symbols`.
    pub fn reduce_on(&mut self, state: StateId, symbols: &[Symbol], production: ProductionId) -> &mut Self {
        for &symbol in symbols {
            self.reduce(state, symbol, production);
        }
        self
    }

    pub fn accept(&mut self, state: StateId) -> &mut Self {
        self.entries(state).actions.push((Symbol::END, ParseAction::Accept));
        self
    }

    pub fn goto(&mut self, state: StateId, symbol: Symbol, next: StateId) -> &mut Self {
        self.entries(state).gotos.push((symbol, next));
        self
    }

    /// Error-transition used by recovery to resume after an ERROR node.
    pub fn error_shift(&mut self, state: StateId, next: StateId) -> &mut Self {
        self.entries(state).error_shift = Some(next);
        self
    }

    pub fn lex_state(&mut self, state: StateId, lex_state: u16) -> &mut Self {
        self.entries(state).lex_state = lex_state;
        self
    }

    pub fn start_state(&mut self, state: StateId) -> &mut Self {
        self.start_state = state;
        self
    }

    /// Defaults to the first non-terminal.
    pub fn root_symbol(&mut self, symbol: Symbol) -> &mut Self {
        self.root_symbol = Some(symbol);
        self
    }

    pub fn word_token(&mut self, symbol: Symbol) -> &mut Self {
        self.word_token = Some(symbol);
        self
    }

    pub fn token_rules(&mut self, rules: impl TokenRules + 'static) -> &mut Self {
        self.token_rules = Some(Arc::new(rules));
        self
    }

    pub fn external_scanner(&mut self, scanner: impl ExternalScanner + 'static) -> &mut Self {
        self.external_scanner = Some(Arc::new(scanner));
        self
    }

    // ========================================================================
    // Build
    // ========================================================================

    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidLanguage {
            name: self.name.clone(),
            message: message.into(),
        }
    }

    fn validate(&self) -> Result<Symbol> {
        let state_count = self.states.len();
        let symbol_count = self.symbols.len();
        if state_count == 0 {
            return Err(self.invalid("no parse states"));
        }
        if self.start_state.index() >= state_count {
            return Err(self.invalid(format!("start state {} out of range", self.start_state.0)));
        }
        if self.token_rules.is_none() {
            return Err(self.invalid("no token rules"));
        }

        let is_nonterminal = |symbol: Symbol| {
            self.symbols
                .get(symbol.index())
                .is_some_and(|meta| meta.kind == SymbolKind::NonTerminal)
        };

        for (index, production) in self.productions.iter().enumerate() {
            if !is_nonterminal(production.lhs) {
                return Err(self.invalid(format!("production {index} has a terminal left-hand side")));
            }
            if let Some((field, child)) = production
                .fields
                .iter()
                .find(|(field, child)| field.0 as usize >= self.fields.len() || *child >= production.child_count)
            {
                return Err(self.invalid(format!(
                    "production {index} names child {child} with field {}",
                    field.0
                )));
            }
        }

        let mut has_accept = false;
        for (index, state) in self.states.iter().enumerate() {
            for &(symbol, action) in &state.actions {
                if symbol.index() >= symbol_count {
                    return Err(self.invalid(format!("state {index} has an action on unknown symbol {symbol}")));
                }
                match action {
                    ParseAction::Shift { state: next, .. } if next.index() >= state_count => {
                        return Err(self.invalid(format!("state {index} shifts to unknown state {}", next.0)));
                    }
                    ParseAction::Reduce { production } if production.0 as usize >= self.productions.len() => {
                        return Err(self.invalid(format!(
                            "state {index} reduces unknown production {}",
                            production.0
                        )));
                    }
                    ParseAction::Accept => has_accept = true,
                    _ => {}
                }
            }
            for &(symbol, next) in &state.gotos {
                if !is_nonterminal(symbol) || next.index() >= state_count {
                    return Err(self.invalid(format!("state {index} has an invalid goto on {symbol}")));
                }
            }
            if state.error_shift.is_some_and(|next| next.index() >= state_count) {
                return Err(self.invalid(format!("state {index} has an invalid error transition")));
            }
        }
        if !has_accept {
            return Err(self.invalid("no accepting state"));
        }

        match self.root_symbol {
            Some(symbol) if is_nonterminal(symbol) => Ok(symbol),
            Some(symbol) => Err(self.invalid(format!("root symbol {symbol} is not a non-terminal"))),
            None => self
                .symbols
                .iter()
                .position(|meta| meta.kind == SymbolKind::NonTerminal)
                .map(|index| Symbol(index as u16))
                .ok_or_else(|| self.invalid("no non-terminals")),
        }
    }

    pub fn build(self) -> Result<Language> {
        let root_symbol = self.validate()?;
        let Some(token_rules) = self.token_rules else {
            return Err(Error::InvalidLanguage {
                name: self.name,
                message: "no token rules".into(),
            });
        };

        let symbol_count = self.symbols.len();
        let state_count = self.states.len();
        let extras: Vec<Symbol> = self
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, meta)| meta.extra)
            .map(|(index, _)| Symbol(index as u16))
            .collect();
        let externals: Vec<Symbol> = self
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, meta)| meta.kind == SymbolKind::External)
            .map(|(index, _)| Symbol(index as u16))
            .collect();

        let mut action_lists: Vec<Box<[ParseAction]>> = vec![Box::default()];
        let mut list_ids: FxHashMap<Vec<ParseAction>, u32> = FxHashMap::default();
        let mut entries = vec![0u32; state_count * symbol_count];
        let mut gotos = vec![None; state_count * symbol_count];
        let mut error_shifts = Vec::with_capacity(state_count);
        let mut lex_modes = Vec::with_capacity(state_count);
        let mut external_lex_states: Vec<Box<[Symbol]>> = vec![Box::default()];

        for (index, state) in self.states.iter().enumerate() {
            let state_id = StateId(index as u16);
            let mut per_symbol: Vec<Vec<ParseAction>> = vec![Vec::new(); symbol_count];
            for &(symbol, action) in &state.actions {
                per_symbol[symbol.index()].push(action);
            }
            for &extra in &extras {
                if per_symbol[extra.index()].is_empty() {
                    per_symbol[extra.index()].push(ParseAction::Shift {
                        state: state_id,
                        extra: true,
                    });
                }
            }

            let valid_externals: Vec<Symbol> = externals
                .iter()
                .copied()
                .filter(|symbol| !per_symbol[symbol.index()].is_empty())
                .collect();
            let external_lex_state = if valid_externals.is_empty() {
                0
            } else if let Some(existing) = external_lex_states
                .iter()
                .position(|set| set[..] == valid_externals[..])
            {
                existing
            } else {
                external_lex_states.push(valid_externals.into_boxed_slice());
                external_lex_states.len() - 1
            };
            lex_modes.push(LexMode {
                lex_state: state.lex_state,
                external_lex_state: external_lex_state as u16,
            });

            for (symbol, actions) in per_symbol.into_iter().enumerate() {
                if actions.is_empty() {
                    continue;
                }
                let next_id = action_lists.len() as u32;
                let id = *list_ids.entry(actions.clone()).or_insert_with(|| {
                    action_lists.push(actions.into_boxed_slice());
                    next_id
                });
                entries[index * symbol_count + symbol] = id;
            }
            for &(symbol, next) in &state.gotos {
                gotos[index * symbol_count + symbol.index()] = Some(next);
            }
            error_shifts.push(state.error_shift);
        }

        tracing::debug!(
            language = %self.name,
            symbols = symbol_count,
            states = state_count,
            productions = self.productions.len(),
            "built language"
        );

        let mut error_metadata = SymbolMetadata::new("ERROR", SymbolKind::NonTerminal);
        error_metadata.named = true;

        Ok(Language::from_data(LanguageData {
            name: self.name,
            symbols: self.symbols,
            error_metadata,
            fields: self.fields,
            productions: self.productions,
            table: ParseTable {
                symbol_count,
                state_count,
                entries,
                action_lists,
                gotos,
                error_shifts,
                lex_modes,
                start_state: self.start_state,
            },
            root_symbol,
            word_token: self.word_token,
            token_rules,
            external_scanner: self.external_scanner,
            external_lex_states,
        }))
    }
}
