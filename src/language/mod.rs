//! Languages: symbol metadata, productions and the compiled parse table.
//!
//! A [`Language`] is built once (see [`LanguageBuilder`]) and shared
//! read-only by every parse and every tree that uses it. Cloning is an `Arc`
//! bump.
//!
//! ## Layout
//!
//! ```text
//! Language ─┬─ symbols      SymbolMetadata per Symbol id (END = 0)
//!           ├─ productions  lhs, arity, dynamic precedence, fields
//!           ├─ table        (state, symbol) → actions / goto, lex modes
//!           ├─ token_rules  regular tokens (logos)
//!           └─ scanner      optional ExternalScanner
//! ```

mod builder;
mod registry;
mod symbol;
mod table;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::lexer::{ExternalScanner, TokenRules};

pub use builder::LanguageBuilder;
pub use registry::LanguageRegistry;
pub use symbol::{FieldId, ProductionId, StateId, Symbol, SymbolKind, SymbolMetadata};
pub use table::{LexMode, ParseAction, ParseTable, Production};

/// A compiled grammar
#[derive(Clone)]
pub struct Language(Arc<LanguageData>);

pub(crate) struct LanguageData {
    pub(crate) name: SmolStr,
    pub(crate) symbols: Vec<SymbolMetadata>,
    pub(crate) error_metadata: SymbolMetadata,
    pub(crate) fields: IndexMap<SmolStr, FieldId>,
    pub(crate) productions: Vec<Production>,
    pub(crate) table: ParseTable,
    pub(crate) root_symbol: Symbol,
    pub(crate) word_token: Option<Symbol>,
    pub(crate) token_rules: Arc<dyn TokenRules>,
    pub(crate) external_scanner: Option<Arc<dyn ExternalScanner>>,
    /// Valid external symbols per `LexMode::external_lex_state`; entry 0 is empty.
    pub(crate) external_lex_states: Vec<Box<[Symbol]>>,
}

impl Language {
    pub fn builder(name: impl Into<SmolStr>) -> LanguageBuilder {
        LanguageBuilder::new(name)
    }

    pub(crate) fn from_data(data: LanguageData) -> Self {
        Self(Arc::new(data))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Same underlying grammar instance.
    pub fn ptr_eq(&self, other: &Language) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn symbol_count(&self) -> usize {
        self.0.symbols.len()
    }

    pub fn metadata(&self, symbol: Symbol) -> &SymbolMetadata {
        self.0
            .symbols
            .get(symbol.index())
            .unwrap_or(&self.0.error_metadata)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        &self.metadata(symbol).name
    }

    /// Look a symbol up by name and namedness (`"+"` is anonymous).
    pub fn symbol_for_name(&self, name: &str, named: bool) -> Option<Symbol> {
        if name == self.0.error_metadata.name && named {
            return Some(Symbol::ERROR);
        }
        self.0
            .symbols
            .iter()
            .position(|meta| meta.name == name && meta.named == named)
            .map(|index| Symbol(index as u16))
    }

    pub fn symbols(&self) -> impl Iterator<Item = (Symbol, &SymbolMetadata)> + '_ {
        self.0
            .symbols
            .iter()
            .enumerate()
            .map(|(index, meta)| (Symbol(index as u16), meta))
    }

    pub fn field_count(&self) -> usize {
        self.0.fields.len()
    }

    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        self.0.fields.get(name).copied()
    }

    pub fn field_name(&self, field: FieldId) -> Option<&str> {
        self.0
            .fields
            .get_index(field.0 as usize)
            .map(|(name, _)| name.as_str())
    }

    pub fn production(&self, production: ProductionId) -> Option<&Production> {
        self.0.productions.get(production.0 as usize)
    }

    pub fn table(&self) -> &ParseTable {
        &self.0.table
    }

    /// The start non-terminal; roots that cannot be spliced are wrapped in it.
    pub fn root_symbol(&self) -> Symbol {
        self.0.root_symbol
    }

    pub fn word_token(&self) -> Option<Symbol> {
        self.0.word_token
    }

    pub(crate) fn token_rules(&self) -> &dyn TokenRules {
        self.0.token_rules.as_ref()
    }

    pub(crate) fn external_scanner(&self) -> Option<&dyn ExternalScanner> {
        self.0.external_scanner.as_deref()
    }

    pub(crate) fn external_symbols(&self, mode: LexMode) -> &[Symbol] {
        match self.0.external_lex_states.get(mode.external_lex_state as usize) {
            Some(symbols) => &symbols[..],
            None => &[],
        }
    }
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.0.name)
            .field("symbols", &self.0.symbols.len())
            .field("states", &self.0.table.state_count())
            .finish()
    }
}
