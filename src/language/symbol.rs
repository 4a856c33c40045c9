//! Symbol, state, field and production identifiers plus symbol metadata.

use std::fmt;

use smol_str::SmolStr;

/// A grammar symbol (terminal or non-terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Symbol(pub u16);

impl Symbol {
    /// End of input
    pub const END: Symbol = Symbol(0);
    /// Error nodes and unmatched characters
    pub const ERROR: Symbol = Symbol(u16::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A parse table state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct StateId(pub u16);

impl StateId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named field of a production
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(pub u16);

/// A production (grammar rule alternative)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductionId(pub u16);

impl ProductionId {
    /// Nodes not built from a production: errors and synthesized roots.
    pub const NONE: ProductionId = ProductionId(u16::MAX);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Matched by the token rules
    Terminal,
    /// Matched by the external scanner
    External,
    /// Built by reductions
    NonTerminal,
}

impl SymbolKind {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NonTerminal)
    }
}

/// Static facts about a symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMetadata {
    pub name: SmolStr,
    pub kind: SymbolKind,
    /// Appears as a node. Hidden single-child non-terminals are elided.
    pub visible: bool,
    /// Named (as opposed to anonymous punctuation like `"+"`)
    pub named: bool,
    /// May appear anywhere, e.g. comments
    pub extra: bool,
    /// Absorbed into the padding of the next token, e.g. whitespace
    pub skip: bool,
    /// Demoted to the word token where it is not valid
    pub keyword: bool,
}

impl SymbolMetadata {
    pub(crate) fn new(name: impl Into<SmolStr>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            visible: true,
            named: true,
            extra: false,
            skip: false,
            keyword: false,
        }
    }
}
