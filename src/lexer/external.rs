//! External scanners for context-sensitive tokens.

use crate::base::Point;
use crate::language::Symbol;

/// Read-only view of the input at the scan position
#[derive(Debug, Clone, Copy)]
pub struct ScanInput<'a> {
    rest: &'a str,
    offset: usize,
    position: Point,
    valid: &'a [Symbol],
}

impl<'a> ScanInput<'a> {
    pub(crate) fn new(rest: &'a str, offset: usize, position: Point, valid: &'a [Symbol]) -> Self {
        Self {
            rest,
            offset,
            position,
            valid,
        }
    }

    /// Input from the scan position to end of source.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Absolute byte offset of the scan position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.rest.is_empty()
    }

    /// External symbols the parser can accept here.
    pub fn valid_symbols(&self) -> &'a [Symbol] {
        self.valid
    }

    pub fn is_valid(&self, symbol: Symbol) -> bool {
        self.valid.contains(&symbol)
    }
}

/// A token produced by an external scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedToken {
    pub symbol: Symbol,
    /// Bytes consumed from the scan position.
    pub len: usize,
}

/// Grammar-supplied lexing logic, consulted before the token rules in states
/// that accept external tokens.
///
/// `state` holds the serialized scanner state left by the previous external
/// token (empty at the start of input). A scanner may rewrite it; the bytes
/// are stored on the produced token so incremental reparses can restore them.
/// Scanners take `&self` and keep all mutable state in `state`, so one
/// scanner can serve concurrent parses.
pub trait ExternalScanner: Send + Sync {
    fn scan(&self, input: &ScanInput<'_>, state: &mut Vec<u8>) -> Option<ScannedToken>;
}
