//! State-aware lexer.
//!
//! The lexer is restartable at any byte offset: each call looks only at the
//! source from that offset on, the lex mode of the current parse state, and
//! (for external tokens) the scanner state left by the previous external
//! token.
//!
//! ## Per-call flow
//!
//! ```text
//! offset ─→ external scanner (if the state accepts external tokens)
//!        ─→ token rules (logos)
//!        ─→ skip tokens become padding, loop
//!        ─→ keyword demotion to the word token
//!        ─→ no match: one-character ERROR token
//! ```

mod external;
mod rules;

use std::sync::Arc;

use text_size::{TextRange, TextSize};

use crate::base::{Length, Point};
use crate::language::{Language, StateId, Symbol};

pub use external::{ExternalScanner, ScanInput, ScannedToken};
pub use rules::{LexedToken, LogosRules, TokenRules};

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: Symbol,
    /// Token text, excluding leading padding
    pub range: TextRange,
    pub start_point: Point,
    pub end_point: Point,
    /// True for the synthetic token emitted when nothing matches
    pub is_error: bool,
}

/// Lexer output in relative form, as the parser consumes it.
#[derive(Debug, Clone)]
pub(crate) struct RawToken {
    pub symbol: Symbol,
    /// Symbol before keyword demotion
    pub lexed_symbol: Symbol,
    pub padding: Length,
    pub size: Length,
    pub lookahead_bytes: u32,
    pub external_state: Option<Arc<[u8]>>,
    pub is_error: bool,
}

impl RawToken {
    fn end(position: Length, cursor: Length) -> Self {
        RawToken {
            symbol: Symbol::END,
            lexed_symbol: Symbol::END,
            padding: cursor - position,
            size: Length::zero(),
            lookahead_bytes: 1,
            external_state: None,
            is_error: false,
        }
    }
}

pub struct Lexer<'a> {
    language: &'a Language,
    source: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(language: &'a Language, source: &'a str) -> Self {
        Self { language, source }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    /// The token starting at or after `offset` in parse state `state`, or
    /// `None` at end of input.
    pub fn next_token(&self, offset: TextSize, state: StateId) -> Option<Token> {
        let prefix = self.source.get(..usize::from(offset))?;
        let position = Length::of_text(prefix);
        let raw = self.lex(position, state, None);
        if raw.symbol == Symbol::END {
            return None;
        }
        let start = position + raw.padding;
        let end = start + raw.size;
        Some(Token {
            symbol: raw.symbol,
            range: TextRange::new(start.bytes, end.bytes),
            start_point: start.extent,
            end_point: end.extent,
            is_error: raw.is_error,
        })
    }

    /// Tokenize the whole source in a single parse state.
    pub fn tokens(&self, state: StateId) -> Tokens<'_, 'a> {
        Tokens {
            lexer: self,
            state,
            offset: TextSize::new(0),
        }
    }

    /// Demote `symbol` to the word token when it is a keyword the table does
    /// not accept in `state` but the word token is accepted.
    pub fn resolve_keyword(&self, state: StateId, symbol: Symbol) -> Symbol {
        let Some(word) = self.language.word_token() else {
            return symbol;
        };
        if !self.language.metadata(symbol).keyword {
            return symbol;
        }
        let table = self.language.table();
        if table.has_actions(state, symbol) || !table.has_actions(state, word) {
            symbol
        } else {
            tracing::trace!(
                keyword = self.language.symbol_name(symbol),
                state = state.0,
                "demoting keyword to word token"
            );
            word
        }
    }

    pub(crate) fn lex(&self, position: Length, state: StateId, external_state: Option<&[u8]>) -> RawToken {
        let table = self.language.table();
        let mode = table.lex_mode(state);
        let externals = self.language.external_symbols(mode);
        let mut cursor = position;

        loop {
            let offset = cursor.byte_usize();
            let rest = match self.source.get(offset..) {
                Some(rest) if !rest.is_empty() => rest,
                Some(_) => return RawToken::end(position, cursor),
                None if offset >= self.source.len() => return RawToken::end(position, cursor),
                // Offset inside a character: treat the tail bytes as an error.
                None => {
                    let len = (offset + 1..=self.source.len())
                        .find(|&end| self.source.is_char_boundary(end))
                        .map_or(1, |end| end - offset);
                    let size = Length::new(len as u32, Point::new(0, len as u32));
                    return self.error_token(position, cursor, size);
                }
            };

            if let Some(token) = self.scan_external(rest, cursor, externals, external_state) {
                let (symbol, text, scanner_state) = token;
                let size = Length::of_text(text);
                if self.language.metadata(symbol).skip {
                    cursor = cursor + size;
                    continue;
                }
                return RawToken {
                    symbol,
                    lexed_symbol: symbol,
                    padding: cursor - position,
                    size,
                    lookahead_bytes: 1,
                    external_state: Some(scanner_state),
                    is_error: false,
                };
            }

            match self.language.token_rules().next_token(rest, mode.lex_state) {
                Some(token) if token.len > 0 && rest.is_char_boundary(token.len) => {
                    let size = Length::of_text(&rest[..token.len]);
                    if self.language.metadata(token.symbol).skip {
                        cursor = cursor + size;
                        continue;
                    }
                    return RawToken {
                        symbol: self.resolve_keyword(state, token.symbol),
                        lexed_symbol: token.symbol,
                        padding: cursor - position,
                        size,
                        lookahead_bytes: token.lookahead.max(1),
                        external_state: None,
                        is_error: false,
                    };
                }
                _ => {
                    let len = rest.chars().next().map_or(1, char::len_utf8);
                    return self.error_token(position, cursor, Length::of_text(&rest[..len]));
                }
            }
        }
    }

    fn scan_external<'s>(
        &self,
        rest: &'s str,
        cursor: Length,
        externals: &[Symbol],
        external_state: Option<&[u8]>,
    ) -> Option<(Symbol, &'s str, Arc<[u8]>)> {
        if externals.is_empty() {
            return None;
        }
        let scanner = self.language.external_scanner()?;
        let mut state = external_state.map(<[u8]>::to_vec).unwrap_or_default();
        let input = ScanInput::new(rest, cursor.byte_usize(), cursor.extent, externals);
        let token = scanner.scan(&input, &mut state)?;
        if token.len == 0 || !rest.is_char_boundary(token.len) || !externals.contains(&token.symbol) {
            tracing::trace!(symbol = token.symbol.0, len = token.len, "ignoring invalid external token");
            return None;
        }
        Some((token.symbol, &rest[..token.len], Arc::from(state)))
    }

    fn error_token(&self, position: Length, cursor: Length, size: Length) -> RawToken {
        tracing::trace!(offset = cursor.byte_usize(), "no token matches");
        RawToken {
            symbol: Symbol::ERROR,
            lexed_symbol: Symbol::ERROR,
            padding: cursor - position,
            size,
            lookahead_bytes: 1,
            external_state: None,
            is_error: true,
        }
    }
}

/// Iterator over tokens lexed in a fixed parse state
pub struct Tokens<'l, 'a> {
    lexer: &'l Lexer<'a>,
    state: StateId,
    offset: TextSize,
}

impl Iterator for Tokens<'_, '_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.lexer.next_token(self.offset, self.state)?;
        self.offset = token.range.end();
        Some(token)
    }
}
