//! Token rules: the regular part of the lexer.

use std::fmt;
use std::marker::PhantomData;

use logos::Logos;

use crate::language::Symbol;

/// A token recognized at the start of the input slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexedToken {
    pub symbol: Symbol,
    /// Bytes consumed; must be non-zero.
    pub len: usize,
    /// Bytes past `len` examined to decide the token (at least 1 counts the
    /// character that ended it).
    pub lookahead: u32,
}

/// Per-lex-state tokenization of a slice starting exactly at the cursor.
///
/// Implementations must be pure: the same `(input, lex_state)` always yields
/// the same token. They are shared by concurrent parses.
pub trait TokenRules: Send + Sync {
    fn next_token(&self, input: &str, lex_state: u16) -> Option<LexedToken>;
}

/// [`TokenRules`] backed by a `#[derive(Logos)]` enum.
///
/// The lex state is ignored: logos recognizes the same token set everywhere,
/// and keyword context is handled by keyword demotion.
pub struct LogosRules<T> {
    map: fn(T) -> Symbol,
    lookahead: u32,
    _token: PhantomData<fn() -> T>,
}

impl<T> LogosRules<T> {
    pub const fn new(map: fn(T) -> Symbol) -> Self {
        Self {
            map,
            lookahead: 1,
            _token: PhantomData,
        }
    }

    /// Override the lookahead recorded on tokens, for regexes that peek
    /// further than one character.
    pub const fn with_lookahead(mut self, lookahead: u32) -> Self {
        self.lookahead = lookahead;
        self
    }
}

impl<T> fmt::Debug for LogosRules<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogosRules")
            .field("token", &std::any::type_name::<T>())
            .field("lookahead", &self.lookahead)
            .finish()
    }
}

impl<T> TokenRules for LogosRules<T>
where
    T: for<'s> Logos<'s, Source = str> + 'static,
    for<'s> <T as Logos<'s>>::Extras: Default,
{
    fn next_token(&self, input: &str, _lex_state: u16) -> Option<LexedToken> {
        let mut lexer = T::lexer(input);
        let token = lexer.next()?.ok()?;
        let span = lexer.span();
        // Logos `#[logos(skip ...)]` rules would move the span; tokens must
        // start at the cursor.
        if span.start != 0 || span.end == 0 {
            return None;
        }
        Some(LexedToken {
            symbol: (self.map)(token),
            len: span.end,
            lookahead: self.lookahead,
        })
    }
}
