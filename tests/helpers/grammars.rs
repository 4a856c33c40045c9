//! Hand-compiled grammars used across the test suites.
//!
//! Tables are written out state by state the way a generator would emit
//! them. Symbol ids are fixed by creation order and exported as constants.

#![allow(dead_code)]

use canopy::language::{Language, LanguageBuilder, StateId, Symbol};
use canopy::lexer::{ExternalScanner, LogosRules, ScanInput, ScannedToken};
use logos::Logos;
use once_cell::sync::Lazy;

// =============================================================================
// Arithmetic
// =============================================================================
//
//   program        → _expression | ε
//   _expression    → sum | product | parenthesized | number
//   sum            → _expression "+" _expression        (left, 1)
//   product        → _expression "*" _expression        (left, 2)
//   parenthesized  → "(" _expression ")"
//
// Whitespace is skipped, `# ...` comments are extras.

pub mod arith {
    use canopy::language::Symbol;

    pub const NUMBER: Symbol = Symbol(1);
    pub const PLUS: Symbol = Symbol(2);
    pub const STAR: Symbol = Symbol(3);
    pub const LPAREN: Symbol = Symbol(4);
    pub const RPAREN: Symbol = Symbol(5);
    pub const WHITESPACE: Symbol = Symbol(6);
    pub const COMMENT: Symbol = Symbol(7);
    pub const PROGRAM: Symbol = Symbol(8);
    pub const EXPRESSION: Symbol = Symbol(9);
    pub const SUM: Symbol = Symbol(10);
    pub const PRODUCT: Symbol = Symbol(11);
    pub const PARENTHESIZED: Symbol = Symbol(12);
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithToken {
    #[regex(r"[0-9]+")]
    Number,
    #[token("+")]
    Plus,
    #[token("*")]
    Star,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
    #[regex(r"#[^\n]*")]
    Comment,
}

fn arith_symbol(token: ArithToken) -> Symbol {
    match token {
        ArithToken::Number => arith::NUMBER,
        ArithToken::Plus => arith::PLUS,
        ArithToken::Star => arith::STAR,
        ArithToken::LParen => arith::LPAREN,
        ArithToken::RParen => arith::RPAREN,
        ArithToken::Whitespace => arith::WHITESPACE,
        ArithToken::Comment => arith::COMMENT,
    }
}

/// Build the arithmetic language. With `ambiguous`, the `+` shift/reduce
/// conflict after `_expression "+" _expression` is left in the table and
/// resolved at parse time.
pub fn build_arithmetic(name: &str, ambiguous: bool) -> Language {
    use arith::*;

    let mut b = LanguageBuilder::new(name);
    assert_eq!(b.token("number"), NUMBER);
    assert_eq!(b.anonymous_token("+"), PLUS);
    assert_eq!(b.anonymous_token("*"), STAR);
    assert_eq!(b.anonymous_token("("), LPAREN);
    assert_eq!(b.anonymous_token(")"), RPAREN);
    assert_eq!(b.skip_token("whitespace"), WHITESPACE);
    assert_eq!(b.extra_token("comment"), COMMENT);
    assert_eq!(b.nonterminal("program"), PROGRAM);
    assert_eq!(b.hidden_nonterminal("_expression"), EXPRESSION);
    assert_eq!(b.nonterminal("sum"), SUM);
    assert_eq!(b.nonterminal("product"), PRODUCT);
    assert_eq!(b.nonterminal("parenthesized"), PARENTHESIZED);

    let left = b.field("left");
    let operator = b.field("operator");
    let right = b.field("right");

    let p_program = b.production(PROGRAM, 1);
    let p_sum_expr = b.production(EXPRESSION, 1);
    let p_product_expr = b.production(EXPRESSION, 1);
    let p_paren_expr = b.production(EXPRESSION, 1);
    let p_number_expr = b.production(EXPRESSION, 1);
    let p_sum = b.production(SUM, 3);
    let p_product = b.production(PRODUCT, 3);
    let p_paren = b.production(PARENTHESIZED, 3);
    let p_empty = b.production(PROGRAM, 0);
    for production in [p_sum, p_product] {
        b.production_field(production, left, 0)
            .production_field(production, operator, 1)
            .production_field(production, right, 2);
    }

    let s: Vec<StateId> = (0..14).map(|_| b.state()).collect();
    let follow = [Symbol::END, PLUS, STAR, RPAREN];

    // Operand position: states expecting an expression.
    for &state in &[s[0], s[7], s[8], s[9]] {
        b.shift(state, NUMBER, s[6])
            .shift(state, LPAREN, s[7])
            .goto(state, SUM, s[3])
            .goto(state, PRODUCT, s[4])
            .goto(state, PARENTHESIZED, s[5]);
    }
    b.reduce(s[0], Symbol::END, p_empty)
        .goto(s[0], PROGRAM, s[1])
        .goto(s[0], EXPRESSION, s[2])
        .goto(s[7], EXPRESSION, s[10])
        .goto(s[8], EXPRESSION, s[11])
        .goto(s[9], EXPRESSION, s[12]);

    b.accept(s[1]);

    b.reduce(s[2], Symbol::END, p_program)
        .shift(s[2], PLUS, s[8])
        .shift(s[2], STAR, s[9]);

    b.reduce_on(s[3], &follow, p_sum_expr)
        .reduce_on(s[4], &follow, p_product_expr)
        .reduce_on(s[5], &follow, p_paren_expr)
        .reduce_on(s[6], &follow, p_number_expr);

    b.shift(s[10], RPAREN, s[13])
        .shift(s[10], PLUS, s[8])
        .shift(s[10], STAR, s[9]);

    b.reduce_on(s[11], &[Symbol::END, PLUS, RPAREN], p_sum)
        .shift(s[11], STAR, s[9]);
    if ambiguous {
        b.shift(s[11], PLUS, s[8]);
    }

    b.reduce_on(s[12], &follow, p_product);
    b.reduce_on(s[13], &follow, p_paren);

    b.root_symbol(PROGRAM)
        .token_rules(LogosRules::new(arith_symbol));
    b.build().expect("arithmetic grammar is valid")
}

pub static ARITHMETIC: Lazy<Language> = Lazy::new(|| build_arithmetic("arithmetic", false));

pub static AMBIGUOUS_ARITHMETIC: Lazy<Language> =
    Lazy::new(|| build_arithmetic("ambiguous_arithmetic", true));

// =============================================================================
// Bindings: keywords and an external scanner
// =============================================================================
//
//   program  → program _entry | ε
//   _entry   → identifier | binding | raw
//   binding  → "let" identifier
//
// `identifier` is the word token, so `let` is demoted where only an
// identifier fits. `raw` is a brace-balanced block recognized by an
// external scanner.

pub mod bindings {
    use canopy::language::Symbol;

    pub const IDENTIFIER: Symbol = Symbol(1);
    pub const LET: Symbol = Symbol(2);
    pub const RAW: Symbol = Symbol(3);
    pub const WHITESPACE: Symbol = Symbol(4);
    pub const PROGRAM: Symbol = Symbol(5);
    pub const ENTRY: Symbol = Symbol(6);
    pub const BINDING: Symbol = Symbol(7);
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingToken {
    #[token("let")]
    Let,
    #[regex(r"[a-z_][a-z0-9_]*")]
    Identifier,
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

fn binding_symbol(token: BindingToken) -> Symbol {
    match token {
        BindingToken::Let => bindings::LET,
        BindingToken::Identifier => bindings::IDENTIFIER,
        BindingToken::Whitespace => bindings::WHITESPACE,
    }
}

/// Scans `{ ... }` with nested braces. The scanner state counts how many
/// raw blocks precede the token.
#[derive(Debug, Default)]
pub struct RawBlockScanner;

impl ExternalScanner for RawBlockScanner {
    fn scan(&self, input: &ScanInput<'_>, state: &mut Vec<u8>) -> Option<ScannedToken> {
        if !input.is_valid(bindings::RAW) || input.peek() != Some('{') {
            return None;
        }
        let mut depth = 0usize;
        for (index, ch) in input.remaining().char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let count = state.first().copied().unwrap_or(0);
                        *state = vec![count.saturating_add(1)];
                        return Some(ScannedToken {
                            symbol: bindings::RAW,
                            len: index + 1,
                        });
                    }
                }
                _ => {}
            }
        }
        None
    }
}

pub fn build_bindings() -> Language {
    use bindings::*;

    let mut b = LanguageBuilder::new("bindings");
    assert_eq!(b.token("identifier"), IDENTIFIER);
    assert_eq!(b.keyword("let"), LET);
    assert_eq!(b.external_token("raw", true), RAW);
    assert_eq!(b.skip_token("whitespace"), WHITESPACE);
    assert_eq!(b.nonterminal("program"), PROGRAM);
    assert_eq!(b.hidden_nonterminal("_entry"), ENTRY);
    assert_eq!(b.nonterminal("binding"), BINDING);

    let name = b.field("name");

    let p_empty = b.production(PROGRAM, 0);
    let p_list = b.production(PROGRAM, 2);
    let p_identifier = b.production(ENTRY, 1);
    let p_binding_entry = b.production(ENTRY, 1);
    let p_raw = b.production(ENTRY, 1);
    let p_binding = b.production(BINDING, 2);
    b.production_field(p_binding, name, 1);

    let t: Vec<StateId> = (0..8).map(|_| b.state()).collect();
    let follow = [Symbol::END, IDENTIFIER, LET, RAW];

    b.reduce_on(t[0], &follow, p_empty).goto(t[0], PROGRAM, t[1]);

    b.accept(t[1])
        .shift(t[1], IDENTIFIER, t[2])
        .shift(t[1], LET, t[3])
        .shift(t[1], RAW, t[4])
        .goto(t[1], ENTRY, t[5])
        .goto(t[1], BINDING, t[6]);

    b.reduce_on(t[2], &follow, p_identifier);
    b.shift(t[3], IDENTIFIER, t[7]);
    b.reduce_on(t[4], &follow, p_raw);
    b.reduce_on(t[5], &follow, p_list);
    b.reduce_on(t[6], &follow, p_binding_entry);
    b.reduce_on(t[7], &follow, p_binding);

    b.root_symbol(PROGRAM)
        .word_token(IDENTIFIER)
        .token_rules(LogosRules::new(binding_symbol))
        .external_scanner(RawBlockScanner);
    b.build().expect("bindings grammar is valid")
}

pub static BINDINGS: Lazy<Language> = Lazy::new(build_bindings);

// =============================================================================
// Dynamic precedence
// =============================================================================
//
//   program → low | high
//   low     → number        (dynamic precedence 0)
//   high    → number        (dynamic precedence 1)
//
// Every input is ambiguous; the reduce/reduce conflict is kept in the table.

pub mod dynamic {
    use canopy::language::Symbol;

    pub const NUMBER: Symbol = Symbol(1);
    pub const WHITESPACE: Symbol = Symbol(2);
    pub const PROGRAM: Symbol = Symbol(3);
    pub const LOW: Symbol = Symbol(4);
    pub const HIGH: Symbol = Symbol(5);
}

fn dynamic_symbol(token: ArithToken) -> Symbol {
    match token {
        ArithToken::Whitespace => dynamic::WHITESPACE,
        _ => dynamic::NUMBER,
    }
}

pub fn build_dynamic() -> Language {
    use dynamic::*;

    let mut b = LanguageBuilder::new("dynamic");
    assert_eq!(b.token("number"), NUMBER);
    assert_eq!(b.skip_token("whitespace"), WHITESPACE);
    assert_eq!(b.nonterminal("program"), PROGRAM);
    assert_eq!(b.nonterminal("low"), LOW);
    assert_eq!(b.nonterminal("high"), HIGH);

    let p_program_low = b.production(PROGRAM, 1);
    let p_program_high = b.production(PROGRAM, 1);
    let p_low = b.production_with_precedence(LOW, 1, 0);
    let p_high = b.production_with_precedence(HIGH, 1, 1);

    let u: Vec<StateId> = (0..5).map(|_| b.state()).collect();
    b.shift(u[0], NUMBER, u[1])
        .goto(u[0], PROGRAM, u[2])
        .goto(u[0], LOW, u[3])
        .goto(u[0], HIGH, u[4]);
    b.reduce(u[1], Symbol::END, p_low).reduce(u[1], Symbol::END, p_high);
    b.accept(u[2]);
    b.reduce(u[3], Symbol::END, p_program_low);
    b.reduce(u[4], Symbol::END, p_program_high);

    b.root_symbol(PROGRAM)
        .token_rules(LogosRules::new(dynamic_symbol));
    b.build().expect("dynamic grammar is valid")
}

pub static DYNAMIC: Lazy<Language> = Lazy::new(build_dynamic);

// =============================================================================
// Statements with an error transition
// =============================================================================
//
//   program   → program statement | ε
//   statement → number ";" | ERROR ";"
//
// The state after `program` has an error transition, so recovery can turn
// skipped input into the first child of a statement.

pub mod statements {
    use canopy::language::Symbol;

    pub const NUMBER: Symbol = Symbol(1);
    pub const SEMICOLON: Symbol = Symbol(2);
    pub const PLUS: Symbol = Symbol(3);
    pub const WHITESPACE: Symbol = Symbol(4);
    pub const PROGRAM: Symbol = Symbol(5);
    pub const STATEMENT: Symbol = Symbol(6);
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementToken {
    #[regex(r"[0-9]+")]
    Number,
    #[token(";")]
    Semicolon,
    #[token("+")]
    Plus,
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

fn statement_symbol(token: StatementToken) -> Symbol {
    match token {
        StatementToken::Number => statements::NUMBER,
        StatementToken::Semicolon => statements::SEMICOLON,
        StatementToken::Plus => statements::PLUS,
        StatementToken::Whitespace => statements::WHITESPACE,
    }
}

pub fn build_statements() -> Language {
    use statements::*;

    let mut b = LanguageBuilder::new("statements");
    assert_eq!(b.token("number"), NUMBER);
    assert_eq!(b.anonymous_token(";"), SEMICOLON);
    assert_eq!(b.anonymous_token("+"), PLUS);
    assert_eq!(b.skip_token("whitespace"), WHITESPACE);
    assert_eq!(b.nonterminal("program"), PROGRAM);
    assert_eq!(b.nonterminal("statement"), STATEMENT);

    let p_empty = b.production(PROGRAM, 0);
    let p_list = b.production(PROGRAM, 2);
    let p_statement = b.production(STATEMENT, 2);
    let p_error_statement = b.production(STATEMENT, 2);

    let v: Vec<StateId> = (0..7).map(|_| b.state()).collect();
    let follow = [Symbol::END, NUMBER, SEMICOLON, PLUS];

    b.reduce_on(v[0], &follow, p_empty).goto(v[0], PROGRAM, v[1]);
    b.accept(v[1])
        .shift(v[1], NUMBER, v[2])
        .goto(v[1], STATEMENT, v[4])
        .error_shift(v[1], v[5]);
    b.shift(v[2], SEMICOLON, v[3]);
    b.reduce_on(v[3], &follow, p_statement);
    b.reduce_on(v[4], &follow, p_list);
    b.shift(v[5], SEMICOLON, v[6]);
    b.reduce_on(v[6], &follow, p_error_statement);

    b.root_symbol(PROGRAM)
        .token_rules(LogosRules::new(statement_symbol));
    b.build().expect("statements grammar is valid")
}

pub static STATEMENTS: Lazy<Language> = Lazy::new(build_statements);
