//! Common source fixtures for the arithmetic grammar.

pub const SINGLE_NUMBER: &str = "42";
pub const SUM: &str = "1 + 2";
pub const PRECEDENCE: &str = "1 + 2 * 3";
pub const NESTED: &str = "(1 + (2 * 3)) * 4";

pub const MULTILINE: &str = r#"
1 +   # first
  2 *
  (3 + 4)
"#;

/// Inputs no derivation of the grammar matches.
pub const MALFORMED: &[&str] = &["☠garbage☠", "+", "(1", "1 +", ")(", "1 2", "((((", "*", "1 ☠ + 2"];

/// Every fixture, valid or not.
pub fn all() -> Vec<&'static str> {
    let mut sources = vec!["", SINGLE_NUMBER, SUM, PRECEDENCE, NESTED, MULTILINE];
    sources.extend_from_slice(MALFORMED);
    sources
}
