use canopy::{AmbiguityResolution, Parser, ParserConfig};
use rstest::rstest;

use crate::helpers::grammars::{AMBIGUOUS_ARITHMETIC, ARITHMETIC, DYNAMIC};
use crate::helpers::tree_assertions::{assert_ranges_nested, parse};

#[rstest]
#[case("1 + 2")]
#[case("1 + 2 + 3")]
#[case("1 * 2 + 3")]
fn test_ambiguous_table_matches_resolved_table(#[case] source: &str) {
    let resolved = parse(&ARITHMETIC, source);
    let ambiguous = parse(&AMBIGUOUS_ARITHMETIC, source);
    assert_eq!(ambiguous.to_sexp(), resolved.to_sexp());
    assert!(!ambiguous.has_error());
    assert_ranges_nested(&ambiguous);
}

#[test]
fn test_leftmost_longest_prefers_left_association() {
    let source = "1 + 2 + 3";
    let tree = parse(&AMBIGUOUS_ARITHMETIC, source);
    let sum = tree.root_node().child(0).expect("sum");
    let left = sum.child_by_field_name("left").expect("left");
    assert_eq!(left.kind(), "sum");
    assert_eq!(left.utf8_text(source), Some("1 + 2"));
}

#[rstest]
#[case(AmbiguityResolution::Precedence, "(program (high (number)))")]
#[case(AmbiguityResolution::LeftmostFirst, "(program (low (number)))")]
fn test_dynamic_precedence(#[case] ambiguity: AmbiguityResolution, #[case] expected: &str) {
    let mut parser = Parser::with_language(DYNAMIC.clone())
        .with_config(ParserConfig::default().with_ambiguity(ambiguity));
    let tree = parser.parse("7", None).expect("parse");
    assert_eq!(tree.to_sexp(), expected);
}

#[test]
fn test_single_version_still_parses() {
    let mut parser = Parser::with_language(AMBIGUOUS_ARITHMETIC.clone())
        .with_config(ParserConfig::default().with_max_versions(1));
    let tree = parser.parse("1 + 2 + 3 + 4", None).expect("parse");
    assert!(!tree.has_error());
    assert_ranges_nested(&tree);
}
