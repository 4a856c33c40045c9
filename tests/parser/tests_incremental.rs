use canopy::{Error, InputEdit, Parser, ParserConfig, TextRange, TextSize};
use rstest::rstest;

use crate::helpers::grammars::{ARITHMETIC, BINDINGS};
use crate::helpers::tree_assertions::{assert_ranges_nested, edit_and_reparse, parse};

#[rstest]
#[case("1 + 2", 0, 1, "10")]
#[case("1 + 2 * 3", 4, 5, "(4 + 5)")]
#[case("1 + 2", 5, 5, " + 3")]
#[case("12 * 34", 1, 6, "")]
#[case("1 # note\n+ 2", 2, 8, "# comment")]
#[case("(1 + 2) * 3", 0, 0, "4 * ")]
#[case("1 + 2 + 3", 4, 9, "5")]
fn test_reparse_matches_fresh_parse(
    #[case] source: &str,
    #[case] start: u32,
    #[case] end: u32,
    #[case] text: &str,
) {
    let old = parse(&ARITHMETIC, source);
    let (new_source, _, reparsed) = edit_and_reparse(&ARITHMETIC, &old, source, start, end, text);
    let fresh = parse(&ARITHMETIC, &new_source);
    assert_eq!(reparsed, fresh, "{new_source:?}");
    assert_eq!(reparsed.to_sexp(), fresh.to_sexp());
    assert_ranges_nested(&reparsed);
}

#[rstest]
#[case("let a {b} c", 4, 5, "zz")]
#[case("let a {b} c", 6, 9, "{x {y}}")]
#[case("a b", 1, 1, " let")]
fn test_reparse_with_external_tokens(
    #[case] source: &str,
    #[case] start: u32,
    #[case] end: u32,
    #[case] text: &str,
) {
    let old = parse(&BINDINGS, source);
    let (new_source, _, reparsed) = edit_and_reparse(&BINDINGS, &old, source, start, end, text);
    assert_eq!(reparsed, parse(&BINDINGS, &new_source), "{new_source:?}");
}

#[test]
fn test_unchanged_subtrees_are_shared() {
    let source = "1+2";
    let old = parse(&ARITHMETIC, source);
    let old_two = old
        .root_node()
        .child(0)
        .and_then(|sum| sum.child_by_field_name("right"))
        .expect("right operand");
    assert_eq!(old_two.byte_range(), 2..3);

    let (new_source, _, new) = edit_and_reparse(&ARITHMETIC, &old, source, 0, 1, "10");
    assert_eq!(new_source, "10+2");
    let new_two = new
        .root_node()
        .child(0)
        .and_then(|sum| sum.child_by_field_name("right"))
        .expect("right operand");
    assert_eq!(new_two.byte_range(), 3..4);
    assert_eq!(new_two.id(), old_two.id());
    assert_eq!(new.to_sexp(), old.to_sexp());
}

#[test]
fn test_reuse_can_be_disabled() {
    let source = "1+2";
    let old = parse(&ARITHMETIC, source);
    let range = TextRange::new(TextSize::new(0), TextSize::new(1));
    let (new_source, edit) = InputEdit::replace(source, range, "10").expect("edit");
    let edited = old.edit(&edit).expect("edit");

    let mut parser =
        Parser::with_language(ARITHMETIC.clone()).with_config(ParserConfig::default().with_reuse(false));
    let tree = parser.parse(&new_source, Some(&edited)).expect("parse");
    let old_two = old.root_node().child(0).and_then(|sum| sum.child(2)).expect("2");
    let new_two = tree.root_node().child(0).and_then(|sum| sum.child(2)).expect("2");
    assert_ne!(new_two.id(), old_two.id());
    assert_eq!(tree, parse(&ARITHMETIC, &new_source));
}

#[test]
fn test_noop_edit_is_idempotent() {
    let source = "1 * (2 + 3)";
    let old = parse(&ARITHMETIC, source);
    let (new_source, edited, reparsed) = edit_and_reparse(&ARITHMETIC, &old, source, 3, 3, "");
    assert_eq!(new_source, source);
    assert_eq!(edited, old);
    assert_eq!(reparsed, old);
}

#[rstest]
#[case("#c\n1")]
#[case(" #c\n")]
#[case("#c\n2")]
#[case("#c\n#c\n")]
#[case("# lead\n1 + (2 # inner\n) * 3")]
fn test_reparse_of_extra_led_source_keeps_shape(#[case] source: &str) {
    let old = parse(&ARITHMETIC, source);
    let mut parser = Parser::with_language(ARITHMETIC.clone());

    let unedited = parser.parse(source, Some(&old)).expect("reparse");
    assert_eq!(unedited, old, "{source:?}");
    assert_eq!(unedited.to_sexp(), old.to_sexp());
    assert!(!unedited.root_node().is_extra());

    let (_, edited, reparsed) = edit_and_reparse(&ARITHMETIC, &old, source, 0, 0, "");
    assert_eq!(edited, old);
    assert_eq!(reparsed, old, "{source:?}");
}

#[test]
fn test_edit_after_leading_comment_matches_fresh_parse() {
    let source = "#c\n1 + 2";
    let old = parse(&ARITHMETIC, source);
    let (new_source, _, reparsed) = edit_and_reparse(&ARITHMETIC, &old, source, 7, 8, "(3)");
    assert_eq!(new_source, "#c\n1 + (3)");
    assert_eq!(reparsed, parse(&ARITHMETIC, &new_source));
    assert_eq!(
        reparsed.to_sexp(),
        "(program (comment) (sum left: (number) right: (parenthesized (number))))"
    );
}

#[test]
fn test_tree_from_other_language_is_rejected() {
    let old = parse(&BINDINGS, "a");
    let mut parser = Parser::with_language(ARITHMETIC.clone());
    let err = parser.parse("1", Some(&old)).expect_err("mismatch");
    assert_eq!(
        err,
        Error::LanguageMismatch {
            tree: "bindings".into(),
            parser: "arithmetic".into(),
        }
    );
}

#[test]
fn test_invalid_edit_range() {
    let tree = parse(&ARITHMETIC, "1");
    let range = TextRange::new(TextSize::new(0), TextSize::new(9));
    assert!(matches!(
        InputEdit::replace("1", range, "2"),
        Err(Error::InvalidEditRange { .. })
    ));
    let (_, edit) = InputEdit::replace("1 + 2 + 3", range, "2").expect("edit of longer text");
    assert!(matches!(tree.edit(&edit), Err(Error::InvalidEditRange { .. })));
}
