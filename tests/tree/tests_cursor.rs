use canopy::TextSize;

use crate::helpers::grammars::ARITHMETIC;
use crate::helpers::tree_assertions::parse;

#[test]
fn test_cursor_walk_with_fields() {
    let tree = parse(&ARITHMETIC, "1 + 2 * 3");
    let mut cursor = tree.walk();
    assert_eq!(cursor.depth(), 0);
    assert!(cursor.field_name().is_none());

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.node().kind(), "sum");
    assert!(cursor.field_name().is_none());

    assert!(cursor.goto_first_child());
    assert_eq!(cursor.field_name(), Some("left"));
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.field_name(), Some("operator"));
    assert!(cursor.goto_next_sibling());
    assert_eq!(cursor.node().kind(), "product");
    assert_eq!(cursor.field_name(), Some("right"));
    assert!(!cursor.goto_next_sibling());

    assert!(cursor.goto_previous_sibling());
    assert_eq!(cursor.node().kind(), "+");
    assert_eq!(cursor.depth(), 2);

    assert!(cursor.goto_parent());
    assert!(cursor.goto_parent());
    assert!(!cursor.goto_parent());
    assert_eq!(cursor.node(), tree.root_node());
}

#[test]
fn test_cursor_preorder() {
    let tree = parse(&ARITHMETIC, "1 + 2 * 3");
    let mut cursor = tree.walk();
    let mut kinds = Vec::new();
    'walk: loop {
        kinds.push(cursor.node().kind());
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                break 'walk;
            }
        }
    }
    assert_eq!(
        kinds,
        vec!["program", "sum", "number", "+", "product", "number", "*", "number"]
    );
}

#[test]
fn test_cursor_jumps() {
    let tree = parse(&ARITHMETIC, "1 + 2 * 3");
    let mut cursor = tree.walk();
    assert!(cursor.goto_last_child());
    assert_eq!(cursor.goto_first_child_for_byte(TextSize::new(5)), Some(2));
    assert_eq!(cursor.node().kind(), "product");
    assert_eq!(cursor.goto_first_child_for_byte(TextSize::new(100)), None);

    let product = cursor.node();
    cursor.reset(product);
    assert_eq!(cursor.depth(), 0);
    assert!(!cursor.goto_parent());
    assert!(!cursor.goto_next_sibling());
}
