use canopy::{Point, TextSize};

use crate::helpers::grammars::{ARITHMETIC, arith};
use crate::helpers::tree_assertions::parse;

const SOURCE: &str = "1 + 2 * 3";

fn byte(offset: u32) -> TextSize {
    TextSize::new(offset)
}

#[test]
fn test_root() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let root = tree.root_node();
    assert_eq!(root.kind(), "program");
    assert_eq!(root.kind_id(), arith::PROGRAM);
    assert!(root.parent().is_none());
    assert!(root.next_sibling().is_none());
    assert_eq!(root.child_count(), 1);
    assert_eq!(root.named_child_count(), 1);
    assert_eq!(root.byte_range(), 0..9);
    assert_eq!(root.end_position(), Point::new(0, 9));
}

#[test]
fn test_children_and_fields() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let sum = tree.root_node().child(0).expect("sum");
    assert_eq!(sum.kind(), "sum");
    assert_eq!(sum.children().len(), 3);
    assert_eq!(sum.named_child_count(), 2);

    let operator = sum.child(1).expect("operator");
    assert_eq!(operator.kind(), "+");
    assert!(!operator.is_named());
    assert_eq!(sum.field_name_for_child(0), Some("left"));
    assert_eq!(sum.field_name_for_child(1), Some("operator"));
    assert_eq!(sum.field_name_for_child(2), Some("right"));
    assert_eq!(sum.field_name_for_child(3), None);

    let field = ARITHMETIC.field_id("operator").expect("field");
    assert_eq!(sum.child_by_field_id(field), Some(operator));
    assert_eq!(sum.child_by_field_name("operator"), Some(operator));
    assert!(sum.child_by_field_name("nonexistent").is_none());

    let named: Vec<&str> = sum.named_children().map(|n| n.kind()).collect();
    assert_eq!(named, vec!["number", "product"]);
    assert_eq!(sum.named_child(1).map(|n| n.kind()), Some("product"));
    assert_eq!(sum.first_child().map(|n| n.kind()), Some("number"));
    assert_eq!(sum.last_child().map(|n| n.kind()), Some("product"));
}

#[test]
fn test_siblings_and_parents() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let sum = tree.root_node().child(0).expect("sum");
    let left = sum.child(0).expect("left");
    let product = sum.child(2).expect("product");

    assert_eq!(left.next_sibling().map(|n| n.kind()), Some("+"));
    assert_eq!(left.next_named_sibling(), Some(product));
    assert_eq!(product.prev_sibling().map(|n| n.kind()), Some("+"));
    assert_eq!(product.prev_named_sibling(), Some(left));
    assert!(product.next_sibling().is_none());
    assert!(left.prev_sibling().is_none());

    assert_eq!(product.parent(), Some(sum));
    let two = product.child(0).expect("2");
    assert_eq!(two.parent(), Some(product));
    assert_eq!(two.utf8_text(SOURCE), Some("2"));
}

#[test]
fn test_child_for_byte() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let sum = tree.root_node().child(0).expect("sum");
    assert_eq!(sum.first_child_for_byte(byte(0)).map(|n| n.kind()), Some("number"));
    assert_eq!(sum.first_child_for_byte(byte(2)).map(|n| n.kind()), Some("+"));
    assert_eq!(sum.first_named_child_for_byte(byte(2)).map(|n| n.kind()), Some("product"));
    assert!(sum.first_child_for_byte(byte(9)).is_none());
}

#[test]
fn test_descendants() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let root = tree.root_node();

    let two = root.descendant_for_byte_range(byte(4), byte(5)).expect("2");
    assert_eq!(two.utf8_text(SOURCE), Some("2"));

    let product = root.descendant_for_byte_range(byte(4), byte(9)).expect("product");
    assert_eq!(product.kind(), "product");

    let star = root.descendant_for_byte_range(byte(6), byte(7)).expect("*");
    assert_eq!(star.kind(), "*");
    let named = root.named_descendant_for_byte_range(byte(6), byte(7)).expect("named");
    assert_eq!(named.kind(), "product");

    let three = root
        .descendant_for_point_range(Point::new(0, 8), Point::new(0, 9))
        .expect("3");
    assert_eq!(three.utf8_text(SOURCE), Some("3"));
    assert_eq!(three.range().start_byte, byte(8));
}

#[test]
fn test_node_ids_are_shared_by_clones() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let copy = tree.clone();
    assert_eq!(tree.root_node().id(), copy.root_node().id());
    assert_ne!(tree.root_node().id(), tree.root_node().child(0).expect("sum").id());
}

#[test]
fn test_text_outside_source_is_none() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let three = tree.root_node().descendant_for_byte_range(byte(8), byte(9)).expect("3");
    assert_eq!(three.utf8_text("1 + 2"), None);
}

#[test]
fn test_descendants_outside_node_are_none() {
    let tree = parse(&ARITHMETIC, SOURCE);
    let root = tree.root_node();
    assert!(root.descendant_for_byte_range(byte(100), byte(200)).is_none());
    assert!(root.named_descendant_for_byte_range(byte(5), byte(40)).is_none());
    assert!(root
        .descendant_for_point_range(Point::new(50, 0), Point::new(60, 0))
        .is_none());

    // Reversed ranges are rejected.
    assert!(root.descendant_for_byte_range(byte(5), byte(4)).is_none());

    // Bounds are the node's own, not the root's.
    let product = root.descendant_for_byte_range(byte(4), byte(9)).expect("product");
    assert!(product.descendant_for_byte_range(byte(0), byte(1)).is_none());
    assert_eq!(
        product.descendant_for_byte_range(byte(8), byte(9)).map(|n| n.kind()),
        Some("number")
    );
}
