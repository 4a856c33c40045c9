//! Tree assertion helpers.

use canopy::{InputEdit, Language, Node, Parser, TextRange, TextSize, Tree};

pub fn parse(language: &Language, source: &str) -> Tree {
    Parser::with_language(language.clone())
        .parse(source, None)
        .unwrap_or_else(|e| panic!("parse of {source:?} failed: {e}"))
}

/// Edit `source` and reparse it against the edited old tree.
///
/// Returns the new source, the edited old tree and the reparsed tree.
pub fn edit_and_reparse(
    language: &Language,
    old: &Tree,
    source: &str,
    start: u32,
    end: u32,
    text: &str,
) -> (String, Tree, Tree) {
    let range = TextRange::new(TextSize::new(start), TextSize::new(end));
    let (new_source, edit) = InputEdit::replace(source, range, text).expect("valid edit");
    let edited = old.edit(&edit).expect("edit applies");
    let reparsed = Parser::with_language(language.clone())
        .parse(&new_source, Some(&edited))
        .expect("reparse");
    (new_source, edited, reparsed)
}

/// Every child lies inside its parent and siblings are ordered without
/// overlapping.
pub fn assert_ranges_nested(tree: &Tree) {
    fn check(node: Node<'_>) {
        let mut previous_end = node.start_byte();
        for child in node.children() {
            assert!(
                child.start_byte() >= node.start_byte() && child.end_byte() <= node.end_byte(),
                "{child:?} escapes {node:?}"
            );
            assert!(child.start_byte() >= previous_end, "{child:?} overlaps its previous sibling");
            previous_end = child.end_byte();
            check(child);
        }
    }
    check(tree.root_node());
}

/// The root covers the whole source.
pub fn assert_covers(tree: &Tree, source: &str) {
    assert_eq!(tree.len(), TextSize::of(source), "tree length for {source:?}");
    assert!(tree.root_node().end_byte() <= TextSize::of(source));
}

/// Count nodes in the tree matching `predicate`.
pub fn count_nodes(tree: &Tree, predicate: impl Fn(&Node<'_>) -> bool) -> usize {
    fn walk(node: Node<'_>, predicate: &dyn Fn(&Node<'_>) -> bool) -> usize {
        usize::from(predicate(&node)) + node.children().map(|child| walk(child, predicate)).sum::<usize>()
    }
    walk(tree.root_node(), &predicate)
}

/// First node in document order matching `predicate`.
pub fn find_node<'tree>(tree: &'tree Tree, predicate: impl Fn(&Node<'tree>) -> bool) -> Option<Node<'tree>> {
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        if predicate(&node) {
            return Some(node);
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}
