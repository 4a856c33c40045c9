//! Diagnostics derived from a parsed tree.
//!
//! Error recovery leaves three kinds of marks in a tree, each mapped to an
//! [`ErrorCode`]:
//! - an `ERROR` leaf: input no token matched (E0101)
//! - an `ERROR` node: tokens skipped to resynchronize (E0201, or E0901
//!   when it holds only extras)
//! - a missing leaf: a token inserted to continue (E0202)

mod codes;
mod error;

pub use codes::ErrorCode;
pub use error::{RelatedInfo, Severity, SyntaxError, SyntaxErrorBuilder};

use crate::tree::{Node, Tree};

/// Collect diagnostics in source order. Error nodes are reported once,
/// without descending into the skipped input.
pub(crate) fn collect(tree: &Tree) -> Vec<SyntaxError> {
    let mut errors = Vec::new();
    if !tree.has_error() {
        return errors;
    }
    let mut cursor = tree.walk();
    let mut context: Vec<Node<'_>> = Vec::new();
    loop {
        let node = cursor.node();
        let descend = visit(node, context.last().copied(), &mut errors);
        if descend && cursor.goto_first_child() {
            context.push(node);
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return errors;
            }
            context.pop();
        }
    }
}

/// Record a diagnostic for `node`; returns whether to look at its children.
fn visit(node: Node<'_>, parent: Option<Node<'_>>, errors: &mut Vec<SyntaxError>) -> bool {
    let builder = if node.is_missing() {
        let expected = describe(&node);
        SyntaxError::builder(ErrorCode::E0202, &node)
            .message(format!("missing {expected}"))
            .hint(format!("insert {expected}"))
    } else if node.is_error() && node.child_count() == 0 {
        SyntaxError::builder(ErrorCode::E0101, &node)
    } else if node.is_error() {
        match node.children().find(|child| !child.is_extra()) {
            Some(first) => {
                SyntaxError::builder(ErrorCode::E0201, &node).message(format!("unexpected {}", describe(&first)))
            }
            None => SyntaxError::builder(ErrorCode::E0901, &node),
        }
    } else {
        return node.has_error();
    };

    let builder = match parent {
        Some(parent) if parent.is_named() && !parent.is_error() => builder.inside(&parent),
        _ => builder,
    };
    errors.push(builder.build());
    false
}

/// `number` for named kinds, `` `+` `` for anonymous ones.
fn describe(node: &Node<'_>) -> String {
    if node.is_named() {
        node.kind().to_string()
    } else {
        format!("`{}`", node.kind())
    }
}
