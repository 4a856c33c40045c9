//! Export to a lossless rowan tree.
//!
//! Every source byte appears in exactly one token: padding becomes
//! [`TRIVIA`] tokens, leaves become tokens of their symbol and interior
//! nodes become rowan nodes. Missing tokens export as empty tokens, so the
//! exported text is always the parsed source.

use crate::language::Symbol;

use super::Tree;
use super::node::Node;

/// Kind of the tokens holding padding and trailing text
pub const TRIVIA: Symbol = Symbol(u16::MAX - 1);

impl From<Symbol> for rowan::SyntaxKind {
    fn from(symbol: Symbol) -> Self {
        Self(symbol.0)
    }
}

impl From<rowan::SyntaxKind> for Symbol {
    fn from(raw: rowan::SyntaxKind) -> Self {
        Symbol(raw.0)
    }
}

/// Rowan language whose kinds are grammar symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LosslessLanguage {}

impl rowan::Language for LosslessLanguage {
    type Kind = Symbol;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type LosslessNode = rowan::SyntaxNode<LosslessLanguage>;
pub type LosslessToken = rowan::SyntaxToken<LosslessLanguage>;

pub(crate) fn to_lossless(tree: &Tree, source: &str) -> LosslessNode {
    let mut builder = rowan::GreenNodeBuilder::new();
    let root = tree.root_node();
    // A root leaf still needs a node around it.
    if root.child_count() == 0 {
        builder.start_node(root.kind_id().into());
        write_padding(&mut builder, source, root);
        write_text(&mut builder, source, TRIVIA, root.byte_range());
        builder.finish_node();
    } else {
        write_node(&mut builder, source, root);
    }
    LosslessNode::new_root(builder.finish())
}

fn write_node(builder: &mut rowan::GreenNodeBuilder<'static>, source: &str, node: Node<'_>) {
    if node.child_count() == 0 {
        write_padding(builder, source, node);
        let kind = node.tree().language().metadata(node.kind_id()).kind;
        if kind.is_terminal() || node.is_error() {
            let text = if node.is_missing() { "" } else { source.get(node.byte_range()).unwrap_or("") };
            builder.token(node.kind_id().into(), text);
        } else {
            // Empty production
            builder.start_node(node.kind_id().into());
            builder.finish_node();
        }
        return;
    }

    builder.start_node(node.kind_id().into());
    let mut end = node.start().byte_usize();
    for child in node.children() {
        write_node(builder, source, child);
        end = child.end().byte_usize();
    }
    write_text(builder, source, TRIVIA, end..node.end().byte_usize());
    builder.finish_node();
}

fn write_padding(builder: &mut rowan::GreenNodeBuilder<'static>, source: &str, node: Node<'_>) {
    let range = node.position().byte_usize()..node.start().byte_usize();
    write_text(builder, source, TRIVIA, range);
}

fn write_text(
    builder: &mut rowan::GreenNodeBuilder<'static>,
    source: &str,
    kind: Symbol,
    range: std::ops::Range<usize>,
) {
    if range.start < range.end {
        if let Some(text) = source.get(range) {
            builder.token(kind.into(), text);
        }
    }
}
