//! Syntactic differences between an edited tree and its reparse.

use crate::base::{Length, Range};

use super::Tree;
use super::node::Node;

/// Ranges whose syntax differs between `old` (already edited, so both trees
/// share coordinates) and `new`.
pub(crate) fn changed_ranges(old: &Tree, new: &Tree) -> Vec<Range> {
    let mut ranges = Vec::new();
    compare(old.root_node(), new.root_node(), &mut ranges);
    merge(ranges)
}

fn compare(old: Node<'_>, new: Node<'_>, out: &mut Vec<Range>) {
    if old.subtree().ptr_eq(new.subtree()) && old.position() == new.position() {
        return;
    }
    let same_kind = old.kind_id() == new.kind_id()
        && old.is_missing() == new.is_missing()
        && old.is_extra() == new.is_extra();

    if same_kind && old.child_count() > 0 && old.child_count() == new.child_count() {
        for (old_child, new_child) in old.children().zip(new.children()) {
            compare(old_child, new_child, out);
        }
        return;
    }
    let same_leaf = same_kind
        && old.child_count() == 0
        && new.child_count() == 0
        && !old.has_changes()
        && old.start() == new.start()
        && old.end() == new.end();
    if same_leaf {
        return;
    }
    out.push(union(old, new));
}

fn union(a: Node<'_>, b: Node<'_>) -> Range {
    let start = min_length(a.start(), b.start());
    let end = max_length(a.end(), b.end());
    Range::new(start, end)
}

fn min_length(a: Length, b: Length) -> Length {
    if b.bytes < a.bytes { b } else { a }
}

fn max_length(a: Length, b: Length) -> Length {
    if b.bytes > a.bytes { b } else { a }
}

/// Sort and join overlapping or touching ranges.
fn merge(mut ranges: Vec<Range>) -> Vec<Range> {
    ranges.sort_by_key(|range| (range.start_byte, range.end_byte));
    let mut merged: Vec<Range> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start_byte <= last.end_byte => {
                if range.end_byte > last.end_byte {
                    last.end_byte = range.end_byte;
                    last.end_point = range.end_point;
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}
