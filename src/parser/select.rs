//! Choosing between alternative subtrees for the same span.

use std::cmp::Ordering;

use crate::tree::subtree::Subtree;

use super::config::AmbiguityResolution;

/// Whether `candidate` should replace `existing`. Ties keep `existing`.
pub(crate) fn prefer(candidate: &Subtree, existing: &Subtree, mode: AmbiguityResolution) -> bool {
    if candidate.ptr_eq(existing) {
        return false;
    }
    if candidate.error_cost() != existing.error_cost() {
        return candidate.error_cost() < existing.error_cost();
    }
    if mode == AmbiguityResolution::Precedence && candidate.dynamic_precedence() != existing.dynamic_precedence() {
        return candidate.dynamic_precedence() > existing.dynamic_precedence();
    }
    match leftmost_longest(candidate, existing) {
        Ordering::Greater => return true,
        Ordering::Less => return false,
        Ordering::Equal => {}
    }
    if mode == AmbiguityResolution::LeftmostFirst && candidate.production_id() != existing.production_id() {
        return candidate.production_id() < existing.production_id();
    }
    structural(candidate, existing) == Ordering::Less
}

/// `Greater` when `a`'s first differing child is longer, recursively; with
/// equal children, fewer children is greater.
fn leftmost_longest(a: &Subtree, b: &Subtree) -> Ordering {
    for (left, right) in a.children().iter().zip(b.children()) {
        if left.ptr_eq(right) {
            continue;
        }
        let order = left
            .total_bytes()
            .cmp(&right.total_bytes())
            .then_with(|| leftmost_longest(left, right));
        if order != Ordering::Equal {
            return order;
        }
    }
    b.child_count().cmp(&a.child_count())
}

/// A total order used only to make the final choice deterministic.
fn structural(a: &Subtree, b: &Subtree) -> Ordering {
    a.symbol()
        .cmp(&b.symbol())
        .then_with(|| a.child_count().cmp(&b.child_count()))
        .then_with(|| a.is_missing().cmp(&b.is_missing()))
        .then_with(|| {
            a.children()
                .iter()
                .zip(b.children())
                .map(|(left, right)| structural(left, right))
                .find(|order| order.is_ne())
                .unwrap_or(Ordering::Equal)
        })
}
