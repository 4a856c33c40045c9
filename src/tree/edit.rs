//! Applying an [`InputEdit`] to a subtree.
//!
//! Editing shifts and resizes the subtrees around the edited range and marks
//! every subtree it touches with `HAS_CHANGES`; untouched subtrees keep their
//! identity. The next parse uses the marks to decide what it can reuse.

use crate::base::{InputEdit, Length};

use super::subtree::{Flags, Subtree};

/// An edit in coordinates relative to one subtree's padding start
#[derive(Debug, Clone, Copy)]
struct EditSpan {
    start: Length,
    old_end: Length,
    new_end: Length,
}

impl EditSpan {
    fn of(edit: &InputEdit) -> Self {
        Self {
            start: edit.start(),
            old_end: edit.old_end(),
            new_end: edit.new_end(),
        }
    }

    fn relative_to(self, origin: Length) -> Self {
        Self {
            start: self.start - origin,
            old_end: self.old_end - origin,
            new_end: self.new_end - origin,
        }
    }
}

pub(crate) fn edit_subtree(subtree: &Subtree, edit: &InputEdit) -> Subtree {
    if edit.is_noop() {
        return subtree.clone();
    }
    edit_span(subtree, EditSpan::of(edit))
}

fn edit_span(subtree: &Subtree, mut edit: EditSpan) -> Subtree {
    let mut result = subtree.clone();
    let data = result.data_mut();

    let padding = data.padding;
    let size = data.size;
    let total = padding + size;
    let is_pure_insertion = edit.old_end.bytes == edit.start.bytes;

    if edit.old_end.bytes <= padding.bytes {
        // Edit ends in the padding: shift.
        data.padding = edit.new_end + (padding - edit.old_end);
    } else if edit.start.bytes < padding.bytes {
        // Edit starts in the padding and reaches into the content: shrink.
        data.size = size - (edit.old_end - padding);
        data.padding = edit.new_end;
    } else if edit.start.bytes == padding.bytes && is_pure_insertion {
        data.padding = edit.new_end;
    } else if edit.start.bytes < total.bytes || (edit.start.bytes == total.bytes && is_pure_insertion) {
        let new_total = edit.new_end + (total - edit.old_end);
        data.size = new_total - padding;
    }
    data.flags.set(Flags::HAS_CHANGES, true);

    let mut child_right = Length::zero();
    for index in 0..data.children.len() {
        let child = &data.children[index];
        let child_size = child.total_size();
        let child_left = child_right;
        child_right = child_left + child_size;

        // Ends (including what the lexer looked at) before the edit.
        if u32::from(child_right.bytes) + child.lookahead_bytes() < u32::from(edit.start.bytes) {
            continue;
        }
        // Starts after the edit.
        if child_left.bytes > edit.old_end.bytes
            || (child_left.bytes == edit.old_end.bytes && !child_size.is_zero() && index > 0)
        {
            break;
        }

        let child_edit = edit.relative_to(child_left);
        // Inserted text belongs to the first child that touches it.
        if child_right.bytes > edit.start.bytes || (child_right.bytes == edit.start.bytes && is_pure_insertion) {
            edit.new_end = edit.start;
        }
        data.children[index] = edit_span(&data.children[index], child_edit);
    }
    Subtree::refresh_child_offsets(data);

    result
}
