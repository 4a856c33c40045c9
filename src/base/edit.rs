//! Edit descriptors.

use text_size::{TextRange, TextSize};

use super::position::{Length, Point};
use super::{checked_len, text_len};
use crate::error::{Error, Result};

/// A single contiguous replacement in source text.
///
/// `[start_byte, old_end_byte)` of the old text was replaced by
/// `[start_byte, new_end_byte)` of the new text. Points carry the same
/// positions in row/column form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputEdit {
    pub start_byte: TextSize,
    pub old_end_byte: TextSize,
    pub new_end_byte: TextSize,
    pub start_point: Point,
    pub old_end_point: Point,
    pub new_end_point: Point,
}

impl InputEdit {
    /// Replace `range` of `source` with `text`, returning the new source and
    /// the matching edit with points filled in.
    pub fn replace(source: &str, range: TextRange, text: &str) -> Result<(String, InputEdit)> {
        let start = usize::from(range.start());
        let end = usize::from(range.end());
        let inserted = text_len(text)?;
        let (Some(before), Some(removed)) = (source.get(..start), source.get(start..end)) else {
            return Err(Error::InvalidEditRange {
                start: range.start(),
                old_end: range.end(),
                new_end: range.start().checked_add(inserted).unwrap_or(TextSize::new(u32::MAX)),
                source_len: text_len(source)?,
            });
        };
        // The edited source must still fit 32-bit offsets.
        checked_len(source.len() - removed.len() + text.len())?;

        let start_point = Point::of_text(before);
        let edit = InputEdit {
            start_byte: range.start(),
            old_end_byte: range.end(),
            new_end_byte: range.start() + inserted,
            start_point,
            old_end_point: start_point + Point::of_text(removed),
            new_end_point: start_point + Point::of_text(text),
        };

        let mut edited = String::with_capacity(source.len() - removed.len() + text.len());
        edited.push_str(before);
        edited.push_str(text);
        edited.push_str(&source[end..]);
        Ok((edited, edit))
    }

    /// A zero-width edit that changes nothing.
    pub fn is_noop(&self) -> bool {
        self.start_byte == self.old_end_byte && self.start_byte == self.new_end_byte
    }

    /// Net change in source length.
    pub fn delta(&self) -> i64 {
        i64::from(u32::from(self.new_end_byte)) - i64::from(u32::from(self.old_end_byte))
    }

    /// Check offsets against the length of the source before the edit.
    pub fn validate(&self, source_len: TextSize) -> Result<()> {
        if self.start_byte <= self.old_end_byte
            && self.start_byte <= self.new_end_byte
            && self.old_end_byte <= source_len
        {
            Ok(())
        } else {
            Err(Error::InvalidEditRange {
                start: self.start_byte,
                old_end: self.old_end_byte,
                new_end: self.new_end_byte,
                source_len,
            })
        }
    }

    pub(crate) fn start(&self) -> Length {
        Length::new(self.start_byte, self.start_point)
    }

    pub(crate) fn old_end(&self) -> Length {
        Length::new(self.old_end_byte, self.old_end_point)
    }

    pub(crate) fn new_end(&self) -> Length {
        Length::new(self.new_end_byte, self.new_end_point)
    }
}
