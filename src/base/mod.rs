//! Foundation types for the canopy parsing core.
//!
//! This module provides:
//! - [`Point`], [`Length`], [`Range`] - Row/column positions and extents
//! - [`InputEdit`] - Text edit descriptors
//! - [`TextRange`], [`TextSize`] - Byte offsets (from `text-size`)
//!
//! This module has NO dependencies on other canopy modules except the error type.

mod edit;
mod position;

pub use edit::InputEdit;
pub use position::{Length, Point, Range};

// Re-export text-size types for convenience
pub use text_size::{self, TextRange, TextSize};

use crate::error::{Error, Result};

/// Length of `text` as a [`TextSize`]; offsets are 32-bit, so text of
/// 4 GiB or more is rejected.
pub(crate) fn text_len(text: &str) -> Result<TextSize> {
    checked_len(text.len())
}

pub(crate) fn checked_len(len: usize) -> Result<TextSize> {
    TextSize::try_from(len).map_err(|_| Error::SourceTooLarge { len })
}
