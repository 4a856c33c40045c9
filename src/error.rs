//! API error type.
//!
//! Malformed source text never produces an [`Error`]; it becomes ERROR and
//! missing nodes inside the returned tree. These variants cover API misuse
//! and interrupted parses.

use std::time::Duration;

use smol_str::SmolStr;
use text_size::TextSize;
use thiserror::Error;

/// Errors returned by the public API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("parse cancelled")]
    Cancelled,

    #[error("parse timed out after {0:?}")]
    Timeout(Duration),

    #[error(
        "invalid edit range: start {start:?}, old end {old_end:?}, new end {new_end:?} for source of length {source_len:?}"
    )]
    InvalidEditRange {
        start: TextSize,
        old_end: TextSize,
        new_end: TextSize,
        source_len: TextSize,
    },

    #[error("tree was produced by language `{tree}` but the parser uses `{parser}`")]
    LanguageMismatch { tree: SmolStr, parser: SmolStr },

    #[error("source of {len} bytes does not fit 32-bit offsets")]
    SourceTooLarge { len: usize },

    #[error("parser has no language")]
    NoLanguage,

    #[error("invalid language `{name}`: {message}")]
    InvalidLanguage { name: SmolStr, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
