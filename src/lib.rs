//! # canopy
//!
//! Incremental GLR parsing core: a table-driven parser with a per-state
//! lexer, bounded error recovery, persistent syntax trees and subtree reuse
//! across edits.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! parser      → GLR engine, error recovery, reuse cursor, batch parse
//!   ↓
//! tree        → Tree, Node, TreeCursor, edit, changed ranges, rowan export
//!   ↓
//! diagnostics → SyntaxError reports for ERROR and missing nodes
//!   ↓
//! lexer       → TokenRules (logos), ExternalScanner, keyword demotion
//!   ↓
//! language    → Symbols, productions, ParseTable, registry
//!   ↓
//! base        → Point, Length, Range, InputEdit
//! ```
//!
//! ## Example
//!
//! ```
//! # fn demo(language: &canopy::Language) -> canopy::Result<()> {
//! use canopy::{InputEdit, TextRange, TextSize};
//!
//! let source = "1 + 2";
//! let tree = canopy::parse(language, source, None)?;
//!
//! let range = TextRange::new(TextSize::new(0), TextSize::new(1));
//! let (new_source, edit) = InputEdit::replace(source, range, "10")?;
//! let edited = tree.edit(&edit)?;
//! let new_tree = canopy::parse(language, &new_source, Some(&edited))?;
//! for range in edited.changed_ranges(&new_tree) {
//!     println!("changed: {:?}", range.text_range());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// MODULES (dependency order: base → language → lexer → tree → parser)
// ============================================================================

/// Foundation types: Point, Length, Range, InputEdit
pub mod base;

/// API error type
pub mod error;

/// Languages: symbol metadata, parse tables, registry
pub mod language;

/// State-aware lexer with external scanner support
pub mod lexer;

/// Persistent syntax trees and navigation
pub mod tree;

/// GLR parser, error recovery and incremental reuse
pub mod parser;

/// Diagnostics derived from ERROR and missing nodes
pub mod diagnostics;

#[cfg(test)]
extern crate self as canopy;

#[cfg(test)]
#[path = "../tests/helpers/grammars.rs"]
pub(crate) mod test_grammars;

// Re-export the everyday API
pub use base::{InputEdit, Length, Point, Range, TextRange, TextSize};
pub use diagnostics::{ErrorCode, Severity, SyntaxError};
pub use error::{Error, Result};
pub use language::{Language, LanguageBuilder, LanguageRegistry, Symbol};
pub use lexer::{ExternalScanner, LogosRules, TokenRules};
pub use parser::{AmbiguityResolution, Parser, ParserConfig, parse_batch};
pub use tree::{Node, Tree, TreeCursor};

/// Parse `source` with `language`, reusing `old_tree` when given.
///
/// Shorthand for [`Parser::parse`] on a parser with default configuration.
pub fn parse(language: &Language, source: &str, old_tree: Option<&Tree>) -> Result<Tree> {
    Parser::with_language(language.clone()).parse(source, old_tree)
}
