//! GLR parser over precompiled tables.
//!
//! The parser drives the [`Lexer`](crate::lexer::Lexer) from the state of
//! each live stack version, forks on conflicting actions, merges versions
//! that reach the same state at the same position, and recovers from
//! syntax errors instead of failing.
//!
//! ## Architecture
//!
//! ```text
//! Source Text (+ edited old Tree)
//!     ↓
//! Engine ──→ Lexer (per-state lex mode, token cache)
//!   │   └──→ ReuseCursor (subtrees of the old tree)
//!   ↓
//! Graph-structured stack (one head per version)
//!   ↓
//! Recovery (missing token, skip, pop) when no version can advance
//!   ↓
//! Tree
//! ```
//!
//! ## Incremental Reparsing
//!
//! When an edited old tree is supplied, the engine:
//! 1. Walks the old tree in step with the current position
//! 2. Shifts whole unchanged subtrees instead of lexing their text
//! 3. Breaks a reused subtree down when the current state differs from the
//!    state it was first parsed in

mod batch;
mod config;
mod engine;
mod recovery;
mod reuse;
mod select;
mod stack;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::base::text_len;
use crate::error::{Error, Result};
use crate::language::Language;
use crate::tree::Tree;

pub use batch::parse_batch;
pub use config::{AmbiguityResolution, ParserConfig};

use engine::Engine;

/// A reusable parser bound to one language
///
/// ```
/// # fn demo(language: canopy::Language) -> canopy::Result<()> {
/// let mut parser = canopy::Parser::with_language(language);
/// let tree = parser.parse("1 + 2", None)?;
/// assert!(!tree.has_error());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parser {
    language: Option<Language>,
    config: ParserConfig,
    cancellation: Option<CancellationToken>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::default()
        }
    }

    pub fn with_config(mut self, config: ParserConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
    }

    pub fn language(&self) -> Option<&Language> {
        self.language.as_ref()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParserConfig) {
        self.config = config;
    }

    /// Once `token` is cancelled, running and later parses return
    /// [`Error::Cancelled`].
    pub fn set_cancellation_token(&mut self, token: Option<CancellationToken>) {
        self.cancellation = token;
    }

    /// Parse `source`. When `old_tree` is the edited tree of a previous
    /// version of `source`, its unchanged subtrees are reused.
    ///
    /// Syntax errors never fail the parse; they show up as ERROR and
    /// missing nodes. Errors are returned for a missing language, a tree
    /// from another language, a source of 4 GiB or more, cancellation and
    /// timeout.
    pub fn parse(&mut self, source: &str, old_tree: Option<&Tree>) -> Result<Tree> {
        let language = self.language.as_ref().ok_or(Error::NoLanguage)?;
        if let Some(old) = old_tree {
            if !old.language().ptr_eq(language) {
                return Err(Error::LanguageMismatch {
                    tree: old.language().name().into(),
                    parser: language.name().into(),
                });
            }
        }

        // Offsets are 32-bit; larger sources are rejected up front.
        text_len(source)?;

        debug!(
            language = language.name(),
            len = source.len(),
            incremental = old_tree.is_some(),
            "parse"
        );
        let engine = Engine::new(
            language,
            source,
            old_tree.map(Tree::root),
            &self.config,
            self.cancellation.as_ref(),
        );
        let root = engine.run()?;
        let tree = Tree::new(root, language.clone());
        debug!(
            language = language.name(),
            has_error = tree.has_error(),
            "parse finished"
        );
        Ok(tree)
    }
}
