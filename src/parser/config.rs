//! Parser configuration

use std::time::Duration;

/// How to choose between two complete parses of the same input that have
/// equal error cost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AmbiguityResolution {
    /// Higher dynamic precedence wins; remaining ties go to the tree whose
    /// leftmost differing child is longest
    #[default]
    Precedence,
    /// Leftmost-longest first; remaining ties go to the lower production id
    LeftmostFirst,
}

/// Tuning knobs for [`Parser`](super::Parser)
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Upper bound on simultaneously active stack versions
    pub max_versions: usize,
    /// Tokens skipped one by one before recovery pops the stack instead
    pub max_skipped_tokens: usize,
    pub ambiguity: AmbiguityResolution,
    /// Reuse subtrees of an old tree when one is supplied
    pub reuse: bool,
    /// Try inserting a missing token before skipping input
    pub insert_missing: bool,
    /// Abort with [`Error::Timeout`](crate::Error::Timeout) after this long
    pub timeout: Option<Duration>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_versions: 6,
            max_skipped_tokens: 3,
            ambiguity: AmbiguityResolution::Precedence,
            reuse: true,
            insert_missing: true,
            timeout: None,
        }
    }
}

impl ParserConfig {
    pub fn with_max_versions(mut self, max_versions: usize) -> Self {
        self.max_versions = max_versions.max(1);
        self
    }

    pub fn with_max_skipped_tokens(mut self, max_skipped_tokens: usize) -> Self {
        self.max_skipped_tokens = max_skipped_tokens;
        self
    }

    pub fn with_ambiguity(mut self, ambiguity: AmbiguityResolution) -> Self {
        self.ambiguity = ambiguity;
        self
    }

    pub fn with_reuse(mut self, reuse: bool) -> Self {
        self.reuse = reuse;
        self
    }

    pub fn with_insert_missing(mut self, insert_missing: bool) -> Self {
        self.insert_missing = insert_missing;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
