//! Diagnostic codes
//!
//! Codes follow E{category}{number}:
//! - E01xx: lexical (input no token matches)
//! - E02xx: structural (syntax skipped or inserted by recovery)
//! - E09xx: generic

use std::fmt;

use super::error::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorCode {
    /// Input that no token rule matches
    E0101,
    /// Tokens skipped by error recovery
    E0201,
    /// Token inserted by error recovery
    E0202,
    /// Error node without a token to name
    E0901,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E0101 => "E0101",
            Self::E0201 => "E0201",
            Self::E0202 => "E0202",
            Self::E0901 => "E0901",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::E0101 => "lexical error",
            Self::E0201 | Self::E0202 => "structural error",
            Self::E0901 => "syntax error",
        }
    }

    /// Message used when the collector has nothing more specific.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::E0101 => "invalid character",
            Self::E0201 => "unexpected syntax",
            Self::E0202 => "missing syntax",
            Self::E0901 => "syntax error",
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::Error
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::E0201 | Self::E0202)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
