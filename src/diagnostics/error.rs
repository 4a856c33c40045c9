//! Syntax error values reported for a parsed tree

use std::fmt;

use text_size::TextRange;

use crate::base::Point;
use crate::tree::Node;

use super::codes::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Severity {
    /// Input the grammar rejects
    #[default]
    Error,
    /// For callers that downgrade a code
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

/// A node enclosing an error, e.g. the node whose production the error
/// interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInfo {
    pub message: String,
    pub range: TextRange,
}

impl RelatedInfo {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }
}

/// A syntax error found in a tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub code: ErrorCode,
    pub message: String,
    /// Byte range of the offending node; empty for missing tokens
    pub range: TextRange,
    pub start_point: Point,
    pub end_point: Point,
    pub severity: Severity,
    /// Suggested fix
    pub hint: Option<String>,
    pub related: Vec<RelatedInfo>,
}

impl SyntaxError {
    /// Start a diagnostic of `code` located at `node`.
    pub fn builder(code: ErrorCode, node: &Node<'_>) -> SyntaxErrorBuilder {
        SyntaxErrorBuilder {
            error: SyntaxError {
                code,
                message: code.default_message().to_string(),
                range: node.text_range(),
                start_point: node.start_position(),
                end_point: node.end_position(),
                severity: code.severity(),
                hint: None,
                related: Vec::new(),
            },
        }
    }

    /// `E0202: missing `)`` followed by an indented hint line, if any.
    pub fn format(&self) -> String {
        match &self.hint {
            Some(hint) => format!("{}: {}\n  hint: {hint}", self.code, self.message),
            None => format!("{}: {}", self.code, self.message),
        }
    }
}

impl fmt::Display for SyntaxError {
    /// `row:column: severity[code]: message`, one-based like editors show.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {}[{}]: {}",
            self.start_point.row + 1,
            self.start_point.column + 1,
            self.severity.as_str(),
            self.code,
            self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

pub struct SyntaxErrorBuilder {
    error: SyntaxError,
}

impl SyntaxErrorBuilder {
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.error.message = message.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.error.severity = severity;
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.error.hint = Some(hint.into());
        self
    }

    /// Point at an enclosing node, described as `in <kind>`.
    pub fn inside(mut self, node: &Node<'_>) -> Self {
        self.error
            .related
            .push(RelatedInfo::new(format!("in {}", node.kind()), node.text_range()));
        self
    }

    pub fn build(self) -> SyntaxError {
        self.error
    }
}
