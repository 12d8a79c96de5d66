//! Common error handling utilities for the generator.
//!
//! Every defect found in a syscall table is fatal: the whole run aborts and
//! nothing is written. This module provides the single error type that
//! carries the defect category, a message and the offending source line.

use core::fmt;

/// Category of a table defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The line starts with `DEF_SYSCALL` but does not follow the grammar.
    Grammar,
    /// The declared argument count disagrees with the argument list, or
    /// exceeds the number of argument registers.
    Arity,
    /// A type is neither a built-in scalar nor an explicit `struct` type.
    DisallowedType,
    /// A type has a shape the translator cannot express (e.g. `void **`).
    UnsupportedType,
    /// A syscall name or number was already defined by an earlier line.
    Duplicate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Grammar => "grammar error",
            ErrorKind::Arity => "arity mismatch",
            ErrorKind::DisallowedType => "disallowed type",
            ErrorKind::UnsupportedType => "unsupported type",
            ErrorKind::Duplicate => "duplicate definition",
        };
        write!(f, "{}", name)
    }
}

/// Source location of a table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// 1-based line number in the table file
    pub line: usize,
    /// 1-based column the error points at, if it is more precise than the line
    pub column: Option<usize>,
    /// The trimmed text of the line
    pub text: String,
}

impl Span {
    /// Creates a span covering a whole table line.
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self {
            line,
            column: None,
            text: text.into(),
        }
    }

    /// Returns a copy of this span narrowed to one column.
    pub fn at(&self, column: usize) -> Self {
        Self {
            column: Some(column),
            ..self.clone()
        }
    }
}

/// Unified error type for table processing.
///
/// This structure represents a fatal defect in a syscall table, including
/// both the error message and the line it was found on, so the driver can
/// print the offending line before aborting.
#[derive(Debug, Clone)]
pub struct Error {
    /// Defect category
    pub kind: ErrorKind,
    /// Human-readable error message describing what went wrong
    pub message: String,
    /// Table line where the error occurred
    pub span: Span,
}

impl Error {
    /// Creates a new error with the given category, message and location.
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Error processing line {} {:?}:",
            self.span.line, self.span.text
        )?;
        match self.span.column {
            Some(column) => write!(f, "{} at column {}: {}", self.kind, column, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {}

/// Standard Result type alias for table processing.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_line() {
        let span = Span::new(7, "DEF_SYSCALL(1, x, int, 1)");
        let err = Error::new(ErrorKind::Arity, "Expected 1 syscall arguments, got 0.", span);
        let msg = err.to_string();
        assert!(msg.starts_with("Error processing line 7 \"DEF_SYSCALL(1, x, int, 1)\":\n"));
        assert!(msg.ends_with("arity mismatch: Expected 1 syscall arguments, got 0."));
    }

    #[test]
    fn test_display_with_column() {
        let span = Span::new(1, "DEF_SYSCALL 1").at(13);
        let err = Error::new(ErrorKind::Grammar, "expected '('", span);
        assert!(err.to_string().ends_with("grammar error at column 13: expected '('"));
    }
}
