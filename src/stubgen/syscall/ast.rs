use crate::common::error::Span;

/// AST representation of one `DEF_SYSCALL(...)` line
///
/// Only the grammar has been checked at this point: types are kept as the
/// raw text found between the separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Source line the definition was read from
    pub span: Span,
    /// The syscall number
    pub number: Number,
    /// The syscall name
    pub name: String,
    /// Raw return type text, e.g. `int` or `struct stat *`
    pub ret: String,
    /// Declared argument count
    pub argc: usize,
    /// Raw comma separated argument list, `None` when the line closes
    /// right after the count
    pub args: Option<String>,
}

/// A syscall number together with its spelling in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Number {
    pub value: u64,
    /// `0x3` or `3`, reproduced verbatim in the generated `#define`
    pub text: String,
}
