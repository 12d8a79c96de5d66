//! Intermediate Representation (IR) for syscall code generation.
//!
//! This module defines the validated representation handed from the
//! lowering pass to the code generator. Everything in here has passed the
//! arity, type and uniqueness checks.

use std::collections::BTreeSet;

use super::ctype::FfiType;
use crate::common::error::Span;

/// A C type with its FFI translation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// The type as written in the table, trimmed. The C prototype reuses
    /// this spelling unchanged.
    pub raw: String,
    /// The type as it appears in the `extern "C"` block
    pub ffi: FfiType,
}

/// A single syscall argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Argument name
    pub name: String,
    /// The full C declaration as written in the table, e.g. `void *buf`
    pub decl: String,
    /// Type part of `decl`, validated and translated
    pub ty: TypeDecl,
}

/// Individual syscall definition in intermediate representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syscall {
    /// Table line the definition came from
    pub span: Span,
    /// Syscall number
    pub number: u64,
    /// Syscall number as spelled in the table
    pub number_text: String,
    /// Syscall name, `__sys_<name>` and `__NR_<name>` are derived from it
    pub name: String,
    /// Return type
    pub ret: TypeDecl,
    /// Arguments in declaration order, never more than four
    pub params: Vec<Param>,
}

impl Syscall {
    pub fn argc(&self) -> usize {
        self.params.len()
    }

    /// Argument list for the C prototype.
    ///
    /// An empty list is spelled `void`: in C, empty parentheses in a
    /// declaration leave the arguments unspecified.
    pub fn c_args(&self) -> String {
        if self.params.is_empty() {
            return "void".to_string();
        }
        self.params
            .iter()
            .map(|p| p.decl.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Argument list for the Rust declaration, `name: type, ...`.
    pub fn ffi_args(&self) -> String {
        self.params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty.ffi))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Distinct `struct X` types referenced by the table.
///
/// Iteration is in lexicographic order, which is the order the header
/// forward declares them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructSet(BTreeSet<String>);

impl StructSet {
    /// Adds `struct X`; returns false if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    /// Names in forward declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// All validated definitions of one table, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyscallTable {
    /// Definitions in table order
    pub syscalls: Vec<Syscall>,
    /// `struct` types used by any argument
    pub structs: StructSet,
}

impl SyscallTable {
    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.syscalls.len()
    }

    /// True when the table holds no definition at all.
    pub fn is_empty(&self) -> bool {
        self.syscalls.is_empty()
    }
}
