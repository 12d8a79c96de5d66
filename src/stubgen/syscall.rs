//! Syscall table processing.
//!
//! A syscall table is a text file with one definition per line:
//!
//! ```text
//! DEF_SYSCALL(0x3, read, int, 3, int fd, void *buf, int size)
//! DEF_SYSCALL(0x9, exit, void, 0)
//! ```
//!
//! Lines that do not start with `DEF_SYSCALL` are ignored, so comments,
//! blank lines and preprocessor directives can live in the same file.
//!
//! # Architecture
//!
//! Processing follows a multi-phase approach:
//! 1. **Parsing**: each definition line becomes an AST definition
//! 2. **Lowering**: the AST is validated and translated into IR
//! 3. **Code Generation**: the IR is rendered into the header, the stubs
//!    and the Rust declarations
//!
//! Any defect in the table aborts the whole run; there is no partial output.

mod ast;
pub mod arch;
pub mod codegen;
pub mod ctype;
pub mod ir;
mod lowering;
mod parser;

use log::trace;

use crate::common::error::{Result, Span};

/// Marker that starts every definition line.
pub const DEF_SYSCALL: &str = "DEF_SYSCALL";

/// Constants used throughout the syscall generation process.
pub mod constants {
    /// Maximum number of arguments a syscall may take.
    ///
    /// The trampolines pass arguments straight through in the first four
    /// argument registers of the C calling convention.
    pub const MAX_ARG_REGS: usize = 4;
}

/// Parses and validates a whole table, top to bottom.
///
/// Returns the validated definitions in table order together with the
/// `struct` types they reference. The first defective line aborts.
pub fn parse_table(src: &str) -> Result<ir::SyscallTable> {
    let mut lowering = lowering::Lowering::new();

    for (idx, line) in src.lines().enumerate() {
        let line = line.trim();

        // multi-line definitions are not supported
        if !line.starts_with(DEF_SYSCALL) {
            trace!("line {}: skipped", idx + 1);
            continue;
        }

        let def = parser::Parser::new(line, Span::new(idx + 1, line))?.parse_definition()?;
        lowering.lower(def)?;
    }

    Ok(lowering.finish())
}

/// Parses a table and generates every output for `arch`.
pub fn generate(
    src: &str,
    arch: arch::Arch,
    config: &codegen::Config,
) -> Result<codegen::Artifacts> {
    let table = parse_table(src)?;
    Ok(codegen::emit(&table, arch, config))
}
