//! AST to IR lowering for syscall definitions.
//!
//! This module checks each parsed line against the semantic rules of the
//! table: argument count, allowed types and uniqueness. It translates every
//! type into its FFI form and records the `struct` argument types that the
//! header has to forward declare.

use std::collections::HashMap;

use log::debug;

use super::ast;
use super::constants::MAX_ARG_REGS;
use super::ctype::{CType, TypeError};
use super::ir;
use crate::common::error::{Error, ErrorKind, Result, Span};

/// Incremental lowering of a table, one definition at a time.
#[derive(Debug, Default)]
pub struct Lowering {
    table: ir::SyscallTable,
    names: HashMap<String, usize>,
    numbers: HashMap<u64, String>,
}

impl Lowering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates one definition and appends it to the table.
    ///
    /// # Validation Performed
    /// - At most four arguments, and exactly as many as declared
    /// - Every type is a built-in scalar or an explicit `struct`
    /// - Every type has at most one level of indirection
    /// - Name and number are not used by an earlier line
    pub fn lower(&mut self, def: ast::Definition) -> Result<()> {
        let syscall = lower_definition(def, &mut self.table.structs)?;

        if let Some(line) = self.names.get(&syscall.name) {
            return Err(Error::new(
                ErrorKind::Duplicate,
                format!("syscall '{}' is already defined on line {}", syscall.name, line),
                syscall.span,
            ));
        }
        if let Some(name) = self.numbers.get(&syscall.number) {
            return Err(Error::new(
                ErrorKind::Duplicate,
                format!(
                    "syscall number {} is already used by '{}'",
                    syscall.number_text, name
                ),
                syscall.span,
            ));
        }
        self.names.insert(syscall.name.clone(), syscall.span.line);
        self.numbers.insert(syscall.number, syscall.name.clone());

        debug!(
            "lowered {} = {} ({} args)",
            syscall.name,
            syscall.number,
            syscall.argc()
        );
        self.table.syscalls.push(syscall);
        Ok(())
    }

    pub fn finish(self) -> ir::SyscallTable {
        self.table
    }
}

/// Converts one parsed line into an IR syscall definition.
///
/// # Arguments
/// * `def` - The parsed line
/// * `structs` - Receives every `struct` type used by an argument
///
/// # Returns
/// The validated syscall, or the first arity or type error of the line.
pub fn lower_definition(def: ast::Definition, structs: &mut ir::StructSet) -> Result<ir::Syscall> {
    if def.argc > MAX_ARG_REGS {
        return Err(Error::new(
            ErrorKind::Arity,
            format!(
                "Only syscalls with up to {} arguments are supported.",
                MAX_ARG_REGS
            ),
            def.span,
        ));
    }

    let pieces: Vec<&str> = match &def.args {
        Some(args) => args.split(',').map(str::trim).collect(),
        None => Vec::new(),
    };
    if pieces.len() != def.argc {
        return Err(Error::new(
            ErrorKind::Arity,
            format!(
                "Expected {} syscall arguments, got {}.",
                def.argc,
                pieces.len()
            ),
            def.span,
        ));
    }

    let ret = lower_type(def.ret.trim(), &def.span)?;

    let mut params = Vec::with_capacity(pieces.len());
    for piece in pieces {
        params.push(lower_param(piece, &def.span, structs)?);
    }

    Ok(ir::Syscall {
        span: def.span,
        number: def.number.value,
        number_text: def.number.text,
        name: def.name,
        ret,
        params,
    })
}

/// Splits `void *buf` into the type `void *` and the name `buf`.
fn lower_param(decl: &str, span: &Span, structs: &mut ir::StructSet) -> Result<ir::Param> {
    let name_start = decl
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .map_or(0, |i| i + 1);
    let (ty, name) = decl.split_at(name_start);
    let ty = ty.trim();

    if name.is_empty() || ty.is_empty() {
        return Err(Error::new(
            ErrorKind::Grammar,
            format!(
                "argument declaration {:?} must be a type followed by a name",
                decl
            ),
            span.clone(),
        ));
    }

    let c = parse_type(ty, span)?;
    if c.is_struct {
        structs.insert(c.bare());
    }

    Ok(ir::Param {
        name: name.to_string(),
        decl: decl.to_string(),
        ty: ir::TypeDecl {
            raw: ty.to_string(),
            ffi: c.to_ffi(),
        },
    })
}

fn lower_type(raw: &str, span: &Span) -> Result<ir::TypeDecl> {
    let c = parse_type(raw, span)?;
    Ok(ir::TypeDecl {
        raw: raw.to_string(),
        ffi: c.to_ffi(),
    })
}

/// Parses a type and rejects anything but built-in scalars and explicit
/// `struct` types.
fn parse_type(raw: &str, span: &Span) -> Result<CType> {
    let c = raw
        .parse::<CType>()
        .map_err(|e| type_error(e, span))?;

    // typedefs cannot be forward declared by the generated header
    if !c.is_struct && !c.is_builtin() {
        return Err(type_error(TypeError::Disallowed(c.bare()), span));
    }
    Ok(c)
}

fn type_error(err: TypeError, span: &Span) -> Error {
    let kind = match err {
        TypeError::Empty => ErrorKind::Grammar,
        TypeError::Disallowed(_) => ErrorKind::DisallowedType,
        TypeError::DoubleIndirection(_) | TypeError::Unsupported(_) => ErrorKind::UnsupportedType,
    };
    Error::new(kind, err.to_string(), span.clone())
}
