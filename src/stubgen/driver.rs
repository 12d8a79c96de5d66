//! Reads a syscall table and writes the requested generated files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bitflags::bitflags;
use log::{info, warn};

use crate::syscall::arch::Arch;
use crate::syscall::codegen::{self, Config};
use crate::syscall::{parse_table, DEF_SYSCALL};

bitflags! {
    /// Generated files requested by the caller.
    pub struct Outputs: u8 {
        const HEADER = 1 << 0;
        const STUBS = 1 << 1;
        const RUST = 1 << 2;
    }
}

/// One generation run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Syscall table to read
    pub table: PathBuf,
    /// Check the table only, write nothing
    pub verify: bool,
    /// Destination of the definitions header
    pub std_header: Option<PathBuf>,
    /// Destination of the assembly stubs
    pub stubs_file: Option<PathBuf>,
    /// Destination of the Rust declarations
    pub rust_file: Option<PathBuf>,
    /// Architecture of the assembly stubs
    pub arch: Arch,
    pub config: Config,
}

impl Options {
    /// Files requested by the `*_file`/`std_header` paths.
    pub fn outputs(&self) -> Outputs {
        let mut outputs = Outputs::empty();
        outputs.set(Outputs::HEADER, self.std_header.is_some());
        outputs.set(Outputs::STUBS, self.stubs_file.is_some());
        outputs.set(Outputs::RUST, self.rust_file.is_some());
        outputs
    }

    /// Outside verify mode at least the header or the stubs must be asked for.
    pub fn is_runnable(&self) -> bool {
        self.verify || self.outputs().intersects(Outputs::HEADER | Outputs::STUBS)
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    /// Number of syscalls in the table
    pub syscalls: usize,
    /// Files written, in header, stubs, Rust order
    pub written: Vec<PathBuf>,
}

/// Processes the table described by `opts`.
///
/// The whole table is validated before anything is written.
///
/// # Arguments
/// * `opts` - Table path, requested outputs and generation settings
///
/// # Returns
/// What was validated and written. A table defect is returned as a
/// [`crate::Error`] inside the `anyhow::Error`, so callers can tell it apart
/// from I/O failures with `downcast_ref`.
pub fn process_table(opts: &Options) -> Result<Summary> {
    let src = fs::read_to_string(&opts.table)
        .with_context(|| format!("failed to read syscall table {}", opts.table.display()))?;

    let table = parse_table(&src)?;
    if table.is_empty() {
        warn!("{}: no {} lines found", opts.table.display(), DEF_SYSCALL);
    }

    if opts.verify {
        info!(
            "{}: {} syscalls verified",
            opts.table.display(),
            table.len()
        );
        return Ok(Summary {
            syscalls: table.len(),
            written: Vec::new(),
        });
    }

    let artifacts = codegen::emit(&table, opts.arch, &opts.config);

    let mut written = Vec::new();
    let files = [
        (&opts.std_header, &artifacts.header),
        (&opts.stubs_file, &artifacts.stubs),
        (&opts.rust_file, &artifacts.rust),
    ];
    for (path, contents) in files {
        if let Some(path) = path {
            write_file(path, contents)?;
            written.push(path.clone());
        }
    }

    Ok(Summary {
        syscalls: table.len(),
        written,
    })
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}
