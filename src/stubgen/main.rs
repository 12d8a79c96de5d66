use argh::FromArgs;
use log::info;
use std::path::PathBuf;
use std::process;

use stubgen::driver::{self, Options};
use stubgen::syscall::codegen::{Config, DEFAULT_STD_INCLUDE};
use stubgen::{Arch, Error};

#[derive(FromArgs)]
#[argh(description = "generate syscall stubs, headers and Rust declarations from a syscall table")]
struct Args {
    #[argh(switch, short = 'v')]
    #[argh(description = "check the syscall table, do not generate any files")]
    verify: bool,

    #[argh(option, short = 'd')]
    #[argh(description = "path to the syscall definitions header")]
    std_header: Option<PathBuf>,

    #[argh(option, short = 's')]
    #[argh(description = "path to the syscall assembly stubs file")]
    stubs_file: Option<PathBuf>,

    #[argh(option, short = 'r')]
    #[argh(description = "path to the Rust declarations file")]
    rust_file: Option<PathBuf>,

    #[argh(option, short = 'a')]
    #[argh(default = "Arch::default()")]
    #[argh(description = "arch of the stub assembly: arm, arm64, x86 or riscv64")]
    arch: Arch,

    #[argh(option, short = 'i')]
    #[argh(default = "String::from(DEFAULT_STD_INCLUDE)")]
    #[argh(description = "header name the stubs file includes")]
    std_include: String,

    #[argh(positional)]
    table: Option<PathBuf>,
}

fn usage() -> String {
    match Args::from_args(&["stubgen"], &["--help"]) {
        Err(early_exit) => early_exit.output,
        Ok(_) => String::new(),
    }
}

/// Missing table, nothing to generate, or a file that could not be
/// read or written.
const EXIT_FAILURE: i32 = 1;
/// The table itself is defective.
const EXIT_BAD_TABLE: i32 = 2;

/// Builds the run options, or `None` when the command line asks for nothing
/// this tool can do.
fn options(args: Args) -> Option<Options> {
    let opts = Options {
        table: args.table?,
        verify: args.verify,
        std_header: args.std_header,
        stubs_file: args.stubs_file,
        rust_file: args.rust_file,
        arch: args.arch,
        config: Config {
            std_include: args.std_include,
        },
    };
    opts.is_runnable().then(|| opts)
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<Error>() {
        Some(_) => EXIT_BAD_TABLE,
        None => EXIT_FAILURE,
    }
}

/// Runs one generation and reports the outcome.
///
/// # Returns
/// The process exit status: 0 on success, [`EXIT_BAD_TABLE`] for a table
/// defect and [`EXIT_FAILURE`] for everything else.
fn run(opts: &Options) -> i32 {
    match driver::process_table(opts) {
        Ok(summary) => {
            info!(
                "{}: {} syscalls, {} files written",
                opts.table.display(),
                summary.syscalls,
                summary.written.len()
            );
            0
        }
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(table_err) => eprintln!("{}", table_err),
                None => eprintln!("stubgen: {:#}", err),
            }
            exit_code(&err)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Args = argh::from_env();

    let opts = match options(args) {
        Some(opts) => opts,
        None => {
            eprintln!("{}", usage());
            process::exit(EXIT_FAILURE);
        }
    };

    process::exit(run(&opts));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;
    use stubgen::common::error::Span;
    use stubgen::ErrorKind;

    fn parse(args: &[&str]) -> Args {
        match Args::from_args(&["stubgen"], args) {
            Ok(args) => args,
            Err(early_exit) => panic!("{}", early_exit.output),
        }
    }

    #[test]
    fn test_options_need_table_and_output() {
        assert!(options(parse(&[])).is_none());
        assert!(options(parse(&["-d", "syscalls.h"])).is_none());
        assert!(options(parse(&["-r", "syscalls.rs", "table.h"])).is_none());

        let opts = options(parse(&["-v", "table.h"])).unwrap();
        assert!(opts.verify);
        let opts = options(parse(&["-s", "syscalls.S", "-a", "x86", "table.h"])).unwrap();
        assert_eq!(opts.arch, Arch::X86);
        assert_eq!(opts.config.std_include, DEFAULT_STD_INCLUDE);
    }

    #[test]
    fn test_unknown_arch_rejected() {
        assert!(Args::from_args(&["stubgen"], &["-a", "mips", "-v", "table.h"]).is_err());
    }

    #[test]
    fn test_exit_code() {
        let table_err = Error::new(
            ErrorKind::Arity,
            "Expected 2 syscall arguments, got 1.",
            Span::new(3, "DEF_SYSCALL(1, x, int, 2, int a)"),
        );
        assert_eq!(exit_code(&anyhow::Error::new(table_err)), EXIT_BAD_TABLE);

        let io_err = anyhow::Error::new(io::Error::new(io::ErrorKind::NotFound, "gone"))
            .context("failed to read syscall table table.h");
        assert_eq!(exit_code(&io_err), EXIT_FAILURE);
    }

    #[test]
    fn test_run_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.h");
        let bad = dir.path().join("bad.h");
        fs::write(&good, "DEF_SYSCALL(0x9, exit, void, 0)\n").unwrap();
        fs::write(&bad, "DEF_SYSCALL(0x9, exit, void, 1)\n").unwrap();

        let mut opts = Options {
            table: good,
            verify: true,
            ..Options::default()
        };
        assert_eq!(run(&opts), 0);

        opts.verify = false;
        opts.std_header = Some(dir.path().join("syscalls.h"));
        assert_eq!(run(&opts), 0);
        assert!(dir.path().join("syscalls.h").exists());

        opts.table = bad;
        assert_eq!(run(&opts), EXIT_BAD_TABLE);

        opts.table = dir.path().join("missing.h");
        assert_eq!(run(&opts), EXIT_FAILURE);
    }
}
