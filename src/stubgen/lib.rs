//! Generator for syscall numbers, prototypes, assembly stubs and Rust FFI
//! declarations, all driven by a single syscall table.

pub mod common;
pub mod driver;
pub mod syscall;

pub use common::error::{Error, ErrorKind, Result};
pub use syscall::arch::Arch;
