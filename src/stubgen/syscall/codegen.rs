//! Code generation for syscall tables.
//!
//! This module implements the final phase of table processing, turning the
//! validated IR into the text of the generated files:
//! - the definitions header (`__NR_*` numbers and `__sys_*` prototypes)
//! - the assembly stubs (one trampoline per syscall)
//! - the Rust `extern "C"` declarations
//!
//! All three are built from the same IR in one pass, so they always agree.

use super::arch::Arch;
use super::ir;

/// Header included by the stubs file when none is configured.
pub const DEFAULT_STD_INCLUDE: &str = "compat_syscalls.h";

const COPYRIGHT_HEADER: &str = "/*
 * Copyright (c) The stubgen Authors. All Rights Reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining
 * a copy of this software and associated documentation files
 * (the \"Software\"), to deal in the Software without restriction,
 * including without limitation the rights to use, copy, modify, merge,
 * publish, distribute, sublicense, and/or sell copies of the Software,
 * and to permit persons to whom the Software is furnished to do so,
 * subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be
 * included in all copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND,
 * EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
 * MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
 * IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY
 * CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
 * TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE
 * SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 */
";

const AUTOGEN_HEADER: &str = "
/* This file is auto-generated. !!! DO NOT EDIT !!! */

";

const CLANG_FORMAT_OFF: &str = "/* clang-format off */\n\n";

const ASM_IFDEF: &str = "\n#ifndef ASSEMBLY\n";
const ASM_ENDIF: &str = "\n#endif\n";

const BEGIN_CDECLS: &str = "\n__BEGIN_CDECLS\n";
const END_CDECLS: &str = "\n__END_CDECLS\n";

const BEGIN_RUST: &str = "extern \"C\" {\n";
const END_RUST: &str = "}\n";

/// Options that shape the boilerplate around the generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name the stubs file uses to `#include` the definitions header
    pub std_include: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            std_include: DEFAULT_STD_INCLUDE.to_string(),
        }
    }
}

/// Text accumulated per syscall, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffers {
    /// `#define __NR_<name> <number>` lines
    pub defines: String,
    /// `<rt> __sys_<name>(<args>);` lines
    pub protos: String,
    /// Assembly trampolines
    pub stubs: String,
    /// `pub fn __sys_<name>(...) -> <rt>;` lines
    pub rust: String,
}

/// Contents of the generated files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    /// Definitions header: `__NR_*` numbers, forward declarations and
    /// `__sys_*` prototypes
    pub header: String,
    /// Assembly trampolines for the selected architecture
    pub stubs: String,
    /// `extern "C"` block declaring every `__sys_*` function
    pub rust: String,
}

/// Builds the generated files from syscalls pushed in table order.
#[derive(Debug)]
pub struct Generator {
    arch: Arch,
    buffers: Buffers,
}

impl Generator {
    /// Creates a generator with empty buffers for `arch`.
    pub fn new(arch: Arch) -> Self {
        Self {
            arch,
            buffers: Buffers {
                protos: "\n".to_string(),
                ..Buffers::default()
            },
        }
    }

    /// Appends one syscall to every buffer.
    pub fn push(&mut self, syscall: &ir::Syscall) {
        self.buffers.defines.push_str(&emit_define(syscall));
        self.buffers.protos.push_str(&emit_proto(syscall));
        self.buffers.stubs.push_str(&self.arch.emit_stub(&syscall.name));
        self.buffers.rust.push_str(&emit_rust_proto(syscall));
    }

    /// Wraps the buffers in the fixed boilerplate of each file.
    pub fn finish(self, structs: &ir::StructSet, config: &Config) -> Artifacts {
        Artifacts {
            header: emit_header(&self.buffers, structs),
            stubs: emit_stubs(&self.buffers, self.arch, config),
            rust: emit_rust(&self.buffers),
        }
    }
}

/// Generates all files for a validated table.
///
/// # Arguments
/// * `table` - Validated definitions and their `struct` argument types
/// * `arch` - Architecture whose trampoline template fills the stubs file
/// * `config` - Boilerplate settings
///
/// # Returns
/// The text of all three files. The same input always yields the same text.
pub fn emit(table: &ir::SyscallTable, arch: Arch, config: &Config) -> Artifacts {
    let mut generator = Generator::new(arch);
    for syscall in &table.syscalls {
        generator.push(syscall);
    }
    generator.finish(&table.structs, config)
}

fn emit_define(syscall: &ir::Syscall) -> String {
    format!("#define __NR_{}\t\t{}\n", syscall.name, syscall.number_text)
}

fn emit_proto(syscall: &ir::Syscall) -> String {
    format!(
        "{} __sys_{}({});\n",
        syscall.ret.raw,
        syscall.name,
        syscall.c_args()
    )
}

fn emit_rust_proto(syscall: &ir::Syscall) -> String {
    format!(
        "    pub fn __sys_{}({}) -> {};\n",
        syscall.name,
        syscall.ffi_args(),
        syscall.ret.ffi
    )
}

fn emit_include(path: &str) -> String {
    format!("#include <{}>\n", path)
}

fn emit_preamble(out: &mut String) {
    out.push_str(COPYRIGHT_HEADER);
    out.push_str(AUTOGEN_HEADER);
}

/// The header is included from assembly too, so everything but the
/// `#define`s sits behind `#ifndef ASSEMBLY`.
fn emit_header(buffers: &Buffers, structs: &ir::StructSet) -> String {
    let mut out = String::new();
    emit_preamble(&mut out);
    out.push_str(CLANG_FORMAT_OFF);
    out.push_str(&buffers.defines);
    out.push_str(ASM_IFDEF);
    out.push('\n');
    out.push_str(&emit_include("kern/compiler.h"));
    out.push_str(&emit_include("stdint.h"));
    out.push_str(BEGIN_CDECLS);
    out.push('\n');
    for name in structs.iter() {
        out.push_str(name);
        out.push_str(";\n");
    }
    out.push_str(&buffers.protos);
    out.push_str(END_CDECLS);
    out.push_str(ASM_ENDIF);
    out
}

fn emit_stubs(buffers: &Buffers, arch: Arch, config: &Config) -> String {
    let mut out = String::new();
    emit_preamble(&mut out);
    out.push_str(&emit_include("kern/asm.h"));
    out.push_str(&emit_include(&config.std_include));
    out.push_str(&buffers.stubs);
    out.push_str(arch.footer().unwrap_or(""));
    out
}

fn emit_rust(buffers: &Buffers) -> String {
    let mut out = String::new();
    emit_preamble(&mut out);
    out.push_str(BEGIN_RUST);
    out.push_str(&buffers.rust);
    out.push_str(END_RUST);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syscall::parse_table;

    const TABLE: &str = "\
/* syscall table */
DEF_SYSCALL(0x3, read, int, 3, int fd, void *buf, int size)
DEF_SYSCALL(0x5, open, int, 2, const struct path *p, int flags)
DEF_SYSCALL(0x6, stat, int, 2, const struct path *p, struct stat *st)
DEF_SYSCALL(0x9, exit, void, 0)
";

    fn artifacts(arch: Arch) -> Artifacts {
        emit(&parse_table(TABLE).unwrap(), arch, &Config::default())
    }

    #[test]
    fn test_header_defines() {
        let header = artifacts(Arch::Arm).header;
        assert!(header.contains("#define __NR_read\t\t0x3\n"));
        assert!(header.contains("#define __NR_exit\t\t0x9\n"));
        assert_eq!(header.matches("#define __NR_").count(), 4);
    }

    #[test]
    fn test_header_protos() {
        let header = artifacts(Arch::Arm).header;
        assert!(header.contains("int __sys_read(int fd, void *buf, int size);\n"));
        assert!(header.contains("void __sys_exit(void);\n"));
    }

    #[test]
    fn test_header_layout() {
        let header = artifacts(Arch::Arm).header;
        assert!(header.starts_with("/*\n * Copyright"));
        assert!(header.contains("/* This file is auto-generated. !!! DO NOT EDIT !!! */"));

        let ifndef = header.find("#ifndef ASSEMBLY").unwrap();
        let last_define = header.rfind("#define").unwrap();
        let begin = header.find("__BEGIN_CDECLS").unwrap();
        let end = header.find("__END_CDECLS").unwrap();
        let first_proto = header.find("__sys_").unwrap();
        assert!(last_define < ifndef);
        assert!(ifndef < begin && begin < first_proto && first_proto < end);
        assert!(header.ends_with("\n__END_CDECLS\n\n#endif\n"));
    }

    #[test]
    fn test_struct_forward_declarations() {
        let header = artifacts(Arch::Arm).header;
        assert_eq!(header.matches("struct path;\n").count(), 1);
        let path = header.find("struct path;\n").unwrap();
        let stat = header.find("struct stat;\n").unwrap();
        let open = header.find("__sys_open(").unwrap();
        assert!(path < stat && stat < open);
    }

    #[test]
    fn test_stubs() {
        let stubs = artifacts(Arch::Arm).stubs;
        assert!(stubs.contains("#include <kern/asm.h>\n#include <compat_syscalls.h>\n"));
        let read = stubs.find("FUNCTION(__sys_read)").unwrap();
        let exit = stubs.find("FUNCTION(__sys_exit)").unwrap();
        assert!(read < exit);
        assert!(stubs.ends_with(".size __sys_exit,.-__sys_exit\n"));
    }

    #[test]
    fn test_stubs_footer_and_include() {
        let config = Config {
            std_include: "lib/syscalls.h".to_string(),
        };
        let out = emit(&parse_table(TABLE).unwrap(), Arch::Arm64, &config);
        assert!(out.stubs.contains("#include <lib/syscalls.h>\n"));
        assert!(out.stubs.ends_with(".size __sys_exit,.-__sys_exit\n\n"));
    }

    #[test]
    fn test_rust() {
        let rust = artifacts(Arch::Arm).rust;
        assert!(rust.contains("extern \"C\" {\n"));
        assert!(rust.contains("    pub fn __sys_read(fd: int, buf: *mut void, size: int) -> int;\n"));
        assert!(rust.contains("    pub fn __sys_open(p: *const path, flags: int) -> int;\n"));
        assert!(rust.contains("    pub fn __sys_exit() -> void;\n"));
        assert!(rust.ends_with("}\n"));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(artifacts(Arch::X86), artifacts(Arch::X86));
    }

    #[test]
    fn test_empty_table() {
        let out = emit(&parse_table("").unwrap(), Arch::Arm, &Config::default());
        assert!(!out.header.contains("#define"));
        assert!(out.rust.ends_with("extern \"C\" {\n}\n"));
    }
}
