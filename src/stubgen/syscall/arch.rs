//! Architecture-specific trampoline templates.
//!
//! Each supported architecture carries one assembly template for the
//! `__sys_<name>` trampoline, and optionally a footer appended once at the
//! end of the stubs file. A template is parameterized solely by the syscall
//! name: every occurrence of `{sys_fn}` is replaced by it.
//!
//! The trampolines load `__NR_<name>` (defined by the generated header)
//! into the syscall number register and enter the kernel. Arguments are
//! already in place according to the C calling convention.

use core::fmt;
use std::str::FromStr;

/// Placeholder replaced by the syscall name in every template.
pub const SYS_FN: &str = "{sys_fn}";

/// ARM (A32): number in r12, `svc #0`, return via `bx lr`.
const ARM_STUB: &str = "
.section .text.__sys_{sys_fn}
.arm
.balign 4
FUNCTION(__sys_{sys_fn})
    ldr     r12, =__NR_{sys_fn}
    svc     #0
    bx      lr
.size __sys_{sys_fn},.-__sys_{sys_fn}
";

// `mov` rather than `ldr`: the assembler always turns `ldr x12, =imm` into a
// constant pool load, and `mov` covers the range of syscall numbers in use.
const ARM64_STUB: &str = "
.section .text.__sys_{sys_fn}
.balign 4
FUNCTION(__sys_{sys_fn})
    mov     x12, #__NR_{sys_fn}
    svc     #0
    ret
.size __sys_{sys_fn},.-__sys_{sys_fn}
";

const ARM64_FOOTER: &str = "\n";

/// x86_64: `sysenter` returns to the address in rbx with the stack in rbp,
/// so both are saved along with flags and r15.
const X86_STUB: &str = "
.global __sys_{sys_fn}
.type __sys_{sys_fn},STT_FUNC
__sys_{sys_fn}:
    pushfq
    pushq %rbp
    pushq %rbx
    pushq %r15
    movq $__NR_{sys_fn}, %rax
    leaq .L{sys_fn}_sysreturn(%rip), %rbx
    movq %rsp, %rbp
    sysenter
.L{sys_fn}_sysreturn:
    popq %r15
    popq %rbx
    popq %rbp
    popfq
    ret
.size __sys_{sys_fn},.-__sys_{sys_fn}
";

/// RISC-V 64: number in a7, `ecall`, arguments stay in a0-a3.
const RISCV64_STUB: &str = "
.section .text.__sys_{sys_fn}
.balign 4
FUNCTION(__sys_{sys_fn})
    li      a7, __NR_{sys_fn}
    ecall
    ret
.size __sys_{sys_fn},.-__sys_{sys_fn}
";

/// Target architecture of the generated stubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Arch {
    #[default]
    Arm,
    Arm64,
    X86,
    Riscv64,
}

impl Arch {
    /// Every supported architecture, in the order shown in help text.
    pub const ALL: [Arch; 4] = [Arch::Arm, Arch::Arm64, Arch::X86, Arch::Riscv64];

    /// Name accepted by `--arch`.
    pub fn name(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::Riscv64 => "riscv64",
        }
    }

    pub fn stub_template(self) -> &'static str {
        match self {
            Arch::Arm => ARM_STUB,
            Arch::Arm64 => ARM64_STUB,
            Arch::X86 => X86_STUB,
            Arch::Riscv64 => RISCV64_STUB,
        }
    }

    pub fn footer(self) -> Option<&'static str> {
        match self {
            Arch::Arm64 => Some(ARM64_FOOTER),
            Arch::Arm | Arch::X86 | Arch::Riscv64 => None,
        }
    }

    /// Instantiates the trampoline for one syscall.
    pub fn emit_stub(self, sys_fn: &str) -> String {
        self.stub_template().replace(SYS_FN, sys_fn)
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An `--arch` value outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownArch(pub String);

impl fmt::Display for UnknownArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Arch::ALL.iter().map(|a| a.name()).collect();
        write!(
            f,
            "unknown architecture {:?}, expected one of: {}",
            self.0,
            names.join(", ")
        )
    }
}

impl std::error::Error for UnknownArch {}

impl FromStr for Arch {
    type Err = UnknownArch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Arch::ALL
            .iter()
            .copied()
            .find(|arch| arch.name() == s)
            .ok_or_else(|| UnknownArch(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("arm".parse::<Arch>(), Ok(Arch::Arm));
        assert_eq!("arm64".parse::<Arch>(), Ok(Arch::Arm64));
        assert_eq!("x86".parse::<Arch>(), Ok(Arch::X86));
        assert_eq!("riscv64".parse::<Arch>(), Ok(Arch::Riscv64));
        let err = "mips".parse::<Arch>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown architecture \"mips\", expected one of: arm, arm64, x86, riscv64"
        );
    }

    #[test]
    fn test_default_is_arm() {
        assert_eq!(Arch::default(), Arch::Arm);
    }

    #[test]
    fn test_templates_fully_substituted() {
        for arch in Arch::ALL {
            let stub = arch.emit_stub("read");
            assert!(!stub.contains(SYS_FN), "{} left a placeholder", arch);
            assert!(stub.contains("__NR_read"));
            assert!(stub.contains(".size __sys_read,.-__sys_read"));
        }
    }

    #[test]
    fn test_arm_stub() {
        let stub = Arch::Arm.emit_stub("write");
        assert!(stub.contains("FUNCTION(__sys_write)"));
        assert!(stub.contains("    ldr     r12, =__NR_write\n    svc     #0\n    bx      lr\n"));
    }

    #[test]
    fn test_x86_stub() {
        let stub = Arch::X86.emit_stub("read");
        assert!(stub.contains("__sys_read:\n"));
        assert!(stub.contains("    movq $__NR_read, %rax\n"));
        assert!(stub.contains("    leaq .Lread_sysreturn(%rip), %rbx\n"));
        assert!(stub.contains(".Lread_sysreturn:\n"));
    }

    #[test]
    fn test_footer() {
        assert_eq!(Arch::Arm64.footer(), Some("\n"));
        assert_eq!(Arch::Arm.footer(), None);
    }
}
