//! C declaration parsing and translation to Rust FFI types.
//!
//! Syscall tables spell argument and return types the way a C header would.
//! This module understands the small subset of C declarators the tables may
//! use (`[const] [struct] <base> [*]`) and turns them into the matching
//! `extern "C"` spelling.

use core::fmt;
use std::str::FromStr;

/// Scalar types that may be used without a `struct` qualifier.
///
/// Anything else must be an explicit `struct` type, because typedefs cannot
/// be forward declared by the generated header.
pub const BUILTIN_TYPES: &[&str] = &[
    "char", "int", "long", "void", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t",
    "uint16_t", "uint32_t", "uint64_t",
];

/// Failure to parse or translate a C declarator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Nothing but whitespace was given.
    Empty,
    /// More than one pointer marker, e.g. `char **`.
    DoubleIndirection(String),
    /// Qualifiers or tokens in an order the grammar does not cover,
    /// e.g. `struct foo * const`.
    Unsupported(String),
    /// Neither a built-in scalar nor an explicit `struct`, e.g. `size_t`
    /// or `unsigned int`. Carries the type without pointer and `const`.
    Disallowed(String),
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::Empty => write!(f, "missing type"),
            TypeError::DoubleIndirection(raw) => write!(
                f,
                "FFI translation does not handle double indirection in type: {:?}",
                raw
            ),
            TypeError::Unsupported(raw) => write!(
                f,
                "unsupported declarator {:?}: expected [const] [struct] <type> [*]",
                raw
            ),
            TypeError::Disallowed(bare) => write!(
                f,
                "Not an integer type or explicit struct type: {:?}. Don't use typedefs.",
                bare
            ),
        }
    }
}

/// A parsed C declarator without its argument name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CType {
    /// Leading `const` qualifier
    pub is_const: bool,
    /// Leading `struct` qualifier
    pub is_struct: bool,
    /// Base type token, e.g. `int` or `path` in `struct path`
    pub base: String,
    /// Trailing `*`
    pub is_ptr: bool,
}

impl CType {
    /// The type with pointer and `const` stripped, `struct` kept.
    ///
    /// This is the spelling used for built-in checks and forward declarations.
    pub fn bare(&self) -> String {
        if self.is_struct {
            format!("struct {}", self.base)
        } else {
            self.base.clone()
        }
    }

    pub fn is_builtin(&self) -> bool {
        !self.is_struct && BUILTIN_TYPES.contains(&self.base.as_str())
    }

    /// Translates to the FFI form.
    pub fn to_ffi(&self) -> FfiType {
        let ptr = match (self.is_ptr, self.is_const) {
            (false, _) => None,
            (true, true) => Some(Mutability::Const),
            (true, false) => Some(Mutability::Mut),
        };
        FfiType {
            ptr,
            base: self.base.clone(),
        }
    }
}

impl FromStr for CType {
    type Err = TypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let spaced = raw.replace('*', " * ");
        let mut tokens = spaced.split_whitespace().peekable();

        let is_const = tokens.next_if_eq(&"const").is_some();
        let is_struct = tokens.next_if_eq(&"struct").is_some();

        let base = match tokens.next() {
            None if !is_const && !is_struct => return Err(TypeError::Empty),
            Some(tok) if is_word(tok) && tok != "const" && tok != "struct" => tok.to_string(),
            _ => return Err(TypeError::Unsupported(raw.trim().to_string())),
        };

        // `unsigned int`, `long long`: C spells these, the table may not
        let mut words = vec![base.as_str()];
        while let Some(tok) = tokens.next_if(|tok| is_word(tok) && *tok != "const") {
            words.push(tok);
        }

        let mut stars = 0;
        while tokens.next_if_eq(&"*").is_some() {
            stars += 1;
        }
        if tokens.peek().is_some() {
            return Err(TypeError::Unsupported(raw.trim().to_string()));
        }
        if words.len() > 1 {
            let prefix = if is_struct { "struct " } else { "" };
            return Err(TypeError::Disallowed(format!("{}{}", prefix, words.join(" "))));
        }
        if stars > 1 {
            return Err(TypeError::DoubleIndirection(raw.trim().to_string()));
        }

        Ok(Self {
            is_const,
            is_struct,
            base,
            is_ptr: stars == 1,
        })
    }
}

fn is_word(tok: &str) -> bool {
    !tok.is_empty() && tok.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Pointer mutability in the FFI form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Const,
    Mut,
}

/// A type as it appears in the generated `extern "C"` block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FfiType {
    /// `Some` for raw pointers
    pub ptr: Option<Mutability>,
    /// Base type name, without `struct`
    pub base: String,
}

impl fmt::Display for FfiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(Mutability::Const) => write!(f, "*const {}", self.base),
            Some(Mutability::Mut) => write!(f, "*mut {}", self.base),
            None => write!(f, "{}", self.base),
        }
    }
}

/// Translates one C type declaration into its FFI form.
///
/// # Arguments
/// * `raw` - The type as written in the table, e.g. `const struct path *`
///
/// # Returns
/// The `extern "C"` spelling. `const` is kept only on pointers and
/// `struct` is dropped, so `const struct path *` becomes `*const path`.
pub fn translate(raw: &str) -> Result<FfiType, TypeError> {
    raw.parse::<CType>().map(|ty| ty.to_ffi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar() {
        let ty = translate("int").unwrap();
        assert_eq!(ty.ptr, None);
        assert_eq!(ty.to_string(), "int");
    }

    #[test]
    fn test_mut_pointer() {
        assert_eq!(translate("void *").unwrap().to_string(), "*mut void");
        assert_eq!(translate("void*").unwrap().to_string(), "*mut void");
    }

    #[test]
    fn test_const_struct_pointer() {
        let ty = translate("const struct path *").unwrap();
        assert_eq!(ty.ptr, Some(Mutability::Const));
        assert_eq!(ty.to_string(), "*const path");
    }

    #[test]
    fn test_const_without_pointer() {
        assert_eq!(translate("const int").unwrap().to_string(), "int");
    }

    #[test]
    fn test_struct_by_value() {
        let ty: CType = "struct  timespec".parse().unwrap();
        assert_eq!(ty.bare(), "struct timespec");
        assert_eq!(ty.to_ffi().to_string(), "timespec");
    }

    #[test]
    fn test_double_indirection() {
        assert_eq!(
            translate("char **"),
            Err(TypeError::DoubleIndirection("char **".to_string()))
        );
        assert!(matches!(
            translate("const struct iovec * *"),
            Err(TypeError::DoubleIndirection(_))
        ));
    }

    #[test]
    fn test_trailing_const_unsupported() {
        assert!(matches!(
            translate("struct foo * const"),
            Err(TypeError::Unsupported(_))
        ));
        assert!(matches!(translate("int const"), Err(TypeError::Unsupported(_))));
    }

    #[test]
    fn test_empty() {
        assert_eq!(translate("   "), Err(TypeError::Empty));
        assert!(matches!(translate("const"), Err(TypeError::Unsupported(_))));
    }

    #[test]
    fn test_builtin() {
        assert!("uint64_t".parse::<CType>().unwrap().is_builtin());
        assert!(!"size_t".parse::<CType>().unwrap().is_builtin());
        assert!(!"struct int".parse::<CType>().unwrap().is_builtin());
    }

    #[test]
    fn test_multi_word_base_disallowed() {
        assert_eq!(
            translate("unsigned int"),
            Err(TypeError::Disallowed("unsigned int".to_string()))
        );
        assert_eq!(
            translate("const unsigned long *"),
            Err(TypeError::Disallowed("unsigned long".to_string()))
        );
        assert_eq!(
            translate("struct foo bar"),
            Err(TypeError::Disallowed("struct foo bar".to_string()))
        );
        assert!(matches!(translate("long long * const"), Err(TypeError::Unsupported(_))));
    }
}
