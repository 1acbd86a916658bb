//! Names of primitive native types in both output dialects.
//!
//! Each [`TypeName`] carries a portable C spelling (`unsigned short`), a Windows SDK spelling
//! (`WORD`), a size and the prefix the Windows SDK uses for pointer aliases (`LPWORD`).

use std::borrow::Cow;

use super::unmanaged::UnmanagedType;
use crate::output::{CodePrinter, OutputType, PrintFlags};

/// Prefix of the Windows SDK pointer alias of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PtrPrefix {
    /// No alias exists; pointers are spelled with `*`
    None,
    /// `P` prefix (`PCHAR`)
    P,
    /// `LP` prefix (`LPWORD`)
    LP,
}

/// Name and size of a primitive native type.
///
/// Sizes are encoded as follows: a positive value is a byte size, `-1` stands for the platform
/// pointer size, and any other negative value `-(n + (b << 8))` stands for `n` pointers plus
/// `b` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName {
    plain_c: Cow<'static, str>,
    win_api: Cow<'static, str>,
    size: i32,
    prefix: PtrPrefix,
}

const fn name(plain_c: &'static str, win_api: &'static str, size: i32, prefix: PtrPrefix) -> TypeName {
    TypeName {
        plain_c: Cow::Borrowed(plain_c),
        win_api: Cow::Borrowed(win_api),
        size,
        prefix,
    }
}

#[allow(missing_docs)]
impl TypeName {
    pub const I1: TypeName = name("char", "CHAR", 1, PtrPrefix::P);
    pub const U1: TypeName = name("unsigned char", "BYTE", 1, PtrPrefix::LP);
    pub const I1_BOOL: TypeName = name("bool", "CHAR", 1, PtrPrefix::P);
    pub const U1_BOOL: TypeName = name("bool", "BYTE", 1, PtrPrefix::LP);
    pub const I2: TypeName = name("short", "SHORT", 2, PtrPrefix::LP);
    pub const U2: TypeName = name("unsigned short", "WORD", 2, PtrPrefix::LP);
    pub const I4: TypeName = name("int", "INT", 4, PtrPrefix::LP);
    pub const U4: TypeName = name("unsigned int", "UINT", 4, PtrPrefix::LP);
    pub const I8: TypeName = name("__int64", "LONG64", 8, PtrPrefix::LP);
    pub const U8: TypeName = name("unsigned __int64", "ULONG64", 8, PtrPrefix::LP);

    pub const R4: TypeName = name("float", "FLOAT", 4, PtrPrefix::LP);
    pub const R8: TypeName = name("double", "DOUBLE", 8, PtrPrefix::None);

    pub const VOID: TypeName = name("void", "VOID", 0, PtrPrefix::LP);
    pub const UCHAR: TypeName = name("unsigned char", "UCHAR", 1, PtrPrefix::LP);
    pub const WCHAR: TypeName = name("wchar_t", "WCHAR", 2, PtrPrefix::LP);
    pub const TCHAR_A: TypeName = name("char", "TCHAR", 1, PtrPrefix::LP);
    pub const TCHAR_W: TypeName = name("wchar_t", "TCHAR", 2, PtrPrefix::LP);

    pub const BSTR: TypeName = name("wchar_t *", "BSTR", -1, PtrPrefix::None);
    pub const ANSI_BSTR: TypeName = name("char *", "PCHAR", -1, PtrPrefix::None);
    pub const TBSTR_A: TypeName = name("char *", "PTCHAR", -1, PtrPrefix::None);
    pub const TBSTR_W: TypeName = name("wchar_t *", "PTCHAR", -1, PtrPrefix::None);

    pub const LPSTR: TypeName = name("char *", "LPSTR", -1, PtrPrefix::None);
    pub const LPCSTR: TypeName = name("const char *", "LPCSTR", -1, PtrPrefix::None);
    pub const LPWSTR: TypeName = name("wchar_t *", "LPWSTR", -1, PtrPrefix::None);
    pub const LPCWSTR: TypeName = name("const wchar_t *", "LPCWSTR", -1, PtrPrefix::None);
    pub const LPTSTR_A: TypeName = name("char *", "LPTSTR", -1, PtrPrefix::None);
    pub const LPTSTR_W: TypeName = name("wchar_t *", "LPTSTR", -1, PtrPrefix::None);
    pub const LPCTSTR_A: TypeName = name("const char *", "LPCTSTR", -1, PtrPrefix::None);
    pub const LPCTSTR_W: TypeName = name("const wchar_t *", "LPCTSTR", -1, PtrPrefix::None);

    pub const BOOL: TypeName = name("int", "BOOL", 4, PtrPrefix::LP);
    pub const VARIANT_BOOL: TypeName = name("short", "VARIANT_BOOL", 2, PtrPrefix::None);
    pub const VARIANT_BOOL_BOOL: TypeName = name("bool", "VARIANT_BOOL", 2, PtrPrefix::None);
    pub const CURRENCY: TypeName = name("__int64", "CURRENCY", 8, PtrPrefix::None);
    pub const DECIMAL: TypeName = name("DECIMAL", "DECIMAL", 16, PtrPrefix::None);
    pub const ERROR: TypeName = name("long", "HRESULT", 4, PtrPrefix::None);
    pub const OLE_COLOR: TypeName = name("unsigned long", "OLE_COLOR", 4, PtrPrefix::LP);
    pub const SAFEARRAY: TypeName = name("SAFEARRAY", "SAFEARRAY", -(2 + (16 << 8)), PtrPrefix::LP);
    pub const VARIANT: TypeName = name("VARIANT", "VARIANT", -(2 + (8 << 8)), PtrPrefix::LP);
    pub const DATE: TypeName = name("double", "DATE", 8, PtrPrefix::LP);
    pub const GUID: TypeName = name("GUID", "GUID", 16, PtrPrefix::LP);
    pub const HANDLE: TypeName = name("void *", "HANDLE", -1, PtrPrefix::LP);
    pub const VA_LIST: TypeName = name("va_list", "va_list", -1, PtrPrefix::LP);

    pub const IDISPATCH: TypeName = name("IDispatch *", "IDispatch *", -1, PtrPrefix::None);
    pub const IUNKNOWN: TypeName = name("IUnknown *", "IUnknown *", -1, PtrPrefix::None);
    pub const IENUM_VARIANT: TypeName = name("IEnumVARIANT *", "IEnumVARIANT *", -1, PtrPrefix::None);
    pub const ARRAY: TypeName = name("_Array *", "_Array *", -1, PtrPrefix::None);
}

impl TypeName {
    /// Creates a name that is spelled the same in both dialects and has no pointer alias.
    #[must_use]
    pub fn custom(name: impl Into<String>, size: i32) -> TypeName {
        let name = name.into();
        TypeName {
            plain_c: Cow::Owned(name.clone()),
            win_api: Cow::Owned(name),
            size,
            prefix: PtrPrefix::None,
        }
    }

    /// Returns the name of a primitive representation, if it has one.
    #[must_use]
    pub fn for_unmanaged(unmanaged: UnmanagedType) -> Option<TypeName> {
        match unmanaged {
            UnmanagedType::I1 => Some(TypeName::I1),
            UnmanagedType::I2 => Some(TypeName::I2),
            UnmanagedType::I4 => Some(TypeName::I4),
            UnmanagedType::I8 => Some(TypeName::I8),
            UnmanagedType::U1 => Some(TypeName::U1),
            UnmanagedType::U2 => Some(TypeName::U2),
            UnmanagedType::U4 => Some(TypeName::U4),
            UnmanagedType::U8 => Some(TypeName::U8),
            UnmanagedType::R4 => Some(TypeName::R4),
            UnmanagedType::R8 => Some(TypeName::R8),
            UnmanagedType::SysInt | UnmanagedType::SysUInt => Some(TypeName::VOID),
            UnmanagedType::Error => Some(TypeName::ERROR),
            UnmanagedType::Bool => Some(TypeName::BOOL),
            UnmanagedType::VariantBool => Some(TypeName::VARIANT_BOOL),
            _ => None,
        }
    }

    /// Portable C spelling.
    #[must_use]
    pub fn plain_c(&self) -> &str {
        &self.plain_c
    }

    /// Windows SDK spelling.
    #[must_use]
    pub fn win_api(&self) -> &str {
        &self.win_api
    }

    /// Pointer alias prefix.
    #[must_use]
    pub fn prefix(&self) -> PtrPrefix {
        self.prefix
    }

    /// Returns the size in bytes for a platform with `pointer_size`-byte pointers.
    #[must_use]
    pub fn size(&self, pointer_size: u32) -> u32 {
        if self.size >= 0 {
            return self.size.unsigned_abs();
        }

        let encoded = self.size.unsigned_abs();
        (encoded & 0xff) * pointer_size + (encoded >> 8)
    }

    /// Prints the name followed by `indirections` levels of pointer.
    ///
    /// In the Windows SDK dialect the first indirection is folded into the `P`/`LP` alias when
    /// the type has one.
    pub fn print_to(&self, printer: &mut dyn CodePrinter, flags: PrintFlags, indirections: u32) {
        let mut indirections = indirections;
        let output: Cow<'_, str> = if flags.contains(PrintFlags::USE_PLAIN_C) {
            Cow::Borrowed(&self.plain_c)
        } else if indirections > 0 && self.prefix != PtrPrefix::None {
            indirections -= 1;
            match self.prefix {
                PtrPrefix::P => Cow::Owned(format!("P{}", self.win_api)),
                _ => Cow::Owned(format!("LP{}", self.win_api)),
            }
        } else {
            Cow::Borrowed(&self.win_api)
        };

        print_tokens(printer, &output);

        if indirections > 0 {
            if !output.ends_with('*') {
                printer.print(OutputType::Other, " ");
            }
            for _ in 0..indirections {
                printer.print(OutputType::Operator, "*");
            }
        }
    }
}

/// Splits a type spelling into categorized tokens.
///
/// Words starting with an upper-case letter are type names, words starting with a lower-case
/// letter are keywords, `*` is an operator and spaces are `Other`. An underscore or a digit
/// continues the current token.
pub fn print_tokens(printer: &mut dyn CodePrinter, text: &str) {
    let mut buffer = String::with_capacity(text.len());
    let mut current = OutputType::Other;

    for ch in text.chars() {
        let next = match ch {
            ' ' => OutputType::Other,
            '*' => OutputType::Operator,
            '_' => current,
            c if c.is_lowercase() && current != OutputType::TypeName => OutputType::Keyword,
            c if c.is_uppercase() => OutputType::TypeName,
            _ => current,
        };

        if next != current {
            if !buffer.is_empty() {
                printer.print(current, &buffer);
                buffer.clear();
            }
            current = next;
        }

        buffer.push(ch);
    }

    if !buffer.is_empty() {
        printer.print(current, &buffer);
    }
}
