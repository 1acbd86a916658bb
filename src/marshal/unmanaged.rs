//! Requested native representations and the per-context tables of legal representations.

use strum::{Display, EnumIter, IntoStaticStr};

/// Native representation requested through a `MarshalAs` annotation.
///
/// Discriminants match the values used in managed metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[repr(u8)]
pub enum UnmanagedType {
    /// 4-byte Win32 `BOOL`
    Bool = 2,
    /// 1-byte signed integer
    I1 = 3,
    /// 1-byte unsigned integer
    U1 = 4,
    /// 2-byte signed integer
    I2 = 5,
    /// 2-byte unsigned integer
    U2 = 6,
    /// 4-byte signed integer
    I4 = 7,
    /// 4-byte unsigned integer
    U4 = 8,
    /// 8-byte signed integer
    I8 = 9,
    /// 8-byte unsigned integer
    U8 = 10,
    /// 4-byte float
    R4 = 11,
    /// 8-byte float
    R8 = 12,
    /// OLE `CURRENCY`
    Currency = 15,
    /// Length-prefixed wide string
    BStr = 19,
    /// Null-terminated ANSI string
    LPStr = 20,
    /// Null-terminated wide string
    LPWStr = 21,
    /// Null-terminated platform-width string
    LPTStr = 22,
    /// Fixed-length character buffer embedded in a structure
    ByValTStr = 23,
    /// `IUnknown` pointer
    IUnknown = 25,
    /// `IDispatch` pointer
    IDispatch = 26,
    /// `VARIANT` or embedded structure
    Struct = 27,
    /// COM interface pointer
    Interface = 28,
    /// `SAFEARRAY`
    SafeArray = 29,
    /// Fixed-size array embedded in a structure
    ByValArray = 30,
    /// Pointer-sized signed integer
    SysInt = 31,
    /// Pointer-sized unsigned integer
    SysUInt = 32,
    /// Visual Basic by-ref string
    VBByRefStr = 34,
    /// Length-prefixed ANSI string
    AnsiBStr = 35,
    /// Length-prefixed platform-width string
    TBStr = 36,
    /// 2-byte OLE `VARIANT_BOOL`
    VariantBool = 37,
    /// C function pointer
    FunctionPtr = 38,
    /// Dynamic type decided at run time
    AsAny = 40,
    /// Pointer to the first element of a C array
    LPArray = 42,
    /// Pointer to a structure
    LPStruct = 43,
    /// Custom marshaler
    CustomMarshaler = 44,
    /// `HRESULT`
    Error = 45,
}

/// OLE automation variant type, used for `SAFEARRAY` element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[allow(missing_docs)]
pub enum VarEnum {
    #[strum(serialize = "VT_EMPTY")]
    Empty,
    #[strum(serialize = "VT_NULL")]
    Null,
    #[strum(serialize = "VT_I2")]
    I2,
    #[strum(serialize = "VT_I4")]
    I4,
    #[strum(serialize = "VT_R4")]
    R4,
    #[strum(serialize = "VT_R8")]
    R8,
    #[strum(serialize = "VT_CY")]
    Currency,
    #[strum(serialize = "VT_DATE")]
    Date,
    #[strum(serialize = "VT_BSTR")]
    BStr,
    #[strum(serialize = "VT_DISPATCH")]
    Dispatch,
    #[strum(serialize = "VT_ERROR")]
    Error,
    #[strum(serialize = "VT_BOOL")]
    Bool,
    #[strum(serialize = "VT_VARIANT")]
    Variant,
    #[strum(serialize = "VT_UNKNOWN")]
    Unknown,
    #[strum(serialize = "VT_DECIMAL")]
    Decimal,
    #[strum(serialize = "VT_I1")]
    I1,
    #[strum(serialize = "VT_UI1")]
    UI1,
    #[strum(serialize = "VT_UI2")]
    UI2,
    #[strum(serialize = "VT_UI4")]
    UI4,
    #[strum(serialize = "VT_I8")]
    I8,
    #[strum(serialize = "VT_UI8")]
    UI8,
    #[strum(serialize = "VT_INT")]
    Int,
    #[strum(serialize = "VT_UINT")]
    UInt,
    #[strum(serialize = "VT_VOID")]
    Void,
    #[strum(serialize = "VT_HRESULT")]
    HResult,
    #[strum(serialize = "VT_PTR")]
    Ptr,
    #[strum(serialize = "VT_SAFEARRAY")]
    SafeArray,
    #[strum(serialize = "VT_CARRAY")]
    CArray,
    #[strum(serialize = "VT_USERDEFINED")]
    UserDefined,
    #[strum(serialize = "VT_LPSTR")]
    LPStr,
    #[strum(serialize = "VT_LPWSTR")]
    LPWStr,
    #[strum(serialize = "VT_RECORD")]
    Record,
    #[strum(serialize = "VT_FILETIME")]
    FileTime,
    #[strum(serialize = "VT_STREAM")]
    Stream,
    #[strum(serialize = "VT_STORAGE")]
    Storage,
    #[strum(serialize = "VT_STREAMED_OBJECT")]
    StreamedObject,
    #[strum(serialize = "VT_STORED_OBJECT")]
    StoredObject,
    #[strum(serialize = "VT_CLSID")]
    Clsid,
    #[strum(serialize = "VT_ARRAY")]
    Array,
}

impl VarEnum {
    /// Returns the native representation a `SAFEARRAY` element of this variant type gets.
    ///
    /// `None` means there is no specific representation and the element type decides.
    #[must_use]
    pub fn to_unmanaged(self) -> Option<UnmanagedType> {
        match self {
            VarEnum::CArray => Some(UnmanagedType::LPArray),
            VarEnum::Currency => Some(UnmanagedType::Currency),

            VarEnum::StreamedObject
            | VarEnum::Stream
            | VarEnum::StoredObject
            | VarEnum::Storage
            | VarEnum::Record
            | VarEnum::Date
            | VarEnum::FileTime
            | VarEnum::Decimal => Some(UnmanagedType::Struct),

            VarEnum::Error | VarEnum::HResult => Some(UnmanagedType::Error),
            VarEnum::Bool => Some(UnmanagedType::VariantBool),

            VarEnum::I1 => Some(UnmanagedType::I1),
            VarEnum::I2 => Some(UnmanagedType::I2),
            VarEnum::I4 => Some(UnmanagedType::I4),
            VarEnum::I8 => Some(UnmanagedType::I8),

            VarEnum::UI1 => Some(UnmanagedType::U1),
            VarEnum::UI2 => Some(UnmanagedType::U2),
            VarEnum::UI4 => Some(UnmanagedType::U4),
            VarEnum::UI8 => Some(UnmanagedType::U8),

            VarEnum::R4 => Some(UnmanagedType::R4),
            VarEnum::R8 => Some(UnmanagedType::R8),

            VarEnum::BStr => Some(UnmanagedType::BStr),
            VarEnum::LPStr => Some(UnmanagedType::LPStr),
            VarEnum::LPWStr => Some(UnmanagedType::LPWStr),

            VarEnum::Int | VarEnum::Ptr => Some(UnmanagedType::SysInt),
            VarEnum::UInt => Some(UnmanagedType::SysUInt),

            VarEnum::Array | VarEnum::SafeArray => Some(UnmanagedType::SafeArray),

            VarEnum::Dispatch => Some(UnmanagedType::IDispatch),
            VarEnum::Unknown => Some(UnmanagedType::IUnknown),

            VarEnum::Empty
            | VarEnum::Null
            | VarEnum::Variant
            | VarEnum::Void
            | VarEnum::UserDefined
            | VarEnum::Clsid => None,
        }
    }
}

/// Tables of legal representations per managed type and context.
///
/// The first entry of each table is the default used when no representation is requested.
/// A `P` suffix marks a table valid for P/Invoke, a `C` suffix one valid for COM interop.
pub mod allowed {
    use super::UnmanagedType::{self, *};

    /// `short`
    pub const INT16: &[UnmanagedType] = &[I2, U2];
    /// `int`
    pub const INT32: &[UnmanagedType] = &[I4, U4, Error];
    /// `long`
    pub const INT64: &[UnmanagedType] = &[I8, U8];
    /// `ushort`
    pub const UINT16: &[UnmanagedType] = &[U2, I2];
    /// `uint`
    pub const UINT32: &[UnmanagedType] = &[U4, I4, Error];
    /// `ulong`
    pub const UINT64: &[UnmanagedType] = &[U8, I8];
    /// `byte`
    pub const BYTE: &[UnmanagedType] = &[U1, I1];
    /// `sbyte`
    pub const SBYTE: &[UnmanagedType] = &[I1, U1];
    /// `float`
    pub const SINGLE: &[UnmanagedType] = &[R4];
    /// `double`
    pub const DOUBLE: &[UnmanagedType] = &[R8];

    /// `bool` under P/Invoke
    pub const BOOLEAN_P: &[UnmanagedType] = &[Bool, VariantBool, I1, U1];
    /// `bool` under COM interop
    pub const BOOLEAN_C: &[UnmanagedType] = &[VariantBool, Bool, I1, U1];
    /// `char`
    pub const CHAR: &[UnmanagedType] = &[I1, U1, U2, I2];

    /// `decimal` parameter
    pub const DECIMAL_PARAM: &[UnmanagedType] = &[Struct, LPStruct, Currency];
    /// `decimal` field
    pub const DECIMAL_FIELD: &[UnmanagedType] = &[Struct, Currency];

    /// Formatted class passed by reference
    pub const CLASS: &[UnmanagedType] = &[LPStruct];
    /// Value type
    pub const STRUCT: &[UnmanagedType] = &[Struct];
    /// No representation may be requested
    pub const EMPTY: &[UnmanagedType] = &[];

    /// `string` under P/Invoke
    pub const STRING_P: &[UnmanagedType] =
        &[LPTStr, LPWStr, LPStr, BStr, TBStr, VBByRefStr, AnsiBStr];
    /// `string` under COM interop
    pub const STRING_C: &[UnmanagedType] = &[BStr, LPWStr, LPStr, TBStr, VBByRefStr, AnsiBStr];
    /// `StringBuilder` under P/Invoke
    pub const SBUILDER_P: &[UnmanagedType] = &[LPTStr, LPWStr, LPStr];
    /// `StringBuilder` under COM interop
    pub const SBUILDER_C: &[UnmanagedType] = &[LPWStr, LPStr];
    /// `string` field
    pub const STRING_FIELD: &[UnmanagedType] = &[LPTStr, LPWStr, LPStr, BStr, ByValTStr];

    /// Native-sized integer
    pub const INTPTR: &[UnmanagedType] = &[SysInt, SysUInt];
    /// Delegate under P/Invoke
    pub const DELEG_P: &[UnmanagedType] = &[FunctionPtr, Interface];
    /// Delegate under COM interop
    pub const DELEG_C: &[UnmanagedType] = &[Interface, FunctionPtr];
    /// Delegate field
    pub const DELEG_FIELD: &[UnmanagedType] = &[FunctionPtr];
    /// `Guid`
    pub const GUID: &[UnmanagedType] = &[Struct, LPStruct];

    /// `System.Array` parameter
    pub const ARRAY_CLASS: &[UnmanagedType] = &[Interface, SafeArray];
    /// `System.Array` field
    pub const ARRAY_CLASS_FIELD: &[UnmanagedType] = &[Interface, SafeArray, ByValArray];
    /// Typed array under P/Invoke
    pub const ARRAY_P: &[UnmanagedType] = &[LPArray, SafeArray];
    /// Typed array under COM interop
    pub const ARRAY_C: &[UnmanagedType] = &[SafeArray, LPArray];
    /// Typed array field
    pub const ARRAY_FIELD: &[UnmanagedType] = &[SafeArray, ByValArray];

    /// Interface
    pub const INTERFACE: &[UnmanagedType] = &[Interface];
    /// `object` parameter
    pub const OBJECT_PARAM: &[UnmanagedType] = &[Struct, Interface, IUnknown, IDispatch, AsAny];
    /// `object` field
    pub const OBJECT_FIELD: &[UnmanagedType] = &[Interface, IUnknown, IDispatch, Struct];
    /// `object` array element
    pub const OBJECT_ELEMENT: &[UnmanagedType] = &[Struct, IUnknown, IDispatch, Interface];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_enum_conversion() {
        assert_eq!(VarEnum::Bool.to_unmanaged(), Some(UnmanagedType::VariantBool));
        assert_eq!(VarEnum::Date.to_unmanaged(), Some(UnmanagedType::Struct));
        assert_eq!(VarEnum::Ptr.to_unmanaged(), Some(UnmanagedType::SysInt));
        assert_eq!(VarEnum::Variant.to_unmanaged(), None);
        assert_eq!(VarEnum::UI4.to_string(), "VT_UI4");
    }

    #[test]
    fn test_tables_have_defaults() {
        assert_eq!(allowed::BOOLEAN_P[0], UnmanagedType::Bool);
        assert_eq!(allowed::BOOLEAN_C[0], UnmanagedType::VariantBool);
        assert_eq!(allowed::ARRAY_CLASS_FIELD.iter().position(|u| *u == UnmanagedType::SafeArray), Some(1));
        assert_eq!(UnmanagedType::LPStruct as u8, 43);
        assert_eq!(UnmanagedType::ByValTStr.to_string(), "ByValTStr");
    }
}
