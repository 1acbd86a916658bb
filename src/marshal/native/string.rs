//! `string` and `StringBuilder`.

use super::{Classifier, NativeKind, NativeType};
use crate::{
    diagnostics::Message,
    marshal::{
        descriptor::TypeDescriptor,
        typename::TypeName,
        unmanaged::{allowed, UnmanagedType},
        universe::Builtin,
    },
};

/// A string pointer, a `BSTR` or a fixed-length character array embedded in a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct StringType {
    /// Base type name
    pub name: TypeName,
    /// Changes made by native code are not visible to managed code
    pub immutable: bool,
    /// Character count of an embedded `ByValTStr` array
    pub fixed_length: Option<u32>,
    /// The embedded array holds single-byte characters
    pub fixed_ansi: bool,
    /// The occurrence is a structure field
    pub struct_field: bool,
}

impl Classifier<'_> {
    pub(super) fn string(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(
            desc,
            NativeKind::String(StringType {
                name: TypeName::LPSTR,
                immutable: false,
                fixed_length: None,
                fixed_ansi: false,
                struct_field: desc.is_struct_field(),
            }),
        );

        if desc.pointers() > 0 {
            native.log.add(Message::UnmanagedPointersToRefType(
                self.universe.full_name(desc.ty()).to_string(),
            ));
        }

        let builder = self.universe.is_builtin(desc.ty(), Builtin::StringBuilder);
        let (unmanaged, mut immutable) = self.string_representation(desc, builder, &mut native);

        let mut fixed_length = None;
        let mut fixed_ansi = false;
        let mut resolved = unmanaged;

        if unmanaged == UnmanagedType::VBByRefStr {
            if !desc.is_by_ref()
                || desc.pointers() != 0
                || desc.is_callback()
                || desc.marshals_in() != desc.marshals_out()
            {
                native.log.add(Message::VBByRefParamNotByRef);
            } else {
                // the buffer is passed directly and copied into a new string afterwards
                native.indirections = native.indirections.saturating_sub(1);
            }
            immutable = false;
            resolved = if desc.ansi_strings() {
                UnmanagedType::LPStr
            } else if desc.unicode_strings() {
                UnmanagedType::LPWStr
            } else {
                UnmanagedType::LPTStr
            };
        }

        let name = match resolved {
            UnmanagedType::LPStr if immutable => TypeName::LPCSTR,
            UnmanagedType::LPStr => TypeName::LPSTR,
            UnmanagedType::LPWStr if immutable => TypeName::LPCWSTR,
            UnmanagedType::LPWStr => TypeName::LPWSTR,
            UnmanagedType::LPTStr => {
                native.log.add(Message::AutoStringMarshaling);
                match (desc.ansi_platform(), immutable) {
                    (true, true) => TypeName::LPCTSTR_A,
                    (true, false) => TypeName::LPTSTR_A,
                    (false, true) => TypeName::LPCTSTR_W,
                    (false, false) => TypeName::LPTSTR_W,
                }
            }
            UnmanagedType::AnsiBStr => TypeName::ANSI_BSTR,
            UnmanagedType::TBStr => {
                native.log.add(Message::AutoStringMarshaling);
                if desc.ansi_platform() {
                    TypeName::TBSTR_A
                } else {
                    TypeName::TBSTR_W
                }
            }
            UnmanagedType::ByValTStr => {
                let length = desc
                    .marshal_as()
                    .and_then(|marshal_as| marshal_as.size_const)
                    .unwrap_or(0);
                fixed_length = Some(if length <= 0 {
                    native.log.add(Message::FixedLengthStringInvalidLength);
                    1
                } else {
                    length.unsigned_abs()
                });
                fixed_ansi = desc.marshals_strings_ansi();

                if desc.ansi_strings() {
                    TypeName::I1
                } else if desc.unicode_strings() {
                    TypeName::WCHAR
                } else if desc.ansi_platform() {
                    TypeName::TCHAR_A
                } else {
                    TypeName::TCHAR_W
                }
            }
            _ => TypeName::BSTR,
        };

        native.kind = NativeKind::String(StringType {
            name,
            immutable,
            fixed_length,
            fixed_ansi,
            struct_field: desc.is_struct_field(),
        });

        if !desc.is_array_element() {
            if immutable && !desc.is_callback() && !desc.is_struct_field() {
                if !desc.is_by_ref() && desc.pointers() == 0 && desc.marshals_out() {
                    native.log.add(Message::ByValStringMarkedOut);
                } else if !native.marshals_out() {
                    native.log.add(Message::BewareStringImmutability);
                }
            } else if builder && !desc.marshals_in() && !desc.marshals_out() {
                native.log.add(Message::DefaultStringBuilderMarshaling);
            }
        }

        if !matches!(unmanaged, UnmanagedType::VBByRefStr | UnmanagedType::ByValTStr) {
            Self::explain_memory_management(desc, "string", &mut native);
        }
        native
    }

    /// Picks the representation and decides whether native changes are visible to managed code.
    fn string_representation(
        &self,
        desc: &TypeDescriptor,
        builder: bool,
        native: &mut NativeType,
    ) -> (UnmanagedType, bool) {
        let (mut unmanaged, immutable) = if builder {
            let unmanaged = if desc.is_struct_field() {
                native.log.add(Message::StringBuilderFieldsDisallowed);
                UnmanagedType::LPStr
            } else {
                let table = if desc.is_com() {
                    allowed::SBUILDER_C
                } else {
                    allowed::SBUILDER_P
                };
                let mut unmanaged = self.validate_or(desc, table, UnmanagedType::AsAny, native);
                if unmanaged == UnmanagedType::AsAny && desc.is_com() {
                    unmanaged = UnmanagedType::LPWStr;
                }
                if !desc.is_callback() {
                    native.log.add(Message::StringBuilderRequiresInit);
                }
                unmanaged
            };
            (unmanaged, false)
        } else {
            // only an out or in/out by-ref string is mutable
            let immutable = !desc.is_by_ref() || (desc.marshals_in() && !desc.marshals_out());
            let table = if desc.is_struct_field() {
                allowed::STRING_FIELD
            } else if desc.is_com() {
                allowed::STRING_C
            } else {
                allowed::STRING_P
            };
            let mut unmanaged = self.validate_or(desc, table, UnmanagedType::AsAny, native);
            if unmanaged == UnmanagedType::AsAny && !desc.is_struct_field() && desc.is_com() {
                unmanaged = UnmanagedType::BStr;
            }
            (unmanaged, immutable)
        };

        if unmanaged == UnmanagedType::AsAny {
            unmanaged = if desc.ansi_strings() {
                UnmanagedType::LPStr
            } else if desc.unicode_strings() {
                UnmanagedType::LPWStr
            } else {
                UnmanagedType::LPTStr
            };
        }
        (unmanaged, immutable)
    }
}
