//! Primitive-like native types: integers, floats, booleans, characters and the fixed-shape
//! system value types (`DATE`, `DECIMAL`, `GUID`, `HANDLE`, `OLE_COLOR`, `va_list`).

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

impl Classifier<'_> {
    /// Integers, floats, booleans and `IntPtr`.
    pub(super) fn primitive(&self, desc: &TypeDescriptor, table: &[UnmanagedType]) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::Primitive(TypeName::VOID));
        let unmanaged = self.validate(desc, table, &mut native);

        let boolean = self.universe.is_builtin(desc.ty(), Builtin::Boolean);
        let name = match unmanaged {
            UnmanagedType::I1 if boolean => TypeName::I1_BOOL,
            UnmanagedType::U1 if boolean => TypeName::U1_BOOL,
            UnmanagedType::VariantBool if boolean => TypeName::VARIANT_BOOL_BOOL,
            other => TypeName::for_unmanaged(other).unwrap_or(TypeName::VOID),
        };

        // IntPtr and UIntPtr become void *
        if matches!(unmanaged, UnmanagedType::SysInt | UnmanagedType::SysUInt) {
            native.indirections += 1;
        }

        native.kind = NativeKind::Primitive(name);
        native
    }

    pub(super) fn character(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::Char(TypeName::WCHAR));
        let mut unmanaged = self.validate_or(desc, allowed::CHAR, UnmanagedType::AsAny, &mut native);

        if unmanaged == UnmanagedType::AsAny {
            if desc.is_com() {
                unmanaged = UnmanagedType::U2;
            } else if desc.ansi_strings() {
                unmanaged = UnmanagedType::I1;
            } else if desc.unicode_strings() {
                unmanaged = UnmanagedType::U2;
            } else {
                let name = if desc.ansi_platform() {
                    TypeName::TCHAR_A
                } else {
                    TypeName::TCHAR_W
                };
                native.kind = NativeKind::Char(name);
                native.log.add(Message::AutoCharacterMarshaling);
                return native;
            }
        }

        let name = match unmanaged {
            UnmanagedType::I1 => TypeName::I1,
            UnmanagedType::I2 => TypeName::I2,
            UnmanagedType::U1 => TypeName::UCHAR,
            _ => TypeName::WCHAR,
        };
        native.kind = NativeKind::Char(name);
        native
    }

    pub(super) fn date(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::Date);
        self.validate(desc, allowed::STRUCT, &mut native);
        native
    }

    pub(super) fn decimal(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(
            desc,
            NativeKind::Decimal {
                name: TypeName::DECIMAL,
                lp_struct: false,
            },
        );

        let table = if desc.is_struct_field() {
            allowed::DECIMAL_FIELD
        } else {
            allowed::DECIMAL_PARAM
        };
        match self.validate(desc, table, &mut native) {
            UnmanagedType::Currency => {
                native.kind = NativeKind::Decimal {
                    name: TypeName::CURRENCY,
                    lp_struct: false,
                };
            }
            UnmanagedType::LPStruct => {
                native.kind = NativeKind::Decimal {
                    name: TypeName::DECIMAL,
                    lp_struct: true,
                };
                native.indirections += 1;
            }
            _ => {}
        }
        native
    }

    pub(super) fn guid(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::Guid { lp_struct: false });
        if self.validate(desc, allowed::GUID, &mut native) == UnmanagedType::LPStruct {
            native.kind = NativeKind::Guid { lp_struct: true };
            native.indirections += 1;
        }
        native
    }

    /// `HandleRef`, `SafeHandle` and `CriticalHandle` descendants.
    pub(super) fn handle(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::Handle);
        if desc.is_array_element() && !self.universe.is_builtin(desc.ty(), Builtin::HandleRef) {
            native.log.add(Message::HandlesNotPermittedAsArrayElements);
        }
        self.validate(desc, allowed::EMPTY, &mut native);
        native
    }

    pub(super) fn color(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::Color);
        self.validate(desc, allowed::EMPTY, &mut native);
        if !desc.is_com() {
            native.log.add(Message::MarshalingAllowedForCom(
                self.universe.full_name(desc.ty()).to_string(),
            ));
        }
        native
    }

    pub(super) fn var_args(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(desc, NativeKind::VarArgs);
        self.validate(desc, allowed::EMPTY, &mut native);
        native
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        diagnostics::MessageCode,
        marshal::{
            definitions::DefinitionCache,
            descriptor::{MarshalAs, ParameterInfo},
            flags::MarshalFlags,
            native::Classifier,
            unmanaged::UnmanagedType,
            universe::{Builtin, TypeUniverse},
        },
        output::PrintFlags,
        test::render_type,
    };

    #[test]
    fn test_integers() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let cases = [
            (Builtin::Byte, "BYTE", "unsigned char", 1),
            (Builtin::SByte, "CHAR", "char", 1),
            (Builtin::Int16, "SHORT", "short", 2),
            (Builtin::UInt32, "UINT", "unsigned int", 4),
            (Builtin::Int64, "LONG64", "__int64", 8),
            (Builtin::Double, "DOUBLE", "double", 8),
        ];
        for (builtin, win_api, plain_c, size) in cases {
            let native = classifier.classify_type(universe.builtin(builtin), MarshalFlags::empty());
            assert_eq!(render_type(&native, PrintFlags::empty()), win_api);
            assert_eq!(render_type(&native, PrintFlags::USE_PLAIN_C), plain_c);
            assert_eq!(native.size(), size);
            assert_eq!(native.alignment(), size);
            assert!(native.log().is_empty());
        }
    }

    #[test]
    fn test_boolean_defaults() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);
        let boolean = universe.builtin(Builtin::Boolean);

        let pinvoke = classifier.classify_type(boolean, MarshalFlags::empty());
        assert_eq!(render_type(&pinvoke, PrintFlags::empty()), "BOOL");
        assert_eq!(pinvoke.size(), 4);

        let com = classifier.classify_type(boolean, MarshalFlags::COM_INTEROP);
        assert_eq!(render_type(&com, PrintFlags::empty()), "VARIANT_BOOL");
        assert_eq!(com.size(), 2);

        let param = ParameterInfo::new("flag", boolean).with_marshal_as(MarshalAs::new(UnmanagedType::U1));
        let byte = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert_eq!(render_type(&byte, PrintFlags::USE_PLAIN_C), "bool");
        assert_eq!(render_type(&byte, PrintFlags::empty()), "BYTE");
    }

    #[test]
    fn test_intptr_is_void_pointer() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let native =
            classifier.classify_type(universe.builtin(Builtin::IntPtr), MarshalFlags::PLATFORM_64BIT);
        assert_eq!(render_type(&native, PrintFlags::empty()), "LPVOID");
        assert_eq!(render_type(&native, PrintFlags::USE_PLAIN_C), "void *");
        assert_eq!(native.size(), 8);
    }

    #[test]
    fn test_char_follows_string_setting() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);
        let ch = universe.builtin(Builtin::Char);

        let ansi = classifier.classify_type(ch, MarshalFlags::ANSI_STRINGS);
        assert_eq!(render_type(&ansi, PrintFlags::empty()), "CHAR");

        let unicode = classifier.classify_type(ch, MarshalFlags::UNICODE_STRINGS);
        assert_eq!(render_type(&unicode, PrintFlags::empty()), "WCHAR");

        let auto = classifier.classify_type(ch, MarshalFlags::empty());
        assert_eq!(render_type(&auto, PrintFlags::empty()), "TCHAR");
        assert_eq!(auto.size(), 2);
        assert!(auto.log().contains(MessageCode::AutoCharacterMarshaling));

        let auto_ansi = classifier.classify_type(ch, MarshalFlags::ANSI_PLATFORM);
        assert_eq!(auto_ansi.size(), 1);
    }

    #[test]
    fn test_decimal_and_guid() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let decimal = classifier.classify_type(universe.builtin(Builtin::Decimal), MarshalFlags::empty());
        assert_eq!(render_type(&decimal, PrintFlags::empty()), "DECIMAL");
        assert_eq!(decimal.size(), 16);
        assert_eq!(decimal.alignment(), 8);

        let param = ParameterInfo::new("value", universe.builtin(Builtin::Decimal))
            .with_marshal_as(MarshalAs::new(UnmanagedType::Currency));
        let currency = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert_eq!(render_type(&currency, PrintFlags::empty()), "CURRENCY");
        assert_eq!(currency.size(), 8);

        let guid = classifier.classify_type(universe.builtin(Builtin::Guid), MarshalFlags::empty());
        assert_eq!(guid.size(), 16);
        assert_eq!(guid.alignment(), 4);

        let param = ParameterInfo::new("iid", universe.builtin(Builtin::Guid))
            .with_marshal_as(MarshalAs::new(UnmanagedType::LPStruct));
        let pointer = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert_eq!(render_type(&pointer, PrintFlags::empty()), "LPGUID");
        assert_eq!(pointer.size(), 4);
        assert!(pointer.marshals_as_pointer_with_known_direction());
    }

    #[test]
    fn test_color_requires_com() {
        let universe = TypeUniverse::new();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);
        let color = universe.builtin(Builtin::Color);

        let pinvoke = classifier.classify_type(color, MarshalFlags::empty());
        assert!(pinvoke.log().contains(MessageCode::MarshalingAllowedForCom));
        assert_eq!(render_type(&pinvoke, PrintFlags::empty()), "OLE_COLOR");

        let com = classifier.classify_type(color, MarshalFlags::COM_INTEROP);
        assert!(com.log().is_empty());
    }
}
