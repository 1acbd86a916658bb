//! Native types with an out-of-line definition: structures, unions, enums and callbacks.

use super::{Classifier, NativeKind, NativeType};
use crate::{
    diagnostics::Message,
    marshal::{
        definitions::{
            DefHandle, DefKey, Definition, DefinitionCache, DefinitionSet,
            DelegateInterfaceDefinition, EnumDefinition, FunctionPtrDefinition,
            StructureDefinition, DELEGATE_INTERFACE_NAME,
        },
        descriptor::TypeDescriptor,
        flags::MarshalFlags,
        typename::TypeName,
        unmanaged::{allowed, UnmanagedType},
        universe::TypeKind,
    },
    output::{CodePrinter, OutputType},
};

/// Reference from a native type to its definition.
///
/// Size and alignment are read from the definition when the type is classified. A definition
/// that is still being built reports 0 for both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedType {
    /// Name of the defined type
    pub name: String,
    /// `struct`, `union` or empty
    pub modifier: &'static str,
    /// Print `const` in front of a pointer to the type
    pub const_pointer: bool,
    /// The definition
    pub definition: DefHandle,
    /// Size of the definition
    pub size: u32,
    /// Alignment of the definition
    pub alignment: u32,
    /// A by-value formatted class, marshaled `[In]` unless annotated otherwise
    pub by_default_in_only: bool,
}

impl DefinedType {
    pub(super) fn print_to(&self, printer: &mut dyn CodePrinter, indirections: u32) {
        if self.const_pointer && indirections > 0 {
            printer.print(OutputType::Keyword, "const");
            printer.print(OutputType::Other, " ");
        }
        if !self.modifier.is_empty() {
            printer.print(OutputType::Keyword, self.modifier);
            printer.print(OutputType::Other, " ");
        }

        printer.print(OutputType::TypeName, &self.name);

        if indirections > 0 {
            printer.print(OutputType::Other, " ");
            for _ in 0..indirections {
                printer.print(OutputType::Operator, "*");
            }
        }
    }

    pub(super) fn collect(
        &self,
        cache: &DefinitionCache,
        set: &mut DefinitionSet,
        parent: Option<DefHandle>,
    ) {
        if !set.contains(self.definition) {
            if let Some(definition) = cache.get(self.definition) {
                set.add(self.definition, definition.supports_forward_declaration());
                definition.collect(cache, set, self.definition);
            }
        }
        if let Some(parent) = parent {
            set.add_dependency(parent, self.definition);
        }
    }
}

impl Classifier<'_> {
    /// Value types and formatted classes.
    pub(super) fn structure(&mut self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let ty = desc.ty();
        let mut native = self.primitive_base(desc, NativeKind::Primitive(TypeName::VOID));

        let mut by_default_in_only = false;
        if universe.is_value_type(ty) || desc.is_struct_field() {
            self.validate(desc, allowed::STRUCT, &mut native);
        } else {
            self.validate(desc, allowed::CLASS, &mut native);
            native.indirections += 1;
            by_default_in_only = native.indirections == 1;
        }

        if desc.marshal_as().is_some() {
            if let Ok(Some(normalized)) = universe.normalized_type(ty, desc.pointer_size()) {
                native.log.add(Message::NormalizedStructure(
                    universe.full_name(ty).to_string(),
                    normalized,
                ));
            }
        }

        if !universe.has_layout(ty) {
            native
                .log
                .add(Message::TypeHasNoLayout(universe.full_name(ty).to_string()));
        }

        let key_flags = desc.flags().definition_key();
        let handle = self.definition(DefKey::Structure(ty, key_flags), |classifier| {
            Definition::Structure(StructureDefinition::build(classifier, ty, key_flags))
        });

        let (blittable, union) = match self.cache.get(handle).map(|definition| &**definition) {
            Some(Definition::Structure(structure)) => {
                (structure.is_blittable(), structure.is_union())
            }
            _ => (universe.is_blittable(ty, desc.ansi_platform()), false),
        };

        let mut const_pointer = false;
        if native.indirections == 1 && desc.pointers() == 0 {
            // by-value class or by-ref structure
            const_pointer =
                self.explain_pinning_or_copying(desc, blittable, by_default_in_only, &mut native);
        } else if native.indirections == 2 && desc.pointers() == 0 {
            let subject = if union { "union" } else { "structure" };
            Self::explain_memory_management(desc, subject, &mut native);
        }

        native.kind = NativeKind::Structure(DefinedType {
            name: universe.c_name(ty),
            modifier: if union { "union" } else { "struct" },
            const_pointer,
            definition: handle,
            size: self.cache.size_of(handle),
            alignment: self.cache.alignment_of(handle),
            by_default_in_only,
        });
        native
    }

    /// Logs whether the runtime pins the instance or copies it, and in which direction.
    ///
    /// Returns true if native code only reads the copy, which makes the pointer `const`.
    fn explain_pinning_or_copying(
        &self,
        desc: &TypeDescriptor,
        blittable: bool,
        by_default_in_only: bool,
        native: &mut NativeType,
    ) -> bool {
        let name = self.universe.full_name(desc.ty()).to_string();

        if blittable {
            native.log.add(if desc.is_callback() {
                Message::LayoutBlittableCallbackParameter(name.clone())
            } else {
                Message::LayoutBlittableParameter(name.clone())
            });

            if desc.marshals_in() && !desc.marshals_out() {
                native.log.add(Message::LayoutBlittableMarkedIn(name));
            } else if !desc.marshals_in() && desc.marshals_out() {
                native.log.add(Message::LayoutBlittableMarkedOut(name));
            }
            return false;
        }

        native.log.add(if desc.is_callback() {
            Message::LayoutNonBlittableCallbackParameter(name.clone())
        } else {
            Message::LayoutNonBlittableParameter(name.clone())
        });

        let in_only = (desc.marshals_in() && !desc.marshals_out())
            || (by_default_in_only && !desc.marshals_in() && !desc.marshals_out());
        let out_only = !desc.marshals_in() && desc.marshals_out();

        // a callback receives the data, so the directions are mirrored
        match (in_only, out_only, desc.is_callback()) {
            (true, _, false) => {
                native.log.add(Message::LayoutDirectionManagedToNative(name));
                true
            }
            (true, _, true) => {
                native.log.add(Message::LayoutDirectionNativeToManaged(name));
                true
            }
            (false, true, false) => {
                native.log.add(Message::LayoutDirectionNativeToManaged(name));
                false
            }
            (false, true, true) => {
                native.log.add(Message::LayoutDirectionManagedToNative(name));
                false
            }
            (false, false, _) => {
                native.log.add(Message::LayoutDirectionBoth(name));
                false
            }
        }
    }

    /// Enums, represented by their underlying integer type.
    pub(super) fn enumeration(&mut self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let ty = desc.ty();
        let mut native = self.primitive_base(desc, NativeKind::Primitive(TypeName::VOID));

        let underlying = match universe.kind(ty) {
            TypeKind::Enum(enumeration) => Some(enumeration.underlying),
            _ => None,
        };
        let table = underlying
            .and_then(|underlying| universe.as_builtin(underlying))
            .and_then(|builtin| builtin.enum_representations());

        let unmanaged = match table {
            Some(table) => self.validate(desc, table, &mut native),
            None => {
                let name = underlying.map_or_else(
                    || universe.full_name(ty).to_string(),
                    |underlying| universe.full_name(underlying).to_string(),
                );
                native.log.add(Message::UnexpectedEnumUnderlyingType(name));
                UnmanagedType::I4
            }
        };

        let key_flags = desc.flags().definition_key();
        let pointer_size = desc.pointer_size();
        let handle = self.definition(DefKey::Enum(ty, key_flags, unmanaged), |classifier| {
            Definition::Enum(EnumDefinition::build(
                classifier.universe(),
                ty,
                unmanaged,
                pointer_size,
            ))
        });

        native.kind = NativeKind::Enum(DefinedType {
            name: universe.c_name(ty),
            modifier: "",
            const_pointer: false,
            definition: handle,
            size: self.cache.size_of(handle),
            alignment: self.cache.alignment_of(handle),
            by_default_in_only: false,
        });
        native
    }

    /// Delegates, as function pointers or as the COM `_Delegate` interface.
    pub(super) fn callback(&mut self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let ty = desc.ty();
        let mut native = self.primitive_base(desc, NativeKind::Primitive(TypeName::VOID));

        let table = if desc.is_struct_field() {
            allowed::DELEG_FIELD
        } else if desc.is_com() {
            allowed::DELEG_C
        } else {
            allowed::DELEG_P
        };

        let defined = if self.validate(desc, table, &mut native) == UnmanagedType::Interface {
            native.indirections += 1;
            native.log.add(Message::SeeMscorlibTlbForInterface(
                DELEGATE_INTERFACE_NAME.to_string(),
            ));

            let pointer_size = desc.pointer_size();
            let key = DefKey::DelegateInterface(desc.flags().definition_key() | MarshalFlags::COM_INTEROP);
            let handle = self.definition(key, |_| {
                Definition::DelegateInterface(DelegateInterfaceDefinition::new(pointer_size))
            });

            DefinedType {
                name: DELEGATE_INTERFACE_NAME.to_string(),
                modifier: "struct",
                const_pointer: false,
                definition: handle,
                size: self.cache.size_of(handle),
                alignment: self.cache.alignment_of(handle),
                by_default_in_only: false,
            }
        } else {
            if !desc.is_callback() {
                native.log.add(Message::BewarePrematureDelegateRelease);
            }

            // the pointer target follows P/Invoke rules even when passed to a COM method
            let key_flags = desc.flags().definition_key() - MarshalFlags::COM_INTEROP;
            let handle = self.definition(DefKey::FunctionPtr(ty, key_flags), |classifier| {
                Definition::FunctionPtr(FunctionPtrDefinition::build(classifier, ty, key_flags))
            });

            DefinedType {
                name: universe.c_name(ty),
                modifier: "",
                const_pointer: false,
                definition: handle,
                size: self.cache.size_of(handle),
                alignment: self.cache.alignment_of(handle),
                by_default_in_only: false,
            }
        };

        native.kind = NativeKind::Callback(defined);
        native
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        diagnostics::MessageCode,
        marshal::{
            definitions::{Definition, DefinitionCache},
            descriptor::{MarshalAs, ParamAttributes, ParameterInfo},
            flags::MarshalFlags,
            native::{Classifier, NativeKind},
            unmanaged::UnmanagedType,
            universe::{Builtin, EnumType, TypeKind, TypeUniverse},
        },
        output::PrintFlags,
        test::{add_callback, add_point, add_rect_class, render_type},
    };

    #[test]
    fn test_struct_by_value_and_by_ref() {
        let universe = TypeUniverse::new();
        let point = add_point(&universe);
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let by_value = classifier.classify_type(point, MarshalFlags::empty());
        assert_eq!(render_type(&by_value, PrintFlags::empty()), "struct Point");
        assert_eq!(by_value.size(), 8);
        assert_eq!(by_value.alignment(), 4);

        let param = ParameterInfo::new("pt", point).by_ref();
        let by_ref = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert_eq!(render_type(&by_ref, PrintFlags::empty()), "struct Point *");
        assert_eq!(by_ref.size(), 4);
        assert!(by_ref.log().contains(MessageCode::LayoutBlittableParameter));
        assert_eq!(by_value.definition(), by_ref.definition());
    }

    #[test]
    fn test_formatted_class_is_const_pointer() {
        let universe = TypeUniverse::new();
        let rect = add_rect_class(&universe);
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let param = ParameterInfo::new("rect", rect);
        let native = classifier.classify_parameter(&param, None, MarshalFlags::empty());

        assert_eq!(render_type(&native, PrintFlags::empty()), "const struct Rect *");
        assert!(native.log().contains(MessageCode::LayoutNonBlittableParameter));
        assert!(native.log().contains(MessageCode::LayoutDirectionManagedToNative));
        assert!(native.marshals_in());
        assert!(!native.marshals_out());
        assert!(native.marshals_as_pointer_with_known_direction());

        let param = ParameterInfo::new("rect", rect)
            .with_attributes(ParamAttributes::IN | ParamAttributes::OUT);
        let in_out = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert_eq!(render_type(&in_out, PrintFlags::empty()), "struct Rect *");
        assert!(in_out.log().contains(MessageCode::LayoutDirectionBoth));
    }

    #[test]
    fn test_enum_uses_requested_width() {
        let universe = TypeUniverse::new();
        let color = universe
            .add(
                "Contoso",
                "Color",
                TypeKind::Enum(
                    EnumType::new(universe.builtin(Builtin::Int32))
                        .with_member("Red", 0)
                        .with_member("Green", 1),
                ),
            )
            .unwrap();
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let native = classifier.classify_type(color, MarshalFlags::empty());
        assert_eq!(render_type(&native, PrintFlags::empty()), "Color");
        assert_eq!(native.size(), 4);

        let param = ParameterInfo::new("color", color).with_marshal_as(MarshalAs::new(UnmanagedType::U4));
        let unsigned = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert_ne!(native.definition(), unsigned.definition());

        let param = ParameterInfo::new("color", color).with_marshal_as(MarshalAs::new(UnmanagedType::I8));
        let invalid = classifier.classify_parameter(&param, None, MarshalFlags::empty());
        assert!(invalid.log().contains(MessageCode::UnrecognizedMarshalingForContext));
        assert_eq!(invalid.definition(), native.definition());
    }

    #[test]
    fn test_delegate_as_function_pointer() {
        let universe = TypeUniverse::new();
        let callback = add_callback(&universe);
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let native = classifier.classify_type(callback, MarshalFlags::empty());
        assert_eq!(render_type(&native, PrintFlags::empty()), "EnumWindowsProc");
        assert!(native.log().contains(MessageCode::BewarePrematureDelegateRelease));
        assert_eq!(native.size(), 4);

        let handle = native.definition().unwrap();
        assert!(matches!(
            cache.get(handle).map(|definition| &**definition),
            Some(Definition::FunctionPtr(_))
        ));
    }

    #[test]
    fn test_delegate_as_com_interface() {
        let universe = TypeUniverse::new();
        let callback = add_callback(&universe);
        let mut cache = DefinitionCache::new();
        let mut classifier = Classifier::new(&universe, &mut cache);

        let native = classifier.classify_type(callback, MarshalFlags::COM_INTEROP);
        assert_eq!(render_type(&native, PrintFlags::empty()), "struct _Delegate *");
        assert!(native.log().contains(MessageCode::SeeMscorlibTlbForInterface));
        assert!(matches!(native.kind(), NativeKind::Callback(_)));
    }
}
