//! COM interface pointers, `VARIANT`s and custom-marshaled values.

use super::{Classifier, NativeKind, NativeType};
use crate::{
    diagnostics::Message,
    marshal::{
        descriptor::{CustomMarshalerRef, TypeDescriptor},
        typename::TypeName,
        unmanaged::{allowed, UnmanagedType},
        universe::{Builtin, ComInterfaceType},
    },
};

/// The interface-specific part of a [`NativeType`].
#[derive(Debug, Clone, PartialEq)]
pub struct InterfacePointer {
    /// Base type name; already a pointer unless it names a specific interface
    pub name: TypeName,
    /// Marshaled as a `VARIANT` rather than a pointer
    pub variant: bool,
    /// Names a specific interface that is not declared in the output
    pub undefined: bool,
}

impl Classifier<'_> {
    pub(super) fn interface(&self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let ty = desc.ty();
        let mut native = self.primitive_base(
            desc,
            NativeKind::Interface(InterfacePointer {
                name: TypeName::IUNKNOWN,
                variant: false,
                undefined: false,
            }),
        );

        let table = if universe.is_builtin(ty, Builtin::Object) {
            if desc.is_struct_field() {
                allowed::OBJECT_FIELD
            } else if desc.is_array_element() {
                allowed::OBJECT_ELEMENT
            } else {
                allowed::OBJECT_PARAM
            }
        } else if universe.is_builtin(ty, Builtin::Array) {
            if desc.marshal_as().is_none() && desc.is_struct_field() {
                native.log.add(Message::UnmanagedTypeRequiredForField(
                    universe.full_name(ty).to_string(),
                ));
            }
            allowed::ARRAY_CLASS
        } else {
            allowed::INTERFACE
        };

        let mut pointer = InterfacePointer {
            name: TypeName::IUNKNOWN,
            variant: false,
            undefined: false,
        };
        match self.validate(desc, table, &mut native) {
            UnmanagedType::Struct => {
                pointer.name = TypeName::VARIANT;
                pointer.variant = true;
            }
            UnmanagedType::IDispatch => pointer.name = TypeName::IDISPATCH,
            UnmanagedType::AsAny => {
                pointer.name = TypeName::VOID;
                native.indirections += 1;
                native.log.add(Message::AsAnyMarshaling);
            }
            // elements of array parameters are always VT_UNKNOWN
            _ if desc.is_array_element() && !desc.is_struct_field() => {}
            _ => self.default_com_interface(desc, &mut pointer, &mut native),
        }

        if pointer.variant {
            if !desc.is_callback() && desc.is_ret_val() {
                native.log.add(Message::VariantReturnTypeNotSupported);
            }
        } else {
            if marshaled_native_to_managed(desc) {
                native.log.add(Message::InterfacePointerToRCWMarshaling);
            }
            if marshaled_managed_to_native(desc) {
                native.log.add(Message::ManagedObjectToCCWMarshaling);
            }
        }

        native.kind = NativeKind::Interface(pointer);
        native
    }

    /// `IEnumerator` without a requested representation becomes `IEnumVARIANT *`.
    pub(super) fn enumerator(&self, desc: &TypeDescriptor) -> NativeType {
        let mut native = self.primitive_base(
            desc,
            NativeKind::Interface(InterfacePointer {
                name: TypeName::IENUM_VARIANT,
                variant: false,
                undefined: false,
            }),
        );
        native.indirections += 1;
        native
    }

    fn default_com_interface(
        &self,
        desc: &TypeDescriptor,
        pointer: &mut InterfacePointer,
        native: &mut NativeType,
    ) {
        let universe = self.universe;
        let ty = desc.ty();

        if universe.is_builtin(ty, Builtin::Object) {
            pointer.name = TypeName::IUNKNOWN;
            return;
        }
        if universe.is_builtin(ty, Builtin::Array) {
            native.log.add(Message::PointerIsCOMInterfacePtr(
                universe.full_name(ty).to_string(),
            ));
            pointer.name = TypeName::ARRAY;
            pointer.undefined = true;
            return;
        }

        let (kind, interface) = universe.com_interface_type(ty);
        pointer.name = match kind {
            ComInterfaceType::Dual | ComInterfaceType::IDispatch => TypeName::IDISPATCH,
            ComInterfaceType::IUnknown => TypeName::IUNKNOWN,
        };

        if let Some(interface) = interface {
            native.log.add(Message::PointerIsCOMInterfacePtr(
                universe.full_name(interface).to_string(),
            ));
            pointer.name = TypeName::custom(universe.get(interface).name(), -1);
            pointer.undefined = true;
            native.indirections += 1;
        }
    }

    /// A value handed to a custom marshaler; natively an untyped pointer.
    pub(super) fn custom_marshaled(&self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let mut native = self.primitive_base(desc, NativeKind::CustomMarshaled);
        let mut problem = false;

        if desc.is_struct_field() {
            native.log.add(Message::CustomMarshalerNotAllowedOnFields);
            problem = true;
        }
        if universe.is_value_type(desc.ty()) {
            native.log.add(Message::CustomMarshalerNotAllowedOnValueTypes);
            problem = true;
        }

        let marshaler = desc
            .marshal_as()
            .and_then(|marshal_as| marshal_as.custom_marshaler.as_ref());
        let (marshaler_ty, marshaler_name) = match marshaler {
            Some(CustomMarshalerRef::Type(ty)) => (Some(*ty), universe.full_name(*ty).to_string()),
            Some(CustomMarshalerRef::Name(name)) => (universe.find(name).ok(), name.clone()),
            None => (None, String::new()),
        };

        match marshaler_ty {
            None => {
                native.log.add(Message::MarshalerTypeNotFound(marshaler_name.clone()));
                problem = true;
            }
            Some(marshaler_ty) => {
                let interface = universe.builtin(Builtin::ICustomMarshaler);
                if marshaler_ty != interface && !universe.implements(marshaler_ty, interface) {
                    native.log.add(Message::MarshalerIsNotICustomMarshaler(
                        marshaler_name.clone(),
                    ));
                    problem = true;
                } else if !universe.has_get_instance(marshaler_ty) {
                    native.log.add(Message::MarshalerHasNoGetInstance(marshaler_name.clone()));
                    problem = true;
                }
            }
        }

        native.indirections = 1;
        if !problem {
            native.log.add(Message::CustomMarshaledParameter(marshaler_name));
        }
        native
    }
}

fn marshaled_native_to_managed(desc: &TypeDescriptor) -> bool {
    if desc.is_callback() {
        desc.marshals_in() || (!desc.marshals_out() && !desc.is_ret_val())
    } else {
        desc.is_ret_val() || desc.marshals_out()
    }
}

fn marshaled_managed_to_native(desc: &TypeDescriptor) -> bool {
    if desc.is_callback() {
        desc.is_ret_val() || desc.marshals_out()
    } else {
        desc.marshals_in() || (!desc.marshals_out() && !desc.is_ret_val())
    }
}
