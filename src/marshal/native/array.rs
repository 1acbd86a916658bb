//! Arrays: C-style arrays, `SAFEARRAY`s and arrays embedded in structures.

use super::{Classifier, NativeKind, NativeType};
use crate::{
    diagnostics::Message,
    marshal::{
        descriptor::TypeDescriptor,
        flags::MarshalFlags,
        typename::{print_tokens, TypeName},
        unmanaged::{allowed, UnmanagedType, VarEnum},
        universe::{Builtin, TypeKind, TypeRef},
    },
    output::{CodePrinter, OutputType, PrintFlags},
};

/// How an array crosses the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayForm {
    /// Pointer to the first element
    Native,
    /// `SAFEARRAY *`
    SafeArray,
    /// Fixed number of elements embedded in the containing structure
    ByVal(u32),
    /// Not marshalable; printed as `void *`
    Invalid,
}

/// The array-specific part of a [`NativeType`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    /// Marshaling form
    pub form: ArrayForm,
    /// Passed by value without `[Out]`
    pub in_only: bool,
    /// Element type; absent for [`ArrayForm::Invalid`]
    pub element: Option<NativeType>,
    /// The occurrence is a structure field
    pub struct_field: bool,
}

impl ArrayType {
    pub(super) fn size(&self, pointer_size: u32) -> u32 {
        match (self.form, &self.element) {
            (ArrayForm::ByVal(length), Some(element)) => length.saturating_mul(element.size()),
            _ => pointer_size,
        }
    }

    pub(super) fn alignment(&self, pointer_size: u32) -> u32 {
        match (self.form, &self.element) {
            (ArrayForm::ByVal(_), Some(element)) => element.alignment(),
            _ => pointer_size,
        }
    }

    pub(super) fn print_to(&self, printer: &mut dyn CodePrinter, flags: PrintFlags, indirections: u32) {
        match self.form {
            ArrayForm::Invalid => TypeName::VOID.print_to(printer, flags, 1),
            ArrayForm::SafeArray => {
                if self.in_only {
                    printer.print(OutputType::Keyword, "const");
                    printer.print(OutputType::Other, " ");
                }
                if flags.contains(PrintFlags::USE_PLAIN_C) {
                    print_tokens(printer, TypeName::SAFEARRAY.plain_c());
                    printer.print(OutputType::Other, " ");
                    printer.print(OutputType::Operator, "*");
                } else {
                    print_tokens(printer, &format!("LP{}", TypeName::SAFEARRAY.win_api()));
                }
            }
            ArrayForm::Native | ArrayForm::ByVal(_) => {
                if let Some(element) = &self.element {
                    element.print_to(printer, flags);
                }
            }
        }

        // a by-ref array has its element indirected too, so no [] suffix is needed
        for _ in 0..indirections {
            printer.print(OutputType::Operator, "*");
        }
    }

    pub(super) fn print_post_identifier_to(&self, printer: &mut dyn CodePrinter, indirections: u32) {
        match self.form {
            ArrayForm::Native if indirections == 0 => printer.print(OutputType::Operator, "[]"),
            ArrayForm::ByVal(length) => {
                printer.print(OutputType::Operator, "[");
                printer.print(OutputType::Literal, &length.to_string());
                printer.print(OutputType::Operator, "]");
            }
            _ => {}
        }
    }
}

impl Classifier<'_> {
    pub(super) fn array(&mut self, desc: &TypeDescriptor) -> NativeType {
        let struct_field = desc.is_struct_field();
        let mut native = NativeType::from_desc(
            desc,
            NativeKind::Array(Box::new(ArrayType {
                form: ArrayForm::Invalid,
                in_only: !desc.is_by_ref() && !desc.marshals_out(),
                element: None,
                struct_field,
            })),
            u32::from(desc.is_by_ref()),
        );

        let universe = self.universe;
        let table = if universe.is_builtin(desc.ty(), Builtin::Array) {
            if struct_field {
                allowed::ARRAY_CLASS_FIELD
            } else {
                allowed::ARRAY_CLASS
            }
        } else if desc.is_array_element() {
            native.log.add(Message::NoNestedArrayMarshaling);
            return native;
        } else if struct_field {
            allowed::ARRAY_FIELD
        } else if desc.is_com() {
            allowed::ARRAY_C
        } else {
            allowed::ARRAY_P
        };

        let (form, element) = match self.validate(desc, table, &mut native) {
            UnmanagedType::SafeArray => {
                let element = self.safe_array_element(desc, &mut native);
                (ArrayForm::SafeArray, element)
            }
            UnmanagedType::ByValArray => {
                let length = match desc.marshal_as().and_then(|marshal_as| marshal_as.size_const) {
                    Some(length) if length > 0 => length.unsigned_abs(),
                    _ => {
                        native.log.add(Message::ByValArrayInvalidLength);
                        1
                    }
                };
                let element = self.classify_array_element(
                    desc.ty(),
                    desc.marshal_as().and_then(|marshal_as| marshal_as.array_sub_type),
                    desc.flags(),
                );
                let length = if length.checked_mul(element.size()).is_some() {
                    length
                } else {
                    native.log.add(Message::ByValArrayTooLarge(length));
                    1
                };
                (ArrayForm::ByVal(length), element)
            }
            _ => {
                self.explain_array_size(desc, &mut native);
                let element = self.classify_array_element(
                    desc.ty(),
                    desc.marshal_as().and_then(|marshal_as| marshal_as.array_sub_type),
                    desc.flags(),
                );
                Self::explain_memory_management(desc, "array", &mut native);
                (ArrayForm::Native, element)
            }
        };

        native.kind = NativeKind::Array(Box::new(ArrayType {
            form,
            in_only: !desc.is_by_ref() && !desc.marshals_out(),
            element: Some(element),
            struct_field,
        }));
        native
    }

    fn safe_array_element(&mut self, desc: &TypeDescriptor, native: &mut NativeType) -> NativeType {
        let universe = self.universe;
        let mut array_ty = desc.ty();

        let requested = desc
            .marshal_as()
            .and_then(|marshal_as| marshal_as.safe_array_sub_type)
            .filter(|sub_type| *sub_type != VarEnum::Empty);
        let mut sub_type = match requested {
            Some(sub_type) => sub_type,
            None => {
                // wrapper element types pick the variant type statically
                let wrapped = universe
                    .element_type(array_ty)
                    .and_then(|element| universe.as_builtin(element))
                    .and_then(|builtin| match builtin {
                        Builtin::UnknownWrapper => Some((Builtin::Object, VarEnum::Unknown)),
                        Builtin::DispatchWrapper => Some((Builtin::Object, VarEnum::Dispatch)),
                        Builtin::ErrorWrapper => Some((Builtin::Int32, VarEnum::Error)),
                        Builtin::CurrencyWrapper => Some((Builtin::Decimal, VarEnum::Currency)),
                        Builtin::BStrWrapper => Some((Builtin::String, VarEnum::BStr)),
                        _ => None,
                    });
                match wrapped {
                    Some((element, sub_type)) => {
                        array_ty = universe.array_of(universe.builtin(element));
                        sub_type
                    }
                    None => VarEnum::Empty,
                }
            }
        };

        let element = self.classify_array_element(
            array_ty,
            sub_type.to_unmanaged(),
            (desc.flags() - MarshalFlags::BY_REF_PARAM) | MarshalFlags::COM_INTEROP,
        );

        if sub_type == VarEnum::Empty {
            if let Some(element_ty) = universe.element_type(array_ty) {
                sub_type = universe.type_to_var_enum(element_ty);
            }
        }

        if !element.is_invalid()
            && (!universe.is_builtin(array_ty, Builtin::Array) || sub_type != VarEnum::Empty)
        {
            native.log.add(Message::SafeArrayWillMarshalAs(sub_type.to_string()));
        }

        let object_array = matches!(universe.kind(desc.ty()), TypeKind::Array(element)
            if universe.is_builtin(*element, Builtin::Object));
        if object_array && matches!(sub_type, VarEnum::Empty | VarEnum::Variant) {
            native.log.add(Message::SafeArrayOfVariantsWrapperUse);
        }

        Self::explain_memory_management(desc, "SAFEARRAY", native);
        element
    }

    /// Logs how the native-to-managed marshaler learns the element count of a C-style array.
    fn explain_array_size(&self, desc: &TypeDescriptor, native: &mut NativeType) {
        let marshal_as = desc.marshal_as();
        let size_const = marshal_as.and_then(|marshal_as| marshal_as.size_const).unwrap_or(0);
        let size_param_index = marshal_as.and_then(|marshal_as| marshal_as.size_param_index);
        let has_size_const = size_const != 0;

        if desc.is_by_ref() {
            if has_size_const || size_param_index.is_some() {
                native.log.add(Message::ArraySizeNotAllowedForByref);
            }
        } else if !desc.is_callback() {
            if has_size_const || size_param_index.is_some() {
                native.log.add(Message::ArraySizesIgnored);
            } else {
                native.log.add(Message::ArraySizeDeterminedDynamically);
            }
        } else if let Some(index) = size_param_index {
            let sibling = usize::try_from(index).ok().and_then(|index| desc.sibling(index));
            match sibling {
                None => native.log.add(Message::ArraySizeParamIndexOutOfRange(i32::from(index))),
                Some(sibling) if !self.allowed_in_size_param(sibling.ty, sibling.indirect) => {
                    native.log.add(Message::ArraySizeParamWrongType(
                        self.universe.full_name(sibling.ty).to_string(),
                    ));
                }
                Some(sibling) => {
                    let name = if sibling.name.is_empty() {
                        format!("#{}", i32::from(index) + 1)
                    } else {
                        sibling.name.clone()
                    };
                    if size_const > 0 {
                        native
                            .log
                            .add(Message::ArraySizeIsByParameterPlusConstant(name, size_const));
                    } else {
                        native.log.add(Message::ArraySizeIsByParameter(name));
                    }
                }
            }
        } else if has_size_const {
            native.log.add(Message::ArraySizeIsConstant(size_const));
        } else {
            native.log.add(Message::ArraySizeDefaultsToOne);
        }
    }

    /// Integral types, enums over them included, may carry an element count.
    fn allowed_in_size_param(&self, ty: TypeRef, indirect: bool) -> bool {
        if indirect {
            return false;
        }

        let universe = self.universe;
        let ty = match universe.kind(ty) {
            TypeKind::Enum(enumeration) => enumeration.underlying,
            _ => ty,
        };
        universe
            .as_builtin(ty)
            .is_some_and(Builtin::is_integral)
    }
}
