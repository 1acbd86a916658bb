//! Descriptions of single occurrences of managed types.
//!
//! A [`TypeDescriptor`] is what the classifier consumes: the managed type with pointer and
//! by-ref levels stripped, the requested [`MarshalAs`] representation and the
//! [`MarshalFlags`] describing where the value occurs. Descriptors are built from
//! [`ParameterInfo`] and [`FieldInfo`] records, or synthesized for array elements.

use std::sync::Arc;

use bitflags::bitflags;

use crate::marshal::{
    flags::MarshalFlags,
    ident::string_to_literal,
    unmanaged::{UnmanagedType, VarEnum},
    universe::{Builtin, FieldInfo, TypeRef, TypeUniverse},
};

/// Custom marshaler named by a `MarshalAs` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomMarshalerRef {
    /// Direct reference to the marshaler class
    Type(TypeRef),
    /// Full name of the marshaler class, resolved through the universe
    Name(String),
}

/// Requested native representation of a parameter, return value or field.
#[derive(Debug, Clone, PartialEq)]
pub struct MarshalAs {
    /// The representation
    pub value: UnmanagedType,
    /// Element count of fixed-size arrays and strings, or the constant part of an array size
    pub size_const: Option<i32>,
    /// Zero-based index of the parameter holding the element count of an array
    pub size_param_index: Option<i16>,
    /// Representation of the elements of a C array
    pub array_sub_type: Option<UnmanagedType>,
    /// Variant type of the elements of a `SAFEARRAY`
    pub safe_array_sub_type: Option<VarEnum>,
    /// Marshaler class of [`UnmanagedType::CustomMarshaler`]
    pub custom_marshaler: Option<CustomMarshalerRef>,
}

impl MarshalAs {
    /// Requests `value` without any further parameters.
    #[must_use]
    pub fn new(value: UnmanagedType) -> Self {
        MarshalAs {
            value,
            size_const: None,
            size_param_index: None,
            array_sub_type: None,
            safe_array_sub_type: None,
            custom_marshaler: None,
        }
    }

    /// Sets the constant size.
    #[must_use]
    pub fn with_size_const(mut self, size_const: i32) -> Self {
        self.size_const = Some(size_const);
        self
    }

    /// Sets the index of the size parameter.
    #[must_use]
    pub fn with_size_param_index(mut self, index: i16) -> Self {
        self.size_param_index = Some(index);
        self
    }

    /// Sets the representation of C array elements.
    #[must_use]
    pub fn with_array_sub_type(mut self, sub_type: UnmanagedType) -> Self {
        self.array_sub_type = Some(sub_type);
        self
    }

    /// Sets the variant type of `SAFEARRAY` elements.
    #[must_use]
    pub fn with_safe_array_sub_type(mut self, sub_type: VarEnum) -> Self {
        self.safe_array_sub_type = Some(sub_type);
        self
    }

    /// Sets the custom marshaler.
    #[must_use]
    pub fn with_custom_marshaler(mut self, marshaler: CustomMarshalerRef) -> Self {
        self.custom_marshaler = Some(marshaler);
        self
    }

    pub(crate) fn has_size_const(&self) -> bool {
        self.size_const.is_some_and(|size| size != 0)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Direction attributes of a parameter.
    pub struct ParamAttributes: u16 {
        /// `[In]`
        const IN = 0x0001;
        /// `[Out]`
        const OUT = 0x0002;
        /// The parameter carries the return value of a COM method
        const RETVAL = 0x0008;
    }
}

/// Default value of an optional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// `null`
    Null,
    /// Boolean constant
    Bool(bool),
    /// Character constant
    Char(char),
    /// Signed integer constant
    Int(i64),
    /// Unsigned integer constant
    UInt(u64),
    /// Floating point constant
    Float(f64),
    /// String constant
    String(String),
}

impl DefaultValue {
    /// Renders the value as a C literal; `None` for `null`.
    #[must_use]
    pub fn to_literal(&self) -> Option<String> {
        match self {
            DefaultValue::Null => None,
            DefaultValue::Bool(value) => Some(value.to_string()),
            DefaultValue::Char('\'') => Some("'\\''".to_string()),
            DefaultValue::Char(value) => Some(format!("'{}'", value)),
            DefaultValue::Int(value) => Some(value.to_string()),
            DefaultValue::UInt(value) => Some(value.to_string()),
            DefaultValue::Float(value) => Some(value.to_string()),
            DefaultValue::String(value) => Some(string_to_literal(value)),
        }
    }
}

/// A parameter or return value of a method.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Parameter name, empty for return values
    pub name: String,
    /// Parameter type, without by-ref and pointer levels
    pub ty: TypeRef,
    /// Passed by reference (`ref`/`out`)
    pub by_ref: bool,
    /// Number of unmanaged pointer levels
    pub pointers: u32,
    /// Direction attributes
    pub attributes: ParamAttributes,
    /// Requested representation
    pub marshal_as: Option<MarshalAs>,
    /// Default value of an optional parameter
    pub default_value: Option<DefaultValue>,
}

impl ParameterInfo {
    /// Creates a by-value parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        ParameterInfo {
            name: name.into(),
            ty,
            by_ref: false,
            pointers: 0,
            attributes: ParamAttributes::empty(),
            marshal_as: None,
            default_value: None,
        }
    }

    /// Creates the description of a return value.
    #[must_use]
    pub fn returning(ty: TypeRef) -> Self {
        Self::new(String::new(), ty)
    }

    /// Marks the parameter as passed by reference.
    #[must_use]
    pub fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    /// Adds direction attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: ParamAttributes) -> Self {
        self.attributes |= attributes;
        self
    }

    /// Sets the number of pointer levels.
    #[must_use]
    pub fn with_pointers(mut self, pointers: u32) -> Self {
        self.pointers = pointers;
        self
    }

    /// Sets the requested representation.
    #[must_use]
    pub fn with_marshal_as(mut self, marshal_as: MarshalAs) -> Self {
        self.marshal_as = Some(marshal_as);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: DefaultValue) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// The part of a parameter its siblings need to resolve `size_param_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingParameter {
    /// Parameter name
    pub name: String,
    /// Parameter type
    pub ty: TypeRef,
    /// Passed by reference or through a pointer
    pub indirect: bool,
}

impl SiblingParameter {
    /// Summarizes the parameters of one method.
    #[must_use]
    pub fn from_parameters(params: &[ParameterInfo]) -> Arc<[SiblingParameter]> {
        params
            .iter()
            .map(|param| SiblingParameter {
                name: param.name.clone(),
                ty: param.ty,
                indirect: param.by_ref || param.pointers > 0,
            })
            .collect()
    }
}

/// One occurrence of a managed type at the managed/native boundary.
///
/// Descriptors are immutable; the `with_*` methods return modified copies.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    ty: TypeRef,
    flags: MarshalFlags,
    marshal_as: Option<MarshalAs>,
    pointers: u32,
    siblings: Option<Arc<[SiblingParameter]>>,
}

impl TypeDescriptor {
    /// Describes a plain occurrence of `ty`.
    #[must_use]
    pub fn new(ty: TypeRef, flags: MarshalFlags) -> Self {
        TypeDescriptor {
            ty,
            flags,
            marshal_as: None,
            pointers: 0,
            siblings: None,
        }
    }

    /// Describes a parameter or return value.
    ///
    /// `siblings` are the parameters of the declaring method, used to resolve a
    /// `size_param_index`.
    #[must_use]
    pub fn from_parameter(
        param: &ParameterInfo,
        siblings: Option<Arc<[SiblingParameter]>>,
        flags: MarshalFlags,
    ) -> Self {
        let mut flags = flags - (MarshalFlags::ARRAY_ELEMENT | MarshalFlags::STRUCT_FIELD);
        if param.by_ref {
            flags |= MarshalFlags::BY_REF_PARAM;
        }
        if param.attributes.contains(ParamAttributes::IN) {
            flags |= MarshalFlags::MARSHAL_IN;
        }
        if param.attributes.contains(ParamAttributes::OUT) {
            flags |= MarshalFlags::MARSHAL_OUT;
        }
        if param.attributes.contains(ParamAttributes::RETVAL) {
            flags |= MarshalFlags::RET_VAL_PARAM;
        }

        TypeDescriptor {
            ty: param.ty,
            flags,
            marshal_as: param.marshal_as.clone(),
            pointers: param.pointers,
            siblings,
        }
    }

    /// Describes a structure field.
    #[must_use]
    pub fn from_field(field: &FieldInfo, flags: MarshalFlags) -> Self {
        TypeDescriptor {
            ty: field.ty,
            flags: (flags - MarshalFlags::ARRAY_ELEMENT) | MarshalFlags::STRUCT_FIELD,
            marshal_as: field.marshal_as.clone(),
            pointers: field.pointers,
            siblings: None,
        }
    }

    /// Describes an element of the array type `array_ty`, requested as `element`.
    ///
    /// The elements of `System.Array` have no static type, so it is derived from the requested
    /// representation. Direction flags are dropped; the by-ref and struct-field context is kept.
    #[must_use]
    pub fn for_array_element(
        universe: &TypeUniverse,
        array_ty: TypeRef,
        element: Option<UnmanagedType>,
        flags: MarshalFlags,
    ) -> Self {
        let mut flags = flags - (MarshalFlags::MARSHAL_IN | MarshalFlags::MARSHAL_OUT);
        let ty = if universe.is_builtin(array_ty, Builtin::Array) {
            flags |= MarshalFlags::ARRAY_ELEMENT | MarshalFlags::SYS_ARRAY_ELEMENT;
            universe.builtin(managed_type_for(element))
        } else {
            flags |= MarshalFlags::ARRAY_ELEMENT;
            universe
                .element_type(array_ty)
                .unwrap_or_else(|| universe.builtin(Builtin::Object))
        };

        TypeDescriptor {
            ty,
            flags,
            marshal_as: element.map(MarshalAs::new),
            pointers: 0,
            siblings: None,
        }
    }

    /// Returns a copy with a different requested representation.
    #[must_use]
    pub fn with_marshal_as(mut self, marshal_as: MarshalAs) -> Self {
        self.marshal_as = Some(marshal_as);
        self
    }

    /// Returns a copy with a different number of pointer levels.
    #[must_use]
    pub fn with_pointers(mut self, pointers: u32) -> Self {
        self.pointers = pointers;
        self
    }

    /// Returns a copy with additional flags.
    #[must_use]
    pub fn with_flags(mut self, flags: MarshalFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// The managed type.
    #[must_use]
    pub fn ty(&self) -> TypeRef {
        self.ty
    }

    /// All context flags.
    #[must_use]
    pub fn flags(&self) -> MarshalFlags {
        self.flags
    }

    /// The requested representation, if any.
    #[must_use]
    pub fn marshal_as(&self) -> Option<&MarshalAs> {
        self.marshal_as.as_ref()
    }

    /// The requested [`UnmanagedType`], if any.
    #[must_use]
    pub fn unmanaged(&self) -> Option<UnmanagedType> {
        self.marshal_as.as_ref().map(|marshal_as| marshal_as.value)
    }

    /// Number of unmanaged pointer levels.
    #[must_use]
    pub fn pointers(&self) -> u32 {
        self.pointers
    }

    /// Resolves a sibling parameter by index.
    #[must_use]
    pub fn sibling(&self, index: usize) -> Option<&SiblingParameter> {
        self.siblings.as_ref().and_then(|siblings| siblings.get(index))
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn marshals_in(&self) -> bool {
        self.flags.contains(MarshalFlags::MARSHAL_IN)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn marshals_out(&self) -> bool {
        self.flags.contains(MarshalFlags::MARSHAL_OUT)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_com(&self) -> bool {
        self.flags.contains(MarshalFlags::COM_INTEROP)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn ansi_strings(&self) -> bool {
        self.flags.contains(MarshalFlags::ANSI_STRINGS)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn unicode_strings(&self) -> bool {
        self.flags.contains(MarshalFlags::UNICODE_STRINGS)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn ansi_platform(&self) -> bool {
        self.flags.contains(MarshalFlags::ANSI_PLATFORM)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_by_ref(&self) -> bool {
        self.flags.contains(MarshalFlags::BY_REF_PARAM)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_ret_val(&self) -> bool {
        self.flags.contains(MarshalFlags::RET_VAL_PARAM)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_callback(&self) -> bool {
        self.flags.contains(MarshalFlags::CALLBACK_PARAM)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_struct_field(&self) -> bool {
        self.flags.contains(MarshalFlags::STRUCT_FIELD)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_array_element(&self) -> bool {
        self.flags.contains(MarshalFlags::ARRAY_ELEMENT)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_sys_array_element(&self) -> bool {
        self.flags.contains(MarshalFlags::SYS_ARRAY_ELEMENT)
    }

    /// Pointer size of the target platform.
    #[must_use]
    pub fn pointer_size(&self) -> u32 {
        self.flags.pointer_size()
    }

    /// Returns true if strings and characters default to ANSI.
    #[must_use]
    pub fn marshals_strings_ansi(&self) -> bool {
        self.flags.marshals_strings_ansi()
    }
}

/// Managed element type of a `System.Array` whose elements are requested as `element`.
fn managed_type_for(element: Option<UnmanagedType>) -> Builtin {
    use UnmanagedType::*;

    match element {
        Some(AnsiBStr | BStr | TBStr | ByValTStr | VBByRefStr | LPStr | LPTStr | LPWStr) => {
            Builtin::String
        }
        Some(Bool | VariantBool) => Builtin::Boolean,
        None
        | Some(AsAny | ByValArray | IDispatch | Interface | IUnknown | Struct | LPStruct | CustomMarshaler) => {
            Builtin::Object
        }
        Some(FunctionPtr) => Builtin::Delegate,
        Some(I1) => Builtin::SByte,
        Some(I2) => Builtin::Int16,
        Some(I4 | Error) => Builtin::Int32,
        Some(I8) => Builtin::Int64,
        Some(U1) => Builtin::Byte,
        Some(U2) => Builtin::UInt16,
        Some(U4) => Builtin::UInt32,
        Some(U8) => Builtin::UInt64,
        Some(R4) => Builtin::Single,
        Some(R8) => Builtin::Double,
        Some(Currency) => Builtin::Decimal,
        Some(SysInt) => Builtin::IntPtr,
        Some(SysUInt) => Builtin::UIntPtr,
        Some(LPArray | SafeArray) => Builtin::Array,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_flags() {
        let universe = TypeUniverse::new();
        let int32 = universe.builtin(Builtin::Int32);
        let param = ParameterInfo::new("count", int32)
            .by_ref()
            .with_attributes(ParamAttributes::OUT)
            .with_pointers(1);

        let desc = TypeDescriptor::from_parameter(&param, None, MarshalFlags::STRUCT_FIELD);
        assert!(desc.is_by_ref());
        assert!(desc.marshals_out());
        assert!(!desc.marshals_in());
        assert!(!desc.is_struct_field());
        assert_eq!(desc.pointers(), 1);
    }

    #[test]
    fn test_system_array_element() {
        let universe = TypeUniverse::new();
        let array = universe.builtin(Builtin::Array);
        let flags = MarshalFlags::MARSHAL_IN | MarshalFlags::BY_REF_PARAM | MarshalFlags::STRUCT_FIELD;

        let desc = TypeDescriptor::for_array_element(&universe, array, Some(UnmanagedType::BStr), flags);
        assert!(universe.is_builtin(desc.ty(), Builtin::String));
        assert!(desc.is_sys_array_element());
        assert!(desc.is_by_ref());
        assert!(desc.is_struct_field());
        assert!(!desc.marshals_in());
        assert_eq!(desc.unmanaged(), Some(UnmanagedType::BStr));

        let desc = TypeDescriptor::for_array_element(&universe, array, None, flags);
        assert!(universe.is_builtin(desc.ty(), Builtin::Object));
        assert_eq!(desc.marshal_as(), None);
    }

    #[test]
    fn test_typed_array_element() {
        let universe = TypeUniverse::new();
        let double = universe.builtin(Builtin::Double);
        let array = universe.array_of(double);

        let desc = TypeDescriptor::for_array_element(&universe, array, None, MarshalFlags::empty());
        assert_eq!(desc.ty(), double);
        assert!(desc.is_array_element());
        assert!(!desc.is_sys_array_element());
    }

    #[test]
    fn test_default_value_literals() {
        assert_eq!(DefaultValue::Null.to_literal(), None);
        assert_eq!(DefaultValue::Bool(true).to_literal().as_deref(), Some("true"));
        assert_eq!(DefaultValue::Char('x').to_literal().as_deref(), Some("'x'"));
        assert_eq!(DefaultValue::Int(-3).to_literal().as_deref(), Some("-3"));
        assert_eq!(
            DefaultValue::String("a\"b".to_string()).to_literal().as_deref(),
            Some("\"a\\\"b\"")
        );
    }

    #[test]
    fn test_siblings() {
        let universe = TypeUniverse::new();
        let int32 = universe.builtin(Builtin::Int32);
        let params = vec![
            ParameterInfo::new("buffer", universe.array_of(int32)),
            ParameterInfo::new("length", int32).by_ref(),
        ];
        let siblings = SiblingParameter::from_parameters(&params);
        let desc = TypeDescriptor::from_parameter(&params[0], Some(siblings), MarshalFlags::empty());

        assert_eq!(desc.sibling(1).map(|s| s.indirect), Some(true));
        assert_eq!(desc.sibling(1).map(|s| s.name.as_str()), Some("length"));
        assert!(desc.sibling(2).is_none());
    }
}
