//! Registry of managed types that feed the marshaling classifier.
//!
//! The [`TypeUniverse`] plays the role of the metadata source: it owns one [`ManagedType`] record
//! per managed type and hands out opaque [`TypeRef`] handles. The classifier only ever looks at
//! types through this registry, so the same engine can be driven from reflection data, from a
//! metadata parser or from hand-written test fixtures.
//!
//! # Key Components
//!
//! - [`TypeUniverse`] - Append-only, thread-safe registry of managed types
//! - [`TypeRef`] - Copyable handle of a registered type
//! - [`TypeKind`] - What a type is (builtin, struct, class, enum, delegate, ...)
//! - [`Builtin`] - Framework types the marshaler treats specially
//! - [`Record`] / [`FieldInfo`] - Layout and fields of structures and formatted classes
//!
//! # Registration
//!
//! Builtins are registered by [`TypeUniverse::new`]. User types are registered either in one
//! step with [`TypeUniverse::add`], or in two steps with [`TypeUniverse::declare`] followed by
//! [`TypeUniverse::define`], which allows cyclic type graphs (a structure holding a pointer to a
//! structure holding a pointer back).
//!
//! # Thread Safety
//!
//! Registration takes `&self`: types live in a `boxcar::Vec` and the name index is a `DashMap`,
//! so a universe can be shared across threads and extended concurrently. The kind of a declared
//! type is set at most once through a `OnceLock`.
//!
//! # Examples
//!
//! ```rust
//! use marshalscope::marshal::{Builtin, FieldInfo, Record, TypeKind, TypeUniverse};
//!
//! let universe = TypeUniverse::new();
//! let int32 = universe.builtin(Builtin::Int32);
//! let point = universe.add(
//!     "Contoso",
//!     "Point",
//!     TypeKind::Struct(
//!         Record::sequential()
//!             .with_field(FieldInfo::new("x", int32))
//!             .with_field(FieldInfo::new("y", int32)),
//!     ),
//! )?;
//!
//! assert_eq!(universe.find("Contoso.Point")?, point);
//! assert!(universe.is_value_type(point));
//! # Ok::<(), marshalscope::Error>(())
//! ```

use std::sync::OnceLock;

use dashmap::DashMap;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::{
    marshal::{
        descriptor::{MarshalAs, ParameterInfo},
        flags::MarshalFlags,
        ident::make_c_identifier,
        unmanaged::{UnmanagedType, VarEnum},
    },
    Error::{RecursionLimit, TypeAlreadyDefined, TypeNotFound},
    Result,
};

/// Maximum depth of the walks over user supplied type graphs.
const MAX_TYPE_DEPTH: usize = 64;

/// Handle of a type registered in a [`TypeUniverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef(u32);

impl TypeRef {
    /// Returns the position of the type in its universe.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Framework types with built-in marshaling rules.
///
/// The declaration order is the registration order, so the handle of a builtin is its
/// discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[allow(missing_docs)]
pub enum Builtin {
    Void,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    IntPtr,
    UIntPtr,
    Decimal,
    DateTime,
    Guid,
    String,
    StringBuilder,
    Object,
    Array,
    Delegate,
    ArrayWithOffset,
    HandleRef,
    Color,
    ArgIterator,
    IEnumerator,
    SafeHandle,
    CriticalHandle,
    ICustomMarshaler,
    UnknownWrapper,
    DispatchWrapper,
    ErrorWrapper,
    CurrencyWrapper,
    BStrWrapper,
}

impl Builtin {
    /// Namespace of the builtin type.
    #[must_use]
    pub fn namespace(self) -> &'static str {
        match self {
            Builtin::StringBuilder => "System.Text",
            Builtin::Color => "System.Drawing",
            Builtin::IEnumerator => "System.Collections",
            Builtin::ArrayWithOffset
            | Builtin::HandleRef
            | Builtin::SafeHandle
            | Builtin::CriticalHandle
            | Builtin::ICustomMarshaler
            | Builtin::UnknownWrapper
            | Builtin::DispatchWrapper
            | Builtin::ErrorWrapper
            | Builtin::CurrencyWrapper
            | Builtin::BStrWrapper => "System.Runtime.InteropServices",
            _ => "System",
        }
    }

    /// Simple name of the builtin type.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Namespace-qualified name, e.g. `System.Int32`.
    #[must_use]
    pub fn full_name(self) -> String {
        format!("{}.{}", self.namespace(), self.name())
    }

    /// Returns true for builtin value types.
    #[must_use]
    pub fn is_value_type(self) -> bool {
        !matches!(
            self,
            Builtin::String
                | Builtin::StringBuilder
                | Builtin::Object
                | Builtin::Array
                | Builtin::Delegate
                | Builtin::IEnumerator
                | Builtin::SafeHandle
                | Builtin::CriticalHandle
                | Builtin::ICustomMarshaler
                | Builtin::UnknownWrapper
                | Builtin::DispatchWrapper
                | Builtin::ErrorWrapper
                | Builtin::CurrencyWrapper
                | Builtin::BStrWrapper
        )
    }

    /// Returns true for the integral types, which may carry an array size or back an enum.
    #[must_use]
    pub fn is_integral(self) -> bool {
        matches!(
            self,
            Builtin::SByte
                | Builtin::Byte
                | Builtin::Int16
                | Builtin::UInt16
                | Builtin::Int32
                | Builtin::UInt32
                | Builtin::Int64
                | Builtin::UInt64
        )
    }

    /// Native size of a primitive builtin, `None` for everything else.
    #[must_use]
    pub fn primitive_size(self, pointer_size: u32) -> Option<u32> {
        match self {
            Builtin::Boolean => Some(4),
            Builtin::SByte | Builtin::Byte => Some(1),
            Builtin::Char | Builtin::Int16 | Builtin::UInt16 => Some(2),
            Builtin::Int32 | Builtin::UInt32 | Builtin::Single => Some(4),
            Builtin::Int64 | Builtin::UInt64 | Builtin::Double => Some(8),
            Builtin::IntPtr | Builtin::UIntPtr => Some(pointer_size),
            _ => None,
        }
    }

    /// Allowed representations of an enum backed by this type, `None` if it cannot back one.
    #[must_use]
    pub fn enum_representations(self) -> Option<&'static [UnmanagedType]> {
        use crate::marshal::unmanaged::allowed;

        match self {
            Builtin::Byte => Some(allowed::BYTE),
            Builtin::SByte => Some(allowed::SBYTE),
            Builtin::Int16 => Some(allowed::INT16),
            Builtin::UInt16 => Some(allowed::UINT16),
            Builtin::Int32 => Some(allowed::INT32),
            Builtin::UInt32 => Some(allowed::UINT32),
            Builtin::Int64 => Some(allowed::INT64),
            Builtin::UInt64 => Some(allowed::UINT64),
            _ => None,
        }
    }

    /// Handle of the builtin in any [`TypeUniverse`].
    #[must_use]
    pub fn type_ref(self) -> TypeRef {
        TypeRef(self as u32)
    }
}

/// Character set of a type or a P/Invoke declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharSet {
    /// Treated as ANSI
    None,
    /// Single-byte characters
    #[default]
    Ansi,
    /// Two-byte characters
    Unicode,
    /// Decided by the target platform
    Auto,
}

impl CharSet {
    /// The string flag this character set imposes; `Auto` leaves the choice to the platform.
    #[must_use]
    pub fn marshal_flags(self) -> MarshalFlags {
        match self {
            CharSet::None | CharSet::Ansi => MarshalFlags::ANSI_STRINGS,
            CharSet::Unicode => MarshalFlags::UNICODE_STRINGS,
            CharSet::Auto => MarshalFlags::empty(),
        }
    }
}

/// Calling convention of an unmanaged function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, IntoStaticStr)]
pub enum CallingConvention {
    /// Platform default
    #[default]
    Winapi,
    /// Caller cleans the stack
    Cdecl,
    /// Callee cleans the stack
    StdCall,
    /// C++ member function
    ThisCall,
    /// Register based
    FastCall,
}

/// Field layout of a structure or class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    /// The runtime picks the layout, the type cannot be marshaled as a structure
    #[default]
    Auto,
    /// Fields follow declaration order
    Sequential,
    /// Fields carry explicit offsets
    Explicit,
}

/// Kind of COM interface a pointer refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComInterfaceType {
    /// Dual interface
    Dual,
    /// Derives from `IUnknown` only
    IUnknown,
    /// Dispatch-only interface
    IDispatch,
}

/// Kind of class interface generated for a COM-visible class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassInterfaceType {
    /// No class interface
    None,
    /// Dispatch-only class interface
    AutoDispatch,
    /// Dual class interface
    AutoDual,
}

/// A field of a structure or formatted class.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Field type, without pointer levels
    pub ty: TypeRef,
    /// Number of unmanaged pointer levels (`int**` has two)
    pub pointers: u32,
    /// Explicit byte offset
    pub offset: Option<i32>,
    /// Requested representation
    pub marshal_as: Option<MarshalAs>,
}

impl FieldInfo {
    /// Creates a field without offset or marshaling attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        FieldInfo {
            name: name.into(),
            ty,
            pointers: 0,
            offset: None,
            marshal_as: None,
        }
    }

    /// Sets the explicit offset.
    #[must_use]
    pub fn at(mut self, offset: i32) -> Self {
        self.offset = Some(offset);
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
}

/// Layout and fields of a structure or formatted class.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// Field layout
    pub layout: Layout,
    /// Packing size, 0 for the default
    pub pack: i32,
    /// Declared size in bytes, 0 when not declared
    pub size: i32,
    /// Character set of string and char fields
    pub char_set: CharSet,
    /// Fields in declaration order
    pub fields: Vec<FieldInfo>,
}

impl Record {
    /// Creates an empty record with sequential layout.
    #[must_use]
    pub fn sequential() -> Self {
        Record {
            layout: Layout::Sequential,
            ..Record::default()
        }
    }

    /// Creates an empty record with explicit layout.
    #[must_use]
    pub fn explicit() -> Self {
        Record {
            layout: Layout::Explicit,
            ..Record::default()
        }
    }

    /// Sets the packing size.
    #[must_use]
    pub fn with_pack(mut self, pack: i32) -> Self {
        self.pack = pack;
        self
    }

    /// Sets the declared size.
    #[must_use]
    pub fn with_size(mut self, size: i32) -> Self {
        self.size = size;
        self
    }

    /// Sets the character set.
    #[must_use]
    pub fn with_char_set(mut self, char_set: CharSet) -> Self {
        self.char_set = char_set;
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn with_field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Returns true if the record has sequential or explicit layout.
    #[must_use]
    pub fn has_layout(&self) -> bool {
        self.layout != Layout::Auto
    }
}

/// A reference type that is neither an interface, a delegate nor an array.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassType {
    /// Layout and fields; classes with layout marshal as structures
    pub record: Record,
    /// Base class
    pub base: Option<TypeRef>,
    /// Implemented interfaces
    pub interfaces: Vec<TypeRef>,
    /// The class is a COM import
    pub is_import: bool,
    /// The class is visible from COM
    pub com_visible: bool,
    /// Explicit default COM interface
    pub default_interface: Option<TypeRef>,
    /// Generated class interface
    pub class_interface: Option<ClassInterfaceType>,
    /// Declares `static ICustomMarshaler GetInstance(string)`
    pub has_get_instance: bool,
}

impl ClassType {
    /// Creates a class with automatic layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a formatted class.
    #[must_use]
    pub fn with_layout(record: Record) -> Self {
        ClassType {
            record,
            ..ClassType::default()
        }
    }

    /// Sets the base class.
    #[must_use]
    pub fn extends(mut self, base: TypeRef) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Marks the class as a COM import.
    #[must_use]
    pub fn com_import(mut self) -> Self {
        self.is_import = true;
        self
    }

    /// Marks the class as visible from COM.
    #[must_use]
    pub fn com_visible(mut self) -> Self {
        self.com_visible = true;
        self
    }

    /// Sets the default COM interface.
    #[must_use]
    pub fn with_default_interface(mut self, interface: TypeRef) -> Self {
        self.default_interface = Some(interface);
        self
    }

    /// Sets the class interface type.
    #[must_use]
    pub fn with_class_interface(mut self, kind: ClassInterfaceType) -> Self {
        self.class_interface = Some(kind);
        self
    }

    /// Marks the class as providing the custom marshaler factory method.
    #[must_use]
    pub fn with_get_instance(mut self) -> Self {
        self.has_get_instance = true;
        self
    }
}

/// A named enum constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumMember {
    /// Member name
    pub name: String,
    /// Member value
    pub value: i128,
}

/// An enum type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    /// Underlying integral type
    pub underlying: TypeRef,
    /// Carries the `[Flags]` attribute
    pub flags: bool,
    /// Members in declaration order
    pub members: Vec<EnumMember>,
}

impl EnumType {
    /// Creates an enum without members.
    #[must_use]
    pub fn new(underlying: TypeRef) -> Self {
        EnumType {
            underlying,
            flags: false,
            members: Vec::new(),
        }
    }

    /// Marks the enum as a flags enum.
    #[must_use]
    pub fn flags(mut self) -> Self {
        self.flags = true;
        self
    }

    /// Appends a member.
    #[must_use]
    pub fn with_member(mut self, name: impl Into<String>, value: i128) -> Self {
        self.members.push(EnumMember {
            name: name.into(),
            value,
        });
        self
    }
}

/// Parameters and return value of a delegate's `Invoke` method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodShape {
    /// Parameters in declaration order
    pub params: Vec<ParameterInfo>,
    /// Return value
    pub ret: ParameterInfo,
}

/// Settings of the unmanaged function pointer attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FunctionPointerAttribute {
    /// Calling convention of the pointer
    pub calling_convention: CallingConvention,
    /// Character set of string parameters
    pub char_set: CharSet,
}

/// A delegate type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DelegateType {
    /// `Invoke` signature; `None` for a delegate without a specific signature
    pub invoke: Option<MethodShape>,
    /// Unmanaged function pointer attribute
    pub function_pointer: Option<FunctionPointerAttribute>,
}

/// An interface type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterfaceType {
    /// Declared COM interface type; `None` means dual
    pub com_type: Option<ComInterfaceType>,
    /// The interface is visible from COM
    pub com_visible: bool,
}

/// What a managed type is.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Framework type with built-in rules
    Builtin(Builtin),
    /// Single-dimensional array of the element type
    Array(TypeRef),
    /// User value type
    Struct(Record),
    /// User reference type
    Class(ClassType),
    /// Enum
    Enum(EnumType),
    /// Delegate
    Delegate(DelegateType),
    /// Interface
    Interface(InterfaceType),
    /// Instantiated generic type
    Generic {
        /// The instantiation is a value type
        value_type: bool,
    },
    /// A declared type that was never defined
    Opaque,
}

static OPAQUE: TypeKind = TypeKind::Opaque;

static UNKNOWN: ManagedType = ManagedType {
    name: String::new(),
    namespace: String::new(),
    full_name: String::new(),
    nested_in: None,
    kind: OnceLock::new(),
};

/// One registered managed type.
#[derive(Debug)]
pub struct ManagedType {
    name: String,
    namespace: String,
    full_name: String,
    nested_in: Option<TypeRef>,
    kind: OnceLock<TypeKind>,
}

impl ManagedType {
    /// Simple name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace, empty for nested types and arrays.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full name; nested types use `Outer+Inner`.
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Enclosing type of a nested type.
    #[must_use]
    pub fn nested_in(&self) -> Option<TypeRef> {
        self.nested_in
    }

    /// Kind of the type; [`TypeKind::Opaque`] until defined.
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        self.kind.get().unwrap_or(&OPAQUE)
    }
}

/// Append-only registry of managed types.
pub struct TypeUniverse {
    types: boxcar::Vec<ManagedType>,
    by_name: DashMap<String, TypeRef>,
}

impl Default for TypeUniverse {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeUniverse {
    /// Creates a universe holding all [`Builtin`] types.
    #[must_use]
    pub fn new() -> Self {
        let universe = TypeUniverse {
            types: boxcar::Vec::new(),
            by_name: DashMap::new(),
        };

        for builtin in Builtin::iter() {
            let full_name = builtin.full_name();
            let index = universe.types.push(ManagedType {
                name: builtin.name().to_string(),
                namespace: builtin.namespace().to_string(),
                full_name: full_name.clone(),
                nested_in: None,
                kind: OnceLock::from(TypeKind::Builtin(builtin)),
            });
            universe.by_name.insert(full_name, TypeRef(index as u32));
        }

        universe
    }

    /// Returns the handle of a builtin type.
    #[must_use]
    pub fn builtin(&self, builtin: Builtin) -> TypeRef {
        builtin.type_ref()
    }

    fn register(&self, full_name: String, make: impl FnOnce(String) -> ManagedType) -> TypeRef {
        *self
            .by_name
            .entry(full_name.clone())
            .or_insert_with(|| TypeRef(self.types.push(make(full_name)) as u32))
    }

    /// Declares a type by name without defining it, returning the existing handle if the name is
    /// already registered.
    pub fn declare(&self, namespace: &str, name: &str) -> TypeRef {
        let full_name = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", namespace, name)
        };

        self.register(full_name, |full_name| ManagedType {
            name: name.to_string(),
            namespace: namespace.to_string(),
            full_name,
            nested_in: None,
            kind: OnceLock::new(),
        })
    }

    /// Declares a type nested in `outer`.
    pub fn declare_nested(&self, outer: TypeRef, name: &str) -> TypeRef {
        let outer_type = self.get(outer);
        let full_name = format!("{}+{}", outer_type.full_name(), name);
        let namespace = outer_type.namespace().to_string();

        self.register(full_name, |full_name| ManagedType {
            name: name.to_string(),
            namespace,
            full_name,
            nested_in: Some(outer),
            kind: OnceLock::new(),
        })
    }

    /// Defines a declared type.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeAlreadyDefined`] if the type already has a kind, and
    /// [`crate::Error::Malformed`] for a builtin kind, which only [`TypeUniverse::new`] assigns.
    pub fn define(&self, ty: TypeRef, kind: TypeKind) -> Result<()> {
        let managed = self
            .types
            .get(ty.index())
            .ok_or_else(|| TypeNotFound(format!("#{}", ty.index())))?;

        if let TypeKind::Builtin(builtin) = kind {
            return Err(malformed_error!(
                "{} cannot be defined as builtin {}",
                managed.full_name,
                builtin.full_name()
            ));
        }

        managed
            .kind
            .set(kind)
            .map_err(|_| TypeAlreadyDefined(managed.full_name.clone()))
    }

    /// Declares and defines a type in one step.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeAlreadyDefined`] if a type with the same name is already
    /// defined.
    pub fn add(&self, namespace: &str, name: &str, kind: TypeKind) -> Result<TypeRef> {
        let ty = self.declare(namespace, name);
        self.define(ty, kind)?;
        Ok(ty)
    }

    /// Declares and defines a nested type in one step.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeAlreadyDefined`] if a type with the same name is already
    /// defined.
    pub fn add_nested(&self, outer: TypeRef, name: &str, kind: TypeKind) -> Result<TypeRef> {
        let ty = self.declare_nested(outer, name);
        self.define(ty, kind)?;
        Ok(ty)
    }

    /// Returns the single-dimensional array type of `element`, registering it on first use.
    pub fn array_of(&self, element: TypeRef) -> TypeRef {
        let element_type = self.get(element);
        let full_name = format!("{}[]", element_type.full_name());
        let name = format!("{}[]", element_type.name());
        let namespace = element_type.namespace().to_string();

        self.register(full_name, |full_name| ManagedType {
            name,
            namespace,
            full_name,
            nested_in: None,
            kind: OnceLock::from(TypeKind::Array(element)),
        })
    }

    /// Looks up a type by its full name.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if no type with that name is registered.
    pub fn find(&self, full_name: &str) -> Result<TypeRef> {
        self.by_name
            .get(full_name)
            .map(|entry| *entry.value())
            .ok_or_else(|| TypeNotFound(full_name.to_string()))
    }

    /// Returns the record of a type. Handles from another universe resolve to an opaque,
    /// nameless type.
    #[must_use]
    pub fn get(&self, ty: TypeRef) -> &ManagedType {
        self.types.get(ty.index()).unwrap_or(&UNKNOWN)
    }

    /// Number of registered types, builtins included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.count()
    }

    /// Returns true if nothing is registered, which never happens after [`TypeUniverse::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.count() == 0
    }

    /// Kind of a type.
    #[must_use]
    pub fn kind(&self, ty: TypeRef) -> &TypeKind {
        self.get(ty).kind()
    }

    /// Full name of a type.
    #[must_use]
    pub fn full_name(&self, ty: TypeRef) -> &str {
        self.get(ty).full_name()
    }

    /// Name of a type as a C identifier; nested types keep the enclosing type names.
    #[must_use]
    pub fn c_name(&self, ty: TypeRef) -> String {
        let managed = self.get(ty);
        if managed.nested_in.is_some() {
            let skip = if managed.namespace.is_empty() {
                0
            } else {
                managed.namespace.len() + 1
            };
            make_c_identifier(managed.full_name.get(skip..).unwrap_or(&managed.full_name))
        } else {
            make_c_identifier(&managed.name)
        }
    }

    /// Returns the builtin a handle refers to.
    #[must_use]
    pub fn as_builtin(&self, ty: TypeRef) -> Option<Builtin> {
        match self.kind(ty) {
            TypeKind::Builtin(builtin) => Some(*builtin),
            _ => None,
        }
    }

    /// Returns true if `ty` is the given builtin.
    #[must_use]
    pub fn is_builtin(&self, ty: TypeRef, builtin: Builtin) -> bool {
        self.as_builtin(ty) == Some(builtin)
    }

    /// Returns true for value types.
    #[must_use]
    pub fn is_value_type(&self, ty: TypeRef) -> bool {
        match self.kind(ty) {
            TypeKind::Builtin(builtin) => builtin.is_value_type(),
            TypeKind::Struct(_) | TypeKind::Enum(_) => true,
            TypeKind::Generic { value_type } => *value_type,
            _ => false,
        }
    }

    /// Returns true for interfaces.
    #[must_use]
    pub fn is_interface(&self, ty: TypeRef) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Interface(_)
                | TypeKind::Builtin(Builtin::IEnumerator | Builtin::ICustomMarshaler)
        )
    }

    /// Returns true for `System.Delegate` and every delegate type.
    #[must_use]
    pub fn is_delegate(&self, ty: TypeRef) -> bool {
        matches!(
            self.kind(ty),
            TypeKind::Delegate(_) | TypeKind::Builtin(Builtin::Delegate)
        )
    }

    /// Element type of an array type.
    #[must_use]
    pub fn element_type(&self, ty: TypeRef) -> Option<TypeRef> {
        match self.kind(ty) {
            TypeKind::Array(element) => Some(*element),
            _ => None,
        }
    }

    /// Layout record of a structure or class.
    #[must_use]
    pub fn record(&self, ty: TypeRef) -> Option<&Record> {
        match self.kind(ty) {
            TypeKind::Struct(record) => Some(record),
            TypeKind::Class(class) => Some(&class.record),
            _ => None,
        }
    }

    /// Fields of a structure or class, empty for everything else.
    #[must_use]
    pub fn fields(&self, ty: TypeRef) -> &[FieldInfo] {
        self.record(ty).map_or(&[], |record| record.fields.as_slice())
    }

    /// Returns true if the type has sequential or explicit layout.
    #[must_use]
    pub fn has_layout(&self, ty: TypeRef) -> bool {
        self.record(ty).is_some_and(Record::has_layout)
    }

    /// Returns true if `ty` is `base` or derives from it.
    #[must_use]
    pub fn is_subclass_of(&self, ty: TypeRef, base: TypeRef) -> bool {
        let mut current = Some(ty);
        for _ in 0..MAX_TYPE_DEPTH {
            match current {
                Some(candidate) if candidate == base => return true,
                Some(candidate) => {
                    current = match self.kind(candidate) {
                        TypeKind::Class(class) => class.base,
                        _ => None,
                    };
                }
                None => return false,
            }
        }
        false
    }

    /// Returns true if the class or one of its bases implements `interface`.
    #[must_use]
    pub fn implements(&self, ty: TypeRef, interface: TypeRef) -> bool {
        let mut current = Some(ty);
        for _ in 0..MAX_TYPE_DEPTH {
            let Some(candidate) = current else {
                return false;
            };
            let TypeKind::Class(class) = self.kind(candidate) else {
                return false;
            };
            if class.interfaces.contains(&interface) {
                return true;
            }
            current = class.base;
        }
        false
    }

    /// Returns true if the class or one of its bases declares the custom marshaler factory.
    #[must_use]
    pub fn has_get_instance(&self, ty: TypeRef) -> bool {
        let mut current = Some(ty);
        for _ in 0..MAX_TYPE_DEPTH {
            let Some(candidate) = current else {
                return false;
            };
            let TypeKind::Class(class) = self.kind(candidate) else {
                return false;
            };
            if class.has_get_instance {
                return true;
            }
            current = class.base;
        }
        false
    }

    fn is_com_visible(&self, ty: TypeRef) -> bool {
        match self.kind(ty) {
            TypeKind::Interface(interface) => interface.com_visible,
            TypeKind::Class(class) => class.com_visible,
            _ => false,
        }
    }

    fn declared_interface_type(&self, interface: TypeRef) -> ComInterfaceType {
        match self.kind(interface) {
            TypeKind::Interface(InterfaceType {
                com_type: Some(com_type),
                ..
            }) => *com_type,
            _ => ComInterfaceType::Dual,
        }
    }

    /// Approximates the COM interface a pointer to `ty` refers to.
    ///
    /// Returns the interface type together with the concrete interface when one can be named.
    /// Interfaces refer to themselves. COM-imported or COM-visible classes use their default
    /// interface, then their class interface, then the first COM-visible interface they
    /// implement. Everything else is a plain `IUnknown`.
    #[must_use]
    pub fn com_interface_type(&self, ty: TypeRef) -> (ComInterfaceType, Option<TypeRef>) {
        if self.is_interface(ty) {
            return (self.declared_interface_type(ty), Some(ty));
        }

        if let TypeKind::Class(class) = self.kind(ty) {
            if class.is_import || class.com_visible {
                if let Some(interface) = class.default_interface {
                    return (self.declared_interface_type(interface), Some(interface));
                }
                match class.class_interface {
                    Some(ClassInterfaceType::AutoDispatch) => {
                        return (ComInterfaceType::IDispatch, None)
                    }
                    Some(ClassInterfaceType::AutoDual) => return (ComInterfaceType::Dual, None),
                    _ => {}
                }
                if let Some(interface) = class
                    .interfaces
                    .iter()
                    .copied()
                    .find(|interface| self.is_com_visible(*interface))
                {
                    return (self.declared_interface_type(interface), Some(interface));
                }
            }
        }

        (ComInterfaceType::IUnknown, None)
    }

    /// Returns the `VARIANT` type a SAFEARRAY element of type `ty` is stored as.
    #[must_use]
    pub fn type_to_var_enum(&self, ty: TypeRef) -> VarEnum {
        match self.kind(ty) {
            TypeKind::Builtin(builtin) => match builtin {
                Builtin::Boolean => VarEnum::Bool,
                Builtin::Byte => VarEnum::UI1,
                Builtin::Char | Builtin::UInt16 => VarEnum::UI2,
                Builtin::DateTime => VarEnum::Date,
                Builtin::Decimal => VarEnum::Decimal,
                Builtin::Double => VarEnum::R8,
                Builtin::Int16 => VarEnum::I2,
                Builtin::Int32 => VarEnum::I4,
                Builtin::Int64 => VarEnum::I8,
                Builtin::SByte => VarEnum::I1,
                Builtin::Single => VarEnum::R4,
                Builtin::String => VarEnum::BStr,
                Builtin::UInt32 => VarEnum::UI4,
                Builtin::UInt64 => VarEnum::UI8,
                Builtin::Void => VarEnum::Empty,
                Builtin::Object => VarEnum::Variant,
                Builtin::Guid => VarEnum::Clsid,
                Builtin::IntPtr => VarEnum::Int,
                Builtin::UIntPtr => VarEnum::UInt,
                other if other.is_value_type() => VarEnum::Record,
                _ => self.com_var_enum(ty),
            },
            TypeKind::Enum(enumeration) => self.type_to_var_enum(enumeration.underlying),
            TypeKind::Array(_) => VarEnum::Array,
            TypeKind::Struct(_) => VarEnum::Record,
            TypeKind::Generic { value_type: true } => VarEnum::Record,
            _ => self.com_var_enum(ty),
        }
    }

    fn com_var_enum(&self, ty: TypeRef) -> VarEnum {
        match self.com_interface_type(ty).0 {
            ComInterfaceType::IDispatch => VarEnum::Dispatch,
            _ => VarEnum::Unknown,
        }
    }

    /// Returns true if the managed and native representations of a structure are identical.
    ///
    /// Pointers, integers and floating point numbers are blittable, as are `Guid`, `decimal` and
    /// `DateTime`. A `char` is blittable unless it is marshaled as ANSI, and nested structures are
    /// blittable when all their fields are. Booleans and every reference type are not.
    #[must_use]
    pub fn is_blittable(&self, ty: TypeRef, ansi_platform: bool) -> bool {
        self.is_blittable_at(ty, ansi_platform, 0)
    }

    fn is_blittable_at(&self, ty: TypeRef, ansi_platform: bool, depth: usize) -> bool {
        if depth > MAX_TYPE_DEPTH {
            return false;
        }

        let Some(record) = self.record(ty) else {
            return false;
        };

        record
            .fields
            .iter()
            .all(|field| self.is_field_blittable(record, field, ansi_platform, depth))
    }

    fn is_field_blittable(
        &self,
        record: &Record,
        field: &FieldInfo,
        ansi_platform: bool,
        depth: usize,
    ) -> bool {
        if field.pointers > 0 {
            return true;
        }

        match self.kind(field.ty) {
            TypeKind::Builtin(Builtin::Char) => {
                let ansi = match field.marshal_as.as_ref() {
                    Some(marshal_as) => {
                        matches!(marshal_as.value, UnmanagedType::I1 | UnmanagedType::U1)
                    }
                    None => match record.char_set {
                        CharSet::Ansi | CharSet::None => true,
                        CharSet::Unicode => false,
                        CharSet::Auto => ansi_platform,
                    },
                };
                !ansi
            }
            TypeKind::Builtin(builtin) => {
                builtin.is_integral()
                    || matches!(
                        builtin,
                        Builtin::Single
                            | Builtin::Double
                            | Builtin::IntPtr
                            | Builtin::UIntPtr
                            | Builtin::Guid
                            | Builtin::Decimal
                            | Builtin::DateTime
                    )
            }
            TypeKind::Enum(enumeration) => self
                .as_builtin(enumeration.underlying)
                .is_some_and(Builtin::is_integral),
            TypeKind::Struct(_) => self.is_blittable_at(field.ty, ansi_platform, depth + 1),
            _ => false,
        }
    }

    /// Returns the name of the type the marshaler may substitute for a single-field wrapper
    /// structure, e.g. `int` for `struct { int x; }`.
    ///
    /// Returns `Ok(None)` when `ty` is not such a wrapper.
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] if the chain of nested wrappers does not end.
    pub fn normalized_type(&self, ty: TypeRef, pointer_size: u32) -> Result<Option<String>> {
        let mut current = ty;

        for _ in 0..MAX_TYPE_DEPTH {
            let TypeKind::Struct(record) = self.kind(current) else {
                return Ok(None);
            };
            let [field] = record.fields.as_slice() else {
                return Ok(None);
            };

            // nested wrappers are measured when the walk reaches them
            let size = if record.size > 0 {
                Some(record.size.unsigned_abs())
            } else if field.pointers > 0 {
                Some(pointer_size)
            } else {
                self.as_builtin(field.ty)
                    .and_then(|builtin| builtin.primitive_size(pointer_size))
            };
            if record.has_layout() && size.is_some_and(|size| size != 4 && size != 8) {
                return Ok(None);
            }

            if field.pointers > 0 {
                return Ok(Some(format!(
                    "{}{}",
                    self.full_name(field.ty),
                    "*".repeat(field.pointers as usize)
                )));
            }

            match self.kind(field.ty) {
                TypeKind::Builtin(
                    Builtin::Int32
                    | Builtin::UInt32
                    | Builtin::Int64
                    | Builtin::UInt64
                    | Builtin::IntPtr
                    | Builtin::UIntPtr,
                ) => return Ok(Some(self.full_name(field.ty).to_string())),
                TypeKind::Struct(_) => current = field.ty,
                _ => return Ok(None),
            }
        }

        Err(RecursionLimit(MAX_TYPE_DEPTH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered_in_order() {
        let universe = TypeUniverse::new();
        for builtin in Builtin::iter() {
            let ty = universe.builtin(builtin);
            assert_eq!(universe.as_builtin(ty), Some(builtin));
            assert_eq!(universe.find(&builtin.full_name()).ok(), Some(ty));
        }
        assert_eq!(universe.len(), Builtin::iter().count());
        assert_eq!(universe.full_name(universe.builtin(Builtin::StringBuilder)), "System.Text.StringBuilder");
    }

    #[test]
    fn test_declare_then_define() {
        let universe = TypeUniverse::new();
        let node = universe.declare("Contoso", "Node");
        assert_eq!(universe.kind(node), &TypeKind::Opaque);

        let record = Record::sequential().with_field(FieldInfo::new("next", node).with_pointers(1));
        universe.define(node, TypeKind::Struct(record)).unwrap();
        assert!(universe.is_value_type(node));
        assert_eq!(universe.declare("Contoso", "Node"), node);

        assert!(matches!(
            universe.define(node, TypeKind::Opaque),
            Err(TypeAlreadyDefined(_))
        ));
        assert!(matches!(universe.find("Contoso.Missing"), Err(TypeNotFound(_))));

        let fake = universe.declare("Contoso", "Fake");
        assert!(matches!(
            universe.define(fake, TypeKind::Builtin(Builtin::Int32)),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn test_nested_names() {
        let universe = TypeUniverse::new();
        let outer = universe.add("Contoso", "Outer", TypeKind::Class(ClassType::new())).unwrap();
        let inner = universe
            .add_nested(outer, "Inner", TypeKind::Struct(Record::sequential()))
            .unwrap();

        assert_eq!(universe.full_name(inner), "Contoso.Outer+Inner");
        assert_eq!(universe.c_name(inner), "Outer_Inner");
        assert_eq!(universe.c_name(outer), "Outer");
    }

    #[test]
    fn test_array_of_is_cached() {
        let universe = TypeUniverse::new();
        let int32 = universe.builtin(Builtin::Int32);
        let first = universe.array_of(int32);
        let second = universe.array_of(int32);
        assert_eq!(first, second);
        assert_eq!(universe.element_type(first), Some(int32));
        assert_eq!(universe.full_name(first), "System.Int32[]");
    }

    #[test]
    fn test_com_interface_type() {
        let universe = TypeUniverse::new();
        let dispatch = universe
            .add(
                "Contoso",
                "IPrinter",
                TypeKind::Interface(InterfaceType {
                    com_type: Some(ComInterfaceType::IDispatch),
                    com_visible: true,
                }),
            )
            .unwrap();
        let hidden = universe
            .add("Contoso", "IHidden", TypeKind::Interface(InterfaceType::default()))
            .unwrap();

        let class = universe
            .add(
                "Contoso",
                "Printer",
                TypeKind::Class(ClassType::new().com_visible().implements(hidden).implements(dispatch)),
            )
            .unwrap();
        assert_eq!(
            universe.com_interface_type(class),
            (ComInterfaceType::IDispatch, Some(dispatch))
        );

        let auto_dual = universe
            .add(
                "Contoso",
                "AutoDual",
                TypeKind::Class(
                    ClassType::new()
                        .com_import()
                        .with_class_interface(ClassInterfaceType::AutoDual),
                ),
            )
            .unwrap();
        assert_eq!(universe.com_interface_type(auto_dual), (ComInterfaceType::Dual, None));

        let plain = universe.add("Contoso", "Plain", TypeKind::Class(ClassType::new())).unwrap();
        assert_eq!(universe.com_interface_type(plain), (ComInterfaceType::IUnknown, None));
        assert_eq!(universe.type_to_var_enum(plain), VarEnum::Unknown);
        assert_eq!(universe.type_to_var_enum(class), VarEnum::Dispatch);
    }

    #[test]
    fn test_blittability() {
        let universe = TypeUniverse::new();
        let int32 = universe.builtin(Builtin::Int32);
        let char_ty = universe.builtin(Builtin::Char);
        let boolean = universe.builtin(Builtin::Boolean);

        let plain = universe
            .add(
                "",
                "Plain",
                TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("a", int32))),
            )
            .unwrap();
        let wide = universe
            .add(
                "",
                "Wide",
                TypeKind::Struct(
                    Record::sequential()
                        .with_char_set(CharSet::Unicode)
                        .with_field(FieldInfo::new("c", char_ty))
                        .with_field(FieldInfo::new("inner", plain)),
                ),
            )
            .unwrap();
        let narrow = universe
            .add(
                "",
                "Narrow",
                TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("c", char_ty))),
            )
            .unwrap();
        let flag = universe
            .add(
                "",
                "Flag",
                TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("b", boolean))),
            )
            .unwrap();

        assert!(universe.is_blittable(plain, false));
        assert!(universe.is_blittable(wide, true));
        assert!(!universe.is_blittable(narrow, false));
        assert!(!universe.is_blittable(flag, false));
    }

    #[test]
    fn test_normalized_type() {
        let universe = TypeUniverse::new();
        let int32 = universe.builtin(Builtin::Int32);
        let int16 = universe.builtin(Builtin::Int16);

        let handle = universe
            .add(
                "",
                "Handle",
                TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("value", int32))),
            )
            .unwrap();
        let wrapper = universe
            .add(
                "",
                "Wrapper",
                TypeKind::Struct(
                    Record::sequential()
                        .with_size(4)
                        .with_field(FieldInfo::new("inner", handle)),
                ),
            )
            .unwrap();
        let small = universe
            .add(
                "",
                "Small",
                TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("value", int16))),
            )
            .unwrap();

        assert_eq!(universe.normalized_type(handle, 4).unwrap().as_deref(), Some("System.Int32"));
        assert_eq!(universe.normalized_type(wrapper, 4).unwrap().as_deref(), Some("System.Int32"));
        assert_eq!(universe.normalized_type(small, 4).unwrap(), None);
    }
}
