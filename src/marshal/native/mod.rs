//! Classification of managed type occurrences into native types.
//!
//! A [`Classifier`] turns a [`TypeDescriptor`] into a [`NativeType`]: it picks the table of
//! representations legal for the occurrence, validates the requested `MarshalAs`, substitutes
//! the default when the request is illegal or missing, and logs hints about what the runtime
//! marshaler is going to do. Classification never fails; problems end up in the log of the
//! returned [`NativeType`].
//!
//! # Key Components
//!
//! - [`Classifier`] - Classification entry points, bound to a universe and a definition cache
//! - [`NativeType`] - The classified native type with its diagnostics
//! - [`NativeKind`] - Closed set of native type variants
//!
//! # Examples
//!
//! ```rust
//! use marshalscope::marshal::{
//!     Builtin, Classifier, DefinitionCache, MarshalFlags, TypeDescriptor, TypeUniverse,
//! };
//! use marshalscope::output::{PrintFlags, TextCodePrinter};
//!
//! let universe = TypeUniverse::new();
//! let mut cache = DefinitionCache::new();
//! let mut classifier = Classifier::new(&universe, &mut cache);
//!
//! let desc = TypeDescriptor::new(universe.builtin(Builtin::UInt16), MarshalFlags::empty());
//! let native = classifier.classify(&desc);
//!
//! let mut printer = TextCodePrinter::new();
//! native.print_to(&mut printer, PrintFlags::empty());
//! assert_eq!(printer.as_str(), "WORD");
//! assert_eq!(native.size(), 2);
//! ```

mod array;
mod defined;
mod interface;
mod primitive;
mod string;

pub use array::{ArrayForm, ArrayType};
pub use defined::DefinedType;
pub use interface::InterfacePointer;
pub use string::StringType;

use std::sync::Arc;

use crate::{
    diagnostics::{Log, Message},
    marshal::{
        definitions::{DefHandle, DefKey, Definition, DefinitionCache, DefinitionSet},
        descriptor::{ParameterInfo, SiblingParameter, TypeDescriptor},
        flags::MarshalFlags,
        typename::TypeName,
        unmanaged::{allowed, UnmanagedType},
        universe::{Builtin, FieldInfo, TypeKind, TypeRef, TypeUniverse},
    },
    output::{CodePrinter, LogPrinter, OutputType, PrintFlags},
};

/// The variant of a [`NativeType`].
#[derive(Debug, Clone, PartialEq)]
pub enum NativeKind {
    /// Integers, floats, booleans, `void` and opaque pointers
    Primitive(TypeName),
    /// `char`
    Char(TypeName),
    /// `string` and `StringBuilder`
    String(StringType),
    /// `DateTime` as OLE `DATE`
    Date,
    /// `decimal` as `DECIMAL` or `CURRENCY`
    Decimal {
        /// `DECIMAL` or `CURRENCY`
        name: TypeName,
        /// Requested as `LPStruct`
        lp_struct: bool,
    },
    /// `Guid`
    Guid {
        /// Requested as `LPStruct`
        lp_struct: bool,
    },
    /// `HandleRef`, `SafeHandle` and `CriticalHandle`
    Handle,
    /// `Color` as `OLE_COLOR`
    Color,
    /// `ArgIterator` as `va_list`
    VarArgs,
    /// Value marshaled by a custom marshaler
    CustomMarshaled,
    /// COM interface pointer or `VARIANT`
    Interface(InterfacePointer),
    /// Arrays
    Array(Box<ArrayType>),
    /// Structure, union or formatted class
    Structure(DefinedType),
    /// Enum
    Enum(DefinedType),
    /// Delegate as function pointer or `_Delegate` interface
    Callback(DefinedType),
}

/// The native counterpart of one occurrence of a managed type.
///
/// Immutable once classified. Out-of-line definitions are referenced by [`DefHandle`] and
/// live in the [`DefinitionCache`] the value was classified against.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeType {
    kind: NativeKind,
    log: Log,
    indirections: u32,
    by_ref: bool,
    desc_in: bool,
    desc_out: bool,
    pointer_size: u32,
}

impl NativeType {
    /// A primitive with a fixed name that does not depend on any occurrence context.
    #[must_use]
    pub fn primitive(name: TypeName, indirections: u32, pointer_size: u32) -> Self {
        NativeType {
            kind: NativeKind::Primitive(name),
            log: Log::new(),
            indirections,
            by_ref: false,
            desc_in: false,
            desc_out: false,
            pointer_size,
        }
    }

    /// An untyped pointer, used wherever no legal representation exists.
    #[must_use]
    pub fn opaque_pointer(pointer_size: u32) -> Self {
        Self::primitive(TypeName::VOID, 1, pointer_size)
    }

    fn from_desc(desc: &TypeDescriptor, kind: NativeKind, indirections: u32) -> Self {
        NativeType {
            kind,
            log: Log::new(),
            indirections,
            by_ref: desc.is_by_ref(),
            desc_in: desc.marshals_in(),
            desc_out: desc.marshals_out(),
            pointer_size: desc.pointer_size(),
        }
    }

    /// The variant.
    #[must_use]
    pub fn kind(&self) -> &NativeKind {
        &self.kind
    }

    /// Diagnostics produced while classifying this occurrence.
    #[must_use]
    pub fn log(&self) -> &Log {
        &self.log
    }

    /// Number of pointer levels applied to the base type.
    #[must_use]
    pub fn indirections(&self) -> u32 {
        self.indirections
    }

    /// Returns true if no legal native representation exists.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(&self.kind, NativeKind::Array(array) if array.form == ArrayForm::Invalid)
    }

    /// The out-of-line definition this type refers to, if any.
    #[must_use]
    pub fn definition(&self) -> Option<DefHandle> {
        match &self.kind {
            NativeKind::Structure(defined)
            | NativeKind::Enum(defined)
            | NativeKind::Callback(defined) => Some(defined.definition),
            _ => None,
        }
    }

    fn base_name(&self) -> Option<TypeName> {
        match &self.kind {
            NativeKind::Primitive(name) | NativeKind::Char(name) => Some(name.clone()),
            NativeKind::String(string) => Some(string.name.clone()),
            NativeKind::Date => Some(TypeName::DATE),
            NativeKind::Decimal { name, .. } => Some(name.clone()),
            NativeKind::Guid { .. } => Some(TypeName::GUID),
            NativeKind::Handle => Some(TypeName::HANDLE),
            NativeKind::Color => Some(TypeName::OLE_COLOR),
            NativeKind::VarArgs => Some(TypeName::VA_LIST),
            NativeKind::CustomMarshaled => Some(TypeName::VOID),
            NativeKind::Interface(interface) => Some(interface.name.clone()),
            NativeKind::Array(_)
            | NativeKind::Structure(_)
            | NativeKind::Enum(_)
            | NativeKind::Callback(_) => None,
        }
    }

    fn primitive_size(&self) -> u32 {
        if self.indirections > 0 {
            self.pointer_size
        } else {
            self.base_name()
                .map_or(self.pointer_size, |name| name.size(self.pointer_size))
        }
    }

    /// Size in bytes, including any padding.
    #[must_use]
    pub fn size(&self) -> u32 {
        match &self.kind {
            NativeKind::String(StringType {
                fixed_length: Some(length),
                fixed_ansi,
                ..
            }) => length.saturating_mul(if *fixed_ansi { 1 } else { 2 }),
            NativeKind::Array(array) => array.size(self.pointer_size),
            NativeKind::Structure(defined)
            | NativeKind::Enum(defined)
            | NativeKind::Callback(defined) => {
                if self.indirections > 0 {
                    self.pointer_size
                } else {
                    defined.size
                }
            }
            _ => self.primitive_size(),
        }
    }

    /// Alignment requirement in bytes.
    #[must_use]
    pub fn alignment(&self) -> u32 {
        match &self.kind {
            NativeKind::String(StringType {
                fixed_length: Some(_),
                fixed_ansi,
                ..
            }) => {
                if *fixed_ansi {
                    1
                } else {
                    2
                }
            }
            NativeKind::Decimal { .. } if self.indirections == 0 => 8,
            NativeKind::Guid { .. } if self.indirections == 0 => 4,
            NativeKind::Interface(interface) if interface.variant && self.indirections == 0 => 8,
            NativeKind::Array(array) => array.alignment(self.pointer_size),
            NativeKind::Structure(defined)
            | NativeKind::Enum(defined)
            | NativeKind::Callback(defined) => {
                if self.indirections > 0 {
                    self.pointer_size
                } else {
                    defined.alignment
                }
            }
            _ => self.size(),
        }
    }

    /// Returns true if data flows from managed to native code.
    #[must_use]
    pub fn marshals_in(&self) -> bool {
        self.desc_in || !self.desc_out
    }

    /// Returns true if data flows from native to managed code.
    #[must_use]
    pub fn marshals_out(&self) -> bool {
        match &self.kind {
            NativeKind::String(string) if self.indirections == 0 && string.immutable => false,
            NativeKind::Interface(interface) => {
                let threshold = if interface.undefined { 1 } else { 0 };
                self.desc_out || (self.indirections > threshold && !self.desc_in)
            }
            NativeKind::Array(_) => self.desc_out || (self.indirections > 0 && !self.desc_in),
            NativeKind::Structure(defined) => {
                self.desc_out || (!defined.by_default_in_only && !self.desc_in)
            }
            _ => self.desc_out || !self.desc_in,
        }
    }

    /// Returns true if the value travels through a pointer whose direction is worth annotating.
    #[must_use]
    pub fn marshals_as_pointer_with_known_direction(&self) -> bool {
        match &self.kind {
            NativeKind::String(string) => !string.struct_field,
            NativeKind::Array(array) => !array.struct_field,
            NativeKind::Decimal { lp_struct, .. } | NativeKind::Guid { lp_struct } => {
                *lp_struct || self.by_ref
            }
            NativeKind::Interface(interface) => self.by_ref || !interface.variant,
            NativeKind::Structure(defined) => self.by_ref || defined.by_default_in_only,
            _ => self.by_ref,
        }
    }

    /// Prints the type as it appears in front of an identifier.
    pub fn print_to(&self, printer: &mut dyn CodePrinter, flags: PrintFlags) {
        match &self.kind {
            NativeKind::Array(array) => array.print_to(printer, flags, self.indirections),
            NativeKind::Structure(defined)
            | NativeKind::Enum(defined)
            | NativeKind::Callback(defined) => defined.print_to(printer, self.indirections),
            NativeKind::Interface(interface)
                if interface.undefined && flags.contains(PrintFlags::USE_DEFINED_COM_INTERFACES) =>
            {
                TypeName::IUNKNOWN.print_to(printer, flags, self.indirections.saturating_sub(1));
            }
            _ => {
                if let Some(name) = self.base_name() {
                    name.print_to(printer, flags, self.indirections);
                }
            }
        }
    }

    /// Prints what follows the identifier: array brackets or a fixed string length.
    pub fn print_post_identifier_to(&self, printer: &mut dyn CodePrinter) {
        match &self.kind {
            NativeKind::String(StringType {
                fixed_length: Some(length),
                ..
            }) => {
                printer.print(OutputType::Operator, "[");
                printer.print(OutputType::Literal, &length.to_string());
                printer.print(OutputType::Operator, "]");
            }
            NativeKind::Array(array) => array.print_post_identifier_to(printer, self.indirections),
            _ => {}
        }
    }

    /// Prints `/*[in]*/`, `/*[out]*/` or `/*[in,out]*/` for pointers with a known direction.
    pub fn print_marshal_direction(&self, printer: &mut dyn CodePrinter) {
        if !self.marshals_as_pointer_with_known_direction() {
            return;
        }

        let annotation = match (self.marshals_in(), self.marshals_out()) {
            (true, true) => "/*[in,out]*/",
            (false, true) => "/*[out]*/",
            _ => "/*[in]*/",
        };
        printer.print(OutputType::Comment, annotation);
        printer.print(OutputType::Other, " ");
    }

    /// Prints the diagnostics of this type and of the element type of an array.
    pub fn print_log(&self, log_printer: &mut dyn LogPrinter, prefix: &str) {
        self.log.print_to(log_printer, prefix);
        if let NativeKind::Array(array) = &self.kind {
            if let Some(element) = &array.element {
                element.print_log(log_printer, prefix);
            }
        }
    }

    /// Adds the definitions this type depends on to `set`.
    ///
    /// `parent` is the definition containing this type; it receives a dependency on every
    /// definition found.
    pub fn collect_definitions(
        &self,
        cache: &DefinitionCache,
        set: &mut DefinitionSet,
        parent: Option<DefHandle>,
    ) {
        match &self.kind {
            NativeKind::Array(array) => {
                if let Some(element) = &array.element {
                    element.collect_definitions(cache, set, parent);
                }
            }
            NativeKind::Structure(defined)
            | NativeKind::Enum(defined)
            | NativeKind::Callback(defined) => defined.collect(cache, set, parent),
            _ => {}
        }
    }
}

/// Classifies occurrences of managed types against one [`TypeUniverse`].
///
/// Definitions created along the way are stored in the borrowed [`DefinitionCache`].
pub struct Classifier<'a> {
    universe: &'a TypeUniverse,
    cache: &'a mut DefinitionCache,
}

impl<'a> Classifier<'a> {
    /// Binds a classifier to a universe and a definition cache.
    pub fn new(universe: &'a TypeUniverse, cache: &'a mut DefinitionCache) -> Self {
        Classifier { universe, cache }
    }

    /// The universe types are resolved against.
    #[must_use]
    pub fn universe(&self) -> &'a TypeUniverse {
        self.universe
    }

    /// The cache definitions are stored in.
    #[must_use]
    pub fn cache(&self) -> &DefinitionCache {
        self.cache
    }

    /// Classifies a plain occurrence of `ty`.
    pub fn classify_type(&mut self, ty: TypeRef, flags: MarshalFlags) -> NativeType {
        self.classify(&TypeDescriptor::new(ty, flags))
    }

    /// Classifies a parameter or return value.
    pub fn classify_parameter(
        &mut self,
        param: &ParameterInfo,
        siblings: Option<Arc<[SiblingParameter]>>,
        flags: MarshalFlags,
    ) -> NativeType {
        self.classify(&TypeDescriptor::from_parameter(param, siblings, flags))
    }

    /// Classifies a structure field.
    pub fn classify_field(&mut self, field: &FieldInfo, flags: MarshalFlags) -> NativeType {
        self.classify(&TypeDescriptor::from_field(field, flags))
    }

    /// Classifies an element of an array type.
    pub fn classify_array_element(
        &mut self,
        array_ty: TypeRef,
        element: Option<UnmanagedType>,
        flags: MarshalFlags,
    ) -> NativeType {
        let desc = TypeDescriptor::for_array_element(self.universe, array_ty, element, flags);
        self.classify(&desc)
    }

    /// Classifies one occurrence.
    pub fn classify(&mut self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let ty = desc.ty();

        if desc.unmanaged() == Some(UnmanagedType::CustomMarshaler) {
            return self.custom_marshaled(desc);
        }

        match universe.kind(ty) {
            TypeKind::Enum(_) => return self.enumeration(desc),
            TypeKind::Generic { .. } => {
                let mut native = NativeType::opaque_pointer(desc.pointer_size());
                native.log.add(Message::GenericTypesNotAllowed);
                return native;
            }
            TypeKind::Builtin(builtin) => {
                if let Some(native) = self.scalar(desc, *builtin) {
                    return native;
                }
            }
            _ => {}
        }

        if universe.is_value_type(ty) {
            self.value_type(desc)
        } else {
            self.reference_type(desc)
        }
    }

    fn scalar(&mut self, desc: &TypeDescriptor, builtin: Builtin) -> Option<NativeType> {
        let table = match builtin {
            Builtin::Boolean if desc.is_com() => allowed::BOOLEAN_C,
            Builtin::Boolean => allowed::BOOLEAN_P,
            Builtin::Byte => allowed::BYTE,
            Builtin::SByte => allowed::SBYTE,
            Builtin::Int16 => allowed::INT16,
            Builtin::UInt16 => allowed::UINT16,
            Builtin::Int32 => allowed::INT32,
            Builtin::UInt32 => allowed::UINT32,
            Builtin::Int64 => allowed::INT64,
            Builtin::UInt64 => allowed::UINT64,
            Builtin::Single => allowed::SINGLE,
            Builtin::Double => allowed::DOUBLE,
            Builtin::Char => return Some(self.character(desc)),
            Builtin::String => return Some(self.string(desc)),
            Builtin::DateTime => return Some(self.date(desc)),
            Builtin::Decimal => return Some(self.decimal(desc)),
            _ => return None,
        };
        Some(self.primitive(desc, table))
    }

    fn value_type(&mut self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        match universe.as_builtin(desc.ty()) {
            Some(Builtin::Void) => {
                NativeType::primitive(TypeName::VOID, desc.pointers(), desc.pointer_size())
            }
            Some(Builtin::IntPtr | Builtin::UIntPtr) => self.primitive(desc, allowed::INTPTR),
            Some(Builtin::Guid) => self.guid(desc),
            Some(Builtin::ArrayWithOffset) if !desc.is_struct_field() => {
                let mut native = NativeType::opaque_pointer(desc.pointer_size());
                self.validate(desc, allowed::EMPTY, &mut native);
                native
            }
            Some(Builtin::HandleRef) if !desc.is_struct_field() => self.handle(desc),
            Some(Builtin::Color) if !desc.is_struct_field() => self.color(desc),
            Some(Builtin::ArgIterator) => self.var_args(desc),
            _ => self.structure(desc),
        }
    }

    fn reference_type(&mut self, desc: &TypeDescriptor) -> NativeType {
        let universe = self.universe;
        let ty = desc.ty();

        if universe.is_delegate(ty) {
            return self.callback(desc);
        }
        if universe.is_builtin(ty, Builtin::StringBuilder) {
            return self.string(desc);
        }
        if !desc.is_array_element() && universe.has_layout(ty) {
            return self.structure(desc);
        }
        if universe.is_builtin(ty, Builtin::Object) {
            return self.interface(desc);
        }
        if universe.is_builtin(ty, Builtin::Array) {
            let table = if desc.is_struct_field() {
                allowed::ARRAY_CLASS_FIELD
            } else {
                allowed::ARRAY_CLASS
            };
            let explicit = desc
                .unmanaged()
                .and_then(|unmanaged| table.iter().position(|u| *u == unmanaged))
                .is_some_and(|position| position > 0);
            return if explicit {
                self.array(desc)
            } else {
                self.interface(desc)
            };
        }
        if universe.is_builtin(ty, Builtin::IEnumerator) && desc.marshal_as().is_none() {
            return self.enumerator(desc);
        }
        if universe.is_subclass_of(ty, universe.builtin(Builtin::SafeHandle))
            || universe.is_subclass_of(ty, universe.builtin(Builtin::CriticalHandle))
        {
            return self.handle(desc);
        }
        if universe.is_interface(ty) {
            return self.interface(desc);
        }
        if universe.element_type(ty).is_some() {
            return self.array(desc);
        }
        self.interface(desc)
    }

    /// Starts a primitive-like native type: pointer levels plus the by-ref level, with the
    /// direction attributes checked.
    fn primitive_base(&self, desc: &TypeDescriptor, kind: NativeKind) -> NativeType {
        let indirections = desc.pointers() + u32::from(desc.is_by_ref());
        let mut native = NativeType::from_desc(desc, kind, indirections);
        self.verify_marshal_direction(desc, &mut native);
        native
    }

    /// Validates the requested representation against `table`, whose first entry is the
    /// default. An empty table forbids any request and yields `AsAny`.
    fn validate(
        &self,
        desc: &TypeDescriptor,
        table: &[UnmanagedType],
        native: &mut NativeType,
    ) -> UnmanagedType {
        match table.first() {
            Some(default) => self.validate_or(desc, table, *default, native),
            None => {
                if let Some(requested) = desc.unmanaged() {
                    native.log.add(Message::UnrecognizedMarshalingForContext(
                        self.universe.full_name(desc.ty()).to_string(),
                        requested.to_string(),
                    ));
                }
                UnmanagedType::AsAny
            }
        }
    }

    fn validate_or(
        &self,
        desc: &TypeDescriptor,
        table: &[UnmanagedType],
        default: UnmanagedType,
        native: &mut NativeType,
    ) -> UnmanagedType {
        let Some(requested) = desc.unmanaged() else {
            return default;
        };
        if table.contains(&requested) {
            return requested;
        }

        native.log.add(Message::UnrecognizedMarshalingForContext(
            self.universe.full_name(desc.ty()).to_string(),
            requested.to_string(),
        ));
        default
    }

    fn verify_marshal_direction(&self, desc: &TypeDescriptor, native: &mut NativeType) {
        if desc.is_array_element() || desc.is_struct_field() {
            return;
        }
        if desc.pointers() > 0 || desc.is_by_ref() {
            return;
        }

        let universe = self.universe;
        let ty = desc.ty();
        let requested = desc.unmanaged();

        if universe.is_value_type(ty) {
            if requested == Some(UnmanagedType::LPStruct) {
                return;
            }
            if desc.marshals_out() {
                native.log.add(Message::ByValValueTypeMarkedOut);
                native.desc_out = false;
            }
            return;
        }

        if universe.is_builtin(ty, Builtin::Object) && requested == Some(UnmanagedType::AsAny) {
            return;
        }

        let is_array = universe.element_type(ty).is_some();
        if is_array || (universe.has_layout(ty) && requested != Some(UnmanagedType::Interface)) {
            if !desc.marshals_in() && !desc.marshals_out() {
                native.log.add(Message::DefaultArrayAndRefTypeMarshaling);
            }
        } else if universe.is_builtin(ty, Builtin::String)
            || universe.is_builtin(ty, Builtin::StringBuilder)
        {
        } else if desc.marshals_out() {
            native.log.add(Message::ByValRefTypeMarkedOut(
                universe.full_name(ty).to_string(),
            ));
            native.desc_out = false;
        }
    }

    /// Logs who allocates and frees the buffer behind a pointer.
    fn explain_memory_management(desc: &TypeDescriptor, subject: &str, native: &mut NativeType) {
        let subject = subject.to_string();
        let message = if desc.is_callback() {
            if desc.is_by_ref() {
                if desc.marshals_in() == desc.marshals_out() {
                    Message::BufferCallbackInOut(subject)
                } else if desc.marshals_in() {
                    Message::BufferCallbackIn(subject)
                } else {
                    Message::BufferCallbackOut(subject)
                }
            } else if desc.is_ret_val() {
                Message::BufferCallbackOut(subject)
            } else {
                Message::BufferCallbackIn(subject)
            }
        } else if desc.is_by_ref() {
            if desc.marshals_in() == desc.marshals_out() {
                Message::BufferInOut(subject)
            } else if desc.marshals_in() {
                Message::BufferTemporaryIn(subject)
            } else {
                Message::BufferOut(subject)
            }
        } else if desc.is_ret_val() {
            Message::BufferOut(subject)
        } else {
            return;
        };
        native.log.add(message);
    }

    /// Returns the definition registered for `key`, building it on first use.
    ///
    /// The handle is reserved before `build` runs, so a definition that refers back to itself
    /// finds the handle and reads a size of 0.
    pub(crate) fn definition(
        &mut self,
        key: DefKey,
        build: impl FnOnce(&mut Classifier<'_>) -> Definition,
    ) -> DefHandle {
        if let Some(handle) = self.cache.lookup(&key) {
            log::trace!("definition cache hit for {:?}", key);
            return handle;
        }

        let handle = self.cache.reserve(key);
        log::trace!("building definition #{} for {:?}", handle.index(), key);
        let definition = build(self);
        self.cache.complete(handle, definition);
        handle
    }
}
