//! Marshaling classification and native layout.
//!
//! This module turns occurrences of managed types (parameters, return values, fields, array
//! elements) into the native types the runtime marshaler passes across the boundary, and turns
//! structures into native declarations whose size and field offsets match what the marshaler
//! produces.
//!
//! # Key Components
//!
//! - [`universe`] - The registry of managed types, [`TypeUniverse`]
//! - [`descriptor`] - [`TypeDescriptor`], one occurrence of a managed type
//! - [`native`] - [`Classifier`] and the classified [`NativeType`]
//! - [`definitions`] - Structures, enums and callbacks printed out of line, and their cache
//! - [`signature`] - Native prototypes of P/Invoke methods, COM methods and delegates
//! - [`typename`] - Native type spellings in the Windows and plain C dialects
//!
//! # Examples
//!
//! ```rust
//! use marshalscope::marshal::{
//!     Builtin, Classifier, DefinitionCache, FieldInfo, MarshalFlags, Record, TypeKind,
//!     TypeUniverse,
//! };
//!
//! let universe = TypeUniverse::new();
//! let header = universe.add(
//!     "Contoso",
//!     "Header",
//!     TypeKind::Struct(
//!         Record::sequential()
//!             .with_field(FieldInfo::new("tag", universe.builtin(Builtin::Byte)))
//!             .with_field(FieldInfo::new("length", universe.builtin(Builtin::Int64))),
//!     ),
//! )?;
//!
//! let mut cache = DefinitionCache::new();
//! let native = Classifier::new(&universe, &mut cache).classify_type(header, MarshalFlags::empty());
//! assert_eq!(native.size(), 16);
//! assert_eq!(native.alignment(), 8);
//! # Ok::<(), marshalscope::Error>(())
//! ```

/// Out-of-line definitions and the cache sharing them
pub mod definitions;
/// Type descriptors and `MarshalAs` annotations
pub mod descriptor;
/// Occurrence context flags
pub mod flags;
/// C identifier and literal helpers
pub mod ident;
/// Classification into native types
pub mod native;
/// Native function signatures
pub mod signature;
/// Native type spellings
pub mod typename;
/// Requested representations and legality tables
pub mod unmanaged;
/// The managed type registry
pub mod universe;

pub use definitions::{
    DefHandle, DefKey, Definition, DefinitionCache, DefinitionSet, NativeField, SetItem,
    SharedDefinitionCache, StructureDefinition,
};
pub use descriptor::{
    CustomMarshalerRef, DefaultValue, MarshalAs, ParamAttributes, ParameterInfo,
    SiblingParameter, TypeDescriptor,
};
pub use flags::MarshalFlags;
pub use native::{Classifier, NativeKind, NativeType};
pub use signature::{ComMethod, NativeParameter, NativeSignature, PInvokeMethod};
pub use typename::TypeName;
pub use unmanaged::{UnmanagedType, VarEnum};
pub use universe::{
    Builtin, CallingConvention, CharSet, ClassInterfaceType, ClassType, ComInterfaceType,
    DelegateType, EnumMember, EnumType, FieldInfo, FunctionPointerAttribute, InterfaceType,
    Layout, MethodShape, Record, TypeKind, TypeRef, TypeUniverse,
};
