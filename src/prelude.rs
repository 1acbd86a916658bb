//! # marshalscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the marshalscope library. Import this module to get quick access to the essential
//! types for describing managed types and generating native declarations.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all marshalscope operations
pub use crate::Error;

/// The result type used throughout marshalscope
pub use crate::Result;

/// Target platform and output dialect
pub use crate::GeneratorConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Classifies signatures and prints them with their dependencies
pub use crate::{GeneratedCode, SignatureGenerator};

/// Native prototypes and the managed methods they are derived from
pub use crate::marshal::signature::{ComMethod, NativeParameter, NativeSignature, PInvokeMethod};

// ================================================================================================
// Managed Type Universe
// ================================================================================================

/// Registry of managed types and their shapes
pub use crate::marshal::universe::{
    Builtin, CallingConvention, CharSet, ClassInterfaceType, ClassType, ComInterfaceType,
    DelegateType, EnumType, FieldInfo, FunctionPointerAttribute, InterfaceType, Layout,
    MethodShape, Record, TypeKind, TypeRef, TypeUniverse,
};

/// Occurrences of managed types and their `MarshalAs` annotations
pub use crate::marshal::descriptor::{
    DefaultValue, MarshalAs, ParamAttributes, ParameterInfo, TypeDescriptor,
};

/// Requested native representations
pub use crate::marshal::unmanaged::{UnmanagedType, VarEnum};

// ================================================================================================
// Classification and Layout
// ================================================================================================

/// Classification of one occurrence into a native type
pub use crate::marshal::native::{Classifier, NativeKind, NativeType};

/// Context flags of an occurrence
pub use crate::marshal::flags::MarshalFlags;

/// Out-of-line definitions and their cache
pub use crate::marshal::definitions::{
    Definition, DefinitionCache, DefinitionSet, SetItem, SharedDefinitionCache,
    StructureDefinition,
};

/// Native type spellings
pub use crate::marshal::typename::TypeName;

// ================================================================================================
// Diagnostics and Output
// ================================================================================================

/// Messages attached to classified symbols
pub use crate::diagnostics::{Log, Message, MessageCode, Severity};

/// Printer traits and their implementations
pub use crate::output::{
    CodeMemoryPrinter, CodePrinter, FacadeLogPrinter, LogMemoryPrinter, LogPrinter,
    LogTextPrinter, OutputType, PrintFlags, TextCodePrinter,
};
