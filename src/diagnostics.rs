//! Per-symbol diagnostics produced while classifying and laying out native types.
//!
//! Every parameter, field, structure and signature owns a [`Log`]. Classification never fails;
//! instead it appends [`Message`]s describing illegal combinations, substituted defaults and
//! hints about how the runtime marshaler is going to treat the value. The log is later printed
//! through a [`crate::output::LogPrinter`], usually buffered in a
//! [`crate::output::LogMemoryPrinter`] so that a caller can decide to drop the messages of a
//! signature that is not emitted.
//!
//! # Key Components
//!
//! - [`Severity`] - Severity level (Info, Warning, Error)
//! - [`Message`] - One parameterized message, with a stable numeric code
//! - [`MessageCode`] - Payload-free identity of a message
//! - [`Log`] - Ordered collection of messages attached to one symbol
//!
//! # Ordering
//!
//! Unless a log is created with [`Log::preserving_order`], errors are kept ahead of warnings
//! and warnings ahead of informational hints, while messages of the same severity keep their
//! insertion order.
//!
//! # Codes
//!
//! Errors are numbered from 1001, warnings from 2001 and informational hints from 3001. The
//! numbers are part of the output format and never change.

use std::fmt;

use strum::{EnumDiscriminants, EnumIter, IntoStaticStr};
use thiserror::Error;

use crate::output::LogPrinter;

/// Severity level of a diagnostic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational hint, not indicating a problem.
    Info,

    /// The requested marshaling is legal but probably not what the author intended.
    Warning,

    /// The requested marshaling is illegal; a substitute was used so that output can still be
    /// produced.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A single diagnostic message with its arguments.
///
/// The [`fmt::Display`] implementation renders the human readable text, [`Message::code`]
/// returns the stable numeric code and [`Message::severity`] is derived from the code range.
#[derive(Error, Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(MessageCode), derive(Hash, EnumIter, IntoStaticStr))]
#[strum_discriminants(allow(missing_docs))]
pub enum Message {
    // errors
    /// Size hints on an array passed by reference.
    #[error("Array size cannot be specified for an array passed by reference")]
    ArraySizeNotAllowedForByref,
    /// `SizeParamIndex` points outside of the parameter list.
    #[error("SizeParamIndex {0} does not refer to an existing parameter")]
    ArraySizeParamIndexOutOfRange(i32),
    /// `SizeParamIndex` points at a parameter that is not an integer.
    #[error("Parameter designated by SizeParamIndex has type {0}, an integral type is required")]
    ArraySizeParamWrongType(String),
    /// Fixed-size embedded array without a positive length.
    #[error("ByValArray requires a positive SizeConst, assuming length 1")]
    ByValArrayInvalidLength,
    /// Custom marshaler on a structure field.
    #[error("Custom marshalers cannot be used on fields")]
    CustomMarshalerNotAllowedOnFields,
    /// Custom marshaler on a value type.
    #[error("Custom marshalers cannot be used on value types")]
    CustomMarshalerNotAllowedOnValueTypes,
    /// Generic instantiation at the boundary.
    #[error("Generic types cannot be marshaled")]
    GenericTypesNotAllowed,
    /// Safe or critical handle inside an array.
    #[error("Handles cannot be marshaled as array elements")]
    HandlesNotPermittedAsArrayElements,
    /// Requested representation not allowed for the managed type in this context.
    #[error("Type {0} cannot be marshaled as {1} in this context")]
    UnrecognizedMarshalingForContext(String, String),
    /// Negative declared structure size.
    #[error("Invalid unmanaged size {0}")]
    InvalidUnmanagedSize(i32),
    /// Custom marshaler type lacks a static `GetInstance(string)` method.
    #[error("Custom marshaler {0} does not have a static GetInstance(string) method returning ICustomMarshaler")]
    MarshalerHasNoGetInstance(String),
    /// Custom marshaler type does not implement `ICustomMarshaler`.
    #[error("Custom marshaler {0} does not implement ICustomMarshaler")]
    MarshalerIsNotICustomMarshaler(String),
    /// Representation that is only available under COM interop.
    #[error("Type {0} can only be marshaled in COM interop")]
    MarshalingAllowedForCom(String),
    /// Field without an offset inside an explicit layout.
    #[error("Field {0} does not have an explicit offset")]
    NoFieldOffsetInSequentialLayout(String),
    /// Array whose elements are arrays.
    #[error("Nested arrays cannot be marshaled")]
    NoNestedArrayMarshaling,
    /// P/Invoke method that is not static.
    #[error("P/Invoke method must be static")]
    PInvokeIsNotStatic,
    /// Structure embedding itself by value.
    #[error("Field {0} makes the structure recursive, structure size cannot be determined")]
    RecursiveStructureDeclaration(String),
    /// `StringBuilder` as a structure field.
    #[error("StringBuilder fields cannot be marshaled, marshaling as LPStr")]
    StringBuilderFieldsDisallowed,
    /// Structure or class marshaled by value without a sequential or explicit layout.
    #[error("Type {0} does not have sequential or explicit layout")]
    TypeHasNoLayout(String),
    /// Enum with an underlying type that cannot be marshaled.
    #[error("Unexpected enum underlying type {0}, assuming int")]
    UnexpectedEnumUnderlyingType(String),
    /// Unmanaged pointer to a reference type.
    #[error("Unmanaged pointers to reference type {0} are not allowed")]
    UnmanagedPointersToRefType(String),
    /// `System.Array` field without an explicit representation.
    #[error("Field of type {0} requires an explicit unmanaged type")]
    UnmanagedTypeRequiredForField(String),
    /// Pack value that is not a power of two up to 128.
    #[error("Unsupported packing size {0}, assuming 8")]
    UnsupportedAlignment(i32),
    /// `VBByRefStr` on something other than a by-ref in/out string parameter.
    #[error("VBByRefStr can only be used on by-reference string parameters")]
    VBByRefParamNotByRef,
    /// `VARIANT` return value.
    #[error("VARIANT cannot be used as a return value")]
    VariantReturnTypeNotSupported,
    /// Reference-carrying field at an offset that is not pointer aligned.
    #[error("Field {0} contains an object reference and is not aligned on a pointer boundary")]
    MisalignedReferenceTypeField(String),
    /// Reference-carrying field that overlaps another field.
    #[error("Field {0} contains an object reference and overlaps another field")]
    OverlappingReferenceTypeField(String),
    /// Fixed-size embedded array whose byte size does not fit in 32 bits.
    #[error("ByValArray of {0} elements is too large, assuming length 1")]
    ByValArrayTooLarge(u32),

    // warnings
    /// Callback array without any size hint.
    #[error("Array size cannot be determined, the marshaler will assume length 1")]
    ArraySizeDefaultsToOne,
    /// Size hints that the marshaler ignores in this direction.
    #[error("Array size hints are ignored when marshaling from managed to native code")]
    ArraySizesIgnored,
    /// By-value reference type carrying an `[Out]` attribute.
    #[error("[Out] has no effect on by-value parameter of type {0}")]
    ByValRefTypeMarkedOut(String),
    /// By-value value type carrying an `[Out]` attribute.
    #[error("[Out] has no effect on by-value value type parameters")]
    ByValValueTypeMarkedOut,
    /// Declared structure size below the computed minimum.
    #[error("Declared size {0} is smaller than the minimum size {1}, using {1}")]
    InsufficientUnmanagedSize(i32, u32),
    /// Blittable structure marked in-only; it is pinned and changes are visible anyway.
    #[error("Type {0} is blittable, [In] does not prevent callee changes from being visible")]
    LayoutBlittableMarkedIn(String),
    /// Blittable structure marked out-only; it is pinned and its contents are visible anyway.
    #[error("Type {0} is blittable, [Out] does not prevent caller contents from being visible")]
    LayoutBlittableMarkedOut(String),
    /// Custom marshaler type name could not be resolved.
    #[error("Custom marshaler type {0} could not be found")]
    MarshalerTypeNotFound(String),
    /// Delegate type without an `Invoke` method.
    #[error("Delegate {0} has no specific signature")]
    NonSpecificDelegateUsed(String),
    /// Pack value on a non-sequential layout.
    #[error("Pack has no effect on explicit layout")]
    NoPackEffectOnExplicitLayout,
    /// Public P/Invoke method.
    #[error("P/Invoke method should not be public")]
    PInvokeIsPublic,
    /// Single-field structure marshaled as its only field.
    #[error("Type {0} is marshaled as {1}")]
    NormalizedStructure(String, String),
    /// Variable argument list with a calling convention other than cdecl.
    #[error("Variable arguments require cdecl calling convention, not {0}")]
    VarargIsNotCdecl(String),
    /// By-value string carrying an `[Out]` attribute.
    #[error("[Out] has no effect on by-value string parameters")]
    ByValStringMarkedOut,

    // info
    /// LPArray size determined at call time.
    #[error("Array size is determined dynamically from the managed array")]
    ArraySizeDeterminedDynamically,
    /// LPArray size given by another parameter.
    #[error("Array size is given by parameter {0}")]
    ArraySizeIsByParameter(String),
    /// LPArray size given by another parameter plus a constant.
    #[error("Array size is given by parameter {0} plus {1}")]
    ArraySizeIsByParameterPlusConstant(String, i32),
    /// LPArray size given by a constant.
    #[error("Array size is {0}")]
    ArraySizeIsConstant(i32),
    /// `AsAny` marshaling.
    #[error("Object will be marshaled according to its run-time type")]
    AsAnyMarshaling,
    /// Character width decided by the platform.
    #[error("Character width depends on the target platform")]
    AutoCharacterMarshaling,
    /// String character width decided by the platform.
    #[error("String character width depends on the target platform")]
    AutoStringMarshaling,
    /// Delegate passed as a function pointer.
    #[error("Keep the delegate alive for as long as native code may call the function pointer")]
    BewarePrematureDelegateRelease,
    /// String passed by value and expected to change.
    #[error("Strings are immutable, changes made by native code are not propagated back")]
    BewareStringImmutability,
    /// Callback receives a buffer from managed code.
    #[error("Native code receives the {0}, managed code frees it after the call")]
    BufferCallbackIn(String),
    /// Callback receives and returns a buffer.
    #[error("Native code receives the {0} and may replace it, buffers are allocated and freed with CoTaskMem")]
    BufferCallbackInOut(String),
    /// Callback returns a buffer.
    #[error("Native code must return the {0} allocated with CoTaskMemAlloc")]
    BufferCallbackOut(String),
    /// Caller passes and receives a buffer.
    #[error("Native code receives the {0} and may replace it, buffers are allocated and freed with CoTaskMem")]
    BufferInOut(String),
    /// Caller receives a buffer.
    #[error("Native code must allocate the {0} with CoTaskMemAlloc, managed code frees it")]
    BufferOut(String),
    /// Caller passes a temporary buffer.
    #[error("The {0} is a temporary copy valid only for the duration of the call")]
    BufferTemporaryIn(String),
    /// Custom-marshaled parameter.
    #[error("Parameter is marshaled by custom marshaler {0}")]
    CustomMarshaledParameter(String),
    /// By-value array or formatted class with default direction.
    #[error("Arrays and formatted classes are marshaled [In] by default")]
    DefaultArrayAndRefTypeMarshaling,
    /// StringBuilder with default direction.
    #[error("StringBuilder is marshaled [In,Out] by default")]
    DefaultStringBuilderMarshaling,
    /// ByValTStr without a positive length.
    #[error("Fixed-length string requires a positive SizeConst, assuming length 1")]
    FixedLengthStringInvalidLength,
    /// Interface pointer wrapped into a runtime callable wrapper.
    #[error("Interface pointer will be wrapped in a runtime callable wrapper")]
    InterfacePointerToRCWMarshaling,
    /// Blittable structure passed by reference to a callback.
    #[error("Type {0} is blittable, native code receives a pointer to a pinned copy")]
    LayoutBlittableCallbackParameter(String),
    /// Blittable structure passed by reference.
    #[error("Type {0} is blittable, native code receives a pointer to the pinned managed instance")]
    LayoutBlittableParameter(String),
    /// Non-blittable structure copied in both directions.
    #[error("Contents of {0} are copied in both directions")]
    LayoutDirectionBoth(String),
    /// Non-blittable structure copied to native only.
    #[error("Contents of {0} are copied from managed to native only")]
    LayoutDirectionManagedToNative(String),
    /// Non-blittable structure copied to managed only.
    #[error("Contents of {0} are copied from native to managed only")]
    LayoutDirectionNativeToManaged(String),
    /// Non-blittable structure passed by reference to a callback.
    #[error("Type {0} is not blittable, native code passes a pointer to a native copy")]
    LayoutNonBlittableCallbackParameter(String),
    /// Non-blittable structure passed by reference.
    #[error("Type {0} is not blittable, native code receives a pointer to a native copy")]
    LayoutNonBlittableParameter(String),
    /// Managed object wrapped into a COM callable wrapper.
    #[error("Managed object will be exposed through a COM callable wrapper")]
    ManagedObjectToCCWMarshaling,
    /// Pointer to a specific COM interface.
    #[error("Pointer refers to COM interface {0}")]
    PointerIsCOMInterfacePtr(String),
    /// Entry point may be resolved under an alternative name.
    #[error("If entry point {1} is not found, {0} is looked up instead")]
    PossibleAltNameLookup(String, String),
    /// Entry point name depends on the platform.
    #[error("Entry point is looked up as {0} or {1} depending on the platform")]
    PossibleAutoAltNameLookup(String, String),
    /// SAFEARRAY element variant type.
    #[error("SAFEARRAY elements will be marshaled as {0}")]
    SafeArrayWillMarshalAs(String),
    /// COM delegate interface.
    #[error("See mscorlib.tlb for the definition of {0}")]
    SeeMscorlibTlbForInterface(String),
    /// StringBuilder capacity.
    #[error("Initialize the StringBuilder with sufficient capacity before the call")]
    StringBuilderRequiresInit,
    /// SAFEARRAY of VARIANT wrappers.
    #[error("Use wrapper objects (UnknownWrapper, DispatchWrapper, ...) to control VARIANT types")]
    SafeArrayOfVariantsWrapperUse,
}

impl MessageCode {
    /// Returns the stable numeric code of this message.
    #[must_use]
    pub fn code(self) -> u16 {
        match self {
            MessageCode::ArraySizeNotAllowedForByref => 1001,
            MessageCode::ArraySizeParamIndexOutOfRange => 1002,
            MessageCode::ArraySizeParamWrongType => 1003,
            MessageCode::ByValArrayInvalidLength => 1004,
            MessageCode::CustomMarshalerNotAllowedOnFields => 1005,
            MessageCode::CustomMarshalerNotAllowedOnValueTypes => 1006,
            MessageCode::GenericTypesNotAllowed => 1007,
            MessageCode::HandlesNotPermittedAsArrayElements => 1008,
            MessageCode::UnrecognizedMarshalingForContext => 1009,
            MessageCode::InvalidUnmanagedSize => 1010,
            MessageCode::MarshalerHasNoGetInstance => 1011,
            MessageCode::MarshalerIsNotICustomMarshaler => 1012,
            MessageCode::MarshalingAllowedForCom => 1013,
            MessageCode::NoFieldOffsetInSequentialLayout => 1014,
            MessageCode::NoNestedArrayMarshaling => 1015,
            MessageCode::PInvokeIsNotStatic => 1016,
            MessageCode::RecursiveStructureDeclaration => 1017,
            MessageCode::StringBuilderFieldsDisallowed => 1018,
            MessageCode::TypeHasNoLayout => 1019,
            MessageCode::UnexpectedEnumUnderlyingType => 1020,
            MessageCode::UnmanagedPointersToRefType => 1021,
            MessageCode::UnmanagedTypeRequiredForField => 1022,
            MessageCode::UnsupportedAlignment => 1023,
            MessageCode::VBByRefParamNotByRef => 1024,
            MessageCode::VariantReturnTypeNotSupported => 1025,
            MessageCode::MisalignedReferenceTypeField => 1026,
            MessageCode::OverlappingReferenceTypeField => 1027,
            MessageCode::ByValArrayTooLarge => 1028,

            MessageCode::ArraySizeDefaultsToOne => 2001,
            MessageCode::ArraySizesIgnored => 2002,
            MessageCode::ByValRefTypeMarkedOut => 2003,
            MessageCode::ByValValueTypeMarkedOut => 2004,
            MessageCode::InsufficientUnmanagedSize => 2005,
            MessageCode::LayoutBlittableMarkedIn => 2006,
            MessageCode::LayoutBlittableMarkedOut => 2007,
            MessageCode::MarshalerTypeNotFound => 2008,
            MessageCode::NonSpecificDelegateUsed => 2009,
            MessageCode::NoPackEffectOnExplicitLayout => 2010,
            MessageCode::PInvokeIsPublic => 2011,
            MessageCode::NormalizedStructure => 2012,
            MessageCode::VarargIsNotCdecl => 2013,
            MessageCode::ByValStringMarkedOut => 2014,

            MessageCode::ArraySizeDeterminedDynamically => 3001,
            MessageCode::ArraySizeIsByParameter => 3002,
            MessageCode::ArraySizeIsByParameterPlusConstant => 3003,
            MessageCode::ArraySizeIsConstant => 3004,
            MessageCode::AsAnyMarshaling => 3005,
            MessageCode::AutoCharacterMarshaling => 3006,
            MessageCode::AutoStringMarshaling => 3007,
            MessageCode::BewarePrematureDelegateRelease => 3008,
            MessageCode::BewareStringImmutability => 3009,
            MessageCode::BufferCallbackIn => 3010,
            MessageCode::BufferCallbackInOut => 3011,
            MessageCode::BufferCallbackOut => 3012,
            MessageCode::BufferInOut => 3013,
            MessageCode::BufferOut => 3014,
            MessageCode::BufferTemporaryIn => 3015,
            MessageCode::CustomMarshaledParameter => 3016,
            MessageCode::DefaultArrayAndRefTypeMarshaling => 3017,
            MessageCode::DefaultStringBuilderMarshaling => 3018,
            MessageCode::FixedLengthStringInvalidLength => 3019,
            MessageCode::InterfacePointerToRCWMarshaling => 3020,
            MessageCode::LayoutBlittableCallbackParameter => 3021,
            MessageCode::LayoutBlittableParameter => 3022,
            MessageCode::LayoutDirectionBoth => 3023,
            MessageCode::LayoutDirectionManagedToNative => 3024,
            MessageCode::LayoutDirectionNativeToManaged => 3025,
            MessageCode::LayoutNonBlittableCallbackParameter => 3026,
            MessageCode::LayoutNonBlittableParameter => 3027,
            MessageCode::ManagedObjectToCCWMarshaling => 3028,
            MessageCode::PointerIsCOMInterfacePtr => 3029,
            MessageCode::PossibleAltNameLookup => 3030,
            MessageCode::PossibleAutoAltNameLookup => 3031,
            MessageCode::SafeArrayWillMarshalAs => 3032,
            MessageCode::SeeMscorlibTlbForInterface => 3033,
            MessageCode::StringBuilderRequiresInit => 3034,
            MessageCode::SafeArrayOfVariantsWrapperUse => 3035,
        }
    }

    /// Returns the severity implied by the code range.
    #[must_use]
    pub fn severity(self) -> Severity {
        match self.code() {
            0..=1999 => Severity::Error,
            2000..=2999 => Severity::Warning,
            _ => Severity::Info,
        }
    }
}

impl Message {
    /// Returns the payload-free identity of this message.
    #[must_use]
    pub fn kind(&self) -> MessageCode {
        MessageCode::from(self)
    }

    /// Returns the stable numeric code of this message.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.kind().code()
    }

    /// Returns the severity of this message.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind().severity()
    }
}

/// Ordered collection of diagnostics attached to one symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Log {
    entries: Vec<Message>,
    preserve_order: bool,
}

impl Log {
    /// Creates an empty log that keeps errors ahead of warnings ahead of hints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty log that keeps plain insertion order.
    #[must_use]
    pub fn preserving_order() -> Self {
        Log {
            entries: Vec::new(),
            preserve_order: true,
        }
    }

    /// Appends a message.
    ///
    /// A warning or error is inserted before the first entry of lower severity, unless the log
    /// preserves insertion order.
    pub fn add(&mut self, message: Message) {
        let severity = message.severity();
        if !self.preserve_order && severity != Severity::Info {
            if let Some(pos) = self.entries.iter().position(|e| e.severity() < severity) {
                self.entries.insert(pos, message);
                return;
            }
        }

        self.entries.push(message);
    }

    /// Returns true if no message has been logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of logged messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if any error-level message has been logged.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|m| m.severity() == Severity::Error)
    }

    /// Returns true if a message with the given identity has been logged.
    #[must_use]
    pub fn contains(&self, code: MessageCode) -> bool {
        self.entries.iter().any(|m| m.kind() == code)
    }

    /// Returns an iterator over all messages in print order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Removes all messages.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Prints all messages to `printer`, each prefixed with `prefix: ` when a prefix is given.
    pub fn print_to(&self, printer: &mut dyn LogPrinter, prefix: &str) {
        for message in &self.entries {
            if prefix.is_empty() {
                printer.print_entry(message.severity(), message.code(), &message.to_string());
            } else {
                printer.print_entry(
                    message.severity(),
                    message.code(),
                    &format!("{}: {}", prefix, message),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::LogMemoryPrinter;
    use strum::IntoEnumIterator;

    #[test]
    fn test_code_ranges_match_severity() {
        let mut seen = std::collections::HashSet::new();
        for code in MessageCode::iter() {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }

        assert_eq!(seen.len(), 28 + 14 + 35);
        assert_eq!(
            MessageCode::UnrecognizedMarshalingForContext.severity(),
            Severity::Error
        );
        assert_eq!(MessageCode::ByValStringMarkedOut.code(), 2014);
        assert_eq!(MessageCode::SafeArrayOfVariantsWrapperUse.code(), 3035);
    }

    #[test]
    fn test_errors_are_kept_first() {
        let mut log = Log::new();
        log.add(Message::AsAnyMarshaling);
        log.add(Message::ArraySizesIgnored);
        log.add(Message::GenericTypesNotAllowed);
        log.add(Message::ByValValueTypeMarkedOut);

        let codes: Vec<u16> = log.iter().map(Message::code).collect();
        assert_eq!(codes, vec![1007, 2002, 2004, 3005]);
        assert!(log.has_errors());
    }

    #[test]
    fn test_preserving_order() {
        let mut log = Log::preserving_order();
        log.add(Message::AsAnyMarshaling);
        log.add(Message::GenericTypesNotAllowed);

        let codes: Vec<u16> = log.iter().map(Message::code).collect();
        assert_eq!(codes, vec![3005, 1007]);
    }

    #[test]
    fn test_print_with_prefix() {
        let mut log = Log::new();
        log.add(Message::TypeHasNoLayout("Contoso.Point".to_string()));

        let mut printer = LogMemoryPrinter::new();
        log.print_to(&mut printer, "Parameter pt");

        let entries: Vec<_> = printer.entries().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].code, 1019);
        assert_eq!(
            entries[0].message,
            "Parameter pt: Type Contoso.Point does not have sequential or explicit layout"
        );
    }

    #[test]
    fn test_message_display() {
        let msg = Message::InsufficientUnmanagedSize(4, 8);
        assert_eq!(
            msg.to_string(),
            "Declared size 4 is smaller than the minimum size 8, using 8"
        );
        assert_eq!(msg.severity(), Severity::Warning);
    }
}
