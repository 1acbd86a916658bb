//! Occurrence context flags carried by every [`crate::marshal::TypeDescriptor`].

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Context, direction and platform flags of one occurrence of a managed type.
    pub struct MarshalFlags: u32 {
        /// Data flows from managed to native code
        const MARSHAL_IN = 0x0001;
        /// Data flows from native to managed code
        const MARSHAL_OUT = 0x0002;
        /// The occurrence belongs to a COM interop method rather than a P/Invoke
        const COM_INTEROP = 0x0004;
        /// Strings and characters default to ANSI
        const ANSI_STRINGS = 0x0008;
        /// Strings and characters default to Unicode
        const UNICODE_STRINGS = 0x0010;
        /// The target platform is ANSI, which decides `CharSet.Auto`
        const ANSI_PLATFORM = 0x0020;
        /// The parameter is passed by reference
        const BY_REF_PARAM = 0x0040;
        /// The parameter is the return value
        const RET_VAL_PARAM = 0x0080;
        /// The parameter belongs to a callback (delegate) signature
        const CALLBACK_PARAM = 0x0100;
        /// The occurrence is a structure field
        const STRUCT_FIELD = 0x0200;
        /// The occurrence is an array element
        const ARRAY_ELEMENT = 0x0400;
        /// The occurrence is an element of a `System.Array`
        const SYS_ARRAY_ELEMENT = 0x0800;
        /// The target platform has 8-byte pointers
        const PLATFORM_64BIT = 0x1000;
    }
}

impl MarshalFlags {
    /// Flags that influence the shape of an out-of-line definition and therefore take part in
    /// the definition cache key.
    pub const TYPE_DEF_KEY: MarshalFlags = MarshalFlags::COM_INTEROP
        .union(MarshalFlags::ANSI_STRINGS)
        .union(MarshalFlags::UNICODE_STRINGS)
        .union(MarshalFlags::ANSI_PLATFORM)
        .union(MarshalFlags::PLATFORM_64BIT);

    /// Returns the subset of the flags that identifies a definition.
    #[must_use]
    pub fn definition_key(self) -> MarshalFlags {
        self & Self::TYPE_DEF_KEY
    }

    /// Returns true if strings and characters are marshaled as ANSI.
    ///
    /// An explicit ANSI or Unicode setting wins; otherwise the platform decides.
    #[must_use]
    pub fn marshals_strings_ansi(self) -> bool {
        if self.contains(MarshalFlags::ANSI_STRINGS) {
            true
        } else if self.contains(MarshalFlags::UNICODE_STRINGS) {
            false
        } else {
            self.contains(MarshalFlags::ANSI_PLATFORM)
        }
    }

    /// Returns the pointer size of the target platform in bytes.
    #[must_use]
    pub fn pointer_size(self) -> u32 {
        if self.contains(MarshalFlags::PLATFORM_64BIT) {
            8
        } else {
            4
        }
    }
}
