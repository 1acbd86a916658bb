//! Generator configuration
//!
//! Selects the target platform and the dialect of the generated declarations. The platform
//! part ends up in the [`MarshalFlags`] every occurrence is classified with, the dialect part in
//! the [`PrintFlags`] handed to the printers.

use crate::{marshal::MarshalFlags, output::PrintFlags};

/// Configuration of a [`crate::SignatureGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct GeneratorConfig {
    /// Print portable C types (`unsigned int`) instead of Windows aliases (`UINT`)
    pub use_plain_c: bool,

    /// Annotate pointer parameters with `/*[in]*/`, `/*[out]*/` or `/*[in,out]*/`
    pub print_marshal_direction: bool,

    /// Print `IUnknown *` for interfaces that are not defined in the output
    pub use_defined_com_interfaces: bool,

    /// Prefix enum members with a per-member hash so several enums can share one scope
    pub mangle_enum_fields: bool,

    /// Omit the structure, enum and callback definitions a signature depends on
    pub suppress_type_definitions: bool,

    /// Omit the diagnostics
    pub suppress_messages: bool,

    /// The target platform is ANSI (Windows 9x); decides `CharSet.Auto`
    pub ansi_platform: bool,

    /// The target platform has 8-byte pointers
    pub platform_64bit: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::win64()
    }
}

impl GeneratorConfig {
    /// 32-bit ANSI platform
    #[must_use]
    pub fn win32() -> Self {
        Self {
            use_plain_c: false,
            print_marshal_direction: false,
            use_defined_com_interfaces: false,
            mangle_enum_fields: false,
            suppress_type_definitions: false,
            suppress_messages: false,
            ansi_platform: true,
            platform_64bit: false,
        }
    }

    /// 64-bit Unicode platform
    #[must_use]
    pub fn win64() -> Self {
        Self {
            ansi_platform: false,
            platform_64bit: true,
            ..Self::win32()
        }
    }

    /// Portable C output for the given platform
    #[must_use]
    pub fn plain_c(self) -> Self {
        Self {
            use_plain_c: true,
            ..self
        }
    }

    /// Dialect switches for the printers
    #[must_use]
    pub fn print_flags(&self) -> PrintFlags {
        let mut flags = PrintFlags::empty();
        flags.set(PrintFlags::USE_PLAIN_C, self.use_plain_c);
        flags.set(PrintFlags::PRINT_MARSHAL_DIRECTION, self.print_marshal_direction);
        flags.set(PrintFlags::USE_DEFINED_COM_INTERFACES, self.use_defined_com_interfaces);
        flags.set(PrintFlags::MANGLE_ENUM_FIELDS, self.mangle_enum_fields);
        flags
    }

    /// Platform flags every occurrence is classified with
    #[must_use]
    pub fn marshal_flags(&self) -> MarshalFlags {
        let mut flags = MarshalFlags::empty();
        flags.set(MarshalFlags::ANSI_PLATFORM, self.ansi_platform);
        flags.set(MarshalFlags::PLATFORM_64BIT, self.platform_64bit);
        flags
    }

    /// Size of a native pointer
    #[must_use]
    pub fn pointer_size(&self) -> u32 {
        if self.platform_64bit {
            8
        } else {
            4
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_config_presets() {
        let win32 = GeneratorConfig::win32();
        assert!(win32.ansi_platform);
        assert!(!win32.platform_64bit);
        assert_eq!(win32.pointer_size(), 4);
        assert_eq!(win32.marshal_flags(), MarshalFlags::ANSI_PLATFORM);
        assert_eq!(win32.print_flags(), PrintFlags::empty());

        let win64 = GeneratorConfig::win64();
        assert!(!win64.ansi_platform);
        assert!(win64.platform_64bit);
        assert_eq!(win64.pointer_size(), 8);
        assert_eq!(win64.marshal_flags(), MarshalFlags::PLATFORM_64BIT);

        let plain = GeneratorConfig::win32().plain_c();
        assert!(plain.ansi_platform);
        assert_eq!(plain.print_flags(), PrintFlags::USE_PLAIN_C);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(GeneratorConfig::default(), GeneratorConfig::win64());
    }

    #[test]
    fn test_print_flags() {
        let config = GeneratorConfig {
            print_marshal_direction: true,
            mangle_enum_fields: true,
            ..GeneratorConfig::default()
        };
        assert_eq!(
            config.print_flags(),
            PrintFlags::PRINT_MARSHAL_DIRECTION | PrintFlags::MANGLE_ENUM_FIELDS
        );
    }
}
