use sha1::{Digest, Sha1};

use crate::{
    diagnostics::Log,
    marshal::{
        typename::TypeName,
        unmanaged::UnmanagedType,
        universe::{EnumMember, TypeKind, TypeRef, TypeUniverse},
    },
    output::{CodePrinter, LogPrinter, OutputType, PrintFlags},
};

/// An `enum Name : underlying { ... };` declaration.
#[derive(Debug)]
pub struct EnumDefinition {
    name: String,
    log: Log,
    underlying: TypeName,
    pointer_size: u32,
    flags: bool,
    members: Vec<EnumMember>,
}

impl EnumDefinition {
    pub(crate) fn build(
        universe: &TypeUniverse,
        ty: TypeRef,
        underlying: UnmanagedType,
        pointer_size: u32,
    ) -> EnumDefinition {
        let (flags, mut members) = match universe.kind(ty) {
            TypeKind::Enum(enumeration) => (enumeration.flags, enumeration.members.clone()),
            _ => (false, Vec::new()),
        };
        // constants are listed by their unsigned bit pattern
        members.sort_by_key(|member| member.value as u64);

        EnumDefinition {
            name: universe.c_name(ty),
            log: Log::new(),
            underlying: TypeName::for_unmanaged(underlying).unwrap_or(TypeName::I4),
            pointer_size,
            flags,
            members,
        }
    }

    /// C identifier of the enum.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the underlying type.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.underlying.size(self.pointer_size)
    }

    /// Diagnostics of the definition.
    #[must_use]
    pub fn log(&self) -> &Log {
        &self.log
    }

    /// Returns true if the enum carries the `[Flags]` attribute.
    #[must_use]
    pub fn is_flags(&self) -> bool {
        self.flags
    }

    /// Members sorted by value.
    #[must_use]
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    /// Prints the declaration.
    ///
    /// A value is printed only where it differs from the previous value plus one, except in
    /// flags enums which always list every value.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
    ) {
        self.log.print_to(log_printer, &format!("Enum {}", self.name));

        printer.print(OutputType::Keyword, "enum");
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::TypeName, &self.name);
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Operator, ":");
        printer.print(OutputType::Other, " ");
        self.underlying.print_to(printer, flags, 0);

        printer.print_ln();
        printer.indent();
        printer.print(OutputType::Operator, "{");

        let mut next_value: Option<i128> = Some(0);
        for (position, member) in self.members.iter().enumerate() {
            printer.print_ln();

            if flags.contains(PrintFlags::MANGLE_ENUM_FIELDS) {
                printer.print(OutputType::Identifier, &self.mangling_prefix(&member.name));
            }
            printer.print(OutputType::Identifier, &member.name);

            if self.flags || next_value != Some(member.value) {
                printer.print(OutputType::Other, " ");
                printer.print(OutputType::Operator, "=");
                printer.print(OutputType::Other, " ");
                printer.print(OutputType::Literal, &member.value.to_string());
            }
            next_value = member.value.checked_add(1);

            if position + 1 < self.members.len() {
                printer.print(OutputType::Operator, ",");
            }
        }

        printer.unindent();
        printer.print_ln();
        printer.print(OutputType::Operator, "};");
    }

    /// `_` followed by 32 hex digits derived from the enum and member name, then `_`.
    fn mangling_prefix(&self, member: &str) -> String {
        let mut hasher = Sha1::new();
        hasher.update(self.name.as_bytes());
        hasher.update(b".");
        hasher.update(member.as_bytes());
        let digest = hasher.finalize();

        let mut prefix = String::with_capacity(34);
        prefix.push('_');
        for byte in &digest[..16] {
            prefix.push_str(&format!("{byte:02x}"));
        }
        prefix.push('_');
        prefix
    }
}
