//! Structure and union layout.
//!
//! A [`StructureDefinition`] is produced by a one-shot builder that classifies the fields,
//! sorts them, computes offsets, size and alignment under the declared packing, and finally
//! decides whether the type prints as a plain `struct`, as a `union`, or as a `struct` with
//! anonymous unions for overlapping fields. The finished definition is immutable; printing
//! re-derives sequential offsets from the stored layout.
//!
//! Layout follows the rules of the native compiler: the alignment requirement of a field is
//! the smaller of its own alignment and the pack size, and the structure is padded to the
//! smaller of its largest field alignment and the pack size. A declared size that is not a
//! multiple of that alignment cannot be expressed with a pack directive, so such structures
//! are printed under `#pragma pack (1)` with explicit padding members.

use std::fmt::Write as _;

use super::{DefHandle, Definition, DefinitionCache, DefinitionSet};
use crate::{
    diagnostics::{Log, Message},
    marshal::{
        flags::MarshalFlags,
        ident::make_c_identifier,
        native::{Classifier, NativeKind, NativeType},
        typename::TypeName,
        universe::{Layout, Record, TypeRef},
    },
    output::{CodePrinter, LogPrinter, OutputType, PrintFlags},
};

/// Packing applied when a structure does not declare one.
pub const DEFAULT_PACK: u32 = 8;

const VALID_PACKS: [i32; 9] = [0, 1, 2, 4, 8, 16, 32, 64, 128];

/// One field of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeField {
    name: String,
    ty: NativeType,
    offset: Option<u32>,
    contains_reference: bool,
}

impl NativeField {
    /// C identifier of the field.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Native type of the field.
    #[must_use]
    pub fn ty(&self) -> &NativeType {
        &self.ty
    }

    /// Byte offset: declared for explicit layout, computed for sequential layout.
    #[must_use]
    pub fn offset(&self) -> Option<u32> {
        self.offset
    }

    /// Returns true if the field holds a managed object reference, directly or nested.
    #[must_use]
    pub fn contains_reference(&self) -> bool {
        self.contains_reference
    }

    /// Prints `type name[post];` and the diagnostics of the field type.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
    ) {
        self.ty.print_log(log_printer, &format!("Field {}", self.name));

        self.ty.print_to(printer, flags);
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, &self.name);
        self.ty.print_post_identifier_to(printer);
        printer.print(OutputType::Operator, ";");
    }
}

/// A run of explicitly laid out fields that overlap and print as one anonymous union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UnionGroup {
    first: usize,
    last: usize,
    end: u32,
}

/// Layout of a structure, union or formatted class.
#[derive(Debug)]
pub struct StructureDefinition {
    name: String,
    log: Log,
    fields: Vec<NativeField>,
    groups: Vec<UnionGroup>,
    explicit: bool,
    union: bool,
    invalid: bool,
    blittable: bool,
    pack: u32,
    size: u32,
    alignment: u32,
    unaligned: bool,
}

impl StructureDefinition {
    pub(crate) fn build(
        classifier: &mut Classifier<'_>,
        ty: TypeRef,
        key_flags: MarshalFlags,
    ) -> StructureDefinition {
        let universe = classifier.universe();
        let name = universe.c_name(ty);
        let record = universe.record(ty).cloned().unwrap_or_default();

        let mut builder = StructureBuilder {
            name,
            log: Log::new(),
            fields: Vec::with_capacity(record.fields.len()),
            explicit: record.layout == Layout::Explicit,
            invalid: false,
            blittable: universe.is_blittable(ty, key_flags.contains(MarshalFlags::ANSI_PLATFORM)),
            pack: DEFAULT_PACK,
            size: 0,
            max_alignment: 0,
            unaligned: false,
        };

        builder.collect_fields(classifier, &record, key_flags);
        builder.sort_fields();
        builder.size_and_align(&record, key_flags.pointer_size());
        let definition = builder.classify_unions();

        log::debug!(
            "laid out {} {}: {} bytes, alignment {}, pack {}{}",
            if definition.union { "union" } else { "struct" },
            definition.name,
            definition.size,
            definition.alignment,
            definition.pack,
            if definition.unaligned { ", unaligned" } else { "" }
        );
        definition
    }

    /// C identifier of the structure.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size in bytes, including padding.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Largest effective field alignment; 0 for a structure without fields.
    #[must_use]
    pub fn alignment(&self) -> u32 {
        self.alignment
    }

    /// Effective packing.
    #[must_use]
    pub fn pack(&self) -> u32 {
        self.pack
    }

    /// Fields in layout order.
    #[must_use]
    pub fn fields(&self) -> &[NativeField] {
        &self.fields
    }

    /// Returns true if the whole structure prints as a native `union`.
    #[must_use]
    pub fn is_union(&self) -> bool {
        self.union
    }

    /// Returns true if the structure embeds itself and has no valid layout.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.invalid
    }

    /// Returns true if the managed and native layouts are identical.
    #[must_use]
    pub fn is_blittable(&self) -> bool {
        self.blittable
    }

    /// Returns true if fields are laid out at declared offsets.
    #[must_use]
    pub fn is_explicit_layout(&self) -> bool {
        self.explicit
    }

    /// Returns true if the size or the offsets cannot be reproduced with the declared packing.
    #[must_use]
    pub fn has_unaligned_size_or_offsets(&self) -> bool {
        self.unaligned
    }

    /// Diagnostics produced while laying out the structure.
    #[must_use]
    pub fn log(&self) -> &Log {
        &self.log
    }

    fn log_prefix(&self) -> String {
        if self.union {
            format!("Union {}", self.name)
        } else {
            format!("Structure {}", self.name)
        }
    }

    fn align_field(&self, field: &NativeField, offset: u32) -> u32 {
        align_up(offset, field.ty.alignment().min(self.pack))
    }

    fn align_self(&self, offset: u32) -> u32 {
        if self.fields.is_empty() {
            offset + 1
        } else {
            align_up(offset, self.alignment.min(self.pack))
        }
    }

    /// Prints the declaration.
    pub fn print_to(
        &self,
        printer: &mut dyn CodePrinter,
        log_printer: &mut dyn LogPrinter,
        flags: PrintFlags,
    ) {
        self.log.print_to(log_printer, &self.log_prefix());

        let mut context = PrintContext::new(printer, log_printer, flags);
        context.set_pack(if self.unaligned { 1 } else { DEFAULT_PACK }, true);

        if !self.union {
            context.printer.print_ln();
            context.printer.print(OutputType::Keyword, "struct");
            self.print_identifier_and_size(&mut context);
            context.printer.print(OutputType::Operator, "{");
            context.printer.indent();
        }

        if !self.invalid {
            let mut current = 0;
            let mut index = 0;
            while index < self.fields.len() {
                if self.explicit {
                    index = self.print_explicit_field(&mut context, index, &mut current);
                } else {
                    self.print_sequential_field(&mut context, index, &mut current);
                }
                index += 1;
            }

            let mut expected = current;
            if !context.used_non_default_pack {
                // under the default pack the compiler adds the tail padding itself
                expected = self.align_self(expected);
            }
            if self.size != expected {
                let avoid_larger_types = context.used_non_default_pack;
                context.print_padding(self.size.saturating_sub(current), avoid_larger_types);
            }
        }

        if !self.union {
            context.printer.unindent();
            context.printer.print_ln();
            context.printer.print(OutputType::Operator, "};");
        }

        context.set_default_pack();
    }

    /// Prints `struct Name;` or `union Name;`.
    pub fn print_forward_to(&self, printer: &mut dyn CodePrinter, _log_printer: &mut dyn LogPrinter) {
        printer.print(OutputType::Keyword, if self.union { "union" } else { "struct" });
        printer.print(OutputType::Other, " ");
        printer.print(OutputType::Identifier, &self.name);
        printer.print(OutputType::Operator, ";");
    }

    pub(crate) fn collect(&self, cache: &DefinitionCache, set: &mut DefinitionSet, handle: DefHandle) {
        for field in &self.fields {
            field.ty.collect_definitions(cache, set, Some(handle));
        }
    }

    fn print_identifier_and_size(&self, context: &mut PrintContext<'_>) {
        context.printer.print(OutputType::Other, " ");
        context.printer.print(OutputType::Identifier, &self.name);
        context.printer.print(OutputType::Other, " ");
        context
            .printer
            .print_ln_with(OutputType::Comment, &format!("// size = {} bytes", self.size));
    }

    fn print_sequential_field(&self, context: &mut PrintContext<'_>, index: usize, current: &mut u32) {
        // an unaligned structure stays under pack (1) and spells out the padding
        if !self.unaligned {
            context.set_pack(self.pack, false);
        }

        let field = &self.fields[index];
        let previous = *current;
        *current = self.align_field(field, *current);

        if self.unaligned {
            context.print_padding(*current - previous, false);
        }

        context.printer.print_ln();
        field.print_to(context.printer, context.log_printer, context.flags);

        *current = current.saturating_add(field.ty.size());
    }

    /// Prints the field at `index` and the fields overlapping it; returns the index of the last
    /// field printed.
    fn print_explicit_field(&self, context: &mut PrintContext<'_>, index: usize, current: &mut u32) -> usize {
        let field = &self.fields[index];
        let start = field.offset.unwrap_or(*current);

        let mut pack1 = false;
        if start > *current {
            if self.is_pack1_needed(start, 0) {
                context.set_pack(1, false);
                pack1 = true;
            }
            context.print_padding(start - *current, false);
            *current = start;
        }

        if !pack1 && !self.unaligned {
            context.set_pack(DEFAULT_PACK, false);
        }

        let group = self
            .groups
            .iter()
            .find(|group| group.first == index)
            .copied()
            .unwrap_or(UnionGroup {
                first: index,
                last: index,
                end: start.saturating_add(field.ty.size()),
            });

        if group.last > index {
            context.printer.print_ln();
            context.printer.print(OutputType::Keyword, "union");
            if self.union {
                self.print_identifier_and_size(context);
            } else {
                context.printer.print_ln();
            }
            context.printer.print(OutputType::Operator, "{");
            context.printer.indent();

            for member in index..=group.last {
                self.print_union_member(context, member, start);
            }

            context.printer.unindent();
            context.printer.print_ln();
            context.printer.print(OutputType::Operator, "};");
        } else {
            context.printer.print_ln();
            field.print_to(context.printer, context.log_printer, context.flags);
        }

        // a field without an offset sorts first and may end before the cursor
        *current = (*current).max(group.end);
        group.last
    }

    /// Prints one member of an anonymous union, wrapped in a padded structure when it does not
    /// start at the beginning of the union.
    fn print_union_member(&self, context: &mut PrintContext<'_>, index: usize, union_offset: u32) {
        let field = &self.fields[index];
        let offset = field.offset.unwrap_or(union_offset);

        if offset <= union_offset {
            context.printer.print_ln();
            field.print_to(context.printer, context.log_printer, context.flags);
            return;
        }

        if self.is_pack1_needed(offset, union_offset) {
            context.set_pack(1, false);
        }

        context.printer.print_ln();
        context.printer.print_ln_with(OutputType::Keyword, "struct");
        context.printer.print(OutputType::Operator, "{");
        context.printer.indent();

        context.print_padding(offset - union_offset, false);
        context.printer.print_ln();
        field.print_to(context.printer, context.log_printer, context.flags);

        context.printer.unindent();
        context.printer.print_ln();
        context.printer.print(OutputType::Operator, "};");
    }

    /// Returns true if a field declared at `offset` would land further out under natural
    /// alignment when padded from `base`.
    fn is_pack1_needed(&self, offset: u32, base: u32) -> bool {
        self.fields.iter().any(|field| {
            field.offset == Some(offset) && offset >= base && {
                let relative = offset - base;
                self.align_field(field, relative) != relative
            }
        })
    }
}

fn align_up(offset: u32, requirement: u32) -> u32 {
    if requirement == 0 {
        return offset;
    }
    match offset % requirement {
        0 => offset,
        rem => offset.saturating_add(requirement - rem),
    }
}

/// Mutable state of the layout computation; consumed into a [`StructureDefinition`].
struct StructureBuilder {
    name: String,
    log: Log,
    fields: Vec<NativeField>,
    explicit: bool,
    invalid: bool,
    blittable: bool,
    pack: u32,
    size: u32,
    max_alignment: u32,
    unaligned: bool,
}

impl StructureBuilder {
    fn collect_fields(&mut self, classifier: &mut Classifier<'_>, record: &Record, key_flags: MarshalFlags) {
        let pointer_size = key_flags.pointer_size();
        let flags = (key_flags - (MarshalFlags::ANSI_STRINGS | MarshalFlags::UNICODE_STRINGS))
            | record.char_set.marshal_flags();

        for (position, info) in record.fields.iter().enumerate() {
            let mut name = make_c_identifier(&info.name);
            if info.name.is_empty() {
                name = format!("field{position:x}");
            }

            let ty = classifier.classify_field(info, flags);
            let contains_reference = if info.pointers > 0 || !classifier.universe().is_value_type(info.ty) {
                true
            } else {
                match (ty.kind(), ty.definition()) {
                    (NativeKind::Structure(_), Some(handle)) if ty.indirections() == 0 => {
                        match classifier.cache().get(handle).map(|definition| &**definition) {
                            Some(Definition::Structure(nested)) => {
                                nested.fields().iter().any(NativeField::contains_reference)
                            }
                            _ => false,
                        }
                    }
                    _ => false,
                }
            };
            let offset = info.offset.and_then(|offset| u32::try_from(offset).ok());

            let field = NativeField {
                name,
                ty,
                offset,
                contains_reference,
            };

            if let Some(offset) = field.offset.filter(|_| self.explicit) {
                if field.contains_reference && offset % pointer_size != 0 {
                    self.log
                        .add(Message::MisalignedReferenceTypeField(field.name.clone()));
                }
            }

            if field.ty.size() == 0 {
                // the field type is still being laid out, the structures embed each other
                self.invalid = true;
                self.log
                    .add(Message::RecursiveStructureDeclaration(field.name.clone()));
            }

            if self.explicit && field.offset.is_none() {
                self.log
                    .add(Message::NoFieldOffsetInSequentialLayout(field.name.clone()));
            }

            self.fields.push(field);
        }
    }

    fn sort_fields(&mut self) {
        // the sort is stable, ties keep declaration order
        if self.explicit {
            self.fields.sort_by_key(|field| field.offset.unwrap_or(0));
        }
    }

    fn align_field(&mut self, field_alignment: u32, offset: u32) -> u32 {
        let requirement = field_alignment.min(self.pack);
        if requirement > self.max_alignment {
            self.max_alignment = requirement;
        }
        align_up(offset, requirement)
    }

    fn align_self(&self, offset: u32) -> u32 {
        if self.fields.is_empty() {
            offset + 1
        } else {
            align_up(offset, self.max_alignment.min(self.pack))
        }
    }

    fn size_and_align(&mut self, record: &Record, pointer_size: u32) {
        if VALID_PACKS.contains(&record.pack) {
            self.pack = record.pack.unsigned_abs();
        } else {
            self.log.add(Message::UnsupportedAlignment(record.pack));
            self.pack = 0;
        }
        if self.pack == 0 {
            self.pack = DEFAULT_PACK;
        } else if self.pack != DEFAULT_PACK && record.layout != Layout::Sequential {
            self.log.add(Message::NoPackEffectOnExplicitLayout);
        }

        let minimum_size;
        if self.fields.is_empty() {
            self.size = 1;
            minimum_size = 1;
        } else {
            let mut size = 0;
            for index in 0..self.fields.len() {
                let alignment = self.fields[index].ty.alignment();
                let field_size = self.fields[index].ty.size();

                if self.explicit {
                    self.align_field(alignment, size);
                    let end = self.fields[index].offset.unwrap_or(size).saturating_add(field_size);
                    size = size.max(end);
                } else {
                    size = self.align_field(alignment, size);
                    self.fields[index].offset = Some(size);
                    if self.fields[index].contains_reference && size % pointer_size != 0 {
                        self.log
                            .add(Message::MisalignedReferenceTypeField(self.fields[index].name.clone()));
                    }
                    size = size.saturating_add(field_size);
                }
            }

            minimum_size = size;
            size = self.align_self(size);

            // only possible when structures embed each other
            if size == 0 {
                size = 1;
            }
            self.size = size;
        }

        if record.size < 0 {
            self.log.add(Message::InvalidUnmanagedSize(record.size));
        } else if record.size > 0 {
            let mut declared = record.size.unsigned_abs();
            if declared < minimum_size {
                self.log
                    .add(Message::InsufficientUnmanagedSize(record.size, minimum_size));
                declared = minimum_size;
            }

            self.size = declared;
            if self.align_self(declared) != declared {
                self.unaligned = true;
            }
        }
    }

    /// Groups overlapping explicit fields and decides whether the structure is a union.
    fn classify_unions(mut self) -> StructureDefinition {
        let mut groups = Vec::new();

        if self.explicit && !self.fields.is_empty() {
            // the grouping depends on the unaligned flag it may set, run until it settles
            loop {
                let unaligned = self.unaligned;
                groups.clear();

                let mut first = 0;
                while first < self.fields.len() {
                    let (last, end) = self.last_united_field(first);
                    groups.push(UnionGroup { first, last, end });
                    first = last + 1;
                }

                if self.unaligned == unaligned {
                    break;
                }
            }
        }

        let union = match (groups.as_slice(), self.fields.first()) {
            ([group], Some(first)) => {
                first.offset == Some(0) && group.last == self.fields.len() - 1 && group.end == self.size
            }
            _ => false,
        };

        StructureDefinition {
            name: self.name,
            log: self.log,
            fields: self.fields,
            groups,
            explicit: self.explicit,
            union,
            invalid: self.invalid,
            blittable: self.blittable,
            pack: self.pack,
            size: self.size,
            alignment: self.max_alignment,
            unaligned: self.unaligned,
        }
    }

    /// Finds the last field overlapping the union that starts at `first`; returns its index and
    /// the offset just past the union.
    fn last_united_field(&mut self, first: usize) -> (usize, u32) {
        let field = &self.fields[first];
        let field_size = field.ty.size();

        let Some(start) = field.offset.filter(|_| first + 1 < self.fields.len()) else {
            return (first, field.offset.unwrap_or(0).saturating_add(field_size));
        };

        let mut union_end = start.saturating_add(field_size);
        let mut last = first;

        loop {
            let previous_last = last;
            let previous_end = union_end;

            for index in first + 1..self.fields.len() {
                let Some(offset) = self.fields[index].offset else {
                    return (last, union_end);
                };
                let alignment = self.fields[index].ty.alignment();
                let size = self.fields[index].ty.size();

                if offset < union_end {
                    last = index;
                    union_end = union_end.max(offset.saturating_add(size));
                } else if !self.unaligned {
                    // the field seems to follow the union; check that natural alignment puts it
                    // there
                    let aligned_end = align_up(union_end, alignment.min(self.pack));
                    if offset < aligned_end {
                        self.unaligned = true;
                    } else if offset == aligned_end && index == last + 1 {
                        // grow the union up to the field so the implicit padding matches
                        union_end = aligned_end;
                    }
                }
            }

            if last == previous_last && union_end == previous_end {
                return (last, union_end);
            }
        }
    }
}

/// Printer state while emitting one structure: pack pragmas and padding member names.
struct PrintContext<'p> {
    printer: &'p mut dyn CodePrinter,
    log_printer: &'p mut dyn LogPrinter,
    flags: PrintFlags,
    padding_id: u32,
    current_pack: u32,
    used_non_default_pack: bool,
}

impl<'p> PrintContext<'p> {
    fn new(printer: &'p mut dyn CodePrinter, log_printer: &'p mut dyn LogPrinter, flags: PrintFlags) -> Self {
        PrintContext {
            printer,
            log_printer,
            flags,
            padding_id: 0,
            current_pack: 0,
            used_non_default_pack: false,
        }
    }

    /// Prints `_unusedN` members covering `size` bytes.
    ///
    /// Unless `avoid_larger_types` is set, gaps of 2, 4 and 8 bytes use one integer member of
    /// that size.
    fn print_padding(&mut self, size: u32, avoid_larger_types: bool) {
        if size == 0 {
            return;
        }

        let (name, count) = match size {
            2 if !avoid_larger_types => (TypeName::I2, 1),
            4 if !avoid_larger_types => (TypeName::I4, 1),
            8 if !avoid_larger_types => (TypeName::I8, 1),
            _ => (TypeName::I1, size),
        };

        self.printer.print_ln();
        name.print_to(self.printer, self.flags, 0);
        self.printer.print(OutputType::Other, " ");

        let mut identifier = String::from("_unused");
        let _ = write!(identifier, "{}", self.padding_id);
        self.printer.print(OutputType::Identifier, &identifier);

        if count > 1 {
            self.printer.print(OutputType::Operator, "[");
            self.printer.print(OutputType::Literal, &count.to_string());
            self.printer.print(OutputType::Operator, "]");
        }
        self.printer.print(OutputType::Operator, ";");

        self.padding_id += 1;
    }

    /// Switches to `pack`; the first switch also saves the enclosing pack.
    fn set_pack(&mut self, pack: u32, no_new_line: bool) -> bool {
        if pack == self.current_pack {
            return false;
        }
        if pack != DEFAULT_PACK {
            self.used_non_default_pack = true;
        }

        if !no_new_line {
            self.printer.print_ln();
        }
        if self.current_pack == 0 {
            self.printer.print_ln_with(OutputType::Keyword, "#pragma pack (push)");
        }
        self.printer
            .print(OutputType::Keyword, &format!("#pragma pack ({pack})"));
        self.current_pack = pack;
        true
    }

    /// Restores the pack saved by the first [`PrintContext::set_pack`].
    fn set_default_pack(&mut self) -> bool {
        if self.current_pack == 0 {
            return false;
        }
        self.printer.print_ln();
        self.printer.print(OutputType::Keyword, "#pragma pack (pop)");
        self.current_pack = 0;
        true
    }
}
