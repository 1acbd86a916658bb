//! Integration tests for structure layout.
//!
//! These tests describe structures the way a binding author would and check the sizes,
//! offsets and declarations the marshaler-compatible layout produces on both platforms.

use marshalscope::{
    marshal::{Definition, StructureDefinition},
    prelude::*,
};

fn layout_of(
    universe: &TypeUniverse,
    cache: &mut DefinitionCache,
    ty: TypeRef,
    flags: MarshalFlags,
) -> NativeType {
    Classifier::new(universe, cache).classify_type(ty, flags)
}

fn structure_of<'c>(cache: &'c DefinitionCache, native: &NativeType) -> &'c StructureDefinition {
    let definition = native
        .definition()
        .and_then(|handle| cache.get(handle))
        .map(|definition| &**definition);

    match definition {
        Some(Definition::Structure(structure)) => structure,
        other => panic!("expected a structure, got {other:?}"),
    }
}

fn render(structure: &StructureDefinition) -> String {
    let mut printer = TextCodePrinter::new();
    structure.print_to(&mut printer, &mut LogMemoryPrinter::new(), PrintFlags::empty());
    printer.into_string()
}

#[test]
fn test_pointer_sized_fields_follow_platform() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso.Interop",
        "HandleEntry",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("tag", universe.builtin(Builtin::Byte)))
                .with_field(FieldInfo::new("handle", universe.builtin(Builtin::IntPtr))),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let win32 = layout_of(&universe, &mut cache, ty, MarshalFlags::empty());
    let win64 = layout_of(&universe, &mut cache, ty, MarshalFlags::PLATFORM_64BIT);

    assert_eq!(win32.size(), 8);
    assert_eq!(win32.alignment(), 4);
    assert_eq!(win64.size(), 16);
    assert_eq!(win64.alignment(), 8);
    assert_ne!(win32.definition(), win64.definition());

    let offsets: Vec<_> = structure_of(&cache, &win64)
        .fields()
        .iter()
        .map(|field| field.offset())
        .collect();
    assert_eq!(offsets, [Some(0), Some(8)]);
    Ok(())
}

#[test]
fn test_nested_structure_is_aligned_as_its_widest_member() -> Result<()> {
    let universe = TypeUniverse::new();
    let int32 = universe.builtin(Builtin::Int32);
    let point = universe.add(
        "Contoso",
        "Point",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("x", int32))
                .with_field(FieldInfo::new("y", int32)),
        ),
    )?;
    let marker = universe.add(
        "Contoso",
        "Marker",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("visible", universe.builtin(Builtin::Byte)))
                .with_field(FieldInfo::new("location", point)),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, marker, MarshalFlags::empty());
    assert_eq!(native.size(), 12);
    assert_eq!(native.alignment(), 4);

    let marker = structure_of(&cache, &native);
    assert_eq!(marker.fields()[1].offset(), Some(4));
    assert!(marker.log().is_empty());
    Ok(())
}

#[test]
fn test_declared_size() -> Result<()> {
    let universe = TypeUniverse::new();
    let int32 = universe.builtin(Builtin::Int32);

    let padded = universe.add(
        "Contoso",
        "Padded",
        TypeKind::Struct(
            Record::sequential()
                .with_size(16)
                .with_field(FieldInfo::new("value", int32)),
        ),
    )?;
    let truncated = universe.add(
        "Contoso",
        "Truncated",
        TypeKind::Struct(
            Record::sequential()
                .with_size(2)
                .with_field(FieldInfo::new("value", int32)),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let padded = layout_of(&universe, &mut cache, padded, MarshalFlags::empty());
    assert_eq!(padded.size(), 16);
    assert!(structure_of(&cache, &padded).log().is_empty());

    let truncated = layout_of(&universe, &mut cache, truncated, MarshalFlags::empty());
    assert_eq!(truncated.size(), 4);
    assert!(structure_of(&cache, &truncated)
        .log()
        .contains(MessageCode::InsufficientUnmanagedSize));
    Ok(())
}

#[test]
fn test_explicit_layout_prints_overlap_as_union() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso",
        "LargeInteger",
        TypeKind::Struct(
            Record::explicit()
                .with_field(FieldInfo::new("low", universe.builtin(Builtin::UInt32)).at(0))
                .with_field(FieldInfo::new("high", universe.builtin(Builtin::Int32)).at(4))
                .with_field(FieldInfo::new("quad", universe.builtin(Builtin::Int64)).at(0)),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, ty, MarshalFlags::empty());
    let large = structure_of(&cache, &native);

    assert!(large.is_explicit_layout());
    assert_eq!(large.size(), 8);

    // sorted by offset, declaration order kept for ties
    let names: Vec<_> = large.fields().iter().map(|field| field.name()).collect();
    assert_eq!(names, ["low", "quad", "high"]);
    Ok(())
}

#[test]
fn test_layout_shared_between_occurrences() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso",
        "Size",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("cx", universe.builtin(Builtin::Int32)))
                .with_field(FieldInfo::new("cy", universe.builtin(Builtin::Int32))),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);
    let by_value = classifier.classify_type(ty, MarshalFlags::empty());
    let by_ref = classifier.classify_parameter(
        &ParameterInfo::new("size", ty).by_ref(),
        None,
        MarshalFlags::empty(),
    );

    assert_eq!(by_value.definition(), by_ref.definition());
    assert_eq!(cache.len(), 1);
    Ok(())
}

#[test]
fn test_partial_overlap_prints_inner_union() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso",
        "Overlap",
        TypeKind::Struct(
            Record::explicit()
                .with_field(FieldInfo::new("a", universe.builtin(Builtin::Int32)).at(0))
                .with_field(FieldInfo::new("b", universe.builtin(Builtin::Int64)).at(0))
                .with_field(FieldInfo::new("c", universe.builtin(Builtin::Int32)).at(8)),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, ty, MarshalFlags::empty());
    let overlap = structure_of(&cache, &native);

    assert!(!overlap.is_union());
    assert_eq!(overlap.size(), 16);
    assert_eq!(
        render(overlap),
        "#pragma pack (push)\n#pragma pack (8)\nstruct Overlap // size = 16 bytes\n{\n    union\n    {\n        INT a;\n        LONG64 b;\n    };\n    INT c;\n};\n#pragma pack (pop)"
    );
    Ok(())
}

#[test]
fn test_explicit_offsets_matching_sequential_layout() -> Result<()> {
    let universe = TypeUniverse::new();
    let byte = universe.builtin(Builtin::Byte);
    let int32 = universe.builtin(Builtin::Int32);
    let int16 = universe.builtin(Builtin::Int16);

    let explicit = universe.add(
        "Contoso",
        "Mixed",
        TypeKind::Struct(
            Record::explicit()
                .with_field(FieldInfo::new("a", byte).at(0))
                .with_field(FieldInfo::new("b", int32).at(4))
                .with_field(FieldInfo::new("c", int16).at(8)),
        ),
    )?;
    let sequential = universe.add(
        "Contoso.Sequential",
        "Mixed",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("a", byte))
                .with_field(FieldInfo::new("b", int32))
                .with_field(FieldInfo::new("c", int16)),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let explicit = layout_of(&universe, &mut cache, explicit, MarshalFlags::empty());
    let sequential = layout_of(&universe, &mut cache, sequential, MarshalFlags::empty());
    let explicit = structure_of(&cache, &explicit);
    let sequential = structure_of(&cache, &sequential);

    assert!(!explicit.is_union());
    assert_eq!(explicit.size(), sequential.size());
    assert_eq!(render(explicit), render(sequential));
    Ok(())
}

#[test]
fn test_odd_declared_size_uses_pack_one() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso",
        "Odd",
        TypeKind::Struct(
            Record::sequential()
                .with_size(13)
                .with_field(FieldInfo::new("a", universe.builtin(Builtin::Int64)))
                .with_field(FieldInfo::new("b", universe.builtin(Builtin::Byte))),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, ty, MarshalFlags::empty());
    let odd = structure_of(&cache, &native);

    assert_eq!(odd.size(), 13);
    assert!(odd.has_unaligned_size_or_offsets());
    assert_eq!(
        render(odd),
        "#pragma pack (push)\n#pragma pack (1)\nstruct Odd // size = 13 bytes\n{\n    LONG64 a;\n    BYTE b;\n    CHAR _unused0[4];\n};\n#pragma pack (pop)"
    );
    Ok(())
}

#[test]
fn test_sequential_offsets_are_ordered_and_aligned() -> Result<()> {
    let universe = TypeUniverse::new();
    let byte = universe.builtin(Builtin::Byte);
    let int16 = universe.builtin(Builtin::Int16);
    let int32 = universe.builtin(Builtin::Int32);
    let int64 = universe.builtin(Builtin::Int64);
    let double = universe.builtin(Builtin::Double);
    let handle = universe.builtin(Builtin::IntPtr);
    let shorts = universe.array_of(int16);
    let point = universe.add(
        "Contoso",
        "Point",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("x", int32))
                .with_field(FieldInfo::new("y", int32)),
        ),
    )?;
    let triple = || MarshalAs::new(UnmanagedType::ByValArray).with_size_const(3);

    let mixes: Vec<Vec<FieldInfo>> = vec![
        vec![
            FieldInfo::new("a", byte),
            FieldInfo::new("b", int64),
            FieldInfo::new("c", int16),
        ],
        vec![
            FieldInfo::new("a", int16),
            FieldInfo::new("b", byte),
            FieldInfo::new("c", double),
            FieldInfo::new("d", byte),
            FieldInfo::new("e", int32),
        ],
        vec![
            FieldInfo::new("a", byte),
            FieldInfo::new("b", point),
            FieldInfo::new("c", handle),
            FieldInfo::new("d", shorts).with_marshal_as(triple()),
            FieldInfo::new("e", int64),
        ],
        vec![
            FieldInfo::new("a", shorts).with_marshal_as(triple()),
            FieldInfo::new("b", byte),
            FieldInfo::new("c", handle),
        ],
    ];

    let mut cache = DefinitionCache::new();
    for (index, mix) in mixes.iter().enumerate() {
        for pack in [1, 2, 4, 8, 16] {
            let record = mix
                .iter()
                .cloned()
                .fold(Record::sequential().with_pack(pack), Record::with_field);
            let ty = universe.add(
                "Contoso.Packed",
                &format!("Mix{index}Pack{pack}"),
                TypeKind::Struct(record),
            )?;

            for platform in [MarshalFlags::empty(), MarshalFlags::PLATFORM_64BIT] {
                let native = layout_of(&universe, &mut cache, ty, platform);
                let structure = structure_of(&cache, &native);
                let effective = pack.unsigned_abs();
                let fields = structure.fields();

                for field in fields {
                    let offset = field.offset().unwrap_or(u32::MAX);
                    let requirement = field.ty().alignment().min(effective);
                    assert_eq!(
                        offset % requirement,
                        0,
                        "{} of mix {index} misaligned under pack {pack}",
                        field.name()
                    );
                }
                for pair in fields.windows(2) {
                    let end = pair[0].offset().unwrap_or(u32::MAX) + pair[0].ty().size();
                    assert!(
                        end <= pair[1].offset().unwrap_or(0),
                        "{} overlaps {} in mix {index} under pack {pack}",
                        pair[0].name(),
                        pair[1].name()
                    );
                }

                let last = &fields[fields.len() - 1];
                assert!(structure.size() >= last.offset().unwrap_or(0) + last.ty().size());
                assert_eq!(structure.size() % structure.alignment().min(effective), 0);
            }
        }
    }
    Ok(())
}

#[test]
fn test_explicit_field_without_offset_still_prints() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso",
        "Scattered",
        TypeKind::Struct(
            Record::explicit()
                .with_field(FieldInfo::new("a", universe.builtin(Builtin::Int64)).at(0))
                .with_field(FieldInfo::new("c", universe.builtin(Builtin::Int32)))
                .with_field(FieldInfo::new("b", universe.builtin(Builtin::Int32)).at(2))
                .with_field(FieldInfo::new("d", universe.builtin(Builtin::Byte)).at(3)),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, ty, MarshalFlags::empty());
    let scattered = structure_of(&cache, &native);

    assert!(scattered
        .log()
        .contains(MessageCode::NoFieldOffsetInSequentialLayout));
    let text = render(scattered);
    assert!(text.starts_with("#pragma pack (push)"));
    assert!(text.contains("union"));
    Ok(())
}

#[test]
fn test_oversized_embedded_array_falls_back_to_one_element() -> Result<()> {
    let universe = TypeUniverse::new();
    let longs = universe.array_of(universe.builtin(Builtin::Int64));
    let ty = universe.add(
        "Contoso",
        "Enormous",
        TypeKind::Struct(
            Record::sequential().with_field(
                FieldInfo::new("values", longs).with_marshal_as(
                    MarshalAs::new(UnmanagedType::ByValArray).with_size_const(1_000_000_000),
                ),
            ),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, ty, MarshalFlags::empty());
    assert_eq!(native.size(), 8);

    let enormous = structure_of(&cache, &native);
    assert!(enormous.fields()[0]
        .ty()
        .log()
        .contains(MessageCode::ByValArrayTooLarge));
    assert!(render(enormous).contains("LONG64 values[1];"));
    Ok(())
}

#[test]
fn test_packed_reference_field_is_reported() -> Result<()> {
    let universe = TypeUniverse::new();
    let ty = universe.add(
        "Contoso",
        "PackedName",
        TypeKind::Struct(
            Record::sequential()
                .with_pack(1)
                .with_field(FieldInfo::new("flag", universe.builtin(Builtin::Byte)))
                .with_field(FieldInfo::new("name", universe.builtin(Builtin::String))),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let native = layout_of(&universe, &mut cache, ty, MarshalFlags::PLATFORM_64BIT);
    let packed = structure_of(&cache, &native);

    assert_eq!(packed.fields()[1].offset(), Some(1));
    assert!(packed.log().contains(MessageCode::MisalignedReferenceTypeField));
    Ok(())
}
