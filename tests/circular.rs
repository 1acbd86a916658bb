//! Structures that refer to each other.

use std::sync::Arc;

use marshalscope::{
    marshal::{DefKey, Definition},
    prelude::*,
};

#[test]
fn test_mutual_pointers_use_forward_declaration() -> Result<()> {
    let universe = Arc::new(TypeUniverse::new());
    let parent = universe.declare("Contoso.Tree", "Parent");
    let child = universe.add(
        "Contoso.Tree",
        "Child",
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("owner", parent).with_pointers(1))
                .with_field(FieldInfo::new("value", universe.builtin(Builtin::Int32))),
        ),
    )?;
    universe.define(
        parent,
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("first", child).with_pointers(1))
                .with_field(FieldInfo::new("count", universe.builtin(Builtin::Int32))),
        ),
    )?;

    let method = PInvokeMethod::new("Visit", universe.builtin(Builtin::Void))
        .exact_spelling()
        .with_param(ParameterInfo::new("root", parent).by_ref());

    let generated = SignatureGenerator::new(universe, GeneratorConfig::win32()).generate_pinvoke(&method)?;
    let code = &generated.code;

    let forward = code.find("struct Parent;").unwrap();
    let child_definition = code.find("struct Child // size = 8 bytes").unwrap();
    let parent_definition = code.find("struct Parent // size = 8 bytes").unwrap();
    let prototype = code.find("VOID WINAPI Visit(struct Parent * root);").unwrap();

    assert!(forward < child_definition);
    assert!(child_definition < parent_definition);
    assert!(parent_definition < prototype);
    assert!(code.contains("struct Parent * owner;"));
    assert!(code.contains("struct Child * first;"));
    Ok(())
}

#[test]
fn test_self_referencing_list_node() -> Result<()> {
    let universe = Arc::new(TypeUniverse::new());
    let node = universe.declare("Contoso", "Node");
    universe.define(
        node,
        TypeKind::Struct(
            Record::sequential()
                .with_field(FieldInfo::new("next", node).with_pointers(1))
                .with_field(FieldInfo::new("data", universe.builtin(Builtin::IntPtr))),
        ),
    )?;

    let method = PInvokeMethod::new("Push", universe.builtin(Builtin::Void))
        .exact_spelling()
        .with_param(ParameterInfo::new("head", node).by_ref());

    let generated = SignatureGenerator::new(universe, GeneratorConfig::win64()).generate_pinvoke(&method)?;

    assert!(!generated.code.contains("struct Node;"));
    assert_eq!(generated.code.matches("struct Node // size = 16 bytes").count(), 1);
    Ok(())
}

#[test]
fn test_embedding_by_value_is_reported() -> Result<()> {
    let universe = TypeUniverse::new();
    let outer = universe.declare("Contoso", "Outer");
    let inner = universe.add(
        "Contoso",
        "Inner",
        TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("outer", outer))),
    )?;
    universe.define(
        outer,
        TypeKind::Struct(Record::sequential().with_field(FieldInfo::new("inner", inner))),
    )?;

    let mut cache = DefinitionCache::new();
    let native = Classifier::new(&universe, &mut cache).classify_type(outer, MarshalFlags::empty());

    let invalid = cache
        .iter()
        .filter_map(|(handle, definition)| match &**definition {
            Definition::Structure(structure) if structure.is_invalid() => Some((handle, structure)),
            _ => None,
        })
        .collect::<Vec<_>>();

    // fields take the char set of their structure, so the embedded Outer is keyed apart from
    // the top-level one and is the definition caught mid-layout
    assert_eq!(invalid.len(), 1);
    let (handle, structure) = invalid[0];
    assert_eq!(
        cache.lookup(&DefKey::Structure(outer, MarshalFlags::ANSI_STRINGS)),
        Some(handle)
    );
    assert_eq!(structure.name(), "Outer");
    assert!(structure.size() > 0);
    assert!(structure
        .log()
        .contains(MessageCode::RecursiveStructureDeclaration));

    let top = native.definition();
    assert_eq!(cache.lookup(&DefKey::Structure(outer, MarshalFlags::empty())), top);
    assert_ne!(top, Some(handle));
    Ok(())
}
