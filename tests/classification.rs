//! Integration tests for classifying parameters, return values and fields.

use marshalscope::prelude::*;

fn render(native: &NativeType, flags: PrintFlags) -> String {
    let mut printer = TextCodePrinter::new();
    native.print_to(&mut printer, flags);
    native.print_post_identifier_to(&mut printer);
    printer.into_string()
}

#[test]
fn test_string_parameters_by_character_set() -> Result<()> {
    let universe = TypeUniverse::new();
    let string = universe.builtin(Builtin::String);
    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);

    let param = ParameterInfo::new("path", string);
    let ansi = classifier.classify_parameter(&param, None, MarshalFlags::ANSI_STRINGS);
    let unicode = classifier.classify_parameter(&param, None, MarshalFlags::UNICODE_STRINGS);
    let com = classifier.classify_parameter(&param, None, MarshalFlags::COM_INTEROP);

    assert_eq!(render(&ansi, PrintFlags::empty()), "LPCSTR");
    assert_eq!(render(&unicode, PrintFlags::empty()), "LPCWSTR");
    assert_eq!(render(&unicode, PrintFlags::USE_PLAIN_C), "const wchar_t *");
    assert_eq!(render(&com, PrintFlags::empty()), "BSTR");

    let auto = classifier.classify_parameter(&param, None, MarshalFlags::empty());
    assert!(auto.log().contains(MessageCode::AutoStringMarshaling));
    Ok(())
}

#[test]
fn test_explicit_string_representation() -> Result<()> {
    let universe = TypeUniverse::new();
    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);

    let buffer = ParameterInfo::new("buffer", universe.builtin(Builtin::StringBuilder))
        .with_marshal_as(MarshalAs::new(UnmanagedType::LPWStr));
    let native = classifier.classify_parameter(&buffer, None, MarshalFlags::ANSI_STRINGS);
    assert_eq!(render(&native, PrintFlags::empty()), "LPWSTR");
    assert!(native.marshals_in());
    assert!(native.marshals_out());
    assert!(native.log().contains(MessageCode::StringBuilderRequiresInit));
    Ok(())
}

#[test]
fn test_fixed_length_string_field() -> Result<()> {
    let universe = TypeUniverse::new();
    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);

    let field = FieldInfo::new("szName", universe.builtin(Builtin::String))
        .with_marshal_as(MarshalAs::new(UnmanagedType::ByValTStr).with_size_const(16));
    let native = classifier.classify_field(&field, MarshalFlags::UNICODE_STRINGS);

    assert_eq!(render(&native, PrintFlags::empty()), "WCHAR[16]");
    assert_eq!(native.size(), 32);
    Ok(())
}

#[test]
fn test_arrays() -> Result<()> {
    let universe = TypeUniverse::new();
    let ints = universe.array_of(universe.builtin(Builtin::Int32));
    let strings = universe.array_of(universe.builtin(Builtin::String));
    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);

    let values = classifier.classify_parameter(&ParameterInfo::new("values", ints), None, MarshalFlags::empty());
    assert_eq!(render(&values, PrintFlags::empty()), "INT[]");
    assert!(values.log().contains(MessageCode::ArraySizeDeterminedDynamically));

    let names = classifier.classify_parameter(
        &ParameterInfo::new("names", strings),
        None,
        MarshalFlags::COM_INTEROP,
    );
    assert_eq!(render(&names, PrintFlags::empty()), "const LPSAFEARRAY");
    Ok(())
}

#[test]
fn test_formatted_class_passed_as_pointer() -> Result<()> {
    let universe = TypeUniverse::new();
    let int32 = universe.builtin(Builtin::Int32);
    let record = Record::sequential()
        .with_field(FieldInfo::new("left", int32))
        .with_field(FieldInfo::new("top", int32))
        .with_field(FieldInfo::new("right", int32))
        .with_field(FieldInfo::new("bottom", int32))
        .with_field(FieldInfo::new("empty", universe.builtin(Builtin::Boolean)));
    let rect = universe.add("Contoso", "Rect", TypeKind::Class(ClassType::with_layout(record)))?;

    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);
    let native = classifier.classify_parameter(&ParameterInfo::new("rc", rect), None, MarshalFlags::empty());

    assert_eq!(render(&native, PrintFlags::empty()), "const struct Rect *");
    assert_eq!(native.size(), 4);
    Ok(())
}

#[test]
fn test_enum_requested_width() -> Result<()> {
    let universe = TypeUniverse::new();
    let color = universe.add(
        "Contoso",
        "Color",
        TypeKind::Enum(
            EnumType::new(universe.builtin(Builtin::Int32))
                .with_member("Red", 0)
                .with_member("Green", 1),
        ),
    )?;

    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);
    let native = classifier.classify_type(color, MarshalFlags::empty());
    assert_eq!(render(&native, PrintFlags::empty()), "Color");
    assert_eq!(native.size(), 4);

    let wide = ParameterInfo::new("color", color).with_marshal_as(MarshalAs::new(UnmanagedType::I8));
    let wide = classifier.classify_parameter(&wide, None, MarshalFlags::empty());
    assert!(wide.log().contains(MessageCode::UnrecognizedMarshalingForContext));
    Ok(())
}

#[test]
fn test_out_by_value_value_type() -> Result<()> {
    let universe = TypeUniverse::new();
    let mut cache = DefinitionCache::new();
    let mut classifier = Classifier::new(&universe, &mut cache);

    let param = ParameterInfo::new("count", universe.builtin(Builtin::Int32))
        .with_attributes(ParamAttributes::OUT);
    let native = classifier.classify_parameter(&param, None, MarshalFlags::empty());

    // the copy still reports out, the caller just never sees the change
    assert!(native.log().contains(MessageCode::ByValValueTypeMarkedOut));
    assert!(native.marshals_out());
    assert_eq!(native.indirections(), 0);
    Ok(())
}
