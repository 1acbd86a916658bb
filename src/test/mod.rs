//! Shared fixtures for unit tests.

use crate::{
    marshal::{
        descriptor::ParameterInfo,
        native::NativeType,
        universe::{
            Builtin, ClassType, DelegateType, FieldInfo, MethodShape, Record, TypeKind, TypeRef,
            TypeUniverse,
        },
    },
    output::{PrintFlags, TextCodePrinter},
};

/// Renders the part of a native type printed in front of an identifier.
pub fn render_type(native: &NativeType, flags: PrintFlags) -> String {
    let mut printer = TextCodePrinter::new();
    native.print_to(&mut printer, flags);
    printer.into_string()
}

/// Renders the part of a native type printed after an identifier.
pub fn render_post_identifier(native: &NativeType) -> String {
    let mut printer = TextCodePrinter::new();
    native.print_post_identifier_to(&mut printer);
    printer.into_string()
}

// `struct Point { int x; int y; }`, blittable
pub fn add_point(universe: &TypeUniverse) -> TypeRef {
    let int32 = universe.builtin(Builtin::Int32);
    universe
        .add(
            "Contoso",
            "Point",
            TypeKind::Struct(
                Record::sequential()
                    .with_field(FieldInfo::new("x", int32))
                    .with_field(FieldInfo::new("y", int32)),
            ),
        )
        .unwrap()
}

// formatted class with a `bool` member, which makes it non-blittable
pub fn add_rect_class(universe: &TypeUniverse) -> TypeRef {
    let int32 = universe.builtin(Builtin::Int32);
    let record = Record::sequential()
        .with_field(FieldInfo::new("left", int32))
        .with_field(FieldInfo::new("top", int32))
        .with_field(FieldInfo::new("right", int32))
        .with_field(FieldInfo::new("bottom", int32))
        .with_field(FieldInfo::new("empty", universe.builtin(Builtin::Boolean)));

    universe
        .add("Contoso", "Rect", TypeKind::Class(ClassType::with_layout(record)))
        .unwrap()
}

// `delegate bool EnumWindowsProc(IntPtr hwnd, IntPtr lParam)`
pub fn add_callback(universe: &TypeUniverse) -> TypeRef {
    let int_ptr = universe.builtin(Builtin::IntPtr);
    let shape = MethodShape {
        params: vec![
            ParameterInfo::new("hwnd", int_ptr),
            ParameterInfo::new("lParam", int_ptr),
        ],
        ret: ParameterInfo::returning(universe.builtin(Builtin::Boolean)),
    };

    universe
        .add(
            "Contoso",
            "EnumWindowsProc",
            TypeKind::Delegate(DelegateType {
                invoke: Some(shape),
                function_pointer: None,
            }),
        )
        .unwrap()
}
