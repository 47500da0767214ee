//! Model builders shared by the unit tests.

mod filter_tests;
mod type_name_tests;

use crate::model::*;
use crate::renderer::*;

pub(crate) fn compiler_attribute(name: &str, positional: Vec<ConstantValue>) -> CustomAnnotation {
    CustomAnnotation::new("System.Runtime.CompilerServices", name, positional)
}

pub(crate) fn byte_array(bytes: &[u8]) -> ConstantValue {
    ConstantValue::Array(ArrayValue {
        element_type: TypeReference::primitive(PrimitiveType::UInt8),
        elements: Some(bytes.iter().map(|b| ConstantValue::UInt8(*b)).collect()),
    })
}

pub(crate) fn bool_array(flags: &[bool]) -> ConstantValue {
    ConstantValue::Array(ArrayValue {
        element_type: TypeReference::primitive(PrimitiveType::Boolean),
        elements: Some(flags.iter().map(|f| ConstantValue::Boolean(*f)).collect()),
    })
}

pub(crate) fn nullable(bytes: &[u8]) -> CustomAnnotation {
    compiler_attribute("NullableAttribute", vec![byte_array(bytes)])
}

pub(crate) fn nullable_byte(byte: u8) -> CustomAnnotation {
    compiler_attribute("NullableAttribute", vec![ConstantValue::UInt8(byte)])
}

pub(crate) fn nullable_context(byte: u8) -> CustomAnnotation {
    compiler_attribute("NullableContextAttribute", vec![ConstantValue::UInt8(byte)])
}

pub(crate) fn tuple_names(names: &[Option<&str>]) -> CustomAnnotation {
    compiler_attribute(
        "TupleElementNamesAttribute",
        vec![ConstantValue::Array(ArrayValue {
            element_type: TypeReference::primitive(PrimitiveType::String),
            elements: Some(
                names
                    .iter()
                    .map(|n| match n {
                        Some(name) => ConstantValue::String(name.to_string()),
                        None => ConstantValue::Null,
                    })
                    .collect(),
            ),
        })],
    )
}

pub(crate) fn int() -> TypeReference {
    TypeReference::primitive(PrimitiveType::Int32)
}

pub(crate) fn string() -> TypeReference {
    TypeReference::primitive(PrimitiveType::String)
}

pub(crate) fn object() -> TypeReference {
    TypeReference::primitive(PrimitiveType::Object)
}

pub(crate) fn value_tuple(arguments: Vec<TypeReference>) -> TypeReference {
    TypeReference::Named(NamedType::value("System", "ValueTuple").with_arguments(arguments))
}

pub(crate) fn generic_list(argument: TypeReference) -> TypeReference {
    TypeReference::Named(
        NamedType::new("System.Collections.Generic", "List").with_arguments(vec![argument]),
    )
}

pub(crate) fn public_method(name: &str, return_type: TypeReference, parameters: Vec<Parameter>) -> MethodDeclaration {
    MethodDeclaration {
        return_type,
        parameters,
        ..MethodDeclaration::new(name, Accessibility::Public)
    }
}

pub(crate) fn module_with(types: Vec<TypeDeclaration>) -> ModuleModel {
    ModuleModel {
        name: "Demo".to_string(),
        types,
        ..ModuleModel::default()
    }
}

/// Flags enum `Demo.Perms` with the given constants.
pub(crate) fn flags_enum(name: &str, constants: &[(&str, i32)]) -> TypeDeclaration {
    let mut decl = TypeDeclaration::new("Demo", name, TypeKind::Enum);
    decl.annotations
        .push(CustomAnnotation::new("System", "FlagsAttribute", Vec::new()));
    decl.fields = constants
        .iter()
        .map(|(field, value)| enum_constant(name, field, *value))
        .collect();
    decl
}

pub(crate) fn enum_constant(enum_name: &str, name: &str, value: i32) -> FieldDeclaration {
    FieldDeclaration {
        name: name.to_string(),
        accessibility: Accessibility::Public,
        modifiers: FieldModifiers::STATIC | FieldModifiers::LITERAL,
        ty: TypeReference::value("Demo", enum_name),
        constant: Some(ConstantValue::Int32(value)),
        annotations: Vec::new(),
    }
}

/// Full C# rendition with default options, split into lines.
pub(crate) fn render(module: &ModuleModel) -> Vec<String> {
    let mut writer = ApiWriter::new(CSharpRenderer::new());
    writer
        .render_to_string(module)
        .lines()
        .map(str::to_string)
        .collect()
}
