use super::*;
use crate::renderer::type_names::*;

fn named(namespace: &str, name: &str) -> TypeReference {
    TypeReference::class(namespace, name)
}

#[test]
fn test_nullable_slots_follow_each_declaration() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let root = RenderContext::new(&module, &options);
    let ctx = root.in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let t = TypeReference::generic("T");
    let a = Parameter {
        annotations: vec![nullable(&[2])],
        ..Parameter::new("a", t.clone())
    };
    let b = Parameter {
        annotations: vec![nullable(&[1, 2])],
        ..Parameter::new("b", TypeReference::array(t))
    };

    let (text, slots) = resolver.render_with_slots(&a.ty, &AnnotationScope::direct(&a.annotations), RefKind::Ref);
    assert_eq!(text, "T?");
    assert_eq!(slots.nullable, 1);

    let (text, slots) = resolver.render_with_slots(&b.ty, &AnnotationScope::direct(&b.annotations), RefKind::Ref);
    assert_eq!(text, "T?[]");
    assert_eq!(slots.nullable, 2);
    assert_eq!(slots.dynamic, 2);
}

#[test]
fn test_nested_generic_arguments_consume_slots_depth_first() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let dictionary = TypeReference::Named(
        NamedType::new("System.Collections.Generic", "Dictionary")
            .with_arguments(vec![string(), generic_list(string())]),
    );
    let annotations = vec![nullable(&[1, 2, 2, 1])];
    let (text, slots) =
        resolver.render_with_slots(&dictionary, &AnnotationScope::direct(&annotations), RefKind::Ref);
    assert_eq!(
        text,
        "System.Collections.Generic.Dictionary<string?, System.Collections.Generic.List<string>?>"
    );
    assert_eq!(slots.nullable, 4);
    assert_eq!(slots.dynamic, 4);
}

#[test]
fn test_single_nullable_byte_applies_to_every_slot() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let annotations = vec![nullable_byte(2)];
    let text = resolver.render(&generic_list(string()), &AnnotationScope::direct(&annotations));
    assert_eq!(text, "System.Collections.Generic.List<string?>?");
}

#[test]
fn test_nullable_value_type_takes_no_nullable_slot() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let nullable_int =
        TypeReference::Named(NamedType::value("System", "Nullable").with_arguments(vec![int()]));
    let annotations = vec![nullable(&[2])];
    let (text, slots) =
        resolver.render_with_slots(&nullable_int, &AnnotationScope::direct(&annotations), RefKind::Ref);
    assert_eq!(text, "int?");
    assert_eq!(slots.nullable, 0);
    assert_eq!(slots.dynamic, 2);

    // The wrapper does not shift the slots of what follows it.
    let pair = value_tuple(vec![nullable_int, string()]);
    let annotations = vec![nullable(&[0, 2])];
    let text = resolver.render(&pair, &AnnotationScope::direct(&annotations));
    assert_eq!(text, "(int?, string?)");
}

#[test]
fn test_malformed_nullable_annotation_is_oblivious() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let annotations = vec![compiler_attribute(
        "NullableAttribute",
        vec![ConstantValue::String("2".to_string())],
    )];
    assert_eq!(resolver.render(&string(), &AnnotationScope::direct(&annotations)), "string");

    // A short array leaves the remaining slots oblivious.
    let annotations = vec![nullable(&[2])];
    assert_eq!(
        resolver.render(&generic_list(string()), &AnnotationScope::direct(&annotations)),
        "System.Collections.Generic.List<string>?"
    );
}

#[test]
fn test_nullable_context_inheritance() {
    let mut decl = TypeDeclaration::new("Demo", "Holder", TypeKind::Class);
    decl.annotations.push(nullable_context(2));
    let module = module_with(vec![decl]);
    let options = RenderOptions::default();
    let root = RenderContext::new(&module, &options).in_namespace("Demo");
    let holder = &module.types[0];
    let resolver = TypeNameResolver::new(&root);

    let mut method = public_method("Run", TypeReference::void(), vec![]);
    let scope = AnnotationScope::default().in_method(&method).in_type(holder);
    assert_eq!(resolver.render(&string(), &scope), "string?");

    // The method context is nearer than the type context.
    method.annotations.push(nullable_context(1));
    let scope = AnnotationScope::default().in_method(&method).in_type(holder);
    assert_eq!(resolver.render(&string(), &scope), "string");

    // Direct annotations beat both.
    let direct = vec![nullable_byte(2)];
    let scope = AnnotationScope::direct(&direct).in_method(&method).in_type(holder);
    assert_eq!(resolver.render(&string(), &scope), "string?");

    // Enclosing types are consulted when no declaring type is given.
    let inside = root.enter(holder);
    let resolver = TypeNameResolver::new(&inside);
    assert_eq!(resolver.render(&string(), &AnnotationScope::default()), "string?");
}

#[test]
fn test_dynamic_flags() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let dynamic = |flags: &[bool]| {
        vec![compiler_attribute("DynamicAttribute", vec![bool_array(flags)])]
    };
    let bare = vec![compiler_attribute("DynamicAttribute", vec![])];

    assert_eq!(resolver.render(&object(), &AnnotationScope::direct(&bare)), "dynamic");
    assert_eq!(
        resolver.render(&generic_list(object()), &AnnotationScope::direct(&dynamic(&[false, true]))),
        "System.Collections.Generic.List<dynamic>"
    );
    // Without arguments only the outermost node is dynamic.
    assert_eq!(
        resolver.render(&TypeReference::array(object()), &AnnotationScope::direct(&bare)),
        "object[]"
    );
    assert_eq!(
        resolver.render(
            &TypeReference::array(object()),
            &AnnotationScope::direct(&dynamic(&[false, true]))
        ),
        "dynamic[]"
    );
}

#[test]
fn test_native_integers() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);
    let intptr = TypeReference::primitive(PrimitiveType::IntPtr);
    let uintptr = TypeReference::primitive(PrimitiveType::UIntPtr);

    let bare = vec![compiler_attribute("NativeIntegerAttribute", vec![])];
    assert_eq!(resolver.render(&intptr, &AnnotationScope::direct(&bare)), "nint");
    assert_eq!(resolver.render(&uintptr, &AnnotationScope::default()), "System.UIntPtr");

    let per_slot = vec![compiler_attribute(
        "NativeIntegerAttribute",
        vec![bool_array(&[false, true])],
    )];
    let (text, slots) = resolver.render_with_slots(
        &value_tuple(vec![intptr.clone(), intptr.clone()]),
        &AnnotationScope::direct(&per_slot),
        RefKind::Ref,
    );
    assert_eq!(text, "(System.IntPtr, nint)");
    assert_eq!(slots.native_integer, 2);

    let in_system = RenderContext::new(&module, &options).in_namespace("System");
    assert_eq!(
        TypeNameResolver::new(&in_system).render(&intptr, &AnnotationScope::default()),
        "IntPtr"
    );

    let mut modern = module_with(vec![]);
    modern.supports_native_integers = true;
    let ctx = RenderContext::new(&modern, &options).in_namespace("Demo");
    assert_eq!(
        TypeNameResolver::new(&ctx).render(&uintptr, &AnnotationScope::default()),
        "nuint"
    );
}

#[test]
fn test_long_tuple_names_span_the_rest_element() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let mut arguments = vec![int(); 7];
    arguments.push(value_tuple(vec![string()]));
    let tuple = value_tuple(arguments);
    let annotations = vec![
        tuple_names(&[
            Some("a"),
            Some("b"),
            Some("c"),
            Some("d"),
            Some("e"),
            Some("f"),
            Some("g"),
            Some("h"),
        ]),
        nullable(&[0, 0, 2]),
    ];
    let (text, slots) =
        resolver.render_with_slots(&tuple, &AnnotationScope::direct(&annotations), RefKind::Ref);
    assert_eq!(
        text,
        "(int a, int b, int c, int d, int e, int f, int g, string? h)"
    );
    assert_eq!(slots.tuple_name, 8);
    assert_eq!(slots.nullable, 3);
    assert_eq!(slots.dynamic, 10);
}

#[test]
fn test_nested_tuple_names_are_taken_outer_first() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let tuple = value_tuple(vec![int(), value_tuple(vec![string(), int()])]);
    let annotations = vec![tuple_names(&[Some("a"), Some("d"), Some("b"), Some("c")])];
    assert_eq!(
        resolver.render(&tuple, &AnnotationScope::direct(&annotations)),
        "(int a, (string b, int c) d)"
    );

    let partial = vec![tuple_names(&[Some("x"), None])];
    assert_eq!(
        resolver.render(&value_tuple(vec![int(), int()]), &AnnotationScope::direct(&partial)),
        "(int x, int)"
    );
}

#[test]
fn test_function_pointers() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    // Return slots are consumed before parameter slots.
    let managed = TypeReference::FunctionPointer(FunctionPointerType {
        calling_convention: CallingConvention::Default,
        return_type: Box::new(string()),
        parameters: vec![string()],
    });
    let annotations = vec![nullable(&[2, 1])];
    assert_eq!(
        resolver.render(&managed, &AnnotationScope::direct(&annotations)),
        "delegate*<string, string?>"
    );

    let conventions = TypeReference::FunctionPointer(FunctionPointerType {
        calling_convention: CallingConvention::Unmanaged,
        return_type: Box::new(TypeReference::optional(
            NamedType::new("System.Runtime.CompilerServices", "CallConvCdecl"),
            TypeReference::optional(
                NamedType::new("System.Runtime.CompilerServices", "CallConvSuppressGCTransition"),
                TypeReference::void(),
            ),
        )),
        parameters: vec![],
    });
    assert_eq!(
        resolver.render(&conventions, &AnnotationScope::default()),
        "delegate* unmanaged[Cdecl, SuppressGCTransition]<void>"
    );

    let in_modifier = NamedType::new("System.Runtime.InteropServices", "InAttribute");
    let by_ref = TypeReference::FunctionPointer(FunctionPointerType {
        calling_convention: CallingConvention::StdCall,
        return_type: Box::new(TypeReference::required(
            in_modifier.clone(),
            TypeReference::by_ref(int()),
        )),
        parameters: vec![TypeReference::required(in_modifier, TypeReference::by_ref(int()))],
    });
    assert_eq!(
        resolver.render(&by_ref, &AnnotationScope::default()),
        "delegate* unmanaged[Stdcall]<in int, ref readonly int>"
    );
}

#[test]
fn test_by_reference_keywords() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);
    let by_ref = TypeReference::by_ref(int());

    for (kind, expected) in [
        (RefKind::Ref, "ref int"),
        (RefKind::RefReadonly, "ref readonly int"),
        (RefKind::In, "in int"),
        (RefKind::Out, "out int"),
    ] {
        assert_eq!(resolver.render_by_ref(&by_ref, &AnnotationScope::default(), kind), expected);
    }
    // The keyword only applies to by-reference types.
    assert_eq!(
        resolver.render_by_ref(&int(), &AnnotationScope::default(), RefKind::Out),
        "int"
    );
}

#[test]
fn test_arrays_and_pointers() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let jagged = TypeReference::Array(ArrayType {
        element: Box::new(TypeReference::array(int())),
        rank: 2,
    });
    assert_eq!(resolver.render_plain(&jagged), "int[,][]");
    assert_eq!(
        resolver.render_plain(&TypeReference::pointer(TypeReference::pointer(int()))),
        "int**"
    );
    assert_eq!(
        resolver.render_plain(&TypeReference::primitive(PrimitiveType::TypedReference)),
        "System.TypedReference"
    );
}

#[test]
fn test_nested_type_qualification() {
    let mut outer = TypeDeclaration::new("Demo", "Outer", TypeKind::Class);
    outer
        .nested_types
        .push(TypeDeclaration::new("", "Inner", TypeKind::Class));
    let mut boxed = TypeDeclaration::new("Demo", "Box", TypeKind::Class);
    boxed.generic_parameters.push(GenericParameter::new("T"));
    boxed
        .nested_types
        .push(TypeDeclaration::new("", "Item", TypeKind::Class));
    let module = module_with(vec![outer, boxed]);
    let options = RenderOptions::default();
    let root = RenderContext::new(&module, &options);
    let in_demo = root.in_namespace("Demo");

    let inner = TypeReference::Named(NamedType::new("", "Inner").nested_in(NamedType::new("Demo", "Outer")));
    let scope = AnnotationScope::default();
    assert_eq!(TypeNameResolver::new(&root).render(&inner, &scope), "Demo.Outer.Inner");
    assert_eq!(TypeNameResolver::new(&in_demo).render(&inner, &scope), "Outer.Inner");
    let in_outer = in_demo.enter(&module.types[0]);
    assert_eq!(TypeNameResolver::new(&in_outer).render(&inner, &scope), "Inner");

    let open_item = TypeReference::Named(
        NamedType::new("", "Item").nested_in(
            NamedType::new("Demo", "Box").with_arguments(vec![TypeReference::generic("T")]),
        ),
    );
    let closed_item = TypeReference::Named(
        NamedType::new("", "Item")
            .nested_in(NamedType::new("Demo", "Box").with_arguments(vec![int()])),
    );
    let in_box = in_demo.enter(&module.types[1]);
    assert_eq!(TypeNameResolver::new(&in_box).render(&open_item, &scope), "Item");
    assert_eq!(TypeNameResolver::new(&in_box).render(&closed_item, &scope), "Box<int>.Item");
    assert_eq!(
        TypeNameResolver::new(&root).render(&closed_item, &scope),
        "Demo.Box<int>.Item"
    );
}

#[test]
fn test_open_generic_and_unresolved_names() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    let open = NamedType {
        arity: 2,
        ..NamedType::new("System.Collections.Generic", "Dictionary")
    };
    assert_eq!(
        resolver.render_named(&open),
        "System.Collections.Generic.Dictionary<,>"
    );

    let missing = TypeReference::Named(NamedType {
        resolution: Resolution::Unresolved,
        ..NamedType::new("Other", "Thing")
    });
    assert_eq!(
        resolver.render(&missing, &AnnotationScope::default()),
        "Other.Thing /* unresolved */"
    );
    assert_eq!(resolver.render(&named("Demo", "Local"), &AnnotationScope::default()), "Local");
}

#[test]
fn test_system_value_types_use_keywords() {
    let module = module_with(vec![]);
    let options = RenderOptions::default();
    let ctx = RenderContext::new(&module, &options).in_namespace("Demo");
    let resolver = TypeNameResolver::new(&ctx);

    assert_eq!(
        resolver.render_plain(&TypeReference::value("System", "Int32")),
        "int"
    );
    assert_eq!(resolver.render_plain(&named("System", "String")), "string");
    assert_eq!(resolver.render_plain(&TypeReference::value("System", "Guid")), "System.Guid");
}
