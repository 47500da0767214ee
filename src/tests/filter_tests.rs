use super::*;

fn annotation(namespace: &str, name: &str) -> CustomAnnotation {
    CustomAnnotation::new(namespace, name, Vec::new())
}

fn retained_names(filter: &AttributeFilter, annotations: &[CustomAnnotation]) -> Vec<String> {
    filter
        .retained(annotations)
        .into_iter()
        .map(CustomAnnotation::full_name)
        .collect()
}

fn sample() -> Vec<CustomAnnotation> {
    vec![
        annotation("Demo", "FooAttribute"),
        annotation("System", "SerializableAttribute"),
        annotation("Demo", "FoolishAttribute"),
        annotation("System.Diagnostics", "DebuggerDisplayAttribute"),
    ]
}

#[test]
fn test_default_filter_keeps_everything_sorted() {
    let filter = AttributeFilter::new();
    assert_eq!(
        retained_names(&filter, &sample()),
        vec![
            "Demo.FooAttribute",
            "Demo.FoolishAttribute",
            "System.Diagnostics.DebuggerDisplayAttribute",
            "System.SerializableAttribute",
        ]
    );
}

#[test]
fn test_include_patterns_are_idempotent() {
    let mut once = AttributeFilter::new();
    once.include(["Demo.Foo*"]).unwrap();
    let mut twice = AttributeFilter::new();
    twice.include(["Demo.Foo*"]).unwrap();
    twice.include(["Demo.Foo*"]).unwrap();

    let expected = vec!["Demo.FooAttribute", "Demo.FoolishAttribute"];
    assert_eq!(retained_names(&once, &sample()), expected);
    assert_eq!(retained_names(&twice, &sample()), expected);
}

#[test]
fn test_exclude_wins_over_include() {
    let mut filter = AttributeFilter::new();
    filter.include(["Demo.*"]).unwrap();
    filter.exclude(["*Foolish*"]).unwrap();
    assert_eq!(retained_names(&filter, &sample()), vec!["Demo.FooAttribute"]);
}

#[test]
fn test_wildcards_span_namespace_dots() {
    let mut filter = AttributeFilter::new();
    filter.exclude(["System.*"]).unwrap();
    assert_eq!(
        retained_names(&filter, &sample()),
        vec!["Demo.FooAttribute", "Demo.FoolishAttribute"]
    );
}

#[test]
fn test_patterns_match_arity_suffixed_names() {
    let generic = CustomAnnotation {
        annotation_type: NamedType::new("Demo", "TagAttribute")
            .with_arguments(vec![int()]),
        positional: Vec::new(),
        named: Vec::new(),
    };
    let mut filter = AttributeFilter::new();
    filter.include(["Demo.TagAttribute`?"]).unwrap();
    assert!(filter.retain(&generic));
    assert!(!filter.retain(&annotation("Demo", "TagAttribute")));
}

#[test]
fn test_syntax_absorbed_annotations_stay_hidden() {
    let mut filter = AttributeFilter::new();
    filter.include(["*"]).unwrap();
    for absorbed in [
        nullable_byte(1),
        nullable_context(2),
        compiler_attribute("ExtensionAttribute", vec![]),
        compiler_attribute("IsReadOnlyAttribute", vec![]),
        compiler_attribute("CompilerGeneratedAttribute", vec![]),
        annotation("System", "ParamArrayAttribute"),
    ] {
        assert!(!filter.retain(&absorbed), "{} was kept", absorbed.full_name());
    }
}

#[test]
fn test_compiler_obsolete_messages_are_absorbed() {
    let compiler = CustomAnnotation::new(
        "System",
        "ObsoleteAttribute",
        vec![
            ConstantValue::String(
                "Types with embedded references are not supported in this version of your compiler."
                    .to_string(),
            ),
            ConstantValue::Boolean(true),
        ],
    );
    let user = CustomAnnotation::new(
        "System",
        "ObsoleteAttribute",
        vec![ConstantValue::String("Use Widget2".to_string())],
    );
    let filter = AttributeFilter::new();
    assert!(!filter.retain(&compiler));
    assert!(filter.retain(&user));
    assert!(filter.retain(&annotation("System", "ObsoleteAttribute")));
}

#[test]
fn test_invalid_pattern_is_an_error() {
    let mut filter = AttributeFilter::new();
    let error = filter.include(["Demo.[Foo"]).unwrap_err();
    assert!(error.to_string().contains("Demo.[Foo"), "{}", error);
}

#[test]
fn test_clearing_patterns() {
    let mut filter = AttributeFilter::new();
    filter.include(["Demo.*"]).unwrap();
    filter.exclude(["Demo.Foo*"]).unwrap();
    assert!(retained_names(&filter, &sample()).is_empty());

    filter.clear_exclude();
    assert_eq!(retained_names(&filter, &sample()).len(), 2);
    filter.clear_include();
    assert_eq!(retained_names(&filter, &sample()).len(), 4);
}

#[test]
fn test_writer_configuration_reaches_the_filter() {
    let mut decl = TypeDeclaration::new("Demo", "Widget", TypeKind::Class);
    decl.annotations = sample();
    let module = module_with(vec![decl]);

    let mut writer = ApiWriter::new(CSharpRenderer::new());
    writer.exclude_attributes(["System.*", "*Foolish*"]).unwrap();
    let output = writer.render_to_string(&module);
    assert!(output.contains("    [Foo]\n"), "{}", output);
    assert!(!output.contains("Serializable"));
    assert!(!output.contains("Foolish"));

    writer.clear_excluded_attributes();
    let output = writer.render_to_string(&module);
    assert!(output.contains("[System.Serializable]"), "{}", output);
    assert!(writer.include_attributes(["["]).is_err());
}
