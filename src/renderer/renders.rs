use crate::model::*;
use crate::renderer::components::*;
use crate::renderer::literals::{raw_enum_literal, LiteralFormatter};
use crate::renderer::traits::*;
use crate::renderer::type_names::{AnnotationScope, Nullability, RefKind, TypeNameResolver};

/// Operator method names and the token that follows `operator`.
const OPERATORS: &[(&str, &str)] = &[
    ("op_Addition", "+"),
    ("op_CheckedAddition", "checked +"),
    ("op_Subtraction", "-"),
    ("op_CheckedSubtraction", "checked -"),
    ("op_Multiply", "*"),
    ("op_CheckedMultiply", "checked *"),
    ("op_Division", "/"),
    ("op_CheckedDivision", "checked /"),
    ("op_Modulus", "%"),
    ("op_BitwiseAnd", "&"),
    ("op_BitwiseOr", "|"),
    ("op_ExclusiveOr", "^"),
    ("op_LeftShift", "<<"),
    ("op_RightShift", ">>"),
    ("op_UnsignedRightShift", ">>>"),
    ("op_Equality", "=="),
    ("op_Inequality", "!="),
    ("op_LessThan", "<"),
    ("op_GreaterThan", ">"),
    ("op_LessThanOrEqual", "<="),
    ("op_GreaterThanOrEqual", ">="),
    ("op_UnaryNegation", "-"),
    ("op_CheckedUnaryNegation", "checked -"),
    ("op_UnaryPlus", "+"),
    ("op_LogicalNot", "!"),
    ("op_OnesComplement", "~"),
    ("op_Increment", "++"),
    ("op_CheckedIncrement", "checked ++"),
    ("op_Decrement", "--"),
    ("op_CheckedDecrement", "checked --"),
    ("op_True", "true"),
    ("op_False", "false"),
    ("op_AdditionAssignment", "+="),
    ("op_CheckedAdditionAssignment", "checked +="),
    ("op_SubtractionAssignment", "-="),
    ("op_CheckedSubtractionAssignment", "checked -="),
    ("op_MultiplicationAssignment", "*="),
    ("op_CheckedMultiplicationAssignment", "checked *="),
    ("op_DivisionAssignment", "/="),
    ("op_CheckedDivisionAssignment", "checked /="),
    ("op_ModulusAssignment", "%="),
    ("op_BitwiseAndAssignment", "&="),
    ("op_BitwiseOrAssignment", "|="),
    ("op_ExclusiveOrAssignment", "^="),
    ("op_LeftShiftAssignment", "<<="),
    ("op_RightShiftAssignment", ">>="),
    ("op_UnsignedRightShiftAssignment", ">>>="),
];

/// Conversion operators; the return type follows the keyword.
const CONVERSIONS: &[(&str, &str)] = &[
    ("op_Implicit", "implicit operator"),
    ("op_Explicit", "explicit operator"),
    ("op_CheckedExplicit", "explicit operator checked"),
];

fn operator_token(method: &MethodDeclaration) -> Option<&'static str> {
    if !method.modifiers.contains(MethodModifiers::SPECIAL_NAME) {
        return None;
    }
    OPERATORS
        .iter()
        .find(|(name, _)| *name == method.name)
        .map(|(_, token)| *token)
}

fn conversion_keyword(method: &MethodDeclaration) -> Option<&'static str> {
    if !method.modifiers.contains(MethodModifiers::SPECIAL_NAME) {
        return None;
    }
    CONVERSIONS
        .iter()
        .find(|(name, _)| *name == method.name)
        .map(|(_, keyword)| *keyword)
}

fn is_finalizer(method: &MethodDeclaration) -> bool {
    method.name == "Finalize"
        && method.parameters.is_empty()
        && method.generic_parameters.is_empty()
        && method.return_type.is_void()
        && method.modifiers.contains(MethodModifiers::VIRTUAL)
        && !method.modifiers.contains(MethodModifiers::NEW_SLOT)
}

fn is_extension(method: &MethodDeclaration) -> bool {
    method.modifiers.contains(MethodModifiers::STATIC)
        && has_annotation(&method.annotations, EXTENSION_ATTRIBUTE)
}

fn is_implicit_base(ty: &TypeReference) -> bool {
    match ty.unmodified() {
        TypeReference::Primitive(PrimitiveType::Object) => true,
        TypeReference::Named(named) => {
            named.namespace == "System"
                && named.declaring_type.is_none()
                && matches!(
                    named.name.as_str(),
                    "Object" | "ValueType" | "Enum" | "MulticastDelegate" | "Delegate"
                )
        }
        _ => false,
    }
}

fn is_interface(ctx: &RenderContext<'_>) -> bool {
    ctx.current_type()
        .is_some_and(|t| t.kind == TypeKind::Interface)
}

/// Value of a `DecimalConstantAttribute(scale, sign, hi, mid, lo)` as
/// invariant decimal text.
fn decimal_constant(annotations: &[CustomAnnotation]) -> Option<String> {
    let annotation = find_annotation(annotations, DECIMAL_CONSTANT_ATTRIBUTE)?;
    let parts: Vec<i128> = annotation
        .positional
        .iter()
        .map(ConstantValue::as_integer)
        .collect::<Option<_>>()?;
    let [scale, sign, hi, mid, lo] = parts.as_slice() else {
        return None;
    };
    // The int overload stores the 32-bit words as signed values.
    let word = |v: i128| u128::from(v as u32);
    let mantissa = (word(*hi) << 64) | (word(*mid) << 32) | word(*lo);
    let digits = mantissa.to_string();
    let scale = usize::try_from(*scale).ok()?;
    let mut text = if scale > 0 {
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (whole, fraction) = padded.split_at(padded.len() - scale);
        format!("{}.{}", whole, fraction)
    } else {
        digits
    };
    if *sign != 0 {
        text.insert(0, '-');
    }
    Some(text)
}

/// Element type and length of a fixed-size buffer field.
fn fixed_buffer(annotations: &[CustomAnnotation]) -> Option<(&TypeReference, i128)> {
    let annotation = find_annotation(annotations, FIXED_BUFFER_ATTRIBUTE)?;
    match annotation.positional.as_slice() {
        [ConstantValue::Type(element), length] => Some((element, length.as_integer()?)),
        _ => None,
    }
}

fn direct_not_null(parameter: &GenericParameter) -> bool {
    find_annotation(&parameter.annotations, NULLABLE_ATTRIBUTE)
        .is_some_and(|a| matches!(a.positional.as_slice(), [ConstantValue::UInt8(1)]))
}

fn return_ref_kind(ty: &TypeReference, annotations: &[CustomAnnotation]) -> RefKind {
    if has_required_modifier(ty, IN_ATTRIBUTE_MODIFIER)
        || has_annotation(annotations, IS_READ_ONLY_ATTRIBUTE)
    {
        RefKind::RefReadonly
    } else {
        RefKind::Ref
    }
}

fn parameter_ref_kind(parameter: &Parameter) -> RefKind {
    let flags = parameter.flags;
    if flags.contains(ParameterFlags::OUT) && !flags.contains(ParameterFlags::IN) {
        RefKind::Out
    } else if has_annotation(&parameter.annotations, REQUIRES_LOCATION_ATTRIBUTE) {
        RefKind::RefReadonly
    } else if flags.contains(ParameterFlags::IN)
        || has_required_modifier(&parameter.ty, IN_ATTRIBUTE_MODIFIER)
        || has_annotation(&parameter.annotations, IS_READ_ONLY_ATTRIBUTE)
    {
        RefKind::In
    } else {
        RefKind::Ref
    }
}

/// Renders entities as C# declarations, four spaces per nesting level.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpRenderer;

impl CSharpRenderer {
    pub fn new() -> Self {
        Self
    }

    fn attribute_text(
        &self,
        prefix: &str,
        annotation: &CustomAnnotation,
        ctx: &RenderContext<'_>,
    ) -> String {
        let mut ty = annotation.annotation_type.clone();
        if let Some(short) = ty.name.strip_suffix("Attribute") {
            if !short.is_empty() {
                ty.name = short.to_string();
            }
        }
        let name = TypeNameResolver::new(ctx).render_named(&ty);

        let formatter = LiteralFormatter::new(ctx);
        let mut arguments: Vec<String> = annotation
            .positional
            .iter()
            .map(|v| formatter.format(v, None))
            .collect();
        arguments.extend(
            annotation
                .named
                .iter()
                .map(|n| format!("{} = {}", n.name, formatter.format(&n.value, None))),
        );

        if arguments.is_empty() {
            format!("[{}{}]", prefix, name)
        } else {
            format!("[{}{}({})]", prefix, name, arguments.join(", "))
        }
    }

    /// Retained annotations as attribute texts, ordered by full type name
    /// then text, with exact duplicates removed.
    pub fn attribute_texts(
        &self,
        prefix: &str,
        annotations: &[CustomAnnotation],
        ctx: &RenderContext<'_>,
    ) -> Vec<String> {
        let mut texts: Vec<(String, String)> = ctx
            .options
            .attribute_filter
            .retained(annotations)
            .into_iter()
            .map(|a| (a.full_name(), self.attribute_text(prefix, a, ctx)))
            .collect();
        texts.sort();
        texts.dedup();
        texts.into_iter().map(|(_, text)| text).collect()
    }

    fn attribute_lines(
        &self,
        prefix: &str,
        annotations: &[CustomAnnotation],
        ctx: &RenderContext<'_>,
    ) -> Vec<Line> {
        self.attribute_texts(prefix, annotations, ctx)
            .into_iter()
            .map(|text| ctx.line(text))
            .collect()
    }

    fn inline_attributes(&self, annotations: &[CustomAnnotation], ctx: &RenderContext<'_>) -> String {
        self.attribute_texts("", annotations, ctx)
            .into_iter()
            .map(|text| text + " ")
            .collect()
    }

    fn generic_parameter_list(
        &self,
        parameters: &[GenericParameter],
        ctx: &RenderContext<'_>,
    ) -> String {
        if parameters.is_empty() {
            return String::new();
        }
        let items: Vec<String> = parameters
            .iter()
            .map(|p| {
                let variance = match p.variance {
                    Variance::None => "",
                    Variance::Covariant => "out ",
                    Variance::Contravariant => "in ",
                };
                format!("{}{}{}", self.inline_attributes(&p.annotations, ctx), variance, p.name)
            })
            .collect();
        format!("<{}>", items.join(", "))
    }

    /// `where` clauses for the parameters that have any constraint.
    fn constraint_clauses(
        &self,
        parameters: &[GenericParameter],
        ctx: &RenderContext<'_>,
        scope: AnnotationScope<'_>,
    ) -> Vec<String> {
        let resolver = TypeNameResolver::new(ctx);
        let mut clauses = Vec::new();
        for parameter in parameters {
            let flags = parameter.flags;
            let value_type = flags.contains(ConstraintFlags::VALUE_TYPE);
            let own_scope = AnnotationScope {
                direct: Some(&parameter.annotations),
                ..scope
            };

            let mut class_type = None;
            let mut secondary = Vec::new();
            for constraint in &parameter.constraints {
                if value_type
                    && constraint
                        .ty
                        .as_named()
                        .is_some_and(|n| n.is("System", "ValueType"))
                {
                    continue;
                }
                let text = resolver.render(
                    &constraint.ty,
                    &AnnotationScope {
                        direct: Some(&constraint.annotations),
                        ..scope
                    },
                );
                let is_class = constraint
                    .ty
                    .as_named()
                    .and_then(|n| ctx.index.get(n))
                    .is_some_and(|d| d.kind == TypeKind::Class);
                if is_class && class_type.is_none() {
                    class_type = Some(text);
                } else {
                    secondary.push(text);
                }
            }
            secondary.sort();

            let mut items = Vec::new();
            if flags.contains(ConstraintFlags::REFERENCE_TYPE) {
                let nullable = resolver.declared_nullability(&own_scope) == Nullability::Nullable;
                items.push(if nullable { "class?" } else { "class" }.to_string());
            } else if value_type {
                let unmanaged = flags.contains(ConstraintFlags::UNMANAGED)
                    || has_annotation(&parameter.annotations, IS_UNMANAGED_ATTRIBUTE);
                items.push(if unmanaged { "unmanaged" } else { "struct" }.to_string());
            } else if class_type.is_none() && direct_not_null(parameter) {
                items.push("notnull".to_string());
            }
            items.extend(class_type);
            items.extend(secondary);
            if flags.contains(ConstraintFlags::DEFAULT_CONSTRUCTOR) && !value_type {
                items.push("new()".to_string());
            }
            if flags.contains(ConstraintFlags::ALLOWS_REF_STRUCT) {
                items.push("allows ref struct".to_string());
            }

            if !items.is_empty() {
                clauses.push(format!("where {} : {}", parameter.name, items.join(", ")));
            }
        }
        clauses
    }

    fn with_constraints(&self, mut text: String, clauses: Vec<String>) -> String {
        for clause in clauses {
            text.push(' ');
            text.push_str(&clause);
        }
        text
    }

    /// Parameter type as it appears in a signature, including the
    /// by-reference keyword.
    fn parameter_type(
        &self,
        parameter: &Parameter,
        ctx: &RenderContext<'_>,
        scope: AnnotationScope<'_>,
    ) -> String {
        let scope = AnnotationScope {
            direct: Some(&parameter.annotations),
            ..scope
        };
        TypeNameResolver::new(ctx).render_by_ref(&parameter.ty, &scope, parameter_ref_kind(parameter))
    }

    fn parameter(
        &self,
        parameter: &Parameter,
        this_parameter: bool,
        ctx: &RenderContext<'_>,
        scope: AnnotationScope<'_>,
    ) -> String {
        let mut text = self.inline_attributes(&parameter.annotations, ctx);
        if parameter.flags.contains(ParameterFlags::SCOPED)
            || has_annotation(&parameter.annotations, SCOPED_REF_ATTRIBUTE)
        {
            text.push_str("scoped ");
        }
        if this_parameter {
            text.push_str("this ");
        }
        if parameter.flags.contains(ParameterFlags::PARAMS)
            || has_annotation(&parameter.annotations, PARAM_ARRAY_ATTRIBUTE)
            || has_annotation(&parameter.annotations, PARAM_COLLECTION_ATTRIBUTE)
        {
            text.push_str("params ");
        }
        text.push_str(&self.parameter_type(parameter, ctx, scope));
        if !parameter.name.is_empty() {
            text.push(' ');
            text.push_str(&parameter.name);
        }

        match &parameter.default_value {
            Some(value) => {
                let declared = match parameter.ty.unmodified() {
                    TypeReference::ByReference(inner) => inner.as_ref(),
                    other => other,
                };
                text.push_str(" = ");
                text.push_str(&LiteralFormatter::new(ctx).format(value, Some(declared)));
            }
            None if parameter.flags.contains(ParameterFlags::OPTIONAL) => {
                text.push_str(" = default")
            }
            None => {}
        }
        text
    }

    fn parameter_list(
        &self,
        parameters: &[Parameter],
        extension: bool,
        ctx: &RenderContext<'_>,
        scope: AnnotationScope<'_>,
    ) -> String {
        parameters
            .iter()
            .enumerate()
            .map(|(i, p)| self.parameter(p, extension && i == 0, ctx, scope))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Modifier keywords implied by method flags.
    fn method_modifiers(&self, method: &MethodDeclaration, ctx: &RenderContext<'_>) -> Vec<&'static str> {
        let flags = method.modifiers;
        let mut words = Vec::new();
        if is_interface(ctx) {
            if flags.contains(MethodModifiers::STATIC) {
                words.push("static");
                if flags.contains(MethodModifiers::ABSTRACT) {
                    words.push("abstract");
                } else if flags.contains(MethodModifiers::VIRTUAL) {
                    words.push("virtual");
                }
            }
            return words;
        }

        if flags.contains(MethodModifiers::STATIC) {
            words.push("static");
        }
        if flags.contains(MethodModifiers::ABSTRACT) {
            words.push("abstract");
            if !flags.contains(MethodModifiers::NEW_SLOT) {
                words.push("override");
            }
        } else if flags.contains(MethodModifiers::VIRTUAL) {
            if !flags.contains(MethodModifiers::NEW_SLOT) {
                if flags.contains(MethodModifiers::FINAL) {
                    words.push("sealed");
                }
                words.push("override");
            } else if !flags.contains(MethodModifiers::FINAL) {
                words.push("virtual");
            }
        }
        if flags.contains(MethodModifiers::EXTERN) {
            words.push("extern");
        }
        let in_struct = ctx.current_type().is_some_and(|t| t.kind == TypeKind::Struct);
        if in_struct
            && !flags.contains(MethodModifiers::STATIC)
            && has_annotation(&method.annotations, IS_READ_ONLY_ATTRIBUTE)
        {
            words.push("readonly");
        }
        words
    }

    /// Accessibility keyword, omitted for public interface members.
    fn accessibility_word(&self, accessibility: Accessibility, ctx: &RenderContext<'_>) -> Option<String> {
        if is_interface(ctx) && accessibility == Accessibility::Public {
            None
        } else {
            Some(accessibility.to_string())
        }
    }

    fn method_scope<'s>(
        &self,
        method: &'s MethodDeclaration,
        ctx: &RenderContext<'s>,
    ) -> AnnotationScope<'s> {
        let scope = AnnotationScope::default().in_method(method);
        match ctx.current_type() {
            Some(decl) => scope.in_type(decl),
            None => scope,
        }
    }

    fn type_scope<'s>(&self, ctx: &RenderContext<'s>) -> AnnotationScope<'s> {
        match ctx.current_type() {
            Some(decl) => AnnotationScope::default().in_type(decl),
            None => AnnotationScope::default(),
        }
    }

    fn type_header(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> String {
        let resolver = TypeNameResolver::new(ctx);
        let modifiers = decl.modifiers;
        let mut words = vec![decl.accessibility.to_string()];
        match decl.kind {
            TypeKind::Class => {
                if modifiers.contains(TypeModifiers::STATIC)
                    || modifiers.contains(TypeModifiers::ABSTRACT | TypeModifiers::SEALED)
                {
                    words.push("static".to_string());
                } else if modifiers.contains(TypeModifiers::ABSTRACT) {
                    words.push("abstract".to_string());
                } else if modifiers.contains(TypeModifiers::SEALED) {
                    words.push("sealed".to_string());
                }
            }
            TypeKind::Struct => {
                if modifiers.contains(TypeModifiers::READONLY)
                    || has_annotation(&decl.annotations, IS_READ_ONLY_ATTRIBUTE)
                {
                    words.push("readonly".to_string());
                }
                if modifiers.contains(TypeModifiers::BY_REF_LIKE)
                    || has_annotation(&decl.annotations, IS_BY_REF_LIKE_ATTRIBUTE)
                {
                    words.push("ref".to_string());
                }
            }
            TypeKind::Interface | TypeKind::Enum | TypeKind::Delegate => {}
        }
        words.push(decl.kind.to_string());

        let header = format!(
            "{} {}{}",
            words.join(" "),
            decl.name,
            self.generic_parameter_list(&decl.generic_parameters, ctx)
        );

        let mut bases = Vec::new();
        let scope = AnnotationScope::default().in_type(decl);
        if decl.kind == TypeKind::Enum {
            let underlying = decl.underlying_type();
            if underlying != PrimitiveType::Int32 {
                bases.push(
                    underlying
                        .keyword()
                        .unwrap_or(underlying.system_name())
                        .to_string(),
                );
            }
        } else {
            if let Some(base) = decl.base_type.as_ref().filter(|b| !is_implicit_base(b)) {
                bases.push(resolver.render(
                    base,
                    &AnnotationScope {
                        direct: Some(&decl.annotations),
                        ..scope
                    },
                ));
            }
            let mut interfaces: Vec<String> = decl
                .interfaces
                .iter()
                .map(|i| {
                    resolver.render(
                        &i.interface,
                        &AnnotationScope {
                            direct: Some(&i.annotations),
                            ..scope
                        },
                    )
                })
                .collect();
            interfaces.sort();
            bases.extend(interfaces);
        }

        let header = if bases.is_empty() {
            header
        } else {
            format!("{} : {}", header, bases.join(", "))
        };
        let clauses = self.constraint_clauses(&decl.generic_parameters, ctx, scope);
        self.with_constraints(header, clauses)
    }

    /// One-line delegate declaration built from its `Invoke` method.
    fn delegate_declaration(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> String {
        let scope = AnnotationScope::default().in_type(decl);
        let generic = self.generic_parameter_list(&decl.generic_parameters, ctx);
        let clauses = self.constraint_clauses(&decl.generic_parameters, ctx, scope);
        let Some(invoke) = decl.methods.iter().find(|m| m.name == "Invoke") else {
            let text = format!(
                "{} delegate void {}{}() /* missing Invoke */;",
                decl.accessibility, decl.name, generic
            );
            return text;
        };
        let scope = scope.in_method(invoke);
        let resolver = TypeNameResolver::new(ctx);
        let return_type = resolver.render_by_ref(
            &invoke.return_type,
            &AnnotationScope {
                direct: Some(&invoke.return_annotations),
                ..scope
            },
            return_ref_kind(&invoke.return_type, &invoke.return_annotations),
        );
        let text = format!(
            "{} delegate {} {}{}({})",
            decl.accessibility,
            return_type,
            decl.name,
            generic,
            self.parameter_list(&invoke.parameters, false, ctx, scope)
        );
        self.with_constraints(text, clauses) + ";"
    }

    fn field(&self, field: &FieldDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = self.attribute_lines("", &field.annotations, ctx);

        if ctx.current_type().is_some_and(|t| t.kind == TypeKind::Enum) {
            let value = field
                .constant
                .as_ref()
                .and_then(ConstantValue::as_integer)
                .map(|v| raw_enum_literal(v, ctx.options.enum_literals));
            lines.push(match value {
                Some(value) => ctx.line(format!("{} = {},", field.name, value)),
                None => ctx.line(format!("{},", field.name)),
            });
            return lines;
        }

        let scope = AnnotationScope {
            direct: Some(&field.annotations),
            ..self.type_scope(ctx)
        };
        let resolver = TypeNameResolver::new(ctx);
        let formatter = LiteralFormatter::new(ctx);
        let mut words = vec![field.accessibility.to_string()];
        let flags = field.modifiers;

        if let Some((element, length)) = fixed_buffer(&field.annotations) {
            words.push("fixed".to_string());
            words.push(resolver.render_plain(element));
            lines.push(ctx.line(format!("{} {}[{}];", words.join(" "), field.name, length)));
            return lines;
        }

        let ty = resolver.render(&field.ty, &scope);
        if let Some(decimal) = decimal_constant(&field.annotations) {
            words.push("const".to_string());
            let value = formatter.format(&ConstantValue::Decimal(decimal), None);
            lines.push(ctx.line(format!("{} {} {} = {};", words.join(" "), ty, field.name, value)));
            return lines;
        }

        if flags.contains(FieldModifiers::LITERAL) {
            words.push("const".to_string());
        } else {
            if flags.contains(FieldModifiers::STATIC) {
                words.push("static".to_string());
            }
            if flags.contains(FieldModifiers::INIT_ONLY) {
                words.push("readonly".to_string());
            }
            if has_required_modifier(&field.ty, IS_VOLATILE_MODIFIER) {
                words.push("volatile".to_string());
            }
            if has_annotation(&field.annotations, REQUIRED_MEMBER_ATTRIBUTE) {
                words.push("required".to_string());
            }
        }
        words.push(ty);
        words.push(field.name.clone());
        let mut text = words.join(" ");
        if let Some(constant) = field.constant.as_ref().filter(|_| flags.contains(FieldModifiers::LITERAL)) {
            text.push_str(" = ");
            text.push_str(&formatter.format(constant, Some(&field.ty)));
        }
        text.push(';');
        lines.push(ctx.line(text));
        lines
    }

    fn accessor(
        &self,
        accessor: &MethodDeclaration,
        keyword: &str,
        owner: Accessibility,
        ctx: &RenderContext<'_>,
    ) -> String {
        let mut text = self.inline_attributes(&accessor.annotations, ctx);
        if accessor.accessibility != owner && !is_interface(ctx) {
            text.push_str(&accessor.accessibility.to_string());
            text.push(' ');
        }
        text.push_str(keyword);
        text.push(';');
        text
    }

    fn property(&self, property: &PropertyDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = self.attribute_lines("", &property.annotations, ctx);
        let accessibility = Member::Property(property).accessibility();
        let primary = property
            .accessors()
            .find(|a| a.accessibility == accessibility);

        let mut words: Vec<String> = self.accessibility_word(accessibility, ctx).into_iter().collect();
        if let Some(primary) = primary {
            words.extend(self.method_modifiers(primary, ctx).into_iter().map(str::to_string));
        }
        if has_annotation(&property.annotations, REQUIRED_MEMBER_ATTRIBUTE) {
            words.push("required".to_string());
        }

        let scope = AnnotationScope {
            direct: Some(&property.annotations),
            ..self.type_scope(ctx)
        };
        let kind = return_ref_kind(&property.ty, &[]);
        words.push(TypeNameResolver::new(ctx).render_by_ref(&property.ty, &scope, kind));

        if property.parameters.is_empty() {
            words.push(property.name.clone());
        } else {
            let parameter_scope = self.indexer_scope(property, ctx);
            words.push(format!(
                "this[{}]",
                self.parameter_list(&property.parameters, false, ctx, parameter_scope)
            ));
        }

        let include_internals = ctx.options.include_internals;
        let mut accessors = Vec::new();
        if let Some(getter) = property
            .getter
            .as_ref()
            .filter(|g| g.accessibility.is_visible(include_internals))
        {
            accessors.push(self.accessor(getter, "get", accessibility, ctx));
        }
        if let Some(setter) = property
            .setter
            .as_ref()
            .filter(|s| s.accessibility.is_visible(include_internals))
        {
            let keyword = if has_required_modifier(&setter.return_type, IS_EXTERNAL_INIT_MODIFIER) {
                "init"
            } else {
                "set"
            };
            accessors.push(self.accessor(setter, keyword, accessibility, ctx));
        }

        lines.push(ctx.line(format!("{} {{ {} }}", words.join(" "), accessors.join(" "))));
        lines
    }

    fn event(&self, event: &EventDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = self.attribute_lines("", &event.annotations, ctx);
        let accessibility = Member::Event(event).accessibility();
        let mut words: Vec<String> = self.accessibility_word(accessibility, ctx).into_iter().collect();
        if let Some(adder) = event.accessors().find(|a| a.accessibility == accessibility) {
            words.extend(self.method_modifiers(adder, ctx).into_iter().map(str::to_string));
        }
        let scope = AnnotationScope {
            direct: Some(&event.annotations),
            ..self.type_scope(ctx)
        };
        words.push("event".to_string());
        words.push(TypeNameResolver::new(ctx).render(&event.ty, &scope));
        words.push(event.name.clone());
        lines.push(ctx.line(format!("{};", words.join(" "))));
        lines
    }

    fn method(&self, method: &MethodDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = self.attribute_lines("", &method.annotations, ctx);
        lines.extend(self.attribute_lines("return: ", &method.return_annotations, ctx));
        let type_name = ctx.current_type().map(|t| t.name.as_str()).unwrap_or_default();

        if is_finalizer(method) {
            lines.push(ctx.line(format!("~{}() {{ }}", type_name)));
            return lines;
        }

        let scope = self.method_scope(method, ctx);
        let return_type = || self.return_type(method, ctx, scope);
        let parameters = self.parameter_list(&method.parameters, is_extension(method), ctx, scope);

        let signature = if method.is_constructor() {
            format!("{}({})", type_name, parameters)
        } else if let Some(keyword) = conversion_keyword(method) {
            format!("{} {}({})", keyword, return_type(), parameters)
        } else if let Some(token) = operator_token(method) {
            format!("{} operator {}({})", return_type(), token, parameters)
        } else {
            format!(
                "{} {}{}({})",
                return_type(),
                method.name,
                self.generic_parameter_list(&method.generic_parameters, ctx),
                parameters
            )
        };

        let mut words: Vec<String> = self.accessibility_word(method.accessibility, ctx).into_iter().collect();
        if !method.is_constructor() {
            words.extend(self.method_modifiers(method, ctx).into_iter().map(str::to_string));
        }
        words.push(signature);
        let clauses = self.constraint_clauses(&method.generic_parameters, ctx, scope);
        let text = self.with_constraints(words.join(" "), clauses);

        let bodiless = method
            .modifiers
            .intersects(MethodModifiers::ABSTRACT | MethodModifiers::EXTERN);
        lines.push(ctx.line(if bodiless { text + ";" } else { text + " { }" }));
        lines
    }

    fn return_type(
        &self,
        method: &MethodDeclaration,
        ctx: &RenderContext<'_>,
        scope: AnnotationScope<'_>,
    ) -> String {
        TypeNameResolver::new(ctx).render_by_ref(
            &method.return_type,
            &AnnotationScope {
                direct: Some(&method.return_annotations),
                ..scope
            },
            return_ref_kind(&method.return_type, &method.return_annotations),
        )
    }

    /// Parameter scope of an indexer: its primary accessor, else the type.
    fn indexer_scope<'s>(
        &self,
        property: &'s PropertyDeclaration,
        ctx: &RenderContext<'s>,
    ) -> AnnotationScope<'s> {
        let accessibility = Member::Property(property).accessibility();
        match property.accessors().find(|a| a.accessibility == accessibility) {
            Some(method) => self.method_scope(method, ctx),
            None => self.type_scope(ctx),
        }
    }

    fn display_name(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> String {
        match member {
            Member::Method(m) if m.is_constructor() => ctx
                .current_type()
                .map(|t| t.name.clone())
                .unwrap_or_else(|| m.name.clone()),
            Member::Method(m) if is_finalizer(m) => format!(
                "~{}",
                ctx.current_type().map(|t| t.name.as_str()).unwrap_or_default()
            ),
            Member::Method(m) => match (conversion_keyword(m), operator_token(m)) {
                // Conversions overload on their target type.
                (Some(keyword), _) => format!(
                    "{} {}",
                    keyword,
                    self.return_type(m, ctx, self.method_scope(m, ctx))
                ),
                (None, Some(token)) => format!("operator {}", token),
                (None, None) => m.name.clone(),
            },
            Member::Property(p) if !p.parameters.is_empty() => "this[]".to_string(),
            other => other.name().to_string(),
        }
    }
}

impl EntityRenderer for CSharpRenderer {
    fn module_header(&self, ctx: &RenderContext<'_>) -> Vec<Line> {
        self.attribute_lines("assembly: ", &ctx.module.annotations, ctx)
    }

    fn forwarded_types(
        &self,
        origin: &str,
        types: &[&NamedType],
        ctx: &RenderContext<'_>,
    ) -> Vec<Line> {
        let resolver = TypeNameResolver::new(ctx);
        let mut lines = vec![ctx.line(format!("// Forwarded to {}", origin))];
        lines.extend(types.iter().map(|ty| {
            ctx.line(format!(
                "[assembly: System.Runtime.CompilerServices.TypeForwardedTo(typeof({}))]",
                resolver.render_named(ty)
            ))
        }));
        lines
    }

    fn namespace_open(&self, namespace: &str, ctx: &RenderContext<'_>) -> Vec<Line> {
        if namespace.is_empty() {
            return Vec::new();
        }
        vec![ctx.line(format!("namespace {}", namespace)), ctx.line("{")]
    }

    fn namespace_close(&self, namespace: &str, ctx: &RenderContext<'_>) -> Vec<Line> {
        if namespace.is_empty() {
            return Vec::new();
        }
        vec![ctx.line("}")]
    }

    fn type_open(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = self.attribute_lines("", &decl.annotations, ctx);
        if decl.kind == TypeKind::Delegate {
            lines.push(ctx.line(self.delegate_declaration(decl, ctx)));
            return lines;
        }
        lines.push(ctx.line(self.type_header(decl, ctx)));
        lines.push(ctx.line("{"));
        lines
    }

    fn type_close(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        if decl.kind == TypeKind::Delegate {
            return Vec::new();
        }
        vec![ctx.line("}")]
    }

    fn member_signature(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> MemberSignature {
        let (generic_parameters, parameter_types) = match member {
            Member::Method(m) => {
                let scope = self.method_scope(m, ctx);
                (
                    m.generic_parameters.iter().map(|g| g.name.clone()).collect(),
                    m.parameters
                        .iter()
                        .map(|p| self.parameter_type(p, ctx, scope))
                        .collect(),
                )
            }
            Member::Property(p) => {
                let scope = self.indexer_scope(p, ctx);
                (
                    Vec::new(),
                    p.parameters
                        .iter()
                        .map(|param| self.parameter_type(param, ctx, scope))
                        .collect(),
                )
            }
            Member::Field(_) | Member::Event(_) => (Vec::new(), Vec::new()),
        };
        MemberSignature {
            kind: member.kind(),
            name: self.display_name(member, ctx),
            generic_parameters,
            parameter_types,
        }
    }

    fn member(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> Vec<Line> {
        match member {
            Member::Field(f) => self.field(f, ctx),
            Member::Property(p) => self.property(p, ctx),
            Member::Event(e) => self.event(e, ctx),
            Member::Method(m) => self.method(m, ctx),
        }
    }
}
