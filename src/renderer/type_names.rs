//! Type-name resolution.
//!
//! A type reference only carries its structural shape. Nullability, the
//! `dynamic`/`object` distinction, `nint`/`nuint` and tuple element names
//! are recorded by the compiler as positional arrays on the enclosing
//! declaration (the parameter, return value, field, ...). Each array is
//! indexed by a counter that advances in a fixed depth-first walk of the
//! type, so one top-level render threads a [`SlotCounters`] value through
//! every recursive call and never resets it between siblings.
//!
//! Consumption rules:
//! - every node except `void` takes one dynamic slot;
//! - reference types, unconstrained generic parameters and generic value
//!   types take one nullable slot;
//! - `IntPtr`/`UIntPtr` take one native-integer slot;
//! - custom modifiers and the outer by-reference marker take nothing, and
//!   the `Nullable<T>` wrapper takes no nullable slot;
//! - tuples take names for all their flattened elements at once.

use tracing::trace;

use crate::model::*;
use crate::renderer::components::*;
use crate::renderer::traits::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    Oblivious,
    NotNullable,
    Nullable,
}

impl Nullability {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Nullability::NotNullable,
            2 => Nullability::Nullable,
            _ => Nullability::Oblivious,
        }
    }
}

/// The three places side-channel annotations are looked up: the
/// declaration owning the type occurrence, then the innermost method, then
/// the innermost type (and its enclosing types).
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationScope<'s> {
    pub direct: Option<&'s [CustomAnnotation]>,
    pub method: Option<&'s MethodDeclaration>,
    pub declaring_type: Option<&'s TypeDeclaration>,
}

impl<'s> AnnotationScope<'s> {
    pub fn direct(annotations: &'s [CustomAnnotation]) -> Self {
        Self {
            direct: Some(annotations),
            ..Self::default()
        }
    }

    pub fn in_method(self, method: &'s MethodDeclaration) -> Self {
        Self {
            method: Some(method),
            ..self
        }
    }

    pub fn in_type(self, declaring_type: &'s TypeDeclaration) -> Self {
        Self {
            declaring_type: Some(declaring_type),
            ..self
        }
    }
}

/// Keyword for an outermost by-reference type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Ref,
    RefReadonly,
    In,
    Out,
}

impl RefKind {
    pub fn keyword(self) -> &'static str {
        match self {
            RefKind::Ref => "ref",
            RefKind::RefReadonly => "ref readonly",
            RefKind::In => "in",
            RefKind::Out => "out",
        }
    }
}

/// How far each positional array has been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounters {
    pub dynamic: usize,
    pub nullable: usize,
    pub native_integer: usize,
    pub tuple_name: usize,
}

#[derive(Debug)]
enum NullableFlags {
    Uniform(Nullability),
    PerSlot(Vec<Nullability>),
}

#[derive(Debug)]
enum BoolFlags {
    Uniform(bool),
    PerSlot(Vec<bool>),
}

impl BoolFlags {
    fn at(&self, slot: usize) -> bool {
        match self {
            BoolFlags::Uniform(value) => *value,
            BoolFlags::PerSlot(values) => values.get(slot).copied().unwrap_or(false),
        }
    }
}

/// Side-channel arrays fetched once per top-level render.
#[derive(Debug)]
struct Transforms {
    nullable: NullableFlags,
    dynamic: BoolFlags,
    native_integer: BoolFlags,
    tuple_names: Vec<Option<String>>,
}

impl Transforms {
    fn none() -> Self {
        Self {
            nullable: NullableFlags::Uniform(Nullability::Oblivious),
            dynamic: BoolFlags::Uniform(false),
            native_integer: BoolFlags::Uniform(false),
            tuple_names: Vec::new(),
        }
    }

    fn collect(scope: &AnnotationScope<'_>, ctx: &RenderContext<'_>) -> Self {
        let direct = scope.direct.unwrap_or(&[]);
        let nullable = match find_annotation(direct, NULLABLE_ATTRIBUTE) {
            Some(annotation) => parse_nullable(annotation),
            None => NullableFlags::Uniform(inherited_nullability(scope, ctx)),
        };
        let dynamic = match find_annotation(direct, DYNAMIC_ATTRIBUTE) {
            // Without arguments only the outermost type is dynamic.
            Some(annotation) if annotation.positional.is_empty() => BoolFlags::PerSlot(vec![true]),
            Some(annotation) => parse_bool_flags(annotation),
            None => BoolFlags::Uniform(false),
        };
        let native_integer = match find_annotation(direct, NATIVE_INTEGER_ATTRIBUTE) {
            Some(annotation) if annotation.positional.is_empty() => BoolFlags::Uniform(true),
            Some(annotation) => parse_bool_flags(annotation),
            None => BoolFlags::Uniform(false),
        };
        let tuple_names = find_annotation(direct, TUPLE_ELEMENT_NAMES_ATTRIBUTE)
            .map(parse_tuple_names)
            .unwrap_or_default();
        Self {
            nullable,
            dynamic,
            native_integer,
            tuple_names,
        }
    }
}

fn parse_nullable(annotation: &CustomAnnotation) -> NullableFlags {
    match annotation.positional.as_slice() {
        [ConstantValue::UInt8(byte)] => NullableFlags::Uniform(Nullability::from_byte(*byte)),
        [ConstantValue::Array(ArrayValue {
            elements: Some(elements),
            ..
        })] => {
            let bytes: Option<Vec<Nullability>> = elements
                .iter()
                .map(|e| match e {
                    ConstantValue::UInt8(byte) => Some(Nullability::from_byte(*byte)),
                    _ => None,
                })
                .collect();
            bytes
                .map(NullableFlags::PerSlot)
                .unwrap_or(NullableFlags::Uniform(Nullability::Oblivious))
        }
        _ => NullableFlags::Uniform(Nullability::Oblivious),
    }
}

fn parse_bool_flags(annotation: &CustomAnnotation) -> BoolFlags {
    match annotation.positional.as_slice() {
        [ConstantValue::Array(ArrayValue {
            elements: Some(elements),
            ..
        })] => {
            let flags: Option<Vec<bool>> = elements
                .iter()
                .map(|e| match e {
                    ConstantValue::Boolean(flag) => Some(*flag),
                    _ => None,
                })
                .collect();
            flags.map(BoolFlags::PerSlot).unwrap_or(BoolFlags::Uniform(false))
        }
        _ => BoolFlags::Uniform(false),
    }
}

fn parse_tuple_names(annotation: &CustomAnnotation) -> Vec<Option<String>> {
    match annotation.positional.as_slice() {
        [ConstantValue::Array(ArrayValue {
            elements: Some(elements),
            ..
        })] => {
            let names: Option<Vec<Option<String>>> = elements
                .iter()
                .map(|e| match e {
                    ConstantValue::String(name) => Some(Some(name.clone())),
                    ConstantValue::Null => Some(None),
                    _ => None,
                })
                .collect();
            names.unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

fn context_byte(annotations: &[CustomAnnotation]) -> Option<Nullability> {
    let annotation = find_annotation(annotations, NULLABLE_CONTEXT_ATTRIBUTE)?;
    Some(match annotation.positional.as_slice() {
        [ConstantValue::UInt8(byte)] => Nullability::from_byte(*byte),
        _ => Nullability::Oblivious,
    })
}

/// Nullable context default: the method first, then the declaring type and
/// the types enclosing it, nearest first.
fn inherited_nullability(scope: &AnnotationScope<'_>, ctx: &RenderContext<'_>) -> Nullability {
    if let Some(found) = scope.method.and_then(|m| context_byte(&m.annotations)) {
        return found;
    }
    if let Some(found) = scope.declaring_type.and_then(|t| context_byte(&t.annotations)) {
        return found;
    }
    ctx.enclosing
        .iter()
        .rev()
        .filter(|t| !scope.declaring_type.is_some_and(|d| std::ptr::eq(d, **t)))
        .find_map(|t| context_byte(&t.annotations))
        .unwrap_or(Nullability::Oblivious)
}

/// State of one top-level resolution.
struct SlotWalk {
    transforms: Transforms,
    slots: SlotCounters,
}

impl SlotWalk {
    fn new(transforms: Transforms) -> Self {
        Self {
            transforms,
            slots: SlotCounters::default(),
        }
    }

    fn next_dynamic(&mut self) -> bool {
        let value = self.transforms.dynamic.at(self.slots.dynamic);
        self.slots.dynamic += 1;
        value
    }

    fn next_nullable(&mut self) -> Nullability {
        let slot = self.slots.nullable;
        self.slots.nullable += 1;
        match &self.transforms.nullable {
            NullableFlags::Uniform(value) => *value,
            NullableFlags::PerSlot(values) => {
                values.get(slot).copied().unwrap_or(Nullability::Oblivious)
            }
        }
    }

    fn next_native_integer(&mut self) -> bool {
        let value = self.transforms.native_integer.at(self.slots.native_integer);
        self.slots.native_integer += 1;
        value
    }

    fn next_tuple_names(&mut self, count: usize) -> Vec<Option<String>> {
        let start = self.slots.tuple_name;
        self.slots.tuple_name += count;
        (start..start + count)
            .map(|i| self.transforms.tuple_names.get(i).cloned().flatten())
            .collect()
    }
}

fn with_marker(mut text: String, nullability: Nullability) -> String {
    if nullability == Nullability::Nullable {
        text.push('?');
    }
    text
}

fn is_tuple(named: &NamedType) -> bool {
    let count = named.generic_arguments.len();
    named.is("System", "ValueTuple")
        && named.value_type
        && (2..=8).contains(&count)
        && (count < 8 || is_tuple_rest(&named.generic_arguments[7]))
}

fn is_tuple_rest(argument: &TypeReference) -> bool {
    let Some(rest) = argument.as_named() else {
        return false;
    };
    let count = rest.generic_arguments.len();
    rest.is("System", "ValueTuple")
        && rest.value_type
        && (1..=8).contains(&count)
        && (count < 8 || is_tuple_rest(&rest.generic_arguments[7]))
}

fn flattened_len(named: &NamedType) -> usize {
    match named.generic_arguments.get(7).and_then(TypeReference::as_named) {
        Some(rest) => 7 + flattened_len(rest),
        None => named.generic_arguments.len(),
    }
}

/// Splits `CallConv*` optional modifiers off a function pointer's return
/// type, yielding the convention names and the remaining type.
fn split_calling_conventions(ty: &TypeReference) -> (Vec<String>, &TypeReference) {
    let mut conventions = Vec::new();
    let mut current = ty;
    while let TypeReference::OptionalModifier(m) = current {
        let is_convention = m.modifier.namespace == "System.Runtime.CompilerServices"
            && m.modifier.name.starts_with("CallConv");
        if !is_convention {
            break;
        }
        conventions.push(m.modifier.name["CallConv".len()..].to_string());
        current = &m.inner;
    }
    (conventions, current)
}

/// Renders type references as source text.
pub struct TypeNameResolver<'c, 'a> {
    ctx: &'c RenderContext<'a>,
}

impl<'c, 'a> TypeNameResolver<'c, 'a> {
    pub fn new(ctx: &'c RenderContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn render(&self, ty: &TypeReference, scope: &AnnotationScope<'_>) -> String {
        self.render_by_ref(ty, scope, RefKind::Ref)
    }

    /// Renders `ty`, spelling an outermost by-reference marker with `kind`.
    pub fn render_by_ref(
        &self,
        ty: &TypeReference,
        scope: &AnnotationScope<'_>,
        kind: RefKind,
    ) -> String {
        self.render_with_slots(ty, scope, kind).0
    }

    /// Like [`Self::render_by_ref`], also reporting how many slots of each
    /// positional array were consumed.
    pub fn render_with_slots(
        &self,
        ty: &TypeReference,
        scope: &AnnotationScope<'_>,
        kind: RefKind,
    ) -> (String, SlotCounters) {
        let mut walk = SlotWalk::new(Transforms::collect(scope, self.ctx));
        let text = match ty.unmodified() {
            TypeReference::ByReference(inner) => {
                format!("{} {}", kind.keyword(), self.write(inner, &mut walk))
            }
            other => self.write(other, &mut walk),
        };
        trace!(text = %text, slots = ?walk.slots, "resolved type name");
        (text, walk.slots)
    }

    /// Renders a named type with no side-channel annotations, as needed for
    /// attribute names and `typeof` operands.
    pub fn render_named(&self, named: &NamedType) -> String {
        let mut walk = SlotWalk::new(Transforms::none());
        self.named(named, &mut walk)
    }

    pub fn render_plain(&self, ty: &TypeReference) -> String {
        let mut walk = SlotWalk::new(Transforms::none());
        self.write(ty, &mut walk)
    }

    /// Nullability the scope declares for its first slot; used for
    /// constraint clauses that are not type occurrences.
    pub fn declared_nullability(&self, scope: &AnnotationScope<'_>) -> Nullability {
        SlotWalk::new(Transforms::collect(scope, self.ctx)).next_nullable()
    }

    fn write(&self, ty: &TypeReference, res: &mut SlotWalk) -> String {
        match ty {
            TypeReference::OptionalModifier(m) | TypeReference::RequiredModifier(m) => {
                self.write(&m.inner, res)
            }
            // A by-reference marker below the top level is not valid
            // metadata; keep the text readable anyway.
            TypeReference::ByReference(inner) => format!("ref {}", self.write(inner, res)),
            TypeReference::Primitive(primitive) => self.primitive(*primitive, res),
            TypeReference::GenericParameter(parameter) => {
                res.next_dynamic();
                if parameter.value_type {
                    parameter.name.clone()
                } else {
                    with_marker(parameter.name.clone(), res.next_nullable())
                }
            }
            TypeReference::Array(_) => self.array(ty, res),
            TypeReference::Pointer(inner) => {
                res.next_dynamic();
                format!("{}*", self.write(inner, res))
            }
            TypeReference::FunctionPointer(pointer) => self.function_pointer(pointer, res),
            TypeReference::Named(named) => self.named(named, res),
        }
    }

    fn system_name(&self, name: &str) -> String {
        if self.ctx.namespace == "System" {
            name.to_string()
        } else {
            format!("System.{}", name)
        }
    }

    fn primitive(&self, primitive: PrimitiveType, res: &mut SlotWalk) -> String {
        if primitive == PrimitiveType::Void {
            return "void".to_string();
        }
        let dynamic = res.next_dynamic();
        let nullability = if primitive.is_reference_type() {
            res.next_nullable()
        } else {
            Nullability::Oblivious
        };
        let text = match primitive {
            PrimitiveType::Object if dynamic => "dynamic".to_string(),
            PrimitiveType::IntPtr | PrimitiveType::UIntPtr => {
                let native = res.next_native_integer();
                if native || self.ctx.module.supports_native_integers {
                    let keyword = if primitive == PrimitiveType::IntPtr { "nint" } else { "nuint" };
                    keyword.to_string()
                } else {
                    self.system_name(primitive.system_name())
                }
            }
            _ => primitive
                .keyword()
                .map(str::to_string)
                .unwrap_or_else(|| self.system_name(primitive.system_name())),
        };
        with_marker(text, nullability)
    }

    fn array(&self, ty: &TypeReference, res: &mut SlotWalk) -> String {
        // Outer ranks are written first, so `int[][,]` is a vector of
        // two-dimensional arrays; slots still go outer to inner.
        let mut suffix = String::new();
        let mut current = ty;
        while let TypeReference::Array(array) = current.unmodified() {
            res.next_dynamic();
            let nullability = res.next_nullable();
            suffix.push('[');
            suffix.push_str(&",".repeat(array.rank.saturating_sub(1) as usize));
            suffix.push(']');
            if nullability == Nullability::Nullable {
                suffix.push('?');
            }
            current = &array.element;
        }
        format!("{}{}", self.write(current, res), suffix)
    }

    fn function_pointer(&self, pointer: &FunctionPointerType, res: &mut SlotWalk) -> String {
        res.next_dynamic();
        let (conventions, return_type) = split_calling_conventions(&pointer.return_type);
        // Return slots come first even though the return type is written last.
        let return_text = self.signature_part(return_type, res, true);
        let mut parts: Vec<String> = pointer
            .parameters
            .iter()
            .map(|p| self.signature_part(p, res, false))
            .collect();
        parts.push(return_text);

        let convention = match pointer.calling_convention {
            CallingConvention::Default => String::new(),
            CallingConvention::C => " unmanaged[Cdecl]".to_string(),
            CallingConvention::StdCall => " unmanaged[Stdcall]".to_string(),
            CallingConvention::ThisCall => " unmanaged[Thiscall]".to_string(),
            CallingConvention::FastCall => " unmanaged[Fastcall]".to_string(),
            CallingConvention::Unmanaged if conventions.is_empty() => " unmanaged".to_string(),
            CallingConvention::Unmanaged => format!(" unmanaged[{}]", conventions.join(", ")),
            CallingConvention::VarArg => " /* vararg */".to_string(),
        };
        format!("delegate*{}<{}>", convention, parts.join(", "))
    }

    fn signature_part(&self, ty: &TypeReference, res: &mut SlotWalk, is_return: bool) -> String {
        let modifiers = modifier_names(ty);
        match ty.unmodified() {
            TypeReference::ByReference(inner) => {
                let keyword = if modifiers.iter().any(|m| m == IN_ATTRIBUTE_MODIFIER) {
                    if is_return {
                        RefKind::RefReadonly
                    } else {
                        RefKind::In
                    }
                } else if modifiers.iter().any(|m| m == OUT_ATTRIBUTE_MODIFIER) {
                    RefKind::Out
                } else {
                    RefKind::Ref
                };
                format!("{} {}", keyword.keyword(), self.write(inner, res))
            }
            other => self.write(other, res),
        }
    }

    fn named(&self, named: &NamedType, res: &mut SlotWalk) -> String {
        if named.is("System", "Nullable") && named.value_type && named.generic_arguments.len() == 1
        {
            res.next_dynamic();
            return format!("{}?", self.write(&named.generic_arguments[0], res));
        }
        if is_tuple(named) {
            return self.tuple(named, res);
        }
        if named.declaring_type.is_none()
            && named.namespace == "System"
            && named.own_arity() == 0
        {
            if let Some(primitive) = PrimitiveType::from_system_name(&named.name) {
                if primitive.keyword().is_some() || primitive.is_native_integer() {
                    return self.primitive(primitive, res);
                }
            }
        }

        res.next_dynamic();
        let nullability = if !named.value_type || named.is_generic() {
            res.next_nullable()
        } else {
            Nullability::Oblivious
        };
        let mut text = self.qualified(named, res);
        if !named.value_type {
            text = with_marker(text, nullability);
        }
        if named.resolution == Resolution::Unresolved {
            text.push_str(" /* unresolved */");
        }
        text
    }

    fn tuple(&self, named: &NamedType, res: &mut SlotWalk) -> String {
        res.next_dynamic();
        res.next_nullable();
        let names = res.next_tuple_names(flattened_len(named));

        let mut elements = Vec::new();
        let mut current = named;
        'levels: loop {
            for (i, argument) in current.generic_arguments.iter().enumerate() {
                if i == 7 {
                    if let Some(rest) = argument.as_named() {
                        // The eighth argument nests the remaining elements.
                        res.next_dynamic();
                        res.next_nullable();
                        current = rest;
                        continue 'levels;
                    }
                }
                elements.push(self.write(argument, res));
            }
            break;
        }

        let parts: Vec<String> = elements
            .into_iter()
            .zip(names)
            .map(|(ty, name)| match name {
                Some(name) => format!("{} {}", ty, name),
                None => ty,
            })
            .collect();
        format!("({})", parts.join(", "))
    }

    /// How many leading levels of `chain` are types lexically enclosing the
    /// entity being rendered, and can therefore be left unqualified.
    fn enclosing_prefix(&self, chain: &[&NamedType]) -> usize {
        let mut shared = 0;
        while shared + 1 < chain.len() && shared < self.ctx.enclosing.len() {
            let level = chain[shared];
            let decl = self.ctx.enclosing[shared];
            let same_namespace = shared > 0 || level.namespace == decl.namespace;
            let same_parameters = level.generic_arguments.is_empty()
                || level
                    .generic_arguments
                    .iter()
                    .zip(&decl.generic_parameters)
                    .all(|(argument, parameter)| {
                        matches!(argument, TypeReference::GenericParameter(g) if g.name == parameter.name)
                    });
            if !(same_namespace
                && level.name == decl.name
                && level.own_arity() == decl.generic_parameters.len()
                && same_parameters)
            {
                break;
            }
            shared += 1;
        }
        shared
    }

    fn qualified(&self, named: &NamedType, res: &mut SlotWalk) -> String {
        let chain = named.chain();
        let skip = self.enclosing_prefix(&chain);
        let mut parts = Vec::new();
        for (i, level) in chain.iter().enumerate() {
            // Arguments of omitted levels still occupy slots.
            let arguments: Vec<String> = level
                .generic_arguments
                .iter()
                .map(|a| self.write(a, res))
                .collect();
            if i < skip {
                continue;
            }
            let part = if !arguments.is_empty() {
                format!("{}<{}>", level.name, arguments.join(", "))
            } else if level.arity > 0 {
                format!("{}<{}>", level.name, ",".repeat(level.arity - 1))
            } else {
                level.name.clone()
            };
            parts.push(part);
        }
        let text = parts.join(".");
        let namespace = chain[0].namespace.as_str();
        if skip == 0 && !namespace.is_empty() && namespace != self.ctx.namespace {
            format!("{}.{}", namespace, text)
        } else {
            text
        }
    }
}
