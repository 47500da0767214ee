use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The read-only input of a rendering pass: one compiled module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleModel {
    pub name: String,
    /// The runtime the module targets treats `IntPtr`/`UIntPtr` as `nint`/`nuint`.
    #[serde(default)]
    pub supports_native_integers: bool,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
    #[serde(default)]
    pub types: Vec<TypeDeclaration>,
    /// Declarations from other modules, used to resolve enum constants.
    /// Never rendered.
    #[serde(default)]
    pub referenced_types: Vec<TypeDeclaration>,
    #[serde(default)]
    pub exported_types: Vec<ExportedType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedType {
    #[serde(rename = "type")]
    pub ty: NamedType,
    pub origin_module: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Void,
    Boolean,
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Decimal,
    String,
    Object,
    IntPtr,
    UIntPtr,
    TypedReference,
}

/// Builtin types: (primitive, name inside `System`, keyword).
const BUILTIN_TYPES: &[(PrimitiveType, &str, Option<&str>)] = &[
    (PrimitiveType::Void, "Void", Some("void")),
    (PrimitiveType::Boolean, "Boolean", Some("bool")),
    (PrimitiveType::Char, "Char", Some("char")),
    (PrimitiveType::Int8, "SByte", Some("sbyte")),
    (PrimitiveType::UInt8, "Byte", Some("byte")),
    (PrimitiveType::Int16, "Int16", Some("short")),
    (PrimitiveType::UInt16, "UInt16", Some("ushort")),
    (PrimitiveType::Int32, "Int32", Some("int")),
    (PrimitiveType::UInt32, "UInt32", Some("uint")),
    (PrimitiveType::Int64, "Int64", Some("long")),
    (PrimitiveType::UInt64, "UInt64", Some("ulong")),
    (PrimitiveType::Float32, "Single", Some("float")),
    (PrimitiveType::Float64, "Double", Some("double")),
    (PrimitiveType::Decimal, "Decimal", Some("decimal")),
    (PrimitiveType::String, "String", Some("string")),
    (PrimitiveType::Object, "Object", Some("object")),
    (PrimitiveType::IntPtr, "IntPtr", None),
    (PrimitiveType::UIntPtr, "UIntPtr", None),
    (PrimitiveType::TypedReference, "TypedReference", None),
];

impl PrimitiveType {
    fn entry(self) -> &'static (PrimitiveType, &'static str, Option<&'static str>) {
        BUILTIN_TYPES
            .iter()
            .find(|(p, _, _)| *p == self)
            .unwrap_or(&BUILTIN_TYPES[0])
    }

    /// Name of the type inside the `System` namespace.
    pub fn system_name(self) -> &'static str {
        self.entry().1
    }

    /// Language keyword, if the type has one independent of annotations.
    pub fn keyword(self) -> Option<&'static str> {
        self.entry().2
    }

    pub fn from_system_name(name: &str) -> Option<Self> {
        BUILTIN_TYPES
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(p, _, _)| *p)
    }

    pub fn is_reference_type(self) -> bool {
        matches!(self, PrimitiveType::String | PrimitiveType::Object)
    }

    pub fn is_native_integer(self) -> bool {
        matches!(self, PrimitiveType::IntPtr | PrimitiveType::UIntPtr)
    }

    /// Width in bytes of the integral primitives usable as enum storage.
    pub fn integral_width(self) -> Option<u32> {
        match self {
            PrimitiveType::Boolean | PrimitiveType::Int8 | PrimitiveType::UInt8 => Some(1),
            PrimitiveType::Char | PrimitiveType::Int16 | PrimitiveType::UInt16 => Some(2),
            PrimitiveType::Int32 | PrimitiveType::UInt32 => Some(4),
            PrimitiveType::Int64
            | PrimitiveType::UInt64
            | PrimitiveType::IntPtr
            | PrimitiveType::UIntPtr => Some(8),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    #[default]
    Resolved,
    /// The reader could not locate the declaration behind this reference.
    Unresolved,
}

/// A reference to a class, struct, interface, enum or delegate, possibly
/// instantiated. Generic arguments are stored on the nesting level that
/// declares them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NamedType {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub declaring_type: Option<Box<NamedType>>,
    #[serde(default)]
    pub generic_arguments: Vec<TypeReference>,
    /// Declared generic parameter count of this level; only needed for
    /// open references such as `typeof(List<>)`.
    #[serde(default)]
    pub arity: usize,
    #[serde(default)]
    pub value_type: bool,
    #[serde(default)]
    pub resolution: Resolution,
}

impl NamedType {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn value(namespace: &str, name: &str) -> Self {
        Self {
            value_type: true,
            ..Self::new(namespace, name)
        }
    }

    pub fn nested_in(mut self, declaring: NamedType) -> Self {
        self.namespace = String::new();
        self.declaring_type = Some(Box::new(declaring));
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<TypeReference>) -> Self {
        self.generic_arguments = arguments;
        self
    }

    pub fn own_arity(&self) -> usize {
        if self.generic_arguments.is_empty() {
            self.arity
        } else {
            self.generic_arguments.len()
        }
    }

    /// True when this level or any declaring level is generic.
    pub fn is_generic(&self) -> bool {
        self.own_arity() > 0
            || self
                .declaring_type
                .as_deref()
                .is_some_and(NamedType::is_generic)
    }

    /// Declaring chain, outermost first, ending with `self`.
    pub fn chain(&self) -> Vec<&NamedType> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(declaring) = current.declaring_type.as_deref() {
            chain.push(declaring);
            current = declaring;
        }
        chain.reverse();
        chain
    }

    pub fn outermost_namespace(&self) -> &str {
        let outermost = self.chain()[0];
        &outermost.namespace
    }

    /// Metadata-style name: `Ns.Outer`1+Inner`.
    pub fn full_name(&self) -> String {
        let mut full = String::new();
        for (i, level) in self.chain().into_iter().enumerate() {
            if i == 0 {
                if !level.namespace.is_empty() {
                    full.push_str(&level.namespace);
                    full.push('.');
                }
            } else {
                full.push('+');
            }
            full.push_str(&level.name);
            if level.own_arity() > 0 {
                full.push('`');
                full.push_str(&level.own_arity().to_string());
            }
        }
        full
    }

    pub fn is(&self, namespace: &str, name: &str) -> bool {
        self.declaring_type.is_none() && self.namespace == namespace && self.name == name
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericOwner {
    #[default]
    Type,
    Method,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParameterRef {
    pub name: String,
    #[serde(default)]
    pub owner: GenericOwner,
    /// Constrained to value types (`struct` or `unmanaged`).
    #[serde(default)]
    pub value_type: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayType {
    pub element: Box<TypeReference>,
    #[serde(default = "default_rank")]
    pub rank: u32,
}

fn default_rank() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifiedType {
    pub modifier: NamedType,
    pub inner: Box<TypeReference>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallingConvention {
    #[default]
    Default,
    C,
    StdCall,
    ThisCall,
    FastCall,
    VarArg,
    Unmanaged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionPointerType {
    #[serde(default)]
    pub calling_convention: CallingConvention,
    pub return_type: Box<TypeReference>,
    #[serde(default)]
    pub parameters: Vec<TypeReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeReference {
    Primitive(PrimitiveType),
    Named(NamedType),
    GenericParameter(GenericParameterRef),
    Array(ArrayType),
    Pointer(Box<TypeReference>),
    ByReference(Box<TypeReference>),
    OptionalModifier(ModifiedType),
    RequiredModifier(ModifiedType),
    FunctionPointer(FunctionPointerType),
}

impl TypeReference {
    pub fn primitive(primitive: PrimitiveType) -> Self {
        TypeReference::Primitive(primitive)
    }

    pub fn class(namespace: &str, name: &str) -> Self {
        TypeReference::Named(NamedType::new(namespace, name))
    }

    pub fn value(namespace: &str, name: &str) -> Self {
        TypeReference::Named(NamedType::value(namespace, name))
    }

    pub fn generic(name: &str) -> Self {
        TypeReference::GenericParameter(GenericParameterRef {
            name: name.to_string(),
            owner: GenericOwner::Type,
            value_type: false,
        })
    }

    pub fn method_generic(name: &str) -> Self {
        TypeReference::GenericParameter(GenericParameterRef {
            name: name.to_string(),
            owner: GenericOwner::Method,
            value_type: false,
        })
    }

    pub fn array(element: TypeReference) -> Self {
        TypeReference::Array(ArrayType {
            element: Box::new(element),
            rank: 1,
        })
    }

    pub fn pointer(element: TypeReference) -> Self {
        TypeReference::Pointer(Box::new(element))
    }

    pub fn by_ref(element: TypeReference) -> Self {
        TypeReference::ByReference(Box::new(element))
    }

    pub fn required(modifier: NamedType, inner: TypeReference) -> Self {
        TypeReference::RequiredModifier(ModifiedType {
            modifier,
            inner: Box::new(inner),
        })
    }

    pub fn optional(modifier: NamedType, inner: TypeReference) -> Self {
        TypeReference::OptionalModifier(ModifiedType {
            modifier,
            inner: Box::new(inner),
        })
    }

    pub fn void() -> Self {
        TypeReference::Primitive(PrimitiveType::Void)
    }

    /// Strips custom modifiers, which never affect slot accounting.
    pub fn unmodified(&self) -> &TypeReference {
        match self {
            TypeReference::OptionalModifier(m) | TypeReference::RequiredModifier(m) => {
                m.inner.unmodified()
            }
            other => other,
        }
    }

    pub fn as_named(&self) -> Option<&NamedType> {
        match self.unmodified() {
            TypeReference::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(
            self.unmodified(),
            TypeReference::Primitive(PrimitiveType::Void)
        )
    }

    pub fn is_value_type(&self) -> bool {
        match self.unmodified() {
            TypeReference::Primitive(p) => !p.is_reference_type(),
            TypeReference::Named(n) => n.value_type,
            TypeReference::GenericParameter(g) => g.value_type,
            TypeReference::Pointer(_) | TypeReference::FunctionPointer(_) => true,
            _ => false,
        }
    }

    /// The `T` of a `System.Nullable<T>` instantiation.
    pub fn nullable_value_argument(&self) -> Option<&TypeReference> {
        let named = self.as_named()?;
        if named.is("System", "Nullable") && named.value_type && named.generic_arguments.len() == 1
        {
            named.generic_arguments.first()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub enum_type: NamedType,
    pub value: Box<ConstantValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub element_type: TypeReference,
    /// `None` encodes a null array.
    #[serde(default)]
    pub elements: Option<Vec<ConstantValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstantValue {
    Null,
    Boolean(bool),
    /// A UTF-16 code unit; lone surrogates are representable.
    Char(u16),
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(#[serde(with = "float32_repr")] f32),
    Float64(#[serde(with = "float64_repr")] f64),
    /// Decimal text in invariant form, e.g. `-12.50`.
    Decimal(String),
    String(String),
    Type(TypeReference),
    Enum(EnumValue),
    Array(ArrayValue),
}

impl ConstantValue {
    /// Integral payload widened to `i128`, so both `i64` and `u64` fit.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            ConstantValue::Boolean(v) => Some(i128::from(*v)),
            ConstantValue::Char(v) => Some(i128::from(*v)),
            ConstantValue::Int8(v) => Some(i128::from(*v)),
            ConstantValue::UInt8(v) => Some(i128::from(*v)),
            ConstantValue::Int16(v) => Some(i128::from(*v)),
            ConstantValue::UInt16(v) => Some(i128::from(*v)),
            ConstantValue::Int32(v) => Some(i128::from(*v)),
            ConstantValue::UInt32(v) => Some(i128::from(*v)),
            ConstantValue::Int64(v) => Some(i128::from(*v)),
            ConstantValue::UInt64(v) => Some(i128::from(*v)),
            ConstantValue::Enum(e) => e.value.as_integer(),
            _ => None,
        }
    }
}

// JSON has no literal for NaN or the infinities; accept them as strings.
mod float64_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if value.is_infinite() {
            serializer.serialize_str(if *value > 0.0 { "Infinity" } else { "-Infinity" })
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(text) => match text.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse().map_err(serde::de::Error::custom),
            },
        }
    }
}

mod float32_repr {
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        super::float64_repr::serialize(&f64::from(*value), serializer)
    }

    #[allow(clippy::cast_possible_truncation)]
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        super::float64_repr::deserialize(deserializer).map(|v| v as f32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedArgumentKind {
    Field,
    Property,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedArgument {
    pub name: String,
    pub kind: NamedArgumentKind,
    pub value: ConstantValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAnnotation {
    pub annotation_type: NamedType,
    #[serde(default)]
    pub positional: Vec<ConstantValue>,
    #[serde(default)]
    pub named: Vec<NamedArgument>,
}

impl CustomAnnotation {
    pub fn new(namespace: &str, name: &str, positional: Vec<ConstantValue>) -> Self {
        Self {
            annotation_type: NamedType::new(namespace, name),
            positional,
            named: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        self.annotation_type.full_name()
    }

    pub fn is(&self, full_name: &str) -> bool {
        self.full_name() == full_name
    }
}

/// Finds the first annotation of the given full type name.
pub fn find_annotation<'a>(
    annotations: &'a [CustomAnnotation],
    full_name: &str,
) -> Option<&'a CustomAnnotation> {
    annotations.iter().find(|a| a.is(full_name))
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    #[strum(serialize = "private")]
    Private,
    #[strum(serialize = "private protected")]
    PrivateProtected,
    #[strum(serialize = "internal")]
    Internal,
    #[strum(serialize = "protected")]
    Protected,
    #[strum(serialize = "protected internal")]
    ProtectedInternal,
    #[strum(serialize = "public")]
    Public,
    /// Member-scope accessibility with no source-level keyword.
    #[strum(serialize = "/* compiler-controlled */")]
    CompilerControlled,
}

impl Accessibility {
    /// Visible to consumers outside the module.
    pub fn is_public_surface(self) -> bool {
        matches!(
            self,
            Accessibility::Public | Accessibility::Protected | Accessibility::ProtectedInternal
        )
    }

    pub fn is_visible(self, include_internals: bool) -> bool {
        self.is_public_surface()
            || (include_internals
                && matches!(
                    self,
                    Accessibility::Internal
                        | Accessibility::PrivateProtected
                        | Accessibility::CompilerControlled
                ))
    }

    /// Ordering used to pick the accessibility of a property or event from
    /// its accessors.
    pub fn openness(self) -> u8 {
        match self {
            Accessibility::CompilerControlled => 0,
            Accessibility::Private => 1,
            Accessibility::PrivateProtected => 2,
            Accessibility::Internal => 3,
            Accessibility::Protected => 4,
            Accessibility::ProtectedInternal => 5,
            Accessibility::Public => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TypeModifiers: u32 {
        const ABSTRACT = 0x0001;
        const SEALED = 0x0002;
        const STATIC = 0x0004;
        const READONLY = 0x0008;
        const BY_REF_LIKE = 0x0010;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MethodModifiers: u32 {
        const STATIC = 0x0001;
        const ABSTRACT = 0x0002;
        const VIRTUAL = 0x0004;
        /// Cannot be overridden further.
        const FINAL = 0x0008;
        /// Introduces a new vtable slot instead of reusing the base slot.
        const NEW_SLOT = 0x0010;
        const SPECIAL_NAME = 0x0020;
        const EXTERN = 0x0040;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct FieldModifiers: u32 {
        const STATIC = 0x0001;
        const INIT_ONLY = 0x0002;
        const LITERAL = 0x0004;
        const SPECIAL_NAME = 0x0008;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ParameterFlags: u32 {
        const IN = 0x0001;
        const OUT = 0x0002;
        const OPTIONAL = 0x0004;
        const PARAMS = 0x0008;
        const SCOPED = 0x0010;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ConstraintFlags: u32 {
        const REFERENCE_TYPE = 0x0001;
        const VALUE_TYPE = 0x0002;
        const DEFAULT_CONSTRUCTOR = 0x0004;
        const UNMANAGED = 0x0008;
        const ALLOWS_REF_STRUCT = 0x0010;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variance {
    #[default]
    None,
    Covariant,
    Contravariant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericConstraint {
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericParameter {
    pub name: String,
    #[serde(default)]
    pub variance: Variance,
    #[serde(default)]
    pub flags: ConstraintFlags,
    #[serde(default)]
    pub constraints: Vec<GenericConstraint>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

impl GenericParameter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            variance: Variance::None,
            flags: ConstraintFlags::empty(),
            constraints: Vec::new(),
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceImplementation {
    pub interface: TypeReference,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub flags: ParameterFlags,
    #[serde(default)]
    pub default_value: Option<ConstantValue>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

impl Parameter {
    pub fn new(name: &str, ty: TypeReference) -> Self {
        Self {
            name: name.to_string(),
            ty,
            flags: ParameterFlags::empty(),
            default_value: None,
            annotations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub modifiers: FieldModifiers,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub constant: Option<ConstantValue>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDeclaration {
    pub name: String,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub modifiers: MethodModifiers,
    #[serde(default)]
    pub generic_parameters: Vec<GenericParameter>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default = "TypeReference::void")]
    pub return_type: TypeReference,
    #[serde(default)]
    pub return_annotations: Vec<CustomAnnotation>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

impl MethodDeclaration {
    pub fn new(name: &str, accessibility: Accessibility) -> Self {
        Self {
            name: name.to_string(),
            accessibility,
            modifiers: MethodModifiers::empty(),
            generic_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: TypeReference::void(),
            return_annotations: Vec::new(),
            annotations: Vec::new(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor"
    }

    pub fn is_static_constructor(&self) -> bool {
        self.name == ".cctor"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    /// Non-empty for indexers.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub getter: Option<MethodDeclaration>,
    #[serde(default)]
    pub setter: Option<MethodDeclaration>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

impl PropertyDeclaration {
    pub fn accessors(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.getter.iter().chain(self.setter.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub adder: Option<MethodDeclaration>,
    #[serde(default)]
    pub remover: Option<MethodDeclaration>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

impl EventDeclaration {
    pub fn accessors(&self) -> impl Iterator<Item = &MethodDeclaration> {
        self.adder.iter().chain(self.remover.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    #[serde(default)]
    pub namespace: String,
    pub name: String,
    pub kind: TypeKind,
    pub accessibility: Accessibility,
    #[serde(default)]
    pub modifiers: TypeModifiers,
    /// Own generic parameters only; those of enclosing types are not repeated.
    #[serde(default)]
    pub generic_parameters: Vec<GenericParameter>,
    #[serde(default)]
    pub base_type: Option<TypeReference>,
    #[serde(default)]
    pub interfaces: Vec<InterfaceImplementation>,
    #[serde(default)]
    pub enum_underlying_type: Option<PrimitiveType>,
    #[serde(default)]
    pub nested_types: Vec<TypeDeclaration>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
    #[serde(default)]
    pub properties: Vec<PropertyDeclaration>,
    #[serde(default)]
    pub events: Vec<EventDeclaration>,
    /// Accessor methods belong to their property or event, not here.
    #[serde(default)]
    pub methods: Vec<MethodDeclaration>,
    #[serde(default)]
    pub annotations: Vec<CustomAnnotation>,
}

impl TypeDeclaration {
    pub fn new(namespace: &str, name: &str, kind: TypeKind) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            kind,
            accessibility: Accessibility::Public,
            modifiers: TypeModifiers::empty(),
            generic_parameters: Vec::new(),
            base_type: None,
            interfaces: Vec::new(),
            enum_underlying_type: None,
            nested_types: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            methods: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// Name with the metadata arity suffix, e.g. `List`1`.
    pub fn metadata_name(&self) -> String {
        if self.generic_parameters.is_empty() {
            self.name.clone()
        } else {
            format!("{}`{}", self.name, self.generic_parameters.len())
        }
    }

    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum)
    }

    pub fn underlying_type(&self) -> PrimitiveType {
        self.enum_underlying_type.unwrap_or(PrimitiveType::Int32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKind {
    Field,
    Constructor,
    Property,
    Event,
    Method,
}

/// A borrowed view of one member of a type declaration.
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Field(&'a FieldDeclaration),
    Property(&'a PropertyDeclaration),
    Event(&'a EventDeclaration),
    Method(&'a MethodDeclaration),
}

impl<'a> Member<'a> {
    pub fn kind(&self) -> MemberKind {
        match self {
            Member::Field(_) => MemberKind::Field,
            Member::Property(_) => MemberKind::Property,
            Member::Event(_) => MemberKind::Event,
            Member::Method(m) if m.is_constructor() => MemberKind::Constructor,
            Member::Method(_) => MemberKind::Method,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Member::Field(f) => &f.name,
            Member::Property(p) => &p.name,
            Member::Event(e) => &e.name,
            Member::Method(m) => &m.name,
        }
    }

    /// Accessibility as seen by callers; properties and events take the
    /// most open of their accessors.
    pub fn accessibility(&self) -> Accessibility {
        let most_open = |accessors: Vec<&MethodDeclaration>| {
            accessors
                .into_iter()
                .map(|m| m.accessibility)
                .max_by_key(|a| a.openness())
                .unwrap_or(Accessibility::Private)
        };
        match self {
            Member::Field(f) => f.accessibility,
            Member::Method(m) => m.accessibility,
            Member::Property(p) => most_open(p.accessors().collect()),
            Member::Event(e) => most_open(e.accessors().collect()),
        }
    }

    pub fn annotations(&self) -> &'a [CustomAnnotation] {
        match self {
            Member::Field(f) => &f.annotations,
            Member::Property(p) => &p.annotations,
            Member::Event(e) => &e.annotations,
            Member::Method(m) => &m.annotations,
        }
    }
}
