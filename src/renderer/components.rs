use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::model::*;

pub const NULLABLE_ATTRIBUTE: &str = "System.Runtime.CompilerServices.NullableAttribute";
pub const NULLABLE_CONTEXT_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.NullableContextAttribute";
pub const DYNAMIC_ATTRIBUTE: &str = "System.Runtime.CompilerServices.DynamicAttribute";
pub const NATIVE_INTEGER_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.NativeIntegerAttribute";
pub const TUPLE_ELEMENT_NAMES_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.TupleElementNamesAttribute";
pub const PARAM_ARRAY_ATTRIBUTE: &str = "System.ParamArrayAttribute";
pub const PARAM_COLLECTION_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.ParamCollectionAttribute";
pub const IS_READ_ONLY_ATTRIBUTE: &str = "System.Runtime.CompilerServices.IsReadOnlyAttribute";
pub const IS_BY_REF_LIKE_ATTRIBUTE: &str = "System.Runtime.CompilerServices.IsByRefLikeAttribute";
pub const IS_UNMANAGED_ATTRIBUTE: &str = "System.Runtime.CompilerServices.IsUnmanagedAttribute";
pub const REQUIRED_MEMBER_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.RequiredMemberAttribute";
pub const REQUIRES_LOCATION_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.RequiresLocationAttribute";
pub const SCOPED_REF_ATTRIBUTE: &str = "System.Runtime.CompilerServices.ScopedRefAttribute";
pub const EXTENSION_ATTRIBUTE: &str = "System.Runtime.CompilerServices.ExtensionAttribute";
pub const FIXED_BUFFER_ATTRIBUTE: &str = "System.Runtime.CompilerServices.FixedBufferAttribute";
pub const DECIMAL_CONSTANT_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.DecimalConstantAttribute";
pub const DEFAULT_MEMBER_ATTRIBUTE: &str = "System.Reflection.DefaultMemberAttribute";
pub const FLAGS_ATTRIBUTE: &str = "System.FlagsAttribute";
pub const OBSOLETE_ATTRIBUTE: &str = "System.ObsoleteAttribute";
pub const COMPILER_GENERATED_ATTRIBUTE: &str =
    "System.Runtime.CompilerServices.CompilerGeneratedAttribute";

pub const IS_VOLATILE_MODIFIER: &str = "System.Runtime.CompilerServices.IsVolatile";
pub const IS_EXTERNAL_INIT_MODIFIER: &str = "System.Runtime.CompilerServices.IsExternalInit";
pub const IN_ATTRIBUTE_MODIFIER: &str = "System.Runtime.InteropServices.InAttribute";
pub const OUT_ATTRIBUTE_MODIFIER: &str = "System.Runtime.InteropServices.OutAttribute";

/// Annotations whose meaning is carried by a keyword, suffix or structure
/// in the rendered text, or that are compiler bookkeeping with no visible
/// meaning at all.
const SYNTAX_ABSORBED: &[&str] = &[
    // `?`, `dynamic`, `nint`, tuple element names
    NULLABLE_ATTRIBUTE,
    NULLABLE_CONTEXT_ATTRIBUTE,
    "System.Runtime.CompilerServices.NullablePublicOnlyAttribute",
    DYNAMIC_ATTRIBUTE,
    NATIVE_INTEGER_ATTRIBUTE,
    TUPLE_ELEMENT_NAMES_ATTRIBUTE,
    // keywords
    PARAM_ARRAY_ATTRIBUTE,
    PARAM_COLLECTION_ATTRIBUTE,
    IS_READ_ONLY_ATTRIBUTE,
    IS_BY_REF_LIKE_ATTRIBUTE,
    IS_UNMANAGED_ATTRIBUTE,
    REQUIRED_MEMBER_ATTRIBUTE,
    REQUIRES_LOCATION_ATTRIBUTE,
    SCOPED_REF_ATTRIBUTE,
    "System.Runtime.CompilerServices.LifetimeAnnotationAttribute",
    EXTENSION_ATTRIBUTE,
    // structure: fixed buffers, decimal constants, indexer names
    FIXED_BUFFER_ATTRIBUTE,
    DECIMAL_CONSTANT_ATTRIBUTE,
    "System.Runtime.CompilerServices.DateTimeConstantAttribute",
    DEFAULT_MEMBER_ATTRIBUTE,
    // bookkeeping
    COMPILER_GENERATED_ATTRIBUTE,
    "System.Runtime.CompilerServices.CompilerFeatureRequiredAttribute",
    "System.Runtime.CompilerServices.RefSafetyRulesAttribute",
    "System.Runtime.CompilerServices.EmbeddedAttribute",
    "System.Runtime.CompilerServices.AsyncStateMachineAttribute",
    "System.Runtime.CompilerServices.IteratorStateMachineAttribute",
    "System.Runtime.CompilerServices.AsyncIteratorStateMachineAttribute",
    "System.Diagnostics.DebuggerStepThroughAttribute",
    "System.Diagnostics.DebuggerHiddenAttribute",
];

/// Obsolete messages the compiler emits on its own to keep older compilers
/// away from newer constructs.
const COMPILER_OBSOLETE_MESSAGES: &[&str] = &[
    "Types with embedded references are not supported in this version of your compiler.",
    "Constructors of types with required members are not supported in this version of your compiler.",
];

pub fn is_syntax_absorbed(annotation: &CustomAnnotation) -> bool {
    let name = annotation.full_name();
    if SYNTAX_ABSORBED.contains(&name.as_str()) {
        return true;
    }
    name == OBSOLETE_ATTRIBUTE
        && matches!(
            annotation.positional.first(),
            Some(ConstantValue::String(message)) if COMPILER_OBSOLETE_MESSAGES.contains(&message.as_str())
        )
}

/// Decides which custom annotations are rendered as attribute lines.
#[derive(Debug, Clone, Default)]
pub struct AttributeFilter {
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl AttributeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds shell-style patterns (`*`, `?`) matched against the full,
    /// arity-suffixed annotation type name. Once any include pattern is
    /// set, only matching annotations are kept.
    pub fn include<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_patterns
            .extend(patterns.into_iter().map(|p| p.as_ref().to_string()));
        self.include = compile_patterns(&self.include_patterns)?;
        Ok(())
    }

    pub fn exclude<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(|p| p.as_ref().to_string()));
        self.exclude = compile_patterns(&self.exclude_patterns)?;
        Ok(())
    }

    pub fn clear_include(&mut self) {
        self.include_patterns.clear();
        self.include = None;
    }

    pub fn clear_exclude(&mut self) {
        self.exclude_patterns.clear();
        self.exclude = None;
    }

    pub fn retain(&self, annotation: &CustomAnnotation) -> bool {
        if is_syntax_absorbed(annotation) {
            return false;
        }
        let name = annotation.full_name();
        if let Some(include) = &self.include {
            if !include.is_match(&name) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(&name) {
                return false;
            }
        }
        true
    }

    /// Retained annotations ordered by full type name. Equal names keep
    /// their metadata order; the renderer removes rendered duplicates.
    pub fn retained<'a>(&self, annotations: &'a [CustomAnnotation]) -> Vec<&'a CustomAnnotation> {
        let mut kept: Vec<(String, &CustomAnnotation)> = annotations
            .iter()
            .filter(|a| self.retain(a))
            .map(|a| (a.full_name(), a))
            .collect();
        kept.sort_by(|a, b| a.0.cmp(&b.0));
        kept.into_iter().map(|(_, a)| a).collect()
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        // Type names have no path separators; `*` spans everything.
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .with_context(|| format!("invalid attribute pattern '{}'", pattern))?;
        builder.add(glob);
    }
    Ok(Some(
        builder.build().context("failed to compile attribute patterns")?,
    ))
}

/// Full names of the outer custom modifiers wrapping `ty`, outermost first.
pub fn modifier_names(ty: &TypeReference) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = ty;
    loop {
        match current {
            TypeReference::OptionalModifier(m) | TypeReference::RequiredModifier(m) => {
                names.push(m.modifier.full_name());
                current = &m.inner;
            }
            _ => return names,
        }
    }
}

pub fn has_required_modifier(ty: &TypeReference, full_name: &str) -> bool {
    let mut current = ty;
    loop {
        match current {
            TypeReference::RequiredModifier(m) => {
                if m.modifier.full_name() == full_name {
                    return true;
                }
                current = &m.inner;
            }
            TypeReference::OptionalModifier(m) => current = &m.inner,
            _ => return false,
        }
    }
}

pub fn has_annotation(annotations: &[CustomAnnotation], full_name: &str) -> bool {
    find_annotation(annotations, full_name).is_some()
}
