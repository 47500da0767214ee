use std::rc::Rc;

use crate::model::*;
use crate::renderer::components::AttributeFilter;

/// One output line; `None` is a deliberate blank separator.
pub type Line = Option<String>;

/// How raw enum literals are spelled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnumLiteralOptions {
    pub binary: bool,
    pub hex: bool,
    pub char: bool,
}

/// Configuration shared by every entity of one rendering pass.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub include_internals: bool,
    pub enum_literals: EnumLiteralOptions,
    pub attribute_filter: AttributeFilter,
}

/// Where in the module the entity being rendered lives.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub depth: usize,
    pub options: &'a RenderOptions,
    pub module: &'a ModuleModel,
    pub index: Rc<TypeIndex<'a>>,
    pub namespace: &'a str,
    /// Lexically enclosing types, outermost first.
    pub enclosing: Vec<&'a TypeDeclaration>,
}

impl<'a> RenderContext<'a> {
    pub fn new(module: &'a ModuleModel, options: &'a RenderOptions) -> Self {
        Self {
            depth: 0,
            options,
            module,
            index: Rc::new(TypeIndex::new(module)),
            namespace: "",
            enclosing: Vec::new(),
        }
    }

    pub fn with_depth(&self, depth: usize) -> Self {
        Self {
            depth,
            ..self.clone()
        }
    }

    /// Context for the contents of a namespace block; the global namespace
    /// has no block and therefore no extra indentation.
    pub fn in_namespace(&self, namespace: &'a str) -> Self {
        Self {
            depth: if namespace.is_empty() { self.depth } else { self.depth + 1 },
            namespace,
            enclosing: Vec::new(),
            ..self.clone()
        }
    }

    /// Context for the members of `decl`.
    pub fn enter(&self, decl: &'a TypeDeclaration) -> Self {
        let mut enclosing = self.enclosing.clone();
        enclosing.push(decl);
        Self {
            depth: self.depth + 1,
            enclosing,
            ..self.clone()
        }
    }

    pub fn current_type(&self) -> Option<&'a TypeDeclaration> {
        self.enclosing.last().copied()
    }

    pub fn indent(&self) -> String {
        "    ".repeat(self.depth)
    }

    pub fn line(&self, text: impl AsRef<str>) -> Line {
        Some(format!("{}{}", self.indent(), text.as_ref()))
    }
}

/// Identity and sort key of a member. Field order gives the sort order:
/// kind, rendered name, generic parameters, then parameter types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberSignature {
    pub kind: MemberKind,
    pub name: String,
    pub generic_parameters: Vec<String>,
    pub parameter_types: Vec<String>,
}

impl std::fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.generic_parameters.is_empty() {
            write!(f, "{}({})", self.name, self.parameter_types.join(", "))
        } else {
            write!(
                f,
                "{}<{}>({})",
                self.name,
                self.generic_parameters.join(", "),
                self.parameter_types.join(", ")
            )
        }
    }
}

/// One target syntax. The traversal engine only talks to this interface.
pub trait EntityRenderer {
    /// Module-level annotations, rendered before everything else.
    fn module_header(&self, ctx: &RenderContext<'_>) -> Vec<Line>;

    /// Types forwarded to `origin`, already sorted by full name.
    fn forwarded_types(&self, origin: &str, types: &[&NamedType], ctx: &RenderContext<'_>)
        -> Vec<Line>;

    fn namespace_open(&self, namespace: &str, ctx: &RenderContext<'_>) -> Vec<Line>;

    fn namespace_close(&self, namespace: &str, ctx: &RenderContext<'_>) -> Vec<Line>;

    /// Annotations and header of `decl`; `ctx` is the scope the type is
    /// declared in.
    fn type_open(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> Vec<Line>;

    fn type_close(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> Vec<Line>;

    /// `ctx` is the scope inside the declaring type.
    fn member_signature(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> MemberSignature;

    fn member(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> Vec<Line>;
}
