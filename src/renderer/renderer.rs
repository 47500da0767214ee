use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::model::*;
use crate::renderer::components::{has_annotation, COMPILER_GENERATED_ATTRIBUTE};
use crate::renderer::traits::*;

/// A consistency fault found during a pass. Faults never stop the pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted name of the declaring type, namespace included.
    pub type_name: String,
    pub signature: MemberSignature,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// Drives an [`EntityRenderer`] over a module in a fixed order.
///
/// Configuration persists across passes; diagnostics are reset at the
/// start of each pass.
pub struct ApiWriter<R: EntityRenderer> {
    renderer: R,
    options: RenderOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<R: EntityRenderer + Default> Default for ApiWriter<R> {
    fn default() -> Self {
        Self::new(R::default())
    }
}

impl<R: EntityRenderer> ApiWriter<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            options: RenderOptions::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn include_internals(&mut self, enabled: bool) -> &mut Self {
        self.options.include_internals = enabled;
        self
    }

    /// Takes priority over hex when both are enabled.
    pub fn enable_binary_enums(&mut self, enabled: bool) -> &mut Self {
        self.options.enum_literals.binary = enabled;
        self
    }

    pub fn enable_hex_enums(&mut self, enabled: bool) -> &mut Self {
        self.options.enum_literals.hex = enabled;
        self
    }

    pub fn enable_char_enums(&mut self, enabled: bool) -> &mut Self {
        self.options.enum_literals.char = enabled;
        self
    }

    pub fn include_attributes<I, S>(&mut self, patterns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.attribute_filter.include(patterns)?;
        Ok(self)
    }

    pub fn exclude_attributes<I, S>(&mut self, patterns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.options.attribute_filter.exclude(patterns)?;
        Ok(self)
    }

    pub fn clear_included_attributes(&mut self) -> &mut Self {
        self.options.attribute_filter.clear_include();
        self
    }

    pub fn clear_excluded_attributes(&mut self) -> &mut Self {
        self.options.attribute_filter.clear_exclude();
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Faults reported by the most recent pass.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Starts a pass. Lines are produced on demand; dropping the iterator
    /// early stops the walk.
    pub fn lines<'w>(&'w mut self, module: &'w ModuleModel) -> Lines<'w, R> {
        let ApiWriter {
            renderer,
            options,
            diagnostics,
        } = self;
        diagnostics.clear();
        Lines::new(renderer, options, diagnostics, module)
    }

    /// Runs a full pass; blank separators become empty lines.
    pub fn render_to_string(&mut self, module: &ModuleModel) -> String {
        let mut output = String::new();
        for line in self.lines(module) {
            if let Some(text) = line {
                output.push_str(&text);
            }
            output.push('\n');
        }
        output
    }
}

enum Step<'w> {
    Header,
    Forwarded,
    Namespace {
        name: &'w str,
        types: Vec<&'w TypeDeclaration>,
        separator: bool,
    },
    Type {
        decl: &'w TypeDeclaration,
        ctx: Rc<RenderContext<'w>>,
        separator: bool,
    },
    Member {
        member: Member<'w>,
        ctx: Rc<RenderContext<'w>>,
    },
    CloseType {
        decl: &'w TypeDeclaration,
        ctx: Rc<RenderContext<'w>>,
    },
    CloseNamespace {
        name: &'w str,
        ctx: Rc<RenderContext<'w>>,
    },
}

/// Lazy line sequence of one pass.
pub struct Lines<'w, R: EntityRenderer> {
    renderer: &'w R,
    diagnostics: &'w mut Vec<Diagnostic>,
    root: Rc<RenderContext<'w>>,
    stack: Vec<Step<'w>>,
    pending: VecDeque<Line>,
}

fn is_listed(decl: &TypeDeclaration, include_internals: bool) -> bool {
    decl.accessibility.is_visible(include_internals)
        && !decl.name.starts_with('<')
        && !has_annotation(&decl.annotations, COMPILER_GENERATED_ATTRIBUTE)
}

fn sort_types(types: &mut [&TypeDeclaration]) {
    types.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then(a.generic_parameters.len().cmp(&b.generic_parameters.len()))
    });
}

/// Accessor and static-initializer methods never appear on their own.
fn is_listed_method(method: &MethodDeclaration) -> bool {
    if method.is_static_constructor() || method.name.starts_with('<') {
        return false;
    }
    let accessor = ["get_", "set_", "add_", "remove_"]
        .iter()
        .any(|prefix| method.name.starts_with(prefix));
    !(accessor && method.modifiers.contains(MethodModifiers::SPECIAL_NAME))
}

fn qualified_type_name(ctx: &RenderContext<'_>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if !ctx.namespace.is_empty() {
        parts.push(ctx.namespace);
    }
    parts.extend(ctx.enclosing.iter().map(|t| t.name.as_str()));
    parts.join(".")
}

impl<'w, R: EntityRenderer> Lines<'w, R> {
    fn new(
        renderer: &'w R,
        options: &'w RenderOptions,
        diagnostics: &'w mut Vec<Diagnostic>,
        module: &'w ModuleModel,
    ) -> Self {
        let root = Rc::new(RenderContext::new(module, options));

        let mut namespaces: BTreeMap<&'w str, Vec<&'w TypeDeclaration>> = BTreeMap::new();
        for decl in module
            .types
            .iter()
            .filter(|t| is_listed(t, options.include_internals))
        {
            namespaces.entry(decl.namespace.as_str()).or_default().push(decl);
        }

        let mut stack = Vec::with_capacity(namespaces.len() + 2);
        for (i, (name, mut types)) in namespaces.into_iter().enumerate().rev() {
            sort_types(&mut types);
            stack.push(Step::Namespace {
                name,
                types,
                separator: i > 0,
            });
        }
        stack.push(Step::Forwarded);
        stack.push(Step::Header);

        debug!(module = %module.name, "starting rendering pass");
        Self {
            renderer,
            diagnostics,
            root,
            stack,
            pending: VecDeque::new(),
        }
    }

    fn run(&mut self, step: Step<'w>) {
        match step {
            Step::Header => {
                let lines = self.renderer.module_header(&self.root);
                if !lines.is_empty() {
                    self.pending.extend(lines);
                    self.pending.push_back(None);
                }
            }
            Step::Forwarded => self.forwarded(),
            Step::Namespace {
                name,
                types,
                separator,
            } => {
                debug!(namespace = name, types = types.len(), "rendering namespace");
                if separator {
                    self.pending.push_back(None);
                }
                self.pending
                    .extend(self.renderer.namespace_open(name, &self.root));
                let ctx = Rc::new(self.root.in_namespace(name));
                self.stack.push(Step::CloseNamespace { name, ctx: ctx.clone() });
                for (i, decl) in types.into_iter().enumerate().rev() {
                    self.stack.push(Step::Type {
                        decl,
                        ctx: ctx.clone(),
                        separator: i > 0,
                    });
                }
            }
            Step::Type {
                decl,
                ctx,
                separator,
            } => self.open_type(decl, ctx, separator),
            Step::Member { member, ctx } => {
                self.pending.extend(self.renderer.member(member, &ctx));
            }
            Step::CloseType { decl, ctx } => {
                self.pending.extend(self.renderer.type_close(decl, &ctx));
            }
            Step::CloseNamespace { name, ctx } => {
                let outer = ctx.with_depth(self.root.depth);
                self.pending
                    .extend(self.renderer.namespace_close(name, &outer));
            }
        }
    }

    fn forwarded(&mut self) {
        let module: &'w ModuleModel = self.root.module;
        let mut by_origin: BTreeMap<&'w str, Vec<&'w NamedType>> = BTreeMap::new();
        for exported in &module.exported_types {
            by_origin
                .entry(exported.origin_module.as_str())
                .or_default()
                .push(&exported.ty);
        }
        if by_origin.is_empty() {
            return;
        }
        for (origin, mut types) in by_origin {
            types.sort_by_key(|t| t.full_name());
            self.pending
                .extend(self.renderer.forwarded_types(origin, &types, &self.root));
        }
        self.pending.push_back(None);
    }

    fn open_type(&mut self, decl: &'w TypeDeclaration, ctx: Rc<RenderContext<'w>>, separator: bool) {
        debug!(type_name = %decl.name, kind = %decl.kind, "rendering type");
        if separator {
            self.pending.push_back(None);
        }
        self.pending.extend(self.renderer.type_open(decl, &ctx));

        let inner = Rc::new(ctx.enter(decl));
        self.stack.push(Step::CloseType { decl, ctx });
        if decl.kind == TypeKind::Delegate {
            return;
        }

        let include_internals = inner.options.include_internals;
        let mut nested: Vec<&'w TypeDeclaration> = decl
            .nested_types
            .iter()
            .filter(|t| is_listed(t, include_internals))
            .collect();
        sort_types(&mut nested);
        for nested_decl in nested.into_iter().rev() {
            self.stack.push(Step::Type {
                decl: nested_decl,
                ctx: inner.clone(),
                separator: false,
            });
        }

        let members = self.sorted_members(decl, &inner);
        for member in members.into_iter().rev() {
            self.stack.push(Step::Member {
                member,
                ctx: inner.clone(),
            });
        }
    }

    /// Visible members in output order, reporting identity collisions.
    fn sorted_members(&mut self, decl: &'w TypeDeclaration, ctx: &RenderContext<'w>) -> Vec<Member<'w>> {
        let include_internals = ctx.options.include_internals;
        let mut members: Vec<Member<'w>> = Vec::new();
        if decl.kind == TypeKind::Enum {
            members.extend(
                decl.fields
                    .iter()
                    .filter(|f| {
                        f.modifiers.contains(FieldModifiers::LITERAL)
                            && !f.modifiers.contains(FieldModifiers::SPECIAL_NAME)
                    })
                    .map(Member::Field),
            );
        } else {
            members.extend(decl.fields.iter().map(Member::Field));
            members.extend(decl.properties.iter().map(Member::Property));
            members.extend(decl.events.iter().map(Member::Event));
            members.extend(
                decl.methods
                    .iter()
                    .filter(|m| is_listed_method(m))
                    .map(Member::Method),
            );
            members.retain(|m| m.accessibility().is_visible(include_internals));
        }

        let mut keyed: Vec<(MemberSignature, Member<'w>)> = members
            .into_iter()
            .map(|m| (self.renderer.member_signature(m, ctx), m))
            .collect();
        // Enum members keep value order.
        if decl.kind == TypeKind::Enum {
            keyed.sort_by(|a, b| {
                let value = |m: &Member<'_>| match m {
                    Member::Field(f) => f.constant.as_ref().and_then(ConstantValue::as_integer),
                    _ => None,
                };
                value(&a.1)
                    .cmp(&value(&b.1))
                    .then_with(|| a.0.name.cmp(&b.0.name))
            });
        } else {
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
        }

        let mut seen: HashMap<(MemberKind, &str, usize, &[String]), usize> = HashMap::new();
        let mut collisions = Vec::new();
        for (signature, _) in &keyed {
            let key = (
                signature.kind,
                signature.name.as_str(),
                signature.generic_parameters.len(),
                signature.parameter_types.as_slice(),
            );
            let count = seen.entry(key).or_insert(0);
            *count += 1;
            if *count > 1 {
                collisions.push(signature.clone());
            }
        }
        for signature in collisions {
            let diagnostic = Diagnostic {
                type_name: qualified_type_name(ctx),
                message: format!("duplicate member {}", signature),
                signature,
            };
            warn!(type_name = %diagnostic.type_name, member = %diagnostic.signature, "member identity collision");
            self.diagnostics.push(diagnostic);
        }

        keyed.into_iter().map(|(_, m)| m).collect()
    }
}

impl<'w, R: EntityRenderer> Iterator for Lines<'w, R> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            let step = self.stack.pop()?;
            self.run(step);
        }
    }
}
