use crate::model::*;
use crate::renderer::renders::CSharpRenderer;
use crate::renderer::traits::*;

const FENCE_OPEN: &str = "```csharp";
const FENCE_CLOSE: &str = "```";

/// Documentation variant: headings per module and namespace, with every
/// declaration line produced by [`CSharpRenderer`] inside a fenced block.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    inner: CSharpRenderer,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn fenced(lines: Vec<Line>) -> Vec<Line> {
        let mut out = Vec::with_capacity(lines.len() + 2);
        out.push(Some(FENCE_OPEN.to_string()));
        out.extend(lines);
        out.push(Some(FENCE_CLOSE.to_string()));
        out
    }
}

impl EntityRenderer for MarkdownRenderer {
    fn module_header(&self, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = vec![Some(format!("# {}", ctx.module.name))];
        let attributes = self.inner.module_header(ctx);
        if !attributes.is_empty() {
            lines.push(None);
            lines.extend(Self::fenced(attributes));
        }
        lines
    }

    fn forwarded_types(
        &self,
        origin: &str,
        types: &[&NamedType],
        ctx: &RenderContext<'_>,
    ) -> Vec<Line> {
        Self::fenced(self.inner.forwarded_types(origin, types, ctx))
    }

    fn namespace_open(&self, namespace: &str, ctx: &RenderContext<'_>) -> Vec<Line> {
        let heading = if namespace.is_empty() {
            "## (global namespace)".to_string()
        } else {
            format!("## {}", namespace)
        };
        let mut lines = vec![Some(heading), None, Some(FENCE_OPEN.to_string())];
        lines.extend(self.inner.namespace_open(namespace, ctx));
        lines
    }

    fn namespace_close(&self, namespace: &str, ctx: &RenderContext<'_>) -> Vec<Line> {
        let mut lines = self.inner.namespace_close(namespace, ctx);
        lines.push(Some(FENCE_CLOSE.to_string()));
        lines
    }

    fn type_open(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        self.inner.type_open(decl, ctx)
    }

    fn type_close(&self, decl: &TypeDeclaration, ctx: &RenderContext<'_>) -> Vec<Line> {
        self.inner.type_close(decl, ctx)
    }

    fn member_signature(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> MemberSignature {
        self.inner.member_signature(member, ctx)
    }

    fn member(&self, member: Member<'_>, ctx: &RenderContext<'_>) -> Vec<Line> {
        self.inner.member(member, ctx)
    }
}
