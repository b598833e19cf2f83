use crate::error::{RenderError, RenderResult};
use crate::parser::*;
use crate::renderer::traits::{Render, RenderContext};

/// Helper for rendering modifier lists
pub struct ModifierRenderer;

impl ModifierRenderer {
    /// Source order, single spaces, and one trailing space only when non-empty.
    pub fn render_modifiers(&self, modifiers: &[Modifier]) -> String {
        if modifiers.is_empty() {
            return String::new();
        }
        let texts: Vec<&str> = modifiers.iter().map(Modifier::text).collect();
        format!("{} ", texts.join(" "))
    }
}

/// Helper for rendering type references
pub struct TypeRenderer;

impl TypeRenderer {
    pub fn render_type(&self, ty: &TypeRef) -> RenderResult<String> {
        if ty.segments.is_empty() {
            return Err(RenderError::missing(NodeKind::TypeRef, "type reference has no name segments"));
        }
        let segments = ty
            .segments
            .iter()
            .map(|segment| self.render_type_name(segment))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(format!("{}{}", segments.join("."), ty.array_suffix))
    }

    pub fn render_type_list(&self, types: &[TypeRef]) -> RenderResult<String> {
        let rendered = types
            .iter()
            .map(|ty| self.render_type(ty))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(rendered.join(", "))
    }

    fn render_type_name(&self, name: &TypeName) -> RenderResult<String> {
        if name.arguments.is_empty() {
            return Ok(name.name.clone());
        }
        Ok(format!("{}<{}>", name.name, self.render_type_list(&name.arguments)?))
    }
}

/// Helper for consistent indentation
pub struct IndentationHelper;

impl IndentationHelper {
    /// Prefixes each line with `unit`; blank lines stay empty.
    pub fn indent_each_line(text: &str, unit: &str) -> String {
        text.split('\n')
            .map(|line| {
                if line.trim().is_empty() {
                    String::new()
                } else {
                    format!("{}{}", unit, line)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `{`, the body shifted right by one level, `}`. An empty body gives `{\n}`.
    pub fn braced_body<'a, F>(context: &RenderContext<'a>, body: F) -> RenderResult<String>
    where
        F: FnOnce(&RenderContext<'a>) -> RenderResult<String>,
    {
        let inner = context.with_indent(body)?;
        if inner.is_empty() {
            Ok("{\n}".to_string())
        } else {
            Ok(format!("{{\n{}\n}}", inner))
        }
    }
}

/// Renders each item and joins the fragments with `separator`.
pub fn render_joined<T: Render>(
    items: &[T],
    context: &RenderContext<'_>,
    separator: &str,
) -> RenderResult<String> {
    let rendered = items
        .iter()
        .map(|item| item.render(context))
        .collect::<RenderResult<Vec<_>>>()?;
    Ok(rendered.join(separator))
}
