use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::renderer::components::IndentationHelper;

/// Per-call rendering state.
///
/// Fragments are rendered relative to their own first column. A nested body is
/// rendered with a context one level deeper and then shifted right by one unit,
/// so the depth a sibling sees never depends on what its neighbours rendered.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub depth: usize,
    pub config: &'a RenderConfig,
    /// Set inside call arguments, creator bodies and statement headers, where
    /// chains stay on one line whatever their length.
    pub inline_chains: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self {
            depth: 0,
            config,
            inline_chains: false,
        }
    }

    pub fn with_depth(&self, depth: usize) -> Self {
        Self { depth, ..*self }
    }

    pub fn inline(&self) -> Self {
        Self {
            inline_chains: true,
            ..*self
        }
    }

    /// Renders `body` one level deeper and indents every line of the result.
    pub fn with_indent<F>(&self, body: F) -> RenderResult<String>
    where
        F: FnOnce(&RenderContext<'a>) -> RenderResult<String>,
    {
        let nested = self.with_depth(self.depth + 1);
        let text = body(&nested)?;
        Ok(nested.indent_each_line(&text))
    }

    pub fn indent_unit(&self) -> String {
        self.config.indent_unit()
    }

    /// Prefixes every non-empty line of `text` with one indentation unit.
    pub fn indent_each_line(&self, text: &str) -> String {
        IndentationHelper::indent_each_line(text, &self.indent_unit())
    }
}

/// Core rendering trait for all syntax nodes
pub trait Render {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String>;
}

impl<T: Render + ?Sized> Render for Box<T> {
    fn render(&self, context: &RenderContext<'_>) -> RenderResult<String> {
        (**self).render(context)
    }
}
