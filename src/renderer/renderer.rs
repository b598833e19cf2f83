use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::parser::*;
use crate::renderer::traits::*;
use tracing::debug;

/// Top-level driver: renders a whole compilation unit into canonical source.
pub struct SourceRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> SourceRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    pub fn render(&self, unit: &CompilationUnit) -> RenderResult<String> {
        debug!(
            declaration = unit.declaration.name(),
            chain_threshold = self.config.chain_threshold,
            indent = ?self.config.indent_style,
            "rendering compilation unit"
        );

        let context = RenderContext::new(self.config);
        let mut output = unit.render(&context)?;
        output.push('\n');

        debug!(bytes = output.len(), lines = output.lines().count(), "rendered compilation unit");
        Ok(output)
    }

    /// Renders any node at the top level, without the trailing newline.
    pub fn render_fragment<T: Render + ?Sized>(&self, node: &T) -> RenderResult<String> {
        node.render(&RenderContext::new(self.config))
    }
}
