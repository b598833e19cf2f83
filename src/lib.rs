//! # apexfmt
//!
//! Parses Apex source into a typed syntax tree and renders it back as
//! canonically formatted text: one indentation unit per nesting level,
//! normalized spacing, and long method chains exploded one link per line.

pub mod config;
pub mod error;
pub mod parser;
pub mod renderer;

pub use config::{ConfigError, IndentStyle, RenderConfig};
pub use error::{FormatError, ParseError, RenderError, RenderResult};
pub use parser::{parse, parse_expression, parse_statement, CompilationUnit};
pub use renderer::{Render, RenderContext, SourceRenderer};

/// Parses `source` and renders it with `config`.
pub fn format_source(source: &str, config: &RenderConfig) -> Result<String, FormatError> {
    let unit = parse(source)?;
    Ok(SourceRenderer::new(config).render(&unit)?)
}

#[cfg(test)]
mod tests;
