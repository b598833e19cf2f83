pub mod lexer;
mod parser;
pub mod types;

pub use parser::SourceParser;
pub use types::*;

use crate::error::ParseError;

/// Parses a complete source file holding one top-level type declaration.
pub fn parse(source: &str) -> Result<CompilationUnit, ParseError> {
    SourceParser::new(source)?.parse_compilation_unit()
}

/// Parses a single expression, such as `a.b().c()`.
pub fn parse_expression(source: &str) -> Result<Expression, ParseError> {
    SourceParser::new(source)?.parse_standalone_expression()
}

pub fn parse_statement(source: &str) -> Result<Statement, ParseError> {
    SourceParser::new(source)?.parse_standalone_statement()
}
