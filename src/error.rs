use crate::parser::{NodeKind, Span};
use thiserror::Error;

/// Malformed source text. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {span}: {message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Failure while rendering a tree. Any of these aborts the whole compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unsupported construct: {kind}{}", span.map(|s| format!(" at {}", s)).unwrap_or_default())]
    UnsupportedConstruct { kind: NodeKind, span: Option<Span> },
    #[error("internal invariant violated in {node}: {detail}")]
    InvariantViolation { node: NodeKind, detail: &'static str },
}

impl RenderError {
    pub fn unsupported(kind: NodeKind, span: Option<Span>) -> Self {
        RenderError::UnsupportedConstruct { kind, span }
    }

    pub fn missing(node: NodeKind, detail: &'static str) -> Self {
        RenderError::InvariantViolation { node, detail }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Error returned by [`crate::format_source`].
#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Render(#[from] RenderError),
}
