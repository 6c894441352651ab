use crate::ast::NodeId;
use crate::span::Span;
use std::result;
use thiserror::Error;

/// Translation-time failures. Any of these aborts lowering of the whole
/// program; there is no partial output.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum Error {
    #[error("unsupported assignment target `{kind}` at {span}")]
    #[diagnostic(code(gojs::unsupported_target))]
    UnsupportedTarget { kind: String, span: Span },

    #[error("unsupported expression `{kind}` at {span}")]
    #[diagnostic(code(gojs::unsupported_expr))]
    UnsupportedExpr { kind: String, span: Span },

    #[error("cannot range over `{ty}` at {span}")]
    #[diagnostic(code(gojs::unsupported_range))]
    UnsupportedRange { ty: String, span: Span },

    #[error("invalid assignment arity: {lhs} target(s), {rhs} value(s) at {span}")]
    #[diagnostic(code(gojs::invalid_arity))]
    InvalidArity { lhs: usize, rhs: usize, span: Span },

    #[error("malformed else branch `{kind}` at {span}")]
    #[diagnostic(code(gojs::malformed_if), help("an else branch must be a block or an if"))]
    MalformedElse { kind: &'static str, span: Span },

    #[error("missing type information for node {node} at {span}")]
    #[diagnostic(code(gojs::missing_type))]
    MissingType { node: NodeId, span: Span },

    #[error("{0}")]
    #[diagnostic(code(gojs::generic))]
    Generic(String),
}

impl Error {
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::UnsupportedTarget { span, .. }
            | Error::UnsupportedExpr { span, .. }
            | Error::UnsupportedRange { span, .. }
            | Error::InvalidArity { span, .. }
            | Error::MalformedElse { span, .. }
            | Error::MissingType { span, .. } => Some(*span),
            Error::Generic(_) => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn errors_report_kind_position_and_code() {
        let err = Error::UnsupportedTarget {
            kind: "call".to_string(),
            span: Span::new(1, 10, 14),
        };
        assert_eq!(
            err.to_string(),
            "unsupported assignment target `call` at 1:10-14"
        );
        assert_eq!(
            err.code().map(|code| code.to_string()).as_deref(),
            Some("gojs::unsupported_target")
        );
        assert_eq!(err.span(), Some(Span::new(1, 10, 14)));
    }

    #[test]
    fn eyre_reports_become_generic_errors() {
        let err: Error = eyre::eyre!("boom").into();
        assert!(matches!(err, Error::Generic(ref message) if message == "boom"));
        assert!(err.span().is_none());
    }
}
