use crate::span::Span;
use std::cmp;
use thiserror::Error;

/// Fatal parse faults. Recoverable parser diagnostics use the same type but
/// are collected in the parser's error list instead of aborting.
#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("Unexpected token \"{found}\" at line {line}, col {column}; Expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        line: usize,
        column: usize,
        span: Span,
    },
    #[error("no expression can start with \"{found}\" at line {line}, col {column}")]
    NoPrefixParser {
        found: String,
        line: usize,
        column: usize,
        span: Span,
    },
    #[error("{message} at line {line}, col {column}")]
    IllegalToken {
        message: String,
        line: usize,
        column: usize,
        span: Span,
    },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::NoPrefixParser { span, .. }
            | ParseError::IllegalToken { span, .. } => *span,
        }
    }
}

/// Fatal evaluator faults. These terminate evaluation outright, unlike the
/// in-band `Value::Error` which propagates as data.
#[derive(Debug, Error, Clone)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero { span: Option<Span> },
    #[error("wrong number of arguments: expected {expected}, got {got}")]
    Arity {
        expected: usize,
        got: usize,
        span: Option<Span>,
    },
    #[error("{message}")]
    InvalidArgument { message: String },
    #[error("variable `{name}` already exists in this scope")]
    Redeclaration { name: String },
    #[error("variable `{name}` does not exist")]
    UndefinedName { name: String },
    #[error("cannot call a value of kind {kind}")]
    NotCallable {
        kind: &'static str,
        span: Option<Span>,
    },
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        index: i64,
        len: usize,
        span: Option<Span>,
    },
    #[error("cannot use a {kind} as a map key")]
    UnhashableKey { kind: &'static str },
}

impl RuntimeError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        RuntimeError::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            RuntimeError::DivisionByZero { span }
            | RuntimeError::Arity { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::IndexOutOfRange { span, .. } => *span,
            RuntimeError::InvalidArgument { .. }
            | RuntimeError::Redeclaration { .. }
            | RuntimeError::UndefinedName { .. }
            | RuntimeError::UnhashableKey { .. } => None,
        }
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;

pub fn format_parse_error(source: &str, error: &ParseError) -> String {
    format_with_span(source, Some(error.span()), &error.to_string())
}

pub fn format_diagnostic(source: &str, span: Option<Span>, message: &str) -> String {
    format_with_span(source, span, message)
}

fn format_with_span(source: &str, span: Option<Span>, message: &str) -> String {
    if let Some(span) = span {
        let line_str = line_at(source, span.line);
        let pointer_len = cmp::max(1, span.end.saturating_sub(span.start));
        let caret_offset = span.column.saturating_sub(1);
        let caret = format!(
            "{}{}",
            " ".repeat(caret_offset),
            "^".repeat(cmp::min(
                pointer_len,
                line_str.len().saturating_sub(caret_offset).max(1)
            ))
        );
        format!(
            "error: {message}\n --> line {}, column {}\n{:>4} | {}\n     | {}\n",
            span.line, span.column, span.line, line_str, caret
        )
    } else {
        format!("error: {message}")
    }
}

fn line_at(source: &str, line: usize) -> String {
    source
        .lines()
        .nth(line.saturating_sub(1))
        .unwrap_or("")
        .to_string()
}
