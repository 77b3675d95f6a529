use crate::source_location::Span;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for argument-expression parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("error[{error_code}]: {message} at column {}", .span.start_column)]
pub struct ParseError {
    pub span: Span,
    pub message: String,
    pub error_code: &'static str,
}

impl ParseError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            error_code: "E0000",
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.error_code = code;
        self
    }

    pub fn unexpected_token(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message).with_code("E0001")
    }

    pub fn invalid_expression(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message).with_code("E0002")
    }

    pub fn syntax_error(span: Span, message: impl Into<String>) -> Self {
        Self::new(span, message).with_code("E0003")
    }
}

/// Errors raised while reading a program document or its fields
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),

    #[error("instruction {opcode} is missing required argument `{argument}`")]
    MissingArgument {
        opcode: String,
        argument: &'static str,
    },

    #[error("malformed label `{0}`: expected `L<positive integer>` or `EXIT`")]
    MalformedLabel(String),

    #[error("malformed variable `{0}`: expected `y`, `x<n>` or `z<n>`")]
    MalformedVariable(String),

    #[error("invalid constant `{value}` in {opcode}: expected a natural number")]
    InvalidConstant { opcode: String, value: String },

    #[error("cannot read program document {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed program document")]
    Json(#[from] serde_json::Error),
}
