//! Error types for the esbc compiler

use crate::ast::Span;
use thiserror::Error;

/// Compiler error type
///
/// Every variant aborts the whole compilation call; no partially emitted
/// unit is ever returned alongside an error.
#[derive(Error, Debug)]
pub enum Error {
    /// Structurally invalid input: a super reference outside a method,
    /// a spread where none is allowed, an invalid assignment target
    #[error("SyntaxError: {message} at {span}")]
    StructuralError {
        message: String,
        span: Span,
    },

    /// Label resolution error: duplicate or undefined label, or a
    /// break/continue with no legal target
    #[error("SyntaxError: {message} at {span}")]
    LabelError {
        message: String,
        span: Span,
    },

    /// Compiler invariant violation (a bug in the compiler, not the input)
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error while loading a syntax tree
    #[error("IOError: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    /// Syntax tree input that does not match the expected node shapes
    #[error("InputError: {source}")]
    InputError {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a new structural error
    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        Error::StructuralError {
            message: message.into(),
            span,
        }
    }

    /// Create a new label error
    pub fn label(message: impl Into<String>, span: Span) -> Self {
        Error::LabelError {
            message: message.into(),
            span,
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::InternalError(message.into())
    }

    /// Source span the error points at, if it came from user input
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::StructuralError { span, .. } | Error::LabelError { span, .. } => Some(*span),
            _ => None,
        }
    }
}

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized error message templates
pub mod messages {
    /// Super reference outside a method
    pub fn illegal_super() -> String {
        "'super' keyword unexpected here".to_string()
    }

    /// Label already active
    pub fn duplicate_label(label: &str) -> String {
        format!("Label '{}' has already been declared", label)
    }

    /// Break/continue naming a label that is not active
    pub fn undefined_label(label: &str) -> String {
        format!("Undefined label '{}'", label)
    }

    /// Continue naming a label that does not belong to a loop
    pub fn illegal_continue(label: &str) -> String {
        format!("Illegal continue statement: '{}' does not denote an iteration statement", label)
    }

    /// Invalid assignment or update target
    pub fn invalid_target(kind: &str) -> String {
        format!("Invalid left-hand side in {}", kind)
    }
}
