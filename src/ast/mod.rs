//! Abstract Syntax Tree (AST) types
//!
//! The compiler does not parse source text. It consumes the ESTree-shaped
//! JSON produced by an external parser and deserializes it into the closed
//! set of node enums defined here. Every node kind is a variant, so the
//! emitter's matches are checked for exhaustiveness at build time.

mod expr;
mod pattern;
mod stmt;

pub use expr::*;
pub use pattern::*;
pub use stmt::*;

use serde::Deserialize;
use std::fmt;

/// A span in the source code, as byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct Span {
    /// Start offset
    #[serde(default)]
    pub start: usize,
    /// End offset
    #[serde(default)]
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A complete program
#[derive(Debug, Clone, Deserialize)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

impl Program {
    /// Deserialize a program from ESTree JSON text
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Deserialize a program from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// An identifier
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Identifier {
    /// The name
    pub name: String,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

impl Identifier {
    /// Create a new identifier
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}
