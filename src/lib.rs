//! esbc: a bytecode compiler for a dynamic, class-based scripting language
//!
//! esbc takes a syntax tree produced by an external ESTree-compatible parser
//! and lowers it into a forest of compilation units for a stack-based VM.
//! Each function body becomes its own unit; control flow is resolved to
//! absolute instruction addresses, including every non-local exit through
//! `finally` blocks, `with` scopes and iteration frames.
//!
//! # Quick Start
//!
//! ```no_run
//! use esbc::{compile, parse_program, CompilerOptions};
//!
//! fn main() -> esbc::Result<()> {
//!     let program = parse_program(r#"{ "type": "Program", "body": [] }"#)?;
//!     let compiled = compile(&program, CompilerOptions::new())?;
//!     println!("{}", compiled.disassemble());
//!     println!("{}", compiled.to_json_string(true)?);
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! The pipeline flows: JSON → [`ast`] → [`analysis`] → [`bytecode`] → JSON
//!
//! | Module | Role |
//! |--------|------|
//! | [`ast`] | Syntax tree types deserialized from ESTree JSON |
//! | [`analysis`] | Pure tree walks: bound names, lexical declarations, strictness |
//! | [`bytecode`] | Opcodes, compilation units, the compiler and the wire encoding |
//! | [`Error`] | Error taxonomy shared by every stage |

// Opcode and syntax variants carry their construct's name
#![allow(clippy::enum_variant_names)]
#![allow(clippy::new_without_default)]

pub mod analysis;
pub mod ast;
pub mod bytecode;
mod error;

pub use ast::Program;
pub use bytecode::{compile, CompiledProgram, CompilerOptions};
pub use error::{messages, Error, Result};

use std::path::Path;

/// esbc version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse an ESTree JSON document into a [`Program`]
pub fn parse_program(json: &str) -> Result<Program> {
    Program::from_json(json)
}

/// Read and parse an ESTree JSON file
pub fn load_program(path: impl AsRef<Path>) -> Result<Program> {
    let text = std::fs::read_to_string(path)?;
    parse_program(&text)
}
