//! Bytecode representation and compiler
//!
//! A compiled program is a forest of [`Code`] units, one per function body,
//! each holding a linear stream of stack-machine [`Operation`]s addressed by
//! index. Names and strings are interned into a single table shared by the
//! whole forest.

mod code;
mod compiler;
pub mod intern;
mod opcode;
mod serialize;

pub use code::{
    ClassMethod, Code, CompiledProgram, Declaration, EntryKind, FunctionKind, Handler,
    InstructionStream, MethodKind, Operand, Operation, Params, UnitId, UpdateFlags,
};
pub use compiler::{compile, Compiler, CompilerOptions};
pub use intern::{Interner, Symbol};
pub use opcode::Opcode;
