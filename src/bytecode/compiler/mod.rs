//! Bytecode compiler
//!
//! Compiles syntax trees into a forest of compilation units. The
//! [`Compiler`] owns the unit arena, the identifier table and a FIFO
//! worklist of discovered bodies. Each dequeued unit is walked exactly once
//! by an [`Emitter`], which carries that unit's control-flow stacks; nested
//! functions found during the walk are queued, never compiled recursively.

mod class;
mod control;
mod expr;
mod pattern;
mod stmt;

use super::code::*;
use super::intern::{Interner, Symbol};
use super::opcode::Opcode;
use crate::analysis::{self, BoundNames};
use crate::ast::*;
use crate::error::{Error, Result};
use control::{ControlEntry, Level};
use serde::Deserialize;
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Options recognized by [`compile`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Compile the root as eval code
    pub eval: bool,
    /// The root is the function expression in the program's first statement
    pub function: bool,
    /// Do not mark the root as global code
    pub scoped: bool,
    /// The root may reference privileged native bindings
    pub natives: bool,
}

impl CompilerOptions {
    /// Default options: a global program
    pub fn new() -> Self {
        Self::default()
    }

    /// Set eval mode
    pub fn with_eval(mut self, eval: bool) -> Self {
        self.eval = eval;
        self
    }

    /// Set function mode
    pub fn with_function(mut self, function: bool) -> Self {
        self.function = function;
        self
    }

    /// Set scoped mode
    pub fn with_scoped(mut self, scoped: bool) -> Self {
        self.scoped = scoped;
        self
    }

    /// Set natives mode
    pub fn with_natives(mut self, natives: bool) -> Self {
        self.natives = natives;
        self
    }
}

/// Compile a program into a unit forest
pub fn compile(program: &Program, options: CompilerOptions) -> Result<CompiledProgram> {
    Compiler::new(options).compile(program)
}

/// Syntax a pending unit compiles
#[derive(Debug, Clone, Copy)]
enum UnitBody<'a> {
    Program(&'a Program),
    Function(&'a Function),
}

/// A discovered unit waiting on the worklist
#[derive(Debug)]
struct PendingUnit<'a> {
    id: UnitId,
    body: UnitBody<'a>,
    /// super references are legal in this body
    super_allowed: bool,
    /// Function declarations of the body scope, by declaration index
    hoisted: Vec<(usize, &'a Function)>,
}

/// Compiler state shared by every unit of one compilation
pub struct Compiler<'a> {
    options: CompilerOptions,
    units: Vec<Code>,
    interner: Interner,
    worklist: VecDeque<PendingUnit<'a>>,
}

impl<'a> Compiler<'a> {
    /// Create a new compiler
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            units: Vec::new(),
            interner: Interner::new(),
            worklist: VecDeque::new(),
        }
    }

    /// Compile a program, draining the worklist until every unit is emitted
    pub fn compile(mut self, program: &'a Program) -> Result<CompiledProgram> {
        let root = self.create_root(program)?;

        while let Some(pending) = self.worklist.pop_front() {
            let id = pending.id;
            Emitter::new(&mut self, &pending).compile_unit(&pending)?;
            let code = &self.units[id.index()];
            debug!(
                unit = id.index(),
                kind = code.kind.as_str(),
                ops = code.instructions.len(),
                pending = self.worklist.len(),
                "compiled unit"
            );
        }

        Ok(CompiledProgram {
            units: self.units,
            root,
            interner: self.interner,
        })
    }

    fn create_root(&mut self, program: &'a Program) -> Result<UnitId> {
        let options = self.options;
        let root = if options.function {
            let func = root_function(program)?;
            let kind = match program.body.first() {
                Some(Statement::Expression(ExpressionStatement {
                    expression: Expression::Arrow(_),
                    ..
                })) => FunctionKind::Arrow,
                _ => FunctionKind::Function,
            };
            self.create_unit(UnitBody::Function(func), kind, func.name(), None, false)
        } else {
            let kind = if options.eval {
                FunctionKind::Eval
            } else {
                FunctionKind::Program
            };
            self.create_unit(UnitBody::Program(program), kind, None, None, false)
        };

        let code = &mut self.units[root.index()];
        code.is_top_level = true;
        code.is_global = !options.scoped;
        code.natives = options.natives;
        Ok(root)
    }

    /// Intern a name into the top-level identifier table
    fn intern(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    /// Build a unit for `body`, compute its static attributes and queue it
    fn create_unit(
        &mut self,
        body: UnitBody<'a>,
        kind: FunctionKind,
        name: Option<&str>,
        parent: Option<UnitId>,
        super_allowed: bool,
    ) -> UnitId {
        let id = UnitId(self.units.len());
        let (statements, span) = match body {
            UnitBody::Program(program) => (program.body.as_slice(), program.span),
            UnitBody::Function(func) => (func.body_statements(), func.span),
        };

        let mut code = Code::new(id, kind, span);
        code.name = name.map(|n| self.intern(n));
        code.strict = parent.is_some_and(|p| self.units[p.index()].strict) || analysis::is_strict(statements);

        if let UnitBody::Function(func) = body {
            code.needs_super_binding = analysis::references_super(func);
            code.params = self.params(&func.params);
        }

        let mut hoisted = Vec::new();
        for (index, decl) in analysis::lexical_declarations(statements).into_iter().enumerate() {
            if let Some(func) = decl.function {
                hoisted.push((index, func));
            }
            let bound_names = decl.bound_names.iter().map(|n| self.intern(n)).collect();
            code.lexical_declarations.push(Declaration {
                kind: decl.kind,
                is_constant: decl.is_constant,
                bound_names,
                code: None,
            });
        }

        self.units.push(code);
        if let Some(parent) = parent {
            self.units[parent.index()].children.push(id);
        }

        trace!(unit = id.index(), kind = kind.as_str(), ?parent, "queued unit");
        self.worklist.push_back(PendingUnit {
            id,
            body,
            super_allowed,
            hoisted,
        });
        id
    }

    fn params(&mut self, params: &[Pattern]) -> Params {
        let mut formals = Vec::new();
        let mut rest = None;

        for (index, param) in params.iter().enumerate() {
            match param {
                Pattern::Rest(r) => {
                    let name = match &r.argument {
                        Pattern::Identifier(id) => id.name.clone(),
                        _ => rest_formal(),
                    };
                    rest = Some(self.intern(&name));
                }
                _ => {
                    let name = formal_name(param, index);
                    formals.push(self.intern(&name));
                }
            }
        }

        let bound_names = params
            .bound_names()
            .into_iter()
            .map(|n| self.intern(n))
            .collect();

        Params {
            formals,
            bound_names,
            rest,
            expected_argument_count: analysis::expected_argument_count(params),
        }
    }
}

/// The function expression a `function` compile is rooted at
fn root_function(program: &Program) -> Result<&Function> {
    match program.body.first() {
        Some(Statement::Expression(ExpressionStatement {
            expression: Expression::Function(func) | Expression::Arrow(func),
            ..
        })) => Ok(func),
        Some(other) => Err(Error::structural(
            "function compile requires a function expression statement",
            other.span(),
        )),
        None => Err(Error::structural(
            "function compile requires a function expression statement",
            program.span,
        )),
    }
}

/// Formal name of a non-rest parameter; destructured ones get a synthetic name
fn formal_name(param: &Pattern, index: usize) -> String {
    match param {
        Pattern::Identifier(id) => id.name.clone(),
        Pattern::Assignment(a) => match &a.left {
            Pattern::Identifier(id) => id.name.clone(),
            _ => format!("%arg{}", index),
        },
        _ => format!("%arg{}", index),
    }
}

fn rest_formal() -> String {
    "%rest".to_string()
}

/// How a destructuring leaf or declaration stores its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingMode {
    /// var binding
    Var,
    /// let binding
    Let,
    /// const binding
    Const,
    /// Store through a reference (plain assignment, parameters)
    Assign,
}

impl From<VariableKind> for BindingMode {
    fn from(kind: VariableKind) -> Self {
        match kind {
            VariableKind::Var => BindingMode::Var,
            VariableKind::Let => BindingMode::Let,
            VariableKind::Const => BindingMode::Const,
        }
    }
}

/// Per-unit emission state
///
/// Control entries, unwind levels and pending labels never outlive the
/// unit: nested function bodies start with empty stacks.
pub(crate) struct Emitter<'c, 'a> {
    compiler: &'c mut Compiler<'a>,
    unit: UnitId,
    kind: FunctionKind,
    super_allowed: bool,
    jumps: Vec<ControlEntry<'a>>,
    levels: Vec<Level>,
    labels: Vec<&'a str>,
}

impl<'c, 'a> Emitter<'c, 'a> {
    fn new(compiler: &'c mut Compiler<'a>, pending: &PendingUnit<'a>) -> Self {
        let kind = compiler.units[pending.id.index()].kind;
        Self {
            compiler,
            unit: pending.id,
            kind,
            super_allowed: pending.super_allowed,
            jumps: Vec::new(),
            levels: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn compile_unit(mut self, pending: &PendingUnit<'a>) -> Result<()> {
        // Hoisted function declarations of the body scope
        for &(index, func) in &pending.hoisted {
            let child = self.queue_function(func, FunctionKind::Function);
            self.code_mut().lexical_declarations[index].code = Some(child);
        }

        match pending.body {
            UnitBody::Program(program) => {
                self.record(Opcode::Run, vec![]);
                self.compile_statements(&program.body)?;
            }
            UnitBody::Function(func) => {
                self.compile_prologue(func)?;
                match &func.body {
                    FunctionBody::Block(block) => self.compile_statements(&block.body)?,
                    FunctionBody::Expression(expr) => {
                        self.compile_value(expr)?;
                        self.record(Opcode::Return, vec![]);
                    }
                }
            }
        }

        if self.kind.completes() {
            self.record(Opcode::Complete, vec![]);
        } else {
            self.record(Opcode::Undefined, vec![]);
            self.record(Opcode::Return, vec![]);
        }

        self.finish()
    }

    /// Check that every construct closed cleanly and every jump was patched
    fn finish(&self) -> Result<()> {
        if !self.jumps.is_empty() || !self.levels.is_empty() || !self.labels.is_empty() {
            return Err(Error::internal(format!(
                "unit {} finished with {} control entries, {} levels, {} pending labels",
                self.unit.index(),
                self.jumps.len(),
                self.levels.len(),
                self.labels.len()
            )));
        }
        if let Some(addr) = self.code().instructions.first_unresolved() {
            return Err(Error::internal(format!(
                "unit {} finished with an unpatched jump at {}",
                self.unit.index(),
                addr
            )));
        }
        Ok(())
    }

    /// Lower default values and destructured parameters into instructions
    fn compile_prologue(&mut self, func: &'a Function) -> Result<()> {
        let formals = self.code().params.formals.clone();
        let rest = self.code().params.rest;
        let mut formal_index = 0;

        for param in &func.params {
            let (target, default, formal) = match param {
                Pattern::Rest(r) => match (&r.argument, rest) {
                    (Pattern::Identifier(_), _) | (_, None) => continue,
                    (pattern, Some(rest)) => (pattern, None, rest),
                },
                Pattern::Assignment(a) => {
                    let formal = formals[formal_index];
                    formal_index += 1;
                    (&a.left, Some(&a.right), formal)
                }
                Pattern::Identifier(_) => {
                    formal_index += 1;
                    continue;
                }
                other => {
                    let formal = formals[formal_index];
                    formal_index += 1;
                    (other, None, formal)
                }
            };

            self.record(Opcode::Resolve, vec![Operand::Name(formal)]);
            self.record(Opcode::Get, vec![]);
            if let Some(default) = default {
                self.compile_default(default)?;
            }
            self.compile_binding(target, BindingMode::Assign)?;
        }
        Ok(())
    }

    // ========== Unit access ==========

    fn code(&self) -> &Code {
        &self.compiler.units[self.unit.index()]
    }

    fn code_mut(&mut self) -> &mut Code {
        &mut self.compiler.units[self.unit.index()]
    }

    fn intern(&mut self, name: &str) -> Symbol {
        self.compiler.intern(name)
    }

    /// Queue a nested function body as a child of this unit
    fn queue_function(&mut self, func: &'a Function, kind: FunctionKind) -> UnitId {
        let super_allowed = match kind {
            FunctionKind::Method => true,
            FunctionKind::Arrow => self.super_allowed,
            _ => false,
        };
        self.compiler.create_unit(
            UnitBody::Function(func),
            kind,
            func.name(),
            Some(self.unit),
            super_allowed,
        )
    }

    /// Queue a method body under an explicit name
    fn queue_method(&mut self, func: &'a Function, name: Option<&str>) -> UnitId {
        self.compiler.create_unit(
            UnitBody::Function(func),
            FunctionKind::Method,
            name,
            Some(self.unit),
            true,
        )
    }

    // ========== Emission helpers ==========

    fn record(&mut self, opcode: Opcode, operands: Vec<Operand>) -> usize {
        self.code_mut().instructions.record(opcode, operands)
    }

    fn current(&self) -> usize {
        self.code().instructions.current()
    }

    /// Record a jump whose address is back-patched later
    fn emit_jump(&mut self, opcode: Opcode) -> usize {
        self.record(opcode, vec![Operand::Pending])
    }

    /// Record a conditional jump whose address is back-patched later
    fn emit_branch(&mut self, opcode: Opcode, flag: bool) -> usize {
        self.record(opcode, vec![Operand::Pending, Operand::Flag(flag)])
    }

    /// Point the jump at `addr` to the next instruction
    fn patch_jump(&mut self, addr: usize) -> Result<()> {
        let target = self.current();
        self.patch_jump_to(addr, target)
    }

    fn patch_jump_to(&mut self, addr: usize, target: usize) -> Result<()> {
        trace!(unit = self.unit.index(), addr, target, "patched jump");
        self.code_mut().instructions.patch(addr, target)
    }

    fn add_region(&mut self, kind: EntryKind, begin: usize, end: usize) {
        self.code_mut().entry_regions.push(Handler { kind, begin, end });
    }

    /// Lexical declarations for a BLOCK operand, queueing hoisted functions
    fn block_declarations(&mut self, decls: Vec<analysis::LexicalDeclaration<'a>>) -> Vec<Declaration> {
        decls
            .into_iter()
            .map(|decl| {
                let code = decl
                    .function
                    .map(|func| self.queue_function(func, FunctionKind::Function));
                let bound_names = decl.bound_names.iter().map(|n| self.intern(n)).collect();
                Declaration {
                    kind: decl.kind,
                    is_constant: decl.is_constant,
                    bound_names,
                    code,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn program(value: serde_json::Value) -> Program {
        Program::from_value(value).unwrap()
    }

    fn ident(name: &str) -> serde_json::Value {
        json!({ "type": "Identifier", "name": name })
    }

    fn func_decl(name: &str, body: serde_json::Value) -> serde_json::Value {
        json!({ "type": "FunctionDeclaration", "id": ident(name), "params": [],
                "body": { "type": "BlockStatement", "body": body } })
    }

    #[test]
    fn test_empty_program() {
        let compiled = compile(&program(json!({ "type": "Program", "body": [] })), CompilerOptions::new()).unwrap();
        let root = compiled.root();
        assert_eq!(root.kind, FunctionKind::Program);
        assert!(root.is_top_level);
        assert!(root.is_global);
        assert_eq!(compiled.listing(root.id), vec!["0000  RUN", "0001  COMPLETE"]);
    }

    #[test]
    fn test_options() {
        let p = program(json!({ "type": "Program", "body": [] }));
        let compiled = compile(&p, CompilerOptions::new().with_eval(true).with_scoped(true).with_natives(true)).unwrap();
        let root = compiled.root();
        assert_eq!(root.kind, FunctionKind::Eval);
        assert!(!root.is_global);
        assert!(root.natives);
    }

    #[test]
    fn test_options_from_json() {
        let options: CompilerOptions = serde_json::from_value(json!({ "eval": true })).unwrap();
        assert_eq!(options, CompilerOptions::new().with_eval(true));
    }

    #[test]
    fn test_worklist_is_breadth_first() {
        // function a() { function c() {} }  function b() {}
        let p = program(json!({ "type": "Program", "body": [
            func_decl("a", json!([func_decl("c", json!([]))])),
            func_decl("b", json!([]))
        ] }));
        let compiled = compile(&p, CompilerOptions::new()).unwrap();
        let names: Vec<_> = compiled
            .units()
            .iter()
            .map(|code| code.name.map(|n| compiled.resolve(n).to_string()))
            .collect();
        assert_eq!(
            names,
            vec![None, Some("a".to_string()), Some("b".to_string()), Some("c".to_string())]
        );
        assert_eq!(compiled.root().children, vec![UnitId(1), UnitId(2)]);
        assert_eq!(compiled.unit(UnitId(1)).children, vec![UnitId(3)]);
        assert_eq!(compiled.root().lexical_declarations[0].code, Some(UnitId(1)));
    }

    #[test]
    fn test_function_root() {
        let p = program(json!({ "type": "Program", "body": [
            { "type": "ExpressionStatement", "expression": {
                "type": "FunctionExpression", "id": ident("f"),
                "params": [ident("x")],
                "body": { "type": "BlockStatement", "body": [] } } }
        ] }));
        let compiled = compile(&p, CompilerOptions::new().with_function(true)).unwrap();
        let root = compiled.root();
        assert_eq!(root.kind, FunctionKind::Function);
        assert!(root.is_top_level);
        assert_eq!(compiled.names(&root.params.formals), vec!["x"]);
        assert_eq!(compiled.listing(root.id), vec!["0000  UNDEFINED", "0001  RETURN"]);
    }

    #[test]
    fn test_function_root_requires_function() {
        let p = program(json!({ "type": "Program", "body": [
            { "type": "ExpressionStatement", "expression": ident("x") }
        ] }));
        let err = compile(&p, CompilerOptions::new().with_function(true)).unwrap_err();
        assert!(matches!(err, Error::StructuralError { .. }));
    }

    #[test]
    fn test_strict_is_inherited() {
        let p = program(json!({ "type": "Program", "body": [
            { "type": "ExpressionStatement", "expression": { "type": "Literal", "value": "use strict" } },
            func_decl("f", json!([]))
        ] }));
        let compiled = compile(&p, CompilerOptions::new()).unwrap();
        assert!(compiled.root().strict);
        assert!(compiled.unit(UnitId(1)).strict);
    }

    #[test]
    fn test_params_descriptor() {
        let p = program(json!({ "type": "Program", "body": [
            { "type": "FunctionDeclaration", "id": ident("f"), "params": [
                ident("a"),
                { "type": "ArrayPattern", "elements": [ident("b")] },
                { "type": "AssignmentPattern", "left": ident("c"), "right": { "type": "Literal", "value": 1 } },
                { "type": "RestElement", "argument": ident("d") }
            ], "body": { "type": "BlockStatement", "body": [] } }
        ] }));
        let compiled = compile(&p, CompilerOptions::new()).unwrap();
        let params = &compiled.unit(UnitId(1)).params;
        assert_eq!(compiled.names(&params.formals), vec!["a", "%arg1", "c"]);
        assert_eq!(compiled.names(&params.bound_names), vec!["a", "b", "c", "d"]);
        assert_eq!(params.rest.map(|r| compiled.resolve(r)), Some("d"));
        assert_eq!(params.expected_argument_count, 2);
    }
}
