//! Compilation units and their instruction streams

use super::intern::{Interner, Symbol};
use super::opcode::Opcode;
use crate::analysis::DeclarationKind;
use crate::ast::Span;
use crate::error::{Error, Result};
use bitflags::bitflags;
use std::fmt;

/// Index of a unit in a [`CompiledProgram`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

impl UnitId {
    /// Arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit:{}", self.0)
    }
}

/// What kind of body a unit compiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FunctionKind {
    /// Global program
    Program = 0,
    /// Eval code
    Eval = 1,
    /// Ordinary function
    Function = 2,
    /// Class or object literal method
    Method = 3,
    /// Arrow function
    Arrow = 4,
}

impl FunctionKind {
    /// Wire tag
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Whether the unit finishes with COMPLETE instead of returning
    pub fn completes(self) -> bool {
        matches!(self, FunctionKind::Program | FunctionKind::Eval)
    }

    /// Lowercase name used in listings
    pub fn as_str(self) -> &'static str {
        match self {
            FunctionKind::Program => "program",
            FunctionKind::Eval => "eval",
            FunctionKind::Function => "function",
            FunctionKind::Method => "method",
            FunctionKind::Arrow => "arrow",
        }
    }
}

bitflags! {
    /// Operand of the UPDATE instruction
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct UpdateFlags: u8 {
        /// ++x rather than x++
        const PREFIX = 1;
        /// ++ rather than --
        const INCREMENT = 1 << 1;
    }
}

/// Kind of an entry region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryKind {
    /// Lexical scope (block or with)
    Env = 0,
    /// Exception protected range
    TryCatch = 1,
}

/// An address range the VM installs a scope or exception handler for
///
/// For `TryCatch` regions the instruction at `end` is the jump that skips
/// the handler, so the handler itself starts at `end + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handler {
    /// Region kind
    pub kind: EntryKind,
    /// First covered address
    pub begin: usize,
    /// One past the last covered address
    pub end: usize,
}

/// A lexical declaration as recorded on a unit or a BLOCK instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Declaration kind
    pub kind: DeclarationKind,
    /// Whether the binding is immutable
    pub is_constant: bool,
    /// Bound names
    pub bound_names: Vec<Symbol>,
    /// Unit of a hoisted function declaration
    pub code: Option<UnitId>,
}

/// Method kinds as they appear in METHOD and class operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Plain method
    Method,
    /// Getter
    Get,
    /// Setter
    Set,
}

impl MethodKind {
    /// Wire tag
    pub fn as_str(self) -> &'static str {
        match self {
            MethodKind::Method => "method",
            MethodKind::Get => "get",
            MethodKind::Set => "set",
        }
    }
}

/// One method of a class
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMethod {
    /// Method kind
    pub kind: MethodKind,
    /// Defined on the constructor rather than the prototype
    pub is_static: bool,
    /// Method body
    pub code: UnitId,
    /// Method name, None when the key is computed and evaluated on the stack
    pub name: Option<Symbol>,
}

/// An instruction operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Resolved jump target
    Address(usize),
    /// Forward jump awaiting its back-patch
    Pending,
    /// Boolean flag
    Flag(bool),
    /// Count, index or operator id
    Int(u32),
    /// Numeric literal
    Number(f64),
    /// Boolean literal
    Boolean(bool),
    /// Null literal or anonymous name
    Null,
    /// Interned identifier
    Name(Symbol),
    /// Interned string literal
    Str(Symbol),
    /// Regular expression source
    RegExp {
        /// Pattern
        pattern: Symbol,
        /// Flags
        flags: Symbol,
    },
    /// Nested compilation unit
    Unit(UnitId),
    /// Method kind tag
    Kind(MethodKind),
    /// Interned identifier list
    Names(Vec<Symbol>),
    /// Scope declarations
    Declarations(Vec<Declaration>),
    /// Class methods
    Methods(Vec<ClassMethod>),
}

/// One instruction: opcode plus up to four operands
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The opcode
    pub opcode: Opcode,
    /// Operands in slot order; trailing absent operands are omitted
    pub operands: Vec<Operand>,
}

impl Operation {
    /// Create an operation
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        debug_assert!(operands.len() <= opcode.arity(), "{} takes {} operands", opcode, opcode.arity());
        Self { opcode, operands }
    }

    /// Whether slot 0 still holds the jump placeholder
    pub fn is_unresolved(&self) -> bool {
        matches!(self.operands.first(), Some(Operand::Pending))
    }

    /// The resolved jump target, if this is a patched jump
    pub fn target(&self) -> Option<usize> {
        match self.operands.first() {
            Some(Operand::Address(addr)) if self.opcode.is_jump() => Some(*addr),
            _ => None,
        }
    }
}

/// Append-only instruction sequence of one unit
///
/// The only mutation after recording is [`InstructionStream::patch`],
/// which fills a jump placeholder exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstructionStream {
    ops: Vec<Operation>,
}

impl InstructionStream {
    /// Create an empty stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation, returning its address
    pub fn record(&mut self, opcode: Opcode, operands: Vec<Operand>) -> usize {
        self.ops.push(Operation::new(opcode, operands));
        self.ops.len() - 1
    }

    /// Address the next recorded operation will get
    #[inline]
    pub fn current(&self) -> usize {
        self.ops.len()
    }

    /// Fill the jump placeholder at `index` with `address`
    pub fn patch(&mut self, index: usize, address: usize) -> Result<()> {
        let op = self
            .ops
            .get_mut(index)
            .ok_or_else(|| Error::internal(format!("patch of missing instruction {}", index)))?;
        if !op.opcode.is_jump() || !op.is_unresolved() {
            return Err(Error::internal(format!(
                "instruction {} ({}) is not an unresolved jump",
                index, op.opcode
            )));
        }
        op.operands[0] = Operand::Address(address);
        Ok(())
    }

    /// Address of the first jump still awaiting its patch
    pub fn first_unresolved(&self) -> Option<usize> {
        self.ops.iter().position(Operation::is_unresolved)
    }

    /// Operation at `index`
    pub fn get(&self, index: usize) -> Option<&Operation> {
        self.ops.get(index)
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no operation was recorded
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over operations in address order
    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.ops.iter()
    }

    /// Last recorded operation
    pub fn last(&self) -> Option<&Operation> {
        self.ops.last()
    }
}

/// Parameter descriptor of a unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    /// One formal name per parameter; destructured parameters get a
    /// synthetic name their prologue reads from
    pub formals: Vec<Symbol>,
    /// Every name bound by the parameter list
    pub bound_names: Vec<Symbol>,
    /// Rest parameter name
    pub rest: Option<Symbol>,
    /// Required arity
    pub expected_argument_count: usize,
}

/// A compilation unit: one function, method, arrow, eval or program body
#[derive(Debug, Clone)]
pub struct Code {
    /// Arena index
    pub id: UnitId,
    /// Body kind
    pub kind: FunctionKind,
    /// Function or method name
    pub name: Option<Symbol>,
    /// Root of the compiled forest
    pub is_top_level: bool,
    /// Declarations bind on the global object
    pub is_global: bool,
    /// Strict mode, from a directive or inherited from the parent
    pub strict: bool,
    /// The body references its superclass binding
    pub needs_super_binding: bool,
    /// Privileged native bindings are visible
    pub natives: bool,
    /// Parameter descriptor
    pub params: Params,
    /// Hoisted var names, one entry per declarator occurrence
    pub var_declared_names: Vec<Symbol>,
    /// Lexical declarations of the body scope
    pub lexical_declarations: Vec<Declaration>,
    /// Instruction stream
    pub instructions: InstructionStream,
    /// Scope and exception regions
    pub entry_regions: Vec<Handler>,
    /// Directly nested units, in discovery order
    pub children: Vec<UnitId>,
    /// Span of the body in source
    pub span: Span,
}

impl Code {
    pub(crate) fn new(id: UnitId, kind: FunctionKind, span: Span) -> Self {
        Self {
            id,
            kind,
            name: None,
            is_top_level: false,
            is_global: false,
            strict: false,
            needs_super_binding: false,
            natives: false,
            params: Params::default(),
            var_declared_names: Vec::new(),
            lexical_declarations: Vec::new(),
            instructions: InstructionStream::new(),
            entry_regions: Vec::new(),
            children: Vec::new(),
            span,
        }
    }
}

/// The compiled forest: every unit, the root, and the identifier table
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub(crate) units: Vec<Code>,
    pub(crate) root: UnitId,
    pub(crate) interner: Interner,
}

impl CompiledProgram {
    /// The root unit
    pub fn root(&self) -> &Code {
        &self.units[self.root.index()]
    }

    /// A unit by id
    pub fn unit(&self, id: UnitId) -> &Code {
        &self.units[id.index()]
    }

    /// All units in creation order
    pub fn units(&self) -> &[Code] {
        &self.units
    }

    /// Identifier table, in symbol order
    pub fn identifiers(&self) -> &[String] {
        self.interner.strings()
    }

    /// Resolve a symbol to its text
    pub fn resolve(&self, symbol: Symbol) -> &str {
        self.interner.resolve(symbol)
    }

    /// Look up the symbol of an identifier, if it was interned
    pub fn symbol(&self, name: &str) -> Option<Symbol> {
        self.interner.get(name)
    }

    /// Resolve a list of symbols
    pub fn names(&self, symbols: &[Symbol]) -> Vec<&str> {
        symbols.iter().map(|s| self.resolve(*s)).collect()
    }

    /// One line per instruction of a unit, e.g. `0004  IFEQ             9, false`
    pub fn listing(&self, id: UnitId) -> Vec<String> {
        self.unit(id)
            .instructions
            .iter()
            .enumerate()
            .map(|(addr, op)| self.format_operation(addr, op))
            .collect()
    }

    /// Listing of the first unit with the given name
    pub fn listing_of(&self, name: &str) -> Option<Vec<String>> {
        self.units
            .iter()
            .find(|code| code.name.map(|n| self.resolve(n)) == Some(name))
            .map(|code| self.listing(code.id))
    }

    /// Human-readable listing of every unit
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for code in &self.units {
            let name = code.name.map(|n| self.resolve(n)).unwrap_or("<anonymous>");
            out.push_str(&format!("== {} {} ({}) ==\n", code.id, name, code.kind.as_str()));
            for region in &code.entry_regions {
                out.push_str(&format!(
                    "   ; {:?} [{}, {})\n",
                    region.kind, region.begin, region.end
                ));
            }
            for line in self.listing(code.id) {
                out.push_str(&line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }

    fn format_operation(&self, addr: usize, op: &Operation) -> String {
        let operands: Vec<String> = op.operands.iter().map(|o| self.format_operand(o)).collect();
        let line = format!("{:04}  {:<16} {}", addr, op.opcode.name(), operands.join(", "));
        line.trim_end().to_string()
    }

    fn format_operand(&self, operand: &Operand) -> String {
        match operand {
            Operand::Address(addr) => addr.to_string(),
            Operand::Pending => "?".to_string(),
            Operand::Flag(b) | Operand::Boolean(b) => b.to_string(),
            Operand::Int(n) => n.to_string(),
            Operand::Number(n) => n.to_string(),
            Operand::Null => "null".to_string(),
            Operand::Name(s) => self.resolve(*s).to_string(),
            Operand::Str(s) => format!("{:?}", self.resolve(*s)),
            Operand::RegExp { pattern, flags } => {
                format!("/{}/{}", self.resolve(*pattern), self.resolve(*flags))
            }
            Operand::Unit(id) => id.to_string(),
            Operand::Kind(kind) => kind.as_str().to_string(),
            Operand::Names(names) => format!("[{}]", self.names(names).join(" ")),
            Operand::Declarations(decls) => {
                let parts: Vec<String> = decls
                    .iter()
                    .map(|d| {
                        let mut part = format!("{} {}", d.kind.as_str(), self.names(&d.bound_names).join(" "));
                        if let Some(code) = d.code {
                            part.push_str(&format!(" {}", code));
                        }
                        part
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
            Operand::Methods(methods) => {
                let parts: Vec<String> = methods
                    .iter()
                    .map(|m| {
                        let name = m.name.map(|n| self.resolve(n)).unwrap_or("[computed]");
                        let prefix = if m.is_static { "static " } else { "" };
                        format!("{}{} {} {}", prefix, m.kind.as_str(), name, m.code)
                    })
                    .collect();
                format!("[{}]", parts.join(", "))
            }
        }
    }
}
