//! Bytecode opcodes
//!
//! Every opcode has a stable numeric id, a fixed operand arity and a
//! mnemonic. All three are part of the wire format read by the VM and
//! must never be renumbered.

use std::fmt;

/// Bytecode opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // ========== Literals & Objects ==========
    /// Push a new array and its element cursor
    Array = 0,
    /// Drop the element cursor, leaving the array
    ArrayDone = 1,

    // ========== Operators ==========
    /// Apply a binary operator
    /// Operands: operator id
    Binary = 2,

    // ========== Scopes ==========
    /// Enter a lexical scope
    /// Operands: declarations
    Block = 3,
    /// Leave the innermost lexical or with scope
    BlockExit = 4,

    // ========== Calls ==========
    /// Call a function
    /// Operands: argument count
    Call = 5,

    // ========== Control Flow ==========
    /// Switch dispatch on a matching case
    /// Operands: address
    Case = 6,

    // ========== Classes ==========
    /// Declare a class binding
    /// Operands: name, has superclass, methods, constructor
    ClassDecl = 7,
    /// Push a class
    /// Operands: name, has superclass, methods, constructor
    ClassExpr = 8,

    // ========== Bindings ==========
    /// Initialize a const binding
    /// Operands: name
    Const = 9,

    /// Call a constructor
    /// Operands: argument count
    Construct = 10,
    /// Debugger statement
    Debugger = 11,
    /// Switch dispatch to the default case
    /// Operands: address
    Default = 12,
    /// Duplicate the top value
    Dup = 13,
    /// Computed member reference
    Element = 14,
    /// Create a closure
    /// Operands: name, unit
    Function = 15,
    /// Dereference the top value
    Get = 16,
    /// Pop and jump when truthiness equals the flag
    /// Operands: address, flag
    IfEq = 17,
    /// Jump keeping the value when truthiness equals the flag, else pop
    /// Operands: address, flag
    IfNe = 18,
    /// Append to the array under construction
    /// Operands: empty flag, spread flag
    Index = 19,
    /// Call a finally subroutine
    /// Operands: address, is-return flag
    Jsr = 20,
    /// Unconditional jump
    /// Operands: address
    Jump = 21,
    /// Initialize a let binding
    /// Operands: name
    Let = 22,
    /// Push a primitive literal
    /// Operands: value
    Literal = 23,
    /// Named member reference
    /// Operands: name
    Member = 24,
    /// Define an accessor or method
    /// Operands: kind, unit, name
    Method = 25,
    /// Push a new object
    Object = 26,
    /// Pop the top value
    Pop = 27,
    /// Pop into the completion value
    Save = 28,
    /// Pop several values
    /// Operands: count
    PopN = 29,
    /// Define a data property
    /// Operands: name
    Property = 30,
    /// Store through a reference
    Put = 31,
    /// Push a regular expression
    /// Operands: pattern and flags
    RegExp = 32,
    /// Resolve an identifier reference
    /// Operands: name
    Resolve = 33,
    /// Return from the unit
    Return = 34,
    /// Finish a global or eval unit with its completion value
    Complete = 35,
    /// Program prologue
    Run = 36,
    /// Move the top value down the stack
    /// Operands: depth
    Rotate = 37,
    /// Push the super constructor reference
    SuperCall = 38,
    /// Computed super member reference
    SuperElement = 39,
    /// Check that a super binding exists
    SuperGuard = 40,
    /// Named super member reference
    /// Operands: name
    SuperMember = 41,
    /// Push this
    This = 42,
    /// Throw the top value
    Throw = 43,
    /// Apply a unary operator
    /// Operands: operator id
    Unary = 44,
    /// Push undefined
    Undefined = 45,
    /// Increment or decrement a reference
    /// Operands: update flags
    Update = 46,
    /// Initialize a var binding
    /// Operands: name
    Var = 47,
    /// Push an object environment
    With = 48,
    /// Resolve a privileged native binding
    /// Operands: name
    NativeResolve = 49,
    /// Start enumerating property keys
    Enum = 50,
    /// Advance the iterator on top of the stack
    /// Operands: exit address
    Next = 51,
    /// Push a string
    /// Operands: interned string
    String = 52,

    // ========== Destructuring & Iteration ==========
    /// Collect the remaining elements of an array-like
    /// Operands: start index
    ArrayRest = 53,
    /// Copy an object without the listed keys
    /// Operands: excluded keys
    ObjectRest = 54,
    /// Start the iteration protocol
    Iterate = 55,
    /// Return from a finally subroutine
    Ret = 56,
}

impl Opcode {
    /// All opcodes in id order
    pub const ALL: [Opcode; 57] = [
        Opcode::Array,
        Opcode::ArrayDone,
        Opcode::Binary,
        Opcode::Block,
        Opcode::BlockExit,
        Opcode::Call,
        Opcode::Case,
        Opcode::ClassDecl,
        Opcode::ClassExpr,
        Opcode::Const,
        Opcode::Construct,
        Opcode::Debugger,
        Opcode::Default,
        Opcode::Dup,
        Opcode::Element,
        Opcode::Function,
        Opcode::Get,
        Opcode::IfEq,
        Opcode::IfNe,
        Opcode::Index,
        Opcode::Jsr,
        Opcode::Jump,
        Opcode::Let,
        Opcode::Literal,
        Opcode::Member,
        Opcode::Method,
        Opcode::Object,
        Opcode::Pop,
        Opcode::Save,
        Opcode::PopN,
        Opcode::Property,
        Opcode::Put,
        Opcode::RegExp,
        Opcode::Resolve,
        Opcode::Return,
        Opcode::Complete,
        Opcode::Run,
        Opcode::Rotate,
        Opcode::SuperCall,
        Opcode::SuperElement,
        Opcode::SuperGuard,
        Opcode::SuperMember,
        Opcode::This,
        Opcode::Throw,
        Opcode::Unary,
        Opcode::Undefined,
        Opcode::Update,
        Opcode::Var,
        Opcode::With,
        Opcode::NativeResolve,
        Opcode::Enum,
        Opcode::Next,
        Opcode::String,
        Opcode::ArrayRest,
        Opcode::ObjectRest,
        Opcode::Iterate,
        Opcode::Ret,
    ];

    /// Stable wire id
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by wire id
    pub fn from_id(id: u8) -> Option<Opcode> {
        Self::ALL.get(id as usize).copied()
    }

    /// Number of operand slots
    pub fn arity(self) -> usize {
        match self {
            Opcode::ClassDecl | Opcode::ClassExpr => 4,
            Opcode::Method => 3,
            Opcode::Function
            | Opcode::IfEq
            | Opcode::IfNe
            | Opcode::Index
            | Opcode::Jsr => 2,
            Opcode::Binary
            | Opcode::Block
            | Opcode::Call
            | Opcode::Case
            | Opcode::Const
            | Opcode::Construct
            | Opcode::Default
            | Opcode::Jump
            | Opcode::Let
            | Opcode::Literal
            | Opcode::Member
            | Opcode::PopN
            | Opcode::Property
            | Opcode::RegExp
            | Opcode::Resolve
            | Opcode::Rotate
            | Opcode::SuperMember
            | Opcode::Unary
            | Opcode::Update
            | Opcode::Var
            | Opcode::NativeResolve
            | Opcode::Next
            | Opcode::String
            | Opcode::ArrayRest
            | Opcode::ObjectRest => 1,
            _ => 0,
        }
    }

    /// Whether operand slot 0 is a jump address filled in by back-patching
    pub fn is_jump(self) -> bool {
        matches!(
            self,
            Opcode::Case
                | Opcode::Default
                | Opcode::IfEq
                | Opcode::IfNe
                | Opcode::Jsr
                | Opcode::Jump
                | Opcode::Next
        )
    }

    /// Get the opcode mnemonic
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Array => "ARRAY",
            Opcode::ArrayDone => "ARRAY_DONE",
            Opcode::Binary => "BINARY",
            Opcode::Block => "BLOCK",
            Opcode::BlockExit => "BLOCK_EXIT",
            Opcode::Call => "CALL",
            Opcode::Case => "CASE",
            Opcode::ClassDecl => "CLASS_DECL",
            Opcode::ClassExpr => "CLASS_EXPR",
            Opcode::Const => "CONST",
            Opcode::Construct => "CONSTRUCT",
            Opcode::Debugger => "DEBUGGER",
            Opcode::Default => "DEFAULT",
            Opcode::Dup => "DUP",
            Opcode::Element => "ELEMENT",
            Opcode::Function => "FUNCTION",
            Opcode::Get => "GET",
            Opcode::IfEq => "IFEQ",
            Opcode::IfNe => "IFNE",
            Opcode::Index => "INDEX",
            Opcode::Jsr => "JSR",
            Opcode::Jump => "JUMP",
            Opcode::Let => "LET",
            Opcode::Literal => "LITERAL",
            Opcode::Member => "MEMBER",
            Opcode::Method => "METHOD",
            Opcode::Object => "OBJECT",
            Opcode::Pop => "POP",
            Opcode::Save => "SAVE",
            Opcode::PopN => "POPN",
            Opcode::Property => "PROPERTY",
            Opcode::Put => "PUT",
            Opcode::RegExp => "REGEXP",
            Opcode::Resolve => "RESOLVE",
            Opcode::Return => "RETURN",
            Opcode::Complete => "COMPLETE",
            Opcode::Run => "RUN",
            Opcode::Rotate => "ROTATE",
            Opcode::SuperCall => "SUPER_CALL",
            Opcode::SuperElement => "SUPER_ELEMENT",
            Opcode::SuperGuard => "SUPER_GUARD",
            Opcode::SuperMember => "SUPER_MEMBER",
            Opcode::This => "THIS",
            Opcode::Throw => "THROW",
            Opcode::Unary => "UNARY",
            Opcode::Undefined => "UNDEFINED",
            Opcode::Update => "UPDATE",
            Opcode::Var => "VAR",
            Opcode::With => "WITH",
            Opcode::NativeResolve => "NATIVE_RESOLVE",
            Opcode::Enum => "ENUM",
            Opcode::Next => "NEXT",
            Opcode::String => "STRING",
            Opcode::ArrayRest => "ARRAY_REST",
            Opcode::ObjectRest => "OBJECT_REST",
            Opcode::Iterate => "ITERATE",
            Opcode::Ret => "RET",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
