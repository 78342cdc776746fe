//! Expression AST node types

use super::*;

/// An expression
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    /// Identifier reference
    Identifier(Identifier),

    /// Reference to a privileged native binding
    NativeIdentifier(Identifier),

    /// Literal value
    Literal(Literal),

    /// this expression
    #[serde(rename = "ThisExpression")]
    This(Span),

    /// super pseudo-identifier
    Super(Span),

    /// Array literal [1, 2, 3]
    #[serde(rename = "ArrayExpression")]
    Array(ArrayExpression),

    /// Object literal {a: 1, b: 2}
    #[serde(rename = "ObjectExpression")]
    Object(ObjectExpression),

    /// Function expression
    #[serde(rename = "FunctionExpression")]
    Function(Box<Function>),

    /// Arrow function expression
    #[serde(rename = "ArrowFunctionExpression")]
    Arrow(Box<Function>),

    /// Class expression
    #[serde(rename = "ClassExpression")]
    Class(Box<Class>),

    /// Unary expression
    #[serde(rename = "UnaryExpression")]
    Unary(Box<UnaryExpression>),

    /// Update expression (++/--)
    #[serde(rename = "UpdateExpression")]
    Update(Box<UpdateExpression>),

    /// Binary expression
    #[serde(rename = "BinaryExpression")]
    Binary(Box<BinaryExpression>),

    /// Logical expression (&&, ||)
    #[serde(rename = "LogicalExpression")]
    Logical(Box<LogicalExpression>),

    /// Assignment expression
    #[serde(rename = "AssignmentExpression")]
    Assignment(Box<AssignmentExpression>),

    /// Conditional expression a ? b : c
    #[serde(rename = "ConditionalExpression")]
    Conditional(Box<ConditionalExpression>),

    /// Function call
    #[serde(rename = "CallExpression")]
    Call(Box<CallExpression>),

    /// Constructor call
    #[serde(rename = "NewExpression")]
    New(Box<CallExpression>),

    /// Member access a.b or a[b]
    #[serde(rename = "MemberExpression")]
    Member(Box<MemberExpression>),

    /// Comma-separated expressions
    #[serde(rename = "SequenceExpression")]
    Sequence(SequenceExpression),

    /// Spread element ...x
    #[serde(rename = "SpreadElement")]
    Spread(Box<SpreadElement>),
}

impl Expression {
    /// Get the span of this expression
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier(id) | Expression::NativeIdentifier(id) => id.span,
            Expression::Literal(l) => l.span,
            Expression::This(s) | Expression::Super(s) => *s,
            Expression::Array(a) => a.span,
            Expression::Object(o) => o.span,
            Expression::Function(f) | Expression::Arrow(f) => f.span,
            Expression::Class(c) => c.span,
            Expression::Unary(u) => u.span,
            Expression::Update(u) => u.span,
            Expression::Binary(b) => b.span,
            Expression::Logical(l) => l.span,
            Expression::Assignment(a) => a.span,
            Expression::Conditional(c) => c.span,
            Expression::Call(c) | Expression::New(c) => c.span,
            Expression::Member(m) => m.span,
            Expression::Sequence(s) => s.span,
            Expression::Spread(s) => s.span,
        }
    }

    /// Whether this expression names the superclass binding
    ///
    /// Parsers emit either a dedicated `Super` node or a plain identifier
    /// spelled `super`; both are accepted.
    pub fn is_super(&self) -> bool {
        match self {
            Expression::Super(_) => true,
            Expression::Identifier(id) => id.name == "super",
            _ => false,
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawLiteral")]
pub struct Literal {
    /// The value
    pub value: LiteralValue,
    /// Span in source
    pub span: Span,
}

/// The payload of a literal
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// null
    Null,
    /// true/false
    Boolean(bool),
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Regular expression literal /pattern/flags
    RegExp {
        /// Pattern source
        pattern: String,
        /// Flags
        flags: String,
    },
}

#[derive(Deserialize)]
struct RawLiteral {
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    regex: Option<RawRegex>,
    #[serde(default)]
    raw: Option<String>,
    #[serde(flatten)]
    span: Span,
}

#[derive(Deserialize)]
struct RawRegex {
    pattern: String,
    #[serde(default)]
    flags: String,
}

impl From<RawLiteral> for Literal {
    fn from(raw: RawLiteral) -> Self {
        use serde_json::Value;

        let value = if let Some(regex) = raw.regex {
            LiteralValue::RegExp {
                pattern: regex.pattern,
                flags: regex.flags,
            }
        } else {
            match raw.value {
                Value::Bool(b) => LiteralValue::Boolean(b),
                Value::Number(n) => LiteralValue::Number(n.as_f64().unwrap_or(f64::NAN)),
                Value::String(s) => LiteralValue::String(s),
                // A regex serialized by JSON.stringify loses its value; recover it from raw
                Value::Object(_) => match raw.raw.as_deref().and_then(split_regex) {
                    Some((pattern, flags)) => LiteralValue::RegExp { pattern, flags },
                    None => LiteralValue::Null,
                },
                Value::Null | Value::Array(_) => LiteralValue::Null,
            }
        };

        Literal {
            value,
            span: raw.span,
        }
    }
}

fn split_regex(raw: &str) -> Option<(String, String)> {
    let body = raw.strip_prefix('/')?;
    let close = body.rfind('/')?;
    Some((body[..close].to_string(), body[close + 1..].to_string()))
}

/// Array literal
#[derive(Debug, Clone, Deserialize)]
pub struct ArrayExpression {
    /// Elements (None for holes)
    pub elements: Vec<Option<Expression>>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Object literal
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectExpression {
    /// Properties
    pub properties: Vec<ObjectMember>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Object literal member
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectMember {
    /// Key/value, getter, setter or method
    Property(Property),
    /// Spread ...obj
    #[serde(rename = "SpreadElement")]
    Spread(SpreadElement),
}

/// Object literal property
#[derive(Debug, Clone, Deserialize)]
pub struct Property {
    /// Property key
    pub key: Expression,
    /// Property value
    pub value: Expression,
    /// Property kind
    #[serde(default)]
    pub kind: PropertyKind,
    /// Method shorthand { m() {} }
    #[serde(default)]
    pub method: bool,
    /// Computed key { [k]: v }
    #[serde(default)]
    pub computed: bool,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Property kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Normal property
    #[default]
    Init,
    /// Getter
    Get,
    /// Setter
    Set,
}

/// Function (declaration, expression, arrow or method body)
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawFunction")]
pub struct Function {
    /// Function name
    pub id: Option<Identifier>,
    /// Parameters
    pub params: Vec<Pattern>,
    /// Body
    pub body: FunctionBody,
    /// Is generator function
    pub generator: bool,
    /// Span in source
    pub span: Span,
}

impl Function {
    /// Function name, if any
    pub fn name(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.name.as_str())
    }

    /// Statements of a block body (empty for expression-bodied arrows)
    pub fn body_statements(&self) -> &[Statement] {
        match &self.body {
            FunctionBody::Block(block) => &block.body,
            FunctionBody::Expression(_) => &[],
        }
    }
}

/// Function body
#[derive(Debug, Clone)]
pub enum FunctionBody {
    /// Block body
    Block(BlockStatement),
    /// Expression body (arrow functions)
    Expression(Box<Expression>),
}

#[derive(Deserialize)]
struct RawFunction {
    #[serde(default)]
    id: Option<Identifier>,
    #[serde(default)]
    params: Vec<Pattern>,
    // Older parsers report defaults and the rest parameter out of line
    #[serde(default)]
    defaults: Vec<Option<Expression>>,
    #[serde(default)]
    rest: Option<Identifier>,
    body: RawFunctionBody,
    #[serde(default)]
    generator: bool,
    #[serde(flatten)]
    span: Span,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFunctionBody {
    Block(BlockNode),
    Expression(Expression),
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum BlockNode {
    BlockStatement(BlockStatement),
}

impl From<RawFunction> for Function {
    fn from(raw: RawFunction) -> Self {
        let mut defaults = raw.defaults.into_iter();
        let mut params: Vec<Pattern> = raw
            .params
            .into_iter()
            .map(|param| match defaults.next().flatten() {
                Some(right) => {
                    let span = param.span().merge(right.span());
                    Pattern::Assignment(Box::new(AssignmentPattern {
                        left: param,
                        right,
                        span,
                    }))
                }
                None => param,
            })
            .collect();

        if let Some(rest) = raw.rest {
            let span = rest.span;
            params.push(Pattern::Rest(Box::new(RestElement {
                argument: Pattern::Identifier(rest),
                span,
            })));
        }

        let body = match raw.body {
            RawFunctionBody::Block(BlockNode::BlockStatement(block)) => FunctionBody::Block(block),
            RawFunctionBody::Expression(expr) => FunctionBody::Expression(Box::new(expr)),
        };

        Function {
            id: raw.id,
            params,
            body,
            generator: raw.generator,
            span: raw.span,
        }
    }
}

/// Class (declaration or expression)
#[derive(Debug, Clone, Deserialize)]
pub struct Class {
    /// Class name
    #[serde(default)]
    pub id: Option<Identifier>,
    /// Superclass
    #[serde(default, rename = "superClass")]
    pub super_class: Option<Expression>,
    /// Class body
    pub body: ClassBody,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Class body
#[derive(Debug, Clone, Deserialize)]
pub struct ClassBody {
    /// Method definitions
    pub body: Vec<MethodDefinition>,
}

/// Class method definition
#[derive(Debug, Clone, Deserialize)]
pub struct MethodDefinition {
    /// Method key
    pub key: Expression,
    /// Method function
    pub value: Expression,
    /// Method kind
    #[serde(default)]
    pub kind: MethodKind,
    /// Is static
    #[serde(default, rename = "static")]
    pub is_static: bool,
    /// Computed key
    #[serde(default)]
    pub computed: bool,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Method kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    /// Constructor
    Constructor,
    /// Normal method
    #[default]
    #[serde(alias = "")]
    Method,
    /// Getter
    Get,
    /// Setter
    Set,
}

/// Unary expression
#[derive(Debug, Clone, Deserialize)]
pub struct UnaryExpression {
    /// Operator
    pub operator: UnaryOperator,
    /// Operand
    pub argument: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Unary operators, declared in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOperator {
    /// delete
    #[serde(rename = "delete")]
    Delete,
    /// void
    #[serde(rename = "void")]
    Void,
    /// typeof
    #[serde(rename = "typeof")]
    TypeOf,
    /// +
    #[serde(rename = "+")]
    Plus,
    /// -
    #[serde(rename = "-")]
    Minus,
    /// ~
    #[serde(rename = "~")]
    BitNot,
    /// !
    #[serde(rename = "!")]
    Not,
}

impl UnaryOperator {
    /// Operand id carried by the UNARY instruction
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Source spelling
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOperator::Delete => "delete",
            UnaryOperator::Void => "void",
            UnaryOperator::TypeOf => "typeof",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::BitNot => "~",
            UnaryOperator::Not => "!",
        }
    }
}

/// Update expression
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExpression {
    /// Operator
    pub operator: UpdateOperator,
    /// Prefix or postfix
    pub prefix: bool,
    /// Operand
    pub argument: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Update operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UpdateOperator {
    /// ++
    #[serde(rename = "++")]
    Increment,
    /// --
    #[serde(rename = "--")]
    Decrement,
}

/// Binary expression
#[derive(Debug, Clone, Deserialize)]
pub struct BinaryExpression {
    /// Operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Expression,
    /// Right operand
    pub right: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Binary operators, declared in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOperator {
    /// instanceof
    #[serde(rename = "instanceof")]
    InstanceOf,
    /// in
    #[serde(rename = "in")]
    In,
    /// ==
    #[serde(rename = "==")]
    Eq,
    /// !=
    #[serde(rename = "!=")]
    Ne,
    /// ===
    #[serde(rename = "===")]
    StrictEq,
    /// !==
    #[serde(rename = "!==")]
    StrictNe,
    /// <
    #[serde(rename = "<")]
    Lt,
    /// >
    #[serde(rename = ">")]
    Gt,
    /// <=
    #[serde(rename = "<=")]
    Le,
    /// >=
    #[serde(rename = ">=")]
    Ge,
    /// *
    #[serde(rename = "*")]
    Mul,
    /// /
    #[serde(rename = "/")]
    Div,
    /// %
    #[serde(rename = "%")]
    Mod,
    /// +
    #[serde(rename = "+")]
    Add,
    /// -
    #[serde(rename = "-")]
    Sub,
    /// <<
    #[serde(rename = "<<")]
    Shl,
    /// >>
    #[serde(rename = ">>")]
    Shr,
    /// >>>
    #[serde(rename = ">>>")]
    UShr,
    /// |
    #[serde(rename = "|")]
    BitOr,
    /// &
    #[serde(rename = "&")]
    BitAnd,
    /// ^
    #[serde(rename = "^")]
    BitXor,
}

impl BinaryOperator {
    /// Operand id carried by the BINARY instruction
    pub fn id(self) -> u32 {
        self as u32
    }

    /// Source spelling
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOperator::InstanceOf => "instanceof",
            BinaryOperator::In => "in",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::StrictEq => "===",
            BinaryOperator::StrictNe => "!==",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::UShr => ">>>",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitXor => "^",
        }
    }
}

/// Logical expression
#[derive(Debug, Clone, Deserialize)]
pub struct LogicalExpression {
    /// Operator
    pub operator: LogicalOperator,
    /// Left operand
    pub left: Expression,
    /// Right operand
    pub right: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogicalOperator {
    /// &&
    #[serde(rename = "&&")]
    And,
    /// ||
    #[serde(rename = "||")]
    Or,
}

/// Assignment expression
#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentExpression {
    /// Operator
    pub operator: AssignmentOperator,
    /// Target
    pub left: Pattern,
    /// Value
    pub right: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AssignmentOperator {
    /// =
    #[serde(rename = "=")]
    Assign,
    /// +=
    #[serde(rename = "+=")]
    AddAssign,
    /// -=
    #[serde(rename = "-=")]
    SubAssign,
    /// *=
    #[serde(rename = "*=")]
    MulAssign,
    /// /=
    #[serde(rename = "/=")]
    DivAssign,
    /// %=
    #[serde(rename = "%=")]
    ModAssign,
    /// <<=
    #[serde(rename = "<<=")]
    ShlAssign,
    /// >>=
    #[serde(rename = ">>=")]
    ShrAssign,
    /// >>>=
    #[serde(rename = ">>>=")]
    UShrAssign,
    /// |=
    #[serde(rename = "|=")]
    BitOrAssign,
    /// &=
    #[serde(rename = "&=")]
    BitAndAssign,
    /// ^=
    #[serde(rename = "^=")]
    BitXorAssign,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, None for plain `=`
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AddAssign => Some(BinaryOperator::Add),
            AssignmentOperator::SubAssign => Some(BinaryOperator::Sub),
            AssignmentOperator::MulAssign => Some(BinaryOperator::Mul),
            AssignmentOperator::DivAssign => Some(BinaryOperator::Div),
            AssignmentOperator::ModAssign => Some(BinaryOperator::Mod),
            AssignmentOperator::ShlAssign => Some(BinaryOperator::Shl),
            AssignmentOperator::ShrAssign => Some(BinaryOperator::Shr),
            AssignmentOperator::UShrAssign => Some(BinaryOperator::UShr),
            AssignmentOperator::BitOrAssign => Some(BinaryOperator::BitOr),
            AssignmentOperator::BitAndAssign => Some(BinaryOperator::BitAnd),
            AssignmentOperator::BitXorAssign => Some(BinaryOperator::BitXor),
        }
    }
}

/// Conditional expression
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalExpression {
    /// Condition
    pub test: Expression,
    /// Value if true
    pub consequent: Expression,
    /// Value if false
    pub alternate: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Call or constructor call
#[derive(Debug, Clone, Deserialize)]
pub struct CallExpression {
    /// Callee
    pub callee: Expression,
    /// Arguments
    pub arguments: Vec<Expression>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Member expression
#[derive(Debug, Clone, Deserialize)]
pub struct MemberExpression {
    /// Object
    pub object: Expression,
    /// Property
    pub property: Expression,
    /// Computed access (a[b] vs a.b)
    #[serde(default)]
    pub computed: bool,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

impl MemberExpression {
    /// Static property name for `a.b` access
    pub fn static_name(&self) -> Option<&str> {
        if self.computed {
            return None;
        }
        match &self.property {
            Expression::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }
}

/// Sequence expression
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceExpression {
    /// Expressions
    pub expressions: Vec<Expression>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Spread element
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadElement {
    /// Spread operand
    pub argument: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}
