//! Statement AST node types

use super::*;

/// A statement
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    /// Block statement { ... }
    #[serde(rename = "BlockStatement")]
    Block(BlockStatement),

    /// Empty statement ;
    #[serde(rename = "EmptyStatement")]
    Empty(Span),

    /// Expression statement
    #[serde(rename = "ExpressionStatement")]
    Expression(ExpressionStatement),

    /// If statement
    #[serde(rename = "IfStatement")]
    If(Box<IfStatement>),

    /// Labeled statement label: body
    #[serde(rename = "LabeledStatement")]
    Labeled(Box<LabeledStatement>),

    /// Break statement
    #[serde(rename = "BreakStatement")]
    Break(BreakStatement),

    /// Continue statement
    #[serde(rename = "ContinueStatement")]
    Continue(ContinueStatement),

    /// With statement
    #[serde(rename = "WithStatement")]
    With(Box<WithStatement>),

    /// Switch statement
    #[serde(rename = "SwitchStatement")]
    Switch(Box<SwitchStatement>),

    /// Return statement
    #[serde(rename = "ReturnStatement")]
    Return(ReturnStatement),

    /// Throw statement
    #[serde(rename = "ThrowStatement")]
    Throw(ThrowStatement),

    /// Try statement
    #[serde(rename = "TryStatement")]
    Try(Box<TryStatement>),

    /// While statement
    #[serde(rename = "WhileStatement")]
    While(Box<WhileStatement>),

    /// Do-while statement
    #[serde(rename = "DoWhileStatement")]
    DoWhile(Box<DoWhileStatement>),

    /// For statement
    #[serde(rename = "ForStatement")]
    For(Box<ForStatement>),

    /// For-in statement
    #[serde(rename = "ForInStatement")]
    ForIn(Box<ForInOfStatement>),

    /// For-of statement
    #[serde(rename = "ForOfStatement")]
    ForOf(Box<ForInOfStatement>),

    /// Debugger statement
    #[serde(rename = "DebuggerStatement")]
    Debugger(Span),

    /// Function declaration
    #[serde(rename = "FunctionDeclaration")]
    FunctionDeclaration(Box<Function>),

    /// Variable declaration (var, let, const)
    #[serde(rename = "VariableDeclaration")]
    VariableDeclaration(VariableDeclaration),

    /// Class declaration
    #[serde(rename = "ClassDeclaration")]
    ClassDeclaration(Box<Class>),
}

impl Statement {
    /// Get the span of this statement
    pub fn span(&self) -> Span {
        match self {
            Statement::Block(b) => b.span,
            Statement::Empty(s) | Statement::Debugger(s) => *s,
            Statement::Expression(e) => e.span,
            Statement::If(i) => i.span,
            Statement::Labeled(l) => l.span,
            Statement::Break(b) => b.span,
            Statement::Continue(c) => c.span,
            Statement::With(w) => w.span,
            Statement::Switch(s) => s.span,
            Statement::Return(r) => r.span,
            Statement::Throw(t) => t.span,
            Statement::Try(t) => t.span,
            Statement::While(w) => w.span,
            Statement::DoWhile(d) => d.span,
            Statement::For(f) => f.span,
            Statement::ForIn(f) | Statement::ForOf(f) => f.span,
            Statement::FunctionDeclaration(f) => f.span,
            Statement::VariableDeclaration(v) => v.span,
            Statement::ClassDeclaration(c) => c.span,
        }
    }

    /// Whether this statement is a loop that `continue` may target
    pub fn is_iteration(&self) -> bool {
        matches!(
            self,
            Statement::While(_)
                | Statement::DoWhile(_)
                | Statement::For(_)
                | Statement::ForIn(_)
                | Statement::ForOf(_)
        )
    }
}

/// Block statement
#[derive(Debug, Clone, Deserialize)]
pub struct BlockStatement {
    /// Statements in the block
    pub body: Vec<Statement>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Expression statement
#[derive(Debug, Clone, Deserialize)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
    /// Directive text ("use strict") when the parser marks one
    #[serde(default)]
    pub directive: Option<String>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// If statement
#[derive(Debug, Clone, Deserialize)]
pub struct IfStatement {
    /// Condition
    pub test: Expression,
    /// Then branch
    pub consequent: Statement,
    /// Else branch
    #[serde(default)]
    pub alternate: Option<Statement>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Labeled statement
#[derive(Debug, Clone, Deserialize)]
pub struct LabeledStatement {
    /// The label
    pub label: Identifier,
    /// The labeled statement
    pub body: Statement,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Break statement
#[derive(Debug, Clone, Deserialize)]
pub struct BreakStatement {
    /// Optional label
    #[serde(default)]
    pub label: Option<Identifier>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Continue statement
#[derive(Debug, Clone, Deserialize)]
pub struct ContinueStatement {
    /// Optional label
    #[serde(default)]
    pub label: Option<Identifier>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// With statement
#[derive(Debug, Clone, Deserialize)]
pub struct WithStatement {
    /// Scope object
    pub object: Expression,
    /// Body
    pub body: Statement,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Switch statement
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchStatement {
    /// Discriminant expression
    pub discriminant: Expression,
    /// Cases
    pub cases: Vec<SwitchCase>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Switch case
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchCase {
    /// Test expression (None for default)
    #[serde(default)]
    pub test: Option<Expression>,
    /// Consequent statements
    pub consequent: Vec<Statement>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Return statement
#[derive(Debug, Clone, Deserialize)]
pub struct ReturnStatement {
    /// Return value
    #[serde(default)]
    pub argument: Option<Expression>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Throw statement
#[derive(Debug, Clone, Deserialize)]
pub struct ThrowStatement {
    /// Exception value
    pub argument: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Try statement
///
/// Parsers disagree on how catch clauses are attached: current ESTree uses a
/// single `handler`, older parsers a `handlers` list. Both are accepted and
/// normalized into `handlers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawTryStatement")]
pub struct TryStatement {
    /// Try block
    pub block: BlockStatement,
    /// Catch clauses, in source order
    pub handlers: Vec<CatchClause>,
    /// Finally block
    pub finalizer: Option<BlockStatement>,
    /// Span in source
    pub span: Span,
}

#[derive(Deserialize)]
struct RawTryStatement {
    block: BlockStatement,
    #[serde(default)]
    handler: Option<CatchClause>,
    #[serde(default)]
    handlers: Vec<CatchClause>,
    #[serde(default)]
    finalizer: Option<BlockStatement>,
    #[serde(flatten)]
    span: Span,
}

impl From<RawTryStatement> for TryStatement {
    fn from(raw: RawTryStatement) -> Self {
        let handlers = if raw.handlers.is_empty() {
            raw.handler.into_iter().collect()
        } else {
            raw.handlers
        };
        TryStatement {
            block: raw.block,
            handlers,
            finalizer: raw.finalizer,
            span: raw.span,
        }
    }
}

/// Catch clause
#[derive(Debug, Clone, Deserialize)]
pub struct CatchClause {
    /// Exception binding (None for optional catch binding)
    #[serde(default)]
    pub param: Option<Pattern>,
    /// Catch body
    pub body: BlockStatement,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// While statement
#[derive(Debug, Clone, Deserialize)]
pub struct WhileStatement {
    /// Condition
    pub test: Expression,
    /// Body
    pub body: Statement,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Do-while statement
#[derive(Debug, Clone, Deserialize)]
pub struct DoWhileStatement {
    /// Body
    pub body: Statement,
    /// Condition
    pub test: Expression,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// For statement
#[derive(Debug, Clone, Deserialize)]
pub struct ForStatement {
    /// Initializer
    #[serde(default)]
    pub init: Option<ForInit>,
    /// Condition
    #[serde(default)]
    pub test: Option<Expression>,
    /// Update expression
    #[serde(default)]
    pub update: Option<Expression>,
    /// Body
    pub body: Statement,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// For loop initializer
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ForInit {
    /// Variable declaration
    Declaration(VariableDeclaration),
    /// Expression
    Expression(Expression),
}

/// For-in and for-of statements share one shape
#[derive(Debug, Clone, Deserialize)]
pub struct ForInOfStatement {
    /// Left side (variable or pattern)
    pub left: ForInLeft,
    /// Object (for-in) or iterable (for-of)
    pub right: Expression,
    /// Body
    pub body: Statement,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Left side of for-in/for-of
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ForInLeft {
    /// Variable declaration
    Declaration(VariableDeclaration),
    /// Assignment target
    Pattern(Pattern),
}

/// Variable declaration
#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclaration {
    /// Declaration kind
    pub kind: VariableKind,
    /// Declarators
    pub declarations: Vec<VariableDeclarator>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// var
    Var,
    /// let
    Let,
    /// const
    Const,
}

impl VariableKind {
    /// Whether bindings of this kind are block scoped
    pub fn is_lexical(self) -> bool {
        !matches!(self, VariableKind::Var)
    }
}

/// Variable declarator
#[derive(Debug, Clone, Deserialize)]
pub struct VariableDeclarator {
    /// Binding pattern
    pub id: Pattern,
    /// Initializer
    #[serde(default)]
    pub init: Option<Expression>,
    /// Span in source
    #[serde(flatten)]
    pub span: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stmt(value: serde_json::Value) -> Statement {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_try_with_single_handler() {
        let s = stmt(json!({
            "type": "TryStatement",
            "block": { "type": "BlockStatement", "body": [] },
            "handler": {
                "type": "CatchClause",
                "param": { "type": "Identifier", "name": "e" },
                "body": { "type": "BlockStatement", "body": [] }
            },
            "finalizer": null
        }));
        match s {
            Statement::Try(t) => {
                assert_eq!(t.handlers.len(), 1);
                assert!(t.finalizer.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_try_with_handler_list() {
        let clause = json!({
            "type": "CatchClause",
            "param": { "type": "Identifier", "name": "e" },
            "body": { "type": "BlockStatement", "body": [] }
        });
        let s = stmt(json!({
            "type": "TryStatement",
            "block": { "type": "BlockStatement", "body": [] },
            "handlers": [clause.clone(), clause],
            "finalizer": { "type": "BlockStatement", "body": [] }
        }));
        match s {
            Statement::Try(t) => {
                assert_eq!(t.handlers.len(), 2);
                assert!(t.finalizer.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_for_init_variants() {
        let s = stmt(json!({
            "type": "ForStatement",
            "init": {
                "type": "VariableDeclaration", "kind": "let",
                "declarations": [{ "type": "VariableDeclarator",
                                   "id": { "type": "Identifier", "name": "i" },
                                   "init": { "type": "Literal", "value": 0 } }]
            },
            "test": null,
            "update": { "type": "Identifier", "name": "i" },
            "body": { "type": "EmptyStatement" }
        }));
        match s {
            Statement::For(f) => {
                assert!(matches!(f.init, Some(ForInit::Declaration(ref d)) if d.kind == VariableKind::Let));
                assert!(f.test.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }

        let s = stmt(json!({
            "type": "ForStatement",
            "init": { "type": "Identifier", "name": "i" },
            "body": { "type": "EmptyStatement" }
        }));
        match s {
            Statement::For(f) => assert!(matches!(f.init, Some(ForInit::Expression(_)))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_for_in_left_pattern() {
        let s = stmt(json!({
            "type": "ForInStatement",
            "left": { "type": "Identifier", "name": "k" },
            "right": { "type": "Identifier", "name": "o" },
            "body": { "type": "EmptyStatement" }
        }));
        match s {
            Statement::ForIn(f) => assert!(matches!(f.left, ForInLeft::Pattern(Pattern::Identifier(_)))),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_is_iteration() {
        let s = stmt(json!({
            "type": "WhileStatement",
            "test": { "type": "Identifier", "name": "x" },
            "body": { "type": "EmptyStatement" }
        }));
        assert!(s.is_iteration());
        assert!(!stmt(json!({ "type": "EmptyStatement" })).is_iteration());
    }
}
