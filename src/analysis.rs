//! Static analysis over the syntax tree
//!
//! Pure, re-entrant tree walks. Their results are computed once when a
//! compilation unit is created and cached on the unit; emission never
//! recomputes them.

use crate::ast::*;

// ========== Bound names ==========

/// Identifier names a declaration form introduces, in source order
pub trait BoundNames {
    /// Append the bound names of this node to `out`
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>);

    /// The bound names of this node
    fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }
}

impl BoundNames for Pattern {
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Pattern::Identifier(id) => out.push(&id.name),
            Pattern::Array(arr) => {
                for element in arr.elements.iter().flatten() {
                    element.collect_bound_names(out);
                }
            }
            Pattern::Object(obj) => {
                for prop in &obj.properties {
                    match prop {
                        ObjectPatternProperty::Property(p) => p.value.collect_bound_names(out),
                        ObjectPatternProperty::Rest(r) => r.argument.collect_bound_names(out),
                    }
                }
            }
            Pattern::Assignment(a) => a.left.collect_bound_names(out),
            Pattern::Rest(r) => r.argument.collect_bound_names(out),
            // Member targets assign, they never bind
            Pattern::Member(_) => {}
        }
    }
}

impl BoundNames for [Pattern] {
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        for pattern in self {
            pattern.collect_bound_names(out);
        }
    }
}

impl BoundNames for VariableDeclaration {
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        for declarator in &self.declarations {
            declarator.id.collect_bound_names(out);
        }
    }
}

impl BoundNames for Function {
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(id) = &self.id {
            out.push(&id.name);
        }
    }
}

impl BoundNames for Class {
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let Some(id) = &self.id {
            out.push(&id.name);
        }
    }
}

impl BoundNames for Statement {
    fn collect_bound_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Statement::VariableDeclaration(decl) => decl.collect_bound_names(out),
            Statement::FunctionDeclaration(func) => func.collect_bound_names(out),
            Statement::ClassDeclaration(class) => class.collect_bound_names(out),
            Statement::Block(block) => {
                for stmt in &block.body {
                    stmt.collect_bound_names(out);
                }
            }
            _ => {}
        }
    }
}

// ========== Lexical declarations ==========

/// Kind of a lexically scoped declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// function f() {}
    Function,
    /// class C {}
    Class,
    /// let x
    Let,
    /// const x
    Const,
}

impl DeclarationKind {
    /// Wire tag
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Function => "function",
            DeclarationKind::Class => "class",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

/// A declaration creating a block-scoped binding
#[derive(Debug, Clone)]
pub struct LexicalDeclaration<'a> {
    /// Declaration kind
    pub kind: DeclarationKind,
    /// Whether the binding is immutable
    pub is_constant: bool,
    /// Names the declaration binds
    pub bound_names: Vec<&'a str>,
    /// The declared function, for hoisted function declarations
    pub function: Option<&'a Function>,
    /// Span in source
    pub span: Span,
}

/// Lexical declarations made directly by a statement list
///
/// Switch cases share the scope of their switch, so their consequents are
/// included. Nested blocks and function bodies open their own scopes and
/// are not entered.
pub fn lexical_declarations(body: &[Statement]) -> Vec<LexicalDeclaration<'_>> {
    let mut decls = Vec::new();
    for stmt in body {
        collect_lexical(stmt, &mut decls);
    }
    decls
}

/// Lexical declarations made by the cases of a switch statement
pub fn switch_lexical_declarations(switch: &SwitchStatement) -> Vec<LexicalDeclaration<'_>> {
    let mut decls = Vec::new();
    for case in &switch.cases {
        for stmt in &case.consequent {
            collect_lexical(stmt, &mut decls);
        }
    }
    decls
}

fn collect_lexical<'a>(stmt: &'a Statement, out: &mut Vec<LexicalDeclaration<'a>>) {
    match stmt {
        Statement::FunctionDeclaration(func) => out.push(LexicalDeclaration {
            kind: DeclarationKind::Function,
            is_constant: false,
            bound_names: func.bound_names(),
            function: Some(func),
            span: func.span,
        }),
        Statement::ClassDeclaration(class) => out.push(LexicalDeclaration {
            kind: DeclarationKind::Class,
            is_constant: true,
            bound_names: class.bound_names(),
            function: None,
            span: class.span,
        }),
        Statement::VariableDeclaration(decl) => out.extend(variable_lexical_declaration(decl)),
        _ => {}
    }
}

/// The lexical declaration a `let`/`const` declaration makes, None for `var`
pub fn variable_lexical_declaration(decl: &VariableDeclaration) -> Option<LexicalDeclaration<'_>> {
    let kind = match decl.kind {
        VariableKind::Var => return None,
        VariableKind::Let => DeclarationKind::Let,
        VariableKind::Const => DeclarationKind::Const,
    };
    Some(LexicalDeclaration {
        kind,
        is_constant: kind == DeclarationKind::Const,
        bound_names: decl.bound_names(),
        function: None,
        span: decl.span,
    })
}

// ========== Super references ==========

/// Whether an expression is the superclass pseudo-identifier
pub fn is_super_reference(expr: &Expression) -> bool {
    expr.is_super()
}

/// Whether a function references its superclass binding
///
/// Nested functions, arrows and methods are not entered; they compute
/// their own answer when they become units.
pub fn references_super(func: &Function) -> bool {
    func.params.iter().any(pattern_references_super)
        || match &func.body {
            FunctionBody::Block(block) => block.body.iter().any(stmt_references_super),
            FunctionBody::Expression(expr) => expr_references_super(expr),
        }
}

fn stmt_references_super(stmt: &Statement) -> bool {
    let opt = |e: &Option<Expression>| e.as_ref().is_some_and(expr_references_super);
    match stmt {
        Statement::Block(b) => b.body.iter().any(stmt_references_super),
        Statement::Empty(_) | Statement::Debugger(_) => false,
        Statement::Break(_) | Statement::Continue(_) => false,
        Statement::FunctionDeclaration(_) => false,
        Statement::Expression(e) => expr_references_super(&e.expression),
        Statement::If(i) => {
            expr_references_super(&i.test)
                || stmt_references_super(&i.consequent)
                || i.alternate.as_ref().is_some_and(stmt_references_super)
        }
        Statement::Labeled(l) => stmt_references_super(&l.body),
        Statement::With(w) => expr_references_super(&w.object) || stmt_references_super(&w.body),
        Statement::Switch(s) => {
            expr_references_super(&s.discriminant)
                || s.cases.iter().any(|c| {
                    opt(&c.test) || c.consequent.iter().any(stmt_references_super)
                })
        }
        Statement::Return(r) => opt(&r.argument),
        Statement::Throw(t) => expr_references_super(&t.argument),
        Statement::Try(t) => {
            t.block.body.iter().any(stmt_references_super)
                || t.handlers.iter().any(|h| {
                    h.param.as_ref().is_some_and(pattern_references_super)
                        || h.body.body.iter().any(stmt_references_super)
                })
                || t.finalizer
                    .as_ref()
                    .is_some_and(|f| f.body.iter().any(stmt_references_super))
        }
        Statement::While(w) => expr_references_super(&w.test) || stmt_references_super(&w.body),
        Statement::DoWhile(d) => expr_references_super(&d.test) || stmt_references_super(&d.body),
        Statement::For(f) => {
            let init = match &f.init {
                Some(ForInit::Declaration(d)) => declaration_references_super(d),
                Some(ForInit::Expression(e)) => expr_references_super(e),
                None => false,
            };
            init || opt(&f.test) || opt(&f.update) || stmt_references_super(&f.body)
        }
        Statement::ForIn(f) | Statement::ForOf(f) => {
            let left = match &f.left {
                ForInLeft::Declaration(d) => declaration_references_super(d),
                ForInLeft::Pattern(p) => pattern_references_super(p),
            };
            left || expr_references_super(&f.right) || stmt_references_super(&f.body)
        }
        Statement::VariableDeclaration(d) => declaration_references_super(d),
        Statement::ClassDeclaration(c) => class_references_super(c),
    }
}

fn declaration_references_super(decl: &VariableDeclaration) -> bool {
    decl.declarations.iter().any(|d| {
        pattern_references_super(&d.id) || d.init.as_ref().is_some_and(expr_references_super)
    })
}

// Only the parts of a class evaluated in the enclosing function count
fn class_references_super(class: &Class) -> bool {
    class.super_class.as_ref().is_some_and(expr_references_super)
        || class
            .body
            .body
            .iter()
            .any(|m| m.computed && expr_references_super(&m.key))
}

fn expr_references_super(expr: &Expression) -> bool {
    match expr {
        Expression::Member(m) => member_references_super(m),
        Expression::Call(c) => {
            is_super_reference(&c.callee)
                || expr_references_super(&c.callee)
                || c.arguments.iter().any(expr_references_super)
        }
        Expression::New(c) => {
            expr_references_super(&c.callee) || c.arguments.iter().any(expr_references_super)
        }
        Expression::Identifier(_)
        | Expression::NativeIdentifier(_)
        | Expression::Literal(_)
        | Expression::This(_)
        | Expression::Super(_) => false,
        Expression::Function(_) | Expression::Arrow(_) => false,
        Expression::Class(c) => class_references_super(c),
        Expression::Array(a) => a.elements.iter().flatten().any(expr_references_super),
        Expression::Object(o) => o.properties.iter().any(|member| match member {
            ObjectMember::Property(p) => {
                (p.computed && expr_references_super(&p.key)) || expr_references_super(&p.value)
            }
            ObjectMember::Spread(s) => expr_references_super(&s.argument),
        }),
        Expression::Unary(u) => expr_references_super(&u.argument),
        Expression::Update(u) => expr_references_super(&u.argument),
        Expression::Binary(b) => expr_references_super(&b.left) || expr_references_super(&b.right),
        Expression::Logical(l) => expr_references_super(&l.left) || expr_references_super(&l.right),
        Expression::Assignment(a) => {
            pattern_references_super(&a.left) || expr_references_super(&a.right)
        }
        Expression::Conditional(c) => {
            expr_references_super(&c.test)
                || expr_references_super(&c.consequent)
                || expr_references_super(&c.alternate)
        }
        Expression::Sequence(s) => s.expressions.iter().any(expr_references_super),
        Expression::Spread(s) => expr_references_super(&s.argument),
    }
}

fn member_references_super(member: &MemberExpression) -> bool {
    is_super_reference(&member.object)
        || expr_references_super(&member.object)
        || (member.computed && expr_references_super(&member.property))
}

fn pattern_references_super(pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Identifier(_) => false,
        Pattern::Member(m) => member_references_super(m),
        Pattern::Array(a) => a.elements.iter().flatten().any(pattern_references_super),
        Pattern::Object(o) => o.properties.iter().any(|prop| match prop {
            ObjectPatternProperty::Property(p) => {
                (p.computed && expr_references_super(&p.key)) || pattern_references_super(&p.value)
            }
            ObjectPatternProperty::Rest(r) => pattern_references_super(&r.argument),
        }),
        Pattern::Assignment(a) => {
            pattern_references_super(&a.left) || expr_references_super(&a.right)
        }
        Pattern::Rest(r) => pattern_references_super(&r.argument),
    }
}

// ========== Strictness & arity ==========

/// Whether a directive prologue puts a body in strict mode
///
/// Empty statements and function declarations before the directive are
/// skipped; any other statement ends the search.
pub fn is_strict(body: &[Statement]) -> bool {
    for stmt in body {
        match stmt {
            Statement::Expression(e) if is_use_strict(e) => return true,
            Statement::Empty(_) | Statement::FunctionDeclaration(_) => continue,
            _ => return false,
        }
    }
    false
}

fn is_use_strict(stmt: &ExpressionStatement) -> bool {
    match &stmt.expression {
        Expression::Literal(Literal {
            value: LiteralValue::String(s),
            ..
        }) => s == "use strict",
        _ => false,
    }
}

/// Number of arguments a function declares it expects
///
/// Each identifier, object-pattern or array-pattern parameter counts once;
/// parameters with defaults and the rest parameter do not count.
pub fn expected_argument_count(params: &[Pattern]) -> usize {
    params
        .iter()
        .filter(|p| matches!(p, Pattern::Identifier(_) | Pattern::Object(_) | Pattern::Array(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stmts(value: serde_json::Value) -> Vec<Statement> {
        serde_json::from_value(value).unwrap()
    }

    fn function(value: serde_json::Value) -> Function {
        match serde_json::from_value::<Expression>(value).unwrap() {
            Expression::Function(f) | Expression::Arrow(f) => *f,
            other => panic!("not a function: {:?}", other),
        }
    }

    fn ident(name: &str) -> serde_json::Value {
        json!({ "type": "Identifier", "name": name })
    }

    fn super_member() -> serde_json::Value {
        json!({ "type": "ExpressionStatement", "expression": {
            "type": "MemberExpression", "object": { "type": "Super" },
            "property": ident("m"), "computed": false } })
    }

    #[test]
    fn test_bound_names_of_patterns() {
        let decl: VariableDeclaration = serde_json::from_value(json!({
            "type": "VariableDeclaration", "kind": "var",
            "declarations": [
                { "type": "VariableDeclarator", "id": ident("a") },
                { "type": "VariableDeclarator", "id": {
                    "type": "ArrayPattern", "elements": [
                        ident("b"), null,
                        { "type": "ObjectPattern", "properties": [
                            { "type": "Property", "key": ident("k"), "value": ident("c") },
                            { "type": "RestElement", "argument": ident("d") }
                        ] },
                        { "type": "RestElement", "argument": ident("e") }
                    ] } }
            ]
        }))
        .unwrap();
        assert_eq!(decl.bound_names(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_lexical_declarations() {
        let body = stmts(json!([
            { "type": "VariableDeclaration", "kind": "var",
              "declarations": [{ "type": "VariableDeclarator", "id": ident("v") }] },
            { "type": "VariableDeclaration", "kind": "let",
              "declarations": [{ "type": "VariableDeclarator", "id": ident("l") }] },
            { "type": "VariableDeclaration", "kind": "const",
              "declarations": [{ "type": "VariableDeclarator", "id": ident("c"),
                                 "init": { "type": "Literal", "value": 1 } }] },
            { "type": "FunctionDeclaration", "id": ident("f"), "params": [],
              "body": { "type": "BlockStatement", "body": [] } },
            { "type": "ClassDeclaration", "id": ident("K"),
              "body": { "type": "ClassBody", "body": [] } },
            { "type": "BlockStatement", "body": [
                { "type": "VariableDeclaration", "kind": "let",
                  "declarations": [{ "type": "VariableDeclarator", "id": ident("inner") }] }
            ] }
        ]));

        let decls = lexical_declarations(&body);
        let summary: Vec<_> = decls
            .iter()
            .map(|d| (d.kind, d.is_constant, d.bound_names.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (DeclarationKind::Let, false, vec!["l"]),
                (DeclarationKind::Const, true, vec!["c"]),
                (DeclarationKind::Function, false, vec!["f"]),
                (DeclarationKind::Class, true, vec!["K"]),
            ]
        );
        assert!(decls[2].function.is_some());
    }

    #[test]
    fn test_switch_lexical_declarations() {
        let body = stmts(json!([{
            "type": "SwitchStatement", "discriminant": ident("x"),
            "cases": [
                { "type": "SwitchCase", "test": { "type": "Literal", "value": 1 }, "consequent": [
                    { "type": "VariableDeclaration", "kind": "let",
                      "declarations": [{ "type": "VariableDeclarator", "id": ident("a") }] }
                ] },
                { "type": "SwitchCase", "test": null, "consequent": [
                    { "type": "FunctionDeclaration", "id": ident("g"), "params": [],
                      "body": { "type": "BlockStatement", "body": [] } }
                ] }
            ]
        }]));
        let Statement::Switch(switch) = &body[0] else { panic!("not a switch") };
        let names: Vec<_> = switch_lexical_declarations(switch)
            .into_iter()
            .flat_map(|d| d.bound_names)
            .collect();
        assert_eq!(names, vec!["a", "g"]);
    }

    #[test]
    fn test_references_super() {
        let direct = function(json!({
            "type": "FunctionExpression", "params": [],
            "body": { "type": "BlockStatement", "body": [super_member()] }
        }));
        assert!(references_super(&direct));

        let call = function(json!({
            "type": "FunctionExpression", "params": [],
            "body": { "type": "BlockStatement", "body": [
                { "type": "IfStatement", "test": ident("x"), "consequent": {
                    "type": "ExpressionStatement", "expression": {
                        "type": "CallExpression", "callee": ident("super"), "arguments": [] } } }
            ] }
        }));
        assert!(references_super(&call));

        // nested functions are their own boundary
        let nested = function(json!({
            "type": "FunctionExpression", "params": [],
            "body": { "type": "BlockStatement", "body": [
                { "type": "ExpressionStatement", "expression": {
                    "type": "ArrowFunctionExpression", "params": [],
                    "body": { "type": "BlockStatement", "body": [super_member()] } } }
            ] }
        }));
        assert!(!references_super(&nested));
    }

    #[test]
    fn test_is_strict() {
        let use_strict = json!({ "type": "ExpressionStatement",
                                 "expression": { "type": "Literal", "value": "use strict" } });
        assert!(is_strict(&stmts(json!([use_strict.clone()]))));
        assert!(is_strict(&stmts(json!([
            { "type": "EmptyStatement" },
            { "type": "FunctionDeclaration", "id": ident("f"), "params": [],
              "body": { "type": "BlockStatement", "body": [] } },
            use_strict.clone()
        ]))));
        assert!(!is_strict(&stmts(json!([
            { "type": "ExpressionStatement", "expression": ident("x") },
            use_strict
        ]))));
        assert!(!is_strict(&[]));
    }

    #[test]
    fn test_expected_argument_count() {
        let f = function(json!({
            "type": "FunctionExpression",
            "params": [
                ident("a"),
                { "type": "ObjectPattern", "properties": [
                    { "type": "Property", "key": ident("x"), "value": ident("x") },
                    { "type": "Property", "key": ident("y"), "value": ident("y") }
                ] },
                { "type": "ArrayPattern", "elements": [ident("p"), ident("q")] },
                { "type": "AssignmentPattern", "left": ident("d"), "right": { "type": "Literal", "value": 1 } },
                { "type": "RestElement", "argument": ident("r") }
            ],
            "body": { "type": "BlockStatement", "body": [] }
        }));
        assert_eq!(expected_argument_count(&f.params), 3);
        assert_eq!(f.params.bound_names(), vec!["a", "x", "y", "p", "q", "d", "r"]);
    }
}
