//! Shared test helpers for integration tests
//!
//! Syntax trees are built as ESTree JSON, the same shape the external
//! parser hands the compiler.

#![allow(dead_code)]

use esbc::{compile, CompiledProgram, CompilerOptions, Program};
use serde_json::{json, Value};

// ========== Compiling ==========

/// Compile a program body with default options
pub fn compile_body(body: Vec<Value>) -> esbc::Result<CompiledProgram> {
    compile_body_with(body, CompilerOptions::new())
}

/// Compile a program body with explicit options
pub fn compile_body_with(body: Vec<Value>, options: CompilerOptions) -> esbc::Result<CompiledProgram> {
    let program = Program::from_value(program(body))?;
    compile(&program, options)
}

/// Compile a program body that must succeed
pub fn compiled(body: Vec<Value>) -> CompiledProgram {
    compile_body(body).unwrap()
}

/// Compile a program body that must fail
pub fn compile_error(body: Vec<Value>) -> esbc::Error {
    match compile_body(body) {
        Ok(_) => panic!("expected a compile error"),
        Err(err) => err,
    }
}

/// Root listing in compact form: `IFEQ 9, false`
pub fn root_ops(body: Vec<Value>) -> Vec<String> {
    let program = compiled(body);
    compact(program.listing(program.root().id))
}

/// Listing of the first unit named `name`, in compact form
pub fn unit_ops(program: &CompiledProgram, name: &str) -> Vec<String> {
    let listing = program
        .listing_of(name)
        .unwrap_or_else(|| panic!("no unit named {}", name));
    compact(listing)
}

/// Drop addresses and column padding from listing lines
pub fn compact(listing: Vec<String>) -> Vec<String> {
    listing
        .into_iter()
        .map(|line| {
            let rest = line.get(6..).unwrap_or("");
            match rest.split_once(' ') {
                Some((name, operands)) => format!("{} {}", name, operands.trim_start()),
                None => rest.to_string(),
            }
        })
        .collect()
}

/// Count occurrences of a mnemonic in a compact listing
pub fn count(ops: &[String], mnemonic: &str) -> usize {
    ops.iter()
        .filter(|op| op.split(' ').next() == Some(mnemonic))
        .count()
}

// ========== Tree builders ==========

pub fn program(body: Vec<Value>) -> Value {
    json!({ "type": "Program", "body": body })
}

pub fn ident(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

pub fn num(n: f64) -> Value {
    json!({ "type": "Literal", "value": n })
}

pub fn string(s: &str) -> Value {
    json!({ "type": "Literal", "value": s })
}

pub fn boolean(b: bool) -> Value {
    json!({ "type": "Literal", "value": b })
}

pub fn expr(expression: Value) -> Value {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

pub fn block(body: Vec<Value>) -> Value {
    json!({ "type": "BlockStatement", "body": body })
}

pub fn declare(kind: &str, id: Value, init: Option<Value>) -> Value {
    json!({ "type": "VariableDeclaration", "kind": kind, "declarations": [
        { "type": "VariableDeclarator", "id": id, "init": init }
    ] })
}

pub fn var(name: &str, init: Value) -> Value {
    declare("var", ident(name), Some(init))
}

pub fn let_(name: &str, init: Value) -> Value {
    declare("let", ident(name), Some(init))
}

pub fn call(callee: Value, arguments: Vec<Value>) -> Value {
    json!({ "type": "CallExpression", "callee": callee, "arguments": arguments })
}

pub fn member(object: Value, property: &str) -> Value {
    json!({ "type": "MemberExpression", "object": object, "property": ident(property), "computed": false })
}

pub fn assign(left: Value, right: Value) -> Value {
    json!({ "type": "AssignmentExpression", "operator": "=", "left": left, "right": right })
}

pub fn binary(operator: &str, left: Value, right: Value) -> Value {
    json!({ "type": "BinaryExpression", "operator": operator, "left": left, "right": right })
}

pub fn if_(test: Value, consequent: Value, alternate: Option<Value>) -> Value {
    json!({ "type": "IfStatement", "test": test, "consequent": consequent, "alternate": alternate })
}

pub fn while_(test: Value, body: Value) -> Value {
    json!({ "type": "WhileStatement", "test": test, "body": body })
}

pub fn for_of(left: Value, right: Value, body: Value) -> Value {
    json!({ "type": "ForOfStatement", "left": left, "right": right, "body": body })
}

pub fn for_in(left: Value, right: Value, body: Value) -> Value {
    json!({ "type": "ForInStatement", "left": left, "right": right, "body": body })
}

pub fn labeled(label: &str, body: Value) -> Value {
    json!({ "type": "LabeledStatement", "label": ident(label), "body": body })
}

pub fn break_(label: Option<&str>) -> Value {
    json!({ "type": "BreakStatement", "label": label.map(ident) })
}

pub fn continue_(label: Option<&str>) -> Value {
    json!({ "type": "ContinueStatement", "label": label.map(ident) })
}

pub fn return_(argument: Option<Value>) -> Value {
    json!({ "type": "ReturnStatement", "argument": argument })
}

pub fn throw(argument: Value) -> Value {
    json!({ "type": "ThrowStatement", "argument": argument })
}

pub fn try_(body: Vec<Value>, handler: Option<(&str, Vec<Value>)>, finalizer: Option<Vec<Value>>) -> Value {
    json!({
        "type": "TryStatement",
        "block": block(body),
        "handler": handler.map(|(param, body)| json!({
            "type": "CatchClause", "param": ident(param), "body": block(body)
        })),
        "finalizer": finalizer.map(block)
    })
}

pub fn function(name: Option<&str>, params: Vec<Value>, body: Vec<Value>) -> Value {
    json!({ "type": "FunctionExpression", "id": name.map(ident), "params": params, "body": block(body) })
}

pub fn function_decl(name: &str, params: Vec<Value>, body: Vec<Value>) -> Value {
    json!({ "type": "FunctionDeclaration", "id": ident(name), "params": params, "body": block(body) })
}

pub fn arrow(params: Vec<Value>, body: Value) -> Value {
    json!({ "type": "ArrowFunctionExpression", "params": params, "body": body })
}

pub fn array_pattern(elements: Vec<Value>) -> Value {
    json!({ "type": "ArrayPattern", "elements": elements })
}

pub fn object_pattern(properties: Vec<Value>) -> Value {
    json!({ "type": "ObjectPattern", "properties": properties })
}

pub fn pattern_property(key: &str, value: Value) -> Value {
    json!({ "type": "Property", "key": ident(key), "value": value })
}

pub fn rest(argument: Value) -> Value {
    json!({ "type": "RestElement", "argument": argument })
}

pub fn default_value(left: Value, right: Value) -> Value {
    json!({ "type": "AssignmentPattern", "left": left, "right": right })
}

pub fn switch(discriminant: Value, cases: Vec<(Option<Value>, Vec<Value>)>) -> Value {
    let cases: Vec<Value> = cases
        .into_iter()
        .map(|(test, consequent)| json!({ "type": "SwitchCase", "test": test, "consequent": consequent }))
        .collect();
    json!({ "type": "SwitchStatement", "discriminant": discriminant, "cases": cases })
}

pub fn method(key: &str, kind: &str, is_static: bool, body: Vec<Value>) -> Value {
    json!({ "type": "MethodDefinition", "key": ident(key), "kind": kind, "static": is_static,
            "value": function(None, vec![], body) })
}

pub fn class_decl(name: &str, super_class: Option<Value>, methods: Vec<Value>) -> Value {
    json!({ "type": "ClassDeclaration", "id": ident(name), "superClass": super_class,
            "body": { "type": "ClassBody", "body": methods } })
}

pub fn super_member(property: &str) -> Value {
    json!({ "type": "MemberExpression", "object": { "type": "Super" },
            "property": ident(property), "computed": false })
}
