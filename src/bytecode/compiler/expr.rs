//! Expression emission
//!
//! Identifier and member expressions leave a reference on the stack; every
//! other expression leaves a value. [`Emitter::compile_expr`] reports which
//! one it produced so [`Emitter::compile_value`] can dereference only when
//! needed.

use super::pattern::property_key_name;
use super::{BindingMode, Emitter};
use crate::analysis::is_super_reference;
use crate::ast::*;
use crate::bytecode::code::{self, FunctionKind, Operand, UpdateFlags};
use crate::bytecode::opcode::Opcode;
use crate::error::{messages, Error, Result};

impl<'c, 'a> Emitter<'c, 'a> {
    /// Compile an expression and leave its value on the stack
    pub(super) fn compile_value(&mut self, expr: &'a Expression) -> Result<()> {
        if self.compile_expr(expr)? {
            self.record(Opcode::Get, vec![]);
        }
        Ok(())
    }

    /// Compile an expression; returns true when it left a reference
    pub(super) fn compile_expr(&mut self, expr: &'a Expression) -> Result<bool> {
        match expr {
            Expression::Identifier(id) => {
                if id.name == "super" {
                    return Err(Error::structural(messages::illegal_super(), id.span));
                }
                let name = self.intern(&id.name);
                self.record(Opcode::Resolve, vec![Operand::Name(name)]);
                Ok(true)
            }
            Expression::NativeIdentifier(id) => {
                let name = self.intern(&id.name);
                self.record(Opcode::NativeResolve, vec![Operand::Name(name)]);
                Ok(true)
            }
            Expression::Member(member) => {
                self.compile_member(member)?;
                Ok(true)
            }
            Expression::Super(span) => Err(Error::structural(messages::illegal_super(), *span)),
            Expression::Spread(spread) => Err(Error::structural(
                "Spread is only allowed in array literals",
                spread.span,
            )),
            other => {
                self.compile_rvalue(other)?;
                Ok(false)
            }
        }
    }

    fn compile_rvalue(&mut self, expr: &'a Expression) -> Result<()> {
        match expr {
            Expression::Literal(lit) => self.compile_literal(lit),
            Expression::This(_) => {
                self.record(Opcode::This, vec![]);
            }
            Expression::Array(arr) => self.compile_array(arr)?,
            Expression::Object(obj) => self.compile_object(obj)?,
            Expression::Function(func) => {
                let unit = self.queue_function(func, FunctionKind::Function);
                let name = match func.name() {
                    Some(name) => Operand::Name(self.intern(name)),
                    None => Operand::Null,
                };
                self.record(Opcode::Function, vec![name, Operand::Unit(unit)]);
            }
            Expression::Arrow(func) => {
                let unit = self.queue_function(func, FunctionKind::Arrow);
                self.record(Opcode::Function, vec![Operand::Null, Operand::Unit(unit)]);
            }
            Expression::Class(class) => self.compile_class(class, true)?,
            Expression::Unary(unary) => self.compile_unary(unary)?,
            Expression::Update(update) => {
                self.compile_reference(&update.argument)?;
                let mut flags = UpdateFlags::empty();
                flags.set(UpdateFlags::PREFIX, update.prefix);
                flags.set(UpdateFlags::INCREMENT, update.operator == UpdateOperator::Increment);
                self.record(Opcode::Update, vec![Operand::Int(flags.bits() as u32)]);
            }
            Expression::Binary(binary) => {
                self.compile_value(&binary.left)?;
                self.compile_value(&binary.right)?;
                self.record(Opcode::Binary, vec![Operand::Int(binary.operator.id())]);
            }
            Expression::Logical(logical) => {
                self.compile_value(&logical.left)?;
                let short_circuit = logical.operator == LogicalOperator::Or;
                let end = self.emit_branch(Opcode::IfNe, short_circuit);
                self.compile_value(&logical.right)?;
                self.patch_jump(end)?;
            }
            Expression::Conditional(cond) => {
                self.compile_value(&cond.test)?;
                let alternate = self.emit_branch(Opcode::IfEq, false);
                self.compile_value(&cond.consequent)?;
                let end = self.emit_jump(Opcode::Jump);
                self.patch_jump(alternate)?;
                self.compile_value(&cond.alternate)?;
                self.patch_jump(end)?;
            }
            Expression::Assignment(assign) => self.compile_assignment(assign)?,
            Expression::Call(call) => self.compile_call(call)?,
            Expression::New(call) => {
                self.reject_spread(&call.arguments)?;
                self.compile_value(&call.callee)?;
                for argument in &call.arguments {
                    self.compile_value(argument)?;
                }
                self.record(Opcode::Construct, vec![Operand::Int(call.arguments.len() as u32)]);
            }
            Expression::Sequence(seq) => {
                for (index, item) in seq.expressions.iter().enumerate() {
                    if index > 0 {
                        self.record(Opcode::Pop, vec![]);
                    }
                    self.compile_value(item)?;
                }
            }
            Expression::Identifier(_)
            | Expression::NativeIdentifier(_)
            | Expression::Member(_)
            | Expression::Super(_)
            | Expression::Spread(_) => {
                return Err(Error::internal("reference expression compiled as a value"));
            }
        }
        Ok(())
    }

    fn compile_literal(&mut self, lit: &Literal) {
        let (opcode, operand) = match &lit.value {
            LiteralValue::Null => (Opcode::Literal, Operand::Null),
            LiteralValue::Boolean(b) => (Opcode::Literal, Operand::Boolean(*b)),
            LiteralValue::Number(n) => (Opcode::Literal, Operand::Number(*n)),
            LiteralValue::String(s) => (Opcode::String, Operand::Str(self.intern(s))),
            LiteralValue::RegExp { pattern, flags } => {
                let pattern = self.intern(pattern);
                let flags = self.intern(flags);
                (Opcode::RegExp, Operand::RegExp { pattern, flags })
            }
        };
        self.record(opcode, vec![operand]);
    }

    // ========== References ==========

    /// Compile an expression that must produce a reference
    fn compile_reference(&mut self, expr: &'a Expression) -> Result<()> {
        match expr {
            Expression::Identifier(_) | Expression::NativeIdentifier(_) | Expression::Member(_) => {
                self.compile_expr(expr)?;
                Ok(())
            }
            other => Err(Error::structural(
                messages::invalid_target("update"),
                other.span(),
            )),
        }
    }

    /// Push a property reference: `object GET MEMBER name` or the super forms
    pub(super) fn compile_member(&mut self, member: &'a MemberExpression) -> Result<()> {
        let is_super = is_super_reference(&member.object);
        if is_super {
            if !self.super_allowed {
                return Err(Error::structural(messages::illegal_super(), member.span));
            }
            self.record(Opcode::SuperGuard, vec![]);
        } else {
            self.compile_value(&member.object)?;
        }

        if member.computed {
            self.compile_value(&member.property)?;
            let opcode = if is_super { Opcode::SuperElement } else { Opcode::Element };
            self.record(opcode, vec![]);
            return Ok(());
        }

        let name = member.static_name().ok_or_else(|| {
            Error::structural("Property name must be an identifier", member.property.span())
        })?;
        let name = self.intern(name);
        let opcode = if is_super { Opcode::SuperMember } else { Opcode::Member };
        self.record(opcode, vec![Operand::Name(name)]);
        Ok(())
    }

    // ========== Operators ==========

    fn compile_unary(&mut self, unary: &'a UnaryExpression) -> Result<()> {
        match unary.operator {
            // These observe the reference itself
            UnaryOperator::Delete | UnaryOperator::TypeOf => {
                self.compile_expr(&unary.argument)?;
            }
            _ => self.compile_value(&unary.argument)?,
        }
        self.record(Opcode::Unary, vec![Operand::Int(unary.operator.id())]);
        Ok(())
    }

    fn compile_assignment(&mut self, assign: &'a AssignmentExpression) -> Result<()> {
        let compound = assign.operator.binary_operator();
        match (&assign.left, compound) {
            (Pattern::Identifier(_) | Pattern::Member(_), None) => {
                self.compile_target(&assign.left)?;
                self.compile_value(&assign.right)?;
                self.record(Opcode::Put, vec![]);
            }
            (Pattern::Identifier(_) | Pattern::Member(_), Some(op)) => {
                self.compile_target(&assign.left)?;
                self.record(Opcode::Dup, vec![]);
                self.record(Opcode::Get, vec![]);
                self.compile_value(&assign.right)?;
                self.record(Opcode::Binary, vec![Operand::Int(op.id())]);
                self.record(Opcode::Put, vec![]);
            }
            (pattern, None) if pattern.is_destructuring() => {
                // The assignment evaluates to its right-hand side
                self.compile_value(&assign.right)?;
                self.record(Opcode::Dup, vec![]);
                self.compile_binding(pattern, BindingMode::Assign)?;
            }
            (pattern, _) => {
                return Err(Error::structural(
                    messages::invalid_target("assignment"),
                    pattern.span(),
                ))
            }
        }
        Ok(())
    }

    /// Push the reference an identifier or member assignment target names
    fn compile_target(&mut self, target: &'a Pattern) -> Result<()> {
        match target {
            Pattern::Identifier(id) => {
                let name = self.intern(&id.name);
                self.record(Opcode::Resolve, vec![Operand::Name(name)]);
                Ok(())
            }
            Pattern::Member(member) => self.compile_member(member),
            other => Err(Error::structural(
                messages::invalid_target("assignment"),
                other.span(),
            )),
        }
    }

    // ========== Calls ==========

    fn reject_spread(&self, arguments: &[Expression]) -> Result<()> {
        match arguments.iter().find(|a| matches!(a, Expression::Spread(_))) {
            Some(spread) => Err(Error::structural(
                "Spread arguments are not supported",
                spread.span(),
            )),
            None => Ok(()),
        }
    }

    /// `callee DUP GET args CALL argc`; the duplicated reference supplies `this`
    fn compile_call(&mut self, call: &'a CallExpression) -> Result<()> {
        self.reject_spread(&call.arguments)?;

        let is_reference = if is_super_reference(&call.callee) {
            if !self.super_allowed {
                return Err(Error::structural(messages::illegal_super(), call.callee.span()));
            }
            self.record(Opcode::SuperCall, vec![]);
            true
        } else {
            self.compile_expr(&call.callee)?
        };

        self.record(Opcode::Dup, vec![]);
        if is_reference {
            self.record(Opcode::Get, vec![]);
        }
        for argument in &call.arguments {
            self.compile_value(argument)?;
        }
        self.record(Opcode::Call, vec![Operand::Int(call.arguments.len() as u32)]);
        Ok(())
    }

    // ========== Literals ==========

    fn compile_array(&mut self, arr: &'a ArrayExpression) -> Result<()> {
        self.record(Opcode::Array, vec![]);
        for element in &arr.elements {
            let (empty, spread) = match element {
                None => (true, false),
                Some(Expression::Spread(spread)) => {
                    self.compile_value(&spread.argument)?;
                    (false, true)
                }
                Some(item) => {
                    self.compile_value(item)?;
                    (false, false)
                }
            };
            self.record(Opcode::Index, vec![Operand::Flag(empty), Operand::Flag(spread)]);
        }
        self.record(Opcode::ArrayDone, vec![]);
        Ok(())
    }

    fn compile_object(&mut self, obj: &'a ObjectExpression) -> Result<()> {
        self.record(Opcode::Object, vec![]);
        for member in &obj.properties {
            let prop = match member {
                ObjectMember::Property(prop) => prop,
                ObjectMember::Spread(spread) => {
                    return Err(Error::structural(
                        "Object spread is not supported",
                        spread.span,
                    ))
                }
            };

            let static_name = property_key_name(&prop.key).filter(|_| !prop.computed);
            let kind = match prop.kind {
                PropertyKind::Get => Some(code::MethodKind::Get),
                PropertyKind::Set => Some(code::MethodKind::Set),
                PropertyKind::Init if prop.method => Some(code::MethodKind::Method),
                PropertyKind::Init => None,
            };

            match (kind, static_name) {
                (None, Some(name)) => {
                    self.compile_value(&prop.value)?;
                    let name = self.intern(&name);
                    self.record(Opcode::Property, vec![Operand::Name(name)]);
                }
                (None, None) => {
                    self.record(Opcode::Dup, vec![]);
                    self.compile_value(&prop.key)?;
                    self.record(Opcode::Element, vec![]);
                    self.compile_value(&prop.value)?;
                    self.record(Opcode::Put, vec![]);
                    self.record(Opcode::Pop, vec![]);
                }
                (Some(kind), name) => {
                    let func = match &prop.value {
                        Expression::Function(func) => func,
                        other => {
                            return Err(Error::structural(
                                "Accessor and method values must be functions",
                                other.span(),
                            ))
                        }
                    };
                    let unit = self.queue_method(func, name.as_deref());
                    let mut operands = vec![Operand::Kind(kind), Operand::Unit(unit)];
                    match name {
                        Some(name) => operands.push(Operand::Name(self.intern(&name))),
                        None => self.compile_value(&prop.key)?,
                    }
                    self.record(Opcode::Method, operands);
                }
            }
        }
        Ok(())
    }
}
