//! Destructuring and binding emission
//!
//! Every binding form consumes the value on top of the stack. Object and
//! array patterns keep their source on the stack while the leaves are bound
//! and drop it at the end.

use super::{BindingMode, Emitter};
use crate::ast::*;
use crate::bytecode::code::Operand;
use crate::bytecode::opcode::Opcode;
use crate::error::{Error, Result};

impl<'c, 'a> Emitter<'c, 'a> {
    /// Bind the value on top of the stack to `pattern`, consuming it
    pub(super) fn compile_binding(&mut self, pattern: &'a Pattern, mode: BindingMode) -> Result<()> {
        match pattern {
            Pattern::Identifier(id) => self.bind_name(id, mode),
            Pattern::Member(member) => {
                if mode != BindingMode::Assign {
                    return Err(Error::structural(
                        "Member expressions cannot be declared",
                        member.span,
                    ));
                }
                self.compile_member(member)?;
                self.store_rotated();
                Ok(())
            }
            Pattern::Assignment(a) => {
                self.compile_default(&a.right)?;
                self.compile_binding(&a.left, mode)
            }
            Pattern::Object(obj) => self.compile_object_pattern(obj, mode),
            Pattern::Array(arr) => self.compile_array_pattern(arr, mode),
            Pattern::Rest(rest) => Err(Error::structural(
                "Rest element must be last element of an array or object pattern",
                rest.span,
            )),
        }
    }

    fn bind_name(&mut self, id: &Identifier, mode: BindingMode) -> Result<()> {
        let name = self.intern(&id.name);
        let opcode = match mode {
            BindingMode::Var => Opcode::Var,
            BindingMode::Let => Opcode::Let,
            BindingMode::Const => Opcode::Const,
            BindingMode::Assign => {
                self.record(Opcode::Resolve, vec![Operand::Name(name)]);
                self.store_rotated();
                return Ok(());
            }
        };
        self.record(opcode, vec![Operand::Name(name)]);
        Ok(())
    }

    /// value ref → store value through ref, leaving nothing
    fn store_rotated(&mut self) {
        self.record(Opcode::Rotate, vec![Operand::Int(1)]);
        self.record(Opcode::Put, vec![]);
        self.record(Opcode::Pop, vec![]);
    }

    /// Replace an undefined value on top of the stack with `default`
    pub(super) fn compile_default(&mut self, default: &'a Expression) -> Result<()> {
        self.record(Opcode::Dup, vec![]);
        self.record(Opcode::Undefined, vec![]);
        self.record(Opcode::Binary, vec![Operand::Int(BinaryOperator::StrictEq.id())]);
        let skip = self.emit_branch(Opcode::IfEq, false);
        self.record(Opcode::Pop, vec![]);
        self.compile_value(default)?;
        self.patch_jump(skip)
    }

    fn compile_object_pattern(&mut self, obj: &'a ObjectPattern, mode: BindingMode) -> Result<()> {
        let mut seen = Vec::new();
        let has_rest = obj
            .properties
            .iter()
            .any(|p| matches!(p, ObjectPatternProperty::Rest(_)));

        for prop in &obj.properties {
            match prop {
                ObjectPatternProperty::Property(p) => {
                    self.record(Opcode::Dup, vec![]);
                    match property_key_name(&p.key).filter(|_| !p.computed) {
                        Some(key) => {
                            let name = self.intern(&key);
                            seen.push(name);
                            self.record(Opcode::Member, vec![Operand::Name(name)]);
                        }
                        None => {
                            if has_rest {
                                return Err(Error::structural(
                                    "Computed keys cannot be combined with a rest property",
                                    p.span,
                                ));
                            }
                            self.compile_value(&p.key)?;
                            self.record(Opcode::Element, vec![]);
                        }
                    }
                    self.record(Opcode::Get, vec![]);
                    self.compile_binding(&p.value, mode)?;
                }
                ObjectPatternProperty::Rest(rest) => {
                    self.record(Opcode::Dup, vec![]);
                    self.record(Opcode::ObjectRest, vec![Operand::Names(seen.clone())]);
                    self.compile_binding(&rest.argument, mode)?;
                }
            }
        }

        self.record(Opcode::Pop, vec![]);
        Ok(())
    }

    fn compile_array_pattern(&mut self, arr: &'a ArrayPattern, mode: BindingMode) -> Result<()> {
        for (index, element) in arr.elements.iter().enumerate() {
            match element {
                None => {}
                Some(Pattern::Rest(rest)) => {
                    self.record(Opcode::Dup, vec![]);
                    self.record(Opcode::ArrayRest, vec![Operand::Int(index as u32)]);
                    self.compile_binding(&rest.argument, mode)?;
                }
                Some(element) => {
                    self.record(Opcode::Dup, vec![]);
                    self.record(Opcode::Literal, vec![Operand::Number(index as f64)]);
                    self.record(Opcode::Element, vec![]);
                    self.record(Opcode::Get, vec![]);
                    self.compile_binding(element, mode)?;
                }
            }
        }

        self.record(Opcode::Pop, vec![]);
        Ok(())
    }
}

/// Static name of a property key: identifiers, strings and numbers
pub(super) fn property_key_name(key: &Expression) -> Option<String> {
    match key {
        Expression::Identifier(id) => Some(id.name.clone()),
        Expression::Literal(Literal {
            value: LiteralValue::String(s),
            ..
        }) => Some(s.clone()),
        Expression::Literal(Literal {
            value: LiteralValue::Number(n),
            ..
        }) => Some(number_key(*n)),
        _ => None,
    }
}

/// Property key text of a number, matching the language's number-to-string
///
/// Shortest round-trip digits; plain notation for decimal exponents in
/// `-7 < e < 21`, exponent notation (`1e+21`, `1e-7`) outside it.
fn number_key(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-Infinity" } else { "Infinity" }.to_string();
    }
    if n < 0.0 {
        return format!("-{}", number_key(-n));
    }

    // `{:e}` yields the shortest digits as `d.ddde<exp>`
    let formatted = format!("{:e}", n);
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let point = exponent.parse::<i32>().unwrap_or(0) + 1;

    if k <= point && point <= 21 {
        format!("{}{}", digits, "0".repeat((point - k) as usize))
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(point as usize);
        format!("{}.{}", int, frac)
    } else if -6 < point && point <= 0 {
        format!("0.{}{}", "0".repeat((-point) as usize), digits)
    } else {
        let sign = if point - 1 < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        let exp = (point - 1).abs();
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exp)
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exp)
        }
    }
}
