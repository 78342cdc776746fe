//! Wire encoding of the compiled forest
//!
//! Units encode as JSON objects; nested units are embedded where an operand
//! or declaration references them. Names are indices into the identifier
//! table, which only the root carries. Flags encode as 0/1 and empty
//! optional sections are left out.

use super::code::*;
use super::intern::Symbol;
use crate::error::Result;
use serde_json::{json, Map, Value};

fn flag(b: bool) -> Value {
    Value::from(b as u8)
}

fn symbol(s: Symbol) -> Value {
    Value::from(s.index())
}

fn symbols(list: &[Symbol]) -> Value {
    Value::Array(list.iter().copied().map(symbol).collect())
}

impl CompiledProgram {
    /// Encode the whole forest, rooted at the top-level unit
    pub fn to_json(&self) -> Value {
        let mut root = self.unit_to_json(self.root);
        if let Value::Object(map) = &mut root {
            map.insert("identifiers".into(), json!(self.identifiers()));
        }
        root
    }

    /// Encode the forest as JSON text
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let value = self.to_json();
        Ok(if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        })
    }

    fn unit_to_json(&self, id: UnitId) -> Value {
        let code = self.unit(id);
        let mut map = Map::new();

        map.insert("type".into(), Value::from(code.kind.id()));
        if let Some(name) = code.name {
            map.insert("name".into(), symbol(name));
        }
        map.insert(
            "params".into(),
            json!([
                symbols(&code.params.formals),
                symbols(&code.params.bound_names),
                code.params.rest.map(symbol).unwrap_or(Value::Null),
                code.params.expected_argument_count,
            ]),
        );
        map.insert(
            "ops".into(),
            Value::Array(code.instructions.iter().map(|op| self.operation_to_json(op)).collect()),
        );

        if !code.var_declared_names.is_empty() {
            map.insert("vars".into(), symbols(&code.var_declared_names));
        }
        if !code.lexical_declarations.is_empty() {
            map.insert("decls".into(), self.declarations_to_json(&code.lexical_declarations));
        }
        if !code.entry_regions.is_empty() {
            let regions = code
                .entry_regions
                .iter()
                .map(|h| json!([h.kind as u8, h.begin, h.end]))
                .collect();
            map.insert("entrances".into(), Value::Array(regions));
        }

        for (key, set) in [
            ("strict", code.strict),
            ("needsSuper", code.needs_super_binding),
            ("isGlobal", code.is_global),
            ("eval", code.kind == FunctionKind::Eval),
            ("natives", code.natives),
        ] {
            if set {
                map.insert(key.into(), flag(true));
            }
        }

        Value::Object(map)
    }

    fn operation_to_json(&self, op: &Operation) -> Value {
        let mut out = Vec::with_capacity(op.operands.len() + 1);
        out.push(Value::from(op.opcode.id()));
        out.extend(op.operands.iter().map(|operand| self.operand_to_json(operand)));
        Value::Array(out)
    }

    fn operand_to_json(&self, operand: &Operand) -> Value {
        match operand {
            Operand::Address(addr) => Value::from(*addr),
            Operand::Pending | Operand::Null => Value::Null,
            Operand::Flag(b) => flag(*b),
            Operand::Int(n) => Value::from(*n),
            Operand::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Operand::Boolean(b) => Value::Bool(*b),
            Operand::Name(s) | Operand::Str(s) => symbol(*s),
            Operand::RegExp { pattern, flags } => json!([pattern.index(), flags.index()]),
            Operand::Unit(id) => self.unit_to_json(*id),
            Operand::Kind(kind) => Value::from(kind.as_str()),
            Operand::Names(names) => symbols(names),
            Operand::Declarations(decls) => self.declarations_to_json(decls),
            Operand::Methods(methods) => Value::Array(
                methods
                    .iter()
                    .map(|m| {
                        let mut entry = vec![
                            Value::from(m.kind.as_str()),
                            flag(m.is_static),
                            self.unit_to_json(m.code),
                        ];
                        if let Some(name) = m.name {
                            entry.push(symbol(name));
                        }
                        Value::Array(entry)
                    })
                    .collect(),
            ),
        }
    }

    fn declarations_to_json(&self, decls: &[Declaration]) -> Value {
        Value::Array(
            decls
                .iter()
                .map(|d| {
                    let mut entry = vec![
                        Value::from(d.kind.as_str()),
                        flag(d.is_constant),
                        symbols(&d.bound_names),
                    ];
                    if let Some(code) = d.code {
                        entry.push(self.unit_to_json(code));
                    }
                    Value::Array(entry)
                })
                .collect(),
        )
    }
}
