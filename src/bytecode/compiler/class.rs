//! Class emission

use super::pattern::property_key_name;
use super::Emitter;
use crate::ast::{self, Class, Expression};
use crate::bytecode::code::{ClassMethod, MethodKind, Operand};
use crate::bytecode::opcode::Opcode;
use crate::error::{Error, Result};

impl<'c, 'a> Emitter<'c, 'a> {
    /// Compile a class declaration or expression
    ///
    /// Every method body is queued as its own unit. The superclass value and
    /// any computed method keys are pushed, in that order, before the class
    /// instruction so the VM can link the prototype chain when it builds the
    /// class.
    pub(super) fn compile_class(&mut self, class: &'a Class, is_expression: bool) -> Result<()> {
        if !is_expression && class.id.is_none() {
            return Err(Error::structural("Class declaration requires a name", class.span));
        }

        if let Some(super_class) = &class.super_class {
            self.compile_value(super_class)?;
        }

        let mut constructor = None;
        let mut methods = Vec::new();
        for def in &class.body.body {
            let func = match &def.value {
                Expression::Function(func) => func,
                other => {
                    return Err(Error::structural("Class members must be methods", other.span()))
                }
            };
            let name = property_key_name(&def.key).filter(|_| !def.computed);

            let is_constructor = def.kind == ast::MethodKind::Constructor
                || (!def.is_static && name.as_deref() == Some("constructor"));
            if is_constructor {
                if constructor.is_some() {
                    return Err(Error::structural("A class may only have one constructor", def.span));
                }
                constructor = Some(self.queue_method(func, name.as_deref()));
                continue;
            }

            let code = self.queue_method(func, name.as_deref());
            let kind = match def.kind {
                ast::MethodKind::Get => MethodKind::Get,
                ast::MethodKind::Set => MethodKind::Set,
                ast::MethodKind::Method | ast::MethodKind::Constructor => MethodKind::Method,
            };
            let name = match name {
                Some(name) => Some(self.intern(&name)),
                None => {
                    self.compile_value(&def.key)?;
                    None
                }
            };
            methods.push(ClassMethod {
                kind,
                is_static: def.is_static,
                code,
                name,
            });
        }

        let name = match &class.id {
            Some(id) => Operand::Name(self.intern(&id.name)),
            None => Operand::Null,
        };
        let mut operands = vec![
            name,
            Operand::Flag(class.super_class.is_some()),
            Operand::Methods(methods),
        ];
        if let Some(ctor) = constructor {
            operands.push(Operand::Unit(ctor));
        }

        let opcode = if is_expression { Opcode::ClassExpr } else { Opcode::ClassDecl };
        self.record(opcode, operands);
        Ok(())
    }
}
