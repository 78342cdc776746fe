//! Statement emission

use super::control::{LevelKind, TargetKind};
use super::{BindingMode, Emitter};
use crate::analysis::{self, BoundNames, DeclarationKind, LexicalDeclaration};
use crate::ast::*;
use crate::bytecode::code::{EntryKind, Operand};
use crate::bytecode::opcode::Opcode;
use crate::error::{Error, Result};

impl<'c, 'a> Emitter<'c, 'a> {
    pub(super) fn compile_statements(&mut self, stmts: &'a [Statement]) -> Result<()> {
        for stmt in stmts {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    fn compile_statement(&mut self, stmt: &'a Statement) -> Result<()> {
        match stmt {
            Statement::Block(block) => self.compile_block(&block.body),
            Statement::Empty(_) => Ok(()),
            Statement::Expression(e) => {
                self.compile_value(&e.expression)?;
                let opcode = if self.kind.completes() { Opcode::Save } else { Opcode::Pop };
                self.record(opcode, vec![]);
                Ok(())
            }
            Statement::If(i) => self.compile_if(i),
            Statement::Labeled(l) => self.compile_labeled(l),
            Statement::Break(b) => {
                self.compile_jump_out(b.label.as_ref().map(|l| l.name.as_str()), false, b.span)
            }
            Statement::Continue(c) => {
                self.compile_jump_out(c.label.as_ref().map(|l| l.name.as_str()), true, c.span)
            }
            Statement::With(w) => self.compile_with(w),
            Statement::Switch(s) => self.compile_switch(s),
            Statement::Return(r) => self.compile_return(r),
            Statement::Throw(t) => {
                self.compile_value(&t.argument)?;
                self.record(Opcode::Throw, vec![]);
                Ok(())
            }
            Statement::Try(t) => self.compile_try(t),
            Statement::While(w) => self.compile_while(w),
            Statement::DoWhile(d) => self.compile_do_while(d),
            Statement::For(f) => self.compile_for(f),
            Statement::ForIn(f) => self.compile_for_in_of(f, LevelKind::ForIn),
            Statement::ForOf(f) => self.compile_for_in_of(f, LevelKind::ForOf),
            Statement::Debugger(_) => {
                self.record(Opcode::Debugger, vec![]);
                Ok(())
            }
            // Instantiated by the scope that declares it
            Statement::FunctionDeclaration(_) => Ok(()),
            Statement::VariableDeclaration(d) => self.compile_variable_declaration(d),
            Statement::ClassDeclaration(c) => self.compile_class(c, false),
        }
    }

    /// A statement in single-statement position gets its own scope if it declares
    fn compile_substatement(&mut self, stmt: &'a Statement) -> Result<()> {
        match stmt {
            Statement::FunctionDeclaration(_) | Statement::ClassDeclaration(_) => {
                self.compile_block(std::slice::from_ref(stmt))
            }
            Statement::VariableDeclaration(d) if d.kind.is_lexical() => {
                self.compile_block(std::slice::from_ref(stmt))
            }
            _ => self.compile_statement(stmt),
        }
    }

    // ========== Scopes ==========

    pub(super) fn compile_block(&mut self, stmts: &'a [Statement]) -> Result<()> {
        let decls = analysis::lexical_declarations(stmts);
        if decls.is_empty() {
            return self.compile_statements(stmts);
        }
        self.compile_scoped(decls, |this| this.compile_statements(stmts))
    }

    /// Wrap `body` in BLOCK/BLOCK_EXIT with an ENV region and a Block level
    pub(super) fn compile_scoped(
        &mut self,
        decls: Vec<LexicalDeclaration<'a>>,
        body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let decls = self.block_declarations(decls);
        let begin = self.record(Opcode::Block, vec![Operand::Declarations(decls)]);
        self.push_level(LevelKind::Block);
        body(self)?;
        self.pop_level()?;
        self.record(Opcode::BlockExit, vec![]);
        let end = self.current();
        self.add_region(EntryKind::Env, begin, end);
        Ok(())
    }

    fn compile_with(&mut self, w: &'a WithStatement) -> Result<()> {
        if self.code().strict {
            return Err(Error::structural(
                "Strict mode code may not include a with statement",
                w.span,
            ));
        }
        self.compile_value(&w.object)?;
        let begin = self.record(Opcode::With, vec![]);
        self.push_level(LevelKind::With);
        self.compile_substatement(&w.body)?;
        self.pop_level()?;
        self.record(Opcode::BlockExit, vec![]);
        let end = self.current();
        self.add_region(EntryKind::Env, begin, end);
        Ok(())
    }

    // ========== Declarations ==========

    fn compile_variable_declaration(&mut self, decl: &'a VariableDeclaration) -> Result<()> {
        let mode = BindingMode::from(decl.kind);
        for declarator in &decl.declarations {
            if mode == BindingMode::Var {
                self.declare_var_names(&declarator.id);
                if let Some(init) = &declarator.init {
                    self.compile_value(init)?;
                    self.compile_binding(&declarator.id, mode)?;
                }
            } else {
                match &declarator.init {
                    Some(init) => self.compile_value(init)?,
                    None => {
                        self.record(Opcode::Undefined, vec![]);
                    }
                }
                self.compile_binding(&declarator.id, mode)?;
            }
        }
        Ok(())
    }

    /// Register hoisted var names, one entry per declarator occurrence
    fn declare_var_names(&mut self, pattern: &Pattern) {
        for name in pattern.bound_names() {
            let symbol = self.intern(name);
            self.code_mut().var_declared_names.push(symbol);
        }
    }

    // ========== Conditionals ==========

    fn compile_if(&mut self, stmt: &'a IfStatement) -> Result<()> {
        self.compile_value(&stmt.test)?;
        let else_jump = self.emit_branch(Opcode::IfEq, false);
        self.compile_substatement(&stmt.consequent)?;

        match &stmt.alternate {
            Some(alternate) => {
                let end_jump = self.emit_jump(Opcode::Jump);
                self.patch_jump(else_jump)?;
                self.compile_substatement(alternate)?;
                self.patch_jump(end_jump)
            }
            None => self.patch_jump(else_jump),
        }
    }

    /// The discriminant is evaluated outside the scope the cases declare into
    fn compile_switch(&mut self, switch: &'a SwitchStatement) -> Result<()> {
        self.compile_value(&switch.discriminant)?;
        let decls = analysis::switch_lexical_declarations(switch);
        if decls.is_empty() {
            self.compile_switch_body(switch)
        } else {
            self.compile_scoped(decls, |this| this.compile_switch_body(switch))
        }
    }

    /// Dispatch on every case test first, then emit the bodies in order
    fn compile_switch_body(&mut self, switch: &'a SwitchStatement) -> Result<()> {
        self.push_entry(TargetKind::Switch);

        let mut dispatch = Vec::new();
        let mut default_case = None;
        for (index, case) in switch.cases.iter().enumerate() {
            match &case.test {
                Some(test) => {
                    self.compile_value(test)?;
                    dispatch.push((index, self.emit_jump(Opcode::Case)));
                }
                None if default_case.is_none() => default_case = Some(index),
                None => {}
            }
        }

        let fallthrough = match default_case {
            Some(index) => {
                dispatch.push((index, self.emit_jump(Opcode::Default)));
                None
            }
            None => {
                self.record(Opcode::Pop, vec![]);
                Some(self.emit_jump(Opcode::Jump))
            }
        };

        let mut bodies = Vec::with_capacity(switch.cases.len());
        for case in &switch.cases {
            bodies.push(self.current());
            self.compile_statements(&case.consequent)?;
        }

        let end = self.current();
        for (index, jump) in dispatch {
            self.patch_jump_to(jump, bodies[index])?;
        }
        if let Some(jump) = fallthrough {
            self.patch_jump_to(jump, end)?;
        }
        self.pop_entry(end, None)
    }

    // ========== Labels ==========

    fn compile_labeled(&mut self, stmt: &'a LabeledStatement) -> Result<()> {
        self.push_label(&stmt.label.name, stmt.label.span)?;
        match &stmt.body {
            Statement::Labeled(inner) => self.compile_labeled(inner),
            Statement::Block(block) => {
                self.push_entry(TargetKind::Block);
                self.compile_block(&block.body)?;
                let end = self.current();
                self.pop_entry(end, None)
            }
            body if body.is_iteration() || matches!(body, Statement::Switch(_)) => {
                self.compile_statement(body)
            }
            other => Err(Error::label(
                format!(
                    "Label '{}' must name a loop, switch or block statement",
                    stmt.label.name
                ),
                other.span(),
            )),
        }
    }

    // ========== Loops ==========

    fn compile_while(&mut self, stmt: &'a WhileStatement) -> Result<()> {
        self.push_entry(TargetKind::Loop);
        let start = self.current();
        self.compile_value(&stmt.test)?;
        let exit = self.emit_branch(Opcode::IfEq, false);
        self.compile_substatement(&stmt.body)?;
        self.record(Opcode::Jump, vec![Operand::Address(start)]);
        self.patch_jump(exit)?;
        let end = self.current();
        self.pop_entry(end, Some(start))
    }

    fn compile_do_while(&mut self, stmt: &'a DoWhileStatement) -> Result<()> {
        self.push_entry(TargetKind::Loop);
        let start = self.current();
        self.compile_substatement(&stmt.body)?;
        let test = self.current();
        self.compile_value(&stmt.test)?;
        self.record(Opcode::IfEq, vec![Operand::Address(start), Operand::Flag(true)]);
        let end = self.current();
        self.pop_entry(end, Some(test))
    }

    fn compile_for(&mut self, stmt: &'a ForStatement) -> Result<()> {
        match &stmt.init {
            Some(ForInit::Declaration(decl)) if decl.kind.is_lexical() => {
                let decls = analysis::variable_lexical_declaration(decl).into_iter().collect();
                self.compile_scoped(decls, |this| this.compile_for_loop(stmt))
            }
            _ => self.compile_for_loop(stmt),
        }
    }

    fn compile_for_loop(&mut self, stmt: &'a ForStatement) -> Result<()> {
        match &stmt.init {
            Some(ForInit::Declaration(decl)) => self.compile_variable_declaration(decl)?,
            Some(ForInit::Expression(expr)) => {
                self.compile_value(expr)?;
                self.record(Opcode::Pop, vec![]);
            }
            None => {}
        }

        self.push_entry(TargetKind::Loop);
        let test = self.current();
        let exit = match &stmt.test {
            Some(cond) => {
                self.compile_value(cond)?;
                Some(self.emit_branch(Opcode::IfEq, false))
            }
            None => None,
        };

        self.compile_substatement(&stmt.body)?;

        let update = self.current();
        if let Some(expr) = &stmt.update {
            self.compile_value(expr)?;
            self.record(Opcode::Pop, vec![]);
        }
        self.record(Opcode::Jump, vec![Operand::Address(test)]);
        if let Some(exit) = exit {
            self.patch_jump(exit)?;
        }
        let end = self.current();
        self.pop_entry(end, Some(update))
    }

    /// for-in and for-of share one iteration protocol: ENUM or ITERATE
    /// creates the iterator, NEXT advances it, and the iterator slot is
    /// popped on every way out
    fn compile_for_in_of(&mut self, stmt: &'a ForInOfStatement, level: LevelKind) -> Result<()> {
        self.compile_value(&stmt.right)?;
        let opcode = if level == LevelKind::ForOf { Opcode::Iterate } else { Opcode::Enum };
        self.record(opcode, vec![]);

        self.push_level(level);
        self.push_entry(TargetKind::Loop);
        let update = self.current();
        let done = self.emit_jump(Opcode::Next);

        match &stmt.left {
            ForInLeft::Declaration(decl) => {
                let declarator = match decl.declarations.as_slice() {
                    [declarator] => declarator,
                    _ => {
                        return Err(Error::structural(
                            "for-in/for-of declarations must declare exactly one binding",
                            decl.span,
                        ))
                    }
                };
                match analysis::variable_lexical_declaration(decl) {
                    Some(lexical) => {
                        let mode = BindingMode::from(decl.kind);
                        self.compile_scoped(vec![lexical], |this| {
                            this.compile_binding(&declarator.id, mode)?;
                            this.compile_substatement(&stmt.body)
                        })?;
                    }
                    None => {
                        self.declare_var_names(&declarator.id);
                        self.compile_binding(&declarator.id, BindingMode::Var)?;
                        self.compile_substatement(&stmt.body)?;
                    }
                }
            }
            ForInLeft::Pattern(pattern) => {
                self.compile_binding(pattern, BindingMode::Assign)?;
                self.compile_substatement(&stmt.body)?;
            }
        }

        self.record(Opcode::Jump, vec![Operand::Address(update)]);
        let cleanup = self.current();
        self.patch_jump_to(done, cleanup)?;
        self.pop_entry(cleanup, Some(update))?;
        self.record(Opcode::Pop, vec![]);
        self.pop_level()?;
        Ok(())
    }

    // ========== Exits ==========

    fn compile_return(&mut self, stmt: &'a ReturnStatement) -> Result<()> {
        if self.kind.completes() {
            return Err(Error::structural("Illegal return statement", stmt.span));
        }
        match &stmt.argument {
            Some(argument) => self.compile_value(argument)?,
            None => {
                self.record(Opcode::Undefined, vec![]);
            }
        }
        self.compile_return_exit();
        Ok(())
    }

    /// try/catch/finally
    ///
    /// Layout with every part present:
    ///
    /// ```text
    /// begin:  <block>
    ///         JUMP normal          ; TRYCATCH [begin, here)
    ///         <catch> JUMP normal  ; TRYCATCH [begin, here) around block and catches
    ///         JSR finally, false   ; exception path
    ///         THROW
    /// normal: JSR finally, false
    ///         JUMP done
    /// finally: <finalizer> RET
    /// done:
    /// ```
    fn compile_try(&mut self, stmt: &'a TryStatement) -> Result<()> {
        if stmt.handlers.is_empty() && stmt.finalizer.is_none() {
            return Err(Error::structural("Missing catch or finally after try", stmt.span));
        }

        if stmt.finalizer.is_some() {
            self.push_level(LevelKind::Finally);
        }

        let begin = self.current();
        self.compile_block(&stmt.block.body)?;
        let try_end = self.emit_jump(Opcode::Jump);
        self.add_region(EntryKind::TryCatch, begin, try_end);

        let mut exits = vec![try_end];
        let count = stmt.handlers.len();
        for (index, handler) in stmt.handlers.iter().enumerate() {
            self.compile_catch(handler)?;
            if stmt.finalizer.is_some() || index + 1 < count {
                exits.push(self.emit_jump(Opcode::Jump));
            }
        }

        let Some(finalizer) = &stmt.finalizer else {
            for exit in exits {
                self.patch_jump(exit)?;
            }
            return Ok(());
        };

        let mut level = self.pop_level()?;
        if count > 0 {
            let catch_end = exits[exits.len() - 1];
            self.add_region(EntryKind::TryCatch, begin, catch_end);
        }

        // Exception path: run the finalizer, then rethrow
        level.jsrs.push(self.record(Opcode::Jsr, vec![Operand::Pending, Operand::Flag(false)]));
        self.record(Opcode::Throw, vec![]);

        for exit in exits {
            self.patch_jump(exit)?;
        }
        level.jsrs.push(self.record(Opcode::Jsr, vec![Operand::Pending, Operand::Flag(false)]));
        let done = self.emit_jump(Opcode::Jump);

        let subroutine = self.current();
        self.push_level(LevelKind::Subroutine);
        self.compile_block(&finalizer.body)?;
        self.pop_level()?;
        self.record(Opcode::Ret, vec![]);

        for jsr in level.jsrs {
            self.patch_jump_to(jsr, subroutine)?;
        }
        self.patch_jump(done)
    }

    /// A catch handler; the thrown value is on the stack on entry
    fn compile_catch(&mut self, handler: &'a CatchClause) -> Result<()> {
        let mut decls = Vec::new();
        if let Some(param) = &handler.param {
            decls.push(LexicalDeclaration {
                kind: DeclarationKind::Let,
                is_constant: false,
                bound_names: param.bound_names(),
                function: None,
                span: param.span(),
            });
        }
        decls.extend(analysis::lexical_declarations(&handler.body.body));

        if decls.is_empty() {
            self.record(Opcode::Pop, vec![]);
            return self.compile_statements(&handler.body.body);
        }

        self.compile_scoped(decls, |this| {
            match &handler.param {
                Some(param) => this.compile_binding(param, BindingMode::Let)?,
                None => {
                    this.record(Opcode::Pop, vec![]);
                }
            }
            this.compile_statements(&handler.body.body)
        })
    }
}
