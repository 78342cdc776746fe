//! Jump targets, unwind levels and non-local exits
//!
//! A [`ControlEntry`] is pushed for every loop, switch or labeled block and
//! collects the break and continue jumps aimed at it. A [`Level`] is pushed
//! for every construct that must run an exit protocol when control leaves
//! it early. `break`, `continue` and `return` replay those protocols, top
//! down, before jumping.

use super::{Emitter, Opcode, Operand};
use crate::ast::Span;
use crate::error::{messages, Error, Result};

/// What a control entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TargetKind {
    /// Loop: break and continue
    Loop,
    /// Switch: unlabeled and labeled break
    Switch,
    /// Labeled block: labeled break only
    Block,
}

/// A jump target frame
#[derive(Debug)]
pub(crate) struct ControlEntry<'a> {
    /// Labels naming this construct
    pub labels: Vec<&'a str>,
    /// Depth of the level stack when the construct was entered
    pub level: usize,
    /// Unpatched break jumps
    pub breaks: Vec<usize>,
    /// Unpatched continue jumps
    pub continues: Vec<usize>,
    /// Construct kind
    pub kind: TargetKind,
}

/// Exit protocol of an unwind level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LevelKind {
    /// Protected by a finally block: call its subroutine
    Finally,
    /// Inside a with scope: leave it
    With,
    /// Inside a declared block scope: leave it
    Block,
    /// Inside a finally subroutine: drop its activation
    Subroutine,
    /// Inside a for-in loop: drop the key iterator
    ForIn,
    /// Inside a for-of loop: drop the iterator
    ForOf,
}

/// An unwind frame
#[derive(Debug)]
pub(crate) struct Level {
    /// Exit protocol
    pub kind: LevelKind,
    /// JSR instructions aimed at this level's finally subroutine
    pub jsrs: Vec<usize>,
}

impl Level {
    pub fn new(kind: LevelKind) -> Self {
        Self {
            kind,
            jsrs: Vec::new(),
        }
    }
}

/// Slots a finally subroutine activation occupies on the stack
const SUBROUTINE_SLOTS: u32 = 3;

impl<'c, 'a> Emitter<'c, 'a> {
    // ========== Entries ==========

    /// Open a jump target, taking any pending labels
    pub(super) fn push_entry(&mut self, kind: TargetKind) {
        let labels = std::mem::take(&mut self.labels);
        self.jumps.push(ControlEntry {
            labels,
            level: self.levels.len(),
            breaks: Vec::new(),
            continues: Vec::new(),
            kind,
        });
    }

    /// Close the innermost jump target, patching its jumps
    pub(super) fn pop_entry(&mut self, break_target: usize, continue_target: Option<usize>) -> Result<()> {
        let entry = self
            .jumps
            .pop()
            .ok_or_else(|| Error::internal("control entry stack underflow"))?;
        for addr in entry.breaks {
            self.patch_jump_to(addr, break_target)?;
        }
        if !entry.continues.is_empty() {
            let target = continue_target
                .ok_or_else(|| Error::internal("continue recorded for a construct without a loop head"))?;
            for addr in entry.continues {
                self.patch_jump_to(addr, target)?;
            }
        }
        Ok(())
    }

    /// Whether a label is already active or pending
    fn label_in_use(&self, label: &str) -> bool {
        self.labels.contains(&label) || self.jumps.iter().any(|e| e.labels.contains(&label))
    }

    /// Add a label to the pending set consumed by the next construct
    pub(super) fn push_label(&mut self, label: &'a str, span: Span) -> Result<()> {
        if self.label_in_use(label) {
            return Err(Error::label(messages::duplicate_label(label), span));
        }
        self.labels.push(label);
        Ok(())
    }

    /// Find the entry a break or continue targets
    fn resolve_target(&self, label: Option<&str>, is_continue: bool, span: Span) -> Result<usize> {
        for (index, entry) in self.jumps.iter().enumerate().rev() {
            match label {
                Some(label) if entry.labels.contains(&label) => {
                    if is_continue && entry.kind != TargetKind::Loop {
                        return Err(Error::label(messages::illegal_continue(label), span));
                    }
                    return Ok(index);
                }
                Some(_) => {}
                None if is_continue => {
                    if entry.kind == TargetKind::Loop {
                        return Ok(index);
                    }
                }
                None => {
                    if entry.kind != TargetKind::Block {
                        return Ok(index);
                    }
                }
            }
        }

        Err(match label {
            Some(label) => Error::label(messages::undefined_label(label), span),
            None if is_continue => Error::label("Illegal continue statement: no surrounding iteration statement", span),
            None => Error::label("Illegal break statement", span),
        })
    }

    // ========== Non-local exits ==========

    /// Compile break or continue: unwind to the target, then jump
    pub(super) fn compile_jump_out(&mut self, label: Option<&str>, is_continue: bool, span: Span) -> Result<()> {
        let target = self.resolve_target(label, is_continue, span)?;
        let depth = self.jumps[target].level;
        self.unwind(depth, false);

        let jump = self.emit_jump(Opcode::Jump);
        let entry = &mut self.jumps[target];
        if is_continue {
            entry.continues.push(jump);
        } else {
            entry.breaks.push(jump);
        }
        Ok(())
    }

    /// Compile return: the value is already on the stack
    pub(super) fn compile_return_exit(&mut self) {
        self.unwind(0, true);
        self.record(Opcode::Return, vec![]);
    }

    /// Replay the exit protocol of every level above `depth`, innermost first
    ///
    /// On return the value being returned stays on top of the stack, so
    /// stack-owning levels rotate it below their slots before popping them.
    fn unwind(&mut self, depth: usize, is_return: bool) {
        for index in (depth..self.levels.len()).rev() {
            match self.levels[index].kind {
                LevelKind::Finally => {
                    let jsr = self.record(Opcode::Jsr, vec![Operand::Pending, Operand::Flag(is_return)]);
                    self.levels[index].jsrs.push(jsr);
                }
                LevelKind::With | LevelKind::Block => {
                    self.record(Opcode::BlockExit, vec![]);
                }
                LevelKind::Subroutine => {
                    if is_return {
                        self.record(Opcode::Rotate, vec![Operand::Int(SUBROUTINE_SLOTS)]);
                    }
                    self.record(Opcode::PopN, vec![Operand::Int(SUBROUTINE_SLOTS)]);
                }
                LevelKind::ForIn | LevelKind::ForOf => {
                    if is_return {
                        self.record(Opcode::Rotate, vec![Operand::Int(1)]);
                    }
                    self.record(Opcode::Pop, vec![]);
                }
            }
        }
    }

    // ========== Levels ==========

    pub(super) fn push_level(&mut self, kind: LevelKind) {
        self.levels.push(Level::new(kind));
    }

    pub(super) fn pop_level(&mut self) -> Result<Level> {
        self.levels
            .pop()
            .ok_or_else(|| Error::internal("unwind level stack underflow"))
    }
}
