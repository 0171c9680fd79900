//! IR generator state and program driver
//!
//! The [`Generator`] owns everything one code generation pass mutates: the
//! label and temporary counters, the output text, and the set of variables
//! whose stack slot has already been allocated.
//!
//! # Block termination
//!
//! Every basic block must end in a terminator. The generator remembers
//! whether the last line it wrote was one (`between_blocks`):
//!
//! - [`Generator::append_label`] writes a `br` to the new label first unless
//!   the previous block is already terminated, so no label is ever entered by
//!   falling through
//! - [`Generator::append`] opens a fresh label when an instruction would
//!   follow a terminator, so code after `return` or `break` lands in its own
//!   (unreachable) block
//!
//! Counters only ever increase, so every label and temporary is unique for
//! the whole run.

use super::constants::{FIRST_LABEL, FIRST_TEMPORARY, INDENT};
use super::value::{Operand, Value};
use crate::errors::CompileError;
use crate::parser::ast::{Function, Program};
use crate::parser::types::Type;
use log::debug;
use rustc_hash::FxHashSet;
use std::fmt;

/// A basic block label, written `L<n>:` and referenced as `%L<n>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Code generator for one compilation
pub struct Generator {
    next_label: u32,
    next_temporary: u32,
    output: String,
    between_blocks: bool,
    /// IR names of variables that already have a stack slot
    allocated: FxHashSet<String>,
    /// After-labels of the enclosing loops, innermost last
    pub(crate) loop_exits: Vec<Label>,
    /// Return type of the function being generated
    pub(crate) return_type: Type,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Generator {
            next_label: FIRST_LABEL,
            next_temporary: FIRST_TEMPORARY,
            output: String::new(),
            between_blocks: false,
            allocated: FxHashSet::default(),
            loop_exits: Vec::new(),
            return_type: Type::Void,
        }
    }

    /// Emitted text so far
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Whether the last line written ended a basic block
    pub fn is_between_blocks(&self) -> bool {
        self.between_blocks
    }

    /// Hand out a fresh label (not yet placed)
    pub fn reserve_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// Hand out a fresh temporary register of type `ty`
    pub fn temporary(&mut self, ty: Type) -> Value {
        let value = Value::new(Operand::Temporary(self.next_temporary), ty);
        self.next_temporary += 1;
        value
    }

    /// Start a new block at `label`, branching to it if the current block is
    /// still open.
    pub fn append_label(&mut self, label: Label) {
        if !self.between_blocks {
            self.write_instruction(&format!("br label %{}", label));
        }
        self.output.push_str(&format!("{}:\n", label));
        self.between_blocks = false;
    }

    /// Write one instruction into the current block
    pub fn append(&mut self, instruction: impl AsRef<str>) {
        if self.between_blocks {
            // nothing reaches this point; give it a block of its own
            let dead = self.reserve_label();
            self.append_label(dead);
        }
        let instruction = instruction.as_ref();
        self.write_instruction(instruction);
        self.between_blocks = ends_block(instruction);
    }

    /// Unconditional branch, unless the current block is already terminated
    pub fn jump_to(&mut self, label: Label) {
        if !self.between_blocks {
            self.append(format!("br label %{}", label));
        }
    }

    /// Conditional branch on an `i1` value. A missing target means "fall
    /// through": a fresh label is placed right after the branch.
    pub fn branch(&mut self, condition: &Value, on_true: Option<Label>, on_false: Option<Label>) {
        let (on_true, on_false, fall_through) = match (on_true, on_false) {
            (Some(t), Some(f)) => (t, f, None),
            (Some(t), None) => {
                let next = self.reserve_label();
                (t, next, Some(next))
            }
            (None, Some(f)) => {
                let next = self.reserve_label();
                (next, f, Some(next))
            }
            (None, None) => return,
        };
        self.append(format!(
            "br i1 {}, label %{}, label %{}",
            condition, on_true, on_false
        ));
        if let Some(next) = fall_through {
            self.append_label(next);
        }
    }

    /// Reserve a stack slot for `name` the first time it is used
    pub(crate) fn allocate(&mut self, name: &str, ty: &Type) {
        if self.allocated.insert(name.to_string()) {
            self.append(format!("{} = alloca {}", name, ty));
        }
    }

    /// Generate the whole program: type definitions first, then every
    /// function in source order.
    pub fn program(mut self, program: &Program) -> Result<String, CompileError> {
        if let Some(prototype) = program.globals.prototypes().iter().find(|p| !p.implemented) {
            return Err(CompileError::Unimplemented {
                name: prototype.name.name.to_string(),
                line: prototype.line,
            });
        }

        let aggregates = program.globals.aggregates();
        for aggregate in aggregates {
            self.output
                .push_str(&format!("%{} = {}\n", aggregate.name, aggregate.definition()));
        }
        if !aggregates.is_empty() {
            self.output.push('\n');
        }

        for function in &program.functions {
            self.function(function)?;
        }

        Ok(self.output)
    }

    fn function(&mut self, function: &Function) -> Result<(), CompileError> {
        let signature = &function.signature;
        self.return_type = signature.return_type().clone();
        self.allocated.clear();
        self.between_blocks = false;

        let params: Vec<String> = signature
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, incoming(&p.name)))
            .collect();
        self.output.push_str(&format!(
            "define {} {}({}) {{\n",
            self.return_type,
            signature.name.ir_name(),
            params.join(", ")
        ));

        // parameters always get an addressable slot
        for param in &signature.params {
            let slot = param.ir_name();
            self.allocate(&slot, &param.ty);
            self.append(format!(
                "store {} {}, {}* {}",
                param.ty,
                incoming(&param.name),
                param.ty,
                slot
            ));
        }

        let before = self.reserve_label();
        let after = self.reserve_label();
        let body = &function.body;
        if body.needs_before_label() {
            self.append_label(before);
        }
        self.statement(body, before, after)?;
        if body.needs_after_label() {
            self.append_label(after);
        }

        // falling off the end returns the default value
        if !self.between_blocks {
            let fallback = match &self.return_type {
                Type::Void => "ret void".to_string(),
                ty => format!("ret {} {}", ty, default_operand(ty)),
            };
            self.append(fallback);
        }
        self.output.push_str("}\n\n");

        debug!(
            "generated {} (next label {}, next temporary {})",
            signature.name.name, self.next_label, self.next_temporary
        );
        Ok(())
    }

    fn write_instruction(&mut self, instruction: &str) {
        self.output.push_str(INDENT);
        self.output.push_str(instruction);
        self.output.push('\n');
    }
}

/// Register holding an argument as passed in; the `.in` suffix keeps it
/// apart from labels and temporaries
fn incoming(name: &str) -> String {
    format!("%{}.in", name)
}

/// Whether an instruction terminates its basic block
fn ends_block(instruction: &str) -> bool {
    ["br ", "ret", "unreachable"]
        .iter()
        .any(|prefix| instruction.starts_with(prefix))
}

/// Literal text of a type's default value
fn default_operand(ty: &Type) -> &'static str {
    match ty {
        Type::Bool => "false",
        Type::Float => "0.0",
        Type::Char | Type::Int => "0",
        _ => "zeroinitializer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_are_unique() {
        let mut gen = Generator::new();
        let a = gen.reserve_label();
        let b = gen.reserve_label();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "L1");

        let t = gen.temporary(Type::Int);
        let u = gen.temporary(Type::Int);
        assert_ne!(t.operand, u.operand);
        assert_eq!(t.to_string(), "%t.1");
    }

    #[test]
    fn test_label_after_open_block_branches() {
        let mut gen = Generator::new();
        gen.append("%t.1 = add i32 1, 2");
        let label = gen.reserve_label();
        gen.append_label(label);

        assert_eq!(gen.output(), "  %t.1 = add i32 1, 2\n  br label %L1\nL1:\n");
    }

    #[test]
    fn test_label_after_terminator_does_not_branch() {
        let mut gen = Generator::new();
        gen.append("ret i32 0");
        assert!(gen.is_between_blocks());
        let label = gen.reserve_label();
        gen.append_label(label);

        assert_eq!(gen.output(), "  ret i32 0\nL1:\n");
        assert!(!gen.is_between_blocks());
    }

    #[test]
    fn test_code_after_terminator_gets_a_block() {
        let mut gen = Generator::new();
        gen.append("ret void");
        gen.append("%t.1 = add i32 1, 2");

        assert_eq!(gen.output(), "  ret void\nL1:\n  %t.1 = add i32 1, 2\n");
    }

    #[test]
    fn test_fall_through_branch() {
        let mut gen = Generator::new();
        let target = gen.reserve_label();
        gen.branch(&Value::new(Operand::Bool(true), Type::Bool), Some(target), None);

        assert_eq!(gen.output(), "  br i1 true, label %L1, label %L2\nL2:\n");
    }

    #[test]
    fn test_allocate_once() {
        let mut gen = Generator::new();
        gen.allocate("%x.main.0", &Type::Int);
        gen.allocate("%x.main.0", &Type::Int);
        assert_eq!(gen.output().matches("alloca").count(), 1);
    }
}
