//! IR code generation
//!
//! This module lowers a parsed [`Program`] to LLVM-style textual IR:
//! - [`generator`]: Generator state, block termination, program driver
//! - [`expressions`]: Reduction, conversion, branch evaluation, addresses
//! - [`statements`]: Statement lowering between before/after labels
//! - [`value`]: Reduced operands
//! - [`constants`]: Counter seeds and layout
//!
//! # Output
//!
//! Struct type definitions come first (`%Point = type { i32, double }`),
//! followed by one `define` per function in source order. Variables live in
//! stack slots (`alloca`) created on first use; values are SSA temporaries
//! named `%t.N`.

pub mod constants;
pub mod expressions;
pub mod generator;
pub mod statements;
pub mod value;

pub use generator::{Generator, Label};
pub use value::{Operand, Value};

use crate::errors::CompileError;
use crate::parser::ast::Program;

/// Generate IR text for a whole program
pub fn generate(program: &Program) -> Result<String, CompileError> {
    Generator::new().program(program)
}
