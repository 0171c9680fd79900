//! # Introduction
//!
//! brackc compiles a small C-like language with bracketed function headers
//! and call sites into LLVM-style textual IR. A terminal inspector built
//! with [ratatui](https://docs.rs/ratatui) shows the source next to the
//! generated code.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Lexer → Parser (scopes + types) → AST → Generator → IR text
//! ```
//!
//! 1. [`parser`] — tokenises the source and builds a fully typed AST,
//!    resolving names and checking types as it goes.
//! 2. [`codegen`] — walks the AST and emits labelled basic blocks, keeping
//!    every block terminated.
//! 3. [`errors`] — the single error type every stage returns; the first error
//!    stops compilation.
//! 4. [`ui`] — ratatui-based inspector; not part of the stable library API.
//!
//! ## Language
//!
//! Types: `bool`, `char`, `int`, `float`, `void`, arrays, structs.
//! Control flow: `if/else`, `while`, `do-while`, `break`, `return`.
//! Functions may be declared before they are defined and called before
//! either.
//!
//! ```
//! let ir = brackc::compile("[int add: int a, int b] { return a + b; }").unwrap();
//! assert!(ir.contains("define i32 @add(i32 %a.in, i32 %b.in)"));
//! ```

pub mod codegen;
pub mod errors;
pub mod parser;
pub mod ui;

pub use errors::{CompileError, ErrorKind};

use log::debug;
use parser::parser::Parser;

/// Compile source text to IR text
pub fn compile(source: &str) -> Result<String, CompileError> {
    let program = Parser::new(source)?.program()?;
    debug!("generating {} function(s)", program.functions.len());
    codegen::generate(&program)
}
