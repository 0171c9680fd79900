//! Source parser
//!
//! This module turns source text into a typed syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parser`]: Parsing (tokens → AST), with the grammar split across
//!   `declarations`, `statements` and `expressions`
//! - [`scope`]: Scope chain and the global function/struct tables
//! - [`types`]: The value type lattice
//! - [`ast`]: AST node definitions
//!
//! # Language
//!
//! - Types: `bool`, `char`, `int`, `float`, `void`, arrays, structs
//! - Headers and calls are bracketed: `[int add: int a, int b] { ... }` and
//!   `[add: 1, 2]`
//! - Statements: declarations, assignments, `if`/`else`, `while`,
//!   `do`/`while`, `return`, `break`, blocks, calls
//! - Array elements and struct members share the `x[i]` / `p[member]` syntax
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent with one token of lookahead. Names and
//! types are resolved during the parse; there is no separate checking pass.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod scope;
mod statements;
pub mod types;
