//! Core parser infrastructure
//!
//! This module defines the [`Parser`] struct and its token-level primitives.
//! The grammar itself is split across sibling modules as further `impl
//! Parser` blocks:
//!
//! - [`declarations`](super::declarations): struct and function headers,
//!   type specifiers, variable declarations
//! - [`statements`](super::statements): control flow, assignments, blocks
//! - [`expressions`](super::expressions): the precedence ladder down to
//!   primary expressions, calls and access chains
//!
//! # Lookahead
//!
//! The parser pulls tokens from the [`Lexer`] one at a time and keeps a
//! single token of lookahead. Names and types are resolved while parsing,
//! so every node comes out of the parser fully typed.

use super::ast::{Function, Program};
use super::lexer::{Lexer, Token};
use super::scope::Scope;
use super::types::Type;
use crate::errors::CompileError;
use log::{debug, trace};
use std::fmt;
use std::rc::Rc;

/// The function whose body is being parsed
#[derive(Debug, Clone)]
pub(crate) struct Enclosing {
    pub name: Rc<str>,
    pub return_type: Type,
}

/// Recursive descent parser with one token of lookahead
pub struct Parser {
    lexer: Lexer,
    pub(crate) lookahead: Token,
    /// Line of the lookahead token
    pub(crate) line: usize,
    pub(crate) scope: Scope,
    pub(crate) function: Option<Enclosing>,
    /// Number of loops enclosing the current statement
    pub(crate) loop_depth: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, CompileError> {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token()?;
        let line = lexer.line();
        Ok(Self {
            lexer,
            lookahead,
            line,
            scope: Scope::new(),
            function: None,
            loop_depth: 0,
        })
    }

    /// Parse the whole input: a sequence of bracketed struct and function
    /// declarations.
    pub fn program(mut self) -> Result<Program, CompileError> {
        let mut functions: Vec<Function> = Vec::new();

        while self.check(&Token::LBrack) {
            if let Some(function) = self.top_level()? {
                functions.push(function);
            }
        }

        if !self.check(&Token::Eof) {
            return Err(self.unexpected("'['"));
        }

        debug!(
            "parsed {} function(s), {} struct type(s)",
            functions.len(),
            self.scope.global.aggregates().len()
        );

        Ok(Program {
            functions,
            globals: self.scope.into_global(),
        })
    }

    /// Consume the lookahead and return it
    pub(crate) fn advance(&mut self) -> Result<Token, CompileError> {
        let next = self.lexer.next_token()?;
        self.line = self.lexer.line();
        trace!("lookahead {} on line {}", next, self.line);
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    /// Consume the lookahead if it equals `expected` (or `expected` is the
    /// wildcard), otherwise fail naming both tokens.
    pub(crate) fn match_token(&mut self, expected: &Token) -> Result<Token, CompileError> {
        if self.lookahead == *expected {
            self.advance()
        } else {
            Err(self.unexpected(expected))
        }
    }

    pub(crate) fn check(&self, token: &Token) -> bool {
        !matches!(token, Token::Any) && self.lookahead == *token
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<Rc<str>, CompileError> {
        match &self.lookahead {
            Token::Identifier(name) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: impl fmt::Display) -> CompileError {
        CompileError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.lookahead.to_string(),
            line: self.line,
        }
    }
}
