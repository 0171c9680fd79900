//! Compile error types
//!
//! This module defines [`CompileError`], which represents every diagnostic the
//! compiler can produce, from a stray character in the source to a prototype
//! that never received a body.
//!
//! All errors are fatal: the first one encountered aborts the pass and is
//! handed back to the caller unchanged.

use crate::parser::lexer::LexError;
use thiserror::Error;

/// The five diagnostic categories a [`CompileError`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    NameResolution,
    Type,
    Definition,
}

/// Compile errors, each tagged with the source line it was detected on
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Unterminated string/comment or an unrecognized character
    #[error("{message} near line {line}")]
    Lexical { message: String, line: usize },

    /// The lookahead token was not the one the grammar required
    #[error("expected {expected} instead of {found} near line {line}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    /// Use of an identifier or function that was never declared
    #[error("use of undeclared identifier '{name}' near line {line}")]
    Undeclared { name: String, line: usize },

    /// A name bound twice in the same table
    #[error("redeclaration of '{name}' near line {line}")]
    Redeclared { name: String, line: usize },

    /// A type specifier that names no registered struct
    #[error("unknown type '{name}' near line {line}")]
    UnknownType { name: String, line: usize },

    /// Member access naming a member the struct does not have
    #[error("struct '{aggregate}' has no member '{member}' near line {line}")]
    UnknownMember {
        aggregate: String,
        member: String,
        line: usize,
    },

    /// Operand or condition of the wrong type
    #[error("{message} near line {line}")]
    Type { message: String, line: usize },

    /// No conversion path between two types
    #[error("cannot convert {from} to {to} near line {line}")]
    NoConversion {
        from: String,
        to: String,
        line: usize,
    },

    /// `break` outside any loop
    #[error("'break' outside of a loop near line {line}")]
    MisplacedBreak { line: usize },

    /// A second header for a function whose signature differs from the first
    #[error("conflicting declaration of function '{name}' near line {line}")]
    ConflictingDeclaration { name: String, line: usize },

    /// A second body for an already implemented function
    #[error("redefinition of function '{name}' near line {line}")]
    Redefinition { name: String, line: usize },

    /// A prototype that never received a body
    #[error("function '{name}' declared near line {line} is never implemented")]
    Unimplemented { name: String, line: usize },
}

impl CompileError {
    pub fn line(&self) -> usize {
        match self {
            CompileError::Lexical { line, .. }
            | CompileError::UnexpectedToken { line, .. }
            | CompileError::Undeclared { line, .. }
            | CompileError::Redeclared { line, .. }
            | CompileError::UnknownType { line, .. }
            | CompileError::UnknownMember { line, .. }
            | CompileError::Type { line, .. }
            | CompileError::NoConversion { line, .. }
            | CompileError::MisplacedBreak { line }
            | CompileError::ConflictingDeclaration { line, .. }
            | CompileError::Redefinition { line, .. }
            | CompileError::Unimplemented { line, .. } => *line,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Lexical { .. } => ErrorKind::Lexical,
            CompileError::UnexpectedToken { .. } | CompileError::MisplacedBreak { .. } => {
                ErrorKind::Syntax
            }
            CompileError::Undeclared { .. }
            | CompileError::Redeclared { .. }
            | CompileError::UnknownType { .. } => ErrorKind::NameResolution,
            CompileError::UnknownMember { .. }
            | CompileError::Type { .. }
            | CompileError::NoConversion { .. } => ErrorKind::Type,
            CompileError::ConflictingDeclaration { .. }
            | CompileError::Redefinition { .. }
            | CompileError::Unimplemented { .. } => ErrorKind::Definition,
        }
    }

    pub(crate) fn type_error(message: impl Into<String>, line: usize) -> Self {
        CompileError::Type {
            message: message.into(),
            line,
        }
    }
}

impl From<LexError> for CompileError {
    fn from(err: LexError) -> Self {
        CompileError::Lexical {
            message: err.message,
            line: err.line,
        }
    }
}
