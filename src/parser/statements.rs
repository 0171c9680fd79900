//! Statement parsing
//!
//! ```text
//! statement ::= if_stmt | while_stmt | do_stmt | return_stmt | break_stmt
//!             | var_decl | block | ';'
//!             | lvalue '=' expression ';'
//!             | expression ';'                    (calls)
//! if_stmt   ::= 'if' condition statement ('else' statement)?
//! while_stmt::= 'while' condition statement
//! do_stmt   ::= 'do' statement 'while' condition ';'
//! block     ::= '{' statement* '}'
//! ```
//!
//! Conditions are ordinary expressions that must be boolean: a comparison,
//! a logical combination, a literal, or any bool-typed value.

use super::ast::{ExprKind, Expression, Lvalue, Statement, StmtKind};
use super::lexer::Token;
use super::parser::Parser;
use super::scope::Symbol;
use super::types::Type;
use crate::errors::CompileError;

impl Parser {
    pub(crate) fn statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        match &self.lookahead {
            Token::If => self.if_statement(),
            Token::While => self.while_statement(),
            Token::Do => self.do_while_statement(),
            Token::Return => self.return_statement(),
            Token::Break => {
                self.advance()?;
                if self.loop_depth == 0 {
                    return Err(CompileError::MisplacedBreak { line });
                }
                self.match_token(&Token::Semi)?;
                Ok(Statement::new(StmtKind::Break, line))
            }
            Token::LBrace => self.block(),
            Token::Semi => {
                self.advance()?;
                Ok(Statement::new(StmtKind::Empty, line))
            }
            Token::Identifier(_) if self.at_declaration() => self.declaration(),
            Token::Type(_) => self.declaration(),
            Token::Identifier(name) => {
                let name = name.clone();
                match self.scope.lookup(&name) {
                    Some(Symbol::Variable(identifier)) => {
                        self.advance()?;
                        let target = self.access_chain(Lvalue::Identifier(identifier))?;
                        self.assignment(target, line)
                    }
                    Some(Symbol::Function(_)) => self.expression_statement(),
                    None => Err(CompileError::Undeclared {
                        name: name.to_string(),
                        line,
                    }),
                }
            }
            _ => self.expression_statement(),
        }
    }

    /// `{ statement* }` in a fresh scope
    pub(crate) fn block(&mut self) -> Result<Statement, CompileError> {
        self.scope.enter();
        let body = self.braced_sequence()?;
        self.scope.leave();
        Ok(body)
    }

    /// Statements between braces, in the current scope
    pub(crate) fn braced_sequence(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        self.match_token(&Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.check(&Token::Eof) {
                return Err(self.unexpected(Token::RBrace));
            }
            statements.push(self.statement()?);
        }
        self.match_token(&Token::RBrace)?;
        Ok(Statement::sequence(statements, line))
    }

    fn if_statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        self.match_token(&Token::If)?;
        let condition = self.condition()?;
        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.check(&Token::Else) {
            self.advance()?;
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Statement::new(
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            line,
        ))
    }

    fn while_statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        self.match_token(&Token::While)?;
        let condition = self.condition()?;
        let body = Box::new(self.loop_body()?);

        Ok(Statement::new(StmtKind::While { condition, body }, line))
    }

    fn do_while_statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        self.match_token(&Token::Do)?;
        let body = Box::new(self.loop_body()?);
        self.match_token(&Token::While)?;
        let condition = self.condition()?;
        self.match_token(&Token::Semi)?;

        Ok(Statement::new(StmtKind::DoWhile { body, condition }, line))
    }

    fn loop_body(&mut self) -> Result<Statement, CompileError> {
        self.loop_depth += 1;
        let body = self.statement()?;
        self.loop_depth -= 1;
        Ok(body)
    }

    fn return_statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        self.match_token(&Token::Return)?;
        let (function, return_type) = match &self.function {
            Some(enclosing) => (enclosing.name.clone(), enclosing.return_type.clone()),
            None => return Err(self.unexpected("declaration")),
        };

        if self.check(&Token::Semi) {
            self.advance()?;
            if return_type != Type::Void {
                return Err(CompileError::type_error(
                    format!("non-void function '{}' must return a value", function),
                    line,
                ));
            }
            return Ok(Statement::new(
                StmtKind::Return {
                    value: None,
                    return_type,
                },
                line,
            ));
        }

        if return_type == Type::Void {
            return Err(CompileError::type_error(
                format!("returning a value from void function '{}'", function),
                line,
            ));
        }
        let value = self.expression()?;
        if !value.ty.can_convert_to(&return_type) {
            return Err(CompileError::NoConversion {
                from: value.ty.to_string(),
                to: return_type.to_string(),
                line,
            });
        }
        self.match_token(&Token::Semi)?;

        Ok(Statement::new(
            StmtKind::Return {
                value: Some(value),
                return_type,
            },
            line,
        ))
    }

    /// `= expression ;` after an already parsed target
    fn assignment(&mut self, target: Lvalue, line: usize) -> Result<Statement, CompileError> {
        self.match_token(&Token::Assign)?;
        let value = self.expression()?;
        self.agree(target.ty(), &value)?;
        self.match_token(&Token::Semi)?;

        Ok(Statement::new(StmtKind::Assignment { target, value }, line))
    }

    /// A call evaluated for its side effect
    fn expression_statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.line;
        let expression = self.expression()?;
        if !matches!(expression.kind, ExprKind::Call { .. }) {
            return Err(CompileError::type_error(
                "expression statement must be a call",
                line,
            ));
        }
        self.match_token(&Token::Semi)?;

        Ok(Statement::new(StmtKind::Expression(expression), line))
    }

    /// An expression usable as a branch condition
    fn condition(&mut self) -> Result<Expression, CompileError> {
        let line = self.line;
        let condition = self.expression()?;
        if !condition.is_condition() {
            return Err(CompileError::type_error(
                "expected expression with boolean result",
                line,
            ));
        }
        Ok(condition)
    }
}
