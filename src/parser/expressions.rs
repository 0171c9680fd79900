//! Expression parsing
//!
//! Binary operators are parsed by one method per precedence level, lowest
//! first. Every level is left-associative and folds its operands into the
//! node its operator selects:
//!
//! ```text
//! or         ::= and ('||' and)*
//! and        ::= equality ('&&' equality)*
//! equality   ::= relational (('==' | '!=') relational)*
//! relational ::= additive (('<' | '<=' | '>' | '>=') additive)*
//! additive   ::= term (('+' | '-') term)*
//! term       ::= unary (('*' | '/') unary)*
//! unary      ::= '-' unary | '!' unary | primary
//! primary    ::= '(' or ')' | literal | call | array_literal | access
//! call       ::= '[' IDENT (':' or (',' or)*)? ']'
//! access     ::= IDENT ('[' (or | IDENT) ']')*
//! ```
//!
//! `[` opens a call when the name after it is a declared function, and an
//! array literal otherwise. Inside an access chain, `[` indexes an array or
//! names a struct member depending on the type reached so far.

use super::ast::{
    ArithmeticOp, ExprKind, Expression, Literal, Lvalue, PrototypeId, RelationOp, UnaryOp,
};
use super::lexer::Token;
use super::parser::Parser;
use super::scope::Symbol;
use super::types::Type;
use crate::errors::CompileError;

impl Parser {
    /// Parse expression (top-level entry point)
    pub(crate) fn expression(&mut self) -> Result<Expression, CompileError> {
        self.or_expression()
    }

    fn or_expression(&mut self) -> Result<Expression, CompileError> {
        let mut lhs = self.and_expression()?;
        while self.check(&Token::Or) {
            let line = self.line;
            self.advance()?;
            let rhs = self.and_expression()?;
            Self::require_condition(&lhs, line)?;
            Self::require_condition(&rhs, line)?;
            lhs = Expression::new(ExprKind::Or(Box::new(lhs), Box::new(rhs)), Type::Bool, line);
        }
        Ok(lhs)
    }

    fn and_expression(&mut self) -> Result<Expression, CompileError> {
        let mut lhs = self.equality_expression()?;
        while self.check(&Token::And) {
            let line = self.line;
            self.advance()?;
            let rhs = self.equality_expression()?;
            Self::require_condition(&lhs, line)?;
            Self::require_condition(&rhs, line)?;
            lhs = Expression::new(ExprKind::And(Box::new(lhs), Box::new(rhs)), Type::Bool, line);
        }
        Ok(lhs)
    }

    fn equality_expression(&mut self) -> Result<Expression, CompileError> {
        let mut lhs = self.relational_expression()?;
        while self.check(&Token::Equal) || self.check(&Token::NEqual) {
            let line = self.line;
            let op = RelationOp::from_token(&self.advance()?);
            let rhs = self.relational_expression()?;
            lhs = Self::relation(op, lhs, rhs, line)?;
        }
        Ok(lhs)
    }

    fn relational_expression(&mut self) -> Result<Expression, CompileError> {
        let mut lhs = self.additive_expression()?;
        while [Token::Less, Token::LEqual, Token::Greater, Token::GEqual]
            .iter()
            .any(|t| self.check(t))
        {
            let line = self.line;
            let op = RelationOp::from_token(&self.advance()?);
            let rhs = self.additive_expression()?;
            lhs = Self::relation(op, lhs, rhs, line)?;
        }
        Ok(lhs)
    }

    fn additive_expression(&mut self) -> Result<Expression, CompileError> {
        let mut lhs = self.multiplicative_expression()?;
        while self.check(&Token::Plus) || self.check(&Token::Minus) {
            let line = self.line;
            let op = ArithmeticOp::from_token(&self.advance()?);
            let rhs = self.multiplicative_expression()?;
            lhs = Self::arithmetic(op, lhs, rhs, line)?;
        }
        Ok(lhs)
    }

    fn multiplicative_expression(&mut self) -> Result<Expression, CompileError> {
        let mut lhs = self.unary_expression()?;
        while self.check(&Token::Times) || self.check(&Token::Divide) {
            let line = self.line;
            let op = ArithmeticOp::from_token(&self.advance()?);
            let rhs = self.unary_expression()?;
            lhs = Self::arithmetic(op, lhs, rhs, line)?;
        }
        Ok(lhs)
    }

    fn unary_expression(&mut self) -> Result<Expression, CompileError> {
        let line = self.line;
        if self.check(&Token::Minus) {
            self.advance()?;
            match self.lookahead {
                Token::Integer(value) => {
                    self.advance()?;
                    return Self::int_literal(-value, line);
                }
                Token::Decimal(value) => {
                    self.advance()?;
                    return Ok(Expression::float(-value, line));
                }
                _ => {}
            }

            let operand = self.unary_expression()?;
            if let ExprKind::Unary {
                op: UnaryOp::Negate,
                operand: inner,
            } = operand.kind
            {
                return Ok(*inner);
            }
            if !operand.ty.is_numeric() {
                return Err(CompileError::type_error(
                    format!("cannot negate a value of type {}", operand.ty),
                    line,
                ));
            }
            let ty = operand.ty.clone();
            return Ok(Expression::new(
                ExprKind::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                },
                ty,
                line,
            ));
        }

        if self.check(&Token::Not) {
            self.advance()?;
            let operand = self.unary_expression()?;
            if let ExprKind::Not(inner) = operand.kind {
                return Ok(*inner);
            }
            Self::require_condition(&operand, line)?;
            return Ok(Expression::new(
                ExprKind::Not(Box::new(operand)),
                Type::Bool,
                line,
            ));
        }

        self.primary_expression()
    }

    fn primary_expression(&mut self) -> Result<Expression, CompileError> {
        let line = self.line;
        match &self.lookahead {
            Token::LParen => {
                self.advance()?;
                let expression = self.expression()?;
                self.match_token(&Token::RParen)?;
                Ok(expression)
            }
            Token::Integer(value) => {
                let value = *value;
                self.advance()?;
                Self::int_literal(value, line)
            }
            Token::Decimal(value) => {
                let value = *value;
                self.advance()?;
                Ok(Expression::float(value, line))
            }
            Token::Boolean(value) => {
                let value = *value;
                self.advance()?;
                Ok(Expression::boolean(value, line))
            }
            Token::StringLiteral(string) => {
                // no terminating NUL: "abc" is three chars
                let elements: Vec<Expression> = string
                    .bytes()
                    .map(|b| Expression::int(i64::from(b as i8), Type::Char, line))
                    .collect();
                self.advance()?;
                let ty = Type::array(Type::Char, elements.len());
                Ok(Expression::new(ExprKind::ArrayLiteral(elements), ty, line))
            }
            Token::LBrack => {
                self.advance()?;
                let callee = match &self.lookahead {
                    Token::Identifier(name) => self.scope.global.prototype_for(name),
                    _ => None,
                };
                match callee {
                    Some(prototype) => {
                        self.advance()?;
                        self.call_arguments(prototype, line)
                    }
                    None => self.array_literal(line),
                }
            }
            Token::Identifier(name) => {
                let name = name.clone();
                match self.scope.lookup(&name) {
                    Some(Symbol::Variable(identifier)) => {
                        self.advance()?;
                        let lvalue = self.access_chain(Lvalue::Identifier(identifier))?;
                        Ok(Expression::lvalue(lvalue, line))
                    }
                    // a bare function name calls it with no arguments
                    Some(Symbol::Function(prototype)) => {
                        self.advance()?;
                        self.call(prototype, Vec::new(), line)
                    }
                    None => Err(CompileError::Undeclared {
                        name: name.to_string(),
                        line,
                    }),
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `: a, b ]` after the callee name
    fn call_arguments(
        &mut self,
        prototype: PrototypeId,
        line: usize,
    ) -> Result<Expression, CompileError> {
        let mut args = Vec::new();
        if self.check(&Token::Colon) {
            self.advance()?;
            loop {
                args.push(self.expression()?);
                if !self.check(&Token::Comma) {
                    break;
                }
                self.advance()?;
            }
        }
        self.match_token(&Token::RBrack)?;
        self.call(prototype, args, line)
    }

    /// Check arity and argument types, then build the call node
    fn call(
        &self,
        prototype: PrototypeId,
        args: Vec<Expression>,
        line: usize,
    ) -> Result<Expression, CompileError> {
        let prototype_ref = self.scope.global.prototype(prototype);
        let params = prototype_ref.param_types();
        if params.len() != args.len() {
            return Err(CompileError::type_error(
                format!(
                    "function '{}' expects {} argument(s) but {} were given",
                    prototype_ref.name.name,
                    params.len(),
                    args.len()
                ),
                line,
            ));
        }
        for (arg, param) in args.iter().zip(&params) {
            if !arg.ty.can_convert_to(param) {
                return Err(CompileError::NoConversion {
                    from: arg.ty.to_string(),
                    to: param.to_string(),
                    line: arg.line,
                });
            }
        }

        let callee = prototype_ref.name.clone();
        let ty = callee.ty.clone();
        Ok(Expression::new(
            ExprKind::Call {
                callee,
                prototype,
                args,
                params,
            },
            ty,
            line,
        ))
    }

    /// `a, b, c ]` after the opening bracket; elements must be constants
    fn array_literal(&mut self, line: usize) -> Result<Expression, CompileError> {
        if self.check(&Token::RBrack) {
            return Err(CompileError::type_error("empty array literal", line));
        }

        let mut elements = Vec::new();
        loop {
            let element = self.expression()?;
            if !element.is_constant() {
                return Err(CompileError::type_error(
                    "array literal elements must be constants",
                    element.line,
                ));
            }
            elements.push(element);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance()?;
        }
        self.match_token(&Token::RBrack)?;

        let mut element_type = elements[0].ty.clone();
        for element in &elements[1..] {
            element_type = Type::unify(&element_type, &element.ty).ok_or_else(|| {
                CompileError::type_error(
                    format!(
                        "array literal mixes elements of type {} and {}",
                        element_type, element.ty
                    ),
                    element.line,
                )
            })?;
        }

        let ty = Type::array(element_type, elements.len());
        Ok(Expression::new(ExprKind::ArrayLiteral(elements), ty, line))
    }

    /// Peel `[index]` and `[member]` layers off the lookahead
    pub(crate) fn access_chain(&mut self, mut lvalue: Lvalue) -> Result<Lvalue, CompileError> {
        while self.check(&Token::LBrack) {
            let line = self.line;
            match lvalue.ty().clone() {
                Type::Array { to, .. } => {
                    self.advance()?;
                    let index = self.expression()?;
                    if !index.ty.is_integral() {
                        return Err(CompileError::type_error(
                            format!("array index must be an integer, not {}", index.ty),
                            line,
                        ));
                    }
                    self.match_token(&Token::RBrack)?;
                    lvalue = Lvalue::ArrayAccess {
                        parent: Box::new(lvalue),
                        index: Box::new(index),
                        ty: *to,
                    };
                }
                Type::Aggregate(aggregate) => {
                    self.advance()?;
                    let name = self.expect_identifier()?;
                    let (member, declaration) =
                        aggregate
                            .member(&name)
                            .ok_or_else(|| CompileError::UnknownMember {
                                aggregate: aggregate.name.to_string(),
                                member: name.to_string(),
                                line,
                            })?;
                    let ty = declaration.ty.clone();
                    self.match_token(&Token::RBrack)?;
                    lvalue = Lvalue::MemberAccess {
                        parent: Box::new(lvalue),
                        member,
                        name,
                        ty,
                    };
                }
                other => {
                    return Err(CompileError::type_error(
                        format!(
                            "'{}' of type {} is neither an array nor a struct",
                            lvalue.root().name,
                            other
                        ),
                        line,
                    ))
                }
            }
        }
        Ok(lvalue)
    }

    fn int_literal(value: i64, line: usize) -> Result<Expression, CompileError> {
        if i32::try_from(value).is_err() {
            return Err(CompileError::type_error(
                format!("integer literal {} does not fit in int", value),
                line,
            ));
        }
        Ok(Expression::int(value, Type::Int, line))
    }

    fn require_condition(expression: &Expression, line: usize) -> Result<(), CompileError> {
        if expression.is_condition() {
            Ok(())
        } else {
            Err(CompileError::type_error(
                "expected expression with boolean result",
                line,
            ))
        }
    }

    fn relation(
        op: Option<RelationOp>,
        lhs: Expression,
        rhs: Expression,
        line: usize,
    ) -> Result<Expression, CompileError> {
        let Some(op) = op else {
            return Err(CompileError::type_error("expected comparison operator", line));
        };
        let comparable = (op.is_equality() && lhs.ty == Type::Bool && rhs.ty == Type::Bool)
            || Type::max(&lhs.ty, &rhs.ty).is_some();
        if !comparable {
            return Err(CompileError::type_error(
                format!("cannot compare {} with {}", lhs.ty, rhs.ty),
                line,
            ));
        }
        Ok(Expression::new(
            ExprKind::Relation {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Type::Bool,
            line,
        ))
    }

    fn arithmetic(
        op: Option<ArithmeticOp>,
        lhs: Expression,
        rhs: Expression,
        line: usize,
    ) -> Result<Expression, CompileError> {
        let Some(op) = op else {
            return Err(CompileError::type_error("expected arithmetic operator", line));
        };
        let ty = Type::max(&lhs.ty, &rhs.ty).ok_or_else(|| {
            CompileError::type_error(
                format!("arithmetic on {} and {}", lhs.ty, rhs.ty),
                line,
            )
        })?;
        Ok(Expression::new(
            ExprKind::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            ty,
            line,
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::{ExprKind, Literal, Program, StmtKind};
    use crate::parser::parser::Parser;
    use crate::parser::types::Type;

    /// Value returned by the first statement of `main`
    fn returned(program: &Program) -> &crate::parser::ast::Expression {
        let body = &program.functions[0].body;
        let first = match &body.kind {
            StmtKind::Sequence { head, .. } => head.as_ref(),
            _ => body,
        };
        match &first.kind {
            StmtKind::Return { value: Some(value), .. } => value,
            other => panic!("Expected return, found {:?}", other),
        }
    }

    fn parse(source: &str) -> Program {
        Parser::new(source).unwrap().program().unwrap()
    }

    #[test]
    fn test_promotion_types_arithmetic() {
        let program = parse("[float main] { return 1 + 2.5; }");
        assert_eq!(returned(&program).ty, Type::Float);
    }

    #[test]
    fn test_double_negation_cancels() {
        let program = parse("[int main: int x] { return - -x; }");
        assert!(matches!(returned(&program).kind, ExprKind::Lvalue(_)));
    }

    #[test]
    fn test_double_not_cancels() {
        let program = parse("[bool main: int x] { return !!(x < 1); }");
        assert!(matches!(returned(&program).kind, ExprKind::Relation { .. }));
    }

    #[test]
    fn test_left_associative() {
        let program = parse("[int main] { return 8 - 4 - 2; }");
        match &returned(&program).kind {
            ExprKind::Arithmetic { lhs, rhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Arithmetic { .. }));
                assert!(matches!(rhs.kind, ExprKind::Constant(Literal::Int(2))));
            }
            other => panic!("Expected arithmetic, found {:?}", other),
        }
    }

    #[test]
    fn test_logical_operands_required() {
        let err = Parser::new("[bool main: int x] { return x && true; }")
            .unwrap()
            .program()
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Type);
    }

    #[test]
    fn test_bool_equality() {
        let program = parse("[bool main: bool a, bool b] { return a == b; }");
        assert_eq!(returned(&program).ty, Type::Bool);
    }

    #[test]
    fn test_compare_non_numeric_rejected() {
        let err = Parser::new("[bool main: bool a] { return a < 1; }")
            .unwrap()
            .program()
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Type);
    }

    #[test]
    fn test_array_literal_unifies() {
        let program = parse("[int main] { float f[] = [1, 2.5]; return 0; }");
        let body = &program.functions[0].body;
        match &body.kind {
            StmtKind::Sequence { head, .. } => match &head.kind {
                StmtKind::Assignment { value, .. } => {
                    assert_eq!(value.ty, Type::array(Type::Float, 2))
                }
                other => panic!("Expected assignment, found {:?}", other),
            },
            other => panic!("Expected sequence, found {:?}", other),
        }
    }

    #[test]
    fn test_array_literal_needs_constants() {
        let err = Parser::new("[int main: int x] { int a[] = [x, 1]; return 0; }")
            .unwrap()
            .program()
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Type);
    }

    #[test]
    fn test_literal_range() {
        assert!(Parser::new("[int main] { return 3000000000; }")
            .unwrap()
            .program()
            .is_err());
        assert!(Parser::new("[int main] { return -2147483648; }")
            .unwrap()
            .program()
            .is_ok());
    }
}
