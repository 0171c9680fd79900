//! Declaration parsing
//!
//! Top-level constructs are bracketed headers:
//!
//! ```text
//! struct_decl   ::= '[' 'struct' IDENT (':' field (',' field)*)? ']' ';'?
//! function_decl ::= '[' type IDENT (':' field (',' field)*)? ']' (';' | block)
//! field         ::= type IDENT dims
//! ```
//!
//! Inside function bodies, a statement that starts with a type keyword or a
//! struct name declares a variable:
//!
//! ```text
//! var_decl ::= type dims IDENT dims ('=' expression)? ';'
//! dims     ::= ('[' INTEGER? ']')*
//! ```

use super::ast::{Binding, ExprKind, Expression, Function, Identifier, Lvalue, Statement, StmtKind};
use super::lexer::Token;
use super::parser::{Enclosing, Parser};
use super::scope::Symbol;
use super::types::{AggregateType, Type};
use crate::errors::CompileError;
use log::debug;
use std::rc::Rc;

/// Element indices are emitted as `i32`
const MAX_ARRAY_LENGTH: i64 = i32::MAX as i64;

/// A `type name` pair from a parameter or member list
pub(crate) struct Field {
    pub name: Rc<str>,
    pub ty: Type,
    pub line: usize,
}

impl Parser {
    /// Parse one bracketed top-level construct. Returns the function if the
    /// construct was a function definition.
    pub(crate) fn top_level(&mut self) -> Result<Option<Function>, CompileError> {
        self.match_token(&Token::LBrack)?;
        if self.check(&Token::Struct) {
            self.structure()?;
            Ok(None)
        } else {
            self.function()
        }
    }

    /// `struct Name: T a, T b]`, with the opening bracket already consumed
    fn structure(&mut self) -> Result<(), CompileError> {
        self.match_token(&Token::Struct)?;
        let line = self.line;
        let name = self.expect_identifier()?;

        let fields = if self.check(&Token::Colon) {
            self.advance()?;
            self.field_list()?
        } else {
            Vec::new()
        };
        self.match_token(&Token::RBrack)?;
        if self.check(&Token::Semi) {
            self.advance()?;
        }

        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(CompileError::Redeclared {
                    name: field.name.to_string(),
                    line: field.line,
                });
            }
        }

        let aggregate = AggregateType::new(
            name,
            fields.into_iter().map(|f| (f.name, f.ty)).collect(),
            line,
        );
        let aggregate = self.scope.global.declare_aggregate(aggregate)?;
        debug!("declared struct {} with {} member(s)", aggregate.name, aggregate.members.len());
        Ok(())
    }

    /// `RetT name: T a, T b]` followed by `;` or a body, with the opening
    /// bracket already consumed
    fn function(&mut self) -> Result<Option<Function>, CompileError> {
        let return_type = self.type_specifier()?;
        let return_type = self.dimensions(return_type)?;
        let line = self.line;
        let name = self.expect_identifier()?;

        let fields = if self.check(&Token::Colon) {
            self.advance()?;
            self.field_list()?
        } else {
            Vec::new()
        };
        self.match_token(&Token::RBrack)?;

        // parameters live in the function's outermost frame; errors abort the
        // whole parse, so the frame is only closed on success
        self.scope.enter();
        let mut params = Vec::with_capacity(fields.len());
        for field in fields {
            if field.ty == Type::Void {
                return Err(CompileError::type_error(
                    format!("parameter '{}' declared with type void", field.name),
                    field.line,
                ));
            }
            let param = Identifier::new(field.name, field.ty, Binding::Argument, field.line);
            self.scope.declare(param.clone())?;
            params.push(param);
        }

        let has_body = !self.check(&Token::Semi);
        let id = match self.scope.global.prototype_for(&name) {
            Some(id) => {
                let prototype = self.scope.global.prototype(id);
                if !prototype.same_signature(&return_type, &params) {
                    return Err(CompileError::ConflictingDeclaration {
                        name: name.to_string(),
                        line,
                    });
                }
                if has_body && prototype.implemented {
                    return Err(CompileError::Redefinition {
                        name: name.to_string(),
                        line,
                    });
                }
                id
            }
            None => {
                let callee = Identifier::new(name.clone(), return_type.clone(), Binding::Global, line);
                self.scope.global.declare_prototype(callee, params.clone(), line)?
            }
        };

        if !has_body {
            self.advance()?;
            self.scope.leave();
            debug!("declared prototype for {}", name);
            return Ok(None);
        }

        // the defining header's parameter names are the ones the body sees
        let prototype = self.scope.global.prototype_mut(id);
        prototype.implemented = true;
        prototype.params = params;
        let signature = prototype.clone();

        self.function = Some(Enclosing {
            name: name.clone(),
            return_type,
        });
        let body = self.braced_sequence()?;
        self.function = None;
        self.scope.leave();

        debug!("parsed function {} ({} parameter(s))", name, signature.params.len());
        Ok(Some(Function {
            signature,
            body,
            line,
        }))
    }

    /// Comma-separated `type name` pairs shared by parameter and member lists
    fn field_list(&mut self) -> Result<Vec<Field>, CompileError> {
        let mut fields = Vec::new();
        loop {
            let base = self.type_specifier()?;
            let base = self.dimensions(base)?;
            let line = self.line;
            let name = self.expect_identifier()?;
            let ty = self.dimensions_after(base)?;
            if !ty.is_fully_specified() {
                return Err(CompileError::type_error(
                    format!("array '{}' needs an explicit length", name),
                    line,
                ));
            }
            fields.push(Field { name, ty, line });

            if self.check(&Token::Comma) {
                self.advance()?;
            } else {
                return Ok(fields);
            }
        }
    }

    /// A type keyword or the name of a declared struct
    pub(crate) fn type_specifier(&mut self) -> Result<Type, CompileError> {
        match &self.lookahead {
            Token::Type(ty) => {
                let ty = ty.clone();
                self.advance()?;
                Ok(ty)
            }
            Token::Identifier(name) => match self.scope.global.aggregate(name) {
                Some(aggregate) => {
                    let ty = Type::Aggregate(aggregate.clone());
                    self.advance()?;
                    Ok(ty)
                }
                None => Err(CompileError::UnknownType {
                    name: name.to_string(),
                    line: self.line,
                }),
            },
            _ => Err(self.unexpected("type")),
        }
    }

    /// Whether the lookahead starts a variable declaration
    pub(crate) fn at_declaration(&self) -> bool {
        match &self.lookahead {
            Token::Type(_) => true,
            Token::Identifier(name) => {
                self.scope.global.aggregate(name).is_some()
                    && !matches!(self.scope.lookup(name), Some(Symbol::Variable(_)))
            }
            _ => false,
        }
    }

    /// Wrap `base` in one array level per bracket group; `[]` leaves the
    /// length to be inferred.
    pub(crate) fn dimensions(&mut self, base: Type) -> Result<Type, CompileError> {
        let mut lengths = Vec::new();
        while self.check(&Token::LBrack) {
            self.advance()?;
            match self.lookahead {
                Token::Integer(n) if n > MAX_ARRAY_LENGTH => {
                    return Err(CompileError::type_error(
                        format!("array length {} exceeds {}", n, MAX_ARRAY_LENGTH),
                        self.line,
                    ))
                }
                Token::Integer(n) if n > 0 => {
                    self.advance()?;
                    lengths.push(n as usize);
                }
                Token::Integer(_) => {
                    return Err(CompileError::type_error(
                        "array length must be positive",
                        self.line,
                    ))
                }
                _ => lengths.push(0),
            }
            self.match_token(&Token::RBrack)?;
        }

        if !lengths.is_empty() && base == Type::Void {
            return Err(CompileError::type_error("array of void", self.line));
        }

        // a[2][3] is an array of two arrays of three
        Ok(lengths
            .into_iter()
            .rev()
            .fold(base, |ty, length| Type::array(ty, length)))
    }

    /// Variable declaration, desugared to an assignment of the initializer
    /// (or the type's default value) to the new variable.
    pub(crate) fn declaration(&mut self) -> Result<Statement, CompileError> {
        let base = self.type_specifier()?;
        let base = self.dimensions(base)?;
        let line = self.line;
        let name = self.expect_identifier()?;
        let declared = self.dimensions_after(base)?;

        if declared == Type::Void {
            return Err(CompileError::type_error(
                format!("variable '{}' declared with type void", name),
                line,
            ));
        }

        let (ty, value) = if self.check(&Token::Assign) {
            self.advance()?;
            let value = self.expression()?;
            let ty = self.agree(&declared, &value)?;
            (ty, value)
        } else {
            if !declared.is_fully_specified() {
                return Err(CompileError::type_error(
                    format!("array '{}' needs a length or an initializer", name),
                    line,
                ));
            }
            let value = Expression::default_for(&declared, line)?;
            (declared, value)
        };
        self.match_token(&Token::Semi)?;

        let function = match &self.function {
            Some(enclosing) => enclosing.name.clone(),
            None => {
                return Err(CompileError::type_error(
                    format!("variable '{}' declared outside a function", name),
                    line,
                ))
            }
        };
        // registered only now, so the initializer cannot see the new name
        let identifier = Identifier::new(name, ty, self.scope.local_binding(&function), line);
        self.scope.declare(identifier.clone())?;

        Ok(Statement::new(
            StmtKind::Assignment {
                target: Lvalue::Identifier(identifier),
                value,
            },
            line,
        ))
    }

    /// Dimensions written after the variable name nest inside those written
    /// after the type: `int[2] x[3]` is two arrays of three.
    fn dimensions_after(&mut self, declared: Type) -> Result<Type, CompileError> {
        match declared {
            Type::Array { to, length } => {
                let inner = self.dimensions_after(*to)?;
                Ok(Type::array(inner, length))
            }
            base => self.dimensions(base),
        }
    }

    /// Resolve the type of a declaration or assignment target against the
    /// value stored into it. Only array literals convert element-wise; any
    /// other array value must already have the target's element types.
    pub(crate) fn agree(&self, declared: &Type, value: &Expression) -> Result<Type, CompileError> {
        if matches!(declared, Type::Array { .. }) {
            let converts_per_element = matches!(value.kind, ExprKind::ArrayLiteral(_));
            return declared
                .infer_from(&value.ty)
                .filter(|inferred| converts_per_element || *inferred == value.ty)
                .ok_or_else(|| {
                    CompileError::type_error(
                        format!(
                            "value of type {} does not match declared type {}",
                            value.ty, declared
                        ),
                        value.line,
                    )
                });
        }
        if value.ty.can_convert_to(declared) {
            Ok(declared.clone())
        } else {
            Err(CompileError::NoConversion {
                from: value.ty.to_string(),
                to: declared.to_string(),
                line: value.line,
            })
        }
    }
}
