// AST (Abstract Syntax Tree) definitions for the compiler

use super::lexer::Token;
use super::scope::{GlobalScope, ScopeId};
use super::types::Type;
use crate::errors::CompileError;
use std::rc::Rc;

/// Index of a prototype in the global function table
pub type PrototypeId = usize;

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithmeticOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Plus => Some(ArithmeticOp::Add),
            Token::Minus => Some(ArithmeticOp::Subtract),
            Token::Times => Some(ArithmeticOp::Multiply),
            Token::Divide => Some(ArithmeticOp::Divide),
            _ => None,
        }
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationOp {
    Less,
    LessEqual,
    Equal,
    NotEqual,
    GreaterEqual,
    Greater,
}

impl RelationOp {
    pub fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Less => Some(RelationOp::Less),
            Token::LEqual => Some(RelationOp::LessEqual),
            Token::Equal => Some(RelationOp::Equal),
            Token::NEqual => Some(RelationOp::NotEqual),
            Token::GEqual => Some(RelationOp::GreaterEqual),
            Token::Greater => Some(RelationOp::Greater),
            _ => None,
        }
    }

    /// `==` and `!=` also accept two bool operands
    pub fn is_equality(self) -> bool {
        matches!(self, RelationOp::Equal | RelationOp::NotEqual)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
}

/// How an identifier is bound, which decides its IR name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Function parameter, spilled to `%name.arg`
    Argument,
    /// Function name, `@name`
    Global,
    /// Block-local variable, `%name.function.scope`
    Local { function: Rc<str>, scope: ScopeId },
}

/// A named storage location (or function name)
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: Rc<str>,
    pub ty: Type,
    pub binding: Binding,
    pub line: usize,
}

impl Identifier {
    pub fn new(name: Rc<str>, ty: Type, binding: Binding, line: usize) -> Self {
        Identifier {
            name,
            ty,
            binding,
            line,
        }
    }

    /// Globally unique name of the identifier's storage in the emitted IR
    pub fn ir_name(&self) -> String {
        match &self.binding {
            Binding::Argument => format!("%{}.arg", self.name),
            Binding::Global => format!("@{}", self.name),
            Binding::Local { function, scope } => format!("%{}.{}.{}", self.name, function, scope),
        }
    }
}

/// Identity, not type: two identifiers are equal if they name the same binding
impl PartialEq for Identifier {
    fn eq(&self, other: &Identifier) -> bool {
        self.name == other.name && self.binding == other.binding
    }
}

/// Expressions that denote a storage location
#[derive(Debug, Clone, PartialEq)]
pub enum Lvalue {
    Identifier(Identifier),
    ArrayAccess {
        parent: Box<Lvalue>,
        index: Box<Expression>,
        ty: Type,
    },
    MemberAccess {
        parent: Box<Lvalue>,
        /// Position of the member in the aggregate
        member: usize,
        name: Rc<str>,
        ty: Type,
    },
}

impl Lvalue {
    pub fn ty(&self) -> &Type {
        match self {
            Lvalue::Identifier(id) => &id.ty,
            Lvalue::ArrayAccess { ty, .. } | Lvalue::MemberAccess { ty, .. } => ty,
        }
    }

    /// The variable at the bottom of an access chain
    pub fn root(&self) -> &Identifier {
        match self {
            Lvalue::Identifier(id) => id,
            Lvalue::ArrayAccess { parent, .. } | Lvalue::MemberAccess { parent, .. } => parent.root(),
        }
    }
}

/// Numeric literal payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
}

/// Expression variants
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Numeric literal of type char, int or float
    Constant(Literal),
    Boolean(bool),
    /// Bracketed literal or desugared string; elements are constants
    ArrayLiteral(Vec<Expression>),
    /// All-zero value of an array or aggregate
    Zeroed,
    Lvalue(Lvalue),
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Call {
        callee: Identifier,
        prototype: PrototypeId,
        args: Vec<Expression>,
        /// Declared parameter types, for argument conversion
        params: Vec<Type>,
    },
    Relation {
        op: RelationOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
}

/// A typed expression; the type is resolved when the node is built
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub ty: Type,
    pub line: usize,
}

impl Expression {
    pub fn new(kind: ExprKind, ty: Type, line: usize) -> Self {
        Expression { kind, ty, line }
    }

    pub fn int(value: i64, ty: Type, line: usize) -> Self {
        Expression::new(ExprKind::Constant(Literal::Int(value)), ty, line)
    }

    pub fn float(value: f64, line: usize) -> Self {
        Expression::new(ExprKind::Constant(Literal::Float(value)), Type::Float, line)
    }

    pub fn boolean(value: bool, line: usize) -> Self {
        Expression::new(ExprKind::Boolean(value), Type::Bool, line)
    }

    pub fn lvalue(lvalue: Lvalue, line: usize) -> Self {
        let ty = lvalue.ty().clone();
        Expression::new(ExprKind::Lvalue(lvalue), ty, line)
    }

    /// The value a declaration without an initializer starts out with
    pub fn default_for(ty: &Type, line: usize) -> Result<Expression, CompileError> {
        match ty {
            Type::Bool => Ok(Expression::boolean(false, line)),
            Type::Char | Type::Int => Ok(Expression::int(0, ty.clone(), line)),
            Type::Float => Ok(Expression::float(0.0, line)),
            Type::Array { .. } | Type::Aggregate(_) | Type::Pointer(_) => {
                Ok(Expression::new(ExprKind::Zeroed, ty.clone(), line))
            }
            Type::Void => Err(CompileError::type_error(
                "variable declared with type void",
                line,
            )),
        }
    }

    /// Nodes that evaluate by branching rather than producing a value
    pub fn is_logical(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Boolean(_)
                | ExprKind::Relation { .. }
                | ExprKind::And(..)
                | ExprKind::Or(..)
                | ExprKind::Not(_)
        )
    }

    /// Usable as a condition: logical, or any other bool-typed value
    pub fn is_condition(&self) -> bool {
        self.is_logical() || self.ty == Type::Bool
    }

    /// Compile-time constant (literal elements all the way down)
    pub fn is_constant(&self) -> bool {
        match &self.kind {
            ExprKind::Constant(_) | ExprKind::Boolean(_) | ExprKind::Zeroed => true,
            ExprKind::ArrayLiteral(elements) => elements.iter().all(Expression::is_constant),
            _ => false,
        }
    }
}

/// Statement variants
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `{}` or a block holding only declarations of nothing
    Empty,
    /// Cons-list forming the body of a block
    Sequence {
        head: Box<Statement>,
        tail: Option<Box<Statement>>,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    DoWhile {
        body: Box<Statement>,
        condition: Expression,
    },
    Assignment {
        target: Lvalue,
        value: Expression,
    },
    Return {
        value: Option<Expression>,
        return_type: Type,
    },
    Break,
    /// Call evaluated for its side effect
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StmtKind,
    pub line: usize,
}

impl Statement {
    pub fn new(kind: StmtKind, line: usize) -> Self {
        Statement { kind, line }
    }

    /// Build a sequence from statements in order
    pub fn sequence(statements: Vec<Statement>, line: usize) -> Statement {
        statements
            .into_iter()
            .rev()
            .fold(None, |tail: Option<Statement>, head| {
                let line = head.line;
                Some(Statement::new(
                    StmtKind::Sequence {
                        head: Box::new(head),
                        tail: tail.map(Box::new),
                    },
                    line,
                ))
            })
            .unwrap_or_else(|| Statement::new(StmtKind::Empty, line))
    }
}

/// Function header: name (carrying the return type) and parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub id: PrototypeId,
    pub name: Identifier,
    pub params: Vec<Identifier>,
    pub implemented: bool,
    pub line: usize,
}

impl Prototype {
    pub fn return_type(&self) -> &Type {
        &self.name.ty
    }

    pub fn param_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// Same return type and parameter types (names may differ)
    pub fn same_signature(&self, return_type: &Type, params: &[Identifier]) -> bool {
        self.return_type() == return_type
            && self.params.len() == params.len()
            && self.params.iter().zip(params).all(|(a, b)| a.ty == b.ty)
    }
}

/// A prototype with a body
#[derive(Debug, Clone)]
pub struct Function {
    pub signature: Prototype,
    pub body: Statement,
    pub line: usize,
}

/// Parsed program: functions in source order plus the global tables
#[derive(Debug)]
pub struct Program {
    pub functions: Vec<Function>,
    pub globals: GlobalScope,
}
