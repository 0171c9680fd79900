//! Expression lowering
//!
//! Expressions are lowered through four operations on the [`Generator`]:
//!
//! - [`reduce`](Generator::reduce): emit whatever computes the expression and
//!   return the resulting operand
//! - [`convert`](Generator::convert): reduce, then convert to a target type;
//!   literals are converted at compile time and never emit anything
//! - [`generate_branches`](Generator::generate_branches): evaluate a boolean
//!   expression as control flow, jumping to the true or false label
//! - [`address`](Generator::address): pointer to the storage an lvalue names
//!
//! # Short circuit
//!
//! `a && b` evaluates `a` with its true edge falling through into `b` and its
//! false edge going straight to the false label; `||` is the dual. A label
//! passed as `None` means the caller places the code for that outcome
//! directly after the branch.

use super::generator::{Generator, Label};
use super::value::{Operand, Value};
use crate::errors::CompileError;
use crate::parser::ast::{
    ArithmeticOp, ExprKind, Expression, Literal, Lvalue, RelationOp, UnaryOp,
};
use crate::parser::types::Type;

impl Generator {
    /// Lower an expression to an operand
    pub fn reduce(&mut self, expression: &Expression) -> Result<Value, CompileError> {
        let ty = expression.ty.clone();
        match &expression.kind {
            ExprKind::Constant(Literal::Int(value)) => Ok(Value::new(Operand::Int(*value), ty)),
            ExprKind::Constant(Literal::Float(value)) => {
                Ok(Value::new(Operand::Float(*value), ty))
            }
            ExprKind::Boolean(value) => Ok(Value::new(Operand::Bool(*value), ty)),
            ExprKind::Zeroed => Ok(Value::new(Operand::Zero, ty)),
            ExprKind::ArrayLiteral(_) => self.convert(expression, &ty),

            ExprKind::Lvalue(lvalue) => {
                let address = self.address(lvalue)?;
                let result = self.temporary(ty);
                self.append(format!(
                    "{} = load {}, {}* {}",
                    result, result.ty, result.ty, address
                ));
                Ok(result)
            }

            ExprKind::Arithmetic { op, lhs, rhs } => {
                let lhs = self.convert(lhs, &ty)?;
                let rhs = self.convert(rhs, &ty)?;
                let opcode = match (op, ty.is_floating_point()) {
                    (ArithmeticOp::Add, false) => "add",
                    (ArithmeticOp::Subtract, false) => "sub",
                    (ArithmeticOp::Multiply, false) => "mul",
                    (ArithmeticOp::Divide, false) => "sdiv",
                    (ArithmeticOp::Add, true) => "fadd",
                    (ArithmeticOp::Subtract, true) => "fsub",
                    (ArithmeticOp::Multiply, true) => "fmul",
                    (ArithmeticOp::Divide, true) => "fdiv",
                };
                let result = self.temporary(ty);
                self.append(format!(
                    "{} = {} {} {}, {}",
                    result, opcode, result.ty, lhs, rhs
                ));
                Ok(result)
            }

            ExprKind::Unary {
                op: UnaryOp::Negate,
                operand,
            } => {
                let operand = self.reduce(operand)?;
                let result = self.temporary(ty);
                if result.ty.is_floating_point() {
                    self.append(format!("{} = fneg {} {}", result, result.ty, operand));
                } else {
                    self.append(format!("{} = sub {} 0, {}", result, result.ty, operand));
                }
                Ok(result)
            }

            ExprKind::Call {
                callee,
                args,
                params,
                ..
            } => {
                let mut values = Vec::with_capacity(args.len());
                for (arg, param) in args.iter().zip(params) {
                    values.push(self.convert(arg, param)?.typed());
                }
                let call = format!("call {} {}({})", ty, callee.ir_name(), values.join(", "));
                if ty == Type::Void {
                    self.append(call);
                    return Ok(Value::new(Operand::Void, ty));
                }
                let result = self.temporary(ty);
                self.append(format!("{} = {}", result, call));
                Ok(result)
            }

            ExprKind::Relation { op, lhs, rhs } => self.compare(*op, lhs, rhs, expression.line),

            // a logical expression used as a value: branch, then merge
            ExprKind::And(..) | ExprKind::Or(..) | ExprKind::Not(_) => {
                let on_true = self.reserve_label();
                let on_false = self.reserve_label();
                let done = self.reserve_label();
                self.generate_branches(expression, Some(on_true), Some(on_false))?;
                self.append_label(on_true);
                self.jump_to(done);
                self.append_label(on_false);
                self.jump_to(done);
                self.append_label(done);
                let result = self.temporary(Type::Bool);
                self.append(format!(
                    "{} = phi i1 [ true, %{} ], [ false, %{} ]",
                    result, on_true, on_false
                ));
                Ok(result)
            }
        }
    }

    /// Lower an expression and convert it to `to`
    pub fn convert(&mut self, expression: &Expression, to: &Type) -> Result<Value, CompileError> {
        let line = expression.line;
        match &expression.kind {
            ExprKind::Constant(literal) => fold(*literal, &expression.ty, to).ok_or_else(|| {
                CompileError::NoConversion {
                    from: expression.ty.to_string(),
                    to: to.to_string(),
                    line,
                }
            }),
            ExprKind::ArrayLiteral(elements) => {
                let element_type = to.element().ok_or_else(|| CompileError::NoConversion {
                    from: expression.ty.to_string(),
                    to: to.to_string(),
                    line,
                })?;
                let values = elements
                    .iter()
                    .map(|e| self.convert(e, element_type))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::new(Operand::Array(values), to.clone()))
            }
            _ => {
                let value = self.reduce(expression)?;
                self.convert_value(value, to, line)
            }
        }
    }

    /// Convert an already reduced operand, emitting at most one instruction
    pub fn convert_value(&mut self, value: Value, to: &Type, line: usize) -> Result<Value, CompileError> {
        let from = &value.ty;
        if from == to {
            return Ok(value);
        }

        let opcode = if to.is_floating_point() && from.is_integral() {
            "sitofp"
        } else if to.is_integral() && from.is_floating_point() {
            "fptosi"
        } else if to.is_integral() && from.is_integral() {
            if to.apparent_size() > from.apparent_size() {
                "zext"
            } else {
                "trunc"
            }
        } else {
            return Err(CompileError::NoConversion {
                from: from.to_string(),
                to: to.to_string(),
                line,
            });
        };

        let result = self.temporary(to.clone());
        self.append(format!(
            "{} = {} {} to {}",
            result,
            opcode,
            value.typed(),
            to
        ));
        Ok(result)
    }

    /// Evaluate a boolean expression as control flow
    pub fn generate_branches(
        &mut self,
        expression: &Expression,
        on_true: Option<Label>,
        on_false: Option<Label>,
    ) -> Result<(), CompileError> {
        match &expression.kind {
            ExprKind::Boolean(value) => {
                let target = if *value { on_true } else { on_false };
                if let Some(label) = target {
                    self.jump_to(label);
                }
                Ok(())
            }
            ExprKind::Not(operand) => self.generate_branches(operand, on_false, on_true),
            ExprKind::And(lhs, rhs) => {
                let (exit, placed_here) = match on_false {
                    Some(label) => (label, false),
                    None => (self.reserve_label(), true),
                };
                self.generate_branches(lhs, None, Some(exit))?;
                self.generate_branches(rhs, on_true, on_false)?;
                if placed_here {
                    self.append_label(exit);
                }
                Ok(())
            }
            ExprKind::Or(lhs, rhs) => {
                let (exit, placed_here) = match on_true {
                    Some(label) => (label, false),
                    None => (self.reserve_label(), true),
                };
                self.generate_branches(lhs, Some(exit), None)?;
                self.generate_branches(rhs, on_true, on_false)?;
                if placed_here {
                    self.append_label(exit);
                }
                Ok(())
            }
            ExprKind::Relation { op, lhs, rhs } => {
                let condition = self.compare(*op, lhs, rhs, expression.line)?;
                self.branch(&condition, on_true, on_false);
                Ok(())
            }
            _ => {
                let condition = self.convert(expression, &Type::Bool)?;
                self.branch(&condition, on_true, on_false);
                Ok(())
            }
        }
    }

    /// `icmp`/`fcmp` of two operands promoted to a common type
    fn compare(
        &mut self,
        op: RelationOp,
        lhs: &Expression,
        rhs: &Expression,
        line: usize,
    ) -> Result<Value, CompileError> {
        let operand_type = if lhs.ty == Type::Bool && rhs.ty == Type::Bool {
            Type::Bool
        } else {
            Type::max(&lhs.ty, &rhs.ty).ok_or_else(|| {
                CompileError::type_error(format!("cannot compare {} with {}", lhs.ty, rhs.ty), line)
            })?
        };
        let lhs = self.convert(lhs, &operand_type)?;
        let rhs = self.convert(rhs, &operand_type)?;

        let instruction = if operand_type.is_floating_point() {
            let predicate = match op {
                RelationOp::Equal => "oeq",
                RelationOp::NotEqual => "one",
                RelationOp::Less => "olt",
                RelationOp::LessEqual => "ole",
                RelationOp::Greater => "ogt",
                RelationOp::GreaterEqual => "oge",
            };
            format!("fcmp {}", predicate)
        } else {
            let predicate = match op {
                RelationOp::Equal => "eq",
                RelationOp::NotEqual => "ne",
                RelationOp::Less => "slt",
                RelationOp::LessEqual => "sle",
                RelationOp::Greater => "sgt",
                RelationOp::GreaterEqual => "sge",
            };
            format!("icmp {}", predicate)
        };

        let result = self.temporary(Type::Bool);
        self.append(format!(
            "{} = {} {} {}, {}",
            result, instruction, operand_type, lhs, rhs
        ));
        Ok(result)
    }

    /// Pointer to the storage of an lvalue; variables get their slot on
    /// first use.
    pub fn address(&mut self, lvalue: &Lvalue) -> Result<Value, CompileError> {
        match lvalue {
            Lvalue::Identifier(identifier) => {
                let name = identifier.ir_name();
                self.allocate(&name, &identifier.ty);
                Ok(Value::new(
                    Operand::Named(name),
                    Type::pointer(identifier.ty.clone()),
                ))
            }
            Lvalue::ArrayAccess { parent, index, ty } => {
                let base = self.address(parent)?;
                let index = self.convert(index, &Type::Int)?;
                Ok(self.element_pointer(parent.ty(), &base, &index.to_string(), ty))
            }
            Lvalue::MemberAccess {
                parent, member, ty, ..
            } => {
                let base = self.address(parent)?;
                Ok(self.element_pointer(parent.ty(), &base, &member.to_string(), ty))
            }
        }
    }

    fn element_pointer(
        &mut self,
        parent: &Type,
        base: &Value,
        index: &str,
        element: &Type,
    ) -> Value {
        let result = self.temporary(Type::pointer(element.clone()));
        self.append(format!(
            "{} = getelementptr {}, {}* {}, i32 0, i32 {}",
            result, parent, parent, base, index
        ));
        result
    }
}

/// Compile-time conversion of a literal; `None` if `to` is not numeric
fn fold(literal: Literal, from: &Type, to: &Type) -> Option<Value> {
    let operand = match (literal, to) {
        (Literal::Int(value), Type::Float) => Operand::Float(widen(value, from) as f64),
        (Literal::Int(value), Type::Int) => Operand::Int(i64::from(widen(value, from) as i32)),
        (Literal::Int(value), Type::Char) => Operand::Int(i64::from(value as i8)),
        (Literal::Float(value), Type::Float) => Operand::Float(value),
        (Literal::Float(value), Type::Int) => Operand::Int(i64::from(value as i32)),
        (Literal::Float(value), Type::Char) => Operand::Int(i64::from(value as i32 as i8)),
        _ => return None,
    };
    Some(Value::new(operand, to.clone()))
}

/// Widening a char zero-extends, as the runtime conversion does
fn widen(value: i64, from: &Type) -> i64 {
    if *from == Type::Char {
        i64::from(value as u8)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{Binding, Identifier};
    use std::rc::Rc;

    fn variable(name: &str, ty: Type) -> Expression {
        let identifier = Identifier::new(
            Rc::from(name),
            ty,
            Binding::Local {
                function: Rc::from("main"),
                scope: 0,
            },
            1,
        );
        Expression::lvalue(Lvalue::Identifier(identifier), 1)
    }

    #[test]
    fn test_constant_conversion_folds() {
        let mut gen = Generator::new();
        let value = gen
            .convert(&Expression::int(300, Type::Int, 1), &Type::Char)
            .unwrap();

        assert_eq!(value.operand, Operand::Int(44));
        assert_eq!(value.ty, Type::Char);
        assert!(gen.output().is_empty());

        let value = gen
            .convert(&Expression::int(200, Type::Int, 1), &Type::Char)
            .unwrap();
        assert_eq!(value.operand, Operand::Int(-56));

        let value = gen.convert(&Expression::float(2.75, 1), &Type::Int).unwrap();
        assert_eq!(value.operand, Operand::Int(2));
        assert!(gen.output().is_empty());
    }

    #[test]
    fn test_int_to_float_emits_one_sitofp() {
        let mut gen = Generator::new();
        let temporary = gen.temporary(Type::Int);
        let value = gen.convert_value(temporary, &Type::Float, 1).unwrap();

        assert_eq!(value.ty, Type::Float);
        assert_eq!(gen.output().lines().count(), 1);
        assert_eq!(gen.output().matches("sitofp").count(), 1);
        assert!(gen.output().contains("sitofp i32 %t.1 to double"));
    }

    #[test]
    fn test_width_conversions() {
        let mut gen = Generator::new();
        let byte = gen.temporary(Type::Char);
        gen.convert_value(byte, &Type::Int, 1).unwrap();
        let word = gen.temporary(Type::Int);
        gen.convert_value(word, &Type::Char, 1).unwrap();

        assert!(gen.output().contains("zext i8 %t.1 to i32"));
        assert!(gen.output().contains("trunc i32 %t.3 to i8"));
    }

    #[test]
    fn test_no_conversion_to_bool() {
        let mut gen = Generator::new();
        let word = gen.temporary(Type::Int);
        let err = gen.convert_value(word, &Type::Bool, 7).unwrap_err();
        assert!(matches!(err, CompileError::NoConversion { line: 7, .. }));
    }

    #[test]
    fn test_array_literal_converts_elements() {
        let mut gen = Generator::new();
        let literal = Expression::new(
            ExprKind::ArrayLiteral(vec![
                Expression::int(1, Type::Int, 1),
                Expression::int(2, Type::Int, 1),
            ]),
            Type::array(Type::Int, 2),
            1,
        );
        let value = gen.convert(&literal, &Type::array(Type::Float, 2)).unwrap();

        assert_eq!(value.typed(), "[2 x double] [double 1.0, double 2.0]");
        assert!(gen.output().is_empty());
    }

    #[test]
    fn test_load_allocates_once() {
        let mut gen = Generator::new();
        let x = variable("x", Type::Int);
        gen.reduce(&x).unwrap();
        gen.reduce(&x).unwrap();

        assert_eq!(gen.output().matches("alloca").count(), 1);
        assert_eq!(gen.output().matches("load i32, i32* %x.main.0").count(), 2);
    }

    #[test]
    fn test_mixed_arithmetic_promotes() {
        let mut gen = Generator::new();
        let sum = Expression::new(
            ExprKind::Arithmetic {
                op: ArithmeticOp::Divide,
                lhs: Box::new(variable("n", Type::Int)),
                rhs: Box::new(Expression::float(2.0, 1)),
            },
            Type::Float,
            1,
        );
        gen.reduce(&sum).unwrap();

        assert!(gen.output().contains("sitofp i32"));
        assert!(gen.output().contains("fdiv double"));
    }

    #[test]
    fn test_boolean_constant_jumps() {
        let mut gen = Generator::new();
        let yes = gen.reserve_label();
        let no = gen.reserve_label();
        gen.generate_branches(&Expression::boolean(false, 1), Some(yes), Some(no))
            .unwrap();

        assert_eq!(gen.output(), "  br label %L2\n");
    }

    #[test]
    fn test_and_short_circuits() {
        let mut gen = Generator::new();
        let yes = gen.reserve_label();
        let no = gen.reserve_label();
        let condition = Expression::new(
            ExprKind::And(
                Box::new(variable("a", Type::Bool)),
                Box::new(variable("b", Type::Bool)),
            ),
            Type::Bool,
            1,
        );
        gen.generate_branches(&condition, Some(yes), Some(no)).unwrap();

        let output = gen.output();
        // a false goes straight to the false label, a true falls into b
        assert!(output.contains("br i1 %t.1, label %L3, label %L2"));
        assert!(output.contains("L3:\n"));
        assert!(output.contains("br i1 %t.2, label %L1, label %L2"));
    }

    #[test]
    fn test_not_swaps_targets() {
        let mut gen = Generator::new();
        let yes = gen.reserve_label();
        let no = gen.reserve_label();
        let condition = Expression::new(
            ExprKind::Not(Box::new(variable("a", Type::Bool))),
            Type::Bool,
            1,
        );
        gen.generate_branches(&condition, Some(yes), Some(no)).unwrap();

        assert!(gen.output().contains("br i1 %t.1, label %L2, label %L1"));
    }
}
