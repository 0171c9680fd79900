//! Reduced operands
//!
//! Reducing an expression yields a [`Value`]: something that can be written
//! directly as an instruction operand. That is a literal, a temporary
//! register, a named storage slot, or a constant aggregate built from those.

use crate::parser::types::Type;
use std::fmt;

/// Operand payload of a [`Value`]
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Int(i64),
    Float(f64),
    Bool(bool),
    /// `%t.N`
    Temporary(u32),
    /// A named slot such as `%x.main.1`
    Named(String),
    /// Constant array: `[i32 1, i32 2]`
    Array(Vec<Value>),
    /// `zeroinitializer`
    Zero,
    /// Result of a void call
    Void,
}

/// A typed operand
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub operand: Operand,
    pub ty: Type,
}

impl Value {
    pub fn new(operand: Operand, ty: Type) -> Self {
        Value { operand, ty }
    }

    /// `i32 %t.3`: type followed by operand, as used in argument lists
    pub fn typed(&self) -> String {
        format!("{} {}", self.ty, self.operand)
    }

    pub fn is_constant(&self) -> bool {
        match &self.operand {
            Operand::Int(_) | Operand::Float(_) | Operand::Bool(_) | Operand::Zero => true,
            Operand::Array(elements) => elements.iter().all(Value::is_constant),
            Operand::Temporary(_) | Operand::Named(_) | Operand::Void => false,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(value) => write!(f, "{}", value),
            Operand::Float(value) => write!(f, "{}", float_literal(*value)),
            Operand::Bool(value) => write!(f, "{}", value),
            Operand::Temporary(n) => write!(f, "%t.{}", n),
            Operand::Named(name) => write!(f, "{}", name),
            Operand::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(Value::typed).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Operand::Zero => write!(f, "zeroinitializer"),
            Operand::Void => Ok(()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operand)
    }
}

/// Decimal text for a double constant; always carries a fractional part,
/// non-finite values use the hexadecimal bit pattern.
fn float_literal(value: f64) -> String {
    if !value.is_finite() {
        return format!("0x{:016X}", value.to_bits());
    }
    let text = format!("{:?}", value);
    match text.find('e') {
        Some(exponent) if !text[..exponent].contains('.') => {
            format!("{}.0{}", &text[..exponent], &text[exponent..])
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_rendering() {
        assert_eq!(Operand::Temporary(4).to_string(), "%t.4");
        assert_eq!(Operand::Int(-3).to_string(), "-3");
        assert_eq!(Operand::Bool(true).to_string(), "true");
        assert_eq!(Operand::Zero.to_string(), "zeroinitializer");

        let array = Value::new(
            Operand::Array(vec![
                Value::new(Operand::Int(1), Type::Int),
                Value::new(Operand::Int(2), Type::Int),
            ]),
            Type::array(Type::Int, 2),
        );
        assert_eq!(array.typed(), "[2 x i32] [i32 1, i32 2]");
        assert!(array.is_constant());
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(float_literal(1.0), "1.0");
        assert_eq!(float_literal(2.5), "2.5");
        assert_eq!(float_literal(-0.5), "-0.5");
        assert_eq!(float_literal(1e300), "1.0e300");
        assert_eq!(float_literal(f64::INFINITY), "0x7FF0000000000000");
    }
}
