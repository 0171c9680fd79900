//! Value types of the source language
//!
//! The type lattice is deliberately small: `void`, `bool`, `char` (8-bit),
//! `int` (32-bit), `float` (64-bit), plus pointers, arrays and named structs.
//!
//! # Equality
//!
//! Primitive types compare structurally by their numeric/signed/floating/width
//! attributes. Pointers and arrays compare their pointee recursively (arrays
//! also compare length). Structs are nominal: two aggregates are equal only if
//! they come from the same declaration.
//!
//! # Promotion
//!
//! [`Type::max`] implements the three-level `float > int > char` promotion
//! used by arithmetic and relational expressions.

use std::fmt;
use std::rc::Rc;

/// A value type.
#[derive(Debug, Clone)]
pub enum Type {
    Void,
    Bool,
    Char,
    Int,
    Float,
    Pointer(Box<Type>),
    /// `length == 0` means "unsized, infer from the initializer"
    Array { to: Box<Type>, length: usize },
    Aggregate(Rc<AggregateType>),
}

/// A named struct type registered in the global scope
#[derive(Debug)]
pub struct AggregateType {
    pub name: Rc<str>,
    pub members: Vec<Member>,
    pub line: usize,
}

/// Struct member with its byte offset inside the aggregate
#[derive(Debug, Clone)]
pub struct Member {
    pub name: Rc<str>,
    pub ty: Type,
    pub offset: usize,
}

impl AggregateType {
    /// Build an aggregate, laying members out back to back.
    pub fn new(name: Rc<str>, fields: Vec<(Rc<str>, Type)>, line: usize) -> Self {
        let mut offset = 0;
        let members = fields
            .into_iter()
            .map(|(name, ty)| {
                let member = Member {
                    name,
                    offset,
                    ty: ty.clone(),
                };
                offset = offset.saturating_add(ty.actual_size() / 8);
                member
            })
            .collect();
        AggregateType {
            name,
            members,
            line,
        }
    }

    /// Position and declaration of the member called `name`
    pub fn member(&self, name: &str) -> Option<(usize, &Member)> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, m)| &*m.name == name)
    }

    /// `type { i32, double }` body used in the type definition line
    pub fn definition(&self) -> String {
        let fields: Vec<String> = self.members.iter().map(|m| m.ty.to_string()).collect();
        if fields.is_empty() {
            "type {}".to_string()
        } else {
            format!("type {{ {} }}", fields.join(", "))
        }
    }
}

impl Type {
    pub fn array(to: Type, length: usize) -> Self {
        Type::Array {
            to: Box::new(to),
            length,
        }
    }

    pub fn pointer(to: Type) -> Self {
        Type::Pointer(Box::new(to))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Char | Type::Int | Type::Float)
    }

    pub fn is_signed(&self) -> bool {
        self.is_numeric()
    }

    pub fn is_floating_point(&self) -> bool {
        matches!(self, Type::Float)
    }

    /// Numeric and not floating point: valid as an array index
    pub fn is_integral(&self) -> bool {
        matches!(self, Type::Char | Type::Int)
    }

    /// Bit width used for IR type names and conversion decisions
    pub fn apparent_size(&self) -> usize {
        match self {
            Type::Void => 0,
            Type::Bool => 1,
            Type::Char => 8,
            Type::Int => 32,
            Type::Float => 64,
            Type::Pointer(_) => 64,
            Type::Array { to, length } => to.actual_size().saturating_mul(*length),
            Type::Aggregate(aggregate) => aggregate
                .members
                .iter()
                .fold(0, |size, m| size.saturating_add(m.ty.actual_size())),
        }
    }

    /// Storage width, rounded up to whole bytes
    pub fn actual_size(&self) -> usize {
        self.apparent_size().div_ceil(8).saturating_mul(8)
    }

    /// Promotion rule for arithmetic and comparisons.
    ///
    /// Returns `None` if either side is not `char`, `int` or `float`.
    pub fn max(a: &Type, b: &Type) -> Option<Type> {
        if !a.is_numeric() || !b.is_numeric() {
            return None;
        }
        if *a == Type::Float || *b == Type::Float {
            Some(Type::Float)
        } else if *a == Type::Int || *b == Type::Int {
            Some(Type::Int)
        } else {
            Some(Type::Char)
        }
    }

    /// Whether a value of this type can be implicitly converted to `to`.
    pub fn can_convert_to(&self, to: &Type) -> bool {
        self == to || (self.is_numeric() && to.is_numeric())
    }

    /// True if every array level has an explicit non-zero length
    pub fn is_fully_specified(&self) -> bool {
        match self {
            Type::Array { to, length } => *length > 0 && to.is_fully_specified(),
            _ => true,
        }
    }

    /// Element type of an array, `None` for anything else
    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Agree a declared type with the shape of an initializer literal.
    ///
    /// Every array level must have the same length as the literal, except that
    /// a declared length of zero takes the literal's length. The result is a
    /// new, fully specified type; `self` is left untouched. Leaf element types
    /// only have to be convertible.
    pub fn infer_from(&self, literal: &Type) -> Option<Type> {
        match (self, literal) {
            (
                Type::Array { to, length },
                Type::Array {
                    to: literal_to,
                    length: literal_length,
                },
            ) => {
                if *length != 0 && length != literal_length {
                    return None;
                }
                let inner = to.infer_from(literal_to)?;
                Some(Type::array(inner, *literal_length))
            }
            (Type::Array { .. }, _) | (_, Type::Array { .. }) => None,
            (declared, literal) if literal.can_convert_to(declared) => Some(declared.clone()),
            _ => None,
        }
    }

    /// Common type of two array-literal elements
    pub fn unify(a: &Type, b: &Type) -> Option<Type> {
        match (a, b) {
            (
                Type::Array { to: a_to, length: a_len },
                Type::Array { to: b_to, length: b_len },
            ) if a_len == b_len => Some(Type::array(Type::unify(a_to, b_to)?, *a_len)),
            _ if a.is_numeric() && b.is_numeric() => Type::max(a, b),
            _ if a == b => Some(a.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Type) -> bool {
        match (self, other) {
            (Type::Pointer(a), Type::Pointer(b)) => a == b,
            (
                Type::Array { to: a, length: la },
                Type::Array { to: b, length: lb },
            ) => la == lb && a == b,
            (Type::Aggregate(a), Type::Aggregate(b)) => Rc::ptr_eq(a, b),
            (Type::Pointer(_) | Type::Array { .. } | Type::Aggregate(_), _)
            | (_, Type::Pointer(_) | Type::Array { .. } | Type::Aggregate(_)) => false,
            _ => {
                self.is_numeric() == other.is_numeric()
                    && self.is_signed() == other.is_signed()
                    && self.is_floating_point() == other.is_floating_point()
                    && self.apparent_size() == other.apparent_size()
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "i1"),
            Type::Char | Type::Int => write!(f, "i{}", self.apparent_size()),
            Type::Float => write!(f, "double"),
            Type::Pointer(to) => write!(f, "{}*", to),
            Type::Array { to, length } => write!(f, "[{} x {}]", length, to),
            Type::Aggregate(aggregate) => write!(f, "%{}", aggregate.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> Type {
        Type::Aggregate(Rc::new(AggregateType::new(
            Rc::from("Point"),
            vec![(Rc::from("x"), Type::Int), (Rc::from("y"), Type::Float)],
            1,
        )))
    }

    #[test]
    fn test_promotion_is_commutative() {
        let numeric = [Type::Char, Type::Int, Type::Float];
        for a in &numeric {
            for b in &numeric {
                assert_eq!(Type::max(a, b), Type::max(b, a));
            }
        }
        assert_eq!(Type::max(&Type::Char, &Type::Char), Some(Type::Char));
        assert_eq!(Type::max(&Type::Char, &Type::Int), Some(Type::Int));
        assert_eq!(Type::max(&Type::Int, &Type::Float), Some(Type::Float));
        assert_eq!(Type::max(&Type::Char, &Type::Float), Some(Type::Float));
    }

    #[test]
    fn test_promotion_rejects_non_numeric() {
        assert_eq!(Type::max(&Type::Bool, &Type::Int), None);
        assert_eq!(Type::max(&Type::Int, &Type::array(Type::Int, 2)), None);
        assert_eq!(Type::max(&point(), &Type::Char), None);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(Type::Int, Type::Int);
        assert_ne!(Type::Int, Type::Char);
        assert_ne!(Type::Int, Type::Float);
        assert_ne!(Type::Void, Type::Bool);
        assert_eq!(Type::array(Type::Int, 3), Type::array(Type::Int, 3));
        assert_ne!(Type::array(Type::Int, 3), Type::array(Type::Int, 4));
        assert_ne!(Type::array(Type::Int, 3), Type::pointer(Type::Int));
    }

    #[test]
    fn test_aggregates_are_nominal() {
        let a = point();
        let b = point();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_sizes_and_names() {
        assert_eq!(Type::Bool.apparent_size(), 1);
        assert_eq!(Type::Bool.actual_size(), 8);
        assert_eq!(Type::Int.to_string(), "i32");
        assert_eq!(Type::Char.to_string(), "i8");
        assert_eq!(Type::Float.to_string(), "double");
        assert_eq!(
            Type::array(Type::array(Type::Int, 2), 3).to_string(),
            "[3 x [2 x i32]]"
        );
        assert_eq!(point().to_string(), "%Point");
        assert_eq!(point().apparent_size(), 96);
    }

    #[test]
    fn test_huge_sizes_saturate() {
        let huge = Type::array(Type::array(Type::Int, usize::MAX / 2), 4);
        assert_eq!(huge.apparent_size(), usize::MAX);
        assert_eq!(huge.actual_size(), usize::MAX);

        let wide = AggregateType::new(
            Rc::from("Wide"),
            vec![(Rc::from("a"), huge.clone()), (Rc::from("b"), Type::Int)],
            1,
        );
        assert_eq!(wide.members[1].offset, usize::MAX / 8);
    }

    #[test]
    fn test_member_offsets() {
        if let Type::Aggregate(aggregate) = point() {
            let (index, member) = aggregate.member("y").unwrap();
            assert_eq!(index, 1);
            assert_eq!(member.offset, 4);
            assert!(aggregate.member("z").is_none());
            assert_eq!(aggregate.definition(), "type { i32, double }");
        } else {
            panic!("Expected aggregate");
        }
    }

    #[test]
    fn test_infer_from_fills_every_level() {
        let declared = Type::array(Type::array(Type::Int, 0), 0);
        let literal = Type::array(Type::array(Type::Int, 2), 3);
        assert_eq!(declared.infer_from(&literal), Some(literal.clone()));
        // the declared type is not touched
        assert!(!declared.is_fully_specified());
    }

    #[test]
    fn test_infer_from_rejects_mismatch() {
        let declared = Type::array(Type::Int, 4);
        assert_eq!(declared.infer_from(&Type::array(Type::Int, 3)), None);
        assert_eq!(declared.infer_from(&Type::Int), None);
        assert_eq!(
            Type::array(Type::Float, 2).infer_from(&Type::array(Type::Int, 2)),
            Some(Type::array(Type::Float, 2))
        );
    }
}
