// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use refract_core::Type;

/// Numeric promotion lattice: bool < integers (by width) < floats (by width).
/// Bool coerces to Int1 under arithmetic. Text never promotes with numerics.
/// Undefined absorbs into the other operand (null propagation).
pub fn promote(left: Type, right: Type) -> Option<Type> {
    use Type::*;

    if left == right {
        return Some(left);
    }
    match (left, right) {
        (Undefined, other) | (other, Undefined) => Some(other),
        (Bool, other) if other.is_number() => promote(Int1, other),
        (other, Bool) if other.is_number() => promote(other, Int1),
        (l, r) if l.is_integer() && r.is_integer() => {
            Some(if integer_width(l) >= integer_width(r) { l } else { r })
        }
        (l, r) if l.is_float() && r.is_float() => Some(Float8),
        // Mixed int/float widens to the largest float; an f32 cannot hold
        // every i64 exactly, so the conservative result is f64.
        (l, r) if l.is_number() && r.is_number() => Some(Float8),
        _ => None,
    }
}

/// Whether two scalar types may appear together under a comparison operator.
pub fn comparable(left: Type, right: Type) -> bool {
    use Type::*;

    match (left, right) {
        (Undefined, _) | (_, Undefined) => true,
        (Bool, Bool) => true,
        (Utf8, Utf8) => true,
        (l, r) => l.is_number() && r.is_number(),
    }
}

fn integer_width(ty: Type) -> u8 {
    match ty {
        Type::Int1 => 1,
        Type::Int2 => 2,
        Type::Int4 => 4,
        Type::Int8 => 8,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_core::Type::*;

    #[test]
    fn test_integer_widths() {
        assert_eq!(promote(Int1, Int8), Some(Int8));
        assert_eq!(promote(Int4, Int2), Some(Int4));
    }

    #[test]
    fn test_bool_coerces_to_integer() {
        assert_eq!(promote(Bool, Int4), Some(Int4));
        assert_eq!(promote(Int1, Bool), Some(Int1));
        assert_eq!(promote(Bool, Float8), Some(Float8));
    }

    #[test]
    fn test_int_float_widens_to_float8() {
        assert_eq!(promote(Int8, Float4), Some(Float8));
        assert_eq!(promote(Float4, Float8), Some(Float8));
        assert_eq!(promote(Float4, Float4), Some(Float4));
    }

    #[test]
    fn test_text_never_promotes() {
        assert_eq!(promote(Utf8, Int4), None);
        assert_eq!(promote(Float8, Utf8), None);
        assert_eq!(promote(Utf8, Utf8), Some(Utf8));
    }

    #[test]
    fn test_undefined_absorbs() {
        assert_eq!(promote(Undefined, Int4), Some(Int4));
        assert_eq!(promote(Utf8, Undefined), Some(Utf8));
    }

    #[test]
    fn test_comparable() {
        assert!(comparable(Int2, Float8));
        assert!(comparable(Utf8, Utf8));
        assert!(comparable(Bool, Bool));
        assert!(!comparable(Utf8, Int4));
        assert!(!comparable(Bool, Int4));
    }
}
