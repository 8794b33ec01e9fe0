// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use refract_core::{Result, Type, Value};
use refract_engine::diagnostic;
use refract_expr::{BinaryOp, MapFunc, UnaryOp};
use std::cmp::Ordering;

/// Wraps a widened integer back into the value the result type calls for.
pub fn int_value(value: i64, ty: Type) -> Value {
    match ty {
        Type::Int1 => Value::Int1(value as i8),
        Type::Int2 => Value::Int2(value as i16),
        Type::Int4 => Value::Int4(value as i32),
        _ => Value::Int8(value),
    }
}

pub fn float_value(value: f64, ty: Type) -> Value {
    match ty {
        Type::Float4 => Value::float4(value as f32),
        _ => Value::float8(value),
    }
}

/// One elementwise binary application. `Undefined` is absorbing, integer
/// division and remainder by zero yield `Undefined`, and the result is
/// produced at the already-promoted type the node carries.
pub fn binary(op: BinaryOp, left: &Value, right: &Value, result: Type) -> Result<Value> {
    if left.is_undefined() || right.is_undefined() {
        return Ok(Value::Undefined);
    }

    if op.is_arithmetic() {
        return arithmetic(op, left, right, result);
    }
    if op.is_comparison() {
        let ordering = left.cmp(right);
        let outcome = match op {
            BinaryOp::Equal => ordering == Ordering::Equal,
            BinaryOp::NotEqual => ordering != Ordering::Equal,
            BinaryOp::LessThan => ordering == Ordering::Less,
            BinaryOp::LessThanEqual => ordering != Ordering::Greater,
            BinaryOp::GreaterThan => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(Value::Bool(outcome));
    }

    let (Some(l), Some(r)) = (left.as_bool(), right.as_bool()) else {
        return Err(diagnostic::rule_mismatch("rows::binary", "boolean operands"));
    };
    Ok(Value::Bool(match op {
        BinaryOp::And => l && r,
        _ => l || r,
    }))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value, result: Type) -> Result<Value> {
    if result.is_float() {
        let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) else {
            return Err(diagnostic::rule_mismatch("rows::binary", "numeric operands"));
        };
        let value = match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            _ => l % r,
        };
        return Ok(float_value(value, result));
    }

    let (Some(l), Some(r)) = (left.as_i64(), right.as_i64()) else {
        return Err(diagnostic::rule_mismatch("rows::binary", "numeric operands"));
    };
    let value = match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Sub => l.wrapping_sub(r),
        BinaryOp::Mul => l.wrapping_mul(r),
        BinaryOp::Div if r == 0 => return Ok(Value::Undefined),
        BinaryOp::Div => l.wrapping_div(r),
        BinaryOp::Rem if r == 0 => return Ok(Value::Undefined),
        _ => l.wrapping_rem(r),
    };
    Ok(int_value(value, result))
}

pub fn unary(op: UnaryOp, operand: &Value, result: Type) -> Result<Value> {
    if operand.is_undefined() {
        return Ok(Value::Undefined);
    }
    match op {
        UnaryOp::Neg if result.is_float() => {
            let value = operand
                .as_f64()
                .ok_or_else(|| diagnostic::rule_mismatch("rows::unary", "a numeric operand"))?;
            Ok(float_value(-value, result))
        }
        UnaryOp::Neg => {
            let value = operand
                .as_i64()
                .ok_or_else(|| diagnostic::rule_mismatch("rows::unary", "a numeric operand"))?;
            Ok(int_value(value.wrapping_neg(), result))
        }
        UnaryOp::Not => {
            let value = operand
                .as_bool()
                .ok_or_else(|| diagnostic::rule_mismatch("rows::unary", "a boolean operand"))?;
            Ok(Value::Bool(!value))
        }
    }
}

pub fn map(func: MapFunc, operand: &Value, result: Type) -> Result<Value> {
    if operand.is_undefined() {
        return Ok(Value::Undefined);
    }
    match func {
        MapFunc::Abs if result.is_float() => {
            let value = operand
                .as_f64()
                .ok_or_else(|| diagnostic::rule_mismatch("rows::map", "a numeric operand"))?;
            Ok(float_value(value.abs(), result))
        }
        MapFunc::Abs => {
            let value = operand
                .as_i64()
                .ok_or_else(|| diagnostic::rule_mismatch("rows::map", "a numeric operand"))?;
            Ok(int_value(value.wrapping_abs(), result))
        }
        MapFunc::Lower | MapFunc::Upper | MapFunc::Length => {
            let text = operand
                .as_utf8()
                .ok_or_else(|| diagnostic::rule_mismatch("rows::map", "a text operand"))?;
            Ok(match func {
                MapFunc::Lower => Value::utf8(text.to_lowercase()),
                MapFunc::Upper => Value::utf8(text.to_uppercase()),
                _ => Value::Int8(text.chars().count() as i64),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic_at_promoted_type() {
        let sum = binary(BinaryOp::Add, &Value::Int2(300), &Value::Int4(1), Type::Int4);
        assert_eq!(sum.unwrap(), Value::Int4(301));

        let mixed =
            binary(BinaryOp::Mul, &Value::Int4(2), &Value::float8(1.5), Type::Float8);
        assert_eq!(mixed.unwrap(), Value::float8(3.0));
    }

    #[test]
    fn test_integer_division_by_zero_is_undefined() {
        let div = binary(BinaryOp::Div, &Value::Int4(1), &Value::Int4(0), Type::Int4);
        assert_eq!(div.unwrap(), Value::Undefined);
        let rem = binary(BinaryOp::Rem, &Value::Int4(1), &Value::Int4(0), Type::Int4);
        assert_eq!(rem.unwrap(), Value::Undefined);
    }

    #[test]
    fn test_comparison_across_widths() {
        let cmp = binary(
            BinaryOp::GreaterThan,
            &Value::float8(20.0),
            &Value::Int4(10),
            Type::Bool,
        );
        assert_eq!(cmp.unwrap(), Value::Bool(true));

        let eq = binary(BinaryOp::Equal, &Value::Int2(5), &Value::Int8(5), Type::Bool);
        assert_eq!(eq.unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_undefined_absorbs() {
        let result =
            binary(BinaryOp::Add, &Value::Undefined, &Value::Int4(1), Type::Int4);
        assert_eq!(result.unwrap(), Value::Undefined);
    }

    #[test]
    fn test_unary() {
        assert_eq!(unary(UnaryOp::Neg, &Value::Int4(3), Type::Int4).unwrap(), Value::Int4(-3));
        assert_eq!(
            unary(UnaryOp::Not, &Value::Bool(false), Type::Bool).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_map_builtins() {
        assert_eq!(
            map(MapFunc::Abs, &Value::float8(-2.5), Type::Float8).unwrap(),
            Value::float8(2.5)
        );
        assert_eq!(
            map(MapFunc::Upper, &Value::utf8("ab"), Type::Utf8).unwrap(),
            Value::utf8("AB")
        );
        assert_eq!(
            map(MapFunc::Length, &Value::utf8("abc"), Type::Int8).unwrap(),
            Value::Int8(3)
        );
    }
}
