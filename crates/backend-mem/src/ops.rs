// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Columnar compute kernels. Float and integer arithmetic run as typed
//! loops over the physical arrays; the remaining combinations fall back to
//! the shared scalar kernels applied slot by slot.

use crate::column::ColumnData;
use crate::table::MemColumn;
use refract_backend_rows::scalar;
use refract_core::{Result, Type, Value};
use refract_engine::diagnostic;
use refract_expr::{BinaryOp, MapFunc, UnaryOp};
use refract_type::rules::ReduceOp;

/// One side of an elementwise operation: a column, or a scalar broadcast
/// over the column's length.
pub enum Input<'a> {
    Column(&'a MemColumn),
    Scalar(Value),
}

impl Input<'_> {
    fn len(&self) -> Option<usize> {
        match self {
            Input::Column(column) => Some(column.len()),
            Input::Scalar(_) => None,
        }
    }

    fn get(&self, index: usize) -> Value {
        match self {
            Input::Column(column) => column.get(index),
            Input::Scalar(value) => value.clone(),
        }
    }

    fn as_floats(&self) -> Option<FloatInput<'_>> {
        match self {
            Input::Column(column) => match &column.data {
                ColumnData::Float(values) => Some(FloatInput::Column(values)),
                _ => None,
            },
            Input::Scalar(value) => value.as_f64().map(FloatInput::Scalar),
        }
    }
}

enum FloatInput<'a> {
    Column(&'a [Option<f64>]),
    Scalar(f64),
}

impl FloatInput<'_> {
    fn get(&self, index: usize) -> Option<f64> {
        match self {
            // A length-1 column broadcasts over the common length, same as
            // `pick` on the slot-by-slot path.
            FloatInput::Column(values) if values.len() == 1 => values[0],
            FloatInput::Column(values) => values[index],
            FloatInput::Scalar(value) => Some(*value),
        }
    }
}

fn common_length(left: &Input, right: &Input) -> Result<usize> {
    match (left.len(), right.len()) {
        (Some(l), Some(r)) if l == r => Ok(l),
        (Some(l), Some(1)) => Ok(l),
        (Some(1), Some(r)) => Ok(r),
        (Some(l), None) | (None, Some(l)) => Ok(l),
        (None, None) => Ok(1),
        _ => Err(diagnostic::rule_mismatch("mem::binary", "columns of compatible length")),
    }
}

fn pick(input: &Input, index: usize, length: usize) -> Value {
    match input.len() {
        Some(1) if length > 1 => input.get(0),
        _ => input.get(index),
    }
}

/// Elementwise binary over columns. Float arithmetic takes the typed fast
/// path; everything else reuses the scalar kernel per slot.
pub fn binary(
    op: BinaryOp,
    left: &Input,
    right: &Input,
    result: Type,
) -> Result<ColumnData> {
    let length = common_length(left, right)?;

    if op.is_arithmetic() && result.is_float() {
        if let (Some(l), Some(r)) = (left.as_floats(), right.as_floats()) {
            let values = (0..length)
                .map(|i| {
                    let (Some(a), Some(b)) = (l.get(i), r.get(i)) else { return None };
                    Some(match op {
                        BinaryOp::Add => a + b,
                        BinaryOp::Sub => a - b,
                        BinaryOp::Mul => a * b,
                        BinaryOp::Div => a / b,
                        _ => a % b,
                    })
                })
                .collect();
            return Ok(ColumnData::Float(values));
        }
    }

    let mut data = ColumnData::with_capacity(result, length)?;
    for i in 0..length {
        let value =
            scalar::binary(op, &pick(left, i, length), &pick(right, i, length), result)?;
        data.push(&value)?;
    }
    Ok(data)
}

pub fn unary(op: UnaryOp, operand: &MemColumn, result: Type) -> Result<ColumnData> {
    match (op, &operand.data) {
        (UnaryOp::Neg, ColumnData::Float(values)) => {
            Ok(ColumnData::Float(values.iter().map(|v| v.map(|f| -f)).collect()))
        }
        (UnaryOp::Neg, ColumnData::Int(values)) => {
            Ok(ColumnData::Int(values.iter().map(|v| v.map(i64::wrapping_neg)).collect()))
        }
        (UnaryOp::Not, ColumnData::Bool(values)) => {
            Ok(ColumnData::Bool(values.iter().map(|v| v.map(|b| !b)).collect()))
        }
        _ => fallback_unary(|v| scalar::unary(op, v, result), operand, result),
    }
}

pub fn map(func: MapFunc, operand: &MemColumn, result: Type) -> Result<ColumnData> {
    match (func, &operand.data) {
        (MapFunc::Abs, ColumnData::Float(values)) => {
            Ok(ColumnData::Float(values.iter().map(|v| v.map(f64::abs)).collect()))
        }
        (MapFunc::Abs, ColumnData::Int(values)) => {
            Ok(ColumnData::Int(values.iter().map(|v| v.map(i64::wrapping_abs)).collect()))
        }
        (MapFunc::Lower, ColumnData::Utf8(values)) => Ok(ColumnData::Utf8(
            values.iter().map(|v| v.as_ref().map(|s| s.to_lowercase())).collect(),
        )),
        (MapFunc::Upper, ColumnData::Utf8(values)) => Ok(ColumnData::Utf8(
            values.iter().map(|v| v.as_ref().map(|s| s.to_uppercase())).collect(),
        )),
        (MapFunc::Length, ColumnData::Utf8(values)) => Ok(ColumnData::Int(
            values
                .iter()
                .map(|v| v.as_ref().map(|s| s.chars().count() as i64))
                .collect(),
        )),
        _ => fallback_unary(|v| scalar::map(func, v, result), operand, result),
    }
}

fn fallback_unary(
    f: impl Fn(&Value) -> Result<Value>,
    operand: &MemColumn,
    result: Type,
) -> Result<ColumnData> {
    let mut data = ColumnData::with_capacity(result, operand.len())?;
    for i in 0..operand.len() {
        data.push(&f(&operand.get(i))?)?;
    }
    Ok(data)
}

/// Columnar reductions straight over the physical arrays; nulls are skipped
/// by every aggregate except `Count`.
pub fn reduce(op: ReduceOp, operand: &MemColumn) -> Result<Value> {
    // Count covers every slot, undefined included; all other aggregates
    // skip nulls.
    if op == ReduceOp::Count {
        return Ok(Value::Int8(operand.len() as i64));
    }
    match (&operand.data, op) {
        (ColumnData::Float(values), ReduceOp::Sum) => {
            Ok(Value::float8(values.iter().flatten().sum()))
        }
        (ColumnData::Int(values), ReduceOp::Sum) => {
            Ok(Value::Int8(values.iter().flatten().sum()))
        }
        (ColumnData::Bool(values), ReduceOp::Sum) => {
            Ok(Value::Int8(values.iter().flatten().filter(|&&b| b).count() as i64))
        }
        (ColumnData::Float(values), ReduceOp::Mean) => mean(values.iter().flatten().copied()),
        (ColumnData::Int(values), ReduceOp::Mean) => {
            mean(values.iter().flatten().map(|&v| v as f64))
        }
        (ColumnData::Bool(values), ReduceOp::Any) => {
            Ok(Value::Bool(values.iter().flatten().any(|&b| b)))
        }
        (ColumnData::Bool(values), ReduceOp::All) => {
            Ok(Value::Bool(values.iter().flatten().all(|&b| b)))
        }
        (_, ReduceOp::Min | ReduceOp::Max) => {
            let mut extreme: Option<Value> = None;
            for i in 0..operand.len() {
                let value = operand.get(i);
                if value.is_undefined() {
                    continue;
                }
                extreme = Some(match extreme {
                    None => value,
                    Some(current) => {
                        let take = if op == ReduceOp::Min {
                            value < current
                        } else {
                            value > current
                        };
                        if take { value } else { current }
                    }
                });
            }
            Ok(extreme.unwrap_or(Value::Undefined))
        }
        _ => Err(diagnostic::rule_mismatch(
            "mem::reduce",
            &format!("a column reducible by {}", op),
        )),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Result<Value> {
    let (mut total, mut count) = (0.0, 0usize);
    for value in values {
        total += value;
        count += 1;
    }
    if count == 0 {
        return Ok(Value::Undefined);
    }
    Ok(Value::float8(total / count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float_column(values: Vec<Option<f64>>) -> MemColumn {
        MemColumn { name: "v".to_string(), ty: Type::Float8, data: ColumnData::Float(values) }
    }

    #[test]
    fn test_float_fast_path_with_scalar_broadcast() {
        let column = float_column(vec![Some(1.0), None, Some(3.0)]);
        let result = binary(
            BinaryOp::Mul,
            &Input::Column(&column),
            &Input::Scalar(Value::float8(2.0)),
            Type::Float8,
        )
        .unwrap();
        assert_eq!(result, ColumnData::Float(vec![Some(2.0), None, Some(6.0)]));
    }

    #[test]
    fn test_float_fast_path_broadcasts_length_one_column() {
        let single = float_column(vec![Some(2.0)]);
        let full = float_column(vec![Some(1.0), None, Some(3.0)]);
        let result = binary(
            BinaryOp::Mul,
            &Input::Column(&single),
            &Input::Column(&full),
            Type::Float8,
        )
        .unwrap();
        assert_eq!(result, ColumnData::Float(vec![Some(2.0), None, Some(6.0)]));
    }

    #[test]
    fn test_comparison_produces_mask() {
        let column = float_column(vec![Some(5.0), Some(20.0)]);
        let result = binary(
            BinaryOp::GreaterThan,
            &Input::Column(&column),
            &Input::Scalar(Value::float8(10.0)),
            Type::Bool,
        )
        .unwrap();
        assert_eq!(result, ColumnData::Bool(vec![Some(false), Some(true)]));
    }

    #[test]
    fn test_int_arithmetic_via_scalar_kernel() {
        let column = MemColumn {
            name: "v".to_string(),
            ty: Type::Int4,
            data: ColumnData::Int(vec![Some(1), Some(2)]),
        };
        let result = binary(
            BinaryOp::Add,
            &Input::Column(&column),
            &Input::Scalar(Value::Int4(10)),
            Type::Int4,
        )
        .unwrap();
        assert_eq!(result, ColumnData::Int(vec![Some(11), Some(12)]));
    }

    #[test]
    fn test_unary_and_map() {
        let column = MemColumn {
            name: "v".to_string(),
            ty: Type::Int4,
            data: ColumnData::Int(vec![Some(-3), None]),
        };
        assert_eq!(
            unary(UnaryOp::Neg, &column, Type::Int4).unwrap(),
            ColumnData::Int(vec![Some(3), None])
        );
        assert_eq!(
            map(MapFunc::Abs, &column, Type::Int4).unwrap(),
            ColumnData::Int(vec![Some(3), None])
        );

        let text = MemColumn {
            name: "s".to_string(),
            ty: Type::Utf8,
            data: ColumnData::Utf8(vec![Some("Ab".to_string()), None]),
        };
        assert_eq!(
            map(MapFunc::Lower, &text, Type::Utf8).unwrap(),
            ColumnData::Utf8(vec![Some("ab".to_string()), None])
        );
        assert_eq!(
            map(MapFunc::Length, &text, Type::Int8).unwrap(),
            ColumnData::Int(vec![Some(2), None])
        );
    }

    #[test]
    fn test_reductions_skip_nulls() {
        let column = float_column(vec![Some(5.0), None, Some(20.0)]);
        assert_eq!(
            reduce(ReduceOp::Sum, &column).unwrap(),
            Value::float8(25.0)
        );
        assert_eq!(
            reduce(ReduceOp::Mean, &column).unwrap(),
            Value::float8(12.5)
        );
        assert_eq!(
            reduce(ReduceOp::Max, &column).unwrap(),
            Value::float8(20.0)
        );
        assert_eq!(
            reduce(ReduceOp::Count, &column).unwrap(),
            Value::Int8(3)
        );
    }

    #[test]
    fn test_reduce_empty_column() {
        let column = float_column(vec![]);
        assert_eq!(reduce(ReduceOp::Sum, &column).unwrap(), Value::float8(0.0));
        assert_eq!(
            reduce(ReduceOp::Mean, &column).unwrap(),
            Value::Undefined
        );
        assert_eq!(reduce(ReduceOp::Min, &column).unwrap(), Value::Undefined);
    }
}
