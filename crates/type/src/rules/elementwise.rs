// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::dimension::Dimension;
use crate::measure::Measure;
use crate::promote::{comparable, promote};
use crate::shape::DataShape;
use refract_core::{Result, Type};

/// Broadcasts two dimension sequences, right-aligned. Dimensions are
/// compatible when equal, when one side is `Fixed(1)`, or when a streaming
/// dimension meets a variable one (the stream wins).
pub fn broadcast(left: &[Dimension], right: &[Dimension]) -> Result<Vec<Dimension>> {
    let len = left.len().max(right.len());
    let mut out = Vec::with_capacity(len);

    for i in 0..len {
        let l = left.len().checked_sub(len - i).map(|idx| left[idx]);
        let r = right.len().checked_sub(len - i).map(|idx| right[idx]);

        let dim = match (l, r) {
            (Some(l), None) | (None, Some(l)) => l,
            (Some(l), Some(r)) if l == r => l,
            (Some(Dimension::Fixed(1)), Some(other))
            | (Some(other), Some(Dimension::Fixed(1))) => other,
            (Some(Dimension::Stream), Some(Dimension::Var))
            | (Some(Dimension::Var), Some(Dimension::Stream)) => Dimension::Stream,
            _ => {
                return Err(diagnostic::shape_mismatch(
                    "broadcast",
                    render(left),
                    render(right),
                ));
            }
        };
        out.push(dim);
    }
    Ok(out)
}

/// Elementwise arithmetic: numeric promotion on the measures, broadcasting on
/// the dimensions.
pub fn arithmetic(left: &DataShape, right: &DataShape) -> Result<DataShape> {
    let promoted = promote_scalars("arithmetic", left, right)?;
    let dims = broadcast(left.dims(), right.dims())?;
    Ok(DataShape::new(dims, Measure::Scalar(promoted)))
}

/// Elementwise comparison: operand measures must be comparable, result is
/// boolean over the broadcast dimensions.
pub fn comparison(left: &DataShape, right: &DataShape) -> Result<DataShape> {
    let (l, r) = scalar_types("comparison", left, right)?;
    if !comparable(l, r) {
        return Err(diagnostic::shape_mismatch("comparison", left, right));
    }
    let dims = broadcast(left.dims(), right.dims())?;
    Ok(DataShape::new(dims, Measure::Scalar(Type::Bool)))
}

/// Elementwise boolean connective: both operands must be boolean.
pub fn logical(left: &DataShape, right: &DataShape) -> Result<DataShape> {
    let (l, r) = scalar_types("logical operator", left, right)?;
    if !(l.is_bool() || l == Type::Undefined) || !(r.is_bool() || r == Type::Undefined) {
        return Err(diagnostic::shape_mismatch("logical operator", left, right));
    }
    let dims = broadcast(left.dims(), right.dims())?;
    Ok(DataShape::new(dims, Measure::Scalar(Type::Bool)))
}

/// Unary numeric negation.
pub fn negate(operand: &DataShape) -> Result<DataShape> {
    let ty = operand
        .measure()
        .scalar_type()
        .filter(|ty| ty.is_number())
        .ok_or_else(|| diagnostic::shape_mismatch("negation", operand, "numeric"))?;
    Ok(operand.with_measure(Measure::Scalar(ty)))
}

/// Unary boolean complement.
pub fn not(operand: &DataShape) -> Result<DataShape> {
    if !operand.measure().is_bool() {
        return Err(diagnostic::shape_mismatch("logical not", operand, "bool"));
    }
    Ok(operand.with_measure(Measure::Scalar(Type::Bool)))
}

fn scalar_types(context: &str, left: &DataShape, right: &DataShape) -> Result<(Type, Type)> {
    let l = left
        .measure()
        .scalar_type()
        .ok_or_else(|| diagnostic::shape_mismatch(context, left, right))?;
    let r = right
        .measure()
        .scalar_type()
        .ok_or_else(|| diagnostic::shape_mismatch(context, left, right))?;
    Ok((l, r))
}

fn promote_scalars(context: &str, left: &DataShape, right: &DataShape) -> Result<Type> {
    let (l, r) = scalar_types(context, left, right)?;
    promote(l, r).ok_or_else(|| diagnostic::shape_mismatch(context, left, right))
}

fn render(dims: &[Dimension]) -> String {
    dims.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" * ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use Dimension::*;

    #[test]
    fn test_broadcast_equal() {
        assert_eq!(broadcast(&[Var], &[Var]).unwrap(), vec![Var]);
        assert_eq!(broadcast(&[Fixed(3)], &[Fixed(3)]).unwrap(), vec![Fixed(3)]);
    }

    #[test]
    fn test_broadcast_size_one() {
        assert_eq!(broadcast(&[Fixed(1)], &[Fixed(5)]).unwrap(), vec![Fixed(5)]);
        assert_eq!(broadcast(&[Var], &[Fixed(1)]).unwrap(), vec![Var]);
    }

    #[test]
    fn test_broadcast_scalar_against_collection() {
        assert_eq!(broadcast(&[Var], &[]).unwrap(), vec![Var]);
        assert_eq!(broadcast(&[], &[Fixed(2)]).unwrap(), vec![Fixed(2)]);
    }

    #[test]
    fn test_broadcast_stream_absorbs_var() {
        assert_eq!(broadcast(&[Stream], &[Var]).unwrap(), vec![Stream]);
    }

    #[test]
    fn test_broadcast_mismatch() {
        let err = broadcast(&[Fixed(2)], &[Fixed(3)]).unwrap_err();
        assert_eq!(err.code(), "TY_001");
        assert!(broadcast(&[Var], &[Fixed(3)]).is_err());
    }

    #[test]
    fn test_arithmetic_promotes() {
        let left = DataShape::column(Type::Int4);
        let right = DataShape::scalar(Type::Float8);
        let shape = arithmetic(&left, &right).unwrap();
        assert_eq!(shape, DataShape::column(Type::Float8));
    }

    #[test]
    fn test_arithmetic_rejects_text() {
        let left = DataShape::column(Type::Utf8);
        let right = DataShape::scalar(Type::Int4);
        assert_eq!(arithmetic(&left, &right).unwrap_err().code(), "TY_001");
    }

    #[test]
    fn test_comparison_is_boolean() {
        let left = DataShape::column(Type::Float8);
        let right = DataShape::scalar(Type::Int4);
        assert_eq!(comparison(&left, &right).unwrap(), DataShape::column(Type::Bool));
    }

    #[test]
    fn test_comparison_text_vs_number_fails() {
        let left = DataShape::column(Type::Utf8);
        let right = DataShape::scalar(Type::Int4);
        assert!(comparison(&left, &right).is_err());
    }

    #[test]
    fn test_logical_requires_bool() {
        let bools = DataShape::column(Type::Bool);
        assert_eq!(logical(&bools, &bools).unwrap(), bools);
        assert!(logical(&bools, &DataShape::column(Type::Int4)).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(
            negate(&DataShape::column(Type::Int2)).unwrap(),
            DataShape::column(Type::Int2)
        );
        assert!(negate(&DataShape::column(Type::Utf8)).is_err());
        assert_eq!(
            not(&DataShape::column(Type::Bool)).unwrap(),
            DataShape::column(Type::Bool)
        );
        assert!(not(&DataShape::column(Type::Int4)).is_err());
    }
}
