// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::measure::Measure;
use crate::shape::DataShape;
use refract_core::{Result, Type};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The reduction kinds with their own measure-promotion behavior.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReduceOp {
    Sum,
    Min,
    Max,
    Count,
    Mean,
    Any,
    All,
}

impl Display for ReduceOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReduceOp::Sum => f.write_str("sum"),
            ReduceOp::Min => f.write_str("min"),
            ReduceOp::Max => f.write_str("max"),
            ReduceOp::Count => f.write_str("count"),
            ReduceOp::Mean => f.write_str("mean"),
            ReduceOp::Any => f.write_str("any"),
            ReduceOp::All => f.write_str("all"),
        }
    }
}

/// Reduction strips the leading dimension and may promote the measure:
/// sums accumulate in the widest type of their family, means are always
/// float, counting anything is an integer.
pub fn reduce(data: &DataShape, op: ReduceOp) -> Result<DataShape> {
    if data.dims().is_empty() {
        return Err(diagnostic::not_reducible(&op.to_string(), data));
    }
    let dims = data.dims()[1..].to_vec();

    if op == ReduceOp::Count {
        return Ok(DataShape::new(dims, Measure::Scalar(Type::Int8)));
    }

    let ty = data
        .measure()
        .scalar_type()
        .ok_or_else(|| diagnostic::not_reducible(&op.to_string(), data))?;

    let result = match op {
        ReduceOp::Sum if ty.is_integer() || ty.is_bool() => Type::Int8,
        ReduceOp::Sum if ty.is_float() => Type::Float8,
        ReduceOp::Mean if ty.is_number() || ty.is_bool() => Type::Float8,
        ReduceOp::Min | ReduceOp::Max
            if ty.is_number() || ty.is_bool() || ty.is_text() =>
        {
            ty
        }
        ReduceOp::Any | ReduceOp::All if ty.is_bool() => Type::Bool,
        _ => return Err(diagnostic::not_reducible(&op.to_string(), data)),
    };

    Ok(DataShape::new(dims, Measure::Scalar(result)))
}
