// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::value::Value;
use std::cmp::Ordering;

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Total order over scalar values: undefined first, then bool, then numbers
/// (compared across widths by promotion to f64), then text.
impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        use Value::*;

        match (self, other) {
            (Undefined, Undefined) => Ordering::Equal,
            (Undefined, _) => Ordering::Less,
            (_, Undefined) => Ordering::Greater,

            (Bool(l), Bool(r)) => l.cmp(r),
            (Utf8(l), Utf8(r)) => l.cmp(r),

            (l, r) if l.data_type().is_number() && r.data_type().is_number() => {
                match (l.as_i64(), r.as_i64()) {
                    (Some(a), Some(b)) => a.cmp(&b),
                    _ => {
                        // At least one float operand. Promote both and fall
                        // back to a total float comparison.
                        let a = l.as_f64().unwrap_or(f64::NAN);
                        let b = r.as_f64().unwrap_or(f64::NAN);
                        a.total_cmp(&b)
                    }
                }
            }

            (l, r) => rank(l).cmp(&rank(r)),
        }
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Undefined => 0,
        Value::Bool(_) => 1,
        Value::Int1(_)
        | Value::Int2(_)
        | Value::Int4(_)
        | Value::Int8(_)
        | Value::Float4(_)
        | Value::Float8(_) => 2,
        Value::Utf8(_) => 3,
    }
}
