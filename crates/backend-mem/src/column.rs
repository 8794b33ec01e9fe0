// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use refract_backend_rows::scalar::{float_value, int_value};
use refract_core::{Result, Type, Value};
use refract_engine::diagnostic;

/// Physical column storage. Values live in one of four typed arrays with a
/// per-slot null; the logical type (width) travels separately so `int2` and
/// `int8` columns share the same physical form.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    Bool(Vec<Option<bool>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Utf8(Vec<Option<String>>),
}

impl ColumnData {
    pub fn with_capacity(ty: Type, capacity: usize) -> Result<Self> {
        Ok(match ty {
            Type::Bool => ColumnData::Bool(Vec::with_capacity(capacity)),
            ty if ty.is_integer() => ColumnData::Int(Vec::with_capacity(capacity)),
            ty if ty.is_float() => ColumnData::Float(Vec::with_capacity(capacity)),
            Type::Utf8 => ColumnData::Utf8(Vec::with_capacity(capacity)),
            _ => {
                return Err(diagnostic::rule_mismatch(
                    "mem::column",
                    "a bool, integer, float or text column type",
                ));
            }
        })
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn push(&mut self, value: &Value) -> Result<()> {
        match (self, value) {
            (ColumnData::Bool(v), Value::Undefined) => v.push(None),
            (ColumnData::Int(v), Value::Undefined) => v.push(None),
            (ColumnData::Float(v), Value::Undefined) => v.push(None),
            (ColumnData::Utf8(v), Value::Undefined) => v.push(None),
            (ColumnData::Bool(v), Value::Bool(b)) => v.push(Some(*b)),
            (ColumnData::Int(v), value) if value.as_i64().is_some() => {
                v.push(value.as_i64())
            }
            (ColumnData::Float(v), value) if value.as_f64().is_some() => {
                v.push(value.as_f64())
            }
            (ColumnData::Utf8(v), Value::Utf8(s)) => v.push(Some(s.clone())),
            _ => {
                return Err(diagnostic::rule_mismatch(
                    "mem::column",
                    "a value matching the column's physical type",
                ));
            }
        }
        Ok(())
    }

    /// Reads one slot back at the column's logical type.
    pub fn get(&self, index: usize, ty: Type) -> Value {
        match self {
            ColumnData::Bool(v) => match v[index] {
                Some(b) => Value::Bool(b),
                None => Value::Undefined,
            },
            ColumnData::Int(v) => match v[index] {
                Some(i) => int_value(i, ty),
                None => Value::Undefined,
            },
            ColumnData::Float(v) => match v[index] {
                Some(f) => float_value(f, ty),
                None => Value::Undefined,
            },
            ColumnData::Utf8(v) => match &v[index] {
                Some(s) => Value::Utf8(s.clone()),
                None => Value::Undefined,
            },
        }
    }

    /// Gathers the slots at `indices` into a new column, in order.
    pub fn gather(&self, indices: &[usize]) -> Self {
        match self {
            ColumnData::Bool(v) => {
                ColumnData::Bool(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Int(v) => {
                ColumnData::Int(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Float(v) => {
                ColumnData::Float(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Utf8(v) => {
                ColumnData::Utf8(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }

    /// Keeps the slots whose mask entry is `Some(true)`.
    pub fn compact(&self, mask: &[Option<bool>]) -> Self {
        let indices: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep == Some(true))
            .map(|(i, _)| i)
            .collect();
        self.gather(&indices)
    }

    pub fn from_values(ty: Type, values: &[Value]) -> Result<Self> {
        let mut data = Self::with_capacity(ty, values.len())?;
        for value in values {
            data.push(value)?;
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_at_logical_type() {
        let data = ColumnData::from_values(
            Type::Int2,
            &[Value::Int2(7), Value::Undefined, Value::Int2(-1)],
        )
        .unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.get(0, Type::Int2), Value::Int2(7));
        assert_eq!(data.get(1, Type::Int2), Value::Undefined);
        assert_eq!(data.get(2, Type::Int2), Value::Int2(-1));
    }

    #[test]
    fn test_push_type_mismatch() {
        let mut data = ColumnData::with_capacity(Type::Utf8, 1).unwrap();
        assert!(data.push(&Value::Int4(1)).is_err());
    }

    #[test]
    fn test_gather_and_compact() {
        let data =
            ColumnData::Int(vec![Some(10), Some(20), Some(30), None]);
        assert_eq!(data.gather(&[2, 0]), ColumnData::Int(vec![Some(30), Some(10)]));
        assert_eq!(
            data.compact(&[Some(true), Some(false), None, Some(true)]),
            ColumnData::Int(vec![Some(10), None])
        );
    }
}
