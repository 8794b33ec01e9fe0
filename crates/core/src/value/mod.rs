// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

mod compare;

use crate::ordered_float::{OrderedF32, OrderedF64};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// All scalar data types a value flowing through an expression can carry.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Type {
    /// A boolean: true or false.
    Bool,
    /// A 1-byte signed integer
    Int1,
    /// A 2-byte signed integer
    Int2,
    /// A 4-byte signed integer
    Int4,
    /// An 8-byte signed integer
    Int8,
    /// A 4-byte floating point
    Float4,
    /// An 8-byte floating point
    Float8,
    /// A UTF-8 encoded text
    Utf8,
    /// Value is not defined (think null in common programming languages)
    Undefined,
}

impl Type {
    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int1 | Type::Int2 | Type::Int4 | Type::Int8)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float4 | Type::Float8)
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Type::Utf8)
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Bool => f.write_str("bool"),
            Type::Int1 => f.write_str("int1"),
            Type::Int2 => f.write_str("int2"),
            Type::Int4 => f.write_str("int4"),
            Type::Int8 => f.write_str("int8"),
            Type::Float4 => f.write_str("float4"),
            Type::Float8 => f.write_str("float8"),
            Type::Utf8 => f.write_str("utf8"),
            Type::Undefined => f.write_str("undefined"),
        }
    }
}

/// A single scalar value. `Eq + Hash + Ord` so values can live inside
/// hashable expression nodes and be sorted with a total order.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Value is not defined (think null in common programming languages)
    Undefined,
    /// A boolean: true or false.
    Bool(bool),
    /// A 1-byte signed integer
    Int1(i8),
    /// A 2-byte signed integer
    Int2(i16),
    /// A 4-byte signed integer
    Int4(i32),
    /// An 8-byte signed integer
    Int8(i64),
    /// A 4-byte floating point
    Float4(OrderedF32),
    /// An 8-byte floating point
    Float8(OrderedF64),
    /// A UTF-8 encoded text
    Utf8(String),
}

impl Value {
    pub fn float4(value: f32) -> Self {
        Value::Float4(OrderedF32::new(value))
    }

    pub fn float8(value: f64) -> Self {
        Value::Float8(OrderedF64::new(value))
    }

    pub fn utf8(value: impl Into<String>) -> Self {
        Value::Utf8(value.into())
    }

    pub fn data_type(&self) -> Type {
        match self {
            Value::Undefined => Type::Undefined,
            Value::Bool(_) => Type::Bool,
            Value::Int1(_) => Type::Int1,
            Value::Int2(_) => Type::Int2,
            Value::Int4(_) => Type::Int4,
            Value::Int8(_) => Type::Int8,
            Value::Float4(_) => Type::Float4,
            Value::Float8(_) => Type::Float8,
            Value::Utf8(_) => Type::Utf8,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Widens any integer (and bool) to i64. None for floats and text.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(v) => Some(*v as i64),
            Value::Int1(v) => Some(*v as i64),
            Value::Int2(v) => Some(*v as i64),
            Value::Int4(v) => Some(*v as i64),
            Value::Int8(v) => Some(*v),
            _ => None,
        }
    }

    /// Widens any numeric (and bool) to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float4(v) => Some(v.value() as f64),
            Value::Float8(v) => Some(v.value()),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_utf8(&self) -> Option<&str> {
        match self {
            Value::Utf8(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Bool(v) => Display::fmt(v, f),
            Value::Int1(v) => Display::fmt(v, f),
            Value::Int2(v) => Display::fmt(v, f),
            Value::Int4(v) => Display::fmt(v, f),
            Value::Int8(v) => Display::fmt(v, f),
            Value::Float4(v) => Display::fmt(v, f),
            Value::Float8(v) => Display::fmt(v, f),
            Value::Utf8(v) => write!(f, "\"{}\"", v),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int8(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::float8(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Utf8(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Utf8(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_survives_json_round_trip() {
        for value in [
            Value::Undefined,
            Value::Bool(true),
            Value::Int8(-42),
            Value::float8(2.5),
            Value::utf8("hello"),
        ] {
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_data_type_mirrors_variant() {
        assert_eq!(Value::Int4(1).data_type(), Type::Int4);
        assert_eq!(Value::utf8("x").data_type(), Type::Utf8);
        assert_eq!(Value::Undefined.data_type(), Type::Undefined);
    }
}
