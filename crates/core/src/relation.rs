// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::value::{Type, Value};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Ordered column names with their scalar types.
pub type Schema = Vec<(String, Type)>;

/// One record of the neutral interchange form.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }
}

impl Display for Row {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let items = self.0.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");
        write!(f, "({})", items)
    }
}

/// The neutral, ordered-row interchange form. Every backend can materialize
/// its native values into a `Relation`, which is what makes cross-backend
/// operations and result comparison possible.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub schema: Schema,
    pub rows: Vec<Row>,
}

impl Relation {
    pub fn new(schema: Schema, rows: Vec<Row>) -> Self {
        Self { schema, rows }
    }

    pub fn empty(schema: Schema) -> Self {
        Self { schema, rows: vec![] }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.iter().position(|(n, _)| n == name)
    }

    pub fn column_type(&self, name: &str) -> Option<Type> {
        self.schema.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    /// Extracts one column as a sequence of scalars.
    pub fn column_values(&self, name: &str) -> Option<Vec<Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.0[index].clone()).collect())
    }

    /// Row-order insensitive comparison, used by cross-backend consistency
    /// checks where ordering is unspecified unless explicitly sorted.
    pub fn equals_unordered(&self, other: &Relation) -> bool {
        if self.schema != other.schema || self.rows.len() != other.rows.len() {
            return false;
        }
        let mut left = self.rows.clone();
        let mut right = other.rows.clone();
        left.sort();
        right.sort();
        left == right
    }
}

impl Display for Relation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let header = self
            .schema
            .iter()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ");
        writeln!(f, "{{{}}}", header)?;
        for row in &self.rows {
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Relation {
        Relation::new(
            vec![("id".to_string(), Type::Int4), ("name".to_string(), Type::Utf8)],
            vec![
                Row::new(vec![Value::Int4(1), Value::utf8("a")]),
                Row::new(vec![Value::Int4(2), Value::utf8("b")]),
            ],
        )
    }

    #[test]
    fn test_column_lookup() {
        let relation = sample();
        assert_eq!(relation.column_index("name"), Some(1));
        assert_eq!(relation.column_type("id"), Some(Type::Int4));
        assert_eq!(
            relation.column_values("name"),
            Some(vec![Value::utf8("a"), Value::utf8("b")])
        );
        assert_eq!(relation.column_index("missing"), None);
    }

    #[test]
    fn test_equals_unordered() {
        let left = sample();
        let mut right = sample();
        right.rows.reverse();

        assert_ne!(left, right);
        assert!(left.equals_unordered(&right));
    }

    #[test]
    fn test_equals_unordered_detects_different_rows() {
        let left = sample();
        let mut right = sample();
        right.rows[0] = Row::new(vec![Value::Int4(9), Value::utf8("z")]);

        assert!(!left.equals_unordered(&right));
    }
}
