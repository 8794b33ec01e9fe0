// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use refract_core::{Result, Type};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The terminal measure of a data shape: what a single element looks like
/// once all dimensions are stripped away.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Measure {
    Scalar(Type),
    Record(Record),
    Optional(Box<Measure>),
}

impl Measure {
    pub fn scalar_type(&self) -> Option<Type> {
        match self {
            Measure::Scalar(ty) => Some(*ty),
            Measure::Optional(inner) => inner.scalar_type(),
            Measure::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Measure::Record(record) => Some(record),
            Measure::Optional(inner) => inner.as_record(),
            Measure::Scalar(_) => None,
        }
    }

    pub fn is_bool(&self) -> bool {
        self.scalar_type().is_some_and(|ty| ty.is_bool())
    }
}

impl Display for Measure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Measure::Scalar(ty) => Display::fmt(ty, f),
            Measure::Record(record) => Display::fmt(record, f),
            Measure::Optional(inner) => write!(f, "?{}", inner),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub measure: Measure,
}

impl Field {
    pub fn new(name: impl Into<String>, measure: Measure) -> Self {
        Self { name: name.into(), measure }
    }

    pub fn scalar(name: impl Into<String>, ty: Type) -> Self {
        Self { name: name.into(), measure: Measure::Scalar(ty) }
    }
}

/// An ordered record measure with unique field names.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<Field>,
}

impl Record {
    /// Builds a record, rejecting duplicate field names.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        for (index, field) in fields.iter().enumerate() {
            if fields[..index].iter().any(|f| f.name == field.name) {
                return Err(diagnostic::name_collision(&field.name));
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.measure))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicate_names() {
        let result = Record::new(vec![
            Field::scalar("id", Type::Int4),
            Field::scalar("id", Type::Utf8),
        ]);
        assert_eq!(result.unwrap_err().code(), "TY_003");
    }

    #[test]
    fn test_field_lookup() {
        let record = Record::new(vec![
            Field::scalar("id", Type::Int4),
            Field::scalar("name", Type::Utf8),
        ])
        .unwrap();

        assert!(record.contains("name"));
        assert_eq!(record.field("id").unwrap().measure, Measure::Scalar(Type::Int4));
        assert!(record.field("missing").is_none());
    }

    #[test]
    fn test_display() {
        let record = Record::new(vec![Field::scalar("amount", Type::Float8)]).unwrap();
        assert_eq!(record.to_string(), "{amount: float8}");
    }
}
