// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::dimension::Dimension;
use crate::measure::{Field, Measure, Record};
use crate::diagnostic;
use refract_core::{Result, Schema, Type};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// The logical type of any value flowing through an expression: an ordered
/// sequence of dimensions followed by a terminal measure. Computed once at
/// node construction and immutable thereafter.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataShape {
    dims: Vec<Dimension>,
    measure: Measure,
}

impl DataShape {
    pub fn new(dims: Vec<Dimension>, measure: Measure) -> Self {
        Self { dims, measure }
    }

    /// A zero-dimensional scalar.
    pub fn scalar(ty: Type) -> Self {
        Self { dims: vec![], measure: Measure::Scalar(ty) }
    }

    /// A variable-length collection of scalars.
    pub fn column(ty: Type) -> Self {
        Self { dims: vec![Dimension::Var], measure: Measure::Scalar(ty) }
    }

    /// A variable-length collection of records.
    pub fn table(record: Record) -> Self {
        Self { dims: vec![Dimension::Var], measure: Measure::Record(record) }
    }

    /// Convenience for building a table shape straight from a relation schema.
    pub fn from_schema(schema: &Schema) -> Result<Self> {
        let fields =
            schema.iter().map(|(name, ty)| Field::scalar(name.clone(), *ty)).collect();
        Ok(Self::table(Record::new(fields)?))
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    pub fn is_scalar(&self) -> bool {
        self.dims.is_empty()
    }

    /// The record measure, or a `not a record` failure.
    pub fn record(&self) -> Result<&Record> {
        self.measure.as_record().ok_or_else(|| diagnostic::not_a_record(&self.measure))
    }

    /// Same dimensions, different measure.
    pub fn with_measure(&self, measure: Measure) -> Self {
        Self { dims: self.dims.clone(), measure }
    }

    /// Same measure, different dimensions.
    pub fn with_dims(&self, dims: Vec<Dimension>) -> Self {
        Self { dims, measure: self.measure.clone() }
    }

    /// The shape of one element: all dimensions stripped.
    pub fn element(&self) -> Self {
        Self { dims: vec![], measure: self.measure.clone() }
    }
}

impl Display for DataShape {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for dim in &self.dims {
            write!(f, "{} * ", dim)?;
        }
        Display::fmt(&self.measure, f)
    }
}
