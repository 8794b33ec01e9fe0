// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::kind::{BackendKind, ROWS, SCALAR};
use refract_core::{Relation, Result, Row, Value};
use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;

/// A backend-native value flowing through an evaluation. The kind tag drives
/// dispatch; `materialize` is the contract that lets any value cross into
/// the neutral row form for comparison and cross-backend rules.
pub trait BackendValue: Any + Send + Sync + Debug {
    fn kind(&self) -> &'static BackendKind;

    /// Converts the native value into the neutral ordered-row form.
    fn materialize(&self) -> Result<Relation>;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to an evaluated backend value.
pub type Evaluated = Arc<dyn BackendValue>;

/// Downcasts an evaluated value to a concrete backend type.
pub fn downcast<T: BackendValue>(value: &Evaluated) -> Option<&T> {
    value.as_any().downcast_ref::<T>()
}

/// A neutral scalar result: literals and reductions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScalarValue(pub Value);

impl ScalarValue {
    pub fn evaluated(value: Value) -> Evaluated {
        Arc::new(ScalarValue(value))
    }
}

impl BackendValue for ScalarValue {
    fn kind(&self) -> &'static BackendKind {
        &SCALAR
    }

    fn materialize(&self) -> Result<Relation> {
        Ok(Relation::new(
            vec![("value".to_string(), self.0.data_type())],
            vec![Row::new(vec![self.0.clone()])],
        ))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The plain record-sequence backend: a neutral relation evaluated as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowsValue(pub Relation);

impl RowsValue {
    pub fn evaluated(relation: Relation) -> Evaluated {
        Arc::new(RowsValue(relation))
    }
}

impl BackendValue for RowsValue {
    fn kind(&self) -> &'static BackendKind {
        &ROWS
    }

    fn materialize(&self) -> Result<Relation> {
        Ok(self.0.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_core::Type;

    #[test]
    fn test_scalar_materializes_to_single_row() {
        let scalar = ScalarValue::evaluated(Value::Int4(42));
        let relation = scalar.materialize().unwrap();
        assert_eq!(relation.schema, vec![("value".to_string(), Type::Int4)]);
        assert_eq!(relation.rows, vec![Row::new(vec![Value::Int4(42)])]);
    }

    #[test]
    fn test_downcast() {
        let scalar = ScalarValue::evaluated(Value::Bool(true));
        assert!(downcast::<ScalarValue>(&scalar).is_some());
        assert!(downcast::<RowsValue>(&scalar).is_none());
    }
}
