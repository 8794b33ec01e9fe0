// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Symbolic expressions over typed data with multiple-dispatch evaluation.
//!
//! An [`Expr`] is an immutable graph describing a computation over typed
//! operands, shape-checked at construction. Evaluation binds free symbols
//! to backend-native values and resolves each node against the most
//! specific registered compute rule for its operands' backends, so mixed
//! pipelines fall back to materialized rows only where no native rule
//! exists.
//!
//! ```
//! use refract::{DataShape, Expr, RowsValue, Scope, Type, evaluate};
//! use refract_core::{Relation, Row, Value};
//!
//! let shape = DataShape::from_schema(&vec![
//!     ("name".to_string(), Type::Utf8),
//!     ("amount".to_string(), Type::Float8),
//! ]).unwrap();
//! let t = Expr::symbol("T", shape);
//! let big = t.field("amount").unwrap().greater_than(&Expr::literal(10.0)).unwrap();
//! let expr = t.filter(&big).unwrap().project(&["name"]).unwrap();
//!
//! let data = Relation::new(
//!     vec![("name".to_string(), Type::Utf8), ("amount".to_string(), Type::Float8)],
//!     vec![
//!         Row::new(vec![Value::utf8("a"), Value::float8(5.0)]),
//!         Row::new(vec![Value::utf8("b"), Value::float8(20.0)]),
//!     ],
//! );
//! let scope = Scope::new().bind("T", RowsValue::evaluated(data));
//! let result = evaluate(&expr, &scope).unwrap().materialize().unwrap();
//! assert_eq!(result.len(), 1);
//! ```

pub use refract_backend_mem::{ColumnData, MEM, MemColumn, MemTable};
pub use refract_backend_sqlite::{SQLITE, SqliteColumn, SqliteDb, SqliteTable};
pub use refract_core::{
    Error, Relation, Result, Row, Schema, SortDirection, SortKey, Type, Value,
};
pub use refract_engine::{
    ANY, BackendKind, BackendValue, DispatchRegistry, Evaluated, Pattern,
    ProjectionFilterPushdown, ROWS, RowsValue, SCALAR, ScalarValue, Scope,
    downcast,
};
pub use refract_expr::{BinaryOp, Expr, ExprKind, MapFunc, OpKind, ReduceOp, UnaryOp};
pub use refract_type::{DataShape, Dimension, Field, Measure, Record};

use once_cell::sync::Lazy;

static DEFAULT: Lazy<DispatchRegistry> = Lazy::new(|| {
    let mut registry = DispatchRegistry::new();
    refract_backend_rows::register(&mut registry);
    refract_backend_mem::register(&mut registry);
    refract_backend_sqlite::register(&mut registry);
    registry.add_rewrite(ProjectionFilterPushdown);
    registry
});

/// The registry with every built-in backend registered and the standard
/// rewrites installed. Built on first use, read-only afterwards.
pub fn default_registry() -> &'static DispatchRegistry {
    &DEFAULT
}

/// Evaluates an expression against the default registry.
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Evaluated> {
    refract_engine::evaluate(expr, scope, default_registry())
}
