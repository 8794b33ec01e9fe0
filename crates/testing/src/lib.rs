// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Shared fixtures for the integration tests: a small orders dataset in
//! every backend's native form, a counting dispatch rule for memoization
//! assertions, and tracing setup.

use once_cell::sync::Lazy;
use refract_backend_sqlite::{SqliteDb, SqliteTable};
use refract_core::{Relation, Result, Row, Schema, Type, Value};
use refract_engine::{DispatchRegistry, Pattern, ScalarValue, ANY};
use refract_expr::OpKind;
use refract_type::DataShape;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Installs a fmt subscriber honoring RUST_LOG, once per process.
pub fn init_tracing() {
    static INIT: Lazy<()> = Lazy::new(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
    Lazy::force(&INIT);
}

/// The canonical three-row orders dataset used across backend tests.
pub fn orders_schema() -> Schema {
    vec![
        ("id".to_string(), Type::Int8),
        ("name".to_string(), Type::Utf8),
        ("amount".to_string(), Type::Float8),
    ]
}

pub fn orders_relation() -> Relation {
    Relation::new(
        orders_schema(),
        vec![
            Row::new(vec![Value::Int8(1), Value::utf8("a"), Value::float8(5.0)]),
            Row::new(vec![Value::Int8(2), Value::utf8("b"), Value::float8(20.0)]),
            Row::new(vec![Value::Int8(3), Value::utf8("c"), Value::float8(7.5)]),
        ],
    )
}

pub fn orders_shape() -> DataShape {
    DataShape::from_schema(&orders_schema()).expect("orders schema is well formed")
}

/// An in-memory database preloaded with the orders dataset.
pub fn orders_db() -> Result<SqliteDb> {
    let db = SqliteDb::open_in_memory()?;
    db.execute_batch(
        "CREATE TABLE orders (id INTEGER, name TEXT, amount REAL);
         INSERT INTO orders VALUES (1, 'a', 5.0), (2, 'b', 20.0), (3, 'c', 7.5);",
    )?;
    Ok(db)
}

pub fn orders_table(db: &SqliteDb) -> Result<SqliteTable> {
    SqliteTable::open(db, "orders")
}

/// Registers an addition rule at the root pattern that counts its
/// invocations, for asserting how often a shared node is computed.
pub fn counting_add_rule(registry: &mut DispatchRegistry) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&ANY, &ANY]),
        "testing::counting_add",
        move |_, operands| {
            counter.fetch_add(1, Ordering::SeqCst);
            let int_of = |operand: &refract_engine::Evaluated| -> i64 {
                operand
                    .materialize()
                    .ok()
                    .and_then(|relation| relation.rows.first().cloned())
                    .and_then(|row| row.0.first().and_then(Value::as_i64))
                    .unwrap_or(0)
            };
            Ok(ScalarValue::evaluated(Value::Int8(
                int_of(&operands[0]) + int_of(&operands[1]),
            )))
        },
    );
    calls
}
