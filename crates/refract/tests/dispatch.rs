// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Dispatch resolution and evaluation-sharing behavior over the default
//! registry.

use refract::{
    default_registry, DataShape, DispatchRegistry, Expr, MEM, OpKind, ROWS,
    SCALAR, SQLITE, ScalarValue, Scope, Type, Value, downcast,
};
use refract_engine::evaluate;
use refract_testing::{counting_add_rule, init_tracing};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::Ordering;

#[test]
fn test_most_specific_backend_wins() {
    let registry = default_registry();
    assert_eq!(registry.resolve(OpKind::Filter, &[&MEM, &MEM]).unwrap().name(), "mem::filter");
    assert_eq!(
        registry.resolve(OpKind::Filter, &[&ROWS, &ROWS]).unwrap().name(),
        "rows::filter"
    );
    assert_eq!(
        registry.resolve(OpKind::Filter, &[&SQLITE, &SQLITE]).unwrap().name(),
        "sqlite::filter"
    );
    // no native rule spans the two backends, the materializing one catches it
    assert_eq!(
        registry.resolve(OpKind::Filter, &[&SQLITE, &ROWS]).unwrap().name(),
        "generic::filter"
    );
}

#[test]
fn test_resolution_is_stable_across_calls() {
    let registry = default_registry();
    let first = registry.resolve(OpKind::Binary, &[&MEM, &SCALAR]).unwrap().name().to_string();
    for _ in 0..10 {
        assert_eq!(
            registry.resolve(OpKind::Binary, &[&MEM, &SCALAR]).unwrap().name(),
            first
        );
    }
}

#[test]
fn test_missing_rule_is_reported_with_operand_kinds() {
    let registry = default_registry();
    let err = registry.resolve(OpKind::Filter, &[&ROWS]).unwrap_err();
    assert_eq!(err.code(), "DI_001");
    assert!(err.to_string().contains("rows"));
}

#[test]
fn test_shared_nodes_are_computed_once() {
    init_tracing();
    let mut registry = DispatchRegistry::new();
    let calls = counting_add_rule(&mut registry);

    let x = Expr::symbol("x", DataShape::scalar(Type::Int8));
    let shared = x.add(&Expr::literal(1i64)).unwrap();
    let expr = shared.add(&shared).unwrap();

    let scope = Scope::new().bind("x", ScalarValue::evaluated(Value::Int8(2)));
    let result = evaluate(&expr, &scope, &registry).unwrap();

    assert_eq!(downcast::<ScalarValue>(&result).unwrap().0, Value::Int8(6));
    // one call for the shared node, one for the outer addition
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_structurally_equal_graphs_are_one_node() {
    let t = Expr::symbol("T", DataShape::column(Type::Int8));
    let a = t.add(&Expr::literal(1i64)).unwrap();
    let b = t.add(&Expr::literal(1i64)).unwrap();

    assert_eq!(a, b);

    let hash = |expr: &Expr| {
        let mut hasher = DefaultHasher::new();
        expr.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&a), hash(&b));
}

#[test]
fn test_node_shape_matches_computed_schema() {
    init_tracing();
    let t = Expr::symbol(
        "T",
        DataShape::from_schema(&vec![
            ("name".to_string(), Type::Utf8),
            ("amount".to_string(), Type::Float8),
        ])
        .unwrap(),
    );
    let expr = t.project(&["amount"]).unwrap();

    let data = refract::Relation::new(
        vec![("name".to_string(), Type::Utf8), ("amount".to_string(), Type::Float8)],
        vec![refract::Row::new(vec![Value::utf8("a"), Value::float8(1.0)])],
    );
    let scope = Scope::new().bind("T", refract::RowsValue::evaluated(data));
    let relation = refract::evaluate(&expr, &scope).unwrap().materialize().unwrap();

    let declared = DataShape::from_schema(&relation.schema).unwrap();
    assert_eq!(&declared, expr.shape());
}
