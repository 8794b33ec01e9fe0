// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Columnar in-memory backend. Tables are stored column-major with typed
//! physical arrays and per-slot nulls; filters run over boolean masks,
//! sorts argsort once and gather, and reductions loop over the physical
//! data. `MEM` descends from `ROWS`, so anything without a native rule
//! here still resolves to the row implementations via materialization.

pub mod column;
pub mod ops;
pub mod table;

pub use column::ColumnData;
pub use table::{MemColumn, MemTable};

use refract_core::{Result, Type, Value};
use refract_engine::{
    BackendKind, DispatchRegistry, Evaluated, Pattern, ROWS, SCALAR, ScalarValue, diagnostic,
    downcast,
};
use refract_expr::{Expr, ExprKind, OpKind};
use std::sync::Arc;
use tracing::trace;

/// The columnar backend's dispatch tag, below `ROWS` in the hierarchy.
pub static MEM: BackendKind = BackendKind { name: "mem", parent: Some(&ROWS) };

fn as_table(value: &Evaluated) -> Result<&MemTable> {
    downcast::<MemTable>(value)
        .ok_or_else(|| diagnostic::rule_mismatch("mem", "a columnar table operand"))
}

fn as_column(value: &Evaluated) -> Result<&MemColumn> {
    downcast::<MemColumn>(value)
        .ok_or_else(|| diagnostic::rule_mismatch("mem", "a columnar column operand"))
}

fn result_type(expr: &Expr) -> Type {
    expr.shape().measure().scalar_type().unwrap_or(Type::Undefined)
}

fn input<'a>(child: &Expr, value: &'a Evaluated) -> Result<ops::Input<'a>> {
    if child.shape().is_scalar() {
        trace!(backend = value.kind().name, "materialize scalar operand");
        let relation = value.materialize()?;
        let scalar = relation
            .rows
            .first()
            .map(|row| row.0[0].clone())
            .unwrap_or(Value::Undefined);
        Ok(ops::Input::Scalar(scalar))
    } else {
        Ok(ops::Input::Column(as_column(value)?))
    }
}

fn column_result(expr: &Expr, data: ColumnData) -> Evaluated {
    Arc::new(MemColumn { name: "value".to_string(), ty: result_type(expr), data })
}

fn field_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Field { name } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::field", "a field node"));
    };
    Ok(Arc::new(as_table(&operands[0])?.field(name)?))
}

fn filter_rule(_expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let data = as_table(&operands[0])?;
    let mask = as_column(&operands[1])?.as_mask()?;
    Ok(Arc::new(data.filter(&mask)?))
}

fn project_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Project { fields } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::project", "a project node"));
    };
    Ok(Arc::new(as_table(&operands[0])?.project(fields)?))
}

fn relabel_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Relabel { mapping } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::relabel", "a relabel node"));
    };
    Ok(Arc::new(as_table(&operands[0])?.relabel(mapping)))
}

fn sort_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Sort { keys } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::sort", "a sort node"));
    };
    Ok(Arc::new(as_table(&operands[0])?.sort(keys)?))
}

fn distinct_rule(_expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    Ok(Arc::new(as_table(&operands[0])?.distinct()))
}

fn slice_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Slice { offset, limit } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::slice", "a slice node"));
    };
    Ok(Arc::new(as_table(&operands[0])?.slice(*offset, *limit)))
}

fn join_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Join { on } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::join", "a join node"));
    };
    let left = as_table(&operands[0])?;
    let right = as_table(&operands[1])?;
    Ok(Arc::new(left.join(right, on)?))
}

fn binary_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Binary { op } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::binary", "a binary node"));
    };
    let left = input(expr.child(0), &operands[0])?;
    let right = input(expr.child(1), &operands[1])?;
    let data = ops::binary(*op, &left, &right, result_type(expr))?;
    Ok(column_result(expr, data))
}

fn unary_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Unary { op } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::unary", "a unary node"));
    };
    let data = ops::unary(*op, as_column(&operands[0])?, result_type(expr))?;
    Ok(column_result(expr, data))
}

fn map_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Map { func } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::map", "a map node"));
    };
    let data = ops::map(*func, as_column(&operands[0])?, result_type(expr))?;
    Ok(column_result(expr, data))
}

fn reduce_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Reduce { op } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::reduce", "a reduce node"));
    };
    Ok(ScalarValue::evaluated(ops::reduce(*op, as_column(&operands[0])?)?))
}

fn merge_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Merge { names } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("mem::merge", "a merge node"));
    };
    let record = expr.shape().record()?;

    let mut length = None;
    for (child, value) in expr.children().iter().zip(operands) {
        if !child.shape().is_scalar() {
            let len = as_column(value)?.len();
            if length.is_some_and(|l| l != len) {
                return Err(diagnostic::rule_mismatch(
                    "mem::merge",
                    "columns of equal length",
                ));
            }
            length = Some(len);
        }
    }
    let length = length.unwrap_or(1);

    let mut schema = Vec::with_capacity(names.len());
    let mut columns = Vec::with_capacity(names.len());
    for ((name, child), value) in
        names.iter().zip(expr.children()).zip(operands)
    {
        let ty = record
            .field(name)
            .and_then(|f| f.measure.scalar_type())
            .unwrap_or(Type::Undefined);
        schema.push((name.clone(), ty));
        columns.push(match input(child, value)? {
            ops::Input::Column(column) => column.data.clone(),
            ops::Input::Scalar(scalar) => {
                let mut data = ColumnData::with_capacity(ty, length)?;
                for _ in 0..length {
                    data.push(&scalar)?;
                }
                data
            }
        });
    }
    Ok(Arc::new(MemTable::new(schema, columns)))
}

/// Installs the columnar rules. Everything not covered here falls through
/// to the row rules, because `MEM` operands satisfy `ROWS` patterns.
pub fn register(registry: &mut DispatchRegistry) {
    registry.register(OpKind::Field, Pattern::exact(&[&MEM]), "mem::field", field_rule);
    registry.register(
        OpKind::Filter,
        Pattern::exact(&[&MEM, &MEM]),
        "mem::filter",
        filter_rule,
    );
    registry.register(OpKind::Project, Pattern::exact(&[&MEM]), "mem::project", project_rule);
    registry.register(OpKind::Relabel, Pattern::exact(&[&MEM]), "mem::relabel", relabel_rule);
    registry.register(OpKind::Sort, Pattern::exact(&[&MEM]), "mem::sort", sort_rule);
    registry.register(
        OpKind::Distinct,
        Pattern::exact(&[&MEM]),
        "mem::distinct",
        distinct_rule,
    );
    registry.register(OpKind::Slice, Pattern::exact(&[&MEM]), "mem::slice", slice_rule);
    registry.register(OpKind::Join, Pattern::exact(&[&MEM, &MEM]), "mem::join", join_rule);
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&MEM, &MEM]),
        "mem::binary",
        binary_rule,
    );
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&MEM, &SCALAR]),
        "mem::binary::scalar",
        binary_rule,
    );
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&SCALAR, &MEM]),
        "mem::scalar::binary",
        binary_rule,
    );
    registry.register(OpKind::Unary, Pattern::exact(&[&MEM]), "mem::unary", unary_rule);
    registry.register(OpKind::Map, Pattern::exact(&[&MEM]), "mem::map", map_rule);
    registry.register(OpKind::Reduce, Pattern::exact(&[&MEM]), "mem::reduce", reduce_rule);
    registry.register(
        OpKind::Merge,
        Pattern::variadic(&[&MEM]),
        "mem::merge",
        merge_rule,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_core::{Relation, Row};
    use refract_engine::{Scope, evaluate};
    use refract_type::{DataShape, Field, Record};

    fn orders_shape() -> DataShape {
        DataShape::table(
            Record::new(vec![
                Field::scalar("id", Type::Int4),
                Field::scalar("name", Type::Utf8),
                Field::scalar("amount", Type::Float8),
            ])
            .unwrap(),
        )
    }

    fn orders() -> Relation {
        Relation::new(
            vec![
                ("id".to_string(), Type::Int4),
                ("name".to_string(), Type::Utf8),
                ("amount".to_string(), Type::Float8),
            ],
            vec![
                Row::new(vec![Value::Int4(1), Value::utf8("a"), Value::float8(5.0)]),
                Row::new(vec![Value::Int4(2), Value::utf8("b"), Value::float8(20.0)]),
            ],
        )
    }

    fn registry() -> DispatchRegistry {
        let mut registry = DispatchRegistry::new();
        refract_backend_rows::register(&mut registry);
        register(&mut registry);
        registry
    }

    fn scope() -> Scope {
        let table = MemTable::from_relation(&orders()).unwrap();
        Scope::new().bind("T", Arc::new(table))
    }

    #[test]
    fn test_filter_project_resolves_to_mem_rules() {
        let t = Expr::symbol("T", orders_shape());
        let predicate = t
            .field("amount")
            .unwrap()
            .greater_than(&Expr::literal(10.0))
            .unwrap();
        let expr = t.filter(&predicate).unwrap().project(&["name"]).unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        assert!(downcast::<MemTable>(&result).is_some());
        let relation = result.materialize().unwrap();
        assert_eq!(relation.rows, vec![Row::new(vec![Value::utf8("b")])]);
    }

    #[test]
    fn test_reduce_runs_columnar() {
        let t = Expr::symbol("T", orders_shape());
        let expr = t.field("amount").unwrap().mean().unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        assert_eq!(downcast::<ScalarValue>(&result).unwrap().0, Value::float8(12.5));
    }

    #[test]
    fn test_merge_builds_columnar_table() {
        let t = Expr::symbol("T", orders_shape());
        let big = t
            .field("amount")
            .unwrap()
            .greater_than(&Expr::literal(10.0))
            .unwrap();
        let expr = Expr::merge(&[
            ("name", &t.field("name").unwrap()),
            ("big", &big),
        ])
        .unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        let table = downcast::<MemTable>(&result).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.field("big").unwrap().get(0), Value::Bool(false));
        assert_eq!(table.field("big").unwrap().get(1), Value::Bool(true));
    }

    #[test]
    fn test_mem_specificity_beats_rows() {
        let t = Expr::symbol("T", orders_shape());
        let expr = t.distinct().unwrap();
        let registry = registry();

        let rule = registry.resolve(OpKind::Distinct, &[&MEM]).unwrap();
        assert_eq!(rule.name(), "mem::distinct");

        let result = evaluate(&expr, &scope(), &registry).unwrap();
        assert!(downcast::<MemTable>(&result).is_some());
    }
}
