// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! The neutral row-sequence backend. Rules here operate on
//! [`refract_core::Relation`] directly and double as the universal
//! fallbacks: every rule is registered once against `ROWS` operands and
//! once against `ANY`, where it materializes whatever backend values it
//! receives. Any pair of backends can therefore always combine, at minimum
//! specificity, while native rules outrank the fallback.

pub mod scalar;
pub mod table;

use refract_core::{Result, Type, Value};
use refract_engine::{
    ANY, DispatchRegistry, Evaluated, Pattern, ROWS, RowsValue, ScalarValue, diagnostic,
};
use refract_expr::{Expr, ExprKind, OpKind};
use tracing::trace;

/// An elementwise operand, classified by the node's shape rather than the
/// value's backend: scalars broadcast, columns align positionally.
enum Operand {
    Scalar(Value),
    Column(Vec<Value>),
}

fn operand(child: &Expr, value: &Evaluated) -> Result<Operand> {
    let relation = input(value)?;
    if child.shape().is_scalar() {
        let scalar = relation
            .rows
            .first()
            .map(|row| row.0[0].clone())
            .unwrap_or(Value::Undefined);
        Ok(Operand::Scalar(scalar))
    } else {
        Ok(Operand::Column(table::column_of(&relation)?))
    }
}

fn input(value: &Evaluated) -> Result<refract_core::Relation> {
    if value.kind().name != ROWS.name {
        trace!(backend = value.kind().name, "materialize foreign operand into rows");
    }
    value.materialize()
}

fn result_type(expr: &Expr) -> Type {
    expr.shape().measure().scalar_type().unwrap_or(Type::Undefined)
}

fn column_value(name: &str, ty: Type, values: Vec<Value>) -> Evaluated {
    use refract_core::{Relation, Row};
    let rows = values.into_iter().map(|v| Row::new(vec![v])).collect();
    RowsValue::evaluated(Relation::new(vec![(name.to_string(), ty)], rows))
}

/// Applies a scalar kernel over one or two operands with broadcast: a
/// scalar pairs with every column entry, two columns align index by index
/// (a length-one column broadcasts).
fn zip_apply(
    left: Operand,
    right: Operand,
    mut f: impl FnMut(&Value, &Value) -> Result<Value>,
) -> Result<Operand> {
    match (left, right) {
        (Operand::Scalar(l), Operand::Scalar(r)) => Ok(Operand::Scalar(f(&l, &r)?)),
        (Operand::Scalar(l), Operand::Column(rs)) => Ok(Operand::Column(
            rs.iter().map(|r| f(&l, r)).collect::<Result<_>>()?,
        )),
        (Operand::Column(ls), Operand::Scalar(r)) => Ok(Operand::Column(
            ls.iter().map(|l| f(l, &r)).collect::<Result<_>>()?,
        )),
        (Operand::Column(ls), Operand::Column(rs)) => {
            let length = ls.len().max(rs.len());
            if (ls.len() != length && ls.len() != 1)
                || (rs.len() != length && rs.len() != 1)
            {
                return Err(diagnostic::rule_mismatch(
                    "rows::binary",
                    "columns of compatible length",
                ));
            }
            let pick = |values: &[Value], i: usize| {
                if values.len() == 1 { values[0].clone() } else { values[i].clone() }
            };
            let mut out = Vec::with_capacity(length);
            for i in 0..length {
                out.push(f(&pick(&ls, i), &pick(&rs, i))?);
            }
            Ok(Operand::Column(out))
        }
    }
}

fn finish(expr: &Expr, result: Operand) -> Evaluated {
    match result {
        Operand::Scalar(value) => ScalarValue::evaluated(value),
        Operand::Column(values) => column_value("value", result_type(expr), values),
    }
}

fn binary_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Binary { op } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::binary", "a binary node"));
    };
    let ty = result_type(expr);
    let left = operand(expr.child(0), &operands[0])?;
    let right = operand(expr.child(1), &operands[1])?;
    let result = zip_apply(left, right, |l, r| scalar::binary(*op, l, r, ty))?;
    Ok(finish(expr, result))
}

fn unary_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Unary { op } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::unary", "a unary node"));
    };
    let ty = result_type(expr);
    let result = match operand(expr.child(0), &operands[0])? {
        Operand::Scalar(value) => Operand::Scalar(scalar::unary(*op, &value, ty)?),
        Operand::Column(values) => Operand::Column(
            values.iter().map(|v| scalar::unary(*op, v, ty)).collect::<Result<_>>()?,
        ),
    };
    Ok(finish(expr, result))
}

fn map_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Map { func } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::map", "a map node"));
    };
    let ty = result_type(expr);
    let result = match operand(expr.child(0), &operands[0])? {
        Operand::Scalar(value) => Operand::Scalar(scalar::map(*func, &value, ty)?),
        Operand::Column(values) => Operand::Column(
            values.iter().map(|v| scalar::map(*func, v, ty)).collect::<Result<_>>()?,
        ),
    };
    Ok(finish(expr, result))
}

fn field_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Field { name } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::field", "a field node"));
    };
    let data = input(&operands[0])?;
    Ok(RowsValue::evaluated(table::field(&data, name)?))
}

fn filter_rule(_expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let data = input(&operands[0])?;
    let mask = input(&operands[1])?;
    Ok(RowsValue::evaluated(table::filter(&data, &mask)?))
}

fn project_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Project { fields } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::project", "a project node"));
    };
    let data = input(&operands[0])?;
    Ok(RowsValue::evaluated(table::project(&data, fields)?))
}

fn relabel_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Relabel { mapping } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::relabel", "a relabel node"));
    };
    let data = input(&operands[0])?;
    Ok(RowsValue::evaluated(table::relabel(&data, mapping)?))
}

fn sort_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Sort { keys } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::sort", "a sort node"));
    };
    let data = input(&operands[0])?;
    Ok(RowsValue::evaluated(table::sort(&data, keys)?))
}

fn distinct_rule(_expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let data = input(&operands[0])?;
    Ok(RowsValue::evaluated(table::distinct(&data)))
}

fn slice_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Slice { offset, limit } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::slice", "a slice node"));
    };
    let data = input(&operands[0])?;
    Ok(RowsValue::evaluated(table::slice(&data, *offset, *limit)))
}

fn join_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Join { on } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::join", "a join node"));
    };
    let left = input(&operands[0])?;
    let right = input(&operands[1])?;
    Ok(RowsValue::evaluated(table::join(&left, &right, on)?))
}

fn merge_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Merge { names } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::merge", "a merge node"));
    };
    let mut inputs = Vec::with_capacity(operands.len());
    for (child, value) in expr.children().iter().zip(operands) {
        inputs.push(match operand(child, value)? {
            Operand::Scalar(scalar) => table::MergeInput::Scalar(scalar),
            Operand::Column(values) => table::MergeInput::Column(values),
        });
    }
    Ok(RowsValue::evaluated(table::merge(names, &inputs, expr.shape())?))
}

fn reduce_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Reduce { op } = expr.kind() else {
        return Err(diagnostic::rule_mismatch("rows::reduce", "a reduce node"));
    };
    let data = input(&operands[0])?;
    Ok(ScalarValue::evaluated(table::reduce(*op, &data, result_type(expr))?))
}

/// Installs the row rules and the generic fallbacks.
pub fn register(registry: &mut DispatchRegistry) {
    // native rules over rows operands
    registry.register(OpKind::Field, Pattern::exact(&[&ROWS]), "rows::field", field_rule);
    registry.register(
        OpKind::Filter,
        Pattern::exact(&[&ROWS, &ROWS]),
        "rows::filter",
        filter_rule,
    );
    registry.register(
        OpKind::Project,
        Pattern::exact(&[&ROWS]),
        "rows::project",
        project_rule,
    );
    registry.register(
        OpKind::Relabel,
        Pattern::exact(&[&ROWS]),
        "rows::relabel",
        relabel_rule,
    );
    registry.register(OpKind::Sort, Pattern::exact(&[&ROWS]), "rows::sort", sort_rule);
    registry.register(
        OpKind::Distinct,
        Pattern::exact(&[&ROWS]),
        "rows::distinct",
        distinct_rule,
    );
    registry.register(OpKind::Slice, Pattern::exact(&[&ROWS]), "rows::slice", slice_rule);
    registry.register(
        OpKind::Join,
        Pattern::exact(&[&ROWS, &ROWS]),
        "rows::join",
        join_rule,
    );

    // materialize-then-compute fallbacks, matched at zero specificity so
    // every native registration outranks them
    registry.register(OpKind::Field, Pattern::exact(&[&ANY]), "generic::field", field_rule);
    registry.register(
        OpKind::Filter,
        Pattern::exact(&[&ANY, &ANY]),
        "generic::filter",
        filter_rule,
    );
    registry.register(
        OpKind::Project,
        Pattern::exact(&[&ANY]),
        "generic::project",
        project_rule,
    );
    registry.register(
        OpKind::Relabel,
        Pattern::exact(&[&ANY]),
        "generic::relabel",
        relabel_rule,
    );
    registry.register(OpKind::Sort, Pattern::exact(&[&ANY]), "generic::sort", sort_rule);
    registry.register(
        OpKind::Distinct,
        Pattern::exact(&[&ANY]),
        "generic::distinct",
        distinct_rule,
    );
    registry.register(OpKind::Slice, Pattern::exact(&[&ANY]), "generic::slice", slice_rule);
    registry.register(
        OpKind::Join,
        Pattern::exact(&[&ANY, &ANY]),
        "generic::join",
        join_rule,
    );
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&ANY, &ANY]),
        "generic::binary",
        binary_rule,
    );
    registry.register(OpKind::Unary, Pattern::exact(&[&ANY]), "generic::unary", unary_rule);
    registry.register(OpKind::Map, Pattern::exact(&[&ANY]), "generic::map", map_rule);
    registry.register(
        OpKind::Merge,
        Pattern::variadic(&[&ANY]),
        "generic::merge",
        merge_rule,
    );
    registry.register(
        OpKind::Reduce,
        Pattern::exact(&[&ANY]),
        "generic::reduce",
        reduce_rule,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_core::{Relation, Row};
    use refract_engine::{Scope, downcast, evaluate};
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
        register(&mut registry);
        registry
    }

    fn scope() -> Scope {
        Scope::new().bind("T", RowsValue::evaluated(orders()))
    }

    #[test]
    fn test_filter_project_pipeline() {
        let t = Expr::symbol("T", orders_shape());
        let predicate = t
            .field("amount")
            .unwrap()
            .greater_than(&Expr::literal(10.0))
            .unwrap();
        let expr =
            t.filter(&predicate).unwrap().project(&["name"]).unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        let relation = result.materialize().unwrap();
        assert_eq!(relation.schema, vec![("name".to_string(), Type::Utf8)]);
        assert_eq!(relation.rows, vec![Row::new(vec![Value::utf8("b")])]);
    }

    #[test]
    fn test_reduce_over_field() {
        let t = Expr::symbol("T", orders_shape());
        let expr = t.field("amount").unwrap().sum().unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        let scalar = downcast::<ScalarValue>(&result).unwrap();
        assert_eq!(scalar.0, Value::float8(25.0));
    }

    #[test]
    fn test_scalar_arithmetic_via_fallback() {
        let expr = Expr::literal(2i32).add(&Expr::literal(3i32)).unwrap();
        let result = evaluate(&expr, &Scope::new(), &registry()).unwrap();
        assert_eq!(downcast::<ScalarValue>(&result).unwrap().0, Value::Int4(5));
    }

    #[test]
    fn test_merge_columns_into_table() {
        let t = Expr::symbol("T", orders_shape());
        let doubled = t
            .field("amount")
            .unwrap()
            .mul(&Expr::literal(2.0))
            .unwrap();
        let expr = Expr::merge(&[
            ("name", &t.field("name").unwrap()),
            ("doubled", &doubled),
        ])
        .unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        let relation = result.materialize().unwrap();
        assert_eq!(
            relation.schema,
            vec![("name".to_string(), Type::Utf8), ("doubled".to_string(), Type::Float8)]
        );
        assert_eq!(
            relation.rows[1],
            Row::new(vec![Value::utf8("b"), Value::float8(40.0)])
        );
    }

    #[test]
    fn test_sort_distinct_slice_pipeline() {
        let t = Expr::symbol("T", orders_shape());
        let expr = t
            .sort(&[refract_core::SortKey::desc("amount")])
            .unwrap()
            .head(1)
            .unwrap();

        let result = evaluate(&expr, &scope(), &registry()).unwrap();
        let relation = result.materialize().unwrap();
        assert_eq!(relation.len(), 1);
        assert_eq!(relation.rows[0].0[1], Value::utf8("b"));
    }
}
