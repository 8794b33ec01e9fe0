// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! SQL-translating backend over SQLite. Operations compose a deferred
//! SELECT statement instead of computing rows: filters extend WHERE,
//! projections narrow the column list, slices narrow LIMIT/OFFSET, and
//! reductions run as aggregate queries. When a composition would change
//! the statement's meaning, or an operand pair crosses table contexts,
//! the rule materializes and computes over neutral rows instead.

pub mod db;
pub mod diagnostic;
pub mod sql;
pub mod value;

pub use db::SqliteDb;
pub use sql::{SqlExpr, SqlSelect};
pub use value::{SqliteColumn, SqliteTable};

use refract_backend_mem::{MEM, MemTable};
use refract_backend_rows::table as rows;
use refract_core::{Result, Type, Value};
use refract_engine::{
    ANY, BackendKind, DispatchRegistry, Evaluated, Pattern, RowsValue, SCALAR,
    ScalarValue, downcast,
};
use refract_expr::{BinaryOp, Expr, ExprKind, MapFunc, OpKind, UnaryOp};
use refract_type::rules::ReduceOp;
use std::sync::Arc;
use tracing::trace;

/// The SQLite backend's dispatch tag. A direct child of the root: its
/// values are not row-shaped, they are deferred statements.
pub static SQLITE: BackendKind = BackendKind { name: "sqlite", parent: Some(&ANY) };

fn result_type(expr: &Expr) -> Type {
    expr.shape().measure().scalar_type().unwrap_or(Type::Undefined)
}

fn sql_operator(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Rem => "%",
        BinaryOp::Equal => "=",
        BinaryOp::NotEqual => "<>",
        BinaryOp::LessThan => "<",
        BinaryOp::LessThanEqual => "<=",
        BinaryOp::GreaterThan => ">",
        BinaryOp::GreaterThanEqual => ">=",
        BinaryOp::And => "AND",
        BinaryOp::Or => "OR",
    }
}

fn field_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Field { name } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::field",
            "a field node",
        ));
    };
    let Some(table) = downcast::<SqliteTable>(&operands[0]) else {
        return fallback(expr, operands, |relations| {
            rows::field(&relations[0], name).map(RowsValue::evaluated)
        });
    };
    Ok(Arc::new(SqliteColumn::field(table, name, result_type(expr))))
}

/// Materializes every operand and computes over neutral rows; the escape
/// hatch for non-composable statements.
fn fallback(
    expr: &Expr,
    operands: &[Evaluated],
    f: impl FnOnce(&[refract_core::Relation]) -> Result<Evaluated>,
) -> Result<Evaluated> {
    trace!(op = %expr.op_kind(), "sqlite composition fallback");
    let relations = operands
        .iter()
        .map(|operand| operand.materialize())
        .collect::<Result<Vec<_>>>()?;
    f(&relations)
}

fn filter_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    if let (Some(table), Some(mask)) = (
        downcast::<SqliteTable>(&operands[0]),
        downcast::<SqliteColumn>(&operands[1]),
    ) {
        if mask.context == table.select && table.select.can_filter() {
            let select = table.select.filter(mask.expr.clone());
            return Ok(Arc::new(table.with_select(select, table.schema.clone())));
        }
    }
    fallback(expr, operands, |relations| {
        rows::filter(&relations[0], &relations[1]).map(RowsValue::evaluated)
    })
}

fn project_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Project { fields } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::project",
            "a project node",
        ));
    };
    if let Some(table) = downcast::<SqliteTable>(&operands[0]) {
        if table.select.can_project() {
            let schema: refract_core::Schema = fields
                .iter()
                .map(|name| (name.clone(), table.column_type(name).unwrap_or(Type::Undefined)))
                .collect();
            let select = table.select.project(fields);
            return Ok(Arc::new(table.with_select(select, schema)));
        }
    }
    fallback(expr, operands, |relations| {
        rows::project(&relations[0], fields).map(RowsValue::evaluated)
    })
}

fn sort_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Sort { keys } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::sort",
            "a sort node",
        ));
    };
    if let Some(table) = downcast::<SqliteTable>(&operands[0]) {
        if !keys.is_empty() && table.select.can_sort() {
            let order = keys.iter().map(|k| (k.field.clone(), k.direction)).collect();
            let select = table.select.sort(order);
            return Ok(Arc::new(table.with_select(select, table.schema.clone())));
        }
    }
    fallback(expr, operands, |relations| {
        rows::sort(&relations[0], keys).map(RowsValue::evaluated)
    })
}

fn distinct_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    if let Some(table) = downcast::<SqliteTable>(&operands[0]) {
        if table.select.can_distinct() {
            let select = table.select.distinct();
            return Ok(Arc::new(table.with_select(select, table.schema.clone())));
        }
    }
    fallback(expr, operands, |relations| {
        Ok(RowsValue::evaluated(rows::distinct(&relations[0])))
    })
}

fn slice_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Slice { offset, limit } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::slice",
            "a slice node",
        ));
    };
    if let Some(table) = downcast::<SqliteTable>(&operands[0]) {
        let select = table.select.slice(*offset, *limit);
        return Ok(Arc::new(table.with_select(select, table.schema.clone())));
    }
    if let Some(column) = downcast::<SqliteColumn>(&operands[0]) {
        let mut sliced = column.clone();
        sliced.context = column.context.slice(*offset, *limit);
        return Ok(Arc::new(sliced));
    }
    fallback(expr, operands, |relations| {
        Ok(RowsValue::evaluated(rows::slice(&relations[0], *offset, *limit)))
    })
}

fn binary_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Binary { op } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::binary",
            "a binary node",
        ));
    };
    let ty = result_type(expr);

    let side = |index: usize| -> Option<SqlExpr> {
        if expr.child(index).shape().is_scalar() {
            if let Some(scalar) = downcast::<ScalarValue>(&operands[index]) {
                return Some(SqlExpr::param(scalar.0.clone()));
            }
        }
        downcast::<SqliteColumn>(&operands[index]).map(|column| column.expr.clone())
    };

    let anchor = [0, 1]
        .into_iter()
        .find_map(|i| downcast::<SqliteColumn>(&operands[i]));
    if let (Some(anchor), Some(left), Some(right)) = (anchor, side(0), side(1)) {
        let combinable = [0, 1].into_iter().all(|i| {
            downcast::<SqliteColumn>(&operands[i])
                .is_none_or(|column| column.same_context(anchor))
        });
        if combinable {
            let combined = SqlExpr::binary(&left, sql_operator(*op), &right);
            return Ok(Arc::new(anchor.derived(combined, ty)));
        }
    }

    fallback(expr, operands, |relations| {
        let value_at = |relation: &refract_core::Relation, index: usize, i: usize| {
            if expr.child(index).shape().is_scalar() {
                relation.rows.first().map(|r| r.0[0].clone()).unwrap_or(Value::Undefined)
            } else {
                relation.rows[i].0[0].clone()
            }
        };
        let length = [0, 1]
            .into_iter()
            .filter(|&i| !expr.child(i).shape().is_scalar())
            .map(|i| relations[i].len())
            .max()
            .unwrap_or(1);
        let mut values = Vec::with_capacity(length);
        for i in 0..length {
            values.push(refract_backend_rows::scalar::binary(
                *op,
                &value_at(&relations[0], 0, i),
                &value_at(&relations[1], 1, i),
                ty,
            )?);
        }
        let rows = values.into_iter().map(|v| refract_core::Row::new(vec![v])).collect();
        Ok(RowsValue::evaluated(refract_core::Relation::new(
            vec![("value".to_string(), ty)],
            rows,
        )))
    })
}

fn unary_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Unary { op } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::unary",
            "a unary node",
        ));
    };
    if let Some(column) = downcast::<SqliteColumn>(&operands[0]) {
        let operator = match op {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "NOT ",
        };
        let derived = SqlExpr::prefix(operator, &column.expr);
        return Ok(Arc::new(column.derived(derived, result_type(expr))));
    }
    fallback(expr, operands, |relations| {
        let ty = result_type(expr);
        let values = rows::column_of(&relations[0])?
            .iter()
            .map(|v| refract_backend_rows::scalar::unary(*op, v, ty))
            .collect::<Result<Vec<_>>>()?;
        let rows = values.into_iter().map(|v| refract_core::Row::new(vec![v])).collect();
        Ok(RowsValue::evaluated(refract_core::Relation::new(
            vec![("value".to_string(), ty)],
            rows,
        )))
    })
}

fn map_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Map { func } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::map",
            "a map node",
        ));
    };
    if let Some(column) = downcast::<SqliteColumn>(&operands[0]) {
        let function = match func {
            MapFunc::Abs => "ABS",
            MapFunc::Lower => "LOWER",
            MapFunc::Upper => "UPPER",
            MapFunc::Length => "LENGTH",
        };
        let derived = SqlExpr::call(function, &column.expr);
        return Ok(Arc::new(column.derived(derived, result_type(expr))));
    }
    fallback(expr, operands, |relations| {
        let ty = result_type(expr);
        let values = rows::column_of(&relations[0])?
            .iter()
            .map(|v| refract_backend_rows::scalar::map(*func, v, ty))
            .collect::<Result<Vec<_>>>()?;
        let rows = values.into_iter().map(|v| refract_core::Row::new(vec![v])).collect();
        Ok(RowsValue::evaluated(refract_core::Relation::new(
            vec![("value".to_string(), ty)],
            rows,
        )))
    })
}

fn reduce_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Reduce { op } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::reduce",
            "a reduce node",
        ));
    };
    let ty = result_type(expr);

    let aggregate = match op {
        ReduceOp::Sum => Some("SUM"),
        ReduceOp::Min => Some("MIN"),
        ReduceOp::Max => Some("MAX"),
        ReduceOp::Mean => Some("AVG"),
        ReduceOp::Count => Some("COUNT"),
        // boolean aggregates have no direct SQL form over 0/1 columns worth
        // the translation; the row reduction handles them
        ReduceOp::Any | ReduceOp::All => None,
    };
    if let (Some(column), Some(aggregate)) =
        (downcast::<SqliteColumn>(&operands[0]).filter(|c| c.context.can_aggregate()), aggregate)
    {
        let projection = if *op == ReduceOp::Count {
            "COUNT(*)".to_string()
        } else {
            format!("{}({})", aggregate, column.expr.sql)
        };
        let (sql, mut params) = column.context.render_with(&projection);
        let mut all = if *op == ReduceOp::Count {
            Vec::new()
        } else {
            column.expr.params.clone()
        };
        all.append(&mut params);

        let schema = vec![("value".to_string(), ty)];
        let relation = column.db.query(&sql, &all, &schema)?;
        let value = relation
            .rows
            .first()
            .map(|row| row.0[0].clone())
            .unwrap_or(Value::Undefined);
        // SUM of no rows is NULL in SQL but zero here
        let value = match (value, op) {
            (Value::Undefined, ReduceOp::Sum) if ty.is_float() => Value::float8(0.0),
            (Value::Undefined, ReduceOp::Sum) => Value::Int8(0),
            (value, _) => value,
        };
        return Ok(ScalarValue::evaluated(value));
    }

    fallback(expr, operands, |relations| {
        rows::reduce(*op, &relations[0], ty).map(ScalarValue::evaluated)
    })
}

/// Joins a sqlite operand with a columnar one by pulling the sqlite rows
/// into memory, then running the columnar hash join.
fn mem_join_rule(expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
    let ExprKind::Join { on } = expr.kind() else {
        return Err(refract_engine::diagnostic::rule_mismatch(
            "sqlite::join",
            "a join node",
        ));
    };
    let side = |value: &Evaluated| -> Result<MemTable> {
        match downcast::<MemTable>(value) {
            Some(table) => Ok(table.clone()),
            None => MemTable::from_relation(&value.materialize()?),
        }
    };
    let left = side(&operands[0])?;
    let right = side(&operands[1])?;
    Ok(Arc::new(left.join(&right, on)?))
}

/// Installs the SQL-translating rules.
pub fn register(registry: &mut DispatchRegistry) {
    registry.register(OpKind::Field, Pattern::exact(&[&SQLITE]), "sqlite::field", field_rule);
    registry.register(
        OpKind::Filter,
        Pattern::exact(&[&SQLITE, &SQLITE]),
        "sqlite::filter",
        filter_rule,
    );
    registry.register(
        OpKind::Project,
        Pattern::exact(&[&SQLITE]),
        "sqlite::project",
        project_rule,
    );
    registry.register(OpKind::Sort, Pattern::exact(&[&SQLITE]), "sqlite::sort", sort_rule);
    registry.register(
        OpKind::Distinct,
        Pattern::exact(&[&SQLITE]),
        "sqlite::distinct",
        distinct_rule,
    );
    registry.register(OpKind::Slice, Pattern::exact(&[&SQLITE]), "sqlite::slice", slice_rule);
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&SQLITE, &SQLITE]),
        "sqlite::binary",
        binary_rule,
    );
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&SQLITE, &SCALAR]),
        "sqlite::binary::scalar",
        binary_rule,
    );
    registry.register(
        OpKind::Binary,
        Pattern::exact(&[&SCALAR, &SQLITE]),
        "sqlite::scalar::binary",
        binary_rule,
    );
    registry.register(OpKind::Unary, Pattern::exact(&[&SQLITE]), "sqlite::unary", unary_rule);
    registry.register(OpKind::Map, Pattern::exact(&[&SQLITE]), "sqlite::map", map_rule);
    registry.register(
        OpKind::Reduce,
        Pattern::exact(&[&SQLITE]),
        "sqlite::reduce",
        reduce_rule,
    );
    registry.register(
        OpKind::Join,
        Pattern::exact(&[&MEM, &SQLITE]),
        "sqlite::join::mem",
        mem_join_rule,
    );
    registry.register(
        OpKind::Join,
        Pattern::exact(&[&SQLITE, &MEM]),
        "sqlite::mem::join",
        mem_join_rule,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_core::{SortKey, Type};
    use refract_engine::{Scope, evaluate};
    use refract_type::DataShape;

    fn fixture() -> (SqliteDb, SqliteTable) {
        let db = SqliteDb::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE orders (id INTEGER, name TEXT, amount REAL);
             INSERT INTO orders VALUES (1, 'a', 5.0), (2, 'b', 20.0), (3, 'c', 7.5);",
        )
        .unwrap();
        let table = SqliteTable::open(&db, "orders").unwrap();
        (db, table)
    }

    fn registry() -> DispatchRegistry {
        let mut registry = DispatchRegistry::new();
        refract_backend_rows::register(&mut registry);
        refract_backend_mem::register(&mut registry);
        register(&mut registry);
        registry
    }

    fn symbol(table: &SqliteTable) -> Expr {
        Expr::symbol("T", DataShape::from_schema(&table.schema).unwrap())
    }

    #[test]
    fn test_filter_project_composes_into_one_statement() {
        let (_db, table) = fixture();
        let t = symbol(&table);
        let predicate = t
            .field("amount")
            .unwrap()
            .greater_than(&Expr::literal(10.0))
            .unwrap();
        let expr = t.filter(&predicate).unwrap().project(&["name"]).unwrap();

        let scope = Scope::new().bind("T", Arc::new(table));
        let result = evaluate(&expr, &scope, &registry()).unwrap();

        // still a deferred statement, not materialized rows
        let deferred = downcast::<SqliteTable>(&result).unwrap();
        let (sql, _) = deferred.select.render();
        assert!(sql.contains("WHERE"));

        let relation = result.materialize().unwrap();
        assert_eq!(relation.schema, vec![("name".to_string(), Type::Utf8)]);
        assert_eq!(relation.rows[0].0[0], Value::utf8("b"));
        assert_eq!(relation.len(), 1);
    }

    #[test]
    fn test_sort_slice_composes() {
        let (_db, table) = fixture();
        let t = symbol(&table);
        let expr = t
            .sort(&[SortKey::desc("amount")])
            .unwrap()
            .head(2)
            .unwrap();

        let scope = Scope::new().bind("T", Arc::new(table));
        let result = evaluate(&expr, &scope, &registry()).unwrap();
        let relation = result.materialize().unwrap();
        assert_eq!(
            relation.column_values("name").unwrap(),
            vec![Value::utf8("b"), Value::utf8("c")]
        );
    }

    #[test]
    fn test_reduce_runs_as_aggregate() {
        let (_db, table) = fixture();
        let t = symbol(&table);
        let expr = t.field("amount").unwrap().sum().unwrap();

        let scope = Scope::new().bind("T", Arc::new(table));
        let result = evaluate(&expr, &scope, &registry()).unwrap();
        assert_eq!(downcast::<ScalarValue>(&result).unwrap().0, Value::float8(32.5));
    }

    #[test]
    fn test_count_counts_all_rows() {
        let (db, _) = fixture();
        db.execute_batch("INSERT INTO orders VALUES (4, NULL, NULL);").unwrap();
        let table = SqliteTable::open(&db, "orders").unwrap();
        let t = symbol(&table);
        let expr = t.field("name").unwrap().count().unwrap();

        let scope = Scope::new().bind("T", Arc::new(table));
        let result = evaluate(&expr, &scope, &registry()).unwrap();
        assert_eq!(downcast::<ScalarValue>(&result).unwrap().0, Value::Int8(4));
    }

    #[test]
    fn test_join_with_mem_table() {
        let (_db, table) = fixture();
        let cities = refract_backend_mem::MemTable::new(
            vec![("id".to_string(), Type::Int8), ("city".to_string(), Type::Utf8)],
            vec![
                refract_backend_mem::ColumnData::Int(vec![Some(2)]),
                refract_backend_mem::ColumnData::Utf8(vec![Some("berlin".to_string())]),
            ],
        );
        let t = symbol(&table);
        let c = Expr::symbol(
            "C",
            DataShape::from_schema(&vec![
                ("id".to_string(), Type::Int8),
                ("city".to_string(), Type::Utf8),
            ])
            .unwrap(),
        );
        let expr = t.join(&c, &["id"]).unwrap();

        let scope = Scope::new()
            .bind("T", Arc::new(table))
            .bind("C", Arc::new(cities));
        let result = evaluate(&expr, &scope, &registry()).unwrap();
        let relation = result.materialize().unwrap();
        assert_eq!(relation.len(), 1);
        assert_eq!(relation.rows[0].0[1], Value::utf8("b"));
        assert_eq!(relation.rows[0].0[3], Value::utf8("berlin"));
    }
}
