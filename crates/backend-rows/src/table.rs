// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use refract_core::{Relation, Result, Row, Schema, SortDirection, SortKey, Type, Value};
use refract_engine::diagnostic;
use refract_type::DataShape;
use refract_type::rules::ReduceOp;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Derives a relation schema from a record-measured shape. Fields of the
/// tabular subset always carry scalar measures.
pub fn schema_from_shape(shape: &DataShape) -> Result<Schema> {
    let record = shape.record()?;
    Ok(record
        .fields()
        .iter()
        .map(|field| {
            (field.name.clone(), field.measure.scalar_type().unwrap_or(Type::Undefined))
        })
        .collect())
}

fn column_index(data: &Relation, name: &str) -> Result<usize> {
    data.column_index(name).ok_or_else(|| {
        diagnostic::rule_mismatch("rows", &format!("a column named `{}`", name))
    })
}

/// Narrows a relation to a single named column.
pub fn field(data: &Relation, name: &str) -> Result<Relation> {
    let index = column_index(data, name)?;
    let (name, ty) = data.schema[index].clone();
    let rows = data.rows.iter().map(|row| Row::new(vec![row.0[index].clone()])).collect();
    Ok(Relation::new(vec![(name, ty)], rows))
}

/// Keeps the rows whose mask entry is `true`. Undefined mask entries drop
/// the row, matching three-valued selection.
pub fn filter(data: &Relation, mask: &Relation) -> Result<Relation> {
    if mask.schema.len() != 1 || data.len() != mask.len() {
        return Err(diagnostic::rule_mismatch(
            "rows::filter",
            "a boolean mask of the data's length",
        ));
    }
    let rows = data
        .rows
        .iter()
        .zip(&mask.rows)
        .filter(|(_, mask_row)| mask_row.0[0] == Value::Bool(true))
        .map(|(row, _)| row.clone())
        .collect();
    Ok(Relation::new(data.schema.clone(), rows))
}

pub fn project(data: &Relation, fields: &[String]) -> Result<Relation> {
    let indices = fields
        .iter()
        .map(|name| column_index(data, name))
        .collect::<Result<Vec<_>>>()?;
    let schema = indices.iter().map(|&i| data.schema[i].clone()).collect();
    let rows = data
        .rows
        .iter()
        .map(|row| Row::new(indices.iter().map(|&i| row.0[i].clone()).collect()))
        .collect();
    Ok(Relation::new(schema, rows))
}

pub fn relabel(data: &Relation, mapping: &[(String, String)]) -> Result<Relation> {
    let schema = data
        .schema
        .iter()
        .map(|(name, ty)| {
            let renamed = mapping
                .iter()
                .find(|(from, _)| from == name)
                .map(|(_, to)| to.clone())
                .unwrap_or_else(|| name.clone());
            (renamed, *ty)
        })
        .collect();
    Ok(Relation::new(schema, data.rows.clone()))
}

/// Stable sort. With keys, rows order by each key column in turn; without,
/// the relation is a bare column sorted by its values.
pub fn sort(data: &Relation, keys: &[SortKey]) -> Result<Relation> {
    let mut rows = data.rows.clone();
    if keys.is_empty() {
        rows.sort_by(|a, b| a.0[0].cmp(&b.0[0]));
        return Ok(Relation::new(data.schema.clone(), rows));
    }

    let indices = keys
        .iter()
        .map(|key| Ok((column_index(data, &key.field)?, key.direction)))
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by(|a, b| {
        for (index, direction) in &indices {
            let ordering = match direction {
                SortDirection::Asc => a.0[*index].cmp(&b.0[*index]),
                SortDirection::Desc => b.0[*index].cmp(&a.0[*index]),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(Relation::new(data.schema.clone(), rows))
}

/// Deduplicates rows, keeping first occurrences in encounter order.
pub fn distinct(data: &Relation) -> Relation {
    let mut seen = HashSet::new();
    let rows = data.rows.iter().filter(|row| seen.insert((*row).clone())).cloned().collect();
    Relation::new(data.schema.clone(), rows)
}

pub fn slice(data: &Relation, offset: usize, limit: Option<usize>) -> Relation {
    let rows: Vec<Row> = match limit {
        Some(limit) => data.rows.iter().skip(offset).take(limit).cloned().collect(),
        None => data.rows.iter().skip(offset).cloned().collect(),
    };
    Relation::new(data.schema.clone(), rows)
}

/// Inner equi-join via a hash table over the right side's key columns. The
/// output carries the keys first, then left non-key fields, then right
/// non-key fields.
pub fn join(left: &Relation, right: &Relation, on: &[String]) -> Result<Relation> {
    let left_keys = on
        .iter()
        .map(|name| column_index(left, name))
        .collect::<Result<Vec<_>>>()?;
    let right_keys = on
        .iter()
        .map(|name| column_index(right, name))
        .collect::<Result<Vec<_>>>()?;
    let left_rest: Vec<usize> = (0..left.schema.len())
        .filter(|i| !left_keys.contains(i))
        .collect();
    let right_rest: Vec<usize> = (0..right.schema.len())
        .filter(|i| !right_keys.contains(i))
        .collect();

    let mut schema = Schema::with_capacity(on.len() + left_rest.len() + right_rest.len());
    schema.extend(left_keys.iter().map(|&i| left.schema[i].clone()));
    schema.extend(left_rest.iter().map(|&i| left.schema[i].clone()));
    schema.extend(right_rest.iter().map(|&i| right.schema[i].clone()));

    let mut table: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
    for (position, row) in right.rows.iter().enumerate() {
        let key: Vec<Value> = right_keys.iter().map(|&i| row.0[i].clone()).collect();
        table.entry(key).or_default().push(position);
    }

    let mut rows = Vec::new();
    for row in &left.rows {
        let key: Vec<Value> = left_keys.iter().map(|&i| row.0[i].clone()).collect();
        let Some(matches) = table.get(&key) else { continue };
        for &position in matches {
            let partner = &right.rows[position];
            let mut values = Vec::with_capacity(schema.len());
            values.extend(key.iter().cloned());
            values.extend(left_rest.iter().map(|&i| row.0[i].clone()));
            values.extend(right_rest.iter().map(|&i| partner.0[i].clone()));
            rows.push(Row::new(values));
        }
    }
    Ok(Relation::new(schema, rows))
}

/// An operand to merge: a full column, or a scalar broadcast over every row.
pub enum MergeInput {
    Column(Vec<Value>),
    Scalar(Value),
}

/// Assembles named columns into a relation; scalars broadcast to the common
/// column length.
pub fn merge(
    names: &[String],
    inputs: &[MergeInput],
    shape: &DataShape,
) -> Result<Relation> {
    let schema = schema_from_shape(shape)?;
    let mut length = None;
    for input in inputs {
        if let MergeInput::Column(values) = input {
            match length {
                None => length = Some(values.len()),
                Some(expected) if expected == values.len() => {}
                Some(_) => {
                    return Err(diagnostic::rule_mismatch(
                        "rows::merge",
                        "columns of equal length",
                    ));
                }
            }
        }
    }
    let length = length.unwrap_or(1);

    let rows = (0..length)
        .map(|i| {
            Row::new(
                inputs
                    .iter()
                    .map(|input| match input {
                        MergeInput::Column(values) => values[i].clone(),
                        MergeInput::Scalar(value) => value.clone(),
                    })
                    .collect(),
            )
        })
        .collect();
    debug_assert_eq!(names.len(), schema.len());
    Ok(Relation::new(schema, rows))
}

/// Collapses a collection into one scalar. Undefined entries are skipped by
/// every aggregate except `Count`, which counts rows.
pub fn reduce(op: ReduceOp, data: &Relation, result: Type) -> Result<Value> {
    if op == ReduceOp::Count {
        return Ok(Value::Int8(data.len() as i64));
    }
    if data.schema.len() != 1 {
        return Err(diagnostic::rule_mismatch("rows::reduce", "a single-column operand"));
    }
    let values: Vec<&Value> =
        data.rows.iter().map(|row| &row.0[0]).filter(|v| !v.is_undefined()).collect();

    match op {
        ReduceOp::Sum if result.is_float() => {
            let total: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
            Ok(Value::float8(total))
        }
        ReduceOp::Sum => {
            let total: i64 = values.iter().filter_map(|v| v.as_i64()).sum();
            Ok(Value::Int8(total))
        }
        ReduceOp::Mean => {
            if values.is_empty() {
                return Ok(Value::Undefined);
            }
            let total: f64 = values.iter().filter_map(|v| v.as_f64()).sum();
            Ok(Value::float8(total / values.len() as f64))
        }
        ReduceOp::Min => Ok(values.iter().min().map(|v| (*v).clone()).unwrap_or(Value::Undefined)),
        ReduceOp::Max => Ok(values.iter().max().map(|v| (*v).clone()).unwrap_or(Value::Undefined)),
        ReduceOp::Any => Ok(Value::Bool(values.iter().any(|v| v.as_bool() == Some(true)))),
        ReduceOp::All => Ok(Value::Bool(values.iter().all(|v| v.as_bool() == Some(true)))),
        ReduceOp::Count => unreachable!("handled above"),
    }
}

/// Extracts a single-column relation's values; the measure check happened
/// at shape inference.
pub fn column_of(data: &Relation) -> Result<Vec<Value>> {
    if data.schema.len() != 1 {
        return Err(diagnostic::rule_mismatch("rows", "a single-column operand"));
    }
    Ok(data.rows.iter().map(|row| row.0[0].clone()).collect())
}
