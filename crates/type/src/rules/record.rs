// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::measure::{Field, Measure, Record};
use crate::rules::elementwise::broadcast;
use crate::shape::DataShape;
use refract_core::Result;

/// Accessing a named field keeps the dimensions and narrows the measure to
/// the field's own measure.
pub fn field_access(data: &DataShape, name: &str) -> Result<DataShape> {
    let record = data.record()?;
    let field = record
        .field(name)
        .ok_or_else(|| diagnostic::unknown_field(name, record))?;
    Ok(data.with_measure(field.measure.clone()))
}

/// Projection narrows the record to the requested fields, in request order.
pub fn project(data: &DataShape, fields: &[String]) -> Result<DataShape> {
    let record = data.record()?;
    let mut projected = Vec::with_capacity(fields.len());
    for name in fields {
        let field = record
            .field(name)
            .ok_or_else(|| diagnostic::unknown_field(name, record))?;
        projected.push(field.clone());
    }
    Ok(data.with_measure(Measure::Record(Record::new(projected)?)))
}

/// Relabel renames fields; every source name must exist and the renamed
/// record must stay collision free.
pub fn relabel(data: &DataShape, mapping: &[(String, String)]) -> Result<DataShape> {
    let record = data.record()?;
    for (from, _) in mapping {
        if !record.contains(from) {
            return Err(diagnostic::unknown_field(from, record));
        }
    }
    let renamed = record
        .fields()
        .iter()
        .map(|field| {
            let name = mapping
                .iter()
                .find(|(from, _)| *from == field.name)
                .map(|(_, to)| to.clone())
                .unwrap_or_else(|| field.name.clone());
            Field::new(name, field.measure.clone())
        })
        .collect();
    Ok(data.with_measure(Measure::Record(Record::new(renamed)?)))
}

/// Join produces the structural union of both records: the deduplicated join
/// keys first, then the left non-key fields, then the right non-key fields.
/// Non-key name clashes are a collision the caller must relabel away.
pub fn join(left: &DataShape, right: &DataShape, on: &[String]) -> Result<DataShape> {
    let left_record = left.record()?;
    let right_record = right.record()?;

    let mut fields = Vec::new();
    for key in on {
        let l = left_record
            .field(key)
            .ok_or_else(|| diagnostic::unknown_field(key, left_record))?;
        let r = right_record
            .field(key)
            .ok_or_else(|| diagnostic::unknown_field(key, right_record))?;
        if l.measure != r.measure {
            return Err(diagnostic::shape_mismatch("join key", &l.measure, &r.measure));
        }
        fields.push(l.clone());
    }

    for field in left_record.fields() {
        if !on.contains(&field.name) {
            fields.push(field.clone());
        }
    }
    for field in right_record.fields() {
        if on.contains(&field.name) {
            continue;
        }
        if left_record.contains(&field.name) {
            return Err(diagnostic::name_collision(&field.name));
        }
        fields.push(field.clone());
    }

    Ok(DataShape::table(Record::new(fields)?))
}

/// Merge assembles named columns into a table; the columns' dimensions must
/// broadcast to a common collection shape.
pub fn merge(names: &[String], columns: &[DataShape]) -> Result<DataShape> {
    debug_assert_eq!(names.len(), columns.len());

    let mut dims: Vec<_> = vec![];
    let mut fields = Vec::with_capacity(columns.len());
    for (name, column) in names.iter().zip(columns) {
        dims = broadcast(&dims, column.dims())?;
        fields.push(Field::new(name.clone(), column.measure().clone()));
    }
    Ok(DataShape::new(dims, Measure::Record(Record::new(fields)?)))
}
