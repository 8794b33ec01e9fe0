// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::MEM;
use crate::column::ColumnData;
use refract_core::{
    Relation, Result, Row, Schema, SortDirection, SortKey, Type, Value,
};
use refract_engine::{BackendKind, BackendValue, diagnostic};
use std::any::Any;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A columnar table: one typed array per schema column, all of equal length.
#[derive(Clone, Debug, PartialEq)]
pub struct MemTable {
    pub schema: Schema,
    pub columns: Vec<ColumnData>,
}

/// A single named column detached from its table, the result of field
/// access and elementwise computation.
#[derive(Clone, Debug, PartialEq)]
pub struct MemColumn {
    pub name: String,
    pub ty: Type,
    pub data: ColumnData,
}

impl MemTable {
    pub fn new(schema: Schema, columns: Vec<ColumnData>) -> Self {
        debug_assert_eq!(schema.len(), columns.len());
        Self { schema, columns }
    }

    pub fn from_relation(relation: &Relation) -> Result<Self> {
        debug!(
            rows = relation.len(),
            columns = relation.schema.len(),
            "load rows into columnar table"
        );
        let mut columns = Vec::with_capacity(relation.schema.len());
        for (index, (_, ty)) in relation.schema.iter().enumerate() {
            let mut data = ColumnData::with_capacity(*ty, relation.len())?;
            for row in &relation.rows {
                data.push(&row.0[index])?;
            }
            columns.push(data);
        }
        Ok(Self::new(relation.schema.clone(), columns))
    }

    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.schema.iter().position(|(n, _)| n == name).ok_or_else(|| {
            diagnostic::rule_mismatch("mem", &format!("a column named `{}`", name))
        })
    }

    pub fn field(&self, name: &str) -> Result<MemColumn> {
        let index = self.column_index(name)?;
        let (name, ty) = self.schema[index].clone();
        Ok(MemColumn { name, ty, data: self.columns[index].clone() })
    }

    pub fn project(&self, fields: &[String]) -> Result<MemTable> {
        let indices = fields
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        let schema = indices.iter().map(|&i| self.schema[i].clone()).collect();
        let columns = indices.iter().map(|&i| self.columns[i].clone()).collect();
        Ok(MemTable::new(schema, columns))
    }

    pub fn relabel(&self, mapping: &[(String, String)]) -> MemTable {
        let schema = self
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
        MemTable::new(schema, self.columns.clone())
    }

    /// Permutes every column by the same index sequence.
    pub fn gather(&self, indices: &[usize]) -> MemTable {
        let columns = self.columns.iter().map(|c| c.gather(indices)).collect();
        MemTable::new(self.schema.clone(), columns)
    }

    pub fn filter(&self, mask: &[Option<bool>]) -> Result<MemTable> {
        if mask.len() != self.len() {
            return Err(diagnostic::rule_mismatch(
                "mem::filter",
                "a mask of the table's length",
            ));
        }
        let columns = self.columns.iter().map(|c| c.compact(mask)).collect();
        Ok(MemTable::new(self.schema.clone(), columns))
    }

    pub fn slice(&self, offset: usize, limit: Option<usize>) -> MemTable {
        let end = match limit {
            Some(limit) => (offset + limit).min(self.len()),
            None => self.len(),
        };
        let start = offset.min(end);
        let indices: Vec<usize> = (start..end).collect();
        self.gather(&indices)
    }

    fn row_key(&self, index: usize) -> Vec<Value> {
        self.schema
            .iter()
            .zip(&self.columns)
            .map(|((_, ty), data)| data.get(index, *ty))
            .collect()
    }

    /// Argsort over the key columns, then a single gather.
    pub fn sort(&self, keys: &[SortKey]) -> Result<MemTable> {
        let key_columns = keys
            .iter()
            .map(|key| Ok((self.column_index(&key.field)?, key.direction)))
            .collect::<Result<Vec<_>>>()?;

        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.sort_by(|&a, &b| {
            if key_columns.is_empty() {
                let (_, ty) = self.schema[0];
                return self.columns[0].get(a, ty).cmp(&self.columns[0].get(b, ty));
            }
            for (index, direction) in &key_columns {
                let (_, ty) = self.schema[*index];
                let left = self.columns[*index].get(a, ty);
                let right = self.columns[*index].get(b, ty);
                let ordering = match direction {
                    SortDirection::Asc => left.cmp(&right),
                    SortDirection::Desc => right.cmp(&left),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
        Ok(self.gather(&indices))
    }

    pub fn distinct(&self) -> MemTable {
        let mut seen = HashSet::new();
        let indices: Vec<usize> =
            (0..self.len()).filter(|&i| seen.insert(self.row_key(i))).collect();
        self.gather(&indices)
    }

    /// Hash join over the key columns: pairs of matching row indices are
    /// collected, then both sides are gathered once.
    pub fn join(&self, right: &MemTable, on: &[String]) -> Result<MemTable> {
        let left_keys = on
            .iter()
            .map(|name| self.column_index(name))
            .collect::<Result<Vec<_>>>()?;
        let right_keys = on
            .iter()
            .map(|name| right.column_index(name))
            .collect::<Result<Vec<_>>>()?;

        let key_at = |table: &MemTable, keys: &[usize], row: usize| -> Vec<Value> {
            keys.iter()
                .map(|&i| {
                    let (_, ty) = table.schema[i];
                    table.columns[i].get(row, ty)
                })
                .collect()
        };

        let mut table: HashMap<Vec<Value>, Vec<usize>> = HashMap::new();
        for row in 0..right.len() {
            table.entry(key_at(right, &right_keys, row)).or_default().push(row);
        }

        let mut left_indices = Vec::new();
        let mut right_indices = Vec::new();
        for row in 0..self.len() {
            if let Some(matches) = table.get(&key_at(self, &left_keys, row)) {
                for &partner in matches {
                    left_indices.push(row);
                    right_indices.push(partner);
                }
            }
        }

        let left_rest: Vec<usize> =
            (0..self.schema.len()).filter(|i| !left_keys.contains(i)).collect();
        let right_rest: Vec<usize> =
            (0..right.schema.len()).filter(|i| !right_keys.contains(i)).collect();

        let mut schema = Schema::new();
        let mut columns = Vec::new();
        for &i in &left_keys {
            schema.push(self.schema[i].clone());
            columns.push(self.columns[i].gather(&left_indices));
        }
        for &i in &left_rest {
            schema.push(self.schema[i].clone());
            columns.push(self.columns[i].gather(&left_indices));
        }
        for &i in &right_rest {
            schema.push(right.schema[i].clone());
            columns.push(right.columns[i].gather(&right_indices));
        }
        Ok(MemTable::new(schema, columns))
    }

    pub fn to_relation(&self) -> Relation {
        let rows = (0..self.len()).map(|i| Row::new(self.row_key(i))).collect();
        Relation::new(self.schema.clone(), rows)
    }
}

impl MemColumn {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Value {
        self.data.get(index, self.ty)
    }

    /// The boolean mask view used by filters.
    pub fn as_mask(&self) -> Result<Vec<Option<bool>>> {
        match &self.data {
            ColumnData::Bool(values) => Ok(values.clone()),
            _ => Err(diagnostic::rule_mismatch("mem::filter", "a boolean mask column")),
        }
    }
}

impl BackendValue for MemTable {
    fn kind(&self) -> &'static BackendKind {
        &MEM
    }

    fn materialize(&self) -> Result<Relation> {
        Ok(self.to_relation())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl BackendValue for MemColumn {
    fn kind(&self) -> &'static BackendKind {
        &MEM
    }

    fn materialize(&self) -> Result<Relation> {
        let rows = (0..self.len()).map(|i| Row::new(vec![self.get(i)])).collect();
        Ok(Relation::new(vec![(self.name.clone(), self.ty)], rows))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders() -> MemTable {
        MemTable::new(
            vec![
                ("id".to_string(), Type::Int4),
                ("name".to_string(), Type::Utf8),
                ("amount".to_string(), Type::Float8),
            ],
            vec![
                ColumnData::Int(vec![Some(1), Some(2), Some(3)]),
                ColumnData::Utf8(vec![
                    Some("a".to_string()),
                    Some("b".to_string()),
                    Some("c".to_string()),
                ]),
                ColumnData::Float(vec![Some(5.0), Some(20.0), Some(20.0)]),
            ],
        )
    }

    #[test]
    fn test_relation_roundtrip() {
        let table = orders();
        let relation = table.to_relation();
        assert_eq!(relation.len(), 3);
        assert_eq!(MemTable::from_relation(&relation).unwrap(), table);
    }

    #[test]
    fn test_field_and_mask_filter() {
        let table = orders();
        let column = table.field("amount").unwrap();
        assert_eq!(column.ty, Type::Float8);
        assert_eq!(column.get(1), Value::float8(20.0));

        let kept =
            table.filter(&[Some(false), Some(true), None]).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.field("name").unwrap().get(0), Value::utf8("b"));
    }

    #[test]
    fn test_sort_desc_is_stable() {
        let sorted = orders().sort(&[SortKey::desc("amount")]).unwrap();
        let names = sorted.field("name").unwrap();
        assert_eq!(names.get(0), Value::utf8("b"));
        assert_eq!(names.get(1), Value::utf8("c"));
        assert_eq!(names.get(2), Value::utf8("a"));
    }

    #[test]
    fn test_distinct_and_slice() {
        let table = MemTable::new(
            vec![("v".to_string(), Type::Int4)],
            vec![ColumnData::Int(vec![Some(2), Some(1), Some(2)])],
        );
        let unique = table.distinct();
        assert_eq!(unique.len(), 2);
        assert_eq!(unique.field("v").unwrap().get(0), Value::Int4(2));

        assert_eq!(table.slice(1, Some(5)).len(), 2);
        assert_eq!(table.slice(9, None).len(), 0);
    }

    #[test]
    fn test_join_gathers_both_sides() {
        let cities = MemTable::new(
            vec![("id".to_string(), Type::Int4), ("city".to_string(), Type::Utf8)],
            vec![
                ColumnData::Int(vec![Some(2), Some(9)]),
                ColumnData::Utf8(vec![Some("berlin".to_string()), Some("x".to_string())]),
            ],
        );
        let joined = orders().join(&cities, &["id".to_string()]).unwrap();
        assert_eq!(
            joined.schema.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            vec!["id", "name", "amount", "city"]
        );
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.field("city").unwrap().get(0), Value::utf8("berlin"));
    }
}
