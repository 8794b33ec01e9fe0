// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use parking_lot::Mutex;
use refract_core::{Relation, Result, Row, Schema, Type, Value};
use rusqlite::Connection;
use rusqlite::types::ValueRef;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A shared handle to one SQLite database. Values of this backend carry a
/// clone; the connection itself is serialized behind a mutex since the
/// driver connection is not `Sync`.
#[derive(Clone)]
pub struct SqliteDb {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SqliteDb")
    }
}

impl SqliteDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| diagnostic::sqlite_error("open", e))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| diagnostic::sqlite_error("open", e))?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Runs one or more semicolon-separated statements; DDL and fixtures.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn
            .lock()
            .execute_batch(sql)
            .map_err(|e| diagnostic::sqlite_error("execute", e))
    }

    /// Reads a table's schema from `PRAGMA table_info`, mapping the three
    /// storage classes onto the widest matching types.
    pub fn table_schema(&self, table: &str) -> Result<Schema> {
        let conn = self.conn.lock();
        let mut statement = conn
            .prepare(&format!("PRAGMA table_info({})", crate::sql::quote_ident(table)))
            .map_err(|e| diagnostic::sqlite_error("table_info", e))?;
        let mut rows = statement
            .query([])
            .map_err(|e| diagnostic::sqlite_error("table_info", e))?;

        let mut schema = Schema::new();
        while let Some(row) = rows.next().map_err(|e| diagnostic::sqlite_error("table_info", e))? {
            let name: String =
                row.get(1).map_err(|e| diagnostic::sqlite_error("table_info", e))?;
            let declared: String =
                row.get(2).map_err(|e| diagnostic::sqlite_error("table_info", e))?;
            let ty = match declared.to_ascii_uppercase() {
                t if t.contains("INT") => Type::Int8,
                t if t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB") => {
                    Type::Float8
                }
                t if t.contains("CHAR") || t.contains("TEXT") || t.contains("CLOB") => {
                    Type::Utf8
                }
                _ => return Err(diagnostic::unsupported_column_type(&name, &declared)),
            };
            schema.push((name, ty));
        }
        if schema.is_empty() {
            return Err(diagnostic::unknown_table(table));
        }
        Ok(schema)
    }

    /// Executes a SELECT and maps the result rows onto the expected schema.
    pub fn query(&self, sql: &str, params: &[Value], schema: &Schema) -> Result<Relation> {
        debug!(sql, params = params.len(), "sqlite query");
        let conn = self.conn.lock();
        let mut statement =
            conn.prepare(sql).map_err(|e| diagnostic::sqlite_error("prepare", e))?;
        let mut rows = statement
            .query(rusqlite::params_from_iter(params.iter().map(to_sql_value)))
            .map_err(|e| diagnostic::sqlite_error("query", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(|e| diagnostic::sqlite_error("query", e))? {
            let mut values = Vec::with_capacity(schema.len());
            for (index, (name, ty)) in schema.iter().enumerate() {
                let cell = row
                    .get_ref(index)
                    .map_err(|e| diagnostic::sqlite_error("query", e))?;
                values.push(from_sql_value(cell, *ty, name)?);
            }
            out.push(Row::new(values));
        }
        Ok(Relation::new(schema.clone(), out))
    }
}

/// Binds a neutral value as a SQLite parameter; booleans become integers.
fn to_sql_value(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Undefined => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
        Value::Utf8(s) => rusqlite::types::Value::Text(s.clone()),
        v if v.data_type().is_integer() => {
            rusqlite::types::Value::Integer(v.as_i64().unwrap_or_default())
        }
        v => rusqlite::types::Value::Real(v.as_f64().unwrap_or_default()),
    }
}

/// Maps one result cell onto the expected neutral type. SQLite is weakly
/// typed, so integers widen to floats where the schema says float and
/// 0/1 integers fold back to booleans.
fn from_sql_value(cell: ValueRef<'_>, ty: Type, column: &str) -> Result<Value> {
    Ok(match (cell, ty) {
        (ValueRef::Null, _) => Value::Undefined,
        (ValueRef::Integer(i), Type::Bool) => Value::Bool(i != 0),
        (ValueRef::Integer(i), ty) if ty.is_integer() => Value::Int8(i),
        (ValueRef::Integer(i), ty) if ty.is_float() => Value::float8(i as f64),
        (ValueRef::Real(f), ty) if ty.is_float() => Value::float8(f),
        (ValueRef::Text(bytes), Type::Utf8) => {
            Value::utf8(String::from_utf8_lossy(bytes).into_owned())
        }
        _ => return Err(diagnostic::unexpected_storage(column)),
    })
}
