// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::SQLITE;
use crate::db::SqliteDb;
use crate::sql::{SqlExpr, SqlSelect, quote_ident};
use refract_core::{Relation, Result, Schema, Type};
use refract_engine::{BackendKind, BackendValue};
use std::any::Any;

/// A deferred SELECT over one table. Nothing touches the database until a
/// rule needs actual rows; composable operations keep extending the
/// statement instead.
#[derive(Clone, Debug)]
pub struct SqliteTable {
    pub db: SqliteDb,
    pub select: SqlSelect,
    pub schema: Schema,
}

impl SqliteTable {
    /// Opens a table as a full scan, reading its schema from the database.
    pub fn open(db: &SqliteDb, table: &str) -> Result<Self> {
        let schema = db.table_schema(table)?;
        Ok(Self { db: db.clone(), select: SqlSelect::scan(table), schema })
    }

    pub fn with_select(&self, select: SqlSelect, schema: Schema) -> Self {
        Self { db: self.db.clone(), select, schema }
    }

    pub fn column_type(&self, name: &str) -> Option<Type> {
        self.schema.iter().find(|(n, _)| n == name).map(|(_, ty)| *ty)
    }
}

impl BackendValue for SqliteTable {
    fn kind(&self) -> &'static BackendKind {
        &SQLITE
    }

    fn materialize(&self) -> Result<Relation> {
        let (sql, params) = self.select.render();
        self.db.query(&sql, &params, &self.schema)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A single-column expression over a table context: the same deferred
/// SELECT, but projecting one computed SQL expression.
#[derive(Clone, Debug)]
pub struct SqliteColumn {
    pub db: SqliteDb,
    pub context: SqlSelect,
    pub expr: SqlExpr,
    pub name: String,
    pub ty: Type,
}

impl SqliteColumn {
    pub fn field(table: &SqliteTable, name: &str, ty: Type) -> Self {
        Self {
            db: table.db.clone(),
            context: table.select.clone(),
            expr: SqlExpr::column(name),
            name: name.to_string(),
            ty,
        }
    }

    pub fn derived(&self, expr: SqlExpr, ty: Type) -> Self {
        Self {
            db: self.db.clone(),
            context: self.context.clone(),
            expr,
            name: "value".to_string(),
            ty,
        }
    }

    /// Whether another column shares this one's table context, which is
    /// what makes their SQL expressions combinable in one statement.
    pub fn same_context(&self, other: &SqliteColumn) -> bool {
        self.context == other.context
    }

    pub fn render(&self) -> (String, Vec<refract_core::Value>) {
        let projection = format!("{} AS {}", self.expr.sql, quote_ident(&self.name));
        let (sql, mut params) = self.context.render_with(&projection);
        let mut all = self.expr.params.clone();
        all.append(&mut params);
        (sql, all)
    }
}

impl BackendValue for SqliteColumn {
    fn kind(&self) -> &'static BackendKind {
        &SQLITE
    }

    fn materialize(&self) -> Result<Relation> {
        let (sql, params) = self.render();
        let schema = vec![(self.name.clone(), self.ty)];
        self.db.query(&sql, &params, &schema)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
