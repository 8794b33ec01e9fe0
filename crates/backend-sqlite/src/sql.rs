// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Composable SELECT statements. Operations push clauses onto a
//! [`SqlSelect`] as long as the addition keeps the statement's meaning;
//! callers check [`SqlSelect::can_*`] first and materialize instead when
//! composition would reorder semantics (a filter after a limit, say).

use refract_core::{SortDirection, Value};

/// A SQL expression fragment with its bound parameters, positional `?`.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlExpr {
    pub sql: String,
    pub params: Vec<Value>,
}

impl SqlExpr {
    pub fn column(name: &str) -> Self {
        Self { sql: quote_ident(name), params: vec![] }
    }

    pub fn param(value: Value) -> Self {
        Self { sql: "?".to_string(), params: vec![value] }
    }

    pub fn binary(left: &SqlExpr, operator: &str, right: &SqlExpr) -> Self {
        let mut params = left.params.clone();
        params.extend(right.params.iter().cloned());
        Self { sql: format!("({} {} {})", left.sql, operator, right.sql), params }
    }

    pub fn call(function: &str, operand: &SqlExpr) -> Self {
        Self {
            sql: format!("{}({})", function, operand.sql),
            params: operand.params.clone(),
        }
    }

    pub fn prefix(operator: &str, operand: &SqlExpr) -> Self {
        Self {
            sql: format!("{}({})", operator, operand.sql),
            params: operand.params.clone(),
        }
    }
}

/// Double-quoted identifier, embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One composable SELECT over a single table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SqlSelect {
    pub table: String,
    projection: Option<Vec<String>>,
    predicates: Vec<SqlExpr>,
    order_by: Vec<(String, SortDirection)>,
    distinct: bool,
    offset: usize,
    limit: Option<usize>,
}

impl SqlSelect {
    pub fn scan(table: impl Into<String>) -> Self {
        Self { table: table.into(), ..Self::default() }
    }

    fn windowed(&self) -> bool {
        self.offset > 0 || self.limit.is_some()
    }

    /// A filter composes while no window has been applied; filtering after
    /// LIMIT would select from the truncated result.
    pub fn can_filter(&self) -> bool {
        !self.windowed() && !self.distinct
    }

    pub fn filter(&self, predicate: SqlExpr) -> SqlSelect {
        debug_assert!(self.can_filter());
        let mut next = self.clone();
        next.predicates.push(predicate);
        next
    }

    /// Projection composes until DISTINCT or a window pins the column set.
    pub fn can_project(&self) -> bool {
        !self.distinct && !self.windowed()
    }

    pub fn project(&self, fields: &[String]) -> SqlSelect {
        debug_assert!(self.can_project());
        let mut next = self.clone();
        next.projection = Some(fields.to_vec());
        next
    }

    pub fn can_sort(&self) -> bool {
        !self.windowed()
    }

    pub fn sort(&self, keys: Vec<(String, SortDirection)>) -> SqlSelect {
        debug_assert!(self.can_sort());
        let mut next = self.clone();
        next.order_by = keys;
        next
    }

    pub fn can_distinct(&self) -> bool {
        !self.windowed()
    }

    /// An aggregate query computes over the full statement result, so it is
    /// only valid while no window or DISTINCT reshapes the row set.
    pub fn can_aggregate(&self) -> bool {
        !self.windowed() && !self.distinct
    }

    pub fn distinct(&self) -> SqlSelect {
        debug_assert!(self.can_distinct());
        let mut next = self.clone();
        next.distinct = true;
        next
    }

    /// A further slice always composes: it narrows the existing window.
    pub fn slice(&self, offset: usize, limit: Option<usize>) -> SqlSelect {
        let mut next = self.clone();
        next.offset = self.offset + offset;
        next.limit = match (self.limit, limit) {
            (Some(outer), inner) => {
                let remaining = outer.saturating_sub(offset);
                Some(inner.map_or(remaining, |inner| inner.min(remaining)))
            }
            (None, inner) => inner,
        };
        next
    }

    /// Renders `SELECT ... FROM ...` around the given projection list.
    pub fn render_with(&self, projection: &str) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(projection);
        sql.push_str(" FROM ");
        sql.push_str(&quote_ident(&self.table));

        let mut params = Vec::new();
        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            let clauses: Vec<&str> =
                self.predicates.iter().map(|p| p.sql.as_str()).collect();
            sql.push_str(&clauses.join(" AND "));
            for predicate in &self.predicates {
                params.extend(predicate.params.iter().cloned());
            }
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let keys: Vec<String> = self
                .order_by
                .iter()
                .map(|(name, direction)| {
                    let direction = match direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {}", quote_ident(name), direction)
                })
                .collect();
            sql.push_str(&keys.join(", "));
        }
        match (self.limit, self.offset) {
            (Some(limit), 0) => sql.push_str(&format!(" LIMIT {}", limit)),
            (Some(limit), offset) => {
                sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset))
            }
            (None, offset) if offset > 0 => {
                sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset))
            }
            _ => {}
        }
        (sql, params)
    }

    /// Renders with the select's own projection (or `*`).
    pub fn render(&self) -> (String, Vec<Value>) {
        let projection = match &self.projection {
            Some(fields) => fields
                .iter()
                .map(|name| quote_ident(name))
                .collect::<Vec<_>>()
                .join(", "),
            None => "*".to_string(),
        };
        self.render_with(&projection)
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }
}
