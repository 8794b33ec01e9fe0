// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use refract_core::{SortKey, Value};
use refract_type::DataShape;
use refract_type::rules::ReduceOp;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Elementwise binary operators.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Equal,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessThanEqual
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterThanEqual
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryOp::Add => f.write_str("+"),
            BinaryOp::Sub => f.write_str("-"),
            BinaryOp::Mul => f.write_str("*"),
            BinaryOp::Div => f.write_str("/"),
            BinaryOp::Rem => f.write_str("%"),
            BinaryOp::Equal => f.write_str("=="),
            BinaryOp::NotEqual => f.write_str("!="),
            BinaryOp::LessThan => f.write_str("<"),
            BinaryOp::LessThanEqual => f.write_str("<="),
            BinaryOp::GreaterThan => f.write_str(">"),
            BinaryOp::GreaterThanEqual => f.write_str(">="),
            BinaryOp::And => f.write_str("and"),
            BinaryOp::Or => f.write_str("or"),
        }
    }
}

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => f.write_str("-"),
            UnaryOp::Not => f.write_str("not "),
        }
    }
}

/// Named elementwise builtins for `Map`. Map applies a known function so the
/// graph stays structural and hashable; arbitrary closures are excluded by
/// design.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapFunc {
    Abs,
    Lower,
    Upper,
    Length,
}

impl Display for MapFunc {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MapFunc::Abs => f.write_str("abs"),
            MapFunc::Lower => f.write_str("lower"),
            MapFunc::Upper => f.write_str("upper"),
            MapFunc::Length => f.write_str("length"),
        }
    }
}

/// The tagged operation variant of an expression node. Operands live in the
/// node's child list; compile-time parameters live inline here.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExprKind {
    /// An unbound leaf: a name plus a declared shape, resolved via a scope
    /// at evaluation time.
    Symbol { name: String, shape: DataShape },

    /// A constant scalar embedded in the graph.
    Literal { value: Value },

    /// Named field access on a record-measured operand.
    Field { name: String },

    /// Selection by a boolean predicate (children: data, predicate).
    Filter,

    /// Narrowing a record to the named fields.
    Project { fields: Vec<String> },

    Sort { keys: Vec<SortKey> },

    /// Equi-join on the named key fields (children: left, right).
    Join { on: Vec<String> },

    Reduce { op: ReduceOp },

    Binary { op: BinaryOp },

    Unary { op: UnaryOp },

    Map { func: MapFunc },

    /// Field renaming, `(from, to)` pairs.
    Relabel { mapping: Vec<(String, String)> },

    Distinct,

    Slice { offset: usize, limit: Option<usize> },

    /// Assembling named columns into a table (one child per name).
    Merge { names: Vec<String> },
}

/// Fieldless discriminant of [`ExprKind`]; the dispatch key.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    Symbol,
    Literal,
    Field,
    Filter,
    Project,
    Sort,
    Join,
    Reduce,
    Binary,
    Unary,
    Map,
    Relabel,
    Distinct,
    Slice,
    Merge,
}

impl ExprKind {
    pub fn op_kind(&self) -> OpKind {
        match self {
            ExprKind::Symbol { .. } => OpKind::Symbol,
            ExprKind::Literal { .. } => OpKind::Literal,
            ExprKind::Field { .. } => OpKind::Field,
            ExprKind::Filter => OpKind::Filter,
            ExprKind::Project { .. } => OpKind::Project,
            ExprKind::Sort { .. } => OpKind::Sort,
            ExprKind::Join { .. } => OpKind::Join,
            ExprKind::Reduce { .. } => OpKind::Reduce,
            ExprKind::Binary { .. } => OpKind::Binary,
            ExprKind::Unary { .. } => OpKind::Unary,
            ExprKind::Map { .. } => OpKind::Map,
            ExprKind::Relabel { .. } => OpKind::Relabel,
            ExprKind::Distinct => OpKind::Distinct,
            ExprKind::Slice { .. } => OpKind::Slice,
            ExprKind::Merge { .. } => OpKind::Merge,
        }
    }
}

impl Display for OpKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            OpKind::Symbol => "symbol",
            OpKind::Literal => "literal",
            OpKind::Field => "field",
            OpKind::Filter => "filter",
            OpKind::Project => "project",
            OpKind::Sort => "sort",
            OpKind::Join => "join",
            OpKind::Reduce => "reduce",
            OpKind::Binary => "binary",
            OpKind::Unary => "unary",
            OpKind::Map => "map",
            OpKind::Relabel => "relabel",
            OpKind::Distinct => "distinct",
            OpKind::Slice => "slice",
            OpKind::Merge => "merge",
        };
        f.write_str(label)
    }
}
