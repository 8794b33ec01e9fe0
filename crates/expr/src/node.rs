// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::kind::{BinaryOp, ExprKind, MapFunc, OpKind, UnaryOp};
use refract_core::{Result, SortKey, Type, Value};
use refract_type::rules::{self, ReduceOp};
use refract_type::{DataShape, Measure};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// One immutable node of the expression graph: an operation kind, its
/// operand nodes and the shape computed for it at construction time.
#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprNode {
    pub kind: ExprKind,
    pub children: Vec<Expr>,
    pub shape: DataShape,
}

/// Cheaply clonable handle to an expression node. Equality and hashing are
/// structural, so identical sub-expressions are interchangeable for caching
/// and dispatch.
#[derive(Clone, Debug, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expr(Arc<ExprNode>);

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl Expr {
    /// Central node factory: validates arity, computes the shape via the
    /// type rules and allocates the node. Every public constructor funnels
    /// through here, which is what makes graphs correct by construction.
    pub fn build(kind: ExprKind, children: Vec<Expr>) -> Result<Expr> {
        let shape = infer_shape(&kind, &children)?;
        Ok(Expr(Arc::new(ExprNode { kind, children, shape })))
    }

    /// Rebuilds this node over replacement operands, re-running validation
    /// and shape inference. Used by substitution and rewrite passes.
    pub fn with_children(&self, children: Vec<Expr>) -> Result<Expr> {
        Expr::build(self.kind().clone(), children)
    }

    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    pub fn op_kind(&self) -> OpKind {
        self.0.kind.op_kind()
    }

    pub fn shape(&self) -> &DataShape {
        &self.0.shape
    }

    pub fn children(&self) -> &[Expr] {
        &self.0.children
    }

    pub fn child(&self, index: usize) -> &Expr {
        &self.0.children[index]
    }

    // --- leaves ---------------------------------------------------------

    /// An unbound leaf with a declared shape; bound to data via a scope at
    /// evaluation time.
    pub fn symbol(name: impl Into<String>, shape: DataShape) -> Expr {
        Expr(Arc::new(ExprNode {
            shape: shape.clone(),
            kind: ExprKind::Symbol { name: name.into(), shape },
            children: vec![],
        }))
    }

    pub fn literal(value: impl Into<Value>) -> Expr {
        let value = value.into();
        Expr(Arc::new(ExprNode {
            shape: DataShape::scalar(value.data_type()),
            kind: ExprKind::Literal { value },
            children: vec![],
        }))
    }

    // --- record operations ----------------------------------------------

    pub fn field(&self, name: impl Into<String>) -> Result<Expr> {
        Expr::build(ExprKind::Field { name: name.into() }, vec![self.clone()])
    }

    pub fn project(&self, fields: &[&str]) -> Result<Expr> {
        let fields = fields.iter().map(|f| f.to_string()).collect();
        Expr::build(ExprKind::Project { fields }, vec![self.clone()])
    }

    pub fn relabel(&self, mapping: &[(&str, &str)]) -> Result<Expr> {
        let mapping =
            mapping.iter().map(|(from, to)| (from.to_string(), to.to_string())).collect();
        Expr::build(ExprKind::Relabel { mapping }, vec![self.clone()])
    }

    pub fn join(&self, right: &Expr, on: &[&str]) -> Result<Expr> {
        let on = on.iter().map(|k| k.to_string()).collect();
        Expr::build(ExprKind::Join { on }, vec![self.clone(), right.clone()])
    }

    pub fn merge(columns: &[(&str, &Expr)]) -> Result<Expr> {
        let names = columns.iter().map(|(name, _)| name.to_string()).collect();
        let children = columns.iter().map(|(_, expr)| (*expr).clone()).collect();
        Expr::build(ExprKind::Merge { names }, children)
    }

    // --- collection operations ------------------------------------------

    pub fn filter(&self, predicate: &Expr) -> Result<Expr> {
        Expr::build(ExprKind::Filter, vec![self.clone(), predicate.clone()])
    }

    pub fn sort(&self, keys: &[SortKey]) -> Result<Expr> {
        Expr::build(ExprKind::Sort { keys: keys.to_vec() }, vec![self.clone()])
    }

    pub fn sort_by(&self, field: &str) -> Result<Expr> {
        self.sort(&[SortKey::asc(field)])
    }

    pub fn distinct(&self) -> Result<Expr> {
        Expr::build(ExprKind::Distinct, vec![self.clone()])
    }

    pub fn slice(&self, offset: usize, limit: Option<usize>) -> Result<Expr> {
        Expr::build(ExprKind::Slice { offset, limit }, vec![self.clone()])
    }

    pub fn head(&self, n: usize) -> Result<Expr> {
        self.slice(0, Some(n))
    }

    // --- reductions -----------------------------------------------------

    pub fn reduce(&self, op: ReduceOp) -> Result<Expr> {
        Expr::build(ExprKind::Reduce { op }, vec![self.clone()])
    }

    pub fn sum(&self) -> Result<Expr> {
        self.reduce(ReduceOp::Sum)
    }

    pub fn min(&self) -> Result<Expr> {
        self.reduce(ReduceOp::Min)
    }

    pub fn max(&self) -> Result<Expr> {
        self.reduce(ReduceOp::Max)
    }

    pub fn count(&self) -> Result<Expr> {
        self.reduce(ReduceOp::Count)
    }

    pub fn mean(&self) -> Result<Expr> {
        self.reduce(ReduceOp::Mean)
    }

    pub fn any(&self) -> Result<Expr> {
        self.reduce(ReduceOp::Any)
    }

    pub fn all(&self) -> Result<Expr> {
        self.reduce(ReduceOp::All)
    }

    // --- elementwise ----------------------------------------------------

    pub fn binary(&self, op: BinaryOp, right: &Expr) -> Result<Expr> {
        Expr::build(ExprKind::Binary { op }, vec![self.clone(), right.clone()])
    }

    pub fn add(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Add, right)
    }

    pub fn sub(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Sub, right)
    }

    pub fn mul(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Mul, right)
    }

    pub fn div(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Div, right)
    }

    pub fn rem(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Rem, right)
    }

    pub fn equal(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Equal, right)
    }

    pub fn not_equal(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::NotEqual, right)
    }

    pub fn less_than(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::LessThan, right)
    }

    pub fn less_than_equal(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::LessThanEqual, right)
    }

    pub fn greater_than(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::GreaterThan, right)
    }

    pub fn greater_than_equal(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::GreaterThanEqual, right)
    }

    pub fn and(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::And, right)
    }

    pub fn or(&self, right: &Expr) -> Result<Expr> {
        self.binary(BinaryOp::Or, right)
    }

    pub fn neg(&self) -> Result<Expr> {
        Expr::build(ExprKind::Unary { op: UnaryOp::Neg }, vec![self.clone()])
    }

    pub fn not(&self) -> Result<Expr> {
        Expr::build(ExprKind::Unary { op: UnaryOp::Not }, vec![self.clone()])
    }

    pub fn map(&self, func: MapFunc) -> Result<Expr> {
        Expr::build(ExprKind::Map { func }, vec![self.clone()])
    }
}

fn infer_shape(kind: &ExprKind, children: &[Expr]) -> Result<DataShape> {
    let arity = |expected: usize| -> Result<()> {
        if children.len() != expected {
            return Err(diagnostic::arity_mismatch(kind.op_kind(), expected, children.len()));
        }
        Ok(())
    };

    match kind {
        ExprKind::Symbol { shape, .. } => {
            arity(0)?;
            Ok(shape.clone())
        }
        ExprKind::Literal { value } => {
            arity(0)?;
            Ok(DataShape::scalar(value.data_type()))
        }
        ExprKind::Field { name } => {
            arity(1)?;
            rules::field_access(children[0].shape(), name)
        }
        ExprKind::Filter => {
            arity(2)?;
            rules::filter(children[0].shape(), children[1].shape())
        }
        ExprKind::Project { fields } => {
            arity(1)?;
            rules::project(children[0].shape(), fields)
        }
        ExprKind::Sort { keys } => {
            arity(1)?;
            rules::sort(children[0].shape(), keys)
        }
        ExprKind::Join { on } => {
            arity(2)?;
            rules::join(children[0].shape(), children[1].shape(), on)
        }
        ExprKind::Reduce { op } => {
            arity(1)?;
            rules::reduce(children[0].shape(), *op)
        }
        ExprKind::Binary { op } => {
            arity(2)?;
            let (left, right) = (children[0].shape(), children[1].shape());
            if op.is_arithmetic() {
                rules::arithmetic(left, right)
            } else if op.is_comparison() {
                rules::comparison(left, right)
            } else {
                rules::logical(left, right)
            }
        }
        ExprKind::Unary { op } => {
            arity(1)?;
            match op {
                UnaryOp::Neg => rules::negate(children[0].shape()),
                UnaryOp::Not => rules::not(children[0].shape()),
            }
        }
        ExprKind::Map { func } => {
            arity(1)?;
            map_shape(*func, children[0].shape())
        }
        ExprKind::Relabel { mapping } => {
            arity(1)?;
            rules::relabel(children[0].shape(), mapping)
        }
        ExprKind::Distinct => {
            arity(1)?;
            rules::distinct(children[0].shape())
        }
        ExprKind::Slice { offset, limit } => {
            arity(1)?;
            rules::slice(children[0].shape(), *offset, *limit)
        }
        ExprKind::Merge { names } => {
            arity(names.len())?;
            let shapes: Vec<DataShape> =
                children.iter().map(|c| c.shape().clone()).collect();
            rules::merge(names, &shapes)
        }
    }
}

fn map_shape(func: MapFunc, operand: &DataShape) -> Result<DataShape> {
    let ty = operand.measure().scalar_type();
    let result = match (func, ty) {
        (MapFunc::Abs, Some(ty)) if ty.is_number() => ty,
        (MapFunc::Lower | MapFunc::Upper, Some(Type::Utf8)) => Type::Utf8,
        (MapFunc::Length, Some(Type::Utf8)) => Type::Int8,
        _ => {
            return Err(refract_type::diagnostic::shape_mismatch(
                "map",
                operand,
                func,
            ));
        }
    };
    Ok(operand.with_measure(Measure::Scalar(result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refract_type::{Field, Record};

    fn table() -> Expr {
        Expr::symbol(
            "T",
            DataShape::table(
                Record::new(vec![
                    Field::scalar("id", Type::Int4),
                    Field::scalar("name", Type::Utf8),
                    Field::scalar("amount", Type::Float8),
                ])
                .unwrap(),
            ),
        )
    }

    #[test]
    fn test_construction_computes_shape() {
        let t = table();
        let amount = t.field("amount").unwrap();
        assert_eq!(amount.shape(), &DataShape::column(Type::Float8));

        let predicate = amount.greater_than(&Expr::literal(10.0)).unwrap();
        assert_eq!(predicate.shape(), &DataShape::column(Type::Bool));

        let filtered = t.filter(&predicate).unwrap();
        assert_eq!(filtered.shape(), t.shape());
    }

    #[test]
    fn test_structural_identity() {
        let a = table().field("amount").unwrap().sum().unwrap();
        let b = table().field("amount").unwrap().sum().unwrap();
        assert_eq!(a, b);

        use std::collections::HashMap;
        let mut cache = HashMap::new();
        cache.insert(a, 1);
        assert_eq!(cache.get(&b), Some(&1));
    }

    #[test]
    fn test_filter_on_text_field_fails_at_construction() {
        let t = table();
        let name = t.field("name").unwrap();
        let err = name.greater_than(&Expr::literal(10.0)).unwrap_err();
        assert_eq!(err.code(), "TY_001");
    }

    #[test]
    fn test_unknown_field_fails_fast() {
        assert_eq!(table().field("missing").unwrap_err().code(), "TY_002");
    }

    #[test]
    fn test_join_shapes() {
        let t = table();
        let cities = Expr::symbol(
            "C",
            DataShape::table(
                Record::new(vec![
                    Field::scalar("id", Type::Int4),
                    Field::scalar("city", Type::Utf8),
                ])
                .unwrap(),
            ),
        );
        let joined = t.join(&cities, &["id"]).unwrap();
        let names: Vec<_> = joined.shape().record().unwrap().names().collect();
        assert_eq!(names, vec!["id", "name", "amount", "city"]);
    }

    #[test]
    fn test_merge() {
        let t = table();
        let doubled = t.field("amount").unwrap().mul(&Expr::literal(2.0)).unwrap();
        let merged =
            Expr::merge(&[("name", &t.field("name").unwrap()), ("doubled", &doubled)])
                .unwrap();
        assert_eq!(merged.shape().to_string(), "var * {name: utf8, doubled: float8}");
    }

    #[test]
    fn test_map_shapes() {
        let t = table();
        let length = t.field("name").unwrap().map(MapFunc::Length).unwrap();
        assert_eq!(length.shape(), &DataShape::column(Type::Int8));
        assert!(t.field("amount").unwrap().map(MapFunc::Lower).is_err());
    }

    #[test]
    fn test_reduce_sugar() {
        let total = table().field("amount").unwrap().sum().unwrap();
        assert_eq!(total.shape(), &DataShape::scalar(Type::Float8));

        let count = table().count().unwrap();
        assert_eq!(count.shape(), &DataShape::scalar(Type::Int8));
    }

    #[test]
    fn test_with_children_revalidates() {
        let t = table();
        let amount = t.field("amount").unwrap();

        let narrowed = t.project(&["id", "name"]).unwrap();
        let err = amount.with_children(vec![narrowed]).unwrap_err();
        assert_eq!(err.code(), "TY_002");
    }
}
