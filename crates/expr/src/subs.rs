// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::node::Expr;
use refract_core::Result;

impl Expr {
    /// Replaces every occurrence of `from` in this graph with `to`,
    /// rebuilding (and so re-validating and re-shaping) every node on a
    /// changed path. Untouched subtrees are shared, not copied.
    pub fn substitute(&self, from: &Expr, to: &Expr) -> Result<Expr> {
        if self == from {
            return Ok(to.clone());
        }
        if self.children().is_empty() {
            return Ok(self.clone());
        }

        let mut changed = false;
        let mut children = Vec::with_capacity(self.children().len());
        for child in self.children() {
            let replaced = child.substitute(from, to)?;
            if replaced != *child {
                changed = true;
            }
            children.push(replaced);
        }

        if !changed {
            return Ok(self.clone());
        }
        self.with_children(children)
    }

    /// Whether `needle` occurs anywhere in this graph.
    pub fn contains(&self, needle: &Expr) -> bool {
        self == needle || self.children().iter().any(|child| child.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Expr;
    use refract_core::Type;
    use refract_type::{DataShape, Field, Record};

    fn table(name: &str, extra: Option<Field>) -> Expr {
        let mut fields = vec![
            Field::scalar("id", Type::Int4),
            Field::scalar("amount", Type::Float8),
        ];
        if let Some(field) = extra {
            fields.push(field);
        }
        Expr::symbol(name, DataShape::table(Record::new(fields).unwrap()))
    }

    #[test]
    fn test_substitute_rebinds_base() {
        let narrow = table("A", None);
        let wide = table("B", Some(Field::scalar("city", Type::Utf8)));

        let predicate = narrow
            .field("amount")
            .unwrap()
            .greater_than(&Expr::literal(10.0))
            .unwrap();

        let rebound = predicate.substitute(&narrow, &wide).unwrap();
        assert_eq!(rebound.to_string(), "(B.amount > 10)");
        assert_eq!(rebound.shape(), predicate.shape());
    }

    #[test]
    fn test_substitute_missing_field_fails() {
        let with_city = table("A", Some(Field::scalar("city", Type::Utf8)));
        let without = table("B", None);

        let city = with_city.field("city").unwrap();
        let err = city.substitute(&with_city, &without).unwrap_err();
        assert_eq!(err.code(), "TY_002");
    }

    #[test]
    fn test_substitute_shares_untouched_subtrees() {
        let t = table("T", None);
        let other = table("O", None);
        let expr = t.field("amount").unwrap();

        let unchanged = expr.substitute(&other, &t).unwrap();
        assert_eq!(unchanged, expr);
    }

    #[test]
    fn test_contains() {
        let t = table("T", None);
        let expr = t.field("amount").unwrap().sum().unwrap();
        assert!(expr.contains(&t));
        assert!(!expr.contains(&table("X", None)));
    }
}
