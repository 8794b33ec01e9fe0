// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::kind::ExprKind;
use crate::node::Expr;
use std::fmt::{Display, Formatter};

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ExprKind::Symbol { name, .. } => f.write_str(name),
            ExprKind::Literal { value } => write!(f, "{}", value),
            ExprKind::Field { name } => write!(f, "{}.{}", self.child(0), name),
            ExprKind::Filter => {
                write!(f, "filter({}, {})", self.child(0), self.child(1))
            }
            ExprKind::Project { fields } => {
                write!(f, "project({}, [{}])", self.child(0), fields.join(", "))
            }
            ExprKind::Sort { keys } => {
                let keys =
                    keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "sort({}, [{}])", self.child(0), keys)
            }
            ExprKind::Join { on } => {
                write!(f, "join({}, {}, [{}])", self.child(0), self.child(1), on.join(", "))
            }
            ExprKind::Reduce { op } => write!(f, "{}({})", op, self.child(0)),
            ExprKind::Binary { op } => {
                write!(f, "({} {} {})", self.child(0), op, self.child(1))
            }
            ExprKind::Unary { op } => write!(f, "({}{})", op, self.child(0)),
            ExprKind::Map { func } => write!(f, "{}({})", func, self.child(0)),
            ExprKind::Relabel { mapping } => {
                let pairs = mapping
                    .iter()
                    .map(|(from, to)| format!("{} -> {}", from, to))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "relabel({}, [{}])", self.child(0), pairs)
            }
            ExprKind::Distinct => write!(f, "distinct({})", self.child(0)),
            ExprKind::Slice { offset, limit } => match limit {
                Some(limit) => {
                    write!(f, "slice({}, {}, {})", self.child(0), offset, limit)
                }
                None => write!(f, "slice({}, {}, ..)", self.child(0), offset),
            },
            ExprKind::Merge { names } => {
                let columns = names
                    .iter()
                    .zip(self.children())
                    .map(|(name, child)| format!("{}: {}", name, child))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "merge({{{}}})", columns)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Expr;
    use refract_core::Type;
    use refract_type::{DataShape, Field, Record};

    #[test]
    fn test_render() {
        let t = Expr::symbol(
            "T",
            DataShape::table(
                Record::new(vec![
                    Field::scalar("name", Type::Utf8),
                    Field::scalar("amount", Type::Float8),
                ])
                .unwrap(),
            ),
        );
        let expr = t
            .filter(
                &t.field("amount").unwrap().greater_than(&Expr::literal(10.0)).unwrap(),
            )
            .unwrap()
            .project(&["name"])
            .unwrap();

        assert_eq!(expr.to_string(), "project(filter(T, (T.amount > 10)), [name])");
    }
}
