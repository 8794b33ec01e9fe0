// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::registry::DispatchRegistry;
use refract_core::Result;
use refract_expr::{Expr, ExprKind};
use tracing::trace;

/// Cap on rewrite fixpoint iterations. Rules are expected to converge in
/// one or two passes; hitting the cap means a rule oscillates and we keep
/// the last well-formed graph rather than loop.
const MAX_PASSES: usize = 8;

/// A structural rewrite applied before evaluation.
///
/// Rules return `Ok(None)` when a node is not theirs to change. A
/// returned replacement must keep the node's shape; the driver rejects
/// any rewrite that alters it.
pub trait RewriteRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn rewrite(&self, expr: &Expr) -> Result<Option<Expr>>;
}

/// Runs every registered rule bottom-up over the graph until no rule
/// fires, bounded by [`MAX_PASSES`].
pub(crate) fn apply(registry: &DispatchRegistry, expr: &Expr) -> Result<Expr> {
    let rules = registry.rewrites();
    if rules.is_empty() {
        return Ok(expr.clone());
    }

    let mut current = expr.clone();
    for _ in 0..MAX_PASSES {
        let (next, changed) = pass(rules, &current)?;
        if !changed {
            break;
        }
        current = next;
    }
    Ok(current)
}

fn pass(rules: &[std::sync::Arc<dyn RewriteRule>], expr: &Expr) -> Result<(Expr, bool)> {
    let mut changed = false;

    // Children first, so rules see already-rewritten operands.
    let mut children = Vec::with_capacity(expr.children().len());
    for child in expr.children() {
        let (rewritten, child_changed) = pass(rules, child)?;
        changed |= child_changed;
        children.push(rewritten);
    }
    let mut current =
        if changed { expr.with_children(children)? } else { expr.clone() };

    for rule in rules {
        if let Some(replacement) = rule.rewrite(&current)? {
            if replacement.shape() != current.shape() {
                return Err(diagnostic::rewrite_changed_shape(
                    rule.name(),
                    current.shape(),
                    replacement.shape(),
                ));
            }
            trace!(rule = rule.name(), before = %current, after = %replacement, "rewrite");
            current = replacement;
            changed = true;
        }
    }

    Ok((current, changed))
}

/// Reorders `filter(project(t, fields), pred)` into
/// `project(filter(t, pred), fields)`.
///
/// The predicate only sees projected fields, which the source also
/// carries, so it is rebased onto the source unchanged. Filtering before
/// projecting lets backends prune rows before narrowing columns, and for
/// translating backends keeps the predicate next to the scan.
pub struct ProjectionFilterPushdown;

impl RewriteRule for ProjectionFilterPushdown {
    fn name(&self) -> &'static str {
        "projection-filter-pushdown"
    }

    fn rewrite(&self, expr: &Expr) -> Result<Option<Expr>> {
        let ExprKind::Filter = expr.kind() else { return Ok(None) };
        let source = expr.child(0);
        let predicate = expr.child(1);
        let ExprKind::Project { fields } = source.kind() else {
            return Ok(None);
        };

        let base = source.child(0);
        let rebased = predicate.substitute(source, base)?;
        let filtered = base.filter(&rebased)?;
        let narrowed =
            Expr::build(ExprKind::Project { fields: fields.clone() }, vec![filtered])?;
        Ok(Some(narrowed))
    }
}
