// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::registry::DispatchRegistry;
use crate::rewrite;
use crate::value::Evaluated;
use refract_core::Result;
use refract_expr::{Expr, ExprKind};
use std::collections::HashMap;
use tracing::debug;

/// Per-evaluation bindings from symbol names to concrete backend values.
/// Created fresh for every call and discarded after; nothing global.
#[derive(Default, Clone)]
pub struct Scope {
    bindings: HashMap<String, Evaluated>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, value: Evaluated) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Evaluated) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Evaluated> {
        self.bindings.get(name)
    }
}

/// Evaluates an expression graph against the scope's bindings.
///
/// The walk is post-order and synchronous: operands are computed before
/// their operator, each node's rule is resolved from the operands' actual
/// backend kinds, and rule invocations block until done. Sub-expressions
/// are memoized per call by structural identity, so a shared subtree is
/// computed exactly once. Backend rule failures propagate unmodified.
pub fn evaluate(expr: &Expr, scope: &Scope, registry: &DispatchRegistry) -> Result<Evaluated> {
    let expr = rewrite::apply(registry, expr)?;
    debug!(expr = %expr, "evaluate");
    let mut memo: HashMap<Expr, Evaluated> = HashMap::new();
    eval_node(&expr, scope, registry, &mut memo)
}

fn eval_node(
    expr: &Expr,
    scope: &Scope,
    registry: &DispatchRegistry,
    memo: &mut HashMap<Expr, Evaluated>,
) -> Result<Evaluated> {
    if let Some(hit) = memo.get(expr) {
        return Ok(hit.clone());
    }

    let result = match expr.kind() {
        ExprKind::Symbol { name, .. } => scope
            .get(name)
            .cloned()
            .ok_or_else(|| diagnostic::unbound_symbol(name))?,
        _ => {
            let mut operands = Vec::with_capacity(expr.children().len());
            for child in expr.children() {
                operands.push(eval_node(child, scope, registry, memo)?);
            }
            let kinds: Vec<_> = operands.iter().map(|value| value.kind()).collect();
            let rule = registry.resolve(expr.op_kind(), &kinds)?;
            debug!(op = %expr.op_kind(), rule = rule.name(), "invoke rule");
            rule.invoke(expr, &operands)?
        }
    };

    memo.insert(expr.clone(), result.clone());
    Ok(result)
}
