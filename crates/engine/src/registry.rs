// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::diagnostic;
use crate::kind::BackendKind;
use crate::rewrite::RewriteRule;
use crate::value::{Evaluated, ScalarValue};
use indexmap::IndexMap;
use refract_core::Result;
use refract_expr::{Expr, ExprKind, OpKind};
use std::sync::Arc;
use tracing::trace;

/// A per-operand backend-kind pattern. A pattern matches when every operand's
/// actual kind is the patterned kind or one of its descendants; a variadic
/// pattern repeats its last kind over any remaining operands.
#[derive(Clone, Debug)]
pub struct Pattern {
    kinds: Vec<&'static BackendKind>,
    variadic: bool,
}

impl Pattern {
    pub fn exact(kinds: &[&'static BackendKind]) -> Self {
        Self { kinds: kinds.to_vec(), variadic: false }
    }

    /// The last kind in `kinds` matches any number of trailing operands.
    pub fn variadic(kinds: &[&'static BackendKind]) -> Self {
        debug_assert!(!kinds.is_empty());
        Self { kinds: kinds.to_vec(), variadic: true }
    }

    fn kind_at(&self, index: usize) -> &'static BackendKind {
        self.kinds.get(index).copied().unwrap_or_else(|| {
            self.kinds.last().copied().expect("variadic pattern is never empty")
        })
    }

    fn matches(&self, actual: &[&'static BackendKind]) -> bool {
        if self.variadic {
            if actual.len() < self.kinds.len() {
                return false;
            }
        } else if actual.len() != self.kinds.len() {
            return false;
        }
        actual.iter().enumerate().all(|(i, kind)| kind.is_a(self.kind_at(i)))
    }

    /// Summed hierarchy depth over the matched operands: deeper patterns are
    /// more specific.
    fn specificity(&self, operand_count: usize) -> usize {
        (0..operand_count).map(|i| self.kind_at(i).depth()).sum()
    }
}

type RuleFn = Arc<dyn Fn(&Expr, &[Evaluated]) -> Result<Evaluated> + Send + Sync>;

/// One registered compute rule: a backend-native implementation of one
/// operation kind for one backend-kind pattern.
#[derive(Clone)]
pub struct Rule {
    name: String,
    pattern: Pattern,
    f: RuleFn,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl Rule {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn invoke(&self, expr: &Expr, operands: &[Evaluated]) -> Result<Evaluated> {
        (self.f)(expr, operands)
    }
}

/// The dispatch table mapping (operation kind, backend kinds) to compute
/// rules. Built once at process startup by backend registration functions,
/// then read-only; resolution takes `&self` and is safe to run from many
/// threads concurrently.
pub struct DispatchRegistry {
    rules: IndexMap<OpKind, Vec<Rule>>,
    rewrites: Vec<Arc<dyn RewriteRule>>,
}

impl Default for DispatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchRegistry {
    /// An empty registry with only the neutral literal rule installed.
    pub fn new() -> Self {
        let mut registry =
            Self { rules: IndexMap::new(), rewrites: Vec::new() };
        registry.register(OpKind::Literal, Pattern::exact(&[]), "core::literal", |expr, _| {
            match expr.kind() {
                ExprKind::Literal { value } => Ok(ScalarValue::evaluated(value.clone())),
                _ => Err(diagnostic::rule_mismatch("core::literal", "a literal node")),
            }
        });
        registry
    }

    pub fn register<F>(&mut self, op: OpKind, pattern: Pattern, name: &str, f: F)
    where
        F: Fn(&Expr, &[Evaluated]) -> Result<Evaluated> + Send + Sync + 'static,
    {
        trace!(op = %op, rule = name, "register dispatch rule");
        self.rules.entry(op).or_default().push(Rule {
            name: name.to_string(),
            pattern,
            f: Arc::new(f),
        });
    }

    pub fn add_rewrite(&mut self, rewrite: impl RewriteRule + 'static) {
        self.rewrites.push(Arc::new(rewrite));
    }

    pub(crate) fn rewrites(&self) -> &[Arc<dyn RewriteRule>] {
        &self.rewrites
    }

    /// Resolves the most specific rule for the operation over the operands'
    /// actual backend kinds. A unique specificity maximum wins; a tie is an
    /// AmbiguousDispatch registration bug, surfaced instead of ordered away.
    pub fn resolve(&self, op: OpKind, kinds: &[&'static BackendKind]) -> Result<&Rule> {
        let candidates = self
            .rules
            .get(&op)
            .into_iter()
            .flatten()
            .filter(|rule| rule.pattern.matches(kinds));

        let mut best: Option<(&Rule, usize)> = None;
        let mut tied: Option<&Rule> = None;
        for rule in candidates {
            let specificity = rule.pattern.specificity(kinds.len());
            match &best {
                Some((_, top)) if *top > specificity => {}
                Some((_, top)) if *top == specificity => tied = Some(rule),
                _ => {
                    best = Some((rule, specificity));
                    tied = None;
                }
            }
        }

        match (best, tied) {
            (Some((rule, _)), None) => {
                trace!(op = %op, rule = rule.name(), "resolved dispatch rule");
                Ok(rule)
            }
            (Some((rule, _)), Some(other)) => {
                Err(diagnostic::ambiguous_dispatch(op, kinds, rule.name(), other.name()))
            }
            (None, _) => Err(diagnostic::not_implemented(op, kinds)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{ANY, ROWS, SCALAR};
    use crate::value::ScalarValue;
    use refract_core::Value;

    static LEFT: BackendKind = BackendKind { name: "left", parent: Some(&ROWS) };
    static RIGHT: BackendKind = BackendKind { name: "right", parent: Some(&ROWS) };

    fn noop(tag: i32) -> impl Fn(&Expr, &[Evaluated]) -> Result<Evaluated> {
        move |_, _| Ok(ScalarValue::evaluated(Value::Int4(tag)))
    }

    fn run(registry: &DispatchRegistry, kinds: &[&'static BackendKind]) -> Result<String> {
        registry.resolve(OpKind::Filter, kinds).map(|rule| rule.name().to_string())
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Filter, Pattern::exact(&[&ROWS, &ROWS]), "rows", noop(0));

        for _ in 0..3 {
            assert_eq!(run(&registry, &[&LEFT, &LEFT]).unwrap(), "rows");
        }
    }

    #[test]
    fn test_more_specific_rule_wins_regardless_of_order() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Filter, Pattern::exact(&[&ANY, &ANY]), "generic", noop(0));
        registry.register(OpKind::Filter, Pattern::exact(&[&LEFT, &LEFT]), "narrow", noop(1));

        assert_eq!(run(&registry, &[&LEFT, &LEFT]).unwrap(), "narrow");
        assert_eq!(run(&registry, &[&RIGHT, &RIGHT]).unwrap(), "generic");
    }

    #[test]
    fn test_equal_specificity_is_ambiguous() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Filter, Pattern::exact(&[&LEFT, &ROWS]), "a", noop(0));
        registry.register(OpKind::Filter, Pattern::exact(&[&ROWS, &LEFT]), "b", noop(1));

        let err = run(&registry, &[&LEFT, &LEFT]).unwrap_err();
        assert_eq!(err.code(), "DI_002");
    }

    #[test]
    fn test_duplicate_registration_is_ambiguous() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Filter, Pattern::exact(&[&ROWS, &ROWS]), "a", noop(0));
        registry.register(OpKind::Filter, Pattern::exact(&[&ROWS, &ROWS]), "b", noop(1));

        assert_eq!(run(&registry, &[&ROWS, &ROWS]).unwrap_err().code(), "DI_002");
    }

    #[test]
    fn test_no_match_is_not_implemented() {
        let registry = DispatchRegistry::new();
        let err = run(&registry, &[&LEFT, &LEFT]).unwrap_err();
        assert_eq!(err.code(), "DI_001");
        assert!(err.to_string().contains("filter"));
        assert!(err.to_string().contains("left"));
    }

    #[test]
    fn test_mixed_backend_pattern() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Filter, Pattern::exact(&[&LEFT, &RIGHT]), "cross", noop(0));

        assert_eq!(run(&registry, &[&LEFT, &RIGHT]).unwrap(), "cross");
        assert_eq!(run(&registry, &[&RIGHT, &LEFT]).unwrap_err().code(), "DI_001");
    }

    #[test]
    fn test_variadic_pattern() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Merge, Pattern::variadic(&[&SCALAR]), "merge", noop(0));

        assert!(registry.resolve(OpKind::Merge, &[&SCALAR, &SCALAR, &SCALAR]).is_ok());
        assert!(registry.resolve(OpKind::Merge, &[&SCALAR, &ROWS]).is_err());
    }

    #[test]
    fn test_arity_must_match() {
        let mut registry = DispatchRegistry::new();
        registry.register(OpKind::Filter, Pattern::exact(&[&ROWS, &ROWS]), "rows", noop(0));

        assert_eq!(run(&registry, &[&ROWS]).unwrap_err().code(), "DI_001");
    }
}
