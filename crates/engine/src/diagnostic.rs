// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::kind::BackendKind;
use refract_core::{Diagnostic, Error};
use refract_expr::OpKind;
use std::fmt::Display;

fn render_kinds(kinds: &[&'static BackendKind]) -> String {
    kinds.iter().map(|k| k.name).collect::<Vec<_>>().join(", ")
}

/// No registered rule covers this (operation, backend kinds) combination.
/// This is the capability-gap signal: recoverable by switching backend or
/// registering a rule.
pub fn not_implemented(op: OpKind, kinds: &[&'static BackendKind]) -> Error {
    Error(
        Diagnostic::new(
            "DI_001",
            format!("operation `{}` is not implemented for backend(s) [{}]", op, render_kinds(kinds)),
        )
        .with_help("register a dispatch rule for this combination or evaluate against another backend"),
    )
}

/// Two rules tie in specificity. A registration bug on the backend author's
/// side; the registry never silently picks one.
pub fn ambiguous_dispatch(
    op: OpKind,
    kinds: &[&'static BackendKind],
    left: &str,
    right: &str,
) -> Error {
    Error(
        Diagnostic::new(
            "DI_002",
            format!("ambiguous dispatch for `{}` over [{}]", op, render_kinds(kinds)),
        )
        .with_note(format!("candidate: {}", left))
        .with_note(format!("candidate: {}", right))
        .with_help("make one rule's backend pattern strictly more specific"),
    )
}

pub fn unbound_symbol(name: &str) -> Error {
    Error(
        Diagnostic::new("EV_001", format!("symbol `{}` is not bound in the scope", name))
            .with_help("bind the symbol to a backend value before evaluating"),
    )
}

/// A rewrite changed the graph's shape; rewrites must be shape preserving.
pub fn rewrite_changed_shape(rule: &str, before: impl Display, after: impl Display) -> Error {
    Error(
        Diagnostic::new(
            "EV_002",
            format!("rewrite `{}` changed the expression shape", rule),
        )
        .with_note(format!("before: {}", before))
        .with_note(format!("after: {}", after)),
    )
}

/// A dispatch rule was invoked with operands it cannot handle; only
/// reachable through a faulty registration.
pub fn rule_mismatch(rule: &str, expected: &str) -> Error {
    Error(
        Diagnostic::new(
            "EV_003",
            format!("rule `{}` received an operand it cannot handle", rule),
        )
        .with_note(format!("expected: {}", expected)),
    )
}
