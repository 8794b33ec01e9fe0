// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::kind::OpKind;
use refract_core::{Diagnostic, Error};

pub fn arity_mismatch(op: OpKind, expected: usize, actual: usize) -> Error {
    Error(
        Diagnostic::new(
            "EX_001",
            format!("operation `{}` expects {} operand(s), got {}", op, expected, actual),
        )
        .with_help("rebuild the node with the documented operand count"),
    )
}
