// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use crate::measure::Measure;
use refract_core::{Diagnostic, Error};
use std::fmt::Display;

pub fn shape_mismatch(context: &str, left: impl Display, right: impl Display) -> Error {
    Error(
        Diagnostic::new("TY_001", format!("shape mismatch in {}", context))
            .with_note(format!("left: {}", left))
            .with_note(format!("right: {}", right))
            .with_help("operand shapes must be compatible under broadcasting and promotion"),
    )
}

pub fn unknown_field(name: &str, record: impl Display) -> Error {
    Error(
        Diagnostic::new("TY_002", format!("unknown field `{}`", name))
            .with_note(format!("record: {}", record))
            .with_help("check the field name against the operand's record measure"),
    )
}

pub fn name_collision(name: &str) -> Error {
    Error(
        Diagnostic::new("TY_003", format!("field name `{}` collides", name))
            .with_help("relabel one side before combining records"),
    )
}

pub fn not_a_record(measure: &Measure) -> Error {
    Error(
        Diagnostic::new("TY_004", format!("expected a record measure, found {}", measure))
            .with_help("this operation applies to tabular operands only"),
    )
}

pub fn not_comparable(left: impl Display, right: impl Display) -> Error {
    Error(
        Diagnostic::new("TY_005", "operand types are not comparable".to_string())
            .with_note(format!("left: {}", left))
            .with_note(format!("right: {}", right)),
    )
}

pub fn not_reducible(context: &str, shape: impl Display) -> Error {
    Error(
        Diagnostic::new("TY_006", format!("cannot reduce {} with {}", shape, context))
            .with_help("reductions need a leading dimension and a compatible measure"),
    )
}
