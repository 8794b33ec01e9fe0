// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use refract_core::{Diagnostic, Error};

/// A statement failed inside SQLite; the driver error rides along as the
/// cause.
pub fn sqlite_error(context: &str, source: rusqlite::Error) -> Error {
    Error(
        Diagnostic::new("SQ_001", format!("sqlite failure during {}", context))
            .with_cause(Diagnostic::new("SQ_000", source.to_string())),
    )
}

pub fn unknown_table(name: &str) -> Error {
    Error(
        Diagnostic::new("SQ_002", format!("table `{}` does not exist in the database", name))
            .with_help("create the table first or check the name"),
    )
}

/// A declared column type outside the INTEGER/REAL/TEXT subset this
/// backend maps.
pub fn unsupported_column_type(column: &str, declared: &str) -> Error {
    Error(
        Diagnostic::new(
            "SQ_003",
            format!("column `{}` has unsupported declared type `{}`", column, declared),
        )
        .with_help("only INTEGER, REAL and TEXT columns are mapped"),
    )
}

/// A result cell came back in a storage class the expected schema type
/// cannot absorb.
pub fn unexpected_storage(column: &str) -> Error {
    Error(Diagnostic::new(
        "SQ_004",
        format!("column `{}` returned a value outside its declared storage class", column),
    ))
}
