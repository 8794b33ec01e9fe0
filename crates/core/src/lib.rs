// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

pub use diagnostic::Diagnostic;
pub use error::{Error, Result};
pub use ordered_float::{OrderedF32, OrderedF64};
pub use relation::{Relation, Row, Schema};
pub use sort::{SortDirection, SortKey};
pub use value::{Type, Value};

mod diagnostic;
mod error;
mod ordered_float;
mod relation;
mod sort;
mod value;
