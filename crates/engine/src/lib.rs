// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

pub use evaluate::{Scope, evaluate};
pub use kind::{ANY, BackendKind, ROWS, SCALAR};
pub use registry::{DispatchRegistry, Pattern, Rule};
pub use rewrite::{ProjectionFilterPushdown, RewriteRule};
pub use value::{BackendValue, Evaluated, RowsValue, ScalarValue, downcast};

pub mod diagnostic;

mod evaluate;
mod kind;
mod registry;
mod rewrite;
mod value;

pub use refract_core::{Error, Result};
