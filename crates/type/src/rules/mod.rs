// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

//! Shape rules, one function per operation family. Every rule is pure and
//! structural: it sees only its direct operands' shapes, never the graph.

mod collection;
mod elementwise;
mod record;
mod reduce;

pub use collection::{distinct, filter, slice, sort};
pub use elementwise::{arithmetic, broadcast, comparison, logical, negate, not};
pub use record::{field_access, join, merge, project, relabel};
pub use reduce::{ReduceOp, reduce};
