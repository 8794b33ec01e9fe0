// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

pub use kind::{BinaryOp, ExprKind, MapFunc, OpKind, UnaryOp};
pub use node::{Expr, ExprNode};
pub use refract_type::rules::ReduceOp;

pub mod diagnostic;

mod display;
mod kind;
mod node;
mod subs;

pub use refract_core::{Error, Result};
