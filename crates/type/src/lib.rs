// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

pub use dimension::Dimension;
pub use measure::{Field, Measure, Record};
pub use promote::{comparable, promote};
pub use shape::DataShape;

pub mod diagnostic;
pub mod rules;

mod dimension;
mod measure;
mod promote;
mod shape;

pub use refract_core::{Error, Result};
