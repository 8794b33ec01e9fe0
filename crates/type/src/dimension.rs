// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// One dimension descriptor of a data shape.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimension {
    /// A dimension with a statically known size.
    Fixed(usize),
    /// A dimension whose size is only known at evaluation time.
    Var,
    /// A dimension over data that arrives incrementally and may be unbounded.
    Stream,
}

impl Dimension {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Dimension::Fixed(_))
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Dimension::Fixed(size) => write!(f, "{}", size),
            Dimension::Var => f.write_str("var"),
            Dimension::Stream => f.write_str("stream"),
        }
    }
}
