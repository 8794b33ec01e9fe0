// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// Tag identifying which concrete execution engine a value belongs to.
/// Kinds form a capability hierarchy via the parent link; dispatch patterns
/// registered on an ancestor match every descendant, and a deeper kind is a
/// more specific match.
///
/// Backends declare their own tags as statics with a parent link, which is
/// the extension mechanism for third-party engines:
///
/// ```
/// use refract_engine::{ANY, BackendKind};
///
/// pub static PARQUET: BackendKind =
///     BackendKind { name: "parquet", parent: Some(&ANY) };
/// ```
#[derive(Debug)]
pub struct BackendKind {
    pub name: &'static str,
    pub parent: Option<&'static BackendKind>,
}

/// Root of the hierarchy; a pattern over `ANY` matches every backend.
pub static ANY: BackendKind = BackendKind { name: "any", parent: None };

/// Neutral scalar results (literals, reductions).
pub static SCALAR: BackendKind = BackendKind { name: "scalar", parent: Some(&ANY) };

/// The neutral record-sequence backend over [`refract_core::Relation`].
pub static ROWS: BackendKind = BackendKind { name: "rows", parent: Some(&ANY) };

impl BackendKind {
    /// Whether this kind equals `ancestor` or sits below it in the hierarchy.
    pub fn is_a(&'static self, ancestor: &'static BackendKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = kind.parent;
        }
        false
    }

    /// Distance from the hierarchy root; the specificity rank in dispatch.
    pub fn depth(&'static self) -> usize {
        let mut depth = 0;
        let mut current = self.parent;
        while let Some(kind) = current {
            depth += 1;
            current = kind.parent;
        }
        depth
    }
}

impl PartialEq for BackendKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other) || self.name == other.name
    }
}

impl Eq for BackendKind {}

impl Hash for BackendKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}
