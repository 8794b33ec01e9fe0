// Copyright (c) refract-ql 2025
// This file is licensed under the Apache-2.0, see license.md file

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

macro_rules! ordered_float {
    ($name:ident, $float:ty) => {
        /// Totally ordered, hashable float wrapper. Negative zero is
        /// normalized to zero on construction so hashing and equality agree.
        #[repr(transparent)]
        #[derive(Copy, Clone, Default, Serialize, Deserialize)]
        pub struct $name($float);

        impl $name {
            pub fn new(value: $float) -> Self {
                let normalized = if value == 0.0 { 0.0 } else { value };
                Self(normalized)
            }

            pub fn value(self) -> $float {
                self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.total_cmp(&other.0) == Ordering::Equal
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                // NaN payloads collapse to one canonical bit pattern.
                let bits = if self.0.is_nan() {
                    <$float>::NAN.to_bits()
                } else {
                    self.0.to_bits()
                };
                bits.hash(state);
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<$float> for $name {
            fn from(value: $float) -> Self {
                Self::new(value)
            }
        }

        impl From<$name> for $float {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

ordered_float!(OrderedF32, f32);
ordered_float!(OrderedF64, f64);
