//! Optional report sections.
//!
//! A statistical sub-report is either computed, skipped because there were
//! too few samples, or abandoned because a numeric routine failed. The last
//! two serialize as an empty mapping (`{}`) so downstream JSON consumers see
//! the same shape regardless of why a section is missing.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Section<T> {
    /// Statistic computed over enough samples
    Computed(T),
    /// Not enough samples for this statistic
    Insufficient { required: usize, available: usize },
    /// A numeric routine failed while computing the statistic
    Failed { reason: String },
}

impl<T> Section<T> {
    /// Returns `Insufficient` when `available < required`, otherwise runs `compute`.
    pub fn require(required: usize, available: usize, compute: impl FnOnce() -> T) -> Self {
        if available < required {
            tracing::debug!(required, available, "insufficient samples, section skipped");
            Section::Insufficient {
                required,
                available,
            }
        } else {
            Section::Computed(compute())
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, Section::Computed(_))
    }

    /// Borrows the computed value, if any.
    pub fn computed(&self) -> Option<&T> {
        match self {
            Section::Computed(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_computed(self) -> Option<T> {
        match self {
            Section::Computed(value) => Some(value),
            _ => None,
        }
    }
}

impl<T: Serialize> Serialize for Section<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Section::Computed(value) => value.serialize(serializer),
            _ => serializer.serialize_map(Some(0))?.end(),
        }
    }
}
