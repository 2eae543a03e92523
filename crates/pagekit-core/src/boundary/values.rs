//! Ordered boundary tuples.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BoundaryValue, SortSpec};
use crate::{Error, Result};

/// Ordered mapping of sort-property name to value.
///
/// The order of entries is significant and must match the sort specification
/// the boundary is used with; see [`validate_against`](Self::validate_against).
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryValues {
    entries: Vec<(String, BoundaryValue)>,
}

impl BoundaryValues {
    /// Creates an empty boundary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<BoundaryValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Appends an entry.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<BoundaryValue>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&BoundaryValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BoundaryValue)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over property names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over values in order.
    pub fn values(&self) -> impl Iterator<Item = &BoundaryValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the boundary holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that the boundary names exactly the fields of `sort`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BoundaryMismatch`] on any difference in name or order.
    pub fn validate_against(&self, sort: &SortSpec) -> Result<()> {
        if self.names().eq(sort.names()) {
            return Ok(());
        }

        Err(Error::BoundaryMismatch {
            expected: sort.names().collect::<Vec<_>>().join(", "),
            found: self.names().collect::<Vec<_>>().join(", "),
        })
    }
}

impl BoundaryValues {
    /// Checks that every value has the variant of its counterpart in `found`,
    /// a boundary read from the data set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedToken`] naming the first mismatching value.
    pub fn validate_types(&self, found: &BoundaryValues) -> Result<()> {
        for ((name, value), other) in self.iter().zip(found.values()) {
            if value.type_name() != other.type_name() {
                return Err(Error::malformed(format!(
                    "boundary value `{name}` is a {}, the data set holds a {}",
                    value.type_name(),
                    other.type_name()
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, BoundaryValue)> for BoundaryValues {
    fn from_iter<I: IntoIterator<Item = (String, BoundaryValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for BoundaryValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}
