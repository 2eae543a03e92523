//! Sort specifications.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::BoundaryValues;
use crate::{Error, Result};

/// Direction of a single sort field.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

impl SortDirection {
    /// Returns the opposite direction.
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    /// Applies this direction to an ascending comparison result.
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// A named property and the direction it is sorted in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    /// Property name, possibly a dotted path.
    pub name: String,
    /// Sort direction.
    pub direction: SortDirection,
}

impl SortField {
    /// Creates an ascending sort field.
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Creates a descending sort field.
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.direction)
    }
}

/// Non-empty, ordered list of sort fields.
///
/// The sort specification defines the keyset order. For the order to be
/// total it should end with a unique property (a primary key, for example);
/// runs of identical values are still paged correctly through the boundary
/// offset, but reversing direction inside a run longer than a page costs
/// extra fetches to measure the run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<SortField>", into = "Vec<SortField>")]
pub struct SortSpec {
    fields: Vec<SortField>,
}

impl SortSpec {
    /// Creates a sort specification from the given fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `fields` is empty or names a property twice.
    pub fn new(fields: impl IntoIterator<Item = SortField>) -> Result<Self> {
        let fields: Vec<SortField> = fields.into_iter().collect();
        if fields.is_empty() {
            return Err(Error::config("sort specification must contain at least one field"));
        }

        for (index, field) in fields.iter().enumerate() {
            if fields[..index].iter().any(|other| other.name == field.name) {
                return Err(Error::config(format!(
                    "sort specification names `{}` more than once",
                    field.name
                )));
            }
        }

        Ok(Self { fields })
    }

    /// Creates a single-field ascending specification.
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            fields: vec![SortField::asc(name)],
        }
    }

    /// Creates a single-field descending specification.
    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            fields: vec![SortField::desc(name)],
        }
    }

    /// Appends an ascending tiebreaker field.
    ///
    /// A field that is already present is left unchanged.
    pub fn then_asc(self, name: impl Into<String>) -> Self {
        self.then(SortField::asc(name))
    }

    /// Appends a descending tiebreaker field.
    ///
    /// A field that is already present is left unchanged.
    pub fn then_desc(self, name: impl Into<String>) -> Self {
        self.then(SortField::desc(name))
    }

    fn then(mut self, field: SortField) -> Self {
        if !self.fields.iter().any(|other| other.name == field.name) {
            self.fields.push(field);
        }
        self
    }

    /// Returns the fields in order.
    pub fn fields(&self) -> &[SortField] {
        &self.fields
    }

    /// Returns the property names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Always `false`; kept for symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the specification with every direction flipped.
    pub fn reversed(&self) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .map(|field| SortField {
                    name: field.name.clone(),
                    direction: field.direction.reversed(),
                })
                .collect(),
        }
    }

    /// Compares two boundary tuples under this specification.
    ///
    /// Values are compared positionally. Both tuples are expected to have
    /// been validated against this specification.
    pub fn compare(&self, a: &BoundaryValues, b: &BoundaryValues) -> Ordering {
        self.fields
            .iter()
            .zip(a.values().zip(b.values()))
            .map(|(field, (x, y))| field.direction.apply(x.total_cmp(y)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

impl TryFrom<Vec<SortField>> for SortSpec {
    type Error = Error;

    fn try_from(fields: Vec<SortField>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<SortSpec> for Vec<SortField> {
    fn from(spec: SortSpec) -> Self {
        spec.fields
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, field) in self.fields.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{field}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(v: i64, k: i64) -> BoundaryValues {
        BoundaryValues::new().with("v", v).with("k", k)
    }

    #[test]
    fn test_empty_spec_is_rejected() {
        let error = SortSpec::new(Vec::new()).unwrap_err();
        assert!(error.is_configuration_error());
    }

    #[test]
    fn test_duplicate_field_is_rejected() {
        let result = SortSpec::new([SortField::asc("id"), SortField::desc("id")]);
        assert!(result.is_err());
    }

    #[test]
    fn test_compare_respects_directions() {
        let spec = SortSpec::asc("v").then_desc("k");
        assert_eq!(spec.compare(&values(1, 0), &values(2, 0)), Ordering::Less);
        assert_eq!(spec.compare(&values(1, 1), &values(1, 2)), Ordering::Greater);
        assert_eq!(spec.compare(&values(1, 1), &values(1, 1)), Ordering::Equal);
    }

    #[test]
    fn test_reversed_flips_every_field() {
        let spec = SortSpec::asc("v").then_desc("k");
        let reversed = spec.reversed();
        assert_eq!(reversed.fields()[0].direction, SortDirection::Desc);
        assert_eq!(reversed.fields()[1].direction, SortDirection::Asc);
        assert_eq!(reversed.reversed(), spec);
        assert_eq!(
            reversed.compare(&values(1, 0), &values(2, 0)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_display() {
        let spec = SortSpec::desc("created_at").then_asc("id");
        assert_eq!(spec.to_string(), "created_at desc, id asc");
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<SortSpec>("[]").is_err());
        let spec: SortSpec =
            serde_json::from_str(r#"[{"name":"id","direction":"desc"}]"#).unwrap();
        assert_eq!(spec, SortSpec::desc("id"));
    }
}
