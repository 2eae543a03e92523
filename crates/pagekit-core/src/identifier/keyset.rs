//! Keyset page identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::boundary::BoundaryValues;

/// Side of the boundary a keyset page is fetched from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryType {
    /// Items at or after the boundary, in sort order (paging forward).
    #[default]
    #[serde(rename = "l")]
    Lower,
    /// Items at or before the boundary, in reverse sort order (paging backward).
    #[serde(rename = "u")]
    Upper,
}

impl BoundaryType {
    /// Returns the opposite boundary type.
    pub const fn reversed(self) -> Self {
        match self {
            Self::Lower => Self::Upper,
            Self::Upper => Self::Lower,
        }
    }
}

/// Identifier of a keyset page.
///
/// The page consists of the items at or beyond `boundary` (in the direction
/// given by `boundary_type`), skipping the first `offset_from_boundary` of
/// them, at most `limit` items. The offset accounts for items that share the
/// boundary's sort-key values and were already shown on an adjacent page.
///
/// Without a boundary the identifier denotes the start (`Lower`) or the end
/// (`Upper`) of the data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeysetPageIdentifier {
    /// Sort-key values of the edge item, matching the sort specification.
    #[serde(rename = "b", default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<BoundaryValues>,
    /// Direction to fetch in, relative to the boundary.
    #[serde(rename = "t", default)]
    pub boundary_type: BoundaryType,
    /// Number of items at the boundary to skip.
    #[serde(rename = "o", default, skip_serializing_if = "is_zero")]
    pub offset_from_boundary: u64,
    /// Maximum number of items on the page.
    #[serde(rename = "l")]
    pub limit: usize,
    /// Advisory 1-based page number, for display only.
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u64>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl KeysetPageIdentifier {
    /// Identifier of the first page.
    pub const fn first(limit: usize) -> Self {
        Self {
            boundary: None,
            boundary_type: BoundaryType::Lower,
            offset_from_boundary: 0,
            limit,
            page_number: Some(1),
        }
    }

    /// Identifier of the last page.
    pub const fn last(limit: usize) -> Self {
        Self {
            boundary: None,
            boundary_type: BoundaryType::Upper,
            offset_from_boundary: 0,
            limit,
            page_number: None,
        }
    }

    /// Identifier of the page at or after `boundary`.
    pub const fn lower(boundary: BoundaryValues, offset_from_boundary: u64, limit: usize) -> Self {
        Self {
            boundary: Some(boundary),
            boundary_type: BoundaryType::Lower,
            offset_from_boundary,
            limit,
            page_number: None,
        }
    }

    /// Identifier of the page at or before `boundary`.
    pub const fn upper(boundary: BoundaryValues, offset_from_boundary: u64, limit: usize) -> Self {
        Self {
            boundary: Some(boundary),
            boundary_type: BoundaryType::Upper,
            offset_from_boundary,
            limit,
            page_number: None,
        }
    }

    /// Sets the advisory page number.
    pub fn with_page_number(mut self, page_number: Option<u64>) -> Self {
        self.page_number = page_number;
        self
    }

    /// Returns `true` if this identifier denotes the start of the data set.
    pub fn is_first(&self) -> bool {
        self.boundary.is_none()
            && self.boundary_type == BoundaryType::Lower
            && self.offset_from_boundary == 0
    }
}

impl fmt::Display for KeysetPageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("keyset page ")?;
        match &self.boundary {
            Some(boundary) => write!(f, "{} [{boundary}]", self.boundary_type)?,
            None if self.boundary_type == BoundaryType::Lower => f.write_str("at start")?,
            None => f.write_str("at end")?,
        }
        if self.offset_from_boundary > 0 {
            write!(f, " +{}", self.offset_from_boundary)?;
        }
        write!(f, " limit {}", self.limit)
    }
}
