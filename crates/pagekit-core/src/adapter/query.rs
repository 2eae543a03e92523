use crate::boundary::{BoundaryValues, SortSpec};
use crate::identifier::BoundaryType;

/// Parameters of a keyset fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetQuery {
    /// Boundary tuple, absent for the start or end of the data set.
    pub boundary: Option<BoundaryValues>,
    /// Side of the boundary to fetch.
    pub boundary_type: BoundaryType,
    /// Number of items at or beyond the boundary to skip.
    pub offset_from_boundary: u64,
    /// Maximum number of items to return.
    pub limit: usize,
    /// Declared sort specification of the pageable.
    pub sort: SortSpec,
}

impl KeysetQuery {
    /// Returns the order items must be returned in.
    pub fn effective_sort(&self) -> SortSpec {
        match self.boundary_type {
            BoundaryType::Lower => self.sort.clone(),
            BoundaryType::Upper => self.sort.reversed(),
        }
    }

    /// Returns `true` if the query walks the data set backward.
    pub fn is_backward(&self) -> bool {
        self.boundary_type == BoundaryType::Upper
    }
}

/// Parameters of an offset fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetQuery {
    /// Number of items to skip from the start.
    pub offset: u64,
    /// Maximum number of items to return.
    pub limit: usize,
}
