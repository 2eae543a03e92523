//! Boundary model: sort specifications and the sort-key values that mark the
//! edge of a keyset page.

mod extractor;
mod sort;
mod value;
mod values;

pub use extractor::{BoundaryExtractor, FnExtractor, JsonBoundaryExtractor};
pub use sort::{SortDirection, SortField, SortSpec};
pub use value::BoundaryValue;
pub use values::BoundaryValues;
