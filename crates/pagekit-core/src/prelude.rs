//! Convenient re-exports for common use.

pub use crate::adapter::{KeysetAdapter, KeysetQuery, OffsetAdapter, OffsetQuery};
pub use crate::boundary::{
    BoundaryExtractor, BoundaryValue, BoundaryValues, SortDirection, SortField, SortSpec,
};
pub use crate::codec::{EncoderRegistry, PageIdentifierEncoder};
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::identifier::{BoundaryType, PageIdentifier, PageIdentifierKind};
pub use crate::page::Page;
pub use crate::pageable::{CountStrategy, KeysetPageable, OffsetPageable, Pageable};
