#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for pageable fetches and identifier derivation.
pub const TRACING_TARGET_PAGEABLE: &str = "pagekit_core::pageable";

/// Tracing target for page identifier encoding and decoding.
pub const TRACING_TARGET_CODEC: &str = "pagekit_core::codec";

mod error;

pub mod adapter;
pub mod boundary;
pub mod codec;
pub mod identifier;
#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;
mod page;
pub mod pageable;

#[doc(hidden)]
pub mod prelude;

pub use adapter::{KeysetAdapter, KeysetQuery, OffsetAdapter, OffsetQuery};
pub use boundary::{
    BoundaryExtractor, BoundaryValue, BoundaryValues, FnExtractor, JsonBoundaryExtractor,
    SortDirection, SortField, SortSpec,
};
pub use codec::{
    EncoderRegistry, KeysetIdentifierEncoder, OffsetIdentifierEncoder, PageIdentifierEncoder,
};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use identifier::{
    BoundaryType, KeysetPageIdentifier, OffsetPageIdentifier, PageIdentifier, PageIdentifierKind,
};
pub use page::Page;
pub use pageable::{
    CountProvider, CountStrategy, KeysetPageable, OffsetPageable, Pageable, PageableConfig,
    PageableDescriptor,
};
