//! Data source contract consumed by the pageables.
//!
//! An adapter is the only component that talks to physical storage. It
//! returns items as `(key, item)` pairs where the key is the item's natural
//! identity in the data source.

mod query;

use async_trait::async_trait;

pub use query::{KeysetQuery, OffsetQuery};

use crate::Result;

/// Data source that can fetch slices relative to a keyset boundary.
///
/// # Contract
///
/// Let the effective order be [`KeysetQuery::effective_sort`]: the declared
/// sort for `Lower` queries and the reversed sort for `Upper` queries, with
/// ties in exactly the reverse of their forward order. `fetch` returns, in
/// effective order, the items at or beyond the boundary (every item when the
/// boundary is absent), skips the first `offset_from_boundary` of them and
/// returns at most `limit`.
///
/// For SQL this is `WHERE (cols) >= (:boundary) ORDER BY cols OFFSET :offset
/// LIMIT :limit`, with the comparison and order flipped for `Upper`.
#[async_trait]
pub trait KeysetAdapter: Send + Sync {
    /// Natural identity of an item.
    type Key: Send + Sync;
    /// Item type.
    type Item: Send + Sync;

    /// Fetches one slice of items.
    ///
    /// Failures must be reported with [`Error::adapter`](crate::Error::adapter).
    async fn fetch(&self, query: &KeysetQuery) -> Result<Vec<(Self::Key, Self::Item)>>;

    /// Counts all items, or returns `None` if the count is unavailable.
    ///
    /// When the total exceeds `cap` the adapter may return `None` instead of
    /// paying for an exact count.
    async fn count(&self, cap: Option<u64>) -> Result<Option<u64>> {
        let _ = cap;
        Ok(None)
    }
}

/// Data source that can only fetch slices by position.
#[async_trait]
pub trait OffsetAdapter: Send + Sync {
    /// Natural identity of an item.
    type Key: Send + Sync;
    /// Item type.
    type Item: Send + Sync;

    /// Fetches at most `query.limit` items starting at `query.offset`.
    async fn fetch(&self, query: &OffsetQuery) -> Result<Vec<(Self::Key, Self::Item)>>;

    /// Counts all items, or returns `None` if the count is unavailable.
    ///
    /// When the total exceeds `cap` the adapter may return `None` instead of
    /// paying for an exact count.
    async fn count(&self, cap: Option<u64>) -> Result<Option<u64>> {
        let _ = cap;
        Ok(None)
    }
}
