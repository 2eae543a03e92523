//! Paging sessions over an adapter.
//!
//! A pageable owns no items. It binds an adapter to a page size, an optional
//! page limit and a count strategy, and turns page identifiers into
//! [`Page`]s. Pageables hold no mutable paging state, so one instance can
//! serve many concurrent callers fetching different pages.

mod config;
mod count;
mod keyset;
mod offset;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use config::{DEFAULT_ITEMS_PER_PAGE, PageableConfig};
pub use count::{CountProvider, CountStrategy};
pub(crate) use count::{Count, Counter, page_count};
pub use keyset::KeysetPageable;
pub use offset::OffsetPageable;

use crate::identifier::{PageIdentifier, PageIdentifierKind};
use crate::{Page, Result};

/// Summary of a pageable, carried by out-of-bounds errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageableDescriptor {
    /// Paging strategy.
    pub strategy: PageIdentifierKind,
    /// Number of items per page.
    pub items_per_page: usize,
    /// Configured page limit, if any.
    pub page_limit: Option<u64>,
}

impl fmt::Display for PageableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pageable ({} per page",
            self.strategy, self.items_per_page
        )?;
        if let Some(limit) = self.page_limit {
            write!(f, ", at most {limit} pages")?;
        }
        f.write_str(")")
    }
}

/// A paging session over one data source.
#[async_trait]
pub trait Pageable: Send + Sync {
    /// Natural identity of an item.
    type Key: Send + Sync;
    /// Item type.
    type Item: Send + Sync;

    /// Returns the identifier kind this pageable accepts and produces.
    fn identifier_kind(&self) -> PageIdentifierKind;

    /// Returns the number of items per page.
    fn items_per_page(&self) -> usize;

    /// Returns the configured page limit, if any.
    fn page_limit(&self) -> Option<u64>;

    /// Returns a summary of this pageable.
    fn descriptor(&self) -> PageableDescriptor {
        PageableDescriptor {
            strategy: self.identifier_kind(),
            items_per_page: self.items_per_page(),
            page_limit: self.page_limit(),
        }
    }

    /// Returns a copy of this pageable with a different page size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if `items_per_page` is zero.
    fn with_items_per_page(&self, items_per_page: usize) -> Result<Self>
    where
        Self: Sized;

    /// Fetches the first page.
    async fn first_page(&self) -> Result<Page<Self::Key, Self::Item>>;

    /// Fetches the last page, or `None` if it cannot be located.
    async fn last_page(&self) -> Result<Option<Page<Self::Key, Self::Item>>>;

    /// Fetches the page described by `identifier`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnsupportedPageIdentifier`](crate::Error::UnsupportedPageIdentifier)
    ///   if the identifier is of another kind.
    /// - [`Error::PageOutOfBounds`](crate::Error::PageOutOfBounds) or
    ///   [`Error::LimitExceeded`](crate::Error::LimitExceeded) if it points
    ///   outside the data set or the page limit.
    async fn page_for(&self, identifier: &PageIdentifier) -> Result<Page<Self::Key, Self::Item>>;

    /// Fetches the page following `page`, if any.
    async fn next_page(
        &self,
        page: &Page<Self::Key, Self::Item>,
    ) -> Result<Option<Page<Self::Key, Self::Item>>> {
        match page.next_identifier() {
            Some(identifier) => self.page_for(identifier).await.map(Some),
            None => Ok(None),
        }
    }

    /// Fetches the page preceding `page`, if any.
    async fn previous_page(
        &self,
        page: &Page<Self::Key, Self::Item>,
    ) -> Result<Option<Page<Self::Key, Self::Item>>> {
        match page.previous_identifier() {
            Some(identifier) => self.page_for(identifier).await.map(Some),
            None => Ok(None),
        }
    }

    /// Returns the total number of items, when known.
    async fn total_items(&self) -> Result<Option<u64>>;

    /// Returns the total number of pages, when the total is known.
    ///
    /// Never zero: an empty data set has one (empty) page.
    async fn total_pages(&self) -> Result<Option<u64>> {
        let total = self.total_items().await?;
        Ok(total.map(|total| page_count(total, self.items_per_page())))
    }

    /// Returns whether the items span more than one page, when known.
    ///
    /// This is the only question [`CountStrategy::HasMore`] answers; the
    /// other strategies derive it from the total.
    async fn has_multiple_pages(&self) -> Result<Option<bool>> {
        let pages = self.total_pages().await?;
        Ok(pages.map(|pages| pages > 1))
    }
}
