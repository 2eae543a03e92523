//! Offset (page number) pageable.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Count, Counter, CountStrategy, Pageable, PageableConfig};
use crate::adapter::{OffsetAdapter, OffsetQuery};
use crate::identifier::{OffsetPageIdentifier, PageIdentifier, PageIdentifierKind};
use crate::{Error, Page, Result, TRACING_TARGET_PAGEABLE};

/// Pageable over data sources that only understand positions.
///
/// Page `n` starts at item `(n - 1) * items_per_page`. Like the keyset
/// pageable, every fetch asks for one extra item to learn whether a next
/// page exists, so a data set whose size is a multiple of the page size
/// never produces a trailing empty page.
pub struct OffsetPageable<A> {
    adapter: Arc<A>,
    config: PageableConfig,
    counter: Counter,
}

impl<A: OffsetAdapter> OffsetPageable<A> {
    /// Creates a pageable with the default configuration and no counting.
    pub fn new(adapter: A) -> Self {
        Self::from_shared(Arc::new(adapter))
    }

    /// Creates a pageable over a shared adapter.
    pub fn from_shared(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            config: PageableConfig::default(),
            counter: Counter::new(CountStrategy::Disabled),
        }
    }

    /// Applies a page size and page limit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid.
    pub fn with_config(mut self, config: PageableConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        self.counter = self.counter.fresh();
        Ok(self)
    }

    /// Sets how the total item count is obtained.
    pub fn with_count(mut self, strategy: impl Into<CountStrategy>) -> Self {
        self.counter = Counter::new(strategy.into());
        self
    }

    /// Returns the underlying adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    async fn count(&self) -> Result<Count> {
        let items_per_page = self.config.items_per_page;
        let lookahead = || async move {
            let query = OffsetQuery {
                offset: 0,
                limit: items_per_page.saturating_add(1),
            };
            let items = self.adapter.fetch(&query).await?;
            Ok::<_, Error>(items.len() > items_per_page)
        };

        self.counter
            .resolve(
                self.config.count_cap(),
                items_per_page,
                |cap| self.adapter.count(cap),
                lookahead,
            )
            .await
    }

    async fn offset_page(
        &self,
        identifier: OffsetPageIdentifier,
    ) -> Result<Page<A::Key, A::Item>> {
        let page_number = identifier.page_number();
        if let Some(limit) = self.config.page_limit
            && page_number > limit
        {
            return Err(Error::LimitExceeded {
                pageable: self.descriptor(),
                identifier: identifier.into(),
                limit,
            });
        }

        let items_per_page = self.config.items_per_page;
        let query = OffsetQuery {
            offset: identifier.offset(items_per_page),
            limit: items_per_page.saturating_add(1),
        };

        let mut items = self.adapter.fetch(&query).await?;
        items.truncate(query.limit);

        tracing::debug!(
            target: TRACING_TARGET_PAGEABLE,
            strategy = %PageIdentifierKind::Offset,
            page_number,
            offset = query.offset,
            limit = items_per_page,
            fetched = items.len(),
            "fetched offset slice"
        );

        if items.is_empty() && page_number > 1 {
            return Err(Error::PageOutOfBounds {
                pageable: self.descriptor(),
                identifier: identifier.into(),
            });
        }

        let has_more = items.len() > items_per_page;
        items.truncate(items_per_page);

        let within_limit = self
            .config
            .page_limit
            .is_none_or(|limit| page_number < limit);
        // The total only matters when the lookahead says more items exist.
        let next = if has_more && within_limit {
            let shown = page_number.saturating_mul(items_per_page as u64);
            let total = self.total_items().await?;
            total.is_none_or(|total| shown < total).then(|| identifier.next())
        } else {
            None
        };
        let previous = identifier.previous();

        Ok(Page::new(
            identifier.into(),
            items,
            items_per_page,
            next.map(Into::into),
            previous.map(Into::into),
        ))
    }
}

#[async_trait]
impl<A: OffsetAdapter> Pageable for OffsetPageable<A> {
    type Item = A::Item;
    type Key = A::Key;

    fn identifier_kind(&self) -> PageIdentifierKind {
        PageIdentifierKind::Offset
    }

    fn items_per_page(&self) -> usize {
        self.config.items_per_page
    }

    fn page_limit(&self) -> Option<u64> {
        self.config.page_limit
    }

    fn with_items_per_page(&self, items_per_page: usize) -> Result<Self> {
        let config = PageableConfig {
            items_per_page,
            ..self.config.clone()
        };
        self.clone().with_config(config)
    }

    async fn first_page(&self) -> Result<Page<A::Key, A::Item>> {
        self.offset_page(OffsetPageIdentifier::first()).await
    }

    async fn last_page(&self) -> Result<Option<Page<A::Key, A::Item>>> {
        let Some(total_pages) = self.total_pages().await? else {
            return Ok(None);
        };

        let page_number = self
            .config
            .page_limit
            .map_or(total_pages, |limit| total_pages.min(limit));
        let identifier = OffsetPageIdentifier::new(page_number)?;
        self.offset_page(identifier).await.map(Some)
    }

    async fn page_for(&self, identifier: &PageIdentifier) -> Result<Page<A::Key, A::Item>> {
        match identifier {
            PageIdentifier::Offset(identifier) => self.offset_page(*identifier).await,
            other => Err(Error::UnsupportedPageIdentifier { kind: other.kind() }),
        }
    }

    async fn total_items(&self) -> Result<Option<u64>> {
        Ok(self.count().await?.total)
    }

    async fn has_multiple_pages(&self) -> Result<Option<bool>> {
        Ok(self.count().await?.multiple_pages)
    }
}

impl<A> Clone for OffsetPageable<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            config: self.config.clone(),
            counter: self.counter.clone(),
        }
    }
}

impl<A> fmt::Debug for OffsetPageable<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffsetPageable")
            .field("config", &self.config)
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}
