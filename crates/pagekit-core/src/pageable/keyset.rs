//! Keyset (cursor) pageable.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Count, Counter, CountStrategy, Pageable, PageableConfig};
use crate::adapter::{KeysetAdapter, KeysetQuery};
use crate::boundary::{BoundaryExtractor, BoundaryValues, SortSpec};
use crate::identifier::{BoundaryType, KeysetPageIdentifier, PageIdentifier, PageIdentifierKind};
use crate::{Error, Page, Result, TRACING_TARGET_PAGEABLE};

/// Pageable that walks a data source by sort-key boundaries.
///
/// Every fetch asks the adapter for one item more than the page size. The
/// extra item is never returned: on a forward fetch it tells whether a next
/// page exists, on a backward fetch whether a previous one does.
///
/// Boundaries of adjacent pages are taken from the edge items of the current
/// page. When several items share the edge's sort-key values, the identifier
/// carries how many of them were already shown, so ties spanning a page edge
/// are neither dropped nor duplicated.
pub struct KeysetPageable<A, E> {
    adapter: Arc<A>,
    extractor: Arc<E>,
    sort: SortSpec,
    config: PageableConfig,
    counter: Counter,
}

/// Where a single-item read into a run of equal sort keys landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunPosition {
    /// The item shares the run's sort key.
    Inside,
    /// The item lies past the run.
    Past,
    /// There is no item at that position.
    Empty,
}

/// One adapter response split into page items and the extra item.
struct Fetched<K, T> {
    items: Vec<(K, T)>,
    boundaries: Vec<BoundaryValues>,
    extra: Option<BoundaryValues>,
}

impl<A, E> KeysetPageable<A, E>
where
    A: KeysetAdapter,
    E: BoundaryExtractor<A::Item>,
{
    /// Creates a pageable with the default configuration and no counting.
    pub fn new(adapter: A, extractor: E, sort: SortSpec) -> Self {
        Self::from_shared(Arc::new(adapter), Arc::new(extractor), sort)
    }

    /// Creates a pageable over a shared adapter and extractor.
    pub fn from_shared(adapter: Arc<A>, extractor: Arc<E>, sort: SortSpec) -> Self {
        Self {
            adapter,
            extractor,
            sort,
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

    /// Returns the declared sort specification.
    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Returns the underlying adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    fn same(&self, a: &BoundaryValues, b: &BoundaryValues) -> bool {
        self.sort.compare(a, b) == Ordering::Equal
    }

    fn at_boundary(&self, request: &KeysetPageIdentifier, values: &BoundaryValues) -> bool {
        request
            .boundary
            .as_ref()
            .is_some_and(|boundary| self.same(boundary, values))
    }

    /// Number of leading entries equal to the first one.
    fn leading_run(&self, boundaries: &[BoundaryValues]) -> usize {
        boundaries.first().map_or(0, |first| {
            boundaries
                .iter()
                .take_while(|values| self.same(values, first))
                .count()
        })
    }

    /// Number of trailing entries equal to the last one.
    fn trailing_run(&self, boundaries: &[BoundaryValues]) -> usize {
        boundaries.last().map_or(0, |last| {
            boundaries
                .iter()
                .rev()
                .take_while(|values| self.same(values, last))
                .count()
        })
    }

    fn out_of_bounds(&self, request: KeysetPageIdentifier) -> Error {
        Error::PageOutOfBounds {
            pageable: self.descriptor(),
            identifier: request.into(),
        }
    }

    async fn fetch(
        &self,
        request: &KeysetPageIdentifier,
        limit: usize,
    ) -> Result<Fetched<A::Key, A::Item>> {
        let query = KeysetQuery {
            boundary: request.boundary.clone(),
            boundary_type: request.boundary_type,
            offset_from_boundary: request.offset_from_boundary,
            limit: limit.saturating_add(1),
            sort: self.sort.clone(),
        };

        let mut items = self.adapter.fetch(&query).await?;
        items.truncate(query.limit);

        tracing::debug!(
            target: TRACING_TARGET_PAGEABLE,
            strategy = %PageIdentifierKind::Keyset,
            boundary_type = %request.boundary_type,
            has_boundary = request.boundary.is_some(),
            offset = request.offset_from_boundary,
            limit,
            fetched = items.len(),
            "fetched keyset slice"
        );

        let mut boundaries = items
            .iter()
            .map(|(_, item)| self.extractor.extract(item, &self.sort))
            .collect::<Result<Vec<_>>>()?;

        if let (Some(boundary), Some(found)) = (&request.boundary, boundaries.first()) {
            boundary.validate_types(found)?;
        }

        let extra = if items.len() > limit {
            items.truncate(limit);
            boundaries.pop()
        } else {
            None
        };

        Ok(Fetched {
            items,
            boundaries,
            extra,
        })
    }

    /// Reads the item `index` positions into the run of items sharing
    /// `values`, counted from the run's start for `Lower` and from its end
    /// for `Upper`.
    async fn position_in_run(
        &self,
        values: &BoundaryValues,
        boundary_type: BoundaryType,
        index: u64,
    ) -> Result<RunPosition> {
        let query = KeysetQuery {
            boundary: Some(values.clone()),
            boundary_type,
            offset_from_boundary: index,
            limit: 1,
            sort: self.sort.clone(),
        };

        let items = self.adapter.fetch(&query).await?;
        let Some((_, item)) = items.first() else {
            return Ok(RunPosition::Empty);
        };

        let inside = self
            .extractor
            .extract(item, &self.sort)
            .is_ok_and(|found| self.same(&found, values));
        Ok(if inside {
            RunPosition::Inside
        } else {
            RunPosition::Past
        })
    }

    /// Measures the run of items sharing `values`, at least `known` long,
    /// with single-item fetches: doubling steps, then bisection.
    ///
    /// Returns the run length and whether an item lies past the run in the
    /// direction of `boundary_type`.
    async fn run_length(
        &self,
        values: &BoundaryValues,
        boundary_type: BoundaryType,
        known: u64,
    ) -> Result<(u64, bool)> {
        // Positions below `inside` belong to the run, `outside` does not.
        let mut inside = known;
        let mut step = known.max(1);
        let (mut outside, mut past) = loop {
            let index = inside.saturating_add(step - 1);
            match self.position_in_run(values, boundary_type, index).await? {
                RunPosition::Inside => {
                    inside = index + 1;
                    step = step.saturating_mul(2);
                }
                position => break (index, position == RunPosition::Past),
            }
        };

        while inside < outside {
            let index = inside + (outside - inside) / 2;
            match self.position_in_run(values, boundary_type, index).await? {
                RunPosition::Inside => inside = index + 1,
                position => {
                    outside = index;
                    past = position == RunPosition::Past;
                }
            }
        }

        tracing::warn!(
            target: TRACING_TARGET_PAGEABLE,
            boundary = %values,
            sort = %self.sort,
            run = inside,
            "sort key run is longer than a page and had to be measured; \
             add a unique tiebreaker to the sort specification"
        );

        Ok((inside, past))
    }

    async fn keyset_page(
        &self,
        mut request: KeysetPageIdentifier,
    ) -> Result<Page<A::Key, A::Item>> {
        if request.limit == 0 {
            return Err(Error::config("keyset identifier limit must be greater than zero"));
        }
        if let Some(boundary) = &request.boundary {
            boundary.validate_against(&self.sort)?;
        }

        let limit = request.limit.min(self.config.items_per_page);
        request.limit = limit;

        let fetched = self.fetch(&request, limit).await?;
        if request.boundary_type == BoundaryType::Lower {
            return self.forward_page(request, limit, fetched).await;
        }

        if let Some(page) = self.backward_page(request, limit, fetched).await? {
            return Ok(page);
        }

        // The backward fetch hit the start with a short page: serve the full
        // first page instead.
        let first = KeysetPageIdentifier::first(limit);
        let fetched = self.fetch(&first, limit).await?;
        self.forward_page(first, limit, fetched).await
    }

    async fn forward_page(
        &self,
        request: KeysetPageIdentifier,
        limit: usize,
        fetched: Fetched<A::Key, A::Item>,
    ) -> Result<Page<A::Key, A::Item>> {
        let Fetched {
            items,
            boundaries,
            extra,
        } = fetched;

        let Some(last) = boundaries.last() else {
            if request.is_first() {
                return Ok(Page::new(request.into(), items, limit, None, None));
            }
            return Err(self.out_of_bounds(request));
        };

        let mut identifier = request.clone();
        let mut previous = None;
        if !request.is_first() {
            match self
                .previous_of_forward(&request, limit, &boundaries, extra.as_ref())
                .await?
            {
                Some(found) => previous = Some(found),
                // Nothing precedes the page.
                None => identifier = KeysetPageIdentifier::first(limit),
            }
        }

        let page_number = identifier.page_number;
        let next = extra.as_ref().map(|_| {
            let trailing = self.trailing_run(&boundaries);
            let mut offset = trailing as u64;
            if trailing == boundaries.len() && self.at_boundary(&request, last) {
                offset += request.offset_from_boundary;
            }
            KeysetPageIdentifier::lower(last.clone(), offset, limit)
                .with_page_number(page_number.map(|number| number + 1))
        });

        tracing::trace!(
            target: TRACING_TARGET_PAGEABLE,
            next = ?next,
            previous = ?previous,
            "derived keyset neighbours of forward page"
        );

        Ok(Page::new(
            identifier.into(),
            items,
            limit,
            next.map(Into::into),
            previous.map(Into::into),
        ))
    }

    /// Identifier of the page before a forward page, `None` when nothing
    /// precedes it.
    async fn previous_of_forward(
        &self,
        request: &KeysetPageIdentifier,
        limit: usize,
        boundaries: &[BoundaryValues],
        lookahead: Option<&BoundaryValues>,
    ) -> Result<Option<KeysetPageIdentifier>> {
        let page_number = request
            .page_number
            .and_then(|number| number.checked_sub(1))
            .filter(|number| *number > 0);

        let Some(first) = boundaries.first() else {
            return Ok(Some(KeysetPageIdentifier::first(limit)));
        };

        let leading = self.leading_run(boundaries);
        let exact = leading < boundaries.len()
            || lookahead.is_none_or(|lookahead| !self.same(lookahead, first));
        if exact {
            let identifier = KeysetPageIdentifier::upper(first.clone(), leading as u64, limit);
            return Ok(Some(identifier.with_page_number(page_number)));
        }

        // The page and its lookahead share one sort key whose run continues
        // past the page. The request offset counts from the run's start, an
        // `Upper` offset would count from its end.
        let offset = request.offset_from_boundary;
        let identifier = match &request.boundary {
            Some(boundary) if !self.same(boundary, first) => {
                KeysetPageIdentifier::upper(boundary.clone(), 0, limit)
            }
            boundary if offset >= limit as u64 => KeysetPageIdentifier {
                boundary: boundary.clone(),
                boundary_type: BoundaryType::Lower,
                offset_from_boundary: offset - limit as u64,
                limit,
                page_number: None,
            },
            None => return Ok(Some(KeysetPageIdentifier::first(limit))),
            Some(_) => {
                let known = offset + boundaries.len() as u64 + 1;
                let (run, past) = self.run_length(first, BoundaryType::Upper, known).await?;
                if !past {
                    return Ok((offset > 0).then(|| KeysetPageIdentifier::first(limit)));
                }
                KeysetPageIdentifier::upper(first.clone(), run - offset, limit)
            }
        };

        Ok(Some(identifier.with_page_number(page_number)))
    }

    /// Builds a page from an `Upper` fetch.
    ///
    /// Returns `None` when the fetch reached the start of the data set with
    /// fewer items than a page; the caller serves the first page instead.
    async fn backward_page(
        &self,
        request: KeysetPageIdentifier,
        limit: usize,
        fetched: Fetched<A::Key, A::Item>,
    ) -> Result<Option<Page<A::Key, A::Item>>> {
        let Fetched {
            mut items,
            mut boundaries,
            extra,
        } = fetched;

        items.reverse();
        boundaries.reverse();

        let at_end = request.boundary.is_none() && request.offset_from_boundary == 0;
        let (Some(first), Some(last)) = (boundaries.first(), boundaries.last()) else {
            if at_end {
                return Ok(None);
            }
            return Err(self.out_of_bounds(request));
        };

        let reached_start = extra.is_none();
        if reached_start && items.len() < limit {
            return Ok(None);
        }

        let page_number = if reached_start {
            Some(1)
        } else {
            request.page_number
        };

        let previous = extra.as_ref().map(|_| {
            let leading = self.leading_run(&boundaries);
            let mut offset = leading as u64;
            if leading == boundaries.len() && self.at_boundary(&request, first) {
                offset += request.offset_from_boundary;
            }
            KeysetPageIdentifier::upper(first.clone(), offset, limit).with_page_number(
                page_number
                    .and_then(|number| number.checked_sub(1))
                    .filter(|number| *number > 0),
            )
        });

        let next = if at_end {
            None
        } else {
            self.next_of_backward(&request, limit, &boundaries, last, extra.as_ref())
                .await?
                .map(|next| next.with_page_number(page_number.map(|number| number + 1)))
        };

        tracing::trace!(
            target: TRACING_TARGET_PAGEABLE,
            next = ?next,
            previous = ?previous,
            reached_start,
            "derived keyset neighbours of backward page"
        );

        let identifier = if reached_start {
            KeysetPageIdentifier::first(limit)
        } else {
            request
        };

        Ok(Some(Page::new(
            identifier.into(),
            items,
            limit,
            next.map(Into::into),
            previous.map(Into::into),
        )))
    }

    /// Identifier of the page after a backward page, `None` when nothing
    /// follows it.
    async fn next_of_backward(
        &self,
        request: &KeysetPageIdentifier,
        limit: usize,
        boundaries: &[BoundaryValues],
        last: &BoundaryValues,
        lookbehind: Option<&BoundaryValues>,
    ) -> Result<Option<KeysetPageIdentifier>> {
        let trailing = self.trailing_run(boundaries);
        let exact = trailing < boundaries.len()
            || lookbehind.is_none_or(|lookbehind| !self.same(lookbehind, last));
        if exact {
            return Ok(Some(KeysetPageIdentifier::lower(last.clone(), trailing as u64, limit)));
        }

        // Mirror image of `previous_of_forward`: the request offset counts
        // from the run's end, a `Lower` offset from its start.
        let offset = request.offset_from_boundary;
        let identifier = match &request.boundary {
            Some(boundary) if !self.same(boundary, last) => {
                KeysetPageIdentifier::lower(boundary.clone(), 0, limit)
            }
            boundary if offset >= limit as u64 => KeysetPageIdentifier {
                boundary: boundary.clone(),
                boundary_type: BoundaryType::Upper,
                offset_from_boundary: offset - limit as u64,
                limit,
                page_number: None,
            },
            None => KeysetPageIdentifier::last(limit),
            Some(_) => {
                let known = offset + boundaries.len() as u64 + 1;
                let (run, past) = self.run_length(last, BoundaryType::Lower, known).await?;
                if !past && offset == 0 {
                    return Ok(None);
                }
                KeysetPageIdentifier::lower(last.clone(), run - offset, limit)
            }
        };

        Ok(Some(identifier))
    }

    async fn count(&self) -> Result<Count> {
        let items_per_page = self.config.items_per_page;
        let lookahead = || async move {
            let first = KeysetPageIdentifier::first(items_per_page);
            let fetched = self.fetch(&first, items_per_page).await?;
            Ok::<_, Error>(fetched.extra.is_some())
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
}

#[async_trait]
impl<A, E> Pageable for KeysetPageable<A, E>
where
    A: KeysetAdapter,
    E: BoundaryExtractor<A::Item>,
{
    type Item = A::Item;
    type Key = A::Key;

    fn identifier_kind(&self) -> PageIdentifierKind {
        PageIdentifierKind::Keyset
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
        self.keyset_page(KeysetPageIdentifier::first(self.config.items_per_page))
            .await
    }

    async fn last_page(&self) -> Result<Option<Page<A::Key, A::Item>>> {
        let page_number = self.total_pages().await?;
        let last = KeysetPageIdentifier::last(self.config.items_per_page)
            .with_page_number(page_number);
        self.keyset_page(last).await.map(Some)
    }

    async fn page_for(&self, identifier: &PageIdentifier) -> Result<Page<A::Key, A::Item>> {
        match identifier {
            PageIdentifier::Keyset(identifier) => self.keyset_page(identifier.clone()).await,
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

impl<A, E> Clone for KeysetPageable<A, E> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
            extractor: Arc::clone(&self.extractor),
            sort: self.sort.clone(),
            config: self.config.clone(),
            counter: self.counter.clone(),
        }
    }
}

impl<A, E> fmt::Debug for KeysetPageable<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysetPageable")
            .field("sort", &self.sort)
            .field("config", &self.config)
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde::Serialize;

    use super::*;
    use crate::boundary::JsonBoundaryExtractor;
    use crate::mock::MemoryAdapter;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Row {
        v: Option<i64>,
    }

    type Rows = KeysetPageable<MemoryAdapter<u32, Row>, JsonBoundaryExtractor>;

    fn pageable(values: &[i64], per_page: usize) -> Rows {
        let items = values
            .iter()
            .enumerate()
            .map(|(index, v)| (index as u32 + 1, Row { v: Some(*v) }));
        KeysetPageable::new(MemoryAdapter::new(items), JsonBoundaryExtractor, SortSpec::asc("v"))
            .with_config(PageableConfig::new(per_page))
            .unwrap()
    }

    fn keys(page: &Page<u32, Row>) -> Vec<u32> {
        page.keys().copied().collect()
    }

    async fn walk_forward(pageable: &Rows) -> Vec<Page<u32, Row>> {
        let mut pages = vec![pageable.first_page().await.unwrap()];
        loop {
            let current = pages.last().unwrap();
            let Some(next) = pageable.next_page(current).await.unwrap() else {
                return pages;
            };
            pages.push(next);
        }
    }

    /// Steps back from every forward page and expects the pages before it,
    /// ending on the first page.
    async fn assert_walks_back_from_every_page(values: &[i64], per_page: usize) {
        let pageable = pageable(values, per_page);
        let pages = walk_forward(&pageable).await;
        let first = pages[0].identifier().clone();

        for end in 1..pages.len() {
            let mut page = pageable.previous_page(&pages[end]).await.unwrap().unwrap();
            for expected in pages[..end].iter().rev() {
                assert_eq!(keys(&page), keys(expected), "{values:?} by {per_page} from {end}");
                match pageable.previous_page(&page).await.unwrap() {
                    Some(previous) => page = previous,
                    None => break,
                }
            }
            assert_eq!(page.identifier(), &first, "{values:?} by {per_page} from {end}");
            assert!(!page.has_previous());
        }
    }

    /// Steps forward from every page of a backward walk and expects the page
    /// after it.
    async fn assert_walks_forward_from_every_page(values: &[i64], per_page: usize) {
        let pageable = pageable(values, per_page);
        let mut pages = vec![pageable.last_page().await.unwrap().unwrap()];
        loop {
            let current = pages.last().unwrap();
            let Some(previous) = pageable.previous_page(current).await.unwrap() else {
                break;
            };
            pages.push(previous);
        }

        let walked: Vec<u32> = pages.iter().rev().flat_map(keys).collect();
        assert_eq!(walked, (1..=values.len() as u32).collect::<Vec<_>>());
        assert!(!pages[0].has_next());

        for pair in pages.windows(2) {
            let next = pageable.next_page(&pair[1]).await.unwrap().unwrap();
            assert_eq!(keys(&next), keys(&pair[0]), "{values:?} by {per_page}");
        }
    }

    #[tokio::test]
    async fn test_tie_spanning_page_edge() {
        let pageable = pageable(&[5, 5, 5, 6], 2);

        let first = pageable.first_page().await.unwrap();
        assert_eq!(keys(&first), vec![1, 2]);
        assert!(!first.has_previous());

        let Some(PageIdentifier::Keyset(next)) = first.next_identifier() else {
            panic!("first page should have a keyset next identifier");
        };
        assert_eq!(next.boundary, Some(BoundaryValues::new().with("v", 5)));
        assert_eq!(next.boundary_type, BoundaryType::Lower);
        assert_eq!(next.offset_from_boundary, 2);
        assert_eq!(next.page_number, Some(2));

        let second = pageable.next_page(&first).await.unwrap().unwrap();
        assert_eq!(keys(&second), vec![3, 4]);
        assert!(!second.has_next());
        assert_eq!(second.page_number(), Some(2));

        let back = pageable.previous_page(&second).await.unwrap().unwrap();
        assert_eq!(back.identifier(), first.identifier());
        assert_eq!(keys(&back), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_every_fetch_uses_one_lookahead() {
        let pageable = pageable(&[1, 2, 3, 4, 5], 2);
        let first = pageable.first_page().await.unwrap();
        pageable.next_page(&first).await.unwrap();
        assert_eq!(pageable.adapter().fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_data_set_has_one_empty_first_page() {
        let pageable = pageable(&[], 3);

        let first = pageable.first_page().await.unwrap();
        assert!(first.is_empty());
        assert!(!first.has_next());
        assert!(!first.has_previous());

        let last = pageable.last_page().await.unwrap().unwrap();
        assert_eq!(last.identifier(), first.identifier());
    }

    #[tokio::test]
    async fn test_last_page_and_backward_walk() {
        let pageable = pageable(&[1, 2, 3, 4, 5, 6, 7], 3);

        let last = pageable.last_page().await.unwrap().unwrap();
        assert_eq!(keys(&last), vec![5, 6, 7]);
        assert!(!last.has_next());

        let middle = pageable.previous_page(&last).await.unwrap().unwrap();
        assert_eq!(keys(&middle), vec![2, 3, 4]);

        // Only one item precedes the middle page, so the first page is
        // served in full instead of a short page.
        let first = pageable.previous_page(&middle).await.unwrap().unwrap();
        assert_eq!(first.identifier(), pageable.first_page().await.unwrap().identifier());
        assert_eq!(keys(&first), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_last_page_number_with_counting() {
        let pageable = pageable(&[1, 2, 3, 4, 5, 6, 7], 3).with_count(true);
        let last = pageable.last_page().await.unwrap().unwrap();
        assert_eq!(last.page_number(), Some(3));
        assert_eq!(pageable.total_pages().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_null_boundary_aborts_page() {
        let items = vec![(1, Row { v: Some(1) }), (2, Row { v: None })];
        let pageable = KeysetPageable::new(
            MemoryAdapter::new(items),
            JsonBoundaryExtractor,
            SortSpec::asc("v"),
        );

        let error = pageable.first_page().await.unwrap_err();
        assert!(matches!(error, Error::NullBoundaryValue { ref property } if property == "v"));
    }

    #[tokio::test]
    async fn test_boundary_mismatch_is_rejected() {
        let pageable = pageable(&[1, 2, 3], 2);
        let identifier = KeysetPageIdentifier::lower(BoundaryValues::new().with("k", 1), 0, 2);

        let error = pageable.page_for(&identifier.into()).await.unwrap_err();
        assert!(matches!(error, Error::BoundaryMismatch { .. }));
        assert_eq!(pageable.adapter().fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_beyond_the_end_is_out_of_bounds() {
        let pageable = pageable(&[1, 2, 3], 2);
        let identifier = KeysetPageIdentifier::lower(BoundaryValues::new().with("v", 3), 1, 2);

        let error = pageable.page_for(&identifier.into()).await.unwrap_err();
        assert!(matches!(error, Error::PageOutOfBounds { .. }));
        assert!(error.is_client_error());
    }

    #[tokio::test]
    async fn test_offset_identifier_is_unsupported() {
        let pageable = pageable(&[1, 2, 3], 2);
        let identifier: PageIdentifier = crate::identifier::OffsetPageIdentifier::first().into();

        let error = pageable.page_for(&identifier).await.unwrap_err();
        assert!(matches!(
            error,
            Error::UnsupportedPageIdentifier {
                kind: PageIdentifierKind::Offset
            }
        ));
    }

    #[tokio::test]
    async fn test_identifier_limit_is_clamped() {
        let pageable = pageable(&[1, 2, 3, 4, 5], 2);
        let identifier = KeysetPageIdentifier::first(100);

        let page = pageable.page_for(&identifier.into()).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.items_per_page(), 2);
    }

    #[tokio::test]
    async fn test_long_run_walks_forward_and_back() {
        // Every item shares one sort key, the hardest case for boundaries.
        let pageable = pageable(&[7; 7], 2);

        let mut pages = vec![pageable.first_page().await.unwrap()];
        loop {
            let current = pages.last().unwrap();
            let Some(next) = pageable.next_page(current).await.unwrap() else {
                break;
            };
            pages.push(next);
        }

        let walked: Vec<u32> = pages.iter().flat_map(keys).collect();
        assert_eq!(walked, vec![1, 2, 3, 4, 5, 6, 7]);

        let mut page = pages.pop().unwrap();
        loop {
            let Some(previous) = pageable.previous_page(&page).await.unwrap() else {
                break;
            };
            let expected = pages.pop().unwrap();
            assert_eq!(keys(&previous), keys(&expected));
            page = previous;
        }
        assert!(pages.is_empty());
        assert_eq!(page.identifier(), pageable.first_page().await.unwrap().identifier());
    }

    #[tokio::test]
    async fn test_previous_of_page_inside_long_run() {
        let pageable = pageable(&[1, 7, 7, 7, 7, 7, 7], 2);
        let first = pageable.first_page().await.unwrap();
        let second = pageable.next_page(&first).await.unwrap().unwrap();
        assert_eq!(keys(&second), vec![3, 4]);

        let back = pageable.previous_page(&second).await.unwrap().unwrap();
        assert_eq!(keys(&back), vec![1, 2]);
        assert_eq!(back.identifier(), first.identifier());
        assert!(!back.has_previous());
    }

    #[tokio::test]
    async fn test_first_page_inside_long_run_has_no_previous() {
        let pageable = pageable(&[7; 7], 2);
        let first = pageable.first_page().await.unwrap();
        let second = pageable.next_page(&first).await.unwrap().unwrap();

        let back = pageable.previous_page(&second).await.unwrap().unwrap();
        assert_eq!(keys(&back), vec![1, 2]);
        assert_eq!(back.identifier(), first.identifier());
        assert!(!back.has_previous());

        let again = pageable.next_page(&back).await.unwrap().unwrap();
        assert_eq!(keys(&again), vec![3, 4]);
    }

    #[tokio::test]
    async fn test_long_runs_walk_back_from_any_forward_page() {
        assert_walks_back_from_every_page(&[7; 7], 2).await;
        assert_walks_back_from_every_page(&[1, 7, 7, 7, 7, 7, 7], 2).await;
        assert_walks_back_from_every_page(&[4; 9], 3).await;
        assert_walks_back_from_every_page(&[1, 2, 2, 2, 2, 2, 3, 3, 3, 3], 2).await;
        assert_walks_back_from_every_page(&[1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 3], 3).await;
    }

    #[tokio::test]
    async fn test_long_runs_walk_forward_from_any_backward_page() {
        assert_walks_forward_from_every_page(&[7; 8], 2).await;
        assert_walks_forward_from_every_page(&[1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 3, 3], 3).await;
    }

    #[tokio::test]
    async fn test_boundary_of_wrong_type_is_malformed() {
        let pageable = pageable(&[1, 2, 3], 2);

        let tampered = KeysetPageIdentifier::upper(BoundaryValues::new().with("v", "x"), 0, 2);
        let error = pageable.page_for(&tampered.into()).await.unwrap_err();
        assert!(matches!(error, Error::MalformedToken { .. }));

        let tampered = KeysetPageIdentifier::lower(BoundaryValues::new().with("v", true), 0, 2);
        let error = pageable.page_for(&tampered.into()).await.unwrap_err();
        assert!(matches!(error, Error::MalformedToken { .. }));
        assert!(error.is_client_error());
    }

    #[tokio::test]
    async fn test_has_more_counting() {
        let many = pageable(&[1, 2, 3, 4, 5], 2).with_count(CountStrategy::HasMore);
        assert_eq!(many.has_multiple_pages().await.unwrap(), Some(true));
        assert_eq!(many.total_items().await.unwrap(), None);
        assert_eq!(many.adapter().count_calls(), 1);
        assert_eq!(many.adapter().fetch_count(), 1);

        let single = pageable(&[1, 2], 2).with_count(CountStrategy::HasMore);
        assert_eq!(single.has_multiple_pages().await.unwrap(), Some(false));
        assert_eq!(single.total_items().await.unwrap(), Some(2));
        assert_eq!(single.adapter().fetch_count(), 0);

        assert_eq!(pageable(&[1, 2, 3], 2).has_multiple_pages().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_with_items_per_page() {
        let pageable = pageable(&[1, 2, 3, 4, 5], 2);
        let wider = pageable.with_items_per_page(4).unwrap();
        assert_eq!(wider.first_page().await.unwrap().len(), 4);
        assert!(pageable.with_items_per_page(0).is_err());
    }
}
