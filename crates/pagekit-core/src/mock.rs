//! In-memory adapter for tests.
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! pagekit-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! [`MemoryAdapter`] implements both adapter contracts over a vector of
//! `(key, item)` pairs, counts its fetches and can be told to fail, which is
//! what the pageable and batch tests need to observe.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;

use crate::adapter::{KeysetAdapter, KeysetQuery, OffsetAdapter, OffsetQuery};
use crate::boundary::{BoundaryExtractor, BoundaryValues, JsonBoundaryExtractor};
use crate::{Error, Result};

/// Adapter over an in-memory vector of `(key, item)` pairs.
///
/// Keyset fetches sort a snapshot by the query's sort specification (stable,
/// so insertion order breaks ties) and filter it by the boundary. Items whose
/// boundary cannot be extracted sort last, like `NULLS LAST`, and are still
/// returned. Offset fetches use insertion order.
#[derive(Debug)]
pub struct MemoryAdapter<K, T, E = JsonBoundaryExtractor> {
    items: Vec<(K, T)>,
    extractor: E,
    fetches: AtomicUsize,
    counts: AtomicUsize,
    fail_at: Option<usize>,
}

impl<K, T> MemoryAdapter<K, T, JsonBoundaryExtractor> {
    /// Creates an adapter that reads boundaries through JSON serialization.
    pub fn new(items: impl IntoIterator<Item = (K, T)>) -> Self {
        Self::with_extractor(items, JsonBoundaryExtractor)
    }
}

impl<K, T, E> MemoryAdapter<K, T, E> {
    /// Creates an adapter with a custom boundary extractor.
    pub fn with_extractor(items: impl IntoIterator<Item = (K, T)>, extractor: E) -> Self {
        Self {
            items: items.into_iter().collect(),
            extractor,
            fetches: AtomicUsize::new(0),
            counts: AtomicUsize::new(0),
            fail_at: None,
        }
    }

    /// Makes the `n`-th fetch (1-based) fail with an adapter error.
    pub fn fail_on_fetch(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Returns how many fetches were made so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }

    /// Returns how many times the total was counted so far.
    pub fn count_calls(&self) -> usize {
        self.counts.load(AtomicOrdering::SeqCst)
    }

    /// Returns the stored pairs in insertion order.
    pub fn items(&self) -> &[(K, T)] {
        &self.items
    }

    fn record_fetch(&self) -> Result<()> {
        let n = self.fetches.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        if self.fail_at == Some(n) {
            return Err(Error::adapter(std::io::Error::other(format!(
                "injected failure on fetch {n}"
            ))));
        }
        Ok(())
    }

    fn total(&self, cap: Option<u64>) -> Option<u64> {
        self.counts.fetch_add(1, AtomicOrdering::SeqCst);
        let total = self.items.len() as u64;
        cap.is_none_or(|cap| total <= cap).then_some(total)
    }
}

#[async_trait]
impl<K, T, E> KeysetAdapter for MemoryAdapter<K, T, E>
where
    K: Clone + Send + Sync,
    T: Clone + Send + Sync,
    E: BoundaryExtractor<T>,
{
    type Item = T;
    type Key = K;

    async fn fetch(&self, query: &KeysetQuery) -> Result<Vec<(K, T)>> {
        self.record_fetch()?;

        let mut rows: Vec<(Option<BoundaryValues>, &(K, T))> = self
            .items
            .iter()
            .map(|entry| (self.extractor.extract(&entry.1, &query.sort).ok(), entry))
            .collect();

        rows.sort_by(|(a, _), (b, _)| match (a, b) {
            (Some(a), Some(b)) => query.sort.compare(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        if query.is_backward() {
            rows.reverse();
        }

        let effective = query.effective_sort();
        let skip = usize::try_from(query.offset_from_boundary).unwrap_or(usize::MAX);

        Ok(rows
            .into_iter()
            .filter(|(values, _)| match (&query.boundary, values) {
                (None, _) => true,
                (Some(boundary), Some(values)) => {
                    effective.compare(values, boundary) != Ordering::Less
                }
                (Some(_), None) => !query.is_backward(),
            })
            .skip(skip)
            .take(query.limit)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    async fn count(&self, cap: Option<u64>) -> Result<Option<u64>> {
        Ok(self.total(cap))
    }
}

#[async_trait]
impl<K, T, E> OffsetAdapter for MemoryAdapter<K, T, E>
where
    K: Clone + Send + Sync,
    T: Clone + Send + Sync,
    E: Send + Sync,
{
    type Item = T;
    type Key = K;

    async fn fetch(&self, query: &OffsetQuery) -> Result<Vec<(K, T)>> {
        self.record_fetch()?;

        let skip = usize::try_from(query.offset).unwrap_or(usize::MAX);
        Ok(self
            .items
            .iter()
            .skip(skip)
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn count(&self, cap: Option<u64>) -> Result<Option<u64>> {
        Ok(self.total(cap))
    }
}
