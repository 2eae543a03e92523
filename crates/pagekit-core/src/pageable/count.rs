//! Total-count strategies.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::{Result, TRACING_TARGET_PAGEABLE};

/// Lazily invoked source of the total item count.
#[async_trait]
pub trait CountProvider: Send + Sync {
    /// Returns the total number of items.
    async fn count(&self) -> Result<u64>;
}

/// How a pageable learns the total number of items.
#[derive(Clone, Default)]
pub enum CountStrategy {
    /// Never count; totals are unknown.
    #[default]
    Disabled,
    /// The total is known up front.
    Known(u64),
    /// Ask the adapter for a (possibly capped) count.
    Exact,
    /// Only learn whether the data set spans more than one page.
    ///
    /// Asks the adapter for a count capped at one page and falls back to a
    /// lookahead fetch of the first page when the adapter cannot answer.
    HasMore,
    /// Ask a separate provider on first use.
    Lazy(Arc<dyn CountProvider>),
}

impl CountStrategy {
    /// Creates a lazy strategy from a provider.
    pub fn lazy(provider: impl CountProvider + 'static) -> Self {
        Self::Lazy(Arc::new(provider))
    }

    /// Returns `true` unless counting is disabled.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl From<bool> for CountStrategy {
    fn from(count: bool) -> Self {
        if count { Self::Exact } else { Self::Disabled }
    }
}

impl From<u64> for CountStrategy {
    fn from(total: u64) -> Self {
        Self::Known(total)
    }
}

impl fmt::Debug for CountStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Known(total) => f.debug_tuple("Known").field(total).finish(),
            Self::Exact => f.write_str("Exact"),
            Self::HasMore => f.write_str("HasMore"),
            Self::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// What a count strategy learned about the data set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Count {
    /// Total number of items, `None` when unknown or above the cap.
    pub total: Option<u64>,
    /// Whether the items span more than one page, when known.
    pub multiple_pages: Option<bool>,
}

impl Count {
    fn from_total(total: Option<u64>, cap: Option<u64>, items_per_page: u64) -> Self {
        Self {
            total: total.filter(|total| cap.is_none_or(|cap| *total <= cap)),
            multiple_pages: total.map(|total| total > items_per_page),
        }
    }
}

/// Count strategy with a cache shared by every clone of a pageable.
#[derive(Debug, Clone)]
pub(crate) struct Counter {
    strategy: CountStrategy,
    cache: Arc<OnceCell<Count>>,
}

impl Counter {
    pub(crate) fn new(strategy: CountStrategy) -> Self {
        Self {
            strategy,
            cache: Arc::new(OnceCell::new()),
        }
    }

    /// Returns a counter with the same strategy and an empty cache.
    pub(crate) fn fresh(&self) -> Self {
        Self::new(self.strategy.clone())
    }

    /// Resolves the count once, reporting no total above `cap`.
    ///
    /// `exact` performs the adapter count, `lookahead` reports whether the
    /// first page has a successor. Neither runs for strategies that do not
    /// need it.
    pub(crate) async fn resolve<F, Fut, L, LFut>(
        &self,
        cap: Option<u64>,
        items_per_page: usize,
        exact: F,
        lookahead: L,
    ) -> Result<Count>
    where
        F: FnOnce(Option<u64>) -> Fut,
        Fut: Future<Output = Result<Option<u64>>>,
        L: FnOnce() -> LFut,
        LFut: Future<Output = Result<bool>>,
    {
        let per_page = items_per_page as u64;
        let count = self
            .cache
            .get_or_try_init(|| async {
                let count = match &self.strategy {
                    CountStrategy::Disabled => Count::default(),
                    CountStrategy::Known(total) => {
                        Count::from_total(Some(*total), cap, per_page)
                    }
                    CountStrategy::Exact => Count::from_total(exact(cap).await?, cap, per_page),
                    CountStrategy::Lazy(provider) => {
                        Count::from_total(Some(provider.count().await?), cap, per_page)
                    }
                    CountStrategy::HasMore => match exact(Some(per_page)).await? {
                        Some(total) if total <= per_page => Count {
                            total: Some(total),
                            multiple_pages: Some(false),
                        },
                        Some(_) => Count {
                            total: None,
                            multiple_pages: Some(true),
                        },
                        None => Count {
                            total: None,
                            multiple_pages: Some(lookahead().await?),
                        },
                    },
                };

                tracing::debug!(
                    target: TRACING_TARGET_PAGEABLE,
                    strategy = ?self.strategy,
                    total = ?count.total,
                    multiple_pages = ?count.multiple_pages,
                    cap = ?cap,
                    "resolved item count"
                );

                Ok::<_, crate::Error>(count)
            })
            .await?;

        Ok(*count)
    }
}

/// Number of pages needed for `total` items, never zero.
pub(crate) fn page_count(total: u64, items_per_page: usize) -> u64 {
    total.div_ceil(items_per_page.max(1) as u64).max(1)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Counting(AtomicUsize);

    #[async_trait]
    impl CountProvider for Counting {
        async fn count(&self) -> Result<u64> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(103)
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(103, 10), 11);
        assert_eq!(page_count(100, 10), 10);
        assert_eq!(page_count(1, 10), 1);
        assert_eq!(page_count(0, 10), 1);
    }

    #[test]
    fn test_from_conversions() {
        assert!(matches!(CountStrategy::from(true), CountStrategy::Exact));
        assert!(matches!(CountStrategy::from(false), CountStrategy::Disabled));
        assert!(matches!(CountStrategy::from(7u64), CountStrategy::Known(7)));
        assert!(!CountStrategy::default().is_enabled());
    }

    async fn no_lookahead() -> Result<bool> {
        Err(crate::Error::config("lookahead must not run"))
    }

    #[tokio::test]
    async fn test_lazy_is_resolved_once_and_shared() {
        let provider = Arc::new(Counting(AtomicUsize::new(0)));
        let counter = Counter::new(CountStrategy::Lazy(provider.clone()));
        let clone = counter.clone();

        let no_exact = |_| async { Ok(None) };
        let count = counter.resolve(None, 10, no_exact, no_lookahead).await.unwrap();
        assert_eq!(count.total, Some(103));
        assert_eq!(count.multiple_pages, Some(true));

        let count = clone.resolve(None, 10, no_exact, no_lookahead).await.unwrap();
        assert_eq!(count.total, Some(103));
        assert_eq!(provider.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cap_reports_unknown() {
        let counter = Counter::new(CountStrategy::Known(103));
        let count = counter
            .resolve(Some(50), 10, |_| async { Ok(None) }, no_lookahead)
            .await
            .unwrap();
        assert_eq!(count.total, None);
        assert_eq!(count.multiple_pages, Some(true));
    }

    #[tokio::test]
    async fn test_exact_passes_cap() {
        let counter = Counter::new(CountStrategy::Exact);
        let count = counter
            .resolve(
                Some(20),
                10,
                |cap| async move { Ok(cap.map(|cap| cap - 5)) },
                no_lookahead,
            )
            .await
            .unwrap();
        assert_eq!(count.total, Some(15));
    }

    #[tokio::test]
    async fn test_exact_without_adapter_count_is_unknown() {
        let counter = Counter::new(CountStrategy::Exact);
        let count = counter
            .resolve(None, 10, |_| async { Ok(None) }, no_lookahead)
            .await
            .unwrap();
        assert_eq!(count, Count::default());
    }

    #[tokio::test]
    async fn test_disabled_never_calls_adapter() {
        let counter = Counter::new(CountStrategy::Disabled);
        let count = counter
            .resolve(
                None,
                10,
                |_| async { Err(crate::Error::config("adapter count must not run")) },
                no_lookahead,
            )
            .await
            .unwrap();
        assert_eq!(count, Count::default());
    }

    #[tokio::test]
    async fn test_has_more_caps_the_count_at_one_page() {
        let counter = Counter::new(CountStrategy::HasMore);
        let count = counter
            .resolve(
                Some(50),
                10,
                |cap| async move {
                    assert_eq!(cap, Some(10));
                    Ok(Some(7))
                },
                no_lookahead,
            )
            .await
            .unwrap();
        assert_eq!(count.total, Some(7));
        assert_eq!(count.multiple_pages, Some(false));
    }

    #[tokio::test]
    async fn test_has_more_hides_totals_beyond_one_page() {
        let counter = Counter::new(CountStrategy::HasMore);
        let count = counter
            .resolve(None, 10, |_| async { Ok(Some(103)) }, no_lookahead)
            .await
            .unwrap();
        assert_eq!(count.total, None);
        assert_eq!(count.multiple_pages, Some(true));
    }

    #[tokio::test]
    async fn test_has_more_falls_back_to_lookahead() {
        let counter = Counter::new(CountStrategy::HasMore);
        let count = counter
            .resolve(None, 10, |_| async { Ok(None) }, || async { Ok(true) })
            .await
            .unwrap();
        assert_eq!(count.total, None);
        assert_eq!(count.multiple_pages, Some(true));
    }
}
