//! Processor hooks invoked by a batch run.

use async_trait::async_trait;
use jiff::Timestamp;
use pagekit_core::{BoxedError, PageIdentifier, PageableDescriptor};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::state::BatchSummary;

/// Flow control returned by per-page and per-item hooks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    /// Keep going.
    #[default]
    Continue,
    /// Stop after the current page's `after_page` hook.
    Cancel,
}

impl Control {
    /// Returns whether cancellation was requested.
    pub const fn is_cancel(self) -> bool {
        matches!(self, Self::Cancel)
    }
}

/// Names the processor hook an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Hook {
    /// [`BatchProcessor::before_process`].
    BeforeProcess,
    /// [`BatchProcessor::before_page`].
    BeforePage,
    /// [`BatchProcessor::on_item`].
    OnItem,
    /// [`BatchProcessor::after_page`].
    AfterPage,
    /// [`BatchProcessor::after_process`].
    AfterProcess,
}

/// Passed to [`BatchProcessor::before_process`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchContext {
    /// The pageable being walked.
    pub pageable: PageableDescriptor,
    /// Page the run starts from; `None` for the first page.
    pub start_from: Option<PageIdentifier>,
    /// When the run started.
    pub started_at: Timestamp,
}

/// Passed to [`BatchProcessor::before_page`] and [`BatchProcessor::after_page`].
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    /// Identifier of the page.
    pub identifier: PageIdentifier,
    /// 1-based page number, when known.
    pub page_number: Option<u64>,
    /// Number of items on the page.
    pub item_count: usize,
    /// Run-wide index of the page's first item.
    pub first_index: u64,
    /// Items of this page handed to `on_item` so far.
    pub items_processed: usize,
}

impl PageContext {
    /// Returns whether every item of the page was processed.
    pub fn is_complete(&self) -> bool {
        self.items_processed == self.item_count
    }
}

/// Receives the items of a batch run.
///
/// Only [`on_item`](Self::on_item) is required. Hooks run strictly in
/// sequence; per-page state can be built in `before_page` and released in
/// `after_page`, which runs once for every page that was started, even when
/// the run is cancelled halfway through it.
///
/// Errors are not retried. Whether an item can be processed twice is only
/// known to the processor.
#[async_trait]
pub trait BatchProcessor<K, T>: Send + Sync
where
    K: Sync,
    T: Sync,
{
    /// Called once before the first fetch.
    async fn before_process(&mut self, _context: &BatchContext) -> Result<(), BoxedError> {
        Ok(())
    }

    /// Called before the items of a page.
    async fn before_page(&mut self, _page: &PageContext) -> Result<Control, BoxedError> {
        Ok(Control::Continue)
    }

    /// Called for every item; `index` counts items across the whole run.
    async fn on_item(&mut self, item: &T, key: &K, index: u64) -> Result<Control, BoxedError>;

    /// Called after the items of a page.
    async fn after_page(&mut self, _page: &PageContext) -> Result<Control, BoxedError> {
        Ok(Control::Continue)
    }

    /// Called once when the run reaches a terminal state.
    async fn after_process(&mut self, _summary: &BatchSummary) -> Result<(), BoxedError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_names() {
        assert_eq!(Hook::BeforeProcess.as_ref(), "before_process");
        assert_eq!(Hook::AfterPage.to_string(), "after_page");
    }

    #[test]
    fn test_page_context_completion() {
        let mut page = PageContext {
            identifier: pagekit_core::OffsetPageIdentifier::first().into(),
            page_number: Some(1),
            item_count: 3,
            first_index: 0,
            items_processed: 2,
        };
        assert!(!page.is_complete());

        page.items_processed = 3;
        assert!(page.is_complete());
        assert!(Control::Cancel.is_cancel());
        assert!(!Control::default().is_cancel());
    }
}
