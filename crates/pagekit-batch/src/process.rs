//! The batch run loop.

use std::fmt;

use jiff::Timestamp;
use pagekit_core::{
    EncoderRegistry, KeysetPageIdentifier, OffsetPageIdentifier, Page, PageIdentifier,
    PageIdentifierKind, Pageable,
};
use tokio_util::sync::CancellationToken;

use crate::config::BatchConfig;
use crate::processor::{BatchContext, BatchProcessor, Hook, PageContext};
use crate::state::{BatchState, BatchStats, BatchSummary};
use crate::{BatchError, Result, TRACING_TARGET_PROCESS};

/// Walks a pageable from start to end, feeding every item to a processor.
///
/// Pages are fetched one at a time and dropped once their `after_page` hook
/// has run, so memory stays bounded by a single page regardless of the size
/// of the data set. The pageable is only read from.
///
/// Cancellation is cooperative. It is checked before every fetch, after
/// every item and after every page, either through
/// [`cancellation_token`](Self::cancellation_token) or by a hook returning
/// [`Control::Cancel`](crate::Control::Cancel). A page that was started
/// always gets its `after_page` hook.
///
/// There is no built-in timeout. Wrap [`advance`](Self::advance) or
/// [`run`](Self::run) in `tokio::time::timeout` to bound a run.
pub struct BatchProcess<P, R> {
    pageable: P,
    processor: R,
    config: BatchConfig,
    cancel: CancellationToken,
    state: BatchState,
    stats: BatchStats,
    /// Next page to fetch, `None` fetches the first page.
    cursor: Option<PageIdentifier>,
    last_processed: Option<PageIdentifier>,
    resume_from: Option<PageIdentifier>,
}

impl<P, R> BatchProcess<P, R>
where
    P: Pageable,
    R: BatchProcessor<P::Key, P::Item>,
{
    /// Creates a process in the `Ready` state.
    pub fn new(pageable: P, processor: R) -> Self {
        Self {
            pageable,
            processor,
            config: BatchConfig::default(),
            cancel: CancellationToken::new(),
            state: BatchState::Ready,
            stats: BatchStats::default(),
            cursor: None,
            last_processed: None,
            resume_from: None,
        }
    }

    /// Applies a batch configuration.
    ///
    /// A page size override replaces the pageable with a resized copy.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Config`] for out-of-range values, or
    /// [`BatchError::Page`] if the pageable rejects the page size.
    pub fn with_config(mut self, config: BatchConfig) -> Result<Self> {
        config.validate()?;
        if let Some(items_per_page) = config.items_per_page {
            self.pageable = self.pageable.with_items_per_page(items_per_page)?;
        }
        self.config = config;
        Ok(self)
    }

    /// Uses `token` for cancellation, e.g. a child of a shutdown token.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Returns the current state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Returns the counters collected so far.
    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Returns the pageable being walked.
    pub fn pageable(&self) -> &P {
        &self.pageable
    }

    /// Returns the processor.
    pub fn processor(&self) -> &R {
        &self.processor
    }

    /// Consumes the process and returns the processor.
    pub fn into_processor(self) -> R {
        self.processor
    }

    /// Returns a snapshot of the run.
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            state: self.state,
            stats: self.stats.clone(),
            last_processed: self.last_processed.clone(),
            resume_from: self.resume_from.clone(),
        }
    }

    /// Encodes the page a later run should resume from.
    ///
    /// Returns `None` before the run starts and once the data set is
    /// exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Page`] if the identifier cannot be encoded.
    pub fn checkpoint_token(&self, registry: &EncoderRegistry) -> Result<Option<String>> {
        let token = self
            .resume_from
            .as_ref()
            .map(|identifier| registry.encode(identifier))
            .transpose()?;
        Ok(token)
    }

    /// Runs from the first page until a terminal state is reached.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidState`] if the process was already
    /// started, or the error that moved the run to `Failed`.
    pub async fn run(&mut self) -> Result<BatchSummary> {
        self.start(None).await?;
        self.drive().await
    }

    /// Runs from `identifier` until a terminal state is reached.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub async fn run_from(&mut self, identifier: &PageIdentifier) -> Result<BatchSummary> {
        self.start(Some(identifier.clone())).await?;
        self.drive().await
    }

    /// Decodes a checkpoint token and runs from the page it names.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Page`] if the token cannot be decoded, in which
    /// case the process stays `Ready`. Otherwise same as [`run`](Self::run).
    pub async fn resume_from_token(
        &mut self,
        token: &str,
        registry: &EncoderRegistry,
    ) -> Result<BatchSummary> {
        let identifier = registry.decode_for(&self.pageable, token)?;
        self.run_from(&identifier).await
    }

    /// Processes a single page and returns the resulting state.
    ///
    /// A `Ready` process is started from the first page. The process stays
    /// `Running` while more pages remain.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::InvalidState`] once the run has ended, or the
    /// error that moved the run to `Failed`.
    pub async fn advance(&mut self) -> Result<BatchState> {
        match self.state {
            BatchState::Ready => self.start(None).await?,
            BatchState::Running => {}
            state => return Err(BatchError::InvalidState { state }),
        }
        self.step().await
    }

    async fn start(&mut self, start_from: Option<PageIdentifier>) -> Result<()> {
        if self.state != BatchState::Ready {
            return Err(BatchError::InvalidState { state: self.state });
        }

        let started_at = Timestamp::now();
        self.state = BatchState::Running;
        self.stats.started_at = Some(started_at);
        self.resume_from = Some(
            start_from
                .clone()
                .unwrap_or_else(|| self.first_identifier()),
        );
        self.cursor = start_from.clone();

        let context = BatchContext {
            pageable: self.pageable.descriptor(),
            start_from,
            started_at,
        };

        tracing::info!(
            target: TRACING_TARGET_PROCESS,
            pageable = %context.pageable,
            start_from = ?context.start_from,
            progress_interval = self.config.progress_interval,
            "Batch process started"
        );

        if let Err(source) = self.processor.before_process(&context).await {
            let error = BatchError::processor(Hook::BeforeProcess, source);
            return Err(self.fail(error).await);
        }
        Ok(())
    }

    async fn drive(&mut self) -> Result<BatchSummary> {
        while self.state == BatchState::Running {
            self.step().await?;
        }
        Ok(self.summary())
    }

    async fn step(&mut self) -> Result<BatchState> {
        if self.cancel.is_cancelled() {
            return self.finish(BatchState::Cancelled).await;
        }

        let fetched = match &self.cursor {
            Some(identifier) => self.pageable.page_for(identifier).await,
            None => self.pageable.first_page().await,
        };
        let page = match fetched {
            Ok(page) => page,
            Err(error) => return Err(self.fail(error.into()).await),
        };

        if page.is_empty() {
            self.resume_from = None;
            return self.finish(BatchState::Completed).await;
        }
        self.process_page(page).await
    }

    async fn process_page(&mut self, page: Page<P::Key, P::Item>) -> Result<BatchState> {
        let mut context = PageContext {
            identifier: page.identifier().clone(),
            page_number: page.page_number(),
            item_count: page.len(),
            first_index: self.stats.items_processed,
            items_processed: 0,
        };
        self.resume_from = Some(context.identifier.clone());

        let mut cancel = match self.processor.before_page(&context).await {
            Ok(control) => control.is_cancel() || self.cancel.is_cancelled(),
            Err(source) => {
                let error = BatchError::processor(Hook::BeforePage, source);
                return Err(self.fail(error).await);
            }
        };

        if !cancel {
            for (key, item) in page.iter() {
                let index = self.stats.items_processed;
                let control = match self.processor.on_item(item, key, index).await {
                    Ok(control) => control,
                    Err(source) => {
                        let error = BatchError::processor(Hook::OnItem, source);
                        return Err(self.fail(error).await);
                    }
                };

                self.stats.items_processed += 1;
                context.items_processed += 1;
                if control.is_cancel() || self.cancel.is_cancelled() {
                    cancel = true;
                    break;
                }
            }
        }

        match self.processor.after_page(&context).await {
            Ok(control) => cancel |= control.is_cancel(),
            Err(source) => {
                let error = BatchError::processor(Hook::AfterPage, source);
                return Err(self.fail(error).await);
            }
        }

        self.stats.pages_processed += 1;
        self.last_processed = Some(context.identifier.clone());
        if context.is_complete() {
            self.resume_from = page.next_identifier().cloned();
        }

        tracing::debug!(
            target: TRACING_TARGET_PROCESS,
            page = %context.identifier,
            items = context.items_processed,
            complete = context.is_complete(),
            "Page processed"
        );
        if self
            .stats
            .pages_processed
            .is_multiple_of(self.config.progress_interval)
        {
            tracing::info!(
                target: TRACING_TARGET_PROCESS,
                pages_processed = self.stats.pages_processed,
                items_processed = self.stats.items_processed,
                "Batch progress"
            );
        }

        if cancel || self.cancel.is_cancelled() {
            return self.finish(BatchState::Cancelled).await;
        }
        match page.next_identifier() {
            Some(next) => {
                self.cursor = Some(next.clone());
                Ok(BatchState::Running)
            }
            None => self.finish(BatchState::Completed).await,
        }
    }

    async fn finish(&mut self, state: BatchState) -> Result<BatchState> {
        self.state = state;
        self.stats.finished_at = Some(Timestamp::now());

        if state == BatchState::Cancelled {
            tracing::warn!(
                target: TRACING_TARGET_PROCESS,
                pages_processed = self.stats.pages_processed,
                items_processed = self.stats.items_processed,
                resume_from = ?self.resume_from,
                "Batch process cancelled"
            );
        } else {
            tracing::info!(
                target: TRACING_TARGET_PROCESS,
                state = %state,
                pages_processed = self.stats.pages_processed,
                items_processed = self.stats.items_processed,
                elapsed = ?self.stats.elapsed(),
                "Batch process finished"
            );
        }

        let summary = self.summary();
        if let Err(source) = self.processor.after_process(&summary).await {
            let error = BatchError::processor(Hook::AfterProcess, source);
            self.state = BatchState::Failed;
            tracing::error!(
                target: TRACING_TARGET_PROCESS,
                error = %error,
                "Batch process failed"
            );
            return Err(error);
        }
        Ok(state)
    }

    async fn fail(&mut self, error: BatchError) -> BatchError {
        self.state = BatchState::Failed;
        self.stats.finished_at = Some(Timestamp::now());

        tracing::error!(
            target: TRACING_TARGET_PROCESS,
            error = %error,
            pages_processed = self.stats.pages_processed,
            items_processed = self.stats.items_processed,
            resume_from = ?self.resume_from,
            "Batch process failed"
        );

        let summary = self.summary();
        if let Err(source) = self.processor.after_process(&summary).await {
            tracing::error!(
                target: TRACING_TARGET_PROCESS,
                hook = %Hook::AfterProcess,
                error = %source,
                "Processor hook failed after batch failure"
            );
        }
        error
    }

    fn first_identifier(&self) -> PageIdentifier {
        match self.pageable.identifier_kind() {
            PageIdentifierKind::Keyset => {
                KeysetPageIdentifier::first(self.pageable.items_per_page()).into()
            }
            PageIdentifierKind::Offset => OffsetPageIdentifier::first().into(),
        }
    }
}

impl<P, R> fmt::Debug for BatchProcess<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchProcess")
            .field("state", &self.state)
            .field("stats", &self.stats)
            .field("config", &self.config)
            .field("resume_from", &self.resume_from)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use pagekit_core::mock::MemoryAdapter;
    use pagekit_core::{BoxedError, OffsetPageable, PageableConfig};

    use super::*;
    use crate::Control;

    type Numbers = OffsetPageable<MemoryAdapter<u32, u32>>;

    fn numbers(total: u32, per_page: usize) -> Numbers {
        OffsetPageable::new(MemoryAdapter::new((1..=total).map(|n| (n, n))))
            .with_config(PageableConfig::new(per_page))
            .unwrap()
    }

    /// Records every hook call; cancels or fails on a chosen item.
    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
        indexes: Vec<u64>,
        cancel_at: Option<u32>,
        fail_at: Option<u32>,
        summary: Option<BatchSummary>,
    }

    #[async_trait]
    impl BatchProcessor<u32, u32> for Recorder {
        async fn before_process(&mut self, _context: &BatchContext) -> Result<(), BoxedError> {
            self.events.push("start".into());
            Ok(())
        }

        async fn before_page(&mut self, page: &PageContext) -> Result<Control, BoxedError> {
            self.events.push(format!("page {}", page.page_number.unwrap_or(0)));
            Ok(Control::Continue)
        }

        async fn on_item(
            &mut self,
            item: &u32,
            _key: &u32,
            index: u64,
        ) -> Result<Control, BoxedError> {
            if self.fail_at == Some(*item) {
                return Err(std::io::Error::other("item rejected").into());
            }
            self.events.push(format!("item {item}"));
            self.indexes.push(index);
            if self.cancel_at == Some(*item) {
                return Ok(Control::Cancel);
            }
            Ok(Control::Continue)
        }

        async fn after_page(&mut self, page: &PageContext) -> Result<Control, BoxedError> {
            self.events.push(format!("done {}", page.page_number.unwrap_or(0)));
            Ok(Control::Continue)
        }

        async fn after_process(&mut self, summary: &BatchSummary) -> Result<(), BoxedError> {
            self.events.push(format!("end {}", summary.state));
            self.summary = Some(summary.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_to_completion() {
        let mut process = BatchProcess::new(numbers(5, 2), Recorder::default());
        let summary = process.run().await.unwrap();

        assert_eq!(summary.state, BatchState::Completed);
        assert_eq!(summary.stats.items_processed, 5);
        assert_eq!(summary.stats.pages_processed, 3);
        assert!(summary.stats.finished_at.is_some());
        assert!(!summary.is_resumable());
        assert_eq!(summary.last_processed.and_then(|id| id.page_number()), Some(3));

        let recorder = process.into_processor();
        assert_eq!(
            recorder.events,
            vec![
                "start", "page 1", "item 1", "item 2", "done 1", "page 2", "item 3", "item 4",
                "done 2", "page 3", "item 5", "done 3", "end completed",
            ]
        );
        assert_eq!(recorder.indexes, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_run_twice_is_invalid() {
        let mut process = BatchProcess::new(numbers(3, 2), Recorder::default());
        process.run().await.unwrap();

        let error = process.run().await.unwrap_err();
        assert!(matches!(
            error,
            BatchError::InvalidState {
                state: BatchState::Completed
            }
        ));
    }

    #[tokio::test]
    async fn test_advance_one_page_at_a_time() {
        let mut process = BatchProcess::new(numbers(4, 2), Recorder::default());
        assert_eq!(process.state(), BatchState::Ready);

        assert_eq!(process.advance().await.unwrap(), BatchState::Running);
        assert_eq!(process.stats().pages_processed, 1);
        assert_eq!(process.pageable().adapter().fetch_count(), 1);

        assert_eq!(process.advance().await.unwrap(), BatchState::Completed);
        assert_eq!(process.stats().items_processed, 4);
        assert!(process.advance().await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_mid_page() {
        let recorder = Recorder {
            cancel_at: Some(3),
            ..Recorder::default()
        };
        let mut process = BatchProcess::new(numbers(9, 2), recorder);
        let summary = process.run().await.unwrap();

        assert_eq!(summary.state, BatchState::Cancelled);
        assert_eq!(process.pageable().adapter().fetch_count(), 2);

        // Page 2 stopped after item 3, so it is resumed rather than skipped.
        assert_eq!(summary.resume_from.and_then(|id| id.page_number()), Some(2));
        assert_eq!(summary.last_processed.and_then(|id| id.page_number()), Some(2));

        let events = process.into_processor().events;
        assert_eq!(events.iter().filter(|e| *e == "done 2").count(), 1);
        assert_eq!(events.last().map(String::as_str), Some("end cancelled"));
        assert!(!events.contains(&"item 4".to_string()));
    }

    #[tokio::test]
    async fn test_cancel_at_page_end_resumes_with_next_page() {
        let recorder = Recorder {
            cancel_at: Some(4),
            ..Recorder::default()
        };
        let mut process = BatchProcess::new(numbers(9, 2), recorder);
        let summary = process.run().await.unwrap();

        assert_eq!(summary.state, BatchState::Cancelled);
        assert_eq!(summary.resume_from.and_then(|id| id.page_number()), Some(3));
    }

    #[tokio::test]
    async fn test_cancelled_before_first_fetch() {
        let mut process = BatchProcess::new(numbers(4, 2), Recorder::default());
        process.cancellation_token().cancel();

        let summary = process.run().await.unwrap();
        assert_eq!(summary.state, BatchState::Cancelled);
        assert_eq!(process.pageable().adapter().fetch_count(), 0);
        assert_eq!(process.into_processor().events, vec!["start", "end cancelled"]);
    }

    #[tokio::test]
    async fn test_processor_failure() {
        let recorder = Recorder {
            fail_at: Some(4),
            ..Recorder::default()
        };
        let mut process = BatchProcess::new(numbers(9, 2), recorder);
        let error = process.run().await.unwrap_err();

        assert!(matches!(
            error,
            BatchError::Processor {
                hook: Hook::OnItem,
                ..
            }
        ));
        assert_eq!(process.state(), BatchState::Failed);

        let recorder = process.into_processor();
        assert!(!recorder.events.contains(&"done 2".to_string()));
        assert_eq!(recorder.events.last().map(String::as_str), Some("end failed"));

        let summary = recorder.summary.unwrap();
        assert_eq!(summary.stats.items_processed, 3);
        assert_eq!(summary.resume_from.and_then(|id| id.page_number()), Some(2));
    }

    #[tokio::test]
    async fn test_config_overrides_page_size() {
        let config = BatchConfig::builder()
            .items_per_page(3usize)
            .progress_interval(1u64)
            .build()
            .unwrap();
        let mut process = BatchProcess::new(numbers(7, 2), Recorder::default())
            .with_config(config)
            .unwrap();

        let summary = process.run().await.unwrap();
        assert_eq!(process.pageable().items_per_page(), 3);
        assert_eq!(summary.stats.pages_processed, 3);
    }

    #[tokio::test]
    async fn test_invalid_config() {
        let config = BatchConfig {
            items_per_page: Some(0),
            ..BatchConfig::default()
        };
        let result = BatchProcess::new(numbers(1, 1), Recorder::default()).with_config(config);
        assert!(matches!(result, Err(BatchError::Config(_))));
    }

    #[tokio::test]
    async fn test_checkpoint_token() {
        let registry = EncoderRegistry::with_defaults();
        let recorder = Recorder {
            cancel_at: Some(2),
            ..Recorder::default()
        };
        let mut process = BatchProcess::new(numbers(6, 2), recorder);
        assert_eq!(process.checkpoint_token(&registry).unwrap(), None);

        process.run().await.unwrap();
        assert_eq!(process.checkpoint_token(&registry).unwrap().as_deref(), Some("2"));
    }
}
