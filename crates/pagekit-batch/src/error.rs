//! Batch run errors.

use std::borrow::Cow;

use pagekit_core::BoxedError;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::processor::Hook;
use crate::state::BatchState;

/// Result type alias for batch operations.
pub type Result<T, E = BatchError> = std::result::Result<T, E>;

/// Categories of batch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Fetching, decoding or encoding a page failed.
    Page,
    /// A processor hook failed.
    Processor,
    /// The run was driven from the wrong state.
    InvalidState,
    /// Invalid batch configuration.
    Configuration,
}

/// Errors that stop a batch run.
#[derive(Debug, thiserror::Error)]
#[must_use = "batch errors should be handled appropriately"]
pub enum BatchError {
    /// The pageable failed.
    #[error(transparent)]
    Page(#[from] pagekit_core::Error),

    /// A processor hook returned an error.
    #[error("processor hook `{hook}` failed: {source}")]
    Processor {
        /// The hook that failed.
        hook: Hook,
        /// The error returned by the processor.
        #[source]
        source: BoxedError,
    },

    /// The operation is not allowed in the current state.
    #[error("batch process cannot run from state `{state}`")]
    InvalidState {
        /// State the process was in.
        state: BatchState,
    },

    /// Invalid batch configuration.
    #[error("configuration error: {0}")]
    Config(Cow<'static, str>),
}

impl BatchError {
    /// Wraps an error returned by a processor hook.
    pub fn processor(hook: Hook, source: impl Into<BoxedError>) -> Self {
        Self::Processor {
            hook,
            source: source.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Page(_) => ErrorKind::Page,
            Self::Processor { .. } => ErrorKind::Processor,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns the pagination error, if the pageable failed.
    pub fn as_page_error(&self) -> Option<&pagekit_core::Error> {
        match self {
            Self::Page(error) => Some(error),
            _ => None,
        }
    }
}
