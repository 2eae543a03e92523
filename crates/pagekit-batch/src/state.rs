//! Run state, counters and summaries.

use jiff::{SignedDuration, Timestamp};
use pagekit_core::PageIdentifier;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Lifecycle state of a batch run.
///
/// A run moves from `Ready` to `Running` and ends in exactly one of the
/// terminal states.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BatchState {
    /// Created, not started.
    #[default]
    Ready,
    /// Pages are being processed.
    Running,
    /// Every page was processed.
    Completed,
    /// Stopped by a cancellation request.
    Cancelled,
    /// Stopped by a fetch or processor error.
    Failed,
}

impl BatchState {
    /// Returns whether the run has ended.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Counters collected during a run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Items handed to the processor.
    pub items_processed: u64,
    /// Pages whose `after_page` hook ran.
    pub pages_processed: u64,
    /// When the run started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the run reached a terminal state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
}

impl BatchStats {
    /// Returns the run time so far, or the total once finished.
    pub fn elapsed(&self) -> Option<SignedDuration> {
        let started_at = self.started_at?;
        let until = self.finished_at.unwrap_or_else(Timestamp::now);
        Some(until.duration_since(started_at))
    }
}

/// Snapshot of a run, handed to `after_process` and returned by `run`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    /// State at the time of the snapshot.
    pub state: BatchState,
    /// Counters at the time of the snapshot.
    pub stats: BatchStats,
    /// Identifier of the last page whose `after_page` hook ran.
    pub last_processed: Option<PageIdentifier>,
    /// Identifier of the first page not fully processed.
    ///
    /// `None` once the data set is exhausted. Passing it to
    /// [`BatchProcess::run_from`](crate::BatchProcess::run_from) continues
    /// where this run stopped.
    pub resume_from: Option<PageIdentifier>,
}

impl BatchSummary {
    /// Returns whether a later run can pick up where this one stopped.
    pub fn is_resumable(&self) -> bool {
        self.resume_from.is_some()
    }
}
