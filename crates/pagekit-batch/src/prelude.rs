//! Convenient re-exports for common use.

pub use crate::config::BatchConfig;
pub use crate::error::{BatchError, Result};
pub use crate::process::BatchProcess;
pub use crate::processor::{BatchContext, BatchProcessor, Control, PageContext};
pub use crate::state::{BatchState, BatchSummary};
