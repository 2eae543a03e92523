#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for batch runs.
pub const TRACING_TARGET_PROCESS: &str = "pagekit_batch::process";

mod config;
mod error;
mod process;
mod processor;
mod state;

#[doc(hidden)]
pub mod prelude;

pub use config::{
    BatchConfig, BatchConfigBuilder, BatchConfigBuilderError, DEFAULT_PROGRESS_INTERVAL,
};
pub use error::{BatchError, ErrorKind, Result};
pub use process::BatchProcess;
pub use processor::{BatchContext, BatchProcessor, Control, Hook, PageContext};
pub use state::{BatchState, BatchStats, BatchSummary};
