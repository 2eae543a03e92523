//! Batch run configuration.

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{BatchError, Result};

/// Default number of pages between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "config", derive(Args))]
pub struct BatchConfig {
    /// Page size for the run, overriding the pageable's own setting.
    #[builder(default)]
    #[cfg_attr(
        feature = "config",
        arg(long = "batch-items-per-page", env = "PAGEKIT_BATCH_ITEMS_PER_PAGE")
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<usize>,

    /// Number of processed pages between progress log lines.
    #[builder(default = "DEFAULT_PROGRESS_INTERVAL")]
    #[cfg_attr(
        feature = "config",
        arg(
            long = "batch-progress-interval",
            env = "PAGEKIT_BATCH_PROGRESS_INTERVAL",
            default_value_t = DEFAULT_PROGRESS_INTERVAL
        )
    )]
    #[serde(default = "default_progress_interval")]
    pub progress_interval: u64,
}

fn default_progress_interval() -> u64 {
    DEFAULT_PROGRESS_INTERVAL
}

impl BatchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.items_per_page {
            return Err("items_per_page must be at least 1".into());
        }
        if let Some(0) = self.progress_interval {
            return Err("progress_interval must be at least 1".into());
        }
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            items_per_page: None,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl BatchConfig {
    /// Returns a builder with default values.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder::default()
    }

    /// Checks a configuration that did not come from the builder.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Config`] if a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.items_per_page == Some(0) {
            return Err(BatchError::config("items_per_page must be at least 1"));
        }
        if self.progress_interval == 0 {
            return Err(BatchError::config("progress_interval must be at least 1"));
        }
        Ok(())
    }
}
