//! Pageable configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of items per page.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 50;

/// Page size and depth settings shared by every pageable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct PageableConfig {
    /// Number of items per page.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "items-per-page",
            env = "PAGEKIT_ITEMS_PER_PAGE",
            default_value_t = DEFAULT_ITEMS_PER_PAGE
        )
    )]
    #[serde(default = "default_items_per_page")]
    pub items_per_page: usize,

    /// Maximum number of pages that are counted (keyset) or reachable (offset).
    ///
    /// Totals beyond `page_limit * items_per_page` are reported as unknown.
    #[cfg_attr(feature = "config", arg(long = "page-limit", env = "PAGEKIT_PAGE_LIMIT"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u64>,
}

fn default_items_per_page() -> usize {
    DEFAULT_ITEMS_PER_PAGE
}

impl Default for PageableConfig {
    fn default() -> Self {
        Self {
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            page_limit: None,
        }
    }
}

impl PageableConfig {
    /// Creates a configuration with the given page size.
    pub fn new(items_per_page: usize) -> Self {
        Self {
            items_per_page,
            page_limit: None,
        }
    }

    /// Sets the page limit.
    pub fn with_page_limit(mut self, page_limit: u64) -> Self {
        self.page_limit = Some(page_limit);
        self
    }

    /// Returns the largest total that is still counted, if limited.
    pub fn count_cap(&self) -> Option<u64> {
        self.page_limit
            .map(|limit| limit.saturating_mul(self.items_per_page as u64))
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the page size or page limit is zero.
    pub fn validate(&self) -> Result<()> {
        if self.items_per_page == 0 {
            return Err(Error::config("items_per_page must be greater than zero"));
        }
        if self.page_limit == Some(0) {
            return Err(Error::config("page_limit must be greater than zero"));
        }
        Ok(())
    }
}
