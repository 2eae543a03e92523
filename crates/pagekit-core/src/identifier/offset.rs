//! Offset page identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Identifier of a page by its 1-based number.
///
/// The item offset is `(page_number - 1) * items_per_page`, where the page
/// size is a property of the pageable, not of the identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct OffsetPageIdentifier {
    page_number: u64,
}

impl OffsetPageIdentifier {
    /// Creates an identifier for `page_number`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `page_number` is zero.
    pub fn new(page_number: u64) -> Result<Self> {
        if page_number == 0 {
            return Err(Error::config("page numbers start at 1"));
        }
        Ok(Self { page_number })
    }

    /// Identifier of the first page.
    pub const fn first() -> Self {
        Self { page_number: 1 }
    }

    /// Returns the 1-based page number.
    pub const fn page_number(&self) -> u64 {
        self.page_number
    }

    /// Returns the offset of the first item on this page.
    pub const fn offset(&self, items_per_page: usize) -> u64 {
        (self.page_number - 1).saturating_mul(items_per_page as u64)
    }

    /// Identifier of the following page.
    pub const fn next(&self) -> Self {
        Self {
            page_number: self.page_number.saturating_add(1),
        }
    }

    /// Identifier of the preceding page, absent for the first page.
    pub const fn previous(&self) -> Option<Self> {
        if self.page_number > 1 {
            Some(Self {
                page_number: self.page_number - 1,
            })
        } else {
            None
        }
    }
}

impl TryFrom<u64> for OffsetPageIdentifier {
    type Error = Error;

    fn try_from(page_number: u64) -> Result<Self> {
        Self::new(page_number)
    }
}

impl From<OffsetPageIdentifier> for u64 {
    fn from(identifier: OffsetPageIdentifier) -> Self {
        identifier.page_number
    }
}

impl fmt::Display for OffsetPageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset page {}", self.page_number)
    }
}
