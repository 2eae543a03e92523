//! Page identifiers: value objects that fully determine how to fetch a page.

mod keyset;
mod offset;

use std::fmt;

use derive_more::From;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

pub use keyset::{BoundaryType, KeysetPageIdentifier};
pub use offset::OffsetPageIdentifier;

/// Paging strategy an identifier belongs to.
///
/// Used as the routing key of the [`EncoderRegistry`](crate::EncoderRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PageIdentifierKind {
    /// Boundary (cursor) based paging.
    Keyset,
    /// Page-number based paging.
    Offset,
}

/// Identifier of a single page.
#[derive(Debug, Clone, PartialEq, From)]
pub enum PageIdentifier {
    /// Keyset page.
    Keyset(KeysetPageIdentifier),
    /// Offset page.
    Offset(OffsetPageIdentifier),
}

impl PageIdentifier {
    /// Returns the strategy this identifier belongs to.
    pub const fn kind(&self) -> PageIdentifierKind {
        match self {
            Self::Keyset(_) => PageIdentifierKind::Keyset,
            Self::Offset(_) => PageIdentifierKind::Offset,
        }
    }

    /// Returns the 1-based page number, when known.
    ///
    /// For keyset identifiers this is advisory only.
    pub fn page_number(&self) -> Option<u64> {
        match self {
            Self::Keyset(identifier) => identifier.page_number,
            Self::Offset(identifier) => Some(identifier.page_number()),
        }
    }

    /// Returns the keyset identifier, if this is one.
    pub fn as_keyset(&self) -> Option<&KeysetPageIdentifier> {
        match self {
            Self::Keyset(identifier) => Some(identifier),
            Self::Offset(_) => None,
        }
    }

    /// Returns the offset identifier, if this is one.
    pub fn as_offset(&self) -> Option<&OffsetPageIdentifier> {
        match self {
            Self::Offset(identifier) => Some(identifier),
            Self::Keyset(_) => None,
        }
    }
}

impl fmt::Display for PageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyset(identifier) => write!(f, "{identifier}"),
            Self::Offset(identifier) => write!(f, "{identifier}"),
        }
    }
}
