//! Conversion of page identifiers to and from opaque string tokens.
//!
//! Every encoder handles exactly one [`PageIdentifierKind`] and satisfies the
//! round-trip law `decode(encode(x)) == x`. Encoders are looked up through an
//! explicitly constructed [`EncoderRegistry`], so a new paging strategy adds
//! its own encoder without touching the existing ones.

mod keyset;
mod offset;
mod registry;

pub use keyset::{KeysetIdentifierEncoder, MAX_BOUNDARY_FIELDS, MAX_TOKEN_BYTES};
pub use offset::OffsetIdentifierEncoder;
pub use registry::EncoderRegistry;

use crate::Result;
use crate::identifier::{PageIdentifier, PageIdentifierKind};

/// Encodes and decodes page identifiers of a single kind.
pub trait PageIdentifierEncoder: Send + Sync {
    /// Returns the identifier kind this encoder supports.
    fn kind(&self) -> PageIdentifierKind;

    /// Encodes `identifier` into a URL-safe token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPageIdentifier`](crate::Error::UnsupportedPageIdentifier)
    /// if the identifier is of another kind.
    fn encode(&self, identifier: &PageIdentifier) -> Result<String>;

    /// Decodes a token produced by [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedToken`](crate::Error::MalformedToken) if
    /// the token is not a valid encoding.
    fn decode(&self, token: &str) -> Result<PageIdentifier>;
}
