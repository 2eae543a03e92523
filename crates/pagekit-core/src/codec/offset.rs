use crate::identifier::{OffsetPageIdentifier, PageIdentifier, PageIdentifierKind};
use crate::{Error, Result, TRACING_TARGET_CODEC};

use super::PageIdentifierEncoder;

/// Longest decimal representation of a `u64`.
const MAX_DIGITS: usize = 20;

/// Encodes offset identifiers as their decimal page number (`"3"`).
#[derive(Debug, Default, Clone, Copy)]
pub struct OffsetIdentifierEncoder;

impl OffsetIdentifierEncoder {
    /// Creates a new offset encoder.
    pub fn new() -> Self {
        Self
    }
}

impl PageIdentifierEncoder for OffsetIdentifierEncoder {
    fn kind(&self) -> PageIdentifierKind {
        PageIdentifierKind::Offset
    }

    fn encode(&self, identifier: &PageIdentifier) -> Result<String> {
        match identifier {
            PageIdentifier::Offset(identifier) => Ok(identifier.page_number().to_string()),
            other => Err(Error::UnsupportedPageIdentifier { kind: other.kind() }),
        }
    }

    fn decode(&self, token: &str) -> Result<PageIdentifier> {
        if token.is_empty() || token.len() > MAX_DIGITS {
            return Err(Error::malformed("offset token must be 1 to 20 digits"));
        }
        if !token.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(Error::malformed("offset token must be a decimal page number"));
        }

        let page_number: u64 = token
            .parse()
            .map_err(|error| Error::malformed_with_source("offset token is out of range", error))?;
        let identifier = OffsetPageIdentifier::new(page_number)
            .map_err(|_| Error::malformed("page numbers start at 1"))?;

        tracing::trace!(
            target: TRACING_TARGET_CODEC,
            page_number,
            "decoded offset page token"
        );

        Ok(identifier.into())
    }
}
