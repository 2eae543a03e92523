use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{KeysetIdentifierEncoder, OffsetIdentifierEncoder, PageIdentifierEncoder};
use crate::identifier::{PageIdentifier, PageIdentifierKind};
use crate::pageable::Pageable;
use crate::{Error, Result, TRACING_TARGET_CODEC};

/// Registry of page identifier encoders, keyed by identifier kind.
///
/// The registry is a plain value: build one at startup and hand it to
/// whatever needs to turn identifiers into tokens and back. There is no
/// process-wide default.
#[derive(Clone, Default)]
pub struct EncoderRegistry {
    encoders: HashMap<PageIdentifierKind, Arc<dyn PageIdentifierEncoder>>,
}

impl EncoderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the keyset and offset encoders registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(KeysetIdentifierEncoder);
        registry.register(OffsetIdentifierEncoder);
        registry
    }

    /// Registers `encoder` for the kind it reports.
    ///
    /// Returns the encoder previously registered for that kind, if any.
    pub fn register<E>(&mut self, encoder: E) -> Option<Arc<dyn PageIdentifierEncoder>>
    where
        E: PageIdentifierEncoder + 'static,
    {
        self.register_arc(Arc::new(encoder))
    }

    /// Registers a shared encoder for the kind it reports.
    pub fn register_arc(
        &mut self,
        encoder: Arc<dyn PageIdentifierEncoder>,
    ) -> Option<Arc<dyn PageIdentifierEncoder>> {
        let kind = encoder.kind();
        tracing::debug!(target: TRACING_TARGET_CODEC, %kind, "registered page identifier encoder");
        self.encoders.insert(kind, encoder)
    }

    /// Returns `true` if an encoder is registered for `kind`.
    pub fn contains(&self, kind: PageIdentifierKind) -> bool {
        self.encoders.contains_key(&kind)
    }

    /// Returns the encoder registered for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPageIdentifier`] if none is registered.
    pub fn resolve(&self, kind: PageIdentifierKind) -> Result<&dyn PageIdentifierEncoder> {
        self.encoders
            .get(&kind)
            .map(|encoder| encoder.as_ref())
            .ok_or(Error::UnsupportedPageIdentifier { kind })
    }

    /// Encodes `identifier` with the encoder registered for its kind.
    pub fn encode(&self, identifier: &PageIdentifier) -> Result<String> {
        self.resolve(identifier.kind())?.encode(identifier)
    }

    /// Decodes `token` as an identifier of `kind`.
    pub fn decode(&self, kind: PageIdentifierKind, token: &str) -> Result<PageIdentifier> {
        self.resolve(kind)?.decode(token)
    }

    /// Decodes `token` as an identifier of the kind `pageable` works with.
    pub fn decode_for<P>(&self, pageable: &P, token: &str) -> Result<PageIdentifier>
    where
        P: Pageable + ?Sized,
    {
        self.decode(pageable.identifier_kind(), token)
    }
}

impl fmt::Debug for EncoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderRegistry")
            .field("kinds", &self.encoders.keys().collect::<Vec<_>>())
            .finish()
    }
}
