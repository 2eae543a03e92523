//! Structured error handling for pagination operations.

use std::borrow::Cow;

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::identifier::{PageIdentifier, PageIdentifierKind};
use crate::pageable::PageableDescriptor;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while paginating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// A sort-key property resolved to null.
    NullBoundaryValue,
    /// A sort-key property resolved to a non-comparable value.
    UnsupportedValue,
    /// Boundary values do not match the sort specification.
    BoundaryMismatch,
    /// No encoder is registered for an identifier kind.
    UnsupportedPageIdentifier,
    /// A token could not be decoded.
    MalformedToken,
    /// The requested page lies beyond the data set.
    PageOutOfBounds,
    /// The requested page lies beyond the configured page limit.
    LimitExceeded,
    /// The underlying adapter failed.
    Adapter,
    /// Invalid configuration.
    Configuration,
}

/// Errors produced by boundary extraction, identifier encoding and page fetching.
#[derive(Debug, thiserror::Error)]
#[must_use = "pagination errors should be handled appropriately"]
pub enum Error {
    /// A boundary property resolved to null.
    ///
    /// Null cannot take part in a total order, so the page build is aborted.
    #[error("boundary property `{property}` resolved to null")]
    NullBoundaryValue {
        /// Name of the offending property.
        property: String,
    },

    /// A boundary property resolved to a value that cannot be compared.
    #[error("boundary property `{property}` is not a comparable scalar (found {found})")]
    UnsupportedValue {
        /// Name of the offending property.
        property: String,
        /// Short description of the value that was found.
        found: Cow<'static, str>,
    },

    /// Boundary values do not match the declared sort specification.
    #[error("boundary fields [{found}] do not match sort specification [{expected}]")]
    BoundaryMismatch {
        /// Field names of the sort specification, in order.
        expected: String,
        /// Field names carried by the boundary, in order.
        found: String,
    },

    /// No encoder is registered for the identifier kind.
    #[error("no encoder registered for page identifier kind `{kind}`")]
    UnsupportedPageIdentifier {
        /// The identifier kind that could not be handled.
        kind: PageIdentifierKind,
    },

    /// A token could not be decoded into a page identifier.
    #[error("malformed page token: {reason}")]
    MalformedToken {
        /// What was wrong with the token.
        reason: Cow<'static, str>,
        /// Underlying decoding error, if any.
        #[source]
        source: Option<BoxedError>,
    },

    /// The identifier points beyond the data set.
    #[error("page {identifier} is out of bounds for {pageable}")]
    PageOutOfBounds {
        /// The pageable the request was made against.
        pageable: PageableDescriptor,
        /// The offending identifier.
        identifier: PageIdentifier,
    },

    /// The identifier points beyond the configured page limit.
    #[error("page {identifier} exceeds the limit of {limit} pages for {pageable}")]
    LimitExceeded {
        /// The pageable the request was made against.
        pageable: PageableDescriptor,
        /// The offending identifier.
        identifier: PageIdentifier,
        /// The configured page limit.
        limit: u64,
    },

    /// The adapter failed; the source is kept as-is.
    #[error("adapter failure: {0}")]
    Adapter(#[source] BoxedError),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(Cow<'static, str>),
}

impl Error {
    /// Wraps an adapter-side failure.
    pub fn adapter(source: impl Into<BoxedError>) -> Self {
        Self::Adapter(source.into())
    }

    /// Creates a malformed-token error without a source.
    pub fn malformed(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates a malformed-token error caused by `source`.
    pub fn malformed_with_source(
        reason: impl Into<Cow<'static, str>>,
        source: impl Into<BoxedError>,
    ) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(message.into())
    }

    /// Returns the category of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NullBoundaryValue { .. } => ErrorKind::NullBoundaryValue,
            Self::UnsupportedValue { .. } => ErrorKind::UnsupportedValue,
            Self::BoundaryMismatch { .. } => ErrorKind::BoundaryMismatch,
            Self::UnsupportedPageIdentifier { .. } => ErrorKind::UnsupportedPageIdentifier,
            Self::MalformedToken { .. } => ErrorKind::MalformedToken,
            Self::PageOutOfBounds { .. } => ErrorKind::PageOutOfBounds,
            Self::LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Self::Adapter(_) => ErrorKind::Adapter,
            Self::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Returns whether this error was caused by caller input.
    ///
    /// These map to a "bad request" or "not found" class response at an HTTP
    /// boundary rather than a server failure.
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken { .. }
                | Self::PageOutOfBounds { .. }
                | Self::LimitExceeded { .. }
                | Self::BoundaryMismatch { .. }
        )
    }

    /// Returns whether this error indicates a wiring or configuration mistake.
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPageIdentifier { .. } | Self::Config(_)
        )
    }
}
