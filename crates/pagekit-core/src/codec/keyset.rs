use base64::prelude::*;

use crate::identifier::{KeysetPageIdentifier, PageIdentifier, PageIdentifierKind};
use crate::{Error, Result, TRACING_TARGET_CODEC};

use super::PageIdentifierEncoder;

/// Maximum accepted token length in bytes.
pub const MAX_TOKEN_BYTES: usize = 4 * 1024;

/// Maximum number of boundary fields a token may carry.
pub const MAX_BOUNDARY_FIELDS: usize = 16;

/// Encodes keyset identifiers as URL-safe, unpadded base64 of compact JSON.
///
/// The token is opaque to clients but not tamper-proof; a decoded boundary
/// is still validated against the pageable's sort specification before use.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeysetIdentifierEncoder;

impl KeysetIdentifierEncoder {
    /// Creates a new keyset encoder.
    pub fn new() -> Self {
        Self
    }

    fn check(identifier: &KeysetPageIdentifier) -> std::result::Result<(), &'static str> {
        if identifier.limit == 0 {
            return Err("limit must be greater than zero");
        }

        if let Some(boundary) = &identifier.boundary {
            if boundary.is_empty() {
                return Err("boundary must not be empty");
            }
            if boundary.len() > MAX_BOUNDARY_FIELDS {
                return Err("boundary has too many fields");
            }
            if boundary.values().any(|value| !value.is_encodable()) {
                return Err("boundary holds a non-finite float");
            }
        }

        Ok(())
    }
}

impl PageIdentifierEncoder for KeysetIdentifierEncoder {
    fn kind(&self) -> PageIdentifierKind {
        PageIdentifierKind::Keyset
    }

    fn encode(&self, identifier: &PageIdentifier) -> Result<String> {
        let PageIdentifier::Keyset(identifier) = identifier else {
            return Err(Error::UnsupportedPageIdentifier {
                kind: identifier.kind(),
            });
        };

        Self::check(identifier).map_err(Error::config)?;

        let json = serde_json::to_vec(identifier)
            .map_err(|error| Error::config(format!("cannot serialize keyset identifier: {error}")))?;
        let token = BASE64_URL_SAFE_NO_PAD.encode(json);

        if token.len() > MAX_TOKEN_BYTES {
            return Err(Error::config(format!(
                "encoded keyset identifier is {} bytes, the maximum is {MAX_TOKEN_BYTES}",
                token.len()
            )));
        }

        Ok(token)
    }

    fn decode(&self, token: &str) -> Result<PageIdentifier> {
        if token.is_empty() {
            return Err(Error::malformed("keyset token is empty"));
        }
        if token.len() > MAX_TOKEN_BYTES {
            return Err(Error::malformed("keyset token is too large"));
        }

        let bytes = BASE64_URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|error| Error::malformed_with_source("keyset token is not valid base64", error))?;
        let json = std::str::from_utf8(&bytes)
            .map_err(|error| Error::malformed_with_source("keyset token is not valid UTF-8", error))?;
        let identifier: KeysetPageIdentifier = serde_json::from_str(json)
            .map_err(|error| Error::malformed_with_source("keyset token is not a valid identifier", error))?;

        Self::check(&identifier).map_err(Error::malformed)?;

        tracing::trace!(
            target: TRACING_TARGET_CODEC,
            boundary_type = %identifier.boundary_type,
            offset = identifier.offset_from_boundary,
            limit = identifier.limit,
            "decoded keyset page token"
        );

        Ok(identifier.into())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::boundary::{BoundaryValue, BoundaryValues};
    use crate::identifier::OffsetPageIdentifier;

    fn encode_raw(json: &str) -> String {
        BASE64_URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn test_round_trip_every_field() {
        let encoder = KeysetIdentifierEncoder;
        let boundary = BoundaryValues::new()
            .with("created_at", jiff::Timestamp::from_second(1_700_000_000).unwrap())
            .with("score", 2.5)
            .with("name", "a/b?c=d")
            .with("active", true)
            .with("id", Uuid::nil());
        let identifier = PageIdentifier::from(
            KeysetPageIdentifier::upper(boundary, 3, 25).with_page_number(Some(4)),
        );

        let token = encoder.encode(&identifier).unwrap();
        assert!(
            token
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
        );

        let decoded = encoder.decode(&token).unwrap();
        assert_eq!(decoded, identifier);
        assert_eq!(encoder.encode(&decoded).unwrap(), token);
    }

    #[test]
    fn test_round_trip_keeps_float_bits() {
        let encoder = KeysetIdentifierEncoder;
        let mut state = 0x9e37_79b9_7f4a_7c15_u64;
        let extremes = [f64::MIN_POSITIVE, f64::MAX, f64::MIN, -0.0, 5e-324, 0.1 + 0.2];

        let generated = std::iter::from_fn(|| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            Some(f64::from_bits(state))
        });

        for value in extremes.into_iter().chain(generated.take(10_000)) {
            if !value.is_finite() {
                continue;
            }

            let boundary = BoundaryValues::new().with("x", value);
            let identifier = PageIdentifier::from(KeysetPageIdentifier::lower(boundary, 0, 10));
            let token = encoder.encode(&identifier).unwrap();

            let Ok(PageIdentifier::Keyset(decoded)) = encoder.decode(&token) else {
                panic!("token for {value:e} should decode");
            };
            let found = decoded.boundary.as_ref().and_then(|boundary| boundary.get("x"));
            let Some(BoundaryValue::Float(found)) = found else {
                panic!("token for {value:e} lost its float");
            };
            assert_eq!(found.to_bits(), value.to_bits(), "{value:e} decoded as {found:e}");
        }
    }

    #[test]
    fn test_round_trip_first_page() {
        let encoder = KeysetIdentifierEncoder;
        let identifier = PageIdentifier::from(KeysetPageIdentifier::first(10));
        let token = encoder.encode(&identifier).unwrap();
        assert_eq!(encoder.decode(&token).unwrap(), identifier);
    }

    #[test]
    fn test_rejects_other_kinds() {
        let identifier = PageIdentifier::from(OffsetPageIdentifier::first());
        let error = KeysetIdentifierEncoder.encode(&identifier).unwrap_err();
        assert!(matches!(error, Error::UnsupportedPageIdentifier { .. }));
    }

    #[test]
    fn test_encode_rejects_invalid_identifiers() {
        let zero = PageIdentifier::from(KeysetPageIdentifier::first(0));
        assert!(KeysetIdentifierEncoder.encode(&zero).is_err());

        let nan = BoundaryValues::new().with("x", BoundaryValue::Float(f64::NAN));
        let nan = PageIdentifier::from(KeysetPageIdentifier::lower(nan, 0, 10));
        assert!(KeysetIdentifierEncoder.encode(&nan).is_err());
    }

    #[test]
    fn test_malformed_tokens() {
        let encoder = KeysetIdentifierEncoder;
        let too_many = (0..=MAX_BOUNDARY_FIELDS)
            .map(|index| format!(r#"["f{index}",{{"i":1}}]"#))
            .collect::<Vec<_>>()
            .join(",");

        let cases = [
            String::new(),
            String::from("not base64!"),
            BASE64_URL_SAFE_NO_PAD.encode([0xff, 0xfe]),
            encode_raw("{}"),
            encode_raw(r#"{"t":"l","l":0}"#),
            encode_raw(r#"{"t":"x","l":10}"#),
            encode_raw(r#"{"b":[],"t":"l","l":10}"#),
            encode_raw(&format!(r#"{{"b":[{too_many}],"t":"l","l":10}}"#)),
            "A".repeat(MAX_TOKEN_BYTES + 1),
        ];

        for token in cases {
            let error = encoder.decode(&token).unwrap_err();
            assert!(
                matches!(error, Error::MalformedToken { .. }),
                "token {token:?} should be malformed, got {error}"
            );
            assert!(error.is_client_error());
        }
    }
}
