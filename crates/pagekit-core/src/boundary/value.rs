//! Scalar boundary values.

use std::cmp::Ordering;
use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single comparable sort-key value taken from an item.
///
/// There is intentionally no null variant: a null sort key cannot take part
/// in a total order, so extractors reject it with
/// [`Error::NullBoundaryValue`](crate::Error::NullBoundaryValue).
///
/// Values only order against values of the same variant. `Float` uses
/// [`f64::total_cmp`], so every float (including `NaN`) has a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BoundaryValue {
    /// Boolean value, `false < true`.
    #[serde(rename = "b")]
    Bool(bool),
    /// Signed integer value.
    #[serde(rename = "i")]
    Int(i64),
    /// Floating point value.
    #[serde(rename = "f")]
    Float(f64),
    /// String value, compared bytewise.
    #[serde(rename = "s")]
    String(String),
    /// Instant in time.
    #[serde(rename = "t")]
    Timestamp(Timestamp),
    /// UUID, compared bytewise.
    #[serde(rename = "u")]
    Uuid(Uuid),
}

impl BoundaryValue {
    /// Returns a short, human-readable name of the variant.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
        }
    }

    /// Compares against another value of the same variant.
    ///
    /// Returns `None` when the variants differ.
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        let ordering = match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Uuid(a), Self::Uuid(b)) => a.cmp(b),
            _ => return None,
        };
        Some(ordering)
    }

    /// Total order used for sorting: same-variant values compare by value,
    /// mixed variants fall back to variant order.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }

    /// Returns `true` when the value can be written into a token and read
    /// back unchanged.
    pub fn is_encodable(&self) -> bool {
        match self {
            Self::Float(value) => value.is_finite(),
            _ => true,
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::Timestamp(_) => 4,
            Self::Uuid(_) => 5,
        }
    }
}

impl PartialOrd for BoundaryValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.compare(other)
    }
}

impl fmt::Display for BoundaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Timestamp(value) => write!(f, "{value}"),
            Self::Uuid(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for BoundaryValue {
                fn from(value: $source) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    i16 => Int,
    u32 => Int,
    u16 => Int,
    f64 => Float,
    f32 => Float,
    String => String,
    &str => String,
    Timestamp => Timestamp,
    Uuid => Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_variant_ordering() {
        assert!(BoundaryValue::from(1) < BoundaryValue::from(2));
        assert!(BoundaryValue::from("a") < BoundaryValue::from("b"));
        assert!(BoundaryValue::from(false) < BoundaryValue::from(true));

        let early = Timestamp::from_second(1_000).unwrap();
        let late = Timestamp::from_second(2_000).unwrap();
        assert!(BoundaryValue::from(early) < BoundaryValue::from(late));
    }

    #[test]
    fn test_mixed_variants_are_incomparable() {
        let int = BoundaryValue::from(1);
        let string = BoundaryValue::from("1");
        assert_eq!(int.partial_cmp(&string), None);
        assert_eq!(int.total_cmp(&string), Ordering::Less);
    }

    #[test]
    fn test_float_total_order() {
        let nan = BoundaryValue::Float(f64::NAN);
        let one = BoundaryValue::Float(1.0);
        assert_eq!(one.compare(&nan), Some(Ordering::Less));
        assert!(!nan.is_encodable());
        assert!(one.is_encodable());
    }

    #[test]
    fn test_serde_compact_form() {
        let json = serde_json::to_string(&BoundaryValue::from(5)).unwrap();
        assert_eq!(json, r#"{"i":5}"#);

        let value: BoundaryValue = serde_json::from_str(r#"{"s":"abc"}"#).unwrap();
        assert_eq!(value, BoundaryValue::from("abc"));
    }

    #[test]
    fn test_display() {
        assert_eq!(BoundaryValue::from(42).to_string(), "42");
        assert_eq!(BoundaryValue::from("x").to_string(), "\"x\"");
    }
}
