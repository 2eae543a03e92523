//! Extraction of boundary values from items.

use std::borrow::Cow;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;

use super::{BoundaryValue, BoundaryValues, SortSpec};
use crate::{Error, Result};

/// Reads sort-key properties from items of type `T`.
pub trait BoundaryExtractor<T: ?Sized>: Send + Sync {
    /// Resolves a single property of `item`.
    ///
    /// Returns `Ok(None)` when the property is null or absent.
    fn property(&self, item: &T, name: &str) -> Result<Option<BoundaryValue>>;

    /// Builds the boundary tuple of `item` for every field of `sort`.
    ///
    /// # Errors
    ///
    /// - [`Error::NullBoundaryValue`] if a property is null or absent.
    /// - [`Error::UnsupportedValue`] if a property cannot be compared or
    ///   cannot be carried in a token (a non-finite float).
    fn extract(&self, item: &T, sort: &SortSpec) -> Result<BoundaryValues> {
        sort.names()
            .map(|name| {
                let value = self
                    .property(item, name)?
                    .ok_or_else(|| Error::NullBoundaryValue {
                        property: name.to_owned(),
                    })?;
                checked(name, value).map(|value| (name.to_owned(), value))
            })
            .collect()
    }
}

fn checked(name: &str, value: BoundaryValue) -> Result<BoundaryValue> {
    if value.is_encodable() {
        return Ok(value);
    }

    Err(Error::UnsupportedValue {
        property: name.to_owned(),
        found: Cow::Borrowed("non-finite float"),
    })
}

/// Extracts boundary values from any `Serialize` item.
///
/// The item is serialized to a JSON value once per extraction and properties
/// are resolved by name, with `.` separating nested object keys
/// (`"author.id"`). Strings stay strings: a timestamp serialized as RFC 3339
/// text is compared as text, which is only correct for a uniform format.
/// Use [`FnExtractor`] when typed values are required.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonBoundaryExtractor;

impl JsonBoundaryExtractor {
    /// Creates a new JSON extractor.
    pub fn new() -> Self {
        Self
    }

    fn to_json<T: Serialize + ?Sized>(item: &T) -> Result<Value> {
        serde_json::to_value(item).map_err(|error| Error::UnsupportedValue {
            property: String::from("<item>"),
            found: Cow::Owned(format!("unserializable item ({error})")),
        })
    }

    fn lookup(root: &Value, name: &str) -> Result<Option<BoundaryValue>> {
        let mut current = root;
        for segment in name.split('.') {
            match current.get(segment) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }

        let unsupported = |found: &'static str| Error::UnsupportedValue {
            property: name.to_owned(),
            found: Cow::Borrowed(found),
        };

        match current {
            Value::Null => Ok(None),
            Value::Bool(value) => Ok(Some(BoundaryValue::Bool(*value))),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Ok(Some(BoundaryValue::Int(value)))
                } else if number.is_u64() {
                    Err(unsupported("integer out of range"))
                } else {
                    number
                        .as_f64()
                        .map(|value| Some(BoundaryValue::Float(value)))
                        .ok_or_else(|| unsupported("number"))
                }
            }
            Value::String(value) => Ok(Some(BoundaryValue::String(value.clone()))),
            Value::Array(_) => Err(unsupported("array")),
            Value::Object(_) => Err(unsupported("object")),
        }
    }
}

impl<T: Serialize + ?Sized> BoundaryExtractor<T> for JsonBoundaryExtractor {
    fn property(&self, item: &T, name: &str) -> Result<Option<BoundaryValue>> {
        Self::lookup(&Self::to_json(item)?, name)
    }

    fn extract(&self, item: &T, sort: &SortSpec) -> Result<BoundaryValues> {
        let root = Self::to_json(item)?;
        sort.names()
            .map(|name| {
                let value = Self::lookup(&root, name)?.ok_or_else(|| Error::NullBoundaryValue {
                    property: name.to_owned(),
                })?;
                checked(name, value).map(|value| (name.to_owned(), value))
            })
            .collect()
    }
}

/// Extracts boundary values with a closure.
///
/// The closure receives the item and a property name and returns `None` for
/// null or unknown properties.
pub struct FnExtractor<T: ?Sized, F> {
    f: F,
    _item: PhantomData<fn(&T)>,
}

impl<T: ?Sized, F> FnExtractor<T, F>
where
    F: Fn(&T, &str) -> Option<BoundaryValue> + Send + Sync,
{
    /// Wraps `f` as an extractor.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _item: PhantomData,
        }
    }
}

impl<T: ?Sized, F: Clone> Clone for FnExtractor<T, F> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _item: PhantomData,
        }
    }
}

impl<T: ?Sized, F> std::fmt::Debug for FnExtractor<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnExtractor").finish_non_exhaustive()
    }
}

impl<T: ?Sized, F> BoundaryExtractor<T> for FnExtractor<T, F>
where
    F: Fn(&T, &str) -> Option<BoundaryValue> + Send + Sync,
{
    fn property(&self, item: &T, name: &str) -> Result<Option<BoundaryValue>> {
        Ok((self.f)(item, name))
    }
}
