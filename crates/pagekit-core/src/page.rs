//! Fetched pages.

use crate::identifier::PageIdentifier;

/// One fetched slice of a pageable.
///
/// A page is immutable: it holds the ordered `(key, item)` pairs, the
/// identifier that produced it and the identifiers of the adjacent pages.
/// An adjacent identifier is absent only at the true start or end of the
/// data set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<K, T> {
    identifier: PageIdentifier,
    items: Vec<(K, T)>,
    items_per_page: usize,
    next: Option<PageIdentifier>,
    previous: Option<PageIdentifier>,
}

impl<K, T> Page<K, T> {
    pub(crate) fn new(
        identifier: PageIdentifier,
        items: Vec<(K, T)>,
        items_per_page: usize,
        next: Option<PageIdentifier>,
        previous: Option<PageIdentifier>,
    ) -> Self {
        Self {
            identifier,
            items,
            items_per_page,
            next,
            previous,
        }
    }

    /// Returns the identifier that produced this page.
    pub fn identifier(&self) -> &PageIdentifier {
        &self.identifier
    }

    /// Returns the `(key, item)` pairs in order.
    pub fn items(&self) -> &[(K, T)] {
        &self.items
    }

    /// Iterates over `(key, item)` pairs in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&K, &T)> {
        self.items.iter().map(|(key, item)| (key, item))
    }

    /// Iterates over keys in order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
        self.items.iter().map(|(key, _)| key)
    }

    /// Iterates over items in order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &T> {
        self.items.iter().map(|(_, item)| item)
    }

    /// Returns the number of items on the page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the 1-based page number, when known.
    pub fn page_number(&self) -> Option<u64> {
        self.identifier.page_number()
    }

    /// Returns the page size the page was fetched with.
    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    /// Returns the identifier of the following page.
    pub fn next_identifier(&self) -> Option<&PageIdentifier> {
        self.next.as_ref()
    }

    /// Returns the identifier of the preceding page.
    pub fn previous_identifier(&self) -> Option<&PageIdentifier> {
        self.previous.as_ref()
    }

    /// Returns `true` if a following page exists.
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// Returns `true` if a preceding page exists.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Consumes the page, returning its `(key, item)` pairs.
    pub fn into_items(self) -> Vec<(K, T)> {
        self.items
    }

    /// Transforms every item, keeping keys and identifiers.
    pub fn map<U, F>(self, mut f: F) -> Page<K, U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            identifier: self.identifier,
            items: self
                .items
                .into_iter()
                .map(|(key, item)| (key, f(item)))
                .collect(),
            items_per_page: self.items_per_page,
            next: self.next,
            previous: self.previous,
        }
    }
}

impl<K, T> IntoIterator for Page<K, T> {
    type IntoIter = std::vec::IntoIter<(K, T)>;
    type Item = (K, T);

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
