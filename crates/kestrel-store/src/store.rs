use alloc::{boxed::Box, sync::Arc, vec::Vec};
use core::{error, fmt};

use derive_where::derive_where;
use tracing::trace;

use crate::Selector;

/// A selector could not be evaluated against an item.
///
/// The selector's error is available through
/// [`source`][error::Error::source] and
/// [`downcast_ref`][Self::downcast_ref].
#[derive(Debug, thiserror::Error)]
#[error("unable to match item: {0}")]
pub struct StoreError(#[source] Box<dyn error::Error + Send + Sync>);

impl StoreError {
    /// Wraps `cause`.
    pub fn new<E>(cause: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Self(Box::new(cause))
    }

    /// Returns the cause if it is an `E`.
    pub fn downcast_ref<E: error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref()
    }
}

/// A read-only collection that can be searched with a
/// [`Selector`].
pub trait Store<T> {
    /// Returns every item matched by `selector`, in the store's
    /// iteration order.
    ///
    /// No matches is not an error: the result is empty. If the
    /// selector fails on any item the whole query fails.
    fn get_matches<S>(&self, selector: &S) -> Result<Vec<Arc<T>>, StoreError>
    where
        S: Selector<T> + ?Sized;
}

impl<T, St: Store<T> + ?Sized> Store<T> for &St {
    fn get_matches<S>(&self, selector: &S) -> Result<Vec<Arc<T>>, StoreError>
    where
        S: Selector<T> + ?Sized,
    {
        (**self).get_matches(selector)
    }
}

/// A [`Store`] backed by a [`Vec`].
#[derive_where(Clone, Default)]
pub struct CollectionStore<T> {
    items: Vec<Arc<T>>,
}

impl<T> CollectionStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Creates a store from items that are already shared.
    pub fn from_shared<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Arc<T>>,
    {
        Self {
            items: items.into_iter().collect(),
        }
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Reports whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates over the items.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.items.iter()
    }
}

impl<T> Store<T> for CollectionStore<T> {
    fn get_matches<S>(&self, selector: &S) -> Result<Vec<Arc<T>>, StoreError>
    where
        S: Selector<T> + ?Sized,
    {
        let mut matches = Vec::new();
        for item in &self.items {
            if selector.matches(item).map_err(StoreError::new)? {
                matches.push(Arc::clone(item));
            }
        }
        trace!(
            candidates = self.items.len(),
            matches = matches.len(),
            "selected items"
        );
        Ok(matches)
    }
}

impl<T> FromIterator<T> for CollectionStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_shared(iter.into_iter().map(Arc::new))
    }
}

impl<T> From<Vec<T>> for CollectionStore<T> {
    fn from(items: Vec<T>) -> Self {
        items.into_iter().collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for CollectionStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.items).finish()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::String, vec};
    use core::error::Error as _;

    use test_log::test;

    use super::*;
    use crate::try_selector;

    #[derive(Debug, thiserror::Error)]
    #[error("cannot evaluate {0}")]
    struct Unevaluable(u32);

    #[test]
    fn test_matches_in_order() {
        let store: CollectionStore<u32> = vec![5, 1, 4, 2, 3].into();
        let got = store.get_matches(&|n: &u32| *n > 2).unwrap();
        let got: Vec<u32> = got.iter().map(|n| **n).collect();
        assert_eq!(got, [5, 4, 3]);
    }

    #[test]
    fn test_no_matches() {
        let store: CollectionStore<u32> = (0..4).collect();
        assert!(store.get_matches(&|_: &u32| false).unwrap().is_empty());

        let empty = CollectionStore::<u32>::new();
        assert!(empty.is_empty());
        assert!(empty.get_matches(&|_: &u32| true).unwrap().is_empty());
    }

    #[test]
    fn test_items_are_shared() {
        let item = Arc::new(String::from("cert"));
        let store = CollectionStore::from_shared([Arc::clone(&item)]);
        let got = store.get_matches(&|_: &String| true).unwrap();
        assert!(Arc::ptr_eq(&got[0], &item));
        assert_eq!(Arc::strong_count(&item), 3);
    }

    #[test]
    fn test_selector_error() {
        let store: CollectionStore<u32> = (0..10).collect();
        let sel = try_selector(|n: &u32| if *n == 7 { Err(Unevaluable(*n)) } else { Ok(true) });
        let err = store.get_matches(&sel).unwrap_err();
        assert_eq!(err.to_string(), "unable to match item: cannot evaluate 7");
        assert!(matches!(err.downcast_ref::<Unevaluable>(), Some(Unevaluable(7))));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_through_reference() {
        fn count<St: Store<u32>>(store: St) -> usize {
            store.get_matches(&|_: &u32| true).map_or(0, |m| m.len())
        }
        let store: CollectionStore<u32> = (0..3).collect();
        assert_eq!(count(&store), 3);
        assert_eq!(store.clone().len(), 3);
    }
}
