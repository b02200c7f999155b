use core::{convert::Infallible, error, fmt, marker::PhantomData};

/// Decides whether an item belongs in a query's result.
///
/// Selectors are pure: `matches` must not change the selector
/// or the item.
pub trait Selector<T: ?Sized> {
    /// The error returned when an item cannot be evaluated.
    type Error: error::Error + Send + Sync + 'static;

    /// Reports whether `item` matches.
    fn matches(&self, item: &T) -> Result<bool, Self::Error>;
}

impl<T, F> Selector<T> for F
where
    T: ?Sized,
    F: Fn(&T) -> bool,
{
    type Error = Infallible;

    fn matches(&self, item: &T) -> Result<bool, Self::Error> {
        Ok(self(item))
    }
}

/// A [`Selector`] built from a fallible closure.
///
/// See [`try_selector`].
pub struct TrySelector<F, E> {
    f: F,
    _err: PhantomData<fn() -> E>,
}

/// Adapts `f` into a [`Selector`] whose errors are reported by
/// the store.
///
/// ```
/// use kestrel_store::{CollectionStore, Store, try_selector};
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("odd")]
/// struct Odd;
///
/// let store: CollectionStore<u32> = [2, 4, 5].into_iter().collect();
/// let even = try_selector(|n: &u32| if n % 2 == 0 { Ok(true) } else { Err(Odd) });
/// let err = store.get_matches(&even).unwrap_err();
/// assert!(err.downcast_ref::<Odd>().is_some());
/// ```
pub fn try_selector<T, F, E>(f: F) -> TrySelector<F, E>
where
    T: ?Sized,
    F: Fn(&T) -> Result<bool, E>,
    E: error::Error + Send + Sync + 'static,
{
    TrySelector {
        f,
        _err: PhantomData,
    }
}

impl<T, F, E> Selector<T> for TrySelector<F, E>
where
    T: ?Sized,
    F: Fn(&T) -> Result<bool, E>,
    E: error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn matches(&self, item: &T) -> Result<bool, E> {
        (self.f)(item)
    }
}

impl<F, E> fmt::Debug for TrySelector<F, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrySelector").finish_non_exhaustive()
    }
}
