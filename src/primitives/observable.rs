// ============================================================================
// spark-observe - Observable Primitive
// A boxed scalar value with synchronous subscriber fan-out
// ============================================================================

use std::rc::Rc;

use crate::core::constants::OBSERVABLE;
use crate::core::types::{AnySource, SourceId, SourceInner};
use crate::reactivity::tracking::track_read;

// =============================================================================
// OBSERVABLE<T> - The public observable handle
// =============================================================================

/// A reactive cell holding a value of type T.
///
/// Every write replaces the value and notifies every subscriber, in
/// subscription order, before returning. There is no equality check: writing
/// the same value notifies again.
///
/// Reading inside a computed's evaluation registers the observable as one of
/// that computed's dependencies.
///
/// # Example
///
/// ```
/// use spark_observe::observe;
///
/// let name = observe(String::from("value"));
/// assert_eq!(name.get(), "value");
///
/// name.set(String::from("newvalue"));
/// assert_eq!(name.get(), "newvalue");
/// ```
pub struct Observable<T> {
    inner: Rc<SourceInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(SourceInner::new(value, OBSERVABLE)),
        }
    }

    /// Get the current value (cloning).
    ///
    /// Inside a computed's evaluation this registers the dependency.
    pub fn get(&self) -> T {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.get()
    }

    /// Access the current value with a closure (avoids cloning).
    ///
    /// Tracks the read like `get()`.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same observable.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.with(f)
    }

    /// Replace the value and notify every subscriber with it.
    pub fn set(&self, value: T) {
        self.inner.replace(value);
        self.inner.notify();
    }

    /// Update the value in place, then notify.
    ///
    /// # Example
    ///
    /// ```
    /// use spark_observe::observe;
    ///
    /// let count = observe(0);
    /// count.update(|n| *n += 1);
    /// assert_eq!(count.get(), 1);
    /// ```
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.inner.mutate(f);
        self.inner.notify();
    }

    /// Subscribe to writes. Subscribers are called with the new value.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) {
        self.inner.subscribers().subscribe(Rc::new(f));
    }

    /// Drop every subscriber, including computeds that depend on this value.
    pub fn remove_subscribers(&self) {
        self.inner.subscribers().clear();
    }

    /// Number of registered callbacks (user subscribers and dependents).
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    pub fn id(&self) -> SourceId {
        self.inner.id()
    }

    /// Get a reference to the inner source (for advanced use).
    pub fn inner(&self) -> &Rc<SourceInner<T>> {
        &self.inner
    }

    /// Get the inner source as a type-erased AnySource.
    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone()
    }
}

impl<T: Clone + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.with(|value| {
            f.debug_struct("Observable")
                .field("id", &self.inner.id())
                .field("value", value)
                .field("subscribers", &self.inner.subscribers().len())
                .finish()
        })
    }
}

// =============================================================================
// CREATION FUNCTIONS
// =============================================================================

/// Create a new observable.
///
/// # Example
///
/// ```
/// use spark_observe::observe;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let count = observe(0);
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let seen_clone = seen.clone();
/// count.subscribe(move |v| seen_clone.borrow_mut().push(*v));
///
/// count.set(1);
/// count.set(1);
/// assert_eq!(*seen.borrow(), vec![1, 1]);
/// ```
pub fn observe<T: Clone + 'static>(value: T) -> Observable<T> {
    Observable::new(value)
}

/// Create an observable holding `T::default()`.
pub fn observe_default<T: Clone + Default + 'static>() -> Observable<T> {
    Observable::default()
}

// =============================================================================
// TESTS
// =============================================================================
