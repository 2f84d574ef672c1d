// ============================================================================
// spark-observe - Type Definitions
// Identities, callback types and the type-erased source trait
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::constants::*;
use super::context::with_context;
use super::subscribers::SubscriberRegistry;

// =============================================================================
// IDENTITIES
// =============================================================================

/// Identity of an observable source (scalar or array).
///
/// Allocated from the thread-local context, unique per thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u64);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a computed value. Owner key for dependent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComputedId(pub u64);

impl fmt::Display for ComputedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// CALLBACK TYPES
// =============================================================================

/// A user subscriber, invoked with the post-mutation value.
pub type SubscriberFn<T> = Rc<dyn Fn(&T)>;

/// A computed's recompute callback, registered on every source it reads.
pub type RecomputeFn = Rc<dyn Fn()>;

// =============================================================================
// TYPE-ERASED SOURCE
// =============================================================================
//
// The tracker only needs identity and the ability to add/remove a computed's
// dependent entry. It never touches the value, so sources of any T can live
// in the same Vec<Rc<dyn AnySource>>.
// =============================================================================

/// Type-erased view of a readable reactive source.
pub trait AnySource {
    /// Stable identity of this source
    fn id(&self) -> SourceId;

    /// Kind flags (OBSERVABLE or OBSERVABLE_ARRAY)
    fn flags(&self) -> u32;

    /// Register `owner`'s recompute callback.
    ///
    /// Idempotent per owner; returns false if `owner` was already registered.
    fn add_dependent(&self, owner: ComputedId, recompute: RecomputeFn) -> bool;

    /// Remove `owner`'s recompute callback. Returns true if one was removed.
    fn remove_dependent(&self, owner: ComputedId) -> bool;

    /// Number of registry entries (user subscribers and dependents)
    fn subscriber_count(&self) -> usize;

    /// Check if this source is an observable array
    fn is_array(&self) -> bool {
        self.flags() & OBSERVABLE_ARRAY != 0
    }
}

// =============================================================================
// SOURCE INNER
// =============================================================================

/// Shared interior of `Observable<T>` and `ObservableArray<T>`.
///
/// Holds the boxed value and its subscriber registry. Borrows of `value` are
/// always released before the registry fans out, so subscribers may read or
/// write this source re-entrantly.
pub struct SourceInner<T> {
    id: SourceId,
    flags: u32,
    value: RefCell<T>,
    subscribers: SubscriberRegistry<T>,
}

impl<T> SourceInner<T> {
    /// Create a new source of the given kind.
    pub fn new(value: T, kind: u32) -> Self {
        Self {
            id: with_context(|ctx| ctx.next_source_id()),
            flags: kind & KIND_MASK,
            value: RefCell::new(value),
            subscribers: SubscriberRegistry::new(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    /// Clone the current value (no tracking).
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    /// Borrow the current value (no tracking).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value, returning the previous one. Does not notify.
    pub fn replace(&self, value: T) -> T {
        self.value.replace(value)
    }

    /// Mutate the value in place. Does not notify.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.value.borrow_mut())
    }

    pub fn subscribers(&self) -> &SubscriberRegistry<T> {
        &self.subscribers
    }

    /// Fan out the current value to every registry entry.
    pub fn notify(&self)
    where
        T: Clone,
    {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.get();
        tracing::trace!(
            source = %self.id,
            subscribers = self.subscribers.len(),
            "notify"
        );
        self.subscribers.notify(&snapshot);
    }
}

impl<T: 'static> AnySource for SourceInner<T> {
    fn id(&self) -> SourceId {
        self.id
    }

    fn flags(&self) -> u32 {
        self.flags
    }

    fn add_dependent(&self, owner: ComputedId, recompute: RecomputeFn) -> bool {
        self.subscribers.add_dependent(owner, recompute)
    }

    fn remove_dependent(&self, owner: ComputedId) -> bool {
        self.subscribers.remove_dependent(owner)
    }

    fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: fmt::Debug> fmt::Debug for SourceInner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceInner")
            .field("id", &self.id)
            .field("value", &self.value.borrow())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn source_ids_are_unique() {
        let a = SourceInner::new(1, OBSERVABLE);
        let b = SourceInner::new(1, OBSERVABLE);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn kind_flags_are_kept() {
        let scalar = SourceInner::new(0, OBSERVABLE);
        let array = SourceInner::new(vec![0], OBSERVABLE_ARRAY | EVALUATING);

        assert!(!scalar.is_array());
        assert!(array.is_array());
        // state bits never leak into a source's flags
        assert_eq!(array.flags(), OBSERVABLE_ARRAY);
    }

    #[test]
    fn replace_and_mutate_do_not_notify() {
        let source = SourceInner::new(1, OBSERVABLE);
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        source
            .subscribers()
            .subscribe(Rc::new(move |_: &i32| calls_clone.set(calls_clone.get() + 1)));

        assert_eq!(source.replace(2), 1);
        source.mutate(|v| *v += 1);
        assert_eq!(source.get(), 3);
        assert_eq!(calls.get(), 0);

        source.notify();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn heterogeneous_source_storage() {
        let int_source: Rc<dyn AnySource> = Rc::new(SourceInner::new(42i32, OBSERVABLE));
        let string_source: Rc<dyn AnySource> =
            Rc::new(SourceInner::new(String::from("hello"), OBSERVABLE));
        let vec_source: Rc<dyn AnySource> =
            Rc::new(SourceInner::new(vec![1, 2, 3], OBSERVABLE_ARRAY));

        let sources = [int_source, string_source, vec_source];
        let owner = ComputedId(1);
        let recompute: RecomputeFn = Rc::new(|| {});

        for source in &sources {
            assert!(source.add_dependent(owner, recompute.clone()));
            assert!(!source.add_dependent(owner, recompute.clone()));
            assert_eq!(source.subscriber_count(), 1);
        }

        assert!(sources[2].is_array());
        assert!(sources[0].remove_dependent(owner));
        assert_eq!(sources[0].subscriber_count(), 0);
        assert_eq!(sources[1].subscriber_count(), 1);
    }

    #[test]
    fn ids_display_with_hash() {
        assert_eq!(SourceId(3).to_string(), "#3");
        assert_eq!(ComputedId(12).to_string(), "#12");
    }
}
