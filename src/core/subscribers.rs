// ============================================================================
// spark-observe - Subscriber Registry
// Ordered callback list shared by every reactive primitive
// ============================================================================
//
// Two kinds of entries live in one ordered list so that notification order is
// registration order across both:
//
// - User subscribers: appended by subscribe(), never deduplicated, only
//   removed by clear().
// - Dependent entries: a computed's recompute callback, at most one per
//   owner, removable by owner so stale dependencies can be dropped.
// ============================================================================

use std::cell::RefCell;

use super::types::{ComputedId, RecomputeFn, SubscriberFn};

enum Entry<T> {
    Subscriber(SubscriberFn<T>),
    Dependent { owner: ComputedId, recompute: RecomputeFn },
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        match self {
            Entry::Subscriber(f) => Entry::Subscriber(f.clone()),
            Entry::Dependent { owner, recompute } => Entry::Dependent {
                owner: *owner,
                recompute: recompute.clone(),
            },
        }
    }
}

/// Ordered list of callbacks attached to one reactive primitive.
pub struct SubscriberRegistry<T> {
    entries: RefCell<Vec<Entry<T>>>,
}

impl<T> SubscriberRegistry<T> {
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Append a user subscriber.
    pub fn subscribe(&self, f: SubscriberFn<T>) {
        self.entries.borrow_mut().push(Entry::Subscriber(f));
    }

    /// Append `owner`'s recompute callback unless it is already present.
    pub fn add_dependent(&self, owner: ComputedId, recompute: RecomputeFn) -> bool {
        let mut entries = self.entries.borrow_mut();
        let present = entries
            .iter()
            .any(|entry| matches!(entry, Entry::Dependent { owner: o, .. } if *o == owner));
        if present {
            return false;
        }
        entries.push(Entry::Dependent { owner, recompute });
        true
    }

    /// Remove `owner`'s recompute callback.
    pub fn remove_dependent(&self, owner: ComputedId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| !matches!(entry, Entry::Dependent { owner: o, .. } if *o == owner));
        entries.len() != before
    }

    /// Drop every entry, user subscribers and dependents alike.
    pub fn clear(&self) {
        self.entries.replace(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Number of dependent (computed-owned) entries.
    pub fn dependent_count(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| matches!(entry, Entry::Dependent { .. }))
            .count()
    }

    /// Invoke every entry in registration order.
    ///
    /// The list is snapshotted first and the borrow released, so entries
    /// added or cleared during the fan-out only affect the next notification.
    pub fn notify(&self, value: &T) {
        let entries: Vec<Entry<T>> = self.entries.borrow().clone();

        for entry in entries {
            match entry {
                Entry::Subscriber(f) => f(value),
                Entry::Dependent { recompute, .. } => recompute(),
            }
        }
    }
}

impl<T> Default for SubscriberRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
