// ============================================================================
// spark-observe - ObservableArray
// A Vec whose mutators notify subscribers with the post-mutation items
// ============================================================================

use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::{Bound, RangeBounds};
use std::rc::Rc;

use crate::core::constants::OBSERVABLE_ARRAY;
use crate::core::types::{AnySource, SourceId, SourceInner};
use crate::reactivity::tracking::track_read;

// =============================================================================
// OBSERVABLE ARRAY
// =============================================================================

/// A reactive sequence.
///
/// Two kinds of operations:
/// 1. Mutators (`push`, `pop`, `shift`, `unshift`, `splice`, `sort`,
///    `reverse`, `remove`, `remove_all`, `update`, `set`): change the items,
///    then call every subscriber once with the resulting items, then return
///    the operation's result.
/// 2. Queries (`find`, `find_index`, `filter`, `map`, `some`, `every`,
///    `reduce`, `join`, `slice`, ...): never mutate and never notify. Like
///    `get()`, they register a dependency when called inside a computed.
///
/// # Example
///
/// ```
/// use spark_observe::observe_array;
///
/// let items = observe_array(vec!["a", "b", "c"]);
///
/// assert_eq!(items.pop(), Some("c"));
/// assert_eq!(items.push("d"), 3);
/// assert_eq!(items.join(""), "abd");
///
/// let removed = items.remove(|x, _, _| *x < "c");
/// assert_eq!(removed, vec!["a", "b"]);
/// assert_eq!(items.get(), vec!["d"]);
/// ```
pub struct ObservableArray<T> {
    inner: Rc<SourceInner<Vec<T>>>,
}

impl<T> Clone for ObservableArray<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> ObservableArray<T> {
    /// Create a new empty observable array.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Create an observable array from an existing vec.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(SourceInner::new(items, OBSERVABLE_ARRAY)),
        }
    }

    /// Track the read, then borrow the items.
    fn read<R>(&self, f: impl FnOnce(&Vec<T>) -> R) -> R {
        track_read(self.inner.clone() as Rc<dyn AnySource>);
        self.inner.with(f)
    }

    /// Apply a mutation, then notify with the resulting items.
    fn mutate<R>(&self, op: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let result = self.inner.mutate(op);
        self.inner.notify();
        result
    }

    /// First index matching `predicate`, without tracking.
    fn position(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.inner.with(|items| items.iter().position(|item| predicate(item)))
    }

    // =========================================================================
    // WHOLE-ARRAY ACCESS
    // =========================================================================

    /// Clone the current items.
    ///
    /// Inside a computed's evaluation this registers the dependency.
    pub fn get(&self) -> Vec<T> {
        self.read(|items| items.clone())
    }

    /// Access the items with a closure (avoids cloning). Tracks the read.
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.read(|items| f(items))
    }

    /// Replace the whole array and notify.
    pub fn set(&self, items: Vec<T>) {
        self.inner.replace(items);
        self.inner.notify();
    }

    // =========================================================================
    // SUBSCRIPTIONS
    // =========================================================================

    /// Subscribe to mutations. Subscribers receive the post-mutation items.
    pub fn subscribe(&self, f: impl Fn(&Vec<T>) + 'static) {
        self.inner.subscribers().subscribe(Rc::new(f));
    }

    /// Drop every subscriber, including computeds that depend on this array.
    pub fn remove_subscribers(&self) {
        self.inner.subscribers().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }

    // =========================================================================
    // PUSH / POP / SHIFT / UNSHIFT
    // =========================================================================

    /// Append an element. Returns the new length.
    pub fn push(&self, value: T) -> usize {
        self.mutate(|items| {
            items.push(value);
            items.len()
        })
    }

    /// Remove the last element. Notifies even when the array was empty.
    pub fn pop(&self) -> Option<T> {
        self.mutate(|items| items.pop())
    }

    /// Remove the first element. Notifies even when the array was empty.
    pub fn shift(&self) -> Option<T> {
        self.mutate(|items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    /// Insert `values` at the front, keeping their order. Returns the new length.
    pub fn unshift(&self, values: impl IntoIterator<Item = T>) -> usize {
        self.mutate(|items| {
            items.splice(0..0, values);
            items.len()
        })
    }

    // =========================================================================
    // SPLICE
    // =========================================================================

    /// Remove `delete_count` elements starting at `start`. Returns them.
    ///
    /// Both arguments are clamped to the array bounds.
    pub fn splice(&self, start: usize, delete_count: usize) -> Vec<T> {
        self.splice_with(start, delete_count, std::iter::empty())
    }

    /// Like [`splice`](Self::splice), then insert `values` at `start`.
    pub fn splice_with(
        &self,
        start: usize,
        delete_count: usize,
        values: impl IntoIterator<Item = T>,
    ) -> Vec<T> {
        self.mutate(|items| {
            let start = start.min(items.len());
            let end = start.saturating_add(delete_count).min(items.len());
            let removed: Vec<T> = items.splice(start..end, values).collect();
            removed
        })
    }

    // =========================================================================
    // SORT / REVERSE
    // =========================================================================

    /// Sort in place with a comparator. Returns the sorted items.
    ///
    /// # Panics
    ///
    /// Panics if `compare` reads this same array.
    pub fn sort(&self, compare: impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
        self.mutate(|items| {
            items.sort_by(compare);
            items.clone()
        })
    }

    /// Reverse in place. Returns the reversed items.
    pub fn reverse(&self) -> Vec<T> {
        self.mutate(|items| {
            items.reverse();
            items.clone()
        })
    }

    // =========================================================================
    // REMOVE / UPDATE
    // =========================================================================

    /// Remove every element matching `predicate` and return them in order.
    ///
    /// The predicate receives `(value, index, items)`. Notifies once.
    pub fn remove(&self, mut predicate: impl FnMut(&T, usize, &[T]) -> bool) -> Vec<T> {
        let (removed, kept) = self.inner.with(|items| {
            let mut removed = Vec::new();
            let mut kept = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                if predicate(item, index, items) {
                    removed.push(item.clone());
                } else {
                    kept.push(item.clone());
                }
            }
            (removed, kept)
        });

        self.set(kept);
        removed
    }

    /// Empty the array and return its previous contents. Notifies once.
    pub fn remove_all(&self) -> Vec<T> {
        let removed = self.inner.replace(Vec::new());
        self.inner.notify();
        removed
    }

    /// Replace the first element matching `predicate` with `value`.
    ///
    /// Returns `Some(value)` after notifying. When nothing matches the array
    /// is left untouched, nobody is notified and `None` is returned.
    pub fn update(&self, predicate: impl FnMut(&T) -> bool, value: T) -> Option<T> {
        let index = self.position(predicate)?;
        let written = value.clone();
        self.mutate(|items| items[index] = written);
        Some(value)
    }

    // =========================================================================
    // QUERIES (track, never notify)
    // =========================================================================

    /// Index of the first element matching `predicate`.
    pub fn find_index(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.read(|items| items.iter().position(|item| predicate(item)))
    }

    /// First element matching `predicate`.
    pub fn find(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<T> {
        self.read(|items| items.iter().find(|item| predicate(item)).cloned())
    }

    /// Elements matching `predicate`, in order.
    pub fn filter(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        self.read(|items| {
            items
                .iter()
                .filter(|item| predicate(item))
                .cloned()
                .collect()
        })
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Vec<U> {
        self.read(|items| items.iter().map(f).collect())
    }

    /// True if any element matches. False for an empty array.
    pub fn some(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.read(|items| items.iter().any(|item| predicate(item)))
    }

    /// True if every element matches. True for an empty array.
    pub fn every(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.read(|items| items.iter().all(|item| predicate(item)))
    }

    /// Fold the elements left to right starting from `init`.
    pub fn reduce<U>(&self, init: U, f: impl FnMut(U, &T) -> U) -> U {
        self.read(|items| items.iter().fold(init, f))
    }

    /// Join the elements' `Display` forms with `separator`.
    pub fn join(&self, separator: &str) -> String
    where
        T: Display,
    {
        self.read(|items| {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(separator)
        })
    }

    /// Copy of the elements in `range`, clamped to the array bounds.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Vec<T> {
        self.read(|items| {
            let len = items.len();
            let start = match range.start_bound() {
                Bound::Included(&s) => s,
                Bound::Excluded(&s) => s.saturating_add(1),
                Bound::Unbounded => 0,
            }
            .min(len);
            let end = match range.end_bound() {
                Bound::Included(&e) => e.saturating_add(1),
                Bound::Excluded(&e) => e,
                Bound::Unbounded => len,
            }
            .min(len);

            if start >= end {
                Vec::new()
            } else {
                items[start..end].to_vec()
            }
        })
    }

    /// Element at `index`.
    pub fn at(&self, index: usize) -> Option<T> {
        self.read(|items| items.get(index).cloned())
    }

    pub fn len(&self) -> usize {
        self.read(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // UTILITIES
    // =========================================================================

    pub fn id(&self) -> SourceId {
        self.inner.id()
    }

    /// Get a reference to the inner source (for advanced use).
    pub fn inner(&self) -> &Rc<SourceInner<Vec<T>>> {
        &self.inner
    }

    /// Get the inner source as a type-erased AnySource.
    pub fn as_any_source(&self) -> Rc<dyn AnySource> {
        self.inner.clone()
    }
}

impl<T: Clone + 'static> Default for ObservableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> From<Vec<T>> for ObservableArray<T> {
    fn from(items: Vec<T>) -> Self {
        Self::from_vec(items)
    }
}

impl<T: Clone + 'static> FromIterator<T> for ObservableArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableArray<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.with(|items| {
            f.debug_struct("ObservableArray")
                .field("id", &self.inner.id())
                .field("items", items)
                .field("len", &items.len())
                .finish()
        })
    }
}

/// Create a new observable array.
pub fn observe_array<T: Clone + 'static>(items: Vec<T>) -> ObservableArray<T> {
    ObservableArray::from_vec(items)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// Subscribe a recorder that keeps every notified snapshot.
    fn record<T: Clone + 'static>(array: &ObservableArray<T>) -> Rc<RefCell<Vec<Vec<T>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();
        array.subscribe(move |items: &Vec<T>| log_clone.borrow_mut().push(items.clone()));
        log
    }

    fn letters(s: &str) -> ObservableArray<char> {
        observe_array(s.chars().collect())
    }

    #[test]
    fn create_empty_array() {
        let array: ObservableArray<i32> = ObservableArray::new();
        assert_eq!(array.len(), 0);
        assert!(array.is_empty());
    }

    #[test]
    fn replace_notifies_with_new_items() {
        let array = observe_array(Vec::<&str>::new());
        let log = record(&array);

        array.set(vec!["a", "b", "c"]);
        assert_eq!(*log.borrow(), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn pop_and_notify() {
        let array = letters("abc");
        let log = record(&array);

        assert_eq!(array.pop(), Some('c'));
        assert_eq!(*log.borrow(), vec![vec!['a', 'b']]);
    }

    #[test]
    fn pop_on_empty_still_notifies() {
        let array: ObservableArray<i32> = ObservableArray::new();
        let log = record(&array);

        assert_eq!(array.pop(), None);
        assert_eq!(array.shift(), None);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn push_and_notify() {
        let array = letters("abc");
        let log = record(&array);

        assert_eq!(array.push('d'), 4);
        assert_eq!(*log.borrow(), vec![vec!['a', 'b', 'c', 'd']]);
        // last notify matches current items
        assert_eq!(log.borrow().last(), Some(&array.get()));
    }

    #[test]
    fn shift_and_notify() {
        let array = letters("abcd");
        let log = record(&array);

        assert_eq!(array.shift(), Some('a'));
        assert_eq!(*log.borrow(), vec![vec!['b', 'c', 'd']]);
    }

    #[test]
    fn unshift_and_notify() {
        let array = letters("bcd");
        let log = record(&array);

        assert_eq!(array.unshift(['a', 'z']), 5);
        assert_eq!(array.join(""), "azbcd");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn find_value() {
        let array = letters("azbcd");
        assert_eq!(array.find(|x| *x == 'a'), Some('a'));
        assert_eq!(array.find(|x| *x == 'q'), None);
    }

    #[test]
    fn find_index_is_first_match() {
        let array = letters("abca");
        assert_eq!(array.find_index(|x| *x == 'a'), Some(0));
        assert_eq!(array.find_index(|x| *x == 'c'), Some(2));
        assert_eq!(array.find_index(|x| *x == 'u'), None);
    }

    #[test]
    fn find_keeps_order_among_ties() {
        let array = observe_array(vec![(1, "first"), (2, "x"), (1, "second")]);
        assert_eq!(array.find(|(k, _)| *k == 1), Some((1, "first")));
    }

    #[test]
    fn filter_for_values() {
        let array = letters("azbcd");
        let filtered: String = array.filter(|x| *x < 'c').into_iter().collect();
        assert_eq!(filtered, "ab");
    }

    #[test]
    fn some_and_every() {
        let array = letters("azbcd");
        assert!(!array.some(|x| *x == 'q'));
        assert!(array.some(|x| *x == 'z'));

        assert!(array.every(|x| *x <= 'z'));
        assert!(!array.every(|x| *x == 'z'));

        let empty: ObservableArray<char> = ObservableArray::new();
        assert!(!empty.some(|_| true));
        assert!(empty.every(|_| false));
    }

    #[test]
    fn map_values() {
        let array = letters("abc");
        let mapped: String = array
            .map(|x| char::from_u32(*x as u32 + 1).unwrap_or(*x))
            .into_iter()
            .collect();
        assert_eq!(mapped, "bcd");
    }

    #[test]
    fn reduce_values() {
        let array = observe_array(vec![1, 2, 3]);
        assert_eq!(array.reduce(0, |acc, x| acc + x), 6);
    }

    #[test]
    fn reverse_notifies() {
        let array = letters("abc");
        let log = record(&array);

        let reversed: String = array.reverse().into_iter().collect();
        assert_eq!(reversed, "cba");
        assert_eq!(*log.borrow(), vec![vec!['c', 'b', 'a']]);
    }

    #[test]
    fn splice_removes_run() {
        let array = observe_array(vec![1, 2, 3, 4]);
        let log = record(&array);

        assert_eq!(array.splice(1, 1), vec![2]);
        assert_eq!(array.join(""), "134");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn splice_clamps_bounds() {
        let array = observe_array(vec![1, 2, 3]);
        assert_eq!(array.splice(1, 100), vec![2, 3]);
        assert_eq!(array.splice(10, 1), Vec::<i32>::new());
        assert_eq!(array.get(), vec![1]);
    }

    #[test]
    fn splice_with_inserts() {
        let array = observe_array(vec![1, 2, 3, 4]);
        assert_eq!(array.splice_with(1, 2, [20, 30, 35]), vec![2, 3]);
        assert_eq!(array.get(), vec![1, 20, 30, 35, 4]);
    }

    #[test]
    fn remove_partitions() {
        let array = observe_array(vec![1, 2, 3, 4, 5]);
        let log = record(&array);

        assert_eq!(array.remove(|x, _, _| *x < 3), vec![1, 2]);
        assert_eq!(array.join(""), "345");
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn remove_predicate_sees_index_and_items() {
        let array = observe_array(vec![10, 20, 30, 40]);
        let removed = array.remove(|_, index, items| {
            assert_eq!(items.len(), 4);
            index % 2 == 1
        });
        assert_eq!(removed, vec![20, 40]);
        assert_eq!(array.get(), vec![10, 30]);
    }

    #[test]
    fn remove_all_empties() {
        let array = observe_array(vec![1, 2, 3, 4, 5]);
        let log = record(&array);

        assert_eq!(array.remove_all(), vec![1, 2, 3, 4, 5]);
        assert_eq!(array.join(""), "");
        assert_eq!(*log.borrow(), vec![Vec::<i32>::new()]);
    }

    #[test]
    fn update_replaces_first_match_and_notifies() {
        let array = observe_array(vec!["blue", "green", "yellow", "blue"]);
        let log = record(&array);

        assert_eq!(array.update(|x| *x == "blue", "orange"), Some("orange"));
        assert_eq!(array.get(), vec!["orange", "green", "yellow", "blue"]);
        assert_eq!(log.borrow()[0][0], "orange");
    }

    #[test]
    fn update_without_match_is_a_no_op() {
        let array = observe_array(vec!["a", "b", "c"]);
        let log = record(&array);

        assert_eq!(array.update(|x| *x == "d", "new value"), None);
        assert_eq!(array.join(""), "abc");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn sort_both_directions() {
        let array = observe_array(vec![1, 2, 3, 4, 5]);
        let log = record(&array);

        array.sort(|l, r| r.cmp(l));
        assert_eq!(array.join(""), "54321");
        array.sort(|l, r| l.cmp(r));
        assert_eq!(array.join(""), "12345");
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn slice_clamps_range() {
        let array = observe_array(vec![1, 2, 3, 4]);
        assert_eq!(array.slice(1..3), vec![2, 3]);
        assert_eq!(array.slice(..), vec![1, 2, 3, 4]);
        assert_eq!(array.slice(2..), vec![3, 4]);
        assert_eq!(array.slice(..=1), vec![1, 2]);
        assert_eq!(array.slice(3..10), vec![4]);
        assert_eq!(array.slice(5..), Vec::<i32>::new());
    }

    #[test]
    fn queries_never_notify() {
        let array = observe_array(vec![3, 1, 2]);
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();
        array.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        let _ = array.filter(|x| *x > 1);
        let _ = array.map(|x| x * 2);
        let _ = array.slice(0..2);
        let _ = array.join(",");
        let _ = array.find(|x| *x == 1);
        let _ = array.reduce(0, |a, x| a + x);
        let _ = array.at(1);

        assert_eq!(calls.get(), 0);
        assert_eq!(array.get(), vec![3, 1, 2]);
    }

    #[test]
    fn remove_subscribers_isolates_old_callbacks() {
        let array = observe_array(vec![1]);
        let log = record(&array);

        array.remove_subscribers();
        array.push(2);

        assert!(log.borrow().is_empty());
        assert_eq!(array.subscriber_count(), 0);
    }

    #[test]
    fn subscriber_may_mutate_reentrantly() {
        let array = observe_array(vec![1]);
        let array_clone = array.clone();
        array.subscribe(move |items: &Vec<i32>| {
            if items.len() < 3 {
                array_clone.push(0);
            }
        });

        array.push(1);
        assert_eq!(array.get(), vec![1, 1, 0]);
    }

    #[test]
    fn collects_from_iterator() {
        let array: ObservableArray<i32> = (1..=3).collect();
        assert_eq!(array.get(), vec![1, 2, 3]);
        let from: ObservableArray<i32> = vec![4].into();
        assert_eq!(from.at(0), Some(4));
    }

    #[test]
    fn debug_format() {
        let array = observe_array(vec![1, 2, 3]);
        let debug = format!("{:?}", array);
        assert!(debug.contains("ObservableArray"));
        assert!(debug.contains("[1, 2, 3]"));
    }
}
