// ============================================================================
// spark-observe - Untrack
// Reading reactive values without creating dependencies
// ============================================================================

use crate::core::context::with_context;

// =============================================================================
// UNTRACK
// =============================================================================

/// Read observables without creating dependencies.
///
/// Useful when a computed needs a value but should not recompute when it
/// changes.
///
/// # Example
///
/// ```
/// use spark_observe::{computed, observe, untrack};
///
/// let a = observe(1);
/// let b = observe(2);
///
/// let sum = computed({
///     let a = a.clone();
///     let b = b.clone();
///     move || a.get() + untrack(|| b.get())
/// });
///
/// let seen = std::rc::Rc::new(std::cell::Cell::new(0));
/// let seen_clone = seen.clone();
/// sum.subscribe(move |v| seen_clone.set(*v));
///
/// b.set(20); // not a dependency
/// assert_eq!(seen.get(), 0);
///
/// a.set(10); // dependency
/// assert_eq!(seen.get(), 30);
/// ```
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let prev = with_context(|ctx| ctx.set_untracking(true));

    // Use a guard pattern to ensure we restore even on panic
    struct UntrackGuard {
        prev: bool,
    }

    impl Drop for UntrackGuard {
        fn drop(&mut self) {
            with_context(|ctx| ctx.set_untracking(self.prev));
        }
    }

    let _guard = UntrackGuard { prev };
    f()
}

/// Alias for `untrack()`.
pub fn peek<T>(f: impl FnOnce() -> T) -> T {
    untrack(f)
}

// =============================================================================
// TESTS
// =============================================================================
