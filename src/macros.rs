// ============================================================================
// spark-observe - Ergonomic Macros
// ============================================================================

/// Clone variables into a move closure.
///
/// Saves the manual `let x = x.clone();` dance before handing observables to
/// a computed or subscriber.
///
/// # Usage
///
/// ```rust
/// use spark_observe::{cloned, computed, observe};
///
/// let a = observe(1);
/// let b = observe(2);
///
/// let sum = computed(cloned!(a, b => move || a.get() + b.get()));
/// assert_eq!(sum.get(), 3);
///
/// // a and b are still usable here
/// a.set(10);
/// assert_eq!(sum.get(), 12);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Create a computed with automatic variable capturing.
///
/// Wraps `computed(cloned!(... => move || ...))`.
///
/// # Usage
///
/// ```rust
/// use spark_observe::{computed, observe, observe_array};
///
/// let first = observe(String::from("Ada"));
/// let last = observe(String::from("Lovelace"));
/// let full = computed!(first, last => format!("{} {}", first.get(), last.get()));
/// assert_eq!(full.get(), "Ada Lovelace");
///
/// let items = observe_array(vec![1, 2, 3]);
/// let total = computed!(items => items.reduce(0, |acc, x| acc + x));
/// items.push(4);
/// assert_eq!(total.get(), 10);
///
/// let constant = computed!(42);
/// assert_eq!(constant.get(), 42);
/// ```
#[macro_export]
macro_rules! computed {
    // With dependencies
    ($($deps:ident),+ => $body:expr) => {
        $crate::computed($crate::cloned!($($deps),+ => move || $body))
    };
    // No dependencies
    ($body:expr) => {
        $crate::computed(move || $body)
    };
}
