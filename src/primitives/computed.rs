// ============================================================================
// spark-observe - Computed Values
// Values re-derived from whatever observables their evaluator reads
// ============================================================================
//
// A Computed owns an evaluator and an internal cache Observable. The cache's
// subscriber registry is the computed's public subscription surface.
//
// Dependencies are discovered, never declared: the evaluator runs with a
// TrackerFrame on the tracker stack and every observable it reads registers
// this computed's recompute callback. After each tracked run the dependency
// set is diffed against the previous one and sources that were not read
// again are unsubscribed.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::core::constants::*;
use crate::core::context::{with_context, TrackerFrame};
use crate::core::error::{ObserveError, ObserveResult};
use crate::core::types::{AnySource, ComputedId, RecomputeFn, SourceId};
use crate::primitives::observable::Observable;
use crate::reactivity::tracking::evaluate_tracked;

// =============================================================================
// COMPUTED INNER
// =============================================================================

/// The internal data for a computed value.
pub struct ComputedInner<T> {
    id: ComputedId,

    /// Flags bitmask (COMPUTED | state)
    flags: Cell<u32>,

    /// The evaluator
    evaluator: Box<dyn Fn() -> T>,

    /// Last value produced by a dependency-triggered recompute
    cache: Observable<T>,

    /// Sources read during the most recent tracked evaluation
    dependencies: RefCell<Vec<Rc<dyn AnySource>>>,

    /// Callback registered on every dependency; holds only a weak reference
    /// back to this inner
    recompute: RecomputeFn,
}

impl<T: Clone + 'static> ComputedInner<T> {
    /// Create a computed and run its first tracked evaluation.
    pub fn new<F>(evaluator: F) -> Rc<Self>
    where
        F: Fn() -> T + 'static,
    {
        let id = with_context(|ctx| ctx.next_computed_id());

        Rc::new_cyclic(|weak: &Weak<Self>| {
            let recompute = recompute_callback(weak.clone());
            let frame = Rc::new(TrackerFrame::new(id, recompute.clone()));
            let value = evaluate_tracked(frame.clone(), &evaluator);
            let dependencies = frame.take_reads();

            tracing::debug!(
                computed = %id,
                dependencies = dependencies.len(),
                "computed created"
            );

            Self {
                id,
                flags: Cell::new(COMPUTED),
                evaluator: Box::new(evaluator),
                cache: Observable::new(value),
                dependencies: RefCell::new(dependencies),
                recompute,
            }
        })
    }

    pub fn id(&self) -> ComputedId {
        self.id
    }

    pub fn flags(&self) -> u32 {
        self.flags.get()
    }

    pub fn is_evaluating(&self) -> bool {
        self.flags.get() & EVALUATING != 0
    }

    pub fn is_disposed(&self) -> bool {
        self.flags.get() & DISPOSED != 0
    }

    /// Run the evaluator without pushing a frame.
    ///
    /// Reads are attributed to whichever computed is on top of the tracker
    /// stack, so a computed read from inside another computed's evaluator
    /// makes the outer one depend on the inner one's sources directly.
    pub fn evaluate(&self) -> ObserveResult<T> {
        let _evaluating = self.enter_evaluation()?;
        Ok((self.evaluator)())
    }

    /// Re-run the evaluator under a fresh frame, refresh the dependency set
    /// and publish the result through the cache.
    pub fn recompute(&self) {
        if self.is_disposed() {
            return;
        }
        if self.is_evaluating() {
            // The evaluator wrote to one of its own dependencies. The running
            // evaluation publishes when it finishes.
            tracing::warn!(computed = %self.id, "recompute requested while evaluating, skipped");
            return;
        }

        let frame = Rc::new(TrackerFrame::new(self.id, self.recompute.clone()));
        let value = {
            let Ok(_evaluating) = self.enter_evaluation() else {
                return;
            };
            evaluate_tracked(frame.clone(), || (self.evaluator)())
        };

        self.retain_dependencies(frame.take_reads());
        tracing::debug!(computed = %self.id, "recomputed");
        self.cache.set(value);
    }

    /// Stop recomputing and release every dependency.
    pub fn dispose(&self) {
        self.flags.set(self.flags.get() | DISPOSED);
        let dependencies = self.dependencies.replace(Vec::new());
        for source in dependencies {
            source.remove_dependent(self.id);
        }
        tracing::debug!(computed = %self.id, "disposed");
    }

    pub fn cache(&self) -> &Observable<T> {
        &self.cache
    }

    /// Number of distinct sources read during the last tracked evaluation.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.borrow().len()
    }

    /// Ids of the current dependencies, in first-read order.
    pub fn dependency_ids(&self) -> Vec<SourceId> {
        self.dependencies.borrow().iter().map(|s| s.id()).collect()
    }

    fn enter_evaluation(&self) -> ObserveResult<EvaluationGuard<'_>> {
        let flags = self.flags.get();
        if flags & EVALUATING != 0 {
            return Err(ObserveError::CycleDetected { id: self.id });
        }
        self.flags.set(flags | EVALUATING);
        Ok(EvaluationGuard { flags: &self.flags })
    }

    /// Swap in the new dependency set and unsubscribe from sources that were
    /// not read this time.
    fn retain_dependencies(&self, reads: Vec<Rc<dyn AnySource>>) {
        let previous = self.dependencies.replace(reads);
        let current = self.dependencies.borrow();

        for source in previous {
            let id = source.id();
            if current.iter().any(|s| s.id() == id) {
                continue;
            }
            if source.remove_dependent(self.id) {
                tracing::debug!(computed = %self.id, source = %id, "stale dependency dropped");
            }
        }
    }
}

impl<T> Drop for ComputedInner<T> {
    fn drop(&mut self) {
        for source in self.dependencies.get_mut().drain(..) {
            source.remove_dependent(self.id);
        }
    }
}

/// Clears EVALUATING when the evaluator returns or unwinds.
struct EvaluationGuard<'a> {
    flags: &'a Cell<u32>,
}

impl Drop for EvaluationGuard<'_> {
    fn drop(&mut self) {
        self.flags.set(self.flags.get() & !EVALUATING);
    }
}

fn recompute_callback<T: Clone + 'static>(weak: Weak<ComputedInner<T>>) -> RecomputeFn {
    Rc::new(move || {
        if let Some(inner) = weak.upgrade() {
            inner.recompute();
        }
    })
}

// =============================================================================
// COMPUTED<T> WRAPPER
// =============================================================================

/// A value derived from other reactive primitives.
///
/// The evaluator runs once at construction. Whenever an observable it read
/// is written, it runs again and the result is pushed to this computed's
/// subscribers. Reading with `get()` always runs the evaluator fresh.
///
/// # Example
///
/// ```
/// use spark_observe::{computed, observe};
///
/// let x = observe(1);
/// let y = observe(2);
/// let sum = computed({
///     let (x, y) = (x.clone(), y.clone());
///     move || x.get() + y.get()
/// });
/// assert_eq!(sum.get(), 3);
///
/// x.set(2);
/// assert_eq!(sum.get(), 4);
/// ```
pub struct Computed<T> {
    inner: Rc<ComputedInner<T>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Computed<T> {
    /// Create a computed value and evaluate it once.
    pub fn new<F>(evaluator: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            inner: ComputedInner::new(evaluator),
        }
    }

    /// Run the evaluator and return its result.
    ///
    /// Inside another computed's evaluation the observables read here become
    /// dependencies of that outer computed.
    ///
    /// # Panics
    ///
    /// Panics with [`ObserveError::CycleDetected`] if this computed is read
    /// while its own evaluator is running. Use [`try_get`](Self::try_get) to
    /// handle that case.
    pub fn get(&self) -> T {
        match self.inner.evaluate() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Run the evaluator, reporting a dependency cycle instead of panicking.
    pub fn try_get(&self) -> ObserveResult<T> {
        self.inner.evaluate()
    }

    /// Subscribe to recomputed values.
    ///
    /// Subscribers live as long as the computed does. Once the last
    /// `Computed` handle is dropped the computed unhooks from its sources and
    /// its subscribers are never called again, so keep a handle around:
    ///
    /// ```
    /// use spark_observe::{computed, observe};
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let x = observe(1);
    /// let hits = Rc::new(Cell::new(0));
    ///
    /// let hits_clone = hits.clone();
    /// computed!(x => x.get() + 1).subscribe(move |_| hits_clone.set(hits_clone.get() + 1));
    /// x.set(2); // temporary computed already dropped
    /// assert_eq!(hits.get(), 0);
    ///
    /// let kept = computed!(x => x.get() + 1);
    /// let hits_clone = hits.clone();
    /// kept.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));
    /// x.set(3);
    /// assert_eq!(hits.get(), 1);
    /// ```
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) {
        self.inner.cache().subscribe(f);
    }

    /// Drop every subscriber of this computed.
    pub fn remove_subscribers(&self) {
        self.inner.cache().remove_subscribers();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.cache().subscriber_count()
    }

    /// Number of observables this computed currently depends on.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependency_count()
    }

    /// Stop recomputing and release all dependencies.
    ///
    /// Subscribers stay registered but are never called again.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn id(&self) -> ComputedId {
        self.inner.id()
    }

    /// Get access to the inner for graph inspection
    pub fn inner(&self) -> &Rc<ComputedInner<T>> {
        &self.inner
    }
}

impl<T: std::fmt::Debug + Clone + 'static> std::fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.inner.id())
            .field("cached", &self.inner.cache())
            .field("dependencies", &self.inner.dependency_count())
            .finish()
    }
}

// =============================================================================
// PUBLIC API
// =============================================================================

/// Create a computed value.
///
/// # Example
///
/// ```
/// use spark_observe::{computed, observe};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let x = observe(1);
/// let doubled = computed({
///     let x = x.clone();
///     move || x.get() * 2
/// });
///
/// let last = Rc::new(Cell::new(0));
/// let last_clone = last.clone();
/// doubled.subscribe(move |v| last_clone.set(*v));
///
/// x.set(5);
/// assert_eq!(last.get(), 10);
/// ```
pub fn computed<T, F>(evaluator: F) -> Computed<T>
where
    T: Clone + 'static,
    F: Fn() -> T + 'static,
{
    Computed::new(evaluator)
}

// =============================================================================
// TESTS
// =============================================================================
