// ============================================================================
// spark-observe - Dependency Tracking
// Recording reads during a computed's evaluation
// ============================================================================
//
// A computed pushes a TrackerFrame before its evaluator runs and pops it
// afterwards. Every read of an Observable or ObservableArray calls
// track_read(), which wires the source to the frame on top of the stack.
// There is no static analysis of the evaluator: whatever it reads during a
// run is what it depends on.
// ============================================================================

use std::rc::Rc;

use crate::core::context::{with_context, TrackerFrame};
use crate::core::types::AnySource;

// =============================================================================
// TRACK READ - Register dependency when reading a source
// =============================================================================

/// Track a read of a source, registering it as a dependency if a computed is
/// currently evaluating.
///
/// Called by `Observable::get()` / `ObservableArray::get()` and friends
/// before they borrow the value.
///
/// # Borrow Safety
/// The frame is cloned out of the context before the source's registry is
/// touched, so no context borrow is held across `add_dependent`.
pub fn track_read(source: Rc<dyn AnySource>) {
    let frame = with_context(|ctx| {
        if ctx.is_untracking() {
            return None;
        }
        ctx.current_frame()
    });

    let Some(frame) = frame else {
        return;
    };

    // First read of this source in this evaluation
    if frame.record(&source) {
        let added = source.add_dependent(frame.owner(), frame.recompute());
        if added {
            tracing::trace!(
                computed = %frame.owner(),
                source = %source.id(),
                "dependency registered"
            );
        }
    }
}

// =============================================================================
// TRACKED EVALUATION
// =============================================================================

/// Run `f` with `frame` on top of the tracker stack.
///
/// Reads inside `f` are tracked even when the caller is inside `untrack`;
/// the caller's untracking state is restored afterwards. The frame is popped
/// when `f` returns or unwinds, so an evaluator that panics never leaves a
/// stale frame behind for the outer evaluation.
pub fn evaluate_tracked<R>(frame: Rc<TrackerFrame>, f: impl FnOnce() -> R) -> R {
    let was_untracking = with_context(|ctx| {
        ctx.push_frame(frame.clone());
        ctx.set_untracking(false)
    });

    struct FrameGuard {
        frame: Rc<TrackerFrame>,
        was_untracking: bool,
    }

    impl Drop for FrameGuard {
        fn drop(&mut self) {
            let popped = with_context(|ctx| {
                ctx.set_untracking(self.was_untracking);
                ctx.pop_frame()
            });
            debug_assert!(
                popped.is_some_and(|p| Rc::ptr_eq(&p, &self.frame)),
                "tracker stack unbalanced"
            );
        }
    }

    let _guard = FrameGuard {
        frame,
        was_untracking,
    };
    f()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::OBSERVABLE;
    use crate::core::context::{is_untracking, tracking_depth};
    use crate::reactivity::untrack::untrack;
    use crate::core::types::{ComputedId, SourceInner};
    use std::cell::Cell;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn frame(id: u64) -> Rc<TrackerFrame> {
        Rc::new(TrackerFrame::new(ComputedId(id), Rc::new(|| {})))
    }

    #[test]
    fn read_outside_evaluation_is_not_tracked() {
        let source = Rc::new(SourceInner::new(1, OBSERVABLE));
        track_read(source.clone());
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn read_inside_evaluation_registers_dependent() {
        let source = Rc::new(SourceInner::new(1, OBSERVABLE));
        let f = frame(1);

        evaluate_tracked(f.clone(), || {
            track_read(source.clone());
            track_read(source.clone());
        });

        assert_eq!(f.read_count(), 1);
        assert_eq!(source.subscriber_count(), 1);
        assert_eq!(source.subscribers().dependent_count(), 1);
    }

    #[test]
    fn reads_go_to_the_innermost_frame() {
        let a = Rc::new(SourceInner::new(1, OBSERVABLE));
        let b = Rc::new(SourceInner::new(2, OBSERVABLE));
        let outer = frame(1);
        let inner = frame(2);

        evaluate_tracked(outer.clone(), || {
            track_read(a.clone());
            evaluate_tracked(inner.clone(), || track_read(b.clone()));
        });

        assert_eq!(outer.read_ids(), vec![a.id()]);
        assert_eq!(inner.read_ids(), vec![b.id()]);
    }

    #[test]
    fn frame_popped_after_evaluation() {
        assert_eq!(tracking_depth(), 0);
        let depth_inside = evaluate_tracked(frame(1), tracking_depth);
        assert_eq!(depth_inside, 1);
        assert_eq!(tracking_depth(), 0);
    }

    #[test]
    fn frame_popped_on_panic() {
        let result = catch_unwind(AssertUnwindSafe(|| {
            evaluate_tracked::<()>(frame(1), || panic!("evaluator failed"));
        }));

        assert!(result.is_err());
        assert_eq!(tracking_depth(), 0);
    }

    #[test]
    fn recompute_callback_fires_on_notify() {
        let source = Rc::new(SourceInner::new(1, OBSERVABLE));
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let f = Rc::new(TrackerFrame::new(
            ComputedId(1),
            Rc::new(move || runs_clone.set(runs_clone.get() + 1)),
        ));

        evaluate_tracked(f, || track_read(source.clone()));

        source.replace(2);
        source.notify();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn evaluation_inside_untrack_still_tracks() {
        let source = Rc::new(SourceInner::new(1, OBSERVABLE));
        let f = frame(1);

        let untracking_inside = untrack(|| {
            evaluate_tracked(f.clone(), || {
                track_read(source.clone());
                is_untracking()
            })
        });

        assert!(!untracking_inside);
        assert_eq!(f.read_count(), 1);
        assert_eq!(source.subscriber_count(), 1);
    }

    #[test]
    fn untracking_restored_after_evaluation() {
        untrack(|| {
            evaluate_tracked(frame(1), || {});
            assert!(is_untracking());

            let result = catch_unwind(AssertUnwindSafe(|| {
                evaluate_tracked::<()>(frame(2), || panic!("evaluator failed"));
            }));
            assert!(result.is_err());
            assert!(is_untracking());
        });
        assert!(!is_untracking());
    }
}
