// ============================================================================
// spark-observe - Reactive Context
// Thread-local state for tracking the currently evaluating computed
// ============================================================================

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::types::{AnySource, ComputedId, RecomputeFn, SourceId};

// =============================================================================
// TRACKER FRAME
// =============================================================================

/// One entry on the tracker stack: a computed whose evaluator is running.
///
/// Sources read while this frame is on top record themselves here and
/// register `recompute` in their own registries.
pub struct TrackerFrame {
    owner: ComputedId,
    recompute: RecomputeFn,
    reads: RefCell<Vec<Rc<dyn AnySource>>>,
}

impl TrackerFrame {
    pub fn new(owner: ComputedId, recompute: RecomputeFn) -> Self {
        Self {
            owner,
            recompute,
            reads: RefCell::new(Vec::new()),
        }
    }

    pub fn owner(&self) -> ComputedId {
        self.owner
    }

    pub fn recompute(&self) -> RecomputeFn {
        self.recompute.clone()
    }

    /// Record a read. Returns false if the source was already read in this frame.
    pub fn record(&self, source: &Rc<dyn AnySource>) -> bool {
        let id = source.id();
        let mut reads = self.reads.borrow_mut();
        if reads.iter().any(|s| s.id() == id) {
            return false;
        }
        reads.push(source.clone());
        true
    }

    /// Number of distinct sources read so far
    pub fn read_count(&self) -> usize {
        self.reads.borrow().len()
    }

    /// Ids of the sources read so far, in first-read order
    pub fn read_ids(&self) -> Vec<SourceId> {
        self.reads.borrow().iter().map(|s| s.id()).collect()
    }

    /// Take the recorded sources, leaving the frame empty
    pub fn take_reads(&self) -> Vec<Rc<dyn AnySource>> {
        self.reads.replace(Vec::new())
    }
}

// =============================================================================
// REACTIVE CONTEXT
// =============================================================================

/// Thread-local reactive context holding all global state for tracking.
///
/// Only valid on the thread that owns it; primitives are `!Send` so they can
/// never observe another thread's context.
pub struct ReactiveContext {
    // =========================================================================
    // DEPENDENCY TRACKING
    // =========================================================================
    /// Frames of computeds currently evaluating on a tracked path (top = innermost)
    pub frames: RefCell<Vec<Rc<TrackerFrame>>>,

    /// Whether we're currently untracking (reading without creating dependencies)
    pub untracking: Cell<bool>,

    // =========================================================================
    // IDENTITY ALLOCATION
    // =========================================================================
    /// Last allocated source id
    pub source_ids: Cell<u64>,

    /// Last allocated computed id
    pub computed_ids: Cell<u64>,
}

impl ReactiveContext {
    /// Create a new reactive context with default values
    pub fn new() -> Self {
        Self {
            frames: RefCell::new(Vec::new()),
            untracking: Cell::new(false),
            source_ids: Cell::new(0),
            computed_ids: Cell::new(0),
        }
    }

    // =========================================================================
    // FRAME STACK
    // =========================================================================

    /// Push a frame, returning the new depth
    pub fn push_frame(&self, frame: Rc<TrackerFrame>) -> usize {
        let mut frames = self.frames.borrow_mut();
        frames.push(frame);
        frames.len()
    }

    /// Pop the top frame
    pub fn pop_frame(&self) -> Option<Rc<TrackerFrame>> {
        self.frames.borrow_mut().pop()
    }

    /// Get the top frame
    pub fn current_frame(&self) -> Option<Rc<TrackerFrame>> {
        self.frames.borrow().last().cloned()
    }

    /// Check if any frame is active
    pub fn has_active_frame(&self) -> bool {
        !self.frames.borrow().is_empty()
    }

    /// Number of frames on the stack
    pub fn frame_depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Set untracking mode, returning previous value
    pub fn set_untracking(&self, value: bool) -> bool {
        self.untracking.replace(value)
    }

    /// Check if currently untracking
    pub fn is_untracking(&self) -> bool {
        self.untracking.get()
    }

    // =========================================================================
    // IDENTITY ALLOCATION
    // =========================================================================

    /// Allocate the next source id
    pub fn next_source_id(&self) -> SourceId {
        let id = self.source_ids.get() + 1;
        self.source_ids.set(id);
        SourceId(id)
    }

    /// Allocate the next computed id
    pub fn next_computed_id(&self) -> ComputedId {
        let id = self.computed_ids.get() + 1;
        self.computed_ids.set(id);
        ComputedId(id)
    }
}

impl Default for ReactiveContext {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// THREAD-LOCAL ACCESS
// =============================================================================

thread_local! {
    /// The thread-local reactive context
    static CONTEXT: ReactiveContext = ReactiveContext::new();
}

/// Access the thread-local reactive context.
///
/// # Example
///
/// ```
/// use spark_observe::with_context;
///
/// let depth = with_context(|ctx| ctx.frame_depth());
/// assert_eq!(depth, 0);
/// assert!(!with_context(|ctx| ctx.is_untracking()));
/// ```
pub fn with_context<R>(f: impl FnOnce(&ReactiveContext) -> R) -> R {
    CONTEXT.with(f)
}

// =============================================================================
// CONVENIENCE FUNCTIONS
// =============================================================================

/// Check if reads are currently tracked (inside a computed evaluation, not untracking)
pub fn is_tracking() -> bool {
    with_context(|ctx| ctx.has_active_frame() && !ctx.is_untracking())
}

/// Check if currently untracking
pub fn is_untracking() -> bool {
    with_context(|ctx| ctx.is_untracking())
}

/// Number of computed evaluations currently on the tracker stack
pub fn tracking_depth() -> usize {
    with_context(|ctx| ctx.frame_depth())
}

// =============================================================================
// TESTS
// =============================================================================
