// ============================================================================
// spark-observe - Observables, Observable Arrays and Computed Values
// ============================================================================
//
// Synchronous push-based reactivity: every write notifies every subscriber
// before returning, and computeds re-run their evaluator whenever a value
// they read during the last evaluation is written.
// ============================================================================

#[macro_use]
mod macros;

pub mod collections;
pub mod core;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use core::constants;
pub use core::context::{
    is_tracking, is_untracking, tracking_depth, with_context, ReactiveContext, TrackerFrame,
};
pub use core::error::{ObserveError, ObserveResult};
pub use core::subscribers::SubscriberRegistry;
pub use core::types::{AnySource, ComputedId, RecomputeFn, SourceId, SourceInner, SubscriberFn};

// Re-export primitives at crate root
pub use primitives::computed::{computed, Computed, ComputedInner};
pub use primitives::observable::{observe, observe_default, Observable};

// Re-export reactivity functions
pub use reactivity::tracking::{evaluate_tracked, track_read};
pub use reactivity::untrack::{peek, untrack};

// Re-export collections
pub use collections::{observe_array, ObservableArray};

// =============================================================================
// TESTS
// =============================================================================
