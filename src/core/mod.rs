// ============================================================================
// spark-observe - Core Module
// Fundamental types, subscriber registry, context and errors
// ============================================================================

pub mod constants;
pub mod context;
pub mod error;
pub mod subscribers;
pub mod types;

// Re-export commonly used items
pub use constants::*;
pub use context::{is_tracking, is_untracking, tracking_depth, with_context, ReactiveContext, TrackerFrame};
pub use error::{ObserveError, ObserveResult};
pub use subscribers::SubscriberRegistry;
pub use types::{AnySource, ComputedId, RecomputeFn, SourceId, SourceInner, SubscriberFn};
