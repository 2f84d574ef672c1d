// ============================================================================
// spark-observe - Primitives Module
// Core reactive primitives: observable, computed
// ============================================================================

pub mod computed;
pub mod observable;

// Re-export for convenience
pub use computed::{computed, Computed, ComputedInner};
pub use observable::{observe, observe_default, Observable};
