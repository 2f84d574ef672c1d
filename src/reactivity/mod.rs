// ============================================================================
// spark-observe - Reactivity Module
// Dependency tracking and untracked reads
// ============================================================================

pub mod tracking;
pub mod untrack;

// Re-export main tracking functions
pub use tracking::{evaluate_tracked, track_read};

// Re-export untrack functions
pub use untrack::{peek, untrack};
