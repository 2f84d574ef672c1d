// ============================================================================
// spark-observe - Constants
// Flag constants for primitive kinds and evaluation state
// ============================================================================

// =============================================================================
// PRIMITIVE KIND FLAGS
// =============================================================================

/// Scalar observable value
pub const OBSERVABLE: u32 = 1 << 0;

/// Observable sequence
pub const OBSERVABLE_ARRAY: u32 = 1 << 1;

/// Computed value
pub const COMPUTED: u32 = 1 << 2;

// =============================================================================
// EVALUATION STATE FLAGS
// =============================================================================

/// Computed's evaluator is currently on the call stack
pub const EVALUATING: u32 = 1 << 10;

/// Computed has been dropped and its dependencies released
pub const DISPOSED: u32 = 1 << 11;

// =============================================================================
// MASKS
// =============================================================================

/// Mask for the kind bits
pub const KIND_MASK: u32 = OBSERVABLE | OBSERVABLE_ARRAY | COMPUTED;

/// Mask for the evaluation state bits
pub const STATE_MASK: u32 = EVALUATING | DISPOSED;

// =============================================================================
// TESTS
// =============================================================================
