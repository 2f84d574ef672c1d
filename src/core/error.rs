// ============================================================================
// spark-observe - Errors
// Failures surfaced by the reactive engine
// ============================================================================

use super::types::ComputedId;

/// Errors raised synchronously by reactive primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ObserveError {
    /// A computed was read while its own evaluator was still running.
    #[error("dependency cycle detected: computed {id} was read while evaluating itself")]
    CycleDetected { id: ComputedId },
}

/// Result alias for fallible reactive operations.
pub type ObserveResult<T> = Result<T, ObserveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_names_the_computed() {
        let err = ObserveError::CycleDetected { id: ComputedId(7) };
        assert_eq!(
            err.to_string(),
            "dependency cycle detected: computed #7 was read while evaluating itself"
        );
    }
}
