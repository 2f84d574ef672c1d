// ============================================================================
// spark-observe - Observable Collections
// ============================================================================
//
// ObservableArray wraps a Vec behind a single subscriber registry. Every
// mutator notifies once with the post-mutation items; queries only track.
// ============================================================================

mod array;

pub use array::{observe_array, ObservableArray};
