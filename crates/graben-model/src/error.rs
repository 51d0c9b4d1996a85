// ── Model error types ──
//
// Domain-level failures. The sandbox layer forwards these unchanged --
// it is a synchronization layer, not a validation layer.

use thiserror::Error;

use crate::source::SourceId;

/// Unified error type for scene-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unknown source: {id}")]
    UnknownSource { id: SourceId },

    #[error("Source already present: {id}")]
    DuplicateSource { id: SourceId },

    #[error("Optimization failed: {message}")]
    OptimizationFailed { message: String },
}
