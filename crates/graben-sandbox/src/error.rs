// ── Sandbox error types ──
//
// The sandbox is a synchronization layer, not a validation layer: scene
// errors pass through `Model` untranslated. Its own taxonomy covers the
// delegate registry, row addressing and worker lifecycle.

use thiserror::Error;

use graben_model::{ModelError, SourceKind};

/// Unified error type for the sandbox crate.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// No delegate factory registered for a source kind. Fatal for a
    /// rebuild: there is no sensible fallback rendering.
    #[error("No delegate registered for source kind {kind}")]
    UnknownSourceKind { kind: SourceKind },

    #[error("Row {row} out of bounds ({rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },

    /// Scene-model failure, forwarded unchanged.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The worker task has shut down; no further commands are accepted.
    #[error("Sandbox worker is gone")]
    WorkerGone,

    #[error("Internal error: {0}")]
    Internal(String),
}
