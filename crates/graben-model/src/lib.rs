//! Domain-model contract for the graben sandbox workspace.
//!
//! This crate pins down the interface the reactive sandbox layer consumes:
//!
//! - **[`SceneModel`]** — The contract every scene implementation satisfies:
//!   an ordered source collection with add/remove, a long-running reference
//!   optimization entry point, a subscribable `updated` version counter and
//!   a log-record broadcast.
//!
//! - **[`Source`]** — One modelled deformation source: stable [`SourceId`]
//!   identity, a [`SourceKind`] tag for delegate dispatch, and an editable
//!   [`SourceParameters`] set behind a lock.
//!
//! - **[`MemoryScene`]** — Reference in-memory [`SceneModel`] used by the
//!   sandbox's tests and by embedders that do not bring their own scene.
//!   The optimization computation itself is pluggable and out of scope.

pub mod error;
pub mod log;
pub mod scene;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::ModelError;
pub use log::{LogLevel, LogRecord};
pub use scene::{MemoryScene, Optimizer, SceneModel};
pub use source::{
    EditorDescriptor, FieldSpec, GeoPoint, RegionOfInterest, Source, SourceId, SourceKind,
    SourceParameters,
};
