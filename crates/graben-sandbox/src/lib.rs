//! Reactive sandbox layer between a scene model and UI consumers.
//!
//! This crate keeps a row-indexed presentation of a mutable, domain-owned
//! source collection synchronized as the scene is swapped or mutated:
//!
//! - **[`Sandbox`]** — Cheaply cloneable handle over a single-writer
//!   worker task that owns the active scene and the table. Commands flow
//!   through an `mpsc` channel with oneshot replies; lifecycle events
//!   ([`SandboxEvent`]) and table notifications ([`TableEvent`]) fan out
//!   over broadcast channels.
//!
//! - **[`SourceTable`]** — The row-indexed adapter: per-row role queries
//!   (display label, region of interest, editor descriptor), parameter
//!   get/set, and a full discard-and-recreate reconciliation pass driven
//!   by the scene's change notifications.
//!
//! - **[`DelegateRegistry`]** — Source kind → delegate constructor table,
//!   populated at startup with the built-in kinds and open for embedder
//!   registration.
//!
//! - **[`CursorTracker`]** — Pass-through cursor/pointer broadcaster for
//!   overlay consumers; no business logic attached.

mod command;
pub mod delegate;
pub mod error;
pub mod events;
pub mod sandbox;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use delegate::{
    DelegateFactory, DelegateRegistry, MogiDelegate, OkadaDelegate, RingfaultDelegate,
    SourceDelegate,
};
pub use error::SandboxError;
pub use events::{CursorTracker, EventStream, SandboxEvent};
pub use sandbox::{Sandbox, SandboxConfig, SharedScene, shared};
pub use table::{Role, RowData, SelectionModel, SourceTable, TableEvent};
